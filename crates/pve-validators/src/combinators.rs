// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Building blocks for the named rules.

use std::collections::BTreeSet;

use regex::Regex;

use crate::{Diagnostics, FieldPath, ValidationErrorKind, Validator, Value};

/// Accepts a string that is exactly (case included) a member of `set`.
#[derive(Clone, Copy, Debug)]
pub struct OneOf {
    set: &'static BTreeSet<&'static str>,
}

pub fn one_of(set: &'static BTreeSet<&'static str>) -> OneOf {
    OneOf { set }
}

impl Validator for OneOf {
    fn validate(&self, value: &Value, path: &FieldPath) -> Diagnostics {
        let Some(s) = value.as_str() else {
            return Diagnostics::type_mismatch(path, "string", value);
        };

        if self.set.contains(s) {
            return Diagnostics::new();
        }

        let expected =
            self.set.iter().copied().collect::<Vec<_>>().join(", ");
        Diagnostics::error(
            path,
            ValidationErrorKind::NotInSet { expected, value: s.to_owned() },
        )
    }
}

/// Accepts an integer in the inclusive range `min..=max`, or exactly
/// `sentinel` if one is given.
#[derive(Clone, Copy, Debug)]
pub struct IntBetween {
    min: i64,
    max: i64,
    sentinel: Option<i64>,
}

pub fn int_between(min: i64, max: i64) -> IntBetween {
    IntBetween { min, max, sentinel: None }
}

pub fn int_between_or(min: i64, max: i64, sentinel: i64) -> IntBetween {
    IntBetween { min, max, sentinel: Some(sentinel) }
}

impl Validator for IntBetween {
    fn validate(&self, value: &Value, path: &FieldPath) -> Diagnostics {
        let Some(v) = value.as_integer() else {
            return Diagnostics::type_mismatch(path, "integer", value);
        };

        if Some(v) == self.sentinel || (self.min..=self.max).contains(&v) {
            Diagnostics::new()
        } else {
            Diagnostics::error(
                path,
                ValidationErrorKind::Range {
                    min: self.min,
                    max: self.max,
                    value: v,
                },
            )
        }
    }
}

/// Accepts a string matching `regex`. `description` names the expected
/// shape in error messages.
#[derive(Clone, Copy, Debug)]
pub struct Matches {
    regex: &'static Regex,
    description: &'static str,
    allow_empty: bool,
}

pub fn matches(regex: &'static Regex, description: &'static str) -> Matches {
    Matches { regex, description, allow_empty: false }
}

impl Matches {
    /// Also accepts the empty string, which stands for an unset value.
    pub fn or_empty(mut self) -> Self {
        self.allow_empty = true;
        self
    }
}

impl Validator for Matches {
    fn validate(&self, value: &Value, path: &FieldPath) -> Diagnostics {
        let Some(s) = value.as_str() else {
            return Diagnostics::type_mismatch(path, "string", value);
        };

        if (self.allow_empty && s.is_empty()) || self.regex.is_match(s) {
            Diagnostics::new()
        } else {
            Diagnostics::error(
                path,
                ValidationErrorKind::PatternMismatch {
                    description: self.description,
                    value: s.to_owned(),
                },
            )
        }
    }
}

/// Accepts a list whose every element passes the wrapped rule. Failures are
/// reported for each offending element at its index.
#[derive(Clone, Copy, Debug)]
pub struct ListOf<V>(V);

pub fn list_of<V: Validator>(inner: V) -> ListOf<V> {
    ListOf(inner)
}

impl<V: Validator> Validator for ListOf<V> {
    fn validate(&self, value: &Value, path: &FieldPath) -> Diagnostics {
        let Some(items) = value.as_array() else {
            return Diagnostics::type_mismatch(path, "array", value);
        };

        let mut diags = Diagnostics::new();
        for (i, item) in items.iter().enumerate() {
            diags.merge(self.0.validate(item, &path.index(i)));
        }
        diags
    }
}
