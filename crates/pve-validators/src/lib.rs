// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Validation and normalization of VM configuration values.
//!
//! Every rule implements [`Validator`]: given a value and the path of the field
//! it was read from, it returns the [`Diagnostics`] it found. Rules are pure;
//! they neither mutate their input nor perform I/O. List rules wrap a scalar
//! rule and report every failing element with its index.
//!
//! The named rules in [`rules`] are built from the combinators in
//! [`combinators`] and the fixed tables in [`tables`].

use std::fmt::Display;

use thiserror::Error;

pub mod combinators;
pub mod rules;
pub mod size;
pub mod tables;

pub use combinators::{IntBetween, ListOf, Matches, OneOf};
pub use size::{parse_size, SizeParseError, SizeUnit};

/// A configuration value as read from a VM description.
pub type Value = toml::Value;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum PathSegment {
    Key(String),
    Index(usize),
}

/// The location of a value within a configuration, e.g. `disk[2].file_id`.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns the path of the field `key` beneath this one.
    pub fn key<S: Into<String>>(&self, key: S) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.into()));
        Self(segments)
    }

    /// Returns the path of the `index`th element of the list at this path.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for FieldPath {
    fn from(key: &str) -> Self {
        Self::root().key(key)
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_root() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => f.write_str(key)?,
                PathSegment::Key(key) => write!(f, ".{}", key)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// The ways a value can fail validation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationErrorKind {
    #[error("expected type {expected}, got {found}")]
    TypeMismatch { expected: &'static str, found: &'static str },

    #[error("expected to be in the range ({min} - {max}), got {value}")]
    Range { min: i64, max: i64, value: i64 },

    #[error("expected {description}, got {value:?}")]
    PatternMismatch { description: &'static str, value: String },

    #[error("expected one of {expected}, got {value:?}")]
    NotInSet { expected: String, value: String },

    #[error("{0}")]
    Parse(String),

    #[error("required field is missing")]
    Missing,
}

/// A validation failure attached to the field it was found at.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{path}: {kind}")]
pub struct ValidationError {
    pub path: FieldPath,
    pub kind: ValidationErrorKind,
}

/// The warnings and errors produced by one or more rules.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub warnings: Vec<String>,
    pub errors: Vec<ValidationError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(path: &FieldPath, kind: ValidationErrorKind) -> Self {
        Self {
            warnings: Vec::new(),
            errors: vec![ValidationError { path: path.clone(), kind }],
        }
    }

    pub fn type_mismatch(
        path: &FieldPath,
        expected: &'static str,
        found: &Value,
    ) -> Self {
        Self::error(
            path,
            ValidationErrorKind::TypeMismatch {
                expected,
                found: found.type_str(),
            },
        )
    }

    pub fn warn<S: Into<String>>(&mut self, warning: S) {
        self.warnings.push(warning.into());
    }

    pub fn merge(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
        self.errors.extend(other.errors);
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Yields the warnings if no errors were found, or else the diagnostics
    /// themselves.
    pub fn into_result(self) -> Result<Vec<String>, Diagnostics> {
        if self.is_ok() {
            Ok(self.warnings)
        } else {
            Err(self)
        }
    }
}

impl Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", e)?;
        }
        Ok(())
    }
}

/// A rule that checks one configuration value.
pub trait Validator: Send + Sync {
    fn validate(&self, value: &Value, path: &FieldPath) -> Diagnostics;
}

impl<F> Validator for F
where
    F: Fn(&Value, &FieldPath) -> Diagnostics + Send + Sync,
{
    fn validate(&self, value: &Value, path: &FieldPath) -> Diagnostics {
        self(value, path)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn field_path_display() {
        let path = FieldPath::from("disk").index(2).key("file_id");
        assert_eq!(path.to_string(), "disk[2].file_id");
        assert_eq!(FieldPath::from("vm_id").to_string(), "vm_id");
        assert_eq!(FieldPath::root().to_string(), "<root>");
    }

    #[test]
    fn diagnostics_merge_keeps_everything() {
        let path = FieldPath::from("vlan_ids");
        let mut diags = Diagnostics::new();
        diags.warn("first");
        diags.merge(Diagnostics::error(
            &path.index(0),
            ValidationErrorKind::Range { min: 1, max: 4094, value: 0 },
        ));
        diags.merge(Diagnostics::error(
            &path.index(1),
            ValidationErrorKind::Range { min: 1, max: 4094, value: 4095 },
        ));

        assert!(!diags.is_ok());
        assert_eq!(diags.warnings, vec!["first".to_string()]);
        assert_eq!(diags.errors.len(), 2);
        assert_eq!(
            diags.to_string(),
            "vlan_ids[0]: expected to be in the range (1 - 4094), got 0\n\
             vlan_ids[1]: expected to be in the range (1 - 4094), got 4095"
        );
    }

    #[test]
    fn closures_are_validators() {
        let reject_all = |v: &Value, p: &FieldPath| {
            Diagnostics::type_mismatch(p, "nothing", v)
        };
        let diags = reject_all.validate(&Value::Boolean(true), &"x".into());
        assert_eq!(
            diags.errors[0].kind,
            ValidationErrorKind::TypeMismatch {
                expected: "nothing",
                found: "boolean"
            }
        );
    }
}
