// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Disk size strings such as `8G`, `512M` or `2T`.
//!
//! Sizes are normalized to whole gigabytes. Parsing is split in two: the
//! suffix is classified into a [`SizeUnit`], then [`to_gigabytes`] scales the
//! amount and rounds up.

use std::str::FromStr;

use thiserror::Error;

/// The value reported alongside a size that could not be parsed.
pub const SIZE_PARSE_SENTINEL: i64 = -1;

/// The unit suffix of a size string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeUnit {
    Mega,
    Giga,
    Tera,
}

impl SizeUnit {
    /// Splits `s` into its amount and unit, if it ends in a known suffix.
    pub fn classify(s: &str) -> Option<(&str, SizeUnit)> {
        let unit = match s.chars().last()? {
            'M' => SizeUnit::Mega,
            'G' => SizeUnit::Giga,
            'T' => SizeUnit::Tera,
            _ => return None,
        };
        Some((&s[..s.len() - 1], unit))
    }

    /// The unit's size in gigabytes, as a numerator/denominator pair.
    const fn ratio(self) -> (i64, i64) {
        match self {
            SizeUnit::Mega => (1, 1024),
            SizeUnit::Giga => (1, 1),
            SizeUnit::Tera => (1024, 1),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SizeParseError {
    #[error("cannot parse storage size {0:?}: no unit suffix (T, G or M)")]
    UnknownUnit(String),

    #[error("cannot parse storage size {0:?}: {1}")]
    InvalidAmount(String, std::num::ParseIntError),

    #[error("cannot parse storage size {0:?}: out of range")]
    Overflow(String),
}

impl SizeParseError {
    /// The size value the failed parse yields.
    pub fn sentinel(&self) -> i64 {
        SIZE_PARSE_SENTINEL
    }
}

/// Converts `amount` of `unit` to gigabytes, rounding up to a whole
/// gigabyte. Returns `None` on overflow.
pub fn to_gigabytes(amount: i64, unit: SizeUnit) -> Option<i64> {
    let (num, den) = unit.ratio();
    let scaled = amount.checked_mul(num)?;
    // Ceiling division for a positive denominator.
    Some(-scaled.checked_neg()?.div_euclid(den))
}

/// Parses a size string into gigabytes. An absent size is zero.
pub fn parse_size(size: Option<&str>) -> Result<i64, SizeParseError> {
    let Some(size) = size else {
        return Ok(0);
    };

    let (amount, unit) = SizeUnit::classify(size)
        .ok_or_else(|| SizeParseError::UnknownUnit(size.to_owned()))?;

    let amount = i64::from_str(amount)
        .map_err(|e| SizeParseError::InvalidAmount(size.to_owned(), e))?;

    to_gigabytes(amount, unit)
        .ok_or_else(|| SizeParseError::Overflow(size.to_owned()))
}
