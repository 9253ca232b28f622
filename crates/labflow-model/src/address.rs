//! Slot addresses within labware
//!
//! Provides [`Address`] for addressing slots by row and column.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Row/column position of a slot, both 1-based
///
/// # Examples
/// - `Address::new(1, 1)` → `A1`
/// - `Address::new(2, 12)` → `B12`
/// - rows past `Z` display as `row,column`, e.g. `27,3`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address {
    row: u32,
    column: u32,
}

impl Address {
    /// Create new address
    ///
    /// # Panics
    /// Panics if `row` or `column` is zero. Use [`Address::try_new`] for
    /// untrusted input.
    #[inline]
    #[must_use]
    pub fn new(row: u32, column: u32) -> Self {
        assert!(row > 0 && column > 0, "address components are 1-based");
        Self { row, column }
    }

    /// Create new address, rejecting zero components
    pub fn try_new(row: u32, column: u32) -> Result<Self, AddressError> {
        if row == 0 || column == 0 {
            return Err(AddressError::ZeroComponent(format!("{row},{column}")));
        }
        Ok(Self { row, column })
    }

    /// Row, starting at 1
    #[inline]
    #[must_use]
    pub fn row(&self) -> u32 {
        self.row
    }

    /// Column, starting at 1
    #[inline]
    #[must_use]
    pub fn column(&self) -> u32 {
        self.column
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.row <= 26 {
            let letter = char::from(b'A' + u8::try_from(self.row - 1).map_err(|_| fmt::Error)?);
            write!(f, "{letter}{}", self.column)
        } else {
            write!(f, "{},{}", self.row, self.column)
        }
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AddressError::Empty);
        }

        if let Some((row, column)) = s.split_once(',') {
            let row = row
                .trim()
                .parse::<u32>()
                .map_err(|_| AddressError::Invalid(s.to_string()))?;
            let column = column
                .trim()
                .parse::<u32>()
                .map_err(|_| AddressError::Invalid(s.to_string()))?;
            return Self::try_new(row, column);
        }

        let mut chars = s.chars();
        let letter = chars
            .next()
            .filter(char::is_ascii_alphabetic)
            .ok_or_else(|| AddressError::Invalid(s.to_string()))?;
        let row = u32::from(letter.to_ascii_uppercase()) - u32::from('A') + 1;
        let column = chars
            .as_str()
            .parse::<u32>()
            .map_err(|_| AddressError::Invalid(s.to_string()))?;
        Self::try_new(row, column)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors related to addresses
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    /// Blank input
    #[error("address is empty")]
    Empty,

    /// Unparseable input
    #[error("invalid address: {0}")]
    Invalid(String),

    /// Row or column of zero
    #[error("address components start at 1: {0}")]
    ZeroComponent(String),
}
