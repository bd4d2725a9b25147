//! Dense cell identifiers and the letter-plus-digits name syntax from the
//! input/output text formats.

use core::fmt;
use std::str::FromStr;

use crate::error::EngineError;

/// A dense, zero-based index assigned to a cell the first time its name is
/// seen, either as the cell being defined or as a reference inside a
/// formula. `CellId`s key every downstream structure (store, DAG, queue).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct CellId(pub u32);

impl CellId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for CellId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// A validated cell name: one uppercase letter `A`-`Z` followed by one or
/// more decimal digits, e.g. `A0`, `Z17`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct CellName {
    column: char,
    row: u32,
}

impl CellName {
    pub fn new(column: char, row: u32) -> Self {
        debug_assert!(column.is_ascii_uppercase());
        Self { column, row }
    }

    pub fn column(&self) -> char {
        self.column
    }

    pub fn row(&self) -> u32 {
        self.row
    }

    /// Sort key for rendered output: column letter ascending, then row
    /// number ascending.
    pub fn sort_key(&self) -> (char, u32) {
        (self.column, self.row)
    }
}

impl fmt::Display for CellName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.column, self.row)
    }
}

impl FromStr for CellName {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        let column = match chars.next() {
            Some(c) if c.is_ascii_uppercase() => c,
            _ => return Err(EngineError::MalformedName(s.to_string())),
        };
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(EngineError::MalformedName(s.to_string()));
        }
        let row: u32 = digits
            .parse()
            .map_err(|_| EngineError::MalformedName(s.to_string()))?;
        Ok(Self { column, row })
    }
}
