use crate::utils::{Result, TranslatorError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single-letter spreadsheet column (`A`..=`Z`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColumnRef(u8);

impl ColumnRef {
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let mut chars = trimmed.chars();

        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => {
                Ok(Self(c.to_ascii_uppercase() as u8))
            }
            _ => Err(TranslatorError::InvalidColumnReference(input.to_string())),
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        if index < 26 {
            Some(Self(b'A' + index as u8))
        } else {
            None
        }
    }

    /// Zero-based column index.
    pub fn index(self) -> usize {
        (self.0 - b'A') as usize
    }

    pub fn letter(self) -> char {
        self.0 as char
    }
}

/// Zero-based index of a single column letter.
pub fn resolve(letter: &str) -> Result<usize> {
    ColumnRef::parse(letter).map(ColumnRef::index)
}

/// A1-style column name for any zero-based index (0 -> A, 25 -> Z, 26 -> AA).
pub fn column_name(index: usize) -> String {
    let mut n = index + 1;
    let mut name = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        name.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    name.reverse();
    String::from_utf8(name).unwrap_or_default()
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for ColumnRef {
    type Err = TranslatorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ColumnRef {
    type Error = TranslatorError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ColumnRef> for String {
    fn from(value: ColumnRef) -> Self {
        value.letter().to_string()
    }
}

/// Source and target columns of one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPlan {
    pub source: ColumnRef,
    pub target: ColumnRef,
}

impl ColumnPlan {
    pub fn new(source: ColumnRef, target: ColumnRef) -> Self {
        Self { source, target }
    }

    pub fn parse(source: &str, target: &str) -> Result<Self> {
        Ok(Self {
            source: ColumnRef::parse(source)?,
            target: ColumnRef::parse(target)?,
        })
    }
}
