//! ISO country and currency codes.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`CountryCode`] or [`CurrencyCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CodeError {
    /// The input has the wrong number of characters.
    #[error("{kind} code must be exactly {expected} letters, got {got:?}")]
    WrongLength {
        /// Which kind of code was being parsed.
        kind: &'static str,
        /// Required length.
        expected: usize,
        /// The rejected input.
        got: String,
    },
    /// The input contains something other than ASCII letters.
    #[error("{kind} code must contain only ASCII letters, got {got:?}")]
    NotAlphabetic {
        /// Which kind of code was being parsed.
        kind: &'static str,
        /// The rejected input.
        got: String,
    },
}

fn parse_code(s: &str, kind: &'static str, expected: usize) -> Result<String, CodeError> {
    let trimmed = s.trim();
    if trimmed.len() != expected {
        return Err(CodeError::WrongLength {
            kind,
            expected,
            got: trimmed.to_string(),
        });
    }
    if !trimmed.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(CodeError::NotAlphabetic {
            kind,
            got: trimmed.to_string(),
        });
    }
    Ok(trimmed.to_ascii_uppercase())
}

/// ISO 3166-1 alpha-2 country code, stored uppercase (e.g. `CO`).
///
/// ```
/// use campaign_launcher_core::CountryCode;
///
/// assert_eq!(CountryCode::parse("co").unwrap().as_str(), "CO");
/// assert!(CountryCode::parse("COL").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

impl CountryCode {
    /// Parse a two-letter country code.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not exactly two ASCII letters.
    pub fn parse(s: &str) -> Result<Self, CodeError> {
        parse_code(s, "country", 2).map(Self)
    }

    /// Wrap a code known to be valid (builtin tables).
    pub(crate) fn from_static(code: &'static str) -> Self {
        Self(code.to_string())
    }

    /// Get the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// ISO 4217 currency code, stored uppercase (e.g. `COP`).
///
/// Informational only; budgets are sent to the platform in the ad account's
/// own currency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parse a three-letter currency code.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not exactly three ASCII letters.
    pub fn parse(s: &str) -> Result<Self, CodeError> {
        parse_code(s, "currency", 3).map(Self)
    }

    /// Wrap a code known to be valid (builtin tables).
    pub(crate) fn from_static(code: &'static str) -> Self {
        Self(code.to_string())
    }

    /// Get the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! impl_code_traits {
    ($name:ident) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = CodeError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl From<$name> for String {
            fn from(code: $name) -> Self {
                code.0
            }
        }
    };
}

impl_code_traits!(CountryCode);
impl_code_traits!(CurrencyCode);
