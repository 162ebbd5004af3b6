//! Core value types for the campaign launcher.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod budget;
pub mod code;
pub mod id;
pub mod status;

pub use budget::{Budget, ZeroBudget};
pub use code::{CodeError, CountryCode, CurrencyCode};
pub use id::*;
pub use status::*;
