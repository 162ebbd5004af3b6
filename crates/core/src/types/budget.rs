//! Daily budget expressed in minor currency units.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A daily budget in the ad account currency's minor unit.
///
/// The platform takes budgets as integers in the smallest unit it tracks for
/// the account's currency, so no decimal arithmetic is involved. A budget is
/// never zero; [`Budget::new`] rejects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Budget(u64);

/// Error returned when constructing a zero [`Budget`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("budget must be greater than zero")]
pub struct ZeroBudget;

impl Budget {
    /// Create a budget from minor units.
    ///
    /// # Errors
    ///
    /// Returns [`ZeroBudget`] if `minor_units` is zero.
    pub const fn new(minor_units: u64) -> Result<Self, ZeroBudget> {
        if minor_units == 0 {
            return Err(ZeroBudget);
        }
        Ok(Self(minor_units))
    }

    /// The amount in minor units.
    #[must_use]
    pub const fn minor_units(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u64> for Budget {
    type Error = ZeroBudget;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Budget> for u64 {
    fn from(budget: Budget) -> Self {
        budget.0
    }
}
