//! Fixed-point currency amounts.
//!
//! Amounts are stored as an integer count of miliunits (thousandths of a
//! currency unit) so that no floating-point rounding ever reaches the
//! database. Conversion to and from decimal values only happens at the edges:
//! form parsing, CSV import and display.

use std::iter::Sum;

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::Error;

/// A currency amount as an integer count of miliunits.
///
/// Positive values represent income/credits, negative values represent
/// expenses/debits.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Miliunits(i64);

/// How many miliunits make up one currency unit.
const MILIUNITS_PER_UNIT: f64 = 1000.0;

impl Miliunits {
    /// Zero dollars and zero cents.
    pub const ZERO: Miliunits = Miliunits(0);

    /// Convert a decimal currency amount (e.g. dollars) to miliunits,
    /// rounding to the nearest miliunit.
    ///
    /// # Errors
    /// Returns [Error::InvalidAmount] if `amount` is not a finite number or
    /// its magnitude does not fit in an `i64` once scaled.
    pub fn from_decimal(amount: f64) -> Result<Self, Error> {
        let scaled = amount * MILIUNITS_PER_UNIT;

        if !scaled.is_finite() || scaled.abs() >= i64::MAX as f64 {
            return Err(Error::InvalidAmount(amount));
        }

        Ok(Self(scaled.round() as i64))
    }

    /// Convert back to a decimal currency amount for display.
    pub fn to_decimal(self) -> f64 {
        self.0 as f64 / MILIUNITS_PER_UNIT
    }

    /// Wrap a raw miliunit count.
    pub fn from_raw(miliunits: i64) -> Self {
        Self(miliunits)
    }

    /// The raw miliunit count.
    pub fn as_raw(self) -> i64 {
        self.0
    }

    /// Whether this amount is an expense (strictly negative).
    pub fn is_expense(self) -> bool {
        self.0 < 0
    }
}

impl Sum for Miliunits {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|amount| amount.0).sum())
    }
}

impl std::ops::Add for Miliunits {
    type Output = Miliunits;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Miliunits {
    type Output = Miliunits;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl ToSql for Miliunits {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for Miliunits {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(Miliunits)
    }
}
