//! # Money
//!
//! Amounts in integer cents. Prices, line totals, order totals and payments
//! all use [`Money`], so the exact-payment rule is an integer comparison.
//!
//! ## Exact Payment
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  order total      "8.00"  ──► 800                                      │
//! │  payment offered  "7.99"  ──► 799      799 < 800  ──► UnderPayment     │
//! │  payment offered  "8.00"  ──► 800      800 = 800  ──► Paid             │
//! │  payment offered  "8.001" ──► rejected while parsing (3 decimals)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use emporium_core::money::Money;
//!
//! let price = Money::from_cents(1099); // $10.99
//! let doubled = price * 2;             // $21.98
//! let total = price + Money::from_cents(500);
//! assert_eq!(total.cents(), 1599);
//!
//! // Parsing user input (CLI arguments)
//! let paid: Money = "7.99".parse().unwrap();
//! assert_eq!(paid.cents(), 799);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};
use std::str::FromStr;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A signed amount of cents. Serializes as a bare integer.
///
/// ## Where Money is Used
/// ```text
/// Product.price_cents ──► OrderLine.unit_price ──► OrderLine.line_total
///                                                        │
///                                            Σ lines ────▼
///                                                  Order.total ◄── Payment.amount
///                                                        (must be equal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Line total for `qty` units at this unit price.
    ///
    /// ## Example
    /// ```rust
    /// use emporium_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(1000); // $10.00
    /// let line_total = unit_price.multiply_quantity(3);
    /// assert_eq!(line_total.cents(), 3000); // $30.00
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Multiplies by a quantity, returning `None` on overflow.
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Adds two amounts, returning `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// `$10.99`, `-$5.50`, `$0.00`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}${}.{:02}", abs / 100, abs % 100)
    }
}

/// Parses a non-negative decimal amount such as `"30"`, `"7.99"`, `"0.5"`
/// or `"$8.00"`.
///
/// ## Rules
/// - At most two fractional digits (no silent rounding)
/// - No sign, no exponent, no thousands separators
impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let s = s.trim();
        let s = s.strip_prefix('$').unwrap_or(s);
        if s.is_empty() {
            return Err(ValidationError::Required {
                field: "amount".to_string(),
            });
        }

        let (major, minor) = match s.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (s, ""),
        };

        if major.is_empty() && minor.is_empty() {
            return Err(invalid("no digits"));
        }
        if !major.chars().all(|c| c.is_ascii_digit()) || !minor.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("expected a non-negative decimal like 12.50"));
        }
        if minor.len() > 2 {
            return Err(invalid("at most two decimal places are allowed"));
        }

        let major: i64 = if major.is_empty() {
            0
        } else {
            major.parse().map_err(|_| invalid("amount is too large"))?
        };
        // "5" → 50 cents, "05" → 5 cents
        let minor: i64 = match minor.len() {
            0 => 0,
            1 => minor.parse::<i64>().map_err(|_| invalid("bad cents"))? * 10,
            _ => minor.parse().map_err(|_| invalid("bad cents"))?,
        };

        major
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .map(Money)
            .ok_or_else(|| invalid("amount is too large"))
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
