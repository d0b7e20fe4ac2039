//! Type-safe price representation using decimal arithmetic.

use std::iter::Sum;
use std::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
///
/// Cart line prices and the cart subtotal are carried as `Price` so decimal
/// arithmetic never goes through floating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., taka, not poisha).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A zero price in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Multiply this unit price by a line quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self {
            amount: self.amount * Decimal::from(quantity),
            currency_code: self.currency_code,
        }
    }

    /// Format for display (e.g., "৳1,299" renders upstream; here "1299.00 BDT").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{:.2} {:?}", self.amount, self.currency_code)
    }
}

impl Add for Price {
    type Output = Self;

    /// Adds two prices. Mixed-currency addition keeps the left operand's
    /// currency; the API never returns mixed-currency carts.
    fn add(self, rhs: Self) -> Self {
        Self {
            amount: self.amount + rhs.amount,
            currency_code: self.currency_code,
        }
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(CurrencyCode::default()), |acc, p| Self {
            amount: acc.amount + p.amount,
            currency_code: p.currency_code,
        })
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    BDT,
    USD,
    EUR,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bdt(amount: &str) -> Price {
        Price::new(amount.parse().expect("decimal literal"), CurrencyCode::BDT)
    }

    #[test]
    fn test_times_quantity() {
        let unit = bdt("19.99");
        assert_eq!(unit.times(3), bdt("59.97"));
    }

    #[test]
    fn test_times_zero_quantity() {
        assert_eq!(bdt("10.00").times(0).amount, Decimal::ZERO);
    }

    #[test]
    fn test_add() {
        assert_eq!(bdt("1.10") + bdt("2.20"), bdt("3.30"));
    }

    #[test]
    fn test_sum() {
        let total: Price = [bdt("1.00"), bdt("2.50"), bdt("0.50")].into_iter().sum();
        assert_eq!(total, bdt("4.00"));
    }

    #[test]
    fn test_zero() {
        let zero = Price::zero(CurrencyCode::BDT);
        assert_eq!(zero.amount, Decimal::ZERO);
        assert_eq!(zero.currency_code, CurrencyCode::BDT);
    }

    #[test]
    fn test_default_is_zero_in_default_currency() {
        assert_eq!(Price::default(), Price::zero(CurrencyCode::default()));
    }

    #[test]
    fn test_display() {
        assert_eq!(bdt("1299").display(), "1299.00 BDT");
    }
}
