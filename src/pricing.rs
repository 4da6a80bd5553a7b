//! Pricing
//!
//! Line and cart totals. Amounts are exact decimals until the cart total is
//! turned into [`Money`] in the store currency, which rounds once to minor
//! units.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{
    Formatter, Money, Params, Position,
    iso::{self, Currency},
};
use thiserror::Error;

use crate::items::LineItem;

/// Currency every cart is priced in.
pub const CURRENCY: &Currency = iso::BRL;

const MINOR_UNITS: i64 = 100;

/// Errors that can occur while calculating totals.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    /// Decimal arithmetic overflowed.
    #[error("monetary amount overflowed")]
    Overflow,

    /// The amount cannot be represented in minor units.
    #[error("amount {0} cannot be represented in minor units")]
    OutOfRange(Decimal),
}

/// Calculates `unit_price * quantity`.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the multiplication overflows.
pub fn line_total(unit_price: Decimal, quantity: u32) -> Result<Decimal, PricingError> {
    unit_price
        .checked_mul(Decimal::from(quantity))
        .ok_or(PricingError::Overflow)
}

/// Calculates the total price of a list of line items.
///
/// An empty list totals zero.
///
/// # Errors
///
/// - [`PricingError::Overflow`]: the sum overflowed.
/// - [`PricingError::OutOfRange`]: the sum does not fit in minor units.
pub fn total_price(items: &[LineItem]) -> Result<Money<'static, Currency>, PricingError> {
    let sum = items.iter().try_fold(Decimal::ZERO, |acc, item| {
        acc.checked_add(item.line_total())
            .ok_or(PricingError::Overflow)
    })?;

    to_money(sum)
}

/// Converts a decimal amount into [`Money`] in the store currency.
///
/// Rounds half away from zero to two decimal places.
///
/// # Errors
///
/// Returns [`PricingError::OutOfRange`] if the amount does not fit in minor units.
pub fn to_money(amount: Decimal) -> Result<Money<'static, Currency>, PricingError> {
    let minor_units = amount
        .checked_mul(Decimal::new(MINOR_UNITS, 0))
        .map(|value| value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|value| value.to_i64())
        .ok_or(PricingError::OutOfRange(amount))?;

    Ok(Money::from_minor(minor_units, CURRENCY))
}

/// Formats money the pt-BR way: `R$ 1.234,50`.
pub fn format_money(money: &Money<'_, Currency>) -> String {
    Formatter::money(money, pt_br_params())
}

/// Formatted zero amount (`R$ 0,00`).
pub fn zero_formatted() -> String {
    format_money(&Money::from_minor(0, CURRENCY))
}

fn pt_br_params() -> Params<'static> {
    Params {
        digit_separator: '.',
        exponent_separator: ',',
        separator_pattern: &[3, 3, 3],
        positions: &[
            Position::Sign,
            Position::Symbol,
            Position::Space,
            Position::Amount,
        ],
        rounding: Some(CURRENCY.exponent),
        symbol: Some(CURRENCY.symbol),
        code: Some(CURRENCY.iso_alpha_code),
    }
}
