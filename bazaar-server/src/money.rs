//! Money calculation utilities using rust_decimal for precision
//!
//! All monetary values are `Decimal` end to end (serialized as decimal
//! strings) and rounded to 2 decimal places half-up at every computation
//! boundary. Floats never touch a monetary field.

use rust_decimal::prelude::*;

use crate::utils::{ServiceError, ServiceResult};

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed amount per line / payment / withdrawal (1,000,000)
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Maximum allowed quantity per cart line / order line
pub const MAX_QUANTITY: i32 = 9999;

/// Round a monetary value to 2 decimal places (half-up)
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Per-line amount: unit price × quantity, rounded
pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    round_money(unit_price * Decimal::from(quantity))
}

/// Validate a monetary amount: strictly positive, within bounds
pub fn validate_amount(amount: Decimal, field: &str) -> ServiceResult<()> {
    if amount <= Decimal::ZERO {
        return Err(ServiceError::InvalidArgument(format!(
            "{} must be positive, got {}",
            field, amount
        )));
    }
    if amount > MAX_AMOUNT {
        return Err(ServiceError::InvalidArgument(format!(
            "{} exceeds maximum allowed ({}), got {}",
            field, MAX_AMOUNT, amount
        )));
    }
    Ok(())
}

/// Validate a unit price: non-negative, within bounds
pub fn validate_price(price: Decimal, field: &str) -> ServiceResult<()> {
    if price < Decimal::ZERO {
        return Err(ServiceError::InvalidArgument(format!(
            "{} must be non-negative, got {}",
            field, price
        )));
    }
    if price > MAX_AMOUNT {
        return Err(ServiceError::InvalidArgument(format!(
            "{} exceeds maximum allowed ({}), got {}",
            field, MAX_AMOUNT, price
        )));
    }
    Ok(())
}

/// Validate a quantity: positive, within bounds
pub fn validate_quantity(quantity: i32) -> ServiceResult<()> {
    if quantity <= 0 {
        return Err(ServiceError::InvalidArgument(format!(
            "quantity must be positive, got {}",
            quantity
        )));
    }
    if quantity > MAX_QUANTITY {
        return Err(ServiceError::InvalidArgument(format!(
            "quantity exceeds maximum allowed ({}), got {}",
            MAX_QUANTITY, quantity
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_round_money_half_up() {
        assert_eq!(round_money(dec("1.005")), dec("1.01"));
        assert_eq!(round_money(dec("1.004")), dec("1.00"));
        assert_eq!(round_money(dec("10")), dec("10"));
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line_total(dec("30.00"), 2), dec("60.00"));
        assert_eq!(line_total(dec("0.10"), 3), dec("0.30"));
    }

    #[test]
    fn test_validate_amount_rejects_zero_and_negative() {
        assert!(validate_amount(Decimal::ZERO, "amount").is_err());
        assert!(validate_amount(dec("-5"), "amount").is_err());
        assert!(validate_amount(dec("5"), "amount").is_ok());
    }

    #[test]
    fn test_validate_amount_rejects_out_of_bounds() {
        assert!(validate_amount(dec("1000001"), "amount").is_err());
        assert!(validate_amount(MAX_AMOUNT, "amount").is_ok());
    }

    #[test]
    fn test_validate_quantity_bounds() {
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_QUANTITY).is_ok());
        assert!(validate_quantity(MAX_QUANTITY + 1).is_err());
    }
}
