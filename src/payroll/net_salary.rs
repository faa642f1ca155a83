//! Net salary derivation using `rust_decimal` for precision.
//!
//! Amounts are stored as `DECIMAL(15,2)`, so every accepted amount already fits
//! the column exactly and the difference of two of them does too.

use rust_decimal::Decimal;

use crate::error::{AppError, FieldError};

/// Decimal places an amount may carry
const MAX_SCALE: u32 = 2;

/// Largest amount the money columns can hold
const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_7FFF, 0x0003_8D7E, 0, false, 2);

pub fn net_salary(gross: Decimal, deduction: Decimal) -> Decimal {
    gross - deduction
}

fn check_amount(value: Decimal, field: &str, label: &str, errors: &mut Vec<FieldError>) {
    if value < Decimal::ZERO {
        errors.push(FieldError::new(field, format!("{label} must not be negative")));
    } else if value.normalize().scale() > MAX_SCALE {
        errors.push(FieldError::new(
            field,
            format!("{label} must have at most {MAX_SCALE} decimal places"),
        ));
    } else if value > MAX_AMOUNT {
        errors.push(FieldError::new(field, format!("{label} is too large")));
    }
}

/// True when `value` fits a money column: non-negative, cents at most.
pub fn is_storable_amount(value: Decimal) -> bool {
    value >= Decimal::ZERO && value.normalize().scale() <= MAX_SCALE && value <= MAX_AMOUNT
}

/// Validates a gross/deduction pair.
pub fn check_amounts(gross: Decimal, deduction: Decimal) -> Result<(), AppError> {
    let mut errors = Vec::new();
    check_amount(gross, "grossSalary", "Gross salary", &mut errors);
    check_amount(deduction, "totalDeduction", "Total deduction", &mut errors);

    if errors.is_empty() && deduction > gross {
        errors.push(FieldError::new(
            "totalDeduction",
            "Total deduction cannot exceed gross salary",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// Checks the pair and returns the net amount to store.
pub fn derive(gross: Decimal, deduction: Decimal) -> Result<Decimal, AppError> {
    check_amounts(gross, deduction)?;
    Ok(net_salary(gross, deduction))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_net_salary_scenario() {
        assert_eq!(net_salary(dec("800000"), dec("150000")), dec("650000"));
    }

    #[test]
    fn test_net_salary_is_exact_for_cents() {
        // 0.30 - 0.10 drifts in f64
        assert_ne!(0.3_f64 - 0.1_f64, 0.2_f64);
        assert_eq!(net_salary(dec("0.30"), dec("0.10")), dec("0.20"));
        assert_eq!(net_salary(dec("1234.56"), dec("234.56")), dec("1000"));
    }

    #[test]
    fn test_repeated_round_trips_do_not_drift() {
        let gross = dec("1000.10");
        let deduction = dec("0.03");
        let mut net = net_salary(gross, deduction);
        for _ in 0..1000 {
            let reparsed = dec(&net.to_string());
            net = net_salary(reparsed + deduction, deduction);
        }
        assert_eq!(net, dec("1000.07"));
    }

    #[test]
    fn test_zero_deduction_and_full_deduction() {
        assert_eq!(derive(dec("500"), Decimal::ZERO).unwrap(), dec("500"));
        assert_eq!(derive(dec("500"), dec("500")).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_deduction_above_gross_rejected() {
        let err = derive(dec("100"), dec("100.01")).unwrap_err();
        match err {
            AppError::Validation(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "totalDeduction");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_negative_amounts_rejected() {
        let err = check_amounts(dec("-1"), dec("-2")).unwrap_err();
        match err {
            AppError::Validation(errors) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["grossSalary", "totalDeduction"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_sub_cent_amounts_rejected() {
        assert!(check_amounts(dec("100.001"), Decimal::ZERO).is_err());
        // trailing zeros are not extra precision
        assert!(check_amounts(dec("100.1000"), Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_storable_amount() {
        assert!(is_storable_amount(dec("500000")));
        assert!(is_storable_amount(Decimal::ZERO));
        assert!(!is_storable_amount(dec("-0.01")));
        assert!(!is_storable_amount(dec("0.005")));
    }

    #[test]
    fn test_amount_ceiling() {
        assert!(check_amounts(dec("9999999999999.99"), Decimal::ZERO).is_ok());
        assert!(check_amounts(dec("10000000000000.00"), Decimal::ZERO).is_err());
    }
}
