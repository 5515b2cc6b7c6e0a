// src/common/validation.rs

use rust_decimal::Decimal;
use validator::ValidationError;

// Validadores customizados usados pelos payloads (`#[validate(custom(...))]`)

pub fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() && !val.is_zero() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("value_not_negative".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.add_param("exclusive_min".into(), &0.0);
        err.message = Some("target_must_be_positive".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_not_negative_but_not_positive_either() {
        assert!(validate_not_negative(&Decimal::ZERO).is_ok());
        assert!(validate_positive(&Decimal::ZERO).is_err());
    }

    #[test]
    fn negative_values_carry_the_translation_code() {
        let err = validate_not_negative(&Decimal::from(-10)).unwrap_err();
        assert_eq!(err.message.as_deref(), Some("value_not_negative"));
        assert!(validate_positive(&Decimal::new(1, 2)).is_ok());
    }
}
