// src/common/validators.rs
//
// Validações customizadas usadas pelos payloads (`#[validate(custom(...))]`).

use rust_decimal::Decimal;
use validator::ValidationError;

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

pub fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() && !val.is_zero() {
        let mut err = error("range", "O valor não pode ser negativo.");
        err.add_param("min".into(), &0.0);
        return Err(err);
    }
    Ok(())
}

pub fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = error("range", "O valor deve ser maior que zero.");
        err.add_param("min".into(), &0.01);
        return Err(err);
    }
    Ok(())
}

pub fn validate_not_blank(val: &str) -> Result<(), ValidationError> {
    if val.trim().is_empty() {
        return Err(error("required", "O campo não pode ficar em branco."));
    }
    Ok(())
}

pub fn validate_cpf_field(val: &str) -> Result<(), ValidationError> {
    if is_valid_cpf(val) {
        Ok(())
    } else {
        Err(error("cpf", "CPF inválido."))
    }
}

pub fn validate_tax_id_field(val: &str) -> Result<(), ValidationError> {
    if is_valid_cpf(val) || is_valid_cnpj(val) {
        Ok(())
    } else {
        Err(error("tax_id", "CPF/CNPJ inválido."))
    }
}

fn digits_of(value: &str) -> Vec<u32> {
    value.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn all_equal(digits: &[u32]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

/// CPF: 11 dígitos, dois dígitos verificadores módulo 11.
/// Aceita pontuação (`111.444.777-35`).
pub fn is_valid_cpf(value: &str) -> bool {
    if value.chars().any(|c| !(c.is_ascii_digit() || c == '.' || c == '-' || c == ' ')) {
        return false;
    }
    let digits = digits_of(value);
    if digits.len() != 11 || all_equal(&digits) {
        return false;
    }

    let check = |len: usize| -> u32 {
        let sum: u32 = digits[..len]
            .iter()
            .enumerate()
            .map(|(i, d)| d * (len as u32 + 1 - i as u32))
            .sum();
        let rest = (sum * 10) % 11;
        if rest == 10 { 0 } else { rest }
    };

    check(9) == digits[9] && check(10) == digits[10]
}

/// CNPJ: 14 dígitos, pesos 5..2,9..2 e 6..2,9..2.
pub fn is_valid_cnpj(value: &str) -> bool {
    if value
        .chars()
        .any(|c| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '/' || c == ' '))
    {
        return false;
    }
    let digits = digits_of(value);
    if digits.len() != 14 || all_equal(&digits) {
        return false;
    }

    const WEIGHTS_1: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
    const WEIGHTS_2: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

    let check = |weights: &[u32]| -> u32 {
        let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
        let rest = sum % 11;
        if rest < 2 { 0 } else { 11 - rest }
    };

    check(&WEIGHTS_1) == digits[12] && check(&WEIGHTS_2) == digits[13]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().expect("decimal")
    }

    #[test]
    fn known_cpf_is_valid_with_or_without_mask() {
        assert!(is_valid_cpf("111.444.777-35"));
        assert!(is_valid_cpf("11144477735"));
    }

    #[test]
    fn repeated_digit_cpf_is_invalid() {
        assert!(!is_valid_cpf("111.111.111-11"));
        assert!(!is_valid_cpf("000.000.000-00"));
    }

    #[test]
    fn cpf_with_wrong_check_digit_is_invalid() {
        assert!(!is_valid_cpf("111.444.777-36"));
        assert!(!is_valid_cpf("111.444.777"));
        assert!(!is_valid_cpf("111.444.777-3a"));
    }

    #[test]
    fn known_cnpj_is_valid() {
        assert!(is_valid_cnpj("11.222.333/0001-81"));
        assert!(is_valid_cnpj("11222333000181"));
    }

    #[test]
    fn any_single_digit_change_invalidates_cnpj() {
        let base: Vec<u32> = digits_of("11222333000181");
        for position in 0..base.len() {
            let mutated: String = base
                .iter()
                .enumerate()
                .map(|(i, d)| if i == position { (d + 1) % 10 } else { *d })
                .map(|d| char::from_digit(d, 10).expect("digit"))
                .collect();
            assert!(!is_valid_cnpj(&mutated), "mutation at {position} stayed valid: {mutated}");
        }
    }

    #[test]
    fn repeated_digit_cnpj_is_invalid() {
        assert!(!is_valid_cnpj("11.111.111/1111-11"));
    }

    #[test]
    fn tax_id_field_accepts_cpf_or_cnpj() {
        assert!(validate_tax_id_field("111.444.777-35").is_ok());
        assert!(validate_tax_id_field("11.222.333/0001-81").is_ok());
        assert!(validate_tax_id_field("123").is_err());
    }

    #[test]
    fn decimal_validators() {
        assert!(validate_not_negative(&dec("0")).is_ok());
        assert!(validate_not_negative(&dec("-0.01")).is_err());
        assert!(validate_positive(&dec("0")).is_err());
        assert!(validate_positive(&dec("0.01")).is_ok());
    }
}
