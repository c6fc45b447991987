// src/models/crm.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::validators::{is_valid_cnpj, is_valid_cpf, validate_not_blank};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "person_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PersonKind {
    Fisica,   // CPF
    Juridica, // CNPJ
}

// --- CLIENTE ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    #[schema(ignore)]
    pub store_id: Uuid,

    #[schema(example = "João da Silva")]
    pub name: String,
    pub email: Option<String>,
    #[schema(example = "(11) 98888-7777")]
    pub phone: Option<String>,

    pub person_kind: PersonKind,
    #[schema(example = "111.444.777-35")]
    pub tax_id: Option<String>,

    // Endereço
    #[schema(example = "01310-100")]
    pub zip_code: Option<String>,
    pub street: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    #[schema(example = "SP")]
    pub state: Option<String>,

    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_customer_tax_id"))]
pub struct CustomerPayload {
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default = "default_person_kind")]
    pub person_kind: PersonKind,
    /// CPF (pessoa física) ou CNPJ (pessoa jurídica).
    pub tax_id: Option<String>,
    #[validate(custom(function = "validate_zip_code"))]
    pub zip_code: Option<String>,
    pub street: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    #[validate(length(equal = 2, message = "Use a sigla do estado (ex: SP)."))]
    pub state: Option<String>,
    pub notes: Option<String>,
}

fn default_person_kind() -> PersonKind {
    PersonKind::Fisica
}

fn validate_customer_tax_id(payload: &CustomerPayload) -> Result<(), ValidationError> {
    let Some(tax_id) = payload.tax_id.as_deref().filter(|t| !t.trim().is_empty()) else {
        return Ok(());
    };
    let valid = match payload.person_kind {
        PersonKind::Fisica => is_valid_cpf(tax_id),
        PersonKind::Juridica => is_valid_cnpj(tax_id),
    };
    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("tax_id");
        err.message = Some(match payload.person_kind {
            PersonKind::Fisica => "CPF inválido.".into(),
            PersonKind::Juridica => "CNPJ inválido.".into(),
        });
        Err(err)
    }
}

/// CEP: 8 dígitos, com ou sem hífen.
fn validate_zip_code(zip: &str) -> Result<(), ValidationError> {
    let digits = zip.chars().filter(char::is_ascii_digit).count();
    let only_allowed = zip.chars().all(|c| c.is_ascii_digit() || c == '-');
    if digits == 8 && only_allowed {
        Ok(())
    } else {
        let mut err = ValidationError::new("zip_code");
        err.message = Some("CEP inválido.".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(kind: PersonKind, tax_id: &str) -> CustomerPayload {
        CustomerPayload {
            name: "João da Silva".into(),
            email: None,
            phone: None,
            person_kind: kind,
            tax_id: Some(tax_id.into()),
            zip_code: None,
            street: None,
            number: None,
            complement: None,
            district: None,
            city: None,
            state: None,
            notes: None,
        }
    }

    #[test]
    fn tax_id_must_match_person_kind() {
        assert!(payload(PersonKind::Fisica, "111.444.777-35").validate().is_ok());
        assert!(payload(PersonKind::Juridica, "11.222.333/0001-81").validate().is_ok());
        assert!(payload(PersonKind::Juridica, "111.444.777-35").validate().is_err());
        assert!(payload(PersonKind::Fisica, "111.111.111-11").validate().is_err());
    }

    #[test]
    fn blank_tax_id_is_allowed() {
        assert!(payload(PersonKind::Fisica, "  ").validate().is_ok());
    }

    #[test]
    fn zip_code_format() {
        assert!(validate_zip_code("01310-100").is_ok());
        assert!(validate_zip_code("01310100").is_ok());
        assert!(validate_zip_code("0131-0100a").is_err());
        assert!(validate_zip_code("123").is_err());
    }
}
