// src/models/store.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::validators::{validate_not_negative, validate_tax_id_field};

// --- Nível de acesso ---
// A ordem das variantes importa: Employee < Manager < Owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "access_level", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Employee,
    Manager,
    Owner,
}

// --- Loja (tenant) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: Uuid,
    #[schema(example = "Chaveiro Central")]
    pub name: String,
    #[schema(example = "11.222.333/0001-81")]
    pub tax_id: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[schema(example = "pix@chaveirocentral.com.br")]
    pub pix_key: Option<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Vínculo usuário <-> loja (funcionário) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoreUser {
    pub id: Uuid,
    #[schema(ignore)]
    pub store_id: Uuid,
    pub user_id: Uuid,
    pub access_level: AccessLevel,
    pub name: Option<String>,
    pub phone: Option<String>,
    #[schema(example = "Chaveiro")]
    pub job_title: Option<String>,
    #[schema(example = "2500.00")]
    pub salary: Option<Decimal>,
    pub admission_date: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Loja visível para o usuário logado (tela de seleção de loja).
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserStore {
    pub store_id: Uuid,
    pub store_name: String,
    pub access_level: AccessLevel,
}

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStorePayload {
    #[validate(length(min = 1, message = "O nome da loja é obrigatório."))]
    pub name: String,
    #[validate(custom(function = "validate_tax_id_field"))]
    pub tax_id: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub pix_key: Option<String>,
}

/// Cadastro de funcionário: cria o login, o vínculo e a concessão de acesso.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeePayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[schema(example = "joao@chavesmart.com.br")]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    /// Padrão: employee.
    pub access_level: Option<AccessLevel>,
    pub job_title: Option<String>,
    #[validate(custom(function = "validate_not_negative"))]
    pub salary: Option<Decimal>,
    #[schema(value_type = Option<String>, format = Date)]
    pub admission_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployeePayload {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub access_level: AccessLevel,
    pub job_title: Option<String>,
    #[validate(custom(function = "validate_not_negative"))]
    pub salary: Option<Decimal>,
    #[schema(value_type = Option<String>, format = Date)]
    pub admission_date: Option<NaiveDate>,
}
