// src/models/finance.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::validators::{validate_not_blank, validate_positive};

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payable_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PayableStatus {
    Pendente,
    Paga,
    Atrasada,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "receivable_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReceivableStatus {
    Pendente,
    Recebida,
    Atrasada,
}

// --- Conta a pagar ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayableAccount {
    pub id: Uuid,
    #[schema(ignore)]
    pub store_id: Uuid,
    #[schema(example = "Aluguel da loja")]
    pub description: String,
    #[schema(example = "1800.00")]
    pub amount: Decimal,
    #[schema(value_type = String, format = Date, example = "2025-02-05")]
    pub due_date: NaiveDate,
    #[schema(value_type = Option<String>, format = Date)]
    pub paid_date: Option<NaiveDate>,
    pub category_id: Option<Uuid>,
    pub status: PayableStatus,
    pub is_recurring: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Conta a receber ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceivableAccount {
    pub id: Uuid,
    #[schema(ignore)]
    pub store_id: Uuid,
    #[schema(example = "Serviço de instalação - Condomínio Azul")]
    pub description: String,
    #[schema(example = "450.00")]
    pub amount: Decimal,
    pub customer_id: Option<Uuid>,
    pub sale_id: Option<Uuid>,
    #[schema(value_type = String, format = Date, example = "2025-02-15")]
    pub due_date: NaiveDate,
    #[schema(value_type = Option<String>, format = Date)]
    pub received_date: Option<NaiveDate>,
    pub status: ReceivableStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayablePayload {
    #[validate(custom(function = "validate_not_blank"), length(max = 255))]
    #[schema(example = "Aluguel da loja")]
    pub description: String,
    #[validate(custom(function = "validate_positive"))]
    #[schema(example = "1800.00")]
    pub amount: Decimal,
    #[schema(value_type = String, format = Date, example = "2025-02-05")]
    pub due_date: NaiveDate,
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub is_recurring: bool,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceivablePayload {
    #[validate(custom(function = "validate_not_blank"), length(max = 255))]
    #[schema(example = "Serviço de instalação - Condomínio Azul")]
    pub description: String,
    #[validate(custom(function = "validate_positive"))]
    #[schema(example = "450.00")]
    pub amount: Decimal,
    pub customer_id: Option<Uuid>,
    pub sale_id: Option<Uuid>,
    #[schema(value_type = String, format = Date, example = "2025-02-15")]
    pub due_date: NaiveDate,
}

/// Resultado do pagamento: a conta paga e, se recorrente, a do mês seguinte.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayableSettlement {
    pub paid: PayableAccount,
    pub next: Option<PayableAccount>,
}

/// Data da baixa (pagamento ou recebimento). Ausente = hoje.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettlePayload {
    #[schema(value_type = Option<String>, format = Date)]
    pub date: Option<NaiveDate>,
}
