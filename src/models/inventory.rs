// src/models/inventory.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::validators::{validate_not_blank, validate_not_negative};

// --- Tipo de item vendável (produto x serviço) ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "item_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Produto,
    Servico,
}

// --- Produto ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    #[schema(ignore)]
    pub store_id: Uuid,
    #[schema(example = "Chave Yale 2 faces")]
    pub name: String,
    /// Código de barras ou código interno.
    #[schema(example = "7891234567890")]
    pub code: Option<String>,
    #[schema(example = "Chaves")]
    pub category: Option<String>,
    #[schema(example = "15.00")]
    pub price: Decimal,
    #[schema(example = "4.50")]
    pub cost: Decimal,
    /// Pode ficar negativo: não há trava de saldo.
    #[schema(example = 42)]
    pub stock: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn margin_percent(&self) -> Decimal {
        margin_percent(self.price, self.cost)
    }
}

/// margem% = (preço - custo) / custo * 100. Custo zero => 0.
pub fn margin_percent(price: Decimal, cost: Decimal) -> Decimal {
    if cost.is_zero() {
        return Decimal::ZERO;
    }
    ((price - cost) / cost * Decimal::ONE_HUNDRED).round_dp(2)
}

/// Produto com a margem calculada, para as telas de estoque.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    #[schema(example = "233.33")]
    pub margin_percent: Decimal,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            margin_percent: product.margin_percent(),
            product: product.clone(),
        }
    }
}

// --- Custo extra de um serviço (ex: deslocamento) ---
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCostItem {
    #[schema(example = "Deslocamento")]
    pub description: String,
    #[schema(example = "20.00")]
    pub amount: Decimal,
}

// --- Serviço ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: Uuid,
    #[schema(ignore)]
    pub store_id: Uuid,
    #[schema(example = "Abertura de porta")]
    pub name: String,
    pub code: Option<String>,
    pub category: Option<String>,
    #[schema(example = "120.00")]
    pub price: Decimal,
    #[schema(example = 30)]
    pub estimated_minutes: Option<i32>,
    #[schema(value_type = Vec<ServiceCostItem>)]
    pub extra_costs: Json<Vec<ServiceCostItem>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().expect("decimal")
    }

    #[test]
    fn margin_over_cost() {
        assert_eq!(margin_percent(dec("15.00"), dec("10.00")), dec("50.00"));
        assert_eq!(margin_percent(dec("8.00"), dec("10.00")), dec("-20.00"));
    }

    #[test]
    fn margin_with_zero_cost_is_zero() {
        assert_eq!(margin_percent(dec("15.00"), Decimal::ZERO), Decimal::ZERO);
    }
}

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    #[validate(custom(function = "validate_not_blank"))]
    #[schema(example = "Chave Yale 2 faces")]
    pub name: String,
    pub code: Option<String>,
    pub category: Option<String>,
    #[validate(custom(function = "validate_not_negative"))]
    pub price: Decimal,
    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub cost: Decimal,
    /// Só no cadastro. Depois, use a entrada de estoque.
    #[serde(default)]
    pub initial_stock: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockEntryPayload {
    #[validate(range(min = 1, message = "A quantidade deve ser ao menos 1."))]
    pub quantity: i32,
    /// Novo custo unitário; se ausente, o custo atual é mantido.
    #[validate(custom(function = "validate_not_negative"))]
    pub unit_cost: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServicePayload {
    #[validate(custom(function = "validate_not_blank"))]
    #[schema(example = "Abertura de porta")]
    pub name: String,
    pub code: Option<String>,
    pub category: Option<String>,
    #[validate(custom(function = "validate_not_negative"))]
    pub price: Decimal,
    #[validate(range(min = 0, message = "O tempo estimado não pode ser negativo."))]
    pub estimated_minutes: Option<i32>,
    #[serde(default)]
    pub extra_costs: Vec<ServiceCostItem>,
}
