// src/models/losses.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::validators::{validate_not_blank, validate_not_negative};

use crate::models::inventory::ItemKind;

// --- Perda (baixa de produto ou serviço que não virou venda) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Loss {
    pub id: Uuid,
    #[schema(ignore)]
    pub store_id: Uuid,
    pub kind: ItemKind,
    pub product_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    #[schema(example = 3)]
    pub quantity: i32,
    /// Custo ou valor final, à escolha do operador.
    #[schema(example = "4.50")]
    pub unit_value: Decimal,
    #[schema(example = "13.50")]
    pub total: Decimal,
    pub employee_id: Uuid,
    pub category_id: Option<Uuid>,
    #[schema(example = "Chave quebrou na máquina")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Categoria de perda ou de despesa: tabela de apoio por loja.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTag {
    pub id: Uuid,
    #[schema(ignore)]
    pub store_id: Uuid,
    #[schema(example = "Quebra")]
    pub name: String,
    #[schema(example = "#E53935")]
    pub color: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_loss_target"))]
pub struct RecordLossPayload {
    pub kind: ItemKind,
    pub product_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    #[validate(range(min = 1, message = "A quantidade deve ser ao menos 1."))]
    #[schema(example = 3)]
    pub quantity: i32,
    /// Se ausente: custo do produto ou preço do serviço.
    #[validate(custom(function = "validate_not_negative"))]
    pub unit_value: Option<Decimal>,
    pub category_id: Option<Uuid>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

fn validate_loss_target(p: &RecordLossPayload) -> Result<(), validator::ValidationError> {
    let ok = match p.kind {
        ItemKind::Produto => p.product_id.is_some() && p.service_id.is_none(),
        ItemKind::Servico => p.service_id.is_some() && p.product_id.is_none(),
    };
    if ok {
        Ok(())
    } else {
        let mut err = validator::ValidationError::new("loss_target");
        err.message = Some("Informe o produto ou o serviço de acordo com o tipo da perda.".into());
        Err(err)
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPayload {
    #[validate(custom(function = "validate_not_blank"), length(max = 100))]
    #[schema(example = "Quebra")]
    pub name: String,
    #[validate(length(equal = 7, message = "Use uma cor no formato #RRGGBB."))]
    #[schema(example = "#E53935")]
    pub color: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(kind: ItemKind, product: bool, service: bool) -> RecordLossPayload {
        RecordLossPayload {
            kind,
            product_id: product.then(Uuid::new_v4),
            service_id: service.then(Uuid::new_v4),
            quantity: 1,
            unit_value: None,
            category_id: None,
            notes: None,
        }
    }

    #[test]
    fn target_must_match_kind() {
        assert!(payload(ItemKind::Produto, true, false).validate().is_ok());
        assert!(payload(ItemKind::Servico, false, true).validate().is_ok());
        assert!(payload(ItemKind::Produto, false, true).validate().is_err());
        assert!(payload(ItemKind::Servico, true, true).validate().is_err());
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let mut p = payload(ItemKind::Produto, true, false);
        p.quantity = 0;
        let errors = p.validate().expect_err("quantity");
        assert!(errors.field_errors().contains_key("quantity"));
    }
}
