// src/models/cash.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::validators::{validate_not_blank, validate_not_negative, validate_positive};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "cash_session_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CashSessionStatus {
    Aberto,
    Fechado,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "cash_direction", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CashDirection {
    Entrada,
    Saida,
}

// --- Caixa ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CashSession {
    pub id: Uuid,
    #[schema(ignore)]
    pub store_id: Uuid,
    pub status: CashSessionStatus,
    #[schema(example = "100.00")]
    pub opening_amount: Decimal,
    pub opened_by: Uuid,
    pub opened_at: DateTime<Utc>,
    #[schema(example = "150.00")]
    pub closing_amount: Option<Decimal>,
    pub closed_by: Option<Uuid>,
    pub closed_at: Option<DateTime<Utc>>,
}

// --- Movimentação de caixa ---
// O valor é sempre positivo; o sinal vem de `direction`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CashMovement {
    pub id: Uuid,
    #[schema(ignore)]
    pub store_id: Uuid,
    pub session_id: Uuid,
    pub direction: CashDirection,
    #[schema(example = "Venda - PIX")]
    pub category: String,
    pub description: Option<String>,
    #[schema(example = "50.00")]
    pub amount: Decimal,
    pub employee_id: Uuid,
    pub sale_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Resumo do caixa, sempre calculado a partir das movimentações.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CashSummary {
    pub opening_amount: Decimal,
    pub total_in: Decimal,
    pub total_out: Decimal,
    /// abertura + entradas - saídas
    pub balance: Decimal,
    /// Saldo líquido por categoria (entradas positivas, saídas negativas).
    pub by_category: BTreeMap<String, Decimal>,
}

impl CashSummary {
    pub fn from_movements(opening_amount: Decimal, movements: &[CashMovement]) -> Self {
        let mut total_in = Decimal::ZERO;
        let mut total_out = Decimal::ZERO;
        let mut by_category: BTreeMap<String, Decimal> = BTreeMap::new();

        for movement in movements {
            let signed = match movement.direction {
                CashDirection::Entrada => {
                    total_in += movement.amount;
                    movement.amount
                }
                CashDirection::Saida => {
                    total_out += movement.amount;
                    -movement.amount
                }
            };
            *by_category.entry(movement.category.clone()).or_default() += signed;
        }

        Self {
            opening_amount,
            total_in,
            total_out,
            balance: opening_amount + total_in - total_out,
            by_category,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CashSessionDetail {
    #[serde(flatten)]
    pub session: CashSession,
    pub movements: Vec<CashMovement>,
    pub summary: CashSummary,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenCashSessionPayload {
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(example = "100.00")]
    pub opening_amount: Decimal,
}

/// Sangria, suprimento ou outro lançamento manual.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CashMovementPayload {
    pub direction: CashDirection,
    #[validate(custom(function = "validate_not_blank"), length(max = 100))]
    #[schema(example = "Sangria")]
    pub category: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_positive"))]
    #[schema(example = "20.00")]
    pub amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().expect("decimal")
    }

    fn movement(direction: CashDirection, category: &str, amount: &str) -> CashMovement {
        CashMovement {
            id: Uuid::new_v4(),
            store_id: Uuid::nil(),
            session_id: Uuid::nil(),
            direction,
            category: category.to_string(),
            description: None,
            amount: dec(amount),
            employee_id: Uuid::nil(),
            sale_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn opening_plus_one_pix_entry() {
        let movements = vec![movement(CashDirection::Entrada, "Venda - PIX", "50.00")];
        let summary = CashSummary::from_movements(dec("100.00"), &movements);
        assert_eq!(summary.balance, dec("150.00"));
        assert_eq!(summary.by_category["Venda - PIX"], dec("50.00"));
    }

    #[test]
    fn balance_does_not_depend_on_order() {
        let mut movements = vec![
            movement(CashDirection::Entrada, "Venda - Dinheiro", "35.90"),
            movement(CashDirection::Saida, "Sangria", "20.00"),
            movement(CashDirection::Entrada, "Suprimento", "10.00"),
            movement(CashDirection::Saida, "Sangria", "5.45"),
        ];
        let forward = CashSummary::from_movements(dec("80.00"), &movements);
        movements.reverse();
        let backward = CashSummary::from_movements(dec("80.00"), &movements);

        assert_eq!(forward, backward);
        assert_eq!(forward.total_in, dec("45.90"));
        assert_eq!(forward.total_out, dec("25.45"));
        assert_eq!(forward.balance, dec("100.45"));
        assert_eq!(forward.by_category["Sangria"], dec("-25.45"));
    }

    #[test]
    fn empty_session_keeps_opening_amount() {
        let summary = CashSummary::from_movements(dec("100.00"), &[]);
        assert_eq!(summary.balance, dec("100.00"));
        assert!(summary.by_category.is_empty());
    }
}
