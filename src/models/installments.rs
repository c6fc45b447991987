// src/models/installments.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "installment_sale_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InstallmentSaleStatus {
    Pendente,
    Parcial,
    Quitada,
    Atrasada,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "installment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    Pendente,
    Paga,
    Atrasada,
}

// --- Venda a prazo ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentSale {
    pub id: Uuid,
    #[schema(ignore)]
    pub store_id: Uuid,
    pub sale_id: Uuid,
    pub customer_id: Uuid,
    #[schema(example = "300.00")]
    pub total: Decimal,
    #[schema(example = "100.00")]
    pub amount_paid: Decimal,
    #[schema(example = "200.00")]
    pub amount_remaining: Decimal,
    /// Vencimento da primeira parcela.
    #[schema(value_type = String, format = Date, example = "2025-02-10")]
    pub due_date: NaiveDate,
    pub status: InstallmentSaleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Parcela ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    pub id: Uuid,
    #[schema(ignore)]
    pub store_id: Uuid,
    pub installment_sale_id: Uuid,
    #[schema(example = 1)]
    pub number: i32,
    #[schema(example = "100.00")]
    pub amount: Decimal,
    #[schema(value_type = String, format = Date, example = "2025-02-10")]
    pub due_date: NaiveDate,
    pub status: InstallmentStatus,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentSaleDetail {
    #[serde(flatten)]
    pub installment_sale: InstallmentSale,
    pub customer_name: Option<String>,
    pub installments: Vec<Installment>,
}

/// Parcela ainda não gravada: saída de `plan_installments`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedInstallment {
    pub number: i32,
    pub amount: Decimal,
    pub due_date: NaiveDate,
}

/// Divide `total` em `count` parcelas iguais (arredondadas em centavos, sem
/// redistribuir a sobra) com vencimentos mensais a partir de `first_due`.
/// `None` se algum vencimento sair do calendário.
pub fn plan_installments(
    total: Decimal,
    count: u32,
    first_due: NaiveDate,
) -> Option<Vec<PlannedInstallment>> {
    if count == 0 {
        return Some(Vec::new());
    }
    let amount = (total / Decimal::from(count)).round_dp(2);

    (0..count)
        .map(|i| {
            crate::common::dates::add_months_rollover(first_due, i).map(|due_date| {
                PlannedInstallment {
                    number: i as i32 + 1,
                    amount,
                    due_date,
                }
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstallmentTotals {
    pub amount_paid: Decimal,
    pub amount_remaining: Decimal,
    pub status: InstallmentSaleStatus,
}

/// Recalcula os agregados da venda a prazo a partir das parcelas:
/// quitada se todas pagas, parcial se algo foi pago, senão pendente.
pub fn summarize_installments(total: Decimal, installments: &[Installment]) -> InstallmentTotals {
    let amount_paid: Decimal = installments
        .iter()
        .filter(|i| i.status == InstallmentStatus::Paga)
        .map(|i| i.amount)
        .sum();

    let all_paid = !installments.is_empty()
        && installments.iter().all(|i| i.status == InstallmentStatus::Paga);

    let status = if all_paid {
        InstallmentSaleStatus::Quitada
    } else if amount_paid > Decimal::ZERO {
        InstallmentSaleStatus::Parcial
    } else {
        InstallmentSaleStatus::Pendente
    };

    InstallmentTotals {
        amount_paid,
        amount_remaining: total - amount_paid,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().expect("decimal")
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn installments_from(plan: &[PlannedInstallment]) -> Vec<Installment> {
        plan.iter()
            .map(|p| Installment {
                id: Uuid::new_v4(),
                store_id: Uuid::nil(),
                installment_sale_id: Uuid::nil(),
                number: p.number,
                amount: p.amount,
                due_date: p.due_date,
                status: InstallmentStatus::Pendente,
                paid_at: None,
            })
            .collect()
    }

    #[test]
    fn even_split_sums_to_total() {
        let plan = plan_installments(dec("300.00"), 3, ymd(2025, 2, 10)).expect("plan");
        assert_eq!(plan.len(), 3);
        assert!(plan.iter().all(|p| p.amount == dec("100.00")));
        let sum: Decimal = plan.iter().map(|p| p.amount).sum();
        assert_eq!(sum, dec("300.00"));
    }

    #[test]
    fn uneven_split_keeps_rounding_drift() {
        let plan = plan_installments(dec("100.00"), 3, ymd(2025, 2, 10)).expect("plan");
        assert!(plan.iter().all(|p| p.amount == dec("33.33")));
        let sum: Decimal = plan.iter().map(|p| p.amount).sum();
        assert_eq!(sum, dec("99.99"));
    }

    #[test]
    fn due_dates_advance_one_month_each_with_rollover() {
        let plan = plan_installments(dec("90.00"), 3, ymd(2025, 1, 31)).expect("plan");
        let dues: Vec<NaiveDate> = plan.iter().map(|p| p.due_date).collect();
        assert_eq!(dues, vec![ymd(2025, 1, 31), ymd(2025, 3, 3), ymd(2025, 3, 31)]);
        assert_eq!(plan.iter().map(|p| p.number).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn status_moves_pendente_parcial_quitada() {
        let total = dec("300.00");
        let plan = plan_installments(total, 3, ymd(2025, 2, 10)).expect("plan");
        let mut installments = installments_from(&plan);

        let s = summarize_installments(total, &installments);
        assert_eq!(s.status, InstallmentSaleStatus::Pendente);
        assert_eq!(s.amount_remaining, total);

        installments[0].status = InstallmentStatus::Paga;
        let s = summarize_installments(total, &installments);
        assert_eq!(s.status, InstallmentSaleStatus::Parcial);
        assert_eq!(s.amount_paid, dec("100.00"));
        assert_eq!(s.amount_remaining, dec("200.00"));

        installments[1].status = InstallmentStatus::Paga;
        assert_eq!(
            summarize_installments(total, &installments).status,
            InstallmentSaleStatus::Parcial
        );

        installments[2].status = InstallmentStatus::Paga;
        let s = summarize_installments(total, &installments);
        assert_eq!(s.status, InstallmentSaleStatus::Quitada);
        assert_eq!(s.amount_remaining, Decimal::ZERO);
    }

    #[test]
    fn settled_uneven_sale_shows_leftover_cent() {
        let total = dec("100.00");
        let plan = plan_installments(total, 3, ymd(2025, 2, 10)).expect("plan");
        let mut installments = installments_from(&plan);
        installments.iter_mut().for_each(|i| i.status = InstallmentStatus::Paga);

        let s = summarize_installments(total, &installments);
        assert_eq!(s.status, InstallmentSaleStatus::Quitada);
        assert_eq!(s.amount_remaining, dec("0.01"));
    }
}
