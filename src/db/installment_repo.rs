// src/db/installment_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::installments::{
        Installment, InstallmentSale, InstallmentSaleStatus, InstallmentTotals, PlannedInstallment,
    },
};

#[derive(Clone, Default)]
pub struct InstallmentRepository;

impl InstallmentRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert_installment_sale<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        sale_id: Uuid,
        customer_id: Uuid,
        total: Decimal,
        first_due: NaiveDate,
    ) -> Result<InstallmentSale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, InstallmentSale>(
            r#"
            INSERT INTO installment_sales (
                store_id, sale_id, customer_id, total, amount_paid, amount_remaining, due_date
            )
            VALUES ($1, $2, $3, $4, 0, $4, $5)
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(sale_id)
            .bind(customer_id)
            .bind(total)
            .bind(first_due)
            .fetch_one(executor)
            .await?;
        Ok(row)
    }

    pub async fn insert_installment<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        installment_sale_id: Uuid,
        planned: &PlannedInstallment,
    ) -> Result<Installment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, Installment>(
            r#"
            INSERT INTO installments (store_id, installment_sale_id, number, amount, due_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(installment_sale_id)
            .bind(planned.number)
            .bind(planned.amount)
            .bind(planned.due_date)
            .fetch_one(executor)
            .await?;
        Ok(row)
    }

    pub async fn list_installment_sales<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        status: Option<InstallmentSaleStatus>,
    ) -> Result<Vec<InstallmentSale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, InstallmentSale>(
            r#"
            SELECT * FROM installment_sales
            WHERE store_id = $1 AND ($2::installment_sale_status IS NULL OR status = $2)
            ORDER BY due_date ASC, created_at ASC
            "#,
        )
            .bind(store_id)
            .bind(status)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn find_installment_sale<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
    ) -> Result<InstallmentSale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, InstallmentSale>(
            "SELECT * FROM installment_sales WHERE store_id = $1 AND id = $2",
        )
            .bind(store_id)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Venda a prazo".into()))
    }

    /// Trava a venda a prazo: pagamentos concorrentes recalculam em fila.
    pub async fn lock_installment_sale<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
    ) -> Result<InstallmentSale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, InstallmentSale>(
            "SELECT * FROM installment_sales WHERE store_id = $1 AND id = $2 FOR UPDATE",
        )
            .bind(store_id)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Venda a prazo".into()))
    }

    pub async fn list_installments<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        installment_sale_id: Uuid,
    ) -> Result<Vec<Installment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, Installment>(
            r#"
            SELECT * FROM installments
            WHERE store_id = $1 AND installment_sale_id = $2
            ORDER BY number ASC
            "#,
        )
            .bind(store_id)
            .bind(installment_sale_id)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn mark_installment_paid<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        installment_sale_id: Uuid,
        installment_id: Uuid,
    ) -> Result<Installment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Installment>(
            r#"
            UPDATE installments SET status = 'paga', paid_at = NOW()
            WHERE store_id = $1 AND installment_sale_id = $2 AND id = $3
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(installment_sale_id)
            .bind(installment_id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Parcela".into()))
    }

    pub async fn update_totals<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
        totals: &InstallmentTotals,
    ) -> Result<InstallmentSale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, InstallmentSale>(
            r#"
            UPDATE installment_sales
            SET amount_paid = $3, amount_remaining = $4, status = $5, updated_at = NOW()
            WHERE store_id = $1 AND id = $2
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(id)
            .bind(totals.amount_paid)
            .bind(totals.amount_remaining)
            .bind(totals.status)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Venda a prazo".into()))
    }

    /// Parcelas vencidas e não pagas viram "atrasada"; vendas com alguma
    /// parcela atrasada e ainda não quitadas também.
    pub async fn refresh_overdue<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        today: NaiveDate,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            WITH overdue AS (
                UPDATE installments SET status = 'atrasada'
                WHERE store_id = $1 AND status = 'pendente' AND due_date < $2
                RETURNING installment_sale_id
            )
            UPDATE installment_sales s SET status = 'atrasada', updated_at = NOW()
            WHERE s.store_id = $1
              AND s.status <> 'quitada'
              AND s.status <> 'atrasada'
              AND (
                  s.id IN (SELECT installment_sale_id FROM overdue)
                  OR EXISTS (
                      SELECT 1 FROM installments i
                      WHERE i.installment_sale_id = s.id AND i.status = 'atrasada'
                  )
              )
            "#,
        )
            .bind(store_id)
            .bind(today)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
