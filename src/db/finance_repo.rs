// src/db/finance_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::finance::{PayableAccount, ReceivableAccount},
};

#[derive(Debug, Clone)]
pub struct NewPayable<'a> {
    pub description: &'a str,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub category_id: Option<Uuid>,
    pub is_recurring: bool,
    pub notes: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct NewReceivable<'a> {
    pub description: &'a str,
    pub amount: Decimal,
    pub customer_id: Option<Uuid>,
    pub sale_id: Option<Uuid>,
    pub due_date: NaiveDate,
}

#[derive(Clone, Default)]
pub struct FinanceRepository;

impl FinanceRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  CONTAS A PAGAR
    // =========================================================================

    pub async fn create_payable<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        p: &NewPayable<'_>,
    ) -> Result<PayableAccount, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, PayableAccount>(
            r#"
            INSERT INTO payable_accounts (
                store_id, description, amount, due_date, category_id, is_recurring, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(p.description)
            .bind(p.amount)
            .bind(p.due_date)
            .bind(p.category_id)
            .bind(p.is_recurring)
            .bind(p.notes)
            .fetch_one(executor)
            .await?;
        Ok(row)
    }

    pub async fn list_payables<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
    ) -> Result<Vec<PayableAccount>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, PayableAccount>(
            "SELECT * FROM payable_accounts WHERE store_id = $1 ORDER BY due_date ASC",
        )
            .bind(store_id)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn lock_payable<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
    ) -> Result<PayableAccount, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, PayableAccount>(
            "SELECT * FROM payable_accounts WHERE store_id = $1 AND id = $2 FOR UPDATE",
        )
            .bind(store_id)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Conta a pagar".into()))
    }

    pub async fn mark_payable_paid<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
        paid_date: NaiveDate,
    ) -> Result<PayableAccount, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, PayableAccount>(
            r#"
            UPDATE payable_accounts SET status = 'paga', paid_date = $3, updated_at = NOW()
            WHERE store_id = $1 AND id = $2
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(id)
            .bind(paid_date)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Conta a pagar".into()))
    }

    pub async fn delete_payable<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM payable_accounts WHERE store_id = $1 AND id = $2")
            .bind(store_id)
            .bind(id)
            .execute(executor)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound("Conta a pagar".into()));
        }
        Ok(())
    }

    pub async fn refresh_overdue_payables<'e, E>(
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
            UPDATE payable_accounts SET status = 'atrasada', updated_at = NOW()
            WHERE store_id = $1 AND status = 'pendente' AND due_date < $2
            "#,
        )
            .bind(store_id)
            .bind(today)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    // =========================================================================
    //  CONTAS A RECEBER
    // =========================================================================

    pub async fn create_receivable<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        r: &NewReceivable<'_>,
    ) -> Result<ReceivableAccount, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, ReceivableAccount>(
            r#"
            INSERT INTO receivable_accounts (
                store_id, description, amount, customer_id, sale_id, due_date
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(r.description)
            .bind(r.amount)
            .bind(r.customer_id)
            .bind(r.sale_id)
            .bind(r.due_date)
            .fetch_one(executor)
            .await?;
        Ok(row)
    }

    pub async fn list_receivables<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
    ) -> Result<Vec<ReceivableAccount>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, ReceivableAccount>(
            "SELECT * FROM receivable_accounts WHERE store_id = $1 ORDER BY due_date ASC",
        )
            .bind(store_id)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn find_receivable<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
    ) -> Result<ReceivableAccount, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ReceivableAccount>(
            "SELECT * FROM receivable_accounts WHERE store_id = $1 AND id = $2",
        )
            .bind(store_id)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Conta a receber".into()))
    }

    pub async fn mark_receivable_received<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
        received_date: NaiveDate,
    ) -> Result<ReceivableAccount, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ReceivableAccount>(
            r#"
            UPDATE receivable_accounts SET status = 'recebida', received_date = $3, updated_at = NOW()
            WHERE store_id = $1 AND id = $2
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(id)
            .bind(received_date)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Conta a receber".into()))
    }

    pub async fn delete_receivable<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM receivable_accounts WHERE store_id = $1 AND id = $2")
            .bind(store_id)
            .bind(id)
            .execute(executor)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound("Conta a receber".into()));
        }
        Ok(())
    }

    pub async fn refresh_overdue_receivables<'e, E>(
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
            UPDATE receivable_accounts SET status = 'atrasada', updated_at = NOW()
            WHERE store_id = $1 AND status = 'pendente' AND due_date < $2
            "#,
        )
            .bind(store_id)
            .bind(today)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
