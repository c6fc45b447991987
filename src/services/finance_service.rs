// src/services/finance_service.rs

use chrono::{NaiveDate, Utc};
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{dates::add_months_rollover, error::AppError},
    db::{
        finance_repo::{NewPayable, NewReceivable},
        CategoryRepository, CategoryTable, FinanceRepository,
    },
    models::{
        finance::{
            PayableAccount, PayablePayload, PayableSettlement, PayableStatus, ReceivableAccount,
            ReceivablePayload, ReceivableStatus,
        },
        losses::{CategoryPayload, CategoryTag},
    },
};

fn trimmed(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Vencimento da próxima ocorrência de uma conta recorrente (mês seguinte).
pub fn next_due_date(due_date: NaiveDate) -> Result<NaiveDate, AppError> {
    add_months_rollover(due_date, 1).ok_or(AppError::DateOutOfRange)
}

#[derive(Clone)]
pub struct FinanceService {
    finance_repo: FinanceRepository,
    category_repo: CategoryRepository,
}

impl FinanceService {
    pub fn new(finance_repo: FinanceRepository, category_repo: CategoryRepository) -> Self {
        Self { finance_repo, category_repo }
    }

    // =========================================================================
    //  CONTAS A PAGAR
    // =========================================================================

    pub async fn create_payable<'e, E>(&self, executor: E, store_id: Uuid, payload: &PayablePayload) -> Result<PayableAccount, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let new = NewPayable {
            description: payload.description.trim(),
            amount: payload.amount,
            due_date: payload.due_date,
            category_id: payload.category_id,
            is_recurring: payload.is_recurring,
            notes: trimmed(&payload.notes),
        };
        self.finance_repo.create_payable(executor, store_id, &new).await
    }

    pub fn list_payables<'e, E>(&self, executor: E, store_id: Uuid) -> impl Future<Output = Result<Vec<PayableAccount>, AppError>> + Send
    where
        E: Acquire<'e, Database = Postgres> + Send,
    {
        async move {
            let mut conn = executor.acquire().await?;
            self.finance_repo
                .refresh_overdue_payables(&mut *conn, store_id, Utc::now().date_naive())
                .await?;
            self.finance_repo.list_payables(&mut *conn, store_id).await
        }
    }

    /// Baixa a conta. Conta recorrente gera a cópia do mês seguinte
    /// na mesma transação.
    pub async fn pay_payable<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
        paid_date: Option<NaiveDate>,
    ) -> Result<PayableSettlement, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let current = self.finance_repo.lock_payable(&mut *tx, store_id, id).await?;
        if current.status == PayableStatus::Paga {
            return Err(AppError::AccountAlreadySettled);
        }

        let paid_date = paid_date.unwrap_or_else(|| Utc::now().date_naive());
        let paid = self.finance_repo.mark_payable_paid(&mut *tx, store_id, id, paid_date).await?;

        let next = if paid.is_recurring {
            let new = NewPayable {
                description: &paid.description,
                amount: paid.amount,
                due_date: next_due_date(paid.due_date)?,
                category_id: paid.category_id,
                is_recurring: true,
                notes: paid.notes.as_deref(),
            };
            Some(self.finance_repo.create_payable(&mut *tx, store_id, &new).await?)
        } else {
            None
        };

        tx.commit().await?;

        tracing::info!(payable_id = %paid.id, recurring = paid.is_recurring, "Conta paga");
        Ok(PayableSettlement { paid, next })
    }

    pub async fn delete_payable<'e, E>(&self, executor: E, store_id: Uuid, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.finance_repo.delete_payable(executor, store_id, id).await
    }

    // --- Categorias de despesa ---

    pub async fn create_expense_category<'e, E>(&self, executor: E, store_id: Uuid, payload: &CategoryPayload) -> Result<CategoryTag, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.category_repo
            .create(executor, CategoryTable::Expense, store_id, payload.name.trim(), payload.color.as_deref())
            .await
    }

    pub async fn list_expense_categories<'e, E>(&self, executor: E, store_id: Uuid, include_inactive: bool) -> Result<Vec<CategoryTag>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.category_repo.list(executor, CategoryTable::Expense, store_id, include_inactive).await
    }

    pub async fn deactivate_expense_category<'e, E>(&self, executor: E, store_id: Uuid, id: Uuid) -> Result<CategoryTag, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.category_repo.deactivate(executor, CategoryTable::Expense, store_id, id).await
    }

    // =========================================================================
    //  CONTAS A RECEBER
    // =========================================================================

    pub async fn create_receivable<'e, E>(&self, executor: E, store_id: Uuid, payload: &ReceivablePayload) -> Result<ReceivableAccount, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let new = NewReceivable {
            description: payload.description.trim(),
            amount: payload.amount,
            customer_id: payload.customer_id,
            sale_id: payload.sale_id,
            due_date: payload.due_date,
        };
        self.finance_repo.create_receivable(executor, store_id, &new).await
    }

    pub fn list_receivables<'e, E>(&self, executor: E, store_id: Uuid) -> impl Future<Output = Result<Vec<ReceivableAccount>, AppError>> + Send
    where
        E: Acquire<'e, Database = Postgres> + Send,
    {
        async move {
            let mut conn = executor.acquire().await?;
            self.finance_repo
                .refresh_overdue_receivables(&mut *conn, store_id, Utc::now().date_naive())
                .await?;
            self.finance_repo.list_receivables(&mut *conn, store_id).await
        }
    }

    pub fn receive<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
        received_date: Option<NaiveDate>,
    ) -> impl Future<Output = Result<ReceivableAccount, AppError>> + Send
    where
        E: Acquire<'e, Database = Postgres> + Send,
    {
        async move {
            let mut conn = executor.acquire().await?;

            let current = self.finance_repo.find_receivable(&mut *conn, store_id, id).await?;
            if current.status == ReceivableStatus::Recebida {
                return Err(AppError::AccountAlreadySettled);
            }

            let date = received_date.unwrap_or_else(|| Utc::now().date_naive());
            self.finance_repo.mark_receivable_received(&mut *conn, store_id, id, date).await
        }
    }

    pub async fn delete_receivable<'e, E>(&self, executor: E, store_id: Uuid, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.finance_repo.delete_receivable(executor, store_id, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("date")
    }

    #[test]
    fn recurring_payable_moves_one_month() {
        assert_eq!(next_due_date(ymd(2025, 2, 5)).expect("due"), ymd(2025, 3, 5));
        assert_eq!(next_due_date(ymd(2025, 12, 10)).expect("due"), ymd(2026, 1, 10));
    }

    #[test]
    fn month_end_rolls_over_like_calendar_arithmetic() {
        assert_eq!(next_due_date(ymd(2025, 1, 31)).expect("due"), ymd(2025, 3, 3));
    }
}
