// src/services/cash_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{cash_repo::NewCashMovement, CashRepository},
    models::cash::{
        CashMovement, CashMovementPayload, CashSession, CashSessionDetail, CashSessionStatus,
        CashSummary, OpenCashSessionPayload,
    },
};

fn ensure_open(session: &CashSession) -> Result<(), AppError> {
    match session.status {
        CashSessionStatus::Aberto => Ok(()),
        CashSessionStatus::Fechado => Err(AppError::CashSessionClosed(session.id)),
    }
}

#[derive(Clone)]
pub struct CashService {
    cash_repo: CashRepository,
}

impl CashService {
    pub fn new(cash_repo: CashRepository) -> Self {
        Self { cash_repo }
    }

    pub async fn open_session<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        user_id: Uuid,
        payload: &OpenCashSessionPayload,
    ) -> Result<CashSession, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let session = self
            .cash_repo
            .open_session(executor, store_id, user_id, payload.opening_amount)
            .await?;
        tracing::info!(session_id = %session.id, opening = %session.opening_amount, "Caixa aberto");
        Ok(session)
    }

    /// Caixa aberto da loja, com resumo. `None` se não houver.
    pub fn current_session<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
    ) -> impl Future<Output = Result<Option<CashSessionDetail>, AppError>> + Send
    where
        E: Acquire<'e, Database = Postgres> + Send,
    {
        async move {
            let mut conn = executor.acquire().await?;
            match self.cash_repo.find_open_session(&mut *conn, store_id).await? {
                Some(session) => Ok(Some(self.detail(&mut *conn, store_id, session).await?)),
                None => Ok(None),
            }
        }
    }

    pub async fn list_sessions<'e, E>(&self, executor: E, store_id: Uuid) -> Result<Vec<CashSession>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.cash_repo.list_sessions(executor, store_id).await
    }

    pub fn get_session<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        session_id: Uuid,
    ) -> impl Future<Output = Result<CashSessionDetail, AppError>> + Send
    where
        E: Acquire<'e, Database = Postgres> + Send,
    {
        async move {
            let mut conn = executor.acquire().await?;
            let session = self.cash_repo.find_session(&mut *conn, store_id, session_id).await?;
            self.detail(&mut *conn, store_id, session).await
        }
    }

    async fn detail(
        &self,
        conn: &mut sqlx::PgConnection,
        store_id: Uuid,
        session: CashSession,
    ) -> Result<CashSessionDetail, AppError> {
        let movements = self.cash_repo.list_movements(conn, store_id, session.id).await?;
        let summary = CashSummary::from_movements(session.opening_amount, &movements);
        Ok(CashSessionDetail { session, movements, summary })
    }

    /// Lançamento manual. O caixa fica travado até o commit, então um
    /// fechamento concorrente já enxerga o lançamento.
    pub async fn record_movement<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        user_id: Uuid,
        session_id: Uuid,
        payload: &CashMovementPayload,
    ) -> Result<CashMovement, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let session = self.cash_repo.lock_session(&mut *tx, store_id, session_id).await?;
        ensure_open(&session)?;

        let movement = self
            .cash_repo
            .insert_movement(
                &mut *tx,
                store_id,
                session.id,
                &NewCashMovement {
                    direction: payload.direction,
                    category: payload.category.trim(),
                    description: payload.description.as_deref(),
                    amount: payload.amount,
                    employee_id: user_id,
                    sale_id: None,
                },
            )
            .await?;

        tx.commit().await?;
        Ok(movement)
    }

    /// Fecha o caixa com saldo = abertura + entradas - saídas.
    pub async fn close_session<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        user_id: Uuid,
        session_id: Uuid,
    ) -> Result<CashSessionDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let session = self.cash_repo.lock_session(&mut *tx, store_id, session_id).await?;
        ensure_open(&session)?;

        let movements = self.cash_repo.list_movements(&mut *tx, store_id, session.id).await?;
        let summary = CashSummary::from_movements(session.opening_amount, &movements);

        let closed = self
            .cash_repo
            .close_session(&mut *tx, store_id, session.id, user_id, summary.balance)
            .await?;

        tx.commit().await?;

        tracing::info!(session_id = %closed.id, closing = %summary.balance, "Caixa fechado");
        Ok(CashSessionDetail { session: closed, movements, summary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn session(status: CashSessionStatus) -> CashSession {
        CashSession {
            id: Uuid::new_v4(),
            store_id: Uuid::nil(),
            status,
            opening_amount: Decimal::ONE_HUNDRED,
            opened_by: Uuid::nil(),
            opened_at: Utc::now(),
            closing_amount: None,
            closed_by: None,
            closed_at: None,
        }
    }

    #[test]
    fn closed_session_rejects_changes() {
        assert!(ensure_open(&session(CashSessionStatus::Aberto)).is_ok());
        let closed = session(CashSessionStatus::Fechado);
        match ensure_open(&closed) {
            Err(AppError::CashSessionClosed(id)) => assert_eq!(id, closed.id),
            other => panic!("esperava CashSessionClosed, veio {other:?}"),
        }
    }
}
