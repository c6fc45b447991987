// src/db/cash_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::cash::{CashDirection, CashMovement, CashSession, CashSessionStatus},
};

/// Movimentação a gravar. `sale_id` só vem preenchido nas entradas de venda.
#[derive(Debug, Clone)]
pub struct NewCashMovement<'a> {
    pub direction: CashDirection,
    pub category: &'a str,
    pub description: Option<&'a str>,
    pub amount: Decimal,
    pub employee_id: Uuid,
    pub sale_id: Option<Uuid>,
}

#[derive(Clone, Default)]
pub struct CashRepository;

impl CashRepository {
    pub fn new() -> Self {
        Self
    }

    /// Abre o caixa. O índice único parcial garante um só caixa aberto por loja.
    pub async fn open_session<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        opened_by: Uuid,
        opening_amount: Decimal,
    ) -> Result<CashSession, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, CashSession>(
            r#"
            INSERT INTO cash_sessions (store_id, status, opening_amount, opened_by)
            VALUES ($1, 'aberto', $2, $3)
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(opening_amount)
            .bind(opened_by)
            .fetch_one(executor)
            .await
            .map_err(|e| map_unique_violation(e, || AppError::CashSessionAlreadyOpen))
    }

    pub async fn find_open_session<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
    ) -> Result<Option<CashSession>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let session = sqlx::query_as::<_, CashSession>(
            "SELECT * FROM cash_sessions WHERE store_id = $1 AND status = 'aberto'",
        )
            .bind(store_id)
            .fetch_optional(executor)
            .await?;
        Ok(session)
    }

    /// Caixa aberto com a linha travada até o fim da transação: um fechamento
    /// concorrente espera a movimentação terminar.
    pub async fn lock_open_session<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
    ) -> Result<Option<CashSession>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let session = sqlx::query_as::<_, CashSession>(
            "SELECT * FROM cash_sessions WHERE store_id = $1 AND status = 'aberto' FOR UPDATE",
        )
            .bind(store_id)
            .fetch_optional(executor)
            .await?;
        Ok(session)
    }

    pub async fn lock_session<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
    ) -> Result<CashSession, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, CashSession>(
            "SELECT * FROM cash_sessions WHERE store_id = $1 AND id = $2 FOR UPDATE",
        )
            .bind(store_id)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Caixa".into()))
    }

    pub async fn find_session<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
    ) -> Result<CashSession, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, CashSession>("SELECT * FROM cash_sessions WHERE store_id = $1 AND id = $2")
            .bind(store_id)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Caixa".into()))
    }

    pub async fn list_sessions<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
    ) -> Result<Vec<CashSession>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sessions = sqlx::query_as::<_, CashSession>(
            "SELECT * FROM cash_sessions WHERE store_id = $1 ORDER BY opened_at DESC",
        )
            .bind(store_id)
            .fetch_all(executor)
            .await?;
        Ok(sessions)
    }

    pub async fn insert_movement<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        session_id: Uuid,
        movement: &NewCashMovement<'_>,
    ) -> Result<CashMovement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, CashMovement>(
            r#"
            INSERT INTO cash_movements (
                store_id, session_id, direction, category, description, amount, employee_id, sale_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(session_id)
            .bind(movement.direction)
            .bind(movement.category)
            .bind(movement.description)
            .bind(movement.amount)
            .bind(movement.employee_id)
            .bind(movement.sale_id)
            .fetch_one(executor)
            .await?;
        Ok(row)
    }

    pub async fn list_movements<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        session_id: Uuid,
    ) -> Result<Vec<CashMovement>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movements = sqlx::query_as::<_, CashMovement>(
            r#"
            SELECT * FROM cash_movements
            WHERE store_id = $1 AND session_id = $2
            ORDER BY created_at ASC, id ASC
            "#,
        )
            .bind(store_id)
            .bind(session_id)
            .fetch_all(executor)
            .await?;
        Ok(movements)
    }

    pub async fn close_session<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
        closed_by: Uuid,
        closing_amount: Decimal,
    ) -> Result<CashSession, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, CashSession>(
            r#"
            UPDATE cash_sessions
            SET status = $5, closing_amount = $4, closed_by = $3, closed_at = NOW()
            WHERE store_id = $1 AND id = $2
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(id)
            .bind(closed_by)
            .bind(closing_amount)
            .bind(CashSessionStatus::Fechado)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Caixa".into()))
    }
}
