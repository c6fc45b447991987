// src/db/loss_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{inventory::ItemKind, losses::Loss},
};

#[derive(Debug, Clone)]
pub struct NewLoss<'a> {
    pub kind: ItemKind,
    pub product_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub quantity: i32,
    pub unit_value: Decimal,
    pub total: Decimal,
    pub employee_id: Uuid,
    pub category_id: Option<Uuid>,
    pub notes: Option<&'a str>,
}

#[derive(Clone, Default)]
pub struct LossRepository;

impl LossRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert_loss<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        loss: &NewLoss<'_>,
    ) -> Result<Loss, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, Loss>(
            r#"
            INSERT INTO losses (
                store_id, kind, product_id, service_id, quantity, unit_value, total,
                employee_id, category_id, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(loss.kind)
            .bind(loss.product_id)
            .bind(loss.service_id)
            .bind(loss.quantity)
            .bind(loss.unit_value)
            .bind(loss.total)
            .bind(loss.employee_id)
            .bind(loss.category_id)
            .bind(loss.notes)
            .fetch_one(executor)
            .await?;
        Ok(row)
    }

    pub async fn list_losses<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Loss>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, Loss>(
            r#"
            SELECT * FROM losses
            WHERE store_id = $1
              AND ($2::timestamptz IS NULL OR created_at >= $2)
              AND ($3::timestamptz IS NULL OR created_at < $3)
            ORDER BY created_at DESC
            "#,
        )
            .bind(store_id)
            .bind(from)
            .bind(to)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }
}
