// src/db/category_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::losses::CategoryTag};

/// Tabelas de apoio com o mesmo formato (nome, cor, ativo).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryTable {
    Loss,
    Expense,
}

impl CategoryTable {
    fn table(self) -> &'static str {
        match self {
            CategoryTable::Loss => "loss_categories",
            CategoryTable::Expense => "expense_categories",
        }
    }

    fn label(self) -> &'static str {
        match self {
            CategoryTable::Loss => "Categoria de perda",
            CategoryTable::Expense => "Categoria de despesa",
        }
    }
}

#[derive(Clone, Default)]
pub struct CategoryRepository;

impl CategoryRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        table: CategoryTable,
        store_id: Uuid,
        name: &str,
        color: Option<&str>,
    ) -> Result<CategoryTag, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO {} (store_id, name, color) VALUES ($1, $2, $3) RETURNING *",
            table.table()
        );
        let row = sqlx::query_as::<_, CategoryTag>(&sql)
            .bind(store_id)
            .bind(name)
            .bind(color)
            .fetch_one(executor)
            .await?;
        Ok(row)
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        table: CategoryTable,
        store_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<CategoryTag>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT * FROM {} WHERE store_id = $1 AND (is_active OR $2) ORDER BY name ASC",
            table.table()
        );
        let rows = sqlx::query_as::<_, CategoryTag>(&sql)
            .bind(store_id)
            .bind(include_inactive)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn deactivate<'e, E>(
        &self,
        executor: E,
        table: CategoryTable,
        store_id: Uuid,
        id: Uuid,
    ) -> Result<CategoryTag, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE {} SET is_active = FALSE WHERE store_id = $1 AND id = $2 RETURNING *",
            table.table()
        );
        sqlx::query_as::<_, CategoryTag>(&sql)
            .bind(store_id)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(table.label().into()))
    }
}
