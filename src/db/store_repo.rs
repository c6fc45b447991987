// src/db/store_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::store::{AccessLevel, Store, StoreUser, UserStore},
};

/// Campos de RH de um funcionário (inserção e atualização).
#[derive(Debug, Clone, Default)]
pub struct EmployeeFields<'a> {
    pub name: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub job_title: Option<&'a str>,
    pub salary: Option<Decimal>,
    pub admission_date: Option<NaiveDate>,
}

#[derive(Clone)]
pub struct StoreRepository {
    pool: PgPool,
}

impl StoreRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Nível de acesso do usuário na loja, se ele tiver vínculo ativo E
    /// concessão de acesso. É a checagem de autorização do `store_guard`.
    pub async fn find_access_level(
        &self,
        user_id: Uuid,
        store_id: Uuid,
    ) -> Result<Option<AccessLevel>, AppError> {
        let level = sqlx::query_scalar::<_, AccessLevel>(
            r#"
            SELECT su.access_level
            FROM store_users su
            JOIN store_access sa
              ON sa.store_id = su.store_id AND sa.user_id = su.user_id
            WHERE su.user_id = $1 AND su.store_id = $2 AND su.is_active
            "#,
        )
            .bind(user_id)
            .bind(store_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(level)
    }

    // ---
    // Lojas
    // ---

    pub async fn create_store<'e, E>(
        &self,
        executor: E,
        name: &str,
        tax_id: Option<&str>,
        owner_id: Uuid,
    ) -> Result<Store, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let store = sqlx::query_as::<_, Store>(
            r#"
            INSERT INTO stores (name, tax_id, owner_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
            .bind(name)
            .bind(tax_id)
            .bind(owner_id)
            .fetch_one(executor)
            .await?;
        Ok(store)
    }

    pub async fn find_store<'e, E>(&self, executor: E, store_id: Uuid) -> Result<Store, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Store>("SELECT * FROM stores WHERE id = $1")
            .bind(store_id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Loja".into()))
    }

    pub async fn update_store<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        name: &str,
        tax_id: Option<&str>,
        address: Option<&str>,
        phone: Option<&str>,
        pix_key: Option<&str>,
    ) -> Result<Store, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Store>(
            r#"
            UPDATE stores
            SET name = $2, tax_id = $3, address = $4, phone = $5, pix_key = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(name)
            .bind(tax_id)
            .bind(address)
            .bind(phone)
            .bind(pix_key)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Loja".into()))
    }

    pub async fn list_user_stores(&self, user_id: Uuid) -> Result<Vec<UserStore>, AppError> {
        let stores = sqlx::query_as::<_, UserStore>(
            r#"
            SELECT s.id AS store_id, s.name AS store_name, su.access_level
            FROM store_users su
            JOIN stores s ON s.id = su.store_id
            JOIN store_access sa ON sa.store_id = su.store_id AND sa.user_id = su.user_id
            WHERE su.user_id = $1 AND su.is_active
            ORDER BY s.name ASC
            "#,
        )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(stores)
    }

    // ---
    // Funcionários (store_users) e concessões (store_access)
    // ---

    pub async fn insert_store_user<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        user_id: Uuid,
        access_level: AccessLevel,
        fields: &EmployeeFields<'_>,
    ) -> Result<StoreUser, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, StoreUser>(
            r#"
            INSERT INTO store_users (
                store_id, user_id, access_level, name, phone, job_title, salary, admission_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(user_id)
            .bind(access_level)
            .bind(fields.name)
            .bind(fields.phone)
            .bind(fields.job_title)
            .bind(fields.salary)
            .bind(fields.admission_date)
            .fetch_one(executor)
            .await?;
        Ok(row)
    }

    pub async fn grant_access<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        user_id: Uuid,
        granted_by: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO store_access (store_id, user_id, granted_by)
            VALUES ($1, $2, $3)
            ON CONFLICT (store_id, user_id) DO NOTHING
            "#,
        )
            .bind(store_id)
            .bind(user_id)
            .bind(granted_by)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn revoke_access<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM store_access WHERE store_id = $1 AND user_id = $2")
            .bind(store_id)
            .bind(user_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn list_store_users<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
    ) -> Result<Vec<StoreUser>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, StoreUser>(
            "SELECT * FROM store_users WHERE store_id = $1 ORDER BY is_active DESC, name ASC",
        )
            .bind(store_id)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn find_store_user<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
    ) -> Result<StoreUser, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, StoreUser>("SELECT * FROM store_users WHERE store_id = $1 AND id = $2")
            .bind(store_id)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Funcionário".into()))
    }

    pub async fn update_store_user<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
        access_level: AccessLevel,
        fields: &EmployeeFields<'_>,
    ) -> Result<StoreUser, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, StoreUser>(
            r#"
            UPDATE store_users
            SET access_level = $3, name = $4, phone = $5, job_title = $6,
                salary = $7, admission_date = $8, updated_at = NOW()
            WHERE store_id = $1 AND id = $2
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(id)
            .bind(access_level)
            .bind(fields.name)
            .bind(fields.phone)
            .bind(fields.job_title)
            .bind(fields.salary)
            .bind(fields.admission_date)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Funcionário".into()))
    }

    pub async fn set_store_user_active<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
        is_active: bool,
    ) -> Result<StoreUser, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, StoreUser>(
            r#"
            UPDATE store_users SET is_active = $3, updated_at = NOW()
            WHERE store_id = $1 AND id = $2
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(id)
            .bind(is_active)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Funcionário".into()))
    }

    pub async fn delete_store_user<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM store_users WHERE store_id = $1 AND id = $2")
            .bind(store_id)
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
