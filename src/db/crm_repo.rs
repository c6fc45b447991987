// src/db/crm_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::crm::{Customer, PersonKind},
};

/// Campos gravados de um cliente (insert e update usam os mesmos).
#[derive(Debug, Clone)]
pub struct CustomerFields<'a> {
    pub name: &'a str,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub person_kind: PersonKind,
    pub tax_id: Option<&'a str>,
    pub zip_code: Option<&'a str>,
    pub street: Option<&'a str>,
    pub number: Option<&'a str>,
    pub complement: Option<&'a str>,
    pub district: Option<&'a str>,
    pub city: Option<&'a str>,
    pub state: Option<&'a str>,
    pub notes: Option<&'a str>,
}

#[derive(Clone, Default)]
pub struct CrmRepository;

impl CrmRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create_customer<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        c: &CustomerFields<'_>,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (
                store_id, name, email, phone, person_kind, tax_id,
                zip_code, street, number, complement, district, city, state, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(c.name)
            .bind(c.email)
            .bind(c.phone)
            .bind(c.person_kind)
            .bind(c.tax_id)
            .bind(c.zip_code)
            .bind(c.street)
            .bind(c.number)
            .bind(c.complement)
            .bind(c.district)
            .bind(c.city)
            .bind(c.state)
            .bind(c.notes)
            .fetch_one(executor)
            .await?;
        Ok(customer)
    }

    /// Lista clientes; `search` filtra por nome, telefone ou documento.
    pub async fn list_customers<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        search: Option<&str>,
    ) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{s}%"));

        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT * FROM customers
            WHERE store_id = $1
              AND ($2::text IS NULL OR name ILIKE $2 OR phone ILIKE $2 OR tax_id ILIKE $2)
            ORDER BY name ASC
            "#,
        )
            .bind(store_id)
            .bind(pattern)
            .fetch_all(executor)
            .await?;
        Ok(customers)
    }

    pub async fn find_customer<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE store_id = $1 AND id = $2")
            .bind(store_id)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Cliente".into()))
    }

    pub async fn update_customer<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
        c: &CustomerFields<'_>,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET name = $3, email = $4, phone = $5, person_kind = $6, tax_id = $7,
                zip_code = $8, street = $9, number = $10, complement = $11,
                district = $12, city = $13, state = $14, notes = $15,
                updated_at = NOW()
            WHERE store_id = $1 AND id = $2
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(id)
            .bind(c.name)
            .bind(c.email)
            .bind(c.phone)
            .bind(c.person_kind)
            .bind(c.tax_id)
            .bind(c.zip_code)
            .bind(c.street)
            .bind(c.number)
            .bind(c.complement)
            .bind(c.district)
            .bind(c.city)
            .bind(c.state)
            .bind(c.notes)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Cliente".into()))
    }

    pub async fn delete_customer<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM customers WHERE store_id = $1 AND id = $2")
            .bind(store_id)
            .bind(id)
            .execute(executor)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound("Cliente".into()));
        }
        Ok(())
    }
}
