// src/db/inventory_repo.rs

use rust_decimal::Decimal;
use sqlx::{types::Json, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::inventory::{Product, Service, ServiceCostItem},
};

/// Campos editáveis de um produto.
#[derive(Debug, Clone)]
pub struct ProductFields<'a> {
    pub name: &'a str,
    pub code: Option<&'a str>,
    pub category: Option<&'a str>,
    pub price: Decimal,
    pub cost: Decimal,
}

/// Campos editáveis de um serviço.
#[derive(Debug, Clone)]
pub struct ServiceFields<'a> {
    pub name: &'a str,
    pub code: Option<&'a str>,
    pub category: Option<&'a str>,
    pub price: Decimal,
    pub estimated_minutes: Option<i32>,
    pub extra_costs: &'a [ServiceCostItem],
}

#[derive(Clone, Default)]
pub struct InventoryRepository;

impl InventoryRepository {
    pub fn new() -> Self {
        Self
    }

    // ---
    // Produtos
    // ---

    pub async fn list_products<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
    ) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE store_id = $1 ORDER BY name ASC",
        )
            .bind(store_id)
            .fetch_all(executor)
            .await?;
        Ok(products)
    }

    pub async fn find_product<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE store_id = $1 AND id = $2")
            .bind(store_id)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Produto".into()))
    }

    pub async fn create_product<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        fields: &ProductFields<'_>,
        initial_stock: i32,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (store_id, name, code, category, price, cost, stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(fields.name)
            .bind(fields.code)
            .bind(fields.category)
            .bind(fields.price)
            .bind(fields.cost)
            .bind(initial_stock)
            .fetch_one(executor)
            .await
            .map_err(|e| {
                map_unique_violation(e, || {
                    AppError::CodeAlreadyExists(fields.code.unwrap_or_default().to_string())
                })
            })
    }

    pub async fn update_product<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
        fields: &ProductFields<'_>,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = $3, code = $4, category = $5, price = $6, cost = $7, updated_at = NOW()
            WHERE store_id = $1 AND id = $2
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(id)
            .bind(fields.name)
            .bind(fields.code)
            .bind(fields.category)
            .bind(fields.price)
            .bind(fields.cost)
            .fetch_optional(executor)
            .await
            .map_err(|e| {
                map_unique_violation(e, || {
                    AppError::CodeAlreadyExists(fields.code.unwrap_or_default().to_string())
                })
            })?
            .ok_or_else(|| AppError::ResourceNotFound("Produto".into()))
    }

    pub async fn set_product_active<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
        is_active: bool,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET is_active = $3, updated_at = NOW()
            WHERE store_id = $1 AND id = $2
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(id)
            .bind(is_active)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Produto".into()))
    }

    /// Soma `delta` ao estoque numa única instrução (`stock = stock + delta`).
    /// Não há piso: o saldo pode ficar negativo.
    pub async fn adjust_stock<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        product_id: Uuid,
        delta: i32,
    ) -> Result<i32, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE products SET stock = stock + $3, updated_at = NOW()
            WHERE store_id = $1 AND id = $2
            RETURNING stock
            "#,
        )
            .bind(store_id)
            .bind(product_id)
            .bind(delta)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Produto".into()))
    }

    /// Entrada de mercadoria: soma ao estoque e, se informado, atualiza o custo.
    pub async fn receive_stock<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        unit_cost: Option<Decimal>,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET stock = stock + $3, cost = COALESCE($4, cost), updated_at = NOW()
            WHERE store_id = $1 AND id = $2
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(product_id)
            .bind(quantity)
            .bind(unit_cost)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Produto".into()))
    }

    // ---
    // Serviços
    // ---

    pub async fn list_services<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
    ) -> Result<Vec<Service>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let services = sqlx::query_as::<_, Service>(
            "SELECT * FROM services WHERE store_id = $1 ORDER BY name ASC",
        )
            .bind(store_id)
            .fetch_all(executor)
            .await?;
        Ok(services)
    }

    pub async fn find_service<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
    ) -> Result<Service, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Service>("SELECT * FROM services WHERE store_id = $1 AND id = $2")
            .bind(store_id)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Serviço".into()))
    }

    pub async fn create_service<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        fields: &ServiceFields<'_>,
    ) -> Result<Service, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let service = sqlx::query_as::<_, Service>(
            r#"
            INSERT INTO services (store_id, name, code, category, price, estimated_minutes, extra_costs)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(fields.name)
            .bind(fields.code)
            .bind(fields.category)
            .bind(fields.price)
            .bind(fields.estimated_minutes)
            .bind(Json(fields.extra_costs))
            .fetch_one(executor)
            .await?;
        Ok(service)
    }

    pub async fn update_service<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
        fields: &ServiceFields<'_>,
    ) -> Result<Service, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Service>(
            r#"
            UPDATE services
            SET name = $3, code = $4, category = $5, price = $6,
                estimated_minutes = $7, extra_costs = $8, updated_at = NOW()
            WHERE store_id = $1 AND id = $2
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(id)
            .bind(fields.name)
            .bind(fields.code)
            .bind(fields.category)
            .bind(fields.price)
            .bind(fields.estimated_minutes)
            .bind(Json(fields.extra_costs))
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Serviço".into()))
    }

    pub async fn set_service_active<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
        is_active: bool,
    ) -> Result<Service, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Service>(
            r#"
            UPDATE services SET is_active = $3, updated_at = NOW()
            WHERE store_id = $1 AND id = $2
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(id)
            .bind(is_active)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Serviço".into()))
    }
}
