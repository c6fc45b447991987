// src/db/sales_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        inventory::ItemKind,
        sales::{PaymentMethod, Sale, SaleItem, SaleStatus},
    },
};

/// Linha do carrinho já resolvida contra o catálogo.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSaleItem {
    pub kind: ItemKind,
    pub product_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

#[derive(Clone, Default)]
pub struct SalesRepository;

impl SalesRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert_sale<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        customer_id: Option<Uuid>,
        employee_id: Uuid,
        subtotal: Decimal,
        discount: Decimal,
        total: Decimal,
        payment_method: PaymentMethod,
        status: SaleStatus,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            INSERT INTO sales (
                store_id, customer_id, employee_id, subtotal, discount, total, payment_method, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(customer_id)
            .bind(employee_id)
            .bind(subtotal)
            .bind(discount)
            .bind(total)
            .bind(payment_method)
            .bind(status)
            .fetch_one(executor)
            .await?;
        Ok(sale)
    }

    pub async fn insert_item<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        sale_id: Uuid,
        item: &NewSaleItem,
    ) -> Result<SaleItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, SaleItem>(
            r#"
            INSERT INTO sale_items (
                store_id, sale_id, kind, product_id, service_id, name, quantity, unit_price, subtotal
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(sale_id)
            .bind(item.kind)
            .bind(item.product_id)
            .bind(item.service_id)
            .bind(&item.name)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.subtotal)
            .fetch_one(executor)
            .await?;
        Ok(row)
    }

    /// Vendas no intervalo [from, to), mais recentes primeiro.
    pub async fn list_sales<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT * FROM sales
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
        Ok(sales)
    }

    pub async fn find_sale<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE store_id = $1 AND id = $2")
            .bind(store_id)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Venda".into()))
    }

    pub async fn list_items<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        sale_id: Uuid,
    ) -> Result<Vec<SaleItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, SaleItem>(
            "SELECT * FROM sale_items WHERE store_id = $1 AND sale_id = $2 ORDER BY created_at, id",
        )
            .bind(store_id)
            .bind(sale_id)
            .fetch_all(executor)
            .await?;
        Ok(items)
    }

    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        sale_id: Uuid,
        status: SaleStatus,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE sales SET status = $3 WHERE store_id = $1 AND id = $2")
            .bind(store_id)
            .bind(sale_id)
            .bind(status)
            .execute(executor)
            .await?;
        Ok(())
    }

    // ---
    // Desfazer venda: cada passo apaga o que a venda gerou.
    // ---

    pub async fn delete_service_orders_of_sale<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        sale_id: Uuid,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM service_orders WHERE store_id = $1 AND sale_id = $2")
            .bind(store_id)
            .bind(sale_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    /// Apaga a venda a prazo (as parcelas vão junto por cascata).
    pub async fn delete_installment_sales_of_sale<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        sale_id: Uuid,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result =
            sqlx::query("DELETE FROM installment_sales WHERE store_id = $1 AND sale_id = $2")
                .bind(store_id)
                .bind(sale_id)
                .execute(executor)
                .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_receivables_of_sale<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        sale_id: Uuid,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result =
            sqlx::query("DELETE FROM receivable_accounts WHERE store_id = $1 AND sale_id = $2")
                .bind(store_id)
                .bind(sale_id)
                .execute(executor)
                .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_cash_movements_of_sale<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        sale_id: Uuid,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM cash_movements WHERE store_id = $1 AND sale_id = $2")
            .bind(store_id)
            .bind(sale_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_items<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        sale_id: Uuid,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM sale_items WHERE store_id = $1 AND sale_id = $2")
            .bind(store_id)
            .bind(sale_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_sale<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        sale_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM sales WHERE store_id = $1 AND id = $2")
            .bind(store_id)
            .bind(sale_id)
            .execute(executor)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound("Venda".into()));
        }
        Ok(())
    }
}
