// src/db/service_order_repo.rs

use chrono::NaiveDate;
use serde_json::Value;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        sales::PaymentMethod,
        service_orders::{
            ProblemReason, RemovedServiceOrder, ServiceFile, ServiceFileKind, ServiceOrder,
            ServiceOrderStatus, ServiceProblem, ValidProblem,
        },
    },
};

/// Metadados de um arquivo já enviado ao armazenamento.
#[derive(Debug, Clone)]
pub struct NewServiceFile<'a> {
    pub problem_id: Option<Uuid>,
    pub kind: ServiceFileKind,
    pub path: &'a str,
    pub url: &'a str,
    pub file_name: &'a str,
    pub size_bytes: i64,
    pub mime_type: &'a str,
    pub uploaded_by: Uuid,
}

#[derive(Clone, Default)]
pub struct ServiceOrderRepository;

impl ServiceOrderRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create_order<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        service_id: Uuid,
        customer_id: Option<Uuid>,
        sale_id: Option<Uuid>,
        expected_completion: Option<NaiveDate>,
        notes: Option<&str>,
    ) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, ServiceOrder>(
            r#"
            INSERT INTO service_orders (
                store_id, service_id, customer_id, sale_id, expected_completion, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(service_id)
            .bind(customer_id)
            .bind(sale_id)
            .bind(expected_completion)
            .bind(notes)
            .fetch_one(executor)
            .await?;
        Ok(order)
    }

    pub async fn list_orders<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        status: Option<ServiceOrderStatus>,
    ) -> Result<Vec<ServiceOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let orders = sqlx::query_as::<_, ServiceOrder>(
            r#"
            SELECT * FROM service_orders
            WHERE store_id = $1 AND ($2::service_order_status IS NULL OR status = $2)
            ORDER BY started_at DESC
            "#,
        )
            .bind(store_id)
            .bind(status)
            .fetch_all(executor)
            .await?;
        Ok(orders)
    }

    pub async fn find_order<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
    ) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ServiceOrder>(
            "SELECT * FROM service_orders WHERE store_id = $1 AND id = $2",
        )
            .bind(store_id)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Ordem de serviço".into()))
    }

    pub async fn lock_order<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
    ) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ServiceOrder>(
            "SELECT * FROM service_orders WHERE store_id = $1 AND id = $2 FOR UPDATE",
        )
            .bind(store_id)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Ordem de serviço".into()))
    }

    /// (nome do serviço, nome do cliente) para a tela de detalhe.
    pub async fn find_names<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
    ) -> Result<(String, Option<String>), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, (String, Option<String>)>(
            r#"
            SELECT sv.name, c.name
            FROM service_orders o
            JOIN services sv ON sv.id = o.service_id
            LEFT JOIN customers c ON c.id = o.customer_id
            WHERE o.store_id = $1 AND o.id = $2
            "#,
        )
            .bind(store_id)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Ordem de serviço".into()))
    }

    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
        status: ServiceOrderStatus,
    ) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ServiceOrder>(
            r#"
            UPDATE service_orders SET status = $3, updated_at = NOW()
            WHERE store_id = $1 AND id = $2
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(id)
            .bind(status)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Ordem de serviço".into()))
    }

    pub async fn mark_problems_saved<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
    ) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ServiceOrder>(
            r#"
            UPDATE service_orders SET problems_saved = TRUE, updated_at = NOW()
            WHERE store_id = $1 AND id = $2
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Ordem de serviço".into()))
    }

    pub async fn finalize_order<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
        responsible_id: Uuid,
        payment_method: Option<PaymentMethod>,
    ) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ServiceOrder>(
            r#"
            UPDATE service_orders
            SET status = 'finalizado',
                completed_at = NOW(),
                responsible_id = $3,
                is_paid = TRUE,
                payment_method = COALESCE($4, payment_method),
                terms_accepted_at = NOW(),
                updated_at = NOW()
            WHERE store_id = $1 AND id = $2
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(id)
            .bind(responsible_id)
            .bind(payment_method)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Ordem de serviço".into()))
    }

    // ---
    // Problemas e arquivos
    // ---

    pub async fn insert_problem<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        order_id: Uuid,
        p: &ValidProblem,
    ) -> Result<ServiceProblem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, ServiceProblem>(
            r#"
            INSERT INTO service_problems (
                store_id, service_order_id, reason_id, fault_party, employee_id,
                description, extra_cost, liability_accepted, liability_accepted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, CASE WHEN $8 THEN NOW() END)
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(order_id)
            .bind(p.reason_id)
            .bind(p.fault_party)
            .bind(p.employee_id)
            .bind(&p.description)
            .bind(p.extra_cost)
            .bind(p.liability_accepted)
            .fetch_one(executor)
            .await?;
        Ok(row)
    }

    pub async fn list_problems<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        order_id: Uuid,
    ) -> Result<Vec<ServiceProblem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, ServiceProblem>(
            r#"
            SELECT * FROM service_problems
            WHERE store_id = $1 AND service_order_id = $2
            ORDER BY created_at ASC, id ASC
            "#,
        )
            .bind(store_id)
            .bind(order_id)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn insert_file<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        order_id: Uuid,
        f: &NewServiceFile<'_>,
    ) -> Result<ServiceFile, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, ServiceFile>(
            r#"
            INSERT INTO service_files (
                store_id, service_order_id, problem_id, kind, path, url,
                file_name, size_bytes, mime_type, uploaded_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(order_id)
            .bind(f.problem_id)
            .bind(f.kind)
            .bind(f.path)
            .bind(f.url)
            .bind(f.file_name)
            .bind(f.size_bytes)
            .bind(f.mime_type)
            .bind(f.uploaded_by)
            .fetch_one(executor)
            .await?;
        Ok(row)
    }

    pub async fn list_files<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        order_id: Uuid,
    ) -> Result<Vec<ServiceFile>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, ServiceFile>(
            r#"
            SELECT * FROM service_files
            WHERE store_id = $1 AND service_order_id = $2
            ORDER BY created_at ASC, id ASC
            "#,
        )
            .bind(store_id)
            .bind(order_id)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn find_file<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        order_id: Uuid,
        file_id: Uuid,
    ) -> Result<ServiceFile, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ServiceFile>(
            "SELECT * FROM service_files WHERE store_id = $1 AND service_order_id = $2 AND id = $3",
        )
            .bind(store_id)
            .bind(order_id)
            .bind(file_id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Arquivo".into()))
    }

    // ---
    // Remoção com trilha de auditoria
    // ---

    /// Fotografia completa da ordem (serviço, cliente, venda, problemas e arquivos) em JSON.
    pub async fn snapshot_order<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
    ) -> Result<Value, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_scalar::<_, Value>(
            r#"
            SELECT jsonb_build_object(
                'order', to_jsonb(o),
                'service', to_jsonb(sv),
                'customer', to_jsonb(c),
                'sale', to_jsonb(s),
                'problems', COALESCE(
                    (SELECT jsonb_agg(to_jsonb(p) ORDER BY p.created_at)
                     FROM service_problems p WHERE p.service_order_id = o.id),
                    '[]'::jsonb),
                'files', COALESCE(
                    (SELECT jsonb_agg(to_jsonb(f) ORDER BY f.created_at)
                     FROM service_files f WHERE f.service_order_id = o.id),
                    '[]'::jsonb)
            )
            FROM service_orders o
            JOIN services sv ON sv.id = o.service_id
            LEFT JOIN customers c ON c.id = o.customer_id
            LEFT JOIN sales s ON s.id = o.sale_id
            WHERE o.store_id = $1 AND o.id = $2
            "#,
        )
            .bind(store_id)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Ordem de serviço".into()))
    }

    pub async fn insert_removed<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        order_id: Uuid,
        reason: &str,
        snapshot: &Value,
        removed_by: Uuid,
    ) -> Result<RemovedServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, RemovedServiceOrder>(
            r#"
            INSERT INTO removed_service_orders (store_id, service_order_id, reason, snapshot, removed_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(order_id)
            .bind(reason)
            .bind(snapshot)
            .bind(removed_by)
            .fetch_one(executor)
            .await?;
        Ok(row)
    }

    pub async fn delete_order<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM service_orders WHERE store_id = $1 AND id = $2")
            .bind(store_id)
            .bind(id)
            .execute(executor)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound("Ordem de serviço".into()));
        }
        Ok(())
    }

    // ---
    // Motivos de problema
    // ---

    pub async fn create_reason<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        name: &str,
    ) -> Result<ProblemReason, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, ProblemReason>(
            "INSERT INTO problem_reasons (store_id, name) VALUES ($1, $2) RETURNING *",
        )
            .bind(store_id)
            .bind(name)
            .fetch_one(executor)
            .await?;
        Ok(row)
    }

    pub async fn list_reasons<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
    ) -> Result<Vec<ProblemReason>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, ProblemReason>(
            "SELECT * FROM problem_reasons WHERE store_id = $1 AND is_active ORDER BY name ASC",
        )
            .bind(store_id)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }
}
