// src/services/crm_service.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{crm_repo::CustomerFields, CrmRepository},
    models::crm::{Customer, CustomerPayload},
};

fn clean(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn fields_of(payload: &CustomerPayload) -> CustomerFields<'_> {
    CustomerFields {
        name: payload.name.trim(),
        email: clean(&payload.email),
        phone: clean(&payload.phone),
        person_kind: payload.person_kind,
        tax_id: clean(&payload.tax_id),
        zip_code: clean(&payload.zip_code),
        street: clean(&payload.street),
        number: clean(&payload.number),
        complement: clean(&payload.complement),
        district: clean(&payload.district),
        city: clean(&payload.city),
        state: clean(&payload.state),
        notes: clean(&payload.notes),
    }
}

#[derive(Clone)]
pub struct CrmService {
    crm_repo: CrmRepository,
}

impl CrmService {
    pub fn new(crm_repo: CrmRepository) -> Self {
        Self { crm_repo }
    }

    pub async fn create_customer<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        payload: &CustomerPayload,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = self.crm_repo.create_customer(executor, store_id, &fields_of(payload)).await?;
        tracing::info!(customer_id = %customer.id, "Cliente cadastrado");
        Ok(customer)
    }

    pub async fn list_customers<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        search: Option<&str>,
    ) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.crm_repo.list_customers(executor, store_id, search).await
    }

    pub async fn get_customer<'e, E>(&self, executor: E, store_id: Uuid, id: Uuid) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.crm_repo.find_customer(executor, store_id, id).await
    }

    pub async fn update_customer<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
        payload: &CustomerPayload,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.crm_repo.update_customer(executor, store_id, id, &fields_of(payload)).await
    }

    pub async fn delete_customer<'e, E>(&self, executor: E, store_id: Uuid, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.crm_repo.delete_customer(executor, store_id, id).await
    }
}
