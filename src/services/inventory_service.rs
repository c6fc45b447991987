// src/services/inventory_service.rs

use std::sync::Arc;

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        inventory_repo::{ProductFields, ServiceFields},
        InventoryRepository,
    },
    models::inventory::{
        Product, ProductPayload, ProductView, Service, ServicePayload, StockEntryPayload,
    },
    services::cache::StoreCache,
};

fn blank_to_none(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct InventoryService {
    inventory_repo: InventoryRepository,
    products_cache: Arc<StoreCache<Vec<Product>>>,
    services_cache: Arc<StoreCache<Vec<Service>>>,
}

impl InventoryService {
    pub fn new(inventory_repo: InventoryRepository) -> Self {
        Self {
            inventory_repo,
            products_cache: Arc::new(StoreCache::new()),
            services_cache: Arc::new(StoreCache::new()),
        }
    }

    /// Chamado depois do commit de qualquer escrita em `products`
    /// (inclusive baixas de estoque por venda e perda).
    pub fn invalidate_products(&self, store_id: Uuid) {
        self.products_cache.invalidate(store_id);
    }

    pub fn invalidate_services(&self, store_id: Uuid) {
        self.services_cache.invalidate(store_id);
    }

    // --- PRODUTOS ---

    pub async fn list_products<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<ProductView>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let products = self
            .products_cache
            .get_or_load(store_id, || self.inventory_repo.list_products(executor, store_id))
            .await?;

        Ok(products
            .iter()
            .filter(|p| include_inactive || p.is_active)
            .map(ProductView::from)
            .collect())
    }

    pub async fn get_product<'e, E>(&self, executor: E, store_id: Uuid, id: Uuid) -> Result<ProductView, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = self.inventory_repo.find_product(executor, store_id, id).await?;
        Ok(ProductView::from(&product))
    }

    pub async fn create_product<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        payload: &ProductPayload,
    ) -> Result<ProductView, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let fields = ProductFields {
            name: payload.name.trim(),
            code: blank_to_none(payload.code.as_deref()),
            category: blank_to_none(payload.category.as_deref()),
            price: payload.price,
            cost: payload.cost,
        };
        let product = self
            .inventory_repo
            .create_product(executor, store_id, &fields, payload.initial_stock)
            .await?;

        self.invalidate_products(store_id);
        Ok(ProductView::from(&product))
    }

    pub async fn update_product<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
        payload: &ProductPayload,
    ) -> Result<ProductView, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let fields = ProductFields {
            name: payload.name.trim(),
            code: blank_to_none(payload.code.as_deref()),
            category: blank_to_none(payload.category.as_deref()),
            price: payload.price,
            cost: payload.cost,
        };
        let product = self.inventory_repo.update_product(executor, store_id, id, &fields).await?;

        self.invalidate_products(store_id);
        Ok(ProductView::from(&product))
    }

    pub async fn deactivate_product<'e, E>(&self, executor: E, store_id: Uuid, id: Uuid) -> Result<ProductView, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = self.inventory_repo.set_product_active(executor, store_id, id, false).await?;
        self.invalidate_products(store_id);
        Ok(ProductView::from(&product))
    }

    /// Entrada de mercadoria (delta positivo).
    pub async fn stock_entry<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        product_id: Uuid,
        payload: &StockEntryPayload,
    ) -> Result<ProductView, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let product = self
            .inventory_repo
            .receive_stock(&mut *tx, store_id, product_id, payload.quantity, payload.unit_cost)
            .await?;

        tx.commit().await?;
        self.invalidate_products(store_id);

        tracing::info!(%product_id, quantity = payload.quantity, stock = product.stock, "Entrada de estoque");
        Ok(ProductView::from(&product))
    }

    // --- SERVIÇOS ---

    pub async fn list_services<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<Service>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let services = self
            .services_cache
            .get_or_load(store_id, || self.inventory_repo.list_services(executor, store_id))
            .await?;

        Ok(services
            .iter()
            .filter(|s| include_inactive || s.is_active)
            .cloned()
            .collect())
    }

    pub async fn create_service<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        payload: &ServicePayload,
    ) -> Result<Service, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let fields = ServiceFields {
            name: payload.name.trim(),
            code: blank_to_none(payload.code.as_deref()),
            category: blank_to_none(payload.category.as_deref()),
            price: payload.price,
            estimated_minutes: payload.estimated_minutes,
            extra_costs: &payload.extra_costs,
        };
        let service = self.inventory_repo.create_service(executor, store_id, &fields).await?;
        self.invalidate_services(store_id);
        Ok(service)
    }

    pub async fn update_service<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
        payload: &ServicePayload,
    ) -> Result<Service, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let fields = ServiceFields {
            name: payload.name.trim(),
            code: blank_to_none(payload.code.as_deref()),
            category: blank_to_none(payload.category.as_deref()),
            price: payload.price,
            estimated_minutes: payload.estimated_minutes,
            extra_costs: &payload.extra_costs,
        };
        let service = self.inventory_repo.update_service(executor, store_id, id, &fields).await?;
        self.invalidate_services(store_id);
        Ok(service)
    }

    pub async fn deactivate_service<'e, E>(&self, executor: E, store_id: Uuid, id: Uuid) -> Result<Service, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let service = self.inventory_repo.set_service_active(executor, store_id, id, false).await?;
        self.invalidate_services(store_id);
        Ok(service)
    }
}
