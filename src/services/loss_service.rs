// src/services/loss_service.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{loss_repo::NewLoss, CategoryRepository, CategoryTable, InventoryRepository, LossRepository},
    models::{
        inventory::ItemKind,
        losses::{CategoryPayload, CategoryTag, Loss, RecordLossPayload},
    },
    services::inventory_service::InventoryService,
};

/// (valor unitário, total). O valor informado vence o sugerido.
pub fn loss_value(informed: Option<Decimal>, suggested: Decimal, quantity: i32) -> (Decimal, Decimal) {
    let unit_value = informed.unwrap_or(suggested);
    (unit_value, unit_value * Decimal::from(quantity))
}

#[derive(Clone)]
pub struct LossService {
    loss_repo: LossRepository,
    inventory_repo: InventoryRepository,
    category_repo: CategoryRepository,
    inventory_service: InventoryService,
}

impl LossService {
    pub fn new(
        loss_repo: LossRepository,
        inventory_repo: InventoryRepository,
        category_repo: CategoryRepository,
        inventory_service: InventoryService,
    ) -> Self {
        Self { loss_repo, inventory_repo, category_repo, inventory_service }
    }

    /// Registra a perda e, para produto, baixa o estoque na mesma transação.
    pub async fn record_loss<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        employee_id: Uuid,
        payload: &RecordLossPayload,
    ) -> Result<Loss, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        // Sugestão: custo do produto, preço do serviço
        let suggested = match (payload.kind, payload.product_id, payload.service_id) {
            (ItemKind::Produto, Some(id), _) => self.inventory_repo.find_product(&mut *tx, store_id, id).await?.cost,
            (ItemKind::Servico, _, Some(id)) => self.inventory_repo.find_service(&mut *tx, store_id, id).await?.price,
            (ItemKind::Produto, None, _) => return Err(AppError::ResourceNotFound("Produto".into())),
            (ItemKind::Servico, _, None) => return Err(AppError::ResourceNotFound("Serviço".into())),
        };
        let (unit_value, total) = loss_value(payload.unit_value, suggested, payload.quantity);

        let notes = payload.notes.as_deref().map(str::trim).filter(|n| !n.is_empty());
        let loss = self
            .loss_repo
            .insert_loss(
                &mut *tx,
                store_id,
                &NewLoss {
                    kind: payload.kind,
                    product_id: payload.product_id,
                    service_id: payload.service_id,
                    quantity: payload.quantity,
                    unit_value,
                    total,
                    employee_id,
                    category_id: payload.category_id,
                    notes,
                },
            )
            .await?;

        if let (ItemKind::Produto, Some(product_id)) = (loss.kind, loss.product_id) {
            self.inventory_repo
                .adjust_stock(&mut *tx, store_id, product_id, -loss.quantity)
                .await?;
        }

        tx.commit().await?;
        if loss.kind == ItemKind::Produto {
            self.inventory_service.invalidate_products(store_id);
        }

        tracing::info!(loss_id = %loss.id, total = %loss.total, "Perda registrada");
        Ok(loss)
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
        self.loss_repo.list_losses(executor, store_id, from, to).await
    }

    // --- Categorias de perda ---

    pub async fn create_category<'e, E>(&self, executor: E, store_id: Uuid, payload: &CategoryPayload) -> Result<CategoryTag, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.category_repo
            .create(executor, CategoryTable::Loss, store_id, payload.name.trim(), payload.color.as_deref())
            .await
    }

    pub async fn list_categories<'e, E>(&self, executor: E, store_id: Uuid, include_inactive: bool) -> Result<Vec<CategoryTag>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.category_repo.list(executor, CategoryTable::Loss, store_id, include_inactive).await
    }

    pub async fn deactivate_category<'e, E>(&self, executor: E, store_id: Uuid, id: Uuid) -> Result<CategoryTag, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.category_repo.deactivate(executor, CategoryTable::Loss, store_id, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_unit_value_times_quantity() {
        let (unit, total) = loss_value(None, "4.50".parse().expect("dec"), 3);
        assert_eq!(unit, "4.50".parse::<Decimal>().expect("dec"));
        assert_eq!(total, "13.50".parse::<Decimal>().expect("dec"));
    }

    #[test]
    fn operator_value_overrides_suggestion() {
        let (unit, total) = loss_value(Some(Decimal::from(10)), Decimal::from(4), 2);
        assert_eq!(unit, Decimal::from(10));
        assert_eq!(total, Decimal::from(20));
    }
}
