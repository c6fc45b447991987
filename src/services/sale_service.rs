// src/services/sale_service.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{AppError, OptionalResult},
    db::{
        cash_repo::NewCashMovement, sales_repo::NewSaleItem, CashRepository, CrmRepository,
        InstallmentRepository, InventoryRepository, SalesRepository, ServiceOrderRepository,
    },
    models::{
        cash::CashDirection,
        installments::plan_installments,
        inventory::ItemKind,
        sales::{
            CartItemInput, DiscountInput, FinalizeSalePayload, Sale, SaleDetail, SaleReceipt,
            SaleStatus,
        },
    },
    services::inventory_service::InventoryService,
};

/// Totais da venda antes de gravar.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleDraft {
    pub items: Vec<NewSaleItem>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

impl SaleDraft {
    /// total = subtotal - desconto, sem piso: desconto maior que o subtotal
    /// gera total negativo.
    pub fn new(items: Vec<NewSaleItem>, discount: Option<DiscountInput>) -> Self {
        let subtotal: Decimal = items.iter().map(|i| i.subtotal).sum();
        let discount = discount.map(|d| d.absolute(subtotal)).unwrap_or(Decimal::ZERO);
        Self {
            items,
            subtotal,
            discount,
            total: subtotal - discount,
        }
    }
}

/// Lançamento de caixa de uma venda à vista. O valor gravado é sempre
/// positivo: total negativo vira saída, total zero não lança nada.
pub fn cash_entry_for_total(total: Decimal) -> Option<(CashDirection, Decimal)> {
    if total > Decimal::ZERO {
        Some((CashDirection::Entrada, total))
    } else if total < Decimal::ZERO {
        Some((CashDirection::Saida, -total))
    } else {
        None
    }
}

/// Linha do carrinho com preço e nome resolvidos: o preço informado vence o de cadastro.
pub fn price_line(
    input: &CartItemInput,
    catalog_name: &str,
    catalog_price: Decimal,
) -> NewSaleItem {
    let unit_price = input.unit_price.unwrap_or(catalog_price);
    NewSaleItem {
        kind: input.kind,
        product_id: input.product_id,
        service_id: input.service_id,
        name: catalog_name.to_string(),
        quantity: input.quantity,
        unit_price,
        subtotal: unit_price * Decimal::from(input.quantity),
    }
}

#[derive(Clone)]
pub struct SaleService {
    sales_repo: SalesRepository,
    inventory_repo: InventoryRepository,
    crm_repo: CrmRepository,
    cash_repo: CashRepository,
    installment_repo: InstallmentRepository,
    service_order_repo: ServiceOrderRepository,
    inventory_service: InventoryService,
}

impl SaleService {
    pub fn new(
        sales_repo: SalesRepository,
        inventory_repo: InventoryRepository,
        crm_repo: CrmRepository,
        cash_repo: CashRepository,
        installment_repo: InstallmentRepository,
        service_order_repo: ServiceOrderRepository,
        inventory_service: InventoryService,
    ) -> Self {
        Self {
            sales_repo,
            inventory_repo,
            crm_repo,
            cash_repo,
            installment_repo,
            service_order_repo,
            inventory_service,
        }
    }

    /// Finaliza a venda do PDV numa única transação:
    /// venda, itens, baixa de estoque, ordens de serviço, e então
    /// parcelas (a prazo) ou entrada no caixa aberto (à vista).
    pub async fn finalize_sale<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        employee_id: Uuid,
        payload: &FinalizeSalePayload,
    ) -> Result<SaleReceipt, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if payload.items.is_empty() {
            return Err(AppError::EmptyCart);
        }
        if payload.installments.is_some() && payload.customer_id.is_none() {
            return Err(AppError::CustomerRequired);
        }

        let mut tx = executor.begin().await?;

        if let Some(customer_id) = payload.customer_id {
            self.crm_repo.find_customer(&mut *tx, store_id, customer_id).await?;
        }

        // 1. Resolve preços e nomes contra o catálogo
        let mut lines = Vec::with_capacity(payload.items.len());
        for input in &payload.items {
            let line = match (input.kind, input.product_id, input.service_id) {
                (ItemKind::Produto, Some(product_id), _) => {
                    let product = self.inventory_repo.find_product(&mut *tx, store_id, product_id).await?;
                    price_line(input, &product.name, product.price)
                }
                (ItemKind::Servico, _, Some(service_id)) => {
                    let service = self.inventory_repo.find_service(&mut *tx, store_id, service_id).await?;
                    price_line(input, &service.name, service.price)
                }
                (ItemKind::Produto, None, _) => {
                    return Err(AppError::ResourceNotFound("Produto".into()));
                }
                (ItemKind::Servico, _, None) => {
                    return Err(AppError::ResourceNotFound("Serviço".into()));
                }
            };
            lines.push(line);
        }
        let draft = SaleDraft::new(lines, payload.discount);

        // 2. Cabeçalho
        let status = if payload.installments.is_some() {
            SaleStatus::Pendente
        } else {
            SaleStatus::Concluida
        };
        let sale = self
            .sales_repo
            .insert_sale(
                &mut *tx,
                store_id,
                payload.customer_id,
                employee_id,
                draft.subtotal,
                draft.discount,
                draft.total,
                payload.payment_method,
                status,
            )
            .await?;

        // 3. Itens, estoque e ordens de serviço
        let mut items = Vec::with_capacity(draft.items.len());
        let mut service_order_ids = Vec::new();
        for line in &draft.items {
            items.push(self.sales_repo.insert_item(&mut *tx, store_id, sale.id, line).await?);

            match (line.kind, line.product_id, line.service_id) {
                (ItemKind::Produto, Some(product_id), _) => {
                    self.inventory_repo
                        .adjust_stock(&mut *tx, store_id, product_id, -line.quantity)
                        .await?;
                }
                (ItemKind::Servico, _, Some(service_id)) => {
                    let order = self
                        .service_order_repo
                        .create_order(&mut *tx, store_id, service_id, payload.customer_id, Some(sale.id), None, None)
                        .await?;
                    service_order_ids.push(order.id);
                }
                _ => {}
            }
        }

        // 4. A prazo: parcelas. À vista: entrada no caixa, se houver um aberto.
        let mut installment_sale_id = None;
        let mut cash_movement_id = None;

        match (&payload.installments, payload.customer_id) {
            (Some(plan), Some(customer_id)) => {
                let planned = plan_installments(draft.total, plan.count, plan.first_due_date)
                    .ok_or(AppError::DateOutOfRange)?;
                let installment_sale = self
                    .installment_repo
                    .insert_installment_sale(&mut *tx, store_id, sale.id, customer_id, draft.total, plan.first_due_date)
                    .await?;
                for p in &planned {
                    self.installment_repo
                        .insert_installment(&mut *tx, store_id, installment_sale.id, p)
                        .await?;
                }
                installment_sale_id = Some(installment_sale.id);
            }
            _ => match cash_entry_for_total(draft.total) {
                Some((direction, amount)) => {
                    if let Some(session) = self.cash_repo.lock_open_session(&mut *tx, store_id).await? {
                        let movement = self
                            .cash_repo
                            .insert_movement(
                                &mut *tx,
                                store_id,
                                session.id,
                                &NewCashMovement {
                                    direction,
                                    category: payload.payment_method.cash_category(),
                                    description: None,
                                    amount,
                                    employee_id,
                                    sale_id: Some(sale.id),
                                },
                            )
                            .await?;
                        cash_movement_id = Some(movement.id);
                    } else {
                        tracing::info!(sale_id = %sale.id, "Venda sem caixa aberto: nenhuma entrada registrada");
                    }
                }
                None => {
                    tracing::debug!(sale_id = %sale.id, "Venda com total zero: nada a lançar no caixa");
                }
            },
        }

        tx.commit().await?;
        self.inventory_service.invalidate_products(store_id);

        tracing::info!(sale_id = %sale.id, total = %sale.total, "Venda finalizada");

        Ok(SaleReceipt {
            sale,
            items,
            cash_movement_id,
            installment_sale_id,
            service_order_ids,
        })
    }

    /// Desfaz uma venda: devolve o estoque e apaga tudo o que ela gerou.
    /// Tudo ou nada.
    pub async fn delete_sale<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        sale_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        // Garante 404 antes de mexer em qualquer coisa
        self.sales_repo.find_sale(&mut *tx, store_id, sale_id).await?;

        let items = self.sales_repo.list_items(&mut *tx, store_id, sale_id).await?;
        for item in &items {
            if let (ItemKind::Produto, Some(product_id)) = (item.kind, item.product_id) {
                self.inventory_repo
                    .adjust_stock(&mut *tx, store_id, product_id, item.quantity)
                    .await?;
            }
        }

        self.sales_repo.delete_service_orders_of_sale(&mut *tx, store_id, sale_id).await?;
        self.sales_repo.delete_installment_sales_of_sale(&mut *tx, store_id, sale_id).await?;
        self.sales_repo.delete_receivables_of_sale(&mut *tx, store_id, sale_id).await?;
        self.sales_repo.delete_cash_movements_of_sale(&mut *tx, store_id, sale_id).await?;
        self.sales_repo.delete_items(&mut *tx, store_id, sale_id).await?;
        self.sales_repo.delete_sale(&mut *tx, store_id, sale_id).await?;

        tx.commit().await?;
        self.inventory_service.invalidate_products(store_id);

        tracing::info!(%sale_id, "Venda excluída e estoque devolvido");
        Ok(())
    }

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
        self.sales_repo.list_sales(executor, store_id, from, to).await
    }

    pub fn get_sale<'e, E>(&self, executor: E, store_id: Uuid, sale_id: Uuid) -> impl Future<Output = Result<SaleDetail, AppError>> + Send
    where
        E: Acquire<'e, Database = Postgres> + Send,
    {
        async move {
            let mut conn = executor.acquire().await?;

            let sale = self.sales_repo.find_sale(&mut *conn, store_id, sale_id).await?;
            let items = self.sales_repo.list_items(&mut *conn, store_id, sale_id).await?;
            let customer_name = match sale.customer_id {
                Some(customer_id) => self
                    .crm_repo
                    .find_customer(&mut *conn, store_id, customer_id)
                    .await
                    .found()?
                    .map(|c| c.name),
                None => None,
            };

            Ok(SaleDetail { sale, customer_name, items })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().expect("decimal")
    }

    fn product_line(qty: i32, price: &str) -> NewSaleItem {
        let input = CartItemInput {
            kind: ItemKind::Produto,
            product_id: Some(Uuid::new_v4()),
            service_id: None,
            quantity: qty,
            unit_price: None,
        };
        price_line(&input, "Produto A", dec(price))
    }

    fn service_line(price: &str) -> NewSaleItem {
        let input = CartItemInput {
            kind: ItemKind::Servico,
            product_id: None,
            service_id: Some(Uuid::new_v4()),
            quantity: 1,
            unit_price: None,
        };
        price_line(&input, "Serviço B", dec(price))
    }

    #[test]
    fn product_and_service_with_fixed_discount() {
        let draft = SaleDraft::new(
            vec![product_line(2, "10.00"), service_line("30.00")],
            Some(DiscountInput::Amount(dec("5.00"))),
        );
        assert_eq!(draft.items[0].subtotal, dec("20.00"));
        assert_eq!(draft.subtotal, dec("50.00"));
        assert_eq!(draft.discount, dec("5.00"));
        assert_eq!(draft.total, dec("45.00"));
    }

    #[test]
    fn discount_larger_than_subtotal_goes_negative() {
        let draft = SaleDraft::new(vec![product_line(1, "10.00")], Some(DiscountInput::Amount(dec("15.00"))));
        assert_eq!(draft.total, dec("-5.00"));
    }

    #[test]
    fn percent_discount_is_rounded_to_cents() {
        let draft = SaleDraft::new(vec![product_line(1, "33.33")], Some(DiscountInput::Percent(dec("10"))));
        assert_eq!(draft.discount, dec("3.33"));
        assert_eq!(draft.total, dec("30.00"));
    }

    #[test]
    fn informed_unit_price_overrides_catalog() {
        let input = CartItemInput {
            kind: ItemKind::Produto,
            product_id: Some(Uuid::new_v4()),
            service_id: None,
            quantity: 3,
            unit_price: Some(dec("8.00")),
        };
        let line = price_line(&input, "Chave", dec("10.00"));
        assert_eq!(line.unit_price, dec("8.00"));
        assert_eq!(line.subtotal, dec("24.00"));
        assert_eq!(line.name, "Chave");
    }

    #[test]
    fn cash_entry_amount_is_never_negative() {
        assert_eq!(cash_entry_for_total(dec("45.00")), Some((CashDirection::Entrada, dec("45.00"))));
        assert_eq!(cash_entry_for_total(dec("-5.00")), Some((CashDirection::Saida, dec("5.00"))));
        assert_eq!(cash_entry_for_total(Decimal::ZERO), None);
    }

    #[test]
    fn no_discount_means_total_equals_subtotal() {
        let draft = SaleDraft::new(vec![product_line(2, "7.50")], None);
        assert_eq!(draft.discount, Decimal::ZERO);
        assert_eq!(draft.total, dec("15.00"));
    }
}
