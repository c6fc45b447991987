// src/services/installment_service.rs

use chrono::Utc;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{AppError, OptionalResult},
    db::{CrmRepository, InstallmentRepository, SalesRepository},
    models::{
        installments::{
            summarize_installments, Installment, InstallmentSale, InstallmentSaleDetail,
            InstallmentSaleStatus, InstallmentStatus, InstallmentTotals,
        },
        sales::SaleStatus,
    },
};

/// Agregado após um pagamento. Uma venda ainda não quitada com parcela
/// vencida continua atrasada.
pub fn totals_after_payment(total: rust_decimal::Decimal, installments: &[Installment]) -> InstallmentTotals {
    let mut totals = summarize_installments(total, installments);
    let overdue = installments.iter().any(|i| i.status == InstallmentStatus::Atrasada);
    if overdue && totals.status != InstallmentSaleStatus::Quitada {
        totals.status = InstallmentSaleStatus::Atrasada;
    }
    totals
}

#[derive(Clone)]
pub struct InstallmentService {
    installment_repo: InstallmentRepository,
    sales_repo: SalesRepository,
    crm_repo: CrmRepository,
}

impl InstallmentService {
    pub fn new(installment_repo: InstallmentRepository, sales_repo: SalesRepository, crm_repo: CrmRepository) -> Self {
        Self { installment_repo, sales_repo, crm_repo }
    }

    /// Lista já com o status de atraso atualizado.
    pub fn list<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        status: Option<InstallmentSaleStatus>,
    ) -> impl Future<Output = Result<Vec<InstallmentSale>, AppError>> + Send
    where
        E: Acquire<'e, Database = Postgres> + Send,
    {
        async move {
            let mut conn = executor.acquire().await?;
            let today = Utc::now().date_naive();

            let refreshed = self.installment_repo.refresh_overdue(&mut *conn, store_id, today).await?;
            if refreshed > 0 {
                tracing::debug!(%store_id, refreshed, "Vendas a prazo marcadas como atrasadas");
            }

            self.installment_repo.list_installment_sales(&mut *conn, store_id, status).await
        }
    }

    pub fn get<'e, E>(&self, executor: E, store_id: Uuid, id: Uuid) -> impl Future<Output = Result<InstallmentSaleDetail, AppError>> + Send
    where
        E: Acquire<'e, Database = Postgres> + Send,
    {
        async move {
            let mut conn = executor.acquire().await?;
            let installment_sale = self.installment_repo.find_installment_sale(&mut *conn, store_id, id).await?;
            self.detail(&mut *conn, store_id, installment_sale).await
        }
    }

    async fn detail(
        &self,
        conn: &mut sqlx::PgConnection,
        store_id: Uuid,
        installment_sale: InstallmentSale,
    ) -> Result<InstallmentSaleDetail, AppError> {
        let installments = self
            .installment_repo
            .list_installments(&mut *conn, store_id, installment_sale.id)
            .await?;
        let customer_name = self
            .crm_repo
            .find_customer(&mut *conn, store_id, installment_sale.customer_id)
            .await
            .found()?
            .map(|c| c.name);
        Ok(InstallmentSaleDetail { installment_sale, customer_name, installments })
    }

    /// Paga uma parcela inteira e recalcula a venda a prazo.
    /// Quitada a venda a prazo, a venda original passa a concluída.
    pub async fn pay_installment<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        installment_sale_id: Uuid,
        installment_id: Uuid,
    ) -> Result<InstallmentSaleDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let parent = self
            .installment_repo
            .lock_installment_sale(&mut *tx, store_id, installment_sale_id)
            .await?;

        let current = self
            .installment_repo
            .list_installments(&mut *tx, store_id, parent.id)
            .await?;
        let target = current
            .iter()
            .find(|i| i.id == installment_id)
            .ok_or_else(|| AppError::ResourceNotFound("Parcela".into()))?;
        if target.status == InstallmentStatus::Paga {
            return Err(AppError::InstallmentAlreadyPaid);
        }

        self.installment_repo
            .mark_installment_paid(&mut *tx, store_id, parent.id, installment_id)
            .await?;

        let installments = self
            .installment_repo
            .list_installments(&mut *tx, store_id, parent.id)
            .await?;
        let totals = totals_after_payment(parent.total, &installments);
        let updated = self
            .installment_repo
            .update_totals(&mut *tx, store_id, parent.id, &totals)
            .await?;

        if totals.status == InstallmentSaleStatus::Quitada {
            self.sales_repo
                .set_status(&mut *tx, store_id, updated.sale_id, SaleStatus::Concluida)
                .await?;
        }

        let detail = self.detail(&mut *tx, store_id, updated).await?;
        tx.commit().await?;

        tracing::info!(
            installment_sale_id = %detail.installment_sale.id,
            status = ?detail.installment_sale.status,
            "Parcela paga"
        );
        Ok(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn installment(number: i32, status: InstallmentStatus) -> Installment {
        Installment {
            id: Uuid::new_v4(),
            store_id: Uuid::nil(),
            installment_sale_id: Uuid::nil(),
            number,
            amount: Decimal::ONE_HUNDRED,
            due_date: NaiveDate::from_ymd_opt(2025, 1, 10).expect("date"),
            status,
            paid_at: None,
        }
    }

    #[test]
    fn overdue_installment_keeps_parent_overdue() {
        let list = vec![
            installment(1, InstallmentStatus::Paga),
            installment(2, InstallmentStatus::Atrasada),
            installment(3, InstallmentStatus::Pendente),
        ];
        let totals = totals_after_payment(Decimal::from(300), &list);
        assert_eq!(totals.status, InstallmentSaleStatus::Atrasada);
        assert_eq!(totals.amount_paid, Decimal::ONE_HUNDRED);
        assert_eq!(totals.amount_remaining, Decimal::from(200));
    }

    #[test]
    fn paying_the_last_one_settles_even_after_delay() {
        let list = vec![
            installment(1, InstallmentStatus::Paga),
            installment(2, InstallmentStatus::Paga),
        ];
        let totals = totals_after_payment(Decimal::from(200), &list);
        assert_eq!(totals.status, InstallmentSaleStatus::Quitada);
        assert_eq!(totals.amount_remaining, Decimal::ZERO);
    }
}
