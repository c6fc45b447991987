// src/services/service_order_service.rs

use std::sync::Arc;

use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{service_order_repo::NewServiceFile, CrmRepository, InventoryRepository, ServiceOrderRepository},
    models::service_orders::{
        plan_finalize, validate_problems, AttachmentInput, CreateServiceOrderPayload,
        FinalizeOutcome, FinalizeServiceOrderInput, ProblemInput, ProblemReason, RemovedServiceOrder,
        ServiceFile, ServiceFileKind, ServiceOrder, ServiceOrderDetail, ServiceOrderStatus,
        ValidProblem,
    },
    services::storage::{decode_attachment, object_path, DecodedAttachment, FileStorage},
};

/// Arquivo já gravado no armazenamento, aguardando o registro no banco.
#[derive(Clone)]
struct StoredFile {
    path: String,
    url: String,
    file_name: String,
    mime_type: String,
    size_bytes: i64,
}

fn decode_all(inputs: &[AttachmentInput]) -> Result<Vec<DecodedAttachment>, AppError> {
    inputs.iter().map(decode_attachment).collect()
}

fn kind_dir(kind: ServiceFileKind) -> &'static str {
    match kind {
        ServiceFileKind::Problema => "problemas",
        ServiceFileKind::Comprovacao => "comprovacao",
    }
}

#[derive(Clone)]
pub struct ServiceOrderService {
    order_repo: ServiceOrderRepository,
    inventory_repo: InventoryRepository,
    crm_repo: CrmRepository,
    storage: Arc<dyn FileStorage>,
}

impl ServiceOrderService {
    pub fn new(
        order_repo: ServiceOrderRepository,
        inventory_repo: InventoryRepository,
        crm_repo: CrmRepository,
        storage: Arc<dyn FileStorage>,
    ) -> Self {
        Self { order_repo, inventory_repo, crm_repo, storage }
    }

    /// Ordem avulsa (fora do PDV).
    pub fn create_order<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        payload: &CreateServiceOrderPayload,
    ) -> impl Future<Output = Result<ServiceOrder, AppError>> + Send
    where
        E: Acquire<'e, Database = Postgres> + Send,
    {
        async move {
            let mut conn = executor.acquire().await?;

            self.inventory_repo.find_service(&mut *conn, store_id, payload.service_id).await?;
            if let Some(customer_id) = payload.customer_id {
                self.crm_repo.find_customer(&mut *conn, store_id, customer_id).await?;
            }

            let notes = payload.notes.as_deref().map(str::trim).filter(|n| !n.is_empty());
            let order = self
                .order_repo
                .create_order(
                    &mut *conn,
                    store_id,
                    payload.service_id,
                    payload.customer_id,
                    None,
                    payload.expected_completion,
                    notes,
                )
                .await?;

            tracing::info!(order_id = %order.id, "Ordem de serviço aberta");
            Ok(order)
        }
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
        self.order_repo.list_orders(executor, store_id, status).await
    }

    pub fn get_order<'e, E>(&self, executor: E, store_id: Uuid, id: Uuid) -> impl Future<Output = Result<ServiceOrderDetail, AppError>> + Send
    where
        E: Acquire<'e, Database = Postgres> + Send,
    {
        async move {
            let mut conn = executor.acquire().await?;

            let order = self.order_repo.find_order(&mut *conn, store_id, id).await?;
            let (service_name, customer_name) = self.order_repo.find_names(&mut *conn, store_id, id).await?;
            let problems = self.order_repo.list_problems(&mut *conn, store_id, id).await?;
            let files = self.order_repo.list_files(&mut *conn, store_id, id).await?;

            Ok(ServiceOrderDetail { order, service_name, customer_name, problems, files })
        }
    }

    pub async fn start_order<'e, E>(&self, executor: E, store_id: Uuid, id: Uuid) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        self.transition(executor, store_id, id, ServiceOrderStatus::EmAndamento).await
    }

    pub async fn cancel_order<'e, E>(&self, executor: E, store_id: Uuid, id: Uuid) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        self.transition(executor, store_id, id, ServiceOrderStatus::Cancelado).await
    }

    async fn transition<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        id: Uuid,
        next: ServiceOrderStatus,
    ) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let order = self.order_repo.lock_order(&mut *tx, store_id, id).await?;
        order.status.ensure_transition(next)?;
        let updated = self.order_repo.set_status(&mut *tx, store_id, id, next).await?;
        tx.commit().await?;

        tracing::info!(order_id = %id, from = order.status.as_str(), to = next.as_str(), "Status da ordem alterado");
        Ok(updated)
    }

    /// Grava os problemas para revisão posterior. O lote inteiro é validado
    /// antes de qualquer escrita; os anexos enviados são apagados se a
    /// transação falhar.
    pub async fn save_problems<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        user_id: Uuid,
        order_id: Uuid,
        problems: &[ProblemInput],
    ) -> Result<ServiceOrderDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let problems = validate_problems(problems)?;
        let decoded = problems
            .iter()
            .map(|p| decode_all(&p.attachments))
            .collect::<Result<Vec<_>, _>>()?;

        let mut stored = Vec::new();
        let result = async {
            let mut tx = executor.begin().await?;

            let order = self.order_repo.lock_order(&mut *tx, store_id, order_id).await?;
            // Ordem encerrada não recebe mais problemas
            order.status.ensure_transition(ServiceOrderStatus::Finalizado)?;

            self.persist_problems(&mut *tx, store_id, user_id, order_id, &problems, decoded, &mut stored)
                .await?;
            self.order_repo.mark_problems_saved(&mut *tx, store_id, order_id).await?;

            let detail = self.detail_in(&mut *tx, store_id, order_id).await?;
            tx.commit().await?;
            Ok::<_, AppError>(detail)
        }
        .await;

        if result.is_err() {
            self.discard(&stored).await;
        } else {
            tracing::info!(%order_id, count = problems.len(), "Problemas da ordem gravados");
        }
        result
    }

    /// Finaliza a ordem: termo aceito e pagamento são obrigatórios; sem
    /// problemas gravados antes, exige a resposta "ocorreu perfeitamente?".
    pub async fn finalize_order<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        user_id: Uuid,
        order_id: Uuid,
        input: &FinalizeServiceOrderInput,
    ) -> Result<ServiceOrderDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut stored = Vec::new();
        let result = async {
            let mut tx = executor.begin().await?;

            let order = self.order_repo.lock_order(&mut *tx, store_id, order_id).await?;
            match plan_finalize(&order, input)? {
                FinalizeOutcome::AlreadyReviewed => {}
                FinalizeOutcome::Perfect { proof_files } => {
                    let decoded = decode_all(&proof_files)?;
                    for file in decoded {
                        let saved = self
                            .store_file(store_id, order_id, ServiceFileKind::Comprovacao, file, &mut stored)
                            .await?;
                        self.record_file(&mut *tx, store_id, user_id, order_id, None, ServiceFileKind::Comprovacao, &saved)
                            .await?;
                    }
                }
                FinalizeOutcome::WithProblems(problems) => {
                    let decoded = problems
                        .iter()
                        .map(|p| decode_all(&p.attachments))
                        .collect::<Result<Vec<_>, _>>()?;
                    self.persist_problems(&mut *tx, store_id, user_id, order_id, &problems, decoded, &mut stored)
                        .await?;
                    self.order_repo.mark_problems_saved(&mut *tx, store_id, order_id).await?;
                }
            }

            self.order_repo
                .finalize_order(&mut *tx, store_id, order_id, input.responsible_id, input.payment_method)
                .await?;

            let detail = self.detail_in(&mut *tx, store_id, order_id).await?;
            tx.commit().await?;
            Ok::<_, AppError>(detail)
        }
        .await;

        match &result {
            Ok(_) => tracing::info!(%order_id, "Ordem de serviço finalizada"),
            Err(_) => self.discard(&stored).await,
        }
        result
    }

    /// Remove a ordem guardando antes uma fotografia completa (ordem,
    /// serviço, cliente, venda, problemas e arquivos).
    pub async fn remove_order<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        user_id: Uuid,
        order_id: Uuid,
        reason: &str,
    ) -> Result<RemovedServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::RemovalReasonRequired);
        }

        let mut tx = executor.begin().await?;
        self.order_repo.lock_order(&mut *tx, store_id, order_id).await?;

        let snapshot = self.order_repo.snapshot_order(&mut *tx, store_id, order_id).await?;
        let removed = self
            .order_repo
            .insert_removed(&mut *tx, store_id, order_id, reason, &snapshot, user_id)
            .await?;
        self.order_repo.delete_order(&mut *tx, store_id, order_id).await?;

        tx.commit().await?;

        tracing::info!(%order_id, removed_by = %user_id, "Ordem de serviço removida");
        Ok(removed)
    }

    pub async fn download_file<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        order_id: Uuid,
        file_id: Uuid,
    ) -> Result<(ServiceFile, Vec<u8>), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let file = self.order_repo.find_file(executor, store_id, order_id, file_id).await?;
        let data = self.storage.download(&file.path).await?;
        Ok((file, data))
    }

    // --- Motivos de problema ---

    pub async fn create_reason<'e, E>(&self, executor: E, store_id: Uuid, name: &str) -> Result<ProblemReason, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.order_repo.create_reason(executor, store_id, name.trim()).await
    }

    pub async fn list_reasons<'e, E>(&self, executor: E, store_id: Uuid) -> Result<Vec<ProblemReason>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.order_repo.list_reasons(executor, store_id).await
    }

    // ---
    // Internos
    // ---

    async fn persist_problems(
        &self,
        conn: &mut PgConnection,
        store_id: Uuid,
        user_id: Uuid,
        order_id: Uuid,
        problems: &[ValidProblem],
        attachments: Vec<Vec<DecodedAttachment>>,
        stored: &mut Vec<StoredFile>,
    ) -> Result<(), AppError> {
        for (problem, files) in problems.iter().zip(attachments) {
            let row = self.order_repo.insert_problem(&mut *conn, store_id, order_id, problem).await?;
            for file in files {
                let saved = self
                    .store_file(store_id, order_id, ServiceFileKind::Problema, file, stored)
                    .await?;
                self.record_file(&mut *conn, store_id, user_id, order_id, Some(row.id), ServiceFileKind::Problema, &saved)
                    .await?;
            }
        }
        Ok(())
    }

    /// Sobe o arquivo e o anota em `stored` para eventual limpeza.
    async fn store_file(
        &self,
        store_id: Uuid,
        order_id: Uuid,
        kind: ServiceFileKind,
        file: DecodedAttachment,
        stored: &mut Vec<StoredFile>,
    ) -> Result<StoredFile, AppError> {
        let path = object_path(store_id, order_id, kind_dir(kind), &file.file_name);
        let size_bytes = file.data.len() as i64;
        let url = self.storage.upload(&path, file.data, &file.mime_type).await?;
        let saved = StoredFile {
            path,
            url,
            file_name: file.file_name,
            mime_type: file.mime_type,
            size_bytes,
        };
        stored.push(saved.clone());
        Ok(saved)
    }

    async fn record_file(
        &self,
        conn: &mut PgConnection,
        store_id: Uuid,
        user_id: Uuid,
        order_id: Uuid,
        problem_id: Option<Uuid>,
        kind: ServiceFileKind,
        file: &StoredFile,
    ) -> Result<ServiceFile, AppError> {
        self.order_repo
            .insert_file(
                conn,
                store_id,
                order_id,
                &NewServiceFile {
                    problem_id,
                    kind,
                    path: &file.path,
                    url: &file.url,
                    file_name: &file.file_name,
                    size_bytes: file.size_bytes,
                    mime_type: &file.mime_type,
                    uploaded_by: user_id,
                },
            )
            .await
    }

    async fn detail_in(&self, conn: &mut PgConnection, store_id: Uuid, order_id: Uuid) -> Result<ServiceOrderDetail, AppError> {
        let order = self.order_repo.find_order(&mut *conn, store_id, order_id).await?;
        let (service_name, customer_name) = self.order_repo.find_names(&mut *conn, store_id, order_id).await?;
        let problems = self.order_repo.list_problems(&mut *conn, store_id, order_id).await?;
        let files = self.order_repo.list_files(&mut *conn, store_id, order_id).await?;
        Ok(ServiceOrderDetail { order, service_name, customer_name, problems, files })
    }

    async fn discard(&self, stored: &[StoredFile]) {
        for file in stored {
            if let Err(e) = self.storage.delete(&file.path).await {
                tracing::warn!(path = %file.path, "Falha ao apagar anexo órfão: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(content: &str) -> AttachmentInput {
        AttachmentInput {
            file_name: "foto.jpg".into(),
            mime_type: "image/jpeg".into(),
            content_base64: content.into(),
        }
    }

    #[test]
    fn one_bad_attachment_rejects_the_batch() {
        let inputs = vec![attachment("aGVsbG8="), attachment("não é base64")];
        assert!(matches!(decode_all(&inputs), Err(AppError::InvalidAttachment(_))));
    }

    #[test]
    fn files_are_grouped_by_kind() {
        assert_eq!(kind_dir(ServiceFileKind::Problema), "problemas");
        assert_eq!(kind_dir(ServiceFileKind::Comprovacao), "comprovacao");
    }
}
