// src/services/store_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{store_repo::EmployeeFields, StoreRepository},
    models::store::{
        AccessLevel, CreateEmployeePayload, Store, StoreUser, UpdateEmployeePayload,
        UpdateStorePayload, UserStore,
    },
    services::auth::AuthService,
};

#[derive(Clone)]
pub struct StoreService {
    store_repo: StoreRepository,
    auth_service: AuthService,
}

impl StoreService {
    pub fn new(store_repo: StoreRepository, auth_service: AuthService) -> Self {
        Self { store_repo, auth_service }
    }

    pub async fn my_stores(&self, user_id: Uuid) -> Result<Vec<UserStore>, AppError> {
        self.store_repo.list_user_stores(user_id).await
    }

    pub async fn get_store<'e, E>(&self, executor: E, store_id: Uuid) -> Result<Store, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.store_repo.find_store(executor, store_id).await
    }

    pub async fn update_store<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        payload: &UpdateStorePayload,
    ) -> Result<Store, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.store_repo
            .update_store(
                executor,
                store_id,
                payload.name.trim(),
                payload.tax_id.as_deref(),
                payload.address.as_deref(),
                payload.phone.as_deref(),
                payload.pix_key.as_deref(),
            )
            .await
    }

    // ---
    // Funcionários
    // ---

    /// Cria login + vínculo + concessão como uma operação lógica.
    /// O login nasce fora da transação da loja, então cada falha desfaz
    /// explicitamente o que já foi criado antes de devolver o erro.
    pub fn create_employee<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        granted_by: Uuid,
        payload: &CreateEmployeePayload,
    ) -> impl Future<Output = Result<StoreUser, AppError>> + Send
    where
        E: Acquire<'e, Database = Postgres> + Send,
    {
        async move {
            let mut conn = executor.acquire().await?;

            // 1. Usuário de login
            let user = self
                .auth_service
                .create_user(&payload.email, &payload.password, payload.name.as_deref())
                .await?;

            // 2. Vínculo com a loja
            let fields = EmployeeFields {
                name: payload.name.as_deref(),
                phone: payload.phone.as_deref(),
                job_title: payload.job_title.as_deref(),
                salary: payload.salary,
                admission_date: payload.admission_date,
            };
            let access_level = payload.access_level.unwrap_or(AccessLevel::Employee);

            let store_user = match self
                .store_repo
                .insert_store_user(&mut *conn, store_id, user.id, access_level, &fields)
                .await
            {
                Ok(row) => row,
                Err(err) => {
                    tracing::warn!(user_id = %user.id, "Falha ao vincular funcionário; removendo login criado: {}", err);
                    self.undo_user(&mut *conn, user.id).await;
                    return Err(err);
                }
            };

            // 3. Concessão de acesso
            if let Err(err) = self
                .store_repo
                .grant_access(&mut *conn, store_id, user.id, granted_by)
                .await
            {
                tracing::warn!(user_id = %user.id, "Falha ao conceder acesso; desfazendo cadastro: {}", err);
                if let Err(undo_err) = self
                    .store_repo
                    .delete_store_user(&mut *conn, store_id, store_user.id)
                    .await
                {
                    tracing::warn!("Compensação do vínculo falhou: {}", undo_err);
                }
                self.undo_user(&mut *conn, user.id).await;
                return Err(err);
            }

            tracing::info!(%store_id, user_id = %user.id, "Funcionário cadastrado");
            Ok(store_user)
        }
    }

    async fn undo_user(&self, conn: &mut sqlx::PgConnection, user_id: Uuid) {
        if let Err(e) = self.auth_service.delete_user(conn, user_id).await {
            tracing::warn!(%user_id, "Compensação do login falhou: {}", e);
        }
    }

    pub async fn list_employees<'e, E>(&self, executor: E, store_id: Uuid) -> Result<Vec<StoreUser>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.store_repo.list_store_users(executor, store_id).await
    }

    pub async fn update_employee<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        employee_id: Uuid,
        payload: &UpdateEmployeePayload,
    ) -> Result<StoreUser, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let fields = EmployeeFields {
            name: payload.name.as_deref(),
            phone: payload.phone.as_deref(),
            job_title: payload.job_title.as_deref(),
            salary: payload.salary,
            admission_date: payload.admission_date,
        };
        self.store_repo
            .update_store_user(executor, store_id, employee_id, payload.access_level, &fields)
            .await
    }

    /// Desativa (soft). O próprio usuário não pode se desativar.
    pub async fn deactivate_employee<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        acting_user: Uuid,
        employee_id: Uuid,
    ) -> Result<StoreUser, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let employee = self.store_repo.find_store_user(&mut *tx, store_id, employee_id).await?;
        if employee.user_id == acting_user {
            return Err(AppError::CannotModifySelf);
        }
        let updated = self
            .store_repo
            .set_store_user_active(&mut *tx, store_id, employee_id, false)
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Remove vínculo e concessão de acesso (o login continua existindo).
    pub async fn remove_employee<'e, E>(
        &self,
        executor: E,
        store_id: Uuid,
        acting_user: Uuid,
        employee_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let employee = self.store_repo.find_store_user(&mut *tx, store_id, employee_id).await?;
        if employee.user_id == acting_user {
            return Err(AppError::CannotModifySelf);
        }
        self.store_repo.revoke_access(&mut *tx, store_id, employee.user_id).await?;
        self.store_repo.delete_store_user(&mut *tx, store_id, employee_id).await?;

        tx.commit().await?;
        tracing::info!(%store_id, %employee_id, "Funcionário removido");
        Ok(())
    }
}
