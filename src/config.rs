// src/config.rs

use std::{env, path::PathBuf, sync::Arc};

use anyhow::Context;
use sqlx::PgPool;

use crate::{
    common::{db_utils::pool_options, i18n::I18nStore},
    db::{
        CashRepository, CategoryRepository, CrmRepository, FinanceRepository, InstallmentRepository,
        InventoryRepository, LossRepository, SalesRepository, ServiceOrderRepository, StoreRepository,
        UserRepository,
    },
    services::{
        auth::AuthService,
        cash_service::CashService,
        crm_service::CrmService,
        document_service::DocumentService,
        finance_service::FinanceService,
        installment_service::InstallmentService,
        inventory_service::InventoryService,
        loss_service::LossService,
        sale_service::SaleService,
        service_order_service::ServiceOrderService,
        storage::{FileStorage, LocalFileStorage},
        store_service::StoreService,
    },
};

/// Configuração lida do ambiente (`.env` incluso).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub upload_dir: PathBuf,
    pub public_files_url: String,
    pub fonts_dir: PathBuf,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let db_max_connections = var_or("DB_MAX_CONNECTIONS", "5")
            .parse()
            .context("DB_MAX_CONNECTIONS deve ser um número")?;

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?,
            bind_addr: var_or("BIND_ADDR", "0.0.0.0:3000"),
            db_max_connections,
            upload_dir: var_or("UPLOAD_DIR", "./uploads").into(),
            public_files_url: var_or("PUBLIC_FILES_URL", "/files"),
            fonts_dir: var_or("FONTS_DIR", "./fonts").into(),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub i18n_store: Arc<I18nStore>,
    pub store_repo: StoreRepository,
    pub auth_service: AuthService,
    pub store_service: StoreService,
    pub inventory_service: InventoryService,
    pub crm_service: CrmService,
    pub sale_service: SaleService,
    pub cash_service: CashService,
    pub installment_service: InstallmentService,
    pub loss_service: LossService,
    pub finance_service: FinanceService,
    pub service_order_service: ServiceOrderService,
    pub document_service: DocumentService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let db_pool = pool_options(config.db_max_connections)
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let storage: Arc<dyn FileStorage> = Arc::new(
            LocalFileStorage::new(&config.upload_dir, &config.public_files_url)
                .await
                .context("Falha ao preparar o diretório de uploads")?,
        );

        Ok(Self::build(db_pool, config, storage))
    }

    /// Monta o grafo de dependências sobre uma pool já aberta.
    pub fn build(db_pool: PgPool, config: &Config, storage: Arc<dyn FileStorage>) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let store_repo = StoreRepository::new(db_pool.clone());
        let inventory_repo = InventoryRepository::new();
        let crm_repo = CrmRepository::new();
        let sales_repo = SalesRepository::new();
        let cash_repo = CashRepository::new();
        let installment_repo = InstallmentRepository::new();
        let category_repo = CategoryRepository::new();
        let service_order_repo = ServiceOrderRepository::new();

        let auth_service = AuthService::new(user_repo, store_repo.clone(), config.jwt_secret.clone(), db_pool.clone());
        let store_service = StoreService::new(store_repo.clone(), auth_service.clone());
        let inventory_service = InventoryService::new(inventory_repo.clone());
        let crm_service = CrmService::new(crm_repo.clone());
        let sale_service = SaleService::new(
            sales_repo.clone(),
            inventory_repo.clone(),
            crm_repo.clone(),
            cash_repo.clone(),
            installment_repo.clone(),
            service_order_repo.clone(),
            inventory_service.clone(),
        );
        let cash_service = CashService::new(cash_repo);
        let installment_service = InstallmentService::new(installment_repo, sales_repo, crm_repo.clone());
        let loss_service = LossService::new(
            LossRepository::new(),
            inventory_repo.clone(),
            category_repo.clone(),
            inventory_service.clone(),
        );
        let finance_service = FinanceService::new(FinanceRepository::new(), category_repo);
        let service_order_service = ServiceOrderService::new(service_order_repo, inventory_repo, crm_repo, storage);
        let document_service = DocumentService::new(sale_service.clone(), store_repo.clone(), config.fonts_dir.clone());

        Self {
            db_pool,
            i18n_store: Arc::new(I18nStore::new()),
            store_repo,
            auth_service,
            store_service,
            inventory_service,
            crm_service,
            sale_service,
            cash_service,
            installment_service,
            loss_service,
            finance_service,
            service_order_service,
            document_service,
        }
    }
}
