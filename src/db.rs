pub mod cash_repo;
pub use cash_repo::CashRepository;
pub mod category_repo;
pub use category_repo::{CategoryRepository, CategoryTable};
pub mod crm_repo;
pub use crm_repo::CrmRepository;
pub mod finance_repo;
pub use finance_repo::FinanceRepository;
pub mod installment_repo;
pub use installment_repo::InstallmentRepository;
pub mod inventory_repo;
pub use inventory_repo::InventoryRepository;
pub mod loss_repo;
pub use loss_repo::LossRepository;
pub mod sales_repo;
pub use sales_repo::SalesRepository;
pub mod service_order_repo;
pub use service_order_repo::ServiceOrderRepository;
pub mod store_repo;
pub use store_repo::StoreRepository;
pub mod user_repo;
pub use user_repo::UserRepository;
