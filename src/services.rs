pub mod auth;
pub mod cache;
pub mod cash_service;
pub mod crm_service;
pub mod document_service;
pub mod finance_service;
pub mod installment_service;
pub mod inventory_service;
pub mod loss_service;
pub mod sale_service;
pub mod service_order_service;
pub mod storage;
pub mod store_service;
