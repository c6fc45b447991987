pub mod auth;
pub mod cash;
pub mod crm;
pub mod finance;
pub mod installments;
pub mod inventory;
pub mod losses;
pub mod sales;
pub mod service_orders;
pub mod stores;
