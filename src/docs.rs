// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_me,
        handlers::auth::update_me,
        handlers::auth::my_stores,

        // --- Loja / Funcionários ---
        handlers::stores::get_store,
        handlers::stores::update_store,
        handlers::stores::create_employee,
        handlers::stores::list_employees,
        handlers::stores::update_employee,
        handlers::stores::deactivate_employee,
        handlers::stores::remove_employee,

        // --- Estoque ---
        handlers::inventory::list_products,
        handlers::inventory::get_product,
        handlers::inventory::create_product,
        handlers::inventory::update_product,
        handlers::inventory::deactivate_product,
        handlers::inventory::stock_entry,
        handlers::inventory::list_services,
        handlers::inventory::create_service,
        handlers::inventory::update_service,
        handlers::inventory::deactivate_service,

        // --- Clientes ---
        handlers::crm::create_customer,
        handlers::crm::list_customers,
        handlers::crm::get_customer,
        handlers::crm::update_customer,
        handlers::crm::delete_customer,

        // --- Vendas ---
        handlers::sales::finalize_sale,
        handlers::sales::list_sales,
        handlers::sales::get_sale,
        handlers::sales::delete_sale,
        handlers::sales::sale_receipt,

        // --- Caixa ---
        handlers::cash::open_session,
        handlers::cash::current_session,
        handlers::cash::list_sessions,
        handlers::cash::get_session,
        handlers::cash::record_movement,
        handlers::cash::close_session,

        // --- Crediário ---
        handlers::installments::list_installment_sales,
        handlers::installments::get_installment_sale,
        handlers::installments::pay_installment,

        // --- Perdas ---
        handlers::losses::record_loss,
        handlers::losses::list_losses,
        handlers::losses::create_loss_category,
        handlers::losses::list_loss_categories,
        handlers::losses::deactivate_loss_category,

        // --- Financeiro ---
        handlers::finance::create_payable,
        handlers::finance::list_payables,
        handlers::finance::pay_payable,
        handlers::finance::delete_payable,
        handlers::finance::create_expense_category,
        handlers::finance::list_expense_categories,
        handlers::finance::deactivate_expense_category,
        handlers::finance::create_receivable,
        handlers::finance::list_receivables,
        handlers::finance::receive,
        handlers::finance::delete_receivable,

        // --- Ordens de serviço ---
        handlers::service_orders::create_order,
        handlers::service_orders::list_orders,
        handlers::service_orders::get_order,
        handlers::service_orders::start_order,
        handlers::service_orders::cancel_order,
        handlers::service_orders::save_problems,
        handlers::service_orders::finalize_order,
        handlers::service_orders::remove_order,
        handlers::service_orders::download_file,
        handlers::service_orders::create_reason,
        handlers::service_orders::list_reasons,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::UpdateProfilePayload,
            models::auth::AuthResponse,

            // --- Loja ---
            models::store::AccessLevel,
            models::store::Store,
            models::store::StoreUser,
            models::store::UserStore,
            models::store::UpdateStorePayload,
            models::store::CreateEmployeePayload,
            models::store::UpdateEmployeePayload,

            // --- Estoque ---
            models::inventory::ItemKind,
            models::inventory::Product,
            models::inventory::ProductView,
            models::inventory::ServiceCostItem,
            models::inventory::Service,
            models::inventory::ProductPayload,
            models::inventory::StockEntryPayload,
            models::inventory::ServicePayload,

            // --- Clientes ---
            models::crm::PersonKind,
            models::crm::Customer,
            models::crm::CustomerPayload,

            // --- Vendas ---
            models::sales::SaleStatus,
            models::sales::PaymentMethod,
            models::sales::Sale,
            models::sales::SaleItem,
            models::sales::SaleDetail,
            models::sales::SaleReceipt,
            models::sales::CartItemInput,
            models::sales::DiscountInput,
            models::sales::InstallmentPlanInput,
            models::sales::FinalizeSalePayload,

            // --- Caixa ---
            models::cash::CashSessionStatus,
            models::cash::CashDirection,
            models::cash::CashSession,
            models::cash::CashMovement,
            models::cash::CashSummary,
            models::cash::CashSessionDetail,
            models::cash::OpenCashSessionPayload,
            models::cash::CashMovementPayload,

            // --- Crediário ---
            models::installments::InstallmentSaleStatus,
            models::installments::InstallmentStatus,
            models::installments::InstallmentSale,
            models::installments::Installment,
            models::installments::InstallmentSaleDetail,

            // --- Perdas ---
            models::losses::Loss,
            models::losses::CategoryTag,
            models::losses::RecordLossPayload,
            models::losses::CategoryPayload,

            // --- Financeiro ---
            models::finance::PayableStatus,
            models::finance::ReceivableStatus,
            models::finance::PayableAccount,
            models::finance::ReceivableAccount,
            models::finance::PayablePayload,
            models::finance::ReceivablePayload,
            models::finance::PayableSettlement,
            models::finance::SettlePayload,

            // --- Ordens de serviço ---
            models::service_orders::ServiceOrderStatus,
            models::service_orders::FaultParty,
            models::service_orders::ServiceFileKind,
            models::service_orders::ServiceOrder,
            models::service_orders::ServiceProblem,
            models::service_orders::ServiceFile,
            models::service_orders::ProblemReason,
            models::service_orders::RemovedServiceOrder,
            models::service_orders::ServiceOrderDetail,
            models::service_orders::AttachmentInput,
            models::service_orders::ProblemInput,
            models::service_orders::FinalizeServiceOrderInput,
            models::service_orders::CreateServiceOrderPayload,
            models::service_orders::SaveProblemsPayload,
            models::service_orders::RemoveServiceOrderPayload,
            models::service_orders::ProblemReasonPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Cadastro, login e perfil"),
        (name = "Loja", description = "Dados da loja"),
        (name = "Funcionários", description = "Vínculos e níveis de acesso"),
        (name = "Estoque", description = "Produtos e serviços"),
        (name = "Clientes", description = "Cadastro de clientes"),
        (name = "Vendas", description = "PDV, comprovantes e estorno"),
        (name = "Caixa", description = "Abertura, movimentos e fechamento"),
        (name = "Crediário", description = "Vendas a prazo e parcelas"),
        (name = "Perdas", description = "Registro de perdas"),
        (name = "Financeiro", description = "Contas a pagar e a receber"),
        (name = "Ordens de Serviço", description = "Execução, problemas e finalização")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme("api_jwt", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_store_route_documents_the_store_header() {
        let doc = ApiDoc::openapi();
        for (path, item) in doc.paths.paths.iter() {
            if path.starts_with("/api/auth") || path.starts_with("/api/users") {
                continue;
            }
            let operations = [&item.get, &item.post, &item.put, &item.delete];
            for op in operations.into_iter().flatten() {
                let has_header = op
                    .parameters
                    .as_ref()
                    .map(|params| params.iter().any(|p| p.name == "x-store-id"))
                    .unwrap_or(false);
                assert!(has_header, "{path} sem x-store-id");
            }
        }
    }
}
