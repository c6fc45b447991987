// src/lib.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::{auth::auth_guard, tenancy::store_guard};

/// Router completo da API.
pub fn app(app_state: AppState, config: &Config) -> Router {
    // Públicas
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Só login
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me).put(handlers::auth::update_me))
        .route("/me/stores", get(handlers::auth::my_stores))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    // Login + x-store-id
    let store_routes = Router::new()
        .route(
            "/store",
            get(handlers::stores::get_store).put(handlers::stores::update_store),
        )
        .route(
            "/employees",
            post(handlers::stores::create_employee).get(handlers::stores::list_employees),
        )
        .route(
            "/employees/{id}",
            put(handlers::stores::update_employee).delete(handlers::stores::remove_employee),
        )
        .route("/employees/{id}/deactivate", post(handlers::stores::deactivate_employee));

    let inventory_routes = Router::new()
        .route(
            "/products",
            post(handlers::inventory::create_product).get(handlers::inventory::list_products),
        )
        .route(
            "/products/{id}",
            get(handlers::inventory::get_product).put(handlers::inventory::update_product),
        )
        .route("/products/{id}/deactivate", post(handlers::inventory::deactivate_product))
        .route("/products/{id}/stock-entry", post(handlers::inventory::stock_entry))
        .route(
            "/services",
            post(handlers::inventory::create_service).get(handlers::inventory::list_services),
        )
        .route("/services/{id}", put(handlers::inventory::update_service))
        .route("/services/{id}/deactivate", post(handlers::inventory::deactivate_service));

    let customer_routes = Router::new()
        .route(
            "/",
            post(handlers::crm::create_customer).get(handlers::crm::list_customers),
        )
        .route(
            "/{id}",
            get(handlers::crm::get_customer)
                .put(handlers::crm::update_customer)
                .delete(handlers::crm::delete_customer),
        );

    let sales_routes = Router::new()
        .route(
            "/",
            post(handlers::sales::finalize_sale).get(handlers::sales::list_sales),
        )
        .route(
            "/{id}",
            get(handlers::sales::get_sale).delete(handlers::sales::delete_sale),
        )
        .route("/{id}/receipt", get(handlers::sales::sale_receipt));

    let cash_routes = Router::new()
        .route(
            "/sessions",
            post(handlers::cash::open_session).get(handlers::cash::list_sessions),
        )
        .route("/sessions/current", get(handlers::cash::current_session))
        .route("/sessions/{id}", get(handlers::cash::get_session))
        .route("/sessions/{id}/movements", post(handlers::cash::record_movement))
        .route("/sessions/{id}/close", post(handlers::cash::close_session));

    let installment_routes = Router::new()
        .route("/", get(handlers::installments::list_installment_sales))
        .route("/{id}", get(handlers::installments::get_installment_sale))
        .route(
            "/{id}/installments/{installment_id}/pay",
            post(handlers::installments::pay_installment),
        );

    let loss_routes = Router::new()
        .route(
            "/",
            post(handlers::losses::record_loss).get(handlers::losses::list_losses),
        )
        .route(
            "/categories",
            post(handlers::losses::create_loss_category).get(handlers::losses::list_loss_categories),
        )
        .route(
            "/categories/{id}/deactivate",
            post(handlers::losses::deactivate_loss_category),
        );

    let finance_routes = Router::new()
        .route(
            "/payables",
            post(handlers::finance::create_payable).get(handlers::finance::list_payables),
        )
        .route("/payables/{id}", delete(handlers::finance::delete_payable))
        .route("/payables/{id}/pay", post(handlers::finance::pay_payable))
        .route(
            "/expense-categories",
            post(handlers::finance::create_expense_category).get(handlers::finance::list_expense_categories),
        )
        .route(
            "/expense-categories/{id}/deactivate",
            post(handlers::finance::deactivate_expense_category),
        )
        .route(
            "/receivables",
            post(handlers::finance::create_receivable).get(handlers::finance::list_receivables),
        )
        .route("/receivables/{id}", delete(handlers::finance::delete_receivable))
        .route("/receivables/{id}/receive", post(handlers::finance::receive));

    let service_order_routes = Router::new()
        .route(
            "/",
            post(handlers::service_orders::create_order).get(handlers::service_orders::list_orders),
        )
        .route(
            "/reasons",
            post(handlers::service_orders::create_reason).get(handlers::service_orders::list_reasons),
        )
        .route(
            "/{id}",
            get(handlers::service_orders::get_order).delete(handlers::service_orders::remove_order),
        )
        .route("/{id}/start", post(handlers::service_orders::start_order))
        .route("/{id}/cancel", post(handlers::service_orders::cancel_order))
        .route("/{id}/problems", post(handlers::service_orders::save_problems))
        .route("/{id}/finalize", post(handlers::service_orders::finalize_order))
        .route("/{id}/files/{file_id}", get(handlers::service_orders::download_file));

    let scoped = Router::new()
        .merge(store_routes)
        .nest("/inventory", inventory_routes)
        .nest("/customers", customer_routes)
        .nest("/sales", sales_routes)
        .nest("/cash", cash_routes)
        .nest("/installments", installment_routes)
        .nest("/losses", loss_routes)
        .nest("/finance", finance_routes)
        .nest("/service-orders", service_order_routes)
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), store_guard));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api", scoped)
        .nest_service(&config.public_files_url, ServeDir::new(&config.upload_dir))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
