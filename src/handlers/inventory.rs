// src/handlers/inventory.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        db_utils::get_rls_connection,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{ManagerOnly, RequireAccess},
        tenancy::StoreContext,
    },
    models::inventory::{ProductPayload, ProductView, Service, ServicePayload, StockEntryPayload},
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQuery {
    /// Inclui itens desativados.
    #[serde(default)]
    pub include_inactive: bool,
}

// =============================================================================
//  PRODUTOS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/inventory/products",
    tag = "Estoque",
    responses((status = 200, description = "Produtos com margem", body = Vec<ProductView>)),
    params(("x-store-id" = Uuid, Header, description = "ID da Loja"), CatalogQuery),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<ProductView>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let products = app_state
        .inventory_service
        .list_products(&mut *rls_conn, store.0, query.include_inactive)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(products))
}

#[utoipa::path(
    get,
    path = "/api/inventory/products/{id}",
    tag = "Estoque",
    responses(
        (status = 200, description = "Produto", body = ProductView),
        (status = 404, description = "Produto não encontrado")
    ),
    params(
        ("x-store-id" = Uuid, Header, description = "ID da Loja"),
        ("id" = Uuid, Path, description = "ID do produto")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductView>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .inventory_service
        .get_product(&mut *rls_conn, store.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

#[utoipa::path(
    post,
    path = "/api/inventory/products",
    tag = "Estoque",
    request_body = ProductPayload,
    responses(
        (status = 201, description = "Produto criado", body = ProductView),
        (status = 409, description = "Código já cadastrado")
    ),
    params(("x-store-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Json(payload): Json<ProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .inventory_service
        .create_product(&mut *rls_conn, store.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    put,
    path = "/api/inventory/products/{id}",
    tag = "Estoque",
    request_body = ProductPayload,
    responses((status = 200, description = "Produto atualizado", body = ProductView)),
    params(
        ("x-store-id" = Uuid, Header, description = "ID da Loja"),
        ("id" = Uuid, Path, description = "ID do produto")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProductPayload>,
) -> Result<Json<ProductView>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .inventory_service
        .update_product(&mut *rls_conn, store.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

#[utoipa::path(
    post,
    path = "/api/inventory/products/{id}/deactivate",
    tag = "Estoque",
    responses((status = 200, description = "Produto desativado", body = ProductView)),
    params(
        ("x-store-id" = Uuid, Header, description = "ID da Loja"),
        ("id" = Uuid, Path, description = "ID do produto")
    ),
    security(("api_jwt" = []))
)]
pub async fn deactivate_product(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    _guard: RequireAccess<ManagerOnly>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductView>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .inventory_service
        .deactivate_product(&mut *rls_conn, store.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

/// Entrada de mercadoria: soma ao estoque e, se informado, atualiza o custo.
#[utoipa::path(
    post,
    path = "/api/inventory/products/{id}/stock-entry",
    tag = "Estoque",
    request_body = StockEntryPayload,
    responses((status = 200, description = "Estoque atualizado", body = ProductView)),
    params(
        ("x-store-id" = Uuid, Header, description = "ID da Loja"),
        ("id" = Uuid, Path, description = "ID do produto")
    ),
    security(("api_jwt" = []))
)]
pub async fn stock_entry(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<StockEntryPayload>,
) -> Result<Json<ProductView>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .inventory_service
        .stock_entry(&mut *rls_conn, store.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

// =============================================================================
//  SERVIÇOS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/inventory/services",
    tag = "Estoque",
    responses((status = 200, description = "Serviços", body = Vec<Service>)),
    params(("x-store-id" = Uuid, Header, description = "ID da Loja"), CatalogQuery),
    security(("api_jwt" = []))
)]
pub async fn list_services(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<Service>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let services = app_state
        .inventory_service
        .list_services(&mut *rls_conn, store.0, query.include_inactive)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(services))
}

#[utoipa::path(
    post,
    path = "/api/inventory/services",
    tag = "Estoque",
    request_body = ServicePayload,
    responses((status = 201, description = "Serviço criado", body = Service)),
    params(("x-store-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn create_service(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Json(payload): Json<ServicePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let service = app_state
        .inventory_service
        .create_service(&mut *rls_conn, store.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(service)))
}

#[utoipa::path(
    put,
    path = "/api/inventory/services/{id}",
    tag = "Estoque",
    request_body = ServicePayload,
    responses((status = 200, description = "Serviço atualizado", body = Service)),
    params(
        ("x-store-id" = Uuid, Header, description = "ID da Loja"),
        ("id" = Uuid, Path, description = "ID do serviço")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_service(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<ServicePayload>,
) -> Result<Json<Service>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let service = app_state
        .inventory_service
        .update_service(&mut *rls_conn, store.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(service))
}

#[utoipa::path(
    post,
    path = "/api/inventory/services/{id}/deactivate",
    tag = "Estoque",
    responses((status = 200, description = "Serviço desativado", body = Service)),
    params(
        ("x-store-id" = Uuid, Header, description = "ID da Loja"),
        ("id" = Uuid, Path, description = "ID do serviço")
    ),
    security(("api_jwt" = []))
)]
pub async fn deactivate_service(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    _guard: RequireAccess<ManagerOnly>,
    Path(id): Path<Uuid>,
) -> Result<Json<Service>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let service = app_state
        .inventory_service
        .deactivate_service(&mut *rls_conn, store.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(service))
}
