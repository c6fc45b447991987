// src/handlers/crm.rs

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
    middleware::{auth::AuthenticatedUser, i18n::Locale, tenancy::StoreContext},
    models::crm::{Customer, CustomerPayload},
};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct CustomerSearch {
    /// Busca parcial pelo nome.
    pub search: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "Clientes",
    request_body = CustomerPayload,
    responses(
        (status = 201, description = "Cliente criado", body = Customer),
        (status = 400, description = "CPF/CNPJ inválido")
    ),
    params(("x-store-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Json(payload): Json<CustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let customer = app_state
        .crm_service
        .create_customer(&mut *rls_conn, store.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(customer)))
}

#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Clientes",
    responses((status = 200, description = "Clientes", body = Vec<Customer>)),
    params(("x-store-id" = Uuid, Header, description = "ID da Loja"), CustomerSearch),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Query(query): Query<CustomerSearch>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let customers = app_state
        .crm_service
        .list_customers(&mut *rls_conn, store.0, query.search.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(customers))
}

#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    tag = "Clientes",
    responses(
        (status = 200, description = "Cliente", body = Customer),
        (status = 404, description = "Cliente não encontrado")
    ),
    params(
        ("x-store-id" = Uuid, Header, description = "ID da Loja"),
        ("id" = Uuid, Path, description = "ID do cliente")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Customer>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let customer = app_state
        .crm_service
        .get_customer(&mut *rls_conn, store.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(customer))
}

#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    tag = "Clientes",
    request_body = CustomerPayload,
    responses((status = 200, description = "Cliente atualizado", body = Customer)),
    params(
        ("x-store-id" = Uuid, Header, description = "ID da Loja"),
        ("id" = Uuid, Path, description = "ID do cliente")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<CustomerPayload>,
) -> Result<Json<Customer>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let customer = app_state
        .crm_service
        .update_customer(&mut *rls_conn, store.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(customer))
}

#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    tag = "Clientes",
    responses((status = 204, description = "Cliente removido")),
    params(
        ("x-store-id" = Uuid, Header, description = "ID da Loja"),
        ("id" = Uuid, Path, description = "ID do cliente")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .crm_service
        .delete_customer(&mut *rls_conn, store.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
