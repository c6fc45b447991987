// src/handlers/finance.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        db_utils::get_rls_connection,
        error::{ApiError, AppError},
    },
    config::AppState,
    handlers::inventory::CatalogQuery,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{ManagerOnly, RequireAccess},
        tenancy::StoreContext,
    },
    models::{
        finance::{
            PayableAccount, PayablePayload, PayableSettlement, ReceivableAccount, ReceivablePayload,
            SettlePayload,
        },
        losses::{CategoryPayload, CategoryTag},
    },
};

// =============================================================================
//  CONTAS A PAGAR
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/finance/payables",
    tag = "Financeiro",
    request_body = PayablePayload,
    responses((status = 201, description = "Conta a pagar criada", body = PayableAccount)),
    params(("x-store-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn create_payable(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    _guard: RequireAccess<ManagerOnly>,
    Json(payload): Json<PayablePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let payable = app_state
        .finance_service
        .create_payable(&mut *rls_conn, store.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(payable)))
}

#[utoipa::path(
    get,
    path = "/api/finance/payables",
    tag = "Financeiro",
    responses((status = 200, description = "Contas a pagar (atrasos atualizados)", body = Vec<PayableAccount>)),
    params(("x-store-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn list_payables(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    _guard: RequireAccess<ManagerOnly>,
) -> Result<Json<Vec<PayableAccount>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let payables = app_state
        .finance_service
        .list_payables(&mut *rls_conn, store.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(payables))
}

/// Baixa a conta. Se for recorrente, devolve também a do mês seguinte.
#[utoipa::path(
    post,
    path = "/api/finance/payables/{id}/pay",
    tag = "Financeiro",
    request_body = SettlePayload,
    responses(
        (status = 200, description = "Conta paga", body = PayableSettlement),
        (status = 409, description = "Conta já paga")
    ),
    params(
        ("x-store-id" = Uuid, Header, description = "ID da Loja"),
        ("id" = Uuid, Path, description = "ID da conta")
    ),
    security(("api_jwt" = []))
)]
pub async fn pay_payable(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    _guard: RequireAccess<ManagerOnly>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SettlePayload>,
) -> Result<Json<PayableSettlement>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let settlement = app_state
        .finance_service
        .pay_payable(&mut *rls_conn, store.0, id, payload.date)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(settlement))
}

#[utoipa::path(
    delete,
    path = "/api/finance/payables/{id}",
    tag = "Financeiro",
    responses((status = 204, description = "Conta excluída")),
    params(
        ("x-store-id" = Uuid, Header, description = "ID da Loja"),
        ("id" = Uuid, Path, description = "ID da conta")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_payable(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    _guard: RequireAccess<ManagerOnly>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .finance_service
        .delete_payable(&mut *rls_conn, store.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// --- Categorias de despesa ---

#[utoipa::path(
    post,
    path = "/api/finance/expense-categories",
    tag = "Financeiro",
    request_body = CategoryPayload,
    responses((status = 201, description = "Categoria criada", body = CategoryTag)),
    params(("x-store-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn create_expense_category(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    _guard: RequireAccess<ManagerOnly>,
    Json(payload): Json<CategoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let category = app_state
        .finance_service
        .create_expense_category(&mut *rls_conn, store.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(category)))
}

#[utoipa::path(
    get,
    path = "/api/finance/expense-categories",
    tag = "Financeiro",
    responses((status = 200, description = "Categorias de despesa", body = Vec<CategoryTag>)),
    params(("x-store-id" = Uuid, Header, description = "ID da Loja"), CatalogQuery),
    security(("api_jwt" = []))
)]
pub async fn list_expense_categories(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<CategoryTag>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let categories = app_state
        .finance_service
        .list_expense_categories(&mut *rls_conn, store.0, query.include_inactive)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(categories))
}

#[utoipa::path(
    post,
    path = "/api/finance/expense-categories/{id}/deactivate",
    tag = "Financeiro",
    responses((status = 200, description = "Categoria desativada", body = CategoryTag)),
    params(
        ("x-store-id" = Uuid, Header, description = "ID da Loja"),
        ("id" = Uuid, Path, description = "ID da categoria")
    ),
    security(("api_jwt" = []))
)]
pub async fn deactivate_expense_category(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    _guard: RequireAccess<ManagerOnly>,
    Path(id): Path<Uuid>,
) -> Result<Json<CategoryTag>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let category = app_state
        .finance_service
        .deactivate_expense_category(&mut *rls_conn, store.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(category))
}

// =============================================================================
//  CONTAS A RECEBER
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/finance/receivables",
    tag = "Financeiro",
    request_body = ReceivablePayload,
    responses((status = 201, description = "Conta a receber criada", body = ReceivableAccount)),
    params(("x-store-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn create_receivable(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    _guard: RequireAccess<ManagerOnly>,
    Json(payload): Json<ReceivablePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let receivable = app_state
        .finance_service
        .create_receivable(&mut *rls_conn, store.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(receivable)))
}

#[utoipa::path(
    get,
    path = "/api/finance/receivables",
    tag = "Financeiro",
    responses((status = 200, description = "Contas a receber (atrasos atualizados)", body = Vec<ReceivableAccount>)),
    params(("x-store-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn list_receivables(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    _guard: RequireAccess<ManagerOnly>,
) -> Result<Json<Vec<ReceivableAccount>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let receivables = app_state
        .finance_service
        .list_receivables(&mut *rls_conn, store.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(receivables))
}

#[utoipa::path(
    post,
    path = "/api/finance/receivables/{id}/receive",
    tag = "Financeiro",
    request_body = SettlePayload,
    responses(
        (status = 200, description = "Conta recebida", body = ReceivableAccount),
        (status = 409, description = "Conta já recebida")
    ),
    params(
        ("x-store-id" = Uuid, Header, description = "ID da Loja"),
        ("id" = Uuid, Path, description = "ID da conta")
    ),
    security(("api_jwt" = []))
)]
pub async fn receive(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    _guard: RequireAccess<ManagerOnly>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SettlePayload>,
) -> Result<Json<ReceivableAccount>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let receivable = app_state
        .finance_service
        .receive(&mut *rls_conn, store.0, id, payload.date)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(receivable))
}

#[utoipa::path(
    delete,
    path = "/api/finance/receivables/{id}",
    tag = "Financeiro",
    responses((status = 204, description = "Conta excluída")),
    params(
        ("x-store-id" = Uuid, Header, description = "ID da Loja"),
        ("id" = Uuid, Path, description = "ID da conta")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_receivable(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    _guard: RequireAccess<ManagerOnly>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .finance_service
        .delete_receivable(&mut *rls_conn, store.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
