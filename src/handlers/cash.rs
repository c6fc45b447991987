// src/handlers/cash.rs

use axum::{
    extract::{Path, State},
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
    middleware::{auth::AuthenticatedUser, i18n::Locale, tenancy::StoreContext},
    models::cash::{CashMovement, CashMovementPayload, CashSession, CashSessionDetail, OpenCashSessionPayload},
};

#[utoipa::path(
    post,
    path = "/api/cash/sessions",
    tag = "Caixa",
    request_body = OpenCashSessionPayload,
    responses(
        (status = 201, description = "Caixa aberto", body = CashSession),
        (status = 409, description = "Já existe um caixa aberto")
    ),
    params(("x-store-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn open_session(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Json(payload): Json<OpenCashSessionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let session = app_state
        .cash_service
        .open_session(&mut *rls_conn, store.0, user.0.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(session)))
}

/// Caixa aberto da loja com o resumo; `null` quando não há.
#[utoipa::path(
    get,
    path = "/api/cash/sessions/current",
    tag = "Caixa",
    responses((status = 200, description = "Caixa aberto", body = CashSessionDetail)),
    params(("x-store-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn current_session(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
) -> Result<Json<Option<CashSessionDetail>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let current = app_state
        .cash_service
        .current_session(&mut *rls_conn, store.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(current))
}

#[utoipa::path(
    get,
    path = "/api/cash/sessions",
    tag = "Caixa",
    responses((status = 200, description = "Histórico de caixas", body = Vec<CashSession>)),
    params(("x-store-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn list_sessions(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
) -> Result<Json<Vec<CashSession>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let sessions = app_state
        .cash_service
        .list_sessions(&mut *rls_conn, store.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(sessions))
}

#[utoipa::path(
    get,
    path = "/api/cash/sessions/{id}",
    tag = "Caixa",
    responses((status = 200, description = "Caixa com movimentos e resumo", body = CashSessionDetail)),
    params(
        ("x-store-id" = Uuid, Header, description = "ID da Loja"),
        ("id" = Uuid, Path, description = "ID do caixa")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_session(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Path(id): Path<Uuid>,
) -> Result<Json<CashSessionDetail>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state
        .cash_service
        .get_session(&mut *rls_conn, store.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(detail))
}

/// Sangria, suprimento ou outro lançamento manual.
#[utoipa::path(
    post,
    path = "/api/cash/sessions/{id}/movements",
    tag = "Caixa",
    request_body = CashMovementPayload,
    responses(
        (status = 201, description = "Movimento registrado", body = CashMovement),
        (status = 409, description = "Caixa fechado")
    ),
    params(
        ("x-store-id" = Uuid, Header, description = "ID da Loja"),
        ("id" = Uuid, Path, description = "ID do caixa")
    ),
    security(("api_jwt" = []))
)]
pub async fn record_movement(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<CashMovementPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let movement = app_state
        .cash_service
        .record_movement(&mut *rls_conn, store.0, user.0.id, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(movement)))
}

#[utoipa::path(
    post,
    path = "/api/cash/sessions/{id}/close",
    tag = "Caixa",
    responses(
        (status = 200, description = "Caixa fechado com o saldo final", body = CashSessionDetail),
        (status = 409, description = "Caixa já fechado")
    ),
    params(
        ("x-store-id" = Uuid, Header, description = "ID da Loja"),
        ("id" = Uuid, Path, description = "ID do caixa")
    ),
    security(("api_jwt" = []))
)]
pub async fn close_session(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Path(id): Path<Uuid>,
) -> Result<Json<CashSessionDetail>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state
        .cash_service
        .close_session(&mut *rls_conn, store.0, user.0.id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(detail))
}
