// src/handlers/losses.rs

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
    handlers::{inventory::CatalogQuery, sales::PeriodQuery},
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{ManagerOnly, RequireAccess},
        tenancy::StoreContext,
    },
    models::losses::{CategoryPayload, CategoryTag, Loss, RecordLossPayload},
};

/// Registra a perda e, se for produto, baixa o estoque.
#[utoipa::path(
    post,
    path = "/api/losses",
    tag = "Perdas",
    request_body = RecordLossPayload,
    responses(
        (status = 201, description = "Perda registrada", body = Loss),
        (status = 404, description = "Produto ou serviço não encontrado")
    ),
    params(("x-store-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn record_loss(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Json(payload): Json<RecordLossPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let loss = app_state
        .loss_service
        .record_loss(&mut *rls_conn, store.0, user.0.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(loss)))
}

#[utoipa::path(
    get,
    path = "/api/losses",
    tag = "Perdas",
    responses((status = 200, description = "Perdas do período", body = Vec<Loss>)),
    params(("x-store-id" = Uuid, Header, description = "ID da Loja"), PeriodQuery),
    security(("api_jwt" = []))
)]
pub async fn list_losses(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Query(period): Query<PeriodQuery>,
) -> Result<Json<Vec<Loss>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let losses = app_state
        .loss_service
        .list_losses(&mut *rls_conn, store.0, period.from, period.to)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(losses))
}

// ---
// Categorias de perda
// ---

#[utoipa::path(
    post,
    path = "/api/losses/categories",
    tag = "Perdas",
    request_body = CategoryPayload,
    responses((status = 201, description = "Categoria criada", body = CategoryTag)),
    params(("x-store-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn create_loss_category(
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
        .loss_service
        .create_category(&mut *rls_conn, store.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(category)))
}

#[utoipa::path(
    get,
    path = "/api/losses/categories",
    tag = "Perdas",
    responses((status = 200, description = "Categorias de perda", body = Vec<CategoryTag>)),
    params(("x-store-id" = Uuid, Header, description = "ID da Loja"), CatalogQuery),
    security(("api_jwt" = []))
)]
pub async fn list_loss_categories(
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
        .loss_service
        .list_categories(&mut *rls_conn, store.0, query.include_inactive)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(categories))
}

#[utoipa::path(
    post,
    path = "/api/losses/categories/{id}/deactivate",
    tag = "Perdas",
    responses((status = 200, description = "Categoria desativada", body = CategoryTag)),
    params(
        ("x-store-id" = Uuid, Header, description = "ID da Loja"),
        ("id" = Uuid, Path, description = "ID da categoria")
    ),
    security(("api_jwt" = []))
)]
pub async fn deactivate_loss_category(
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
        .loss_service
        .deactivate_category(&mut *rls_conn, store.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(category))
}
