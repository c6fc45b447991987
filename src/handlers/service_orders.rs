// src/handlers/service_orders.rs

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
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
    models::service_orders::{
        CreateServiceOrderPayload, FinalizeServiceOrderInput, ProblemReason, ProblemReasonPayload,
        RemoveServiceOrderPayload, RemovedServiceOrder, SaveProblemsPayload, ServiceOrder, ServiceOrderDetail,
        ServiceOrderStatus,
    },
};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ServiceOrderFilter {
    pub status: Option<ServiceOrderStatus>,
}

#[utoipa::path(
    post,
    path = "/api/service-orders",
    tag = "Ordens de Serviço",
    request_body = CreateServiceOrderPayload,
    responses((status = 201, description = "Ordem aberta", body = ServiceOrder)),
    params(("x-store-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Json(payload): Json<CreateServiceOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .service_order_service
        .create_order(&mut *rls_conn, store.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(order)))
}

#[utoipa::path(
    get,
    path = "/api/service-orders",
    tag = "Ordens de Serviço",
    responses((status = 200, description = "Ordens de serviço", body = Vec<ServiceOrder>)),
    params(("x-store-id" = Uuid, Header, description = "ID da Loja"), ServiceOrderFilter),
    security(("api_jwt" = []))
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Query(filter): Query<ServiceOrderFilter>,
) -> Result<Json<Vec<ServiceOrder>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let orders = app_state
        .service_order_service
        .list_orders(&mut *rls_conn, store.0, filter.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(orders))
}

#[utoipa::path(
    get,
    path = "/api/service-orders/{id}",
    tag = "Ordens de Serviço",
    responses(
        (status = 200, description = "Ordem com problemas e arquivos", body = ServiceOrderDetail),
        (status = 404, description = "Ordem não encontrada")
    ),
    params(
        ("x-store-id" = Uuid, Header, description = "ID da Loja"),
        ("id" = Uuid, Path, description = "ID da ordem")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ServiceOrderDetail>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state
        .service_order_service
        .get_order(&mut *rls_conn, store.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(detail))
}

#[utoipa::path(
    post,
    path = "/api/service-orders/{id}/start",
    tag = "Ordens de Serviço",
    responses(
        (status = 200, description = "Ordem em andamento", body = ServiceOrder),
        (status = 409, description = "Transição não permitida")
    ),
    params(
        ("x-store-id" = Uuid, Header, description = "ID da Loja"),
        ("id" = Uuid, Path, description = "ID da ordem")
    ),
    security(("api_jwt" = []))
)]
pub async fn start_order(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ServiceOrder>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .service_order_service
        .start_order(&mut *rls_conn, store.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(order))
}

#[utoipa::path(
    post,
    path = "/api/service-orders/{id}/cancel",
    tag = "Ordens de Serviço",
    responses(
        (status = 200, description = "Ordem cancelada", body = ServiceOrder),
        (status = 409, description = "Transição não permitida")
    ),
    params(
        ("x-store-id" = Uuid, Header, description = "ID da Loja"),
        ("id" = Uuid, Path, description = "ID da ordem")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_order(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ServiceOrder>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .service_order_service
        .cancel_order(&mut *rls_conn, store.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(order))
}

/// Grava o lote de problemas. Um item inválido rejeita o lote inteiro
/// e os erros voltam indexados pela posição.
#[utoipa::path(
    post,
    path = "/api/service-orders/{id}/problems",
    tag = "Ordens de Serviço",
    request_body = SaveProblemsPayload,
    responses(
        (status = 200, description = "Problemas gravados", body = ServiceOrderDetail),
        (status = 400, description = "Problemas inválidos")
    ),
    params(
        ("x-store-id" = Uuid, Header, description = "ID da Loja"),
        ("id" = Uuid, Path, description = "ID da ordem")
    ),
    security(("api_jwt" = []))
)]
pub async fn save_problems(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<SaveProblemsPayload>,
) -> Result<Json<ServiceOrderDetail>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state
        .service_order_service
        .save_problems(&mut *rls_conn, store.0, user.0.id, id, &payload.problems)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(detail))
}

#[utoipa::path(
    post,
    path = "/api/service-orders/{id}/finalize",
    tag = "Ordens de Serviço",
    request_body = FinalizeServiceOrderInput,
    responses(
        (status = 200, description = "Ordem finalizada", body = ServiceOrderDetail),
        (status = 400, description = "Termo, pagamento ou problemas pendentes"),
        (status = 409, description = "Transição não permitida")
    ),
    params(
        ("x-store-id" = Uuid, Header, description = "ID da Loja"),
        ("id" = Uuid, Path, description = "ID da ordem")
    ),
    security(("api_jwt" = []))
)]
pub async fn finalize_order(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Path(id): Path<Uuid>,
    Json(input): Json<FinalizeServiceOrderInput>,
) -> Result<Json<ServiceOrderDetail>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state
        .service_order_service
        .finalize_order(&mut *rls_conn, store.0, user.0.id, id, &input)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(detail))
}

/// Arquiva uma cópia da ordem e a apaga.
#[utoipa::path(
    delete,
    path = "/api/service-orders/{id}",
    tag = "Ordens de Serviço",
    request_body = RemoveServiceOrderPayload,
    responses(
        (status = 200, description = "Ordem removida e arquivada", body = RemovedServiceOrder),
        (status = 400, description = "Motivo obrigatório")
    ),
    params(
        ("x-store-id" = Uuid, Header, description = "ID da Loja"),
        ("id" = Uuid, Path, description = "ID da ordem")
    ),
    security(("api_jwt" = []))
)]
pub async fn remove_order(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    _guard: RequireAccess<ManagerOnly>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RemoveServiceOrderPayload>,
) -> Result<Json<RemovedServiceOrder>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let removed = app_state
        .service_order_service
        .remove_order(&mut *rls_conn, store.0, user.0.id, id, &payload.reason)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(removed))
}

#[utoipa::path(
    get,
    path = "/api/service-orders/{id}/files/{file_id}",
    tag = "Ordens de Serviço",
    responses(
        (status = 200, description = "Conteúdo do anexo", body = [u8], content_type = "application/octet-stream"),
        (status = 404, description = "Arquivo não encontrado")
    ),
    params(
        ("x-store-id" = Uuid, Header, description = "ID da Loja"),
        ("id" = Uuid, Path, description = "ID da ordem"),
        ("file_id" = Uuid, Path, description = "ID do arquivo")
    ),
    security(("api_jwt" = []))
)]
pub async fn download_file(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Path((id, file_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let (file, bytes) = app_state
        .service_order_service
        .download_file(&mut *rls_conn, store.0, id, file_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let headers = [
        (header::CONTENT_TYPE, file.mime_type.clone()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file.file_name.replace('"', "")),
        ),
    ];

    Ok((headers, bytes).into_response())
}

// ---
// Motivos de problema
// ---

#[utoipa::path(
    post,
    path = "/api/service-orders/reasons",
    tag = "Ordens de Serviço",
    request_body = ProblemReasonPayload,
    responses((status = 201, description = "Motivo criado", body = ProblemReason)),
    params(("x-store-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn create_reason(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    _guard: RequireAccess<ManagerOnly>,
    Json(payload): Json<ProblemReasonPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let reason = app_state
        .service_order_service
        .create_reason(&mut *rls_conn, store.0, &payload.name)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(reason)))
}

#[utoipa::path(
    get,
    path = "/api/service-orders/reasons",
    tag = "Ordens de Serviço",
    responses((status = 200, description = "Motivos de problema", body = Vec<ProblemReason>)),
    params(("x-store-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn list_reasons(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
) -> Result<Json<Vec<ProblemReason>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let reasons = app_state
        .service_order_service
        .list_reasons(&mut *rls_conn, store.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(reasons))
}
