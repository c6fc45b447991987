// src/handlers/sales.rs

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
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
    models::sales::{FinalizeSalePayload, Sale, SaleDetail, SaleReceipt},
};

/// Intervalo opcional (RFC 3339) usado nas listagens por período.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PeriodQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Fecha a venda: itens, baixa de estoque, ordens de serviço e
/// lançamento no caixa (ou crediário), numa transação só.
#[utoipa::path(
    post,
    path = "/api/sales",
    tag = "Vendas",
    request_body = FinalizeSalePayload,
    responses(
        (status = 201, description = "Venda concluída", body = SaleReceipt),
        (status = 400, description = "Carrinho vazio ou dados inválidos")
    ),
    params(("x-store-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn finalize_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Json(payload): Json<FinalizeSalePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let receipt = app_state
        .sale_service
        .finalize_sale(&mut *rls_conn, store.0, user.0.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(receipt)))
}

#[utoipa::path(
    get,
    path = "/api/sales",
    tag = "Vendas",
    responses((status = 200, description = "Vendas do período", body = Vec<Sale>)),
    params(("x-store-id" = Uuid, Header, description = "ID da Loja"), PeriodQuery),
    security(("api_jwt" = []))
)]
pub async fn list_sales(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Query(period): Query<PeriodQuery>,
) -> Result<Json<Vec<Sale>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let sales = app_state
        .sale_service
        .list_sales(&mut *rls_conn, store.0, period.from, period.to)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(sales))
}

#[utoipa::path(
    get,
    path = "/api/sales/{id}",
    tag = "Vendas",
    responses(
        (status = 200, description = "Venda com itens", body = SaleDetail),
        (status = 404, description = "Venda não encontrada")
    ),
    params(
        ("x-store-id" = Uuid, Header, description = "ID da Loja"),
        ("id" = Uuid, Path, description = "ID da venda")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Path(id): Path<Uuid>,
) -> Result<Json<SaleDetail>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state
        .sale_service
        .get_sale(&mut *rls_conn, store.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(detail))
}

/// Desfaz a venda: devolve o estoque e apaga tudo que ela gerou.
#[utoipa::path(
    delete,
    path = "/api/sales/{id}",
    tag = "Vendas",
    responses(
        (status = 204, description = "Venda excluída"),
        (status = 403, description = "Apenas gerente ou dono")
    ),
    params(
        ("x-store-id" = Uuid, Header, description = "ID da Loja"),
        ("id" = Uuid, Path, description = "ID da venda")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_sale(
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
        .sale_service
        .delete_sale(&mut *rls_conn, store.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/sales/{id}/receipt",
    tag = "Vendas",
    responses(
        (status = 200, description = "Comprovante em PDF", body = [u8], content_type = "application/pdf"),
        (status = 404, description = "Venda não encontrada")
    ),
    params(
        ("x-store-id" = Uuid, Header, description = "ID da Loja"),
        ("id" = Uuid, Path, description = "ID da venda")
    ),
    security(("api_jwt" = []))
)]
pub async fn sale_receipt(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let pdf_bytes = app_state
        .document_service
        .sale_receipt_pdf(&mut *rls_conn, store.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, format!("inline; filename=\"venda_{id}.pdf\"")),
    ];

    Ok((headers, pdf_bytes).into_response())
}
