// src/handlers/installments.rs

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    common::{db_utils::get_rls_connection, error::ApiError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, tenancy::StoreContext},
    models::installments::{InstallmentSale, InstallmentSaleDetail, InstallmentSaleStatus},
};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct InstallmentFilter {
    pub status: Option<InstallmentSaleStatus>,
}

#[utoipa::path(
    get,
    path = "/api/installments",
    tag = "Crediário",
    responses((status = 200, description = "Vendas a prazo (atrasos já atualizados)", body = Vec<InstallmentSale>)),
    params(("x-store-id" = Uuid, Header, description = "ID da Loja"), InstallmentFilter),
    security(("api_jwt" = []))
)]
pub async fn list_installment_sales(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Query(filter): Query<InstallmentFilter>,
) -> Result<Json<Vec<InstallmentSale>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let list = app_state
        .installment_service
        .list(&mut *rls_conn, store.0, filter.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(list))
}

#[utoipa::path(
    get,
    path = "/api/installments/{id}",
    tag = "Crediário",
    responses(
        (status = 200, description = "Venda a prazo com parcelas", body = InstallmentSaleDetail),
        (status = 404, description = "Não encontrada")
    ),
    params(
        ("x-store-id" = Uuid, Header, description = "ID da Loja"),
        ("id" = Uuid, Path, description = "ID da venda a prazo")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_installment_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Path(id): Path<Uuid>,
) -> Result<Json<InstallmentSaleDetail>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state
        .installment_service
        .get(&mut *rls_conn, store.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(detail))
}

/// Baixa de uma parcela; recalcula pago/restante/status da venda a prazo.
#[utoipa::path(
    post,
    path = "/api/installments/{id}/installments/{installment_id}/pay",
    tag = "Crediário",
    responses(
        (status = 200, description = "Parcela paga", body = InstallmentSaleDetail),
        (status = 409, description = "Parcela já paga")
    ),
    params(
        ("x-store-id" = Uuid, Header, description = "ID da Loja"),
        ("id" = Uuid, Path, description = "ID da venda a prazo"),
        ("installment_id" = Uuid, Path, description = "ID da parcela")
    ),
    security(("api_jwt" = []))
)]
pub async fn pay_installment(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    Path((id, installment_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<InstallmentSaleDetail>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state
        .installment_service
        .pay_installment(&mut *rls_conn, store.0, id, installment_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(detail))
}
