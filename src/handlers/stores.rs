// src/handlers/stores.rs

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
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{ManagerOnly, OwnerOnly, RequireAccess},
        tenancy::StoreContext,
    },
    models::store::{AccessLevel, CreateEmployeePayload, Store, StoreUser, UpdateEmployeePayload, UpdateStorePayload},
};

// Gerente não concede nível acima do próprio.
fn ensure_can_grant(granter: AccessLevel, requested: AccessLevel) -> Result<(), AppError> {
    if requested > granter {
        return Err(AppError::InsufficientAccess);
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/store",
    tag = "Loja",
    responses((status = 200, description = "Dados da loja", body = Store)),
    params(("x-store-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn get_store(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
) -> Result<Json<Store>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let found = app_state
        .store_service
        .get_store(&mut *rls_conn, store.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(found))
}

#[utoipa::path(
    put,
    path = "/api/store",
    tag = "Loja",
    request_body = UpdateStorePayload,
    responses(
        (status = 200, description = "Loja atualizada", body = Store),
        (status = 403, description = "Apenas o dono")
    ),
    params(("x-store-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn update_store(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    _guard: RequireAccess<OwnerOnly>,
    Json(payload): Json<UpdateStorePayload>,
) -> Result<Json<Store>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let updated = app_state
        .store_service
        .update_store(&mut *rls_conn, store.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(updated))
}

// ---
// Funcionários
// ---

#[utoipa::path(
    post,
    path = "/api/employees",
    tag = "Funcionários",
    request_body = CreateEmployeePayload,
    responses(
        (status = 201, description = "Funcionário cadastrado", body = StoreUser),
        (status = 409, description = "E-mail já cadastrado")
    ),
    params(("x-store-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn create_employee(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    guard: RequireAccess<ManagerOnly>,
    Json(payload): Json<CreateEmployeePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    ensure_can_grant(guard.level(), payload.access_level.unwrap_or(AccessLevel::Employee))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let employee = app_state
        .store_service
        .create_employee(&mut *rls_conn, store.0, user.0.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(employee)))
}

#[utoipa::path(
    get,
    path = "/api/employees",
    tag = "Funcionários",
    responses((status = 200, description = "Funcionários da loja", body = Vec<StoreUser>)),
    params(("x-store-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn list_employees(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    _guard: RequireAccess<ManagerOnly>,
) -> Result<Json<Vec<StoreUser>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let employees = app_state
        .store_service
        .list_employees(&mut *rls_conn, store.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(employees))
}

#[utoipa::path(
    put,
    path = "/api/employees/{id}",
    tag = "Funcionários",
    request_body = UpdateEmployeePayload,
    responses((status = 200, description = "Funcionário atualizado", body = StoreUser)),
    params(
        ("x-store-id" = Uuid, Header, description = "ID da Loja"),
        ("id" = Uuid, Path, description = "ID do vínculo")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_employee(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    guard: RequireAccess<ManagerOnly>,
    Path(employee_id): Path<Uuid>,
    Json(payload): Json<UpdateEmployeePayload>,
) -> Result<Json<StoreUser>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    ensure_can_grant(guard.level(), payload.access_level)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let employee = app_state
        .store_service
        .update_employee(&mut *rls_conn, store.0, employee_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(employee))
}

#[utoipa::path(
    post,
    path = "/api/employees/{id}/deactivate",
    tag = "Funcionários",
    responses(
        (status = 200, description = "Funcionário desativado", body = StoreUser),
        (status = 403, description = "Não é possível desativar a si mesmo")
    ),
    params(
        ("x-store-id" = Uuid, Header, description = "ID da Loja"),
        ("id" = Uuid, Path, description = "ID do vínculo")
    ),
    security(("api_jwt" = []))
)]
pub async fn deactivate_employee(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    _guard: RequireAccess<ManagerOnly>,
    Path(employee_id): Path<Uuid>,
) -> Result<Json<StoreUser>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let employee = app_state
        .store_service
        .deactivate_employee(&mut *rls_conn, store.0, user.0.id, employee_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(employee))
}

#[utoipa::path(
    delete,
    path = "/api/employees/{id}",
    tag = "Funcionários",
    responses((status = 204, description = "Funcionário removido")),
    params(
        ("x-store-id" = Uuid, Header, description = "ID da Loja"),
        ("id" = Uuid, Path, description = "ID do vínculo")
    ),
    security(("api_jwt" = []))
)]
pub async fn remove_employee(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    store: StoreContext,
    _guard: RequireAccess<ManagerOnly>,
    Path(employee_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &store, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .store_service
        .remove_employee(&mut *rls_conn, store.0, user.0.id, employee_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_cannot_grant_owner() {
        assert!(ensure_can_grant(AccessLevel::Manager, AccessLevel::Manager).is_ok());
        assert!(ensure_can_grant(AccessLevel::Manager, AccessLevel::Employee).is_ok());
        assert!(matches!(
            ensure_can_grant(AccessLevel::Manager, AccessLevel::Owner),
            Err(AppError::InsufficientAccess)
        ));
        assert!(ensure_can_grant(AccessLevel::Owner, AccessLevel::Owner).is_ok());
    }
}
