// src/middleware/tenancy.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::{authenticate, AuthenticatedUser},
        i18n::Locale,
    },
    models::store::AccessLevel,
};

const STORE_ID_HEADER: &str = "x-store-id";

/// Loja escolhida pelo cliente para esta requisição.
#[derive(Debug, Clone, Copy)]
pub struct StoreContext(pub Uuid);

/// Nível de acesso do usuário logado na loja da requisição.
#[derive(Debug, Clone, Copy)]
pub struct StoreMember {
    pub access_level: AccessLevel,
}

pub(crate) fn store_id_from_headers(headers: &HeaderMap) -> Result<Uuid, AppError> {
    headers
        .get(STORE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
        .ok_or(AppError::InvalidStoreHeader)
}

/// Login + loja: exige vínculo ativo e concessão de acesso à loja do cabeçalho.
pub async fn store_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let user = authenticate(&app_state, request.headers()).await.map_err(to_api)?;
    let store_id = store_id_from_headers(request.headers()).map_err(to_api)?;

    let access_level = app_state
        .store_repo
        .find_access_level(user.id, store_id)
        .await
        .map_err(to_api)?
        .ok_or_else(|| to_api(AppError::StoreAccessDenied(store_id)))?;

    tracing::debug!(user_id = %user.id, %store_id, ?access_level, "Acesso à loja liberado");

    let extensions = request.extensions_mut();
    extensions.insert(AuthenticatedUser(user));
    extensions.insert(StoreContext(store_id));
    extensions.insert(StoreMember { access_level });

    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for StoreContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<StoreContext>()
            .copied()
            .ok_or(AppError::InvalidStoreHeader)
    }
}

impl<S> FromRequestParts<S> for StoreMember
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<StoreMember>()
            .copied()
            .ok_or(AppError::InvalidStoreHeader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn store_header_must_be_a_uuid() {
        let mut headers = HeaderMap::new();
        assert!(matches!(store_id_from_headers(&headers), Err(AppError::InvalidStoreHeader)));

        headers.insert(STORE_ID_HEADER, HeaderValue::from_static("loja-1"));
        assert!(matches!(store_id_from_headers(&headers), Err(AppError::InvalidStoreHeader)));

        let id = Uuid::new_v4();
        headers.insert(STORE_ID_HEADER, HeaderValue::from_str(&id.to_string()).expect("header"));
        assert_eq!(store_id_from_headers(&headers).expect("uuid"), id);
    }
}
