// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{i18n::Locale, tenancy::StoreMember},
    models::store::AccessLevel,
};

/// Nível mínimo exigido por uma rota.
pub trait AccessRequirement: Send + Sync + 'static {
    const MIN: AccessLevel;
}

/// Guardião por nível de acesso. Depende do `StoreMember` posto pelo `store_guard`.
pub struct RequireAccess<T>(pub AccessLevel, PhantomData<T>);

impl<T> RequireAccess<T> {
    pub fn level(&self) -> AccessLevel {
        self.0
    }
}

pub(crate) fn check_access(member: Option<&StoreMember>, min: AccessLevel) -> Result<AccessLevel, AppError> {
    match member {
        None => Err(AppError::InvalidToken),
        Some(m) if m.access_level >= min => Ok(m.access_level),
        Some(_) => Err(AppError::InsufficientAccess),
    }
}

impl<T, S> FromRequestParts<S> for RequireAccess<T>
where
    T: AccessRequirement,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_headers(&parts.headers);

        check_access(parts.extensions.get::<StoreMember>(), T::MIN)
            .map(|level| RequireAccess(level, PhantomData))
            .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))
    }
}

// ---
// NÍVEIS
// ---

pub struct ManagerOnly;
impl AccessRequirement for ManagerOnly {
    const MIN: AccessLevel = AccessLevel::Manager;
}

pub struct OwnerOnly;
impl AccessRequirement for OwnerOnly {
    const MIN: AccessLevel = AccessLevel::Owner;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(access_level: AccessLevel) -> StoreMember {
        StoreMember { access_level }
    }

    #[test]
    fn levels_are_ordered() {
        assert!(check_access(Some(&member(AccessLevel::Owner)), ManagerOnly::MIN).is_ok());
        assert!(check_access(Some(&member(AccessLevel::Manager)), ManagerOnly::MIN).is_ok());
        assert!(matches!(
            check_access(Some(&member(AccessLevel::Employee)), ManagerOnly::MIN),
            Err(AppError::InsufficientAccess)
        ));
        assert!(matches!(
            check_access(Some(&member(AccessLevel::Manager)), OwnerOnly::MIN),
            Err(AppError::InsufficientAccess)
        ));
    }

    #[test]
    fn missing_member_is_unauthenticated() {
        assert!(matches!(check_access(None, ManagerOnly::MIN), Err(AppError::InvalidToken)));
    }
}
