// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{StoreRepository, UserRepository},
    db::store_repo::EmployeeFields,
    models::{
        auth::{AuthResponse, Claims, RegisterUserPayload, User},
        store::AccessLevel,
    },
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    store_repo: StoreRepository,
    jwt_secret: String,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        store_repo: StoreRepository,
        jwt_secret: String,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, store_repo, jwt_secret, pool }
    }

    /// Cadastro do dono: usuário, loja, vínculo "owner" e concessão de acesso
    /// numa única transação.
    pub async fn register_owner(&self, payload: &RegisterUserPayload) -> Result<AuthResponse, AppError> {
        // Hashing fora da transação: não toca no banco
        let hashed_password = hash_password(&payload.password).await?;

        let mut tx = self.pool.begin().await?;

        let user = self
            .user_repo
            .create_user(&mut *tx, &payload.email, &hashed_password, Some(payload.name.trim()))
            .await?;

        let store = self
            .store_repo
            .create_store(&mut *tx, payload.store_name.trim(), payload.store_tax_id.as_deref(), user.id)
            .await?;

        let owner_fields = EmployeeFields {
            name: Some(payload.name.trim()),
            ..Default::default()
        };
        self.store_repo
            .insert_store_user(&mut *tx, store.id, user.id, AccessLevel::Owner, &owner_fields)
            .await?;
        self.store_repo
            .grant_access(&mut *tx, store.id, user.id, user.id)
            .await?;

        tx.commit().await?;

        tracing::info!(user_id = %user.id, store_id = %store.id, "Nova loja cadastrada");

        Ok(AuthResponse {
            token: self.create_token(user.id)?,
            store_id: Some(store.id),
        })
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self.user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        self.create_token(user.id)
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = decode_token(token, &self.jwt_secret)?;

        self.user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    pub async fn update_profile(&self, user_id: Uuid, name: &str) -> Result<User, AppError> {
        self.user_repo.update_name(&self.pool, user_id, name.trim()).await
    }

    // ---
    // Colaborador de autenticação usado pelo cadastro de funcionários
    // ---

    /// Cria um usuário de login. Roda fora de qualquer transação da loja.
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<User, AppError> {
        let hashed_password = hash_password(password).await?;
        self.user_repo
            .create_user(&self.pool, email, &hashed_password, name)
            .await
    }

    pub async fn delete_user<'e, E>(&self, executor: E, user_id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.user_repo.delete_user(executor, user_id).await
    }

    fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(7);

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

async fn hash_password(password: &str) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
        .map(|data| data.claims)
        .map_err(|_| AppError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_for(sub: Uuid, secret: &str, exp_offset_days: i64) -> String {
        let now = Utc::now();
        let claims = Claims {
            sub,
            exp: (now + chrono::Duration::days(exp_offset_days)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref()))
            .expect("encode")
    }

    #[test]
    fn token_round_trips_subject() {
        let sub = Uuid::new_v4();
        let claims = decode_token(&token_for(sub, "segredo", 7), "segredo").expect("decode");
        assert_eq!(claims.sub, sub);
    }

    #[test]
    fn wrong_secret_or_expired_token_is_rejected() {
        let sub = Uuid::new_v4();
        assert!(matches!(
            decode_token(&token_for(sub, "outro", 7), "segredo"),
            Err(AppError::InvalidToken)
        ));
        assert!(matches!(
            decode_token(&token_for(sub, "segredo", -1), "segredo"),
            Err(AppError::InvalidToken)
        ));
    }
}
