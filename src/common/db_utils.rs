// src/common/db_utils.rs

use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgConnection};

use crate::common::error::AppError;
use crate::config::AppState;
use crate::middleware::auth::AuthenticatedUser;
use crate::middleware::tenancy::StoreContext;

// ---
// Helper RLS: A "Chave" para o Banco de Dados
// ---
/// Adquire uma conexão da pool e define as variáveis de sessão usadas pelas
/// políticas de RLS (`app.store_id`, `app.user_id`).
pub(crate) async fn get_rls_connection(
    app_state: &AppState,
    store: &StoreContext,
    user: &AuthenticatedUser,
) -> Result<sqlx::pool::PoolConnection<sqlx::Postgres>, AppError> {
    // O operador '?' converte automaticamente sqlx::Error -> AppError::DatabaseError
    let mut conn = app_state.db_pool.acquire().await?;

    // `false`: vale para a sessão inteira, não só para a próxima instrução.
    // A pool limpa os dois valores quando a conexão volta (ver `pool_options`).
    sqlx::query("SELECT set_config('app.store_id', $1, false)")
        .bind(store.0.to_string())
        .execute(&mut *conn)
        .await?;

    sqlx::query("SELECT set_config('app.user_id', $1, false)")
        .bind(user.0.id.to_string())
        .execute(&mut *conn)
        .await?;

    Ok(conn)
}

/// Limpa o contexto de RLS da conexão.
pub async fn reset_rls_context(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT set_config('app.store_id', '', false), set_config('app.user_id', '', false)")
        .execute(conn)
        .await?;
    Ok(())
}

/// Opções da pool: toda conexão devolvida sai sem loja nem usuário,
/// então quem pega a pool direto nunca herda o contexto de outra requisição.
pub fn pool_options(max_connections: u32) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .after_release(|conn, _meta| {
            Box::pin(async move {
                reset_rls_context(conn).await?;
                Ok::<_, sqlx::Error>(true)
            })
        })
}
