// src/common/error.rs

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::common::i18n::{I18nStore, DEFAULT_LANG};
use crate::middleware::i18n::Locale;

// Todos os erros que o domínio conhece. O texto do `#[error]` vai para o log;
// a mensagem para o usuário vem do I18nStore (ver `code()`).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Cabeçalho x-store-id ausente ou inválido")]
    InvalidStoreHeader,

    #[error("Sem acesso à loja {0}")]
    StoreAccessDenied(uuid::Uuid),

    #[error("Nível de acesso insuficiente")]
    InsufficientAccess,

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Código já cadastrado: {0}")]
    CodeAlreadyExists(String),

    #[error("Operação não permitida sobre o próprio usuário")]
    CannotModifySelf,

    // --- Caixa ---
    #[error("Já existe um caixa aberto nesta loja")]
    CashSessionAlreadyOpen,

    #[error("O caixa {0} já está fechado")]
    CashSessionClosed(uuid::Uuid),

    // --- Vendas ---
    #[error("Carrinho vazio")]
    EmptyCart,

    #[error("Venda a prazo exige um cliente")]
    CustomerRequired,

    #[error("Parcela já paga")]
    InstallmentAlreadyPaid,

    #[error("Data de vencimento fora do intervalo suportado")]
    DateOutOfRange,

    // --- Financeiro ---
    #[error("Conta já baixada")]
    AccountAlreadySettled,

    // --- Ordens de serviço ---
    #[error("Transição inválida: {from} -> {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Termo de responsabilidade não aceito")]
    TermsNotAccepted,

    #[error("Ordem de serviço não está paga")]
    OrderNotPaid,

    #[error("Informe se o serviço ocorreu perfeitamente")]
    OutcomeRequired,

    #[error("Informe ao menos um problema")]
    ProblemsRequired,

    #[error("Problemas inválidos")]
    InvalidProblems(BTreeMap<usize, Vec<&'static str>>),

    #[error("Motivo da remoção é obrigatório")]
    RemovalReasonRequired,

    #[error("Anexo inválido: {0}")]
    InvalidAttachment(String),

    // --- Infra ---
    #[error("Erro de armazenamento de arquivos: {0}")]
    StorageError(String),

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

/// Formato de erro que sai na resposta HTTP.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    /// Chave da mensagem no I18nStore.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation_error",
            AppError::EmailAlreadyExists => "email_already_exists",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::InvalidToken => "invalid_token",
            AppError::UserNotFound => "user_not_found",
            AppError::InvalidStoreHeader => "invalid_store_header",
            AppError::StoreAccessDenied(_) => "store_access_denied",
            AppError::InsufficientAccess => "insufficient_access",
            AppError::ResourceNotFound(_) => "resource_not_found",
            AppError::CodeAlreadyExists(_) => "code_already_exists",
            AppError::CannotModifySelf => "cannot_modify_self",
            AppError::CashSessionAlreadyOpen => "cash_session_already_open",
            AppError::CashSessionClosed(_) => "cash_session_closed",
            AppError::EmptyCart => "empty_cart",
            AppError::CustomerRequired => "customer_required",
            AppError::InstallmentAlreadyPaid => "installment_already_paid",
            AppError::DateOutOfRange => "date_out_of_range",
            AppError::AccountAlreadySettled => "account_already_settled",
            AppError::InvalidStatusTransition { .. } => "invalid_status_transition",
            AppError::TermsNotAccepted => "terms_not_accepted",
            AppError::OrderNotPaid => "order_not_paid",
            AppError::OutcomeRequired => "outcome_required",
            AppError::ProblemsRequired => "problems_required",
            AppError::InvalidProblems(_) => "invalid_problems",
            AppError::RemovalReasonRequired => "removal_reason_required",
            AppError::InvalidAttachment(_) => "invalid_attachment",
            _ => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidStoreHeader
            | AppError::EmptyCart
            | AppError::CustomerRequired
            | AppError::DateOutOfRange
            | AppError::TermsNotAccepted
            | AppError::OrderNotPaid
            | AppError::OutcomeRequired
            | AppError::ProblemsRequired
            | AppError::InvalidProblems(_)
            | AppError::RemovalReasonRequired
            | AppError::InvalidAttachment(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::StoreAccessDenied(_)
            | AppError::InsufficientAccess
            | AppError::CannotModifySelf => StatusCode::FORBIDDEN,
            AppError::UserNotFound | AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::EmailAlreadyExists
            | AppError::CodeAlreadyExists(_)
            | AppError::CashSessionAlreadyOpen
            | AppError::CashSessionClosed(_)
            | AppError::InstallmentAlreadyPaid
            | AppError::AccountAlreadySettled
            | AppError::InvalidStatusTransition { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte para o formato HTTP, traduzindo a mensagem para o idioma do cliente.
    pub fn to_api_error(self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        let message = match &self {
            AppError::ResourceNotFound(what) | AppError::CodeAlreadyExists(what) => {
                i18n.translate_with(&locale.0, self.code(), what)
            }
            AppError::InvalidStatusTransition { from, to } => {
                i18n.translate_with(&locale.0, self.code(), &format!("{from} -> {to}"))
            }
            _ => i18n.translate(&locale.0, self.code()),
        };

        let details = match self {
            AppError::ValidationError(errors) => Some(validation_details(&errors)),
            AppError::InvalidProblems(per_problem) => Some(json!(per_problem)),
            _ => None,
        };

        ApiError { status, error: message, details }
    }
}

// Usado quando não há extrator de idioma (middlewares).
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let locale = Locale(DEFAULT_LANG.to_string());
        self.to_api_error(&locale, &I18nStore::new()).into_response()
    }
}

/// Achata os erros do validator (inclusive aninhados, ex: `items[0].quantity`)
/// num mapa campo -> mensagens.
pub fn validation_details(errors: &ValidationErrors) -> Value {
    let mut details: BTreeMap<String, Vec<String>> = BTreeMap::new();
    collect_messages("", errors, &mut details);
    json!(details)
}

fn collect_messages(prefix: &str, errors: &ValidationErrors, out: &mut BTreeMap<String, Vec<String>>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages = field_errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect::<Vec<_>>();
                out.entry(path).or_default().extend(messages);
            }
            ValidationErrorsKind::Struct(inner) => collect_messages(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_messages(&format!("{path}[{index}]"), inner, out);
                }
            }
        }
    }
}

/// Helper para mapear violação de unicidade num erro de domínio.
pub fn map_unique_violation(e: sqlx::Error, on_unique: impl FnOnce() -> AppError) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return on_unique();
        }
    }
    e.into()
}

/// `ResourceNotFound` vira `Ok(None)`; qualquer outro erro continua erro.
pub trait OptionalResult<T> {
    fn found(self) -> Result<Option<T>, AppError>;
}

impl<T> OptionalResult<T> for Result<T, AppError> {
    fn found(self) -> Result<Option<T>, AppError> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(AppError::ResourceNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::ValidationError;

    fn pt() -> Locale {
        Locale("pt".into())
    }

    #[test]
    fn only_not_found_is_treated_as_absent() {
        let missing: Result<u8, AppError> = Err(AppError::ResourceNotFound("Cliente".into()));
        assert!(matches!(missing.found(), Ok(None)));

        let present: Result<u8, AppError> = Ok(7);
        assert!(matches!(present.found(), Ok(Some(7))));

        let broken: Result<u8, AppError> = Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut));
        assert!(matches!(broken.found(), Err(AppError::DatabaseError(_))));
    }

    #[test]
    fn domain_errors_map_to_expected_status() {
        assert_eq!(AppError::CashSessionAlreadyOpen.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::EmptyCart.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InsufficientAccess.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::ResourceNotFound("Produto".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::StorageError("disco cheio".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_errors_carry_field_details() {
        let mut errors = ValidationErrors::new();
        let mut err = ValidationError::new("range");
        err.message = Some("O valor não pode ser negativo.".into());
        errors.add("amount", err);

        let api = AppError::ValidationError(errors).to_api_error(&pt(), &I18nStore::new());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.expect("details");
        assert_eq!(details["amount"][0], "O valor não pode ser negativo.");
    }

    #[test]
    fn not_found_message_includes_resource() {
        let api = AppError::ResourceNotFound("Venda".into()).to_api_error(&pt(), &I18nStore::new());
        assert!(api.error.contains("Venda"));
    }
}
