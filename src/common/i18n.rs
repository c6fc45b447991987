// src/common/i18n.rs

use std::collections::HashMap;

pub const DEFAULT_LANG: &str = "pt";

// (chave, português, inglês). `{}` é substituído pelo argumento de `translate_with`.
const MESSAGES: &[(&str, &str, &str)] = &[
    ("validation_error", "Um ou mais campos são inválidos.", "One or more fields are invalid."),
    ("email_already_exists", "Este e-mail já está em uso.", "This e-mail is already in use."),
    ("invalid_credentials", "E-mail ou senha inválidos.", "Invalid e-mail or password."),
    ("invalid_token", "Token de autenticação inválido ou ausente.", "Missing or invalid authentication token."),
    ("user_not_found", "Usuário não encontrado.", "User not found."),
    ("invalid_store_header", "Informe a loja no cabeçalho x-store-id.", "Send the store id in the x-store-id header."),
    ("store_access_denied", "Você não tem acesso a esta loja.", "You do not have access to this store."),
    ("insufficient_access", "Seu nível de acesso não permite esta ação.", "Your access level does not allow this action."),
    ("resource_not_found", "{} não encontrado(a).", "{} not found."),
    ("code_already_exists", "O código '{}' já está cadastrado.", "Code '{}' is already registered."),
    ("cannot_modify_self", "Você não pode desativar ou remover o próprio usuário.", "You cannot deactivate or remove yourself."),
    ("cash_session_already_open", "Já existe um caixa aberto nesta loja.", "A cash session is already open for this store."),
    ("cash_session_closed", "Este caixa já foi fechado.", "This cash session is already closed."),
    ("empty_cart", "O carrinho está vazio.", "The cart is empty."),
    ("customer_required", "Selecione um cliente para venda a prazo.", "Installment sales require a customer."),
    ("installment_already_paid", "Esta parcela já foi paga.", "This installment is already paid."),
    ("account_already_settled", "Esta conta já foi baixada.", "This account is already settled."),
    ("date_out_of_range", "Data de vencimento fora do intervalo suportado.", "Due date out of supported range."),
    ("invalid_status_transition", "Mudança de status não permitida ({}).", "Status change not allowed ({})."),
    ("terms_not_accepted", "É necessário aceitar o termo de responsabilidade.", "The liability terms must be accepted."),
    ("order_not_paid", "A ordem de serviço precisa estar paga para ser finalizada.", "The service order must be paid before it is finalized."),
    ("outcome_required", "Informe se o serviço ocorreu perfeitamente.", "Tell whether the service went perfectly."),
    ("problems_required", "Descreva ao menos um problema.", "Describe at least one problem."),
    ("invalid_problems", "Há problemas com campos obrigatórios em branco.", "Some problems have missing required fields."),
    ("removal_reason_required", "Informe o motivo da remoção.", "A removal reason is required."),
    ("invalid_attachment", "Anexo inválido.", "Invalid attachment."),
    ("internal_error", "Ocorreu um erro inesperado.", "An unexpected error occurred."),
];

/// Catálogo de mensagens de erro por idioma.
#[derive(Debug, Clone)]
pub struct I18nStore {
    messages: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

impl I18nStore {
    pub fn new() -> Self {
        let mut pt = HashMap::new();
        let mut en = HashMap::new();
        for (key, pt_msg, en_msg) in MESSAGES {
            pt.insert(*key, *pt_msg);
            en.insert(*key, *en_msg);
        }

        let mut messages = HashMap::new();
        messages.insert("pt", pt);
        messages.insert("en", en);
        Self { messages }
    }

    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.lookup(lang, key).replace("{}", "").trim().to_string()
    }

    pub fn translate_with(&self, lang: &str, key: &str, arg: &str) -> String {
        self.lookup(lang, key).replace("{}", arg)
    }

    fn lookup(&self, lang: &str, key: &str) -> &'static str {
        let table = self
            .messages
            .get(lang)
            .or_else(|| self.messages.get(DEFAULT_LANG));

        table
            .and_then(|t| t.get(key).or_else(|| t.get("internal_error")))
            .copied()
            .unwrap_or("Ocorreu um erro inesperado.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_language_falls_back_to_portuguese() {
        let store = I18nStore::new();
        assert_eq!(store.translate("de", "empty_cart"), "O carrinho está vazio.");
        assert_eq!(store.translate("en", "empty_cart"), "The cart is empty.");
    }

    #[test]
    fn argument_is_interpolated() {
        let store = I18nStore::new();
        assert_eq!(store.translate_with("en", "resource_not_found", "Sale"), "Sale not found.");
    }

    #[test]
    fn every_key_exists_in_both_languages() {
        let store = I18nStore::new();
        for (key, _, _) in MESSAGES {
            assert!(store.messages["pt"].contains_key(key));
            assert!(store.messages["en"].contains_key(key));
        }
    }
}
