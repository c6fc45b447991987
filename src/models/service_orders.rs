// src/models/service_orders.rs

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;
use crate::models::sales::PaymentMethod;

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "service_order_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ServiceOrderStatus {
    Aberto,
    EmAndamento,
    Finalizado,
    Cancelado,
}

impl ServiceOrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceOrderStatus::Aberto => "aberto",
            ServiceOrderStatus::EmAndamento => "em_andamento",
            ServiceOrderStatus::Finalizado => "finalizado",
            ServiceOrderStatus::Cancelado => "cancelado",
        }
    }

    /// aberto -> em_andamento -> finalizado; cancelado a partir de aberto/em_andamento.
    /// Finalizado e cancelado são terminais.
    pub fn can_transition_to(self, next: ServiceOrderStatus) -> bool {
        use ServiceOrderStatus::*;
        matches!(
            (self, next),
            (Aberto, EmAndamento)
                | (Aberto, Finalizado)
                | (EmAndamento, Finalizado)
                | (Aberto, Cancelado)
                | (EmAndamento, Cancelado)
        )
    }

    pub fn ensure_transition(self, next: ServiceOrderStatus) -> Result<(), AppError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(AppError::InvalidStatusTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "fault_party", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FaultParty {
    Funcionario,
    Cliente,
    Outro,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "service_file_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ServiceFileKind {
    Problema,
    Comprovacao,
}

// --- Ordem de serviço ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrder {
    pub id: Uuid,
    #[schema(ignore)]
    pub store_id: Uuid,
    pub service_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub sale_id: Option<Uuid>,
    pub status: ServiceOrderStatus,
    pub started_at: DateTime<Utc>,
    #[schema(value_type = Option<String>, format = Date)]
    pub expected_completion: Option<NaiveDate>,
    pub completed_at: Option<DateTime<Utc>>,
    pub is_paid: bool,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
    /// Problemas já gravados; a finalização pode acontecer depois.
    pub problems_saved: bool,
    pub responsible_id: Option<Uuid>,
    pub terms_accepted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Problema relatado na execução ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceProblem {
    pub id: Uuid,
    #[schema(ignore)]
    pub store_id: Uuid,
    pub service_order_id: Uuid,
    pub reason_id: Uuid,
    pub fault_party: FaultParty,
    pub employee_id: Option<Uuid>,
    #[schema(example = "Cilindro travou durante a troca")]
    pub description: String,
    #[schema(example = "35.00")]
    pub extra_cost: Decimal,
    pub liability_accepted: bool,
    pub liability_accepted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// --- Anexo (foto de problema ou comprovação) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceFile {
    pub id: Uuid,
    #[schema(ignore)]
    pub store_id: Uuid,
    pub service_order_id: Uuid,
    pub problem_id: Option<Uuid>,
    pub kind: ServiceFileKind,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub path: String,
    pub url: String,
    #[schema(example = "porta.jpg")]
    pub file_name: String,
    pub size_bytes: i64,
    #[schema(example = "image/jpeg")]
    pub mime_type: String,
    pub uploaded_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProblemReason {
    pub id: Uuid,
    #[schema(ignore)]
    pub store_id: Uuid,
    #[schema(example = "Peça com defeito")]
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Registro de auditoria de uma ordem removida.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemovedServiceOrder {
    pub id: Uuid,
    #[schema(ignore)]
    pub store_id: Uuid,
    pub service_order_id: Uuid,
    pub reason: String,
    #[schema(value_type = Object)]
    pub snapshot: serde_json::Value,
    pub removed_by: Uuid,
    pub removed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrderDetail {
    #[serde(flatten)]
    pub order: ServiceOrder,
    pub service_name: String,
    pub customer_name: Option<String>,
    pub problems: Vec<ServiceProblem>,
    pub files: Vec<ServiceFile>,
}

// ---
// Entradas (payloads) usadas pelo serviço
// ---

/// Arquivo enviado em base64 dentro do JSON.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentInput {
    #[validate(length(min = 1, max = 255, message = "Nome de arquivo inválido."))]
    #[schema(example = "porta.jpg")]
    pub file_name: String,
    #[validate(length(min = 1, message = "Tipo do arquivo é obrigatório."))]
    #[schema(example = "image/jpeg")]
    pub mime_type: String,
    /// Conteúdo em base64.
    pub content_base64: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProblemInput {
    pub reason_id: Option<Uuid>,
    pub fault_party: Option<FaultParty>,
    pub employee_id: Option<Uuid>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub extra_cost: Decimal,
    #[serde(default)]
    pub liability_accepted: bool,
    #[serde(default)]
    pub attachments: Vec<AttachmentInput>,
}

/// Problema que passou na validação: os campos obrigatórios já estão presentes.
#[derive(Debug, Clone)]
pub struct ValidProblem {
    pub reason_id: Uuid,
    pub fault_party: FaultParty,
    pub employee_id: Option<Uuid>,
    pub description: String,
    pub extra_cost: Decimal,
    pub liability_accepted: bool,
    pub attachments: Vec<AttachmentInput>,
}

/// Valida o lote inteiro. Qualquer problema inválido rejeita todos;
/// os erros voltam indexados pela posição no lote.
pub fn validate_problems(problems: &[ProblemInput]) -> Result<Vec<ValidProblem>, AppError> {
    if problems.is_empty() {
        return Err(AppError::ProblemsRequired);
    }

    let mut errors: BTreeMap<usize, Vec<&'static str>> = BTreeMap::new();
    for (index, p) in problems.iter().enumerate() {
        let mut fields = Vec::new();
        if p.reason_id.is_none() {
            fields.push("reasonId");
        }
        match p.fault_party {
            None => fields.push("faultParty"),
            Some(FaultParty::Funcionario) if p.employee_id.is_none() => fields.push("employeeId"),
            _ => {}
        }
        if p.description.trim().is_empty() {
            fields.push("description");
        }
        if p.extra_cost < Decimal::ZERO {
            fields.push("extraCost");
        }
        if !fields.is_empty() {
            errors.insert(index, fields);
        }
    }

    if !errors.is_empty() {
        return Err(AppError::InvalidProblems(errors));
    }

    Ok(problems
        .iter()
        .filter_map(|p| {
            Some(ValidProblem {
                reason_id: p.reason_id?,
                fault_party: p.fault_party?,
                // Só o funcionário culpado fica registrado
                employee_id: match p.fault_party? {
                    FaultParty::Funcionario => p.employee_id,
                    _ => None,
                },
                description: p.description.trim().to_string(),
                extra_cost: p.extra_cost,
                liability_accepted: p.liability_accepted,
                attachments: p.attachments.clone(),
            })
        })
        .collect())
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeServiceOrderInput {
    pub responsible_id: Uuid,
    #[serde(default)]
    pub terms_accepted: bool,
    #[serde(default)]
    pub paid: bool,
    pub payment_method: Option<PaymentMethod>,
    /// "O serviço ocorreu perfeitamente?" Obrigatório quando os problemas
    /// ainda não foram gravados.
    pub occurred_perfectly: Option<bool>,
    #[serde(default)]
    pub problems: Vec<ProblemInput>,
    /// Fotos de comprovação (caminho "sim").
    #[serde(default)]
    pub proof_files: Vec<AttachmentInput>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceOrderPayload {
    pub service_id: Uuid,
    pub customer_id: Option<Uuid>,
    #[schema(value_type = Option<String>, format = Date)]
    pub expected_completion: Option<NaiveDate>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveProblemsPayload {
    pub problems: Vec<ProblemInput>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemoveServiceOrderPayload {
    #[serde(default)]
    #[schema(example = "Lançada em duplicidade")]
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProblemReasonPayload {
    #[validate(custom(function = "crate::common::validators::validate_not_blank"), length(max = 100))]
    #[schema(example = "Peça com defeito")]
    pub name: String,
}

/// O que a finalização precisa gravar além da mudança de status.
#[derive(Debug)]
pub enum FinalizeOutcome {
    /// Problemas já gravados antes: só fecha a ordem.
    AlreadyReviewed,
    Perfect { proof_files: Vec<AttachmentInput> },
    WithProblems(Vec<ValidProblem>),
}

/// Pré-condições da finalização, na ordem em que a tela as cobra.
pub fn plan_finalize(
    order: &ServiceOrder,
    input: &FinalizeServiceOrderInput,
) -> Result<FinalizeOutcome, AppError> {
    order.status.ensure_transition(ServiceOrderStatus::Finalizado)?;

    if !input.terms_accepted {
        return Err(AppError::TermsNotAccepted);
    }
    if !input.paid {
        return Err(AppError::OrderNotPaid);
    }
    if order.problems_saved {
        return Ok(FinalizeOutcome::AlreadyReviewed);
    }

    match input.occurred_perfectly {
        None => Err(AppError::OutcomeRequired),
        Some(true) => Ok(FinalizeOutcome::Perfect {
            proof_files: input.proof_files.clone(),
        }),
        Some(false) => validate_problems(&input.problems).map(FinalizeOutcome::WithProblems),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(status: ServiceOrderStatus, problems_saved: bool) -> ServiceOrder {
        ServiceOrder {
            id: Uuid::new_v4(),
            store_id: Uuid::nil(),
            service_id: Uuid::new_v4(),
            customer_id: None,
            sale_id: None,
            status,
            started_at: Utc::now(),
            expected_completion: None,
            completed_at: None,
            is_paid: false,
            payment_method: None,
            notes: None,
            problems_saved,
            responsible_id: None,
            terms_accepted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn good_problem() -> ProblemInput {
        ProblemInput {
            reason_id: Some(Uuid::new_v4()),
            fault_party: Some(FaultParty::Cliente),
            employee_id: None,
            description: "Fechadura já estava danificada".into(),
            extra_cost: Decimal::ZERO,
            liability_accepted: true,
            attachments: vec![],
        }
    }

    fn finalize_input() -> FinalizeServiceOrderInput {
        FinalizeServiceOrderInput {
            responsible_id: Uuid::new_v4(),
            terms_accepted: true,
            paid: true,
            payment_method: Some(PaymentMethod::Pix),
            occurred_perfectly: Some(true),
            problems: vec![],
            proof_files: vec![],
        }
    }

    #[test]
    fn lifecycle_transitions() {
        use ServiceOrderStatus::*;
        assert!(Aberto.can_transition_to(EmAndamento));
        assert!(EmAndamento.can_transition_to(Finalizado));
        assert!(EmAndamento.can_transition_to(Cancelado));
        assert!(!Finalizado.can_transition_to(Cancelado));
        assert!(!Cancelado.can_transition_to(EmAndamento));
        assert!(!EmAndamento.can_transition_to(Aberto));
    }

    #[test]
    fn employee_fault_requires_employee() {
        let mut p = good_problem();
        p.fault_party = Some(FaultParty::Funcionario);
        match validate_problems(&[good_problem(), p]) {
            Err(AppError::InvalidProblems(errors)) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[&1], vec!["employeeId"]);
            }
            other => panic!("esperava InvalidProblems, veio {other:?}"),
        }
    }

    #[test]
    fn blank_fields_are_reported_per_problem() {
        let empty = ProblemInput {
            reason_id: None,
            fault_party: None,
            employee_id: None,
            description: "   ".into(),
            extra_cost: Decimal::ZERO,
            liability_accepted: false,
            attachments: vec![],
        };
        match validate_problems(&[empty]) {
            Err(AppError::InvalidProblems(errors)) => {
                assert_eq!(errors[&0], vec!["reasonId", "faultParty", "description"]);
            }
            other => panic!("esperava InvalidProblems, veio {other:?}"),
        }
    }

    #[test]
    fn empty_batch_is_rejected() {
        assert!(matches!(validate_problems(&[]), Err(AppError::ProblemsRequired)));
    }

    #[test]
    fn finalize_requires_terms_and_payment() {
        let o = order(ServiceOrderStatus::EmAndamento, false);

        let mut input = finalize_input();
        input.terms_accepted = false;
        assert!(matches!(plan_finalize(&o, &input), Err(AppError::TermsNotAccepted)));

        let mut input = finalize_input();
        input.paid = false;
        assert!(matches!(plan_finalize(&o, &input), Err(AppError::OrderNotPaid)));
    }

    #[test]
    fn finalize_asks_outcome_unless_problems_saved() {
        let mut input = finalize_input();
        input.occurred_perfectly = None;

        let fresh = order(ServiceOrderStatus::EmAndamento, false);
        assert!(matches!(plan_finalize(&fresh, &input), Err(AppError::OutcomeRequired)));

        let reviewed = order(ServiceOrderStatus::EmAndamento, true);
        assert!(matches!(
            plan_finalize(&reviewed, &input),
            Ok(FinalizeOutcome::AlreadyReviewed)
        ));
    }

    #[test]
    fn finalize_with_no_answer_needs_a_problem() {
        let o = order(ServiceOrderStatus::Aberto, false);
        let mut input = finalize_input();
        input.occurred_perfectly = Some(false);
        assert!(matches!(plan_finalize(&o, &input), Err(AppError::ProblemsRequired)));

        input.problems = vec![good_problem()];
        match plan_finalize(&o, &input) {
            Ok(FinalizeOutcome::WithProblems(problems)) => assert_eq!(problems.len(), 1),
            other => panic!("esperava WithProblems, veio {other:?}"),
        }
    }

    #[test]
    fn finalized_order_cannot_be_finalized_again() {
        let o = order(ServiceOrderStatus::Finalizado, false);
        assert!(matches!(
            plan_finalize(&o, &finalize_input()),
            Err(AppError::InvalidStatusTransition { .. })
        ));
    }
}
