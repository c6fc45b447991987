// src/models/sales.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::validators::validate_not_negative;
use crate::models::inventory::ItemKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "sale_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Pendente,  // venda a prazo ainda não quitada
    Concluida,
    Cancelada,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    DebitCard,
    Pix,
    Other,
}

impl PaymentMethod {
    /// Categoria usada na movimentação de caixa gerada pela venda.
    pub fn cash_category(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Venda - Dinheiro",
            PaymentMethod::CreditCard => "Venda - Cartão de Crédito",
            PaymentMethod::DebitCard => "Venda - Cartão de Débito",
            PaymentMethod::Pix => "Venda - PIX",
            PaymentMethod::Other => "Venda - Outros",
        }
    }
}

// --- Venda (cabeçalho) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: Uuid,
    #[schema(ignore)]
    pub store_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub employee_id: Uuid,
    #[schema(example = "50.00")]
    pub subtotal: Decimal,
    #[schema(example = "5.00")]
    pub discount: Decimal,
    #[schema(example = "45.00")]
    pub total: Decimal,
    pub payment_method: PaymentMethod,
    pub status: SaleStatus,
    pub created_at: DateTime<Utc>,
}

// --- Item da venda (fotografia do preço no momento da venda) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub id: Uuid,
    #[schema(ignore)]
    pub store_id: Uuid,
    pub sale_id: Uuid,
    pub kind: ItemKind,
    pub product_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    #[schema(example = "Chave Yale 2 faces")]
    pub name: String,
    #[schema(example = 2)]
    pub quantity: i32,
    #[schema(example = "10.00")]
    pub unit_price: Decimal,
    #[schema(example = "20.00")]
    pub subtotal: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetail {
    #[serde(flatten)]
    pub sale: Sale,
    pub customer_name: Option<String>,
    pub items: Vec<SaleItem>,
}

/// Resultado da finalização: a venda e o que foi gerado junto com ela.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleReceipt {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    /// Movimentação de entrada no caixa (só venda à vista com caixa aberto).
    pub cash_movement_id: Option<Uuid>,
    pub installment_sale_id: Option<Uuid>,
    pub service_order_ids: Vec<Uuid>,
}

// ---
// Carrinho (entrada da finalização)
// ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_cart_item"))]
pub struct CartItemInput {
    pub kind: ItemKind,
    pub product_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    #[validate(range(min = 1, message = "A quantidade deve ser ao menos 1."))]
    #[schema(example = 2)]
    pub quantity: i32,
    /// Se ausente, usa o preço de cadastro.
    #[validate(custom(function = "validate_not_negative"))]
    pub unit_price: Option<Decimal>,
}

/// Cada linha aponta para um produto OU para um serviço, conforme `kind`.
fn validate_cart_item(item: &CartItemInput) -> Result<(), validator::ValidationError> {
    let consistent = match item.kind {
        ItemKind::Produto => item.product_id.is_some() && item.service_id.is_none(),
        ItemKind::Servico => item.service_id.is_some() && item.product_id.is_none(),
    };
    if consistent {
        Ok(())
    } else {
        let mut err = validator::ValidationError::new("item_target");
        err.message = Some("Informe o produto ou o serviço de acordo com o tipo do item.".into());
        Err(err)
    }
}

/// Desconto informado na tela: percentual ou valor fixo.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DiscountInput {
    Percent(Decimal),
    Amount(Decimal),
}

impl DiscountInput {
    /// Valor absoluto do desconto sobre `subtotal` (percentual arredondado em centavos).
    pub fn absolute(self, subtotal: Decimal) -> Decimal {
        match self {
            DiscountInput::Percent(p) => (subtotal * p / Decimal::ONE_HUNDRED).round_dp(2),
            DiscountInput::Amount(a) => a,
        }
    }

    fn raw(self) -> Decimal {
        match self {
            DiscountInput::Percent(v) | DiscountInput::Amount(v) => v,
        }
    }
}

fn validate_discount(discount: &DiscountInput) -> Result<(), validator::ValidationError> {
    validate_not_negative(&discount.raw())
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentPlanInput {
    #[validate(range(min = 1, max = 48, message = "Número de parcelas inválido."))]
    #[schema(example = 3)]
    pub count: u32,
    #[schema(value_type = String, format = Date, example = "2025-02-10")]
    pub first_due_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeSalePayload {
    #[validate(nested)]
    pub items: Vec<CartItemInput>,
    #[validate(custom(function = "validate_discount"))]
    pub discount: Option<DiscountInput>,
    pub payment_method: PaymentMethod,
    pub customer_id: Option<Uuid>,
    /// Presente => venda a prazo.
    #[validate(nested)]
    pub installments: Option<InstallmentPlanInput>,
}
