// src/services/document_service.rs

use std::path::{Path, PathBuf};

use genpdf::{elements, style, Element};
use image::Luma;
use qrcode::QrCode;
use rust_decimal::Decimal;
use sqlx::{Acquire, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::StoreRepository,
    models::{
        inventory::ItemKind,
        sales::{PaymentMethod, SaleDetail},
        store::Store,
    },
    services::sale_service::SaleService,
};

/// `R$ 1.234,56`
pub fn format_brl(value: Decimal) -> String {
    let formatted = format!("{:.2}", value.round_dp(2).abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::new();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*c);
    }

    let sign = if value.is_sign_negative() && !value.is_zero() { "-" } else { "" };
    format!("{sign}R$ {grouped},{frac_part}")
}

fn payment_label(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Cash => "Dinheiro",
        PaymentMethod::CreditCard => "Cartão de Crédito",
        PaymentMethod::DebitCard => "Cartão de Débito",
        PaymentMethod::Pix => "PIX",
        PaymentMethod::Other => "Outros",
    }
}

fn pdf_error(e: impl std::fmt::Display) -> AppError {
    AppError::InternalServerError(anyhow::Error::msg(e.to_string()))
}

#[derive(Clone)]
pub struct DocumentService {
    sale_service: SaleService,
    store_repo: StoreRepository,
    fonts_dir: PathBuf,
}

impl DocumentService {
    pub fn new(sale_service: SaleService, store_repo: StoreRepository, fonts_dir: impl Into<PathBuf>) -> Self {
        Self { sale_service, store_repo, fonts_dir: fonts_dir.into() }
    }

    /// Comprovante da venda em PDF, com QR Code da chave PIX quando a loja tem uma.
    pub fn sale_receipt_pdf<'e, E>(&self, executor: E, store_id: Uuid, sale_id: Uuid) -> impl Future<Output = Result<Vec<u8>, AppError>> + Send
    where
        E: Acquire<'e, Database = Postgres> + Send,
    {
        async move {
            let mut conn = executor.acquire().await?;
            let detail = self.sale_service.get_sale(&mut *conn, store_id, sale_id).await?;
            let store = self.store_repo.find_store(&mut *conn, store_id).await?;
            drop(conn);

            let fonts_dir = self.fonts_dir.clone();
            // Renderização é CPU pura: fora do runtime
            tokio::task::spawn_blocking(move || render_receipt(&fonts_dir, &store, &detail))
                .await
                .map_err(pdf_error)?
        }
    }
}

fn render_receipt(fonts_dir: &Path, store: &Store, detail: &SaleDetail) -> Result<Vec<u8>, AppError> {
    let font_family = genpdf::fonts::from_files(fonts_dir, "Roboto", None)
        .map_err(|_| AppError::FontNotFound(fonts_dir.display().to_string()))?;

    let sale = &detail.sale;
    let mut doc = genpdf::Document::new(font_family);
    doc.set_title(format!("Venda {}", sale.id));
    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(10);
    doc.set_page_decorator(decorator);

    // --- Cabeçalho ---
    doc.push(elements::Paragraph::new(store.name.clone()).styled(style::Style::new().bold().with_font_size(18)));
    if let Some(tax_id) = &store.tax_id {
        doc.push(elements::Paragraph::new(format!("CNPJ/CPF: {tax_id}")).styled(style::Style::new().with_font_size(10)));
    }
    if let Some(phone) = &store.phone {
        doc.push(elements::Paragraph::new(format!("Telefone: {phone}")).styled(style::Style::new().with_font_size(10)));
    }
    doc.push(elements::Break::new(1.5));

    doc.push(elements::Paragraph::new("COMPROVANTE DE VENDA").styled(style::Style::new().bold().with_font_size(14)));
    doc.push(elements::Paragraph::new(format!("Data: {}", sale.created_at.format("%d/%m/%Y %H:%M"))));
    doc.push(elements::Paragraph::new(format!(
        "Cliente: {}",
        detail.customer_name.as_deref().unwrap_or("Consumidor Final")
    )));
    doc.push(elements::Paragraph::new(format!("Pagamento: {}", payment_label(sale.payment_method))));
    doc.push(elements::Break::new(2));

    // --- Itens: nome (4), qtd (1), unitário (2), total (2) ---
    let mut table = elements::TableLayout::new(vec![4, 1, 2, 2]);
    table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

    let bold = style::Style::new().bold();
    table
        .row()
        .element(elements::Paragraph::new("Item").styled(bold))
        .element(elements::Paragraph::new("Qtd").styled(bold))
        .element(elements::Paragraph::new("Unitário").styled(bold))
        .element(elements::Paragraph::new("Total").styled(bold))
        .push()
        .map_err(pdf_error)?;

    for item in &detail.items {
        let name = match item.kind {
            ItemKind::Produto => item.name.clone(),
            ItemKind::Servico => format!("{} (serviço)", item.name),
        };
        table
            .row()
            .element(elements::Paragraph::new(name))
            .element(elements::Paragraph::new(item.quantity.to_string()))
            .element(elements::Paragraph::new(format_brl(item.unit_price)))
            .element(elements::Paragraph::new(format_brl(item.subtotal)))
            .push()
            .map_err(pdf_error)?;
    }
    doc.push(table);
    doc.push(elements::Break::new(1));

    // --- Totais ---
    for (label, value) in [("Subtotal", sale.subtotal), ("Desconto", sale.discount)] {
        let mut p = elements::Paragraph::new(format!("{label}: {}", format_brl(value)));
        p.set_alignment(genpdf::Alignment::Right);
        doc.push(p);
    }
    let mut total = elements::Paragraph::new(format!("TOTAL: {}", format_brl(sale.total)));
    total.set_alignment(genpdf::Alignment::Right);
    doc.push(total.styled(style::Style::new().bold().with_font_size(12)));
    doc.push(elements::Break::new(2));

    // --- PIX ---
    if let Some(key) = store.pix_key.as_deref().filter(|k| !k.trim().is_empty()) {
        doc.push(elements::Paragraph::new("PAGAMENTO VIA PIX").styled(style::Style::new().bold().with_font_size(12)));
        doc.push(elements::Paragraph::new(format!("Chave: {key}")));
        doc.push(elements::Break::new(1));

        let code = QrCode::new(key.as_bytes()).map_err(pdf_error)?;
        let image = image::DynamicImage::ImageLuma8(code.render::<Luma<u8>>().build());
        let qr = elements::Image::from_dynamic_image(image)
            .map_err(pdf_error)?
            .with_scale(genpdf::Scale::new(0.5, 0.5));
        doc.push(qr);
    }

    if let Some(address) = &store.address {
        doc.push(elements::Break::new(2));
        doc.push(elements::Paragraph::new(address.clone()).styled(style::Style::new().italic().with_font_size(8)));
    }

    let mut buffer = Vec::new();
    doc.render(&mut buffer).map_err(pdf_error)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().expect("decimal")
    }

    #[test]
    fn brl_uses_comma_and_thousand_dots() {
        assert_eq!(format_brl(dec("45")), "R$ 45,00");
        assert_eq!(format_brl(dec("1234.5")), "R$ 1.234,50");
        assert_eq!(format_brl(dec("1234567.891")), "R$ 1.234.567,89");
        assert_eq!(format_brl(dec("0")), "R$ 0,00");
    }

    #[test]
    fn negative_totals_keep_the_sign() {
        assert_eq!(format_brl(dec("-5.00")), "-R$ 5,00");
    }

    #[test]
    fn missing_fonts_are_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store {
            id: Uuid::new_v4(),
            name: "Chaveiro".into(),
            tax_id: None,
            address: None,
            phone: None,
            pix_key: None,
            owner_id: Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let detail = SaleDetail {
            sale: crate::models::sales::Sale {
                id: Uuid::new_v4(),
                store_id: store.id,
                customer_id: None,
                employee_id: Uuid::new_v4(),
                subtotal: dec("10"),
                discount: Decimal::ZERO,
                total: dec("10"),
                payment_method: PaymentMethod::Cash,
                status: crate::models::sales::SaleStatus::Concluida,
                created_at: chrono::Utc::now(),
            },
            customer_name: None,
            items: vec![],
        };
        let result = render_receipt(dir.path(), &store, &detail);
        assert!(matches!(result, Err(AppError::FontNotFound(_))));
    }
}
