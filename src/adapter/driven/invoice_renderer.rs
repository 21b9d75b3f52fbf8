use crate::domain::model::Money;
use crate::domain::port::{InvoiceError, InvoiceRenderer, InvoiceView};
use printpdf::{BuiltinFont, Mm, PdfDocument};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const LINE_HEIGHT_MM: f32 = 7.0;

/// PDF請求書レンダラー
/// 結合済みの注文射影からA4縦のPDFを生成する
pub struct PdfInvoiceRenderer;

impl PdfInvoiceRenderer {
    pub fn new() -> Self {
        Self
    }

    /// 金額を表示用の文字列へ整形する（最小通貨単位から小数表記へ）
    fn format_money(money: Money) -> String {
        let amount = money.amount();
        format!("{}.{:02} {}", amount / 100, amount % 100, money.currency())
    }
}

impl Default for PdfInvoiceRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceRenderer for PdfInvoiceRenderer {
    fn render(&self, invoice: &InvoiceView) -> Result<Vec<u8>, InvoiceError> {
        let (doc, page, layer) = PdfDocument::new(
            format!("Invoice {}", invoice.order_id),
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            "Layer 1",
        );

        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| InvoiceError::RenderingFailed(e.to_string()))?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| InvoiceError::RenderingFailed(e.to_string()))?;

        let current_layer = doc.get_page(page).get_layer(layer);
        let mut y = PAGE_HEIGHT_MM - MARGIN_MM;

        let write_line = |text: &str, size: f32, bold: bool, y: &mut f32| {
            let face = if bold { &font_bold } else { &font };
            current_layer.use_text(text, size, Mm(MARGIN_MM), Mm(*y), face);
            *y -= LINE_HEIGHT_MM;
        };

        write_line("INVOICE", 22.0, true, &mut y);
        y -= LINE_HEIGHT_MM;

        write_line(&format!("Order ID: {}", invoice.order_id), 11.0, false, &mut y);
        write_line(
            &format!("Customer: {}", invoice.customer_name),
            11.0,
            false,
            &mut y,
        );
        write_line(
            &format!("Shipping address: {}", invoice.shipping_address.as_str()),
            11.0,
            false,
            &mut y,
        );
        write_line(
            &format!("Payment method: {}", invoice.payment_method),
            11.0,
            false,
            &mut y,
        );
        write_line(
            &format!("Payment status: {}", invoice.payment_status),
            11.0,
            false,
            &mut y,
        );
        y -= LINE_HEIGHT_MM;

        write_line("Items", 13.0, true, &mut y);
        for item in &invoice.items {
            write_line(
                &format!(
                    "{}  x{}  @ {}  =  {}",
                    item.title,
                    item.quantity,
                    Self::format_money(item.unit_price),
                    Self::format_money(item.line_total()),
                ),
                11.0,
                false,
                &mut y,
            );
        }
        y -= LINE_HEIGHT_MM;

        write_line(
            &format!("Total: {}", Self::format_money(invoice.total_price)),
            13.0,
            true,
            &mut y,
        );

        doc.save_to_bytes()
            .map_err(|e| InvoiceError::RenderingFailed(e.to_string()))
    }
}
