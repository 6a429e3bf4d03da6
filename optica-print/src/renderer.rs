//! Receipt and self-test renderers
//!
//! Renders sales and printer self-test pages into ESC/POS documents for the
//! shop's 58mm thermal printers. Rendering is pure: no I/O, no clock, no
//! hidden state, so the same input always yields the same bytes.

use chrono::NaiveDateTime;
use optica_printer::{ComposedDocument, EscPosBuilder, pad_latin};
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use crate::models::{LineItem, PrinterDescriptor, SaleRecord, saturating_add, saturating_sub};

/// Shown when the sale's client no longer exists
pub const CLIENT_PLACEHOLDER: &str = "Consumidor";
/// Shown when a line item has no product name
pub const ITEM_PLACEHOLDER: &str = "Item";
pub const CURRENCY_PREFIX: &str = "R$ ";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

/// Fixed-width layout parameters
///
/// The defaults describe 58mm paper (32 columns).
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptLayout {
    /// Characters per printed line
    pub width: usize,
    /// Product name column; longer names are cut, never wrapped
    pub name_column: usize,
    /// A discount is printed only when strictly above this amount
    pub discount_threshold: Decimal,
}

impl Default for ReceiptLayout {
    fn default() -> Self {
        Self {
            width: 32,
            name_column: 16,
            discount_threshold: Decimal::new(1, 2),
        }
    }
}

/// Shop identity printed on every receipt
#[derive(Debug, Clone, PartialEq)]
pub struct ShopInfo {
    pub name: String,
    /// Address, phone, tax id... printed under the name
    pub header_lines: Vec<String>,
    /// Disclaimers printed above the cut
    pub footer_lines: Vec<String>,
}

impl Default for ShopInfo {
    fn default() -> Self {
        Self {
            name: "OTICA".to_string(),
            header_lines: Vec::new(),
            footer_lines: vec![
                "Obrigado pela preferencia!".to_string(),
                "Documento sem valor fiscal".to_string(),
            ],
        }
    }
}

/// Amount with exactly two decimals, midpoint away from zero
pub fn format_amount(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    // No "-0.00" for sub-cent negatives
    let rounded = if rounded.is_zero() {
        Decimal::ZERO
    } else {
        rounded
    };
    format!("{:.2}", rounded)
}

/// Amount with the currency prefix
pub fn format_money(value: Decimal) -> String {
    format!("{}{}", CURRENCY_PREFIX, format_amount(value))
}

/// Receipt renderer
///
/// Renders sales and self-test pages with one layout and shop identity.
#[derive(Debug, Clone, Default)]
pub struct ReceiptRenderer {
    layout: ReceiptLayout,
    shop: ShopInfo,
}

impl ReceiptRenderer {
    pub fn new(layout: ReceiptLayout, shop: ShopInfo) -> Self {
        Self { layout, shop }
    }

    pub fn layout(&self) -> &ReceiptLayout {
        &self.layout
    }

    /// Render a sale, failing only when no sale was supplied
    pub fn compose_sale(
        &self,
        sale: Option<&SaleRecord>,
    ) -> Result<ComposedDocument, ComposeError> {
        sale.map(|s| self.render_sale(s))
            .ok_or_else(|| ComposeError::InvalidDocument("no sale record supplied".to_string()))
    }

    /// Render a sale receipt
    pub fn render_sale(&self, sale: &SaleRecord) -> ComposedDocument {
        let mut b = EscPosBuilder::new(self.layout.width);

        self.render_header(&mut b, sale);
        let subtotal = self.render_items(&mut b, &sale.items);
        self.render_totals(&mut b, sale, subtotal);
        self.render_footer(&mut b);

        b.build()
    }

    /// Render a printer self-test page
    pub fn render_test_page(
        &self,
        printer: &PrinterDescriptor,
        now: NaiveDateTime,
    ) -> ComposedDocument {
        let mut b = EscPosBuilder::new(self.layout.width);

        b.center();
        b.bold();
        b.line("PRINTER TEST");
        b.bold_off();
        b.line(&self.shop.name);
        b.left();
        b.sep_double();

        b.line(&format!("Printer: {}", printer.name));
        b.line(&format!("Model: {}", printer.model));
        b.line(&format!("Serial: {}", printer.serial_number));
        b.line(&format!("Connection: {}", printer.connection_path));
        b.line(&format!("Date: {}", now.format("%d/%m/%Y %H:%M:%S")));

        b.sep_double();
        b.center();
        b.line("TEST COMPLETED");
        b.left();

        b.feed(3);
        b.cut();
        b.build()
    }

    fn render_header(&self, b: &mut EscPosBuilder, sale: &SaleRecord) {
        // Shop identity (large, centered)
        b.center();
        b.bold();
        b.double_size();
        b.line(&self.shop.name);
        b.reset_size();
        b.bold_off();
        for line in &self.shop.header_lines {
            b.line(line);
        }

        b.left();
        b.sep_double();
        b.line(&format!("Sale/Order #{}", sale.id));
        b.line(&format!("Date: {}", sale.sale_date.format("%d/%m/%Y %H:%M")));

        let client = sale
            .client
            .as_ref()
            .map(|c| c.name.trim())
            .filter(|name| !name.is_empty())
            .unwrap_or(CLIENT_PLACEHOLDER);
        b.line(&format!("Client: {}", client));
        b.sep_single();
    }

    /// Render the item table and return the recomputed subtotal
    fn render_items(&self, b: &mut EscPosBuilder, items: &[LineItem]) -> Decimal {
        b.bold();
        b.line(&format!(
            "{} {}",
            pad_latin("ITEM", self.layout.name_column, false),
            "QTY x PRICE = TOTAL"
        ));
        b.bold_off();
        b.sep_single();

        let mut subtotal = Decimal::ZERO;
        for item in items {
            subtotal = saturating_add(subtotal, item.extended_price());
            b.line(&self.item_line(item));
        }

        b.sep_single();
        subtotal
    }

    fn item_line(&self, item: &LineItem) -> String {
        let name = item
            .product_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(ITEM_PLACEHOLDER);

        format!(
            "{} {}x {} = {}",
            pad_latin(name, self.layout.name_column, false),
            item.quantity,
            format_amount(item.unit_price),
            format_amount(item.line_total)
        )
    }

    fn render_totals(&self, b: &mut EscPosBuilder, sale: &SaleRecord, subtotal: Decimal) {
        b.right();
        b.line(&format!("SUBTOTAL: {}", format_money(subtotal)));

        let discount = saturating_sub(subtotal, sale.total_value);
        if discount > self.layout.discount_threshold {
            b.line(&format!("DISCOUNT: {}", format_money(discount)));
        }

        b.bold();
        b.line(&format!("TOTAL: {}", format_money(sale.total_value)));
        b.line(&format!("ENTRY: {}", format_money(sale.entry_value)));
        b.line(&format!(
            "REMAINING: {}",
            format_money(sale.remaining())
        ));
        b.bold_off();
        b.left();
    }

    fn render_footer(&self, b: &mut EscPosBuilder) {
        b.newline();
        b.center();
        for line in &self.shop.footer_lines {
            b.line(line);
        }
        b.left();

        // Feed and cut
        b.feed(3);
        b.cut();
    }
}

/// Render a self-test page with the default layout
pub fn compose_test_document(printer: &PrinterDescriptor, now: NaiveDateTime) -> ComposedDocument {
    ReceiptRenderer::default().render_test_page(printer, now)
}

/// Render a sale receipt with the default layout
pub fn compose_sale_document(sale: Option<&SaleRecord>) -> Result<ComposedDocument, ComposeError> {
    ReceiptRenderer::default().compose_sale(sale)
}
