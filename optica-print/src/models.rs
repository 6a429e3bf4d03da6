//! Print input records
//!
//! Hydrated by the data layer and handed to the renderer as read-only values.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Thermal printer registered in the shop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterDescriptor {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub serial_number: String,
    /// `\\HOST\Queue` share path, or `host` / `host:port` for raw sockets
    pub connection_path: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Client attached to a sale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRef {
    pub id: i64,
    pub name: String,
}

/// `a + b`, clamped to the representable range instead of overflowing
pub fn saturating_add(a: Decimal, b: Decimal) -> Decimal {
    a.checked_add(b).unwrap_or(if b.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    })
}

/// `a - b`, clamped to the representable range instead of overflowing
pub fn saturating_sub(a: Decimal, b: Decimal) -> Decimal {
    a.checked_sub(b).unwrap_or(if b.is_sign_negative() {
        Decimal::MAX
    } else {
        Decimal::MIN
    })
}

/// Sale line
///
/// `line_total` is echoed as given; the receipt subtotal is recomputed from
/// `quantity * unit_price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_name: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

impl LineItem {
    /// `quantity * unit_price`, saturating on overflow
    pub fn extended_price(&self) -> Decimal {
        let quantity = Decimal::from(self.quantity);
        quantity.checked_mul(self.unit_price).unwrap_or(
            if quantity.is_sign_negative() != self.unit_price.is_sign_negative() {
                Decimal::MIN
            } else {
                Decimal::MAX
            },
        )
    }
}

/// Sale with its client and ordered line items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    pub id: i64,
    pub sale_date: NaiveDateTime,
    /// Absent when the client was deleted after the sale
    pub client: Option<ClientRef>,
    pub total_value: Decimal,
    pub entry_value: Decimal,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

impl SaleRecord {
    /// Sum of `quantity * unit_price` over all items
    pub fn subtotal(&self) -> Decimal {
        self.items
            .iter()
            .map(LineItem::extended_price)
            .fold(Decimal::ZERO, saturating_add)
    }

    /// `subtotal - total_value`; negative for a markup
    pub fn discount(&self) -> Decimal {
        saturating_sub(self.subtotal(), self.total_value)
    }

    /// `total_value - entry_value`; negative for an overpayment
    pub fn remaining(&self) -> Decimal {
        saturating_sub(self.total_value, self.entry_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn item(qty: i32, price: &str, total: &str) -> LineItem {
        LineItem {
            product_name: None,
            quantity: qty,
            unit_price: d(price),
            line_total: d(total),
        }
    }

    #[test]
    fn test_subtotal_ignores_line_total() {
        let sale = SaleRecord {
            id: 1,
            sale_date: NaiveDateTime::default(),
            client: None,
            total_value: d("270.00"),
            entry_value: d("50.00"),
            items: vec![item(2, "75.00", "999.99"), item(1, "150.00", "150.00")],
        };

        assert_eq!(sale.subtotal(), d("300.00"));
        assert_eq!(sale.discount(), d("30.00"));
        assert_eq!(sale.remaining(), d("220.00"));
    }

    #[test]
    fn test_overflow_saturates() {
        let huge = d("50000000000000000000000000000");
        let sale = SaleRecord {
            id: 1,
            sale_date: NaiveDateTime::default(),
            client: None,
            total_value: Decimal::MIN,
            entry_value: Decimal::MAX,
            items: vec![
                item(2, "50000000000000000000000000000", "1"),
                item(-3, "-1", "3"),
            ],
        };

        assert_eq!(sale.items[0].extended_price(), Decimal::MAX);
        assert_eq!(
            item(-2, "50000000000000000000000000000", "1").extended_price(),
            Decimal::MIN
        );
        assert_eq!(sale.subtotal(), Decimal::MAX);
        assert_eq!(sale.discount(), Decimal::MAX);
        assert_eq!(sale.remaining(), Decimal::MIN);
        assert_eq!(saturating_add(huge, d("1")), d("50000000000000000000000000001"));
    }

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{
            "id": 7,
            "saleDate": "2026-03-14T10:30:00",
            "client": null,
            "totalValue": 120.5,
            "entryValue": 20,
            "items": [
                {"productName": "Lente", "quantity": 1, "unitPrice": 120.5, "lineTotal": 120.5}
            ]
        }"#;

        let sale: SaleRecord = serde_json::from_str(json).unwrap();
        assert_eq!(sale.id, 7);
        assert!(sale.client.is_none());
        assert_eq!(sale.items[0].unit_price, d("120.5"));
        assert_eq!(sale.remaining(), d("100.5"));
    }

    #[test]
    fn test_printer_defaults_active() {
        let json = r#"{"id": 1, "name": "Balcao", "connectionPath": "10.0.0.5"}"#;
        let printer: PrinterDescriptor = serde_json::from_str(json).unwrap();
        assert!(printer.is_active);
        assert!(printer.model.is_empty());
    }
}
