//! Record lookup for print requests
//!
//! The data layer owns printers and sales; the print service only asks for
//! fully hydrated records by id.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::models::{PrinterDescriptor, SaleRecord};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("catalog backend error: {0}")]
    Backend(String),
}

/// Source of printer and sale records
#[allow(async_fn_in_trait)]
pub trait PrintCatalog {
    async fn find_printer(
        &self,
        printer_id: i64,
    ) -> Result<Option<PrinterDescriptor>, CatalogError>;

    async fn find_sale(&self, sale_id: i64) -> Result<Option<SaleRecord>, CatalogError>;
}

#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    printers: Vec<PrinterDescriptor>,
    #[serde(default)]
    sales: Vec<SaleRecord>,
}

/// In-memory catalog, loadable from a JSON export
///
/// ```json
/// { "printers": [ { "id": 1, "name": "Balcao", "connectionPath": "10.0.0.5" } ],
///   "sales": [] }
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    printers: HashMap<i64, PrinterDescriptor>,
    sales: HashMap<i64, SaleRecord>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_printer(mut self, printer: PrinterDescriptor) -> Self {
        self.printers.insert(printer.id, printer);
        self
    }

    pub fn with_sale(mut self, sale: SaleRecord) -> Self {
        self.sales.insert(sale.id, sale);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        let catalog = file
            .printers
            .into_iter()
            .fold(Self::new(), Self::with_printer);
        Ok(file.sales.into_iter().fold(catalog, Self::with_sale))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn printer_count(&self) -> usize {
        self.printers.len()
    }

    pub fn sale_count(&self) -> usize {
        self.sales.len()
    }
}

impl PrintCatalog for InMemoryCatalog {
    async fn find_printer(
        &self,
        printer_id: i64,
    ) -> Result<Option<PrinterDescriptor>, CatalogError> {
        Ok(self.printers.get(&printer_id).cloned())
    }

    async fn find_sale(&self, sale_id: i64) -> Result<Option<SaleRecord>, CatalogError> {
        Ok(self.sales.get(&sale_id).cloned())
    }
}
