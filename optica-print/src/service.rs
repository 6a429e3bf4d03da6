//! Print service
//!
//! Caller-facing entry points: resolve records, guard inactive printers,
//! render, then hand the bytes to the dispatcher.

use chrono::{Local, NaiveDateTime};
use optica_printer::{ComposedDocument, DeliveryError, DeliveryErrorKind, Dispatcher};
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::catalog::{CatalogError, PrintCatalog};
use crate::models::PrinterDescriptor;
use crate::renderer::{ComposeError, ReceiptRenderer};

/// Errors surfaced to the caller
///
/// `Display` is the user-facing message.
#[derive(Debug, Error)]
pub enum PrintServiceError {
    #[error("printer not found")]
    PrinterNotFound { printer_id: i64 },

    #[error("printer inactive")]
    PrinterInactive { printer_id: i64 },

    #[error("sale not found")]
    SaleNotFound { sale_id: i64 },

    #[error("{0}")]
    InvalidDocument(#[from] ComposeError),

    #[error("printing failed: {}", .0.detail)]
    Delivery(#[from] DeliveryError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl PrintServiceError {
    /// Delivery-level classification, for callers that report error kinds
    pub fn delivery_kind(&self) -> Option<DeliveryErrorKind> {
        match self {
            Self::PrinterNotFound { .. } => Some(DeliveryErrorKind::PrinterNotFound),
            Self::PrinterInactive { .. } => Some(DeliveryErrorKind::PrinterInactive),
            Self::Delivery(e) => Some(e.kind),
            _ => None,
        }
    }
}

pub type PrintServiceResult<T> = Result<T, PrintServiceError>;

/// Print service
///
/// Stateless between calls; concurrent requests share nothing mutable.
pub struct PrintService<C> {
    catalog: C,
    renderer: ReceiptRenderer,
    dispatcher: Dispatcher,
}

impl<C: PrintCatalog> PrintService<C> {
    pub fn new(catalog: C, renderer: ReceiptRenderer, dispatcher: Dispatcher) -> Self {
        Self {
            catalog,
            renderer,
            dispatcher,
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Print a self-test page stamped with the current local time
    pub async fn run_self_test(&self, printer_id: i64) -> PrintServiceResult<()> {
        self.run_self_test_at(printer_id, Local::now().naive_local())
            .await
    }

    /// Print a self-test page stamped with `now`
    #[instrument(skip(self))]
    pub async fn run_self_test_at(
        &self,
        printer_id: i64,
        now: NaiveDateTime,
    ) -> PrintServiceResult<()> {
        let printer = self.active_printer(printer_id).await?;
        let doc = self.renderer.render_test_page(&printer, now);
        self.deliver(&printer, &doc).await
    }

    /// Print a sale receipt
    #[instrument(skip(self))]
    pub async fn print_sale(&self, sale_id: i64, printer_id: i64) -> PrintServiceResult<()> {
        let printer = self.active_printer(printer_id).await?;
        let doc = self.render_sale(sale_id).await?;
        self.deliver(&printer, &doc).await
    }

    /// Render a sale receipt without printing it
    pub async fn render_sale(&self, sale_id: i64) -> PrintServiceResult<ComposedDocument> {
        let sale = self
            .catalog
            .find_sale(sale_id)
            .await?
            .ok_or(PrintServiceError::SaleNotFound { sale_id })?;
        Ok(self.renderer.compose_sale(Some(&sale))?)
    }

    /// Whether the printer answers; does not check `is_active`
    #[instrument(skip(self))]
    pub async fn printer_status(&self, printer_id: i64) -> PrintServiceResult<bool> {
        let printer = self.find_printer(printer_id).await?;
        Ok(self.dispatcher.probe(&printer.connection_path).await)
    }

    async fn find_printer(&self, printer_id: i64) -> PrintServiceResult<PrinterDescriptor> {
        self.catalog
            .find_printer(printer_id)
            .await?
            .ok_or(PrintServiceError::PrinterNotFound { printer_id })
    }

    async fn active_printer(&self, printer_id: i64) -> PrintServiceResult<PrinterDescriptor> {
        let printer = self.find_printer(printer_id).await?;
        if !printer.is_active {
            info!(printer = %printer.name, "Refusing to print on inactive printer");
            return Err(PrintServiceError::PrinterInactive { printer_id });
        }
        Ok(printer)
    }

    async fn deliver(
        &self,
        printer: &PrinterDescriptor,
        doc: &ComposedDocument,
    ) -> PrintServiceResult<()> {
        match self
            .dispatcher
            .deliver_document(&printer.connection_path, doc)
            .await
        {
            Ok(()) => {
                info!(printer = %printer.name, bytes = doc.len(), "Printed");
                Ok(())
            }
            Err(e) => {
                error!(printer = %printer.name, error = %e, "Printing failed");
                Err(e.into())
            }
        }
    }
}
