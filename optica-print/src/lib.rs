//! Optica print service - receipt and self-test printing for the shop ERP
//!
//! # Architecture
//!
//! - **Renderer** (`renderer`): sale / self-test record → ESC/POS document, no I/O
//! - **Dispatcher** (`optica_printer`): document bytes → share spooler or TCP socket
//! - **Service** (`service`): `run_self_test` / `print_sale` boundary with the
//!   caller-level guards (unknown printer, inactive printer, unknown sale)
//!
//! ```text
//! catalog ──► PrintService ──► ReceiptRenderer ──► ComposedDocument
//!                  │                                     │
//!                  └──────────► Dispatcher ◄─────────────┘
//!                                 ├── SharePrinter (spooler)
//!                                 └── NetworkPrinter (9100)
//! ```

pub mod catalog;
pub mod config;
pub mod logger;
pub mod models;
pub mod renderer;
pub mod service;

pub use catalog::{CatalogError, InMemoryCatalog, PrintCatalog};
pub use config::{Config, SpoolerKind};
pub use logger::{cleanup_old_logs, init_logger, init_logger_with_file};
pub use models::{ClientRef, LineItem, PrinterDescriptor, SaleRecord};
pub use renderer::{
    ComposeError, ReceiptLayout, ReceiptRenderer, ShopInfo, compose_sale_document,
    compose_test_document,
};
pub use service::{PrintService, PrintServiceError, PrintServiceResult};
