//! # optica-printer
//!
//! ESC/POS thermal printer library - low-level printing capabilities only.
//!
//! ## Scope
//!
//! This crate handles HOW to print:
//! - ESC/POS command building into an immutable [`ComposedDocument`]
//! - Windows-1252 encoding for Latin thermal printers
//! - Raw socket printing (TCP port 9100)
//! - Spooler printing through network shares (Win32 spooler or CUPS `lp`)
//! - Routing a connection descriptor to the right transport
//!
//! Business logic (WHAT to print) stays in application code:
//! - Sale receipts and printer self-test pages → optica-print
//!
//! ## Example
//!
//! ```ignore
//! use optica_printer::{Dispatcher, EscPosBuilder};
//!
//! // Build ESC/POS content
//! let mut builder = EscPosBuilder::new(32);
//! builder.center();
//! builder.bold();
//! builder.line("ÓTICA CENTRAL");
//! builder.bold_off();
//! builder.left();
//! builder.line("Sale #42");
//! builder.feed(3);
//! builder.cut();
//! let doc = builder.build();
//!
//! // Deliver to a raw socket printer (port defaults to 9100)
//! let dispatcher = Dispatcher::default();
//! dispatcher.deliver("192.168.1.50", &doc.to_bytes()).await?;
//!
//! // Or to a shared spooler queue
//! dispatcher.deliver(r"\\LOJA-PC\Termica", &doc.to_bytes()).await?;
//! ```

mod dispatch;
mod document;
mod encoding;
mod error;
mod escpos;
mod printer;
mod spooler;

// Re-exports
pub use dispatch::{DEFAULT_PORT, Dispatcher, Target};
pub use document::ComposedDocument;
pub use encoding::{encode_latin, latin_width, pad_latin, truncate_latin};
pub use error::{DeliveryError, DeliveryErrorKind, DeliveryResult, SpoolError};
pub use escpos::EscPosBuilder;
pub use printer::{NetworkPrinter, Printer, SharePrinter};
pub use spooler::{
    JOB_ABORTED, JobControl, LpSpooler, NoopSpooler, ShareTransport, default_spooler,
};

#[cfg(windows)]
pub use spooler::WindowsSpooler;
