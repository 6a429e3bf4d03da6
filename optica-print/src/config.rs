//! Environment configuration for the print service

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use optica_printer::{LpSpooler, NoopSpooler, ShareTransport, default_spooler};
use rust_decimal::Decimal;

use crate::renderer::{ReceiptLayout, ShopInfo};

/// Spooler backend used for share-path printers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpoolerKind {
    /// Platform default: Win32 on Windows, `lp` elsewhere
    Platform,
    Lp,
    None,
}

impl FromStr for SpoolerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "platform" | "windows" => Ok(Self::Platform),
            "lp" | "cups" => Ok(Self::Lp),
            "none" | "noop" => Ok(Self::None),
            other => Err(format!("unknown spooler: {}", other)),
        }
    }
}

/// Print service configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | SHOP_NAME | OTICA | shop name on the receipt header |
/// | SHOP_HEADER_LINES | (empty) | `\|`-separated lines under the name |
/// | RECEIPT_FOOTER_LINES | two disclaimers | `\|`-separated footer lines |
/// | PAPER_WIDTH | 32 | characters per line |
/// | NAME_COLUMN_WIDTH | 16 | product name column |
/// | DISCOUNT_THRESHOLD | 0.01 | discounts at or below are not printed |
/// | PRINT_TIMEOUT_MS | 8000 | delivery timeout |
/// | SPOOLER | platform | platform, lp or none |
/// | LOG_LEVEL | info | log filter |
/// | LOG_JSON | false | JSON log lines |
/// | LOG_DIR | (unset) | rolling log file directory |
#[derive(Debug, Clone)]
pub struct Config {
    pub shop: ShopInfo,
    pub layout: ReceiptLayout,
    pub print_timeout_ms: u64,
    pub spooler: SpoolerKind,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_lines(key: &str) -> Option<Vec<String>> {
    std::env::var(key).ok().map(|v| {
        v.split('|')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    })
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset or unparsable variables fall back to their defaults.
    pub fn from_env() -> Self {
        let shop_defaults = ShopInfo::default();
        let layout_defaults = ReceiptLayout::default();

        Self {
            shop: ShopInfo {
                name: std::env::var("SHOP_NAME").unwrap_or(shop_defaults.name),
                header_lines: env_lines("SHOP_HEADER_LINES").unwrap_or(shop_defaults.header_lines),
                footer_lines: env_lines("RECEIPT_FOOTER_LINES")
                    .unwrap_or(shop_defaults.footer_lines),
            },
            layout: ReceiptLayout {
                width: env_parse::<usize>("PAPER_WIDTH")
                    .filter(|w| *w > 0)
                    .unwrap_or(layout_defaults.width),
                name_column: env_parse::<usize>("NAME_COLUMN_WIDTH")
                    .filter(|w| *w > 0)
                    .unwrap_or(layout_defaults.name_column),
                discount_threshold: env_parse::<Decimal>("DISCOUNT_THRESHOLD")
                    .unwrap_or(layout_defaults.discount_threshold),
            },
            print_timeout_ms: env_parse::<u64>("PRINT_TIMEOUT_MS")
                .filter(|ms| *ms > 0)
                .unwrap_or(8000),
            spooler: env_parse("SPOOLER").unwrap_or(SpoolerKind::Platform),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: env_parse("LOG_JSON").unwrap_or(false),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
        }
    }

    pub fn print_timeout(&self) -> Duration {
        Duration::from_millis(self.print_timeout_ms)
    }

    /// Build the configured spooler backend
    pub fn spooler(&self) -> Arc<dyn ShareTransport> {
        match self.spooler {
            SpoolerKind::Platform => default_spooler(),
            SpoolerKind::Lp => Arc::new(LpSpooler::default()),
            SpoolerKind::None => Arc::new(NoopSpooler),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
