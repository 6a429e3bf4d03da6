//! `optica-print` command line: self-test, sale receipts, status and offline rendering

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use optica_print::{
    Config, InMemoryCatalog, PrintService, ReceiptRenderer, init_logger_with_file,
};
use optica_printer::Dispatcher;

#[derive(Parser)]
#[command(name = "optica-print", version)]
#[command(about = "Receipt and self-test printing for thermal printers")]
struct Cli {
    /// JSON export with printers and sales
    #[arg(long, env = "CATALOG_PATH", default_value = "catalog.json")]
    catalog: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a self-test page
    SelfTest { printer_id: i64 },
    /// Print a sale receipt
    Sale { sale_id: i64, printer_id: i64 },
    /// Check whether a printer answers
    Status { printer_id: i64 },
    /// Render a sale receipt to a file instead of a printer
    Render {
        sale_id: i64,
        #[arg(long)]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env();
    init_logger_with_file(&config.log_level, config.log_json, config.log_dir.as_deref())?;

    let catalog = InMemoryCatalog::from_json_file(&cli.catalog)?;
    tracing::info!(
        catalog = %cli.catalog.display(),
        printers = catalog.printer_count(),
        sales = catalog.sale_count(),
        "Catalog loaded"
    );

    let dispatcher = Dispatcher::new(config.spooler()).with_timeout(config.print_timeout());
    let renderer = ReceiptRenderer::new(config.layout.clone(), config.shop.clone());
    let service = PrintService::new(catalog, renderer, dispatcher);

    let result = match cli.command {
        Command::SelfTest { printer_id } => service
            .run_self_test(printer_id)
            .await
            .map(|()| "test page printed".to_string()),
        Command::Sale {
            sale_id,
            printer_id,
        } => service
            .print_sale(sale_id, printer_id)
            .await
            .map(|()| format!("sale #{} printed", sale_id)),
        Command::Status { printer_id } => service
            .printer_status(printer_id)
            .await
            .map(|online| if online { "online" } else { "offline" }.to_string()),
        Command::Render { sale_id, out } => match service.render_sale(sale_id).await {
            Ok(doc) => {
                std::fs::write(&out, doc.to_bytes())?;
                Ok(format!("{} bytes written to {}", doc.len(), out.display()))
            }
            Err(e) => Err(e),
        },
    };

    match result {
        Ok(message) => {
            println!("{}", message);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("{}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}
