//! End-to-end print flow: catalog → service → renderer → dispatcher → device

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use optica_print::{
    ClientRef, InMemoryCatalog, LineItem, PrintService, PrintServiceError, PrinterDescriptor,
    ReceiptRenderer, SaleRecord,
};
use optica_printer::{Dispatcher, NoopSpooler, ShareTransport, SpoolError};
use rust_decimal::Decimal;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn printer(id: i64, connection_path: &str) -> PrinterDescriptor {
    PrinterDescriptor {
        id,
        name: "Balcao".to_string(),
        model: "TM-T20".to_string(),
        serial_number: "X5E0012345".to_string(),
        connection_path: connection_path.to_string(),
        is_active: true,
    }
}

fn lens_and_frame_sale() -> SaleRecord {
    SaleRecord {
        id: 42,
        sale_date: NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap(),
        client: Some(ClientRef {
            id: 3,
            name: "Maria Souza".to_string(),
        }),
        total_value: d("270.00"),
        entry_value: d("50.00"),
        items: vec![
            LineItem {
                product_name: Some("Lens".to_string()),
                quantity: 2,
                unit_price: d("75.00"),
                line_total: d("150.00"),
            },
            LineItem {
                product_name: Some("Frame".to_string()),
                quantity: 1,
                unit_price: d("150.00"),
                line_total: d("150.00"),
            },
        ],
    }
}

/// Accept `jobs` connections and return each job's bytes
async fn fake_printer(jobs: usize) -> (u16, tokio::task::JoinHandle<Vec<Vec<u8>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let mut received = Vec::new();
        for _ in 0..jobs {
            let (mut conn, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            conn.read_to_end(&mut buf).await.unwrap();
            received.push(buf);
        }
        received
    });

    (port, handle)
}

/// Spooler that only knows the short queue name
#[derive(Default)]
struct LocalQueueSpooler {
    jobs: Mutex<Vec<(String, Vec<u8>)>>,
}

impl ShareTransport for LocalQueueSpooler {
    fn submit(&self, name: &str, data: &[u8]) -> Result<(), SpoolError> {
        if name != "Termica" {
            return Err(SpoolError::new(1801, "The printer name is invalid"));
        }
        self.jobs
            .lock()
            .unwrap()
            .push((name.to_string(), data.to_vec()));
        Ok(())
    }
}

#[tokio::test]
async fn prints_sale_over_socket() {
    let (port, device) = fake_printer(1).await;
    let catalog = InMemoryCatalog::new()
        .with_printer(printer(1, &format!("127.0.0.1:{}", port)))
        .with_sale(lens_and_frame_sale());
    let service = PrintService::new(
        catalog,
        ReceiptRenderer::default(),
        Dispatcher::new(Arc::new(NoopSpooler)),
    );

    service.print_sale(42, 1).await.unwrap();

    let jobs = device.await.unwrap();
    let expected = service.render_sale(42).await.unwrap().to_bytes();
    assert_eq!(jobs[0], expected);

    let text = String::from_utf8_lossy(&jobs[0]);
    assert!(text.contains("SUBTOTAL: R$ 300.00\n"));
    assert!(text.contains("DISCOUNT: R$ 30.00\n"));
    assert!(text.contains("REMAINING: R$ 220.00\n"));
}

#[tokio::test]
async fn self_test_over_share_falls_back_to_queue_name() {
    let spooler = Arc::new(LocalQueueSpooler::default());
    let catalog = InMemoryCatalog::new().with_printer(printer(2, r"\\LOJA-PC\Termica"));
    let service = PrintService::new(
        catalog,
        ReceiptRenderer::default(),
        Dispatcher::new(spooler.clone()),
    );

    service.run_self_test(2).await.unwrap();

    let jobs = spooler.jobs.lock().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].0, "Termica");
    assert!(String::from_utf8_lossy(&jobs[0].1).contains("PRINTER TEST"));
}

#[tokio::test]
async fn unreachable_printer_reports_transport_failure() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let catalog = InMemoryCatalog::new()
        .with_printer(printer(3, &format!("127.0.0.1:{}", port)))
        .with_sale(lens_and_frame_sale());
    let service = PrintService::new(
        catalog,
        ReceiptRenderer::default(),
        Dispatcher::new(Arc::new(NoopSpooler)).with_timeout(Duration::from_secs(2)),
    );

    let err = tokio::time::timeout(Duration::from_secs(5), service.print_sale(42, 3))
        .await
        .expect("delivery must respect its own timeout")
        .unwrap_err();

    match &err {
        PrintServiceError::Delivery(e) => {
            assert!(e.is_transport_failure());
            assert!(err.to_string().starts_with("printing failed: "));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn concurrent_jobs_share_nothing() {
    let (port, device) = fake_printer(4).await;
    let catalog = InMemoryCatalog::new()
        .with_printer(printer(1, &format!("127.0.0.1:{}", port)))
        .with_sale(lens_and_frame_sale());
    let service = PrintService::new(
        catalog,
        ReceiptRenderer::default(),
        Dispatcher::new(Arc::new(NoopSpooler)),
    );

    let results = print_four_times(&service).await;
    assert!(results.iter().all(Result::is_ok));

    let jobs = device.await.unwrap();
    assert_eq!(jobs.len(), 4);
    assert!(jobs.windows(2).all(|w| w[0] == w[1]));
}

async fn print_four_times(
    service: &PrintService<InMemoryCatalog>,
) -> Vec<Result<(), PrintServiceError>> {
    let (a, b, c, e) = tokio::join!(
        service.print_sale(42, 1),
        service.print_sale(42, 1),
        service.print_sale(42, 1),
        service.print_sale(42, 1),
    );
    vec![a, b, c, e]
}
