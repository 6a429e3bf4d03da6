//! Printer adapters for sending ESC/POS data
//!
//! Supports:
//! - Network printers (raw TCP, port 9100)
//! - Share printers (spooler queue, see [`ShareTransport`])

use crate::error::{DeliveryError, DeliveryResult};
use crate::spooler::{JobControl, ShareTransport};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{info, instrument, warn};

/// Default bound on a single delivery
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// Extra wait for a spooler backend to kill its own job at the deadline
const ABORT_GRACE: Duration = Duration::from_millis(500);

/// Trait for printer adapters
#[allow(async_fn_in_trait)]
pub trait Printer {
    /// Send raw ESC/POS data to the printer
    async fn print(&self, data: &[u8]) -> DeliveryResult<()>;

    /// Check if the printer is online/reachable
    async fn is_online(&self) -> bool;
}

/// Network printer (TCP port 9100)
///
/// Most thermal printers support raw TCP printing on port 9100. A fresh
/// connection is opened for every job and closed when the job ends.
#[derive(Debug, Clone)]
pub struct NetworkPrinter {
    host: String,
    port: u16,
    timeout: Duration,
}

impl NetworkPrinter {
    /// Create a new network printer
    ///
    /// `host` may be an IP address or a resolvable host name.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set delivery timeout (connect + write)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    fn addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    async fn send(&self, data: &[u8]) -> DeliveryResult<()> {
        let mut stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|e| DeliveryError::transport(format!("{}: {}", self.addr(), e)))?;

        info!("Connected, sending {} bytes", data.len());

        stream
            .write_all(data)
            .await
            .map_err(|e| DeliveryError::transport(format!("Write failed: {}", e)))?;
        stream
            .flush()
            .await
            .map_err(|e| DeliveryError::transport(format!("Flush failed: {}", e)))?;

        // Data is already written; a failed FIN is not a failed job
        if let Err(e) = stream.shutdown().await {
            warn!(error = %e, "Socket shutdown failed");
        }

        Ok(())
    }
}

impl Printer for NetworkPrinter {
    #[instrument(skip(self, data), fields(addr = %self.addr(), data_len = data.len()))]
    async fn print(&self, data: &[u8]) -> DeliveryResult<()> {
        info!("Connecting to printer");

        // The stream lives inside `send`; a timeout drops that future and
        // the socket with it.
        tokio::time::timeout(self.timeout, self.send(data))
            .await
            .map_err(|_| timed_out(self.timeout, &self.addr()))??;

        info!("Print job sent successfully");
        Ok(())
    }

    #[instrument(skip(self), fields(addr = %self.addr()))]
    async fn is_online(&self) -> bool {
        let check_timeout = Duration::from_millis(500);

        match tokio::time::timeout(
            check_timeout,
            TcpStream::connect((self.host.as_str(), self.port)),
        )
        .await
        {
            Ok(Ok(_)) => {
                info!("Printer online");
                true
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Printer offline");
                false
            }
            Err(_) => {
                warn!("Printer check timeout");
                false
            }
        }
    }
}

/// Printer reached through a spooler share path
///
/// The full path is tried first. If the spooler rejects it, the job is
/// resubmitted once under the last path segment, which is the only part a
/// local queue is usually registered under.
#[derive(Clone)]
pub struct SharePrinter {
    path: String,
    spooler: Arc<dyn ShareTransport>,
    timeout: Duration,
}

impl SharePrinter {
    pub fn new(path: impl Into<String>, spooler: Arc<dyn ShareTransport>) -> Self {
        Self {
            path: path.into(),
            spooler,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set submission timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Queue name used for the fallback attempt
    pub fn short_name(&self) -> &str {
        last_segment(&self.path)
    }
}

impl std::fmt::Debug for SharePrinter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharePrinter")
            .field("path", &self.path)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Text after the last `\` or `/`
pub(crate) fn last_segment(path: &str) -> &str {
    path.rsplit(['\\', '/']).next().unwrap_or(path)
}

fn timed_out(timeout: Duration, target: &str) -> DeliveryError {
    DeliveryError::transport(format!(
        "Timed out after {}ms: {}",
        timeout.as_millis(),
        target
    ))
}

fn submit_with_fallback(
    spooler: &dyn ShareTransport,
    path: &str,
    data: &[u8],
    control: &JobControl,
) -> DeliveryResult<()> {
    let first = match spooler.submit_controlled(path, data, control) {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };

    if control.is_expired() {
        return Err(timed_out(control.timeout(), path));
    }

    let short = last_segment(path);
    if short.is_empty() || short == path {
        return Err(DeliveryError::transport(format!(
            "Spooler rejected {}: error code {} ({})",
            path, first.code, first.message
        )));
    }

    warn!(
        path = path,
        queue = short,
        code = first.code,
        "Spooler rejected full path, retrying with queue name"
    );

    match spooler.submit_controlled(short, data, control) {
        Ok(()) => Ok(()),
        Err(_) if control.is_expired() => Err(timed_out(control.timeout(), path)),
        Err(e) => Err(DeliveryError::transport(format!(
            "Spooler rejected {}: error code {} ({})",
            short, e.code, e.message
        ))),
    }
}

/// Cancels the spooler job when the delivery future goes away
struct CancelOnDrop(JobControl);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

impl Printer for SharePrinter {
    /// Spool the job, bounded by the printer timeout
    ///
    /// Backends that support it (`lp`) kill the job at the deadline or when
    /// this future is dropped. A Win32 spooler call cannot be aborted; the
    /// timeout then only stops waiting for it.
    #[instrument(skip(self, data), fields(path = %self.path, data_len = data.len()))]
    async fn print(&self, data: &[u8]) -> DeliveryResult<()> {
        let control = JobControl::new(self.timeout);
        let _guard = CancelOnDrop(control.clone());

        // Spooler calls are synchronous, run in blocking task
        let spooler = Arc::clone(&self.spooler);
        let path = self.path.clone();
        let data = data.to_vec();

        let job = tokio::task::spawn_blocking(move || {
            submit_with_fallback(spooler.as_ref(), &path, &data, &control)
        });

        tokio::time::timeout(self.timeout.saturating_add(ABORT_GRACE), job)
            .await
            .map_err(|_| timed_out(self.timeout, &self.path))?
            .map_err(|e| DeliveryError::transport(format!("Spooler task failed: {}", e)))??;

        info!("Print job spooled successfully");
        Ok(())
    }

    async fn is_online(&self) -> bool {
        let spooler = Arc::clone(&self.spooler);
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || {
            spooler.is_known(&path) || spooler.is_known(last_segment(&path))
        })
        .await
        .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpoolError;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Instant;
    use tokio::net::TcpListener;

    /// Spooler that only accepts the listed queue names
    struct RecordingSpooler {
        accepts: Vec<&'static str>,
        attempts: Mutex<Vec<String>>,
    }

    impl RecordingSpooler {
        fn new(accepts: &[&'static str]) -> Arc<Self> {
            Arc::new(Self {
                accepts: accepts.to_vec(),
                attempts: Mutex::new(Vec::new()),
            })
        }

        fn attempts(&self) -> Vec<String> {
            self.attempts.lock().unwrap().clone()
        }
    }

    impl ShareTransport for RecordingSpooler {
        fn submit(&self, name: &str, _data: &[u8]) -> Result<(), SpoolError> {
            self.attempts.lock().unwrap().push(name.to_string());
            if self.accepts.contains(&name) {
                Ok(())
            } else {
                Err(SpoolError::new(1801, "invalid printer name"))
            }
        }
    }

    #[test]
    fn test_network_printer_new() {
        let printer = NetworkPrinter::new("192.168.1.100", 9100);
        assert_eq!(printer.port(), 9100);
        assert_eq!(printer.addr(), "192.168.1.100:9100");
    }

    #[test]
    fn test_ipv6_addr_is_bracketed() {
        let printer = NetworkPrinter::new("::1", 9100);
        assert_eq!(printer.addr(), "[::1]:9100");
    }

    #[test]
    fn test_last_segment() {
        assert_eq!(last_segment(r"\\LOJA-PC\Termica"), "Termica");
        assert_eq!(last_segment("//loja/termica"), "termica");
        assert_eq!(last_segment("Termica"), "Termica");
        assert_eq!(last_segment(r"\\LOJA-PC\"), "");
    }

    #[tokio::test]
    async fn test_share_first_attempt_succeeds() {
        let spooler = RecordingSpooler::new(&[r"\\LOJA-PC\Termica"]);
        let printer = SharePrinter::new(r"\\LOJA-PC\Termica", spooler.clone());

        printer.print(b"job").await.unwrap();
        assert_eq!(spooler.attempts(), vec![r"\\LOJA-PC\Termica".to_string()]);
    }

    #[tokio::test]
    async fn test_share_falls_back_to_queue_name() {
        let spooler = RecordingSpooler::new(&["Termica"]);
        let printer = SharePrinter::new(r"\\LOJA-PC\Termica", spooler.clone());

        printer.print(b"job").await.unwrap();
        assert_eq!(
            spooler.attempts(),
            vec![r"\\LOJA-PC\Termica".to_string(), "Termica".to_string()]
        );
    }

    #[tokio::test]
    async fn test_share_both_attempts_fail() {
        let spooler = RecordingSpooler::new(&[]);
        let printer = SharePrinter::new(r"\\LOJA-PC\Termica", spooler.clone());

        let err = printer.print(b"job").await.unwrap_err();
        assert!(err.is_transport_failure());
        assert!(err.detail.contains("1801"));
        assert_eq!(spooler.attempts().len(), 2);
    }

    #[tokio::test]
    async fn test_share_without_segment_is_not_retried() {
        let spooler = RecordingSpooler::new(&[]);
        let printer = SharePrinter::new(r"\\LOJA-PC\", spooler.clone());

        assert!(printer.print(b"job").await.is_err());
        assert_eq!(spooler.attempts().len(), 1);
    }

    /// Spooler whose submission blocks and cannot be interrupted
    struct StuckSpooler;

    impl ShareTransport for StuckSpooler {
        fn submit(&self, _name: &str, _data: &[u8]) -> Result<(), SpoolError> {
            std::thread::sleep(Duration::from_secs(2));
            Ok(())
        }
    }

    /// Spooler that runs until its job control stops it
    #[derive(Default)]
    struct AbortableSpooler {
        attempts: Mutex<Vec<String>>,
        saw_cancel: AtomicBool,
    }

    impl ShareTransport for AbortableSpooler {
        fn submit(&self, _name: &str, _data: &[u8]) -> Result<(), SpoolError> {
            unreachable!("only controlled submissions are used")
        }

        fn submit_controlled(
            &self,
            name: &str,
            _data: &[u8],
            control: &JobControl,
        ) -> Result<(), SpoolError> {
            self.attempts.lock().unwrap().push(name.to_string());
            while !control.is_expired() {
                std::thread::sleep(Duration::from_millis(10));
            }
            if control.is_cancelled() {
                self.saw_cancel.store(true, Ordering::SeqCst);
            }
            Err(SpoolError::new(crate::spooler::JOB_ABORTED, "aborted"))
        }
    }

    #[tokio::test]
    async fn test_socket_write_times_out() {
        // Listener that never accepts: connect succeeds, the write stalls
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let printer =
            NetworkPrinter::new("127.0.0.1", port).with_timeout(Duration::from_millis(300));
        let payload = vec![0u8; 64 * 1024 * 1024];
        let started = Instant::now();
        let err = printer.print(&payload).await.unwrap_err();

        assert!(err.is_transport_failure());
        assert!(err.detail.starts_with("Timed out after 300ms"), "{}", err.detail);
        assert!(started.elapsed() < Duration::from_secs(2));
        drop(listener);
    }

    #[tokio::test]
    async fn test_share_times_out_on_stuck_spooler() {
        let printer = SharePrinter::new(r"\\LOJA-PC\Termica", Arc::new(StuckSpooler))
            .with_timeout(Duration::from_millis(200));
        let started = Instant::now();
        let err = printer.print(b"job").await.unwrap_err();

        assert!(err.is_transport_failure());
        assert_eq!(err.detail, r"Timed out after 200ms: \\LOJA-PC\Termica");
        assert!(started.elapsed() < Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_share_deadline_skips_fallback() {
        let spooler = Arc::new(AbortableSpooler::default());
        let printer = SharePrinter::new(r"\\LOJA-PC\Termica", spooler.clone())
            .with_timeout(Duration::from_millis(100));

        let err = printer.print(b"job").await.unwrap_err();
        assert!(err.detail.starts_with("Timed out after 100ms"));
        assert_eq!(spooler.attempts.lock().unwrap().len(), 1);
        assert!(!spooler.saw_cancel.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_dropped_share_delivery_cancels_job() {
        let spooler = Arc::new(AbortableSpooler::default());
        let printer = SharePrinter::new(r"\\LOJA-PC\Termica", spooler.clone())
            .with_timeout(Duration::from_secs(10));

        let abandoned =
            tokio::time::timeout(Duration::from_millis(100), printer.print(b"job")).await;
        assert!(abandoned.is_err());

        let started = Instant::now();
        while !spooler.saw_cancel.load(Ordering::SeqCst) {
            assert!(started.elapsed() < Duration::from_secs(2), "job was not cancelled");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}
