//! Print spooler backends for share-addressed printers
//!
//! Supports:
//! - Windows driver printers (via Win32 spooler API, RAW datatype)
//! - CUPS queues (via `lp -o raw`)
//! - No spooler at all (every submission is rejected)

use crate::error::SpoolError;
use std::io::{Read, Write};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Error code reported for a job killed at its deadline or on cancellation
pub const JOB_ABORTED: u32 = 1223;

/// How often a running `lp` child is checked against its job control
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Deadline and cancellation flag shared by one spooler submission
///
/// Clones share the flag, so the async side can cancel a job that runs on
/// the blocking pool.
#[derive(Debug, Clone)]
pub struct JobControl {
    timeout: Duration,
    deadline: Instant,
    cancelled: Arc<AtomicBool>,
}

impl JobControl {
    pub fn new(timeout: Duration) -> Self {
        let now = Instant::now();
        Self {
            timeout,
            // Out-of-range timeouts clamp to a day
            deadline: now
                .checked_add(timeout)
                .unwrap_or(now + Duration::from_secs(86_400)),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Cancelled, or past the deadline
    pub fn is_expired(&self) -> bool {
        self.is_cancelled() || Instant::now() >= self.deadline
    }
}

/// Capability for submitting a raw job to a named spooler queue
///
/// Submission is blocking and all-or-nothing: a job is either accepted in
/// full or rejected with the platform error code.
pub trait ShareTransport: Send + Sync {
    /// Submit raw printer bytes to the queue called `name`
    fn submit(&self, name: &str, data: &[u8]) -> Result<(), SpoolError>;

    /// Submit under a deadline
    ///
    /// Backends that can abort a running job override this. The default
    /// ignores `control`: a Win32 spooler call cannot be interrupted once
    /// started, so the caller's timeout only stops waiting for it.
    fn submit_controlled(
        &self,
        name: &str,
        data: &[u8],
        _control: &JobControl,
    ) -> Result<(), SpoolError> {
        self.submit(name, data)
    }

    /// Whether the backend can resolve a queue called `name`
    fn is_known(&self, _name: &str) -> bool {
        true
    }
}

/// Pick the spooler backend for the current platform
pub fn default_spooler() -> Arc<dyn ShareTransport> {
    #[cfg(windows)]
    {
        Arc::new(WindowsSpooler)
    }
    #[cfg(not(windows))]
    {
        Arc::new(LpSpooler::default())
    }
}

/// Backend for machines without a spooler
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSpooler;

impl NoopSpooler {
    /// Error code reported for every submission
    pub const ERROR_CODE: u32 = 0;
}

impl ShareTransport for NoopSpooler {
    fn submit(&self, name: &str, _data: &[u8]) -> Result<(), SpoolError> {
        debug!(queue = name, "No spooler configured, rejecting job");
        Err(SpoolError::new(
            Self::ERROR_CODE,
            "no print spooler configured",
        ))
    }

    fn is_known(&self, _name: &str) -> bool {
        false
    }
}

/// CUPS backend using the `lp` command line client
///
/// Queue lookups use `lpstat` from the same directory as the `lp` program.
#[derive(Debug, Clone)]
pub struct LpSpooler {
    program: String,
    status_program: String,
}

impl LpSpooler {
    /// Use a specific `lp` executable
    pub fn with_program(program: impl Into<String>) -> Self {
        let program = program.into();
        let status_program = match Path::new(&program).parent() {
            Some(dir) if !dir.as_os_str().is_empty() => {
                dir.join("lpstat").to_string_lossy().into_owned()
            }
            _ => "lpstat".to_string(),
        };
        Self {
            program,
            status_program,
        }
    }

    /// Use a specific `lpstat` executable for queue lookups
    pub fn with_status_program(mut self, program: impl Into<String>) -> Self {
        self.status_program = program.into();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn status_program(&self) -> &str {
        &self.status_program
    }

    fn os_error(&self, action: &str, e: std::io::Error) -> SpoolError {
        SpoolError::new(
            e.raw_os_error().unwrap_or_default() as u32,
            format!("{} {}: {}", self.program, action, e),
        )
    }

    fn run(
        &self,
        name: &str,
        data: &[u8],
        control: Option<&JobControl>,
    ) -> Result<(), SpoolError> {
        let mut child = Command::new(&self.program)
            .args(["-d", name, "-o", "raw"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.os_error("could not be started", e))?;

        // Dropping stdin closes the pipe so lp sees end of job
        if let Some(mut stdin) = child.stdin.take()
            && let Err(e) = stdin.write_all(data)
        {
            // lp exits early on unknown queues; its status tells why
            warn!(queue = name, error = %e, "Writing job to lp failed");
        }

        let status = match control {
            Some(control) => self.wait_controlled(&mut child, name, control)?,
            None => child.wait().map_err(|e| self.os_error("wait failed", e))?,
        };

        if status.success() {
            return Ok(());
        }

        let mut stderr = String::new();
        if let Some(mut pipe) = child.stderr.take() {
            let _ = pipe.read_to_string(&mut stderr);
        }
        let code = status.code().map(|c| c as u32).unwrap_or(1);
        Err(SpoolError::new(code, stderr.trim()))
    }

    fn wait_controlled(
        &self,
        child: &mut Child,
        name: &str,
        control: &JobControl,
    ) -> Result<std::process::ExitStatus, SpoolError> {
        loop {
            if let Some(status) = child
                .try_wait()
                .map_err(|e| self.os_error("wait failed", e))?
            {
                return Ok(status);
            }

            if control.is_expired() {
                warn!(queue = name, "Killing lp job past its deadline");
                if let Err(e) = child.kill() {
                    warn!(queue = name, error = %e, "Killing lp failed");
                }
                let _ = child.wait();
                let reason = if control.is_cancelled() {
                    "cancelled"
                } else {
                    "deadline passed"
                };
                return Err(SpoolError::new(
                    JOB_ABORTED,
                    format!("{} killed: {}", self.program, reason),
                ));
            }

            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Default for LpSpooler {
    fn default() -> Self {
        Self::with_program("lp")
    }
}

impl ShareTransport for LpSpooler {
    fn submit(&self, name: &str, data: &[u8]) -> Result<(), SpoolError> {
        self.run(name, data, None)
    }

    fn submit_controlled(
        &self,
        name: &str,
        data: &[u8],
        control: &JobControl,
    ) -> Result<(), SpoolError> {
        self.run(name, data, Some(control))
    }

    fn is_known(&self, name: &str) -> bool {
        Command::new(&self.status_program)
            .args(["-p", name])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

/// Windows driver printer spooler
///
/// Uses Win32 API to print through installed printer drivers.
#[cfg(windows)]
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsSpooler;

#[cfg(windows)]
impl WindowsSpooler {
    fn to_wide(s: &str) -> Vec<u16> {
        s.encode_utf16().chain(std::iter::once(0)).collect()
    }

    fn last_error(context: &str) -> SpoolError {
        use windows::Win32::Foundation::GetLastError;

        let code = unsafe { GetLastError() };
        SpoolError::new(code.0, format!("{} failed", context))
    }
}

#[cfg(windows)]
impl ShareTransport for WindowsSpooler {
    fn submit(&self, name: &str, data: &[u8]) -> Result<(), SpoolError> {
        use core::ffi::c_void;
        use windows::Win32::Graphics::Printing::{
            ClosePrinter, DOC_INFO_1W, EndDocPrinter, EndPagePrinter, OpenPrinterW, PRINTER_HANDLE,
            StartDocPrinterW, StartPagePrinter, WritePrinter,
        };
        use windows::core::{PCWSTR, PWSTR};

        unsafe {
            let mut handle: PRINTER_HANDLE = PRINTER_HANDLE::default();
            let name_w = Self::to_wide(name);

            if OpenPrinterW(PCWSTR::from_raw(name_w.as_ptr()), &mut handle, None).is_err() {
                return Err(Self::last_error("OpenPrinterW"));
            }

            let doc_name_w = Self::to_wide("Optica Receipt");
            let datatype_w = Self::to_wide("RAW");
            let doc_info = DOC_INFO_1W {
                pDocName: PWSTR(doc_name_w.as_ptr() as *mut _),
                pOutputFile: PWSTR::null(),
                pDatatype: PWSTR(datatype_w.as_ptr() as *mut _),
            };

            if StartDocPrinterW(handle, 1, &doc_info as *const DOC_INFO_1W) == 0 {
                let err = Self::last_error("StartDocPrinter");
                let _ = ClosePrinter(handle);
                return Err(err);
            }

            if !StartPagePrinter(handle).as_bool() {
                let err = Self::last_error("StartPagePrinter");
                let _ = EndDocPrinter(handle);
                let _ = ClosePrinter(handle);
                return Err(err);
            }

            let mut written: u32 = 0;
            let ok = WritePrinter(
                handle,
                data.as_ptr() as *const c_void,
                data.len() as u32,
                &mut written,
            );
            let write_err = (!ok.as_bool()).then(|| Self::last_error("WritePrinter"));

            let _ = EndPagePrinter(handle);
            let _ = EndDocPrinter(handle);
            let _ = ClosePrinter(handle);

            if let Some(err) = write_err {
                return Err(err);
            }

            if written != data.len() as u32 {
                return Err(SpoolError::new(
                    0,
                    format!("Incomplete write: {} of {} bytes", written, data.len()),
                ));
            }

            Ok(())
        }
    }

    fn is_known(&self, name: &str) -> bool {
        use windows::Win32::Graphics::Printing::{ClosePrinter, OpenPrinterW, PRINTER_HANDLE};
        use windows::core::PCWSTR;

        unsafe {
            let mut handle: PRINTER_HANDLE = PRINTER_HANDLE::default();
            let name_w = Self::to_wide(name);
            if OpenPrinterW(PCWSTR::from_raw(name_w.as_ptr()), &mut handle, None).is_err() {
                return false;
            }
            let _ = ClosePrinter(handle);
            true
        }
    }
}
