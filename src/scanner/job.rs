use std::fmt::Display;
use std::io;
use std::ops::{Deref, DerefMut};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::error::{ExecutionError, ParameterError, ScanError};

pub const DEFAULT_COMMAND: &str = "scanimage";

pub const AVAILABLE_FORMATS: &[&str] = &["pnm", "tiff", "png", "jpeg"];
pub const DEFAULT_FORMAT: &str = "png";

pub const AVAILABLE_RESOLUTIONS: &[u32] = &[75, 150, 300, 600, 1200];
pub const DEFAULT_RESOLUTION: u32 = 300;

pub const AVAILABLE_MODES: &[&str] = &["color", "gray", "lineart"];
pub const DEFAULT_MODE: &str = "color";

pub const DEFAULT_GAMMA: f64 = 2.2;

/// One scan attempt: the parameters for the external scanner and the
/// machinery to run it once.
///
/// Empty strings and zero values mean "use the default"; [`ScanJob::validate`]
/// fills them in and rejects anything outside the supported sets.
#[derive(Debug, Clone)]
pub struct ScanJob {
    busy: bool,
    /// Executable to launch
    pub program: String,
    /// Scanner device name, empty for the system default
    pub device: String,
    pub format: String,
    pub resolution: u32,
    pub mode: String,
    pub gamma: f64,
    /// Kill the scanner if it runs longer than this
    pub timeout: Option<Duration>,
    /// Reject scans whose output grows beyond this many bytes
    pub max_output: Option<usize>,
}

impl Default for ScanJob {
    fn default() -> Self {
        Self {
            busy: false,
            program: DEFAULT_COMMAND.to_string(),
            device: String::new(),
            format: String::new(),
            resolution: 0,
            mode: String::new(),
            gamma: 0.0,
            timeout: None,
            max_output: None,
        }
    }
}

impl ScanJob {
    /// Create a job that runs `scanimage` with every parameter defaulted
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill in defaults and check every parameter against its allowed set
    ///
    /// Calling it again on an already validated job changes nothing.
    pub fn validate(&mut self) -> Result<(), ParameterError> {
        if self.program.is_empty() {
            return Err(ParameterError::new("no command specified"));
        }

        if self.format.is_empty() {
            self.format = DEFAULT_FORMAT.to_string();
        } else if !AVAILABLE_FORMATS.contains(&self.format.as_str()) {
            return Err(ParameterError::new(format!(
                "unsupported format `{}`",
                self.format
            )));
        }

        if self.resolution == 0 {
            self.resolution = DEFAULT_RESOLUTION;
        } else if !AVAILABLE_RESOLUTIONS.contains(&self.resolution) {
            return Err(ParameterError::new(format!(
                "unsupported resolution `{}`",
                self.resolution
            )));
        }

        if self.mode.is_empty() {
            self.mode = DEFAULT_MODE.to_string();
        } else if !AVAILABLE_MODES.contains(&self.mode.as_str()) {
            return Err(ParameterError::new(format!(
                "unsupported mode `{}`",
                self.mode
            )));
        }

        if self.gamma == 0.0 {
            self.gamma = DEFAULT_GAMMA;
        }

        Ok(())
    }

    /// MIME type of the image the configured format produces
    pub fn mime_type(&self) -> String {
        match self.format.as_str() {
            "" => "image/*".to_string(),
            "pnm" => "image/x-portable-anymap".to_string(),
            format => format!("image/{}", format),
        }
    }

    /// Command-line arguments for the scanner, in a fixed order
    pub fn arguments(&self) -> Vec<String> {
        let mut arguments = vec![
            format!("--resolution={}", self.resolution),
            format!("--mode={}", self.mode),
            format!("--format={}", self.format),
            format!("--gamma={:.6}", self.gamma),
        ];

        if !self.device.is_empty() {
            arguments.push(format!("--device-name={}", self.device));
        }

        arguments
    }

    /// Validate, run the scanner and return everything it wrote to stdout
    ///
    /// # Returns
    /// - `Ok(bytes)` - the scanner exited cleanly; bytes are its raw output
    /// - `Err(ScanError::Parameter)` - validation rejected the job
    /// - `Err(ScanError::Execution)` - the job is already running, or the
    ///   scanner could not be started, failed, timed out or produced too much
    pub async fn execute(&mut self) -> Result<Vec<u8>, ScanError> {
        if self.busy {
            return Err(ExecutionError::new("scanner is already running").into());
        }

        // Cleared on drop, including when this future is cancelled
        let mut running = Running::start(self);
        running.run().await
    }

    async fn run(&mut self) -> Result<Vec<u8>, ScanError> {
        self.validate()?;

        let arguments = self.arguments();

        let mut command = Command::new(&self.program);
        command
            .args(&arguments)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        info!("[CMD] `{} {}`", self.program, arguments.join(" "));

        let mut child = command.spawn().map_err(|e| {
            ExecutionError::new(format!("cannot start `{}`: {}", self.program, e))
        })?;

        // The child is killed when dropped, so every early return below
        // also stops the scanner.
        let captured = match self.timeout {
            Some(limit) => timeout(limit, capture(&mut child, self.max_output))
                .await
                .map_err(|_| {
                    warn!("`{}` still running after {:?}, killing it", self.program, limit);
                    ExecutionError::new(format!(
                        "`{}` timed out after {:?}",
                        self.program, limit
                    ))
                })??,
            None => capture(&mut child, self.max_output).await?,
        };

        let Captured {
            stdout,
            stderr,
            status,
        } = captured;

        if !status.success() {
            return Err(fault(status, &stderr).into());
        }

        debug!("`{}` produced {} bytes", self.program, stdout.len());
        Ok(stdout)
    }
}

/// Marks a job busy for as long as it lives
struct Running<'a> {
    job: &'a mut ScanJob,
}

impl<'a> Running<'a> {
    fn start(job: &'a mut ScanJob) -> Self {
        job.busy = true;
        Self { job }
    }
}

impl Deref for Running<'_> {
    type Target = ScanJob;

    fn deref(&self) -> &ScanJob {
        self.job
    }
}

impl DerefMut for Running<'_> {
    fn deref_mut(&mut self) -> &mut ScanJob {
        self.job
    }
}

impl Drop for Running<'_> {
    fn drop(&mut self) {
        self.job.busy = false;
    }
}

struct Captured {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    status: ExitStatus,
}

/// `<fault> (<stderr>)`, stderr kept verbatim
fn fault(description: impl Display, stderr: &[u8]) -> ExecutionError {
    ExecutionError::new(format!(
        "{} ({})",
        description,
        String::from_utf8_lossy(stderr)
    ))
}

/// Drain both pipes concurrently, then reap the child
async fn capture(child: &mut Child, max_output: Option<usize>) -> Result<Captured, ExecutionError> {
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| ExecutionError::new("scanner stdout was not captured"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| ExecutionError::new("scanner stderr was not captured"))?;

    // Stdout stops after one byte past the cap; its pipe closes with the
    // reader so a scanner still writing gets EPIPE.
    let (stdout, stderr) = tokio::join!(
        read_stream(stdout, max_output),
        read_stream(stderr, None)
    );

    let stderr = stderr.map_err(|e| {
        ExecutionError::new(format!("failed to read scanner errors: {}", e))
    })?;
    let stdout =
        stdout.map_err(|e| fault(format_args!("failed to read scanner output: {}", e), &stderr))?;

    if let Some(limit) = max_output {
        if stdout.len() > limit {
            return Err(ExecutionError::new(format!(
                "scanner output exceeds {} bytes",
                limit
            )));
        }
    }

    let status = child
        .wait()
        .await
        .map_err(|e| fault(format_args!("failed to wait for scanner: {}", e), &stderr))?;

    Ok(Captured {
        stdout,
        stderr,
        status,
    })
}

async fn read_stream<R>(mut reader: R, limit: Option<usize>) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();

    match limit {
        Some(limit) => {
            let cap = (limit as u64).saturating_add(1);
            reader.take(cap).read_to_end(&mut buf).await?;
        }
        None => {
            reader.read_to_end(&mut buf).await?;
        }
    }

    Ok(buf)
}
