use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use tracing::{error, info, warn};

use crate::api::validation::ErrorResponse;
use crate::config::Config;
use crate::scanner::{DeviceLocks, ScanError, ScanJob};
use super::models::{ScanRequest, ScannedImage};

impl ResponseError for ScanError {
    fn status_code(&self) -> StatusCode {
        match self {
            ScanError::Parameter(_) => StatusCode::BAD_REQUEST,
            ScanError::Execution(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ScanError::Parameter(_) => warn!("Invalid scan parameters: {}", self.message()),
            ScanError::Execution(_) => error!("Scan failed: {}", self.message()),
        }
        HttpResponse::build(self.status_code()).json(ErrorResponse::new(self.to_string()))
    }
}

/// Scan service: turns requests into scanner runs
pub struct ScanService {
    config: Config,
    locks: DeviceLocks,
}

impl ScanService {
    /// Create a new ScanService instance
    pub fn new(config: Config) -> Self {
        let locks = DeviceLocks::new(config.device_lock_timeout);
        Self { config, locks }
    }

    /// Scanner executable this service launches
    pub fn command(&self) -> &str {
        &self.config.command
    }

    /// Build the job for one request
    ///
    /// The device and program come from configuration, never from the request.
    pub fn job_for(&self, request: ScanRequest) -> ScanJob {
        let mut job = ScanJob::new();
        job.program = self.config.command.clone();
        job.device = self.config.device.clone();
        job.format = request.format;
        job.resolution = request.resolution;
        job.mode = request.mode;
        job.gamma = request.gamma;
        job.timeout = self.config.scan_timeout;
        job.max_output = self.config.max_scan_size;
        job
    }

    /// Run a single scan
    ///
    /// # Business Logic
    /// - Builds a fresh job from the request and configuration
    /// - Holds the device lock while the scanner runs
    /// - Returns the image bytes with their MIME type
    ///
    /// # Returns
    /// - `Ok(ScannedImage)` - Scan finished
    /// - `Err(ScanError)` - Bad parameters, busy device or scanner failure
    pub async fn scan(&self, request: ScanRequest) -> Result<ScannedImage, ScanError> {
        let mut job = self.job_for(request);

        info!(
            "Service: Scan requested format={:?} resolution={} mode={:?} gamma={}",
            job.format, job.resolution, job.mode, job.gamma
        );

        // Bad parameters must not queue behind a busy device
        job.validate()?;

        let _guard = self.locks.acquire(&job.device).await?;
        let bytes = job.execute().await?;

        info!("Service: Scan completed, {} bytes of {}", bytes.len(), job.mime_type());

        Ok(ScannedImage {
            bytes,
            mime_type: job.mime_type(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(command: &str) -> Config {
        Config {
            device: "epson2:net:192.168.1.5".to_string(),
            command: command.to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            log_dir: "logs".to_string(),
            scan_timeout: Some(Duration::from_secs(30)),
            max_scan_size: Some(1024),
            device_lock_timeout: Duration::ZERO,
        }
    }

    #[test]
    fn job_takes_device_and_program_from_config() {
        let service = ScanService::new(config("/opt/sane/scanimage"));
        let job = service.job_for(ScanRequest {
            format: "tiff".to_string(),
            resolution: 1200,
            mode: "lineart".to_string(),
            gamma: 1.5,
        });

        assert_eq!(job.program, "/opt/sane/scanimage");
        assert_eq!(job.device, "epson2:net:192.168.1.5");
        assert_eq!(job.format, "tiff");
        assert_eq!(job.resolution, 1200);
        assert_eq!(job.timeout, Some(Duration::from_secs(30)));
        assert_eq!(job.max_output, Some(1024));
    }

    #[test]
    fn errors_map_to_status_codes() {
        let client =
            ScanError::from(crate::scanner::error::ParameterError::new("unsupported mode"));
        assert_eq!(client.status_code(), StatusCode::BAD_REQUEST);

        let server =
            ScanError::from(crate::scanner::error::ExecutionError::new("device `x` is busy"));
        assert_eq!(server.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn invalid_request_skips_device_lock() {
        let service = ScanService::new(config("/nonexistent/scanimage"));
        let _held = service.locks.acquire("epson2:net:192.168.1.5").await.unwrap();

        let err = service
            .scan(ScanRequest {
                resolution: 999,
                ..ScanRequest::default()
            })
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn busy_device_is_a_server_error() {
        let service = ScanService::new(config("/nonexistent/scanimage"));
        let _held = service.locks.acquire("epson2:net:192.168.1.5").await.unwrap();

        let err = service.scan(ScanRequest::default()).await.unwrap_err();

        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.to_string(),
            "scan error: device `epson2:net:192.168.1.5` is busy"
        );
    }
}
