use actix_web::{get, web, HttpResponse, Responder};
use serde::Serialize;
use tracing::error;

use crate::api::scan::ScanService;

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scanner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Readiness check endpoint
///
/// Checks that the configured scanner program can be found and executed.
/// Does not probe the device itself.
#[get("/ready")]
async fn readiness_check(service: web::Data<ScanService>) -> impl Responder {
    match which::which(service.command()) {
        Ok(path) => HttpResponse::Ok().json(HealthResponse {
            status: "ready".to_string(),
            scanner: Some(path.display().to_string()),
            error: None,
        }),
        Err(e) => {
            error!("Readiness check failed: scanner `{}` unavailable: {}", service.command(), e);
            HttpResponse::ServiceUnavailable().json(HealthResponse {
                status: "not_ready".to_string(),
                scanner: None,
                error: Some(format!("Scanner `{}` unavailable: {}", service.command(), e)),
            })
        }
    }
}

/// Liveness check endpoint
///
/// Simple check that the process is alive. Does not check dependencies.
#[get("/live")]
async fn liveness_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "alive".to_string(),
        scanner: None,
        error: None,
    })
}

pub fn health_config(config: &mut web::ServiceConfig) {
    config.service(readiness_check).service(liveness_check);
}
