use actix_web::{
    get,
    http::header::{CACHE_CONTROL, CONTENT_TYPE},
    web::{Data, Query, ServiceConfig},
    HttpResponse,
};

use super::models::ScanRequest;
use super::service::ScanService;
use crate::scanner::ScanError;

#[get("/scan")]
async fn scan(
    service: Data<ScanService>,
    request: Query<ScanRequest>,
) -> Result<HttpResponse, ScanError> {
    let image = service.scan(request.into_inner()).await?;

    Ok(HttpResponse::Ok()
        .insert_header((CACHE_CONTROL, "no-cache, no-store, must-revalidate"))
        .insert_header((CONTENT_TYPE, image.mime_type))
        .body(image.bytes))
}

pub fn scan_config(config: &mut ServiceConfig) {
    config.service(scan);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::validation::query_config;
    use crate::config::Config;
    use actix_web::{http::StatusCode, test, App};
    use std::time::Duration;

    fn service(command: &str) -> Data<ScanService> {
        Data::new(ScanService::new(Config {
            device: String::new(),
            command: command.to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            log_dir: "logs".to_string(),
            scan_timeout: Some(Duration::from_secs(10)),
            max_scan_size: None,
            device_lock_timeout: Duration::ZERO,
        }))
    }

    #[actix_web::test]
    async fn bad_resolution_is_bad_request() {
        let app = test::init_service(
            App::new()
                .app_data(service("/nonexistent/scanimage"))
                .app_data(query_config())
                .configure(scan_config),
        )
        .await;

        let req = test::TestRequest::get().uri("/scan?resolution=999").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "client error: unsupported resolution `999`");
    }

    #[actix_web::test]
    async fn malformed_query_is_bad_request() {
        let app = test::init_service(
            App::new()
                .app_data(service("/nonexistent/scanimage"))
                .app_data(query_config())
                .configure(scan_config),
        )
        .await;

        let req = test::TestRequest::get().uri("/scan?resolution=high").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid query parameters");
        assert!(body["fields"]["message"].is_string());
    }

    #[actix_web::test]
    async fn missing_program_is_server_error() {
        let app = test::init_service(
            App::new()
                .app_data(service("/nonexistent/scanimage"))
                .configure(scan_config),
        )
        .await;

        let req = test::TestRequest::get().uri("/scan").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: serde_json::Value = test::read_body_json(resp).await;
        let error = body["error"].as_str().unwrap();
        assert!(error.starts_with("scan error: cannot start"), "{}", error);
    }

    #[cfg(unix)]
    #[actix_web::test]
    async fn scan_streams_image_without_caching() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("fake-scanimage");
        std::fs::write(&path, "#!/bin/sh\nprintf 'P6 image'\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        let app = test::init_service(
            App::new()
                .app_data(service(&path.to_string_lossy()))
                .configure(scan_config),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/scan?format=pnm&resolution=75&mode=gray&gamma=1.0")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(CACHE_CONTROL).unwrap(),
            "no-cache, no-store, must-revalidate"
        );
        assert_eq!(
            resp.headers().get(CONTENT_TYPE).unwrap(),
            "image/x-portable-anymap"
        );
        assert_eq!(test::read_body(resp).await.as_ref(), b"P6 image");
    }
}
