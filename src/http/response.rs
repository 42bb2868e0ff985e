//! HTTP response building module
//!
//! Builders for every response the gateway produces. A builder that fails is
//! logged and replaced with a bare response carrying the same body.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_EXPOSE_HEADERS, SERVER};
use hyper::{Response, StatusCode};

use crate::config::HttpConfig;

/// Methods accepted by the convert endpoint
pub const CONVERT_ALLOW: &str = "POST, OPTIONS";
/// Methods accepted by the health endpoints
pub const HEALTH_ALLOW: &str = "GET, HEAD, OPTIONS";

/// Build `{"error": message}` with the given status
pub fn build_json_error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({ "error": message }).to_string();
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.clone())))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::from(body)))
        })
}

/// Build the processed file download
pub fn build_attachment_response(
    data: Bytes,
    file_name: &str,
    content_type: &str,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    Response::builder()
        .status(200)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .header(
            "Content-Disposition",
            format!("attachment; filename=\"{file_name}\""),
        )
        .header("Cache-Control", "no-cache")
        .body(Full::new(data.clone()))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(data))
        })
}

/// Build 400 Bad Request response with a plain-text reason
pub fn build_400_response(reason: &str) -> Response<Full<Bytes>> {
    build_plain_response(StatusCode::BAD_REQUEST, format!("400 Bad Request: {reason}"))
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    build_plain_response(StatusCode::NOT_FOUND, "404 Not Found".to_string())
}

/// Build 405 Method Not Allowed response
pub fn build_405_response(allow: &'static str) -> Response<Full<Bytes>> {
    let mut response = build_plain_response(
        StatusCode::METHOD_NOT_ALLOWED,
        "405 Method Not Allowed".to_string(),
    );
    response
        .headers_mut()
        .insert("Allow", HeaderValue::from_static(allow));
    response
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<Full<Bytes>> {
    build_plain_response(
        StatusCode::PAYLOAD_TOO_LARGE,
        "413 Payload Too Large".to_string(),
    )
}

/// Build 500 Internal Server Error response; the cause stays in the error log
pub fn build_500_response() -> Response<Full<Bytes>> {
    build_plain_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "500 Internal Server Error".to_string(),
    )
}

/// Build OPTIONS response (preflight request)
pub fn build_options_response(enable_cors: bool, allow: &'static str) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(204).header("Allow", allow);

    if enable_cors {
        builder = builder
            .header("Access-Control-Allow-Methods", allow)
            .header("Access-Control-Allow-Headers", "Content-Type")
            .header("Access-Control-Max-Age", "86400");
    }

    builder.body(Full::new(Bytes::new())).unwrap_or_else(|e| {
        log_build_error("OPTIONS", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Build health check response
pub fn build_health_response(status: &str, is_head: bool) -> Response<Full<Bytes>> {
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(serde_json::json!({ "status": status }).to_string())
    };
    Response::builder()
        .status(200)
        .header("Content-Type", "application/json")
        .header("Cache-Control", "no-cache")
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("health", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Stamp headers every response carries: `Server` and, when enabled, CORS
pub fn apply_common_headers(response: &mut Response<Full<Bytes>>, http_config: &HttpConfig) {
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&http_config.server_name) {
        headers.insert(SERVER, value);
    }
    if http_config.enable_cors {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        headers.insert(
            ACCESS_CONTROL_EXPOSE_HEADERS,
            HeaderValue::from_static("Content-Disposition"),
        );
    }
}

fn build_plain_response(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from(body.clone())))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            let mut response = Response::new(Full::new(Bytes::from(body)));
            *response.status_mut() = status;
            response
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_string(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn http_config(enable_cors: bool) -> HttpConfig {
        HttpConfig {
            server_name: "mediagate-test".to_string(),
            enable_cors,
            max_body_size: None,
        }
    }

    #[tokio::test]
    async fn test_json_error_body() {
        let response = build_json_error_response(StatusCode::BAD_REQUEST, "Invalid operation");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()["content-type"], "application/json");
        let value: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(value, serde_json::json!({ "error": "Invalid operation" }));
    }

    #[tokio::test]
    async fn test_attachment_headers() {
        let response =
            build_attachment_response(Bytes::from_static(b"jpegdata"), "photo_converted.jpg", "image/jpeg");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-disposition"],
            "attachment; filename=\"photo_converted.jpg\""
        );
        assert_eq!(response.headers()["content-type"], "image/jpeg");
        assert_eq!(response.headers()["content-length"], "8");
        assert_eq!(body_string(response).await, "jpegdata");
    }

    #[test]
    fn test_405_lists_allowed_methods() {
        let response = build_405_response(CONVERT_ALLOW);
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()["allow"], "POST, OPTIONS");
    }

    #[tokio::test]
    async fn test_500_has_no_structured_body() {
        let response = build_500_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers()["content-type"].to_str().unwrap().starts_with("text/plain"));
        assert!(serde_json::from_str::<serde_json::Value>(&body_string(response).await).is_err());
    }

    #[test]
    fn test_common_headers_with_cors() {
        let mut response = build_404_response();
        apply_common_headers(&mut response, &http_config(true));
        assert_eq!(response.headers()["server"], "mediagate-test");
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }

    #[test]
    fn test_common_headers_without_cors() {
        let mut response = build_404_response();
        apply_common_headers(&mut response, &http_config(false));
        assert!(response.headers().get("access-control-allow-origin").is_none());
    }

    #[test]
    fn test_options_preflight() {
        let response = build_options_response(true, CONVERT_ALLOW);
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers()["access-control-allow-methods"], "POST, OPTIONS");
    }
}
