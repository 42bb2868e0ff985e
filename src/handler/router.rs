//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: path and method matching, body
//! size check, then dispatch to the convert handler or a health probe.

use crate::config::AppState;
use crate::handler::{convert, RequestError};
use crate::http;
use crate::logger;
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let mut response = route_request(req, &state).await;
    http::apply_common_headers(&mut response, &state.config.http);
    Ok(response)
}

async fn route_request<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let routes = &state.config.routes;
    let enable_cors = state.config.http.enable_cors;
    let path = req.uri().path();

    // 1. Health check endpoints
    if routes.health.enabled
        && (path == routes.health.liveness_path || path == routes.health.readiness_path)
    {
        return match *req.method() {
            Method::GET => http::build_health_response("ok", false),
            Method::HEAD => http::build_health_response("ok", true),
            Method::OPTIONS => http::build_options_response(enable_cors, http::HEALTH_ALLOW),
            _ => http::build_405_response(http::HEALTH_ALLOW),
        };
    }

    // 2. Everything else except the convert endpoint
    if path != routes.convert_path {
        return http::build_404_response();
    }

    // 3. Method check
    match *req.method() {
        Method::POST => {}
        Method::OPTIONS => return http::build_options_response(enable_cors, http::CONVERT_ALLOW),
        ref other => {
            logger::log_warning(&format!("Method not allowed: {other} {path}"));
            return http::build_405_response(http::CONVERT_ALLOW);
        }
    }

    // 4. Body size
    if let Some(resp) = check_body_size(&req, state.config.http.max_body_size) {
        return resp;
    }

    match convert::handle_convert(req, state).await {
        Ok(response) => response,
        Err(e) => {
            log_request_error(&e);
            e.into_response()
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(req: &Request<B>, max_body_size: Option<u64>) -> Option<Response<Full<Bytes>>> {
    let max_body_size = max_body_size?;
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

fn log_request_error(err: &RequestError) {
    match err {
        // Already reported with its operation by the job runner
        RequestError::Media(_) => {}
        e if e.is_server_error() => logger::log_error(&format!("Convert failed: {e}")),
        e => logger::log_warning(&format!("Rejected convert request: {e}")),
    }
}
