//! Access logging and request metrics middleware.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, MatchedPath, Request},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{error, info};

use crate::error::ErrorMessage;
use crate::metrics;

/// Log one line per request with timing, client and status fields.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let url = request.uri().path().to_string();
    let client_ip = client_ip(&request);
    let referer = header_value(request.headers(), header::REFERER);
    let user_agent = header_value(request.headers(), header::USER_AGENT);

    let response = next.run(request).await;

    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
    let status_code = response.status().as_u16();

    if status_code >= 400 {
        let message = response
            .extensions()
            .get::<ErrorMessage>()
            .map(|m| m.0.as_str())
            .unwrap_or_default();
        error!(
            duration_ms,
            client_ip = %client_ip,
            url = %url,
            status_code,
            method = %method,
            referer = %referer,
            user_agent = %user_agent,
            "{}",
            message
        );
    } else {
        info!(
            duration_ms,
            client_ip = %client_ip,
            url = %url,
            status_code,
            method = %method,
            referer = %referer,
            user_agent = %user_agent,
            "Request served"
        );
    }

    response
}

/// Count requests and record their duration per route.
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let method = request.method().to_string();

    let response = next.run(request).await;

    metrics::record_http_request(start, &method, &path, response.status().as_u16());
    response
}

/// Client address: first `X-Forwarded-For` hop, then `X-Real-IP`, then the peer.
pub fn client_ip(request: &Request) -> String {
    let headers = request.headers();

    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = real_ip {
        return ip.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default()
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
