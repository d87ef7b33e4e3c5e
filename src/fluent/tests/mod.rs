//! Test helpers for BindRouter tests.
//!
//! These tests drive the router with `oneshot()`, in process and without
//! network I/O. Tests against a real server live in `tests/`.

use crate::{Config, Envelope};
use axum::{body::Body, http::Request, response::Response};


// ============================================================================
// Configuration Helpers
// ============================================================================

/// Base TOML configuration for tests.
const BASE_CONFIG_TOML: &str = r#"
[http]
bind_addr = "127.0.0.1"
bind_port = 3000
max_payload_size_bytes = "1KiB"

[logging]
format = "json"
"#;

pub(crate) fn create_base_config() -> Config {
    BASE_CONFIG_TOML
        .parse()
        .expect("Failed to parse test config TOML")
}

/// Base configuration with `additional_toml` appended.
pub(crate) fn create_config_with_toml(additional_toml: &str) -> Config {
    format!("{BASE_CONFIG_TOML}\n{additional_toml}")
        .parse()
        .expect("Failed to parse test config TOML")
}

// ============================================================================
// Request Helpers
// ============================================================================

pub(crate) fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub(crate) fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// ============================================================================
// Response Helpers
// ============================================================================

pub(crate) async fn get_body_string(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8_lossy(&body).to_string()
}

/// Parses the body of a bound handler's response.
pub(crate) async fn get_envelope(response: Response) -> Envelope {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).expect("response is not an envelope")
}
