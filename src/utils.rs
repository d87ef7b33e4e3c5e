//!
//! Utility types and functions shared by the router and the envelope.
//!
//! - [`RequestIdGenerator`] - Generates or preserves request IDs
//! - [`request_id`] - Reads the request id back from a header map
//! - [`replace_handlebars_with_env`] - Template substitution for environment variables
//!

use {
    http::{HeaderMap, HeaderValue, Request},
    regex::{Captures, Regex},
    std::{env, sync::LazyLock},
    tower_http::request_id::{MakeRequestId, RequestId},
    uuid::{ContextV7, Timestamp, Uuid},
};

/// Name of the header carrying the request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Matches `{{ VAR_NAME }}` with optional whitespace around the variable name.
static HANDLEBAR_REGEXP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Z0-9_]+)\s*\}\}").unwrap());

/// Request ID generator for request correlation.
///
/// Preserves an incoming `x-request-id` header or generates a UUIDv7. The
/// resulting id doubles as the envelope `trace_id`.
///
/// ```
/// use axum_bind::RequestIdGenerator;
/// use tower_http::request_id::SetRequestIdLayer;
///
/// let layer = SetRequestIdLayer::x_request_id(RequestIdGenerator);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequestIdGenerator;

impl MakeRequestId for RequestIdGenerator {
    fn make_request_id<B>(&mut self, req: &Request<B>) -> Option<RequestId> {
        match req.headers().get(REQUEST_ID_HEADER) {
            Some(value) => Some(RequestId::new(value.clone())),
            None => {
                let cx = ContextV7::new().with_additional_precision();
                let uuid = Uuid::new_v7(Timestamp::now(cx));
                let value = HeaderValue::from_str(&uuid.to_string()).ok()?;
                Some(RequestId::new(value))
            }
        }
    }
}

/// Returns the request id carried by `headers`, if any and if it is valid text.
pub fn request_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}

/// Replaces handlebars-style placeholders with environment variable values.
///
/// Variable names must consist of uppercase letters, digits, or underscores.
/// Unset variables are replaced with an empty string.
///
/// ```
/// use axum_bind::replace_handlebars_with_env;
///
/// let template = "Value: {{ MISSING_VAR }}";
/// assert_eq!(replace_handlebars_with_env(template), "Value: ");
/// ```
pub fn replace_handlebars_with_env(input: &str) -> String {
    HANDLEBAR_REGEXP
        .replace_all(input, |caps: &Captures| {
            let var_name = &caps[1];
            env::var(var_name).unwrap_or_else(|_| {
                tracing::warn!(
                    variable = %var_name,
                    "Environment variable not found, substituting with empty string"
                );
                String::new()
            })
        })
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_handlebars_with_env_no_variables() {
        let input = "This is a plain string with no variables";
        assert_eq!(replace_handlebars_with_env(input), input);
    }

    #[test]
    fn test_replace_handlebars_with_env_with_variables() {
        unsafe {
            env::set_var("UTILS_TEST_VAR", "test_value");
            env::set_var("UTILS_ANOTHER_VAR", "another_value");
        }
        let input = "A: {{ UTILS_TEST_VAR }}, B: {{UTILS_ANOTHER_VAR}}, C: {{  UTILS_TEST_VAR  }}";
        let output = replace_handlebars_with_env(input);
        assert_eq!(output, "A: test_value, B: another_value, C: test_value");

        unsafe {
            env::remove_var("UTILS_TEST_VAR");
            env::remove_var("UTILS_ANOTHER_VAR");
        }
    }

    #[test]
    fn test_replace_handlebars_with_env_missing_variable() {
        unsafe {
            env::remove_var("UTILS_NONEXISTENT_VAR");
        }
        let output = replace_handlebars_with_env("Value: {{ UTILS_NONEXISTENT_VAR }}");
        assert_eq!(output, "Value: ");
    }

    #[test]
    fn test_request_id_generator_preserves_existing() {
        let req = Request::builder()
            .header(REQUEST_ID_HEADER, "abc-123")
            .body(())
            .unwrap();
        let id = RequestIdGenerator.make_request_id(&req).unwrap();
        assert_eq!(id.header_value(), "abc-123");
    }

    #[test]
    fn test_request_id_generator_creates_uuid_v7() {
        let req = Request::builder().body(()).unwrap();
        let id = RequestIdGenerator.make_request_id(&req).unwrap();
        let uuid = Uuid::parse_str(id.header_value().to_str().unwrap()).unwrap();
        assert_eq!(uuid.get_version_num(), 7);
    }

    #[test]
    fn test_request_id_reads_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_id(&headers), None);
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("rid-1"));
        assert_eq!(request_id(&headers), Some("rid-1"));
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static(""));
        assert_eq!(request_id(&headers), None);
    }
}
