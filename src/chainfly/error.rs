use reqwest::StatusCode;
use serde_json::{Map, Value};
use thiserror::Error;

/// Outcome of every gateway call. The error side carries the one
/// human-readable message the UI shows; there is never both a payload and an
/// error.
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error(
        "Cannot connect to backend server. Please ensure the backend is running at {origin}."
    )]
    Unreachable { origin: String },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Could not encode request: {0}")]
    Encode(String),

    #[error("{0}")]
    InvalidRequest(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED.as_u16())
    }

    pub(crate) fn from_transport(error: &reqwest::Error, url: &str, origin: &str) -> Self {
        if error.is_timeout() {
            ApiError::Timeout {
                url: url.to_string(),
            }
        } else if error.is_connect() {
            ApiError::Unreachable {
                origin: origin.to_string(),
            }
        } else if error.is_builder() {
            ApiError::InvalidRequest(error.to_string())
        } else {
            ApiError::Network(error.to_string())
        }
    }
}

/// Response body as far as the gateway cares.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ResponseBody {
    Json(Value),
    /// Non-JSON content, or JSON that failed to parse.
    Text(String),
    Empty,
}

impl ResponseBody {
    /// Only bodies labelled `application/json` are parsed; anything else is
    /// kept as text for error reporting.
    pub(crate) fn decode(content_type: Option<&str>, bytes: &[u8]) -> Self {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return ResponseBody::Empty;
        }
        let is_json = content_type
            .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
            .unwrap_or(false);
        if is_json {
            if let Ok(value) = serde_json::from_slice::<Value>(bytes) {
                return ResponseBody::Json(value);
            }
        }
        ResponseBody::Text(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Success payload. Empty or non-JSON bodies read as `{}`.
    pub(crate) fn into_data(self) -> Value {
        match self {
            ResponseBody::Json(value) => value,
            ResponseBody::Text(_) | ResponseBody::Empty => Value::Object(Map::new()),
        }
    }

    /// Failure message: `detail`, `message`, `error`, the raw string body,
    /// then `HTTP <code>: <reason>`.
    pub(crate) fn error_message(&self, status: StatusCode) -> String {
        let found = match self {
            ResponseBody::Json(Value::Object(fields)) => ["detail", "message", "error"]
                .iter()
                .find_map(|key| fields.get(*key).and_then(message_text)),
            ResponseBody::Json(Value::String(s)) => non_blank(s),
            ResponseBody::Text(text) => non_blank(&body_preview(text)),
            ResponseBody::Json(_) | ResponseBody::Empty => None,
        };
        found.unwrap_or_else(|| {
            format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown Status")
            )
        })
    }
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

// FastAPI validation errors put a list of {loc, msg, type} under `detail`.
fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => non_blank(s),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    Value::Object(obj) => obj.get("msg").and_then(message_text),
                    other => message_text(other),
                })
                .collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        Value::Object(obj) => ["msg", "message"]
            .iter()
            .find_map(|key| obj.get(*key).and_then(message_text))
            .or_else(|| Some(value.to_string())),
        other => Some(other.to_string()),
    }
}

fn body_preview(body: &str) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 200;

    let compact = body.split_whitespace().collect::<Vec<_>>().join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    const JSON: Option<&str> = Some("application/json; charset=utf-8");

    #[rstest]
    #[case::detail(r#"{"detail": "Loan not found", "message": "m"}"#, "Loan not found")]
    #[case::message(r#"{"message": "Try later", "error": "e"}"#, "Try later")]
    #[case::error(r#"{"error": "bad_request"}"#, "bad_request")]
    #[case::nested_error(r#"{"error": {"message": "quota"}}"#, "quota")]
    #[case::validation_list(
        r#"{"detail": [{"loc": ["body", "email"], "msg": "value is not a valid email"}, {"msg": "too short"}]}"#,
        "value is not a valid email; too short"
    )]
    #[case::json_string(r#""plain failure""#, "plain failure")]
    #[case::blank_detail_falls_through(r#"{"detail": "  ", "error": "x"}"#, "x")]
    #[case::no_known_field(r#"{"code": 7}"#, "HTTP 400: Bad Request")]
    fn json_error_priority(#[case] body: &str, #[case] expected: &str) {
        let decoded = ResponseBody::decode(JSON, body.as_bytes());
        assert_eq!(decoded.error_message(StatusCode::BAD_REQUEST), expected);
    }

    #[test]
    fn text_bodies_are_compacted_and_truncated() {
        let decoded = ResponseBody::decode(Some("text/plain"), b"  upstream\n   exploded  ");
        assert_eq!(
            decoded.error_message(StatusCode::BAD_GATEWAY),
            "upstream exploded"
        );

        let long = "x".repeat(500);
        let decoded = ResponseBody::decode(Some("text/html"), long.as_bytes());
        let message = decoded.error_message(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message.len(), 203);
        assert!(message.ends_with("..."));
    }

    #[test]
    fn empty_error_body_reports_status_line() {
        let decoded = ResponseBody::decode(JSON, b"");
        assert_eq!(decoded, ResponseBody::Empty);
        assert_eq!(
            decoded.error_message(StatusCode::SERVICE_UNAVAILABLE),
            "HTTP 503: Service Unavailable"
        );
    }

    #[rstest]
    #[case::empty(JSON, "")]
    #[case::whitespace(JSON, " \n")]
    #[case::malformed(JSON, "{not json")]
    #[case::not_json(Some("text/plain"), "ok")]
    #[case::json_without_header(None, r#"{"a": 1}"#)]
    fn success_data_defaults_to_empty_object(#[case] ct: Option<&str>, #[case] body: &str) {
        assert_eq!(ResponseBody::decode(ct, body.as_bytes()).into_data(), json!({}));
    }

    #[test]
    fn json_success_passes_through() {
        let data = ResponseBody::decode(JSON, br#"[1, 2]"#).into_data();
        assert_eq!(data, json!([1, 2]));
    }

    #[test]
    fn unauthorized_helper() {
        let err = ApiError::Status {
            status: 401,
            message: "Not authenticated".into(),
        };
        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "Not authenticated");
        assert!(!ApiError::Network("x".into()).is_unauthorized());
    }
}
