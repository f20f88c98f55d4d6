use super::error::AppError;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_base_url: String,
    /// `None` disables the per-request timeout.
    pub http_timeout: Option<Duration>,
    pub session_file: PathBuf,
    pub subsidy_rules_path: Option<PathBuf>,

    // Calculation mirror service
    pub server_addr: String,
    pub log_json: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        // VITE_API_BASE_URL is honoured so a shared .env with the web app works.
        let api_base_url = std::env::var("CHAINFLY_API_BASE_URL")
            .ok()
            .or_else(|| std::env::var("VITE_API_BASE_URL").ok())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.into());
        let api_base_url = normalize_base_url(&api_base_url)?;

        let http_timeout = match std::env::var("CHAINFLY_HTTP_TIMEOUT_SECS") {
            Ok(v) => {
                let secs: u64 = v.trim().parse().map_err(|e| {
                    AppError::Config(format!("Invalid CHAINFLY_HTTP_TIMEOUT_SECS '{v}': {e}"))
                })?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            Err(_) => Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        };

        let session_file = std::env::var("CHAINFLY_SESSION_FILE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_session_file);

        let subsidy_rules_path = std::env::var("CHAINFLY_SUBSIDY_RULES")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let server_addr = std::env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".into());
        let log_json = std::env::var("LOG_FORMAT")
            .map(|v| v.trim().eq_ignore_ascii_case("json"))
            .unwrap_or(false)
            || parse_bool_env("LOG_JSON").unwrap_or(false);

        Ok(Self {
            api_base_url,
            http_timeout,
            session_file,
            subsidy_rules_path,
            server_addr,
            log_json,
        })
    }
}

/// Validate the base URL and strip trailing slashes so paths like `/loans`
/// can be appended directly.
pub fn normalize_base_url(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)
        .map_err(|e| AppError::Config(format!("Invalid API base URL '{raw}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::Config(format!(
            "API base URL must be http(s), got '{}'",
            url.scheme()
        )));
    }
    Ok(trimmed.to_string())
}

fn default_session_file() -> PathBuf {
    match std::env::var("HOME") {
        Ok(home) if !home.trim().is_empty() => {
            PathBuf::from(home).join(".chainfly").join("session.json")
        }
        _ => PathBuf::from(".chainfly-session.json"),
    }
}

fn parse_bool_env(key: &str) -> Option<bool> {
    let v = std::env::var(key).ok()?;
    let v = v.trim();
    if v.is_empty() {
        return None;
    }
    Some(matches!(v, "1" | "true" | "TRUE" | "yes" | "YES" | "on" | "ON"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_loses_trailing_slashes() {
        let url = normalize_base_url("https://api.chainfly.in/api//").unwrap();
        assert_eq!(url, "https://api.chainfly.in/api");
    }

    #[test]
    fn base_url_rejects_garbage_and_other_schemes() {
        assert!(matches!(normalize_base_url("not a url"), Err(AppError::Config(_))));
        assert!(matches!(
            normalize_base_url("ftp://example.com/api"),
            Err(AppError::Config(_))
        ));
    }
}
