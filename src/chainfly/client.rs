use crate::chainfly::error::{ApiError, ApiResult, ResponseBody};
use crate::chainfly::session::{FileTokenStore, Session};
use crate::core::{normalize_base_url, AppConfig, AppError};
use bytes::Bytes;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::multipart::Form;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("chainfly-client/", env!("CARGO_PKG_VERSION"));

enum Payload {
    None,
    Json(Vec<u8>),
    Multipart(Form),
}

/// Single entry point for every backend call.
///
/// Each call resolves to the decoded payload or one `ApiError` whose message
/// is fit to show a user. Cloning is cheap and clones share the session.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    origin: String,
    session: Session,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        timeout: Option<Duration>,
        session: Session,
    ) -> Result<Self, AppError> {
        let base_url = normalize_base_url(base_url)?;
        let origin = base_url
            .strip_suffix("/api")
            .unwrap_or(&base_url)
            .to_string();

        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            base_url,
            origin,
            session,
        })
    }

    /// Client with the file-backed session from the config.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let store = FileTokenStore::new(&config.session_file);
        let session = Session::load(Arc::new(store));
        Self::new(&config.api_base_url, config.http_timeout, session)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Backend root, used in the connectivity hint.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn set_token(&self, token: Option<&str>) {
        self.session.set_token(token);
    }

    pub fn token(&self) -> Option<String> {
        self.session.token()
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.execute(Method::GET, path, Payload::None).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(Method::POST, path, json_payload(body)?).await
    }

    /// POST without a body.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.execute(Method::POST, path, Payload::None).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(Method::PATCH, path, json_payload(body)?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.execute(Method::DELETE, path, Payload::None).await
    }

    /// Multipart POST. reqwest sets the boundary content type itself.
    pub async fn upload<T: DeserializeOwned>(&self, path: &str, form: Form) -> ApiResult<T> {
        self.execute(Method::POST, path, Payload::Multipart(form))
            .await
    }

    /// Authenticated binary GET. Any failure, transport or status, is `None`.
    pub async fn fetch_bytes(&self, path: &str) -> Option<Bytes> {
        let url = self.url(path);
        let mut req = self.http.get(&url);
        if let Some(token) = self.session.token() {
            req = req.bearer_auth(token);
        }

        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(url = %url, error = %e, "binary download failed");
                return None;
            }
        };
        let status = resp.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "binary download rejected");
            return None;
        }
        match resp.bytes().await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(url = %url, error = %e, "binary download interrupted");
                None
            }
        }
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        payload: Payload,
    ) -> ApiResult<T> {
        let url = self.url(path);
        let mut req = self.http.request(method.clone(), &url);
        if let Some(token) = self.session.token() {
            req = req.bearer_auth(token);
        }
        req = match payload {
            Payload::None => req.header(CONTENT_TYPE, HeaderValue::from_static("application/json")),
            Payload::Json(body) => req
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(body),
            Payload::Multipart(form) => req.multipart(form),
        };

        debug!(method = %method, url = %url, "backend request");
        let resp = req
            .send()
            .await
            .map_err(|e| self.transport_error(&e, &method, &url))?;

        let status = resp.status();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| self.transport_error(&e, &method, &url))?;
        let body = ResponseBody::decode(content_type.as_deref(), &bytes);

        if !status.is_success() {
            let message = body.error_message(status);
            warn!(
                method = %method,
                url = %url,
                status = status.as_u16(),
                message = %message,
                "backend returned an error"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        debug!(method = %method, url = %url, status = status.as_u16(), "backend response");
        serde_json::from_value(body.into_data()).map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn transport_error(&self, error: &reqwest::Error, method: &Method, url: &str) -> ApiError {
        let mapped = ApiError::from_transport(error, url, &self.origin);
        warn!(method = %method, url = %url, error = %error, "backend request failed");
        mapped
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .finish()
    }
}

fn json_payload<B: Serialize + ?Sized>(body: &B) -> ApiResult<Payload> {
    serde_json::to_vec(body)
        .map(Payload::Json)
        .map_err(|e| ApiError::Encode(e.to_string()))
}

/// Percent-encode one path segment (ids, job ids, mandate ids).
pub(crate) fn segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, None, Session::in_memory()).unwrap()
    }

    #[test]
    fn origin_drops_trailing_api_segment() {
        assert_eq!(client("http://localhost:8000/api/").origin(), "http://localhost:8000");
        assert_eq!(client("https://x.example/v1").origin(), "https://x.example/v1");
    }

    #[test]
    fn paths_join_with_or_without_leading_slash() {
        let c = client("http://localhost:8000/api");
        assert_eq!(c.url("/loans/"), "http://localhost:8000/api/loans/");
        assert_eq!(c.url("loans/"), "http://localhost:8000/api/loans/");
    }

    #[test]
    fn path_segments_are_encoded() {
        assert_eq!(segment("a b/c"), "a%20b%2Fc");
    }

    #[test]
    fn clones_share_the_session() {
        let c = client("http://localhost:8000/api");
        let other = c.clone();
        c.set_token(Some("t"));
        assert_eq!(other.token().as_deref(), Some("t"));
    }

    #[test]
    fn bad_base_url_is_a_config_error() {
        assert!(matches!(
            ApiClient::new("localhost", None, Session::in_memory()),
            Err(AppError::Config(_))
        ));
    }
}
