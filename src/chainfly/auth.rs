use crate::chainfly::client::ApiClient;
use crate::chainfly::error::ApiResult;
use crate::chainfly::types::{LoginRequest, RegisterRequest, TokenPair, User};
use serde_json::{json, Value};
use tracing::{info, warn};

/// `/auth/*`. Login and refresh keep the session token in step with the
/// backend.
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi { client: self }
    }
}

impl AuthApi<'_> {
    /// Some deployments answer registration with a token pair; when they do
    /// the user is signed in straight away.
    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<Value> {
        let data: Value = self.client.post("/auth/register", request).await?;
        if let Some(token) = data.get("access_token").and_then(Value::as_str) {
            self.client.set_token(Some(token));
        }
        Ok(data)
    }

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<TokenPair> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let tokens: TokenPair = self.client.post("/auth/login", &request).await?;
        self.client.set_token(Some(&tokens.access_token));
        info!(email = %email, "signed in");
        Ok(tokens)
    }

    /// The local token is dropped whatever the backend says.
    pub async fn logout(&self) -> ApiResult<()> {
        let outcome = self.client.post_empty::<Value>("/auth/logout").await;
        self.client.set_token(None);
        if let Err(e) = &outcome {
            warn!(error = %e, "logout request failed; local session cleared anyway");
        }
        outcome.map(|_| ())
    }

    pub async fn refresh(&self, refresh_token: &str) -> ApiResult<TokenPair> {
        let tokens: TokenPair = self
            .client
            .post("/auth/refresh", &json!({ "refresh_token": refresh_token }))
            .await?;
        self.client.set_token(Some(&tokens.access_token));
        Ok(tokens)
    }

    pub async fn me(&self) -> ApiResult<User> {
        self.client.get("/auth/me").await
    }

    pub async fn forgot_password(&self, email: &str) -> ApiResult<Value> {
        self.client
            .post("/auth/forgot-password", &json!({ "email": email }))
            .await
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> ApiResult<Value> {
        self.client
            .post(
                "/auth/reset-password",
                &json!({ "token": token, "new_password": new_password }),
            )
            .await
    }

    pub async fn verify_email(&self, email: &str, otp: &str) -> ApiResult<Value> {
        self.client
            .post("/auth/verify-email", &json!({ "email": email, "otp": otp }))
            .await
    }

    pub async fn resend_verification(&self, email: &str) -> ApiResult<Value> {
        self.client
            .post("/auth/resend-verification", &json!({ "email": email }))
            .await
    }
}
