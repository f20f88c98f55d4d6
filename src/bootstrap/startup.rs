use crate::chainfly::session::fingerprint;
use crate::chainfly::ApiClient;
use tracing::{info, warn};

/// What the startup check concluded about the persisted session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCheck {
    /// No token was stored.
    SignedOut,
    /// `/auth/me` accepted the token.
    Valid { email: String },
    /// The backend rejected the token with 401; it has been cleared.
    Expired,
    /// The backend could not confirm either way; the token is kept.
    Unverified { reason: String },
}

/// Run once at startup, before the first authenticated call.
///
/// A stored token is only discarded when the backend explicitly rejects it.
/// Network failures and other errors keep it so an offline start does not
/// sign the user out.
pub async fn initialize_session(client: &ApiClient) -> SessionCheck {
    let Some(token) = client.token() else {
        info!("no stored session");
        return SessionCheck::SignedOut;
    };
    let token_fingerprint = fingerprint(&token);

    match client.auth().me().await {
        Ok(user) => {
            info!(token_fingerprint = %token_fingerprint, email = %user.email, "stored session is valid");
            SessionCheck::Valid { email: user.email }
        }
        Err(e) if e.is_unauthorized() => {
            warn!(token_fingerprint = %token_fingerprint, "stored session rejected; clearing token");
            client.set_token(None);
            SessionCheck::Expired
        }
        Err(e) => {
            warn!(token_fingerprint = %token_fingerprint, error = %e, "could not verify stored session");
            SessionCheck::Unverified {
                reason: e.to_string(),
            }
        }
    }
}
