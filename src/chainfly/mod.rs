//! Typed client for the ChainFly backend.
//!
//! [`ApiClient`] owns transport, auth headers and error normalization; the
//! per-area handles (`client.auth()`, `client.loans()`, ...) only bind paths
//! and payloads.

pub mod ai;
pub mod auth;
pub mod calculations;
pub mod client;
pub mod collections;
pub mod credit;
pub mod documents;
pub mod error;
pub mod kyc;
pub mod loans;
pub mod reports;
pub mod session;
pub mod types;

pub use client::ApiClient;
pub use error::{ApiError, ApiResult};
pub use session::{FileTokenStore, MemoryTokenStore, Session, TokenStore, ACCESS_TOKEN_KEY};
