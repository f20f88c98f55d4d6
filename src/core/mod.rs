pub mod config;
pub mod error;
pub mod state;

pub use config::{normalize_base_url, AppConfig, DEFAULT_API_BASE_URL};
pub use error::AppError;
pub use state::AppState;
