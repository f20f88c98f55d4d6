use crate::chainfly::ApiError;
use crate::draft::DraftError;
use crate::finance::CalcError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Missing required env var: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Calc(#[from] CalcError),

    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error("Token store error: {0}")]
    Store(String),

    #[error("Server error: {0}")]
    Server(String),
}
