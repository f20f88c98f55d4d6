use super::config::AppConfig;
use super::error::AppError;
use crate::finance::SubsidySchedule;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub subsidy: Arc<SubsidySchedule>,
}

impl AppState {
    /// Uses the subsidy rule file named by the config, or the built-in
    /// PM Surya Ghar schedule.
    pub fn from_config(config: AppConfig) -> Result<Self, AppError> {
        let subsidy = match &config.subsidy_rules_path {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                let schedule = SubsidySchedule::from_json(&text)?;
                info!(path = %path.display(), tiers = schedule.tiers().len(), "loaded subsidy rules");
                schedule
            }
            None => SubsidySchedule::default(),
        };
        Ok(Self {
            config: Arc::new(config),
            subsidy: Arc::new(subsidy),
        })
    }
}
