use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::RumError;

pub const ENV_APPLICATION_ID: &str = "RUM_APPLICATION_ID";
pub const ENV_SESSION_SAMPLE_RATE: &str = "RUM_SESSION_SAMPLE_RATE";
pub const ENV_MAPPING_GRACE_PERIOD_MS: &str = "RUM_MAPPING_GRACE_PERIOD_MS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RumConfig {
    pub application_id: String,
    /// Percentage of sessions kept, 0..=100.
    pub session_sample_rate: f32,
    /// How long a finished scope waits for a late mapping notice.
    pub mapping_grace_period_ms: u64,
}

impl Default for RumConfig {
    fn default() -> Self {
        Self {
            application_id: String::new(),
            session_sample_rate: 100.0,
            mapping_grace_period_ms: 1_000,
        }
    }
}

impl RumConfig {
    pub fn new(application_id: &str) -> Self {
        Self {
            application_id: application_id.to_string(),
            ..Self::default()
        }
    }

    pub fn with_sample_rate(mut self, rate: f32) -> Self {
        self.session_sample_rate = rate;
        self
    }

    pub fn mapping_grace_period(&self) -> Duration {
        Duration::from_millis(self.mapping_grace_period_ms)
    }

    pub fn from_json(json: &str) -> Result<Self, RumError> {
        let config: RumConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads overrides from the environment on top of defaults.
    pub fn from_env() -> Result<Self, RumError> {
        let mut config = RumConfig::default();
        if let Ok(id) = std::env::var(ENV_APPLICATION_ID) {
            config.application_id = id;
        }
        if let Ok(raw) = std::env::var(ENV_SESSION_SAMPLE_RATE) {
            config.session_sample_rate = raw.trim().parse().map_err(|_| RumError::InvalidEnv {
                key: ENV_SESSION_SAMPLE_RATE,
                value: raw.clone(),
            })?;
        }
        if let Ok(raw) = std::env::var(ENV_MAPPING_GRACE_PERIOD_MS) {
            config.mapping_grace_period_ms = raw.trim().parse().map_err(|_| RumError::InvalidEnv {
                key: ENV_MAPPING_GRACE_PERIOD_MS,
                value: raw.clone(),
            })?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RumError> {
        if self.application_id.trim().is_empty() {
            return Err(RumError::MissingApplicationId);
        }
        if !(0.0..=100.0).contains(&self.session_sample_rate) {
            return Err(RumError::InvalidSampleRate(self.session_sample_rate));
        }
        Ok(())
    }
}
