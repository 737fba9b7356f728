//! Endpoint selection and tuning.
//!
//! Every field has a default, so an empty JSON object is a complete config.

use crate::audio::notifications::DEFAULT_NOTIFICATION_CAPACITY;
use crate::audio::{AudioError, DataFlow, Role, StereoChannels};
use serde::{Deserialize, Serialize};

/// Balance changes smaller than this are not written to the device.
pub const DEFAULT_BALANCE_EPSILON: f64 = 0.05;

/// Which endpoint to open and how to drive it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// `tracing` filter directive, e.g. `"debug"` or `"audio_endpoint_rs=trace"`.
    /// Falls back to `RUST_LOG` when unset.
    pub log_level: Option<String>,

    pub data_flow: DataFlow,

    pub role: Role,

    /// Channel indices used as left and right for balance.
    pub balance_channels: StereoChannels,

    pub balance_epsilon: f64,

    /// Queue depth of each notification subscriber.
    pub notification_capacity: usize,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            log_level: None,
            data_flow: DataFlow::Render,
            role: Role::Multimedia,
            balance_channels: StereoChannels::default(),
            balance_epsilon: DEFAULT_BALANCE_EPSILON,
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
        }
    }
}

impl EndpointConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, AudioError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| AudioError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AudioError> {
        if self.data_flow == DataFlow::All {
            return Err(AudioError::Config(
                "data_flow \"all\" does not select a default endpoint".into(),
            ));
        }
        self.balance_channels.validate()?;
        if !self.balance_epsilon.is_finite() || !(0.0..1.0).contains(&self.balance_epsilon) {
            return Err(AudioError::Config(format!(
                "balance_epsilon must be in [0, 1) (got {})",
                self.balance_epsilon
            )));
        }
        if self.notification_capacity == 0 {
            return Err(AudioError::Config(
                "notification_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
