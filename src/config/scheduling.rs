//! Scheduling and check-in configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Scheduling engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulingConfig {
    /// How far ahead (in days) recurring templates are expanded into
    /// sessions.
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,

    /// Whether members without a booking may check in (walk-ins).
    #[serde(default = "default_allow_walk_in")]
    pub allow_walk_in: bool,

    /// PIN protecting the kiosk's staff panel.
    #[serde(default = "default_staff_pin")]
    pub staff_pin: String,
}

impl SchedulingConfig {
    /// Validate scheduling configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.horizon_days == 0 || self.horizon_days > 366 {
            return Err(ValidationError::InvalidHorizon);
        }
        if self.staff_pin.len() < 4 {
            return Err(ValidationError::StaffPinTooShort);
        }
        Ok(())
    }

    /// Checks a PIN entered on the kiosk against the configured staff PIN.
    pub fn verify_staff_pin(&self, pin: &str) -> bool {
        !self.staff_pin.is_empty() && pin == self.staff_pin
    }
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            horizon_days: default_horizon_days(),
            allow_walk_in: default_allow_walk_in(),
            staff_pin: default_staff_pin(),
        }
    }
}

fn default_horizon_days() -> u32 {
    60
}

fn default_allow_walk_in() -> bool {
    true
}

fn default_staff_pin() -> String {
    "1234".to_string()
}
