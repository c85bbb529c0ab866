//! Controller configuration parameters
//!
//! All tunable parameters for the rover core. Defaults match the
//! reference wiring; a JSON file can override any subset of fields.

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration handed to [`Controller::new`](crate::controller::Controller::new).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub network: NetworkConfig,
    pub motion: MotionConfig,
    pub status: StatusConfig,
    pub codec: CodecConfig,
    /// Sleep between control-loop ticks in the host binary (milliseconds)
    pub loop_interval_ms: u32,
}

/// Access-point and listener settings.
///
/// The core never starts the access point itself; bring-up code reads
/// these values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Access-point name
    pub ssid: String<32>,
    /// WPA2 passphrase, empty for an open AP
    pub password: String<63>,
    /// Static address of the access point
    pub ip: [u8; 4],
    /// HTTP listen port
    pub port: u16,
}

/// Motion supervisor tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Stop the motors if no `/drive` arrives for this long; 0 disables
    pub failsafe_timeout_ms: u32,
    /// Targets with magnitude below this are treated as 0
    pub deadband: u8,
    /// Max change per tick while accelerating toward a non-zero target
    pub slew_step: u8,
    /// Max change per tick while braking toward 0
    pub slew_step_stop: u8,
    /// Lowest PWM duty (0-255) applied for any non-zero speed
    pub min_duty: u8,
}

/// Status LED timing.
///
/// Blink values are half-periods: the LED toggles every `*_blink_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    pub booting_blink_ms: u32,
    pub ap_ready_blink_ms: u32,
    pub failsafe_blink_ms: u32,
    pub error_blink_ms: u32,
    pub ap_ready_hold_ms: u32,
    pub client_hold_ms: u32,
    pub failsafe_hold_ms: u32,
}

/// Request decoding bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Inactivity bound while waiting for the request line
    pub request_timeout_ms: u32,
    /// Inactivity bound while draining header lines
    pub header_timeout_ms: u32,
    /// Overall bound on reading one request, however the bytes arrive
    pub request_budget_ms: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            motion: MotionConfig::default(),
            status: StatusConfig::default(),
            codec: CodecConfig::default(),
            loop_interval_ms: 5,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        let mut ssid = String::new();
        let mut password = String::new();
        // Both literals fit their buffers.
        let _ = ssid.push_str("RobotAP");
        let _ = password.push_str("12345678");
        Self {
            ssid,
            password,
            ip: [10, 0, 0, 2],
            port: 80,
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            failsafe_timeout_ms: 1200,
            deadband: 6,
            slew_step: 8,
            slew_step_stop: 30,
            min_duty: 0,
        }
    }
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            booting_blink_ms: 100,
            ap_ready_blink_ms: 500,
            failsafe_blink_ms: 150,
            error_blink_ms: 50,
            ap_ready_hold_ms: 1500,
            client_hold_ms: 250,
            failsafe_hold_ms: 1000,
        }
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 30,
            header_timeout_ms: 30,
            request_budget_ms: 100,
        }
    }
}

impl ControllerConfig {
    /// Parse a JSON document and validate the result.
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            log::warn!("config parse error: {e}");
            ConfigError::Parse
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the rover unsafe or unreachable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let net = &self.network;
        if net.ssid.is_empty() {
            return Err(ConfigError::ValidationFailed("network.ssid is empty"));
        }
        if !net.password.is_empty() && net.password.len() < 8 {
            return Err(ConfigError::ValidationFailed(
                "network.password must be at least 8 bytes or empty",
            ));
        }
        if net.port == 0 {
            return Err(ConfigError::ValidationFailed("network.port is 0"));
        }

        let m = &self.motion;
        if m.slew_step == 0 || m.slew_step > 200 {
            return Err(ConfigError::ValidationFailed("motion.slew_step out of 1..=200"));
        }
        if m.slew_step_stop == 0 || m.slew_step_stop > 200 {
            return Err(ConfigError::ValidationFailed(
                "motion.slew_step_stop out of 1..=200",
            ));
        }
        if m.slew_step_stop < m.slew_step {
            return Err(ConfigError::ValidationFailed(
                "motion.slew_step_stop below motion.slew_step",
            ));
        }
        if m.deadband > 100 {
            return Err(ConfigError::ValidationFailed("motion.deadband above 100"));
        }

        let s = &self.status;
        if s.booting_blink_ms == 0
            || s.ap_ready_blink_ms == 0
            || s.failsafe_blink_ms == 0
            || s.error_blink_ms == 0
        {
            return Err(ConfigError::ValidationFailed("status blink period is 0"));
        }

        let c = &self.codec;
        if c.request_budget_ms == 0 {
            return Err(ConfigError::ValidationFailed("codec.request_budget_ms is 0"));
        }
        if m.failsafe_timeout_ms > 0 && c.request_budget_ms >= m.failsafe_timeout_ms {
            return Err(ConfigError::ValidationFailed(
                "codec.request_budget_ms not below motion.failsafe_timeout_ms",
            ));
        }

        if self.loop_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("loop_interval_ms is 0"));
        }
        Ok(())
    }
}
