//! Configuration management for crashlogger.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::detector::DetectorConfig;
use crate::error::{Error, Result};
use crate::orientation::OrientationClassifier;
use crate::view::ViewConfig;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default configuration directory name.
const CONFIG_DIR_NAME: &str = "crashlogger";

/// Largest offset from UTC in use anywhere, in minutes.
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `CRASHLOGGER_`)
/// 2. TOML config file at `~/.config/crashlogger/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Accelerometer configuration.
    pub sensor: SensorConfig,
    /// Orientation thresholds.
    pub classifier: ClassifierConfig,
    /// Crash detector timing.
    pub detector: DetectorSettings,
    /// Event log configuration.
    pub log: LogConfig,
    /// Positioning configuration.
    pub position: PositionConfig,
    /// Buzzer and notification configuration.
    pub alert: AlertConfig,
    /// Report rendering configuration.
    pub view: ViewSettings,
    /// Retrieval server configuration.
    pub server: ServerConfig,
}

/// Accelerometer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Raw counts per g.
    pub scale_lsb_per_g: f32,
    /// Interval between polling ticks in milliseconds.
    pub poll_interval_ms: u64,
}

/// Orientation thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Pitch/roll beyond which the vehicle counts as tipped, in degrees.
    pub tilt_threshold_deg: f32,
    /// Vertical acceleration below which the vehicle counts as down, in g.
    pub down_threshold_g: f32,
}

/// Crash detector timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    /// Minimum spacing between two detections in milliseconds.
    pub debounce_window_ms: u64,
    /// Time orientation must stay normal before re-arming, in milliseconds.
    pub rearm_delay_ms: u64,
}

/// Event log configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Number of crash events retained.
    pub capacity: usize,
}

/// Positioning configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionConfig {
    /// Offset from the receiver's UTC time to local time, in minutes.
    pub utc_offset_minutes: i32,
    /// Decimals shown for latitude and longitude.
    pub coordinate_precision: usize,
}

/// Buzzer and notification configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Length of the buzzer pulse in milliseconds.
    pub buzzer_pulse_ms: u64,
    /// Buzzer tone in hertz.
    pub buzzer_frequency_hz: u32,
    /// Send a notification for each crash.
    pub notifications_enabled: bool,
    /// Notification recipient id.
    pub recipient: String,
    /// Upper bound on one notification attempt in milliseconds.
    pub notify_timeout_ms: u64,
}

/// Report rendering configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    /// Map link template with `{lat}` and `{lon}` placeholders.
    pub map_url_template: String,
    /// Browser auto-refresh interval in seconds (0 disables it).
    pub refresh_secs: u32,
    /// Page heading.
    pub title: String,
}

/// Retrieval server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Serve the crash log over HTTP.
    pub enabled: bool,
    /// Address to listen on.
    pub bind: String,
    /// How long to wait for request data, in milliseconds.
    pub request_wait_ms: u64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            scale_lsb_per_g: crate::orientation::DEFAULT_SCALE_LSB_PER_G,
            poll_interval_ms: 200,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            tilt_threshold_deg: crate::orientation::DEFAULT_TILT_THRESHOLD_DEG,
            down_threshold_g: crate::orientation::DEFAULT_DOWN_THRESHOLD_G,
        }
    }
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            debounce_window_ms: 3000,
            rearm_delay_ms: 500,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            capacity: crate::event_log::DEFAULT_CAPACITY,
        }
    }
}

impl Default for PositionConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: crate::position::DEFAULT_UTC_OFFSET_MINUTES,
            coordinate_precision: crate::view::DEFAULT_COORDINATE_PRECISION,
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            buzzer_pulse_ms: 2000,
            buzzer_frequency_hz: 2000,
            notifications_enabled: true,
            recipient: String::new(),
            notify_timeout_ms: 5000,
        }
    }
}

impl Default for ViewSettings {
    fn default() -> Self {
        let view = ViewConfig::default();
        Self {
            map_url_template: view.map_url_template,
            refresh_secs: view.refresh_secs,
            title: view.title,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: "0.0.0.0:8080".to_string(),
            request_wait_ms: 2000,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("CRASHLOGGER_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.sensor.poll_interval_ms == 0 {
            return Err(Error::config_validation(
                "poll_interval_ms must be greater than 0",
            ));
        }

        if !(self.sensor.scale_lsb_per_g.is_finite() && self.sensor.scale_lsb_per_g > 0.0) {
            return Err(Error::config_validation(format!(
                "scale_lsb_per_g must be a positive number, got {}",
                self.sensor.scale_lsb_per_g
            )));
        }

        let tilt = self.classifier.tilt_threshold_deg;
        if !(tilt > 0.0 && tilt < 90.0) {
            return Err(Error::config_validation(format!(
                "tilt_threshold_deg must be between 0 and 90, got {tilt}"
            )));
        }

        if self.detector.debounce_window_ms == 0 {
            return Err(Error::config_validation(
                "debounce_window_ms must be greater than 0",
            ));
        }

        if self.detector.rearm_delay_ms >= self.detector.debounce_window_ms {
            return Err(Error::config_validation(format!(
                "rearm_delay_ms ({}) must be shorter than debounce_window_ms ({})",
                self.detector.rearm_delay_ms, self.detector.debounce_window_ms
            )));
        }

        if self.log.capacity == 0 {
            return Err(Error::config_validation("capacity must be greater than 0"));
        }

        if self.position.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(Error::config_validation(format!(
                "utc_offset_minutes must be within ±{MAX_UTC_OFFSET_MINUTES}, got {}",
                self.position.utc_offset_minutes
            )));
        }

        if self.position.coordinate_precision > 10 {
            return Err(Error::config_validation(
                "coordinate_precision cannot exceed 10",
            ));
        }

        let template = &self.view.map_url_template;
        if !template.contains("{lat}") || !template.contains("{lon}") {
            return Err(Error::config_validation(format!(
                "map_url_template must contain {{lat}} and {{lon}}: {template}"
            )));
        }

        if self.server.bind.parse::<SocketAddr>().is_err() {
            return Err(Error::config_validation(format!(
                "invalid bind address: {}",
                self.server.bind
            )));
        }

        Ok(())
    }

    /// Get the polling interval as a Duration.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.sensor.poll_interval_ms)
    }

    /// Get the buzzer pulse length as a Duration.
    #[must_use]
    pub fn buzzer_pulse(&self) -> Duration {
        Duration::from_millis(self.alert.buzzer_pulse_ms)
    }

    /// Get the notification timeout as a Duration.
    #[must_use]
    pub fn notify_timeout(&self) -> Duration {
        Duration::from_millis(self.alert.notify_timeout_ms)
    }

    /// Get the retrieval request wait as a Duration.
    #[must_use]
    pub fn request_wait(&self) -> Duration {
        Duration::from_millis(self.server.request_wait_ms)
    }

    /// Detector timing parameters.
    #[must_use]
    pub fn detector(&self) -> DetectorConfig {
        DetectorConfig {
            debounce_window: Duration::from_millis(self.detector.debounce_window_ms),
            rearm_delay: Duration::from_millis(self.detector.rearm_delay_ms),
        }
    }

    /// Orientation classifier with the configured thresholds.
    #[must_use]
    pub fn classifier(&self) -> OrientationClassifier {
        OrientationClassifier::new(
            self.classifier.tilt_threshold_deg,
            self.classifier.down_threshold_g,
        )
    }

    /// Rendering options for the log view.
    #[must_use]
    pub fn view(&self) -> ViewConfig {
        ViewConfig {
            map_url_template: self.view.map_url_template.clone(),
            coordinate_precision: self.position.coordinate_precision,
            title: self.view.title.clone(),
            refresh_secs: self.view.refresh_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.sensor.poll_interval_ms, 200);
        assert_eq!(config.log.capacity, 20);
        assert_eq!(config.position.utc_offset_minutes, 330);
        assert!(config.alert.notifications_enabled);
        assert!(config.server.enabled);
    }

    #[test]
    fn test_default_detector_settings() {
        let detector = Config::default().detector();

        assert_eq!(detector.debounce_window, Duration::from_millis(3000));
        assert_eq!(detector.rearm_delay, Duration::from_millis(500));
        assert!(detector.rearm_delay < detector.debounce_window);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rearm_not_shorter_than_debounce() {
        let mut config = Config::default();
        config.detector.rearm_delay_ms = 3000;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("rearm_delay_ms"));
    }

    #[test]
    fn test_validate_zero_poll_interval() {
        let mut config = Config::default();
        config.sensor.poll_interval_ms = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("poll_interval_ms"));
    }

    #[test]
    fn test_validate_zero_capacity() {
        let mut config = Config::default();
        config.log.capacity = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("capacity"));
    }

    #[test]
    fn test_validate_bad_scale() {
        let mut config = Config::default();
        config.sensor.scale_lsb_per_g = 0.0;
        assert!(config.validate().is_err());

        config.sensor.scale_lsb_per_g = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_tilt_threshold_range() {
        let mut config = Config::default();
        config.classifier.tilt_threshold_deg = 95.0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("tilt_threshold_deg"));
    }

    #[test]
    fn test_validate_utc_offset_range() {
        let mut config = Config::default();
        config.position.utc_offset_minutes = -15 * 60;
        assert!(config.validate().is_err());

        config.position.utc_offset_minutes = -8 * 60;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_map_template() {
        let mut config = Config::default();
        config.view.map_url_template = "https://example.com/?q={lat}".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("map_url_template"));
    }

    #[test]
    fn test_validate_bind_address() {
        let mut config = Config::default();
        config.server.bind = "not an address".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("bind address"));
    }

    #[test]
    fn test_durations() {
        let config = Config::default();

        assert_eq!(config.poll_interval(), Duration::from_millis(200));
        assert_eq!(config.buzzer_pulse(), Duration::from_millis(2000));
        assert_eq!(config.notify_timeout(), Duration::from_millis(5000));
        assert_eq!(config.request_wait(), Duration::from_millis(2000));
    }

    #[test]
    fn test_view_options() {
        let mut config = Config::default();
        config.position.coordinate_precision = 4;

        let view = config.view();
        assert_eq!(view.coordinate_precision, 4);
        assert_eq!(view.map_url_template, crate::view::DEFAULT_MAP_URL_TEMPLATE);
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("crashlogger"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        // Loading from a nonexistent path should work (uses defaults)
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());

        let config = result.unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_toml_overrides() {
        let dir = std::env::temp_dir().join(format!("crashlogger-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(
            &path,
            "[log]\ncapacity = 5\n\n[detector]\ndebounce_window_ms = 4000\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.log.capacity, 5);
        assert_eq!(config.detector.debounce_window_ms, 4000);
        assert_eq!(config.detector.rearm_delay_ms, 500);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = std::env::temp_dir().join(format!("crashlogger-invalid-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[detector]\nrearm_delay_ms = 9000\n").unwrap();

        assert!(Config::load_from(Some(path)).is_err());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("debounce_window_ms"));
        assert!(json.contains("map_url_template"));
    }

    #[test]
    fn test_detector_settings_deserialize() {
        let json = r#"{"debounce_window_ms": 5000}"#;
        let detector: DetectorSettings = serde_json::from_str(json).unwrap();
        assert_eq!(detector.debounce_window_ms, 5000);
        assert_eq!(detector.rearm_delay_ms, 500);
    }
}
