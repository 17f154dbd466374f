//! Configuration using Figment.
//!
//! Settings are loaded from:
//! 1. a TOML file (base configuration)
//! 2. environment variables prefixed with `MKS_RGA_`, nested keys separated
//!    by a double underscore
//!
//! ```text
//! MKS_RGA_CONNECTION__ADDRESS=10.0.0.12:10014
//! MKS_RGA_RECORDING__POLLING_INTERVAL_SECS=30
//! ```
//!
//! # Example
//! ```no_run
//! use mks_rga::config::Settings;
//!
//! let settings = Settings::load_from("mks-rga.toml")?;
//! settings.validate()?;
//! println!("RGA at {}", settings.connection.address);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::error::{RgaError, RgaResult};
use crate::protocol::commands::{Command, FilterMode};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default configuration file looked up by the binary.
pub const DEFAULT_CONFIG_FILE: &str = "mks-rga.toml";

/// Shortest accepted polling interval.
pub const MIN_POLLING_INTERVAL: Duration = Duration::from_secs(15);

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Instrument connection
    pub connection: ConnectionConfig,
    /// Acquisition loop
    #[serde(default)]
    pub recording: RecordingConfig,
    /// Downstream time-series sink
    #[serde(default)]
    pub sink: SinkConfig,
}

/// Instrument connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// `host:port` of the instrument
    pub address: String,
    /// TCP connect timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
    /// Per-frame read deadline in milliseconds (absent = wait indefinitely)
    #[serde(default)]
    pub read_timeout_ms: Option<u64>,
}

/// Recording loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Seconds between scans; values below 15 are raised to 15
    #[serde(default = "default_polling_interval")]
    pub polling_interval_secs: u64,
    /// Application name sent with `Control`
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// Application version sent with `Control`
    #[serde(default = "default_app_version")]
    pub app_version: String,
    /// Bar chart measurement scanned on every tick
    #[serde(default)]
    pub barchart: BarchartConfig,
}

/// Bar chart measurement definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarchartConfig {
    /// Measurement name used with `AddBarchart` and `ScanAdd`
    #[serde(default = "default_barchart_name")]
    pub name: String,
    /// First mass of the range
    #[serde(default = "default_start_mass")]
    pub start_mass: i64,
    /// Last mass of the range; the scan drain ends here
    #[serde(default = "default_end_mass")]
    pub end_mass: i64,
    /// Peak filter mode
    #[serde(default = "default_filter_mode")]
    pub filter_mode: FilterMode,
    /// Accuracy code (0-8)
    #[serde(default = "default_accuracy")]
    pub accuracy: i64,
    /// Index into the `EGains` table
    #[serde(default)]
    pub egain_index: i64,
    /// Source settings index
    #[serde(default)]
    pub source_index: i64,
    /// Detector settings index
    #[serde(default)]
    pub detector_index: i64,
}

/// External time-series sink parameters. Only validated here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Whether the sink is enabled
    #[serde(default)]
    pub influx: bool,
    /// Sink endpoint
    #[serde(default)]
    pub url: String,
    /// API token
    #[serde(default)]
    pub api_token: String,
    /// Organisation
    #[serde(default)]
    pub org: String,
    /// Target bucket
    #[serde(default)]
    pub bucket: String,
    /// Skip TLS certificate verification
    #[serde(default)]
    pub skip_tls: bool,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_connect_timeout() -> u64 {
    5000
}

fn default_polling_interval() -> u64 {
    15
}

fn default_app_name() -> String {
    "mks-rga".to_string()
}

fn default_app_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_barchart_name() -> String {
    "Bar1".to_string()
}

fn default_start_mass() -> i64 {
    1
}

fn default_end_mass() -> i64 {
    200
}

fn default_filter_mode() -> FilterMode {
    FilterMode::PeakCenter
}

fn default_accuracy() -> i64 {
    5
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            polling_interval_secs: default_polling_interval(),
            app_name: default_app_name(),
            app_version: default_app_version(),
            barchart: BarchartConfig::default(),
        }
    }
}

impl Default for BarchartConfig {
    fn default() -> Self {
        Self {
            name: default_barchart_name(),
            start_mass: default_start_mass(),
            end_mass: default_end_mass(),
            filter_mode: default_filter_mode(),
            accuracy: default_accuracy(),
            egain_index: 0,
            source_index: 0,
            detector_index: 0,
        }
    }
}

impl Settings {
    /// Settings for `address` with every other field at its default.
    pub fn for_address(address: impl Into<String>) -> Self {
        Self {
            log_level: default_log_level(),
            connection: ConnectionConfig {
                address: address.into(),
                connect_timeout_ms: default_connect_timeout(),
                read_timeout_ms: None,
            },
            recording: RecordingConfig::default(),
            sink: SinkConfig::default(),
        }
    }

    /// Provider chain: TOML file, then `MKS_RGA_` environment overrides.
    ///
    /// Exposed so callers can merge further providers (e.g. CLI flags)
    /// before extracting.
    pub fn figment<P: AsRef<Path>>(path: P) -> Figment {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("MKS_RGA_").split("__"))
    }

    /// Load configuration from a specific file path and the environment
    pub fn load_from<P: AsRef<Path>>(path: P) -> RgaResult<Self> {
        Self::from_figment(Self::figment(path))
    }

    /// Extracts and validates settings from an assembled figment.
    pub fn from_figment(figment: Figment) -> RgaResult<Self> {
        let settings: Settings = figment.extract()?;
        settings.validate().map_err(RgaError::Configuration)?;
        Ok(settings)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }

        if self.connection.address.trim().is_empty() {
            return Err("connection.address must not be empty".to_string());
        }

        let chart = &self.recording.barchart;
        if chart.start_mass > chart.end_mass {
            return Err(format!(
                "Invalid bar chart mass range {}..{}: start must not exceed end",
                chart.start_mass, chart.end_mass
            ));
        }

        if self.sink.influx {
            let required = [
                ("sink.url", &self.sink.url),
                ("sink.api_token", &self.sink.api_token),
                ("sink.org", &self.sink.org),
                ("sink.bucket", &self.sink.bucket),
            ];
            if let Some((key, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
                return Err(format!("{key} must not be blank when sink.influx is enabled"));
            }
        }

        Ok(())
    }
}

impl ConnectionConfig {
    /// Connect timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Per-frame read deadline, if configured.
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }
}

impl RecordingConfig {
    /// Polling interval, raised to [`MIN_POLLING_INTERVAL`] when shorter.
    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.polling_interval_secs).max(MIN_POLLING_INTERVAL)
    }
}

impl BarchartConfig {
    /// The `AddBarchart` command defining this measurement.
    pub fn to_command(&self) -> Command {
        Command::AddBarchart {
            name: self.name.clone(),
            start_mass: self.start_mass,
            end_mass: self.end_mass,
            filter_mode: self.filter_mode,
            accuracy: self.accuracy,
            egain_index: self.egain_index,
            source_index: self.source_index,
            detector_index: self.detector_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    #[serial]
    fn test_load_minimal_config() {
        let file = write_config(
            r#"
            [connection]
            address = "192.168.1.50:10014"
            "#,
        );

        let settings = Settings::load_from(file.path()).unwrap();
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.connection.address, "192.168.1.50:10014");
        assert_eq!(settings.connection.connect_timeout(), Duration::from_secs(5));
        assert_eq!(settings.connection.read_timeout(), None);
        assert_eq!(settings.recording.barchart.name, "Bar1");
        assert_eq!(settings.recording.barchart.end_mass, 200);
        assert_eq!(settings.recording.barchart.filter_mode, FilterMode::PeakCenter);
        assert!(!settings.sink.influx);
    }

    #[test]
    #[serial]
    fn test_load_full_config() {
        let file = write_config(
            r#"
            log_level = "debug"

            [connection]
            address = "rga.lab:10014"
            read_timeout_ms = 2500

            [recording]
            polling_interval_secs = 60
            app_name = "Process Eye"

            [recording.barchart]
            name = "Air"
            end_mass = 50
            filter_mode = "PeakMax"
            "#,
        );

        let settings = Settings::load_from(file.path()).unwrap();
        assert_eq!(settings.connection.read_timeout(), Some(Duration::from_millis(2500)));
        assert_eq!(settings.recording.polling_interval(), Duration::from_secs(60));
        assert_eq!(
            settings.recording.barchart.to_command().encode(),
            "AddBarchart Air 1 50 PeakMax 5 0 0 0\n\r"
        );
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        let file = write_config(
            r#"
            [connection]
            address = "from-file:1"
            "#,
        );

        std::env::set_var("MKS_RGA_CONNECTION__ADDRESS", "from-env:2");
        let result = Settings::load_from(file.path());
        std::env::remove_var("MKS_RGA_CONNECTION__ADDRESS");

        assert_eq!(result.unwrap().connection.address, "from-env:2");
    }

    #[test]
    #[serial]
    fn test_missing_address_is_config_error() {
        let file = write_config("log_level = \"info\"\n");
        let err = Settings::load_from(file.path()).unwrap_err();
        assert!(matches!(err, RgaError::Config(_)));
    }

    #[test]
    fn test_polling_interval_is_clamped() {
        let mut settings = Settings::for_address("rga:10014");
        settings.recording.polling_interval_secs = 0;
        assert_eq!(settings.recording.polling_interval(), MIN_POLLING_INTERVAL);
        settings.recording.polling_interval_secs = 5;
        assert_eq!(settings.recording.polling_interval(), MIN_POLLING_INTERVAL);
    }

    #[test]
    fn test_invalid_log_level() {
        let mut settings = Settings::for_address("rga:10014");
        settings.log_level = "loud".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_empty_address_rejected() {
        let settings = Settings::for_address("  ");
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_inverted_mass_range_rejected() {
        let mut settings = Settings::for_address("rga:10014");
        settings.recording.barchart.start_mass = 100;
        settings.recording.barchart.end_mass = 10;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_influx_requires_org_and_bucket() {
        let mut settings = Settings::for_address("rga:10014");
        settings.sink = SinkConfig {
            influx: true,
            url: "https://influx.lab".to_string(),
            api_token: "token".to_string(),
            org: "lab".to_string(),
            bucket: String::new(),
            skip_tls: false,
        };
        let err = settings.validate().unwrap_err();
        assert!(err.contains("sink.bucket"));

        settings.sink.bucket = "rga".to_string();
        assert!(settings.validate().is_ok());
    }
}
