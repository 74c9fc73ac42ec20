//! Configuration for the telemetry node.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Serial link to the modem.
    pub serial: SerialConfig,
    /// Cellular network and broker endpoint.
    pub network: NetworkConfig,
    /// Role and publish cadence.
    pub telemetry: TelemetryConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Serial link settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Modem device path.
    pub device: String,
    /// Baud rate for the modem UART.
    pub baud_rate: u32,
}

/// Cellular network and broker endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Access Point Name of the cellular data context.
    pub apn: String,
    /// Broker host name or address.
    pub host: String,
    /// Broker TCP port.
    pub port: u16,
}

/// Telemetry role and cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// "publisher" or "subscriber".
    pub role: String,
    /// Seconds between published samples.
    pub publish_interval_secs: u64,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            serial: SerialConfig::default(),
            network: NetworkConfig::default(),
            telemetry: TelemetryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyS0".into(),
            baud_rate: 9600,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            apn: "internet".into(),
            host: "127.0.0.1".into(),
            port: 7000,
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            role: "publisher".into(),
            publish_interval_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".into() }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let cfg = NodeConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        assert!(text.contains("device"));
        assert!(text.contains("apn"));
        assert!(text.contains("publish_interval_secs"));
    }

    #[test]
    fn roundtrip_config() {
        let cfg = NodeConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed: NodeConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.serial.baud_rate, 9600);
        assert_eq!(parsed.network.port, 7000);
        assert_eq!(parsed.telemetry.role, "publisher");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let parsed: NodeConfig = toml::from_str(
            r#"
            [network]
            apn = "iot.provider"
            host = "telemetry.example"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.network.apn, "iot.provider");
        assert_eq!(parsed.network.port, 7000);
        assert_eq!(parsed.serial.device, "/dev/ttyS0");
    }
}
