//! Application payloads carried over the modem's TCP connection.
//!
//! # Wire Protocol
//!
//! ```text
//! Node ──[Handshake]──────────────────────────► Broker
//!   {"ClientType":"PUBLISHER"}      immediately after connect
//!
//! Node ──[TelemetryReport]────────────────────► Broker   (publisher, repeated)
//!   {"humidity":48.2,"temperature":21.7,"pressure":1013.2}
//!
//! Broker ──[opaque payload]───────────────────► Node     (subscriber, framed)
//! ```
//!
//! Pressure travels in hectopascals.

use serde::{Deserialize, Serialize};

use crate::error::ModemError;

// ── ClientRole ───────────────────────────────────────────────────

/// Declared at connect time; decides whether the node pushes reports or
/// consumes frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientRole {
    #[serde(rename = "PUBLISHER")]
    Publisher,
    #[serde(rename = "SUBSCRIBER")]
    Subscriber,
}

impl std::fmt::Display for ClientRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Publisher => write!(f, "publisher"),
            Self::Subscriber => write!(f, "subscriber"),
        }
    }
}

impl std::str::FromStr for ClientRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "publisher" => Ok(Self::Publisher),
            "subscriber" => Ok(Self::Subscriber),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

// ── Handshake ────────────────────────────────────────────────────

/// First payload on a fresh connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handshake {
    #[serde(rename = "ClientType")]
    pub client_type: ClientRole,
}

impl Handshake {
    pub fn new(client_type: ClientRole) -> Self {
        Self { client_type }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, ModemError> {
        Ok(serde_json::to_vec(self)?)
    }
}

// ── TelemetryReport ──────────────────────────────────────────────

/// One published sensor sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryReport {
    /// Relative humidity, percent.
    pub humidity: f32,
    /// Temperature, degrees Celsius.
    pub temperature: f32,
    /// Pressure, hectopascals.
    pub pressure: f32,
}

impl TelemetryReport {
    pub fn to_json(&self) -> Result<Vec<u8>, ModemError> {
        Ok(serde_json::to_vec(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_wire_shape() {
        let json = serde_json::to_string(&Handshake::new(ClientRole::Publisher)).unwrap();
        assert_eq!(json, r#"{"ClientType":"PUBLISHER"}"#);

        let json = serde_json::to_string(&Handshake::new(ClientRole::Subscriber)).unwrap();
        assert_eq!(json, r#"{"ClientType":"SUBSCRIBER"}"#);
    }

    #[test]
    fn report_wire_shape() {
        let report = TelemetryReport {
            humidity: 48.5,
            temperature: 21.5,
            pressure: 1013.25,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(
            json,
            r#"{"humidity":48.5,"temperature":21.5,"pressure":1013.25}"#
        );
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("Publisher".parse::<ClientRole>(), Ok(ClientRole::Publisher));
        assert_eq!(
            "SUBSCRIBER".parse::<ClientRole>(),
            Ok(ClientRole::Subscriber)
        );
        assert!("broker".parse::<ClientRole>().is_err());
    }

    #[test]
    fn handshake_roundtrip() {
        let hs = Handshake::new(ClientRole::Subscriber);
        let parsed: Handshake = serde_json::from_slice(&hs.to_json().unwrap()).unwrap();
        assert_eq!(parsed, hs);
    }
}
