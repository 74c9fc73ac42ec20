//! # cellink-node — Cellular Telemetry Node
//!
//! Reads periodic environment samples and ships them as JSON over a
//! cellular modem's TCP stack to a remote broker, or — in subscriber
//! mode — receives framed payloads from the broker and logs them.
//!
//! The modem workflow (bring-up, network join, connect, send, receive,
//! close) lives in `cellink-core`; this crate supplies configuration,
//! the sensor collaborator boundary, the service loop, and shutdown
//! wiring.

pub mod config;
pub mod sensor;
pub mod service;
