//! # cellink-core
//!
//! Modem engine for the cellink telemetry node: drives a SIM800-class
//! cellular modem over a serial line with the textual AT protocol and
//! exposes the connection-lifecycle workflow on top.
//!
//! This crate contains:
//! - **Command engine**: [`CommandExecutor`] — one write paired with a
//!   predicate-driven, timeout-bounded read loop
//! - **Session workflow**: [`ModemSession`] — bring-up, network join,
//!   connect, send, framed receive, close, over a validated [`LinkPhase`]
//!   state machine
//! - **Framing**: [`IpdDecoder`] for `+IPD,<len>:<payload>` inbound data
//! - **Transport**: the [`Transport`] seam and the [`SerialLink`]
//!   implementation over a serial device
//! - **Payloads**: [`Handshake`] and [`TelemetryReport`] JSON types
//! - **Error**: [`ModemError`] — typed, `thiserror`-based error hierarchy

pub mod command;
pub mod error;
pub mod executor;
pub mod framer;
pub mod matcher;
pub mod protocol;
pub mod scoped;
pub mod session;
pub mod transport;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use command::{Command, DEFAULT_TIMEOUT, ERROR_TOKEN, Expectation};
pub use error::ModemError;
pub use executor::CommandExecutor;
pub use framer::{DATA_MARKER, IpdDecoder};
pub use protocol::{ClientRole, Handshake, TelemetryReport};
pub use scoped::Scoped;
pub use session::{CLOSED_TOKEN, LinkPhase, ModemSession, SocketKind};
pub use transport::{SerialLink, Transport};
