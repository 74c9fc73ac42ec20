//! Domain-specific error types for the modem engine.
//!
//! All fallible operations return `Result<T, ModemError>`.
//! No panics on bad modem output — every failure is typed and tells the
//! caller what actually went wrong: a dead serial line, an elapsed
//! deadline, an explicit `ERROR` reply, or a malformed inbound frame.

use std::time::Duration;
use thiserror::Error;

/// The canonical error type for the modem engine.
#[derive(Debug, Error)]
pub enum ModemError {
    // ── Transport Errors ─────────────────────────────────────────
    /// The serial device reported an I/O failure.
    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The serial reader thread is gone and no more bytes can arrive.
    #[error("serial reader channel closed")]
    ChannelClosed,

    // ── Command Cycle Errors ─────────────────────────────────────
    /// No matching response arrived within the command's budget.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// The modem answered with an explicit `ERROR` token.
    #[error("modem reported ERROR: [ {response} ]")]
    Protocol {
        /// The full response captured for the failed cycle,
        /// whitespace-normalized.
        response: String,
    },

    // ── Inbound Data Errors ──────────────────────────────────────
    /// The `+IPD,<len>:` header of an inbound frame could not be parsed.
    #[error("malformed inbound frame header: {0}")]
    FrameParse(String),

    /// The remote peer closed the TCP connection.
    #[error("connection closed by remote peer")]
    ConnectionClosed,

    // ── Workflow Errors ──────────────────────────────────────────
    /// The SIM did not report readiness within the retry budget.
    #[error("SIM not ready after {attempts} attempts")]
    SimNotReady { attempts: u32 },

    /// An operation was attempted in a link phase that does not allow it.
    #[error("invalid link state: {0}")]
    LinkState(&'static str),

    // ── Serialization Errors ─────────────────────────────────────
    /// Encoding an application payload failed.
    #[error("encoding error: {0}")]
    Encoding(String),
}

impl From<serde_json::Error> for ModemError {
    fn from(e: serde_json::Error) -> Self {
        ModemError::Encoding(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = ModemError::Timeout(Duration::from_millis(2000));
        assert!(e.to_string().contains("2s"));

        let e = ModemError::Protocol {
            response: "AT+CSTT ERROR".into(),
        };
        assert!(e.to_string().contains("ERROR"));

        let e = ModemError::SimNotReady { attempts: 3 };
        assert!(e.to_string().contains('3'));
    }

    #[test]
    fn from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broke");
        let e: ModemError = io_err.into();
        assert!(matches!(e, ModemError::Io(_)));
    }
}
