//! AT command cycle description.
//!
//! A [`Command`] is immutable for the duration of one executor cycle: the
//! outgoing bytes, what counts as success, how long to wait, and whether
//! the captured response should be stripped of line endings before it is
//! handed back.

use std::time::Duration;

/// Default per-command response budget.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// The fixed error token; a reply containing it fails the cycle
/// unconditionally.
pub const ERROR_TOKEN: &str = "ERROR";

// ── Expectation ──────────────────────────────────────────────────

/// What the executor waits for before declaring a cycle successful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    /// All tokens present in the response, in order.
    Tokens(Vec<String>),

    /// Any one token of the set present in the response. Used where the
    /// modem has several equally fine answers (`CONNECT OK` vs
    /// `ALREADY CONNECT`).
    AnyToken(Vec<String>),

    /// At least this many bytes accumulated. Used for replies that carry
    /// no closing token at all (`AT+CIFSR` answers with a bare IP).
    MinBytes(usize),
}

// ── Command ──────────────────────────────────────────────────────

/// One outgoing command paired with its completion criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Raw bytes written to the modem, including the trailing CRLF for
    /// textual commands. Also used for raw data payloads after a send
    /// prompt, which carry no line ending.
    pub bytes: Vec<u8>,

    /// Success criteria evaluated against the accumulated response.
    pub expect: Expectation,

    /// Response budget for this cycle.
    pub timeout: Duration,

    /// Strip every CR/LF from the delivered response. Off for replies
    /// whose exact bytes matter.
    pub trim_response: bool,
}

impl Command {
    /// A textual command expecting a plain `OK` within the default
    /// timeout, response trimmed.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            expect: Expectation::Tokens(vec!["OK".into()]),
            timeout: DEFAULT_TIMEOUT,
            trim_response: true,
        }
    }

    /// Expect all of `tokens`, in order.
    pub fn expecting(mut self, tokens: &[&str]) -> Self {
        self.expect = Expectation::Tokens(tokens.iter().map(|t| t.to_string()).collect());
        self
    }

    /// Expect any one of `tokens`.
    pub fn expecting_any(mut self, tokens: &[&str]) -> Self {
        self.expect = Expectation::AnyToken(tokens.iter().map(|t| t.to_string()).collect());
        self
    }

    /// Expect at least `n` response bytes.
    pub fn expecting_min_bytes(mut self, n: usize) -> Self {
        self.expect = Expectation::MinBytes(n);
        self
    }

    /// Override the response budget.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Deliver the response exactly as captured, line endings included.
    pub fn raw_response(mut self) -> Self {
        self.trim_response = false;
        self
    }

    /// The command with CR/LF removed, for log lines.
    pub fn display(&self) -> String {
        normalize(&self.bytes)
    }
}

/// Lossy string form of `bytes` with every CR and LF removed.
pub fn normalize(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_expect_ok() {
        let cmd = Command::new("AT\r\n");
        assert_eq!(cmd.expect, Expectation::Tokens(vec!["OK".into()]));
        assert_eq!(cmd.timeout, DEFAULT_TIMEOUT);
        assert!(cmd.trim_response);
    }

    #[test]
    fn builder_overrides() {
        let cmd = Command::new("AT+CIPSTART=\"TCP\",\"h\",\"80\"\r\n")
            .expecting_any(&["CONNECT OK", "ALREADY CONNECT"])
            .with_timeout(Duration::from_secs(6))
            .raw_response();
        assert!(matches!(cmd.expect, Expectation::AnyToken(ref t) if t.len() == 2));
        assert_eq!(cmd.timeout, Duration::from_secs(6));
        assert!(!cmd.trim_response);
    }

    #[test]
    fn display_strips_line_endings() {
        let cmd = Command::new("AT+CPIN?\r\n");
        assert_eq!(cmd.display(), "AT+CPIN?");
    }

    #[test]
    fn normalize_handles_interior_newlines() {
        assert_eq!(normalize(b"AT\r\nOK\r\n"), "ATOK");
    }
}
