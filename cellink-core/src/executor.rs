//! The AT command engine.
//!
//! One [`execute`] call is one command cycle: write the command bytes,
//! then loop on transport reads until the response satisfies the
//! command's expectation, the modem answers `ERROR`, or the budget
//! elapses. The `&mut self` receiver keeps cycles strictly sequential —
//! the transport is half-duplex and there is never more than one read
//! outstanding.
//!
//! Two buffers with different lifetimes:
//!
//! - the **response** buffer belongs to the current cycle and is cleared
//!   on entry. A timed-out cycle leaves its partial bytes here; the next
//!   cycle's clear discards them, so a late burst can never leak into a
//!   different command's result.
//! - the **spillover** buffer persists across cycles and holds bytes that
//!   arrived but were not logically consumed — the tail beyond a
//!   requested frame length, or bytes past a matched token sequence.
//!   Frame reads consume it FIFO.
//!
//! [`execute`]: CommandExecutor::execute

use bytes::{Bytes, BytesMut};
use tracing::{debug, error, info, warn};

use crate::command::{Command, ERROR_TOKEN, Expectation, normalize};
use crate::error::ModemError;
use crate::matcher;
use crate::transport::Transport;

/// Pairs one write with a predicate-driven, timeout-bounded read loop.
pub struct CommandExecutor<T: Transport> {
    transport: T,
    response: BytesMut,
    spillover: BytesMut,
}

impl<T: Transport> CommandExecutor<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            response: BytesMut::with_capacity(1024),
            spillover: BytesMut::with_capacity(1024),
        }
    }

    // ── Command Cycles ───────────────────────────────────────────

    /// Run one command cycle to its single terminal outcome.
    ///
    /// The read loop runs under `tokio::time::timeout`; on expiry the
    /// loop future is dropped, so a completion racing the timer is
    /// structurally unobservable — there is no callback left to fire.
    pub async fn execute(&mut self, cmd: &Command) -> Result<Bytes, ModemError> {
        self.response.clear();
        info!(command = %cmd.display(), "executing command");

        self.transport.write(&cmd.bytes).await?;

        let captured = match tokio::time::timeout(cmd.timeout, self.capture(cmd)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(command = %cmd.display(), budget = ?cmd.timeout, "command timed out");
                return Err(ModemError::Timeout(cmd.timeout));
            }
        };

        let normalized = normalize(&captured);
        debug!(response = %normalized, "command completed");

        if cmd.trim_response {
            Ok(Bytes::from(normalized.into_bytes()))
        } else {
            Ok(captured)
        }
    }

    /// Accumulate reads until the expectation is met or `ERROR` shows up.
    ///
    /// After each append the buffer is evaluated in a fixed order: the
    /// error token wins unconditionally, then the success expectation,
    /// and only if neither matched is a still-pending burst drained
    /// before re-evaluating. A response that carries both `ERROR` and
    /// the expected tokens therefore fails.
    async fn capture(&mut self, cmd: &Command) -> Result<Bytes, ModemError> {
        loop {
            let chunk = self.transport.read_some().await?;
            self.response.extend_from_slice(&chunk);

            loop {
                if matcher::contains(&self.response, ERROR_TOKEN.as_bytes()) {
                    let response = normalize(&self.response);
                    error!(response = %response, "response contains ERROR");
                    return Err(ModemError::Protocol { response });
                }
                if expectation_met(&self.response, &cmd.expect) {
                    return Ok(Bytes::copy_from_slice(&self.response));
                }
                if !self.transport.data_available() {
                    break;
                }
                let more = self.transport.read_some().await?;
                self.response.extend_from_slice(&more);
            }
        }
    }

    // ── Spillover Reads ──────────────────────────────────────────

    /// Deliver exactly `n` bytes, reading as needed.
    ///
    /// Bytes already sitting in spillover are served first; anything
    /// read beyond `n` stays there for the next call. No internal
    /// deadline — callers compose one where it matters.
    pub async fn read_amount(&mut self, n: usize) -> Result<Bytes, ModemError> {
        while self.spillover.len() < n {
            let chunk = self.transport.read_some().await?;
            self.spillover.extend_from_slice(&chunk);
        }
        Ok(self.spillover.split_to(n).freeze())
    }

    /// Read until the ordered `tokens` sequence or the `terminator` word
    /// appears in spillover.
    ///
    /// On a token match, the prefix through the final token is removed
    /// and returned. A terminator-only match returns `None` and leaves
    /// the buffer untouched.
    pub async fn read_until_sequence(
        &mut self,
        tokens: &[&str],
        terminator: &str,
    ) -> Result<Option<Bytes>, ModemError> {
        loop {
            if let Some(end) = matcher::find_in_order(&self.spillover, tokens) {
                return Ok(Some(self.spillover.split_to(end).freeze()));
            }
            if matcher::contains(&self.spillover, terminator.as_bytes()) {
                return Ok(None);
            }
            let chunk = self.transport.read_some().await?;
            self.spillover.extend_from_slice(&chunk);
        }
    }

    /// One transport read appended to spillover.
    pub async fn fill_spillover(&mut self) -> Result<(), ModemError> {
        let chunk = self.transport.read_some().await?;
        self.spillover.extend_from_slice(&chunk);
        Ok(())
    }

    // ── Accessors ────────────────────────────────────────────────

    /// Bytes read but not yet logically consumed.
    pub fn spillover(&self) -> &[u8] {
        &self.spillover
    }

    /// Mutable spillover access for frame decoding.
    pub fn spillover_mut(&mut self) -> &mut BytesMut {
        &mut self.spillover
    }
}

/// Evaluate a command's success criteria against the accumulated bytes.
fn expectation_met(buf: &[u8], expect: &Expectation) -> bool {
    match expect {
        Expectation::Tokens(tokens) => matcher::find_in_order(buf, tokens).is_some(),
        Expectation::AnyToken(tokens) => matcher::find_any(buf, tokens).is_some(),
        Expectation::MinBytes(n) => buf.len() >= *n,
    }
}
