//! Modem session — the connection-lifecycle workflow.
//!
//! [`ModemSession`] chains command cycles into the higher-level steps:
//! bring-up, network join, TCP connect, send, framed receive, close.
//! It holds a [`CommandExecutor`] rather than extending one; the
//! executor speaks command cycles, the session speaks workflow.
//!
//! The lifecycle is modeled by [`LinkPhase`] with validated transitions:
//!
//! ```text
//!  Idle ──► Ready ──► Joined ──► Connected ──► Closed
//!   (bring-up)  (join)    (connect)    (close / shutdown / peer CLOSED)
//! ```
//!
//! A failed step leaves the phase untouched and surfaces its error to the
//! caller; only the SIM-readiness probe retries, everything else fails
//! fast. Reconnection policy lives above this layer.

use std::fmt;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio_util::codec::Decoder;
use tracing::{debug, info, warn};

use crate::command::{Command, DEFAULT_TIMEOUT};
use crate::error::ModemError;
use crate::executor::CommandExecutor;
use crate::framer::{DATA_MARKER, IpdDecoder};
use crate::matcher;
use crate::transport::Transport;

/// SIM readiness is polled at most this many times during bring-up.
const SIM_READY_ATTEMPTS: u32 = 3;

/// Unsolicited notification the modem emits when the peer drops the
/// connection.
pub const CLOSED_TOKEN: &str = "CLOSED";

/// Context and connect commands get three times the default budget.
fn extended_timeout() -> Duration {
    DEFAULT_TIMEOUT * 3
}

// ── LinkPhase ────────────────────────────────────────────────────

/// The current phase of the modem link lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LinkPhase {
    /// Nothing verified yet. Initial state.
    #[default]
    Idle,

    /// Modem probed, functionality set, SIM ready.
    Ready,

    /// Wireless context up, local IP resolved.
    Joined,

    /// TCP/UDP connection established.
    Connected {
        /// When the connection came up.
        since: Instant,
    },

    /// Connection torn down, locally or by the peer. Terminal.
    Closed,
}

impl fmt::Display for LinkPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Ready => write!(f, "Ready"),
            Self::Joined => write!(f, "Joined"),
            Self::Connected { .. } => write!(f, "Connected"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

impl LinkPhase {
    /// Whether the link is up and ready for payload traffic.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    /// How long the connection has been up, in any other phase `None`.
    pub fn connected_duration(&self) -> Option<Duration> {
        match self {
            Self::Connected { since } => Some(since.elapsed()),
            _ => None,
        }
    }

    // ── Transitions ──────────────────────────────────────────────

    /// Bring-up finished. Valid from: `Idle`.
    pub fn complete_bringup(&mut self) -> Result<(), ModemError> {
        match self {
            Self::Idle => {
                *self = Self::Ready;
                Ok(())
            }
            _ => Err(ModemError::LinkState("bring-up only valid from Idle")),
        }
    }

    /// Network join finished. Valid from: `Ready`.
    pub fn complete_join(&mut self) -> Result<(), ModemError> {
        match self {
            Self::Ready => {
                *self = Self::Joined;
                Ok(())
            }
            _ => Err(ModemError::LinkState("join only valid from Ready")),
        }
    }

    /// Connection established. Valid from: `Joined`.
    pub fn complete_connect(&mut self) -> Result<(), ModemError> {
        match self {
            Self::Joined => {
                *self = Self::Connected {
                    since: Instant::now(),
                };
                Ok(())
            }
            _ => Err(ModemError::LinkState("connect only valid from Joined")),
        }
    }

    /// Connection closed. Valid from: `Connected`.
    pub fn complete_close(&mut self) -> Result<(), ModemError> {
        match self {
            Self::Connected { .. } => {
                *self = Self::Closed;
                Ok(())
            }
            _ => Err(ModemError::LinkState("close only valid from Connected")),
        }
    }

    /// Context shut down. Valid from any phase past `Idle`; idempotent
    /// once closed.
    pub fn complete_shutdown(&mut self) -> Result<(), ModemError> {
        match self {
            Self::Idle => Err(ModemError::LinkState("shutdown before bring-up")),
            _ => {
                *self = Self::Closed;
                Ok(())
            }
        }
    }
}

// ── SocketKind ───────────────────────────────────────────────────

/// Transport protocol for the modem's data connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketKind {
    Tcp,
    Udp,
}

impl SocketKind {
    /// The mode string the connect command expects.
    fn as_at(self) -> &'static str {
        match self {
            Self::Tcp => "TCP",
            Self::Udp => "UDP",
        }
    }
}

// ── ModemSession ─────────────────────────────────────────────────

/// Drives one modem through the full connection workflow.
///
/// Strictly sequential: every method awaits its command cycles one after
/// another, and `&mut self` keeps the whole session single-file.
pub struct ModemSession<T: Transport> {
    executor: CommandExecutor<T>,
    decoder: IpdDecoder,
    phase: LinkPhase,
}

impl<T: Transport> ModemSession<T> {
    pub fn new(transport: T) -> Self {
        Self {
            executor: CommandExecutor::new(transport),
            decoder: IpdDecoder,
            phase: LinkPhase::Idle,
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> &LinkPhase {
        &self.phase
    }

    /// Direct executor access, for composed reads and tests.
    pub fn executor_mut(&mut self) -> &mut CommandExecutor<T> {
        &mut self.executor
    }

    // ── Workflow Steps ───────────────────────────────────────────

    /// Probe the modem, set full functionality, verify SIM readiness.
    ///
    /// The SIM probe is the one place with automatic retry: up to
    /// [`SIM_READY_ATTEMPTS`] polls, stopping at the first success.
    /// Transport failures are not retried — a dead serial line will not
    /// heal between polls.
    pub async fn bring_up(&mut self) -> Result<(), ModemError> {
        self.executor.execute(&Command::new("AT\r\n")).await?;
        self.executor.execute(&Command::new("AT+CFUN=1\r\n")).await?;

        for attempt in 1..=SIM_READY_ATTEMPTS {
            let probe = Command::new("AT+CPIN?\r\n").expecting(&["+CPIN: READY"]);
            match self.executor.execute(&probe).await {
                Ok(_) => {
                    self.phase.complete_bringup()?;
                    info!("modem ready");
                    return Ok(());
                }
                Err(e @ ModemError::Io(_)) | Err(e @ ModemError::ChannelClosed) => {
                    return Err(e);
                }
                Err(e) => warn!(attempt, error = %e, "SIM readiness probe failed"),
            }
        }
        Err(ModemError::SimNotReady {
            attempts: SIM_READY_ATTEMPTS,
        })
    }

    /// Join the network: tear down any stale context, set the APN,
    /// bring up the wireless context, resolve the local address.
    ///
    /// Each step runs only if the previous one succeeded.
    pub async fn join(&mut self, apn: &str) -> Result<(), ModemError> {
        self.executor
            .execute(&Command::new("AT+CIPSHUT\r\n").expecting(&["SHUT OK"]))
            .await?;

        self.executor
            .execute(&Command::new(format!("AT+CSTT=\"{apn}\",\"\",\"\"\r\n")))
            .await?;

        self.executor
            .execute(&Command::new("AT+CIICR\r\n").with_timeout(extended_timeout()))
            .await?;

        // The address reply carries no closing OK — just the echo and a
        // bare dotted quad — so completion is a byte-count threshold.
        let ip_cmd = "AT+CIFSR\r\n";
        let min_reply = ip_cmd.len() + "0.0.0.0".len();
        let reply = self
            .executor
            .execute(&Command::new(ip_cmd).expecting_min_bytes(min_reply))
            .await?;

        self.phase.complete_join()?;
        info!(reply = %String::from_utf8_lossy(&reply), apn, "wireless context up");
        Ok(())
    }

    /// Open a data connection to `host:port`.
    ///
    /// Header inclusion is switched on first so inbound data arrives
    /// framed for [`read_frame`](Self::read_frame). The connect command
    /// gets an extended budget and accepts `ALREADY CONNECT` as success.
    pub async fn start_connection(
        &mut self,
        host: &str,
        port: u16,
        kind: SocketKind,
    ) -> Result<(), ModemError> {
        self.executor
            .execute(&Command::new("AT+CIPHEAD=1\r\n"))
            .await?;

        let connect = Command::new(format!(
            "AT+CIPSTART=\"{}\",\"{host}\",\"{port}\"\r\n",
            kind.as_at()
        ))
        .expecting_any(&["CONNECT OK", "ALREADY CONNECT"])
        .with_timeout(extended_timeout());
        self.executor.execute(&connect).await?;

        self.phase.complete_connect()?;
        info!(host, port, "connection up");
        Ok(())
    }

    /// Ship one payload: announce its length, wait for the prompt, write
    /// the raw bytes, wait for the send acknowledgement.
    pub async fn send(&mut self, payload: &[u8]) -> Result<(), ModemError> {
        if !self.phase.is_connected() {
            return Err(ModemError::LinkState("cannot send: not connected"));
        }

        self.executor
            .execute(&Command::new(format!("AT+CIPSEND={}\r\n", payload.len())).expecting(&[">"]))
            .await?;

        self.executor
            .execute(
                &Command::new(payload.to_vec())
                    .expecting(&["SEND OK"])
                    .raw_response(),
            )
            .await?;

        debug!(len = payload.len(), "payload sent");
        Ok(())
    }

    /// Receive one framed inbound payload.
    ///
    /// Drives the frame decoder over the spillover buffer, reading more
    /// as needed. Bytes beyond the declared frame length stay buffered
    /// for the next call. A bare `CLOSED` notification with no frame in
    /// flight means the peer dropped the connection.
    pub async fn read_frame(&mut self) -> Result<Bytes, ModemError> {
        if !self.phase.is_connected() {
            return Err(ModemError::LinkState("cannot read: not connected"));
        }

        loop {
            if let Some(frame) = self.decoder.decode(self.executor.spillover_mut())? {
                debug!(len = frame.len(), "inbound frame");
                return Ok(frame);
            }

            let spill = self.executor.spillover();
            if matcher::contains(spill, CLOSED_TOKEN.as_bytes())
                && !matcher::contains(spill, DATA_MARKER.as_bytes())
            {
                warn!("peer closed the connection");
                self.phase.complete_close()?;
                return Err(ModemError::ConnectionClosed);
            }

            self.executor.fill_spillover().await?;
        }
    }

    /// Close the data connection.
    pub async fn close(&mut self) -> Result<(), ModemError> {
        self.executor
            .execute(&Command::new("AT+CIPCLOSE\r\n").expecting(&["CLOSE OK"]))
            .await?;
        self.phase.complete_close()?;
        info!("connection closed");
        Ok(())
    }

    /// Shut the wireless context down.
    pub async fn shutdown(&mut self) -> Result<(), ModemError> {
        self.executor
            .execute(&Command::new("AT+CIPSHUT\r\n").expecting(&["SHUT OK"]))
            .await?;
        self.phase.complete_shutdown()?;
        info!("context shut down");
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_lifecycle() {
        let mut phase = LinkPhase::Idle;

        phase.complete_bringup().unwrap();
        assert_eq!(phase, LinkPhase::Ready);

        phase.complete_join().unwrap();
        assert_eq!(phase, LinkPhase::Joined);

        phase.complete_connect().unwrap();
        assert!(phase.is_connected());
        assert!(phase.connected_duration().is_some());

        phase.complete_close().unwrap();
        assert_eq!(phase, LinkPhase::Closed);
    }

    #[test]
    fn invalid_transition_join_before_bringup() {
        let mut phase = LinkPhase::Idle;
        assert!(phase.complete_join().is_err());
        assert_eq!(phase, LinkPhase::Idle);
    }

    #[test]
    fn invalid_transition_connect_from_ready() {
        let mut phase = LinkPhase::Ready;
        assert!(phase.complete_connect().is_err());
        assert_eq!(phase, LinkPhase::Ready);
    }

    #[test]
    fn invalid_transition_double_bringup() {
        let mut phase = LinkPhase::Idle;
        phase.complete_bringup().unwrap();
        assert!(phase.complete_bringup().is_err());
    }

    #[test]
    fn shutdown_valid_from_any_phase_past_idle() {
        let mut phase = LinkPhase::Joined;
        phase.complete_shutdown().unwrap();
        assert_eq!(phase, LinkPhase::Closed);

        // Idempotent once closed.
        phase.complete_shutdown().unwrap();
        assert_eq!(phase, LinkPhase::Closed);

        let mut idle = LinkPhase::Idle;
        assert!(idle.complete_shutdown().is_err());
    }

    #[test]
    fn close_only_from_connected() {
        let mut phase = LinkPhase::Joined;
        assert!(phase.complete_close().is_err());
        assert_eq!(phase, LinkPhase::Joined);
    }

    #[test]
    fn display_names() {
        assert_eq!(LinkPhase::Idle.to_string(), "Idle");
        assert_eq!(
            LinkPhase::Connected {
                since: Instant::now()
            }
            .to_string(),
            "Connected"
        );
    }
}
