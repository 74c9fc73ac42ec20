//! Telemetry service core logic.
//!
//! Owns the configuration and the shutdown token, and drives one modem
//! session through its whole life: bring-up, network join, broker
//! connect, handshake, the role loop, and teardown.

use std::error::Error;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use cellink_core::{
    ClientRole, Handshake, ModemError, ModemSession, SerialLink, SocketKind, TelemetryReport,
    Transport,
};

use crate::config::NodeConfig;
use crate::sensor::Sensor;

// ── TelemetryService ─────────────────────────────────────────────

/// The top-level telemetry service.
///
/// Shutdown is requested by cancelling the token obtained from
/// [`shutdown_handle`](Self::shutdown_handle); the loops observe it at
/// their next suspension point and the session is closed cleanly.
pub struct TelemetryService {
    config: NodeConfig,
    shutdown: CancellationToken,
}

impl TelemetryService {
    /// Create a new service with the given config.
    pub fn new(config: NodeConfig) -> Self {
        Self {
            config,
            shutdown: CancellationToken::new(),
        }
    }

    /// Token for requesting shutdown from another task or a signal
    /// handler.
    pub fn shutdown_handle(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run the service until the connection ends or shutdown is
    /// requested.
    ///
    /// 1. Opens the serial link and brings the modem up.
    /// 2. Joins the cellular network and connects to the broker.
    /// 3. Sends the role handshake.
    /// 4. Publishes samples, or consumes frames, until done.
    /// 5. Closes the connection and shuts the context down.
    pub async fn run<S: Sensor>(&self, mut sensor: S) -> Result<(), Box<dyn Error>> {
        let role: ClientRole = self.config.telemetry.role.parse()?;

        let link = SerialLink::open(&self.config.serial.device, self.config.serial.baud_rate)?;
        let mut session = ModemSession::new(link);

        session.bring_up().await?;
        session.join(&self.config.network.apn).await?;
        session
            .start_connection(
                &self.config.network.host,
                self.config.network.port,
                SocketKind::Tcp,
            )
            .await?;

        session.send(&Handshake::new(role).to_json()?).await?;
        info!(%role, "handshake sent");

        let outcome = match role {
            ClientRole::Publisher => self.publish_loop(&mut session, &mut sensor).await,
            ClientRole::Subscriber => self.subscribe_loop(&mut session).await,
        };

        match outcome {
            Ok(()) => {
                // The peer may already have closed on us.
                if session.phase().is_connected() {
                    session.close().await?;
                }
                session.shutdown().await?;
                info!("clean shutdown complete");
                Ok(())
            }
            Err(e) => {
                // Best-effort teardown; the original failure is the one
                // worth reporting.
                if let Err(te) = session.shutdown().await {
                    warn!(error = %te, "teardown after failure also failed");
                }
                Err(e.into())
            }
        }
    }

    // ── Role Loops ───────────────────────────────────────────────

    /// Publish one sample per tick until cancelled.
    async fn publish_loop<T: Transport, S: Sensor>(
        &self,
        session: &mut ModemSession<T>,
        sensor: &mut S,
    ) -> Result<(), ModemError> {
        let period = Duration::from_secs(self.config.telemetry.publish_interval_secs.max(1));
        let mut ticker = tokio::time::interval(period);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("shutdown requested; stopping publisher");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    let reading = sensor.read()?;
                    let report = TelemetryReport {
                        humidity: reading.humidity,
                        temperature: reading.temperature,
                        // The wire format carries hectopascals.
                        pressure: reading.pressure / 100.0,
                    };
                    session.send(&report.to_json()?).await?;
                    info!(
                        temperature = %report.temperature,
                        pressure = %report.pressure,
                        humidity = %report.humidity,
                        "published sample"
                    );
                }
            }
        }
    }

    /// Consume inbound frames until the peer closes or we are cancelled.
    async fn subscribe_loop<T: Transport>(
        &self,
        session: &mut ModemSession<T>,
    ) -> Result<(), ModemError> {
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("shutdown requested; stopping subscriber");
                    return Ok(());
                }
                frame = session.read_frame() => match frame {
                    Ok(frame) => {
                        info!(payload = %String::from_utf8_lossy(&frame), "received");
                    }
                    Err(ModemError::ConnectionClosed) => return Ok(()),
                    Err(e) => return Err(e),
                }
            }
        }
    }
}
