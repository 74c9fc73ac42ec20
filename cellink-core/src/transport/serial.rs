//! Serial line transport over a `serialport` device.
//!
//! The `serialport` crate exposes blocking reads only, so the link runs a
//! dedicated reader thread that forwards each burst over a bounded channel.
//! `read_some` awaits the channel; `data_available` peeks at it. The write
//! half stays on the caller's thread — writes land in the kernel tty
//! buffer and never block for long at AT-command sizes.

use std::io::{self, Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serialport::{DataBits, Parity, SerialPort, StopBits};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::ModemError;
use crate::scoped::Scoped;
use crate::transport::Transport;

/// How long the reader thread blocks on the device before re-checking the
/// stop flag.
const READ_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Reader thread buffer size; a full modem burst fits comfortably.
const READ_CHUNK: usize = 1024;

/// A serial device opened at 8-N-1 with an async read side.
pub struct SerialLink {
    writer: Scoped<Box<dyn SerialPort>>,
    rx: mpsc::Receiver<io::Result<Vec<u8>>>,
    stop: Arc<AtomicBool>,
}

impl SerialLink {
    /// Open `path` at `baud_rate` and spawn the reader thread.
    pub fn open(path: &str, baud_rate: u32) -> Result<Self, ModemError> {
        let port = serialport::new(path, baud_rate)
            .timeout(READ_POLL_INTERVAL)
            .data_bits(DataBits::Eight)
            .stop_bits(StopBits::One)
            .parity(Parity::None)
            .open()
            .map_err(io::Error::from)?;

        let reader = port.try_clone().map_err(io::Error::from)?;
        let (tx, rx) = mpsc::channel(32);
        let stop = Arc::new(AtomicBool::new(false));

        let reader_stop = Arc::clone(&stop);
        std::thread::Builder::new()
            .name("serial-reader".into())
            .spawn(move || read_loop(reader, tx, reader_stop))?;

        debug!(device = path, baud = baud_rate, "serial link open");

        Ok(Self {
            writer: Scoped::new(port),
            rx,
            stop,
        })
    }
}

/// Blocking read loop: forward every burst until stopped or the port dies.
fn read_loop(
    mut port: Box<dyn SerialPort>,
    tx: mpsc::Sender<io::Result<Vec<u8>>>,
    stop: Arc<AtomicBool>,
) {
    let mut buf = [0u8; READ_CHUNK];
    while !stop.load(Ordering::Relaxed) {
        match port.read(&mut buf) {
            Ok(0) => continue,
            Ok(n) => {
                if tx.blocking_send(Ok(buf[..n].to_vec())).is_err() {
                    // Link dropped; nobody is listening anymore.
                    break;
                }
            }
            // The device-level timeout is just our stop-flag poll tick.
            Err(e) if e.kind() == io::ErrorKind::TimedOut => continue,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                let _ = tx.blocking_send(Err(e));
                break;
            }
        }
    }
}

#[async_trait]
impl Transport for SerialLink {
    async fn write(&mut self, bytes: &[u8]) -> Result<(), ModemError> {
        let port = self
            .writer
            .get_mut()
            .ok_or(ModemError::LinkState("serial writer released"))?;
        port.write_all(bytes)?;
        port.flush()?;
        Ok(())
    }

    async fn read_some(&mut self) -> Result<Vec<u8>, ModemError> {
        match self.rx.recv().await {
            Some(Ok(chunk)) => Ok(chunk),
            Some(Err(e)) => Err(e.into()),
            None => Err(ModemError::ChannelClosed),
        }
    }

    fn data_available(&self) -> bool {
        !self.rx.is_empty()
    }
}

impl Drop for SerialLink {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        // The writer handle is released by its guard; the reader thread
        // exits on its next poll tick.
    }
}
