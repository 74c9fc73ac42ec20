//! Duplex byte-stream abstraction over the modem's serial line.
//!
//! The executor only ever sees this trait, so tests drive it with a
//! scripted transport and the binary plugs in [`SerialLink`]. The link is
//! half-duplex in practice: the engine keeps at most one read outstanding,
//! which the `&mut self` receivers enforce at compile time.

mod serial;

pub use serial::SerialLink;

use async_trait::async_trait;

use crate::error::ModemError;

/// A byte stream with a fire-and-forget write side and a single
/// outstanding asynchronous read.
#[async_trait]
pub trait Transport: Send {
    /// Queue `bytes` for transmission.
    async fn write(&mut self, bytes: &[u8]) -> Result<(), ModemError>;

    /// Wait until at least one byte arrives and return the burst.
    async fn read_some(&mut self) -> Result<Vec<u8>, ModemError>;

    /// Non-blocking poll: are more bytes already waiting to be read?
    ///
    /// The executor uses this to drain a fragmented burst before
    /// evaluating its completion predicate.
    fn data_available(&self) -> bool;
}
