//! Environment sensor boundary.
//!
//! The node only ever sees [`Reading`]s; how they are produced is the
//! sensor's business. [`SimulatedSensor`] generates a plausible random
//! walk for development hosts without the physical part wired up.

use std::io;

/// One environment sample.
///
/// Temperature in degrees Celsius, pressure in pascals, relative
/// humidity in percent. Unit conversion for the wire format happens at
/// the point of publication.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub temperature: f32,
    pub pressure: f32,
    pub humidity: f32,
}

/// Synchronous sample producer, invoked once per publish cycle.
pub trait Sensor: Send {
    fn read(&mut self) -> io::Result<Reading>;
}

// ── SimulatedSensor ──────────────────────────────────────────────

/// Random-walk sensor for hosts without the physical part.
#[derive(Debug)]
pub struct SimulatedSensor {
    last: Reading,
}

impl SimulatedSensor {
    pub fn new() -> Self {
        Self {
            last: Reading {
                temperature: 21.5,
                pressure: 101_300.0,
                humidity: 45.0,
            },
        }
    }
}

impl Default for SimulatedSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl Sensor for SimulatedSensor {
    fn read(&mut self) -> io::Result<Reading> {
        use rand::Rng;
        let mut rng = rand::rng();

        self.last = Reading {
            temperature: (self.last.temperature + rng.random_range(-0.3..0.3)).clamp(-10.0, 45.0),
            pressure: (self.last.pressure + rng.random_range(-40.0..40.0))
                .clamp(95_000.0, 106_000.0),
            humidity: (self.last.humidity + rng.random_range(-0.8..0.8)).clamp(5.0, 95.0),
        };
        Ok(self.last)
    }
}
