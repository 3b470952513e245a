//! # Sensor readings and the samplers that synthesize them.
//!
//! A [`Reading`] is a plain value: producers build it, `send` moves it into a
//! queue, and the consumer takes ownership on `receive`. Nothing is shared
//! by reference between tasks.

use std::fmt;
use std::ops::RangeInclusive;

use rand::Rng;

/// Sensor index, assigned by the supervisor (`0..sensors`).
pub type SensorId = u32;

/// One temperature/humidity sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Reading {
    /// Sensor that produced the sample.
    pub sensor_id: SensorId,
    /// Temperature in °C, within [`Reading::TEMPERATURE`].
    pub temperature: i32,
    /// Relative humidity in %, within [`Reading::HUMIDITY`].
    pub humidity: u32,
}

impl Reading {
    /// Range of simulated temperatures.
    pub const TEMPERATURE: RangeInclusive<i32> = 1..=30;
    /// Range of simulated humidities.
    pub const HUMIDITY: RangeInclusive<u32> = 0..=99;

    /// Creates a reading.
    pub fn new(sensor_id: SensorId, temperature: i32, humidity: u32) -> Self {
        Self {
            sensor_id,
            temperature,
            humidity,
        }
    }
}

impl fmt::Display for Reading {
    /// `Sensor <id>: Temp = <t>°C, Humidity = <h>%`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sensor {}: Temp = {}°C, Humidity = {}%",
            self.sensor_id, self.temperature, self.humidity
        )
    }
}

/// Synthesizes one item per producer cycle.
///
/// `cycle` counts from 0 for each producer and increases by one per period,
/// which lets deterministic samplers stamp sequence numbers.
pub trait Sample: Send + Sync + 'static {
    /// Item placed on the producer's queue.
    type Item: Send + 'static;

    /// Produces the item for `sensor` at `cycle`.
    fn sample(&self, sensor: SensorId, cycle: u64) -> Self::Item;
}

/// Uniformly random readings within the simulated ranges.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomSampler;

impl Sample for RandomSampler {
    type Item = Reading;

    fn sample(&self, sensor: SensorId, _cycle: u64) -> Reading {
        let mut rng = rand::rng();
        Reading {
            sensor_id: sensor,
            temperature: rng.random_range(Reading::TEMPERATURE),
            humidity: rng.random_range(Reading::HUMIDITY),
        }
    }
}
