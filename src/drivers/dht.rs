//! AM2301 / DHT21 temperature and humidity sensor.
//!
//! Single-wire, open-drain protocol:
//!
//! ```text
//!   host:   ‾‾‾\____ ≥1ms ____/‾‾ 30µs ‾‾
//!   sensor:                         \_80µs_/‾80µs‾\  40 × (\_50µs_/‾26µs or 70µs‾\)
//! ```
//!
//! A bit is `1` when its high phase is longer than the low phase that
//! precedes it.  Widths are measured in 1 µs polling ticks, so the
//! comparison holds whatever the loop overhead is.  The 40 bits are
//! humidity (16), temperature (16, sign-magnitude) and a checksum byte.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::error::SensorError;
use crate::sensors::climate::ClimateSample;

const START_LOW_US: u32 = 1_100;
const RELEASE_US: u32 = 30;
/// Upper bound for any single level in polling ticks.
const LEVEL_TIMEOUT_TICKS: u32 = 200;

pub struct Dht21<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> Dht21<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    /// Take an open-drain pin with pull-up; the line is released high.
    pub fn new(mut pin: P, delay: D) -> Result<Self, SensorError> {
        pin.set_high().map_err(|_| SensorError::Gpio)?;
        Ok(Self { pin, delay })
    }

    /// Run one handshake and return a checksum-verified sample.
    pub fn read(&mut self) -> Result<ClimateSample, SensorError> {
        self.pin.set_low().map_err(|_| SensorError::Gpio)?;
        self.delay.delay_us(START_LOW_US);

        let raw = critical_section::with(|_cs| self.read_frame())?;
        decode_frame(raw)
    }

    fn read_frame(&mut self) -> Result<[u8; 5], SensorError> {
        self.pin.set_high().map_err(|_| SensorError::Gpio)?;
        self.delay.delay_us(RELEASE_US);

        // Sensor response: 80µs low, 80µs high.
        self.level_ticks(true).map_err(|_| SensorError::NoResponse)?;
        self.level_ticks(false).map_err(|_| SensorError::NoResponse)?;
        self.level_ticks(true).map_err(|_| SensorError::NoResponse)?;

        let mut data = [0u8; 5];
        for byte in &mut data {
            for _ in 0..8 {
                let low = self.level_ticks(false)?;
                let high = self.level_ticks(true)?;
                *byte = (*byte << 1) | u8::from(high > low);
            }
        }
        Ok(data)
    }

    /// Count ticks while the line stays at `level`.
    fn level_ticks(&mut self, level: bool) -> Result<u32, SensorError> {
        let mut ticks = 0;
        loop {
            let high = self.pin.is_high().map_err(|_| SensorError::Gpio)?;
            if high != level {
                return Ok(ticks);
            }
            ticks += 1;
            if ticks > LEVEL_TIMEOUT_TICKS {
                return Err(SensorError::Timeout);
            }
            self.delay.delay_us(1);
        }
    }
}

/// Decode the five raw bytes of a DHT21 frame.
pub fn decode_frame(raw: [u8; 5]) -> Result<ClimateSample, SensorError> {
    let sum = raw[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != raw[4] {
        return Err(SensorError::Checksum);
    }

    let humidity = f32::from(u16::from_be_bytes([raw[0], raw[1]])) / 10.0;
    let magnitude = f32::from(u16::from_be_bytes([raw[2] & 0x7F, raw[3]])) / 10.0;
    let temperature = if raw[2] & 0x80 != 0 {
        -magnitude
    } else {
        magnitude
    };

    Ok(ClimateSample {
        temperature,
        humidity,
    })
}
