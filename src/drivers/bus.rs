//! X-Core single-wire bus driver.
//!
//! Drives one output line with timed high/low pulses.  Every transmission
//! is a reset pulse, a start pulse, the frame bits (MSB first), an optional
//! extra `1` bit and a trailing `0` stop bit.
//!
//! Everything from the start pulse onward runs inside a critical section:
//! the controller rejects frames whose pulse widths jitter.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::protocol::Frame;

pub const RESET_HIGH_MS: u32 = 325;
pub const RESET_LOW_MS: u32 = 65;
pub const START_HIGH_US: u32 = 900;
pub const SHORT_US: u32 = 208;
pub const LONG_US: u32 = 1875;

/// Owns the bus pin and the delay source.
pub struct BusDriver<P, D> {
    pin: P,
    delay: D,
}

impl<P: OutputPin, D: DelayNs> BusDriver<P, D> {
    /// Take the pin and park the line low.
    pub fn new(mut pin: P, delay: D) -> Result<Self, P::Error> {
        pin.set_low()?;
        Ok(Self { pin, delay })
    }

    /// Send `frame` on the wire.  Blocks for the whole pulse train
    /// (roughly half a second for a zone frame).
    pub fn transmit(&mut self, frame: &Frame) -> Result<(), P::Error> {
        log::debug!(
            "bus: {:?} frame, {} data bits",
            frame.kind(),
            frame.bit_count()
        );

        // Reset
        self.pin.set_high()?;
        self.delay.delay_ms(RESET_HIGH_MS);
        self.pin.set_low()?;
        self.delay.delay_ms(RESET_LOW_MS);

        critical_section::with(|_cs| {
            // Start
            self.pulse(START_HIGH_US, SHORT_US)?;

            for byte in frame.bytes() {
                for i in (0..8).rev() {
                    self.write_bit((byte >> i) & 1 == 1)?;
                }
            }

            if frame.extra_bit() {
                self.write_bit(true)?;
            }

            // Stop
            self.write_bit(false)
        })
    }

    fn write_bit(&mut self, one: bool) -> Result<(), P::Error> {
        if one {
            self.pulse(LONG_US, SHORT_US)
        } else {
            self.pulse(SHORT_US, LONG_US)
        }
    }

    fn pulse(&mut self, high_us: u32, low_us: u32) -> Result<(), P::Error> {
        self.pin.set_high()?;
        self.delay.delay_us(high_us);
        self.pin.set_low()?;
        self.delay.delay_us(low_us);
        Ok(())
    }

    /// Release the pin and delay source.
    pub fn release(self) -> (P, D) {
        (self.pin, self.delay)
    }
}
