//! Auxiliary pump relay.
//!
//! A plain digital output that follows zone runs: energised while a
//! non-zero-length zone command is active, released otherwise.  This
//! driver is a dumb actuator; the dispatcher decides when it switches.

use embedded_hal::digital::OutputPin;

pub struct PumpRelay<P> {
    pin: P,
    on: bool,
}

impl<P: OutputPin> PumpRelay<P> {
    /// Take the relay pin; the relay starts released.
    pub fn new(mut pin: P) -> Result<Self, P::Error> {
        pin.set_low()?;
        Ok(Self { pin, on: false })
    }

    pub fn set(&mut self, on: bool) -> Result<(), P::Error> {
        if on {
            self.pin.set_high()?;
        } else {
            self.pin.set_low()?;
        }
        self.on = on;
        log::info!("pump: {}", if on { "on" } else { "off" });
        Ok(())
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}
