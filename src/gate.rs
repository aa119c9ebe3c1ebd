//! Amplifier, I2S and watchdog transitions
//!
//! The gate owns the three side-effecting collaborators the engines switch at
//! fixed points of a session: power up before the first sample, power down
//! after the last one, and the watchdog around the feed.

use crate::error::{PlayerError, Result};
use crate::hal::{I2sOutput, Watchdog};
use embedded_hal::digital::{Error as _, OutputPin};
use log::warn;
use std::time::Duration;

/// Amplifier enable pin, I2S driver and watchdog
#[derive(Debug)]
pub struct HardwareGate<P, I, W> {
    amplifier: P,
    i2s: I,
    watchdog: W,
}

impl<P: OutputPin, I: I2sOutput, W: Watchdog> HardwareGate<P, I, W> {
    /// Bundle the collaborators
    pub fn new(amplifier: P, i2s: I, watchdog: W) -> Self {
        HardwareGate {
            amplifier,
            i2s,
            watchdog,
        }
    }

    /// Enable the amplifier, start I2S and set its rate
    pub fn power_up(&mut self, sample_rate_hz: u32) -> Result<()> {
        self.amplifier
            .set_high()
            .map_err(|e| PlayerError::Gpio(format!("{:?}", e.kind())))?;
        self.i2s.begin();
        self.i2s.set_rate(sample_rate_hz);
        Ok(())
    }

    /// Stop I2S, then disable the amplifier. A stuck pin is logged.
    pub fn power_down(&mut self) {
        self.i2s.end();
        if let Err(e) = self.amplifier_off() {
            warn!("Could not disable amplifier: {e}");
        }
    }

    /// Disable the amplifier, then stop I2S.
    ///
    /// Safe to call from interrupt context: nothing is logged. I2S is stopped
    /// even if the pin fails, and the pin error is returned afterwards.
    pub fn mute_then_power_down(&mut self) -> Result<()> {
        let muted = self.amplifier_off();
        self.i2s.end();
        muted
    }

    /// Disarm the watchdog for a feed loop that will not return soon
    pub fn suspend_watchdog(&mut self) {
        self.watchdog.disable();
    }

    /// Arm the watchdog
    pub fn arm_watchdog(&mut self, timeout: Duration) {
        self.watchdog.enable(timeout);
    }

    /// The I2S FIFO, for sample writes
    pub fn fifo(&mut self) -> &mut I {
        &mut self.i2s
    }

    /// Take the collaborators back
    pub fn into_parts(self) -> (P, I, W) {
        (self.amplifier, self.i2s, self.watchdog)
    }

    fn amplifier_off(&mut self) -> Result<()> {
        self.amplifier
            .set_low()
            .map_err(|e| PlayerError::Gpio(format!("{:?}", e.kind())))
    }
}
