//! Player configuration
//!
//! Defaults match an ESP8266-class I2S DMA ring (8 buffers of 64 words) with
//! a one-minute watchdog, so `PlayerConfig::default()` is usable as-is.
//! Firmware that stores settings as JSON can load them with
//! [`PlayerConfig::from_json_str`] or [`PlayerConfig::load`]; missing keys
//! fall back to the defaults.

use crate::error::{PlayerError, Result};
use crate::hal::TimerDivider;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default watchdog timeout re-armed after playback
pub const DEFAULT_WATCHDOG_TIMEOUT_MS: u64 = 60_000;

/// Default FIFO refills per FIFO drain period
pub const DEFAULT_REFILL_FACTOR: u32 = 32;

/// Geometry of the I2S DMA ring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FifoGeometry {
    /// Number of DMA buffers
    pub buffer_count: u32,
    /// Samples per buffer
    pub buffer_len: u32,
}

impl FifoGeometry {
    /// Total samples the ring can hold
    pub fn capacity(&self) -> u32 {
        self.buffer_count.saturating_mul(self.buffer_len)
    }
}

impl Default for FifoGeometry {
    fn default() -> Self {
        FifoGeometry {
            buffer_count: 8,
            buffer_len: 64,
        }
    }
}

/// Playback tunables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Watchdog timeout in milliseconds
    pub watchdog_timeout_ms: u64,
    /// How many times per FIFO drain period the interrupt feeder runs
    pub refill_factor: u32,
    /// I2S DMA ring geometry
    pub fifo: FifoGeometry,
    /// Prescaler for the feed timer
    pub timer_divider: TimerDivider,
    /// Reject bit depths other than 8 and 16
    pub strict_bit_depth: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            watchdog_timeout_ms: DEFAULT_WATCHDOG_TIMEOUT_MS,
            refill_factor: DEFAULT_REFILL_FACTOR,
            fifo: FifoGeometry::default(),
            timer_divider: TimerDivider::Div1,
            strict_bit_depth: true,
        }
    }
}

impl PlayerConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: PlayerConfig =
            serde_json::from_str(json).map_err(|e| PlayerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| PlayerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| PlayerError::Config(e.to_string()))
    }

    /// Check that every value is usable
    pub fn validate(&self) -> Result<()> {
        if self.watchdog_timeout_ms == 0 {
            return Err(PlayerError::Config(
                "watchdog_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.refill_factor == 0 {
            return Err(PlayerError::Config(
                "refill_factor must be greater than 0".into(),
            ));
        }
        if self.fifo.buffer_count == 0 || self.fifo.buffer_len == 0 {
            return Err(PlayerError::Config(format!(
                "FIFO geometry {}x{} is empty",
                self.fifo.buffer_count, self.fifo.buffer_len
            )));
        }
        Ok(())
    }

    /// Watchdog timeout as a `Duration`
    pub fn watchdog_timeout(&self) -> Duration {
        Duration::from_millis(self.watchdog_timeout_ms)
    }

    /// Feed interrupts per second for a given sample rate.
    ///
    /// `sample_rate * refill_factor / fifo capacity`, never less than one.
    pub fn fills_per_second(&self, sample_rate_hz: u32) -> u32 {
        let capacity = u64::from(self.fifo.capacity().max(1));
        let fills = u64::from(sample_rate_hz) * u64::from(self.refill_factor) / capacity;
        fills.clamp(1, u64::from(u32::MAX)) as u32
    }

    /// Timer period, in divided timer ticks, between two feed interrupts
    pub fn timer_period(&self, sample_rate_hz: u32, base_clock_hz: u32) -> u32 {
        let tick_hz = base_clock_hz / self.timer_divider.factor();
        (tick_hz / self.fills_per_second(sample_rate_hz)).max(1)
    }
}
