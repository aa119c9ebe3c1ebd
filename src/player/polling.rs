//! Blocking, caller-driven feeder
//!
//! `Idle -> Opening -> HeaderValidated -> Streaming -> Idle`
//!
//! The whole session runs inside [`PollingPlayer::play_file`]. The only
//! point where the caller is suspended is the blocking FIFO write, which
//! waits for the hardware to clock out a slot. The watchdog is disarmed for
//! the duration of the feed and re-armed on every exit path once the header
//! has been accepted.

use super::session::Session;
use super::state::PlaybackFlag;
use super::PlaybackEngine;
use crate::config::PlayerConfig;
use crate::error::{PlayerError, Result};
use crate::gate::HardwareGate;
use crate::hal::{I2sOutput, Storage, Watchdog};
use crate::wav::{Sample, WavFormatDescriptor};
use embedded_hal::digital::OutputPin;
use log::info;

/// Plays files on the calling thread
#[derive(Debug)]
pub struct PollingPlayer<S, P, I, W> {
    storage: S,
    gate: HardwareGate<P, I, W>,
    config: PlayerConfig,
    flag: PlaybackFlag,
    descriptor: Option<WavFormatDescriptor>,
    current: Sample,
}

impl<S, P, I, W> PollingPlayer<S, P, I, W>
where
    S: Storage,
    P: OutputPin,
    I: I2sOutput,
    W: Watchdog,
{
    /// Create an idle player. Fails with [`PlayerError::Config`] if
    /// `config` does not validate.
    pub fn new(storage: S, gate: HardwareGate<P, I, W>, config: PlayerConfig) -> Result<Self> {
        config.validate()?;
        Ok(PollingPlayer {
            storage,
            gate,
            config,
            flag: PlaybackFlag::new(),
            descriptor: None,
            current: Sample::SILENCE,
        })
    }

    /// Handle for observing or stopping playback from another thread
    pub fn flag(&self) -> PlaybackFlag {
        self.flag.clone()
    }

    /// Last sample written to the FIFO
    pub fn current_sample(&self) -> Sample {
        self.current
    }

    /// Active configuration
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Take the storage and hardware back
    pub fn into_parts(self) -> (S, HardwareGate<P, I, W>) {
        (self.storage, self.gate)
    }

    fn stream(&mut self, session: &mut Session<S::File>) -> Result<usize> {
        self.gate.power_up(session.descriptor().sample_rate_hz())?;
        self.gate.suspend_watchdog();

        let mut written = 0;
        while !self.flag.take_stop_request() {
            let Some(sample) = session.next_sample() else {
                break;
            };
            self.gate.fifo().write_sample(sample);
            written += 1;
        }
        Ok(written)
    }

    fn teardown(&mut self, session: Session<S::File>) {
        self.gate.power_down();
        self.current = session.current();
        session.close();
        self.flag.lower();
        self.gate.arm_watchdog(self.config.watchdog_timeout());
    }
}

impl<S, P, I, W> PlaybackEngine for PollingPlayer<S, P, I, W>
where
    S: Storage,
    P: OutputPin,
    I: I2sOutput,
    W: Watchdog,
{
    fn play_file(&mut self, path: &str) -> Result<()> {
        if self.flag.is_playing() {
            return Err(PlayerError::AlreadyPlaying);
        }

        let mut session = Session::open(&mut self.storage, path, &self.config)?;
        self.descriptor = Some(session.descriptor());
        self.flag.raise();

        let result = self.stream(&mut session);
        self.teardown(session);

        let written = result?;
        info!("Finished {path}: {written} samples");
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.flag.is_playing()
    }

    fn descriptor(&self) -> Option<WavFormatDescriptor> {
        self.descriptor
    }

    fn request_stop(&self) {
        self.flag.request_stop();
    }
}
