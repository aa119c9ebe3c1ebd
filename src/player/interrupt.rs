//! Timer-interrupt feeder
//!
//! `Idle -> Opening -> HeaderValidated -> Armed -> Feeding -> Idle`
//!
//! [`InterruptPlayer::play_file`] validates the file, powers up the output
//! and arms a periodic timer, then returns. From there on the session belongs
//! to the timer tick: each tick tops the FIFO up with non-blocking writes,
//! and the tick that finds the file exhausted tears the session down itself.
//!
//! The tick reaches the session through a handler attached to the timer at
//! arm time and detached at teardown. It only ever `try_lock`s the feed
//! state; if the main context holds it, that tick is skipped.
//!
//! Once armed, nothing can report an error. A read failure mid-file looks
//! exactly like the end of the data and ends playback the same way.

use super::session::Session;
use super::state::PlaybackFlag;
use super::PlaybackEngine;
use crate::config::PlayerConfig;
use crate::error::{PlayerError, Result};
use crate::gate::HardwareGate;
use crate::hal::{I2sOutput, PeriodicTimer, Storage, TickHandler, TimerConfig, Watchdog};
use crate::wav::WavFormatDescriptor;
use embedded_hal::digital::OutputPin;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

struct FeedCore<S: Storage, P, I, W, T> {
    storage: S,
    gate: HardwareGate<P, I, W>,
    timer: T,
    session: Option<Session<S::File>>,
}

impl<S, P, I, W, T> FeedCore<S, P, I, W, T>
where
    S: Storage,
    P: OutputPin,
    I: I2sOutput,
    W: Watchdog,
    T: PeriodicTimer,
{
    /// One tick: fill the FIFO, or tear down once the data is gone
    fn feed(&mut self, flag: &PlaybackFlag) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let mut exhausted = flag.take_stop_request();
        while !exhausted && !self.gate.fifo().is_full() {
            match session.next_sample() {
                Some(sample) => {
                    self.gate.fifo().write_sample_nb(sample);
                }
                None => exhausted = true,
            }
        }

        if exhausted {
            // No logging in interrupt context; a stuck pin goes unreported here
            let _ = self.teardown(flag);
        }
    }

    /// Release everything the session holds. Returns the amplifier error, if
    /// any, once the rest of the teardown has completed.
    fn teardown(&mut self, flag: &PlaybackFlag) -> Result<()> {
        let muted = self.gate.mute_then_power_down();
        self.timer.disable();
        self.timer.detach();
        if let Some(session) = self.session.take() {
            session.close();
        }
        flag.lower();
        muted
    }
}

struct FeedContext<S: Storage, P, I, W, T> {
    flag: PlaybackFlag,
    core: Mutex<FeedCore<S, P, I, W, T>>,
}

/// Tick handler installed on the timer. Holds the feed context weakly so a
/// dropped player is never kept alive by its own timer.
struct TickRelay<S: Storage, P, I, W, T> {
    context: Weak<FeedContext<S, P, I, W, T>>,
}

impl<S, P, I, W, T> TickHandler for TickRelay<S, P, I, W, T>
where
    S: Storage + Send,
    S::File: Send,
    P: OutputPin + Send,
    I: I2sOutput + Send,
    W: Watchdog + Send,
    T: PeriodicTimer + Send,
{
    fn on_tick(&self) {
        let Some(context) = self.context.upgrade() else {
            return;
        };
        // Never wait in interrupt context
        let Some(mut core) = context.core.try_lock() else {
            return;
        };
        core.feed(&context.flag);
    }
}

/// Plays files from a periodic timer interrupt
pub struct InterruptPlayer<S, P, I, W, T>
where
    S: Storage + Send + 'static,
    S::File: Send + 'static,
    P: OutputPin + Send + 'static,
    I: I2sOutput + Send + 'static,
    W: Watchdog + Send + 'static,
    T: PeriodicTimer + Send + 'static,
{
    context: Arc<FeedContext<S, P, I, W, T>>,
    config: PlayerConfig,
    descriptor: Option<WavFormatDescriptor>,
}

impl<S, P, I, W, T> InterruptPlayer<S, P, I, W, T>
where
    S: Storage + Send + 'static,
    S::File: Send + 'static,
    P: OutputPin + Send + 'static,
    I: I2sOutput + Send + 'static,
    W: Watchdog + Send + 'static,
    T: PeriodicTimer + Send + 'static,
{
    /// Create an idle player. The timer must be stopped.
    ///
    /// Fails with [`PlayerError::Config`] if `config` does not validate.
    pub fn new(
        storage: S,
        gate: HardwareGate<P, I, W>,
        timer: T,
        config: PlayerConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(InterruptPlayer {
            context: Arc::new(FeedContext {
                flag: PlaybackFlag::new(),
                core: Mutex::new(FeedCore {
                    storage,
                    gate,
                    timer,
                    session: None,
                }),
            }),
            config,
            descriptor: None,
        })
    }

    /// Handle for observing or stopping playback
    pub fn flag(&self) -> PlaybackFlag {
        self.context.flag.clone()
    }

    /// Active configuration
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// End the active session now, from the main context.
    ///
    /// Returns `false` if nothing was playing.
    pub fn stop(&mut self) -> bool {
        let mut core = self.context.core.lock();
        if core.session.is_none() {
            return false;
        }
        if let Err(e) = core.teardown(&self.context.flag) {
            warn!("Could not disable amplifier: {e}");
        }
        info!("Playback stopped");
        true
    }

    fn arm(&self, core: &mut FeedCore<S, P, I, W, T>, session: Session<S::File>) -> Result<()> {
        let rate = session.descriptor().sample_rate_hz();
        if let Err(e) = core.gate.power_up(rate) {
            if let Err(off) = core.gate.mute_then_power_down() {
                warn!("Could not disable amplifier: {off}");
            }
            session.close();
            return Err(e);
        }
        core.gate.arm_watchdog(self.config.watchdog_timeout());

        let period = self.config.timer_period(rate, core.timer.base_clock_hz());
        debug!(
            "Feed timer: {} fills/s, period {period} ticks",
            self.config.fills_per_second(rate)
        );
        core.session = Some(session);

        let relay: Arc<dyn TickHandler> = Arc::new(TickRelay {
            context: Arc::downgrade(&self.context),
        });
        core.timer.disable();
        core.timer.configure(TimerConfig::periodic(self.config.timer_divider));
        core.timer.attach(relay);
        core.timer.set_period(period);
        core.timer.enable();
        Ok(())
    }
}

impl<S, P, I, W, T> PlaybackEngine for InterruptPlayer<S, P, I, W, T>
where
    S: Storage + Send + 'static,
    S::File: Send + 'static,
    P: OutputPin + Send + 'static,
    I: I2sOutput + Send + 'static,
    W: Watchdog + Send + 'static,
    T: PeriodicTimer + Send + 'static,
{
    fn play_file(&mut self, path: &str) -> Result<()> {
        let flag = &self.context.flag;
        if flag.is_playing() {
            return Err(PlayerError::AlreadyPlaying);
        }

        // Idle means the timer is stopped, so this lock is uncontended.
        let mut core = self.context.core.lock();
        let session = Session::open(&mut core.storage, path, &self.config)?;
        let descriptor = session.descriptor();
        self.descriptor = Some(descriptor);

        flag.raise();
        if let Err(e) = self.arm(&mut core, session) {
            flag.lower();
            return Err(e);
        }
        info!(
            "Playing {path}: {} Hz, {} bits",
            descriptor.sample_rate_hz(),
            descriptor.bits_per_sample()
        );
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.context.flag.is_playing()
    }

    fn descriptor(&self) -> Option<WavFormatDescriptor> {
        self.descriptor
    }

    fn request_stop(&self) {
        self.context.flag.request_stop();
    }
}

impl<S, P, I, W, T> Drop for InterruptPlayer<S, P, I, W, T>
where
    S: Storage + Send + 'static,
    S::File: Send + 'static,
    P: OutputPin + Send + 'static,
    I: I2sOutput + Send + 'static,
    W: Watchdog + Send + 'static,
    T: PeriodicTimer + Send + 'static,
{
    fn drop(&mut self) {
        self.stop();
    }
}
