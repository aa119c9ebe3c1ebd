//! Simulated collaborators for host builds
//!
//! Every simulated device shares an [`EventLog`], so a test (or a host-side
//! dry run) can check the exact order of hardware transitions: amplifier on
//! before the I2S rate is set, timer disabled before the file is closed, and
//! so on. Sample writes are counted by [`SimI2s`] rather than logged.
//!
//! Handles are cheap clones over shared state. Keep a clone before moving a
//! device into a player to inspect it afterwards.

use super::{
    fill_from, AudioFile, I2sOutput, PeriodicTimer, Storage, TickHandler, TimerConfig, Watchdog,
};
use crate::wav::Sample;
use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

/// Default timer base clock: an 80 MHz core with the timer on the CPU clock
pub const DEFAULT_TIMER_CLOCK_HZ: u32 = 80_000_000;

/// Observable hardware transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HwEvent {
    /// Amplifier enable driven high
    AmplifierOn,
    /// Amplifier enable driven low
    AmplifierOff,
    /// I2S peripheral started
    I2sBegin,
    /// I2S peripheral stopped
    I2sEnd,
    /// I2S rate set
    I2sRate(u32),
    /// Watchdog armed
    WatchdogEnabled(Duration),
    /// Watchdog disarmed
    WatchdogDisabled,
    /// Timer configured
    TimerConfigured(TimerConfig),
    /// Timer period written
    TimerPeriod(u32),
    /// Tick handler installed
    HandlerAttached,
    /// Tick handler removed
    HandlerDetached,
    /// Timer started
    TimerEnabled,
    /// Timer stopped
    TimerDisabled,
    /// File opened
    FileOpened(String),
    /// File closed
    FileClosed(String),
}

/// Shared, ordered record of hardware transitions
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<HwEvent>>>,
}

impl EventLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event
    pub fn push(&self, event: HwEvent) {
        self.events.lock().push(event);
    }

    /// Copy of all events so far
    pub fn snapshot(&self) -> Vec<HwEvent> {
        self.events.lock().clone()
    }

    /// True if `event` was recorded at least once
    pub fn contains(&self, event: &HwEvent) -> bool {
        self.events.lock().contains(event)
    }

    /// Index of the first occurrence of `event`
    pub fn position(&self, event: &HwEvent) -> Option<usize> {
        self.events.lock().iter().position(|e| e == event)
    }

    /// Number of occurrences of `event`
    pub fn count(&self, event: &HwEvent) -> usize {
        self.events.lock().iter().filter(|e| *e == event).count()
    }

    /// Forget all recorded events
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

/// GPIO fault injected by [`SimPin::failing`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimPinFault;

impl embedded_hal::digital::Error for SimPinFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Simulated amplifier enable pin
#[derive(Debug, Clone)]
pub struct SimPin {
    log: EventLog,
    high: Arc<Mutex<bool>>,
    faulty: bool,
}

impl SimPin {
    /// A working pin, initially low
    pub fn new(log: EventLog) -> Self {
        SimPin {
            log,
            high: Arc::new(Mutex::new(false)),
            faulty: false,
        }
    }

    /// A pin whose every write fails
    pub fn failing(log: EventLog) -> Self {
        SimPin {
            faulty: true,
            ..SimPin::new(log)
        }
    }

    /// Current output level
    pub fn is_high(&self) -> bool {
        *self.high.lock()
    }

    fn drive(&mut self, level: bool) -> Result<(), SimPinFault> {
        if self.faulty {
            return Err(SimPinFault);
        }
        *self.high.lock() = level;
        self.log.push(if level {
            HwEvent::AmplifierOn
        } else {
            HwEvent::AmplifierOff
        });
        Ok(())
    }
}

impl ErrorType for SimPin {
    type Error = SimPinFault;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true)
    }
}

#[derive(Debug, Default)]
struct FifoState {
    capacity: usize,
    queued: usize,
    accepted: Vec<Sample>,
    dropped: usize,
    stalls: usize,
    rate: u32,
    running: bool,
}

/// Simulated I2S FIFO.
///
/// The FIFO holds `capacity` samples. Hardware consumption is modelled by
/// [`SimI2s::drain`]; a blocking write into a full FIFO stands in for the
/// caller being suspended until one slot has been clocked out.
#[derive(Debug, Clone)]
pub struct SimI2s {
    state: Arc<Mutex<FifoState>>,
    log: EventLog,
}

impl SimI2s {
    /// FIFO holding `capacity` samples (at least one)
    pub fn new(capacity: usize, log: EventLog) -> Self {
        SimI2s {
            state: Arc::new(Mutex::new(FifoState {
                capacity: capacity.max(1),
                ..FifoState::default()
            })),
            log,
        }
    }

    /// Let the hardware clock out up to `samples` queued samples
    pub fn drain(&self, samples: usize) {
        let mut state = self.state.lock();
        state.queued = state.queued.saturating_sub(samples);
    }

    /// Every sample accepted by the FIFO, in order
    pub fn written(&self) -> Vec<Sample> {
        self.state.lock().accepted.clone()
    }

    /// Number of samples accepted
    pub fn written_count(&self) -> usize {
        self.state.lock().accepted.len()
    }

    /// Non-blocking writes rejected because the FIFO was full
    pub fn dropped(&self) -> usize {
        self.state.lock().dropped
    }

    /// Blocking writes that had to wait for space
    pub fn stalls(&self) -> usize {
        self.state.lock().stalls
    }

    /// Samples currently queued
    pub fn queued(&self) -> usize {
        self.state.lock().queued
    }

    /// Last rate passed to `set_rate`
    pub fn rate(&self) -> u32 {
        self.state.lock().rate
    }

    /// True between `begin` and `end`
    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }
}

impl I2sOutput for SimI2s {
    fn begin(&mut self) {
        self.state.lock().running = true;
        self.log.push(HwEvent::I2sBegin);
    }

    fn end(&mut self) {
        let mut state = self.state.lock();
        state.running = false;
        state.queued = 0;
        drop(state);
        self.log.push(HwEvent::I2sEnd);
    }

    fn set_rate(&mut self, rate_hz: u32) {
        self.state.lock().rate = rate_hz;
        self.log.push(HwEvent::I2sRate(rate_hz));
    }

    fn write_sample(&mut self, sample: Sample) {
        let mut state = self.state.lock();
        if state.queued >= state.capacity {
            state.queued -= 1;
            state.stalls += 1;
        }
        state.queued += 1;
        state.accepted.push(sample);
    }

    fn write_sample_nb(&mut self, sample: Sample) -> bool {
        let mut state = self.state.lock();
        if state.queued >= state.capacity {
            state.dropped += 1;
            return false;
        }
        state.queued += 1;
        state.accepted.push(sample);
        true
    }

    fn is_full(&self) -> bool {
        let state = self.state.lock();
        state.queued >= state.capacity
    }
}

/// Simulated watchdog
#[derive(Debug, Clone)]
pub struct SimWatchdog {
    armed: Arc<Mutex<Option<Duration>>>,
    log: EventLog,
}

impl SimWatchdog {
    /// A disarmed watchdog
    pub fn new(log: EventLog) -> Self {
        SimWatchdog {
            armed: Arc::new(Mutex::new(None)),
            log,
        }
    }

    /// Timeout the watchdog is armed with, if armed
    pub fn armed(&self) -> Option<Duration> {
        *self.armed.lock()
    }
}

impl Watchdog for SimWatchdog {
    fn enable(&mut self, timeout: Duration) {
        *self.armed.lock() = Some(timeout);
        self.log.push(HwEvent::WatchdogEnabled(timeout));
    }

    fn disable(&mut self) {
        *self.armed.lock() = None;
        self.log.push(HwEvent::WatchdogDisabled);
    }
}

#[derive(Default)]
struct TimerState {
    config: Option<TimerConfig>,
    period: u32,
    enabled: bool,
    handler: Option<Arc<dyn TickHandler>>,
    ticks: u64,
}

/// Simulated periodic timer. Ticks are delivered by calling [`SimTimer::fire`].
#[derive(Clone)]
pub struct SimTimer {
    state: Arc<Mutex<TimerState>>,
    log: EventLog,
    base_clock_hz: u32,
}

impl SimTimer {
    /// Timer on the default 80 MHz base clock
    pub fn new(log: EventLog) -> Self {
        Self::with_clock(DEFAULT_TIMER_CLOCK_HZ, log)
    }

    /// Timer on a custom base clock
    pub fn with_clock(base_clock_hz: u32, log: EventLog) -> Self {
        SimTimer {
            state: Arc::new(Mutex::new(TimerState::default())),
            log,
            base_clock_hz,
        }
    }

    /// Deliver one tick. Returns `false` if the timer is stopped or has no
    /// handler.
    pub fn fire(&self) -> bool {
        let handler = {
            let state = self.state.lock();
            if !state.enabled {
                return false;
            }
            state.handler.clone()
        };
        let Some(handler) = handler else {
            return false;
        };
        handler.on_tick();
        self.state.lock().ticks += 1;
        true
    }

    /// Deliver ticks until the timer stops or `max` ticks were delivered.
    /// Returns the number delivered.
    pub fn run_until_disabled(&self, max: usize) -> usize {
        (0..max).take_while(|_| self.fire()).count()
    }

    /// True while counting
    pub fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    /// True while a handler is installed
    pub fn has_handler(&self) -> bool {
        self.state.lock().handler.is_some()
    }

    /// Last period written
    pub fn period(&self) -> u32 {
        self.state.lock().period
    }

    /// Last configuration applied
    pub fn config(&self) -> Option<TimerConfig> {
        self.state.lock().config
    }

    /// Ticks delivered so far
    pub fn ticks(&self) -> u64 {
        self.state.lock().ticks
    }
}

impl std::fmt::Debug for SimTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SimTimer")
            .field("enabled", &state.enabled)
            .field("period", &state.period)
            .field("has_handler", &state.handler.is_some())
            .field("ticks", &state.ticks)
            .finish()
    }
}

impl PeriodicTimer for SimTimer {
    fn configure(&mut self, config: TimerConfig) {
        self.state.lock().config = Some(config);
        self.log.push(HwEvent::TimerConfigured(config));
    }

    fn set_period(&mut self, ticks: u32) {
        self.state.lock().period = ticks;
        self.log.push(HwEvent::TimerPeriod(ticks));
    }

    fn attach(&mut self, handler: Arc<dyn TickHandler>) {
        self.state.lock().handler = Some(handler);
        self.log.push(HwEvent::HandlerAttached);
    }

    fn detach(&mut self) {
        // Drop the handler outside the lock
        let handler = self.state.lock().handler.take();
        drop(handler);
        self.log.push(HwEvent::HandlerDetached);
    }

    fn enable(&mut self) {
        self.state.lock().enabled = true;
        self.log.push(HwEvent::TimerEnabled);
    }

    fn disable(&mut self) {
        self.state.lock().enabled = false;
        self.log.push(HwEvent::TimerDisabled);
    }

    fn base_clock_hz(&self) -> u32 {
        self.base_clock_hz
    }
}

/// In-memory storage
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    files: HashMap<String, Arc<[u8]>>,
    log: EventLog,
}

impl MemoryStorage {
    /// Empty storage
    pub fn new(log: EventLog) -> Self {
        MemoryStorage {
            files: HashMap::new(),
            log,
        }
    }

    /// Add or replace a file
    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        let bytes: Vec<u8> = bytes.into();
        self.files.insert(path.into(), Arc::from(bytes));
    }
}

impl Storage for MemoryStorage {
    type File = SimFile;

    fn open(&mut self, path: &str) -> std::io::Result<SimFile> {
        let data = self.files.get(path).cloned().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, format!("{path} not found"))
        })?;
        self.log.push(HwEvent::FileOpened(path.to_string()));
        Ok(SimFile {
            path: path.to_string(),
            cursor: Cursor::new(data),
            log: self.log.clone(),
        })
    }
}

/// Handle to a file in [`MemoryStorage`]
#[derive(Debug)]
pub struct SimFile {
    path: String,
    cursor: Cursor<Arc<[u8]>>,
    log: EventLog,
}

impl AudioFile for SimFile {
    fn size(&self) -> u64 {
        self.cursor.get_ref().len() as u64
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        fill_from(&mut self.cursor, buf)
    }

    fn close(self) {
        self.log.push(HwEvent::FileClosed(self.path));
    }
}
