//! Periodic hardware timer interface
//!
//! The interrupt feeder installs a [`TickHandler`] on the timer when playback
//! is armed and removes it at teardown. The handler is the only context the
//! interrupt routine gets; there is no global "current player".

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Prescaler applied to the timer's base clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerDivider {
    /// Base clock
    #[default]
    Div1,
    /// Base clock / 16
    Div16,
    /// Base clock / 256
    Div256,
}

impl TimerDivider {
    /// Division factor
    pub fn factor(self) -> u32 {
        match self {
            TimerDivider::Div1 => 1,
            TimerDivider::Div16 => 16,
            TimerDivider::Div256 => 256,
        }
    }
}

/// Interrupt trigger type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEdge {
    /// Edge-triggered
    Edge,
    /// Level-triggered
    Level,
}

/// Reload behaviour after the period elapses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    /// Fire once
    Single,
    /// Reload and fire every period
    Loop,
}

/// Timer setup applied before the period is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    /// Prescaler
    pub divider: TimerDivider,
    /// Trigger type
    pub edge: TimerEdge,
    /// Reload behaviour
    pub mode: TimerMode,
}

impl TimerConfig {
    /// Edge-triggered, auto-reloading timer with the given prescaler
    pub fn periodic(divider: TimerDivider) -> Self {
        TimerConfig {
            divider,
            edge: TimerEdge::Edge,
            mode: TimerMode::Loop,
        }
    }
}

/// Work run on every timer tick, in interrupt context.
///
/// Implementations must return promptly: no blocking, no allocation, nothing
/// that can suspend.
pub trait TickHandler: Send + Sync {
    /// Called once per elapsed period
    fn on_tick(&self);
}

/// Periodic hardware timer.
pub trait PeriodicTimer {
    /// Apply divider, trigger and reload settings
    fn configure(&mut self, config: TimerConfig);

    /// Set the period in divided timer ticks
    fn set_period(&mut self, ticks: u32);

    /// Install the interrupt handler
    fn attach(&mut self, handler: Arc<dyn TickHandler>);

    /// Remove the interrupt handler
    fn detach(&mut self);

    /// Start counting
    fn enable(&mut self);

    /// Stop counting
    fn disable(&mut self);

    /// Undivided timer clock in Hz
    fn base_clock_hz(&self) -> u32;
}
