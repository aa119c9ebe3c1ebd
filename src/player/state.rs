//! Playback flag shared between the feeding context and callers
//!
//! The flag is the only state that crosses from the feeder (a timer
//! interrupt, or the thread blocked in `play_file`) to the rest of the
//! program. Writers publish with `Release` and readers observe with
//! `Acquire`, so a caller that sees `is_playing() == false` also sees every
//! teardown side effect that preceded it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct FlagState {
    playing: AtomicBool,
    stop_requested: AtomicBool,
}

/// Cloneable view of a player's session state
#[derive(Debug, Clone, Default)]
pub struct PlaybackFlag {
    state: Arc<FlagState>,
}

impl PlaybackFlag {
    /// A lowered flag
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a session is active
    pub fn is_playing(&self) -> bool {
        self.state.playing.load(Ordering::Acquire)
    }

    /// Ask the active session to stop at its next feed step
    pub fn request_stop(&self) {
        self.state.stop_requested.store(true, Ordering::Release);
    }

    /// True if a stop was requested and not yet honoured
    pub fn stop_pending(&self) -> bool {
        self.state.stop_requested.load(Ordering::Acquire)
    }

    pub(crate) fn raise(&self) {
        self.state.stop_requested.store(false, Ordering::Release);
        self.state.playing.store(true, Ordering::Release);
    }

    pub(crate) fn lower(&self) {
        self.state.playing.store(false, Ordering::Release);
    }

    pub(crate) fn take_stop_request(&self) -> bool {
        self.state.stop_requested.swap(false, Ordering::AcqRel)
    }
}
