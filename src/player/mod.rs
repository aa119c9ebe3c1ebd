//! Sample-feeding engines
//!
//! Both engines share the same file lifecycle ([`Session`]) and the same
//! hardware transitions ([`crate::HardwareGate`]); they differ only in how
//! samples reach the FIFO:
//! - [`PollingPlayer`]: blocking writes on the caller's thread
//! - [`InterruptPlayer`]: non-blocking writes from a periodic timer tick
//!
//! Only one session per engine can be active. Starting another while one is
//! running fails with [`crate::PlayerError::AlreadyPlaying`].

pub mod interrupt;
pub mod polling;
pub mod session;
pub mod state;

pub use interrupt::InterruptPlayer;
pub use polling::PollingPlayer;
pub use session::Session;
pub use state::PlaybackFlag;

use crate::wav::WavFormatDescriptor;
use crate::Result;

/// Operations common to both feeding engines
pub trait PlaybackEngine {
    /// Open, validate and play `path`.
    ///
    /// The polling engine returns once the file has been played; the
    /// interrupt engine returns as soon as the feed timer is armed.
    fn play_file(&mut self, path: &str) -> Result<()>;

    /// True while a session is active
    fn is_playing(&self) -> bool;

    /// Format of the most recently validated file
    fn descriptor(&self) -> Option<WavFormatDescriptor>;

    /// Ask the active session to end at its next feed step
    fn request_stop(&self);

    /// Sample rate of the most recently validated file, 0 before the first
    fn audio_sample_rate(&self) -> u32 {
        self.descriptor().map_or(0, |d| d.sample_rate_hz())
    }

    /// Bit depth of the most recently validated file, 0 before the first
    fn bits_per_sample(&self) -> u16 {
        self.descriptor().map_or(0, |d| d.bits_per_sample())
    }
}
