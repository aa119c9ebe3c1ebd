//! Mono WAV playback to an I2S FIFO
//!
//! Streams linear PCM audio (8 or 16 bit, mono) from a WAV file on a local
//! filesystem into a small hardware I2S FIFO, keeping the amplifier enable
//! line and the system watchdog coordinated with playback state.
//!
//! # Feeding models
//! - [`PollingPlayer`]: feeds on the calling thread with blocking FIFO writes.
//!   The caller is blocked until the file is exhausted.
//! - [`InterruptPlayer`]: arms a periodic timer and returns immediately. Each
//!   tick tops up the FIFO with non-blocking writes and tears playback down
//!   from inside the tick once the file runs out.
//!
//! Hardware is reached only through the traits in [`hal`], so the same engines
//! run against real drivers on the device and against the simulated
//! collaborators in `hal::sim` on a host.
//!
//! # Crate feature flags
//! - `sim` (default): simulated I2S, timer, watchdog, GPIO and in-memory storage
//!
//! # Quick start
//! ```no_run
//! # #[cfg(feature = "sim")]
//! # {
//! use wav_i2s_player::hal::sim::{EventLog, MemoryStorage, SimI2s, SimPin, SimWatchdog};
//! use wav_i2s_player::{HardwareGate, PlaybackEngine, PlayerConfig, PollingPlayer};
//!
//! let log = EventLog::new();
//! let mut storage = MemoryStorage::new(log.clone());
//! storage.insert("/chime.wav", std::fs::read("chime.wav").unwrap());
//! let gate = HardwareGate::new(
//!     SimPin::new(log.clone()),
//!     SimI2s::new(512, log.clone()),
//!     SimWatchdog::new(log.clone()),
//! );
//! let mut player = PollingPlayer::new(storage, gate, PlayerConfig::default()).unwrap();
//! player.play_file("/chime.wav").unwrap();
//! assert!(!player.is_playing());
//! # }
//! ```

#![warn(missing_docs)]

pub mod config; // Tunables
pub mod error; // Error types
pub mod gate; // Amplifier / I2S / watchdog transitions
pub mod hal; // Collaborator traits
pub mod player; // Feeding engines
pub mod wav; // WAV container parsing

pub use config::{FifoGeometry, PlayerConfig};
pub use error::{FormatErrorKind, IoErrorKind, PlayerError, Result};
pub use gate::HardwareGate;
pub use hal::{AudioFile, I2sOutput, PeriodicTimer, Storage, TickHandler, Watchdog};
pub use player::{InterruptPlayer, PlaybackEngine, PlaybackFlag, PollingPlayer, Session};
pub use wav::{validate_and_describe, HeaderInfo, Sample, SampleSource, WavFormatDescriptor};
