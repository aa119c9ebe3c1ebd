//! Collaborator interfaces
//!
//! The playback core never touches hardware or a filesystem directly. Each
//! external collaborator is a trait here:
//! - [`Storage`] / [`AudioFile`]: open a named file as a byte stream
//! - [`I2sOutput`]: the I2S driver and its sample FIFO
//! - [`PeriodicTimer`] / [`TickHandler`]: the hardware timer driving the
//!   interrupt feeder
//! - [`Watchdog`]: the system watchdog service
//!
//! The amplifier enable line uses `embedded_hal::digital::OutputPin`.

pub mod fs;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod timer;

pub use timer::{PeriodicTimer, TickHandler, TimerConfig, TimerDivider, TimerEdge, TimerMode};

use crate::wav::Sample;
use std::io::{ErrorKind, Read};
use std::time::Duration;

/// An open byte stream over a stored audio file.
///
/// `read` follows the firmware stream convention: it tries to fill the whole
/// buffer and returns how many bytes it managed. A short count only happens at
/// end of file or on a read failure, and the two are not distinguished.
pub trait AudioFile {
    /// Total file size in bytes
    fn size(&self) -> u64;

    /// Read up to `buf.len()` bytes, returning the count actually read
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Release the handle
    fn close(self)
    where
        Self: Sized,
    {
    }
}

/// A filesystem that can open files by name.
pub trait Storage {
    /// Handle type produced by [`Storage::open`]
    type File: AudioFile;

    /// Open `path` for reading
    fn open(&mut self, path: &str) -> std::io::Result<Self::File>;
}

/// I2S driver with a small transmit FIFO.
pub trait I2sOutput {
    /// Start the I2S peripheral
    fn begin(&mut self);

    /// Stop the I2S peripheral
    fn end(&mut self);

    /// Set the output sample rate in Hz
    fn set_rate(&mut self, rate_hz: u32);

    /// Queue a sample, suspending the caller until FIFO space is available
    fn write_sample(&mut self, sample: Sample);

    /// Queue a sample if there is room. Returns `false` (sample discarded)
    /// when the FIFO is full. Never suspends.
    fn write_sample_nb(&mut self, sample: Sample) -> bool;

    /// True when the FIFO cannot take another sample
    fn is_full(&self) -> bool;
}

/// System watchdog service.
pub trait Watchdog {
    /// Arm the watchdog with the given timeout
    fn enable(&mut self, timeout: Duration);

    /// Disarm the watchdog
    fn disable(&mut self);
}

/// Fill `buf` from `reader` until it is full or the reader stops producing.
pub(crate) fn fill_from<R: Read>(reader: &mut R, buf: &mut [u8]) -> usize {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                log::debug!("Read stopped after {filled} bytes: {e}");
                break;
            }
        }
    }
    filled
}
