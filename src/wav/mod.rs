//! WAV container parsing and sample decoding
//!
//! Only the canonical 44-byte layout is accepted:
//!
//! ```text
//! "RIFF" | u32 chunk size | "WAVE"
//! "fmt " | u32 fmt size | u16 format=1 | u16 channels=1 | u32 sample rate
//!        | u32 byte rate | u16 block align | u16 bits per sample
//! "data" | u32 data size | PCM bytes...
//! ```
//!
//! All multi-byte fields are little-endian. No chunk skipping is attempted:
//! anything between `fmt ` and `data` is rejected.

pub mod header;
pub mod sample;

pub use header::{read_header, validate_and_describe, HeaderInfo, WavFormatDescriptor, HEADER_LEN};
pub use sample::{Sample, SampleSource};
