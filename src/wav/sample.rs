//! Mono sample decoding

use super::header::WavFormatDescriptor;
use crate::hal::AudioFile;

/// One wire-ready mono sample.
///
/// Holds the 16-bit value handed to the I2S FIFO. 16-bit files pass through
/// untouched; 8-bit files are re-centred and scaled into the same domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Sample(u16);

impl Sample {
    /// Silence
    pub const SILENCE: Sample = Sample(0);

    /// Wrap a raw wire value
    pub const fn from_raw(raw: u16) -> Self {
        Sample(raw)
    }

    /// Decode an unsigned 8-bit PCM byte: `((byte - 128) * 64) & 0xFFFF`.
    ///
    /// This is a lossy upscale; the result never uses the low 6 bits.
    pub fn from_u8(byte: u8) -> Self {
        let centred = (i32::from(byte) - 128) * 64;
        Sample((centred & 0xFFFF) as u16)
    }

    /// Decode a little-endian signed 16-bit PCM sample
    pub fn from_le_bytes(bytes: [u8; 2]) -> Self {
        Sample(u16::from_le_bytes(bytes))
    }

    /// Raw wire value
    pub fn raw(self) -> u16 {
        self.0
    }

    /// Value as a signed 16-bit sample
    pub fn as_i16(self) -> i16 {
        self.0 as i16
    }
}

/// Pulls decoded samples out of a stream positioned at the first PCM byte.
///
/// Running out of bytes ends the stream. A trailing half sample in a 16-bit
/// file is dropped.
#[derive(Debug)]
pub struct SampleSource<F> {
    file: F,
    eight_bit: bool,
    current: Sample,
}

impl<F: AudioFile> SampleSource<F> {
    /// Decode `file` according to `descriptor`
    pub fn new(file: F, descriptor: &WavFormatDescriptor) -> Self {
        SampleSource {
            file,
            eight_bit: descriptor.bits_per_sample() == 8,
            current: Sample::SILENCE,
        }
    }

    /// Most recently decoded sample
    pub fn current(&self) -> Sample {
        self.current
    }

    /// Give back the underlying stream
    pub fn into_inner(self) -> F {
        self.file
    }
}

impl<F: AudioFile> Iterator for SampleSource<F> {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        let sample = if self.eight_bit {
            let mut byte = [0u8; 1];
            if self.file.read(&mut byte) < 1 {
                return None;
            }
            Sample::from_u8(byte[0])
        } else {
            let mut bytes = [0u8; 2];
            if self.file.read(&mut bytes) < 2 {
                return None;
            }
            Sample::from_le_bytes(bytes)
        };
        self.current = sample;
        Some(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wav::fixtures::*;
    use crate::wav::validate_and_describe;
    use std::io::Cursor;

    fn oracle(byte: u8) -> u16 {
        (((byte as i32) - 128) * 64 & 0xFFFF) as u16
    }

    fn source(spec: Spec, payload: &[u8]) -> SampleSource<Cursor<Vec<u8>>> {
        let mut cursor = Cursor::new(wav_image(spec, payload));
        let desc = validate_and_describe(&mut cursor).unwrap();
        SampleSource::new(cursor, &desc)
    }

    #[test]
    fn test_eight_bit_transform() {
        let raw: Vec<u16> = source(Spec::mono8(8_000), &[0x00, 0x80, 0xFF])
            .map(Sample::raw)
            .collect();
        assert_eq!(raw, vec![oracle(0x00), oracle(0x80), oracle(0xFF)]);
        assert_eq!(raw, vec![0xE000, 0x0000, 0x1FC0]);
    }

    #[test]
    fn test_eight_bit_matches_formula_for_all_bytes() {
        for byte in 0..=u8::MAX {
            assert_eq!(Sample::from_u8(byte).raw(), oracle(byte), "byte {byte:#04X}");
        }
        assert_eq!(Sample::from_u8(0x00).as_i16(), -8192);
        assert_eq!(Sample::from_u8(0xFF).as_i16(), 8128);
    }

    #[test]
    fn test_sixteen_bit_passthrough() {
        let samples: Vec<i16> = source(Spec::mono16(16_000), &pcm16(&[0, -1, i16::MIN, 1234]))
            .map(Sample::as_i16)
            .collect();
        assert_eq!(samples, vec![0, -1, i16::MIN, 1234]);
    }

    #[test]
    fn test_sixteen_bit_little_endian() {
        let mut src = source(Spec::mono16(16_000), &[0x34, 0x12]);
        assert_eq!(src.next(), Some(Sample::from_raw(0x1234)));
        assert_eq!(src.next(), None);
    }

    #[test]
    fn test_trailing_half_sample_ends_stream() {
        let mut src = source(Spec::mono16(16_000), &[0x01, 0x00, 0x02]);
        assert_eq!(src.next(), Some(Sample::from_raw(1)));
        assert_eq!(src.next(), None);
    }

    #[test]
    fn test_current_tracks_last_sample() {
        let mut src = source(Spec::mono16(16_000), &pcm16(&[7, 9]));
        assert_eq!(src.current(), Sample::SILENCE);
        src.next();
        assert_eq!(src.current().as_i16(), 7);
        src.next();
        src.next();
        assert_eq!(src.current().as_i16(), 9);
    }

    #[test]
    fn test_other_bit_depths_use_sixteen_bit_path() {
        let mut image = wav_image(Spec::mono16(16_000), &[0x10, 0x00]);
        image[BITS_AT..BITS_AT + 2].copy_from_slice(&12u16.to_le_bytes());
        let mut cursor = Cursor::new(image);
        let info = crate::wav::read_header(&mut cursor, false).unwrap();
        let mut src = SampleSource::new(cursor, &info.descriptor);
        assert_eq!(src.next(), Some(Sample::from_raw(0x10)));
    }
}
