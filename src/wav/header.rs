//! WAV header validation
//!
//! The header is consumed as a strict sequence of fixed-size field reads.
//! Each field is checked as soon as it is read, so the first violation wins:
//! a file that is both truncated and carries the wrong magic reports the
//! problem with whichever field comes first.

use crate::error::{FormatErrorKind, IoErrorKind, Result};
use crate::hal::AudioFile;
use log::debug;

/// Size of the canonical header; PCM data starts at this offset
pub const HEADER_LEN: usize = 44;

const RIFF_MAGIC: [u8; 4] = *b"RIFF";
const WAVE_MAGIC: [u8; 4] = *b"WAVE";
const FMT_MAGIC: [u8; 4] = *b"fmt ";
const DATA_MAGIC: [u8; 4] = *b"data";

const FORMAT_PCM: u16 = 1;
const MONO: u16 = 1;

/// Stream format of a validated file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormatDescriptor {
    sample_rate_hz: u32,
    bits_per_sample: u16,
}

impl WavFormatDescriptor {
    /// Sample rate in Hz, exactly as stored in the header
    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    /// Bits per sample
    pub fn bits_per_sample(&self) -> u16 {
        self.bits_per_sample
    }

    /// Bytes consumed per sample
    pub fn bytes_per_sample(&self) -> usize {
        if self.bits_per_sample == 8 {
            1
        } else {
            2
        }
    }
}

/// Every header field, including the ones playback ignores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderInfo {
    /// Validated stream format
    pub descriptor: WavFormatDescriptor,
    /// Declared RIFF chunk size (not checked against the file size)
    pub chunk_size: u32,
    /// Declared `fmt ` sub-chunk size
    pub fmt_size: u32,
    /// Declared byte rate
    pub byte_rate: u32,
    /// Declared block alignment
    pub block_align: u16,
    /// Declared `data` sub-chunk size
    pub data_size: u32,
}

/// Validate a mono PCM header and return its format.
///
/// On success the stream is positioned at the first PCM byte. Bit depths
/// other than 8 and 16 are rejected.
pub fn validate_and_describe<F: AudioFile + ?Sized>(file: &mut F) -> Result<WavFormatDescriptor> {
    read_header(file, true).map(|info| info.descriptor)
}

/// Read and validate all header fields.
///
/// With `strict_bit_depth` off, any bit depth is accepted and everything
/// other than 8 is later decoded as 16-bit.
pub fn read_header<F: AudioFile + ?Sized>(
    file: &mut F,
    strict_bit_depth: bool,
) -> Result<HeaderInfo> {
    let mut fields = FieldReader { file };

    fields.expect_magic(RIFF_MAGIC, FormatErrorKind::BadRiffMagic)?;
    let chunk_size = fields.u32()?;
    debug!("Chunk size from here: {chunk_size}");

    fields.expect_magic(WAVE_MAGIC, FormatErrorKind::BadWaveMagic)?;
    fields.expect_magic(FMT_MAGIC, FormatErrorKind::BadFmtMagic)?;
    let fmt_size = fields.u32()?;
    debug!("fmt sub-chunk size: {fmt_size}");

    let format = fields.u16()?;
    if format != FORMAT_PCM {
        return Err(FormatErrorKind::UnsupportedCodec(format).into());
    }

    let channels = fields.u16()?;
    if channels != MONO {
        return Err(FormatErrorKind::UnsupportedChannelLayout(channels).into());
    }

    let sample_rate_hz = fields.u32()?;
    debug!("Sample rate: {sample_rate_hz}");
    let byte_rate = fields.u32()?;
    debug!("Byte rate: {byte_rate}");
    let block_align = fields.u16()?;
    debug!("Block align: {block_align}");

    let bits_per_sample = fields.u16()?;
    debug!("Bits per sample: {bits_per_sample} bits");
    if strict_bit_depth && !matches!(bits_per_sample, 8 | 16) {
        return Err(FormatErrorKind::UnsupportedBitDepth(bits_per_sample).into());
    }

    fields.expect_magic(DATA_MAGIC, FormatErrorKind::BadDataMagic)?;
    let data_size = fields.u32()?;
    debug!("Data size: {data_size}");

    Ok(HeaderInfo {
        descriptor: WavFormatDescriptor {
            sample_rate_hz,
            bits_per_sample,
        },
        chunk_size,
        fmt_size,
        byte_rate,
        block_align,
        data_size,
    })
}

struct FieldReader<'a, F: ?Sized> {
    file: &'a mut F,
}

impl<F: AudioFile + ?Sized> FieldReader<'_, F> {
    fn bytes<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        if self.file.read(&mut buf) < N {
            return Err(IoErrorKind::TruncatedHeader.into());
        }
        Ok(buf)
    }

    fn u16(&mut self) -> Result<u16> {
        self.bytes::<2>().map(u16::from_le_bytes)
    }

    fn u32(&mut self) -> Result<u32> {
        self.bytes::<4>().map(u32::from_le_bytes)
    }

    fn expect_magic(&mut self, magic: [u8; 4], mismatch: FormatErrorKind) -> Result<()> {
        let found = self.bytes::<4>()?;
        if found != magic {
            debug!("Expected {:?}, found {:02X?}", magic, found);
            return Err(mismatch.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wav::fixtures::*;
    use crate::PlayerError;
    use std::io::Cursor;

    fn parse(bytes: Vec<u8>) -> Result<WavFormatDescriptor> {
        validate_and_describe(&mut Cursor::new(bytes))
    }

    fn corrupt(at: usize, with: &[u8]) -> Vec<u8> {
        let mut image = wav_image(Spec::mono16(16_000), &pcm16(&[1, 2, 3]));
        image[at..at + with.len()].copy_from_slice(with);
        image
    }

    #[test]
    fn test_valid_header_describes_format() {
        let desc = parse(wav_image(Spec::mono16(22_050), &[])).unwrap();
        assert_eq!(desc.sample_rate_hz(), 22_050);
        assert_eq!(desc.bits_per_sample(), 16);
        assert_eq!(desc.bytes_per_sample(), 2);

        let desc = parse(wav_image(Spec::mono8(8_000), &[])).unwrap();
        assert_eq!(desc.sample_rate_hz(), 8_000);
        assert_eq!(desc.bits_per_sample(), 8);
        assert_eq!(desc.bytes_per_sample(), 1);
    }

    #[test]
    fn test_sample_rate_is_not_rounded() {
        let desc = parse(wav_image(Spec::mono16(44_123), &[])).unwrap();
        assert_eq!(desc.sample_rate_hz(), 44_123);
    }

    #[test]
    fn test_cursor_left_at_first_pcm_byte() {
        let payload = [0xDE, 0xAD, 0xBE, 0xEF, 0x01, 0x02];
        let mut cursor = Cursor::new(wav_image(Spec::mono16(16_000), &payload));
        validate_and_describe(&mut cursor).unwrap();
        assert_eq!(cursor.position(), HEADER_LEN as u64);
        let mut rest = [0u8; 6];
        assert_eq!(AudioFile::read(&mut cursor, &mut rest), 6);
        assert_eq!(rest, payload);
    }

    #[test]
    fn test_header_info_keeps_ignored_fields() {
        let payload = pcm16(&[5, 6, 7, 8]);
        let info = read_header(&mut Cursor::new(wav_image(Spec::mono16(16_000), &payload)), true)
            .unwrap();
        assert_eq!(info.chunk_size, 36 + 8);
        assert_eq!(info.fmt_size, 16);
        assert_eq!(info.byte_rate, 32_000);
        assert_eq!(info.block_align, 2);
        assert_eq!(info.data_size, 8);
    }

    #[test]
    fn test_each_checked_field_reports_its_own_error() {
        let cases: [(usize, &[u8], FormatErrorKind); 7] = [
            (RIFF_AT, b"RIFX", FormatErrorKind::BadRiffMagic),
            (WAVE_AT, b"AVI ", FormatErrorKind::BadWaveMagic),
            (FMT_AT, b"LIST", FormatErrorKind::BadFmtMagic),
            (FORMAT_AT, &3u16.to_le_bytes(), FormatErrorKind::UnsupportedCodec(3)),
            (
                CHANNELS_AT,
                &2u16.to_le_bytes(),
                FormatErrorKind::UnsupportedChannelLayout(2),
            ),
            (BITS_AT, &24u16.to_le_bytes(), FormatErrorKind::UnsupportedBitDepth(24)),
            (DATA_AT, b"fact", FormatErrorKind::BadDataMagic),
        ];
        for (at, with, expected) in cases {
            let err = parse(corrupt(at, with)).unwrap_err();
            assert_eq!(err.format_kind(), Some(expected), "field at offset {at}");
        }
    }

    #[test]
    fn test_ignored_fields_are_not_validated() {
        // chunk size, fmt size, byte rate, block align, data size
        for at in [4usize, 16, 28, 32, 40] {
            let width = if at == 32 { 2 } else { 4 };
            let image = corrupt(at, &[0xFF; 4][..width]);
            assert!(parse(image).is_ok(), "field at offset {at}");
        }
    }

    #[test]
    fn test_every_truncation_is_reported() {
        let image = wav_image(Spec::mono16(16_000), &[]);
        for len in 0..HEADER_LEN {
            let err = parse(image[..len].to_vec()).unwrap_err();
            assert!(err.is_truncated_header(), "truncated to {len} bytes: {err}");
        }
    }

    #[test]
    fn test_bad_magic_reported_before_truncation() {
        let err = parse(b"RIFX\x00\x00".to_vec()).unwrap_err();
        assert_eq!(err.format_kind(), Some(FormatErrorKind::BadRiffMagic));
    }

    #[test]
    fn test_lenient_bit_depth_accepts_anything() {
        let image = corrupt(BITS_AT, &24u16.to_le_bytes());
        let info = read_header(&mut Cursor::new(image), false).unwrap();
        assert_eq!(info.descriptor.bits_per_sample(), 24);
    }

    #[test]
    fn test_extra_chunk_before_data_is_rejected() {
        let mut image = wav_image(Spec::mono16(16_000), &[]);
        let data_chunk = image.split_off(DATA_AT);
        image.extend_from_slice(b"LIST");
        image.extend_from_slice(&4u32.to_le_bytes());
        image.extend_from_slice(b"INFO");
        image.extend_from_slice(&data_chunk);
        assert!(matches!(
            parse(image),
            Err(PlayerError::Format(FormatErrorKind::BadDataMagic))
        ));
    }
}
