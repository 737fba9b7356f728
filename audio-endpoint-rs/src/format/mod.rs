//! Windows wave-format descriptors.
//!
//! Models WAVEFORMATEX and the structures that extend it, and reads and writes
//! their little-endian binary layout:
//!
//! Offset | Size | Field
//! -----: | ---: | ----------------------------------------
//! 0      |    2 | format tag
//! 2      |    2 | channels
//! 4      |    4 | samples per second
//! 8      |    4 | average bytes per second
//! 12     |    2 | block align
//! 14     |    2 | bits per sample
//! 16     |    2 | cbSize (bytes of format-specific data)
//! 18+    |  ... | format-specific data
//!
//! [`WaveFormat::serialize`] additionally prefixes the structure with its
//! length as an i32, the way the "fmt " chunk of a RIFF file does.

mod adpcm;
mod encoding;
mod extensible;
mod gsm610;
mod header;

pub use adpcm::{AdpcmWaveFormat, STANDARD_COEFFICIENTS};
pub use encoding::WaveFormatEncoding;
pub use extensible::{WaveFormatExtensible, SUBTYPE_IEEE_FLOAT, SUBTYPE_PCM};
pub use gsm610::Gsm610WaveFormat;
pub use header::FormatHeader;

use crate::audio::AudioError;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::{Cursor, Read, Write};

/// Format-specific bytes kept as-is for tags without a dedicated parser.
#[derive(Debug, Clone)]
pub struct WaveFormatExtraData {
    pub(crate) header: FormatHeader,
    extra_data: Vec<u8>,
}

impl WaveFormatExtraData {
    pub fn header(&self) -> &FormatHeader {
        &self.header
    }

    pub fn extra_data(&self) -> &[u8] {
        &self.extra_data
    }
}

/// A wave format descriptor.
///
/// Two formats are equal when their tag, channels, sample rate, byte rate,
/// block align and bits per sample match. Format-specific data is not compared.
#[derive(Debug, Clone)]
pub enum WaveFormat {
    /// Header only: PCM, IEEE float, A-law, mu-law and any tag without extra data
    Standard(FormatHeader),
    Extensible(WaveFormatExtensible),
    Adpcm(AdpcmWaveFormat),
    Gsm610(Gsm610WaveFormat),
    /// Unrecognised tag with uninterpreted format-specific bytes
    ExtraData(WaveFormatExtraData),
}

fn check_channels(channels: u16) -> Result<(), AudioError> {
    if channels < 1 {
        return Err(AudioError::ChannelsOutOfRange { channels });
    }
    Ok(())
}

impl WaveFormat {
    /// Uncompressed PCM.
    pub fn pcm(sample_rate: u32, bits_per_sample: u16, channels: u16) -> Result<Self, AudioError> {
        check_channels(channels)?;
        Ok(Self::Standard(FormatHeader::pcm(
            sample_rate,
            bits_per_sample,
            channels,
        )))
    }

    /// 16-bit PCM.
    pub fn new(sample_rate: u32, channels: u16) -> Result<Self, AudioError> {
        Self::pcm(sample_rate, 16, channels)
    }

    /// 32-bit IEEE float.
    pub fn ieee_float(sample_rate: u32, channels: u16) -> Result<Self, AudioError> {
        check_channels(channels)?;
        let block_align = (4 * u32::from(channels)) as u16;
        Ok(Self::Standard(FormatHeader::new(
            WaveFormatEncoding::IeeeFloat,
            sample_rate,
            channels,
            sample_rate.wrapping_mul(u32::from(block_align)),
            block_align,
            32,
        )))
    }

    /// 8-bit A-law.
    pub fn a_law(sample_rate: u32, channels: u16) -> Result<Self, AudioError> {
        Self::companded(WaveFormatEncoding::ALaw, sample_rate, channels)
    }

    /// 8-bit mu-law.
    pub fn mu_law(sample_rate: u32, channels: u16) -> Result<Self, AudioError> {
        Self::companded(WaveFormatEncoding::MuLaw, sample_rate, channels)
    }

    fn companded(
        encoding: WaveFormatEncoding,
        sample_rate: u32,
        channels: u16,
    ) -> Result<Self, AudioError> {
        check_channels(channels)?;
        Self::custom(
            encoding,
            sample_rate,
            channels,
            sample_rate.wrapping_mul(u32::from(channels)),
            channels,
            8,
        )
    }

    /// Any header-only format, with every field given explicitly.
    pub fn custom(
        encoding: WaveFormatEncoding,
        sample_rate: u32,
        channels: u16,
        average_bytes_per_second: u32,
        block_align: u16,
        bits_per_sample: u16,
    ) -> Result<Self, AudioError> {
        check_channels(channels)?;
        Ok(Self::Standard(FormatHeader::new(
            encoding,
            sample_rate,
            channels,
            average_bytes_per_second,
            block_align,
            bits_per_sample,
        )))
    }

    /// Parse an in-memory WAVEFORMATEX (or larger) structure.
    ///
    /// The declared `cbSize` of a PCM format is ignored, since writers often
    /// leave it uninitialised.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AudioError> {
        if bytes.len() < FormatHeader::FIXED_SIZE {
            return Err(AudioError::Truncated {
                needed: FormatHeader::FIXED_SIZE,
                available: bytes.len(),
            });
        }

        let mut cursor = Cursor::new(bytes);
        let mut header = FormatHeader::read_fixed(&mut cursor)?;
        if bytes.len() >= FormatHeader::SIZE {
            header.extra_size = cursor.read_u16::<LittleEndian>()?;
        }
        if header.encoding == WaveFormatEncoding::Pcm {
            header.extra_size = 0;
        }

        let end = FormatHeader::SIZE + usize::from(header.extra_size);
        if header.extra_size > 0 && bytes.len() < end {
            return Err(AudioError::Truncated {
                needed: end,
                available: bytes.len(),
            });
        }
        let extra = if header.extra_size > 0 {
            bytes[FormatHeader::SIZE..end].to_vec()
        } else {
            Vec::new()
        };

        Ok(Self::from_parts(header, extra))
    }

    /// Read the body of a "fmt " chunk of `format_chunk_length` bytes.
    ///
    /// A `cbSize` that disagrees with the chunk length is replaced by the
    /// length the chunk implies.
    pub fn from_format_chunk<R: Read>(
        reader: &mut R,
        format_chunk_length: i32,
    ) -> Result<Self, AudioError> {
        if format_chunk_length < FormatHeader::FIXED_SIZE as i32 {
            return Err(AudioError::InvalidFormatChunk {
                length: format_chunk_length,
            });
        }

        let mut header = FormatHeader::read_fixed(reader)?;
        if format_chunk_length > FormatHeader::FIXED_SIZE as i32 {
            let declared = reader.read_u16::<LittleEndian>()?;
            let expected = (format_chunk_length - FormatHeader::SIZE as i32)
                .clamp(0, i32::from(u16::MAX)) as u16;
            if declared != expected {
                tracing::warn!(
                    declared,
                    expected,
                    format_chunk_length,
                    "format chunk mismatch, using chunk length for extra size"
                );
            }
            header.extra_size = expected;
        }

        let mut extra = vec![0u8; usize::from(header.extra_size)];
        reader.read_exact(&mut extra)?;

        Ok(Self::from_parts(header, extra))
    }

    /// Read a length-prefixed structure as written by [`serialize`](Self::serialize).
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, AudioError> {
        let format_chunk_length = reader.read_i32::<LittleEndian>()?;
        Self::from_format_chunk(reader, format_chunk_length)
    }

    /// Pick the variant for `header.encoding`, falling back to raw bytes when
    /// the format-specific data does not parse.
    fn from_parts(header: FormatHeader, extra: Vec<u8>) -> Self {
        let parsed = match header.encoding {
            WaveFormatEncoding::Extensible => {
                WaveFormatExtensible::parse(header, &extra).map(Self::Extensible)
            }
            WaveFormatEncoding::Adpcm => AdpcmWaveFormat::parse(header, &extra).map(Self::Adpcm),
            WaveFormatEncoding::Gsm610 => {
                Gsm610WaveFormat::parse(header, &extra).map(Self::Gsm610)
            }
            _ if extra.is_empty() => return Self::Standard(header),
            _ => {
                return Self::ExtraData(WaveFormatExtraData {
                    header,
                    extra_data: extra,
                })
            }
        };

        parsed.unwrap_or_else(|e| {
            tracing::debug!(encoding = %header.encoding, error = %e, "keeping format data uninterpreted");
            if extra.is_empty() {
                Self::Standard(header)
            } else {
                Self::ExtraData(WaveFormatExtraData {
                    header,
                    extra_data: extra,
                })
            }
        })
    }

    pub fn header(&self) -> &FormatHeader {
        match self {
            Self::Standard(header) => header,
            Self::Extensible(format) => &format.header,
            Self::Adpcm(format) => &format.header,
            Self::Gsm610(format) => &format.header,
            Self::ExtraData(format) => &format.header,
        }
    }

    pub fn encoding(&self) -> WaveFormatEncoding {
        self.header().encoding
    }

    pub fn channels(&self) -> u16 {
        self.header().channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.header().sample_rate
    }

    pub fn average_bytes_per_second(&self) -> u32 {
        self.header().average_bytes_per_second
    }

    pub fn block_align(&self) -> u16 {
        self.header().block_align
    }

    pub fn bits_per_sample(&self) -> u16 {
        self.header().bits_per_sample
    }

    pub fn extra_size(&self) -> u16 {
        self.header().extra_size
    }

    /// Exactly `extra_size` bytes of format-specific data.
    fn extra_bytes(&self) -> Vec<u8> {
        let mut bytes = match self {
            Self::Standard(_) => Vec::new(),
            Self::Extensible(format) => format.extra_bytes(),
            Self::Adpcm(format) => format.extra_bytes(),
            Self::Gsm610(format) => format.extra_bytes(),
            Self::ExtraData(format) => format.extra_data.clone(),
        };
        bytes.resize(usize::from(self.extra_size()), 0);
        bytes
    }

    /// The in-memory structure, readable by [`from_bytes`](Self::from_bytes).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(FormatHeader::SIZE + usize::from(self.extra_size()));
        // writes into a Vec cannot fail
        let _ = self.header().write(&mut bytes);
        bytes.extend_from_slice(&self.extra_bytes());
        bytes
    }

    /// Write the length prefix (`18 + extra_size`) followed by the structure.
    pub fn serialize<W: Write>(&self, writer: &mut W) -> Result<(), AudioError> {
        let length = FormatHeader::SIZE as i32 + i32::from(self.extra_size());
        writer.write_i32::<LittleEndian>(length)?;
        writer.write_all(&self.to_bytes())?;
        Ok(())
    }

    /// Bytes needed to hold `milliseconds` of audio, rounded up to a whole block.
    pub fn convert_latency_to_byte_size(&self, milliseconds: u32) -> u32 {
        let mut bytes = (f64::from(self.average_bytes_per_second()) * f64::from(milliseconds)
            / 1000.0) as u32;
        let block_align = u32::from(self.block_align());
        if block_align > 0 && bytes % block_align != 0 {
            bytes = bytes + block_align - bytes % block_align;
        }
        bytes
    }
}

impl Default for WaveFormat {
    /// 44.1kHz 16-bit stereo PCM.
    fn default() -> Self {
        Self::Standard(FormatHeader::pcm(44100, 16, 2))
    }
}

impl PartialEq for WaveFormat {
    fn eq(&self, other: &Self) -> bool {
        self.header() == other.header()
    }
}

impl Eq for WaveFormat {}

impl Hash for WaveFormat {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.header().hash(state);
    }
}

impl From<WaveFormatExtensible> for WaveFormat {
    fn from(format: WaveFormatExtensible) -> Self {
        Self::Extensible(format)
    }
}

impl From<AdpcmWaveFormat> for WaveFormat {
    fn from(format: AdpcmWaveFormat) -> Self {
        Self::Adpcm(format)
    }
}

impl From<Gsm610WaveFormat> for WaveFormat {
    fn from(format: Gsm610WaveFormat) -> Self {
        Self::Gsm610(format)
    }
}

impl fmt::Display for WaveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extensible(format) => fmt::Display::fmt(format, f),
            Self::Adpcm(format) => fmt::Display::fmt(format, f),
            _ => {
                let header = self.header();
                match header.encoding {
                    WaveFormatEncoding::Pcm => write!(
                        f,
                        "{} bit PCM: {}kHz {} channels",
                        header.bits_per_sample,
                        header.sample_rate / 1000,
                        header.channels
                    ),
                    other => write!(f, "{other}"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn round_trip(format: &WaveFormat) -> WaveFormat {
        let mut bytes = Vec::new();
        format.serialize(&mut bytes).unwrap();
        WaveFormat::read_from(&mut Cursor::new(bytes)).unwrap()
    }

    #[test]
    fn test_pcm_derives_block_align_and_rate() {
        let format = WaveFormat::pcm(44100, 16, 2).unwrap();
        assert_eq!(format.encoding(), WaveFormatEncoding::Pcm);
        assert_eq!(format.block_align(), 4);
        assert_eq!(format.average_bytes_per_second(), 176_400);
        assert_eq!(format.extra_size(), 0);
        assert_eq!(WaveFormat::default(), format);
        assert_eq!(WaveFormat::new(44100, 2).unwrap(), format);
    }

    #[test]
    fn test_zero_channels_is_rejected() {
        assert!(matches!(
            WaveFormat::pcm(44100, 16, 0),
            Err(AudioError::ChannelsOutOfRange { channels: 0 })
        ));
        assert!(WaveFormat::ieee_float(44100, 0).is_err());
    }

    #[test]
    fn test_float_and_companded_layouts() {
        let float = WaveFormat::ieee_float(48000, 2).unwrap();
        assert_eq!(float.bits_per_sample(), 32);
        assert_eq!(float.block_align(), 8);
        assert_eq!(float.average_bytes_per_second(), 384_000);

        let a_law = WaveFormat::a_law(8000, 1).unwrap();
        assert_eq!(a_law.encoding(), WaveFormatEncoding::ALaw);
        assert_eq!(a_law.block_align(), 1);
        assert_eq!(a_law.average_bytes_per_second(), 8000);

        let mu_law = WaveFormat::mu_law(8000, 2).unwrap();
        assert_eq!(mu_law.bits_per_sample(), 8);
        assert_eq!(mu_law.block_align(), 2);
        assert_eq!(mu_law.average_bytes_per_second(), 16000);
    }

    #[test]
    fn test_serialize_writes_length_prefix() {
        let format: WaveFormat = AdpcmWaveFormat::new(8000, 1).unwrap().into();
        let mut bytes = Vec::new();
        format.serialize(&mut bytes).unwrap();

        assert_eq!(&bytes[..4], &50i32.to_le_bytes());
        assert_eq!(bytes.len(), 4 + 18 + 32);
        assert_eq!(&bytes[20..22], &32u16.to_le_bytes());
    }

    /// Tag 0x0160 (WMA v1) with four opaque bytes of format-specific data.
    fn unknown_with_extra_data() -> WaveFormat {
        let mut bytes = WaveFormat::custom(WaveFormatEncoding::Other(0x0160), 44100, 2, 16000, 4096, 0)
            .unwrap()
            .to_bytes();
        bytes[16..18].copy_from_slice(&4u16.to_le_bytes());
        bytes.extend_from_slice(&[1, 2, 3, 4]);
        WaveFormat::from_bytes(&bytes).unwrap()
    }

    #[test]
    fn test_round_trip_every_variant() {
        let formats: Vec<WaveFormat> = vec![
            WaveFormat::pcm(22050, 8, 1).unwrap(),
            WaveFormat::ieee_float(96000, 6).unwrap(),
            WaveFormat::mu_law(8000, 1).unwrap(),
            WaveFormatExtensible::new(48000, 24, 2).unwrap().into(),
            AdpcmWaveFormat::new(44100, 2).unwrap().into(),
            Gsm610WaveFormat::new().into(),
            unknown_with_extra_data(),
        ];

        for format in formats {
            let read = round_trip(&format);
            assert_eq!(read, format, "{format}");
            assert_eq!(read.extra_size(), format.extra_size());
            assert_eq!(read.to_bytes(), format.to_bytes());
        }
    }

    #[test]
    fn test_round_trip_keeps_subtype_fields() {
        let adpcm: WaveFormat = AdpcmWaveFormat::new(22050, 2).unwrap().into();
        match round_trip(&adpcm) {
            WaveFormat::Adpcm(read) => {
                assert_eq!(read.samples_per_block(), 500);
                assert_eq!(read.coefficients(), &STANDARD_COEFFICIENTS);
            }
            other => panic!("expected ADPCM, got {other:?}"),
        }

        let extensible: WaveFormat = WaveFormatExtensible::new(48000, 32, 2).unwrap().into();
        match round_trip(&extensible) {
            WaveFormat::Extensible(read) => {
                assert_eq!(read.sub_format(), SUBTYPE_IEEE_FLOAT);
                assert_eq!(read.channel_mask(), 0b11);
                assert_eq!(read.valid_bits_per_sample(), 32);
            }
            other => panic!("expected extensible, got {other:?}"),
        }
    }

    #[test]
    fn test_from_bytes_dispatches_on_tag() {
        let extensible: WaveFormat = WaveFormatExtensible::new(44100, 16, 2).unwrap().into();
        assert!(matches!(
            WaveFormat::from_bytes(&extensible.to_bytes()).unwrap(),
            WaveFormat::Extensible(_)
        ));

        let gsm: WaveFormat = Gsm610WaveFormat::new().into();
        match WaveFormat::from_bytes(&gsm.to_bytes()).unwrap() {
            WaveFormat::Gsm610(read) => assert_eq!(read.samples_per_block(), 320),
            other => panic!("expected GSM, got {other:?}"),
        }
    }

    #[test]
    fn test_from_bytes_ignores_pcm_extra_size() {
        let mut bytes = WaveFormat::pcm(8000, 16, 1).unwrap().to_bytes();
        // garbage cbSize with no data behind it
        bytes[16] = 0xFF;
        bytes[17] = 0x7F;

        let format = WaveFormat::from_bytes(&bytes).unwrap();
        assert!(matches!(format, WaveFormat::Standard(_)));
        assert_eq!(format.extra_size(), 0);
    }

    #[test]
    fn test_from_bytes_accepts_16_byte_pcm() {
        let bytes = WaveFormat::pcm(8000, 16, 1).unwrap().to_bytes();
        let format = WaveFormat::from_bytes(&bytes[..16]).unwrap();
        assert_eq!(format, WaveFormat::pcm(8000, 16, 1).unwrap());
    }

    #[test]
    fn test_unknown_tag_keeps_extra_data() {
        let original = unknown_with_extra_data();
        match &original {
            WaveFormat::ExtraData(format) => {
                assert_eq!(format.extra_data(), &[1, 2, 3, 4]);
                assert_eq!(format.header().encoding(), WaveFormatEncoding::Other(0x0160));
            }
            other => panic!("expected extra data, got {other:?}"),
        }

        let read = round_trip(&original);
        assert_eq!(read, original);
        assert_eq!(read.extra_size(), 4);
        match read {
            WaveFormat::ExtraData(format) => assert_eq!(format.extra_data(), &[1, 2, 3, 4]),
            other => panic!("expected extra data after round trip, got {other:?}"),
        }
    }

    #[test]
    fn test_truncated_buffers() {
        assert!(matches!(
            WaveFormat::from_bytes(&[1, 0, 2]),
            Err(AudioError::Truncated { needed: 16, available: 3 })
        ));

        let adpcm: WaveFormat = AdpcmWaveFormat::new(8000, 1).unwrap().into();
        let bytes = adpcm.to_bytes();
        assert!(matches!(
            WaveFormat::from_bytes(&bytes[..30]),
            Err(AudioError::Truncated { needed: 50, available: 30 })
        ));
    }

    #[test]
    fn test_short_format_chunk_is_invalid() {
        let mut reader = Cursor::new(vec![0u8; 32]);
        assert!(matches!(
            WaveFormat::from_format_chunk(&mut reader, 14),
            Err(AudioError::InvalidFormatChunk { length: 14 })
        ));
    }

    #[test]
    fn test_sixteen_byte_chunk_has_no_extra_size() {
        let bytes = WaveFormat::pcm(44100, 16, 2).unwrap().to_bytes();
        let format = WaveFormat::from_format_chunk(&mut Cursor::new(&bytes[..16]), 16).unwrap();
        assert_eq!(format.extra_size(), 0);
        assert_eq!(format, WaveFormat::default());
    }

    #[test]
    fn test_extra_size_mismatch_is_corrected() {
        // cbSize says 0 but the chunk carries two more bytes
        let mut bytes = WaveFormat::pcm(44100, 16, 2).unwrap().to_bytes();
        bytes.extend_from_slice(&[0xAB, 0xCD]);
        let mut reader = Cursor::new(bytes);

        let format = WaveFormat::from_format_chunk(&mut reader, 20).unwrap();
        assert_eq!(format.extra_size(), 2);
        assert_eq!(reader.position(), 20);
        match format {
            WaveFormat::ExtraData(data) => assert_eq!(data.extra_data(), &[0xAB, 0xCD]),
            other => panic!("expected extra data, got {other:?}"),
        }
    }

    #[test]
    fn test_overstated_extra_size_is_corrected() {
        let mut bytes = WaveFormat::pcm(44100, 16, 2).unwrap().to_bytes();
        bytes[16..18].copy_from_slice(&40u16.to_le_bytes());

        let format = WaveFormat::from_format_chunk(&mut Cursor::new(bytes), 18).unwrap();
        assert_eq!(format.extra_size(), 0);
        assert!(matches!(format, WaveFormat::Standard(_)));
    }

    #[test]
    fn test_equality_ignores_format_specific_fields() {
        let a = WaveFormatExtensible::custom(48000, 16, 2, 16, 0x3, SUBTYPE_PCM).unwrap();
        let b = WaveFormatExtensible::custom(48000, 16, 2, 12, 0x4, SUBTYPE_PCM).unwrap();
        assert_eq!(WaveFormat::from(a), WaveFormat::from(b));
        assert_ne!(
            WaveFormat::pcm(48000, 16, 2).unwrap(),
            WaveFormat::pcm(48000, 16, 1).unwrap()
        );
    }

    #[test]
    fn test_latency_rounds_up_to_block() {
        let format = WaveFormat::pcm(44100, 16, 2).unwrap();
        assert_eq!(format.convert_latency_to_byte_size(10), 1764);
        assert_eq!(format.convert_latency_to_byte_size(1), 176);

        // 132.3 bytes per millisecond, 3-byte blocks
        let mono = WaveFormat::pcm(44100, 24, 1).unwrap();
        assert_eq!(mono.convert_latency_to_byte_size(2), 264);
        assert_eq!(mono.convert_latency_to_byte_size(5), 663);
        assert_eq!(mono.convert_latency_to_byte_size(0), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            WaveFormat::pcm(44100, 16, 2).unwrap().to_string(),
            "16 bit PCM: 44kHz 2 channels"
        );
        assert_eq!(WaveFormat::a_law(8000, 1).unwrap().to_string(), "ALaw");
        assert!(WaveFormat::from(WaveFormatExtensible::new(48000, 16, 2).unwrap())
            .to_string()
            .starts_with("16 bit PCM: 48kHz 2 channels wBitsPerSample:16"));
    }

    proptest! {
        #[test]
        fn pcm_invariants_hold(
            sample_rate in 1u32..=384_000,
            bytes_per_sample in 1u16..=4,
            channels in 1u16..=32,
        ) {
            let bits = bytes_per_sample * 8;
            let format = WaveFormat::pcm(sample_rate, bits, channels).unwrap();

            prop_assert_eq!(format.block_align(), channels * bytes_per_sample);
            prop_assert_eq!(
                format.average_bytes_per_second(),
                sample_rate * u32::from(format.block_align())
            );
            prop_assert_eq!(round_trip(&format), format);
        }
    }
}
