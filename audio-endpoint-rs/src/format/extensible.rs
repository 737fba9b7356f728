//! WAVEFORMATEXTENSIBLE.

use super::encoding::WaveFormatEncoding;
use super::header::FormatHeader;
use super::WaveFormat;
use crate::audio::AudioError;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fmt;
use std::io::Cursor;
use uuid::Uuid;

/// KSDATAFORMAT_SUBTYPE_PCM
pub const SUBTYPE_PCM: Uuid = Uuid::from_u128(0x00000001_0000_0010_8000_00aa00389b71);

/// KSDATAFORMAT_SUBTYPE_IEEE_FLOAT
pub const SUBTYPE_IEEE_FLOAT: Uuid = Uuid::from_u128(0x00000003_0000_0010_8000_00aa00389b71);

/// Bytes of format-specific data after `cbSize`.
const EXTENSIBLE_EXTRA_SIZE: u16 = 22;

/// Wave format with valid-bit precision, a speaker mask and a sub-format GUID.
#[derive(Debug, Clone)]
pub struct WaveFormatExtensible {
    pub(crate) header: FormatHeader,
    valid_bits_per_sample: u16,
    channel_mask: u32,
    sub_format: Uuid,
}

/// One bit per channel, lowest channels first.
fn default_channel_mask(channels: u16) -> u32 {
    (0..u32::from(channels).min(32)).fold(0, |mask, n| mask | (1 << n))
}

impl WaveFormatExtensible {
    /// PCM layout, or IEEE float when `bits_per_sample` is 32.
    pub fn new(sample_rate: u32, bits_per_sample: u16, channels: u16) -> Result<Self, AudioError> {
        let sub_format = if bits_per_sample == 32 {
            SUBTYPE_IEEE_FLOAT
        } else {
            SUBTYPE_PCM
        };
        Self::custom(
            sample_rate,
            bits_per_sample,
            channels,
            bits_per_sample,
            default_channel_mask(channels),
            sub_format,
        )
    }

    /// Fully specified layout.
    pub fn custom(
        sample_rate: u32,
        bits_per_sample: u16,
        channels: u16,
        valid_bits_per_sample: u16,
        channel_mask: u32,
        sub_format: Uuid,
    ) -> Result<Self, AudioError> {
        if channels < 1 {
            return Err(AudioError::ChannelsOutOfRange { channels });
        }
        let mut header = FormatHeader::pcm(sample_rate, bits_per_sample, channels);
        header.encoding = WaveFormatEncoding::Extensible;
        header.extra_size = EXTENSIBLE_EXTRA_SIZE;
        Ok(Self {
            header,
            valid_bits_per_sample,
            channel_mask,
            sub_format,
        })
    }

    pub(crate) fn parse(header: FormatHeader, extra: &[u8]) -> Result<Self, AudioError> {
        if extra.len() < usize::from(EXTENSIBLE_EXTRA_SIZE) {
            return Err(AudioError::Truncated {
                needed: usize::from(EXTENSIBLE_EXTRA_SIZE),
                available: extra.len(),
            });
        }
        let mut cursor = Cursor::new(extra);
        let valid_bits_per_sample = cursor.read_u16::<LittleEndian>()?;
        let channel_mask = cursor.read_u32::<LittleEndian>()?;
        let mut guid = [0u8; 16];
        guid.copy_from_slice(&extra[6..22]);
        Ok(Self {
            header,
            valid_bits_per_sample,
            channel_mask,
            sub_format: Uuid::from_bytes_le(guid),
        })
    }

    pub(crate) fn extra_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(usize::from(EXTENSIBLE_EXTRA_SIZE));
        // writes into a Vec cannot fail
        let _ = bytes.write_u16::<LittleEndian>(self.valid_bits_per_sample);
        let _ = bytes.write_u32::<LittleEndian>(self.channel_mask);
        bytes.extend_from_slice(&self.sub_format.to_bytes_le());
        bytes
    }

    pub fn header(&self) -> &FormatHeader {
        &self.header
    }

    pub fn valid_bits_per_sample(&self) -> u16 {
        self.valid_bits_per_sample
    }

    pub fn channel_mask(&self) -> u32 {
        self.channel_mask
    }

    pub fn sub_format(&self) -> Uuid {
        self.sub_format
    }

    /// The equivalent plain PCM or IEEE float format.
    pub fn to_standard_wave_format(&self) -> Result<WaveFormat, AudioError> {
        let header = &self.header;
        if self.sub_format == SUBTYPE_IEEE_FLOAT && header.bits_per_sample == 32 {
            return WaveFormat::ieee_float(header.sample_rate, header.channels);
        }
        if self.sub_format == SUBTYPE_PCM {
            return WaveFormat::pcm(header.sample_rate, header.bits_per_sample, header.channels);
        }
        Err(AudioError::UnsupportedSubFormat(self.sub_format))
    }
}

impl fmt::Display for WaveFormatExtensible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bit PCM: {}kHz {} channels wBitsPerSample:{} dwChannelMask:{} subFormat:{} extraSize:{}",
            self.header.bits_per_sample,
            self.header.sample_rate / 1000,
            self.header.channels,
            self.valid_bits_per_sample,
            self.channel_mask,
            self.sub_format,
            self.header.extra_size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_mask_has_one_bit_per_channel() {
        let format = WaveFormatExtensible::new(48000, 24, 6).unwrap();
        assert_eq!(format.channel_mask(), 0b11_1111);
        assert_eq!(format.header().extra_size(), 22);
        assert_eq!(format.header().block_align(), 18);
        assert_eq!(format.sub_format(), SUBTYPE_PCM);
    }

    #[test]
    fn test_32_bit_is_float() {
        let format = WaveFormatExtensible::new(48000, 32, 2).unwrap();
        assert_eq!(format.sub_format(), SUBTYPE_IEEE_FLOAT);

        let standard = format.to_standard_wave_format().unwrap();
        assert_eq!(standard, WaveFormat::ieee_float(48000, 2).unwrap());
    }

    #[test]
    fn test_pcm_downcast() {
        let format = WaveFormatExtensible::new(44100, 16, 2).unwrap();
        let standard = format.to_standard_wave_format().unwrap();
        assert_eq!(standard, WaveFormat::pcm(44100, 16, 2).unwrap());
    }

    #[test]
    fn test_unknown_sub_format_is_unsupported() {
        let odd = Uuid::from_u128(0x00000092_0000_0010_8000_00aa00389b71);
        let format = WaveFormatExtensible::custom(48000, 16, 2, 16, 0x3, odd).unwrap();
        assert!(matches!(
            format.to_standard_wave_format(),
            Err(AudioError::UnsupportedSubFormat(guid)) if guid == odd
        ));
    }

    #[test]
    fn test_float_sub_format_needs_32_bits() {
        let format = WaveFormatExtensible::custom(48000, 24, 2, 24, 0x3, SUBTYPE_IEEE_FLOAT).unwrap();
        assert!(format.to_standard_wave_format().is_err());
    }

    #[test]
    fn test_guid_uses_windows_byte_order() {
        let format = WaveFormatExtensible::new(44100, 16, 2).unwrap();
        let bytes = format.extra_bytes();
        assert_eq!(bytes.len(), 22);
        assert_eq!(
            &bytes[6..],
            &[
                0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x80, 0x00, 0x00, 0xAA, 0x00,
                0x38, 0x9B, 0x71
            ]
        );
    }
}
