//! Microsoft ADPCM (ADPCMWAVEFORMAT).

use super::encoding::WaveFormatEncoding;
use super::header::FormatHeader;
use crate::audio::AudioError;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fmt;
use std::io::Cursor;

/// The seven standard predictor coefficient pairs.
pub const STANDARD_COEFFICIENTS: [i16; 14] =
    [256, 0, 512, -256, 0, 0, 192, 64, 240, 0, 460, -208, 392, -232];

const ADPCM_BITS_PER_SAMPLE: u16 = 4;
const ADPCM_EXTRA_SIZE: u16 = 32;

#[derive(Debug, Clone)]
pub struct AdpcmWaveFormat {
    pub(crate) header: FormatHeader,
    samples_per_block: u16,
    coefficients: Vec<i16>,
}

/// Block size used by the Microsoft encoder for each sample rate.
fn block_align_for(sample_rate: u32) -> u16 {
    match sample_rate {
        8000 | 11025 => 256,
        22050 => 512,
        _ => 1024,
    }
}

impl AdpcmWaveFormat {
    /// Standard 4-bit Microsoft ADPCM for `sample_rate` and `channels`.
    pub fn new(sample_rate: u32, channels: u16) -> Result<Self, AudioError> {
        let block_align = block_align_for(sample_rate);
        let preamble = 7 * u32::from(channels);
        if channels < 1 || preamble >= u32::from(block_align) {
            return Err(AudioError::ChannelsOutOfRange { channels });
        }

        let bits = u32::from(ADPCM_BITS_PER_SAMPLE);
        let samples_per_block =
            ((u32::from(block_align) - preamble) * 8 / (bits * u32::from(channels)) + 2) as u16;
        let average_bytes_per_second = (u64::from(sample_rate) * u64::from(block_align)
            / u64::from(samples_per_block)) as u32;

        let mut header = FormatHeader::new(
            WaveFormatEncoding::Adpcm,
            sample_rate,
            channels,
            average_bytes_per_second,
            block_align,
            ADPCM_BITS_PER_SAMPLE,
        );
        header.extra_size = ADPCM_EXTRA_SIZE;

        Ok(Self {
            header,
            samples_per_block,
            coefficients: STANDARD_COEFFICIENTS.to_vec(),
        })
    }

    pub(crate) fn parse(header: FormatHeader, extra: &[u8]) -> Result<Self, AudioError> {
        let mut cursor = Cursor::new(extra);
        let samples_per_block = cursor.read_u16::<LittleEndian>()?;
        let pairs = cursor.read_u16::<LittleEndian>()?;
        let mut coefficients = Vec::with_capacity(usize::from(pairs) * 2);
        for _ in 0..usize::from(pairs) * 2 {
            coefficients.push(cursor.read_i16::<LittleEndian>()?);
        }
        Ok(Self {
            header,
            samples_per_block,
            coefficients,
        })
    }

    pub(crate) fn extra_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(4 + self.coefficients.len() * 2);
        let _ = bytes.write_u16::<LittleEndian>(self.samples_per_block);
        let _ = bytes.write_u16::<LittleEndian>(self.num_coefficients());
        for coefficient in &self.coefficients {
            let _ = bytes.write_i16::<LittleEndian>(*coefficient);
        }
        bytes
    }

    pub fn header(&self) -> &FormatHeader {
        &self.header
    }

    pub fn samples_per_block(&self) -> u16 {
        self.samples_per_block
    }

    /// Number of coefficient pairs.
    pub fn num_coefficients(&self) -> u16 {
        (self.coefficients.len() / 2) as u16
    }

    /// Flattened coefficient pairs.
    pub fn coefficients(&self) -> &[i16] {
        &self.coefficients
    }
}

impl fmt::Display for AdpcmWaveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Microsoft ADPCM {} Hz {} channels {} bits per sample {} samples per block",
            self.header.sample_rate,
            self.header.channels,
            self.header.bits_per_sample,
            self.samples_per_block
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected_samples_per_block(block_align: u32, channels: u32) -> u16 {
        (((block_align - 7 * channels) * 8) / (4 * channels) + 2) as u16
    }

    #[test]
    fn test_block_align_lookup() {
        let cases = [
            (8000, 1, 256),
            (11025, 1, 256),
            (22050, 2, 512),
            (44100, 2, 1024),
            (48000, 2, 1024),
        ];
        for (rate, channels, block_align) in cases {
            let format = AdpcmWaveFormat::new(rate, channels).unwrap();
            assert_eq!(format.header().block_align(), block_align, "rate {rate}");
            assert_eq!(
                format.samples_per_block(),
                expected_samples_per_block(u32::from(block_align), u32::from(channels))
            );
        }
    }

    #[test]
    fn test_known_values() {
        let mono = AdpcmWaveFormat::new(8000, 1).unwrap();
        assert_eq!(mono.samples_per_block(), 500);
        assert_eq!(mono.header().average_bytes_per_second(), 4096);

        let stereo = AdpcmWaveFormat::new(22050, 2).unwrap();
        assert_eq!(stereo.samples_per_block(), 500);
        assert_eq!(stereo.header().average_bytes_per_second(), 22579);

        let cd = AdpcmWaveFormat::new(44100, 2).unwrap();
        assert_eq!(cd.samples_per_block(), 1012);
        assert_eq!(cd.header().average_bytes_per_second(), 44622);
        assert_eq!(cd.header().bits_per_sample(), 4);
        assert_eq!(cd.header().extra_size(), 32);
    }

    #[test]
    fn test_coefficient_table() {
        let format = AdpcmWaveFormat::new(8000, 1).unwrap();
        assert_eq!(format.num_coefficients(), 7);
        assert_eq!(
            format.coefficients(),
            &[256, 0, 512, -256, 0, 0, 192, 64, 240, 0, 460, -208, 392, -232]
        );
        assert_eq!(format.extra_bytes().len(), 32);
    }

    #[test]
    fn test_rejects_unusable_channel_counts() {
        assert!(AdpcmWaveFormat::new(8000, 0).is_err());
        assert!(AdpcmWaveFormat::new(8000, 40).is_err());
    }

    #[test]
    fn test_display() {
        let format = AdpcmWaveFormat::new(8000, 1).unwrap();
        assert_eq!(
            format.to_string(),
            "Microsoft ADPCM 8000 Hz 1 channels 4 bits per sample 500 samples per block"
        );
    }
}
