//! Wave format encoding tags.

use std::fmt;

/// The `wFormatTag` of a WAVEFORMATEX.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaveFormatEncoding {
    Unknown,
    Pcm,
    /// Microsoft ADPCM
    Adpcm,
    IeeeFloat,
    ALaw,
    MuLaw,
    /// IMA / DVI ADPCM
    DviAdpcm,
    Gsm610,
    Mpeg,
    MpegLayer3,
    /// WAVEFORMATEXTENSIBLE
    Extensible,
    Other(u16),
}

impl WaveFormatEncoding {
    pub const fn from_tag(tag: u16) -> Self {
        match tag {
            0x0000 => Self::Unknown,
            0x0001 => Self::Pcm,
            0x0002 => Self::Adpcm,
            0x0003 => Self::IeeeFloat,
            0x0006 => Self::ALaw,
            0x0007 => Self::MuLaw,
            0x0011 => Self::DviAdpcm,
            0x0031 => Self::Gsm610,
            0x0050 => Self::Mpeg,
            0x0055 => Self::MpegLayer3,
            0xFFFE => Self::Extensible,
            other => Self::Other(other),
        }
    }

    pub const fn tag(self) -> u16 {
        match self {
            Self::Unknown => 0x0000,
            Self::Pcm => 0x0001,
            Self::Adpcm => 0x0002,
            Self::IeeeFloat => 0x0003,
            Self::ALaw => 0x0006,
            Self::MuLaw => 0x0007,
            Self::DviAdpcm => 0x0011,
            Self::Gsm610 => 0x0031,
            Self::Mpeg => 0x0050,
            Self::MpegLayer3 => 0x0055,
            Self::Extensible => 0xFFFE,
            Self::Other(tag) => tag,
        }
    }
}

impl From<u16> for WaveFormatEncoding {
    fn from(tag: u16) -> Self {
        Self::from_tag(tag)
    }
}

impl From<WaveFormatEncoding> for u16 {
    fn from(encoding: WaveFormatEncoding) -> Self {
        encoding.tag()
    }
}

impl fmt::Display for WaveFormatEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(tag) => write!(f, "0x{tag:04X}"),
            known => write!(f, "{known:?}"),
        }
    }
}
