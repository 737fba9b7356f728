//! GSM 6.10 (GSM610WAVEFORMAT).

use super::encoding::WaveFormatEncoding;
use super::header::FormatHeader;
use crate::audio::AudioError;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

#[derive(Debug, Clone)]
pub struct Gsm610WaveFormat {
    pub(crate) header: FormatHeader,
    samples_per_block: u16,
}

impl Gsm610WaveFormat {
    /// 8 kHz mono, 65-byte blocks of 320 samples.
    pub fn new() -> Self {
        let mut header = FormatHeader::new(WaveFormatEncoding::Gsm610, 8000, 1, 1625, 65, 0);
        header.extra_size = 2;
        Self {
            header,
            samples_per_block: 320,
        }
    }

    pub(crate) fn parse(header: FormatHeader, extra: &[u8]) -> Result<Self, AudioError> {
        let samples_per_block = Cursor::new(extra).read_u16::<LittleEndian>()?;
        Ok(Self {
            header,
            samples_per_block,
        })
    }

    pub(crate) fn extra_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(2);
        let _ = bytes.write_u16::<LittleEndian>(self.samples_per_block);
        bytes
    }

    pub fn header(&self) -> &FormatHeader {
        &self.header
    }

    pub fn samples_per_block(&self) -> u16 {
        self.samples_per_block
    }
}

impl Default for Gsm610WaveFormat {
    fn default() -> Self {
        Self::new()
    }
}
