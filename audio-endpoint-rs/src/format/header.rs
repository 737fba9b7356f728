//! The fixed WAVEFORMATEX prefix shared by every format variant.

use super::encoding::WaveFormatEncoding;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::hash::{Hash, Hasher};
use std::io::{self, Read, Write};

/// Tag, channels, rate, byte rate, block align and bits per sample, plus the
/// declared size of the format-specific data that follows.
///
/// Equality and hashing ignore `extra_size`.
#[derive(Debug, Clone, Copy)]
pub struct FormatHeader {
    pub(crate) encoding: WaveFormatEncoding,
    pub(crate) channels: u16,
    pub(crate) sample_rate: u32,
    pub(crate) average_bytes_per_second: u32,
    pub(crate) block_align: u16,
    pub(crate) bits_per_sample: u16,
    pub(crate) extra_size: u16,
}

impl FormatHeader {
    /// Bytes before `cbSize`.
    pub const FIXED_SIZE: usize = 16;

    /// Bytes up to and including `cbSize`.
    pub const SIZE: usize = 18;

    pub(crate) fn new(
        encoding: WaveFormatEncoding,
        sample_rate: u32,
        channels: u16,
        average_bytes_per_second: u32,
        block_align: u16,
        bits_per_sample: u16,
    ) -> Self {
        Self {
            encoding,
            channels,
            sample_rate,
            average_bytes_per_second,
            block_align,
            bits_per_sample,
            extra_size: 0,
        }
    }

    /// Uncompressed PCM layout with `block_align` and byte rate derived.
    pub(crate) fn pcm(sample_rate: u32, bits_per_sample: u16, channels: u16) -> Self {
        let block_align = (u32::from(channels) * u32::from(bits_per_sample / 8)) as u16;
        Self::new(
            WaveFormatEncoding::Pcm,
            sample_rate,
            channels,
            sample_rate.wrapping_mul(u32::from(block_align)),
            block_align,
            bits_per_sample,
        )
    }

    /// Read the 16 fixed bytes. `extra_size` is left at zero.
    pub(crate) fn read_fixed<R: Read>(reader: &mut R) -> io::Result<Self> {
        let encoding = WaveFormatEncoding::from_tag(reader.read_u16::<LittleEndian>()?);
        let channels = reader.read_u16::<LittleEndian>()?;
        let sample_rate = reader.read_u32::<LittleEndian>()?;
        let average_bytes_per_second = reader.read_u32::<LittleEndian>()?;
        let block_align = reader.read_u16::<LittleEndian>()?;
        let bits_per_sample = reader.read_u16::<LittleEndian>()?;
        Ok(Self::new(
            encoding,
            sample_rate,
            channels,
            average_bytes_per_second,
            block_align,
            bits_per_sample,
        ))
    }

    /// Write all 18 bytes, `cbSize` included.
    pub(crate) fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u16::<LittleEndian>(self.encoding.tag())?;
        writer.write_u16::<LittleEndian>(self.channels)?;
        writer.write_u32::<LittleEndian>(self.sample_rate)?;
        writer.write_u32::<LittleEndian>(self.average_bytes_per_second)?;
        writer.write_u16::<LittleEndian>(self.block_align)?;
        writer.write_u16::<LittleEndian>(self.bits_per_sample)?;
        writer.write_u16::<LittleEndian>(self.extra_size)
    }

    pub fn encoding(&self) -> WaveFormatEncoding {
        self.encoding
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn average_bytes_per_second(&self) -> u32 {
        self.average_bytes_per_second
    }

    pub fn block_align(&self) -> u16 {
        self.block_align
    }

    pub fn bits_per_sample(&self) -> u16 {
        self.bits_per_sample
    }

    pub fn extra_size(&self) -> u16 {
        self.extra_size
    }

    fn key(&self) -> (u16, u16, u32, u32, u16, u16) {
        (
            self.encoding.tag(),
            self.channels,
            self.sample_rate,
            self.average_bytes_per_second,
            self.block_align,
            self.bits_per_sample,
        )
    }
}

impl PartialEq for FormatHeader {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for FormatHeader {}

impl Hash for FormatHeader {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_layout_is_little_endian() {
        let header = FormatHeader::pcm(44100, 16, 2);
        let mut bytes = Vec::new();
        header.write(&mut bytes).unwrap();

        assert_eq!(
            bytes,
            vec![
                0x01, 0x00, // PCM
                0x02, 0x00, // channels
                0x44, 0xAC, 0x00, 0x00, // 44100
                0x10, 0xB1, 0x02, 0x00, // 176400
                0x04, 0x00, // block align
                0x10, 0x00, // bits
                0x00, 0x00, // cbSize
            ]
        );

        let read = FormatHeader::read_fixed(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(read, header);
    }

    #[test]
    fn test_equality_ignores_extra_size() {
        let mut a = FormatHeader::pcm(8000, 8, 1);
        let b = a;
        a.extra_size = 12;
        assert_eq!(a, b);
    }
}
