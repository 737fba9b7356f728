//! Per-channel volume access.

use super::backend::EndpointVolumeApi;
use super::device::AudioError;
use super::range::{checked_scalar, VolumeRange};

/// Fixed-size view over an endpoint's channels.
///
/// The count is captured when the endpoint is opened and never changes.
pub struct Channels<'a, A: EndpointVolumeApi + ?Sized> {
    api: &'a A,
    count: u32,
    range: VolumeRange,
}

impl<'a, A: EndpointVolumeApi + ?Sized> Channels<'a, A> {
    pub(crate) fn new(api: &'a A, count: u32, range: VolumeRange) -> Self {
        Self { api, count, range }
    }

    pub fn len(&self) -> u32 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Get the channel at `index`.
    pub fn get(&self, index: u32) -> Result<Channel<'a, A>, AudioError> {
        if index >= self.count {
            return Err(AudioError::ChannelIndexOutOfRange {
                index,
                count: self.count,
            });
        }
        Ok(Channel {
            api: self.api,
            index,
            range: self.range,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Channel<'a, A>> + '_ {
        (0..self.count).map(move |index| Channel {
            api: self.api,
            index,
            range: self.range,
        })
    }

    /// Read every channel's scalar volume.
    pub fn scalar_volumes(&self) -> Result<Vec<f32>, AudioError> {
        self.iter().map(|c| c.volume_level_scalar()).collect()
    }
}

/// One channel of an endpoint. Every call goes straight to the device.
pub struct Channel<'a, A: EndpointVolumeApi + ?Sized> {
    api: &'a A,
    index: u32,
    range: VolumeRange,
}

impl<A: EndpointVolumeApi + ?Sized> Channel<'_, A> {
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Channel volume in decibels.
    pub fn volume_level(&self) -> Result<f32, AudioError> {
        self.api.channel_volume_level(self.index)
    }

    /// Fails without touching the device if `level_db` is outside the
    /// endpoint's volume range.
    pub fn set_volume_level(&self, level_db: f32) -> Result<(), AudioError> {
        let level_db = self.range.check(level_db)?;
        self.api.set_channel_volume_level(self.index, level_db)
    }

    /// Channel volume as scalar (0.0 to 1.0).
    pub fn volume_level_scalar(&self) -> Result<f32, AudioError> {
        self.api.channel_volume_level_scalar(self.index)
    }

    /// Set the channel volume (0.0 to 1.0). NaN and infinities are rejected.
    pub fn set_volume_level_scalar(&self, level: f32) -> Result<(), AudioError> {
        let level = checked_scalar(level)?;
        self.api.set_channel_volume_level_scalar(self.index, level)
    }
}
