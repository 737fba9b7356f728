//! Stereo balance over an endpoint's channel volumes.
//!
//! Balance is not stored by the device. It is derived from two channel
//! volumes relative to the master volume: -1.0 is left only, 1.0 is right only
//! and 0.0 is centered.

use super::backend::EndpointVolumeApi;
use super::device::AudioError;
use super::volume::AudioEndpointVolume;
use serde::{Deserialize, Serialize};

/// Floor for the master volume so a silent endpoint does not divide by zero.
const MIN_MASTER_VOLUME: f32 = 1e-6;

/// The channel indices treated as left and right.
///
/// Most drivers report left as channel 0 and right as channel 1, but some
/// driver combinations swap them, so the pair is configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StereoChannels {
    pub left: u32,
    pub right: u32,
}

impl StereoChannels {
    pub const fn new(left: u32, right: u32) -> Self {
        Self { left, right }
    }

    /// The same pair with left and right exchanged.
    pub const fn swapped(self) -> Self {
        Self {
            left: self.right,
            right: self.left,
        }
    }

    pub fn validate(&self) -> Result<(), AudioError> {
        if self.left == self.right {
            return Err(AudioError::InvalidChannelPair { index: self.left });
        }
        Ok(())
    }
}

impl Default for StereoChannels {
    fn default() -> Self {
        Self::new(0, 1)
    }
}

fn verify_channels<A: EndpointVolumeApi>(
    volume: &AudioEndpointVolume<A>,
    channels: StereoChannels,
) -> Result<(), AudioError> {
    channels.validate()?;
    let count = volume.channel_count();
    if count < 2 {
        return Err(AudioError::TooFewChannels { count });
    }
    for index in [channels.left, channels.right] {
        if index >= count {
            return Err(AudioError::ChannelIndexOutOfRange { index, count });
        }
    }
    Ok(())
}

/// Read the balance between the `channels` pair, in `[-1.0, 1.0]`.
pub fn get_balance<A: EndpointVolumeApi>(
    volume: &AudioEndpointVolume<A>,
    channels: StereoChannels,
) -> Result<f32, AudioError> {
    verify_channels(volume, channels)?;

    let master = volume.master_volume_level_scalar()?.max(MIN_MASTER_VOLUME);
    let endpoint_channels = volume.channels()?;
    let left = endpoint_channels.get(channels.left)?.volume_level_scalar()?;
    let right = endpoint_channels.get(channels.right)?.volume_level_scalar()?;

    let balance = ((right - left) / master).clamp(-1.0, 1.0);
    tracing::trace!(left, right, master, balance, "balance read");
    Ok(balance)
}

/// Move the balance between the `channels` pair.
///
/// Values outside `[-1.0, 1.0]` are clamped. The louder side is set to the
/// current master volume and the other side is attenuated linearly. Nothing is
/// written if the endpoint cannot expose the pair.
pub fn set_balance<A: EndpointVolumeApi>(
    volume: &AudioEndpointVolume<A>,
    channels: StereoChannels,
    balance: f32,
) -> Result<(), AudioError> {
    verify_channels(volume, channels)?;
    if balance.is_nan() {
        return Err(AudioError::InvalidBalance);
    }

    let balance = balance.clamp(-1.0, 1.0);
    let master = volume.master_volume_level_scalar()?;
    let right = 1.0 + balance.min(0.0);
    let left = 1.0 - balance.max(0.0);

    let endpoint_channels = volume.channels()?;
    endpoint_channels
        .get(channels.left)?
        .set_volume_level_scalar(left * master)?;
    endpoint_channels
        .get(channels.right)?
        .set_volume_level_scalar(right * master)?;

    tracing::trace!(balance, master, "balance written");
    Ok(())
}

/// Balance accessors on an endpoint.
pub trait BalanceExt {
    /// Balance using the default left 0 / right 1 channel pair.
    fn balance(&self) -> Result<f32, AudioError> {
        self.balance_with(StereoChannels::default())
    }

    fn set_balance(&self, balance: f32) -> Result<(), AudioError> {
        self.set_balance_with(StereoChannels::default(), balance)
    }

    fn balance_with(&self, channels: StereoChannels) -> Result<f32, AudioError>;

    fn set_balance_with(&self, channels: StereoChannels, balance: f32) -> Result<(), AudioError>;
}

impl<A: EndpointVolumeApi> BalanceExt for AudioEndpointVolume<A> {
    fn balance_with(&self, channels: StereoChannels) -> Result<f32, AudioError> {
        get_balance(self, channels)
    }

    fn set_balance_with(&self, channels: StereoChannels, balance: f32) -> Result<(), AudioError> {
        set_balance(self, channels, balance)
    }
}
