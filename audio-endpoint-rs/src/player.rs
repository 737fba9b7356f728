//! Balance as a media-player capability.
//!
//! Players expose balance as a plain `f64` property. [`EndpointBalance`]
//! backs that property with an endpoint's channel volumes and wraps device
//! failures in [`MediaError`].

use crate::audio::{AudioEndpointVolume, AudioError, EndpointVolumeApi, StereoChannels};
use crate::audio::balance::{get_balance, set_balance};
use crate::config::{EndpointConfig, DEFAULT_BALANCE_EPSILON};
use thiserror::Error;

/// Failure surfaced to player and UI code.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{message}: {source}")]
    Audio {
        message: String,
        #[source]
        source: AudioError,
    },
}

impl MediaError {
    fn audio(message: &str) -> impl FnOnce(AudioError) -> Self + '_ {
        move |source| MediaError::Audio {
            message: message.to_string(),
            source,
        }
    }

    /// The underlying endpoint error.
    pub fn audio_error(&self) -> &AudioError {
        match self {
            MediaError::Audio { source, .. } => source,
        }
    }
}

/// Left/right balance of a player's output, from -1.0 (left) to 1.0 (right).
pub trait BalanceControl {
    fn supports_balance(&self) -> bool {
        true
    }

    fn balance(&self) -> Result<f64, MediaError>;

    fn set_balance(&mut self, balance: f64) -> Result<(), MediaError>;
}

/// [`BalanceControl`] over an endpoint's stereo channel pair.
///
/// Reads always go to the device, so changes made by other applications are
/// visible. A write is skipped when the device is already within `epsilon` of
/// the requested value.
#[derive(Debug)]
pub struct EndpointBalance<A: EndpointVolumeApi> {
    volume: AudioEndpointVolume<A>,
    channels: StereoChannels,
    epsilon: f64,
}

impl<A: EndpointVolumeApi> EndpointBalance<A> {
    pub fn new(volume: AudioEndpointVolume<A>) -> Self {
        Self {
            volume,
            channels: StereoChannels::default(),
            epsilon: DEFAULT_BALANCE_EPSILON,
        }
    }

    /// Use the channel pair and epsilon from `config`.
    pub fn with_config(volume: AudioEndpointVolume<A>, config: &EndpointConfig) -> Self {
        Self {
            volume,
            channels: config.balance_channels,
            epsilon: config.balance_epsilon,
        }
    }

    pub fn channels(&self) -> StereoChannels {
        self.channels
    }

    pub fn endpoint(&self) -> &AudioEndpointVolume<A> {
        &self.volume
    }

    pub fn endpoint_mut(&mut self) -> &mut AudioEndpointVolume<A> {
        &mut self.volume
    }

    pub fn into_inner(self) -> AudioEndpointVolume<A> {
        self.volume
    }
}

impl<A: EndpointVolumeApi> BalanceControl for EndpointBalance<A> {
    fn supports_balance(&self) -> bool {
        !self.volume.is_disposed() && self.volume.channel_count() >= 2
    }

    fn balance(&self) -> Result<f64, MediaError> {
        get_balance(&self.volume, self.channels)
            .map(f64::from)
            .map_err(MediaError::audio("Unable to read balance"))
    }

    fn set_balance(&mut self, balance: f64) -> Result<(), MediaError> {
        if balance.is_nan() {
            return Err(MediaError::audio("Unable to set balance")(
                AudioError::InvalidBalance,
            ));
        }
        let current = self.balance()?;
        if (current - balance.clamp(-1.0, 1.0)).abs() < self.epsilon {
            tracing::trace!(current, requested = balance, "balance change below epsilon");
            return Ok(());
        }
        set_balance(&self.volume, self.channels, balance as f32)
            .map_err(MediaError::audio("Unable to set balance"))
    }
}
