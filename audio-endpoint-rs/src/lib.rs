//! Audio Endpoint - Library
//!
//! Endpoint volume and stereo balance for Windows Core Audio, plus the
//! WAVEFORMATEX family of wave-format descriptors.
//!
//! ## Features
//!
//! - Master and per-channel volume, mute and volume stepping for one endpoint
//! - Change notifications fanned out to any number of subscribers
//! - Endpoint enumeration and per-channel peak metering
//! - Left/right balance derived from a configurable channel pair
//! - Parsing and serializing PCM, IEEE float, extensible, ADPCM and GSM formats
//!
//! The format and balance logic is portable. Opening a real endpoint needs
//! Windows; elsewhere [`platform::open_default_endpoint`] reports
//! [`AudioError::Unsupported`].

pub mod audio;
pub mod config;
pub mod format;
pub mod platform;
pub mod player;

pub use audio::{
    AudioEndpointVolume, AudioError, AudioMeter, BalanceExt, DataFlow, DeviceState,
    EndpointVolumeApi, MeterApi, Role, StereoChannels, VolumeNotification,
};
pub use config::EndpointConfig;
pub use format::{WaveFormat, WaveFormatEncoding};
pub use platform::{
    list_endpoints, open_default_endpoint, open_default_meter, DynAudioMeter, DynEndpointVolume,
    EndpointInfo,
};
pub use player::{BalanceControl, EndpointBalance, MediaError};
