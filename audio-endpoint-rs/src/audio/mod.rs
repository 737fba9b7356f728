//! Audio module for Windows Core Audio endpoint volume.
//!
//! This module provides master and per-channel volume control, stereo balance,
//! volume change notifications over an endpoint-volume service handle, and
//! peak metering.

pub mod backend;
pub mod balance;
pub mod channels;
pub mod device;
pub mod meter;
pub mod notifications;
pub mod range;
pub mod volume;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::EndpointVolumeApi;
pub use balance::{get_balance, set_balance, BalanceExt, StereoChannels};
pub use channels::{Channel, Channels};
pub use device::{AudioError, DataFlow, DeviceState, Role};
pub use meter::{AudioMeter, MeterApi};
pub use notifications::{VolumeNotification, VolumeNotifier};
pub use range::{HardwareSupport, StepInformation, VolumeRange};
pub use volume::AudioEndpointVolume;
