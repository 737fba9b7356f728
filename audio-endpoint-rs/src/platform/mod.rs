//! Platform-specific endpoint access.
//!
//! On Windows this opens endpoints through MMDevice and IAudioEndpointVolume.
//! Everywhere else opening an endpoint fails with [`AudioError::Unsupported`],
//! while the rest of the crate keeps working.

#[cfg(windows)]
mod com;
#[cfg(windows)]
mod endpoint_volume;
#[cfg(windows)]
mod enumerator;
#[cfg(windows)]
mod meter;

#[cfg(windows)]
pub use com::ComGuard;
#[cfg(windows)]
pub use endpoint_volume::WasapiEndpointVolume;
#[cfg(windows)]
pub use enumerator::{Device, DeviceEnumerator};
#[cfg(windows)]
pub use meter::WasapiMeter;

use crate::audio::{
    AudioEndpointVolume, AudioError, AudioMeter, DataFlow, DeviceState, EndpointVolumeApi,
    MeterApi,
};
use crate::config::EndpointConfig;
use serde::{Deserialize, Serialize};

/// Endpoint volume over whichever backend the platform provides.
pub type DynEndpointVolume = AudioEndpointVolume<Box<dyn EndpointVolumeApi>>;

/// Peak meter over whichever backend the platform provides.
pub type DynAudioMeter = AudioMeter<Box<dyn MeterApi>>;

/// One endpoint found by [`list_endpoints`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointInfo {
    /// Device ID accepted by [`open_endpoint`]
    pub id: String,
    pub name: String,
    pub state: DeviceState,
}

/// List the endpoints for `flow` whose state is in `state_mask`.
pub fn list_endpoints(
    flow: DataFlow,
    state_mask: DeviceState,
) -> Result<Vec<EndpointInfo>, AudioError> {
    if state_mask.is_empty() {
        return Err(AudioError::Config("device state mask is empty".into()));
    }
    list(flow, state_mask)
}

/// Open the peak meter of the default endpoint selected by `config`.
pub fn open_default_meter(config: &EndpointConfig) -> Result<DynAudioMeter, AudioError> {
    config.validate()?;
    meter(config, None)
}

/// Open the peak meter of the endpoint with the given device ID.
pub fn open_meter(device_id: &str, config: &EndpointConfig) -> Result<DynAudioMeter, AudioError> {
    config.validate()?;
    meter(config, Some(device_id))
}

/// Open the default endpoint selected by `config.data_flow` and `config.role`.
pub fn open_default_endpoint(config: &EndpointConfig) -> Result<DynEndpointVolume, AudioError> {
    config.validate()?;
    open(config, None)
}

/// Open the endpoint with the given device ID.
pub fn open_endpoint(device_id: &str, config: &EndpointConfig) -> Result<DynEndpointVolume, AudioError> {
    config.validate()?;
    open(config, Some(device_id))
}

#[cfg(windows)]
fn select(
    enumerator: &DeviceEnumerator,
    config: &EndpointConfig,
    device_id: Option<&str>,
) -> Result<Device, AudioError> {
    match device_id {
        Some(id) => enumerator.device(id),
        None => enumerator.default_audio_endpoint(config.data_flow, config.role),
    }
}

#[cfg(windows)]
fn open(config: &EndpointConfig, device_id: Option<&str>) -> Result<DynEndpointVolume, AudioError> {
    let enumerator = DeviceEnumerator::new()?;
    let device = select(&enumerator, config, device_id)?;
    tracing::debug!(
        device = device.friendly_name().as_deref().unwrap_or("Unknown"),
        "opening endpoint volume"
    );
    let api: Box<dyn EndpointVolumeApi> = Box::new(device.activate_endpoint_volume()?);
    AudioEndpointVolume::with_capacity(api, config.notification_capacity)
}

#[cfg(windows)]
fn meter(config: &EndpointConfig, device_id: Option<&str>) -> Result<DynAudioMeter, AudioError> {
    let enumerator = DeviceEnumerator::new()?;
    let device = select(&enumerator, config, device_id)?;
    let api: Box<dyn MeterApi> = Box::new(device.activate_meter()?);
    Ok(AudioMeter::new(api))
}

#[cfg(windows)]
fn list(flow: DataFlow, state_mask: DeviceState) -> Result<Vec<EndpointInfo>, AudioError> {
    let enumerator = DeviceEnumerator::new()?;
    enumerator
        .enumerate(flow, state_mask)?
        .into_iter()
        .map(|device| {
            Ok(EndpointInfo {
                id: device.id()?,
                name: device
                    .friendly_name()
                    .unwrap_or_else(|| "Unknown".to_string()),
                state: device.state()?,
            })
        })
        .collect()
}

#[cfg(not(windows))]
fn open(_config: &EndpointConfig, _device_id: Option<&str>) -> Result<DynEndpointVolume, AudioError> {
    Err(AudioError::Unsupported)
}

#[cfg(not(windows))]
fn meter(_config: &EndpointConfig, _device_id: Option<&str>) -> Result<DynAudioMeter, AudioError> {
    Err(AudioError::Unsupported)
}

#[cfg(not(windows))]
fn list(_flow: DataFlow, _state_mask: DeviceState) -> Result<Vec<EndpointInfo>, AudioError> {
    Err(AudioError::Unsupported)
}
