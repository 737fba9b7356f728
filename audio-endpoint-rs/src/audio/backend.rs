//! The endpoint-volume service seam.
//!
//! `EndpointVolumeApi` mirrors the IAudioEndpointVolume surface one call at a
//! time. The WASAPI implementation lives in `platform`; tests use an in-memory
//! fake.

use super::device::AudioError;
use super::notifications::VolumeNotifier;
use std::sync::Arc;

/// Raw calls into an endpoint-volume service.
///
/// Every method is a direct, blocking request to the device. Implementations
/// must not cache values: the device state is shared with every other process.
pub trait EndpointVolumeApi {
    /// Number of channels in the endpoint's stream format.
    fn channel_count(&self) -> Result<u32, AudioError>;

    /// Master volume level in decibels.
    fn master_volume_level(&self) -> Result<f32, AudioError>;
    fn set_master_volume_level(&self, level_db: f32) -> Result<(), AudioError>;

    /// Master volume level as an audio-tapered scalar between 0.0 and 1.0.
    fn master_volume_level_scalar(&self) -> Result<f32, AudioError>;
    fn set_master_volume_level_scalar(&self, level: f32) -> Result<(), AudioError>;

    fn channel_volume_level(&self, channel: u32) -> Result<f32, AudioError>;
    fn set_channel_volume_level(&self, channel: u32, level_db: f32) -> Result<(), AudioError>;

    fn channel_volume_level_scalar(&self, channel: u32) -> Result<f32, AudioError>;
    fn set_channel_volume_level_scalar(&self, channel: u32, level: f32) -> Result<(), AudioError>;

    fn mute(&self) -> Result<bool, AudioError>;
    fn set_mute(&self, muted: bool) -> Result<(), AudioError>;

    /// Current step and total step count, as `(step, step_count)`.
    fn volume_step_info(&self) -> Result<(u32, u32), AudioError>;
    fn volume_step_up(&self) -> Result<(), AudioError>;
    fn volume_step_down(&self) -> Result<(), AudioError>;

    /// Raw ENDPOINT_HARDWARE_SUPPORT_* bitmask.
    fn query_hardware_support(&self) -> Result<u32, AudioError>;

    /// Volume range as `(min_db, max_db, increment_db)`.
    fn volume_range(&self) -> Result<(f32, f32, f32), AudioError>;

    /// Register the single change-notification callback for this handle.
    ///
    /// The implementation pushes every device notification into `notifier`,
    /// possibly from a thread owned by the OS.
    fn register_control_change_notify(&self, notifier: Arc<VolumeNotifier>) -> Result<(), AudioError>;

    /// Remove the callback installed by `register_control_change_notify`.
    fn unregister_control_change_notify(&self) -> Result<(), AudioError>;
}

impl<T: EndpointVolumeApi + ?Sized> EndpointVolumeApi for Box<T> {
    fn channel_count(&self) -> Result<u32, AudioError> {
        (**self).channel_count()
    }

    fn master_volume_level(&self) -> Result<f32, AudioError> {
        (**self).master_volume_level()
    }

    fn set_master_volume_level(&self, level_db: f32) -> Result<(), AudioError> {
        (**self).set_master_volume_level(level_db)
    }

    fn master_volume_level_scalar(&self) -> Result<f32, AudioError> {
        (**self).master_volume_level_scalar()
    }

    fn set_master_volume_level_scalar(&self, level: f32) -> Result<(), AudioError> {
        (**self).set_master_volume_level_scalar(level)
    }

    fn channel_volume_level(&self, channel: u32) -> Result<f32, AudioError> {
        (**self).channel_volume_level(channel)
    }

    fn set_channel_volume_level(&self, channel: u32, level_db: f32) -> Result<(), AudioError> {
        (**self).set_channel_volume_level(channel, level_db)
    }

    fn channel_volume_level_scalar(&self, channel: u32) -> Result<f32, AudioError> {
        (**self).channel_volume_level_scalar(channel)
    }

    fn set_channel_volume_level_scalar(&self, channel: u32, level: f32) -> Result<(), AudioError> {
        (**self).set_channel_volume_level_scalar(channel, level)
    }

    fn mute(&self) -> Result<bool, AudioError> {
        (**self).mute()
    }

    fn set_mute(&self, muted: bool) -> Result<(), AudioError> {
        (**self).set_mute(muted)
    }

    fn volume_step_info(&self) -> Result<(u32, u32), AudioError> {
        (**self).volume_step_info()
    }

    fn volume_step_up(&self) -> Result<(), AudioError> {
        (**self).volume_step_up()
    }

    fn volume_step_down(&self) -> Result<(), AudioError> {
        (**self).volume_step_down()
    }

    fn query_hardware_support(&self) -> Result<u32, AudioError> {
        (**self).query_hardware_support()
    }

    fn volume_range(&self) -> Result<(f32, f32, f32), AudioError> {
        (**self).volume_range()
    }

    fn register_control_change_notify(&self, notifier: Arc<VolumeNotifier>) -> Result<(), AudioError> {
        (**self).register_control_change_notify(notifier)
    }

    fn unregister_control_change_notify(&self) -> Result<(), AudioError> {
        (**self).unregister_control_change_notify()
    }
}
