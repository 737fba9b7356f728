//! IAudioEndpointVolume backend.

use super::com::ComGuard;
use crate::audio::{AudioError, EndpointVolumeApi, VolumeNotification, VolumeNotifier};
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;
use windows::core::{implement, GUID};
use windows::Win32::Media::Audio::Endpoints::{
    IAudioEndpointVolume, IAudioEndpointVolumeCallback, IAudioEndpointVolumeCallback_Impl,
};
use windows::Win32::Media::Audio::AUDIO_VOLUME_NOTIFICATION_DATA;
// The implement macro expands to paths rooted at windows_core
#[allow(unused_imports)]
use windows_core;

/// Forwards control-change notifications into a [`VolumeNotifier`].
///
/// Called by the audio service on one of its own threads.
#[implement(IAudioEndpointVolumeCallback)]
struct VolumeCallback {
    notifier: Arc<VolumeNotifier>,
}

impl IAudioEndpointVolumeCallback_Impl for VolumeCallback_Impl {
    fn OnNotify(&self, pnotify: *mut AUDIO_VOLUME_NOTIFICATION_DATA) -> windows_core::Result<()> {
        if pnotify.is_null() {
            return Ok(());
        }
        let notification = unsafe {
            let data = &*pnotify;
            // afChannelVolumes is declared with length 1 but holds nChannels values
            let channel_volumes =
                std::slice::from_raw_parts(data.afChannelVolumes.as_ptr(), data.nChannels as usize)
                    .to_vec();
            VolumeNotification {
                event_context: guid_to_uuid(&data.guidEventContext),
                muted: data.bMuted.as_bool(),
                master_volume: data.fMasterVolume,
                channel_volumes,
            }
        };
        self.notifier.publish(notification);
        Ok(())
    }
}

fn guid_to_uuid(guid: &GUID) -> Uuid {
    Uuid::from_fields(guid.data1, guid.data2, guid.data3, &guid.data4)
}

/// An activated IAudioEndpointVolume.
///
/// Events raised by this process carry a null context GUID.
pub struct WasapiEndpointVolume {
    endpoint: IAudioEndpointVolume,
    callback: Mutex<Option<IAudioEndpointVolumeCallback>>,
    // dropped last, after the interfaces above are released
    _com: ComGuard,
}

impl WasapiEndpointVolume {
    pub(crate) fn new(endpoint: IAudioEndpointVolume, com: ComGuard) -> Self {
        Self {
            endpoint,
            callback: Mutex::new(None),
            _com: com,
        }
    }
}

impl EndpointVolumeApi for WasapiEndpointVolume {
    fn channel_count(&self) -> Result<u32, AudioError> {
        unsafe { self.endpoint.GetChannelCount() }.map_err(AudioError::WindowsError)
    }

    fn master_volume_level(&self) -> Result<f32, AudioError> {
        unsafe { self.endpoint.GetMasterVolumeLevel() }.map_err(AudioError::WindowsError)
    }

    fn set_master_volume_level(&self, level_db: f32) -> Result<(), AudioError> {
        unsafe {
            self.endpoint
                .SetMasterVolumeLevel(level_db, std::ptr::null())
                .map_err(AudioError::WindowsError)
        }
    }

    fn master_volume_level_scalar(&self) -> Result<f32, AudioError> {
        unsafe { self.endpoint.GetMasterVolumeLevelScalar() }.map_err(AudioError::WindowsError)
    }

    fn set_master_volume_level_scalar(&self, level: f32) -> Result<(), AudioError> {
        unsafe {
            self.endpoint
                .SetMasterVolumeLevelScalar(level, std::ptr::null())
                .map_err(AudioError::WindowsError)
        }
    }

    fn channel_volume_level(&self, channel: u32) -> Result<f32, AudioError> {
        unsafe { self.endpoint.GetChannelVolumeLevel(channel) }.map_err(AudioError::WindowsError)
    }

    fn set_channel_volume_level(&self, channel: u32, level_db: f32) -> Result<(), AudioError> {
        unsafe {
            self.endpoint
                .SetChannelVolumeLevel(channel, level_db, std::ptr::null())
                .map_err(AudioError::WindowsError)
        }
    }

    fn channel_volume_level_scalar(&self, channel: u32) -> Result<f32, AudioError> {
        unsafe { self.endpoint.GetChannelVolumeLevelScalar(channel) }
            .map_err(AudioError::WindowsError)
    }

    fn set_channel_volume_level_scalar(&self, channel: u32, level: f32) -> Result<(), AudioError> {
        unsafe {
            self.endpoint
                .SetChannelVolumeLevelScalar(channel, level, std::ptr::null())
                .map_err(AudioError::WindowsError)
        }
    }

    fn mute(&self) -> Result<bool, AudioError> {
        let muted = unsafe { self.endpoint.GetMute() }.map_err(AudioError::WindowsError)?;
        Ok(muted.as_bool())
    }

    fn set_mute(&self, muted: bool) -> Result<(), AudioError> {
        unsafe {
            self.endpoint
                .SetMute(muted, std::ptr::null())
                .map_err(AudioError::WindowsError)
        }
    }

    fn volume_step_info(&self) -> Result<(u32, u32), AudioError> {
        let mut step = 0u32;
        let mut step_count = 0u32;
        unsafe {
            self.endpoint
                .GetVolumeStepInfo(&mut step, &mut step_count)
                .map_err(AudioError::WindowsError)?;
        }
        Ok((step, step_count))
    }

    fn volume_step_up(&self) -> Result<(), AudioError> {
        unsafe { self.endpoint.VolumeStepUp(std::ptr::null()) }.map_err(AudioError::WindowsError)
    }

    fn volume_step_down(&self) -> Result<(), AudioError> {
        unsafe { self.endpoint.VolumeStepDown(std::ptr::null()) }.map_err(AudioError::WindowsError)
    }

    fn query_hardware_support(&self) -> Result<u32, AudioError> {
        unsafe { self.endpoint.QueryHardwareSupport() }.map_err(AudioError::WindowsError)
    }

    fn volume_range(&self) -> Result<(f32, f32, f32), AudioError> {
        let (mut min_db, mut max_db, mut increment_db) = (0f32, 0f32, 0f32);
        unsafe {
            self.endpoint
                .GetVolumeRange(&mut min_db, &mut max_db, &mut increment_db)
                .map_err(AudioError::WindowsError)?;
        }
        Ok((min_db, max_db, increment_db))
    }

    fn register_control_change_notify(&self, notifier: Arc<VolumeNotifier>) -> Result<(), AudioError> {
        let mut slot = self.callback.lock();
        if slot.is_some() {
            return Err(AudioError::NotificationRegistration(
                "a callback is already registered".into(),
            ));
        }
        let callback: IAudioEndpointVolumeCallback = VolumeCallback { notifier }.into();
        unsafe { self.endpoint.RegisterControlChangeNotify(&callback) }
            .map_err(|e| AudioError::NotificationRegistration(e.to_string()))?;
        *slot = Some(callback);
        Ok(())
    }

    fn unregister_control_change_notify(&self) -> Result<(), AudioError> {
        let mut slot = self.callback.lock();
        let Some(callback) = slot.as_ref() else {
            return Ok(());
        };
        unsafe { self.endpoint.UnregisterControlChangeNotify(callback) }
            .map_err(|e| AudioError::NotificationRegistration(e.to_string()))?;
        *slot = None;
        Ok(())
    }
}
