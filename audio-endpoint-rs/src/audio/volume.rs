//! Endpoint volume control.
//!
//! Wraps one endpoint-volume service handle: master volume and mute, the
//! per-channel volumes, and the change-notification registration.

use super::backend::EndpointVolumeApi;
use super::channels::Channels;
use super::device::AudioError;
use super::notifications::{VolumeNotification, VolumeNotifier, DEFAULT_NOTIFICATION_CAPACITY};
use super::range::{checked_scalar, HardwareSupport, StepInformation, VolumeRange};
use std::sync::mpsc::Receiver;
use std::sync::Arc;

/// Master volume, mute and per-channel volume for one audio endpoint.
///
/// Construction registers exactly one change-notification callback, and
/// [`dispose`](Self::dispose) (or `Drop`) removes it exactly once. Every getter
/// re-queries the device.
pub struct AudioEndpointVolume<A: EndpointVolumeApi> {
    api: Option<A>,
    registered: bool,
    channel_count: u32,
    volume_range: VolumeRange,
    step_information: StepInformation,
    hardware_support: HardwareSupport,
    notifier: Arc<VolumeNotifier>,
}

impl<A: EndpointVolumeApi> AudioEndpointVolume<A> {
    /// Take ownership of an activated endpoint-volume handle.
    ///
    /// If anything fails, `api` is dropped before returning so the handle is
    /// released.
    pub fn new(api: A) -> Result<Self, AudioError> {
        Self::with_capacity(api, DEFAULT_NOTIFICATION_CAPACITY)
    }

    /// Like [`new`](Self::new), with a custom queue depth for each subscriber.
    pub fn with_capacity(api: A, notification_capacity: usize) -> Result<Self, AudioError> {
        let channel_count = api.channel_count()?;
        let step_information = StepInformation::query(&api)?;
        let hardware_support = HardwareSupport::from_bits(api.query_hardware_support()?);
        let volume_range = VolumeRange::query(&api)?;

        let notifier = Arc::new(VolumeNotifier::new(notification_capacity));
        api.register_control_change_notify(Arc::clone(&notifier))?;

        tracing::debug!(
            channels = channel_count,
            min_db = volume_range.min_decibels,
            max_db = volume_range.max_decibels,
            "endpoint volume opened"
        );

        Ok(Self {
            api: Some(api),
            registered: true,
            channel_count,
            volume_range,
            step_information,
            hardware_support,
            notifier,
        })
    }

    fn api(&self) -> Result<&A, AudioError> {
        self.api.as_ref().ok_or(AudioError::Disposed)
    }

    pub fn is_disposed(&self) -> bool {
        self.api.is_none()
    }

    pub fn volume_range(&self) -> VolumeRange {
        self.volume_range
    }

    /// Step position captured when the endpoint was opened.
    pub fn step_information(&self) -> StepInformation {
        self.step_information
    }

    /// Step position as the device reports it now.
    pub fn current_step_information(&self) -> Result<StepInformation, AudioError> {
        StepInformation::query(self.api()?)
    }

    pub fn hardware_support(&self) -> HardwareSupport {
        self.hardware_support
    }

    /// The endpoint's channels. The count never changes after construction.
    pub fn channels(&self) -> Result<Channels<'_, A>, AudioError> {
        Ok(Channels::new(
            self.api()?,
            self.channel_count,
            self.volume_range,
        ))
    }

    pub fn channel_count(&self) -> u32 {
        self.channel_count
    }

    /// Master volume level in decibels.
    pub fn master_volume_level(&self) -> Result<f32, AudioError> {
        self.api()?.master_volume_level()
    }

    /// Fails without touching the device if `level_db` is outside
    /// [`volume_range`](Self::volume_range).
    pub fn set_master_volume_level(&self, level_db: f32) -> Result<(), AudioError> {
        let level_db = self.volume_range.check(level_db)?;
        self.api()?.set_master_volume_level(level_db)
    }

    /// Get the current volume level (0.0 to 1.0).
    pub fn master_volume_level_scalar(&self) -> Result<f32, AudioError> {
        self.api()?.master_volume_level_scalar()
    }

    /// Set the volume level (0.0 to 1.0). NaN and infinities are rejected.
    pub fn set_master_volume_level_scalar(&self, level: f32) -> Result<(), AudioError> {
        let level = checked_scalar(level)?;
        self.api()?.set_master_volume_level_scalar(level)
    }

    /// Get the current mute state.
    pub fn mute(&self) -> Result<bool, AudioError> {
        self.api()?.mute()
    }

    /// Set the mute state.
    pub fn set_mute(&self, muted: bool) -> Result<(), AudioError> {
        self.api()?.set_mute(muted)
    }

    /// Toggle the mute state. Returns the new state.
    pub fn toggle_mute(&self) -> Result<bool, AudioError> {
        let new_state = !self.mute()?;
        self.set_mute(new_state)?;
        Ok(new_state)
    }

    /// Ask the device to raise the master volume by one hardware step.
    pub fn volume_step_up(&self) -> Result<(), AudioError> {
        self.api()?.volume_step_up()
    }

    /// Ask the device to lower the master volume by one hardware step.
    pub fn volume_step_down(&self) -> Result<(), AudioError> {
        self.api()?.volume_step_down()
    }

    /// Listen for volume changes made by any process.
    ///
    /// Notifications arrive from the device's callback thread; drain the
    /// receiver from whichever thread owns the UI state.
    pub fn subscribe(&self) -> Receiver<VolumeNotification> {
        self.notifier.subscribe()
    }

    /// Unregister the change notification and release the device handle.
    ///
    /// Calling this again after it has succeeded does nothing. If unregistering
    /// fails, the handle is kept and the call can be retried.
    pub fn dispose(&mut self) -> Result<(), AudioError> {
        if self.registered {
            if let Some(api) = self.api.as_ref() {
                api.unregister_control_change_notify()?;
            }
            self.registered = false;
            tracing::debug!("endpoint volume notification unregistered");
        }
        self.api = None;
        Ok(())
    }
}

impl<A: EndpointVolumeApi> Drop for AudioEndpointVolume<A> {
    fn drop(&mut self) {
        if let Err(e) = self.dispose() {
            tracing::warn!(error = %e, "failed to unregister endpoint volume notification on drop");
        }
    }
}

impl<A: EndpointVolumeApi> std::fmt::Debug for AudioEndpointVolume<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioEndpointVolume")
            .field("disposed", &self.is_disposed())
            .field("channel_count", &self.channel_count)
            .field("volume_range", &self.volume_range)
            .field("step_information", &self.step_information)
            .field("hardware_support", &self.hardware_support)
            .finish()
    }
}
