//! In-memory endpoint used by the unit tests.

use super::backend::EndpointVolumeApi;
use super::device::AudioError;
use super::meter::MeterApi;
use super::notifications::{VolumeNotification, VolumeNotifier};
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug)]
struct FakeState {
    master: f32,
    master_db: f32,
    muted: bool,
    channels: Vec<f32>,
    step: u32,
    step_count: u32,
    hardware_support: u32,
    quantization: Option<f32>,
    notifier: Option<Arc<VolumeNotifier>>,
    register_calls: u32,
    unregister_calls: u32,
    channel_writes: u32,
    fail_register: bool,
    fail_unregister: u32,
    fail_range: bool,
    disconnected: bool,
    released: bool,
}

/// Backend half, handed to `AudioEndpointVolume`.
pub(crate) struct FakeEndpoint {
    state: Arc<Mutex<FakeState>>,
}

/// Test half, used to inspect and mutate the device behind the endpoint's back.
#[derive(Clone)]
pub(crate) struct FakeHandle {
    state: Arc<Mutex<FakeState>>,
}

impl FakeEndpoint {
    pub(crate) fn with_channels(count: usize, master: f32) -> (Self, FakeHandle) {
        let state = Arc::new(Mutex::new(FakeState {
            master,
            master_db: -6.0,
            muted: false,
            channels: vec![master; count],
            step: 10,
            step_count: 51,
            hardware_support: 0x7,
            quantization: None,
            notifier: None,
            register_calls: 0,
            unregister_calls: 0,
            channel_writes: 0,
            fail_register: false,
            fail_unregister: 0,
            fail_range: false,
            disconnected: false,
            released: false,
        }));
        (
            Self {
                state: Arc::clone(&state),
            },
            FakeHandle { state },
        )
    }

    pub(crate) fn stereo(master: f32) -> (Self, FakeHandle) {
        Self::with_channels(2, master)
    }

    fn check(&self) -> Result<(), AudioError> {
        if self.state.lock().disconnected {
            Err(AudioError::DeviceUnavailable("device disconnected".into()))
        } else {
            Ok(())
        }
    }

    fn channel_index(state: &FakeState, channel: u32) -> Result<usize, AudioError> {
        let index = channel as usize;
        if index < state.channels.len() {
            Ok(index)
        } else {
            Err(AudioError::DeviceUnavailable(format!("no channel {channel}")))
        }
    }
}

impl Drop for FakeEndpoint {
    fn drop(&mut self) {
        self.state.lock().released = true;
    }
}

impl EndpointVolumeApi for FakeEndpoint {
    fn channel_count(&self) -> Result<u32, AudioError> {
        self.check()?;
        Ok(self.state.lock().channels.len() as u32)
    }

    fn master_volume_level(&self) -> Result<f32, AudioError> {
        self.check()?;
        Ok(self.state.lock().master_db)
    }

    fn set_master_volume_level(&self, level_db: f32) -> Result<(), AudioError> {
        self.check()?;
        self.state.lock().master_db = level_db;
        Ok(())
    }

    fn master_volume_level_scalar(&self) -> Result<f32, AudioError> {
        self.check()?;
        Ok(self.state.lock().master)
    }

    fn set_master_volume_level_scalar(&self, level: f32) -> Result<(), AudioError> {
        self.check()?;
        self.state.lock().master = level;
        Ok(())
    }

    fn channel_volume_level(&self, channel: u32) -> Result<f32, AudioError> {
        self.check()?;
        let state = self.state.lock();
        let index = Self::channel_index(&state, channel)?;
        Ok(20.0 * state.channels[index].max(1e-6).log10())
    }

    fn set_channel_volume_level(&self, channel: u32, level_db: f32) -> Result<(), AudioError> {
        self.check()?;
        let mut state = self.state.lock();
        let index = Self::channel_index(&state, channel)?;
        state.channels[index] = 10f32.powf(level_db / 20.0).min(1.0);
        state.channel_writes += 1;
        Ok(())
    }

    fn channel_volume_level_scalar(&self, channel: u32) -> Result<f32, AudioError> {
        self.check()?;
        let state = self.state.lock();
        let index = Self::channel_index(&state, channel)?;
        Ok(state.channels[index])
    }

    fn set_channel_volume_level_scalar(&self, channel: u32, level: f32) -> Result<(), AudioError> {
        self.check()?;
        let mut state = self.state.lock();
        let index = Self::channel_index(&state, channel)?;
        let stored = match state.quantization {
            Some(step) => (level / step).round() * step,
            None => level,
        };
        state.channels[index] = stored;
        state.channel_writes += 1;
        Ok(())
    }

    fn mute(&self) -> Result<bool, AudioError> {
        self.check()?;
        Ok(self.state.lock().muted)
    }

    fn set_mute(&self, muted: bool) -> Result<(), AudioError> {
        self.check()?;
        self.state.lock().muted = muted;
        Ok(())
    }

    fn volume_step_info(&self) -> Result<(u32, u32), AudioError> {
        self.check()?;
        let state = self.state.lock();
        Ok((state.step, state.step_count))
    }

    fn volume_step_up(&self) -> Result<(), AudioError> {
        self.check()?;
        let mut state = self.state.lock();
        state.step = (state.step + 1).min(state.step_count - 1);
        Ok(())
    }

    fn volume_step_down(&self) -> Result<(), AudioError> {
        self.check()?;
        let mut state = self.state.lock();
        state.step = state.step.saturating_sub(1);
        Ok(())
    }

    fn query_hardware_support(&self) -> Result<u32, AudioError> {
        self.check()?;
        Ok(self.state.lock().hardware_support)
    }

    fn volume_range(&self) -> Result<(f32, f32, f32), AudioError> {
        self.check()?;
        if self.state.lock().fail_range {
            return Err(AudioError::VolumeNotAvailable);
        }
        Ok((-65.25, 0.0, 0.03125))
    }

    fn register_control_change_notify(&self, notifier: Arc<VolumeNotifier>) -> Result<(), AudioError> {
        self.check()?;
        let mut state = self.state.lock();
        state.register_calls += 1;
        if state.fail_register {
            return Err(AudioError::NotificationRegistration("registration refused".into()));
        }
        state.notifier = Some(notifier);
        Ok(())
    }

    fn unregister_control_change_notify(&self) -> Result<(), AudioError> {
        let mut state = self.state.lock();
        state.unregister_calls += 1;
        if state.fail_unregister > 0 {
            state.fail_unregister -= 1;
            return Err(AudioError::NotificationRegistration("unregister refused".into()));
        }
        state.notifier = None;
        Ok(())
    }
}

impl FakeHandle {
    pub(crate) fn channel(&self, index: usize) -> f32 {
        self.state.lock().channels[index]
    }

    pub(crate) fn set_channel(&self, index: usize, level: f32) {
        self.state.lock().channels[index] = level;
    }

    pub(crate) fn master(&self) -> f32 {
        self.state.lock().master
    }

    pub(crate) fn master_db(&self) -> f32 {
        self.state.lock().master_db
    }

    pub(crate) fn set_master(&self, level: f32) {
        self.state.lock().master = level;
    }

    pub(crate) fn step(&self) -> u32 {
        self.state.lock().step
    }

    pub(crate) fn set_quantization(&self, step: f32) {
        self.state.lock().quantization = Some(step);
    }

    pub(crate) fn fail_register(&self) {
        self.state.lock().fail_register = true;
    }

    pub(crate) fn fail_unregister(&self, times: u32) {
        self.state.lock().fail_unregister = times;
    }

    pub(crate) fn fail_range(&self) {
        self.state.lock().fail_range = true;
    }

    pub(crate) fn disconnect(&self) {
        self.state.lock().disconnected = true;
    }

    pub(crate) fn register_calls(&self) -> u32 {
        self.state.lock().register_calls
    }

    pub(crate) fn unregister_calls(&self) -> u32 {
        self.state.lock().unregister_calls
    }

    pub(crate) fn channel_writes(&self) -> u32 {
        self.state.lock().channel_writes
    }

    pub(crate) fn is_registered(&self) -> bool {
        self.state.lock().notifier.is_some()
    }

    pub(crate) fn is_released(&self) -> bool {
        self.state.lock().released
    }

    /// Play the part of another process changing the endpoint volume.
    ///
    /// Returns false when no callback is registered.
    pub(crate) fn external_change(&self, master: f32, muted: bool) -> bool {
        let notifier = {
            let mut state = self.state.lock();
            state.master = master;
            state.muted = muted;
            state.notifier.clone()
        };
        let Some(notifier) = notifier else {
            return false;
        };
        let channel_volumes = self.state.lock().channels.clone();
        notifier.publish(VolumeNotification {
            event_context: Uuid::nil(),
            muted,
            master_volume: master,
            channel_volumes,
        });
        true
    }
}

/// In-memory peak meter.
pub(crate) struct FakeMeter {
    peaks: Arc<Mutex<Vec<f32>>>,
}

#[derive(Clone)]
pub(crate) struct FakeMeterHandle {
    peaks: Arc<Mutex<Vec<f32>>>,
}

impl FakeMeter {
    pub(crate) fn new(peaks: Vec<f32>) -> (Self, FakeMeterHandle) {
        let peaks = Arc::new(Mutex::new(peaks));
        (
            Self {
                peaks: Arc::clone(&peaks),
            },
            FakeMeterHandle { peaks },
        )
    }
}

impl FakeMeterHandle {
    pub(crate) fn set_peaks(&self, peaks: Vec<f32>) {
        *self.peaks.lock() = peaks;
    }
}

impl MeterApi for FakeMeter {
    fn peak_value(&self) -> Result<f32, AudioError> {
        Ok(self.peaks.lock().iter().copied().fold(0.0, f32::max))
    }

    fn metering_channel_count(&self) -> Result<u32, AudioError> {
        Ok(self.peaks.lock().len() as u32)
    }

    fn channels_peak_values(&self, count: u32) -> Result<Vec<f32>, AudioError> {
        let mut peaks = self.peaks.lock().clone();
        peaks.resize(count as usize, 0.0);
        Ok(peaks)
    }

    fn query_hardware_support(&self) -> Result<u32, AudioError> {
        Ok(0x4)
    }
}
