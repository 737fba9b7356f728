//! Peak metering.
//!
//! `MeterApi` mirrors IAudioMeterInformation. Peaks are linear amplitudes in
//! [0, 1] over the last device period, shared with every other client.

use super::device::AudioError;
use super::range::HardwareSupport;

/// Raw calls into an endpoint's peak meter.
pub trait MeterApi {
    /// Peak of all channels together.
    fn peak_value(&self) -> Result<f32, AudioError>;

    fn metering_channel_count(&self) -> Result<u32, AudioError>;

    /// One peak per metered channel, `count` values long.
    fn channels_peak_values(&self, count: u32) -> Result<Vec<f32>, AudioError>;

    /// Raw ENDPOINT_HARDWARE_SUPPORT_* bitmask of the meter.
    fn query_hardware_support(&self) -> Result<u32, AudioError>;
}

impl<T: MeterApi + ?Sized> MeterApi for Box<T> {
    fn peak_value(&self) -> Result<f32, AudioError> {
        (**self).peak_value()
    }

    fn metering_channel_count(&self) -> Result<u32, AudioError> {
        (**self).metering_channel_count()
    }

    fn channels_peak_values(&self, count: u32) -> Result<Vec<f32>, AudioError> {
        (**self).channels_peak_values(count)
    }

    fn query_hardware_support(&self) -> Result<u32, AudioError> {
        (**self).query_hardware_support()
    }
}

/// Level meter for one endpoint.
pub struct AudioMeter<M: MeterApi> {
    api: M,
}

impl<M: MeterApi> AudioMeter<M> {
    pub fn new(api: M) -> Self {
        Self { api }
    }

    /// Get the current peak level (0.0 to 1.0).
    pub fn peak_value(&self) -> Result<f32, AudioError> {
        self.api.peak_value()
    }

    /// Number of metered channels. The device may change it between calls.
    pub fn channel_count(&self) -> Result<u32, AudioError> {
        self.api.metering_channel_count()
    }

    /// Get peak values for all channels.
    pub fn channel_peak_values(&self) -> Result<Vec<f32>, AudioError> {
        let count = self.api.metering_channel_count()?;
        self.api.channels_peak_values(count)
    }

    /// Peak of the channel at `index`, from a fresh read of every channel.
    pub fn channel_peak_value(&self, index: u32) -> Result<f32, AudioError> {
        let peaks = self.channel_peak_values()?;
        peaks
            .get(index as usize)
            .copied()
            .ok_or(AudioError::ChannelIndexOutOfRange {
                index,
                count: peaks.len() as u32,
            })
    }

    pub fn hardware_support(&self) -> Result<HardwareSupport, AudioError> {
        Ok(HardwareSupport::from_bits(self.api.query_hardware_support()?))
    }
}
