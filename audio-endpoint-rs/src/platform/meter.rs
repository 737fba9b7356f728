//! IAudioMeterInformation backend.

use super::com::ComGuard;
use crate::audio::{AudioError, MeterApi};
use windows::Win32::Media::Audio::Endpoints::IAudioMeterInformation;

/// An activated IAudioMeterInformation.
pub struct WasapiMeter {
    meter_info: IAudioMeterInformation,
    _com: ComGuard,
}

impl WasapiMeter {
    pub(crate) fn new(meter_info: IAudioMeterInformation, com: ComGuard) -> Self {
        Self {
            meter_info,
            _com: com,
        }
    }
}

impl MeterApi for WasapiMeter {
    fn peak_value(&self) -> Result<f32, AudioError> {
        unsafe { self.meter_info.GetPeakValue() }.map_err(AudioError::WindowsError)
    }

    fn metering_channel_count(&self) -> Result<u32, AudioError> {
        unsafe { self.meter_info.GetMeteringChannelCount() }.map_err(AudioError::WindowsError)
    }

    fn channels_peak_values(&self, count: u32) -> Result<Vec<f32>, AudioError> {
        let mut peaks = vec![0.0f32; count as usize];
        if !peaks.is_empty() {
            unsafe { self.meter_info.GetChannelsPeakValues(&mut peaks) }
                .map_err(AudioError::WindowsError)?;
        }
        Ok(peaks)
    }

    fn query_hardware_support(&self) -> Result<u32, AudioError> {
        unsafe { self.meter_info.QueryHardwareSupport() }.map_err(AudioError::WindowsError)
    }
}
