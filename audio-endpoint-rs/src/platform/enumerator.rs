//! Endpoint lookup using the Windows MMDevice API.

use super::com::ComGuard;
use super::endpoint_volume::WasapiEndpointVolume;
use super::meter::WasapiMeter;
use crate::audio::{AudioError, DataFlow, DeviceState, Role};
use windows::core::{HRESULT, PCWSTR, PWSTR};
use windows::Win32::Devices::Properties::DEVPKEY_Device_FriendlyName;
use windows::Win32::Media::Audio::Endpoints::{IAudioEndpointVolume, IAudioMeterInformation};
use windows::Win32::Media::Audio::{
    eAll, eCapture, eCommunications, eConsole, eMultimedia, eRender, EDataFlow, ERole,
    IMMDevice, IMMDeviceEnumerator, MMDeviceEnumerator, DEVICE_STATE,
};
use windows::Win32::System::Com::{CoCreateInstance, CoTaskMemFree, CLSCTX_ALL, STGM};
use windows::Win32::UI::Shell::PropertiesSystem::{IPropertyStore, PROPERTYKEY};

/// HRESULT_FROM_WIN32(ERROR_NOT_FOUND), returned when no endpoint fills a role.
const E_NOTFOUND: HRESULT = HRESULT(0x8007_0490_u32 as i32);

fn to_data_flow(flow: DataFlow) -> EDataFlow {
    match flow {
        DataFlow::Render => eRender,
        DataFlow::Capture => eCapture,
        DataFlow::All => eAll,
    }
}

fn to_role(role: Role) -> ERole {
    match role {
        Role::Console => eConsole,
        Role::Multimedia => eMultimedia,
        Role::Communications => eCommunications,
    }
}

/// Take ownership of a COM-allocated wide string.
unsafe fn take_string(value: PWSTR) -> Result<String, AudioError> {
    let converted = value
        .to_string()
        .map_err(|e| AudioError::StringConversion(e.to_string()));
    CoTaskMemFree(Some(value.0 as *const _));
    converted
}

/// Device enumerator using Windows MMDevice API.
pub struct DeviceEnumerator {
    enumerator: IMMDeviceEnumerator,
    _com: ComGuard,
}

impl DeviceEnumerator {
    pub fn new() -> Result<Self, AudioError> {
        let com = ComGuard::new()?;
        let enumerator: IMMDeviceEnumerator =
            unsafe { CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL) }
                .map_err(AudioError::WindowsError)?;
        Ok(Self {
            enumerator,
            _com: com,
        })
    }

    /// All endpoints for `flow` whose state is in `state_mask`.
    pub fn enumerate(
        &self,
        flow: DataFlow,
        state_mask: DeviceState,
    ) -> Result<Vec<Device>, AudioError> {
        unsafe {
            let collection = self
                .enumerator
                .EnumAudioEndpoints(to_data_flow(flow), DEVICE_STATE(state_mask.bits()))
                .map_err(AudioError::WindowsError)?;

            let count = collection.GetCount().map_err(AudioError::WindowsError)?;

            let mut devices = Vec::with_capacity(count as usize);
            for i in 0..count {
                let device = collection.Item(i).map_err(AudioError::WindowsError)?;
                devices.push(Device { device });
            }
            tracing::debug!(?flow, state = state_mask.bits(), count, "enumerated endpoints");
            Ok(devices)
        }
    }

    /// The endpoint Windows currently uses for `flow` and `role`.
    pub fn default_audio_endpoint(&self, flow: DataFlow, role: Role) -> Result<Device, AudioError> {
        let device = unsafe {
            self.enumerator
                .GetDefaultAudioEndpoint(to_data_flow(flow), to_role(role))
        }
        .map_err(|e| {
            if e.code() == E_NOTFOUND {
                AudioError::NoDefaultDevice
            } else {
                AudioError::WindowsError(e)
            }
        })?;
        Ok(Device { device })
    }

    /// Whether any endpoint fills `role` for `flow`.
    pub fn has_default_audio_endpoint(&self, flow: DataFlow, role: Role) -> Result<bool, AudioError> {
        match self.default_audio_endpoint(flow, role) {
            Ok(_) => Ok(true),
            Err(AudioError::NoDefaultDevice) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Look up an endpoint by its device ID string.
    pub fn device(&self, device_id: &str) -> Result<Device, AudioError> {
        let device_id_wide: Vec<u16> = device_id.encode_utf16().chain(std::iter::once(0)).collect();
        let device = unsafe {
            self.enumerator
                .GetDevice(PCWSTR::from_raw(device_id_wide.as_ptr()))
        }
        .map_err(|_| AudioError::DeviceNotFound {
            device_id: device_id.to_string(),
        })?;
        Ok(Device { device })
    }
}

/// One audio endpoint.
pub struct Device {
    device: IMMDevice,
}

impl Device {
    pub fn id(&self) -> Result<String, AudioError> {
        unsafe {
            let id = self.device.GetId().map_err(AudioError::WindowsError)?;
            take_string(id)
        }
    }

    pub fn state(&self) -> Result<DeviceState, AudioError> {
        let state = unsafe { self.device.GetState() }.map_err(AudioError::WindowsError)?;
        Ok(DeviceState::from_bits(state.0))
    }

    /// Friendly name from the property store, if the driver provides one.
    pub fn friendly_name(&self) -> Option<String> {
        unsafe {
            let props: IPropertyStore = self.device.OpenPropertyStore(STGM(0)).ok()?;
            let key = PROPERTYKEY {
                fmtid: DEVPKEY_Device_FriendlyName.fmtid,
                pid: DEVPKEY_Device_FriendlyName.pid,
            };
            let name = props.GetValue(&key).ok()?.to_string();
            if name.is_empty() {
                None
            } else {
                Some(name)
            }
        }
    }

    /// Activate the endpoint-volume service on this device.
    pub fn activate_endpoint_volume(&self) -> Result<WasapiEndpointVolume, AudioError> {
        let com = ComGuard::new()?;
        let endpoint: IAudioEndpointVolume = unsafe { self.device.Activate(CLSCTX_ALL, None) }
            .map_err(|e| {
                tracing::debug!(error = %e, "IAudioEndpointVolume activation failed");
                AudioError::VolumeNotAvailable
            })?;
        Ok(WasapiEndpointVolume::new(endpoint, com))
    }

    /// Activate the peak meter on this device.
    pub fn activate_meter(&self) -> Result<WasapiMeter, AudioError> {
        let com = ComGuard::new()?;
        let meter_info: IAudioMeterInformation = unsafe { self.device.Activate(CLSCTX_ALL, None) }
            .map_err(|e| {
                tracing::debug!(error = %e, "IAudioMeterInformation activation failed");
                AudioError::MeterNotAvailable
            })?;
        Ok(WasapiMeter::new(meter_info, com))
    }
}
