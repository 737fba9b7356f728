//! FFI bindings for Audio Endpoint.
//!
//! This crate provides C ABI functions for use from C# via P/Invoke.
//! All functions use panic::catch_unwind to prevent Rust panics from
//! unwinding across the FFI boundary.

use audio_endpoint_rs::format::WaveFormat;
use audio_endpoint_rs::platform::open_default_endpoint;
use audio_endpoint_rs::{
    AudioError, BalanceControl, EndpointBalance, EndpointConfig, EndpointVolumeApi, MediaError,
};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::ffi::{c_char, c_void, CStr, CString};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// ============================================================================
// Error Handling
// ============================================================================

/// Error codes returned by FFI functions.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success = 0,
    InvalidHandle = -1,
    InvalidArgument = -2,
    DeviceNotFound = -3,
    ComError = -4,
    JsonError = -5,
    VolumeNotAvailable = -6,
    NoDefaultDevice = -7,
    Unsupported = -8,
    Disposed = -9,
    InvalidFormat = -10,
    Panic = -99,
}

impl From<&AudioError> for ErrorCode {
    fn from(err: &AudioError) -> Self {
        match err {
            e if e.is_configuration() && !matches!(e, AudioError::InvalidFormatChunk { .. }) => {
                ErrorCode::InvalidArgument
            }
            AudioError::DeviceNotFound { .. } => ErrorCode::DeviceNotFound,
            AudioError::NoDefaultDevice => ErrorCode::NoDefaultDevice,
            AudioError::VolumeNotAvailable
            | AudioError::MeterNotAvailable
            | AudioError::DeviceUnavailable(_) => ErrorCode::VolumeNotAvailable,
            AudioError::Unsupported => ErrorCode::Unsupported,
            AudioError::Disposed => ErrorCode::Disposed,
            AudioError::InvalidFormatChunk { .. }
            | AudioError::Truncated { .. }
            | AudioError::UnsupportedSubFormat(_)
            | AudioError::Io(_) => ErrorCode::InvalidFormat,
            _ => ErrorCode::ComError,
        }
    }
}

impl From<&MediaError> for ErrorCode {
    fn from(err: &MediaError) -> Self {
        ErrorCode::from(err.audio_error())
    }
}

/// Thread-local storage for the last error.
thread_local! {
    static LAST_ERROR: RefCell<Option<(ErrorCode, String)>> = const { RefCell::new(None) };
}

fn set_last_error(code: ErrorCode, message: impl Into<String>) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = Some((code, message.into()));
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Failure inside an FFI call, before it is turned into a status code.
struct CallError {
    code: ErrorCode,
    message: String,
}

impl CallError {
    fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<AudioError> for CallError {
    fn from(err: AudioError) -> Self {
        Self::new(ErrorCode::from(&err), err.to_string())
    }
}

impl From<MediaError> for CallError {
    fn from(err: MediaError) -> Self {
        Self::new(ErrorCode::from(&err), err.to_string())
    }
}

impl From<serde_json::Error> for CallError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(ErrorCode::JsonError, err.to_string())
    }
}

// ============================================================================
// Logging
// ============================================================================

/// Install the global subscriber. Later calls keep the first one.
fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(directive) => EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

// ============================================================================
// Data Types for JSON Serialization
// ============================================================================

/// Snapshot of an endpoint's volume state.
#[derive(Debug, Serialize, Deserialize)]
pub struct EndpointStateDto {
    pub master_volume: f32,
    pub master_volume_db: f32,
    pub is_muted: bool,
    pub channel_volumes: Vec<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
    pub step: u32,
    pub step_count: u32,
    pub min_db: f32,
    pub max_db: f32,
    pub increment_db: f32,
    pub hardware_support: u32,
}

/// A parsed wave format.
#[derive(Debug, Serialize, Deserialize)]
pub struct WaveFormatDto {
    pub encoding: String,
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub average_bytes_per_second: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub extra_size: u16,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_bits_per_sample: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_mask: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub samples_per_block: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coefficients: Option<Vec<i16>>,
}

impl From<&WaveFormat> for WaveFormatDto {
    fn from(format: &WaveFormat) -> Self {
        let mut dto = Self {
            encoding: format.encoding().to_string(),
            format_tag: format.encoding().tag(),
            channels: format.channels(),
            sample_rate: format.sample_rate(),
            average_bytes_per_second: format.average_bytes_per_second(),
            block_align: format.block_align(),
            bits_per_sample: format.bits_per_sample(),
            extra_size: format.extra_size(),
            description: format.to_string(),
            valid_bits_per_sample: None,
            channel_mask: None,
            sub_format: None,
            samples_per_block: None,
            coefficients: None,
        };
        match format {
            WaveFormat::Extensible(extensible) => {
                dto.valid_bits_per_sample = Some(extensible.valid_bits_per_sample());
                dto.channel_mask = Some(extensible.channel_mask());
                dto.sub_format = Some(extensible.sub_format().to_string());
            }
            WaveFormat::Adpcm(adpcm) => {
                dto.samples_per_block = Some(adpcm.samples_per_block());
                dto.coefficients = Some(adpcm.coefficients().to_vec());
            }
            WaveFormat::Gsm610(gsm) => {
                dto.samples_per_block = Some(gsm.samples_per_block());
            }
            WaveFormat::Standard(_) | WaveFormat::ExtraData(_) => {}
        }
        dto
    }
}

// ============================================================================
// Engine Handle Type
// ============================================================================

/// Opaque handle to an opened endpoint. Actually points to an EndpointEngine struct.
pub type EndpointHandle = *mut c_void;

/// Internal engine state.
struct EndpointEngine {
    balance: EndpointBalance<Box<dyn EndpointVolumeApi>>,
}

impl EndpointEngine {
    fn state(&self) -> Result<EndpointStateDto, CallError> {
        let volume = self.balance.endpoint();
        let range = volume.volume_range();
        let steps = volume.current_step_information()?;
        let balance = if self.balance.supports_balance() {
            Some(self.balance.balance()?)
        } else {
            None
        };

        Ok(EndpointStateDto {
            master_volume: volume.master_volume_level_scalar()?,
            master_volume_db: volume.master_volume_level()?,
            is_muted: volume.mute()?,
            channel_volumes: volume.channels()?.scalar_volumes()?,
            balance,
            step: steps.step,
            step_count: steps.step_count,
            min_db: range.min_decibels,
            max_db: range.max_decibels,
            increment_db: range.increment_decibels,
            hardware_support: volume.hardware_support().bits(),
        })
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Allocate a C string from a Rust string. Caller must free with audio_endpoint_free_string.
fn alloc_c_string(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cs) => cs.into_raw(),
        // String contained a null byte
        Err(_) => CString::default().into_raw(),
    }
}

/// Parse a C string to a Rust string slice.
unsafe fn parse_c_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

unsafe fn engine_mut<'a>(handle: EndpointHandle) -> Result<&'a mut EndpointEngine, CallError> {
    (handle as *mut EndpointEngine)
        .as_mut()
        .ok_or_else(|| CallError::new(ErrorCode::InvalidHandle, "Invalid endpoint handle"))
}

/// Run `f` against the engine behind `handle` and return a status code.
fn status_call<F>(handle: EndpointHandle, operation: &str, f: F) -> i32
where
    F: FnOnce(&mut EndpointEngine) -> Result<(), CallError>,
{
    clear_last_error();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let engine = unsafe { engine_mut(handle)? };
        f(engine)
    }));

    match result {
        Ok(Ok(())) => ErrorCode::Success as i32,
        Ok(Err(e)) => {
            set_last_error(e.code, e.message);
            e.code as i32
        }
        Err(_) => {
            set_last_error(ErrorCode::Panic, format!("Panic during {operation}"));
            ErrorCode::Panic as i32
        }
    }
}

/// Run `f` and return its JSON output as an owned C string, or null.
fn json_call<F>(operation: &str, f: F) -> *mut c_char
where
    F: FnOnce() -> Result<String, CallError>,
{
    clear_last_error();

    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(json)) => alloc_c_string(&json),
        Ok(Err(e)) => {
            set_last_error(e.code, e.message);
            ptr::null_mut()
        }
        Err(_) => {
            set_last_error(ErrorCode::Panic, format!("Panic during {operation}"));
            ptr::null_mut()
        }
    }
}

fn write_out<T>(out: *mut T, value: T) -> Result<(), CallError> {
    if out.is_null() {
        return Err(CallError::new(ErrorCode::InvalidArgument, "Null output pointer"));
    }
    unsafe {
        *out = value;
    }
    Ok(())
}

// ============================================================================
// FFI Functions - Lifecycle
// ============================================================================

/// Open the default audio endpoint.
///
/// # Arguments
/// * `config_json` - JSON configuration string (can be null for defaults)
///
/// # Returns
/// Handle to the endpoint, or null on failure. Check audio_endpoint_last_error_code() on failure.
///
/// # Safety
/// The returned handle must be freed with audio_endpoint_destroy().
#[no_mangle]
pub extern "C" fn audio_endpoint_create(config_json: *const c_char) -> EndpointHandle {
    clear_last_error();

    let result = panic::catch_unwind(|| -> Result<EndpointHandle, CallError> {
        let config = if config_json.is_null() {
            EndpointConfig::default()
        } else {
            let json = unsafe { parse_c_str(config_json) }.ok_or_else(|| {
                CallError::new(ErrorCode::InvalidArgument, "Config is not valid UTF-8")
            })?;
            EndpointConfig::from_json(json)?
        };

        init_logging(config.log_level.as_deref());

        let volume = open_default_endpoint(&config)?;
        let engine = Box::new(EndpointEngine {
            balance: EndpointBalance::with_config(volume, &config),
        });
        tracing::debug!(flow = ?config.data_flow, role = ?config.role, "endpoint created");
        Ok(Box::into_raw(engine) as EndpointHandle)
    });

    match result {
        Ok(Ok(handle)) => handle,
        Ok(Err(e)) => {
            set_last_error(e.code, e.message);
            ptr::null_mut()
        }
        Err(_) => {
            set_last_error(ErrorCode::Panic, "Panic during endpoint creation");
            ptr::null_mut()
        }
    }
}

/// Close an endpoint, unregistering its change notification.
///
/// # Safety
/// The handle must have been created by audio_endpoint_create() and must not be used after this call.
#[no_mangle]
pub extern "C" fn audio_endpoint_destroy(handle: EndpointHandle) {
    if handle.is_null() {
        return;
    }

    let _ = panic::catch_unwind(|| {
        let mut engine = unsafe { Box::from_raw(handle as *mut EndpointEngine) };
        if let Err(e) = engine.balance.endpoint_mut().dispose() {
            tracing::warn!(error = %e, "endpoint dispose failed");
        }
    });
}

// ============================================================================
// FFI Functions - Balance
// ============================================================================

/// Read the left/right balance, from -1.0 (left) to 1.0 (right).
///
/// # Returns
/// 0 on success, negative error code on failure.
#[no_mangle]
pub extern "C" fn audio_endpoint_get_balance(handle: EndpointHandle, out_balance: *mut f64) -> i32 {
    status_call(handle, "get balance", |engine| {
        let balance = engine.balance.balance()?;
        write_out(out_balance, balance)
    })
}

/// Set the left/right balance. Values outside [-1, 1] are clamped.
///
/// # Returns
/// 0 on success, negative error code on failure.
#[no_mangle]
pub extern "C" fn audio_endpoint_set_balance(handle: EndpointHandle, balance: f64) -> i32 {
    status_call(handle, "set balance", |engine| {
        engine.balance.set_balance(balance)?;
        Ok(())
    })
}

// ============================================================================
// FFI Functions - Volume
// ============================================================================

/// Read the master volume (0.0 to 1.0).
#[no_mangle]
pub extern "C" fn audio_endpoint_get_volume(handle: EndpointHandle, out_volume: *mut f32) -> i32 {
    status_call(handle, "get volume", |engine| {
        let volume = engine.balance.endpoint().master_volume_level_scalar()?;
        write_out(out_volume, volume)
    })
}

/// Set the master volume (0.0 to 1.0).
#[no_mangle]
pub extern "C" fn audio_endpoint_set_volume(handle: EndpointHandle, volume: f32) -> i32 {
    status_call(handle, "set volume", |engine| {
        engine
            .balance
            .endpoint()
            .set_master_volume_level_scalar(volume)?;
        Ok(())
    })
}

/// Read the mute state into `out_muted` (1 = muted, 0 = unmuted).
#[no_mangle]
pub extern "C" fn audio_endpoint_get_mute(handle: EndpointHandle, out_muted: *mut i32) -> i32 {
    status_call(handle, "get mute", |engine| {
        let muted = engine.balance.endpoint().mute()?;
        write_out(out_muted, i32::from(muted))
    })
}

/// Set the mute state (1 = muted, 0 = unmuted).
#[no_mangle]
pub extern "C" fn audio_endpoint_set_mute(handle: EndpointHandle, muted: i32) -> i32 {
    status_call(handle, "set mute", |engine| {
        engine.balance.endpoint().set_mute(muted != 0)?;
        Ok(())
    })
}

/// Move the master volume one hardware step (`up` != 0 raises it).
#[no_mangle]
pub extern "C" fn audio_endpoint_volume_step(handle: EndpointHandle, up: i32) -> i32 {
    status_call(handle, "volume step", |engine| {
        let volume = engine.balance.endpoint();
        if up != 0 {
            volume.volume_step_up()?;
        } else {
            volume.volume_step_down()?;
        }
        Ok(())
    })
}

/// Get the endpoint's volume state.
///
/// # Returns
/// JSON string. Caller must free with audio_endpoint_free_string().
/// Returns null on failure.
#[no_mangle]
pub extern "C" fn audio_endpoint_state_json(handle: EndpointHandle) -> *mut c_char {
    json_call("state query", || {
        let engine = unsafe { engine_mut(handle)? };
        let state = engine.state()?;
        Ok(serde_json::to_string(&state)?)
    })
}

// ============================================================================
// FFI Functions - Wave Formats
// ============================================================================

/// Parse a WAVEFORMATEX (or larger) structure.
///
/// # Arguments
/// * `bytes` - Pointer to the structure
/// * `len` - Number of readable bytes at `bytes`
///
/// # Returns
/// JSON string describing the format. Caller must free with audio_endpoint_free_string().
/// Returns null on failure.
#[no_mangle]
pub extern "C" fn audio_endpoint_describe_format(bytes: *const u8, len: usize) -> *mut c_char {
    json_call("format description", || {
        if bytes.is_null() {
            return Err(CallError::new(ErrorCode::InvalidArgument, "Null format buffer"));
        }
        let data = unsafe { std::slice::from_raw_parts(bytes, len) };
        let format = WaveFormat::from_bytes(data)?;
        Ok(serde_json::to_string(&WaveFormatDto::from(&format))?)
    })
}

// ============================================================================
// FFI Functions - Memory Management
// ============================================================================

/// Free a string allocated by this library.
///
/// # Safety
/// The pointer must have been returned by one of the audio_endpoint_* functions.
/// Do not call this on strings from other sources.
#[no_mangle]
pub extern "C" fn audio_endpoint_free_string(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }

    let _ = panic::catch_unwind(|| unsafe {
        let _ = CString::from_raw(ptr);
    });
}

// ============================================================================
// FFI Functions - Error Handling
// ============================================================================

/// Get the last error code.
///
/// # Returns
/// The error code from the last failed operation, or 0 if no error.
#[no_mangle]
pub extern "C" fn audio_endpoint_last_error_code() -> i32 {
    LAST_ERROR.with(|e| {
        e.borrow()
            .as_ref()
            .map(|(code, _)| *code as i32)
            .unwrap_or(0)
    })
}

/// Get the last error message.
///
/// # Returns
/// Error message string. Caller must free with audio_endpoint_free_string().
/// Returns null if no error.
#[no_mangle]
pub extern "C" fn audio_endpoint_last_error_message() -> *mut c_char {
    LAST_ERROR.with(|e| {
        e.borrow()
            .as_ref()
            .map(|(_, msg)| alloc_c_string(msg))
            .unwrap_or(ptr::null_mut())
    })
}

// ============================================================================
// FFI Functions - Utility
// ============================================================================

/// Get the library version.
///
/// # Returns
/// Version string. Caller must free with audio_endpoint_free_string().
#[no_mangle]
pub extern "C" fn audio_endpoint_version() -> *mut c_char {
    alloc_c_string(env!("CARGO_PKG_VERSION"))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use audio_endpoint_rs::format::AdpcmWaveFormat;

    fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = unsafe { CStr::from_ptr(ptr).to_str().unwrap().to_string() };
        audio_endpoint_free_string(ptr);
        s
    }

    #[test]
    fn test_error_code_conversion() {
        assert_eq!(
            ErrorCode::from(&AudioError::DeviceNotFound {
                device_id: "test".to_string()
            }),
            ErrorCode::DeviceNotFound
        );
        assert_eq!(
            ErrorCode::from(&AudioError::TooFewChannels { count: 1 }),
            ErrorCode::InvalidArgument
        );
        assert_eq!(
            ErrorCode::from(&AudioError::InvalidFormatChunk { length: 4 }),
            ErrorCode::InvalidFormat
        );
        assert_eq!(
            ErrorCode::from(&AudioError::InvalidVolume),
            ErrorCode::InvalidArgument
        );
        assert_eq!(
            ErrorCode::from(&AudioError::MeterNotAvailable),
            ErrorCode::VolumeNotAvailable
        );
        assert_eq!(ErrorCode::from(&AudioError::Disposed), ErrorCode::Disposed);
        assert_eq!(
            ErrorCode::from(&AudioError::Unsupported),
            ErrorCode::Unsupported
        );
        assert_eq!(
            ErrorCode::from(&AudioError::NotificationRegistration("x".into())),
            ErrorCode::ComError
        );
    }

    #[test]
    fn test_version() {
        let version = take_string(audio_endpoint_version());
        assert_eq!(version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_invalid_handle() {
        let mut balance = 0.0;
        let code = audio_endpoint_get_balance(ptr::null_mut(), &mut balance);
        assert_eq!(code, ErrorCode::InvalidHandle as i32);
        assert_eq!(audio_endpoint_last_error_code(), ErrorCode::InvalidHandle as i32);
        assert!(take_string(audio_endpoint_last_error_message()).contains("handle"));

        assert!(audio_endpoint_state_json(ptr::null_mut()).is_null());
        audio_endpoint_destroy(ptr::null_mut());
    }

    #[test]
    fn test_create_with_bad_config() {
        let config = CString::new(r#"{"balance_channels": {"left": 0, "right": 0}}"#).unwrap();
        let handle = audio_endpoint_create(config.as_ptr());
        assert!(handle.is_null());
        assert_eq!(
            audio_endpoint_last_error_code(),
            ErrorCode::InvalidArgument as i32
        );
    }

    #[test]
    fn test_endpoint_lifecycle() {
        let handle = audio_endpoint_create(ptr::null());
        if handle.is_null() {
            // no audio device on this machine
            let code = audio_endpoint_last_error_code();
            assert!(code < 0 && code != ErrorCode::Panic as i32);
            return;
        }

        let mut volume = -1.0f32;
        assert_eq!(audio_endpoint_get_volume(handle, &mut volume), 0);
        assert!((0.0..=1.0).contains(&volume));

        let state = take_string(audio_endpoint_state_json(handle));
        let dto: EndpointStateDto = serde_json::from_str(&state).unwrap();
        assert!(dto.step_count > 0 || dto.channel_volumes.is_empty());

        audio_endpoint_destroy(handle);
    }

    #[test]
    fn test_describe_pcm_format() {
        let bytes = WaveFormat::pcm(44100, 16, 2).unwrap().to_bytes();
        let json = take_string(audio_endpoint_describe_format(bytes.as_ptr(), bytes.len()));
        let dto: WaveFormatDto = serde_json::from_str(&json).unwrap();

        assert_eq!(dto.encoding, "Pcm");
        assert_eq!(dto.format_tag, 1);
        assert_eq!(dto.block_align, 4);
        assert_eq!(dto.average_bytes_per_second, 176_400);
        assert_eq!(dto.description, "16 bit PCM: 44kHz 2 channels");
        assert!(dto.samples_per_block.is_none());
    }

    #[test]
    fn test_describe_adpcm_format() {
        let bytes = WaveFormat::from(AdpcmWaveFormat::new(22050, 2).unwrap()).to_bytes();
        let json = take_string(audio_endpoint_describe_format(bytes.as_ptr(), bytes.len()));
        let dto: WaveFormatDto = serde_json::from_str(&json).unwrap();

        assert_eq!(dto.samples_per_block, Some(500));
        assert_eq!(dto.coefficients.map(|c| c.len()), Some(14));
        assert_eq!(dto.extra_size, 32);
    }

    #[test]
    fn test_describe_truncated_format() {
        let bytes = [1u8, 0, 2, 0];
        assert!(audio_endpoint_describe_format(bytes.as_ptr(), bytes.len()).is_null());
        assert_eq!(
            audio_endpoint_last_error_code(),
            ErrorCode::InvalidFormat as i32
        );
        assert!(audio_endpoint_describe_format(ptr::null(), 18).is_null());
        assert_eq!(
            audio_endpoint_last_error_code(),
            ErrorCode::InvalidArgument as i32
        );
    }
}
