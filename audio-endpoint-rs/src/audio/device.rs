//! Audio device selectors and error types.
//!
//! Defines the data-flow and role selectors used to pick an endpoint, and the
//! error type shared by the format, volume and platform modules.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Direction of an audio endpoint (maps to Windows EDataFlow enum).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u32)]
pub enum DataFlow {
    /// Playback endpoints (speakers, headphones)
    #[default]
    Render = 0,

    /// Recording endpoints (microphones, line in)
    Capture = 1,

    /// Both directions, only meaningful for enumeration
    All = 2,
}

/// Audio device role (maps to Windows ERole enum).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u32)]
pub enum Role {
    /// Used by games, system sounds, most general applications
    Console = 0,

    /// Used by music players, video players
    #[default]
    Multimedia = 1,

    /// Used by Teams, Zoom, Discord, and other VoIP applications
    Communications = 2,
}

/// DEVICE_STATE_* mask used to filter endpoint enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceState(u32);

impl DeviceState {
    pub const ACTIVE: DeviceState = DeviceState(0x1);
    pub const DISABLED: DeviceState = DeviceState(0x2);
    pub const NOT_PRESENT: DeviceState = DeviceState(0x4);
    pub const UNPLUGGED: DeviceState = DeviceState(0x8);
    pub const ALL: DeviceState = DeviceState(0xF);

    /// Keeps only the known DEVICE_STATE_* bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits & Self::ALL.0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: DeviceState) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: DeviceState) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::ACTIVE
    }
}

impl std::ops::BitOr for DeviceState {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl TryFrom<u32> for Role {
    type Error = AudioError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Role::Console),
            1 => Ok(Role::Multimedia),
            2 => Ok(Role::Communications),
            other => Err(AudioError::Config(format!("unknown device role {other}"))),
        }
    }
}

impl TryFrom<u32> for DataFlow {
    type Error = AudioError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DataFlow::Render),
            1 => Ok(DataFlow::Capture),
            2 => Ok(DataFlow::All),
            other => Err(AudioError::Config(format!("unknown data flow {other}"))),
        }
    }
}

/// Audio service error types.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Channels must be 1 or greater (got {channels})")]
    ChannelsOutOfRange { channels: u16 },

    #[error("Channel index {index} is out of range for {count} channels")]
    ChannelIndexOutOfRange { index: u32, count: u32 },

    #[error("The audio endpoint does not expose left/right volume channels ({count} channel(s))")]
    TooFewChannels { count: u32 },

    #[error("Left and right balance channels must differ (both are {index})")]
    InvalidChannelPair { index: u32 },

    #[error("Balance must be a number between -1 and 1")]
    InvalidBalance,

    #[error("Volume must be a number between 0 and 1")]
    InvalidVolume,

    #[error("Volume level {level_db} dB is outside the endpoint range [{min_db}, {max_db}] dB")]
    DecibelsOutOfRange {
        level_db: f32,
        min_db: f32,
        max_db: f32,
    },

    #[error("Invalid WaveFormat structure: format chunk length {length} is below 16 bytes")]
    InvalidFormatChunk { length: i32 },

    #[error("Wave format buffer truncated: needed {needed} bytes, got {available}")]
    Truncated { needed: usize, available: usize },

    #[error("Not a recognised PCM or IEEE float format (sub-format {0})")]
    UnsupportedSubFormat(Uuid),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Device not found: {device_id}")]
    DeviceNotFound { device_id: String },

    #[error("No default device available")]
    NoDefaultDevice,

    #[error("Audio device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Volume control not available for device")]
    VolumeNotAvailable,

    #[error("Level meter not available for device")]
    MeterNotAvailable,

    #[error("Failed to (un)register volume notifications: {0}")]
    NotificationRegistration(String),

    #[error("Endpoint volume has been disposed")]
    Disposed,

    #[error("Endpoint volume control is not supported on this platform")]
    Unsupported,

    #[error("String conversion error: {0}")]
    StringConversion(String),

    #[cfg(windows)]
    #[error("COM initialization failed: {0}")]
    ComInitFailed(#[source] windows::core::Error),

    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    WindowsError(#[source] windows::core::Error),
}

impl AudioError {
    /// True for errors raised by rejecting caller input, before any device call.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            AudioError::ChannelsOutOfRange { .. }
                | AudioError::ChannelIndexOutOfRange { .. }
                | AudioError::TooFewChannels { .. }
                | AudioError::InvalidChannelPair { .. }
                | AudioError::InvalidBalance
                | AudioError::InvalidVolume
                | AudioError::DecibelsOutOfRange { .. }
                | AudioError::InvalidFormatChunk { .. }
                | AudioError::Config(_)
        )
    }
}
