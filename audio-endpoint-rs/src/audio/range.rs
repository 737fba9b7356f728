//! Read-only hardware capability snapshots.

use super::backend::EndpointVolumeApi;
use super::device::AudioError;
use std::fmt;

/// Volume range reported by the endpoint, in decibels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeRange {
    pub min_decibels: f32,
    pub max_decibels: f32,
    pub increment_decibels: f32,
}

impl VolumeRange {
    pub(crate) fn query<A: EndpointVolumeApi + ?Sized>(api: &A) -> Result<Self, AudioError> {
        let (min_decibels, max_decibels, increment_decibels) = api.volume_range()?;
        Ok(Self {
            min_decibels,
            max_decibels,
            increment_decibels,
        })
    }

    /// True if `level_db` lies within `[min_decibels, max_decibels]`.
    pub fn contains(&self, level_db: f32) -> bool {
        level_db >= self.min_decibels && level_db <= self.max_decibels
    }

    /// Reject a decibel level the endpoint cannot take. NaN is never contained.
    pub(crate) fn check(&self, level_db: f32) -> Result<f32, AudioError> {
        if !self.contains(level_db) {
            return Err(AudioError::DecibelsOutOfRange {
                level_db,
                min_db: self.min_decibels,
                max_db: self.max_decibels,
            });
        }
        Ok(level_db)
    }
}

/// Clamp a scalar volume into [0, 1]. Non-finite values are rejected.
pub(crate) fn checked_scalar(level: f32) -> Result<f32, AudioError> {
    if !level.is_finite() {
        return Err(AudioError::InvalidVolume);
    }
    Ok(level.clamp(0.0, 1.0))
}

/// Volume step position at the time the endpoint was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepInformation {
    pub step: u32,
    pub step_count: u32,
}

impl StepInformation {
    pub(crate) fn query<A: EndpointVolumeApi + ?Sized>(api: &A) -> Result<Self, AudioError> {
        let (step, step_count) = api.volume_step_info()?;
        Ok(Self { step, step_count })
    }
}

/// ENDPOINT_HARDWARE_SUPPORT_* flags.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HardwareSupport(u32);

impl HardwareSupport {
    pub const VOLUME: HardwareSupport = HardwareSupport(0x1);
    pub const MUTE: HardwareSupport = HardwareSupport(0x2);
    pub const METER: HardwareSupport = HardwareSupport(0x4);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: HardwareSupport) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for HardwareSupport {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for HardwareSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.contains(Self::VOLUME) {
            names.push("VOLUME");
        }
        if self.contains(Self::MUTE) {
            names.push("MUTE");
        }
        if self.contains(Self::METER) {
            names.push("METER");
        }
        write!(f, "HardwareSupport({})", names.join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hardware_support_flags() {
        let support = HardwareSupport::from_bits(0x5);
        assert!(support.contains(HardwareSupport::VOLUME));
        assert!(!support.contains(HardwareSupport::MUTE));
        assert!(support.contains(HardwareSupport::METER));
        assert_eq!(support, HardwareSupport::VOLUME | HardwareSupport::METER);
        assert_eq!(format!("{:?}", support), "HardwareSupport(VOLUME | METER)");
        assert!(HardwareSupport::default().is_empty());
    }

    #[test]
    fn test_range_contains() {
        let range = VolumeRange {
            min_decibels: -65.25,
            max_decibels: 0.0,
            increment_decibels: 0.03125,
        };
        assert!(range.contains(-10.0));
        assert!(range.contains(0.0));
        assert!(!range.contains(1.0));
        assert!(!range.contains(-80.0));
        assert!(!range.contains(f32::NAN));
        assert!(matches!(
            range.check(6.0),
            Err(AudioError::DecibelsOutOfRange { max_db, .. }) if max_db == 0.0
        ));
    }

    #[test]
    fn test_checked_scalar() {
        assert_eq!(checked_scalar(0.4).unwrap(), 0.4);
        assert_eq!(checked_scalar(-0.5).unwrap(), 0.0);
        assert_eq!(checked_scalar(2.0).unwrap(), 1.0);
        assert!(matches!(checked_scalar(f32::NAN), Err(AudioError::InvalidVolume)));
        assert!(matches!(
            checked_scalar(f32::INFINITY),
            Err(AudioError::InvalidVolume)
        ));
    }
}
