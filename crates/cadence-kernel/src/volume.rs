//! Bus volume control.
//!
//! Volumes are set as linear gain in `[0, 1]` and written to the mixer as
//! decibels. Zero is clamped to the floor, so the quietest level is -80 dB
//! rather than negative infinity.

use tracing::{debug, trace};

use crate::voice::{clamp_volume, MixerBus};

/// Lowest linear gain passed to the decibel conversion.
pub const MIN_LINEAR: f32 = 0.0001;

/// Convert linear gain to decibels, clamping the input to `[0.0001, 1]`.
#[must_use]
pub fn linear_to_db(linear: f32) -> f32 {
    let linear = if linear.is_nan() { MIN_LINEAR } else { linear.clamp(MIN_LINEAR, 1.0) };
    20.0 * linear.log10()
}

/// Convert decibels back to linear gain.
#[must_use]
pub fn db_to_linear(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Write `db` to the named bus parameter.
///
/// A missing mixer or an empty name does nothing. Returns whether the mixer
/// accepted the value.
pub fn apply_bus(mixer: Option<&mut dyn MixerBus>, name: &str, db: f32) -> bool {
    let Some(mixer) = mixer else {
        trace!("No mixer; ignoring {} = {:.1} dB", name, db);
        return false;
    };
    if name.is_empty() {
        return false;
    }
    let accepted = mixer.set_parameter(name, db);
    if !accepted {
        debug!("Mixer has no parameter '{}'", name);
    }
    accepted
}

/// Mixing bus addressed by a volume setter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bus {
    /// Everything.
    Master,
    /// Music decks.
    Music,
    /// Sound effects.
    Sfx,
}

/// Last linear level set per bus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeSettings {
    /// Master level.
    pub master: f32,
    /// Music level.
    pub music: f32,
    /// Effects level.
    pub sfx: f32,
}

impl Default for VolumeSettings {
    fn default() -> Self {
        Self {
            master: 1.0,
            music: 1.0,
            sfx: 1.0,
        }
    }
}

impl VolumeSettings {
    /// Level of `bus`.
    #[must_use]
    pub const fn get(&self, bus: Bus) -> f32 {
        match bus {
            Bus::Master => self.master,
            Bus::Music => self.music,
            Bus::Sfx => self.sfx,
        }
    }

    /// Remember a level, clamped to `[0, 1]`. Returns the stored value.
    pub fn set(&mut self, bus: Bus, linear: f32) -> f32 {
        let linear = clamp_volume(linear);
        match bus {
            Bus::Master => self.master = linear,
            Bus::Music => self.music = linear,
            Bus::Sfx => self.sfx = linear,
        }
        linear
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::virtual_backend::VirtualMixer;
    use proptest::prelude::*;

    #[test]
    fn test_zero_clamps_to_floor() {
        let floor = linear_to_db(MIN_LINEAR);
        assert!(floor.is_finite());
        assert!((linear_to_db(0.0) - floor).abs() < f32::EPSILON);
        assert!((floor + 80.0).abs() < 1e-3);
    }

    #[test]
    fn test_unity_is_zero_db() {
        assert!(linear_to_db(1.0).abs() < f32::EPSILON);
        assert!(linear_to_db(4.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_half_is_about_minus_six() {
        assert!((linear_to_db(0.5) + 6.0206).abs() < 1e-3);
        assert!((db_to_linear(linear_to_db(0.5)) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_apply_bus_without_mixer_or_name() {
        assert!(!apply_bus(None, "MasterVolume", -3.0));

        let mut mixer = VirtualMixer::with_parameters(["MasterVolume"]);
        assert!(!apply_bus(Some(&mut mixer as &mut dyn MixerBus), "", -3.0));
        assert!(apply_bus(Some(&mut mixer as &mut dyn MixerBus), "MasterVolume", -3.0));
        assert_eq!(mixer.parameter("MasterVolume"), Some(-3.0));
    }

    #[test]
    fn test_settings_clamp() {
        let mut settings = VolumeSettings::default();
        assert!((settings.set(Bus::Music, 1.5) - 1.0).abs() < f32::EPSILON);
        assert!(settings.set(Bus::Sfx, f32::NAN).abs() < f32::EPSILON);
        assert!((settings.get(Bus::Master) - 1.0).abs() < f32::EPSILON);
    }

    proptest! {
        #[test]
        fn prop_db_within_range(linear in -10.0f32..10.0) {
            let db = linear_to_db(linear);
            prop_assert!(db.is_finite());
            prop_assert!(db <= 0.0);
            prop_assert!(db >= -80.0 - 1e-3);
        }
    }
}
