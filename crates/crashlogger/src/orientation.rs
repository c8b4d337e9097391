//! Orientation classification from accelerometer samples.
//!
//! A sample is reduced to pitch and roll tilt angles and mapped onto a small
//! set of discrete orientations. Classification is pure and total: every
//! sample yields a label, including raw values far outside the sensor range.

use serde::{Deserialize, Serialize};

/// Default tilt threshold in degrees.
pub const DEFAULT_TILT_THRESHOLD_DEG: f32 = 40.0;

/// Default vertical acceleration below which the device reads as `Down`.
pub const DEFAULT_DOWN_THRESHOLD_G: f32 = 0.3;

/// Sensor counts per g for the ±2g range.
pub const DEFAULT_SCALE_LSB_PER_G: f32 = 16384.0;

/// Raw accelerometer words as read from the sensor bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawAccel {
    /// X axis counts.
    pub x: i16,
    /// Y axis counts.
    pub y: i16,
    /// Z axis counts.
    pub z: i16,
}

/// One accelerometer sample in units of g.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AccelSample {
    /// X axis acceleration.
    pub x: f32,
    /// Y axis acceleration.
    pub y: f32,
    /// Z axis acceleration.
    pub z: f32,
}

impl AccelSample {
    /// Create a sample from g values.
    #[must_use]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Convert raw sensor words using a fixed scale factor.
    #[must_use]
    pub fn from_raw(raw: RawAccel, scale_lsb_per_g: f32) -> Self {
        Self {
            x: f32::from(raw.x) / scale_lsb_per_g,
            y: f32::from(raw.y) / scale_lsb_per_g,
            z: f32::from(raw.z) / scale_lsb_per_g,
        }
    }

    /// Pitch angle in degrees.
    #[must_use]
    pub fn pitch_deg(&self) -> f32 {
        self.x
            .atan2((self.y * self.y + self.z * self.z).sqrt())
            .to_degrees()
    }

    /// Roll angle in degrees.
    #[must_use]
    pub fn roll_deg(&self) -> f32 {
        self.y
            .atan2((self.x * self.x + self.z * self.z).sqrt())
            .to_degrees()
    }
}

/// Discrete orientation of the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OrientationLabel {
    /// Upright; the only label that is not a crash candidate.
    #[default]
    Normal,
    /// Pitched beyond the threshold in the positive direction.
    Left,
    /// Pitched beyond the threshold in the negative direction.
    Right,
    /// Rolled beyond the threshold in the negative direction.
    Front,
    /// Rolled beyond the threshold in the positive direction.
    Back,
    /// Level but with too little vertical acceleration (on its side or inverted).
    Down,
}

impl OrientationLabel {
    /// Whether this label is `Normal`.
    #[must_use]
    pub fn is_normal(self) -> bool {
        self == Self::Normal
    }

    /// Label name as shown to operators.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Left => "Left",
            Self::Right => "Right",
            Self::Front => "Front",
            Self::Back => "Back",
            Self::Down => "Down",
        }
    }
}

impl std::fmt::Display for OrientationLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps samples to orientation labels.
///
/// Predicates are checked in order and the first match wins: pitch dominates
/// roll, which dominates the flat-orientation check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationClassifier {
    tilt_threshold_deg: f32,
    down_threshold_g: f32,
}

impl Default for OrientationClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_TILT_THRESHOLD_DEG, DEFAULT_DOWN_THRESHOLD_G)
    }
}

impl OrientationClassifier {
    /// Create a classifier with explicit thresholds.
    #[must_use]
    pub fn new(tilt_threshold_deg: f32, down_threshold_g: f32) -> Self {
        Self {
            tilt_threshold_deg,
            down_threshold_g,
        }
    }

    /// Classify one sample.
    #[must_use]
    pub fn classify(&self, sample: AccelSample) -> OrientationLabel {
        let pitch = sample.pitch_deg();
        let roll = sample.roll_deg();
        let limit = self.tilt_threshold_deg;

        if pitch > limit {
            OrientationLabel::Left
        } else if pitch < -limit {
            OrientationLabel::Right
        } else if roll > limit {
            OrientationLabel::Back
        } else if roll < -limit {
            OrientationLabel::Front
        } else if sample.z < self.down_threshold_g {
            OrientationLabel::Down
        } else {
            OrientationLabel::Normal
        }
    }
}

/// Classify a sample with the default thresholds.
#[must_use]
pub fn classify(sample: AccelSample) -> OrientationLabel {
    OrientationClassifier::default().classify(sample)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upright_is_normal() {
        assert_eq!(classify(AccelSample::new(0.0, 0.0, 1.0)), OrientationLabel::Normal);
    }

    #[test]
    fn test_pitch_dominates_everything() {
        // Strong positive pitch wins over roll and a low z.
        let samples = [
            AccelSample::new(1.0, 0.0, 0.0),
            AccelSample::new(1.0, 0.5, -0.2),
            AccelSample::new(2.0, -0.9, 0.1),
            AccelSample::new(1.5, 1.0, -1.0),
        ];
        for sample in samples {
            assert!(sample.pitch_deg() > 40.0, "{sample:?}");
            assert_eq!(classify(sample), OrientationLabel::Left, "{sample:?}");
        }
    }

    #[test]
    fn test_negative_pitch_is_right() {
        assert_eq!(classify(AccelSample::new(-1.0, 0.0, 0.2)), OrientationLabel::Right);
    }

    #[test]
    fn test_roll_labels() {
        assert_eq!(classify(AccelSample::new(0.0, 1.0, 0.2)), OrientationLabel::Back);
        assert_eq!(classify(AccelSample::new(0.0, -1.0, 0.2)), OrientationLabel::Front);
    }

    #[test]
    fn test_roll_dominates_down() {
        // z is below the down threshold but roll matches first.
        assert_eq!(classify(AccelSample::new(0.0, -1.0, 0.0)), OrientationLabel::Front);
    }

    #[test]
    fn test_inverted_is_down() {
        assert_eq!(classify(AccelSample::new(0.0, 0.0, -1.0)), OrientationLabel::Down);
        assert_eq!(classify(AccelSample::new(0.1, 0.1, 0.2)), OrientationLabel::Down);
    }

    #[test]
    fn test_pitch_just_below_threshold_is_normal() {
        let angle = 40.0_f32.to_radians();
        let sample = AccelSample::new(angle.sin(), 0.0, angle.cos());
        assert!((sample.pitch_deg() - 40.0).abs() < 1e-3);
        let classifier = OrientationClassifier::new(40.01, DEFAULT_DOWN_THRESHOLD_G);
        assert_eq!(classifier.classify(sample), OrientationLabel::Normal);
    }

    #[test]
    fn test_out_of_range_values_still_classify() {
        assert_eq!(classify(AccelSample::new(0.0, 0.0, 8.0)), OrientationLabel::Normal);
        assert_eq!(
            classify(AccelSample::new(f32::from(i16::MIN), 0.0, 0.0)),
            OrientationLabel::Right
        );
    }

    #[test]
    fn test_all_zero_sample_is_down() {
        assert_eq!(classify(AccelSample::default()), OrientationLabel::Down);
    }

    #[test]
    fn test_from_raw_scaling() {
        let raw = RawAccel {
            x: 0,
            y: -8192,
            z: 16384,
        };
        let sample = AccelSample::from_raw(raw, DEFAULT_SCALE_LSB_PER_G);
        assert!((sample.x).abs() < f32::EPSILON);
        assert!((sample.y + 0.5).abs() < f32::EPSILON);
        assert!((sample.z - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_custom_thresholds() {
        let classifier = OrientationClassifier::new(20.0, 0.5);
        let tilted = AccelSample::new(0.5, 0.0, 0.87);
        assert_eq!(classifier.classify(tilted), OrientationLabel::Left);
        assert_eq!(classify(tilted), OrientationLabel::Normal);
        assert_eq!(
            classifier.classify(AccelSample::new(0.0, 0.0, 0.4)),
            OrientationLabel::Down
        );
    }

    #[test]
    fn test_label_display() {
        assert_eq!(OrientationLabel::Front.to_string(), "Front");
        assert_eq!(OrientationLabel::Normal.to_string(), "Normal");
        assert!(OrientationLabel::Normal.is_normal());
        assert!(!OrientationLabel::Down.is_normal());
    }
}
