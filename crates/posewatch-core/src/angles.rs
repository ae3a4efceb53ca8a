//! Diagnostic joint-angle geometry.
//!
//! Angles are computed directly from the full 33-point landmark set and
//! are independent of the model feature path.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::types::{LandmarkSet, PoseIndex};

/// Angle at `mid` formed by the segments `mid->first` and `mid->last`,
/// in degrees, always within [0, 180].
pub fn joint_angle(first: Point2<f32>, mid: Point2<f32>, last: Point2<f32>) -> f32 {
    let raw = (last.y - mid.y).atan2(last.x - mid.x) - (first.y - mid.y).atan2(first.x - mid.x);
    let mut degrees = raw.to_degrees().abs();
    if degrees > 180.0 {
        degrees = 360.0 - degrees;
    }
    degrees
}

/// The six named joint angles reported per frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleProfile {
    pub right_elbow: f32,
    pub left_elbow: f32,
    pub right_knee: f32,
    pub left_knee: f32,
    pub right_armpit: f32,
    pub left_armpit: f32,
}

impl AngleProfile {
    /// Fixed landmark triplets: (first, mid, last) per named angle
    pub fn from_landmarks(landmarks: &LandmarkSet) -> Self {
        let angle = |a: PoseIndex, b: PoseIndex, c: PoseIndex| {
            joint_angle(
                landmarks[a].point(),
                landmarks[b].point(),
                landmarks[c].point(),
            )
        };

        Self {
            right_elbow: angle(
                PoseIndex::RightWrist,
                PoseIndex::RightElbow,
                PoseIndex::RightShoulder,
            ),
            left_elbow: angle(
                PoseIndex::LeftWrist,
                PoseIndex::LeftElbow,
                PoseIndex::LeftShoulder,
            ),
            right_knee: angle(
                PoseIndex::RightHip,
                PoseIndex::RightKnee,
                PoseIndex::RightAnkle,
            ),
            left_knee: angle(
                PoseIndex::LeftHip,
                PoseIndex::LeftKnee,
                PoseIndex::LeftAnkle,
            ),
            right_armpit: angle(
                PoseIndex::RightElbow,
                PoseIndex::RightShoulder,
                PoseIndex::RightHip,
            ),
            left_armpit: angle(
                PoseIndex::LeftElbow,
                PoseIndex::LeftShoulder,
                PoseIndex::LeftHip,
            ),
        }
    }

    /// Named angles in reporting order
    pub fn named(&self) -> [(&'static str, f32); 6] {
        [
            ("right_elbow", self.right_elbow),
            ("left_elbow", self.left_elbow),
            ("right_knee", self.right_knee),
            ("left_knee", self.left_knee),
            ("right_armpit", self.right_armpit),
            ("left_armpit", self.left_armpit),
        ]
    }
}

impl std::fmt::Display for AngleProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (name, value)) in self.named().iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{name}={value:.1}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Landmark;

    fn p(x: f32, y: f32) -> Point2<f32> {
        Point2::new(x, y)
    }

    #[test]
    fn test_right_angle() {
        let angle = joint_angle(p(1.0, 0.0), p(0.0, 0.0), p(0.0, 1.0));
        assert!((angle - 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_straight_line() {
        let angle = joint_angle(p(0.0, 0.0), p(0.5, 0.0), p(1.0, 0.0));
        assert!((angle - 180.0).abs() < 1e-4);
    }

    #[test]
    fn test_symmetry() {
        let triplets = [
            (p(1.0, 0.2), p(0.3, 0.4), p(0.0, 1.0)),
            (p(0.1, 0.9), p(0.5, 0.5), p(0.9, 0.1)),
            (p(-1.0, -1.0), p(0.0, 0.0), p(1.0, -0.5)),
        ];

        for (a, b, c) in triplets {
            let forward = joint_angle(a, b, c);
            let backward = joint_angle(c, b, a);
            assert!((forward - backward).abs() < 1e-4);
        }
    }

    #[test]
    fn test_reflex_angles_fold_back() {
        // Sweep one arm around the full circle; output must stay in [0, 180]
        for i in 0..360 {
            let theta = (i as f32).to_radians();
            let a = p(theta.cos(), theta.sin());
            let angle = joint_angle(a, p(0.0, 0.0), p(1.0, 0.0));
            assert!(
                (0.0..=180.0).contains(&angle),
                "angle {angle} out of range at {i} degrees"
            );
        }
    }

    #[test]
    fn test_profile_from_landmarks() {
        // T-pose-ish synthetic skeleton: straight arms and legs
        let mut lms = [Landmark::new(0.5, 0.5, 1.0); PoseIndex::COUNT];
        lms[PoseIndex::LeftShoulder as usize] = Landmark::new(0.6, 0.3, 1.0);
        lms[PoseIndex::LeftElbow as usize] = Landmark::new(0.75, 0.3, 1.0);
        lms[PoseIndex::LeftWrist as usize] = Landmark::new(0.9, 0.3, 1.0);
        lms[PoseIndex::LeftHip as usize] = Landmark::new(0.6, 0.6, 1.0);
        lms[PoseIndex::LeftKnee as usize] = Landmark::new(0.6, 0.75, 1.0);
        lms[PoseIndex::LeftAnkle as usize] = Landmark::new(0.6, 0.9, 1.0);

        let set = LandmarkSet::new(lms);
        let profile = AngleProfile::from_landmarks(&set);

        assert!((profile.left_elbow - 180.0).abs() < 1e-3);
        assert!((profile.left_knee - 180.0).abs() < 1e-3);
        // Arm straight out, torso straight down: right angle at the armpit
        assert!((profile.left_armpit - 90.0).abs() < 1e-3);

        for (name, value) in profile.named() {
            assert!(
                (0.0..=180.0).contains(&value),
                "{name} out of range: {value}"
            );
        }
    }
}
