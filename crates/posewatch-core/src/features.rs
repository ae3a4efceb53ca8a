//! Feature extraction for the dual-input activity classifier.
//!
//! Reduces the 33-point pose estimate to the 14-row skeleton subset the
//! model was trained on, then derives the two parallel input tensors:
//! a min-max range-normalized view and a centroid-recentered view.

use serde::{Deserialize, Serialize};

use crate::types::{Landmark, LandmarkSet, PoseIndex};

/// Rows in the model feature representation
pub const FEATURE_ROWS: usize = 14;

/// Channels per row: (x, y, score)
pub const FEATURE_CHANNELS: usize = 3;

/// Flattened tensor length
pub const FEATURE_LEN: usize = FEATURE_ROWS * FEATURE_CHANNELS;

/// Guard for degenerate min-max ranges
const RANGE_EPSILON: f32 = 1e-3;

/// Source landmark for each feature row except the last; row 13 is the
/// shoulder midpoint, computed rather than selected.
const SOURCE_INDICES: [PoseIndex; FEATURE_ROWS - 1] = [
    PoseIndex::Nose,
    PoseIndex::LeftShoulder,
    PoseIndex::RightShoulder,
    PoseIndex::LeftElbow,
    PoseIndex::RightElbow,
    PoseIndex::LeftWrist,
    PoseIndex::RightWrist,
    PoseIndex::LeftHip,
    PoseIndex::RightHip,
    PoseIndex::LeftKnee,
    PoseIndex::RightKnee,
    PoseIndex::LeftAnkle,
    PoseIndex::RightAnkle,
];

/// Rows contributing to the torso centroid (nose, both shoulders, both
/// hips, shoulder midpoint)
const CENTROID_ROWS: [usize; 6] = [0, 1, 2, 7, 8, 13];

/// Normalization behavior switches.
///
/// `legacy_parity` reproduces two defects of the legacy Android build
/// bit-for-bit: the range rescale runs over the score channel as well,
/// with the epsilon guard applied only when the denominator is exactly
/// zero, and the centroid y-accumulator reuses the running x sum. Leave
/// it off unless output parity with the shipped APK is required.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct NormalizerOptions {
    pub legacy_parity: bool,
}

/// 14x3 model feature representation of a single frame.
///
/// Rows hold `(x, y, score)`; the row order is fixed by the trained
/// model and must not change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureMatrix {
    rows: [[f32; FEATURE_CHANNELS]; FEATURE_ROWS],
}

impl FeatureMatrix {
    /// Reduce a full 33-point landmark set to the 14-row skeleton subset
    pub fn select(landmarks: &LandmarkSet) -> Self {
        let mut rows = [[0.0f32; FEATURE_CHANNELS]; FEATURE_ROWS];

        for (row, &index) in rows.iter_mut().zip(SOURCE_INDICES.iter()) {
            let lm = landmarks[index];
            *row = [lm.x, lm.y, lm.score];
        }

        let mid = landmarks[PoseIndex::LeftShoulder].midpoint(&landmarks[PoseIndex::RightShoulder]);
        rows[FEATURE_ROWS - 1] = [mid.x, mid.y, mid.score];

        Self { rows }
    }

    pub fn from_rows(rows: [[f32; FEATURE_CHANNELS]; FEATURE_ROWS]) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[[f32; FEATURE_CHANNELS]; FEATURE_ROWS] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> &[f32; FEATURE_CHANNELS] {
        &self.rows[index]
    }

    /// Global minimum and maximum over the x and y channels.
    ///
    /// The score channel is excluded from the scan.
    pub fn coordinate_range(&self) -> (f32, f32) {
        let mut min_v = f32::INFINITY;
        let mut max_v = f32::NEG_INFINITY;

        for row in &self.rows {
            for &v in &row[..2] {
                min_v = min_v.min(v);
                max_v = max_v.max(v);
            }
        }

        (min_v, max_v)
    }

    /// Min-max rescale of the x/y channels into the nominal [1, 3] range.
    ///
    /// Scores pass through unscaled. A degenerate range (all coordinates
    /// equal) is guarded with a small epsilon instead of dividing by zero.
    pub fn range_normalized(&self, options: NormalizerOptions) -> FlatTensor {
        if options.legacy_parity {
            return self.range_normalized_legacy();
        }

        let (min_v, max_v) = self.coordinate_range();
        let span = max_v - min_v;
        let denom = if span == 0.0 { span + RANGE_EPSILON } else { span };

        let mut out = [0.0f32; FEATURE_LEN];
        for (i, row) in self.rows.iter().enumerate() {
            out[i * FEATURE_CHANNELS] = (row[0] - min_v) / denom * 2.0 + 1.0;
            out[i * FEATURE_CHANNELS + 1] = (row[1] - min_v) / denom * 2.0 + 1.0;
            out[i * FEATURE_CHANNELS + 2] = row[2];
        }

        FlatTensor::new(out)
    }

    // Legacy rescale loop: the else branch catches the score channel, so
    // it is rescaled too, and only the x/y zero-denominator case gets the
    // epsilon.
    fn range_normalized_legacy(&self) -> FlatTensor {
        let (min_v, max_v) = self.coordinate_range();
        let span = max_v - min_v;

        let mut out = [0.0f32; FEATURE_LEN];
        let mut index = 0;
        for row in &self.rows {
            for (j, &v) in row.iter().enumerate() {
                out[index] = if j < 2 && span == 0.0 {
                    (v - min_v) / (span + RANGE_EPSILON) * 2.0 + 1.0
                } else {
                    (v - min_v) / span * 2.0 + 1.0
                };
                index += 1;
            }
        }

        FlatTensor::new(out)
    }

    /// Recenter coordinates around the torso centroid.
    ///
    /// The centroid averages the x and y values of the six designated
    /// rows; scores are copied unchanged.
    pub fn centroid_normalized(&self, options: NormalizerOptions) -> FlatTensor {
        let (center_x, center_y) = if options.legacy_parity {
            self.centroid_legacy()
        } else {
            self.centroid()
        };

        let mut out = [0.0f32; FEATURE_LEN];
        for (i, row) in self.rows.iter().enumerate() {
            out[i * FEATURE_CHANNELS] = row[0] - center_x;
            out[i * FEATURE_CHANNELS + 1] = row[1] - center_y;
            out[i * FEATURE_CHANNELS + 2] = row[2];
        }

        FlatTensor::new(out)
    }

    fn centroid(&self) -> (f32, f32) {
        let mut x_sum = 0.0f32;
        let mut y_sum = 0.0f32;
        for &r in &CENTROID_ROWS {
            x_sum += self.rows[r][0];
            y_sum += self.rows[r][1];
        }
        (
            x_sum / CENTROID_ROWS.len() as f32,
            y_sum / CENTROID_ROWS.len() as f32,
        )
    }

    // Legacy accumulator-reuse defect: the y sum restarts from the
    // running x sum on every designated row, so the final y center is
    // (total x sum + last row's y) / 6.
    fn centroid_legacy(&self) -> (f32, f32) {
        let mut x_sum = 0.0f32;
        let mut y_sum = 0.0f32;
        for &r in &CENTROID_ROWS {
            x_sum += self.rows[r][0];
            y_sum = x_sum + self.rows[r][1];
        }
        (
            x_sum / CENTROID_ROWS.len() as f32,
            y_sum / CENTROID_ROWS.len() as f32,
        )
    }
}

/// Flattened row-major feature tensor with its model input shape tag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatTensor {
    values: [f32; FEATURE_LEN],
}

impl FlatTensor {
    /// Shape expected by the inference module
    pub const SHAPE: (usize, usize, usize) = (1, FEATURE_ROWS, FEATURE_CHANNELS);

    pub fn new(values: [f32; FEATURE_LEN]) -> Self {
        Self { values }
    }

    pub fn zeroed() -> Self {
        Self {
            values: [0.0; FEATURE_LEN],
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Value at (row, channel)
    pub fn at(&self, row: usize, channel: usize) -> f32 {
        self.values[row * FEATURE_CHANNELS + channel]
    }
}

/// Convenience wrapper: selector plus both normalizers in one call
pub fn extract_feature_tensors(
    landmarks: &LandmarkSet,
    options: NormalizerOptions,
) -> (FlatTensor, FlatTensor) {
    let matrix = FeatureMatrix::select(landmarks);
    (
        matrix.range_normalized(options),
        matrix.centroid_normalized(options),
    )
}
