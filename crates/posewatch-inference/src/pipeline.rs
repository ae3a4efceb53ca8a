//! Per-frame processing pipeline.
//!
//! Wires the pure feature path (selector, both normalizers) to the
//! inference engine and the independent angle diagnostics. Stateless
//! across frames: every matrix and tensor is built for one frame and
//! discarded. Any input anomaly degrades to skipping the frame.

use serde::{Deserialize, Serialize};

use posewatch_core::{
    extract_feature_tensors, AngleProfile, ClassificationOutcome, ClassificationScores,
    LandmarkSet, NormalizerOptions, Result, Timestamp,
};

use crate::engine::{InferenceConfig, InferenceEngine};
use crate::packet::LandmarkPacket;

/// Configuration for the frame pipeline
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Normalization behavior
    pub normalizer: NormalizerOptions,

    /// Engine configuration
    pub inference: InferenceConfig,
}

impl PipelineConfig {
    /// Load configuration from file, with environment overrides
    pub fn from_file(path: &str) -> std::result::Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("POSEWATCH"))
            .build()?;

        settings.try_deserialize()
    }

    /// Load from environment variables only
    pub fn from_env() -> std::result::Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("POSEWATCH"))
            .build()?;

        settings.try_deserialize()
    }
}

/// Everything the pipeline reports for one processed frame
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FrameReport {
    pub timestamp: Timestamp,
    pub sequence_number: Option<u32>,
    pub outcome: ClassificationOutcome,
    pub scores: Option<ClassificationScores>,
    pub angles: AngleProfile,
}

/// The per-frame pipeline: selector -> normalizers -> engine, plus the
/// independent angle diagnostics
pub struct FramePipeline<'a> {
    engine: &'a InferenceEngine,
    options: NormalizerOptions,
}

impl<'a> FramePipeline<'a> {
    pub fn new(engine: &'a InferenceEngine, config: &PipelineConfig) -> Self {
        Self {
            engine,
            options: config.normalizer,
        }
    }

    /// Process one decoded landmark set.
    ///
    /// Inference failure never propagates: the frame's classification is
    /// reported as unavailable and the angles are still computed.
    pub fn process_frame(&self, landmarks: &LandmarkSet, timestamp: Timestamp) -> FrameReport {
        let (range, centroid) = extract_feature_tensors(landmarks, self.options);

        let (outcome, scores) = match self.engine.classify(&range, &centroid) {
            Ok(scores) => (
                ClassificationOutcome::Classified(scores.classification()),
                Some(scores),
            ),
            Err(e) => {
                tracing::warn!("inference unavailable, skipping classification: {e}");
                (ClassificationOutcome::Unavailable, None)
            }
        };

        let angles = AngleProfile::from_landmarks(landmarks);
        tracing::debug!(%outcome, "frame angles: {angles}");

        FrameReport {
            timestamp,
            sequence_number: None,
            outcome,
            scores,
            angles,
        }
    }

    /// Decode and process one raw upstream packet
    pub fn process_packet(&self, packet: &LandmarkPacket) -> Result<FrameReport> {
        let landmarks = packet.decode()?;

        let mut report = self.process_frame(&landmarks, packet.timestamp());
        report.sequence_number = Some(packet.sequence_number);
        Ok(report)
    }
}

/// Frame stream processor with callback support.
///
/// The external frame source pushes packets in; registered callbacks
/// receive each report. Malformed packets are logged and dropped.
pub struct PoseStreamProcessor<'a> {
    pipeline: FramePipeline<'a>,
    callbacks: Vec<Box<dyn Fn(&FrameReport) + Send + Sync>>,
}

impl<'a> PoseStreamProcessor<'a> {
    pub fn new(engine: &'a InferenceEngine, config: &PipelineConfig) -> Self {
        Self {
            pipeline: FramePipeline::new(engine, config),
            callbacks: Vec::new(),
        }
    }

    /// Add a callback for per-frame reports
    pub fn on_report<F>(&mut self, callback: F)
    where
        F: Fn(&FrameReport) + Send + Sync + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Process a packet and invoke callbacks; a malformed packet drops
    /// the frame without reaching the callbacks
    pub fn process(&self, packet: &LandmarkPacket) {
        match self.pipeline.process_packet(packet) {
            Ok(report) => {
                for callback in &self.callbacks {
                    callback(&report);
                }
            }
            Err(e) => {
                tracing::warn!(seq = packet.sequence_number, "dropped frame: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::PACKET_LEN;
    use posewatch_core::{Classification, Landmark, PoseIndex};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn test_engine() -> InferenceEngine {
        InferenceEngine::new_random(InferenceConfig::default()).unwrap()
    }

    fn synthetic_landmarks() -> LandmarkSet {
        let mut lms = [Landmark::new(0.5, 0.5, 0.9); PoseIndex::COUNT];
        lms[0] = Landmark::new(0.0, 0.0, 0.7);
        lms[12] = Landmark::new(1.0, 1.0, 0.8);
        LandmarkSet::new(lms)
    }

    #[test]
    fn test_end_to_end_frame() {
        let engine = test_engine();
        let config = PipelineConfig::default();
        let pipeline = FramePipeline::new(&engine, &config);

        let report = pipeline.process_frame(&synthetic_landmarks(), Timestamp::from_nanos(42));

        assert!(report.outcome.is_available());
        let scores = report.scores.unwrap();
        match report.outcome {
            ClassificationOutcome::Classified(Classification::Laying) => {
                assert!(scores.laying > scores.other)
            }
            ClassificationOutcome::Classified(Classification::Other) => {
                assert!(scores.laying <= scores.other)
            }
            ClassificationOutcome::Unavailable => panic!("engine was available"),
        }

        for (name, value) in report.angles.named() {
            assert!(
                (0.0..=180.0).contains(&value),
                "{name} out of range: {value}"
            );
        }
    }

    #[test]
    fn test_process_packet_carries_sequence() {
        let engine = test_engine();
        let config = PipelineConfig::default();
        let pipeline = FramePipeline::new(&engine, &config);

        let values: Vec<f32> = (0..PACKET_LEN).map(|i| (i % 7) as f32 / 7.0).collect();
        let packet = LandmarkPacket::new(1_000_000, 9, values);

        let report = pipeline.process_packet(&packet).unwrap();
        assert_eq!(report.sequence_number, Some(9));
        assert_eq!(report.timestamp.as_nanos(), 1_000_000);
    }

    #[test]
    fn test_malformed_packet_is_dropped() {
        let engine = test_engine();
        let config = PipelineConfig::default();
        let pipeline = FramePipeline::new(&engine, &config);

        let packet = LandmarkPacket::new(0, 0, vec![0.1; 10]);
        assert!(pipeline.process_packet(&packet).is_err());
    }

    #[test]
    fn test_stream_processor_callbacks() {
        let engine = test_engine();
        let config = PipelineConfig::default();
        let mut processor = PoseStreamProcessor::new(&engine, &config);

        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();
        processor.on_report(move |_| {
            seen_clone.fetch_add(1, Ordering::SeqCst);
        });

        let values: Vec<f32> = (0..PACKET_LEN).map(|i| (i % 5) as f32 / 5.0).collect();
        processor.process(&LandmarkPacket::new(0, 1, values));
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        // Malformed packet never reaches the callbacks
        processor.process(&LandmarkPacket::new(0, 2, vec![0.0; 3]));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_legacy_parity_changes_tensors_not_angles() {
        let engine = test_engine();
        let legacy = PipelineConfig {
            normalizer: NormalizerOptions {
                legacy_parity: true,
            },
            ..Default::default()
        };
        let corrected = PipelineConfig::default();

        let set = synthetic_landmarks();
        let legacy_report =
            FramePipeline::new(&engine, &legacy).process_frame(&set, Timestamp::from_nanos(0));
        let corrected_report =
            FramePipeline::new(&engine, &corrected).process_frame(&set, Timestamp::from_nanos(0));

        // Angles are independent of the tensor path
        assert_eq!(legacy_report.angles, corrected_report.angles);
    }
}
