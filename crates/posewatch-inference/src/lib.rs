//! # Posewatch-Inference
//!
//! The neural half of the Posewatch pipeline: the dual-input laying
//! classifier (candle), the inference engine that feeds it, the upstream
//! landmark packet boundary, and the per-frame processing pipeline.

pub mod engine;
pub mod model;
pub mod packet;
pub mod pipeline;

pub use engine::{DeviceType, InferenceConfig, InferenceEngine};
pub use model::{LayingNet, LayingNetConfig};
pub use packet::LandmarkPacket;
pub use pipeline::{FramePipeline, FrameReport, PipelineConfig, PoseStreamProcessor};
