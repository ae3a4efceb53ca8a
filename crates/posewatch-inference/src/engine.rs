//! Inference engine wrapping the laying classifier.
//!
//! Owns the device and the loaded model. Created once at startup and
//! passed by reference into the pipeline; there is no ambient global
//! model state.

use std::path::Path;

use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use serde::{Deserialize, Serialize};

use posewatch_core::{ClassificationScores, Error, FlatTensor, Result};

use crate::model::{LayingNet, LayingNetConfig};

/// Inference engine configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Model hyperparameters
    pub model: LayingNetConfig,
    /// Device to run inference on
    pub device: DeviceType,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum DeviceType {
    Cpu,
    Cuda(usize),
    Metal,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            model: LayingNetConfig::default(),
            device: DeviceType::Cpu,
        }
    }
}

/// Synchronous per-frame inference engine
pub struct InferenceEngine {
    model: LayingNet,
    device: Device,
    config: InferenceConfig,
}

impl InferenceEngine {
    /// Create a new engine with random weights (for testing)
    pub fn new_random(config: InferenceConfig) -> Result<Self> {
        let device = Self::get_device(config.device)?;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);

        let model = LayingNet::new(config.model, vb)
            .map_err(|e| Error::ModelLoad(e.to_string()))?;

        Ok(Self {
            model,
            device,
            config,
        })
    }

    /// Load model weights from a safetensors checkpoint
    pub fn load<P: AsRef<Path>>(path: P, config: InferenceConfig) -> Result<Self> {
        let device = Self::get_device(config.device)?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[path.as_ref()], DType::F32, &device)
                .map_err(|e| Error::ModelLoad(e.to_string()))?
        };

        let model = LayingNet::new(config.model, vb)
            .map_err(|e| Error::ModelLoad(e.to_string()))?;

        Ok(Self {
            model,
            device,
            config,
        })
    }

    fn get_device(device_type: DeviceType) -> Result<Device> {
        match device_type {
            DeviceType::Cpu => Ok(Device::Cpu),
            DeviceType::Cuda(ordinal) => {
                Device::new_cuda(ordinal).map_err(|e| Error::ModelLoad(e.to_string()))
            }
            DeviceType::Metal => {
                Device::new_metal(0).map_err(|e| Error::ModelLoad(e.to_string()))
            }
        }
    }

    /// Run the dual-input model on one frame's feature tensors.
    ///
    /// Tensor order is positional: range-normalized first, then
    /// centroid-normalized.
    pub fn classify(
        &self,
        range: &FlatTensor,
        centroid: &FlatTensor,
    ) -> Result<ClassificationScores> {
        let scores = self
            .run_model(range, centroid)
            .map_err(|e| Error::Inference(e.to_string()))?;

        if scores.len() != 2 {
            return Err(Error::Inference(format!(
                "expected 2 output scores, got {}",
                scores.len()
            )));
        }

        Ok(ClassificationScores::new(scores[0], scores[1]))
    }

    fn run_model(
        &self,
        range: &FlatTensor,
        centroid: &FlatTensor,
    ) -> candle_core::Result<Vec<f32>> {
        let range_t = Tensor::from_slice(range.as_slice(), FlatTensor::SHAPE, &self.device)?;
        let centroid_t =
            Tensor::from_slice(centroid.as_slice(), FlatTensor::SHAPE, &self.device)?;

        let output = self.model.forward(&range_t, &centroid_t)?;
        output.to_vec1::<f32>()
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }
}
