//! Dual-input laying classifier network.
//!
//! Mirrors the deployed TorchScript model: two parallel branches consume
//! the range-normalized and centroid-normalized feature tensors, each of
//! shape (1, 14, 3), and a joint head produces the 2-class score vector.

use candle_core::{Module, Result, Tensor};
use candle_nn::{linear, Linear, VarBuilder};

use posewatch_core::{FEATURE_CHANNELS, FEATURE_ROWS};

/// Model hyperparameters
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct LayingNetConfig {
    /// Rows per input tensor
    pub input_rows: usize,
    /// Channels per row
    pub input_channels: usize,
    /// Width of each branch
    pub hidden_dim: usize,
    /// Output classes (laying, other)
    pub n_classes: usize,
}

impl Default for LayingNetConfig {
    fn default() -> Self {
        Self {
            input_rows: FEATURE_ROWS,
            input_channels: FEATURE_CHANNELS,
            hidden_dim: 32,
            n_classes: 2,
        }
    }
}

impl LayingNetConfig {
    /// Flattened per-branch input width
    pub fn input_dim(&self) -> usize {
        self.input_rows * self.input_channels
    }
}

/// Dual-branch linear classifier
pub struct LayingNet {
    range_branch: Linear,
    centroid_branch: Linear,
    head: Linear,
    config: LayingNetConfig,
}

impl LayingNet {
    pub fn new(config: LayingNetConfig, vb: VarBuilder) -> Result<Self> {
        let input_dim = config.input_dim();

        let range_branch = linear(input_dim, config.hidden_dim, vb.pp("range_branch"))?;
        let centroid_branch = linear(input_dim, config.hidden_dim, vb.pp("centroid_branch"))?;
        let head = linear(config.hidden_dim * 2, config.n_classes, vb.pp("head"))?;

        Ok(Self {
            range_branch,
            centroid_branch,
            head,
            config,
        })
    }

    /// Forward pass.
    ///
    /// # Arguments
    /// * `range` - range-normalized tensor [1, rows, channels]
    /// * `centroid` - centroid-normalized tensor [1, rows, channels]
    ///
    /// # Returns
    /// Score vector of shape [n_classes]; index 0 is the laying score.
    /// Input order is positional and fixed by the trained weights.
    pub fn forward(&self, range: &Tensor, centroid: &Tensor) -> Result<Tensor> {
        let a = range.flatten_from(1)?;
        let a = self.range_branch.forward(&a)?.relu()?;

        let b = centroid.flatten_from(1)?;
        let b = self.centroid_branch.forward(&b)?.relu()?;

        let joined = Tensor::cat(&[&a, &b], 1)?;
        self.head.forward(&joined)?.squeeze(0)
    }

    pub fn config(&self) -> &LayingNetConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    #[test]
    fn test_model_creation() -> Result<()> {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);

        let _model = LayingNet::new(LayingNetConfig::default(), vb)?;
        Ok(())
    }

    #[test]
    fn test_forward_output_shape() -> Result<()> {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);

        let config = LayingNetConfig::default();
        let model = LayingNet::new(config, vb)?;

        let range = Tensor::zeros((1, 14, 3), DType::F32, &device)?;
        let centroid = Tensor::zeros((1, 14, 3), DType::F32, &device)?;

        let scores = model.forward(&range, &centroid)?;
        assert_eq!(scores.dims(), &[2]);
        Ok(())
    }
}
