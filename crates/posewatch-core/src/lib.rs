//! # Posewatch-Core
//!
//! Core types and pure computations for the Posewatch activity
//! classification system: landmark data model, feature extraction
//! (skeleton subset selection and the two normalization strategies),
//! and diagnostic joint-angle geometry.
//!
//! Everything in this crate is side-effect free; inference invocation
//! and frame I/O live in `posewatch-inference`.

pub mod angles;
pub mod error;
pub mod features;
pub mod types;

pub use angles::*;
pub use error::{Error, Result};
pub use features::*;
pub use types::*;
