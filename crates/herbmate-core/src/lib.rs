//! herbmate-core: Core types for the herbmate inference service
//!
//! This crate provides the fundamental types shared by every herbmate crate:
//! - Service configuration
//! - Error taxonomy for artifact resolution and prediction requests
//! - Input tensor and prediction result types

pub mod config;
pub mod error;
pub mod tensor;

pub use config::*;
pub use error::*;
pub use tensor::*;
