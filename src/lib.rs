// src/lib.rs

pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod persistence;

pub use crate::core::engine::SelectorPredictor;
pub use crate::core::selection::{PredictRequest, SelectionState};
pub use crate::core::types::{Bucket, PredictionResult};
