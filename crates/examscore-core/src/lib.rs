//! examscore-core: answer scoring and level classification engine.
//!
//! This crate defines the exam data model, the answer normalizer, the five
//! type-specific scorers, per-skill aggregation, CEFR level classification,
//! and the participant score updater that the grading service builds on.

pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod normalizer;
pub mod report;
pub mod scoring;
pub mod traits;
pub mod updater;

pub use engine::{GradingService, ManualScoreReceipt};
pub use error::GradingError;
