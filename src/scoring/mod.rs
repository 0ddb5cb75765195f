//! Score Aggregation
//!
//! Combines the per-dimension scores into a single weighted score and grade.

pub mod aggregator;
pub mod grade;

pub use aggregator::{grade_distribution, ScoreAggregator, ScoreSheet};
pub use grade::Grade;
