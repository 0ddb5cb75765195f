//! Developer activity scoring over GitLab and git collector tables.
//!
//! The pipeline merges raw CSV tables into a cleaned, de-duplicated set of
//! processed tables, scores every developer on seven dimensions and combines
//! them into a weighted final score and grade.

pub mod analyzers;
pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod display;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod rules;
pub mod scoring;
pub mod settings;
