// src/lib.rs - Library interface for the reduction pipeline

pub mod constants;
pub mod data_analysis;
pub mod data_input;
pub mod error;
pub mod export;
pub mod results;
pub mod types;

// src/lib.rs
