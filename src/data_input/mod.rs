// src/data_input/mod.rs

pub mod log_parser;
pub mod run_config;
pub mod run_data;

// src/data_input/mod.rs
