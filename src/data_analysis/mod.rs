// src/data_analysis/mod.rs

pub mod calibration;
pub mod channel_stats;
pub mod flow_rate;
pub mod peak_detection;
pub mod shaft_speed;

// src/data_analysis/mod.rs
