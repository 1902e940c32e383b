//! Migration traffic rate (MTR) from weather-radar vertical profile time series.

pub mod config;
pub mod fetch;
pub mod group;
pub mod mtr;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod profile;
pub mod render;
pub mod stats;
