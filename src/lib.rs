pub mod analyzers;
pub mod batch;
pub mod chart;
pub mod config;
pub mod error;
pub mod fetch;
pub mod infra;
pub mod output;
pub mod parser;
pub mod reading;
pub mod services;
pub mod stats;
