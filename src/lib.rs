pub mod config;
pub mod data;
pub mod error;
pub mod loader;
pub mod logging;
pub mod metrics;
pub mod records;
pub mod report;
pub mod source;
pub mod units;
