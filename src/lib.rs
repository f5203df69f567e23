pub mod analyze;
pub mod cli;
pub mod config;
pub mod constants;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod notify;
pub mod provider;
pub mod report;
pub mod series;
pub mod validate;
