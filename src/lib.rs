#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod components;
pub mod config;
pub mod error;
pub mod metrics;
pub use app::ProcessMonitorApp;
pub use error::{AcquisitionError, MonitorError};
pub use metrics::Monitor;
