mod history;
mod reader;
mod registry;
mod sampler;

pub use history::*;
pub use reader::*;
pub use registry::*;
pub use sampler::*;

use std::fmt;
use std::time::Instant;

use sysinfo::Pid;

/// A process as it was found in the host process table.
///
/// Only valid for the lifetime of the process it was acquired from. PIDs are
/// recycled by the OS, so `start_time` is what tells two owners apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProcessHandle {
    pub pid: Pid,
    pub name: String,
    /// Seconds since the epoch as reported by the OS, 0 when unknown
    pub start_time: u64,
}

impl ProcessHandle {
    pub fn new(pid: Pid, name: impl Into<String>) -> Self {
        Self {
            pid,
            name: name.into(),
            start_time: 0,
        }
    }
}

impl fmt::Display for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.pid)
    }
}

/// Instantaneous reading for one process.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProcessSnapshot {
    pub running: bool,
    /// Percent of one logical core since the previous read, summed over cores
    pub cpu_fraction: f64,
    pub rss_bytes: u64,
    pub shared_bytes: u64,
}

/// One normalized measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub pid: Pid,
    pub timestamp: Instant,
    /// Percent of total machine capacity
    pub cpu_value: f64,
    pub memory_mb: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
pub enum MetricType {
    Cpu,
    Memory,
}

impl Default for MetricType {
    fn default() -> Self {
        Self::Cpu
    }
}

/// Lifecycle of a monitored process as seen by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Active,
    Terminated,
    Errored,
}

impl MonitorState {
    pub fn is_active(&self) -> bool {
        matches!(self, MonitorState::Active)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleEvent {
    pub pid: Pid,
    pub elapsed_seconds: f64,
    pub cpu_value: f64,
    pub ram_value: f64,
}

/// Everything the registry publishes to its subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    Sample(SampleEvent),
    Terminated { pid: Pid },
    Errored { pid: Pid, message: String },
}

impl MonitorEvent {
    pub fn pid(&self) -> Pid {
        match self {
            MonitorEvent::Sample(sample) => sample.pid,
            MonitorEvent::Terminated { pid } | MonitorEvent::Errored { pid, .. } => *pid,
        }
    }
}
