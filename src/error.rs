use sysinfo::Pid;
use thiserror::Error;

/// Failure of a single read against the host process table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionError {
    #[error("process {0} no longer exists")]
    NotFound(Pid),

    #[error("access to process {0} was denied")]
    AccessDenied(Pid),

    #[error("unexpected error while reading process data: {0}")]
    Unknown(String),
}

/// Errors returned synchronously by registry commands. None of them change
/// registry state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MonitorError {
    #[error("process {name} (PID {pid}) is already being monitored")]
    AlreadyMonitored { pid: Pid, name: String },

    #[error("could not start monitoring {name} (PID {pid}): {source}")]
    Initialization {
        pid: Pid,
        name: String,
        #[source]
        source: AcquisitionError,
    },

    #[error("no running process matching '{0}' that isn't already monitored")]
    ProcessNotFound(String),

    #[error("process name cannot be empty")]
    EmptyProcessName,

    #[error("update interval {0} ms is outside 1000..=300000 ms")]
    InvalidInterval(u64),

    #[error("display window {0} s is outside 10..=3600000 s")]
    InvalidDisplayWindow(u64),

    #[error("process {0} is not monitored")]
    UnknownProcess(Pid),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
