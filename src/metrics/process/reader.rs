use super::{ProcessHandle, ProcessSnapshot};
use crate::error::AcquisitionError;
use log::debug;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use sysinfo::{
    CpuRefreshKind, Pid, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, RefreshKind, System,
};

/// Host process introspection.
pub trait ProcessReader: Send + Sync {
    /// Lists live processes. Entries whose name can't be read are skipped.
    fn enumerate(&self) -> Vec<ProcessHandle>;

    /// Reads the current CPU and memory usage of `handle`.
    ///
    /// `cpu_fraction` covers the time since the previous snapshot of the same
    /// process, so the very first call only establishes a baseline.
    fn snapshot(&self, handle: &ProcessHandle) -> Result<ProcessSnapshot, AcquisitionError>;

    /// Number of logical cores on the host, at least 1.
    fn logical_cores(&self) -> usize;

    /// Drops any per-process state kept between snapshots.
    fn release(&self, _pid: Pid) {}
}

/// [`ProcessReader`] backed by `sysinfo`.
///
/// Every watched PID gets its own [`System`], so CPU deltas are always measured
/// against that process's own previous refresh, whatever its sampling interval.
#[derive(Debug)]
pub struct SysinfoReader {
    listing: Mutex<System>,
    watched: Mutex<HashMap<Pid, System>>,
    cores: usize,
}

impl Default for SysinfoReader {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoReader {
    pub fn new() -> Self {
        let system =
            System::new_with_specifics(RefreshKind::nothing().with_cpu(CpuRefreshKind::nothing()));
        let cores = match system.cpus().len() {
            0 => std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
            n => n,
        };
        debug!("Detected {} logical cores", cores);

        Self {
            listing: Mutex::new(System::new()),
            watched: Mutex::new(HashMap::new()),
            cores,
        }
    }
}

/// Sorted, deduplicated names of live processes, for pickers.
pub fn process_names(reader: &dyn ProcessReader) -> Vec<String> {
    let mut names: Vec<_> = reader.enumerate().into_iter().map(|p| p.name).collect();
    names.sort();
    names.dedup();
    names
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ProcessReader for SysinfoReader {
    fn enumerate(&self) -> Vec<ProcessHandle> {
        let mut system = lock(&self.listing);
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing(),
        );
        system
            .processes()
            .values()
            .filter_map(|p| {
                let name = p.name().to_string_lossy().into_owned();
                (!name.is_empty()).then(|| ProcessHandle {
                    pid: p.pid(),
                    name,
                    start_time: p.start_time(),
                })
            })
            .collect()
    }

    fn snapshot(&self, handle: &ProcessHandle) -> Result<ProcessSnapshot, AcquisitionError> {
        let mut watched = lock(&self.watched);
        let system = watched.entry(handle.pid).or_insert_with(System::new);
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[handle.pid]),
            true,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );

        let Some(process) = system.process(handle.pid) else {
            return Ok(ProcessSnapshot::default());
        };
        let recycled = handle.start_time != 0 && process.start_time() != handle.start_time;
        let defunct = matches!(process.status(), ProcessStatus::Zombie | ProcessStatus::Dead);
        if recycled || defunct {
            return Ok(ProcessSnapshot::default());
        }

        let rss_bytes = process.memory();
        let shared_bytes = shared_memory(handle.pid, rss_bytes)?;

        Ok(ProcessSnapshot {
            running: true,
            cpu_fraction: f64::from(process.cpu_usage()),
            rss_bytes,
            shared_bytes,
        })
    }

    fn logical_cores(&self) -> usize {
        self.cores
    }

    fn release(&self, pid: Pid) {
        lock(&self.watched).remove(&pid);
    }
}

/// Resident memory backed by shared pages, scaled from `/proc/<pid>/statm`
/// page counts so the page size never matters.
#[cfg(target_os = "linux")]
fn shared_memory(pid: Pid, rss_bytes: u64) -> Result<u64, AcquisitionError> {
    use std::io::ErrorKind;

    let statm = std::fs::read_to_string(format!("/proc/{}/statm", pid)).map_err(|err| {
        match err.kind() {
            ErrorKind::NotFound => AcquisitionError::NotFound(pid),
            ErrorKind::PermissionDenied => AcquisitionError::AccessDenied(pid),
            _ => AcquisitionError::Unknown(err.to_string()),
        }
    })?;

    let mut fields = statm.split_whitespace().skip(1).map(str::parse::<u64>);
    match (fields.next(), fields.next()) {
        (Some(Ok(resident)), Some(Ok(shared))) if resident > 0 => {
            Ok(rss_bytes.saturating_mul(shared.min(resident)) / resident)
        }
        (Some(Ok(_)), Some(Ok(_))) => Ok(0),
        _ => Err(AcquisitionError::Unknown(format!(
            "malformed statm for process {}: {:?}",
            pid,
            statm.trim()
        ))),
    }
}

#[cfg(not(target_os = "linux"))]
fn shared_memory(_pid: Pid, _rss_bytes: u64) -> Result<u64, AcquisitionError> {
    Ok(0)
}
