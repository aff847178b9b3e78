use procpulse::metrics::process::{ProcessHandle, ProcessReader, ProcessSnapshot};
use procpulse::AcquisitionError;
use std::collections::HashMap;
use std::sync::Mutex;
use sysinfo::Pid;

/// Reports a fixed reading for every process until it is killed.
pub struct SteadyReader {
    cores: usize,
    processes: Mutex<HashMap<Pid, (String, ProcessSnapshot)>>,
}

impl SteadyReader {
    pub fn new(cores: usize) -> Self {
        Self {
            cores,
            processes: Mutex::new(HashMap::new()),
        }
    }

    pub fn spawn(&self, pid: u32, name: &str, cpu_fraction: f64, rss_bytes: u64) -> ProcessHandle {
        let pid = Pid::from_u32(pid);
        let snapshot = ProcessSnapshot {
            running: true,
            cpu_fraction,
            rss_bytes,
            shared_bytes: 0,
        };
        self.processes
            .lock()
            .unwrap()
            .insert(pid, (name.to_string(), snapshot));
        ProcessHandle::new(pid, name)
    }

    pub fn kill(&self, pid: u32) {
        self.processes.lock().unwrap().remove(&Pid::from_u32(pid));
    }
}

impl ProcessReader for SteadyReader {
    fn enumerate(&self) -> Vec<ProcessHandle> {
        self.processes
            .lock()
            .unwrap()
            .iter()
            .map(|(pid, (name, _))| ProcessHandle::new(*pid, name.clone()))
            .collect()
    }

    fn snapshot(&self, handle: &ProcessHandle) -> Result<ProcessSnapshot, AcquisitionError> {
        Ok(self
            .processes
            .lock()
            .unwrap()
            .get(&handle.pid)
            .map(|(_, snapshot)| *snapshot)
            .unwrap_or_default())
    }

    fn logical_cores(&self) -> usize {
        self.cores
    }
}
