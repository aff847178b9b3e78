use super::{
    MetricType, MonitorEvent, MonitorState, ProcessHandle, ProcessReader, SampleEvent, Sampler,
    SamplerEvent, SeriesStore, WindowedView,
};
use crate::config::{validate_display_window, validate_interval, MonitorConfig};
use crate::error::{MonitorError, Result};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};
use sysinfo::Pid;

/// One monitored process and everything recorded about it.
pub struct MonitorEntry {
    pub pid: Pid,
    pub process_name: String,
    pub state: MonitorState,
    pub start_time: Instant,
    /// `None` shows the whole history
    pub display_window_secs: Option<u64>,
    pub last_error: Option<String>,
    sampler: Sampler,
    series: SeriesStore,
    seq: u64,
}

impl MonitorEntry {
    pub fn series(&self) -> &SeriesStore {
        &self.series
    }

    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }

    pub fn windowed_view(&self) -> WindowedView<'_> {
        self.series
            .windowed_view(self.display_window_secs.map(|secs| secs as f64))
    }

    pub fn average(&self, metric: MetricType) -> f64 {
        self.series.running_average(metric)
    }

    /// Folds one sampler outcome into the entry and returns the event to publish.
    fn apply(&mut self, outcome: SamplerEvent) -> MonitorEvent {
        match outcome {
            SamplerEvent::Sample(sample) => {
                let elapsed_seconds = sample
                    .timestamp
                    .saturating_duration_since(self.start_time)
                    .as_secs_f64();
                self.series
                    .append(elapsed_seconds, sample.cpu_value, sample.memory_mb);
                debug!(
                    "PID {}: t={:.1}s cpu={:.2}% ram={:.2}MB",
                    self.pid, elapsed_seconds, sample.cpu_value, sample.memory_mb
                );
                MonitorEvent::Sample(SampleEvent {
                    pid: self.pid,
                    elapsed_seconds,
                    cpu_value: sample.cpu_value,
                    ram_value: sample.memory_mb,
                })
            }
            SamplerEvent::Terminated => {
                warn!("Process {} (PID {}) terminated", self.process_name, self.pid);
                self.state = MonitorState::Terminated;
                MonitorEvent::Terminated { pid: self.pid }
            }
            SamplerEvent::Errored { message, stopped } => {
                warn!("Error monitoring PID {}: {}", self.pid, message);
                if stopped {
                    self.state = MonitorState::Errored;
                }
                self.last_error = Some(message.clone());
                MonitorEvent::Errored {
                    pid: self.pid,
                    message,
                }
            }
        }
    }
}

/// The set of monitored processes.
///
/// Owns every [`Sampler`] and its history, pushes the shared interval to
/// them and publishes their outcomes to subscribers.
pub struct MonitorRegistry {
    reader: Arc<dyn ProcessReader>,
    entries: HashMap<Pid, MonitorEntry>,
    global_interval_ms: u64,
    default_display_window: Option<u64>,
    subscribers: Vec<Sender<MonitorEvent>>,
    next_seq: u64,
}

impl MonitorRegistry {
    pub fn new(reader: Arc<dyn ProcessReader>, config: MonitorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            global_interval_ms: config.update_interval_ms,
            default_display_window: config.display_window_secs,
            ..Self::with_defaults(reader)
        })
    }

    /// Registry with the default configuration, which is always valid.
    pub fn with_defaults(reader: Arc<dyn ProcessReader>) -> Self {
        let config = MonitorConfig::default();
        Self {
            reader,
            entries: HashMap::new(),
            global_interval_ms: config.update_interval_ms,
            default_display_window: config.display_window_secs,
            subscribers: Vec::new(),
            next_seq: 0,
        }
    }

    pub fn reader(&self) -> &Arc<dyn ProcessReader> {
        &self.reader
    }

    pub fn global_interval_ms(&self) -> u64 {
        self.global_interval_ms
    }

    fn interval(&self) -> Duration {
        Duration::from_millis(self.global_interval_ms)
    }

    /// Registers a new consumer of [`MonitorEvent`]s.
    pub fn subscribe(&mut self) -> Receiver<MonitorEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    fn publish(&mut self, events: Vec<MonitorEvent>) {
        if events.is_empty() {
            return;
        }
        self.subscribers
            .retain(|tx| events.iter().all(|event| tx.send(event.clone()).is_ok()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.entries.contains_key(&pid)
    }

    pub fn entry(&self, pid: Pid) -> Option<&MonitorEntry> {
        self.entries.get(&pid)
    }

    /// Monitored PIDs in the order they were added. Tab strips and other
    /// positional views are rebuilt from this after every add or remove.
    pub fn pids(&self) -> Vec<Pid> {
        let mut entries: Vec<_> = self.entries.values().map(|e| (e.seq, e.pid)).collect();
        entries.sort_unstable();
        entries.into_iter().map(|(_, pid)| pid).collect()
    }

    /// First live process whose name contains `name`, ignoring case and
    /// skipping processes already monitored. Which one wins among several
    /// matches depends on the host's enumeration order.
    pub fn resolve_by_name(&self, name: &str) -> Option<ProcessHandle> {
        let needle = name.to_lowercase();
        self.reader
            .enumerate()
            .into_iter()
            .find(|p| !self.entries.contains_key(&p.pid) && p.name.to_lowercase().contains(&needle))
    }

    /// Monitored process whose name contains `name`, ignoring case.
    pub fn find_monitored_by_name(&self, name: &str) -> Option<Pid> {
        let needle = name.to_lowercase();
        self.pids().into_iter().find(|pid| {
            self.entries
                .get(pid)
                .is_some_and(|e| e.process_name.to_lowercase().contains(&needle))
        })
    }

    /// Resolves `name` and starts monitoring the first match.
    pub fn add_by_name(&mut self, name: &str) -> Result<Pid> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MonitorError::EmptyProcessName);
        }

        match self.resolve_by_name(name) {
            Some(handle) => self.add_process(handle),
            None => match self.find_monitored_by_name(name) {
                Some(pid) => Err(MonitorError::AlreadyMonitored {
                    pid,
                    name: self.entries[&pid].process_name.clone(),
                }),
                None => Err(MonitorError::ProcessNotFound(name.to_string())),
            },
        }
    }

    pub fn add_process(&mut self, handle: ProcessHandle) -> Result<Pid> {
        self.add_process_at(handle, Instant::now())
    }

    /// Starts monitoring `handle`, counting elapsed time from `now`.
    ///
    /// Nothing is registered if the process can't be read right away.
    pub fn add_process_at(&mut self, handle: ProcessHandle, now: Instant) -> Result<Pid> {
        let pid = handle.pid;
        if let Some(existing) = self.entries.get(&pid) {
            return Err(MonitorError::AlreadyMonitored {
                pid,
                name: existing.process_name.clone(),
            });
        }

        let mut sampler = Sampler::new(handle.clone(), Arc::clone(&self.reader));
        if let Err(source) = sampler.start(self.interval(), now) {
            warn!("Could not start monitoring {}: {}", handle, source);
            self.reader.release(pid);
            return Err(MonitorError::Initialization {
                pid,
                name: handle.name,
                source,
            });
        }

        info!("Monitoring {} every {} ms", handle, self.global_interval_ms);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(
            pid,
            MonitorEntry {
                pid,
                process_name: handle.name,
                state: MonitorState::Active,
                start_time: now,
                display_window_secs: self.default_display_window,
                last_error: None,
                sampler,
                series: SeriesStore::new(),
                seq,
            },
        );
        Ok(pid)
    }

    /// Stops and forgets `pid`. Unknown PIDs are ignored.
    pub fn remove_process(&mut self, pid: Pid) -> bool {
        let Some(mut entry) = self.entries.remove(&pid) else {
            return false;
        };
        entry.sampler.stop();
        self.reader.release(pid);
        info!("Stopped monitoring {} (PID {})", entry.process_name, pid);
        true
    }

    /// Applies a new sampling interval to every active process.
    pub fn set_global_interval(&mut self, interval_ms: u64) -> Result<()> {
        validate_interval(interval_ms)?;
        self.global_interval_ms = interval_ms;
        let interval = self.interval();
        for entry in self.entries.values_mut() {
            if entry.state.is_active() {
                entry.sampler.set_interval(interval);
            }
        }
        info!("Update interval set to {} ms", interval_ms);
        Ok(())
    }

    pub fn set_display_window(&mut self, pid: Pid, seconds: u64) -> Result<()> {
        validate_display_window(seconds)?;
        let entry = self
            .entries
            .get_mut(&pid)
            .ok_or(MonitorError::UnknownProcess(pid))?;
        entry.display_window_secs = Some(seconds);
        Ok(())
    }

    /// Shows the whole history of `pid` again.
    pub fn clear_display_window(&mut self, pid: Pid) -> Result<()> {
        let entry = self
            .entries
            .get_mut(&pid)
            .ok_or(MonitorError::UnknownProcess(pid))?;
        entry.display_window_secs = None;
        Ok(())
    }

    /// Fires every sampler that is due at `now` and publishes the results.
    /// Returns the number of events produced.
    pub fn poll(&mut self, now: Instant) -> usize {
        let mut due: Vec<_> = self
            .entries
            .values()
            .filter(|e| e.sampler.is_due(now))
            .filter_map(|e| e.sampler.next_fire().map(|at| (at, e.pid)))
            .collect();
        due.sort_unstable();

        let mut events = Vec::with_capacity(due.len());
        for (_, pid) in due {
            if let Some(entry) = self.entries.get_mut(&pid) {
                if let Some(outcome) = entry.sampler.on_tick(now) {
                    events.push(entry.apply(outcome));
                }
            }
        }

        let produced = events.len();
        self.publish(events);
        produced
    }

    /// Earliest pending fire time across all samplers.
    pub fn next_due(&self) -> Option<Instant> {
        self.entries
            .values()
            .filter_map(|e| e.sampler.next_fire())
            .min()
    }

    /// Stops every sampler. Entries stay so their history remains readable.
    pub fn stop_all(&mut self) {
        for entry in self.entries.values_mut() {
            entry.sampler.stop();
        }
        info!("Stopped all {} monitors", self.entries.len());
    }
}
