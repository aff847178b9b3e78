use super::{ProcessHandle, ProcessReader, Sample};
use crate::error::AcquisitionError;
use log::{debug, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};
use sysinfo::Pid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    Initializing,
    Active,
    /// Stopped on request while the process was still alive
    Stopped,
    Terminated,
    Errored,
}

/// What a single tick produced.
#[derive(Debug, Clone, PartialEq)]
pub enum SamplerEvent {
    Sample(Sample),
    Terminated,
    /// `stopped` tells whether the sampler gave up on the process.
    Errored { message: String, stopped: bool },
}

/// Scales a per-core CPU percentage to a share of the whole machine.
pub fn normalize_cpu(cpu_fraction: f64, cores: usize) -> f64 {
    cpu_fraction / cores.max(1) as f64
}

/// Unique set size in decimal megabytes.
pub fn memory_mb(rss_bytes: u64, shared_bytes: u64) -> f64 {
    rss_bytes.saturating_sub(shared_bytes) as f64 / 1_000_000.0
}

/// Polls one process at a fixed period and classifies each outcome.
///
/// The sampler owns no thread. Whoever drives it asks [`Sampler::is_due`]
/// and calls [`Sampler::on_tick`]; once the process is gone or unreadable
/// the sampler never fires again.
pub struct Sampler {
    handle: ProcessHandle,
    reader: Arc<dyn ProcessReader>,
    state: SamplerState,
    interval: Duration,
    last_fire: Option<Instant>,
    next_fire: Option<Instant>,
    cores: usize,
}

impl Sampler {
    pub fn new(handle: ProcessHandle, reader: Arc<dyn ProcessReader>) -> Self {
        let cores = reader.logical_cores().max(1);
        Self {
            handle,
            reader,
            state: SamplerState::Initializing,
            interval: Duration::ZERO,
            last_fire: None,
            next_fire: None,
            cores,
        }
    }

    pub fn pid(&self) -> Pid {
        self.handle.pid
    }

    pub fn handle(&self) -> &ProcessHandle {
        &self.handle
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SamplerState::Active
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn next_fire(&self) -> Option<Instant> {
        self.next_fire
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.next_fire.is_some_and(|at| at <= now)
    }

    /// Takes the baseline CPU reading and arms the timer.
    ///
    /// On failure the sampler is left `Errored` with no timer.
    pub fn start(&mut self, interval: Duration, now: Instant) -> Result<(), AcquisitionError> {
        if self.state != SamplerState::Initializing {
            return Ok(());
        }

        let baseline = self
            .reader
            .snapshot(&self.handle)
            .and_then(|snapshot| {
                if snapshot.running {
                    Ok(snapshot)
                } else {
                    Err(AcquisitionError::NotFound(self.handle.pid))
                }
            });

        if let Err(err) = baseline {
            self.state = SamplerState::Errored;
            return Err(err);
        }

        self.state = SamplerState::Active;
        self.interval = interval;
        self.last_fire = Some(now);
        self.next_fire = Some(now + interval);
        debug!("Sampler for {} armed every {:?}", self.handle, interval);
        Ok(())
    }

    /// Fires once. Returns `None` when the sampler is no longer active.
    pub fn on_tick(&mut self, now: Instant) -> Option<SamplerEvent> {
        if !self.is_active() {
            return None;
        }

        self.last_fire = Some(now);
        self.next_fire = Some(now + self.interval);

        let snapshot = match self.reader.snapshot(&self.handle) {
            Ok(snapshot) => snapshot,
            Err(AcquisitionError::NotFound(_)) => {
                self.finish(SamplerState::Terminated);
                return Some(SamplerEvent::Terminated);
            }
            Err(err @ AcquisitionError::AccessDenied(_)) => {
                self.finish(SamplerState::Errored);
                return Some(SamplerEvent::Errored {
                    message: err.to_string(),
                    stopped: true,
                });
            }
            Err(err @ AcquisitionError::Unknown(_)) => {
                // Unrecognized failures are reported but the process stays polled.
                warn!("Transient read failure for {}: {}", self.handle, err);
                return Some(SamplerEvent::Errored {
                    message: err.to_string(),
                    stopped: false,
                });
            }
        };

        if !snapshot.running {
            self.finish(SamplerState::Terminated);
            return Some(SamplerEvent::Terminated);
        }

        Some(SamplerEvent::Sample(Sample {
            pid: self.handle.pid,
            timestamp: now,
            cpu_value: normalize_cpu(snapshot.cpu_fraction, self.cores),
            memory_mb: memory_mb(snapshot.rss_bytes, snapshot.shared_bytes),
        }))
    }

    /// Changes the period. The pending fire is moved to `last fire + interval`.
    /// Ignored unless the sampler is active.
    pub fn set_interval(&mut self, interval: Duration) {
        if !self.is_active() {
            return;
        }
        self.interval = interval;
        self.next_fire = self.last_fire.map(|last| last + interval);
    }

    /// Cancels the timer. Calling it again, or on a finished sampler, does nothing.
    pub fn stop(&mut self) {
        self.next_fire = None;
        if matches!(self.state, SamplerState::Initializing | SamplerState::Active) {
            self.state = SamplerState::Stopped;
        }
    }

    fn finish(&mut self, state: SamplerState) {
        self.stop();
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::process::testing::ScriptedReader;

    const INTERVAL: Duration = Duration::from_millis(2000);

    fn started(reader: &Arc<ScriptedReader>, pid: u32, now: Instant) -> Sampler {
        let handle = reader.add_process(pid, "worker");
        reader.push_running(pid, 0.0, 0, 0);
        let mut sampler = Sampler::new(handle, reader.clone());
        sampler.start(INTERVAL, now).unwrap();
        sampler
    }

    fn sample_of(event: Option<SamplerEvent>) -> Sample {
        match event {
            Some(SamplerEvent::Sample(sample)) => sample,
            other => panic!("expected a sample, got {:?}", other),
        }
    }

    #[test]
    fn normalizes_by_core_count() {
        for cores in [1, 2, 4, 8, 16] {
            let raw = 100.0 * cores as f64;
            assert_eq!(normalize_cpu(raw, cores), 100.0);
            assert_eq!(normalize_cpu(0.0, cores), 0.0);
        }
        assert_eq!(normalize_cpu(400.0, 4), 100.0);
        assert_eq!(normalize_cpu(50.0, 2), 25.0);
        assert_eq!(normalize_cpu(50.0, 0), 50.0);
    }

    #[test]
    fn memory_excludes_shared_pages() {
        assert_eq!(memory_mb(12_000_000, 2_000_000), 10.0);
        assert_eq!(memory_mb(1_000_000, 5_000_000), 0.0);
    }

    #[test]
    fn start_discards_warm_up_reading() {
        let reader = Arc::new(ScriptedReader::new(4));
        let now = Instant::now();
        let mut sampler = started(&reader, 7, now);
        assert_eq!(sampler.state(), SamplerState::Active);
        assert_eq!(sampler.next_fire(), Some(now + INTERVAL));
        assert!(!sampler.is_due(now));

        reader.push_running(7, 400.0, 3_000_000, 1_000_000);
        let sample = sample_of(sampler.on_tick(now + INTERVAL));
        assert_eq!(sample.cpu_value, 100.0);
        assert_eq!(sample.memory_mb, 2.0);
        assert_eq!(reader.pending(7), 0);
    }

    #[test]
    fn failed_start_never_arms_timer() {
        let reader = Arc::new(ScriptedReader::new(1));
        let handle = reader.add_process(9, "locked");
        reader.push(9, Err(AcquisitionError::AccessDenied(handle.pid)));

        let mut sampler = Sampler::new(handle.clone(), reader.clone());
        let now = Instant::now();
        assert_eq!(
            sampler.start(INTERVAL, now),
            Err(AcquisitionError::AccessDenied(handle.pid))
        );
        assert_eq!(sampler.state(), SamplerState::Errored);
        assert_eq!(sampler.next_fire(), None);
        assert_eq!(sampler.on_tick(now + INTERVAL), None);
    }

    #[test]
    fn exited_process_fails_start() {
        let reader = Arc::new(ScriptedReader::new(1));
        let handle = reader.add_process(11, "gone");
        reader.push_exited(11);

        let mut sampler = Sampler::new(handle.clone(), reader);
        assert_eq!(
            sampler.start(INTERVAL, Instant::now()),
            Err(AcquisitionError::NotFound(handle.pid))
        );
    }

    #[test]
    fn termination_is_reported_once() {
        let reader = Arc::new(ScriptedReader::new(2));
        let now = Instant::now();
        let mut sampler = started(&reader, 5, now);

        reader.push_exited(5);
        assert_eq!(sampler.on_tick(now + INTERVAL), Some(SamplerEvent::Terminated));
        assert_eq!(sampler.state(), SamplerState::Terminated);
        assert_eq!(sampler.next_fire(), None);

        reader.push_running(5, 10.0, 0, 0);
        assert_eq!(sampler.on_tick(now + INTERVAL * 2), None);
        assert_eq!(reader.pending(5), 1);

        sampler.set_interval(Duration::from_secs(5));
        assert_eq!(sampler.interval(), INTERVAL);
        assert_eq!(sampler.next_fire(), None);
        assert_eq!(sampler.state(), SamplerState::Terminated);
    }

    #[test]
    fn not_found_error_terminates() {
        let reader = Arc::new(ScriptedReader::new(2));
        let now = Instant::now();
        let mut sampler = started(&reader, 6, now);

        // nothing queued reads as NotFound
        assert_eq!(sampler.on_tick(now + INTERVAL), Some(SamplerEvent::Terminated));
        assert_eq!(sampler.state(), SamplerState::Terminated);
    }

    #[test]
    fn access_denied_stops_polling() {
        let reader = Arc::new(ScriptedReader::new(2));
        let now = Instant::now();
        let mut sampler = started(&reader, 8, now);

        reader.push(8, Err(AcquisitionError::AccessDenied(sampler.pid())));
        match sampler.on_tick(now + INTERVAL) {
            Some(SamplerEvent::Errored { stopped, .. }) => assert!(stopped),
            other => panic!("expected an error, got {:?}", other),
        }
        assert_eq!(sampler.state(), SamplerState::Errored);
        assert!(!sampler.is_due(now + INTERVAL * 10));
    }

    #[test]
    fn unknown_error_keeps_polling() {
        let reader = Arc::new(ScriptedReader::new(2));
        let now = Instant::now();
        let mut sampler = started(&reader, 10, now);

        reader.push(10, Err(AcquisitionError::Unknown("flaky".into())));
        reader.push_running(10, 20.0, 1_000_000, 0);

        match sampler.on_tick(now + INTERVAL) {
            Some(SamplerEvent::Errored { message, stopped }) => {
                assert!(!stopped);
                assert!(message.contains("flaky"));
            }
            other => panic!("expected an error, got {:?}", other),
        }
        assert!(sampler.is_active());
        assert!(sampler.is_due(now + INTERVAL * 2));

        let sample = sample_of(sampler.on_tick(now + INTERVAL * 2));
        assert_eq!(sample.cpu_value, 10.0);
    }

    #[test]
    fn stop_is_idempotent_and_silences_ticks() {
        let reader = Arc::new(ScriptedReader::new(1));
        let now = Instant::now();
        let mut sampler = started(&reader, 12, now);

        reader.push_running(12, 5.0, 0, 0);
        sampler.stop();
        sampler.stop();
        assert_eq!(sampler.state(), SamplerState::Stopped);
        assert!(!sampler.is_due(now + INTERVAL));
        assert_eq!(sampler.on_tick(now + INTERVAL), None);
        assert_eq!(reader.pending(12), 1);
    }

    #[test]
    fn set_interval_reschedules_pending_fire() {
        let reader = Arc::new(ScriptedReader::new(1));
        let now = Instant::now();
        let mut sampler = started(&reader, 13, now);

        sampler.set_interval(Duration::from_millis(5000));
        assert_eq!(sampler.next_fire(), Some(now + Duration::from_millis(5000)));
        assert!(!sampler.is_due(now + INTERVAL));

        sampler.set_interval(Duration::from_millis(1000));
        assert!(sampler.is_due(now + Duration::from_millis(1000)));
    }
}
