use log::{debug, error, info};
pub mod process;
use process::MonitorRegistry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Upper bound on how long the scheduler sleeps, so interval changes and
/// new processes are picked up promptly.
const MAX_IDLE: Duration = Duration::from_millis(100);

/// Runs a [`MonitorRegistry`] on a background scheduler thread.
///
/// Commands go through [`Monitor::registry`], which takes the same lock the
/// scheduler holds while sampling. Once a command such as
/// `remove_process` returns, no further events for that process are sent.
pub struct Monitor {
    registry: Arc<Mutex<MonitorRegistry>>,
    shutdown: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl Monitor {
    pub fn spawn(registry: MonitorRegistry) -> Self {
        let registry = Arc::new(Mutex::new(registry));
        let shutdown = Arc::new(AtomicBool::new(false));

        let registry_clone = Arc::clone(&registry);
        let shutdown_clone = Arc::clone(&shutdown);
        let worker = thread::Builder::new()
            .name("procpulse-sampler".into())
            .spawn(move || run_scheduler(&registry_clone, &shutdown_clone));

        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(err) => {
                error!("Failed to start sampler thread: {}", err);
                None
            }
        };

        Self {
            registry,
            shutdown,
            worker,
        }
    }

    /// Locks the registry for a command or a read.
    pub fn registry(&self) -> MutexGuard<'_, MonitorRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Stops every sampler and joins the scheduler thread.
    pub fn shutdown(&mut self) {
        if self.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }
        self.registry().stop_all();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Sampler thread panicked");
            }
        }
        info!("Monitor shut down");
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_scheduler(registry: &Mutex<MonitorRegistry>, shutdown: &AtomicBool) {
    debug!("Sampler thread started");
    while !shutdown.load(Ordering::SeqCst) {
        let next_due = {
            let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
            registry.poll(Instant::now());
            registry.next_due()
        };

        let idle = next_due
            .map(|at| at.saturating_duration_since(Instant::now()))
            .unwrap_or(MAX_IDLE)
            .min(MAX_IDLE);
        if !idle.is_zero() {
            thread::sleep(idle);
        }
    }
    debug!("Sampler thread stopped");
}
