//! Background keepalive supervisor.
//!
//! The display blanks itself when it stops hearing from the host, so a
//! dedicated thread sends a keepalive every interval for the life of the
//! process.  The thread shares the [`DeviceSession`] with the foreground
//! controller; the session's internal lock keeps their frames from
//! interleaving.
//!
//! The loop is deliberately fragile: the first transport failure ends it.  A
//! dead transport means the device is gone, and retrying from a background
//! thread would only mask that.  The owner observes the death through
//! [`KeepaliveSupervisor::is_alive`] rather than a callback.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info};

use crate::infrastructure::hid::session::DeviceSession;
use crate::infrastructure::hid::HidTransport;

/// Optional provider of host statistics forwarded with each keepalive.
pub trait StatusSource: Send {
    /// One sample of host state, or `None` when nothing is available.
    fn sample(&self) -> Option<serde_json::Value>;
}

/// Supervisor tunables.
#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    /// Pause between keepalive exchanges.
    pub interval: Duration,
    /// Whether to forward host statistics after each keepalive.
    pub send_system_data: bool,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            send_system_data: true,
        }
    }
}

/// Handle to the running keepalive thread.
pub struct KeepaliveSupervisor {
    running: Arc<AtomicBool>,
    alive: Arc<AtomicBool>,
    beats: Arc<AtomicU64>,
    thread: Option<JoinHandle<()>>,
}

impl KeepaliveSupervisor {
    /// Spawns the keepalive thread against a shared session.
    pub fn spawn<T: HidTransport + 'static>(
        session: Arc<DeviceSession<T>>,
        settings: SupervisorSettings,
        status: Option<Box<dyn StatusSource>>,
    ) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let alive = Arc::new(AtomicBool::new(true));
        let beats = Arc::new(AtomicU64::new(0));

        let thread = {
            let running = Arc::clone(&running);
            let alive = Arc::clone(&alive);
            let beats = Arc::clone(&beats);
            thread::Builder::new()
                .name("aquahud-keepalive".to_string())
                .spawn(move || {
                    info!("keepalive supervisor started");
                    run_loop(&session, &settings, status.as_deref(), &running, &beats);
                    alive.store(false, Ordering::SeqCst);
                    info!("keepalive supervisor stopped");
                })
                .expect("failed to spawn keepalive thread")
        };

        Self {
            running,
            alive,
            beats,
            thread: Some(thread),
        }
    }

    /// Asks the thread to stop after its current iteration.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Whether the thread is still looping.  `false` after [`stop`] takes
    /// effect or after the loop died on a transport failure.
    ///
    /// [`stop`]: KeepaliveSupervisor::stop
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Number of completed keepalive iterations.
    pub fn beats(&self) -> u64 {
        self.beats.load(Ordering::SeqCst)
    }

    /// Waits for the thread to finish.  Call [`stop`] first, or this blocks
    /// until the loop dies on its own.
    ///
    /// [`stop`]: KeepaliveSupervisor::stop
    pub fn join(mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("keepalive thread panicked");
            }
        }
    }
}

impl Drop for KeepaliveSupervisor {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn run_loop<T: HidTransport>(
    session: &DeviceSession<T>,
    settings: &SupervisorSettings,
    status: Option<&dyn StatusSource>,
    running: &AtomicBool,
    beats: &AtomicU64,
) {
    while running.load(Ordering::SeqCst) {
        thread::sleep(settings.interval);
        if !running.load(Ordering::SeqCst) {
            break;
        }

        match session.send_keepalive() {
            Ok(reply) => debug!("keepalive exchange completed: {reply:?}"),
            Err(e) => {
                error!("keepalive failed, stopping supervisor: {e}");
                break;
            }
        }

        if settings.send_system_data {
            let sample = status.and_then(StatusSource::sample);
            if let Err(e) = session.send_system_state(sample.as_ref()) {
                error!("system state push failed, stopping supervisor: {e}");
                break;
            }
        }

        beats.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
