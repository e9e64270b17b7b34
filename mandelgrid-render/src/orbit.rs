use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use tracing::{debug, warn};

use mandelgrid_core::{Complex, Orbit};

/// How many orbit points are computed between cancellation checks.
const CANCEL_CHECK_INTERVAL: usize = 1024;

#[derive(Debug)]
struct Request {
    c: Complex,
    max_iterations: u32,
    cancelled: Arc<AtomicBool>,
}

/// Background orbit computation where each request supersedes the last.
///
/// Superseded traces are cancelled rather than queued; their callback never
/// runs.
#[derive(Debug, Default)]
pub struct OrbitTracer {
    current: Mutex<Option<Request>>,
}

impl OrbitTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trace the orbit of `c` in the background and hand it to `on_done`.
    ///
    /// Returns `Ok(false)` without doing anything when the same point and
    /// depth were already requested and not cancelled since.
    pub fn request<F>(&self, c: Complex, max_iterations: u32, on_done: F) -> crate::Result<bool>
    where
        F: FnOnce(Vec<Complex>) + Send + 'static,
    {
        let mut current = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = current.as_ref() {
            if previous.c == c
                && previous.max_iterations == max_iterations
                && !previous.cancelled.load(Ordering::SeqCst)
            {
                return Ok(false);
            }
            previous.cancelled.store(true, Ordering::SeqCst);
        }

        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        thread::Builder::new()
            .name("orbit-trace".into())
            .spawn(move || {
                if let Some(points) = trace_cancellable(c, max_iterations, &flag) {
                    if !flag.load(Ordering::SeqCst) {
                        on_done(points);
                    }
                }
            })?;

        *current = Some(Request {
            c,
            max_iterations,
            cancelled,
        });
        debug!(%c, max_iterations, "Orbit trace requested");
        Ok(true)
    }

    /// Cancel the pending trace, if any.
    pub fn cancel(&self) {
        let current = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(request) = current.as_ref() {
            request.cancelled.store(true, Ordering::SeqCst);
        }
    }
}

impl Drop for OrbitTracer {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn trace_cancellable(
    c: Complex,
    max_iterations: u32,
    cancelled: &AtomicBool,
) -> Option<Vec<Complex>> {
    let orbit = Orbit::new(c, max_iterations);
    let mut points = Vec::new();
    if points.try_reserve_exact(orbit.len()).is_err() {
        warn!(max_iterations, "Not enough memory for orbit trace");
        return None;
    }
    for (i, z) in orbit.enumerate() {
        if i % CANCEL_CHECK_INTERVAL == 0 && cancelled.load(Ordering::Relaxed) {
            debug!(%c, "Orbit trace superseded");
            return None;
        }
        points.push(z);
    }
    (!cancelled.load(Ordering::SeqCst)).then_some(points)
}
