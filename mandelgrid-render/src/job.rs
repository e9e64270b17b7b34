use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use mandelgrid_core::ComplexViewport;

use crate::buffer::RenderBuffer;
use crate::engine::{default_worker_count, evaluate, RenderCancel, RenderResult, Workspace};
use crate::grid::IterationGrid;
use crate::palette::{ColorPalette, Rgb};

/// Everything that determines a job's output.
///
/// Two equal configurations produce identical images, which is what lets a
/// caller keep a finished job instead of rebuilding it.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub viewport: ComplexViewport,
    pub max_iterations: u32,
    pub inside_color: Rgb,
    pub gradient: Vec<Rgb>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Building,
    Built,
    Aborted,
}

/// Receives job notifications. Called from the job's coordinator thread.
///
/// Progress calls from different bands may arrive in any order; only the
/// completion and abort notifications are serialized, and exactly one of
/// them fires per build.
pub trait JobObserver: Send + Sync {
    fn on_progress(&self, _percent: u8) {}
    fn on_complete(&self) {}
    fn on_aborted(&self) {}
}

impl JobObserver for () {}

struct Shared {
    state: Mutex<JobState>,
    cancel: RenderCancel,
    result: OnceLock<RenderResult>,
    coordinator: Mutex<Option<JoinHandle<()>>>,
}

/// One asynchronous build of an iteration grid.
///
/// `Idle → Building → Built | Aborted`. A job never changes its
/// configuration; a new viewport or depth needs a new job.
pub struct RenderJob {
    config: RenderConfig,
    palette: ColorPalette,
    worker_count: usize,
    shared: Arc<Shared>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl RenderJob {
    /// Validate the configuration and build its palette.
    pub fn new(config: RenderConfig) -> crate::Result<Self> {
        let palette =
            ColorPalette::build(config.inside_color, &config.gradient, config.max_iterations)?;
        Ok(Self {
            config,
            palette,
            worker_count: default_worker_count(),
            shared: Arc::new(Shared {
                state: Mutex::new(JobState::Idle),
                cancel: RenderCancel::new(),
                result: OnceLock::new(),
                coordinator: Mutex::new(None),
            }),
        })
    }

    /// Override the number of row bands (zero means one).
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count.max(1);
        self
    }

    /// Start building in the background and return immediately.
    ///
    /// On a `Built` job this re-reports 100% and completion without
    /// recomputing. On a `Building` or `Aborted` job it does nothing.
    /// Allocation happens before anything is spawned, so an
    /// `OutOfResources` error leaves the job `Idle`.
    pub fn start(&self, observer: Arc<dyn JobObserver>) -> crate::Result<()> {
        let mut state = lock(&self.shared.state);
        match *state {
            JobState::Idle => {}
            JobState::Built => {
                drop(state);
                debug!("Job already built, replaying completion");
                observer.on_progress(100);
                observer.on_complete();
                return Ok(());
            }
            JobState::Building | JobState::Aborted => return Ok(()),
        }

        let viewport = self.config.viewport;
        let workspace =
            Workspace::allocate(&viewport, self.config.max_iterations, self.worker_count)?;
        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("render-job".into())
            .spawn(move || run(shared, workspace, viewport, observer))?;

        // Store the handle under the state lock so `wait` never sees
        // `Building` without a coordinator to join.
        *lock(&self.shared.coordinator) = Some(handle);
        *state = JobState::Building;
        drop(state);
        debug!(
            workers = self.worker_count,
            max_iterations = self.config.max_iterations,
            "Render job started"
        );
        Ok(())
    }

    /// Cancel a running build. Does nothing unless the job is `Building`.
    ///
    /// The state becomes `Aborted` immediately; `on_aborted` fires once
    /// every worker has stopped.
    pub fn abort(&self) {
        let mut state = lock(&self.shared.state);
        if *state == JobState::Building {
            self.shared.cancel.cancel();
            *state = JobState::Aborted;
            debug!("Render job aborted");
        }
    }

    /// Block until the background build (if any) has finished.
    pub fn wait(&self) {
        let handle = lock(&self.shared.coordinator).take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("Render job coordinator panicked");
            }
        }
    }

    pub fn state(&self) -> JobState {
        *lock(&self.shared.state)
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn palette(&self) -> &ColorPalette {
        &self.palette
    }

    /// Whether this job can stand in for a new job with `config`.
    pub fn is_reusable_for(&self, config: &RenderConfig) -> bool {
        self.state() != JobState::Aborted && self.config == *config
    }

    /// The finished grid, once `Built`.
    pub fn grid(&self) -> Option<&IterationGrid> {
        self.result().map(|r| &r.iterations)
    }

    /// Wall time the evaluation took, once `Built`.
    pub fn elapsed(&self) -> Option<Duration> {
        self.result().map(|r| r.elapsed)
    }

    /// Color the finished grid into a full-canvas image.
    ///
    /// The letterbox margins around the area are filled with `background`.
    pub fn image(&self, background: Rgb) -> Option<RenderBuffer> {
        let grid = self.grid()?;
        let viewport = &self.config.viewport;
        let mut canvas =
            RenderBuffer::filled(viewport.full_width(), viewport.full_height(), background);
        canvas.blit(
            viewport.offset_x(),
            viewport.offset_y(),
            &self.palette.colorize(grid),
        );
        Some(canvas)
    }

    fn result(&self) -> Option<&RenderResult> {
        if self.state() == JobState::Built {
            self.shared.result.get()
        } else {
            None
        }
    }
}

impl Drop for RenderJob {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Coordinator thread body: evaluate, then settle the final state.
fn run(
    shared: Arc<Shared>,
    workspace: Workspace,
    viewport: ComplexViewport,
    observer: Arc<dyn JobObserver>,
) {
    let result = evaluate(workspace, &viewport, &shared.cancel, |percent| {
        if !shared.cancel.is_cancelled() {
            observer.on_progress(percent);
        }
    });

    let mut state = lock(&shared.state);
    match result {
        Some(result) if *state == JobState::Building => {
            let _ = shared.result.set(result);
            *state = JobState::Built;
            drop(state);
            observer.on_complete();
        }
        _ => {
            *state = JobState::Aborted;
            drop(state);
            observer.on_aborted();
        }
    }
}
