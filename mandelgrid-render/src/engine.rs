use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info};

use mandelgrid_core::{iterate, ComplexViewport};

use crate::band::{partition_rows, RowBand};
use crate::grid::{try_zeroed, IterationGrid};

// ---------------------------------------------------------------------------
// Cancellation and progress
// ---------------------------------------------------------------------------

/// Cooperative cancellation flag plus row progress for one evaluation.
///
/// Workers poll [`is_cancelled`](Self::is_cancelled) once per row, so a
/// worker that is mid-row finishes that row before it stops.
#[derive(Debug)]
pub struct RenderCancel {
    cancelled: AtomicBool,
    rows_done: AtomicUsize,
    rows_total: AtomicUsize,
    last_percent: AtomicU8,
}

impl RenderCancel {
    pub fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            rows_done: AtomicUsize::new(0),
            rows_total: AtomicUsize::new(0),
            last_percent: AtomicU8::new(0),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Reset progress for an evaluation of `total` rows.
    pub fn reset_progress(&self, total: usize) {
        self.rows_total.store(total, Ordering::Relaxed);
        self.rows_done.store(0, Ordering::Relaxed);
        self.last_percent.store(0, Ordering::Relaxed);
    }

    /// Record one finished row.
    ///
    /// Returns the rounded completion percentage only when it is higher than
    /// every percentage returned before, so each value is reported once.
    pub fn row_done(&self) -> Option<u8> {
        let done = self.rows_done.fetch_add(1, Ordering::Relaxed) + 1;
        let total = self.rows_total.load(Ordering::Relaxed).max(1);
        let percent = ((done * 100 + total / 2) / total).min(100) as u8;
        let previous = self.last_percent.fetch_max(percent, Ordering::Relaxed);
        (percent > previous).then_some(percent)
    }

    /// Current progress as `(rows_done, rows_total)`.
    pub fn progress(&self) -> (usize, usize) {
        (
            self.rows_done.load(Ordering::Relaxed),
            self.rows_total.load(Ordering::Relaxed),
        )
    }
}

impl Default for RenderCancel {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Workspace
// ---------------------------------------------------------------------------

/// One worker's band and its private output.
#[derive(Debug)]
struct BandBuffer {
    band: RowBand,
    data: Vec<u32>,
    finished: bool,
}

/// Every allocation an evaluation needs, made up front.
///
/// Allocating before any worker starts means running out of memory is
/// reported synchronously as [`RenderError::OutOfResources`](crate::RenderError)
/// and never half-way through a render.
#[derive(Debug)]
pub struct Workspace {
    grid: IterationGrid,
    parts: Vec<BandBuffer>,
}

impl Workspace {
    pub fn allocate(
        viewport: &ComplexViewport,
        max_iterations: u32,
        worker_count: usize,
    ) -> crate::Result<Self> {
        let width = viewport.area_width();
        let height = viewport.area_height();
        let grid = IterationGrid::allocate(width, height, max_iterations)?;
        let parts = partition_rows(height, worker_count)
            .into_iter()
            .map(|band| {
                Ok(BandBuffer {
                    band,
                    data: try_zeroed(band.pixel_count(width), width, height)?,
                    finished: false,
                })
            })
            .collect::<crate::Result<Vec<_>>>()?;
        Ok(Self { grid, parts })
    }

    pub fn band_count(&self) -> usize {
        self.parts.len()
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// A fully populated grid.
#[derive(Debug, Clone)]
pub struct RenderResult {
    pub iterations: IterationGrid,
    pub elapsed: Duration,
    pub bands: usize,
}

/// Fill one band's private buffer row by row.
///
/// Returns `false` if cancellation was observed before the last row.
fn compute_band(
    part: &mut BandBuffer,
    viewport: &ComplexViewport,
    max_iterations: u32,
    cancel: &RenderCancel,
    on_progress: &(impl Fn(u8) + Sync),
) -> bool {
    let width = viewport.area_width() as usize;
    if width == 0 {
        return true;
    }
    let rows = part.band.rows();
    for (py, row) in rows.zip(part.data.chunks_exact_mut(width)) {
        if cancel.is_cancelled() {
            return false;
        }
        for (px, cell) in row.iter_mut().enumerate() {
            *cell = iterate(viewport.pixel_to_complex(px as u32, py), max_iterations);
        }
        if let Some(percent) = cancel.row_done() {
            on_progress(percent);
        }
    }
    true
}

/// Evaluate every area pixel of `viewport` in parallel, one task per band.
///
/// Blocks until all bands are done. Each band is written only by its own
/// worker; the bands are copied into the grid once, after the join. Returns
/// `None` if the evaluation was cancelled, in which case all partial output
/// is dropped.
pub fn evaluate(
    mut workspace: Workspace,
    viewport: &ComplexViewport,
    cancel: &RenderCancel,
    on_progress: impl Fn(u8) + Sync,
) -> Option<RenderResult> {
    let start = Instant::now();
    let max_iterations = workspace.grid.max_iterations;
    let bands = workspace.parts.len();
    cancel.reset_progress(viewport.area_height() as usize);
    debug!(
        bands,
        width = viewport.area_width(),
        height = viewport.area_height(),
        max_iterations,
        "Starting grid evaluation"
    );

    workspace
        .parts
        .par_iter_mut()
        .with_max_len(1)
        .for_each(|part| {
            part.finished = compute_band(part, viewport, max_iterations, cancel, &on_progress);
        });

    if cancel.is_cancelled() || workspace.parts.iter().any(|p| !p.finished) {
        debug!(
            elapsed_ms = start.elapsed().as_millis(),
            "Grid evaluation cancelled"
        );
        return None;
    }

    let Workspace { mut grid, parts } = workspace;
    for part in &parts {
        grid.blit_band(&part.band, &part.data);
    }

    let elapsed = start.elapsed();
    info!(elapsed_ms = elapsed.as_millis(), bands, "Grid evaluation complete");
    Some(RenderResult {
        iterations: grid,
        elapsed,
        bands,
    })
}

/// Allocate and evaluate in one call.
///
/// `Ok(None)` means the evaluation was cancelled.
pub fn evaluate_grid(
    viewport: &ComplexViewport,
    max_iterations: u32,
    worker_count: usize,
    cancel: &RenderCancel,
    on_progress: impl Fn(u8) + Sync,
) -> crate::Result<Option<RenderResult>> {
    let workspace = Workspace::allocate(viewport, max_iterations, worker_count)?;
    Ok(evaluate(workspace, viewport, cancel, on_progress))
}

/// One band per thread of the global rayon pool.
pub fn default_worker_count() -> usize {
    rayon::current_num_threads()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mandelgrid_core::PlaneBounds;
    use std::sync::Mutex;

    fn viewport(width: u32, height: u32) -> ComplexViewport {
        ComplexViewport::new(PlaneBounds::new(-2.0, -1.5, 1.0, 1.5), width, height).unwrap()
    }

    #[test]
    fn matches_scalar_iterate() {
        let vp = viewport(64, 48);
        let cancel = RenderCancel::new();
        let result = evaluate_grid(&vp, 50, 3, &cancel, |_| {}).unwrap().unwrap();
        let grid = &result.iterations;
        assert_eq!(result.bands, 3);
        for py in 0..grid.height {
            for px in 0..grid.width {
                let expected = iterate(vp.pixel_to_complex(px, py), 50);
                assert_eq!(grid.get(px, py), Some(expected));
            }
        }
    }

    #[test]
    fn worker_count_does_not_change_result() {
        let vp = viewport(50, 37);
        let cancel = RenderCancel::new();
        let one = evaluate_grid(&vp, 40, 1, &cancel, |_| {}).unwrap().unwrap();
        for workers in [2, 5, 16, 64] {
            let many = evaluate_grid(&vp, 40, workers, &cancel, |_| {})
                .unwrap()
                .unwrap();
            assert_eq!(one.iterations, many.iterations, "workers = {workers}");
        }
    }

    #[test]
    fn progress_is_strictly_increasing_and_ends_at_100() {
        let vp = viewport(40, 40);
        let cancel = RenderCancel::new();
        let seen = Mutex::new(Vec::new());
        evaluate_grid(&vp, 20, 4, &cancel, |p| seen.lock().unwrap().push(p))
            .unwrap()
            .unwrap();
        let mut seen = seen.into_inner().unwrap();
        let reported = seen.len();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), reported, "no percentage is reported twice");
        assert_eq!(seen.last(), Some(&100));
        assert_eq!(cancel.progress(), (40, 40));
    }

    #[test]
    fn row_done_rounds_and_skips_repeats() {
        let cancel = RenderCancel::new();
        cancel.reset_progress(300);
        assert_eq!(cancel.row_done(), None); // 0.33% rounds to 0
        assert_eq!(cancel.row_done(), Some(1)); // 0.67% rounds to 1
        assert_eq!(cancel.row_done(), None); // still 1
    }

    #[test]
    fn cancelled_evaluation_returns_none() {
        let vp = viewport(32, 32);
        let cancel = RenderCancel::new();
        cancel.cancel();
        let result = evaluate_grid(&vp, 1000, 4, &cancel, |_| {}).unwrap();
        assert!(result.is_none());
        assert_eq!(cancel.progress().0, 0);
    }

    #[test]
    fn cancel_mid_band_finishes_current_row_only() {
        // One band of ten rows: the first report comes after row one.
        let vp = viewport(10, 10);
        let cancel = RenderCancel::new();
        let rows_at_cancel = AtomicUsize::new(usize::MAX);
        let result = evaluate_grid(&vp, 50, 1, &cancel, |_| {
            if !cancel.is_cancelled() {
                rows_at_cancel.store(cancel.progress().0, Ordering::SeqCst);
                cancel.cancel();
            }
        })
        .unwrap();
        assert!(result.is_none());
        assert_eq!(rows_at_cancel.load(Ordering::SeqCst), 1);
        assert_eq!(cancel.progress().0, 1);
    }

    #[test]
    fn workspace_caps_bands_at_row_count() {
        let vp = viewport(8, 8);
        let ws = Workspace::allocate(&vp, 10, usize::MAX).unwrap();
        assert_eq!(ws.band_count(), 8);
    }

    #[test]
    fn workspace_has_one_buffer_per_band() {
        let vp = viewport(10, 10);
        let ws = Workspace::allocate(&vp, 10, 7).unwrap();
        assert_eq!(ws.band_count(), 7);
        let rows: u32 = ws.parts.iter().map(|p| p.band.height()).sum();
        assert_eq!(rows, 10);
        for part in &ws.parts {
            assert_eq!(part.data.len(), part.band.pixel_count(10));
        }
    }
}
