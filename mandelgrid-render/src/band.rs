use std::ops::Range;

/// A contiguous run of area rows evaluated by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowBand {
    /// Position of the band in the partition.
    pub index: usize,
    /// First row (inclusive).
    pub start: u32,
    /// Last row (exclusive).
    pub end: u32,
}

impl RowBand {
    pub fn rows(&self) -> Range<u32> {
        self.start..self.end
    }

    pub fn height(&self) -> u32 {
        self.end - self.start
    }

    /// Number of pixels in this band for an area `width` pixels wide.
    pub fn pixel_count(&self, width: u32) -> usize {
        self.height() as usize * width as usize
    }
}

/// Split `height` rows into at most `worker_count` contiguous bands.
///
/// Every band gets `height / count` rows and the last one also takes the
/// remainder, so each row belongs to exactly one band. The band count is
/// clamped to `[1, height]`: a `worker_count` of zero means one band, and
/// there are never more bands than rows.
pub fn partition_rows(height: u32, worker_count: usize) -> Vec<RowBand> {
    let limit = height.max(1);
    let count = u32::try_from(worker_count).map_or(limit, |n| n.clamp(1, limit));
    let base = height / count;
    (0..count)
        .map(|k| {
            let start = k * base;
            let end = if k == count - 1 { height } else { start + base };
            RowBand {
                index: k as usize,
                start,
                end,
            }
        })
        .collect()
}
