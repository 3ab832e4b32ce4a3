// THEORY:
// The motion analyzer is the heart of the engine. It compares two frames cell by cell
// and turns the comparison into the persistent reveal state.
//
// Key architectural principles:
// 1.  **Two phases**: Scoring is pure. Every cell's mean luminance delta is computed
//     from read-only frame views with no shared mutable state, so it can run as a
//     data-parallel map. The merge phase then writes `motion`, flips `revealed` and
//     builds the events on the calling thread, in column-major cell order. One
//     consistent motion snapshot per tick, whichever scoring strategy ran.
// 2.  **Exact accumulation**: Deltas are summed in integer milli-luminance units and
//     divided once. A uniform shift of N gray levels scores exactly N.
// 3.  **Skip, don't guess**: A sample is only taken where the pixel exists in both
//     frames. Pixels missing from one buffer (mid-resize) are skipped, never read as
//     black, so a resize race cannot fake motion along the edges.
// 4.  **Strict threshold**: `motion = mean > threshold`, in raw 0..=255 luminance
//     units. A mean equal to the threshold is not motion.

use crate::core_modules::cell_table::CellTable;
use crate::core_modules::frame::FrameBuffer;
use crate::core_modules::grid::{CellBounds, Grid};
use crate::core_modules::grid_model::GridModel;
use crate::core_modules::pixel::pixel::MILLI_SCALE;
use crate::core_modules::reveal_event::RevealEvent;
use rayon::prelude::*;
use tracing::debug;

/// Per-call analysis knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisParams {
    /// Mean luminance delta a cell must exceed, in 0..=255 units.
    pub threshold: f64,
    /// Sample every Nth pixel on both axes. Values below 1 are treated as 1.
    pub sample_stride: u32,
    /// Score cells on the rayon pool instead of the calling thread.
    pub parallel: bool,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            threshold: 25.0,
            sample_stride: 1,
            parallel: false,
        }
    }
}

/// The result of one analysis pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// This tick's motion flags.
    pub motion: CellTable<bool>,
    /// Mean luminance delta per cell, `None` where no sample could be taken.
    pub scores: CellTable<Option<f64>>,
    /// Cells that flipped to revealed during this pass.
    pub newly_revealed: Vec<RevealEvent>,
}

/// Mean absolute luminance delta of one cell, or `None` when no pixel of the cell
/// exists in both frames.
pub fn score_cell(prev: &FrameBuffer, curr: &FrameBuffer, bounds: CellBounds, stride: u32) -> Option<f64> {
    if bounds.is_empty() {
        return None;
    }
    let stride = stride.max(1) as usize;

    let mut total: u64 = 0;
    let mut count: u64 = 0;
    for y in (bounds.y0..bounds.y1).step_by(stride) {
        for x in (bounds.x0..bounds.x1).step_by(stride) {
            let (Some(before), Some(after)) = (prev.milli_luminance(x, y), curr.milli_luminance(x, y)) else {
                continue;
            };
            total += before.abs_diff(after) as u64;
            count += 1;
        }
    }

    (count > 0).then(|| total as f64 / count as f64 / MILLI_SCALE)
}

/// Scores every cell of `grid`. Pure; safe to run on any thread.
pub fn score_cells(prev: &FrameBuffer, curr: &FrameBuffer, grid: &Grid, params: &AnalysisParams) -> CellTable<Option<f64>> {
    let (columns, rows) = (grid.columns(), grid.rows());
    let score = |index: usize| {
        let rows = rows as usize;
        let (col, row) = ((index / rows) as u32, (index % rows) as u32);
        score_cell(prev, curr, grid.cell_bounds(col, row), params.sample_stride)
    };

    if params.parallel {
        let scores: Vec<Option<f64>> = (0..grid.cell_count()).into_par_iter().map(score).collect();
        CellTable::from_fn(columns, rows, |col, row| scores[col as usize * rows as usize + row as usize])
    } else {
        let mut index = 0;
        CellTable::from_fn(columns, rows, |_, _| {
            let value = score(index);
            index += 1;
            value
        })
    }
}

/// Compares `prev` against `curr`, rewrites `model`'s motion table and reveals
/// newly moving cells.
///
/// When either frame is missing, or the model has no geometry yet, the call is a
/// no-op: motion is cleared, nothing is revealed and the returned analysis is empty.
pub fn analyze(
    prev: Option<&FrameBuffer>,
    curr: Option<&FrameBuffer>,
    model: &mut GridModel,
    params: &AnalysisParams,
    timestamp_millis: u64,
) -> Analysis {
    let (columns, rows) = model.dimensions();
    let (Some(prev), Some(curr), Some(grid)) = (prev, curr, model.grid()) else {
        model.clear_motion();
        return Analysis {
            motion: CellTable::new(columns, rows, false),
            scores: CellTable::new(columns, rows, None),
            newly_revealed: Vec::new(),
        };
    };

    let scores = score_cells(prev, curr, grid, params);
    let brightness: Vec<f64> = (0..columns)
        .flat_map(|col| (0..rows).map(move |row| (col, row)))
        .map(|(col, row)| model.cell_brightness(col, row))
        .collect();

    let mut newly_revealed = Vec::new();
    let (motion, revealed) = model.tables_mut();
    for ((col, row), score) in scores.iter() {
        let moving = score.is_some_and(|mean| mean > params.threshold);
        if let Some(cell) = motion.get_mut(col, row) {
            *cell = moving;
        }
        let Some(cell) = revealed.get_mut(col, row) else {
            continue;
        };
        if moving && !*cell {
            *cell = true;
            let event = RevealEvent {
                col,
                row,
                brightness: brightness[col as usize * rows as usize + row as usize],
                timestamp_millis,
            };
            debug!(col, row, brightness = event.brightness, "cell revealed");
            newly_revealed.push(event);
        }
    }

    Analysis {
        motion: motion.clone(),
        scores,
        newly_revealed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::grid::AnchorMode;
    use crate::core_modules::pixel::pixel::Pixel;

    fn model(width: u32, height: u32, columns: u32, rows: u32) -> GridModel {
        let mut model = GridModel::new(columns, rows).unwrap();
        model
            .configure(width, height, columns, rows, AnchorMode::Fullscreen)
            .unwrap();
        model
    }

    fn params(threshold: f64) -> AnalysisParams {
        AnalysisParams {
            threshold,
            ..AnalysisParams::default()
        }
    }

    #[test]
    fn identical_frames_have_no_motion() {
        let frame = FrameBuffer::filled(8, 8, Pixel::new(12, 200, 77, 255));
        let mut model = model(8, 8, 2, 2);
        let analysis = analyze(Some(&frame), Some(&frame), &mut model, &params(0.0), 0);
        assert!(analysis.motion.as_slice().iter().all(|m| !m));
        assert!(analysis.scores.as_slice().iter().all(|s| *s == Some(0.0)));
        assert!(analysis.newly_revealed.is_empty());
    }

    #[test]
    fn uniform_offset_against_threshold() {
        let prev = FrameBuffer::filled(6, 6, Pixel::gray(100));
        let curr = FrameBuffer::filled(6, 6, Pixel::gray(130));

        for (threshold, expected) in [(29.0, true), (30.0, false), (31.0, false)] {
            let mut model = model(6, 6, 3, 2);
            let analysis = analyze(Some(&prev), Some(&curr), &mut model, &params(threshold), 0);
            assert!(
                analysis.motion.as_slice().iter().all(|m| *m == expected),
                "threshold {threshold}"
            );
            assert_eq!(analysis.newly_revealed.len(), if expected { 6 } else { 0 });
        }
    }

    #[test]
    fn mismatched_buffers_skip_missing_pixels() {
        // The current frame only covers the left half of the viewport.
        let prev = FrameBuffer::filled(4, 2, Pixel::gray(0));
        let curr = FrameBuffer::filled(2, 2, Pixel::gray(0));
        let mut model = model(4, 2, 2, 1);
        let analysis = analyze(Some(&prev), Some(&curr), &mut model, &params(1.0), 0);
        assert_eq!(analysis.scores.columns(), vec![vec![Some(0.0)], vec![None]]);
        assert!(analysis.motion.as_slice().iter().all(|m| !m));
    }

    #[test]
    fn missing_frame_is_a_no_op() {
        let frame = FrameBuffer::filled(4, 4, Pixel::gray(0));
        let mut model = model(4, 4, 2, 2);
        let analysis = analyze(None, Some(&frame), &mut model, &params(1.0), 0);
        assert!(analysis.newly_revealed.is_empty());
        assert_eq!(analysis.motion.len(), 4);
        assert_eq!(model.revealed_count(), 0);

        let mut unconfigured = GridModel::new(2, 2).unwrap();
        let analysis = analyze(Some(&frame), Some(&frame), &mut unconfigured, &params(1.0), 0);
        assert!(analysis.scores.as_slice().iter().all(|s| s.is_none()));
    }

    #[test]
    fn stride_only_reads_sampled_pixels() {
        let prev = FrameBuffer::filled(4, 4, Pixel::gray(0));
        let mut curr = prev.clone();
        // Pixel (1, 1) is never sampled at stride 2.
        curr.put_pixel(1, 1, Pixel::gray(255));
        let bounds = CellBounds {
            x0: 0,
            y0: 0,
            x1: 4,
            y1: 4,
        };
        assert_eq!(score_cell(&prev, &curr, bounds, 2), Some(0.0));
        assert_eq!(score_cell(&prev, &curr, bounds, 1), Some(255.0 / 16.0));
    }

    #[test]
    fn reveals_once_and_carries_brightness() {
        let mut model = model(4, 4, 2, 2);
        model.set_reference(FrameBuffer::filled(10, 10, Pixel::gray(51)), 1);
        let still = FrameBuffer::filled(4, 4, Pixel::gray(0));
        let mut moved = still.clone();
        moved.fill_rect(0, 0, 2, 2, Pixel::gray(200));

        let first = analyze(Some(&still), Some(&moved), &mut model, &params(10.0), 7);
        assert_eq!(
            first.newly_revealed,
            vec![RevealEvent {
                col: 0,
                row: 0,
                brightness: 51.0,
                timestamp_millis: 7
            }]
        );

        let second = analyze(Some(&moved), Some(&still), &mut model, &params(10.0), 8);
        assert_eq!(second.motion.get(0, 0), Some(&true));
        assert!(second.newly_revealed.is_empty());
        assert!(model.is_revealed(0, 0));
    }

    #[test]
    fn parallel_scoring_matches_sequential() {
        let prev = FrameBuffer::filled(32, 24, Pixel::gray(10));
        let mut curr = prev.clone();
        curr.fill_rect(5, 3, 19, 17, Pixel::new(200, 40, 90, 255));
        let grid = Grid::configure(32, 24, 5, 3, AnchorMode::Fullscreen).unwrap();

        let sequential = score_cells(&prev, &curr, &grid, &params(0.0));
        let parallel = score_cells(
            &prev,
            &curr,
            &grid,
            &AnalysisParams {
                parallel: true,
                ..params(0.0)
            },
        );
        assert_eq!(sequential, parallel);
    }
}
