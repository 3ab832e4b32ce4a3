// THEORY:
// The `GridModel` owns the partition geometry and the three parallel per-cell tables:
//
// 1.  **motion**: transient, rewritten by every analysis pass, no history.
// 2.  **revealed**: monotonic. Only an explicit `reset` ever clears a cell.
// 3.  **brightness**: static, derived from the reference image. Absent until the
//     image arrives, which may happen before or after the camera is ready.
//
// Re-configuring with the same column/row count keeps every table (a resize must
// not forget what has been revealed). Changing the partition itself resets motion
// and revealed and recomputes brightness from the retained reference image.
//
// Completion is derived on demand from `revealed`; there is no separate counter to
// keep in sync.

use crate::core_modules::brightness::compute_brightness;
use crate::core_modules::cell_table::CellTable;
use crate::core_modules::frame::FrameBuffer;
use crate::core_modules::grid::{AnchorMode, Grid};
use crate::error::{Result, RevealError};
use tracing::{debug, info, warn};

/// Geometry plus per-cell state for one reveal session.
#[derive(Debug, Clone)]
pub struct GridModel {
    grid: Option<Grid>,
    motion: CellTable<bool>,
    revealed: CellTable<bool>,
    brightness: Option<CellTable<f64>>,
    reference: Option<FrameBuffer>,
    reference_stride: u32,
}

impl GridModel {
    /// A partition with no geometry yet. Geometry arrives with the first
    /// `configure`, once the viewport size is known.
    pub fn new(columns: u32, rows: u32) -> Result<Self> {
        if columns == 0 || rows == 0 {
            return Err(RevealError::EmptyGrid { columns, rows });
        }
        Ok(Self {
            grid: None,
            motion: CellTable::new(columns, rows, false),
            revealed: CellTable::new(columns, rows, false),
            brightness: None,
            reference: None,
            reference_stride: 1,
        })
    }

    /// Recomputes geometry. Tables survive unless `columns`/`rows` change. On error
    /// the previous geometry is left untouched.
    pub fn configure(
        &mut self,
        viewport_width: u32,
        viewport_height: u32,
        columns: u32,
        rows: u32,
        anchor: AnchorMode,
    ) -> Result<()> {
        let grid = Grid::configure(viewport_width, viewport_height, columns, rows, anchor)?;
        self.grid = Some(grid);
        self.apply_partition(columns, rows);
        debug!(viewport_width, viewport_height, columns, rows, "grid geometry recomputed");
        Ok(())
    }

    /// Changes `columns`/`rows`, keeping the current viewport and anchor.
    pub fn set_partition(&mut self, columns: u32, rows: u32) -> Result<()> {
        match self.grid.as_ref() {
            Some(grid) => {
                let (width, height) = grid.viewport();
                let anchor = grid.anchor();
                self.configure(width, height, columns, rows, anchor)
            }
            None => {
                if columns == 0 || rows == 0 {
                    return Err(RevealError::EmptyGrid { columns, rows });
                }
                self.apply_partition(columns, rows);
                Ok(())
            }
        }
    }

    fn apply_partition(&mut self, columns: u32, rows: u32) {
        if self.dimensions() == (columns, rows) {
            return;
        }
        info!(columns, rows, "grid partition changed, resetting cell state");
        self.motion = CellTable::new(columns, rows, false);
        self.revealed = CellTable::new(columns, rows, false);
        self.brightness = self
            .reference
            .as_ref()
            .map(|image| compute_brightness(image, columns, rows, self.reference_stride));
    }

    /// Stores the reference image and derives the brightness table from it.
    /// Works with or without geometry.
    pub fn set_reference(&mut self, image: FrameBuffer, stride: u32) {
        let (columns, rows) = self.dimensions();
        self.reference_stride = stride.max(1);
        self.brightness = Some(compute_brightness(&image, columns, rows, self.reference_stride));
        info!(
            width = image.width(),
            height = image.height(),
            "reference image loaded"
        );
        self.reference = Some(image);
    }

    /// Clears `revealed` for the listed cells, or for every cell when `cells` is
    /// `None`. Brightness is never touched. Returns how many cells were cleared.
    pub fn reset(&mut self, cells: Option<&[(u32, u32)]>) -> usize {
        match cells {
            None => {
                let cleared = self.revealed_count();
                self.revealed.fill(false);
                cleared
            }
            Some(targets) => {
                let mut cleared = 0;
                for &(col, row) in targets {
                    match self.revealed.get_mut(col, row) {
                        Some(cell) => {
                            if *cell {
                                cleared += 1;
                            }
                            *cell = false;
                        }
                        None => warn!(col, row, "ignoring reset of cell outside the grid"),
                    }
                }
                cleared
            }
        }
    }

    /// `(columns, rows)` of the partition.
    pub fn dimensions(&self) -> (u32, u32) {
        self.revealed.dimensions()
    }

    /// Geometry, once a viewport has been configured.
    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_ref()
    }

    pub fn motion(&self) -> &CellTable<bool> {
        &self.motion
    }

    pub fn revealed(&self) -> &CellTable<bool> {
        &self.revealed
    }

    pub fn brightness(&self) -> Option<&CellTable<f64>> {
        self.brightness.as_ref()
    }

    pub fn reference(&self) -> Option<&FrameBuffer> {
        self.reference.as_ref()
    }

    pub fn has_reference(&self) -> bool {
        self.reference.is_some()
    }

    /// Brightness of one cell, 0 when no reference image is loaded.
    pub fn cell_brightness(&self, col: u32, row: u32) -> f64 {
        self.brightness
            .as_ref()
            .and_then(|table| table.get(col, row).copied())
            .unwrap_or(0.0)
    }

    pub fn is_revealed(&self, col: u32, row: u32) -> bool {
        self.revealed.get(col, row).copied().unwrap_or(false)
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed.as_slice().iter().filter(|r| **r).count()
    }

    pub fn all_revealed(&self) -> bool {
        self.revealed.as_slice().iter().all(|r| *r)
    }

    /// Table access for the analyzer's merge phase.
    pub(crate) fn tables_mut(&mut self) -> (&mut CellTable<bool>, &mut CellTable<bool>) {
        (&mut self.motion, &mut self.revealed)
    }

    pub(crate) fn clear_motion(&mut self) {
        self.motion.fill(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::pixel::pixel::Pixel;

    fn model(columns: u32, rows: u32) -> GridModel {
        let mut model = GridModel::new(columns, rows).unwrap();
        model.configure(100, 100, columns, rows, AnchorMode::Fullscreen).unwrap();
        model
    }

    fn reveal(model: &mut GridModel, col: u32, row: u32) {
        *model.revealed.get_mut(col, row).unwrap() = true;
    }

    #[test]
    fn reconfigure_same_partition_preserves_state() {
        let mut model = model(2, 2);
        model.set_reference(FrameBuffer::filled(8, 8, Pixel::gray(80)), 1);
        reveal(&mut model, 1, 1);

        model.configure(300, 200, 2, 2, AnchorMode::Fullscreen).unwrap();
        assert!(model.is_revealed(1, 1));
        assert_eq!(model.cell_brightness(1, 1), 80.0);
        assert_eq!(model.grid().map(|g| g.viewport()), Some((300, 200)));
    }

    #[test]
    fn reconfigure_new_partition_resets_and_recomputes() {
        let mut model = model(2, 2);
        let mut image = FrameBuffer::filled(4, 4, Pixel::gray(10));
        image.fill_rect(0, 0, 4, 1, Pixel::gray(250));
        model.set_reference(image, 1);
        reveal(&mut model, 0, 0);

        model.configure(100, 100, 1, 4, AnchorMode::Fullscreen).unwrap();
        assert_eq!(model.revealed_count(), 0);
        assert_eq!(model.revealed().dimensions(), (1, 4));
        assert_eq!(model.brightness().unwrap().columns(), vec![vec![250.0, 10.0, 10.0, 10.0]]);
    }

    #[test]
    fn failed_configure_keeps_previous_geometry() {
        let mut model = model(2, 2);
        assert!(model.configure(100, 100, 0, 2, AnchorMode::Fullscreen).is_err());
        assert_eq!(model.grid().map(|g| g.columns()), Some(2));
        assert_eq!(model.dimensions(), (2, 2));
    }

    #[test]
    fn reference_can_arrive_before_geometry() {
        let mut model = GridModel::new(2, 1).unwrap();
        assert!(model.grid().is_none());
        let mut image = FrameBuffer::filled(4, 2, Pixel::gray(20));
        image.fill_rect(2, 0, 4, 2, Pixel::gray(220));
        model.set_reference(image, 1);
        assert_eq!(model.brightness().unwrap().columns(), vec![vec![20.0], vec![220.0]]);

        model.configure(640, 480, 2, 1, AnchorMode::Fullscreen).unwrap();
        assert_eq!(model.cell_brightness(1, 0), 220.0);
    }

    #[test]
    fn set_partition_keeps_viewport() {
        let mut model = model(2, 2);
        model.set_partition(4, 1).unwrap();
        let grid = model.grid().unwrap();
        assert_eq!((grid.columns(), grid.rows()), (4, 1));
        assert_eq!(grid.viewport(), (100, 100));
        assert_eq!(GridModel::new(0, 1).unwrap_err(), RevealError::EmptyGrid { columns: 0, rows: 1 });
    }

    #[test]
    fn targeted_reset_only_clears_targets() {
        let mut model = model(2, 2);
        model.set_reference(FrameBuffer::filled(2, 2, Pixel::gray(33)), 1);
        for (col, row) in [(0, 0), (0, 1), (1, 0)] {
            reveal(&mut model, col, row);
        }

        let cleared = model.reset(Some(&[(0, 1), (1, 1), (9, 9)]));
        assert_eq!(cleared, 1);
        assert!(model.is_revealed(0, 0));
        assert!(!model.is_revealed(0, 1));
        assert!(model.is_revealed(1, 0));
        assert!(model.brightness().unwrap().as_slice().iter().all(|b| *b == 33.0));
    }

    #[test]
    fn full_reset_and_completion() {
        let mut model = model(2, 1);
        assert!(!model.all_revealed());
        reveal(&mut model, 0, 0);
        reveal(&mut model, 1, 0);
        assert!(model.all_revealed());
        assert_eq!(model.reset(None), 2);
        assert_eq!(model.revealed_count(), 0);
    }

    #[test]
    fn brightness_defaults_to_zero_without_reference() {
        let model = model(2, 2);
        assert!(!model.has_reference());
        assert_eq!(model.cell_brightness(1, 1), 0.0);
    }
}
