// THEORY:
// `Grid` is the pure geometry of the partition: how many columns and rows there are,
// how large one cell is in viewport pixels, and where the grid's top-left corner sits
// inside the frame. It owns no per-cell state (that lives in `GridModel`).
//
// It is the bridge between the three coordinate spaces of the engine:
// 1.  **Frame space**: integer pixel bounds used by the motion analyzer
//     (`cell_bounds`, floored and clipped to the viewport).
// 2.  **Viewport space**: unclipped floating destination rectangles a renderer
//     composites a revealed segment into (`cell_rect`).
// 3.  **Source-image space**: the proportional region of the reference image that
//     belongs to a cell (`source_region`). This depends only on `columns`/`rows`
//     and the image size, never on the grid's pixel size.
//
// A `Grid` is never mutated. Resizing produces a new one via `Grid::configure`.

use crate::error::{Result, RevealError};

/// How the grid is placed inside the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "mode", rename_all = "snake_case"))]
pub enum AnchorMode {
    /// The grid spans the whole viewport with no offset.
    Fullscreen,
    /// The grid is sized to the given content and centered in the viewport.
    /// The offset goes negative when the content is larger than the viewport.
    Centered { width: f64, height: f64 },
}

/// Half-open pixel bounds `[x0, x1) x [y0, y1)` already clipped to the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellBounds {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl CellBounds {
    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }
}

/// A floating-point rectangle `(x, y, width, height)`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Immutable partition geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    viewport_width: u32,
    viewport_height: u32,
    columns: u32,
    rows: u32,
    cell_width: f64,
    cell_height: f64,
    offset_x: f64,
    offset_y: f64,
    anchor: AnchorMode,
}

impl Grid {
    /// Computes cell size and offset for a viewport. Pure: calling it twice with
    /// the same arguments yields equal grids.
    pub fn configure(
        viewport_width: u32,
        viewport_height: u32,
        columns: u32,
        rows: u32,
        anchor: AnchorMode,
    ) -> Result<Self> {
        if columns == 0 || rows == 0 {
            return Err(RevealError::EmptyGrid { columns, rows });
        }
        if viewport_width == 0 || viewport_height == 0 {
            return Err(RevealError::EmptyViewport {
                width: viewport_width,
                height: viewport_height,
            });
        }

        let (grid_width, grid_height, offset_x, offset_y) = match anchor {
            AnchorMode::Fullscreen => (viewport_width as f64, viewport_height as f64, 0.0, 0.0),
            AnchorMode::Centered { width, height } => {
                let valid = |v: f64| v.is_finite() && v > 0.0;
                if !valid(width) || !valid(height) {
                    return Err(RevealError::InvalidContent { width, height });
                }
                (
                    width,
                    height,
                    (viewport_width as f64 - width) / 2.0,
                    (viewport_height as f64 - height) / 2.0,
                )
            }
        };

        Ok(Self {
            viewport_width,
            viewport_height,
            columns,
            rows,
            cell_width: grid_width / columns as f64,
            cell_height: grid_height / rows as f64,
            offset_x,
            offset_y,
            anchor,
        })
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cell_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    pub fn cell_size(&self) -> (f64, f64) {
        (self.cell_width, self.cell_height)
    }

    pub fn offset(&self) -> (f64, f64) {
        (self.offset_x, self.offset_y)
    }

    pub fn viewport(&self) -> (u32, u32) {
        (self.viewport_width, self.viewport_height)
    }

    pub fn anchor(&self) -> AnchorMode {
        self.anchor
    }

    pub fn contains_cell(&self, col: u32, row: u32) -> bool {
        col < self.columns && row < self.rows
    }

    /// Pixel bounds of a cell in frame space, floored then clipped to the viewport.
    /// Cells lying fully outside the viewport come back empty.
    pub fn cell_bounds(&self, col: u32, row: u32) -> CellBounds {
        let clip = |v: f64, limit: u32| -> u32 { v.floor().clamp(0.0, limit as f64) as u32 };

        let x0 = self.offset_x + col as f64 * self.cell_width;
        let x1 = self.offset_x + (col as f64 + 1.0) * self.cell_width;
        let y0 = self.offset_y + row as f64 * self.cell_height;
        let y1 = self.offset_y + (row as f64 + 1.0) * self.cell_height;

        CellBounds {
            x0: clip(x0, self.viewport_width),
            y0: clip(y0, self.viewport_height),
            x1: clip(x1, self.viewport_width),
            y1: clip(y1, self.viewport_height),
        }
    }

    /// Unclipped destination rectangle of a cell in viewport space.
    pub fn cell_rect(&self, col: u32, row: u32) -> Rect {
        Rect {
            x: self.offset_x + col as f64 * self.cell_width,
            y: self.offset_y + row as f64 * self.cell_height,
            width: self.cell_width,
            height: self.cell_height,
        }
    }

    /// The proportional segment of a reference image that belongs to a cell.
    pub fn source_region(&self, col: u32, row: u32, image_width: u32, image_height: u32) -> Rect {
        source_region(self.columns, self.rows, col, row, image_width, image_height)
    }
}

/// Proportional source rectangle of cell `(col, row)` in an image, independent of
/// any viewport geometry.
pub fn source_region(
    columns: u32,
    rows: u32,
    col: u32,
    row: u32,
    image_width: u32,
    image_height: u32,
) -> Rect {
    let segment_width = image_width as f64 / columns.max(1) as f64;
    let segment_height = image_height as f64 / rows.max(1) as f64;
    Rect {
        x: col as f64 * segment_width,
        y: row as f64 * segment_height,
        width: segment_width,
        height: segment_height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fullscreen_spans_viewport() {
        let grid = Grid::configure(1920, 1080, 3, 4, AnchorMode::Fullscreen).unwrap();
        assert_eq!(grid.offset(), (0.0, 0.0));
        assert_eq!(grid.cell_size(), (640.0, 270.0));
        assert_eq!(
            grid.cell_bounds(2, 3),
            CellBounds {
                x0: 1280,
                y0: 810,
                x1: 1920,
                y1: 1080
            }
        );
    }

    #[test]
    fn centered_grid_is_offset_into_viewport() {
        let anchor = AnchorMode::Centered {
            width: 270.0,
            height: 480.0,
        };
        let grid = Grid::configure(640, 480, 2, 3, anchor).unwrap();
        assert_eq!(grid.offset(), (185.0, 0.0));
        assert_eq!(grid.cell_size(), (135.0, 160.0));
        assert_eq!(
            grid.cell_bounds(1, 0),
            CellBounds {
                x0: 320,
                y0: 0,
                x1: 455,
                y1: 160
            }
        );
    }

    #[test]
    fn bounds_floor_fractional_edges() {
        let grid = Grid::configure(10, 10, 3, 3, AnchorMode::Fullscreen).unwrap();
        let bounds = grid.cell_bounds(1, 1);
        assert_eq!((bounds.x0, bounds.x1), (3, 6));
        assert_eq!((bounds.y0, bounds.y1), (3, 6));
    }

    #[test]
    fn oversized_content_is_clipped() {
        let anchor = AnchorMode::Centered {
            width: 200.0,
            height: 100.0,
        };
        let grid = Grid::configure(100, 100, 4, 1, anchor).unwrap();
        assert_eq!(grid.offset(), (-50.0, 0.0));
        assert!(grid.cell_bounds(0, 0).is_empty());
        assert_eq!(grid.cell_bounds(1, 0).x0, 0);
        assert_eq!(grid.cell_bounds(2, 0).x1, 100);
        assert!(grid.cell_bounds(3, 0).is_empty());
    }

    #[test]
    fn cells_past_the_grid_are_empty() {
        let grid = Grid::configure(100, 100, 4, 2, AnchorMode::Fullscreen).unwrap();
        assert!(grid.cell_bounds(u32::MAX, 0).is_empty());
        assert!(grid.cell_bounds(0, u32::MAX).is_empty());
        assert!(grid.cell_bounds(4, 0).is_empty());
    }

    #[test]
    fn configure_is_idempotent() {
        let a = Grid::configure(800, 600, 4, 4, AnchorMode::Fullscreen).unwrap();
        let b = Grid::configure(800, 600, 4, 4, AnchorMode::Fullscreen).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_invalid_geometry() {
        assert_eq!(
            Grid::configure(10, 10, 0, 2, AnchorMode::Fullscreen),
            Err(RevealError::EmptyGrid {
                columns: 0,
                rows: 2
            })
        );
        assert!(matches!(
            Grid::configure(0, 10, 1, 1, AnchorMode::Fullscreen),
            Err(RevealError::EmptyViewport { .. })
        ));
        let anchor = AnchorMode::Centered {
            width: 0.0,
            height: 10.0,
        };
        assert!(matches!(
            Grid::configure(10, 10, 1, 1, anchor),
            Err(RevealError::InvalidContent { .. })
        ));
    }

    #[test]
    fn source_region_ignores_viewport_size() {
        let small = Grid::configure(100, 100, 3, 4, AnchorMode::Fullscreen).unwrap();
        let large = Grid::configure(4000, 3000, 3, 4, AnchorMode::Fullscreen).unwrap();
        let expected = Rect {
            x: 400.0,
            y: 300.0,
            width: 400.0,
            height: 150.0,
        };
        assert_eq!(small.source_region(1, 2, 1200, 600), expected);
        assert_eq!(large.source_region(1, 2, 1200, 600), expected);
    }
}
