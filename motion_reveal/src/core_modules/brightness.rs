// THEORY:
// Brightness precomputation summarizes the static reference image once, when it
// becomes available, into one mean luminance per cell. The result rides along on
// every reveal event so downstream consumers (sound, lighting) can react to how
// bright the uncovered segment is.
//
// Regions are proportional: cell (col, row) owns
// [floor(col/cols * W), floor((col+1)/cols * W)) horizontally, and the same for rows.
// Because the mapping only involves `columns`, `rows` and the image size, the
// table never changes when the viewport is resized.

use crate::core_modules::cell_table::CellTable;
use crate::core_modules::frame::FrameBuffer;
use crate::core_modules::pixel::pixel::MILLI_SCALE;
use tracing::debug;

/// Computes the per-cell mean luminance (0..=255) of `image`.
///
/// `stride` subsamples both axes; values below 1 are treated as 1. Regions that
/// are empty because the image is smaller than the grid get brightness 0.
pub fn compute_brightness(image: &FrameBuffer, columns: u32, rows: u32, stride: u32) -> CellTable<f64> {
    let stride = stride.max(1);
    let (width, height) = image.dimensions();
    let edge = |index: u32, count: u32, extent: u32| -> u32 {
        (index as f64 / count as f64 * extent as f64).floor() as u32
    };

    let table = CellTable::from_fn(columns, rows, |col, row| {
        let x0 = edge(col, columns, width);
        let x1 = edge(col + 1, columns, width).min(width);
        let y0 = edge(row, rows, height);
        let y1 = edge(row + 1, rows, height).min(height);

        let mut total: u64 = 0;
        let mut count: u64 = 0;
        for y in (y0..y1).step_by(stride as usize) {
            for x in (x0..x1).step_by(stride as usize) {
                if let Some(luma) = image.milli_luminance(x, y) {
                    total += luma as u64;
                    count += 1;
                }
            }
        }

        if count == 0 {
            0.0
        } else {
            total as f64 / count as f64 / MILLI_SCALE
        }
    });

    if tracing::enabled!(tracing::Level::DEBUG) {
        for row in 0..rows {
            let line: Vec<String> = (0..columns)
                .filter_map(|col| table.get(col, row))
                .map(|b| format!("{b:.1}"))
                .collect();
            debug!(row, brightness = %line.join(" "), "reference brightness");
        }
    }

    table
}
