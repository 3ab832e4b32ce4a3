// THEORY:
// A `CellTable` is the storage shared by every per-cell layer (motion, revealed,
// brightness, scores). It is a flat `Vec` plus its dimensions, so the length always
// equals `columns * rows`. Every constructor, deserialization included, upholds that
// length; indexing relies on it.

#[cfg(feature = "serde")]
use crate::error::RevealError;

/// A dense per-cell table addressed by `(col, row)`.
///
/// Storage is column-major (`index = col * rows + row`), so `columns()` yields the
/// nested `[col][row]` layout renderers expect without reshuffling.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(
        try_from = "RawCellTable<T>",
        bound(deserialize = "T: serde::Deserialize<'de>")
    )
)]
pub struct CellTable<T> {
    columns: u32,
    rows: u32,
    cells: Vec<T>,
}

impl<T: Clone> CellTable<T> {
    pub fn new(columns: u32, rows: u32, initial: T) -> Self {
        Self {
            columns,
            rows,
            cells: vec![initial; columns as usize * rows as usize],
        }
    }

    /// Nested column-major copy: `result[col][row]`.
    pub fn columns(&self) -> Vec<Vec<T>> {
        self.cells
            .chunks(self.rows.max(1) as usize)
            .map(|column| column.to_vec())
            .collect()
    }

    /// Sets every cell to `value`.
    pub fn fill(&mut self, value: T) {
        self.cells.iter_mut().for_each(|cell| *cell = value.clone());
    }
}

impl<T> CellTable<T> {
    /// Builds a table by evaluating `f(col, row)` for every cell.
    pub fn from_fn(columns: u32, rows: u32, mut f: impl FnMut(u32, u32) -> T) -> Self {
        let mut cells = Vec::with_capacity(columns as usize * rows as usize);
        for col in 0..columns {
            for row in 0..rows {
                cells.push(f(col, row));
            }
        }
        Self {
            columns,
            rows,
            cells,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn index_of(&self, col: u32, row: u32) -> Option<usize> {
        (col < self.columns && row < self.rows)
            .then(|| col as usize * self.rows as usize + row as usize)
    }

    /// `(col, row)` of a flat index.
    #[inline]
    pub fn coords_of(&self, index: usize) -> (u32, u32) {
        let rows = self.rows.max(1) as usize;
        ((index / rows) as u32, (index % rows) as u32)
    }

    pub fn get(&self, col: u32, row: u32) -> Option<&T> {
        self.index_of(col, row).map(|i| &self.cells[i])
    }

    pub fn get_mut(&mut self, col: u32, row: u32) -> Option<&mut T> {
        self.index_of(col, row).map(move |i| &mut self.cells[i])
    }

    pub fn as_slice(&self) -> &[T] {
        &self.cells
    }

    /// Iterates `((col, row), value)` in column-major order.
    pub fn iter(&self) -> impl Iterator<Item = ((u32, u32), &T)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, value)| (self.coords_of(i), value))
    }
}

/// Unchecked wire shape of a `CellTable`.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawCellTable<T> {
    columns: u32,
    rows: u32,
    cells: Vec<T>,
}

#[cfg(feature = "serde")]
impl<T> TryFrom<RawCellTable<T>> for CellTable<T> {
    type Error = RevealError;

    fn try_from(raw: RawCellTable<T>) -> Result<Self, Self::Error> {
        let expected = raw.columns as usize * raw.rows as usize;
        if raw.cells.len() != expected {
            return Err(RevealError::CellCountMismatch {
                expected,
                actual: raw.cells.len(),
            });
        }
        Ok(Self {
            columns: raw.columns,
            rows: raw.rows,
            cells: raw.cells,
        })
    }
}
