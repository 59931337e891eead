//! Subregion descriptors.
//!
//! A [`Dataspace`] describes a table's full `rows x cols` extent and carries
//! the current rectangular selection. A [`Memspace`] describes the in-memory
//! side of a transfer: exactly one row of `cols` doubles.

use ndarray::{ArrayView1, SliceInfo, SliceInfoElem, s};

/// Rectangular selection `[offset, offset + count)` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hyperslab {
    pub offset: [u64; 2],
    pub count: [u64; 2],
}

impl Hyperslab {
    /// Selection covering one whole row (`row` is 1-based).
    pub fn row(row: usize, cols: usize) -> Self {
        Self {
            offset: [row.saturating_sub(1) as u64, 0],
            count: [1, cols as u64],
        }
    }

    /// Number of selected elements.
    pub fn len(&self) -> u64 {
        self.count[0] * self.count[1]
    }

    /// Whether the selection is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Why a selection was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionError {
    pub slab: Hyperslab,
    pub dims: [u64; 2],
}

impl std::fmt::Display for SelectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "selection offset {:?} count {:?} exceeds extent {:?}",
            self.slab.offset, self.slab.count, self.dims
        )
    }
}

/// Row selection handed to the HDF5 reader and writer.
pub type RowSlice = SliceInfo<[SliceInfoElem; 2], ndarray::Ix2, ndarray::Ix1>;

/// File-side extent of one table plus its current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataspace {
    dims: [u64; 2],
    selection: Option<Hyperslab>,
}

impl Dataspace {
    /// Dataspace for a `rows x cols` dataset with nothing selected.
    pub fn new(dims: [u64; 2]) -> Self {
        Self {
            dims,
            selection: None,
        }
    }

    /// Full extent.
    pub fn dims(&self) -> [u64; 2] {
        self.dims
    }

    /// Replace the current selection.
    pub fn select_hyperslab(&mut self, slab: Hyperslab) -> Result<(), SelectionError> {
        let fits = (0..2).all(|axis| {
            slab.count[axis] > 0
                && slab.offset[axis]
                    .checked_add(slab.count[axis])
                    .is_some_and(|end| end <= self.dims[axis])
        });
        if !fits {
            self.selection = None;
            return Err(SelectionError {
                slab,
                dims: self.dims,
            });
        }
        self.selection = Some(slab);
        Ok(())
    }

    /// Current selection.
    pub fn selection(&self) -> Option<Hyperslab> {
        self.selection
    }

    /// 0-based row of a single-row selection.
    pub fn selected_row(&self) -> Option<u64> {
        self.selection
            .filter(|slab| {
                slab.count[0] == 1 && slab.offset[1] == 0 && slab.count[1] == self.dims[1]
            })
            .map(|slab| slab.offset[0])
    }

    /// The current single-row selection as an HDF5 slice.
    pub fn row_slice(&self) -> Option<RowSlice> {
        self.selected_row().map(|row| s![row as usize, ..])
    }
}

/// Memory-side descriptor for one row transfer.
///
/// Sized for exactly `cols` elements: callers' buffers may be longer (legacy
/// slack), but only the first `cols` values are ever touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Memspace {
    cols: usize,
}

impl Memspace {
    /// Memspace for rows of `cols` doubles.
    pub fn new(cols: usize) -> Self {
        Self { cols }
    }

    /// Elements per transfer.
    pub fn len(&self) -> usize {
        self.cols
    }

    /// Whether the memspace holds zero elements.
    pub fn is_empty(&self) -> bool {
        self.cols == 0
    }

    /// The transferred part of `values`.
    pub fn view<'a>(&self, values: &'a [f64]) -> ArrayView1<'a, f64> {
        ArrayView1::from(&values[..self.cols])
    }

    /// Copy a row read from the file into the transferred part of `out`.
    ///
    /// Returns `false` when `row` does not hold exactly `cols` values.
    pub fn scatter(&self, row: ArrayView1<'_, f64>, out: &mut [f64]) -> bool {
        if row.len() != self.cols {
            return false;
        }
        for (dst, src) in out[..self.cols].iter_mut().zip(row.iter()) {
            *dst = *src;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_selection() {
        let mut space = Dataspace::new([3, 3]);
        space.select_hyperslab(Hyperslab::row(2, 3)).unwrap();
        assert_eq!(space.selected_row(), Some(1));
        assert_eq!(space.selection().unwrap().len(), 3);
        assert!(space.row_slice().is_some());
    }

    #[test]
    fn test_selection_past_last_row() {
        let mut space = Dataspace::new([3, 3]);
        let err = space.select_hyperslab(Hyperslab::row(4, 3)).unwrap_err();
        assert_eq!(err.dims, [3, 3]);
        assert_eq!(space.selection(), None);
        assert!(space.row_slice().is_none());
    }

    #[test]
    fn test_selection_wider_than_extent() {
        let mut space = Dataspace::new([3, 3]);
        assert!(space.select_hyperslab(Hyperslab::row(1, 4)).is_err());
    }

    #[test]
    fn test_partial_row_is_not_a_row_selection() {
        let mut space = Dataspace::new([3, 3]);
        space
            .select_hyperslab(Hyperslab {
                offset: [0, 1],
                count: [1, 2],
            })
            .unwrap();
        assert_eq!(space.selected_row(), None);
    }

    #[test]
    fn test_memspace_view_and_scatter() {
        let mem = Memspace::new(2);
        assert_eq!(mem.len(), 2);
        assert_eq!(mem.view(&[1.0, 2.0, 99.0]).to_vec(), vec![1.0, 2.0]);

        let mut out = [-1.0; 4];
        assert!(mem.scatter(ArrayView1::from(&[5.0, 6.0][..]), &mut out));
        assert_eq!(out, [5.0, 6.0, -1.0, -1.0]);
        assert!(!mem.scatter(ArrayView1::from(&[5.0][..]), &mut out));
    }
}
