//! Main Grid type

use std::sync::{Arc, OnceLock};

use ndarray::{Array2, ArrayView2};

use crate::error::{Error, Result};
use crate::raster::{Cell, GridInfo, Statistics};

/// An immutable, georeferenced grid of nullable cells.
///
/// Cells are stored row-major: `data[(y, x)]` is column `x` of row `y`.
/// A grid never changes after construction; every map-algebra transform
/// builds a new grid that shares the same [`GridInfo`].
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use mapalg_core::{Grid, GridInfo};
///
/// let info = Arc::new(GridInfo::unit(3, 2)?);
/// let grid = Grid::from_rows(info, vec![
///     vec![Some(1.0), Some(2.0), None],
///     vec![Some(4.0), Some(5.0), Some(6.0)],
/// ])?;
///
/// assert_eq!(grid.at(1, 0), Some(2.0));
/// assert_eq!(grid.at(2, 0), None);  // NoData
/// assert_eq!(grid.at(3, 0), None);  // out of bounds
/// ```
#[derive(Debug)]
pub struct Grid {
    info: Arc<GridInfo>,
    data: Array2<Cell>,
    stats: OnceLock<Statistics>,
}

impl Grid {
    /// Create a grid from an array shaped `(height, width)`.
    pub fn new(info: Arc<GridInfo>, data: Array2<Cell>) -> Result<Self> {
        let (rows, cols) = data.dim();
        if rows != info.height() || cols != info.width() {
            return Err(Error::DimensionMismatch {
                expected: info.shape(),
                actual: (cols, rows),
            });
        }

        // Row slices rely on standard layout.
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };

        Ok(Self {
            info,
            data,
            stats: OnceLock::new(),
        })
    }

    /// Create a grid from a sequence of rows.
    ///
    /// Fails unless there are exactly `height` rows of exactly `width` cells.
    pub fn from_rows(info: Arc<GridInfo>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        let (width, height) = info.shape();

        if rows.len() != height {
            return Err(Error::DimensionMismatch {
                expected: (width, height),
                actual: (rows.first().map_or(0, Vec::len), rows.len()),
            });
        }
        if let Some(bad) = rows.iter().find(|r| r.len() != width) {
            return Err(Error::DimensionMismatch {
                expected: (width, height),
                actual: (bad.len(), height),
            });
        }

        let flat: Vec<Cell> = rows.into_iter().flatten().collect();
        Self::from_cells(info, flat)
    }

    /// Create a grid from row-major cells.
    ///
    /// A wrong cell count is reported as a `(len, 1)` shape.
    pub fn from_cells(info: Arc<GridInfo>, cells: Vec<Cell>) -> Result<Self> {
        let (width, height) = info.shape();
        if cells.len() != width * height {
            return Err(Error::DimensionMismatch {
                expected: (width, height),
                actual: (cells.len(), 1),
            });
        }
        let data = Array2::from_shape_vec((height, width), cells)
            .map_err(|e| Error::Algorithm(e.to_string()))?;
        Self::new(info, data)
    }

    /// Create a grid from row-major values with no NoData cells.
    pub fn from_values(info: Arc<GridInfo>, values: Vec<f32>) -> Result<Self> {
        Self::from_cells(info, values.into_iter().map(Some).collect())
    }

    /// Create a grid with every cell set to `value`.
    pub fn filled(info: Arc<GridInfo>, value: Cell) -> Self {
        let data = Array2::from_elem((info.height(), info.width()), value);
        Self {
            info,
            data,
            stats: OnceLock::new(),
        }
    }

    // Dimensions

    pub fn width(&self) -> usize {
        self.info.width()
    }

    pub fn height(&self) -> usize {
        self.info.height()
    }

    /// `(width, height)`
    pub fn shape(&self) -> (usize, usize) {
        self.info.shape()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false: `GridInfo` rejects zero dimensions.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Metadata

    pub fn info(&self) -> &GridInfo {
        &self.info
    }

    /// The shared metadata handle, for building derived grids.
    pub fn shared_info(&self) -> &Arc<GridInfo> {
        &self.info
    }

    /// Whether `other` has the same width and height, as an error if not.
    pub fn ensure_same_shape(&self, other: &Grid) -> Result<()> {
        if self.info.same_shape(&other.info) {
            Ok(())
        } else {
            Err(Error::DimensionMismatch {
                expected: self.shape(),
                actual: other.shape(),
            })
        }
    }

    // Data access

    /// Cell at column `x`, row `y`.
    ///
    /// Out-of-range indices yield `None`, the same as NoData.
    pub fn at(&self, x: i64, y: i64) -> Cell {
        if x < 0 || y < 0 || x as usize >= self.width() || y as usize >= self.height() {
            return None;
        }
        self.data[(y as usize, x as usize)]
    }

    /// Cell containing the geographic coordinate `(x, y)`.
    ///
    /// Coordinates outside the extent yield `None`.
    pub fn at_coord(&self, x: f64, y: f64) -> Cell {
        let (ix, iy) = self.info.coord_to_index(x, y)?;
        self.at(ix, iy)
    }

    /// Row `y` as a slice, or `None` if out of range.
    pub fn row(&self, y: usize) -> Option<&[Cell]> {
        if y >= self.height() {
            return None;
        }
        self.data.row(y).to_slice()
    }

    /// Iterate over row slices, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> + '_ {
        (0..self.height()).filter_map(move |y| self.row(y))
    }

    /// Iterate over all cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.data.iter()
    }

    /// Owned copy of the rows.
    pub fn to_rows(&self) -> Vec<Vec<Cell>> {
        self.rows().map(<[Cell]>::to_vec).collect()
    }

    /// View of the underlying `(height, width)` array.
    pub fn view(&self) -> ArrayView2<'_, Cell> {
        self.data.view()
    }

    /// Whether both grids hold the same cell sequence.
    ///
    /// Metadata is ignored; NoData equals NoData.
    pub fn same_cells(&self, other: &Grid) -> bool {
        self.shape() == other.shape() && self.data == other.data
    }

    /// Text dump with one line per row.
    pub fn render<F>(&self, replace: F) -> String
    where
        F: Fn(Cell) -> String,
    {
        let mut out = String::with_capacity(self.len() + self.height());
        for row in self.rows() {
            for &cell in row {
                out.push_str(&replace(cell));
            }
            out.push('\n');
        }
        out
    }

    // Statistics

    /// Global statistics, computed on first use and cached.
    pub fn statistics(&self) -> &Statistics {
        self.stats.get_or_init(|| Statistics::from_cells(self.data.iter()))
    }

    pub fn average(&self) -> Option<f32> {
        self.statistics().average
    }

    pub fn max(&self) -> Option<f32> {
        self.statistics().max
    }

    pub fn min(&self) -> Option<f32> {
        self.statistics().min
    }

    pub fn range(&self) -> Option<f32> {
        self.statistics().range
    }

    pub fn stdev(&self) -> Option<f32> {
        self.statistics().stdev
    }
}

impl Clone for Grid {
    fn clone(&self) -> Self {
        let stats = OnceLock::new();
        if let Some(s) = self.stats.get() {
            let _ = stats.set(*s);
        }
        Self {
            info: Arc::clone(&self.info),
            data: self.data.clone(),
            stats,
        }
    }
}
