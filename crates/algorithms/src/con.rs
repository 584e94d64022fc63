//! Conditional selection.

use mapalg_core::raster::is_true;
use mapalg_core::{Cell, Grid, Result};

use crate::local::{local, local2, local3, Operand};

/// Pick from `when_true` where the predicate is exactly 1.0, otherwise from `when_false`.
///
/// Either branch may be a grid or a constant. Grid branches must match the
/// predicate's shape. A NoData predicate cell yields NoData.
///
/// # Example
///
/// ```ignore
/// use mapalg_algorithms::{con, greater};
///
/// // Clamp negative values to zero
/// let clamped = con(&greater(&dem, 0.0)?, &dem, 0.0)?;
/// ```
pub fn con<'a>(
    predicate: &Grid,
    when_true: impl Into<Operand<'a>>,
    when_false: impl Into<Operand<'a>>,
) -> Result<Grid> {
    match (when_true.into(), when_false.into()) {
        (Operand::Grid(t), Operand::Grid(f)) => local3(predicate, t, f, select),
        (Operand::Grid(t), Operand::Scalar(f)) => local2(predicate, t, |p, t| select(p, t, f)),
        (Operand::Scalar(t), Operand::Grid(f)) => local2(predicate, f, |p, f| select(p, t, f)),
        (Operand::Scalar(t), Operand::Scalar(f)) => local(predicate, |p| select(p, t, f)),
    }
}

fn select(predicate: Cell, when_true: Cell, when_false: Cell) -> Cell {
    if is_true(predicate?) {
        when_true
    } else {
        when_false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapalg_core::{Error, GridInfo};
    use std::sync::Arc;

    fn row(cells: Vec<Cell>) -> Grid {
        let info = GridInfo::unit(cells.len(), 1).unwrap();
        Grid::from_cells(Arc::new(info), cells).unwrap()
    }

    #[test]
    fn test_all_grids() {
        let p = row(vec![Some(1.0), Some(0.0), Some(2.0), None]);
        let t = row(vec![Some(10.0), Some(11.0), Some(12.0), Some(13.0)]);
        let f = row(vec![Some(20.0), Some(21.0), Some(22.0), Some(23.0)]);

        let out = con(&p, &t, &f).unwrap();
        assert_eq!(out.to_rows(), vec![vec![Some(10.0), Some(21.0), Some(22.0), None]]);
    }

    #[test]
    fn test_scalar_branches() {
        let p = row(vec![Some(1.0), Some(0.0), None]);
        let g = row(vec![Some(5.0), Some(6.0), Some(7.0)]);

        assert_eq!(
            con(&p, &g, -1.0).unwrap().to_rows(),
            vec![vec![Some(5.0), Some(-1.0), None]]
        );
        assert_eq!(
            con(&p, -1.0, &g).unwrap().to_rows(),
            vec![vec![Some(-1.0), Some(6.0), None]]
        );
        assert_eq!(
            con(&p, 1.0, 0.0).unwrap().to_rows(),
            vec![vec![Some(1.0), Some(0.0), None]]
        );
    }

    #[test]
    fn test_nodata_branch_is_selected_as_is() {
        let p = row(vec![Some(1.0), Some(0.0)]);
        let out = con(&p, None::<f32>, 3.0).unwrap();
        assert_eq!(out.to_rows(), vec![vec![None, Some(3.0)]]);
    }

    #[test]
    fn test_shape_mismatch() {
        let p = row(vec![Some(1.0), Some(0.0)]);
        let t = row(vec![Some(1.0)]);
        assert!(matches!(con(&p, &t, 0.0), Err(Error::DimensionMismatch { .. })));
        assert!(matches!(con(&p, 0.0, &t), Err(Error::DimensionMismatch { .. })));
    }
}
