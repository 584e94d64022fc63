//! Focal (neighborhood) map algebra.
//!
//! For each cell, the values of the cells inside a square or circular
//! window centred on it are gathered and reduced to one output value.
//! Offsets that fall outside the grid are skipped, so windows shrink at the
//! edges; NoData cells inside the grid are gathered as NoData.
//!
//! Neighbors are gathered in column-major offset order: `dx` from `-r` to
//! `r`, and within each `dx`, `dy` from `-r` to `r`. Offsets that cannot
//! reach any cell of the grid are dropped up front, so a radius larger than
//! the grid behaves like the largest radius that fits.

use mapalg_core::{Cell, Grid, Neighborhood, Result};
use ndarray::ArrayView2;
use tracing::debug;

use crate::parallel::ProcessingMode;

/// Reduction applied to each window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocalStatistic {
    /// Arithmetic mean
    #[default]
    Average,
    Max,
    Min,
    /// Max minus min
    Range,
    Sum,
    /// Population standard deviation
    StdDev,
}

impl FocalStatistic {
    /// Reduce a window to one cell.
    ///
    /// Any NoData value in the window makes the result NoData.
    pub fn aggregate(&self, values: &[Cell]) -> Cell {
        if values.is_empty() || values.iter().any(Option::is_none) {
            return None;
        }
        let valid = values.iter().flatten().copied();

        let result = match self {
            FocalStatistic::Sum => valid.map(f64::from).sum::<f64>() as f32,
            FocalStatistic::Average => mean(valid) as f32,
            FocalStatistic::Max => valid.fold(f32::NEG_INFINITY, f32::max),
            FocalStatistic::Min => valid.fold(f32::INFINITY, f32::min),
            FocalStatistic::Range => {
                let (lo, hi) = valid.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
                    (lo.min(v), hi.max(v))
                });
                hi - lo
            }
            FocalStatistic::StdDev => {
                let m = mean(valid.clone());
                let n = values.len() as f64;
                let var = valid.map(|v| (f64::from(v) - m).powi(2)).sum::<f64>() / n;
                var.sqrt() as f32
            }
        };
        Some(result)
    }
}

fn mean(values: impl Iterator<Item = f32>) -> f64 {
    let (sum, n) = values.fold((0.0f64, 0usize), |(s, n), v| (s + f64::from(v), n + 1));
    sum / n as f64
}

/// Parameters for focal statistics
#[derive(Debug, Clone)]
pub struct FocalParams {
    /// Window radius in cells (0 = the cell itself)
    pub radius: i64,
    /// Circular window instead of square
    pub circular: bool,
    pub statistic: FocalStatistic,
    pub mode: ProcessingMode,
}

impl Default for FocalParams {
    fn default() -> Self {
        Self {
            radius: 1,
            circular: false,
            statistic: FocalStatistic::Average,
            mode: ProcessingMode::default(),
        }
    }
}

/// Compute a focal statistic over every cell.
///
/// # Example
///
/// ```ignore
/// use mapalg_algorithms::focal::{focal_statistics, FocalParams, FocalStatistic};
///
/// let smoothed = focal_statistics(&dem, &FocalParams {
///     radius: 2,
///     circular: true,
///     statistic: FocalStatistic::Average,
///     ..Default::default()
/// })?;
/// ```
pub fn focal_statistics(grid: &Grid, params: &FocalParams) -> Result<Grid> {
    let neighborhood = Neighborhood::from_radius(params.radius, params.circular)?;
    let statistic = params.statistic;
    focal_with(grid, neighborhood, params.mode, move |values| {
        statistic.aggregate(values)
    })
}

/// Apply `f` to the neighborhood of every cell.
///
/// `radius` must be non-negative; `circle` selects a circular window.
pub fn focal<F>(grid: &Grid, radius: i64, circle: bool, f: F) -> Result<Grid>
where
    F: Fn(&[Cell]) -> Cell + Sync + Send,
{
    let neighborhood = Neighborhood::from_radius(radius, circle)?;
    focal_with(grid, neighborhood, ProcessingMode::default(), f)
}

/// [`focal`] with an explicit window and processing mode.
pub fn focal_with<F>(
    grid: &Grid,
    neighborhood: Neighborhood,
    mode: ProcessingMode,
    f: F,
) -> Result<Grid>
where
    F: Fn(&[Cell]) -> Cell + Sync + Send,
{
    let offsets = neighborhood.offsets_within(grid.width(), grid.height());
    debug!(
        "Focal {:?} over {}x{} grid ({} offsets)",
        neighborhood,
        grid.width(),
        grid.height(),
        offsets.len()
    );

    let view = grid.view();
    let rows = mode.map_rows(grid.height(), |y| {
        let mut window = Vec::with_capacity(offsets.len());
        (0..grid.width())
            .map(|x| {
                gather(&view, x, y, &offsets, &mut window);
                f(&window)
            })
            .collect::<Vec<Cell>>()
    })?;
    Grid::from_rows(grid.shared_info().clone(), rows)
}

/// Apply `f` to the matching neighborhoods of two grids.
///
/// Both slices passed to `f` have the same length and the same offset order.
pub fn focal2<F>(a: &Grid, b: &Grid, radius: i64, circle: bool, f: F) -> Result<Grid>
where
    F: Fn(&[Cell], &[Cell]) -> Cell + Sync + Send,
{
    a.ensure_same_shape(b)?;
    let offsets = Neighborhood::from_radius(radius, circle)?.offsets_within(a.width(), a.height());

    let (va, vb) = (a.view(), b.view());
    let rows = ProcessingMode::default().map_rows(a.height(), |y| {
        let mut wa = Vec::with_capacity(offsets.len());
        let mut wb = Vec::with_capacity(offsets.len());
        (0..a.width())
            .map(|x| {
                gather(&va, x, y, &offsets, &mut wa);
                gather(&vb, x, y, &offsets, &mut wb);
                f(&wa, &wb)
            })
            .collect::<Vec<Cell>>()
    })?;
    Grid::from_rows(a.shared_info().clone(), rows)
}

/// Collect the in-bounds neighbors of `(x, y)` into `out`.
fn gather(
    view: &ArrayView2<'_, Cell>,
    x: usize,
    y: usize,
    offsets: &[(isize, isize)],
    out: &mut Vec<Cell>,
) {
    out.clear();
    let (rows, cols) = view.dim();
    for &(dx, dy) in offsets {
        let nx = x as isize + dx;
        let ny = y as isize + dy;
        if nx < 0 || ny < 0 || nx as usize >= cols || ny as usize >= rows {
            continue;
        }
        out.push(view[(ny as usize, nx as usize)]);
    }
}

macro_rules! focal_shorthand {
    ($($(#[$doc:meta])* $name:ident => $stat:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(grid: &Grid, radius: i64, circle: bool) -> Result<Grid> {
                focal_statistics(
                    grid,
                    &FocalParams {
                        radius,
                        circular: circle,
                        statistic: FocalStatistic::$stat,
                        mode: ProcessingMode::default(),
                    },
                )
            }
        )*
    };
}

focal_shorthand! {
    /// Neighborhood mean
    focal_average => Average;
    /// Neighborhood maximum
    focal_max => Max;
    /// Neighborhood minimum
    focal_min => Min;
    /// Neighborhood max minus min
    focal_range => Range;
    /// Neighborhood sum
    focal_sum => Sum;
    /// Neighborhood population standard deviation
    focal_stdev => StdDev;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use mapalg_core::{Error, GridInfo};
    use std::sync::Arc;

    fn sequence(width: usize, height: usize) -> Grid {
        let info = Arc::new(GridInfo::unit(width, height).unwrap());
        Grid::from_values(info, (0..width * height).map(|v| v as f32).collect()).unwrap()
    }

    fn ones(width: usize, height: usize) -> Grid {
        Grid::filled(Arc::new(GridInfo::unit(width, height).unwrap()), Some(1.0))
    }

    #[test]
    fn test_window_counts_shrink_at_edges() {
        let counts = focal(&ones(5, 5), 1, false, |w| Some(w.len() as f32)).unwrap();
        assert_eq!(counts.at(0, 0), Some(4.0));
        assert_eq!(counts.at(2, 0), Some(6.0));
        assert_eq!(counts.at(2, 2), Some(9.0));
        assert_eq!(counts.at(4, 4), Some(4.0));
    }

    #[test]
    fn test_circular_window_counts() {
        let counts = focal(&ones(7, 7), 2, true, |w| Some(w.len() as f32)).unwrap();
        assert_eq!(counts.at(3, 3), Some(13.0));
        // Corner: (0,0), (1,0), (2,0), (0,1), (1,1), (0,2)
        assert_eq!(counts.at(0, 0), Some(6.0));
    }

    #[test]
    fn test_radius_zero_is_identity() {
        let g = sequence(4, 3);
        let out = focal(&g, 0, false, |w| w[0]).unwrap();
        assert!(out.same_cells(&g));
    }

    #[test]
    fn test_negative_radius() {
        let g = sequence(3, 3);
        assert!(matches!(
            focal(&g, -1, false, |w| w[0]),
            Err(Error::InvalidRadius(-1))
        ));
        assert!(focal_sum(&g, -2, true).is_err());
    }

    #[test]
    fn test_offset_order() {
        // 3x3 grid 0..9: the centre window walks columns, top to bottom
        let g = sequence(3, 3);
        let expected: Vec<Cell> = [0, 3, 6, 1, 4, 7, 2, 5, 8]
            .iter()
            .map(|&v| Some(v as f32))
            .collect();
        let out = focal(&g, 1, false, |w| {
            Some(if w == expected.as_slice() { 1.0 } else { 0.0 })
        })
        .unwrap();
        assert_eq!(out.at(1, 1), Some(1.0));

        let second = focal(&g, 1, false, |w| w[1]).unwrap();
        assert_eq!(second.at(1, 1), Some(3.0));
    }

    #[test]
    fn test_radius_beyond_grid_covers_whole_grid() {
        let g = sequence(3, 3);
        for radius in [3, 1000, 1i64 << 40, i64::MAX] {
            for circle in [false, true] {
                let sum = focal_sum(&g, radius, circle).unwrap();
                assert!(sum.cells().all(|&c| c == Some(36.0)), "radius {}", radius);
            }
        }

        let wide = sequence(7, 2);
        let max = focal_max(&wide, 1i64 << 40, true).unwrap();
        assert!(max.cells().all(|&c| c == Some(13.0)));
        let pairs = focal2(&wide, &wide, i64::MAX, false, |a, b| Some((a.len() + b.len()) as f32)).unwrap();
        assert!(pairs.cells().all(|&c| c == Some(28.0)));
    }

    #[test]
    fn test_focal_sum_and_average() {
        let g = sequence(3, 3);
        let sum = focal_sum(&g, 1, false).unwrap();
        assert_eq!(sum.at(1, 1), Some(36.0));
        // 0 + 1 + 3 + 4
        assert_eq!(sum.at(0, 0), Some(8.0));

        let avg = focal_average(&g, 1, false).unwrap();
        assert_eq!(avg.at(1, 1), Some(4.0));
        assert_eq!(avg.at(0, 0), Some(2.0));
    }

    #[test]
    fn test_focal_extrema() {
        let g = sequence(3, 3);
        assert_eq!(focal_max(&g, 1, false).unwrap().at(0, 0), Some(4.0));
        assert_eq!(focal_min(&g, 1, false).unwrap().at(2, 2), Some(4.0));
        assert_eq!(focal_range(&g, 1, false).unwrap().at(1, 1), Some(8.0));
    }

    #[test]
    fn test_focal_stdev() {
        let g = sequence(3, 1);
        // window at (1,0): [0, 1, 2], population stdev sqrt(2/3)
        let sd = focal_stdev(&g, 1, false).unwrap();
        assert_abs_diff_eq!(sd.at(1, 0).unwrap(), (2.0f32 / 3.0).sqrt(), epsilon = 1e-6);
        assert_eq!(focal_stdev(&ones(3, 3), 1, true).unwrap().at(1, 1), Some(0.0));
    }

    #[test]
    fn test_nodata_propagates_through_aggregates() {
        let info = Arc::new(GridInfo::unit(3, 1).unwrap());
        let g = Grid::from_cells(info, vec![Some(1.0), None, Some(3.0)]).unwrap();

        let out = focal_sum(&g, 1, false).unwrap();
        assert_eq!(out.to_rows(), vec![vec![None, None, None]]);

        let out = focal_sum(&g, 0, false).unwrap();
        assert_eq!(out.to_rows(), vec![vec![Some(1.0), None, Some(3.0)]]);
    }

    #[test]
    fn test_aggregate_directly() {
        let w = [Some(2.0), Some(4.0), Some(4.0), Some(4.0), Some(5.0), Some(5.0), Some(7.0), Some(9.0)];
        assert_eq!(FocalStatistic::StdDev.aggregate(&w), Some(2.0));
        assert_eq!(FocalStatistic::Average.aggregate(&w), Some(5.0));
        assert_eq!(FocalStatistic::Range.aggregate(&w), Some(7.0));
        assert_eq!(FocalStatistic::Sum.aggregate(&[]), None);
    }

    #[test]
    fn test_focal2() {
        let a = sequence(3, 3);
        let b = ones(3, 3);
        let out = focal2(&a, &b, 1, false, |wa, wb| {
            assert_eq!(wa.len(), wb.len());
            Some(wa.iter().zip(wb).map(|(x, y)| x.unwrap() * y.unwrap()).sum())
        })
        .unwrap();
        assert!(out.same_cells(&focal_sum(&a, 1, false).unwrap()));

        let short = ones(2, 3);
        assert!(matches!(
            focal2(&a, &short, 1, false, |wa, _| wa[0]),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_modes_agree() {
        let g = sequence(17, 11);
        let mut params = FocalParams {
            radius: 2,
            circular: true,
            statistic: FocalStatistic::StdDev,
            mode: ProcessingMode::Sequential,
        };
        let seq = focal_statistics(&g, &params).unwrap();
        params.mode = ProcessingMode::ParallelWith(4);
        let par = focal_statistics(&g, &params).unwrap();
        assert!(seq.same_cells(&par));
    }
}
