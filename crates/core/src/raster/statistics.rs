//! Global statistics over the valid cells of a grid

use serde::{Deserialize, Serialize};

use super::Cell;

/// Summary statistics of a grid.
///
/// NoData cells are excluded. Every aggregate is `None` when the grid has no
/// valid cell. Standard deviation uses the population formula (divide by N).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub average: Option<f32>,
    pub max: Option<f32>,
    pub min: Option<f32>,
    pub range: Option<f32>,
    pub stdev: Option<f32>,
    pub valid_count: usize,
    pub nodata_count: usize,
}

impl Statistics {
    /// Compute statistics over a sequence of cells.
    pub fn from_cells<'a, I>(cells: I) -> Self
    where
        I: IntoIterator<Item = &'a Cell>,
    {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut valid_count = 0usize;
        let mut nodata_count = 0;
        // Welford's running mean and sum of squared deviations
        let mut mean = 0.0f64;
        let mut m2 = 0.0f64;

        for cell in cells {
            match *cell {
                Some(v) => {
                    min = min.min(v);
                    max = max.max(v);
                    valid_count += 1;
                    let x = f64::from(v);
                    let delta = x - mean;
                    mean += delta / valid_count as f64;
                    m2 += delta * (x - mean);
                }
                None => nodata_count += 1,
            }
        }

        if valid_count == 0 {
            return Self {
                average: None,
                max: None,
                min: None,
                range: None,
                stdev: None,
                valid_count: 0,
                nodata_count,
            };
        }

        let var = m2 / valid_count as f64;

        Self {
            average: Some(mean as f32),
            max: Some(max),
            min: Some(min),
            range: Some(max - min),
            stdev: Some(var.sqrt() as f32),
            valid_count,
            nodata_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_constant_cells() {
        let cells = vec![Some(7.5f32); 12];
        let stats = Statistics::from_cells(&cells);
        assert_eq!(stats.average, Some(7.5));
        assert_eq!(stats.max, Some(7.5));
        assert_eq!(stats.min, Some(7.5));
        assert_eq!(stats.range, Some(0.0));
        assert_eq!(stats.stdev, Some(0.0));
        assert_eq!(stats.valid_count, 12);
    }

    #[test]
    fn test_population_stdev() {
        let cells = vec![Some(2.0), Some(4.0), Some(4.0), Some(4.0), Some(5.0), Some(5.0), Some(7.0), Some(9.0)];
        let stats = Statistics::from_cells(&cells);
        assert_relative_eq!(stats.average.unwrap(), 5.0);
        assert_relative_eq!(stats.stdev.unwrap(), 2.0);
        assert_eq!(stats.range, Some(7.0));
    }

    #[test]
    fn test_nodata_excluded() {
        let cells = vec![Some(1.0), None, Some(3.0), None];
        let stats = Statistics::from_cells(&cells);
        assert_eq!(stats.average, Some(2.0));
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.max, Some(3.0));
        assert_eq!(stats.valid_count, 2);
        assert_eq!(stats.nodata_count, 2);
    }

    #[test]
    fn test_large_offset_is_stable() {
        // Naive sum-of-squares loses everything to cancellation here
        let cells: Vec<Cell> = (0..10_000)
            .map(|i| Some(1.0e6 + if i % 2 == 0 { 1.0 } else { -1.0 }))
            .collect();
        let stats = Statistics::from_cells(&cells);
        assert_relative_eq!(stats.average.unwrap(), 1.0e6);
        assert_relative_eq!(stats.stdev.unwrap(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_all_nodata() {
        let cells: Vec<Cell> = vec![None; 4];
        let stats = Statistics::from_cells(&cells);
        assert_eq!(stats.average, None);
        assert_eq!(stats.stdev, None);
        assert_eq!(stats.nodata_count, 4);
    }
}
