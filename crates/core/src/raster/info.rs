//! Spatial metadata shared by every grid derived from one source

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Geographic bounding box of a grid: (xmin, ymin, xmax, ymax).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Extent {
    /// Whether a coordinate lies inside the extent (edges included).
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.xmin && x <= self.xmax && y >= self.ymin && y <= self.ymax
    }
}

/// Immutable spatial framing of a grid.
///
/// The geotransform follows the GDAL layout
/// `[origin_x, pixel_width, 0, origin_y, 0, pixel_height]`. Only north-up,
/// non-rotated transforms are accepted, so pixel `(col, row)` maps to
///
/// ```text
/// x = origin_x + col * pixel_width
/// y = origin_y + row * pixel_height
/// ```
///
/// `pixel_height` is normally negative. The projection is an opaque string
/// (WKT, PROJ, or empty) that is carried through untouched.
///
/// Grids hold their info behind an `Arc`, so every grid produced from a
/// common load shares one instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridInfo {
    width: usize,
    height: usize,
    geo_transform: [f64; 6],
    origin: (f64, f64),
    pixel_size: (f64, f64),
    extent: Extent,
    projection: String,
}

impl GridInfo {
    /// Build grid metadata from dimensions, a GDAL-style geotransform and a
    /// projection descriptor.
    pub fn new(
        width: usize,
        height: usize,
        geo_transform: [f64; 6],
        projection: impl Into<String>,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }
        if geo_transform[2] != 0.0 || geo_transform[4] != 0.0 {
            return Err(Error::RotatedTransform);
        }

        let origin = (geo_transform[0], geo_transform[3]);
        let pixel_size = (geo_transform[1], geo_transform[5]);

        // Corners of the raster; pixel sizes may carry either sign.
        let x0 = origin.0;
        let x1 = origin.0 + width as f64 * pixel_size.0;
        let y0 = origin.1;
        let y1 = origin.1 + height as f64 * pixel_size.1;

        let extent = Extent {
            xmin: x0.min(x1),
            ymin: y0.min(y1),
            xmax: x0.max(x1),
            ymax: y0.max(y1),
        };

        Ok(Self {
            width,
            height,
            geo_transform,
            origin,
            pixel_size,
            extent,
            projection: projection.into(),
        })
    }

    /// Unit-cell framing with the origin at the top-left corner, `y` growing
    /// downwards in pixel space and upwards in map space.
    pub fn unit(width: usize, height: usize) -> Result<Self> {
        Self::new(width, height, [0.0, 1.0, 0.0, height as f64, 0.0, -1.0], "")
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// The six affine coefficients, GDAL order.
    pub fn geo_transform(&self) -> &[f64; 6] {
        &self.geo_transform
    }

    /// Top-left corner `(x, y)`.
    pub fn origin(&self) -> (f64, f64) {
        self.origin
    }

    /// Pixel size `(x, y)`; `y` is normally negative.
    pub fn pixel_size(&self) -> (f64, f64) {
        self.pixel_size
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn projection(&self) -> &str {
        &self.projection
    }

    /// `(width, height)`
    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Whether two infos describe grids with identical dimensions.
    pub fn same_shape(&self, other: &GridInfo) -> bool {
        self.shape() == other.shape()
    }

    /// Geographic coordinates of the center of cell `(x, y)`.
    pub fn cell_center(&self, x: usize, y: usize) -> (f64, f64) {
        (
            self.origin.0 + (x as f64 + 0.5) * self.pixel_size.0,
            self.origin.1 + (y as f64 + 0.5) * self.pixel_size.1,
        )
    }

    /// Map a geographic coordinate to a cell index, or `None` outside the
    /// extent.
    ///
    /// The returned index may still fall one cell outside the grid for
    /// coordinates lying exactly on the far edges; callers re-check bounds.
    pub fn coord_to_index(&self, x: f64, y: f64) -> Option<(i64, i64)> {
        if !self.extent.contains(x, y) {
            return None;
        }

        // f64::round rounds half away from zero.
        let ix = (-0.5 + (x - self.extent.xmin) / self.pixel_size.0).round();
        let iy = (-0.5 + (y - self.extent.ymax) / self.pixel_size.1).round();

        Some((ix as i64, iy as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn utm_info() -> GridInfo {
        GridInfo::new(200, 100, [500_000.0, 30.0, 0.0, 4_200_000.0, 0.0, -30.0], "EPSG:32633")
            .unwrap()
    }

    #[test]
    fn test_derived_fields() {
        let info = utm_info();
        assert_eq!(info.origin(), (500_000.0, 4_200_000.0));
        assert_eq!(info.pixel_size(), (30.0, -30.0));

        let e = info.extent();
        assert_relative_eq!(e.xmin, 500_000.0);
        assert_relative_eq!(e.xmax, 506_000.0);
        assert_relative_eq!(e.ymin, 4_197_000.0);
        assert_relative_eq!(e.ymax, 4_200_000.0);
        assert_eq!(info.projection(), "EPSG:32633");
    }

    #[test]
    fn test_cell_center() {
        let info = utm_info();
        let (x, y) = info.cell_center(0, 0);
        assert_relative_eq!(x, 500_015.0);
        assert_relative_eq!(y, 4_199_985.0);

        let (x, y) = info.cell_center(199, 99);
        assert_relative_eq!(x, 505_985.0);
        assert_relative_eq!(y, 4_197_015.0);
    }

    #[test]
    fn test_coord_to_index() {
        let info = utm_info();
        assert_eq!(info.coord_to_index(500_015.0, 4_199_985.0), Some((0, 0)));
        assert_eq!(info.coord_to_index(500_029.0, 4_199_971.0), Some((0, 0)));
        assert_eq!(info.coord_to_index(500_031.0, 4_199_969.0), Some((1, 1)));
        assert_eq!(info.coord_to_index(499_999.0, 4_199_985.0), None);
        assert_eq!(info.coord_to_index(500_015.0, 4_200_001.0), None);
    }

    #[test]
    fn test_far_edge_rounds_past_grid() {
        let info = utm_info();
        // The xmax edge is inside the extent but rounds to column `width`.
        assert_eq!(info.coord_to_index(506_000.0, 4_199_985.0), Some((200, 0)));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            GridInfo::new(0, 10, [0.0, 1.0, 0.0, 0.0, 0.0, -1.0], ""),
            Err(Error::InvalidDimensions { width: 0, height: 10 })
        ));
        assert!(matches!(
            GridInfo::new(10, 10, [0.0, 1.0, 0.2, 0.0, 0.0, -1.0], ""),
            Err(Error::RotatedTransform)
        ));
    }
}
