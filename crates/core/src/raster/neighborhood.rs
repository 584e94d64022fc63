//! Focal window shapes

use crate::error::{Error, Result};

/// A focal window centered on a cell.
///
/// The window always includes the center cell. Offsets are `(dx, dy)`, with
/// `dx` along columns and `dy` along rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Neighborhood {
    /// All cells within Chebyshev distance `r`: a `(2r+1)²` square
    Square(usize),
    /// Cells with `dx² + dy² <= r²`
    Circle(usize),
}

impl Neighborhood {
    /// Build a window from a signed radius, rejecting negative values.
    pub fn from_radius(radius: i64, circle: bool) -> Result<Self> {
        if radius < 0 {
            return Err(Error::InvalidRadius(radius));
        }
        let r = radius as usize;
        Ok(if circle {
            Neighborhood::Circle(r)
        } else {
            Neighborhood::Square(r)
        })
    }

    pub fn radius(&self) -> usize {
        match self {
            Neighborhood::Square(r) | Neighborhood::Circle(r) => *r,
        }
    }

    /// Side length of the bounding square
    pub fn size(&self) -> usize {
        self.radius() * 2 + 1
    }

    /// Check if a relative position is within this neighborhood
    pub fn contains(&self, dx: isize, dy: isize) -> bool {
        let r = self.radius() as u128;
        let (ax, ay) = (dx.unsigned_abs() as u128, dy.unsigned_abs() as u128);
        match self {
            Neighborhood::Square(_) => ax <= r && ay <= r,
            // Squares of 64-bit magnitudes fit in u128
            Neighborhood::Circle(_) => ax * ax + ay * ay <= r * r,
        }
    }

    /// Relative positions in column-major order (`dx` outer, `dy` inner).
    ///
    /// Allocates the whole `(2r+1)²` bounding square; engines use
    /// [`Neighborhood::offsets_within`] instead.
    pub fn offsets(&self) -> Vec<(isize, isize)> {
        self.offsets_within(usize::MAX, usize::MAX)
    }

    /// Offsets that can land inside a `width` x `height` grid.
    ///
    /// `|dx|` is capped at `width - 1` and `|dy|` at `height - 1`: any larger
    /// offset falls outside the grid from every cell. Order and membership
    /// are otherwise those of [`Neighborhood::offsets`].
    pub fn offsets_within(&self, width: usize, height: usize) -> Vec<(isize, isize)> {
        let r = self.radius().min(isize::MAX as usize);
        let rx = r.min(width.saturating_sub(1)) as isize;
        let ry = r.min(height.saturating_sub(1)) as isize;

        let cols = (2 * rx.unsigned_abs()).saturating_add(1);
        let rows = (2 * ry.unsigned_abs()).saturating_add(1);
        let mut offsets = Vec::with_capacity(cols.saturating_mul(rows).min(1 << 20));

        for dx in -rx..=rx {
            for dy in -ry..=ry {
                if self.contains(dx, dy) {
                    offsets.push((dx, dy));
                }
            }
        }

        offsets
    }
}
