//! Cell values and the boolean-grid convention

/// A grid cell: `None` is NoData, which is distinct from `Some(0.0)`.
pub type Cell = Option<f32>;

/// Numeric encoding of `true` in a boolean grid.
pub const TRUE: f32 = 1.0;

/// Numeric encoding of `false` in a boolean grid.
pub const FALSE: f32 = 0.0;

/// Encode a boolean as a boolean-grid value.
#[inline]
pub fn from_bool(value: bool) -> f32 {
    if value {
        TRUE
    } else {
        FALSE
    }
}

/// A boolean-grid value is true only when it is exactly 1.
#[inline]
pub fn is_true(value: f32) -> bool {
    value == TRUE
}
