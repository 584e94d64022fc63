//! # mapalg algorithms
//!
//! Map-algebra engines over [`mapalg_core::Grid`].
//!
//! ## Engines
//!
//! - **local**: cell-by-cell functions of one, two or three grids, and the
//!   arithmetic, comparison and logical operators built on them
//! - **con**: conditional selection between two branches
//! - **focal**: square or circular neighborhood reductions
//!
//! All engines are row-parallel when the `parallel` feature is enabled.

pub mod con;
pub mod focal;
pub mod local;
pub mod parallel;

pub use con::con;
pub use focal::{
    focal, focal2, focal_average, focal_max, focal_min, focal_range, focal_statistics,
    focal_stdev, focal_sum, focal_with, FocalParams, FocalStatistic,
};
pub use local::{
    add, and, binary, divide, equal, greater, greater_equal, less, less_equal, local, local2,
    local3, maximum, minimum, modulo, multiply, negate, not, not_equal, or, power, subtract,
    LocalOp, Operand,
};
pub use parallel::ProcessingMode;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::con::con;
    pub use crate::focal::{
        focal, focal2, focal_average, focal_max, focal_min, focal_range, focal_statistics,
        focal_stdev, focal_sum, FocalParams, FocalStatistic,
    };
    pub use crate::local::{local, local2, local3, binary, LocalOp, Operand};
    pub use crate::parallel::ProcessingMode;
    pub use mapalg_core::prelude::*;
}
