//! Grid data structures and addressing

mod cell;
mod grid;
mod info;
mod neighborhood;
mod statistics;

pub use cell::{from_bool, is_true, Cell, FALSE, TRUE};
pub use grid::Grid;
pub use info::{Extent, GridInfo};
pub use neighborhood::Neighborhood;
pub use statistics::Statistics;
