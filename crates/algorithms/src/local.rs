//! Local (cell-by-cell) map algebra.
//!
//! The engines apply a function to the cells at the same position in one,
//! two or three grids. The output shares the metadata of the first grid.
//! Operators are built on the engines and propagate NoData: if any operand
//! cell is NoData, the result cell is NoData.

use std::fmt;

use mapalg_core::raster::{from_bool, is_true};
use mapalg_core::{Cell, Error, Grid, Result};

use crate::parallel::ProcessingMode;

/// Apply `f` to every cell of `grid`.
pub fn local<F>(grid: &Grid, f: F) -> Result<Grid>
where
    F: Fn(Cell) -> Cell + Sync + Send,
{
    let view = grid.view();
    let rows = ProcessingMode::default()
        .map_rows(grid.height(), |y| view.row(y).iter().map(|&c| f(c)).collect::<Vec<Cell>>())?;
    Grid::from_rows(grid.shared_info().clone(), rows)
}

/// Apply `f` to cell pairs of two grids with the same shape.
pub fn local2<F>(a: &Grid, b: &Grid, f: F) -> Result<Grid>
where
    F: Fn(Cell, Cell) -> Cell + Sync + Send,
{
    a.ensure_same_shape(b)?;

    let (va, vb) = (a.view(), b.view());
    let rows = ProcessingMode::default().map_rows(a.height(), |y| {
        va.row(y)
            .iter()
            .zip(vb.row(y).iter())
            .map(|(&p, &q)| f(p, q))
            .collect::<Vec<Cell>>()
    })?;
    Grid::from_rows(a.shared_info().clone(), rows)
}

/// Apply `f` to cell triples of three grids with the same shape.
pub fn local3<F>(a: &Grid, b: &Grid, c: &Grid, f: F) -> Result<Grid>
where
    F: Fn(Cell, Cell, Cell) -> Cell + Sync + Send,
{
    a.ensure_same_shape(b)?;
    a.ensure_same_shape(c)?;

    let (va, vb, vc) = (a.view(), b.view(), c.view());
    let rows = ProcessingMode::default().map_rows(a.height(), |y| {
        va.row(y)
            .iter()
            .zip(vb.row(y).iter())
            .zip(vc.row(y).iter())
            .map(|((&p, &q), &r)| f(p, q, r))
            .collect::<Vec<Cell>>()
    })?;
    Grid::from_rows(a.shared_info().clone(), rows)
}

/// One side of a binary operator: a grid, or a constant broadcast to every cell.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    Grid(&'a Grid),
    Scalar(Cell),
}

impl<'a> From<&'a Grid> for Operand<'a> {
    fn from(grid: &'a Grid) -> Self {
        Operand::Grid(grid)
    }
}

impl From<f32> for Operand<'_> {
    fn from(value: f32) -> Self {
        Operand::Scalar(Some(value))
    }
}

/// Narrowed to `f32`, so bare float literals can be used as scalars.
impl From<f64> for Operand<'_> {
    fn from(value: f64) -> Self {
        Operand::Scalar(Some(value as f32))
    }
}

impl From<Cell> for Operand<'_> {
    fn from(value: Cell) -> Self {
        Operand::Scalar(value)
    }
}

/// Binary cell operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalOp {
    Add,
    Subtract,
    Multiply,
    /// Native float division; a zero divisor gives an infinity or NaN, not NoData.
    Divide,
    /// Remainder with the sign of the dividend
    Modulo,
    Power,
    Min,
    Max,
    Equal,
    NotEqual,
    Greater,
    Less,
    GreaterEqual,
    LessEqual,
    /// Both operands exactly 1.0
    And,
    /// Either operand exactly 1.0
    Or,
}

impl LocalOp {
    /// Apply the operator to two valid values.
    pub fn apply(self, a: f32, b: f32) -> f32 {
        match self {
            LocalOp::Add => a + b,
            LocalOp::Subtract => a - b,
            LocalOp::Multiply => a * b,
            LocalOp::Divide => a / b,
            LocalOp::Modulo => a % b,
            LocalOp::Power => a.powf(b),
            LocalOp::Min => a.min(b),
            LocalOp::Max => a.max(b),
            LocalOp::Equal => from_bool(a == b),
            LocalOp::NotEqual => from_bool(a != b),
            LocalOp::Greater => from_bool(a > b),
            LocalOp::Less => from_bool(a < b),
            LocalOp::GreaterEqual => from_bool(a >= b),
            LocalOp::LessEqual => from_bool(a <= b),
            LocalOp::And => from_bool(is_true(a) && is_true(b)),
            LocalOp::Or => from_bool(is_true(a) || is_true(b)),
        }
    }

    /// Apply the operator to two cells, propagating NoData.
    pub fn apply_cell(self, a: Cell, b: Cell) -> Cell {
        Some(self.apply(a?, b?))
    }

    /// Whether `a op b == b op a` for all valid values.
    pub fn is_commutative(self) -> bool {
        !matches!(
            self,
            LocalOp::Subtract
                | LocalOp::Divide
                | LocalOp::Modulo
                | LocalOp::Power
                | LocalOp::Greater
                | LocalOp::Less
                | LocalOp::GreaterEqual
                | LocalOp::LessEqual
        )
    }

    /// Whether the result is always a boolean cell value.
    pub fn is_predicate(self) -> bool {
        matches!(
            self,
            LocalOp::Equal
                | LocalOp::NotEqual
                | LocalOp::Greater
                | LocalOp::Less
                | LocalOp::GreaterEqual
                | LocalOp::LessEqual
                | LocalOp::And
                | LocalOp::Or
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            LocalOp::Add => "+",
            LocalOp::Subtract => "-",
            LocalOp::Multiply => "*",
            LocalOp::Divide => "/",
            LocalOp::Modulo => "%",
            LocalOp::Power => "^",
            LocalOp::Min => "min",
            LocalOp::Max => "max",
            LocalOp::Equal => "==",
            LocalOp::NotEqual => "!=",
            LocalOp::Greater => ">",
            LocalOp::Less => "<",
            LocalOp::GreaterEqual => ">=",
            LocalOp::LessEqual => "<=",
            LocalOp::And => "&",
            LocalOp::Or => "|",
        }
    }
}

impl fmt::Display for LocalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Combine two operands with `op`.
///
/// A scalar on either side is broadcast to every cell of the other operand,
/// keeping its position: `binary(Subtract, 10.0, &g)` computes `10 - g`.
/// At least one operand must be a grid.
pub fn binary<'a>(
    op: LocalOp,
    a: impl Into<Operand<'a>>,
    b: impl Into<Operand<'a>>,
) -> Result<Grid> {
    match (a.into(), b.into()) {
        (Operand::Grid(a), Operand::Grid(b)) => local2(a, b, |x, y| op.apply_cell(x, y)),
        (Operand::Grid(a), Operand::Scalar(s)) => local(a, |x| op.apply_cell(x, s)),
        (Operand::Scalar(s), Operand::Grid(b)) => local(b, |y| op.apply_cell(s, y)),
        (Operand::Scalar(a), Operand::Scalar(b)) => Err(Error::InvalidParameter {
            name: "operands",
            value: format!("{:?} {} {:?}", a, op, b),
            reason: "at least one operand must be a grid".into(),
        }),
    }
}

macro_rules! local_operator {
    ($($(#[$doc:meta])* $name:ident => $op:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name<'a>(a: impl Into<Operand<'a>>, b: impl Into<Operand<'a>>) -> Result<Grid> {
                binary(LocalOp::$op, a, b)
            }
        )*
    };
}

local_operator! {
    /// `a + b`
    add => Add;
    /// `a - b`
    subtract => Subtract;
    /// `a * b`
    multiply => Multiply;
    /// `a / b`
    divide => Divide;
    /// `a % b`
    modulo => Modulo;
    /// `a ^ b`
    power => Power;
    /// Cell-wise minimum
    minimum => Min;
    /// Cell-wise maximum
    maximum => Max;
    /// 1 where `a == b`, else 0
    equal => Equal;
    /// 1 where `a != b`, else 0
    not_equal => NotEqual;
    /// 1 where `a > b`, else 0
    greater => Greater;
    /// 1 where `a < b`, else 0
    less => Less;
    /// 1 where `a >= b`, else 0
    greater_equal => GreaterEqual;
    /// 1 where `a <= b`, else 0
    less_equal => LessEqual;
    /// 1 where both are 1, else 0
    and => And;
    /// 1 where either is 1, else 0
    or => Or;
}

/// Logical negation: 1 becomes 0, anything else valid becomes 1.
pub fn not(grid: &Grid) -> Result<Grid> {
    local(grid, |c| c.map(|v| from_bool(!is_true(v))))
}

/// Arithmetic negation.
pub fn negate(grid: &Grid) -> Result<Grid> {
    local(grid, |c| c.map(|v| -v))
}
