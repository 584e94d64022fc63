//! Conway's Game of Life expressed as map algebra.
//!
//! One generation is `g = FocalSum(grid, 1) - grid`, then
//! `(grid == 1 & g == 2) | g == 3`. A Gosper glider gun on a bounded
//! 50x35 grid settles into a cycle of exactly 60 generations once its
//! first gliders have died against the edge.

use std::sync::Arc;

use mapalg_algorithms::{and, equal, focal_sum, or, subtract};
use mapalg_core::{Grid, GridInfo, Result};

const WIDTH: usize = 50;
const HEIGHT: usize = 35;
const WARM_UP: usize = 100;
const PERIOD: usize = 60;

const GOSPER_GUN: [&str; 9] = [
    "........................O...........",
    "......................O.O...........",
    "............OO......OO............OO",
    "...........O...O....OO............OO",
    "OO........O.....O...OO..............",
    "OO........O...O.OO....O.O...........",
    "..........O.....O.......O...........",
    "...........O...O....................",
    "............OO......................",
];

fn seed(pattern: &[&str], ox: usize, oy: usize) -> Grid {
    let mut cells = vec![Some(0.0); WIDTH * HEIGHT];
    for (row, line) in pattern.iter().enumerate() {
        for (col, ch) in line.chars().enumerate() {
            if ch == 'O' {
                cells[(oy + row) * WIDTH + ox + col] = Some(1.0);
            }
        }
    }
    let info = Arc::new(GridInfo::unit(WIDTH, HEIGHT).unwrap());
    Grid::from_cells(info, cells).unwrap()
}

fn tick(grid: &Grid) -> Result<Grid> {
    let neighbors = subtract(&focal_sum(grid, 1, false)?, grid)?;
    let survives = and(&equal(grid, 1.0)?, &equal(&neighbors, 2.0)?)?;
    or(&survives, &equal(&neighbors, 3.0)?)
}

fn render(grid: &Grid) -> String {
    grid.render(|c| if c == Some(1.0) { "#".into() } else { ".".into() })
}

#[test]
fn blinker_oscillates() {
    let info = Arc::new(GridInfo::unit(5, 5).unwrap());
    let mut cells = vec![Some(0.0); 25];
    for x in 1..4 {
        cells[2 * 5 + x] = Some(1.0);
    }
    let horizontal = Grid::from_cells(info, cells).unwrap();

    let vertical = tick(&horizontal).unwrap();
    assert_eq!(vertical.at(2, 1), Some(1.0));
    assert_eq!(vertical.at(2, 3), Some(1.0));
    assert_eq!(vertical.at(1, 2), Some(0.0));
    assert!(!vertical.same_cells(&horizontal));

    assert!(tick(&vertical).unwrap().same_cells(&horizontal));
}

#[test]
fn block_is_still_life_in_a_corner() {
    let info = Arc::new(GridInfo::unit(4, 4).unwrap());
    let mut cells = vec![Some(0.0); 16];
    for i in [0, 1, 4, 5] {
        cells[i] = Some(1.0);
    }
    let block = Grid::from_cells(info, cells).unwrap();
    assert!(tick(&block).unwrap().same_cells(&block));
}

#[test]
fn gosper_gun_has_period_sixty() {
    let mut grid = seed(&GOSPER_GUN, 1, 1);
    for _ in 0..WARM_UP {
        grid = tick(&grid).unwrap();
    }
    let reference = grid.clone();

    let mut repeats = Vec::new();
    for i in 0..1000 {
        grid = tick(&grid).unwrap();
        let same = grid.same_cells(&reference);
        assert_eq!(
            same,
            i % PERIOD == PERIOD - 1,
            "generation {}:\n{}\nreference:\n{}",
            i,
            render(&grid),
            render(&reference)
        );
        if same {
            repeats.push(i);
        }
    }

    let expected: Vec<usize> = (PERIOD - 1..1000).step_by(PERIOD).collect();
    assert_eq!(repeats, expected);
    assert_eq!(repeats.last(), Some(&959));
}
