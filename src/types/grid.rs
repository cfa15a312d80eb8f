/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The toroidal [`Grid`] of cells that a run starts from and ends with.

use borsh::{BorshDeserialize, BorshSerialize};
use rand::{rngs::StdRng, Rng, SeedableRng};
use sha2::{Digest, Sha256};

use super::basic::{Cell, Row};

/// A rectangular grid of cells with fixed width and height. Row and column indices wrap around.
///
/// The grid is replaced wholesale between turns; it is never updated in place by the broker.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Grid {
    width: u32,
    rows: Vec<Row>,
}

impl Grid {
    /// Create an all-dead grid.
    pub fn new(width: u32, height: u32) -> Grid {
        Grid {
            width,
            rows: vec![vec![false; width as usize]; height as usize],
        }
    }

    /// Create a grid from its rows. Returns `None` if the rows do not all have the same length.
    pub fn from_rows(rows: Vec<Row>) -> Option<Grid> {
        let width = rows.first().map(|row| row.len()).unwrap_or(0);
        if rows.iter().any(|row| row.len() != width) {
            return None;
        }

        Some(Grid {
            width: width as u32,
            rows,
        })
    }

    /// Create a `width` x `height` grid in which exactly the `alive` cells are alive. Coordinates
    /// outside the grid wrap around.
    pub fn with_alive_cells(width: u32, height: u32, alive: &[Cell]) -> Grid {
        let mut grid = Grid::new(width, height);
        for cell in alive {
            grid.set(cell.x, cell.y, true);
        }
        grid
    }

    /// Create a random "soup" in which each cell is alive with probability `density`. The same
    /// `seed` always produces the same grid.
    pub fn random(width: u32, height: u32, density: f64, seed: u64) -> Grid {
        let mut rng = StdRng::seed_from_u64(seed);
        let density = density.clamp(0.0, 1.0);
        let rows = (0..height)
            .map(|_| (0..width).map(|_| rng.gen_bool(density)).collect())
            .collect();

        Grid { width, rows }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.rows.len() as u32
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Get the row at `y`, wrapping around the top and bottom edges.
    pub fn row(&self, y: i64) -> &Row {
        let height = self.rows.len() as i64;
        &self.rows[y.rem_euclid(height) as usize]
    }

    pub fn is_alive(&self, x: u32, y: u32) -> bool {
        self.rows[(y % self.height()) as usize][(x % self.width) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, alive: bool) {
        let (x, y) = (x % self.width, y % self.height());
        self.rows[y as usize][x as usize] = alive;
    }

    /// Copy the inclusive range of rows `[start_row, end_row]`.
    pub fn slice(&self, start_row: u32, end_row: u32) -> Vec<Row> {
        self.rows[start_row as usize..=end_row as usize].to_vec()
    }

    /// All alive cells, in row-major order.
    pub fn alive_cells(&self) -> Vec<Cell> {
        crate::grid_update::alive_cells(&self.rows, 0)
    }

    pub fn alive_count(&self) -> usize {
        crate::grid_update::alive_count(&self.rows)
    }

    /// SHA-256 digest over the dimensions and the cells, used to identify grids in logs.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.width.to_le_bytes());
        hasher.update(self.height().to_le_bytes());
        for row in &self.rows {
            let bytes: Vec<u8> = row.iter().map(|&alive| alive as u8).collect();
            hasher.update(&bytes);
        }
        hasher.finalize().into()
    }
}
