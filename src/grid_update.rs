/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The generation step of Conway's Game of Life (B3/S23) over one horizontal slice of a toroidal grid.
//!
//! [`advance`] computes the next generation of a slice given the two rows that border it in the
//! global grid (its "halo"). Columns wrap around inside the slice; rows above the first and below the
//! last row of the slice are read from the halo. The function is pure, so workers owning disjoint
//! slices can call it concurrently.
//!
//! The changed cells are reported with global coordinates, in row-major order. The display relay
//! depends on this order.

use crate::types::basic::{Cell, Row};

/// Compute the next generation of `slice`.
///
/// `row_above` is the row immediately above the first row of `slice` and `row_below` the row
/// immediately below its last row, both taken from the global grid (wrapping at its edges). An
/// empty halo row is treated as all-dead. `start_row` is the global index of the first row of
/// `slice`.
///
/// # Return value
/// A pair consisting of:
/// 1. The next generation of `slice`.
/// 2. Every cell whose value differs between `slice` and the next generation, in row-major order.
pub fn advance(slice: &[Row], row_above: &[bool], row_below: &[bool], start_row: u32) -> (Vec<Row>, Vec<Cell>) {
    let height = slice.len();
    let mut next_slice = Vec::with_capacity(height);
    let mut changed_cells = Vec::new();

    for (y, row) in slice.iter().enumerate() {
        let above: &[bool] = if y == 0 { row_above } else { &slice[y - 1] };
        let below: &[bool] = if y == height - 1 { row_below } else { &slice[y + 1] };

        let next_row: Row = (0..row.len())
            .map(|x| {
                let neighbours = alive_in_window(above, x) + alive_in_window(row, x) + alive_in_window(below, x)
                    - row[x] as u8;
                let next = next_state(row[x], neighbours);
                if next != row[x] {
                    changed_cells.push(Cell::new(x as u32, start_row + y as u32));
                }
                next
            })
            .collect();

        next_slice.push(next_row);
    }

    (next_slice, changed_cells)
}

/// B3/S23: a live cell with two or three live neighbours survives, a dead cell with exactly three
/// is born, every other cell is dead in the next generation.
pub fn next_state(alive: bool, neighbours: u8) -> bool {
    matches!((alive, neighbours), (true, 2) | (true, 3) | (false, 3))
}

/// All alive cells of `slice`, with global coordinates, in row-major order.
pub fn alive_cells(slice: &[Row], start_row: u32) -> Vec<Cell> {
    slice
        .iter()
        .enumerate()
        .flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, &alive)| alive)
                .map(move |(x, _)| Cell::new(x as u32, start_row + y as u32))
        })
        .collect()
}

pub fn alive_count(slice: &[Row]) -> usize {
    slice.iter().map(|row| row.iter().filter(|&&alive| alive).count()).sum()
}

// Number of alive cells among columns x-1, x, x+1 of `row`, wrapping horizontally.
fn alive_in_window(row: &[bool], x: usize) -> u8 {
    let width = row.len();
    if width == 0 {
        return 0;
    }

    [(x + width - 1) % width, x % width, (x + 1) % width]
        .into_iter()
        .filter(|&column| row[column])
        .count() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::grid::Grid;

    // Advance a whole grid as a single slice whose halo is its own last and first row.
    fn step(grid: &Grid) -> (Grid, Vec<Cell>) {
        let rows = grid.rows();
        let (next, changed) = advance(rows, &rows[rows.len() - 1], &rows[0], 0);
        (Grid::from_rows(next).unwrap(), changed)
    }

    #[test]
    fn isolated_cell_dies() {
        let grid = Grid::with_alive_cells(5, 5, &[Cell::new(2, 2)]);
        let (next, changed) = step(&grid);
        assert_eq!(next.alive_count(), 0);
        assert_eq!(changed, vec![Cell::new(2, 2)]);
    }

    #[test]
    fn survival_and_birth() {
        // Blinker: the centre survives with two neighbours, the cells above and below it are born
        // with three, and the ends die with one.
        let grid = Grid::with_alive_cells(5, 5, &[Cell::new(1, 2), Cell::new(2, 2), Cell::new(3, 2)]);
        let (next, changed) = step(&grid);
        assert_eq!(next.alive_cells(), vec![Cell::new(2, 1), Cell::new(2, 2), Cell::new(2, 3)]);
        assert_eq!(
            changed,
            vec![Cell::new(2, 1), Cell::new(1, 2), Cell::new(3, 2), Cell::new(2, 3)]
        );
    }

    #[test]
    fn live_cell_with_three_neighbours_survives() {
        // An L-tromino plus the corner completes a block; the corner cell has three neighbours.
        let grid = Grid::with_alive_cells(6, 6, &[Cell::new(2, 2), Cell::new(3, 2), Cell::new(2, 3), Cell::new(3, 3)]);
        let (next, _) = step(&grid);
        assert!(next.is_alive(3, 3));
    }

    #[test]
    fn block_is_a_still_life() {
        let block = [Cell::new(1, 1), Cell::new(2, 1), Cell::new(1, 2), Cell::new(2, 2)];
        let mut grid = Grid::with_alive_cells(4, 4, &block);
        for _ in 0..10 {
            let (next, changed) = step(&grid);
            assert!(changed.is_empty());
            grid = next;
        }
        assert_eq!(grid.alive_cells(), block.to_vec());
    }

    #[test]
    fn columns_wrap_around() {
        // A vertical blinker on column 0 turns horizontal across columns 4, 0, and 1.
        let grid = Grid::with_alive_cells(5, 5, &[Cell::new(0, 1), Cell::new(0, 2), Cell::new(0, 3)]);
        let (next, _) = step(&grid);
        assert_eq!(next.alive_cells(), vec![Cell::new(0, 2), Cell::new(1, 2), Cell::new(4, 2)]);
    }

    #[test]
    fn rows_wrap_around_through_the_halo() {
        // A horizontal blinker on row 0 turns vertical across rows 4, 0, and 1.
        let grid = Grid::with_alive_cells(5, 5, &[Cell::new(1, 0), Cell::new(2, 0), Cell::new(3, 0)]);
        let (next, _) = step(&grid);
        assert_eq!(next.alive_cells(), vec![Cell::new(2, 0), Cell::new(2, 1), Cell::new(2, 4)]);
    }

    #[test]
    fn empty_halo_counts_as_dead() {
        // Three live cells in the row above give birth at (1, 7) once the halo is known.
        let slice = vec![vec![false; 5]];
        let (next, changed) = advance(&slice, &[], &[], 7);
        assert_eq!(next, slice);
        assert!(changed.is_empty());

        let (next, changed) = advance(&slice, &[true, true, true, false, false], &[], 7);
        assert_eq!(next, vec![vec![false, true, false, false, false]]);
        assert_eq!(changed, vec![Cell::new(1, 7)]);
    }

    #[test]
    fn changed_cells_use_global_rows() {
        let slice = vec![vec![false; 4], vec![false, true, false, false]];
        let (_, changed) = advance(&slice, &[false; 4], &[false; 4], 10);
        assert_eq!(changed, vec![Cell::new(1, 11)]);
    }
}
