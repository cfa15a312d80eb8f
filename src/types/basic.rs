/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! "Inert" types that follow the newtype pattern, plus the row and cell aliases used throughout the
//! crate.

use borsh::{BorshDeserialize, BorshSerialize};
use std::fmt::{self, Display, Formatter};

/// One row of cells. `true` is alive, `false` is dead.
///
/// An empty `Row` stands for a halo row that has not been received yet and is treated as all-dead.
pub type Row = Vec<bool>;

/// Number of completed generations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize, BorshDeserialize)]
pub struct Turn(u64);

impl Turn {
    pub const fn new(int: u64) -> Self {
        Self(int)
    }

    pub const fn int(&self) -> u64 {
        self.0
    }

    /// The turn that immediately follows this one.
    pub const fn next(&self) -> Turn {
        Turn(self.0 + 1)
    }
}

impl Display for Turn {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// A cell identified by its global coordinates: `x` is the column, `y` the row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize, BorshDeserialize)]
pub struct Cell {
    pub x: u32,
    pub y: u32,
}

impl Cell {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Network address of a worker, e.g. `"127.0.0.1:8030"`. In-process transports use arbitrary names.
pub type WorkerAddress = String;
