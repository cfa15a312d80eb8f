/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

use std::io;

use borsh::{BorshDeserialize, BorshSerialize};

use crate::types::{basic::Turn, grid::Grid};

/// Snapshot of a run taken when it is reset: the turn it had completed, the world as of that turn,
/// and the number of workers it ran on. A later continue request resumes from here.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Checkpoint {
    pub turn: Turn,
    pub world: Grid,
    pub worker_count: u32,
}

impl Checkpoint {
    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        self.try_to_vec()
    }

    pub fn from_bytes(bytes: &[u8]) -> io::Result<Checkpoint> {
        Checkpoint::try_from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::basic::Cell;

    #[test]
    fn serialized_checkpoint_restores_exactly() {
        let checkpoint = Checkpoint {
            turn: Turn::new(57),
            world: Grid::with_alive_cells(6, 4, &[Cell::new(0, 0), Cell::new(5, 3)]),
            worker_count: 3,
        };
        let bytes = checkpoint.to_bytes().unwrap();
        assert_eq!(Checkpoint::from_bytes(&bytes).unwrap(), checkpoint);
        assert!(Checkpoint::from_bytes(&bytes[..bytes.len() - 1]).is_err());
    }
}
