/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The one-way relay from the broker to whatever renders the grid.
//!
//! Once per committed turn the broker hands the cells that changed in that turn to its
//! [`DisplaySink`]. The sink is called after the turn's commit, but before the next turn starts, so
//! updates arrive in turn order and never interleave. An error from the sink is fatal to the run.

use std::sync::{
    mpsc::{self, Receiver, Sender},
    Mutex, PoisonError,
};

use crate::networking::{messages::DisplayUpdate, network::NetworkError};
use crate::types::basic::{Cell, Turn};

pub trait DisplaySink: Send + Sync + 'static {
    fn notify_changed_cells(&self, changed_cells: &[Cell], turn: Turn) -> Result<(), NetworkError>;
}

/// A sink that drops every update. Used when no display is attached.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDisplay;

impl DisplaySink for NoDisplay {
    fn notify_changed_cells(&self, _: &[Cell], _: Turn) -> Result<(), NetworkError> {
        Ok(())
    }
}

impl<D: DisplaySink> DisplaySink for Option<D> {
    fn notify_changed_cells(&self, changed_cells: &[Cell], turn: Turn) -> Result<(), NetworkError> {
        match self {
            Some(display) => display.notify_changed_cells(changed_cells, turn),
            None => Ok(()),
        }
    }
}

/// A sink that forwards every update into a channel, for displays that live in the same process.
pub struct ChannelDisplay {
    updates: Mutex<Sender<DisplayUpdate>>,
}

impl ChannelDisplay {
    pub fn new() -> (ChannelDisplay, Receiver<DisplayUpdate>) {
        let (updates, receiver) = mpsc::channel();
        (ChannelDisplay { updates: Mutex::new(updates) }, receiver)
    }
}

impl DisplaySink for ChannelDisplay {
    fn notify_changed_cells(&self, changed_cells: &[Cell], turn: Turn) -> Result<(), NetworkError> {
        let update = DisplayUpdate {
            changed_cells: changed_cells.to_vec(),
            turn,
        };
        self.updates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .send(update)
            .map_err(|_| NetworkError::Disconnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_display_forwards_updates_until_dropped() {
        let (display, updates) = ChannelDisplay::new();
        display.notify_changed_cells(&[Cell::new(1, 2)], Turn::new(3)).unwrap();
        assert_eq!(
            updates.recv().unwrap(),
            DisplayUpdate {
                changed_cells: vec![Cell::new(1, 2)],
                turn: Turn::new(3)
            }
        );

        drop(updates);
        assert!(matches!(
            display.notify_changed_cells(&[], Turn::new(4)),
            Err(NetworkError::Disconnected)
        ));
    }

    #[test]
    fn absent_display_accepts_everything() {
        let display: Option<ChannelDisplay> = None;
        assert!(display.notify_changed_cells(&[Cell::new(0, 0)], Turn::new(1)).is_ok());
    }
}
