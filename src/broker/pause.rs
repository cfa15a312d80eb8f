/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The gate a run loop passes through at the start of every turn.
//!
//! [`PauseGate::pause`] closes the gate and waits until the run loop has actually stopped at it, so
//! that the turn reported to the caller is the turn the run is parked on. [`PauseGate::close`] is
//! used when the run ends or is reset: it releases a parked loop and turns every later pause into a
//! no-op.

use std::sync::{Condvar, Mutex, PoisonError};

pub(crate) struct PauseGate {
    state: Mutex<GateState>,
    changed: Condvar,
}

#[derive(Default)]
struct GateState {
    pause_requested: bool,
    parked: bool,
    closed: bool,
}

impl PauseGate {
    pub(crate) fn new() -> PauseGate {
        PauseGate {
            state: Mutex::new(GateState::default()),
            changed: Condvar::new(),
        }
    }

    /// Ask the run loop to stop at the next turn boundary, and block until it has.
    ///
    /// # Return value
    /// `false` if the gate was closed before the loop parked, i.e., the run has ended.
    pub(crate) fn pause(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.closed {
            return false;
        }
        state.pause_requested = true;
        self.changed.notify_all();

        let state = self
            .changed
            .wait_while(state, |state| !state.parked && !state.closed)
            .unwrap_or_else(PoisonError::into_inner);
        !state.closed
    }

    /// Let a parked run loop continue. Returns whether a pause was in effect.
    pub(crate) fn resume(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let was_paused = state.pause_requested;
        state.pause_requested = false;
        self.changed.notify_all();
        was_paused
    }

    /// Called by the run loop between turns. Returns immediately unless a pause was requested, in
    /// which case it parks until the gate is resumed or closed.
    pub(crate) fn wait_at_turn_boundary(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.pause_requested || state.closed {
            return;
        }

        state.parked = true;
        self.changed.notify_all();
        let mut state = self
            .changed
            .wait_while(state, |state| state.pause_requested && !state.closed)
            .unwrap_or_else(PoisonError::into_inner);
        state.parked = false;
    }

    pub(crate) fn close(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.closed = true;
        state.pause_requested = false;
        self.changed.notify_all();
    }

    /// Whether the run loop is parked and has not been told to resume.
    pub(crate) fn is_paused(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.parked && state.pause_requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, thread, time::Duration};

    #[test]
    fn pause_returns_once_the_loop_is_parked() {
        let gate = Arc::new(PauseGate::new());
        let run_loop = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                let mut turns = 0;
                while turns < 1000 {
                    gate.wait_at_turn_boundary();
                    turns += 1;
                    thread::sleep(Duration::from_millis(1));
                }
                turns
            })
        };

        assert!(gate.pause());
        assert!(gate.is_paused());
        assert!(gate.resume());
        gate.close();
        assert_eq!(run_loop.join().unwrap(), 1000);
        assert!(!gate.pause());
    }

    #[test]
    fn close_releases_a_parked_loop() {
        let gate = Arc::new(PauseGate::new());
        let run_loop = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || loop {
                gate.wait_at_turn_boundary();
                if gate.state.lock().unwrap().closed {
                    return;
                }
                thread::sleep(Duration::from_millis(1));
            })
        };

        assert!(gate.pause());
        gate.close();
        run_loop.join().unwrap();
        assert!(!gate.is_paused());
    }
}
