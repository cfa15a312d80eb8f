/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Types shared by the worker, the broker, and the wire protocol.
//!
//! The types defined in [`crate::types::basic`] are "inert": they are sent around and inspected, but
//! have no active behavior. [`crate::types::grid`] defines the [`Grid`](grid::Grid), the only type here
//! with non-trivial methods.

pub mod basic;

pub mod grid;
