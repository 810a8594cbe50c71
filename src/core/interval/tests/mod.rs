// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

//! Interval algebra tests
//!
//! Tests are organized into the following modules:
//! - `set`: joined interval set insert/erase/intersection
//! - `map`: overwrite map used for dirty region ownership
//! - `counter`: additive page reference counts
//! - `properties`: randomized checks against a flat bitmap model

mod counter;
mod set;
