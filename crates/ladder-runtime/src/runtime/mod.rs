//! Simulation state and cycle execution.

#![allow(missing_docs)]

mod core;
mod cycle;

pub use core::Simulation;
pub use cycle::CycleReport;
