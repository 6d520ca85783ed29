//! `ladder-runtime` - scan-cycle runtime for ladder-diagram PLC programs.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

/// Runtime configuration (`runtime.toml`).
pub mod config;
/// Serialized program format.
pub mod document;
/// Pure scan-cycle evaluation.
pub mod engine;
/// Runtime errors.
pub mod error;
/// Process image.
pub mod image;
/// Scan-cycle metrics.
pub mod metrics;
/// Ladder program model.
pub mod program;
/// Periodic scheduling, clocks and the controller surface.
pub mod scheduler;
/// Tag normalization and registry.
pub mod tag;
/// On-delay timer state.
pub mod timer;
/// Pre-run validation.
pub mod validate;
/// Time quantities.
pub mod value;

mod runtime;

pub use runtime::{CycleReport, Simulation};
