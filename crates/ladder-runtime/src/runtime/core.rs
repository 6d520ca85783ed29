//! Simulation state and accessors.

#![allow(missing_docs)]

use tracing::{info, warn};

use crate::document::ProgramDocument;
use crate::engine::ScanTrace;
use crate::error::RuntimeError;
use crate::image::ProcessImage;
use crate::metrics::CycleStats;
use crate::program::LadderProgram;
use crate::tag::TagId;
use crate::timer::TimerBank;
use crate::validate::{validate_with, ValidationOptions, ValidationReport};
use crate::value::Duration;

/// Owned store for one running ladder simulation.
///
/// The simulation is the only writer of its process image during a cycle.
/// Manual overrides go through [`Simulation::inject`] between cycles and are
/// seen by the next cycle exactly like committed values.
#[derive(Debug, Clone, Default)]
pub struct Simulation {
    pub(super) image: ProcessImage,
    pub(super) program: LadderProgram,
    pub(super) timers: TimerBank,
    pub(super) trace: ScanTrace,
    pub(super) cycle_counter: u64,
    pub(super) last_cycle_at: Option<Duration>,
    pub(super) stats: CycleStats,
    pub(super) validation: ValidationOptions,
}

impl Simulation {
    #[must_use]
    pub fn new(image: ProcessImage) -> Self {
        Self {
            image,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_validation(mut self, options: ValidationOptions) -> Self {
        self.validation = options;
        self
    }

    #[must_use]
    pub fn image(&self) -> &ProcessImage {
        &self.image
    }

    #[must_use]
    pub fn program(&self) -> &LadderProgram {
        &self.program
    }

    #[must_use]
    pub fn timers(&self) -> &TimerBank {
        &self.timers
    }

    /// Trace of the most recently completed cycle.
    #[must_use]
    pub fn trace(&self) -> &ScanTrace {
        &self.trace
    }

    #[must_use]
    pub fn cycle_count(&self) -> u64 {
        self.cycle_counter
    }

    #[must_use]
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut CycleStats {
        &mut self.stats
    }

    /// Replace the program with one already resolved against this image.
    ///
    /// Timer state is discarded. Tags referenced by `program` must come from
    /// [`Simulation::register_tag`] or [`Simulation::image`].
    pub fn set_program(&mut self, program: LadderProgram) {
        self.program = program;
        self.discard_runtime_state();
    }

    pub fn register_tag(&mut self, name: &str) -> Option<TagId> {
        self.image.register_tag(name)
    }

    /// Resolve and install a serialized program.
    ///
    /// On error the current program, image and timers stay as they were.
    pub fn load_document(&mut self, document: &ProgramDocument) -> Result<(), RuntimeError> {
        let program = LadderProgram::from_document(document, &mut self.image)?;
        info!(
            rungs = program.rungs.len(),
            elements = document.element_count(),
            "program loaded"
        );
        self.set_program(program);
        Ok(())
    }

    pub fn load_json(&mut self, text: &str) -> Result<(), RuntimeError> {
        let document = ProgramDocument::from_json(text)?;
        self.load_document(&document)
    }

    #[must_use]
    pub fn export_document(&self) -> ProgramDocument {
        self.program.to_document(&self.image)
    }

    /// Validate the program for periodic scanning.
    ///
    /// Warnings are logged and returned; blocking issues become
    /// [`RuntimeError::Validation`].
    pub fn pre_run_check(&self) -> Result<ValidationReport, RuntimeError> {
        let report = validate_with(&self.program, self.validation);
        for issue in report.warnings() {
            warn!("{issue}");
        }
        if report.is_blocking() {
            return Err(RuntimeError::Validation(report));
        }
        Ok(report)
    }

    /// Force a tag between cycles, registering it when new.
    pub fn inject(&mut self, name: &str, value: bool) -> Option<TagId> {
        self.image.write(name, value)
    }

    /// Clear every value to `false` and drop timer state.
    pub fn reset(&mut self) {
        self.image.clear_values();
        self.discard_runtime_state();
        self.cycle_counter = 0;
        info!("simulation reset");
    }

    fn discard_runtime_state(&mut self) {
        self.timers.clear();
        self.trace = ScanTrace::default();
        self.last_cycle_at = None;
    }
}
