//! Scan-cycle evaluation.
//!
//! [`run_cycle`] is a pure step: it reads the committed process image,
//! evaluates every rung top to bottom and returns the next image, the next
//! timer state and a per-element power-flow trace. Contacts always read the
//! image as it was at the start of the cycle; coil and latch writes land in
//! a separate buffer that becomes the next image as a whole.

#![allow(missing_docs)]

use crate::image::ProcessImage;
use crate::program::{ElementId, ElementKind, LadderProgram};
use crate::timer::TimerBank;
use crate::value::Duration;

/// Visual state of one element after a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TraceEntry {
    /// Flow arriving at a contact/timer, or the resulting value of an output.
    pub energized: bool,
    /// Accumulated powered time for on-delay timers.
    pub timer_elapsed: Option<Duration>,
}

impl TraceEntry {
    fn flow(energized: bool) -> Self {
        Self {
            energized,
            timer_elapsed: None,
        }
    }
}

/// Per-element trace of the most recent cycle, in program order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanTrace {
    rungs: Vec<Vec<TraceEntry>>,
}

impl ScanTrace {
    #[must_use]
    pub fn get(&self, id: ElementId) -> Option<TraceEntry> {
        self.rungs.get(id.rung)?.get(id.index).copied()
    }

    #[must_use]
    pub fn is_energized(&self, id: ElementId) -> bool {
        self.get(id).is_some_and(|entry| entry.energized)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ElementId, TraceEntry)> + '_ {
        self.rungs.iter().enumerate().flat_map(|(rung, entries)| {
            entries
                .iter()
                .enumerate()
                .map(move |(index, entry)| (ElementId::new(rung, index), *entry))
        })
    }

    #[must_use]
    pub fn rung(&self, rung: usize) -> &[TraceEntry] {
        self.rungs.get(rung).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rungs.is_empty()
    }
}

/// Result of one scan cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleOutcome {
    pub image: ProcessImage,
    pub timers: TimerBank,
    pub trace: ScanTrace,
}

/// Evaluate `program` once against `current`.
///
/// `elapsed` is the wall-clock time since the previous cycle; it only feeds
/// on-delay timers. Elements without a tag are inert: power passes through
/// them unchanged and their trace entry stays de-energized.
#[must_use]
pub fn run_cycle(
    current: &ProcessImage,
    program: &LadderProgram,
    timers: &TimerBank,
    elapsed: Duration,
) -> CycleOutcome {
    let mut next = current.clone();
    let mut next_timers = timers.clone();

    // Non-latching coils are re-derived every cycle.
    for tag in program.coil_tags() {
        next.set(tag, false);
    }

    let mut rungs = Vec::with_capacity(program.rungs.len());
    for (rung_index, rung) in program.rungs.iter().enumerate() {
        let mut power = true;
        let mut entries = Vec::with_capacity(rung.elements.len());
        for (index, element) in rung.elements.iter().enumerate() {
            let Some(tag) = element.tag else {
                entries.push(TraceEntry::default());
                continue;
            };
            let entry = match element.kind {
                ElementKind::NormallyOpen => {
                    let arriving = power;
                    power = power && current.get(tag);
                    TraceEntry::flow(arriving)
                }
                ElementKind::NormallyClosed => {
                    let arriving = power;
                    power = power && !current.get(tag);
                    TraceEntry::flow(arriving)
                }
                ElementKind::OnDelayTimer => {
                    let arriving = power;
                    let id = ElementId::new(rung_index, index);
                    let out = next_timers.entry(id).step(power, element.preset, elapsed);
                    power = out.q;
                    TraceEntry {
                        energized: arriving,
                        timer_elapsed: Some(out.elapsed),
                    }
                }
                ElementKind::OffDelayTimer => TraceEntry::flow(power),
                ElementKind::SetLatch => {
                    if power {
                        next.set(tag, true);
                    }
                    power = next.get(tag);
                    TraceEntry::flow(power)
                }
                ElementKind::ResetLatch => {
                    if power {
                        next.set(tag, false);
                    }
                    power = next.get(tag);
                    TraceEntry::flow(power)
                }
                ElementKind::Coil => {
                    if power {
                        next.set(tag, true);
                    }
                    TraceEntry::flow(next.get(tag))
                }
            };
            entries.push(entry);
        }
        rungs.push(entries);
    }

    CycleOutcome {
        image: next,
        timers: next_timers,
        trace: ScanTrace { rungs },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{Element, Rung};

    fn rung(elements: Vec<Element>) -> Rung {
        Rung::new(elements)
    }

    #[test]
    fn contacts_read_the_frozen_snapshot() {
        let mut image = ProcessImage::new();
        let a = image.register_tag("A");
        let b = image.register_tag("B");
        let c = image.register_tag("C");
        image.write("B", true);
        let program = LadderProgram::new(vec![
            rung(vec![
                Element::new(ElementKind::NormallyOpen, b),
                Element::new(ElementKind::Coil, a),
            ]),
            rung(vec![
                Element::new(ElementKind::NormallyOpen, a),
                Element::new(ElementKind::Coil, c),
            ]),
        ]);

        let first = run_cycle(&image, &program, &TimerBank::new(), Duration::ZERO);
        assert!(first.image.read("A"));
        assert!(!first.image.read("C"));

        let second = run_cycle(&first.image, &program, &first.timers, Duration::ZERO);
        assert!(second.image.read("A"));
        assert!(second.image.read("C"));
    }

    #[test]
    fn input_image_is_not_mutated() {
        let mut image = ProcessImage::new();
        let a = image.register_tag("A");
        let program = LadderProgram::new(vec![rung(vec![Element::new(ElementKind::Coil, a)])]);
        let outcome = run_cycle(&image, &program, &TimerBank::new(), Duration::ZERO);
        assert!(outcome.image.read("A"));
        assert!(!image.read("A"));
    }

    #[test]
    fn undriven_coils_reset() {
        let mut image = ProcessImage::new();
        let x = image.register_tag("X");
        let y = image.register_tag("Y");
        image.write("Y", true);
        let program = LadderProgram::new(vec![rung(vec![
            Element::new(ElementKind::NormallyOpen, x),
            Element::new(ElementKind::Coil, y),
        ])]);

        let outcome = run_cycle(&image, &program, &TimerBank::new(), Duration::ZERO);
        assert!(!outcome.image.read("Y"));
        assert!(!outcome.trace.is_energized(ElementId::new(0, 1)));
    }

    #[test]
    fn latch_passes_resulting_value_downstream() {
        let mut image = ProcessImage::new();
        let start = image.register_tag("START");
        let run = image.register_tag("RUN");
        let lamp = image.register_tag("LAMP");
        let program = LadderProgram::new(vec![rung(vec![
            Element::new(ElementKind::NormallyOpen, start),
            Element::new(ElementKind::SetLatch, run),
            Element::new(ElementKind::Coil, lamp),
        ])]);

        // Unpowered latch that is already set still feeds the coil.
        image.write("RUN", true);
        let outcome = run_cycle(&image, &program, &TimerBank::new(), Duration::ZERO);
        assert!(outcome.image.read("RUN"));
        assert!(outcome.image.read("LAMP"));
        assert!(outcome.trace.is_energized(ElementId::new(0, 1)));
        assert!(outcome.trace.is_energized(ElementId::new(0, 2)));
    }

    #[test]
    fn reset_latch_clears_and_blocks_downstream() {
        let mut image = ProcessImage::new();
        let stop = image.register_tag("STOP");
        let run = image.register_tag("RUN");
        let lamp = image.register_tag("LAMP");
        image.write("STOP", true);
        image.write("RUN", true);
        let program = LadderProgram::new(vec![rung(vec![
            Element::new(ElementKind::NormallyOpen, stop),
            Element::new(ElementKind::ResetLatch, run),
            Element::new(ElementKind::Coil, lamp),
        ])]);

        let outcome = run_cycle(&image, &program, &TimerBank::new(), Duration::ZERO);
        assert!(!outcome.image.read("RUN"));
        assert!(!outcome.image.read("LAMP"));
        assert!(!outcome.trace.is_energized(ElementId::new(0, 1)));
    }

    #[test]
    fn trace_records_arriving_flow() {
        let mut image = ProcessImage::new();
        let a = image.register_tag("A");
        let b = image.register_tag("B");
        let q = image.register_tag("Q");
        image.write("A", false);
        image.write("B", true);
        let program = LadderProgram::new(vec![rung(vec![
            Element::new(ElementKind::NormallyOpen, a),
            Element::new(ElementKind::NormallyOpen, b),
            Element::new(ElementKind::Coil, q),
        ])]);

        let outcome = run_cycle(&image, &program, &TimerBank::new(), Duration::ZERO);
        let energized: Vec<bool> = outcome.trace.rung(0).iter().map(|e| e.energized).collect();
        assert_eq!(energized, vec![true, false, false]);
    }

    #[test]
    fn untagged_elements_are_inert() {
        let mut image = ProcessImage::new();
        let q = image.register_tag("Q");
        let program = LadderProgram::new(vec![rung(vec![
            Element::new(ElementKind::NormallyOpen, None),
            Element::new(ElementKind::NormallyClosed, None),
            Element::new(ElementKind::Coil, q),
        ])]);

        let outcome = run_cycle(&image, &program, &TimerBank::new(), Duration::ZERO);
        assert!(outcome.image.read("Q"));
        assert_eq!(outcome.trace.get(ElementId::new(0, 0)), Some(TraceEntry::default()));
    }

    #[test]
    fn off_delay_passes_power_through() {
        let mut image = ProcessImage::new();
        let t = image.register_tag("T");
        let q = image.register_tag("Q");
        let program = LadderProgram::new(vec![rung(vec![
            Element::new(ElementKind::OffDelayTimer, t),
            Element::new(ElementKind::Coil, q),
        ])]);

        let outcome = run_cycle(&image, &program, &TimerBank::new(), Duration::from_secs(1));
        assert!(outcome.image.read("Q"));
        assert!(outcome.timers.is_empty());
    }

    #[test]
    fn empty_program_is_a_no_op() {
        let mut image = ProcessImage::new();
        image.write("A", true);
        let outcome = run_cycle(
            &image,
            &LadderProgram::default(),
            &TimerBank::new(),
            Duration::ZERO,
        );
        assert_eq!(outcome.image, image);
        assert!(outcome.trace.is_empty());
    }
}
