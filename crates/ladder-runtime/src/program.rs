//! Ladder program model.

#![allow(missing_docs)]

use std::fmt;

use crate::document::{ElementRecord, ProgramDocument, TimeField};
use crate::error::RuntimeError;
use crate::image::ProcessImage;
use crate::tag::TagId;
use crate::value::Duration;

/// Preset used for timers that carry no explicit time.
pub const DEFAULT_TIMER_PRESET_SECS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    NormallyOpen,
    NormallyClosed,
    Coil,
    OnDelayTimer,
    OffDelayTimer,
    SetLatch,
    ResetLatch,
}

impl ElementKind {
    /// Parse a wire name. Accepts the legacy `SR`/`RESET_COIL` spellings.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_uppercase().as_str() {
            "NO" => Some(Self::NormallyOpen),
            "NC" => Some(Self::NormallyClosed),
            "COIL" => Some(Self::Coil),
            "TON" => Some(Self::OnDelayTimer),
            "TOF" => Some(Self::OffDelayTimer),
            "SET_LATCH" | "SR" => Some(Self::SetLatch),
            "RESET_LATCH" | "RESET_COIL" => Some(Self::ResetLatch),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NormallyOpen => "NO",
            Self::NormallyClosed => "NC",
            Self::Coil => "COIL",
            Self::OnDelayTimer => "TON",
            Self::OffDelayTimer => "TOF",
            Self::SetLatch => "SET_LATCH",
            Self::ResetLatch => "RESET_LATCH",
        }
    }

    /// Ladder symbol shown by monitors.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::NormallyOpen => "┤ ├",
            Self::NormallyClosed => "┤/├",
            Self::Coil => "( )",
            Self::OnDelayTimer => "[TON]",
            Self::OffDelayTimer => "[TOF]",
            Self::SetLatch => "[ S ]",
            Self::ResetLatch => "[ R ]",
        }
    }

    /// Coil, set latch or reset latch.
    #[must_use]
    pub fn is_driver(self) -> bool {
        matches!(self, Self::Coil | Self::SetLatch | Self::ResetLatch)
    }

    #[must_use]
    pub fn is_timer(self) -> bool {
        matches!(self, Self::OnDelayTimer | Self::OffDelayTimer)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural identity of an element: its position in program order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId {
    pub rung: usize,
    pub index: usize,
}

impl ElementId {
    #[must_use]
    pub fn new(rung: usize, index: usize) -> Self {
        Self { rung, index }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rung {} element {}", self.rung + 1, self.index + 1)
    }
}

/// One ladder element with its tag resolved against a process image.
///
/// `tag == None` marks an inert element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub kind: ElementKind,
    pub tag: Option<TagId>,
    pub preset: Duration,
}

impl Element {
    #[must_use]
    pub fn new(kind: ElementKind, tag: Option<TagId>) -> Self {
        let preset = if kind.is_timer() {
            Duration::from_secs(DEFAULT_TIMER_PRESET_SECS)
        } else {
            Duration::ZERO
        };
        Self { kind, tag, preset }
    }

    #[must_use]
    pub fn with_preset(mut self, preset: Duration) -> Self {
        self.preset = preset;
        self
    }
}

/// AND-chain of elements evaluated left to right.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rung {
    pub elements: Vec<Element>,
}

impl Rung {
    #[must_use]
    pub fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }

    #[must_use]
    pub fn has_driver(&self) -> bool {
        self.elements.iter().any(|element| element.kind.is_driver())
    }
}

/// Ordered sequence of rungs, evaluated top to bottom.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LadderProgram {
    pub rungs: Vec<Rung>,
}

impl LadderProgram {
    #[must_use]
    pub fn new(rungs: Vec<Rung>) -> Self {
        Self { rungs }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rungs.is_empty()
    }

    /// Every element with its structural id, in evaluation order.
    pub fn elements(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        self.rungs.iter().enumerate().flat_map(|(rung_index, rung)| {
            rung.elements
                .iter()
                .enumerate()
                .map(move |(index, element)| (ElementId::new(rung_index, index), element))
        })
    }

    /// Tags driven by non-latching coils, without duplicates.
    #[must_use]
    pub fn coil_tags(&self) -> Vec<TagId> {
        let mut tags: Vec<TagId> = self
            .elements()
            .filter(|(_, element)| element.kind == ElementKind::Coil)
            .filter_map(|(_, element)| element.tag)
            .collect();
        tags.sort_unstable();
        tags.dedup();
        tags
    }

    /// Append an element to `rung` the way the editor places it.
    ///
    /// A second driving output never shares a rung: it starts a new rung at
    /// the end of the program instead. An out-of-range `rung` also starts a
    /// new rung.
    pub fn append_element(&mut self, rung: usize, element: Element) -> ElementId {
        let fits = self
            .rungs
            .get(rung)
            .is_some_and(|target| !(element.kind.is_driver() && target.has_driver()));
        let rung = if fits {
            rung
        } else {
            self.rungs.push(Rung::default());
            self.rungs.len() - 1
        };
        let target = &mut self.rungs[rung];
        target.elements.push(element);
        ElementId::new(rung, target.elements.len() - 1)
    }

    /// Resolve a serialized program against `image`.
    ///
    /// Every referenced tag is registered with `false`. On error `image` is
    /// left untouched.
    pub fn from_document(
        document: &ProgramDocument,
        image: &mut ProcessImage,
    ) -> Result<Self, RuntimeError> {
        let mut staged = image.clone();
        let mut rungs = Vec::with_capacity(document.rungs.len());
        for (rung_index, records) in document.rungs.iter().enumerate() {
            let mut elements = Vec::with_capacity(records.len());
            for (index, record) in records.iter().enumerate() {
                let id = ElementId::new(rung_index, index);
                elements.push(resolve_record(id, record, &mut staged)?);
            }
            rungs.push(Rung::new(elements));
        }
        *image = staged;
        Ok(Self { rungs })
    }

    /// Serialize back to the interchange shape using names from `image`.
    #[must_use]
    pub fn to_document(&self, image: &ProcessImage) -> ProgramDocument {
        let rungs = self
            .rungs
            .iter()
            .map(|rung| {
                rung.elements
                    .iter()
                    .map(|element| ElementRecord {
                        kind: element.kind.as_str().to_string(),
                        tag: element
                            .tag
                            .and_then(|id| image.name(id))
                            .map(ToString::to_string),
                        time: element
                            .kind
                            .is_timer()
                            .then(|| TimeField::Seconds(element.preset.as_secs_f64())),
                    })
                    .collect()
            })
            .collect();
        ProgramDocument { rungs }
    }
}

fn resolve_record(
    id: ElementId,
    record: &ElementRecord,
    image: &mut ProcessImage,
) -> Result<Element, RuntimeError> {
    let kind = ElementKind::parse(&record.kind).ok_or_else(|| {
        RuntimeError::malformed(format!("{id}: unknown element type '{}'", record.kind))
    })?;
    let tag = record
        .tag
        .as_deref()
        .and_then(|name| image.register_tag(name));
    let mut element = Element::new(kind, tag);
    if kind.is_timer() {
        // A blank time field keeps the default preset.
        let time = record
            .time
            .as_ref()
            .filter(|time| !matches!(time, TimeField::Text(text) if text.trim().is_empty()));
        if let Some(time) = time {
            let preset = time.to_duration().ok_or_else(|| {
                RuntimeError::malformed(format!("{id}: invalid timer preset {time}"))
            })?;
            element = element.with_preset(preset);
        }
    }
    Ok(element)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: &str, tag: &str) -> ElementRecord {
        ElementRecord {
            kind: kind.into(),
            tag: Some(tag.into()),
            time: None,
        }
    }

    #[test]
    fn resolves_and_registers_tags() {
        let document = ProgramDocument {
            rungs: vec![vec![record("NO", "start"), record("COIL", "Motor")]],
        };
        let mut image = ProcessImage::new();
        let program = LadderProgram::from_document(&document, &mut image).unwrap();

        assert_eq!(image.len(), 2);
        assert!(!image.read("START"));
        let coil = &program.rungs[0].elements[1];
        assert_eq!(coil.kind, ElementKind::Coil);
        assert_eq!(coil.tag, image.resolve("MOTOR"));
    }

    #[test]
    fn legacy_kind_names_are_accepted() {
        assert_eq!(ElementKind::parse("SR"), Some(ElementKind::SetLatch));
        assert_eq!(ElementKind::parse("RESET_COIL"), Some(ElementKind::ResetLatch));
        assert_eq!(ElementKind::parse("set_latch"), Some(ElementKind::SetLatch));
        assert_eq!(ElementKind::parse("BOX"), None);
    }

    #[test]
    fn unknown_kind_leaves_image_untouched() {
        let document = ProgramDocument {
            rungs: vec![vec![record("NO", "A"), record("BOX", "B")]],
        };
        let mut image = ProcessImage::new();
        let err = LadderProgram::from_document(&document, &mut image).unwrap_err();

        assert_eq!(
            err,
            RuntimeError::MalformedProgram("rung 1 element 2: unknown element type 'BOX'".into())
        );
        assert!(image.is_empty());
    }

    #[test]
    fn blank_tags_resolve_to_inert_elements() {
        let document = ProgramDocument {
            rungs: vec![vec![record("NO", "  "), record("COIL", "")]],
        };
        let mut image = ProcessImage::new();
        let program = LadderProgram::from_document(&document, &mut image).unwrap();
        assert!(program.elements().all(|(_, element)| element.tag.is_none()));
        assert!(image.is_empty());
    }

    #[test]
    fn timers_default_to_three_seconds() {
        let document = ProgramDocument {
            rungs: vec![vec![record("TON", "T1")]],
        };
        let mut image = ProcessImage::new();
        let program = LadderProgram::from_document(&document, &mut image).unwrap();
        assert_eq!(program.rungs[0].elements[0].preset, Duration::from_secs(3));
    }

    #[test]
    fn blank_timer_time_keeps_default() {
        let document = ProgramDocument {
            rungs: vec![vec![
                ElementRecord {
                    time: Some(TimeField::Text(String::new())),
                    ..record("TON", "T1")
                },
                ElementRecord {
                    time: Some(TimeField::Text("  ".into())),
                    ..record("TOF", "T2")
                },
            ]],
        };
        let mut image = ProcessImage::new();
        let program = LadderProgram::from_document(&document, &mut image).unwrap();
        let presets: Vec<Duration> = program.elements().map(|(_, e)| e.preset).collect();
        assert_eq!(presets, vec![Duration::from_secs(3), Duration::from_secs(3)]);
    }

    #[test]
    fn second_driver_starts_new_rung() {
        let mut program = LadderProgram::default();
        let first = program.append_element(0, Element::new(ElementKind::NormallyOpen, None));
        let coil = program.append_element(first.rung, Element::new(ElementKind::Coil, None));
        let latch = program.append_element(coil.rung, Element::new(ElementKind::SetLatch, None));

        assert_eq!(first, ElementId::new(0, 0));
        assert_eq!(coil, ElementId::new(0, 1));
        assert_eq!(latch, ElementId::new(1, 0));
        assert_eq!(program.rungs.len(), 2);
    }

    #[test]
    fn coil_tags_skip_latches_and_duplicates() {
        let mut image = ProcessImage::new();
        let a = image.register_tag("A");
        let b = image.register_tag("B");
        let program = LadderProgram::new(vec![
            Rung::new(vec![Element::new(ElementKind::Coil, a)]),
            Rung::new(vec![Element::new(ElementKind::Coil, a)]),
            Rung::new(vec![Element::new(ElementKind::SetLatch, b)]),
        ]);
        assert_eq!(program.coil_tags(), vec![a.unwrap()]);
    }
}
