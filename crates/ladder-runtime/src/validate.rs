//! Pre-run program validation.

#![allow(missing_docs)]

use std::fmt;

use crate::program::{ElementId, ElementKind, LadderProgram};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    /// Element has no tag.
    MissingTag,
    /// Rung already has a driving output before this one.
    MultipleDrivers,
    /// Off-delay timers pass power through unchanged.
    OffDelayUnsupported,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTag => f.write_str("element has no tag"),
            Self::MultipleDrivers => f.write_str("rung has more than one output"),
            Self::OffDelayUnsupported => f.write_str("TOF has no off-delay behavior"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationIssue {
    pub element: ElementId,
    pub kind: IssueKind,
    pub severity: Severity,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.element, self.kind)
    }
}

/// Knobs for [`validate_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Report multiple outputs per rung as a warning instead of an error.
    pub allow_multiple_drivers: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// True when scanning must not start.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Warning)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let errors: Vec<String> = self.errors().map(ToString::to_string).collect();
        if errors.is_empty() {
            return f.write_str("no blocking issues");
        }
        f.write_str(&errors.join("; "))
    }
}

#[must_use]
pub fn validate(program: &LadderProgram) -> ValidationReport {
    validate_with(program, ValidationOptions::default())
}

#[must_use]
pub fn validate_with(program: &LadderProgram, options: ValidationOptions) -> ValidationReport {
    let mut issues = Vec::new();
    for (rung_index, rung) in program.rungs.iter().enumerate() {
        let mut seen_driver = false;
        for (index, element) in rung.elements.iter().enumerate() {
            let id = ElementId::new(rung_index, index);
            if element.tag.is_none() {
                issues.push(ValidationIssue {
                    element: id,
                    kind: IssueKind::MissingTag,
                    severity: Severity::Error,
                });
            }
            if element.kind.is_driver() {
                if seen_driver {
                    issues.push(ValidationIssue {
                        element: id,
                        kind: IssueKind::MultipleDrivers,
                        severity: if options.allow_multiple_drivers {
                            Severity::Warning
                        } else {
                            Severity::Error
                        },
                    });
                }
                seen_driver = true;
            }
            if element.kind == ElementKind::OffDelayTimer {
                issues.push(ValidationIssue {
                    element: id,
                    kind: IssueKind::OffDelayUnsupported,
                    severity: Severity::Warning,
                });
            }
        }
    }
    ValidationReport { issues }
}
