//! Validation report types.
//!
//! A report renders as text for people and serializes as JSON for scripts.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;

/// The result of validating a catalog.
#[derive(Clone, Debug, Default)]
pub struct ValidationReport {
    /// All issues found, in the order they were detected.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// An empty report.
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Records `issue`.
    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Issues that would break an export.
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    /// Issues an export tolerates.
    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    /// No export blockers found.
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    /// Nothing found at all.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issues with the given code.
    pub fn with_code(&self, code: IssueCode) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |i| i.code == code)
    }

    fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }
}

impl Serialize for ValidationReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ValidationReport", 3)?;
        state.serialize_field("error_count", &self.error_count())?;
        state.serialize_field("warning_count", &self.warning_count())?;
        state.serialize_field("issues", &self.issues)?;
        state.end()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return writeln!(f, "Validation passed: no issues found");
        }

        writeln!(
            f,
            "Validation completed with {} error(s) and {} warning(s):",
            self.error_count(),
            self.warning_count()
        )?;
        writeln!(f)?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// One finding, tied to the record it concerns.
#[derive(Clone, Debug, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    /// Stable code for the issue type.
    pub code: IssueCode,
    pub message: String,
    /// Where the issue occurred.
    pub context: IssueContext,
}

impl ValidationIssue {
    /// Creates an error.
    pub fn error(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            context,
        }
    }

    /// Creates a warning.
    pub fn warning(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            context,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
        };
        write!(
            f,
            "[{}] {:?} in {}: {}",
            severity, self.code, self.context, self.message
        )
    }
}

/// How much an issue matters to an export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Exports may work but the output could be surprising.
    Warning,
    /// Exports will fail or produce wrong data.
    Error,
}

/// Stable issue code, serialized by variant name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum IssueCode {
    // ID uniqueness
    DuplicateImageId,
    DuplicateAnnotationId,

    /// An annotation is listed under an image it does not belong to.
    MisplacedAnnotation,

    // Export blockers
    /// Missing or zero image dimensions.
    InvalidImageDimensions,
    /// Two images would write archive entries with the same name.
    DuplicateEntryName,
    /// More annotations on one image than derived COCO ids allow.
    AnnotationIdOverflow,

    EmptyFilePath,

    // Annotations
    MissingLabelClass,
    BBoxOutOfBounds,
    /// Zero or negative width or height.
    InvalidBBoxArea,
}

/// The catalog record an issue points at.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum IssueContext {
    Catalog,
    Image { id: u64 },
    Annotation { id: u64 },
}

impl fmt::Display for IssueContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueContext::Catalog => write!(f, "catalog"),
            IssueContext::Image { id } => write!(f, "image {}", id),
            IssueContext::Annotation { id } => write!(f, "annotation {}", id),
        }
    }
}
