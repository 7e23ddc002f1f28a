//! Three-stage anatomy validation
//!
//! * Stage A ([`schema`]) checks raw documents before they are typed.
//! * Stage B ([`preflight`]) cross-references a blueprint, its template, a
//!   recipe and the part catalog without producing a graph.
//! * Stage C ([`integrity`]) checks a finished graph.
//!
//! Validators accumulate findings; they never stop at the first problem.

mod integrity;
mod preflight;
mod schema;

pub use integrity::IntegrityValidator;
pub use preflight::PreflightValidator;
pub use schema::{DocumentKind, SchemaValidator};

use serde::Serialize;

use crate::core::{AnatomyError, ErrorClass};

/// Which validation stage produced a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Schema,
    PreFlight,
    Integrity,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Schema => "schema",
            Stage::PreFlight => "pre-flight",
            Stage::Integrity => "integrity",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One problem found by a validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub class: ErrorClass,
    /// Document, slot or binding the finding is about
    pub subject: String,
    pub message: String,
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{} [{}] {}: {}", level, self.class, self.subject, self.message)
    }
}

/// Result of running one validation stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub stage: Stage,
    pub is_valid: bool,
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
}

impl ValidationReport {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn error(&mut self, class: ErrorClass, subject: &str, message: &str) {
        self.is_valid = false;
        self.errors.push(Finding {
            severity: Severity::Error,
            class,
            subject: subject.to_string(),
            message: message.to_string(),
        });
    }

    pub fn warn(&mut self, class: ErrorClass, subject: &str, message: &str) {
        self.warnings.push(Finding {
            severity: Severity::Warning,
            class,
            subject: subject.to_string(),
            message: message.to_string(),
        });
    }

    /// Record a failed operation as an error finding
    pub fn absorb(&mut self, err: &AnatomyError, subject: &str) {
        self.error(err.class(), subject, &err.to_string());
    }

    /// Fold another report's findings into this one
    pub fn merge(&mut self, other: ValidationReport) {
        if !other.is_valid {
            self.is_valid = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn has_class(&self, class: ErrorClass) -> bool {
        self.errors.iter().any(|f| f.class == class)
    }

    /// Convert a failed report into an error, pass a clean one through
    pub fn into_result(self) -> crate::core::Result<ValidationReport> {
        if self.is_valid {
            Ok(self)
        } else {
            Err(AnatomyError::ValidationFailed {
                stage: self.stage,
                report: Box::new(self),
            })
        }
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{} stage: {} error(s), {} warning(s)",
            self.stage,
            self.errors.len(),
            self.warnings.len()
        )?;
        for finding in self.errors.iter().chain(&self.warnings) {
            writeln!(f, "  {}", finding)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_keep_report_valid() {
        let mut report = ValidationReport::new(Stage::PreFlight);
        report.warn(ErrorClass::Reference, "group(horns)", "matched no slots");
        assert!(report.is_valid());
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_merge_and_absorb() {
        let mut report = ValidationReport::new(Stage::Schema);
        let mut other = ValidationReport::new(Stage::Schema);
        other.absorb(&AnatomyError::UnknownGroup("fins".into()), "recipe 'shark'");
        report.merge(other);

        assert!(!report.is_valid());
        assert!(report.has_class(ErrorClass::Reference));
        assert!(report.to_string().contains("error [reference] recipe 'shark'"));

        let err = report.into_result().unwrap_err();
        assert_eq!(err.class(), ErrorClass::Reference);
    }
}
