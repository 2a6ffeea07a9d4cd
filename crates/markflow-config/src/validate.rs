//! Configuration validation.
//!
//! Validation never fails construction: a snapshot with problems still
//! works with whatever is usable (the engine prefers partial capability
//! over total failure), so issues are reported as a list for the caller
//! to surface.

use globset::GlobBuilder;

use crate::config::FlowConfig;

/// Severity of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    /// The snapshot works but behaves in a way the user may not expect.
    Warning,
    /// Part of the snapshot cannot be used.
    Error,
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// How serious the finding is.
    pub severity: IssueSeverity,
    /// Human-readable description.
    pub message: String,
}

impl ConfigIssue {
    fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Warning,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Error,
            message: message.into(),
        }
    }
}

impl FlowConfig {
    /// Check the snapshot and report anything a user should know about.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if !self.enabled {
            issues.push(ConfigIssue::warning("capture is disabled"));
        }

        if self.destination_rules.is_empty() {
            issues.push(ConfigIssue::warning(
                "no destination rules configured; images are assumed to be \
                 saved next to their document",
            ));
        }

        for (index, rule) in self.destination_rules.iter().enumerate() {
            if let Err(err) = GlobBuilder::new(&rule.pattern)
                .literal_separator(true)
                .build()
            {
                issues.push(ConfigIssue::error(format!(
                    "destination rule {index}: invalid glob '{}': {err}",
                    rule.pattern
                )));
            }
            if rule.destination.is_empty() {
                issues.push(ConfigIssue::error(format!(
                    "destination rule {index}: empty destination pattern"
                )));
            } else if rule.destination.contains("${") && !rule.destination.contains('}') {
                issues.push(ConfigIssue::warning(format!(
                    "destination rule {index}: unterminated variable in '{}'",
                    rule.destination
                )));
            }
        }

        if self.image_extensions.is_empty() {
            issues.push(ConfigIssue::error(
                "image_extensions is empty; no file can ever be captured",
            ));
        }
        if self.markdown_extensions.is_empty() {
            issues.push(ConfigIssue::error(
                "markdown_extensions is empty; no document can ever be correlated",
            ));
        }

        issues
    }
}
