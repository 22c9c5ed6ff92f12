//! Non-fatal findings reported alongside a compiled document.

use std::fmt;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Informational; nothing to fix.
    Info,
    /// The document compiled but may not behave as intended on the host.
    Warning,
}

/// A single finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// URI of the unit the finding concerns.
    pub unit: String,
    /// The member or export involved, if any.
    pub member: Option<String>,
    /// Human-readable description.
    pub message: String,
    /// Severity of the finding.
    pub severity: Severity,
}

impl Diagnostic {
    /// Creates an informational finding.
    pub fn info(unit: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            member: None,
            message: message.into(),
            severity: Severity::Info,
        }
    }

    /// Creates a warning.
    pub fn warn(unit: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            member: None,
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    /// Attaches the member name.
    #[must_use]
    pub fn on(mut self, member: impl Into<String>) -> Self {
        self.member = Some(member.into());
        self
    }

    /// Returns true if this is a warning.
    #[must_use]
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Info => "info",
            Severity::Warning => "warning",
        };
        match &self.member {
            Some(member) => write!(f, "{level}: {}/{member}: {}", self.unit, self.message),
            None => write!(f, "{level}: {}: {}", self.unit, self.message),
        }
    }
}

/// Every finding from one compile, in the order found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// The findings.
    pub entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a finding.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    /// Returns the count of warnings.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.entries.iter().filter(|d| d.is_warning()).count()
    }

    /// Iterates over the warnings only.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.is_warning())
    }

    /// Returns true if nothing was reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_only_warnings() {
        let mut report = Diagnostics::new();
        report.push(Diagnostic::info("/test/app", "skipped private member").on("_cache"));
        report.push(Diagnostic::warn("/test/lib", "may not support JSON encoding").on("User"));

        assert_eq!(report.warning_count(), 1);
        assert_eq!(report.warnings().count(), 1);
        assert!(!report.is_empty());
    }

    #[test]
    fn display_includes_location() {
        let d = Diagnostic::warn("/test/lib", "chain wraps immutable state").on("count");
        assert_eq!(
            d.to_string(),
            "warning: /test/lib/count: chain wraps immutable state"
        );
    }
}
