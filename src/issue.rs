//! Diagnostics.
//!
//! The resolver never decides severity itself: every issue goes through a
//! [`DiagnosticSink`], whose [`Verdict`] says whether the problem is fatal
//! for the statement being analyzed.  [`IssueBuffer`] is the sink used by
//! the analyzer; it applies the `[issues]` configuration.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ast::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueKind {
    ParentNotFound,
    UndefinedClass,
    UndefinedMethod,
    InvalidStringClass,
    MixedMethodCall,
    DeprecatedClass,
    InternalClass,
    InaccessibleMethod,
    InvalidStaticInvocation,
    NonStaticSelfCall,
    DeprecatedMethod,
    InternalMethod,
    TooFewArguments,
    TooManyArguments,
    InvalidArgument,
}

impl IssueKind {
    pub fn name(self) -> &'static str {
        match self {
            IssueKind::ParentNotFound => "ParentNotFound",
            IssueKind::UndefinedClass => "UndefinedClass",
            IssueKind::UndefinedMethod => "UndefinedMethod",
            IssueKind::InvalidStringClass => "InvalidStringClass",
            IssueKind::MixedMethodCall => "MixedMethodCall",
            IssueKind::DeprecatedClass => "DeprecatedClass",
            IssueKind::InternalClass => "InternalClass",
            IssueKind::InaccessibleMethod => "InaccessibleMethod",
            IssueKind::InvalidStaticInvocation => "InvalidStaticInvocation",
            IssueKind::NonStaticSelfCall => "NonStaticSelfCall",
            IssueKind::DeprecatedMethod => "DeprecatedMethod",
            IssueKind::InternalMethod => "InternalMethod",
            IssueKind::TooFewArguments => "TooFewArguments",
            IssueKind::TooManyArguments => "TooManyArguments",
            IssueKind::InvalidArgument => "InvalidArgument",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub message: String,
    pub file: String,
    pub span: Span,
    pub severity: Severity,
}

impl Issue {
    pub fn new(kind: IssueKind, message: impl Into<String>, file: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            file: file.into(),
            span,
            severity: Severity::Error,
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "ERROR",
            Severity::Info => "INFO",
        };
        write!(
            f,
            "{level}: {} - {}:{}:{} - {}",
            self.kind, self.file, self.span.start, self.span.end, self.message
        )
    }
}

/// What the sink decided about a reported issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Stop analyzing the current statement.
    Fatal,
    /// Keep going.
    Recoverable,
}

impl Verdict {
    pub fn is_fatal(self) -> bool {
        self == Verdict::Fatal
    }
}

pub trait DiagnosticSink {
    fn report(&mut self, issue: Issue) -> Verdict;
}

/// Per-kind handling configured under `[issues]`.
#[derive(Debug, Clone, Default)]
pub struct IssueSettings {
    pub suppress: HashSet<IssueKind>,
    pub info: HashSet<IssueKind>,
}

/// Collects the issues of one analyzed file.
#[derive(Debug, Default)]
pub struct IssueBuffer {
    settings: IssueSettings,
    issues: Vec<Issue>,
    suppressed: usize,
}

impl IssueBuffer {
    pub fn new(settings: IssueSettings) -> Self {
        Self {
            settings,
            issues: Vec::new(),
            suppressed: 0,
        }
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn take(&mut self) -> Vec<Issue> {
        std::mem::take(&mut self.issues)
    }

    pub fn suppressed_count(&self) -> usize {
        self.suppressed
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn count_of(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }
}

impl DiagnosticSink for IssueBuffer {
    fn report(&mut self, mut issue: Issue) -> Verdict {
        if self.settings.suppress.contains(&issue.kind) {
            tracing::debug!(kind = %issue.kind, "suppressed: {}", issue.message);
            self.suppressed += 1;
            return Verdict::Recoverable;
        }
        if self.settings.info.contains(&issue.kind) {
            issue.severity = Severity::Info;
            self.issues.push(issue);
            return Verdict::Recoverable;
        }
        self.issues.push(issue);
        Verdict::Fatal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(kind: IssueKind) -> Issue {
        Issue::new(kind, "msg", "a.php", Span::new(1, 2))
    }

    #[test]
    fn errors_are_fatal() {
        let mut buffer = IssueBuffer::default();
        assert_eq!(buffer.report(issue(IssueKind::UndefinedMethod)), Verdict::Fatal);
        assert!(buffer.has_errors());
    }

    #[test]
    fn suppressed_and_info_are_recoverable() {
        let mut settings = IssueSettings::default();
        settings.suppress.insert(IssueKind::MixedMethodCall);
        settings.info.insert(IssueKind::DeprecatedClass);
        let mut buffer = IssueBuffer::new(settings);

        assert_eq!(buffer.report(issue(IssueKind::MixedMethodCall)), Verdict::Recoverable);
        assert_eq!(buffer.report(issue(IssueKind::DeprecatedClass)), Verdict::Recoverable);
        assert_eq!(buffer.issues().len(), 1);
        assert_eq!(buffer.suppressed_count(), 1);
        assert!(!buffer.has_errors());
    }
}
