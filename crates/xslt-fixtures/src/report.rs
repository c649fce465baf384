//! The run report: an append-only list of named failures plus run counters.

use crate::compare::Discrepancy;
use crate::error::Error;
use crate::resolve::DiscoveryFailure;
use serde::Serialize;
use std::fmt;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    /// Missing or ambiguous expected output.
    Discovery,
    /// The stylesheet failed to compile, used a disabled capability, or raised while running.
    Transform,
    /// The output differs from the expected fixture.
    Mismatch,
    /// A file could not be read, listed, or written.
    Io,
    /// Output or fixture content could not be parsed in the selected comparison mode.
    Content,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Discovery => "discovery",
            Self::Transform => "transform",
            Self::Mismatch => "mismatch",
            Self::Io => "io",
            Self::Content => "content",
        }
    }

    fn of_error(err: &Error) -> Self {
        match err {
            Error::Transform(_) => Self::Transform,
            Error::XmlParse { .. } | Error::JsonParse { .. } => Self::Content,
            _ => Self::Io,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Failure {
    pub stylesheet: PathBuf,
    /// The input fixture the failure belongs to, when there is one.
    pub fixture: Option<PathBuf>,
    pub kind: FailureKind,
    pub message: String,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.fixture {
            Some(fixture) => write!(
                f,
                "[{}] {}: {}",
                self.kind.as_str(),
                fixture.display(),
                self.message
            ),
            None => write!(
                f,
                "[{}] {}: {}",
                self.kind.as_str(),
                self.stylesheet.display(),
                self.message
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub stylesheets: usize,
    /// Stylesheets without a fixture directory.
    pub untested: Vec<PathBuf>,
    /// Resolved (input, expected) pairs that were run.
    pub cases: usize,
    pub passed: usize,
    pub failures: Vec<Failure>,
}

impl Report {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn push(&mut self, stylesheet: &Path, fixture: Option<&Path>, kind: FailureKind, message: String) {
        tracing::warn!(
            stylesheet = %stylesheet.display(),
            fixture = %fixture.map(|f| f.display().to_string()).unwrap_or_default(),
            kind = kind.as_str(),
            "{message}"
        );
        self.failures.push(Failure {
            stylesheet: stylesheet.to_path_buf(),
            fixture: fixture.map(Path::to_path_buf),
            kind,
            message,
        });
    }

    pub fn record_discovery(&mut self, stylesheet: &Path, failure: &DiscoveryFailure) {
        self.push(
            stylesheet,
            Some(failure.input()),
            FailureKind::Discovery,
            failure.to_string(),
        );
    }

    pub fn record_error(&mut self, stylesheet: &Path, fixture: Option<&Path>, err: &Error) {
        self.push(stylesheet, fixture, FailureKind::of_error(err), err.to_string());
    }

    /// Records the outcome of one comparison; an empty list counts as a pass.
    pub fn record_comparison(
        &mut self,
        stylesheet: &Path,
        fixture: &Path,
        discrepancies: Vec<Discrepancy>,
    ) {
        if discrepancies.is_empty() {
            self.passed += 1;
            return;
        }
        for d in discrepancies {
            self.push(
                stylesheet,
                Some(fixture),
                FailureKind::Mismatch,
                d.to_string(),
            );
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} stylesheets ({} untested), {} cases, {} passed, {} failures",
            self.stylesheets,
            self.untested.len(),
            self.cases,
            self.passed,
            self.failures.len()
        )
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(&mut out, "# XSLT Fixture Report");
        let _ = writeln!(&mut out);
        let _ = writeln!(&mut out, "- Stylesheets: `{}`", self.stylesheets);
        let _ = writeln!(&mut out, "- Cases: `{}`", self.cases);
        let _ = writeln!(&mut out, "- Passed: `{}`", self.passed);
        let _ = writeln!(&mut out);
        let _ = writeln!(&mut out, "## Failures ({})", self.failures.len());
        let _ = writeln!(&mut out);
        for f in &self.failures {
            let subject = f.fixture.as_deref().unwrap_or(&f.stylesheet);
            let _ = writeln!(
                &mut out,
                "- `{}` ({}): {}",
                subject.display(),
                f.kind.as_str(),
                f.message
            );
        }
        if !self.untested.is_empty() {
            let _ = writeln!(&mut out);
            let _ = writeln!(&mut out, "## Untested ({})", self.untested.len());
            let _ = writeln!(&mut out);
            for s in &self.untested {
                let _ = writeln!(&mut out, "- `{}`", s.display());
            }
        }
        out
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for failure in &self.failures {
            writeln!(f, "{failure}")?;
        }
        write!(f, "{}", self.summary())
    }
}
