use miette::Diagnostic;
use thiserror::Error;

use modplan_resolver::ResolveError;

/// Errors surfaced by the `modplan` binary.
#[derive(Debug, Error)]
pub enum CliError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unreadable or malformed plan file.
    #[error("Plan file error: {message}")]
    Plan { message: String },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The diagnostic pass found problems.
    #[error("{count} problem(s) found")]
    Problems { count: usize },
}

// Hand-written equivalent of `#[derive(Diagnostic)]` with `#[diagnostic(transparent)]`
// on `Resolve`: the derive calls `self.related()`, which resolves to the inherent
// `ResolveError::related` instead of the trait method, so forward explicitly.
impl Diagnostic for CliError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        match self {
            CliError::Resolve(e) => Diagnostic::code(e),
            _ => None,
        }
    }

    fn severity(&self) -> Option<miette::Severity> {
        match self {
            CliError::Resolve(e) => Diagnostic::severity(e),
            _ => None,
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        match self {
            CliError::Plan { .. } => Some(Box::new("Check the plan file for syntax errors")),
            CliError::Resolve(e) => Diagnostic::help(e),
            _ => None,
        }
    }

    fn url<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        match self {
            CliError::Resolve(e) => Diagnostic::url(e),
            _ => None,
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            CliError::Resolve(e) => Diagnostic::source_code(e),
            _ => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        match self {
            CliError::Resolve(e) => Diagnostic::labels(e),
            _ => None,
        }
    }

    fn related<'a>(&'a self) -> Option<Box<dyn Iterator<Item = &'a dyn Diagnostic> + 'a>> {
        match self {
            CliError::Resolve(e) => Diagnostic::related(e),
            _ => None,
        }
    }

    fn diagnostic_source(&self) -> Option<&dyn Diagnostic> {
        match self {
            CliError::Resolve(e) => Diagnostic::diagnostic_source(e),
            _ => None,
        }
    }
}
