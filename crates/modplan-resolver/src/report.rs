//! Problem reporting for the non-aborting diagnostic pass.

use std::fmt;

use crate::error::ResolveError;

/// Every problem found by [`Resolver::diagnose`](crate::Resolver::diagnose).
#[derive(Debug, Default, Clone)]
pub struct DiagnosticReport {
    pub problems: Vec<ResolveError>,
}

impl DiagnosticReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, problem: ResolveError) {
        if !self.problems.contains(&problem) {
            self.problems.push(problem);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResolveError> {
        self.problems.iter()
    }
}

impl<'a> IntoIterator for &'a DiagnosticReport {
    type Item = &'a ResolveError;
    type IntoIter = std::slice::Iter<'a, ResolveError>;

    fn into_iter(self) -> Self::IntoIter {
        self.problems.iter()
    }
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.problems.is_empty() {
            return write!(f, "No problems found.");
        }
        writeln!(f, "Problems ({}):", self.problems.len())?;
        for p in &self.problems {
            writeln!(f, "  [{}] {}", p.kind(), p)?;
        }
        Ok(())
    }
}
