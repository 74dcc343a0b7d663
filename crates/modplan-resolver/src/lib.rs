//! Dependency resolution engine for module installers: computes the ordered
//! chain of install, upgrade and remove actions for a set of components,
//! rejecting plans with missing, conflicting, out-of-range or circular
//! dependencies.

pub mod config;
pub mod error;
mod graph;
pub mod item;
pub mod report;
pub mod resolver;
pub mod version;

pub use config::ResolverOptions;
pub use error::{ErrorKind, Related, ResolveError};
pub use item::{Action, Dependency, Item, Requirement};
pub use report::DiagnosticReport;
pub use resolver::Resolver;
pub use version::{Version, VersionRange};
