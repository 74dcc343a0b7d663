//! Structured resolution failures.
//!
//! Every variant names the offending item and carries the data a driver
//! needs to report the problem without re-deriving it.

use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

/// Why a set of requested actions cannot be planned.
#[derive(Debug, Clone, Eq, PartialEq, Error, Diagnostic)]
pub enum ResolveError {
    /// The same component name was registered twice.
    #[error("item `{item}` is already registered")]
    #[diagnostic(code(modplan::duplicate_item))]
    DuplicateItem { item: String },

    /// Direct dependencies that are not registered at all.
    #[error("`{item}` depends on unknown items: {}", .missing.join(", "))]
    #[diagnostic(
        code(modplan::dependency_missing_item),
        help("register the missing components or drop the dependency")
    )]
    DependencyMissingItem { item: String, missing: Vec<String> },

    /// None of the alternatives of a choice dependency is registered.
    #[error("no alternative of choice `{choice}` needed by `{item}` is known: {}", .alternatives.join(", "))]
    #[diagnostic(code(modplan::choice_missing_item))]
    ChoiceMissingItem {
        item: String,
        choice: String,
        alternatives: Vec<String>,
    },

    /// Several alternatives of a choice dependency could be installed and none is present.
    #[error("choice `{choice}` needed by `{item}` is ambiguous: {}", .candidates.join(", "))]
    #[diagnostic(
        code(modplan::choice_ambiguous),
        help("request one of the candidates explicitly")
    )]
    ChoiceAmbiguous {
        item: String,
        choice: String,
        candidates: Vec<String>,
    },

    /// The dependency will be at a version outside the declared range.
    #[error("`{item}` requires `{dependency}` {required}, found {}", .found.as_deref().unwrap_or("nothing"))]
    #[diagnostic(code(modplan::bad_item_version))]
    BadItemVersion {
        item: String,
        dependency: String,
        required: String,
        found: Option<String>,
    },

    /// A declared conflict with a component that is already installed.
    #[error("`{item}` conflicts with installed items: {}", .conflicting.join(", "))]
    #[diagnostic(code(modplan::installed_item_in_conflict))]
    InstalledItemInConflict {
        item: String,
        conflicting: Vec<String>,
    },

    /// A declared conflict with a component about to be installed.
    #[error("`{item}` conflicts with items to install: {}", .conflicting.join(", "))]
    #[diagnostic(code(modplan::item_to_install_in_conflict))]
    ItemToInstallInConflict {
        item: String,
        conflicting: Vec<String>,
    },

    /// A component slated for removal is still required by `item`.
    #[error("`{removed}` cannot be removed: `{item}` needs it")]
    #[diagnostic(
        code(modplan::removed_item_is_needed),
        help("remove the dependent as well, or keep the component")
    )]
    RemovedItemIsNeeded { item: String, removed: String },

    /// `item` is to be installed but needs a component the caller asked to remove.
    #[error("`{item}` needs `{removed}`, which is scheduled for removal")]
    #[diagnostic(code(modplan::item_to_install_should_be_removed))]
    ItemToInstallShouldBeRemoved { item: String, removed: String },

    /// A required component cannot be brought to a satisfying state.
    #[error("dependency of `{item}` cannot be installed: {}", .dependencies.join(", "))]
    #[diagnostic(code(modplan::dependency_cannot_be_installed))]
    DependencyCannotBeInstalled {
        item: String,
        dependencies: Vec<String>,
    },

    /// A cycle among the components to install or upgrade.
    #[error("circular dependency between `{item}` and `{via}`")]
    #[diagnostic(code(modplan::circular_dependency))]
    CircularDependency { item: String, via: String },

    /// A cycle among the components to remove.
    #[error("circular dependency between `{item}` and `{via}` prevents removal")]
    #[diagnostic(code(modplan::reverse_circular_dependency))]
    ReverseCircularDependency { item: String, via: String },
}

/// The kind of a [`ResolveError`], without its data.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    DuplicateItem,
    DependencyMissingItem,
    ChoiceMissingItem,
    ChoiceAmbiguous,
    BadItemVersion,
    InstalledItemInConflict,
    ItemToInstallInConflict,
    RemovedItemIsNeeded,
    ItemToInstallShouldBeRemoved,
    DependencyCannotBeInstalled,
    CircularDependency,
    ReverseCircularDependency,
}

impl ErrorKind {
    /// Stable key a driver can map to a localized message.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::DuplicateItem => "item.duplicate",
            ErrorKind::DependencyMissingItem => "dependency.missing.item",
            ErrorKind::ChoiceMissingItem => "choice.missing.item",
            ErrorKind::ChoiceAmbiguous => "choice.ambiguous",
            ErrorKind::BadItemVersion => "item.bad.version",
            ErrorKind::InstalledItemInConflict => "conflict.installed.item",
            ErrorKind::ItemToInstallInConflict => "conflict.item.to.install",
            ErrorKind::RemovedItemIsNeeded => "removed.item.is.needed",
            ErrorKind::ItemToInstallShouldBeRemoved => "item.to.install.should.be.removed",
            ErrorKind::DependencyCannotBeInstalled => "dependency.cannot.be.installed",
            ErrorKind::CircularDependency => "circular.dependency",
            ErrorKind::ReverseCircularDependency => "reverse.circular.dependency",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Auxiliary data attached to a [`ResolveError`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Related<'a> {
    None,
    /// Another registered item, e.g. the dependency at a bad version.
    Item(&'a str),
    /// Component names, e.g. missing dependencies or ambiguous candidates.
    Names(&'a [String]),
}

impl ResolveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::DuplicateItem { .. } => ErrorKind::DuplicateItem,
            ResolveError::DependencyMissingItem { .. } => ErrorKind::DependencyMissingItem,
            ResolveError::ChoiceMissingItem { .. } => ErrorKind::ChoiceMissingItem,
            ResolveError::ChoiceAmbiguous { .. } => ErrorKind::ChoiceAmbiguous,
            ResolveError::BadItemVersion { .. } => ErrorKind::BadItemVersion,
            ResolveError::InstalledItemInConflict { .. } => ErrorKind::InstalledItemInConflict,
            ResolveError::ItemToInstallInConflict { .. } => ErrorKind::ItemToInstallInConflict,
            ResolveError::RemovedItemIsNeeded { .. } => ErrorKind::RemovedItemIsNeeded,
            ResolveError::ItemToInstallShouldBeRemoved { .. } => {
                ErrorKind::ItemToInstallShouldBeRemoved
            }
            ResolveError::DependencyCannotBeInstalled { .. } => {
                ErrorKind::DependencyCannotBeInstalled
            }
            ResolveError::CircularDependency { .. } => ErrorKind::CircularDependency,
            ResolveError::ReverseCircularDependency { .. } => ErrorKind::ReverseCircularDependency,
        }
    }

    /// Name of the offending item.
    pub fn item(&self) -> &str {
        match self {
            ResolveError::DuplicateItem { item }
            | ResolveError::DependencyMissingItem { item, .. }
            | ResolveError::ChoiceMissingItem { item, .. }
            | ResolveError::ChoiceAmbiguous { item, .. }
            | ResolveError::BadItemVersion { item, .. }
            | ResolveError::InstalledItemInConflict { item, .. }
            | ResolveError::ItemToInstallInConflict { item, .. }
            | ResolveError::RemovedItemIsNeeded { item, .. }
            | ResolveError::ItemToInstallShouldBeRemoved { item, .. }
            | ResolveError::DependencyCannotBeInstalled { item, .. }
            | ResolveError::CircularDependency { item, .. }
            | ResolveError::ReverseCircularDependency { item, .. } => item,
        }
    }

    pub fn related(&self) -> Related<'_> {
        match self {
            ResolveError::DuplicateItem { .. } => Related::None,
            ResolveError::DependencyMissingItem { missing, .. } => Related::Names(missing),
            ResolveError::ChoiceMissingItem { alternatives, .. } => Related::Names(alternatives),
            ResolveError::ChoiceAmbiguous { candidates, .. } => Related::Names(candidates),
            ResolveError::BadItemVersion { dependency, .. } => Related::Item(dependency),
            ResolveError::InstalledItemInConflict { conflicting, .. }
            | ResolveError::ItemToInstallInConflict { conflicting, .. } => {
                Related::Names(conflicting)
            }
            ResolveError::RemovedItemIsNeeded { removed, .. }
            | ResolveError::ItemToInstallShouldBeRemoved { removed, .. } => Related::Item(removed),
            ResolveError::DependencyCannotBeInstalled { dependencies, .. } => {
                Related::Names(dependencies)
            }
            ResolveError::CircularDependency { via, .. }
            | ResolveError::ReverseCircularDependency { via, .. } => Related::Item(via),
        }
    }
}
