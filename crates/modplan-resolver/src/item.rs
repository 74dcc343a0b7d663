//! Resolver nodes: one [`Item`] per installable component, with its
//! requested [`Action`] and its dependency and conflict declarations.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::version::{Version, VersionRange};

/// What the installer driver should do with a component.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[default]
    None,
    Install,
    Upgrade,
    Remove,
}

impl Action {
    /// Install or upgrade: the component ends up present at its component version.
    pub fn is_install_or_upgrade(self) -> bool {
        matches!(self, Action::Install | Action::Upgrade)
    }

    /// Whether a component in this state is present once the plan has run.
    pub fn leaves_present(self, installed: bool) -> bool {
        match self {
            Action::Install | Action::Upgrade => true,
            Action::Remove => false,
            Action::None => installed,
        }
    }

    /// Resolution only ever escalates away from `None`.
    pub fn can_escalate_to(self, to: Action) -> bool {
        self == Action::None && to != Action::None && to != Action::Upgrade
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::None => "none",
            Action::Install => "install",
            Action::Upgrade => "upgrade",
            Action::Remove => "remove",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A component name together with the versions it is accepted at.
#[derive(Debug, Clone)]
pub struct Requirement {
    pub name: String,
    pub range: VersionRange,
}

impl Requirement {
    pub fn new(name: impl Into<String>, range: &str) -> Self {
        Self {
            name: name.into(),
            range: VersionRange::parse(range),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.range)
    }
}

/// An outgoing dependency declaration.
#[derive(Debug, Clone)]
pub enum Dependency {
    /// A single named component.
    Direct(Requirement),
    /// Any one of several alternative components, under a group name.
    Choice {
        name: String,
        alternatives: Vec<Requirement>,
    },
}

impl Dependency {
    /// All component names this declaration can point at.
    pub fn target_names(&self) -> Vec<&str> {
        match self {
            Dependency::Direct(req) => vec![req.name.as_str()],
            Dependency::Choice { alternatives, .. } => {
                alternatives.iter().map(|r| r.name.as_str()).collect()
            }
        }
    }
}

/// One installable component as seen by the resolver.
///
/// No validation happens here; consistency is checked during resolution.
#[derive(Debug, Clone)]
pub struct Item {
    name: String,
    installed_version: Option<Version>,
    component_version: Option<Version>,
    action: Action,
    dependencies: Vec<Dependency>,
    conflicts: Vec<Requirement>,
    properties: BTreeMap<String, serde_json::Value>,
}

impl Item {
    /// A component available at `component_version` and not installed yet.
    pub fn new(name: impl Into<String>, component_version: &str) -> Self {
        Self {
            name: name.into(),
            installed_version: None,
            component_version: Some(Version::parse(component_version)),
            action: Action::None,
            dependencies: Vec::new(),
            conflicts: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    /// An installed component whose code is no longer available.
    pub fn installed_only(name: impl Into<String>, installed_version: &str) -> Self {
        Self {
            name: name.into(),
            installed_version: Some(Version::parse(installed_version)),
            component_version: None,
            action: Action::None,
            dependencies: Vec::new(),
            conflicts: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_installed_version(mut self, version: &str) -> Self {
        self.installed_version = Some(Version::parse(version));
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    pub fn add_dependency(&mut self, name: impl Into<String>, range: &str) -> &mut Self {
        self.dependencies
            .push(Dependency::Direct(Requirement::new(name, range)));
        self
    }

    /// Declare a dependency satisfied by exactly one of `alternatives`
    /// (`(component name, version range)` pairs).
    pub fn add_choice_dependency<N, R>(
        &mut self,
        choice_name: impl Into<String>,
        alternatives: impl IntoIterator<Item = (N, R)>,
    ) -> &mut Self
    where
        N: Into<String>,
        R: AsRef<str>,
    {
        let alternatives = alternatives
            .into_iter()
            .map(|(name, range)| Requirement::new(name, range.as_ref()))
            .collect();
        self.dependencies.push(Dependency::Choice {
            name: choice_name.into(),
            alternatives,
        });
        self
    }

    pub fn add_conflict(&mut self, name: impl Into<String>, range: &str) -> &mut Self {
        self.conflicts.push(Requirement::new(name, range));
        self
    }

    pub fn set_action(&mut self, action: Action) {
        self.action = action;
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn property(&self, key: &str) -> Option<&serde_json::Value> {
        self.properties.get(key)
    }

    pub fn properties(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.properties
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn installed_version(&self) -> Option<&Version> {
        self.installed_version.as_ref()
    }

    pub fn component_version(&self) -> Option<&Version> {
        self.component_version.as_ref()
    }

    pub fn is_installed(&self) -> bool {
        self.installed_version.is_some()
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn conflicts(&self) -> &[Requirement] {
        &self.conflicts
    }

    /// The version this component will be at once `action` has been applied.
    pub fn effective_version(&self, action: Action) -> Option<&Version> {
        if action.is_install_or_upgrade() {
            self.component_version.as_ref()
        } else {
            self.installed_version.as_ref()
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.effective_version(self.action) {
            Some(v) => write!(f, "{}@{}", self.name, v),
            None => f.write_str(&self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_item_is_not_installed() {
        let item = Item::new("base", "1.0");
        assert!(!item.is_installed());
        assert_eq!(item.action(), Action::None);
        assert_eq!(item.component_version().map(Version::as_str), Some("1.0"));
    }

    #[test]
    fn effective_version_follows_action() {
        let item = Item::new("x", "2.0").with_installed_version("1.0");
        assert_eq!(item.effective_version(Action::None).unwrap().as_str(), "1.0");
        assert_eq!(item.effective_version(Action::Upgrade).unwrap().as_str(), "2.0");
        assert_eq!(item.effective_version(Action::Remove).unwrap().as_str(), "1.0");
    }

    #[test]
    fn declarations_keep_order() {
        let mut item = Item::new("app", "1.0");
        item.add_dependency("base", ">=1.0")
            .add_choice_dependency("db", [("mysql", "*"), ("pgsql", ">=9")])
            .add_conflict("legacy", "*");

        assert_eq!(item.dependencies().len(), 2);
        assert_eq!(item.dependencies()[0].target_names(), vec!["base"]);
        assert_eq!(item.dependencies()[1].target_names(), vec!["mysql", "pgsql"]);
        assert_eq!(item.conflicts()[0].name, "legacy");
    }

    #[test]
    fn properties_are_opaque() {
        let mut item = Item::new("app", "1.0");
        item.set_property("path", "modules/app");
        item.set_property("entry_points", serde_json::json!(["index", "admin"]));
        assert_eq!(item.property("path"), Some(&serde_json::json!("modules/app")));
        assert!(item.property("missing").is_none());
        assert_eq!(item.properties().len(), 2);
    }

    #[test]
    fn escalation_only_from_none() {
        assert!(Action::None.can_escalate_to(Action::Install));
        assert!(Action::None.can_escalate_to(Action::Remove));
        assert!(!Action::None.can_escalate_to(Action::None));
        assert!(!Action::Install.can_escalate_to(Action::Remove));
        assert!(!Action::Remove.can_escalate_to(Action::Install));
    }

    #[test]
    fn presence_after_action() {
        assert!(Action::None.leaves_present(true));
        assert!(!Action::None.leaves_present(false));
        assert!(Action::Install.leaves_present(false));
        assert!(!Action::Remove.leaves_present(true));
    }
}
