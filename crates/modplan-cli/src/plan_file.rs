//! The TOML plan file read by the CLI.
//!
//! ```toml
//! [resolver]
//! cascade-removals = true
//!
//! [[item]]
//! name = "blog"
//! version = "2.0"
//! installed = "1.4"
//! action = "upgrade"
//! depends = [
//!     "core",
//!     { name = "auth", version = ">=1.2" },
//!     { choice = "db", alternatives = [{ name = "mysql" }, { name = "pgsql", version = ">=9" }] },
//! ]
//! conflicts = [{ name = "legacy-blog" }]
//! properties = { path = "modules/blog" }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use modplan_resolver::{Action, Item, Resolver, ResolverOptions};

use crate::error::CliError;

/// The parsed representation of a plan file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanFile {
    #[serde(default)]
    pub resolver: ResolverOptions,

    #[serde(default, rename = "item")]
    pub items: Vec<PlanItem>,
}

/// One `[[item]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanItem {
    pub name: String,
    /// Version of the available component code.
    #[serde(default)]
    pub version: Option<String>,
    /// Version currently installed, if any.
    #[serde(default)]
    pub installed: Option<String>,
    #[serde(default)]
    pub action: Action,
    #[serde(default)]
    pub depends: Vec<PlanDependency>,
    #[serde(default)]
    pub conflicts: Vec<PlanRequirement>,
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

/// A dependency entry: a bare name, a name with a range, or a choice.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PlanDependency {
    Short(String),
    Choice {
        choice: String,
        alternatives: Vec<PlanRequirement>,
    },
    Detailed(PlanRequirement),
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanRequirement {
    pub name: String,
    #[serde(default = "any_version")]
    pub version: String,
}

fn any_version() -> String {
    "*".to_string()
}

impl PlanFile {
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let content = std::fs::read_to_string(path).map_err(|e| CliError::Plan {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::from_str(&content)
    }

    pub fn from_str(content: &str) -> Result<Self, CliError> {
        toml::from_str(content).map_err(|e| CliError::Plan {
            message: format!("Failed to parse plan file: {e}"),
        })
    }

    /// Build a resolver holding every item, in file order.
    pub fn into_resolver(self) -> Result<Resolver, CliError> {
        let mut resolver = Resolver::with_options(self.resolver);
        for entry in self.items {
            resolver.add_item(entry.into_item()?)?;
        }
        Ok(resolver)
    }
}

impl PlanItem {
    fn into_item(self) -> Result<Item, CliError> {
        let mut item = match (&self.version, &self.installed) {
            (Some(version), Some(installed)) => {
                Item::new(&self.name, version).with_installed_version(installed)
            }
            (Some(version), None) => Item::new(&self.name, version),
            (None, Some(installed)) => Item::installed_only(&self.name, installed),
            (None, None) => {
                return Err(CliError::Plan {
                    message: format!("item `{}` needs `version` or `installed`", self.name),
                });
            }
        };
        item.set_action(self.action);

        for dep in &self.depends {
            match dep {
                PlanDependency::Short(name) => {
                    item.add_dependency(name, "*");
                }
                PlanDependency::Detailed(req) => {
                    item.add_dependency(&req.name, &req.version);
                }
                PlanDependency::Choice {
                    choice,
                    alternatives,
                } => {
                    item.add_choice_dependency(
                        choice,
                        alternatives
                            .iter()
                            .map(|alt| (alt.name.as_str(), alt.version.as_str())),
                    );
                }
            }
        }
        for conflict in &self.conflicts {
            item.add_conflict(&conflict.name, &conflict.version);
        }
        for (key, value) in self.properties {
            item.set_property(key, value);
        }
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modplan_resolver::Dependency;

    #[test]
    fn parses_full_entry() {
        let plan = PlanFile::from_str(
            r#"
[resolver]
cascade-removals = true

[[item]]
name = "blog"
version = "2.0"
installed = "1.4"
action = "upgrade"
depends = [
    "core",
    { name = "auth", version = ">=1.2" },
    { choice = "db", alternatives = [{ name = "mysql" }, { name = "pgsql", version = ">=9" }] },
]
conflicts = [{ name = "legacy-blog" }]
properties = { path = "modules/blog" }
"#,
        )
        .unwrap();

        assert!(plan.resolver.cascade_removals);
        assert!(plan.resolver.prefer_installed_choice);

        let resolver = plan.into_resolver().unwrap();
        let blog = resolver.item("blog").unwrap();
        assert_eq!(blog.action(), Action::Upgrade);
        assert_eq!(blog.installed_version().unwrap().as_str(), "1.4");
        assert_eq!(blog.dependencies().len(), 3);
        assert!(matches!(
            &blog.dependencies()[0],
            Dependency::Direct(req) if req.name == "core" && req.range.is_any()
        ));
        assert!(matches!(
            &blog.dependencies()[2],
            Dependency::Choice { name, alternatives } if name == "db" && alternatives.len() == 2
        ));
        assert_eq!(blog.conflicts()[0].name, "legacy-blog");
        assert_eq!(
            blog.property("path"),
            Some(&serde_json::json!("modules/blog"))
        );
    }

    #[test]
    fn installed_only_entry() {
        let plan = PlanFile::from_str(
            r#"
[[item]]
name = "old"
installed = "0.9"
"#,
        )
        .unwrap();
        let resolver = plan.into_resolver().unwrap();
        let old = resolver.item("old").unwrap();
        assert!(old.is_installed());
        assert!(old.component_version().is_none());
        assert_eq!(old.action(), Action::None);
    }

    #[test]
    fn entry_without_any_version_is_rejected() {
        let plan = PlanFile::from_str("[[item]]\nname = \"ghost\"\n").unwrap();
        let err = plan.into_resolver().unwrap_err();
        assert!(err.to_string().contains("needs `version` or `installed`"));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let plan = PlanFile::from_str(
            "[[item]]\nname = \"a\"\nversion = \"1\"\n[[item]]\nname = \"a\"\nversion = \"2\"\n",
        )
        .unwrap();
        assert!(matches!(
            plan.into_resolver(),
            Err(CliError::Resolve(_))
        ));
    }

    #[test]
    fn unknown_action_is_a_parse_error() {
        let err = PlanFile::from_str("[[item]]\nname = \"a\"\nversion = \"1\"\naction = \"purge\"\n")
            .unwrap_err();
        assert!(matches!(err, CliError::Plan { .. }));
    }
}
