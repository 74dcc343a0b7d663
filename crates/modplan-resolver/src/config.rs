use serde::{Deserialize, Serialize};

/// Resolver behaviour knobs, read from the `[resolver]` table of a plan file.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolverOptions {
    /// Escalate installed dependents of a removed item to removal instead of
    /// failing with `RemovedItemIsNeeded`.
    #[serde(default)]
    pub cascade_removals: bool,

    /// Keep `install` on an item already installed at its component version.
    /// When false such a request is already satisfied and becomes `none`.
    #[serde(default)]
    pub reinstall_installed: bool,

    /// Let a present alternative win a choice dependency over other
    /// candidates. When false, two viable alternatives are always ambiguous.
    #[serde(default = "default_prefer_installed_choice")]
    pub prefer_installed_choice: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            cascade_removals: false,
            reinstall_installed: false,
            prefer_installed_choice: default_prefer_installed_choice(),
        }
    }
}

fn default_prefer_installed_choice() -> bool {
    true
}
