//! Core resolution algorithm: closure over the requested actions, version,
//! removal and conflict checks, cycle detection, and stable ordering.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, trace};

use crate::config::ResolverOptions;
use crate::error::ResolveError;
use crate::graph::{ActionGraph, Walk};
use crate::item::{Action, Dependency, Item, Requirement};
use crate::report::DiagnosticReport;

/// Holds the registered items and computes execution chains from them.
///
/// Resolution never mutates the registered items: the chain holds copies
/// carrying their resolved action.
#[derive(Debug, Default, Clone)]
pub struct Resolver {
    items: Vec<Item>,
    index: HashMap<String, usize>,
    options: ResolverOptions,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ResolverOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Register an item. Names must be unique.
    pub fn add_item(&mut self, item: Item) -> Result<(), ResolveError> {
        if self.index.contains_key(item.name()) {
            return Err(ResolveError::DuplicateItem {
                item: item.name().to_string(),
            });
        }
        self.index.insert(item.name().to_string(), self.items.len());
        self.items.push(item);
        Ok(())
    }

    pub fn item(&self, name: &str) -> Option<&Item> {
        self.position(name).map(|idx| &self.items[idx])
    }

    /// Mutable access, e.g. to change a requested action before retrying.
    pub fn item_mut(&mut self, name: &str) -> Option<&mut Item> {
        self.position(name).map(|idx| &mut self.items[idx])
    }

    /// Registered items, in registration order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Compute the ordered chain of items to act upon.
    ///
    /// Removals come first, dependents before their dependencies; then
    /// installs and upgrades, dependencies before their dependents. Items
    /// left with [`Action::None`] are not part of the chain.
    ///
    /// With `only_new_items`, only components that are not installed yet are
    /// planned: requested upgrades are ignored and those items stay at their
    /// installed version. This is what a configuration step for freshly
    /// enabled modules asks for; a full installer run passes `false`.
    ///
    /// Fails on the first inconsistency found.
    pub fn dependencies_chain_for_installation(
        &self,
        only_new_items: bool,
    ) -> Result<Vec<Item>, ResolveError> {
        let mut session = Session::new(self, only_new_items);
        let graph = session.run(&mut Reporter::FailFast)?;
        Ok(session.chain(&graph))
    }

    /// Run every check without stopping at the first failure.
    pub fn diagnose(&self, only_new_items: bool) -> DiagnosticReport {
        let mut session = Session::new(self, only_new_items);
        let mut reporter = Reporter::Collect(DiagnosticReport::new());
        let outcome = session.run(&mut reporter);
        let mut report = reporter.into_report();
        if let Err(err) = outcome {
            report.add(err);
        }
        report
    }
}

/// Decides whether a failed check aborts the pass.
enum Reporter {
    FailFast,
    Collect(DiagnosticReport),
}

impl Reporter {
    fn report(&mut self, err: ResolveError) -> Result<(), ResolveError> {
        match self {
            Reporter::FailFast => Err(err),
            Reporter::Collect(report) => {
                report.add(err);
                Ok(())
            }
        }
    }

    fn is_fail_fast(&self) -> bool {
        matches!(self, Reporter::FailFast)
    }

    fn into_report(self) -> DiagnosticReport {
        match self {
            Reporter::FailFast => DiagnosticReport::new(),
            Reporter::Collect(report) => report,
        }
    }
}

/// Working state of one resolution pass.
#[derive(Clone)]
struct Session<'r> {
    resolver: &'r Resolver,
    actions: Vec<Action>,
    expanded: Vec<bool>,
    /// Concrete dependency targets of expanded items, choices already picked.
    edges: Vec<Vec<usize>>,
}

impl<'r> Session<'r> {
    fn new(resolver: &'r Resolver, only_new_items: bool) -> Self {
        let reinstall = resolver.options.reinstall_installed;
        let actions = resolver
            .items
            .iter()
            .map(|item| {
                let installed = item.is_installed();
                let current = item.installed_version() == item.component_version();
                match item.action() {
                    Action::Install | Action::Upgrade if !installed => Action::Install,
                    Action::Remove if !installed => Action::None,
                    Action::Install if current && reinstall => Action::Install,
                    Action::Install | Action::Upgrade if current || only_new_items => Action::None,
                    Action::Install | Action::Upgrade => Action::Upgrade,
                    action => action,
                }
            })
            .collect();

        let n = resolver.items.len();
        Self {
            resolver,
            actions,
            expanded: vec![false; n],
            edges: vec![Vec::new(); n],
        }
    }

    fn run(&mut self, reporter: &mut Reporter) -> Result<ActionGraph, ResolveError> {
        let _span = tracing::debug_span!("resolve", items = self.actions.len()).entered();

        debug!("expanding requested actions");
        self.expand_requested(reporter)?;

        let graph = self.build_graph();

        debug!("checking removals");
        self.check_removals(&graph, reporter)?;

        debug!("checking installed dependents");
        self.check_untouched_dependents(reporter)?;

        debug!("checking conflicts");
        self.check_conflicts(reporter)?;

        debug!("checking cycles");
        self.check_cycles(&graph, reporter)?;

        Ok(graph)
    }

    fn name(&self, idx: usize) -> String {
        self.resolver.items[idx].name().to_string()
    }

    fn is_present(&self, idx: usize) -> bool {
        self.actions[idx].leaves_present(self.resolver.items[idx].is_installed())
    }

    fn escalate(&mut self, idx: usize, to: Action) {
        debug_assert!(
            self.actions[idx].can_escalate_to(to),
            "illegal escalation of `{}` from {} to {}",
            self.resolver.items[idx].name(),
            self.actions[idx],
            to
        );
        debug!(
            item = self.resolver.items[idx].name(),
            from = %self.actions[idx],
            to = %to,
            "escalating action"
        );
        self.actions[idx] = to;
    }

    /// Closure from every item requested for install or upgrade.
    fn expand_requested(&mut self, reporter: &mut Reporter) -> Result<(), ResolveError> {
        for idx in 0..self.actions.len() {
            if !self.actions[idx].is_install_or_upgrade() {
                continue;
            }
            if reporter.is_fail_fast() {
                self.expand(idx)?;
                continue;
            }
            // A failed root must not leave half-applied escalations behind.
            let mut scratch = self.clone();
            match scratch.expand(idx) {
                Ok(()) => *self = scratch,
                Err(err) => reporter.report(err)?,
            }
        }
        Ok(())
    }

    fn expand(&mut self, idx: usize) -> Result<(), ResolveError> {
        if self.expanded[idx] {
            return Ok(());
        }
        self.expanded[idx] = true;

        let resolver = self.resolver;
        let item = &resolver.items[idx];
        if item.component_version().is_none() {
            return Err(ResolveError::DependencyCannotBeInstalled {
                item: item.name().to_string(),
                dependencies: vec![item.name().to_string()],
            });
        }

        let missing: Vec<String> = item
            .dependencies()
            .iter()
            .filter_map(|dep| match dep {
                Dependency::Direct(req) if resolver.position(&req.name).is_none() => {
                    Some(req.name.clone())
                }
                _ => None,
            })
            .collect();
        if !missing.is_empty() {
            return Err(ResolveError::DependencyMissingItem {
                item: item.name().to_string(),
                missing,
            });
        }

        for dep in item.dependencies() {
            match dep {
                Dependency::Direct(req) => {
                    if let Some(target) = resolver.position(&req.name) {
                        self.require(idx, target, req)?;
                    }
                }
                Dependency::Choice { name, alternatives } => {
                    self.resolve_choice(idx, name, alternatives)?;
                }
            }
        }
        Ok(())
    }

    /// Make `target` available at a version in `req` for item `idx`.
    fn require(&mut self, idx: usize, target: usize, req: &Requirement) -> Result<(), ResolveError> {
        let resolver = self.resolver;
        let item = &resolver.items[idx];
        let dep = &resolver.items[target];
        trace!(item = item.name(), dependency = dep.name(), range = %req.range, "checking dependency");

        self.edges[idx].push(target);

        match self.actions[target] {
            Action::Remove => {
                return Err(ResolveError::ItemToInstallShouldBeRemoved {
                    item: item.name().to_string(),
                    removed: dep.name().to_string(),
                });
            }
            Action::None if !dep.is_installed() => {
                if dep.component_version().is_none() {
                    return Err(ResolveError::DependencyCannotBeInstalled {
                        item: item.name().to_string(),
                        dependencies: vec![dep.name().to_string()],
                    });
                }
                self.escalate(target, Action::Install);
            }
            _ => {}
        }

        let found = dep.effective_version(self.actions[target]);
        if !req.range.matches(found) {
            return Err(ResolveError::BadItemVersion {
                item: item.name().to_string(),
                dependency: dep.name().to_string(),
                required: req.range.to_string(),
                found: found.map(ToString::to_string),
            });
        }

        if self.actions[target].is_install_or_upgrade() {
            self.expand(target)?;
        }
        Ok(())
    }

    /// Version check of `target` against `req`, without walking its own
    /// dependencies.
    fn could_satisfy(&self, target: usize, req: &Requirement) -> bool {
        let dep = &self.resolver.items[target];
        let action = match self.actions[target] {
            Action::Remove => return false,
            Action::None if !dep.is_installed() => Action::Install,
            action => action,
        };
        if action.is_install_or_upgrade() && dep.component_version().is_none() {
            return false;
        }
        req.range.matches(dep.effective_version(action))
    }

    /// Satisfy a choice dependency of `idx` with one of its alternatives.
    fn resolve_choice(
        &mut self,
        idx: usize,
        choice: &str,
        alternatives: &'r [Requirement],
    ) -> Result<(), ResolveError> {
        let resolver = self.resolver;
        let item = &resolver.items[idx];

        let registered: Vec<(usize, &'r Requirement)> = alternatives
            .iter()
            .filter_map(|req| resolver.position(&req.name).map(|t| (t, req)))
            .collect();

        match registered.as_slice() {
            [] => {
                return Err(ResolveError::ChoiceMissingItem {
                    item: item.name().to_string(),
                    choice: choice.to_string(),
                    alternatives: alternatives.iter().map(|r| r.name.clone()).collect(),
                });
            }
            // A single candidate behaves like a direct dependency.
            [(target, req)] => return self.require(idx, *target, req),
            _ => {}
        }

        if resolver.options.prefer_installed_choice {
            let present = registered
                .iter()
                .copied()
                .find(|(t, req)| self.is_present(*t) && self.could_satisfy(*t, req));
            if let Some((target, req)) = present {
                debug!(item = item.name(), choice, selected = %self.name(target), "choice satisfied by present item");
                return self.require(idx, target, req);
            }
        }

        let candidates: Vec<(usize, &'r Requirement)> = registered
            .iter()
            .copied()
            .filter(|(t, req)| self.could_satisfy(*t, req))
            .collect();

        // Dry run each candidate's closure; the first success is kept so the
        // pick is never walked twice.
        let mut viable = Vec::new();
        let mut adopted = None;
        let mut tried = 0;
        for &(target, req) in &candidates {
            tried += 1;
            let mut scratch = self.clone();
            if scratch.require(idx, target, req).is_err() {
                continue;
            }
            viable.push(target);
            if viable.len() > 1 {
                break;
            }
            adopted = Some(scratch);
        }

        match (viable.as_slice(), adopted) {
            ([target], Some(scratch)) => {
                debug!(item = item.name(), choice, selected = %self.name(*target), "choice resolved");
                *self = scratch;
                Ok(())
            }
            ([], _) => Err(ResolveError::DependencyCannotBeInstalled {
                item: item.name().to_string(),
                dependencies: registered.iter().map(|(t, _)| self.name(*t)).collect(),
            }),
            _ => Err(ResolveError::ChoiceAmbiguous {
                item: item.name().to_string(),
                choice: choice.to_string(),
                // Candidates left untried already passed the version check.
                candidates: viable
                    .iter()
                    .copied()
                    .chain(candidates[tried..].iter().map(|(t, _)| *t))
                    .map(|t| self.name(t))
                    .collect(),
            }),
        }
    }

    /// Edges of every item: expanded items use their resolved targets, the
    /// others their declarations as they stand.
    fn build_graph(&self) -> ActionGraph {
        let mut graph = ActionGraph::new(self.actions.len());
        for idx in 0..self.actions.len() {
            let targets = if self.expanded[idx] {
                self.edges[idx].clone()
            } else {
                self.declared_targets(idx)
            };
            for target in targets {
                graph.add_edge(idx, target);
            }
        }
        graph
    }

    fn declared_targets(&self, idx: usize) -> Vec<usize> {
        let resolver = self.resolver;
        resolver.items[idx]
            .dependencies()
            .iter()
            .filter_map(|dep| match dep {
                Dependency::Direct(req) => resolver.position(&req.name),
                Dependency::Choice { alternatives, .. } => {
                    let registered: Vec<usize> = alternatives
                        .iter()
                        .filter_map(|req| resolver.position(&req.name))
                        .collect();
                    // Satisfied by a survivor if any, else tied to a removed one.
                    registered
                        .iter()
                        .copied()
                        .find(|&t| self.is_present(t))
                        .or_else(|| {
                            registered
                                .iter()
                                .copied()
                                .find(|&t| self.actions[t] == Action::Remove)
                        })
                }
            })
            .collect()
    }

    /// Every dependent of a removed item must go too, or the removal fails.
    fn check_removals(
        &mut self,
        graph: &ActionGraph,
        reporter: &mut Reporter,
    ) -> Result<(), ResolveError> {
        let mut queue: VecDeque<usize> = (0..self.actions.len())
            .filter(|&idx| self.actions[idx] == Action::Remove)
            .collect();

        while let Some(removed) = queue.pop_front() {
            for dependent in graph.dependents_of(removed) {
                match self.actions[dependent] {
                    Action::Remove => {}
                    Action::Install | Action::Upgrade => {
                        reporter.report(ResolveError::ItemToInstallShouldBeRemoved {
                            item: self.name(dependent),
                            removed: self.name(removed),
                        })?;
                    }
                    Action::None if self.resolver.items[dependent].is_installed() => {
                        if self.resolver.options.cascade_removals {
                            self.escalate(dependent, Action::Remove);
                            queue.push_back(dependent);
                        } else {
                            reporter.report(ResolveError::RemovedItemIsNeeded {
                                item: self.name(dependent),
                                removed: self.name(removed),
                            })?;
                        }
                    }
                    Action::None => {}
                }
            }
        }
        Ok(())
    }

    /// Installed items left alone must still accept the versions their
    /// dependencies end up at.
    fn check_untouched_dependents(&self, reporter: &mut Reporter) -> Result<(), ResolveError> {
        let resolver = self.resolver;
        for idx in 0..self.actions.len() {
            let item = &resolver.items[idx];
            if self.actions[idx] != Action::None || !item.is_installed() {
                continue;
            }
            for dep in item.dependencies() {
                let targets: Vec<(usize, &Requirement)> = match dep {
                    Dependency::Direct(req) => resolver
                        .position(&req.name)
                        .map(|t| (t, req))
                        .into_iter()
                        .collect(),
                    Dependency::Choice { alternatives, .. } => alternatives
                        .iter()
                        .filter_map(|req| resolver.position(&req.name).map(|t| (t, req)))
                        .filter(|(t, _)| self.is_present(*t))
                        .collect(),
                };
                let satisfied = targets.iter().any(|(t, req)| {
                    req.range
                        .matches(resolver.items[*t].effective_version(self.actions[*t]))
                });
                if satisfied {
                    continue;
                }
                // Breakage that predates this plan is not ours to report.
                let Some(&(target, req)) = targets
                    .iter()
                    .find(|(t, _)| self.actions[*t].is_install_or_upgrade())
                else {
                    continue;
                };
                let found = resolver.items[target].effective_version(self.actions[target]);
                reporter.report(ResolveError::BadItemVersion {
                    item: item.name().to_string(),
                    dependency: self.name(target),
                    required: req.range.to_string(),
                    found: found.map(ToString::to_string),
                })?;
            }
        }
        Ok(())
    }

    /// Declared conflicts between present items, where at least one side changes.
    fn check_conflicts(&self, reporter: &mut Reporter) -> Result<(), ResolveError> {
        let resolver = self.resolver;
        for idx in 0..self.actions.len() {
            if !self.is_present(idx) {
                continue;
            }
            let item = &resolver.items[idx];
            let mut installed = Vec::new();
            let mut scheduled = Vec::new();

            for conflict in item.conflicts() {
                let Some(other) = resolver.position(&conflict.name) else {
                    continue;
                };
                if other == idx || !self.is_present(other) {
                    continue;
                }
                let other_changes = self.actions[other].is_install_or_upgrade();
                if !self.actions[idx].is_install_or_upgrade() && !other_changes {
                    continue;
                }
                let version = resolver.items[other].effective_version(self.actions[other]);
                if !conflict.range.matches(version) {
                    continue;
                }
                trace!(item = item.name(), conflicting = %self.name(other), "conflict");
                if other_changes {
                    scheduled.push(self.name(other));
                } else {
                    installed.push(self.name(other));
                }
            }

            if !installed.is_empty() {
                reporter.report(ResolveError::InstalledItemInConflict {
                    item: item.name().to_string(),
                    conflicting: installed,
                })?;
            }
            if !scheduled.is_empty() {
                reporter.report(ResolveError::ItemToInstallInConflict {
                    item: item.name().to_string(),
                    conflicting: scheduled,
                })?;
            }
        }
        Ok(())
    }

    fn check_cycles(&self, graph: &ActionGraph, reporter: &mut Reporter) -> Result<(), ResolveError> {
        let installing: Vec<bool> = self
            .actions
            .iter()
            .map(|a| a.is_install_or_upgrade())
            .collect();
        if let Some((item, via)) = graph.find_cycle(&installing, Walk::Forward) {
            reporter.report(ResolveError::CircularDependency {
                item: self.name(item),
                via: self.name(via),
            })?;
        }

        let removing: Vec<bool> = self.actions.iter().map(|a| *a == Action::Remove).collect();
        if let Some((item, via)) = graph.find_cycle(&removing, Walk::Reverse) {
            reporter.report(ResolveError::ReverseCircularDependency {
                item: self.name(item),
                via: self.name(via),
            })?;
        }
        Ok(())
    }

    fn chain(&self, graph: &ActionGraph) -> Vec<Item> {
        let removing: Vec<bool> = self.actions.iter().map(|a| *a == Action::Remove).collect();
        let installing: Vec<bool> = self
            .actions
            .iter()
            .map(|a| a.is_install_or_upgrade())
            .collect();

        let chain: Vec<Item> = graph
            .removal_order(&removing)
            .into_iter()
            .chain(graph.install_order(&installing))
            .map(|idx| {
                let mut item = self.resolver.items[idx].clone();
                item.set_action(self.actions[idx]);
                item
            })
            .collect();

        debug!(
            chain = ?chain.iter().map(|i| format!("{}:{}", i.action(), i.name())).collect::<Vec<_>>(),
            "dependency chain computed"
        );
        chain
    }
}
