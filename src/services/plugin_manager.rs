//! PluginManager (spec §4.7) — topologically orders plugin manifests by
//! `depends_on` and drives each plugin's registration function against the
//! `HookBus` and `DispatcherRegistry`.
//!
//! A "plugin" here is not a dynamically loaded module (spec §4.7's
//! clarifying paragraph): it is a compiled `HookHandler`/`StepDispatcher`/
//! `ChatDispatcher` builder keyed by `manifest.name`, so two plugins
//! exposing the same short name cannot collide in the registry maps.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use crate::domain::ports::hook::{HookBus, HookHandler, HookPoint};

#[derive(Debug, Clone)]
pub struct PluginManifest {
    pub name: String,
    pub version: String,
    pub depends_on: Vec<String>,
}

impl PluginManifest {
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self { name: name.into(), version: version.into(), depends_on: Vec::new() }
    }

    #[must_use]
    pub fn depends_on(mut self, names: &[&str]) -> Self {
        self.depends_on = names.iter().map(|s| s.to_string()).collect();
        self
    }
}

/// A registered plugin: its manifest plus the hook handlers it contributes,
/// keyed by the hook point they run at.
pub struct LoadedPlugin {
    pub manifest: PluginManifest,
    pub hooks: Vec<(HookPoint, Arc<dyn HookHandler>)>,
}

impl LoadedPlugin {
    #[must_use]
    pub fn new(manifest: PluginManifest) -> Self {
        Self { manifest, hooks: Vec::new() }
    }

    #[must_use]
    pub fn with_hook(mut self, point: HookPoint, handler: Arc<dyn HookHandler>) -> Self {
        self.hooks.push((point, handler));
        self
    }
}

/// Discovers (in this crate: is handed) a set of plugins, orders them by
/// `depends_on`, and registers each one's hooks onto a `HookBus`.
pub struct PluginManager {
    plugins: Vec<LoadedPlugin>,
}

impl PluginManager {
    #[must_use]
    pub fn new(plugins: Vec<LoadedPlugin>) -> Self {
        Self { plugins }
    }

    /// Topologically sorts plugins by `depends_on` (Kahn's algorithm).
    /// Plugins whose dependencies are never satisfied are dropped with a
    /// warning rather than failing the whole load (spec §4.7).
    #[must_use]
    pub fn topological_order(&self) -> Vec<&LoadedPlugin> {
        let by_name: HashMap<&str, &LoadedPlugin> =
            self.plugins.iter().map(|p| (p.manifest.name.as_str(), p)).collect();

        let mut in_degree: HashMap<&str, usize> = HashMap::new();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

        for plugin in &self.plugins {
            in_degree.entry(plugin.manifest.name.as_str()).or_insert(0);
            for dep in &plugin.manifest.depends_on {
                if !by_name.contains_key(dep.as_str()) {
                    tracing::warn!(plugin = %plugin.manifest.name, missing = %dep, "plugin dependency unsatisfied, skipping plugin");
                    continue;
                }
                *in_degree.entry(plugin.manifest.name.as_str()).or_insert(0) += 1;
                dependents.entry(dep.as_str()).or_default().push(plugin.manifest.name.as_str());
            }
        }

        let unsatisfied: HashSet<&str> = self
            .plugins
            .iter()
            .filter(|p| p.manifest.depends_on.iter().any(|d| !by_name.contains_key(d.as_str())))
            .map(|p| p.manifest.name.as_str())
            .collect();

        let mut queue: VecDeque<&str> = in_degree
            .iter()
            .filter(|(name, degree)| **degree == 0 && !unsatisfied.contains(*name))
            .map(|(name, _)| *name)
            .collect();

        let mut ordered = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();

        while let Some(name) = queue.pop_front() {
            if !visited.insert(name) {
                continue;
            }
            if let Some(plugin) = by_name.get(name) {
                ordered.push(*plugin);
            }
            if let Some(next) = dependents.get(name) {
                for &dependent in next {
                    if unsatisfied.contains(dependent) {
                        continue;
                    }
                    let degree = in_degree.entry(dependent).or_insert(0);
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 {
                        queue.push_back(dependent);
                    }
                }
            }
        }

        ordered
    }

    /// Registers every plugin's hooks onto `bus` in topological order.
    pub fn register_all(&self, bus: &mut dyn HookBus) {
        for plugin in self.topological_order() {
            for (point, handler) in &plugin.hooks {
                bus.register(*point, handler.clone());
            }
            tracing::info!(plugin = %plugin.manifest.name, version = %plugin.manifest.version, "plugin registered");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_dependents_after_dependencies() {
        let base = LoadedPlugin::new(PluginManifest::new("base", "1.0"));
        let extra = LoadedPlugin::new(PluginManifest::new("extra", "1.0").depends_on(&["base"]));
        let manager = PluginManager::new(vec![extra, base]);

        let order: Vec<&str> = manager.topological_order().iter().map(|p| p.manifest.name.as_str()).collect();
        assert_eq!(order, vec!["base", "extra"]);
    }

    #[test]
    fn unsatisfied_dependency_is_skipped() {
        let orphan = LoadedPlugin::new(PluginManifest::new("orphan", "1.0").depends_on(&["missing"]));
        let manager = PluginManager::new(vec![orphan]);
        assert!(manager.topological_order().is_empty());
    }
}
