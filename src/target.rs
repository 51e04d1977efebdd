//! Build targets and their configuration records.

use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;

use crate::address::Address;
use crate::error::ConfigurationNotFound;
use crate::record::Record;

/// A dependency declared by a configuration.
///
/// Dependencies either embed the target directly (the evaluator hydrated it
/// in place) or refer to it by address. Address edges are never resolved
/// implicitly; resolution is an explicit lookup against the build graph.
#[derive(Clone)]
pub enum Dependency {
    Target(Arc<Target>),
    Address(Address),
}

impl std::fmt::Debug for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dependency::Target(target) => write!(f, "Target({})", target.display_name()),
            Dependency::Address(address) => write!(f, "Address({address})"),
        }
    }
}

/// A configuration record applying to a target in some context.
///
/// Configurations are arbitrary record subtypes; a configuration that
/// participates in graph edges overrides [`dependencies`]
/// (`Configuration::dependencies`), which is otherwise empty.
pub trait Configuration: Any + Send + Sync {
    fn name(&self) -> Option<&str>;

    fn dependencies(&self) -> Vec<Dependency> {
        Vec::new()
    }

    /// Exposes the concrete type for exact-type selection.
    fn as_any(&self) -> &dyn Any;
}

/// The generic record-backed configuration type.
#[derive(Debug, Clone)]
pub struct Config {
    record: Record,
    dependencies: Vec<Dependency>,
}

impl Config {
    pub fn new(record: Record) -> Self {
        Self {
            record,
            dependencies: Vec::new(),
        }
    }

    pub fn with_dependencies(record: Record, dependencies: Vec<Dependency>) -> Self {
        Self {
            record,
            dependencies,
        }
    }

    pub fn record(&self) -> &Record {
        &self.record
    }
}

impl Configuration for Config {
    fn name(&self) -> Option<&str> {
        self.record.name()
    }

    fn dependencies(&self) -> Vec<Dependency> {
        self.dependencies.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A build target: an addressable record owning an ordered sequence of
/// configuration records.
pub struct Target {
    record: Record,
    configurations: Vec<Arc<dyn Configuration>>,
}

impl Target {
    pub fn new(record: Record, configurations: Vec<Arc<dyn Configuration>>) -> Self {
        Self {
            record,
            configurations,
        }
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn name(&self) -> Option<&str> {
        self.record.name()
    }

    pub fn address(&self) -> Option<&Address> {
        self.record.address()
    }

    pub fn bind_address(&mut self, address: Address) {
        self.record.bind_address(address);
    }

    pub fn tags(&self) -> Vec<String> {
        self.record.tags()
    }

    pub fn configurations(&self) -> &[Arc<dyn Configuration>] {
        &self.configurations
    }

    pub(crate) fn display_name(&self) -> String {
        if let Some(address) = self.address() {
            address.to_string()
        } else if let Some(name) = self.name() {
            name.to_string()
        } else {
            "<anonymous>".to_string()
        }
    }

    /// Selects the single configuration with the given name.
    ///
    /// Zero or multiple matches is an error; the message lists every
    /// configuration on the target to aid diagnosis.
    pub fn select_configuration(
        &self,
        name: &str,
    ) -> Result<&Arc<dyn Configuration>, ConfigurationNotFound> {
        let mut matches = self
            .configurations
            .iter()
            .filter(|config| config.name() == Some(name));

        match (matches.next(), matches.next()) {
            (Some(config), None) => Ok(config),
            (first, _) => {
                let matched = if first.is_some() {
                    2 + matches.count()
                } else {
                    0
                };
                let seen = self
                    .configurations
                    .iter()
                    .map(|config| config.name().unwrap_or("<anonymous>").to_string())
                    .collect::<Vec<_>>()
                    .join("\n\t");
                Err(ConfigurationNotFound {
                    target: self.display_name(),
                    name: name.to_string(),
                    matched,
                    seen,
                })
            }
        }
    }

    /// Selects every configuration whose exact runtime type is `T`.
    ///
    /// Subtypes and wrappers of `T` do not match; selection is by exact
    /// runtime type only.
    pub fn select_configuration_type<T: Configuration>(&self) -> Vec<&T> {
        self.configurations
            .iter()
            .filter_map(|config| config.as_any().downcast_ref::<T>())
            .collect()
    }

    /// Depth-first walk over the dependency graph induced by the embedded
    /// target dependencies of each visited target's configurations.
    ///
    /// Every reachable target is yielded exactly once; a visited set keyed
    /// by target identity makes the walk safe on cyclic and diamond-shaped
    /// graphs. With `postorder` children are yielded before their parent.
    /// The order is materialized up front; the returned iterator does not
    /// hold on to the graph.
    pub fn walk_targets(self: &Arc<Self>, postorder: bool) -> impl Iterator<Item = Arc<Target>> {
        fn walk(
            target: &Arc<Target>,
            postorder: bool,
            visited: &mut HashSet<*const Target>,
            order: &mut Vec<Arc<Target>>,
        ) {
            if !visited.insert(Arc::as_ptr(target)) {
                return;
            }
            if !postorder {
                order.push(target.clone());
            }
            for configuration in &target.configurations {
                for dependency in configuration.dependencies() {
                    if let Dependency::Target(dep) = dependency {
                        walk(&dep, postorder, visited, order);
                    }
                }
            }
            if postorder {
                order.push(target.clone());
            }
        }

        let mut visited = HashSet::new();
        let mut order = Vec::new();
        walk(self, postorder, &mut visited, &mut order);
        order.into_iter()
    }
}

impl std::fmt::Debug for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Target")
            .field("address", &self.address())
            .field("name", &self.name())
            .field("configurations", &self.configurations.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn config(name: &str) -> Arc<dyn Configuration> {
        Arc::new(Config::new(Record::named(name)))
    }

    fn target(name: &str, configurations: Vec<Arc<dyn Configuration>>) -> Arc<Target> {
        Arc::new(Target::new(Record::named(name), configurations))
    }

    /// Configuration whose dependencies can be filled in after the owning
    /// targets exist, so tests can tie the graph into cycles.
    struct LateDeps(Mutex<Vec<Dependency>>);

    impl LateDeps {
        fn new() -> Arc<Self> {
            Arc::new(Self(Mutex::new(Vec::new())))
        }

        fn push(&self, target: &Arc<Target>) {
            self.0.lock().unwrap().push(Dependency::Target(target.clone()));
        }
    }

    impl Configuration for LateDeps {
        fn name(&self) -> Option<&str> {
            None
        }

        fn dependencies(&self) -> Vec<Dependency> {
            self.0.lock().unwrap().clone()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_select_configuration_single() {
        let t = target("a", vec![config("default"), config("other")]);
        let selected = t.select_configuration("default").unwrap();
        assert_eq!(selected.name(), Some("default"));
    }

    #[test]
    fn test_select_configuration_duplicate() {
        let t = target("a", vec![config("default"), config("default")]);
        let err = t.select_configuration("default").map(|_| ()).unwrap_err();
        assert_eq!(err.matched, 2);
    }

    #[test]
    fn test_select_configuration_missing() {
        let t = target("a", vec![config("other")]);
        let err = t.select_configuration("default").map(|_| ()).unwrap_err();
        assert_eq!(err.matched, 0);
        assert!(err.to_string().contains("other"));
    }

    #[test]
    fn test_select_configuration_type_is_exact() {
        struct Special(Config);
        impl Configuration for Special {
            fn name(&self) -> Option<&str> {
                self.0.name()
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
        }

        let t = target(
            "a",
            vec![
                config("generic"),
                Arc::new(Special(Config::new(Record::named("special")))),
            ],
        );

        let generics = t.select_configuration_type::<Config>();
        assert_eq!(generics.len(), 1);
        assert_eq!(generics[0].name(), Some("generic"));

        let specials = t.select_configuration_type::<Special>();
        assert_eq!(specials.len(), 1);
        assert_eq!(specials[0].name(), Some("special"));
    }

    #[test]
    fn test_walk_cycle_terminates() {
        let deps_a = LateDeps::new();
        let deps_b = LateDeps::new();
        let deps_c = LateDeps::new();

        let a = target("a", vec![deps_a.clone()]);
        let b = target("b", vec![deps_b.clone()]);
        let c = target("c", vec![deps_c.clone()]);

        deps_a.push(&b);
        deps_b.push(&c);
        deps_c.push(&a);

        let names: Vec<_> = a
            .walk_targets(true)
            .map(|t| t.name().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["c", "b", "a"]);

        let names: Vec<_> = a
            .walk_targets(false)
            .map(|t| t.name().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_walk_diamond_visits_once() {
        let shared = target("d", vec![]);
        let left = target(
            "b",
            vec![Arc::new(Config::with_dependencies(
                Record::named("deps"),
                vec![Dependency::Target(shared.clone())],
            ))],
        );
        let right = target(
            "c",
            vec![Arc::new(Config::with_dependencies(
                Record::named("deps"),
                vec![Dependency::Target(shared.clone())],
            ))],
        );
        let root = target(
            "a",
            vec![Arc::new(Config::with_dependencies(
                Record::named("deps"),
                vec![
                    Dependency::Target(left),
                    Dependency::Target(right),
                ],
            ))],
        );

        let names: Vec<_> = root
            .walk_targets(true)
            .map(|t| t.name().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["d", "b", "c", "a"]);
    }
}
