//! The mutable store of resolved targets for one invocation.

use std::collections::HashMap;
use std::sync::Arc;

use petgraph::graph::{DiGraph, NodeIndex};

use crate::address::Address;
use crate::error::ResolveError;
use crate::target::{Dependency, Target};

/// The external BUILD-file evaluator: produces the target registered at an
/// address, once per distinct definition.
pub trait BuildDefinitions: Send + Sync {
    fn lookup(&self, address: &Address) -> Result<Arc<Target>, ResolveError>;
}

/// In-memory store of resolved targets and their dependency edges.
///
/// Nodes are keyed and deduplicated by [`Address`]; the graph only grows
/// within an invocation and is discarded at process exit. Edges are kept in
/// a petgraph directed graph so downstream consumers can run graph
/// algorithms over the address space without re-deriving edges from
/// configurations.
pub struct BuildGraph {
    definitions: Arc<dyn BuildDefinitions>,
    targets: HashMap<Address, Arc<Target>>,
    indices: HashMap<Address, NodeIndex>,
    edges: DiGraph<Address, ()>,
}

impl BuildGraph {
    pub fn new(definitions: Arc<dyn BuildDefinitions>) -> Self {
        Self {
            definitions,
            targets: HashMap::new(),
            indices: HashMap::new(),
            edges: DiGraph::new(),
        }
    }

    /// Injects the target at `address` and its full transitive dependency
    /// closure. Re-injecting an already-present address is a no-op, and the
    /// membership check makes the walk safe on cyclic definitions.
    pub fn inject_address_closure(&mut self, address: &Address) -> Result<(), ResolveError> {
        let mut pending = vec![address.clone()];

        while let Some(address) = pending.pop() {
            if self.targets.contains_key(&address) {
                continue;
            }
            let target = self.definitions.lookup(&address)?;
            let node = self.node(&address);
            self.targets.insert(address, target.clone());

            for configuration in target.configurations() {
                for dependency in configuration.dependencies() {
                    let dep_address = match dependency {
                        Dependency::Address(address) => Some(address),
                        // Embedded targets participate in the address space
                        // only when the evaluator bound them.
                        Dependency::Target(target) => target.address().cloned(),
                    };
                    if let Some(dep_address) = dep_address {
                        let dep_node = self.node(&dep_address);
                        self.edges.update_edge(node, dep_node, ());
                        pending.push(dep_address);
                    }
                }
            }
        }

        Ok(())
    }

    fn node(&mut self, address: &Address) -> NodeIndex {
        if let Some(&node) = self.indices.get(address) {
            return node;
        }
        let node = self.edges.add_node(address.clone());
        self.indices.insert(address.clone(), node);
        node
    }

    pub fn get_target(&self, address: &Address) -> Option<&Arc<Target>> {
        self.targets.get(address)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.targets.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Explicitly resolves a dependency edge against the node store. Field
    /// access never resolves addresses behind the caller's back; this lookup
    /// is the only way to follow an address edge.
    pub fn resolve_dependency(&self, dependency: &Dependency) -> Option<Arc<Target>> {
        match dependency {
            Dependency::Target(target) => Some(target.clone()),
            Dependency::Address(address) => self.targets.get(address).cloned(),
        }
    }

    /// The addresses directly depended on by `address`.
    pub fn dependencies_of(&self, address: &Address) -> Vec<Address> {
        match self.indices.get(address) {
            Some(&node) => self
                .edges
                .neighbors(node)
                .map(|dep| self.edges[dep].clone())
                .collect(),
            None => Vec::new(),
        }
    }
}

impl std::fmt::Debug for BuildGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildGraph")
            .field("targets", &self.targets.len())
            .field("edges", &self.edges.edge_count())
            .finish()
    }
}
