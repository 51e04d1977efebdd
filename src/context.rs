use std::sync::Arc;

use camino::Utf8PathBuf;

use crate::graph::BuildGraph;
use crate::resolve::AddressMapper;
use crate::target::Target;

/// The immutable per-run snapshot handed to the task engine.
///
/// Assembled once, after graph population and tag filtering; the build graph
/// is frozen for the duration of engine execution. The root target list may
/// contain a target more than once when independent specs reached it; only
/// the graph's node store deduplicates, by address.
pub struct Context {
    pub target_roots: Vec<Arc<Target>>,
    pub requested_goals: Vec<String>,
    pub build_graph: BuildGraph,
    pub address_mapper: Arc<dyn AddressMapper>,
    pub workdir: Utf8PathBuf,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("target_roots", &self.target_roots.len())
            .field("requested_goals", &self.requested_goals)
            .field("build_graph", &self.build_graph)
            .field("workdir", &self.workdir)
            .finish()
    }
}
