#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod address;
mod config;
mod context;
mod error;
mod filter;
mod goal;
mod graph;
mod record;
mod resolve;
mod runner;
mod sources;
mod target;
mod tracker;
mod variants;

pub use crate::address::{Address, TargetSpec};
pub use crate::config::{RunnerConfig, check_version};
pub use crate::context::Context;
pub use crate::error::{
    ConfigurationNotFound, EngineError, ResolveError, RunError, ShapeError, SourcesError,
};
pub use crate::filter::TagFilter;
pub use crate::goal::{Goal, GoalRegistry, GoalTask};
pub use crate::graph::{BuildDefinitions, BuildGraph};
pub use crate::record::{Record, Shape, ValueKind};
pub use crate::resolve::{AddressMapper, SpecParser, SpecResolution};
pub use crate::runner::{
    DaemonLauncher, GoalRunner, GoalRunnerFactory, HelpPrinter, NullWorkerPool, Setup, TaskEngine,
    WORKDIR_SUFFIX, WorkerPool,
};
pub use crate::sources::{Sources, SourcesBuilder};
pub use crate::target::{Config, Configuration, Dependency, Target};
pub use crate::tracker::{
    InvalidationReport, LogTracker, NullReporting, Outcome, Reporting, RunTracker, WorkUnit,
    workunit,
};
pub use crate::variants::{Variant, Variants, merge};

/// Initialize a development tracing subscriber.
///
/// Reads `RUST_LOG` and defaults to `warn` when unset; output goes to stderr
/// in compact format. Embedders that install their own subscriber should
/// skip this.
#[cfg(feature = "logging")]
pub fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
