//! Run orchestration: composes spec resolution, build-graph injection and
//! goal expansion into an execution [`Context`], then drives the task engine
//! with guaranteed worker cleanup.

use std::sync::Arc;

use console::style;

use crate::config::{RunnerConfig, check_version};
use crate::context::Context;
use crate::error::{EngineError, ResolveError, RunError};
use crate::filter::TagFilter;
use crate::goal::{Goal, GoalRegistry};
use crate::graph::{BuildDefinitions, BuildGraph};
use crate::resolve::{AddressMapper, SpecParser, SpecResolution};
use crate::target::Target;
use crate::tracker::{InvalidationReport, LogTracker, NullReporting, Outcome, Reporting, RunTracker, workunit};

/// The fixed suffix the working directory must end with before the engine
/// is allowed to run.
pub const WORKDIR_SUFFIX: &str = ".drover.d";

/// The external task engine.
///
/// Responsible for ordering the goals' tasks into phases and executing them
/// against the context; opaque and synchronous from the orchestrator's point
/// of view. Returns the run's result code (0 = success) or surfaces an
/// interruption/failure as an error.
pub trait TaskEngine: Send + Sync {
    fn execute(&self, context: &Context, goals: &[Goal]) -> Result<i32, EngineError>;
}

/// Launches the optional long-lived background daemon. The call may block
/// waiting for readiness; its failure never aborts the run.
pub trait DaemonLauncher: Send + Sync {
    fn maybe_launch(&self) -> anyhow::Result<()>;
}

/// The process-wide pool of persistent worker subprocesses used by tasks.
/// Only the orchestrator's cleanup step may terminate it.
pub trait WorkerPool: Send + Sync {
    fn terminate_all(&self);
}

/// Worker pool for embedders whose tasks spawn no persistent workers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullWorkerPool;

impl WorkerPool for NullWorkerPool {
    fn terminate_all(&self) {}
}

/// Prints help output and returns the process exit code to use.
pub trait HelpPrinter: Send + Sync {
    fn print_help(&self) -> i32;
}

/// Default help output: lists the registered goals.
struct RegistryHelp {
    goals: Vec<String>,
}

impl HelpPrinter for RegistryHelp {
    fn print_help(&self) -> i32 {
        eprintln!("{}", style("Installed goals:").bold());
        for goal in &self.goals {
            eprintln!("  {goal}");
        }
        0
    }
}

/// The outcome of factory setup: either help output short-circuited the
/// invocation, or a fully configured runner is ready to execute.
pub enum Setup {
    /// Help was requested; the value is the help printer's exit code.
    Help(i32),
    Runner(GoalRunner),
}

/// Builds a [`GoalRunner`] for one invocation: launches the daemon if
/// enabled, expands goals and target specs, populates the build graph and
/// assembles the execution context.
pub struct GoalRunnerFactory {
    config: RunnerConfig,
    mapper: Arc<dyn AddressMapper>,
    definitions: Arc<dyn BuildDefinitions>,
    registry: GoalRegistry,
    engine: Arc<dyn TaskEngine>,
    tracker: Arc<dyn RunTracker>,
    reporting: Arc<dyn Reporting>,
    daemon: Option<Arc<dyn DaemonLauncher>>,
    workers: Arc<dyn WorkerPool>,
    help: Box<dyn HelpPrinter>,
}

impl GoalRunnerFactory {
    pub fn new(
        config: RunnerConfig,
        mapper: Arc<dyn AddressMapper>,
        definitions: Arc<dyn BuildDefinitions>,
        registry: GoalRegistry,
        engine: Arc<dyn TaskEngine>,
    ) -> Self {
        let help = Box::new(RegistryHelp {
            goals: registry.all().map(|goal| goal.name().to_string()).collect(),
        });
        Self {
            config,
            mapper,
            definitions,
            registry,
            engine,
            tracker: Arc::new(LogTracker),
            reporting: Arc::new(NullReporting),
            daemon: None,
            workers: Arc::new(NullWorkerPool),
            help,
        }
    }

    pub fn with_tracker(mut self, tracker: Arc<dyn RunTracker>) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn with_reporting(mut self, reporting: Arc<dyn Reporting>) -> Self {
        self.reporting = reporting;
        self
    }

    pub fn with_daemon(mut self, daemon: Arc<dyn DaemonLauncher>) -> Self {
        self.daemon = Some(daemon);
        self
    }

    pub fn with_workers(mut self, workers: Arc<dyn WorkerPool>) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_help(mut self, help: Box<dyn HelpPrinter>) -> Self {
        self.help = help;
        self
    }

    /// Runs the setup pipeline and hands back either the runner or the help
    /// printer's exit code.
    pub fn setup(self) -> Result<Setup, RunError> {
        check_version(self.config.requested_version.as_deref())?;

        self.maybe_launch_daemon();

        let mut graph = BuildGraph::new(self.definitions.clone());
        let goals;
        let target_roots;
        let invalidation;
        {
            let _setup = workunit(self.tracker.as_ref(), "setup");

            // Tokens in goal position that also resolve as specs are kept as
            // goals; the lookup failure is the expected path here.
            for goal in &self.config.goals {
                if let SpecResolution::Resolved(_) = self.mapper.resolve_spec(goal) {
                    tracing::warn!(
                        "Command-line argument '{goal}' is ambiguous and was assumed to be \
                         a goal. If this is incorrect, disambiguate it with ./{goal}."
                    );
                }
            }

            if self.config.help {
                return Ok(Setup::Help(self.help.print_help()));
            }

            goals = self
                .config
                .goals
                .iter()
                .map(|goal| self.registry.by_name(goal))
                .collect::<Vec<_>>();

            target_roots = self.expand_specs(&mut graph)?;

            let quiet = goals.iter().any(Goal::has_quiet_task) || self.config.explain;
            invalidation = self.reporting.update_reporting(quiet);
        }

        let context = Context {
            target_roots,
            requested_goals: self.config.goals.clone(),
            build_graph: graph,
            address_mapper: self.mapper.clone(),
            workdir: self.config.workdir.clone(),
        };

        Ok(Setup::Runner(GoalRunner {
            context,
            goals,
            engine: self.engine,
            tracker: self.tracker,
            workers: self.workers,
            invalidation,
            cleanup_workers: self.config.cleanup_workers,
        }))
    }

    fn maybe_launch_daemon(&self) {
        if !self.config.enable_daemon {
            return;
        }
        let Some(daemon) = &self.daemon else {
            return;
        };
        let _daemon = workunit(self.tracker.as_ref(), "daemon");
        if let Err(err) = daemon.maybe_launch() {
            tracing::warn!("Failed to launch the daemon: {err}");
        }
    }

    /// Populates the build graph and root-target list from the configured
    /// target specs.
    fn expand_specs(&self, graph: &mut BuildGraph) -> Result<Vec<Arc<Target>>, RunError> {
        let _parse = workunit(self.tracker.as_ref(), "parse");

        let filter = TagFilter::parse(&self.config.tag);
        let parser = SpecParser::new(self.mapper.clone(), &self.config.spec_excludes)
            .map_err(RunError::Resolve)?;

        let mut roots = Vec::new();
        for spec in &self.config.target_specs {
            for address in parser.parse_addresses(spec, self.config.fail_fast)? {
                graph.inject_address_closure(&address)?;
                let target = graph
                    .get_target(&address)
                    .cloned()
                    .ok_or_else(|| ResolveError::NotFound(address.to_string()))?;
                // Targets reached via independent specs are kept once per
                // spec; only the graph's node store deduplicates.
                if filter.accepts(&target) {
                    roots.push(target);
                }
            }
        }
        Ok(roots)
    }
}

/// Executes the requested goals over the assembled context.
pub struct GoalRunner {
    context: Context,
    goals: Vec<Goal>,
    engine: Arc<dyn TaskEngine>,
    tracker: Arc<dyn RunTracker>,
    workers: Arc<dyn WorkerPool>,
    invalidation: Option<Arc<dyn InvalidationReport>>,
    cleanup_workers: bool,
}

/// Terminates the worker pool when dropped, if armed. Dropped strictly after
/// the run outcome is recorded, because pending background reporting may
/// still be using the workers.
struct CleanupGuard {
    workers: Arc<dyn WorkerPool>,
    armed: bool,
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if self.armed {
            self.workers.terminate_all();
        }
    }
}

impl GoalRunner {
    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    fn execute_engine(&self) -> Result<i32, EngineError> {
        let workdir = &self.context.workdir;
        if !workdir.as_str().ends_with(WORKDIR_SUFFIX) {
            eprintln!(
                "{} Working directory should end with '{WORKDIR_SUFFIX}', currently it is {workdir}",
                style("error:").red().bold(),
            );
            return Ok(1);
        }

        let unknown = self
            .goals
            .iter()
            .filter(|goal| goal.is_unknown())
            .map(Goal::name)
            .collect::<Vec<_>>();
        if !unknown.is_empty() {
            eprintln!(
                "{} Unknown goal(s): {}",
                style("error:").red().bold(),
                unknown.join(" "),
            );
            return Ok(1);
        }

        let result = self.engine.execute(&self.context, &self.goals)?;

        if let Some(report) = &self.invalidation {
            report.report();
        }

        Ok(result)
    }

    /// Runs the engine and returns its result code.
    ///
    /// The run outcome is recorded as failed exactly once for a nonzero
    /// result, an engine failure, or an interruption; an interruption
    /// additionally forces worker cleanup regardless of the configured flag
    /// and is re-raised after cleanup. Worker termination happens exactly
    /// once, strictly after outcome recording, whichever exit path is taken.
    pub fn run(self) -> Result<i32, RunError> {
        let mut cleanup = CleanupGuard {
            workers: self.workers.clone(),
            armed: self.cleanup_workers,
        };

        let outcome = match self.execute_engine() {
            Ok(code) => {
                if code != 0 {
                    self.tracker.set_root_outcome(Outcome::Failure);
                }
                Ok(code)
            }
            Err(EngineError::Interrupted) => {
                self.tracker.set_root_outcome(Outcome::Failure);
                // An interrupted engine might leave workers grinding through
                // heavyweight work that would gum up the next run.
                cleanup.armed = true;
                Err(RunError::Interrupted)
            }
            Err(EngineError::Other(err)) => {
                self.tracker.set_root_outcome(Outcome::Failure);
                Err(RunError::Engine(err))
            }
        };

        drop(cleanup);
        outcome
    }
}
