//! Goals: named, ordered groups of tasks requested by the user.

use std::collections::BTreeMap;

/// A single task installed in a goal.
///
/// Tasks are registered by external backends; the orchestration core only
/// consumes their name and capabilities. `quiet` marks tasks that squelch
/// ordinary console reporting while they run.
#[derive(Debug, Clone)]
pub struct GoalTask {
    name: String,
    quiet: bool,
}

impl GoalTask {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quiet: false,
        }
    }

    pub fn quiet(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quiet: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }
}

/// A named, ordered group of tasks.
#[derive(Debug, Clone)]
pub struct Goal {
    name: String,
    tasks: Vec<GoalTask>,
}

impl Goal {
    pub fn new(name: impl Into<String>, tasks: Vec<GoalTask>) -> Self {
        Self {
            name: name.into(),
            tasks,
        }
    }

    /// A goal with no installed tasks. Requesting one of these fails at
    /// execution time, not at lookup time.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ordered_task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(GoalTask::name)
    }

    pub fn has_quiet_task(&self) -> bool {
        self.tasks.iter().any(GoalTask::is_quiet)
    }

    /// A goal is unknown when it has no executable tasks.
    pub fn is_unknown(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// The set of goals registered by loaded backends.
#[derive(Debug, Clone, Default)]
pub struct GoalRegistry {
    goals: BTreeMap<String, Goal>,
}

impl GoalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, goal: Goal) {
        self.goals.insert(goal.name().to_string(), goal);
    }

    /// Looks up a goal by name, producing an empty goal for unregistered
    /// names; unknown-goal validation is deferred to the execution step.
    pub fn by_name(&self, name: &str) -> Goal {
        self.goals
            .get(name)
            .cloned()
            .unwrap_or_else(|| Goal::empty(name))
    }

    pub fn all(&self) -> impl Iterator<Item = &Goal> {
        self.goals.values()
    }
}
