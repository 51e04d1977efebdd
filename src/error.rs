use camino::Utf8PathBuf;
use thiserror::Error;

/// A record or one of its attributes failed construction-time validation.
#[derive(Debug, Error)]
pub enum ShapeError {
    #[error("Attribute '{field}' of {type_name} must be {expected}, got {found}")]
    AttributeKind {
        type_name: &'static str,
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Path '{path}' selected by {type_name} is not a {extensions:?} file")]
    FileExtension {
        type_name: &'static str,
        path: Utf8PathBuf,
        extensions: Vec<String>,
    },
}

#[derive(Debug, Error)]
pub enum SourcesError {
    #[error("A base path must be supplied to iterate paths for {0}")]
    MissingBasePath(String),

    #[error("Couldn't compile glob pattern.\n{0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Couldn't run glob.\n{0}")]
    Glob(#[from] glob::GlobError),

    #[error("Couldn't convert path to UTF-8.\n{0}")]
    PathFormat(#[from] camino::FromPathBufError),
}

/// The exactly-one-match invariant of configuration selection was violated.
#[derive(Debug, Error)]
#[error(
    "Failed to find a single configuration named '{name}' on target '{target}', \
     matched {matched}; configurations seen:\n\t{seen}"
)]
pub struct ConfigurationNotFound {
    pub target: String,
    pub name: String,
    pub matched: usize,
    pub seen: String,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Address '{0}' was not found in the build definitions")]
    NotFound(String),

    #[error("Malformed target spec '{spec}': {reason}")]
    MalformedSpec { spec: String, reason: String },

    #[error("No addresses registered under '{0}'")]
    EmptyFamily(Utf8PathBuf),

    #[error("Couldn't compile spec exclude pattern.\n{0}")]
    Pattern(#[from] glob::PatternError),

    #[error("An error occurred while evaluating build definitions.\n{0}")]
    Definitions(#[from] anyhow::Error),
}

/// Failure surfaced by the external task engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A cancellation signal was received during execution.
    #[error("Execution interrupted")]
    Interrupted,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Version mismatch: requested version was {requested}, our version is {running}")]
    VersionMismatch { requested: String, running: String },

    #[error("Error while resolving target specs.\n{0}")]
    Resolve(#[from] ResolveError),

    /// A cancellation signal, re-raised to the caller after cleanup.
    #[error("Run interrupted")]
    Interrupted,

    #[error("Error while executing the task engine.\n{0}")]
    Engine(anyhow::Error),
}
