//! Per-invocation runner configuration.

use camino::Utf8PathBuf;
use serde::Deserialize;

use crate::error::RunError;

/// The configuration surface consumed by one invocation.
///
/// Constructed once from the externally bootstrapped options and threaded as
/// a parameter into every component that needs it; there is no global option
/// state.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// The tool's working directory. Must end with
    /// [`WORKDIR_SUFFIX`](crate::runner::WORKDIR_SUFFIX).
    pub workdir: Utf8PathBuf,
    /// Requested goal names, in order.
    pub goals: Vec<String>,
    /// Target spec strings to resolve into root targets.
    pub target_specs: Vec<String>,
    /// Tag filter expressions applied to resolved root targets.
    pub tag: Vec<String>,
    /// Abort the whole resolution on the first unresolvable spec.
    pub fail_fast: bool,
    /// Explain mode: print what would run instead of running it.
    pub explain: bool,
    /// Launch the background daemon before setup (best effort).
    pub enable_daemon: bool,
    /// Terminate persistent worker subprocesses after the run.
    pub cleanup_workers: bool,
    /// Glob patterns of directories whose addresses are dropped from spec
    /// expansion.
    pub spec_excludes: Vec<String>,
    /// Ignore patterns forwarded to the address mapper.
    pub ignore_patterns: Vec<String>,
    /// Source-control revision to read build definitions at, if pinned.
    pub build_file_rev: Option<String>,
    /// The tool version the invoker expects to be running, if any.
    pub requested_version: Option<String>,
    /// A help request short-circuits the run before any graph work.
    pub help: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            workdir: Utf8PathBuf::from(".drover.d"),
            goals: Vec::new(),
            target_specs: Vec::new(),
            tag: Vec::new(),
            fail_fast: false,
            explain: false,
            enable_daemon: false,
            cleanup_workers: false,
            spec_excludes: Vec::new(),
            ignore_patterns: Vec::new(),
            build_file_rev: None,
            requested_version: None,
            help: false,
        }
    }
}

/// Gate on the requested tool version. A mismatch is fatal at startup,
/// before any graph work.
pub fn check_version(requested: Option<&str>) -> Result<(), RunError> {
    const RUNNING: &str = env!("CARGO_PKG_VERSION");

    match requested {
        Some(requested) if requested != RUNNING => Err(RunError::VersionMismatch {
            requested: requested.to_string(),
            running: RUNNING.to_string(),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_gate() {
        assert!(check_version(None).is_ok());
        assert!(check_version(Some(env!("CARGO_PKG_VERSION"))).is_ok());
        assert!(matches!(
            check_version(Some("0.0.0-other")),
            Err(RunError::VersionMismatch { .. }),
        ));
    }

    #[test]
    fn test_config_from_json() {
        let config: RunnerConfig = serde_json::from_str(
            r#"{ "goals": ["compile"], "target_specs": ["src::"], "fail_fast": true }"#,
        )
        .unwrap();
        assert_eq!(config.goals, vec!["compile"]);
        assert!(config.fail_fast);
        assert_eq!(config.workdir, Utf8PathBuf::from(".drover.d"));
    }
}
