use std::fmt;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::ResolveError;

/// Unique identifier of a target within the build definition space.
///
/// An address is the directory of the defining BUILD file plus the target
/// name declared in it. It is the identity key for build graph nodes; beyond
/// equality, ordering and display the orchestration core treats it as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address {
    spec_path: Utf8PathBuf,
    target_name: String,
}

impl Address {
    pub fn new(spec_path: impl Into<Utf8PathBuf>, target_name: impl Into<String>) -> Self {
        Self {
            spec_path: spec_path.into(),
            target_name: target_name.into(),
        }
    }

    /// The directory the defining BUILD file lives in, relative to the
    /// build root.
    pub fn spec_path(&self) -> &Utf8Path {
        &self.spec_path
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.spec_path, self.target_name)
    }
}

/// A parsed command-line target spec.
///
/// Three forms are accepted:
/// * `path:name` (or bare `path`, where the name defaults to the last path
///   component) selects a single address,
/// * `path:` selects every address registered directly in `path`,
/// * `path::` selects every address in `path` and all directories below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    Single(Address),
    Siblings(Utf8PathBuf),
    Descendants(Utf8PathBuf),
}

impl FromStr for TargetSpec {
    type Err = ResolveError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| ResolveError::MalformedSpec {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };

        if spec.is_empty() {
            return Err(malformed("empty spec"));
        }

        if let Some(path) = spec.strip_suffix("::") {
            if path.contains(':') {
                return Err(malformed("path of a recursive spec may not contain ':'"));
            }
            return Ok(TargetSpec::Descendants(normalize(path)));
        }

        match spec.split_once(':') {
            None => {
                let path = normalize(spec);
                let name = path
                    .file_name()
                    .ok_or_else(|| malformed("cannot derive a default target name"))?
                    .to_string();
                Ok(TargetSpec::Single(Address::new(path, name)))
            }
            Some((path, "")) => Ok(TargetSpec::Siblings(normalize(path))),
            Some((path, name)) => {
                if name.contains(':') {
                    return Err(malformed("too many ':' separators"));
                }
                Ok(TargetSpec::Single(Address::new(normalize(path), name)))
            }
        }
    }
}

/// Strips any trailing slash so that equivalent specs produce equal paths.
fn normalize(path: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(path.trim_end_matches('/'))
}
