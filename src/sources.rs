//! Lazily enumerated, filtered sets of source files.
//!
//! A [`Sources`] value describes a set of relative file paths through an
//! explicit file list and glob patterns of three strengths: plain globs
//! (single directory level), recursive globs, and extended shell-style
//! patterns passed through verbatim. A nested `Sources` value can be
//! attached as a recursive exclusion set.
//!
//! Each concrete source set declares the file extensions it accepts; an
//! empty set accepts anything. The declared extensions are enforced twice:
//! eagerly against the explicit file list at construction, and against every
//! glob candidate during enumeration.

use std::collections::{BTreeSet, HashSet};

use camino::{Utf8Path, Utf8PathBuf};

use crate::address::Address;
use crate::error::{ShapeError, SourcesError};
use crate::record::Record;

#[derive(Debug, Clone)]
pub struct Sources {
    record: Record,
    files: Vec<Utf8PathBuf>,
    globs: Vec<String>,
    rglobs: Vec<String>,
    zglobs: Vec<String>,
    excludes: Option<Box<Sources>>,
    extensions: BTreeSet<String>,
}

impl Sources {
    pub fn builder() -> SourcesBuilder {
        SourcesBuilder::default()
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Binds the address that named this source set. The address directory
    /// becomes the default base path for enumeration.
    pub fn bind_address(&mut self, address: Address) {
        self.record.bind_address(address);
    }

    /// The accepted file suffixes. Empty means any file is accepted.
    pub fn extensions(&self) -> &BTreeSet<String> {
        &self.extensions
    }

    fn accept_file(&self, path: &Utf8Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        let ext = match path.extension() {
            Some(ext) => format!(".{ext}"),
            None => String::new(),
        };
        self.extensions.contains(&ext)
    }

    /// Enumerates the source paths of this set, re-reading the filesystem on
    /// each call. The whole result is materialized per call rather than
    /// streamed; lazy here means deferred to each call, not within one.
    ///
    /// The base path is taken from the bound address if there is one,
    /// otherwise from `base_path`; lacking both is an error. Candidates are
    /// produced in a fixed order (`files`, then `globs`, `rglobs`, `zglobs`),
    /// filtered by the declared extensions, and checked against the paths
    /// produced by the exclusion set evaluated with the same base. Yielded
    /// paths are the base joined with each relative candidate.
    pub fn iter_paths(
        &self,
        base_path: Option<&Utf8Path>,
    ) -> Result<Vec<Utf8PathBuf>, SourcesError> {
        let base = self
            .record
            .address()
            .map(Address::spec_path)
            .or(base_path)
            .ok_or_else(|| {
                SourcesError::MissingBasePath(
                    self.record.name().unwrap_or("<anonymous sources>").to_string(),
                )
            })?;

        let excluded: HashSet<Utf8PathBuf> = match &self.excludes {
            Some(excludes) => excludes.iter_paths(Some(base))?.into_iter().collect(),
            None => HashSet::new(),
        };

        let mut candidates: Vec<Utf8PathBuf> = self.files.clone();
        for pattern in &self.globs {
            expand_glob(base, pattern, &mut candidates)?;
        }
        for pattern in &self.rglobs {
            let pattern = if pattern.starts_with("**") {
                pattern.clone()
            } else {
                format!("**/{pattern}")
            };
            expand_glob(base, &pattern, &mut candidates)?;
        }
        for pattern in &self.zglobs {
            expand_glob(base, pattern, &mut candidates)?;
        }

        let mut paths = Vec::new();
        for rel in candidates {
            if !self.accept_file(&rel) {
                continue;
            }
            let joined = base.join(&rel);
            if !excluded.contains(&joined) {
                paths.push(joined);
            }
        }

        Ok(paths)
    }
}

/// Expands `pattern` relative to `base` and appends the matched files as
/// base-relative paths.
fn expand_glob(
    base: &Utf8Path,
    pattern: &str,
    candidates: &mut Vec<Utf8PathBuf>,
) -> Result<(), SourcesError> {
    let full = base.join(pattern);
    for entry in glob::glob(full.as_str())? {
        let path = Utf8PathBuf::try_from(entry?)?;
        if !path.is_file() {
            continue;
        }
        let rel = path.strip_prefix(base).unwrap_or(&path).to_owned();
        candidates.push(rel);
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct SourcesBuilder {
    name: Option<String>,
    files: Vec<Utf8PathBuf>,
    globs: Vec<String>,
    rglobs: Vec<String>,
    zglobs: Vec<String>,
    excludes: Option<Box<Sources>>,
    extensions: BTreeSet<String>,
}

impl SourcesBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Explicit relative file paths to include.
    pub fn files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Utf8PathBuf>,
    {
        self.files.extend(files.into_iter().map(Into::into));
        self
    }

    /// Single-directory-level glob patterns.
    pub fn globs<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.globs.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Recursive glob patterns, matched in the base directory and below.
    pub fn rglobs<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rglobs.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Extended shell-style glob patterns, passed through verbatim.
    pub fn zglobs<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.zglobs.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// A source set whose paths are removed from this set's enumeration.
    pub fn exclude(mut self, excludes: Sources) -> Self {
        self.excludes = Some(Box::new(excludes));
        self
    }

    /// The accepted file suffixes, with leading dots (e.g. `".rs"`).
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions.extend(extensions.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> Result<Sources, ShapeError> {
        let sources = Sources {
            record: match self.name {
                Some(name) => Record::named(name),
                None => Record::named("sources"),
            },
            files: self.files,
            globs: self.globs,
            rglobs: self.rglobs,
            zglobs: self.zglobs,
            excludes: self.excludes,
            extensions: self.extensions,
        };

        if !sources.extensions.is_empty() {
            for file in &sources.files {
                if !sources.accept_file(file) {
                    return Err(ShapeError::FileExtension {
                        type_name: "Sources",
                        path: file.clone(),
                        extensions: sources.extensions.iter().cloned().collect(),
                    });
                }
            }
        }

        Ok(sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.rs"), "").unwrap();
        fs::write(dir.path().join("b.txt"), "").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/c.rs"), "").unwrap();
        dir
    }

    fn base_of(dir: &tempfile::TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn test_files_with_excludes() {
        let excludes = Sources::builder().files(["x.py"]).build().unwrap();
        let sources = Sources::builder()
            .files(["x.py", "y.py"])
            .extensions([".py"])
            .exclude(excludes)
            .build()
            .unwrap();

        let paths = sources.iter_paths(Some(Utf8Path::new("src"))).unwrap();
        assert_eq!(paths, vec![Utf8PathBuf::from("src/y.py")]);
    }

    #[test]
    fn test_extension_mismatch_fails_construction() {
        let result = Sources::builder()
            .files(["a.txt"])
            .extensions([".py"])
            .build();
        assert!(matches!(result, Err(ShapeError::FileExtension { .. })));
    }

    #[test]
    fn test_missing_base_path() {
        let sources = Sources::builder().files(["a.rs"]).build().unwrap();
        assert!(matches!(
            sources.iter_paths(None),
            Err(SourcesError::MissingBasePath(_)),
        ));
    }

    #[test]
    fn test_address_provides_base() {
        let mut sources = Sources::builder().files(["a.rs"]).build().unwrap();
        sources.bind_address(Address::new("src/core", "lib"));

        let paths = sources.iter_paths(None).unwrap();
        assert_eq!(paths, vec![Utf8PathBuf::from("src/core/a.rs")]);
    }

    #[test]
    fn test_glob_single_level() {
        let dir = scratch_tree();
        let base = base_of(&dir);

        let sources = Sources::builder().globs(["*.rs"]).build().unwrap();
        let paths = sources.iter_paths(Some(&base)).unwrap();
        assert_eq!(paths, vec![base.join("a.rs")]);
    }

    #[test]
    fn test_rglob_descends() {
        let dir = scratch_tree();
        let base = base_of(&dir);

        let sources = Sources::builder().rglobs(["*.rs"]).build().unwrap();
        let mut paths = sources.iter_paths(Some(&base)).unwrap();
        paths.sort();
        assert_eq!(paths, vec![base.join("a.rs"), base.join("sub/c.rs")]);
    }

    #[test]
    fn test_glob_respects_extensions_and_excludes() {
        let dir = scratch_tree();
        let base = base_of(&dir);

        let excludes = Sources::builder().files(["a.rs"]).build().unwrap();
        let sources = Sources::builder()
            .zglobs(["**/*"])
            .extensions([".rs"])
            .exclude(excludes)
            .build()
            .unwrap();

        let paths = sources.iter_paths(Some(&base)).unwrap();
        assert_eq!(paths, vec![base.join("sub/c.rs")]);
    }
}
