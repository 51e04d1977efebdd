//! Mapping CLI spec strings onto addresses.

use std::sync::Arc;

use camino::Utf8Path;
use glob::Pattern;

use crate::address::{Address, TargetSpec};
use crate::error::ResolveError;

/// The outcome of resolving a single token as a target spec.
///
/// `NotFound` is an ordinary value, not an error: during goal/spec
/// disambiguation the lookup failure is the expected path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecResolution {
    Resolved(Address),
    NotFound,
}

/// The external address space of the build definitions.
///
/// Implemented by the BUILD-file mapping layer; the orchestration core only
/// asks it to resolve single specs and to enumerate the addresses registered
/// under a directory.
pub trait AddressMapper: Send + Sync {
    fn resolve_spec(&self, spec: &str) -> SpecResolution;

    /// All addresses registered in `path`, descending into subdirectories
    /// when `recursive` is set.
    fn addresses_in(&self, path: &Utf8Path, recursive: bool)
    -> Result<Vec<Address>, ResolveError>;
}

/// Expands command-line spec strings into addresses.
pub struct SpecParser {
    mapper: Arc<dyn AddressMapper>,
    excludes: Vec<Pattern>,
}

impl SpecParser {
    pub fn new<S: AsRef<str>>(
        mapper: Arc<dyn AddressMapper>,
        exclude_patterns: &[S],
    ) -> Result<Self, ResolveError> {
        let excludes = exclude_patterns
            .iter()
            .map(|pattern| Pattern::new(pattern.as_ref()))
            .collect::<Result<_, _>>()?;
        Ok(Self { mapper, excludes })
    }

    /// Resolves one spec string into zero or more addresses.
    ///
    /// With `fail_fast` an unresolvable spec is an error that aborts the
    /// whole resolution; without it the spec is logged and skipped, yielding
    /// no addresses. Addresses whose directory matches a spec-exclude
    /// pattern are dropped from sibling and descendant expansions.
    pub fn parse_addresses(
        &self,
        spec: &str,
        fail_fast: bool,
    ) -> Result<Vec<Address>, ResolveError> {
        match self.expand(spec) {
            Ok(addresses) => Ok(addresses),
            Err(err) if !fail_fast => {
                tracing::warn!("Skipping spec '{spec}': {err}");
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    fn expand(&self, spec: &str) -> Result<Vec<Address>, ResolveError> {
        match spec.parse::<TargetSpec>()? {
            TargetSpec::Single(address) => match self.mapper.resolve_spec(&address.to_string()) {
                SpecResolution::Resolved(address) => Ok(vec![address]),
                SpecResolution::NotFound => Err(ResolveError::NotFound(address.to_string())),
            },
            TargetSpec::Siblings(path) => self.expand_family(&path, false),
            TargetSpec::Descendants(path) => self.expand_family(&path, true),
        }
    }

    fn expand_family(
        &self,
        path: &Utf8Path,
        recursive: bool,
    ) -> Result<Vec<Address>, ResolveError> {
        let addresses: Vec<Address> = self
            .mapper
            .addresses_in(path, recursive)?
            .into_iter()
            .filter(|address| !self.is_excluded(address))
            .collect();

        if addresses.is_empty() {
            return Err(ResolveError::EmptyFamily(path.to_owned()));
        }
        Ok(addresses)
    }

    fn is_excluded(&self, address: &Address) -> bool {
        self.excludes
            .iter()
            .any(|pattern| pattern.matches(address.spec_path().as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    struct FakeMapper {
        addresses: BTreeSet<Address>,
    }

    impl FakeMapper {
        fn new(specs: &[&str]) -> Arc<Self> {
            let addresses = specs
                .iter()
                .map(|spec| match spec.split_once(':') {
                    Some((path, name)) => Address::new(path, name),
                    None => unreachable!(),
                })
                .collect();
            Arc::new(Self { addresses })
        }
    }

    impl AddressMapper for FakeMapper {
        fn resolve_spec(&self, spec: &str) -> SpecResolution {
            self.addresses
                .iter()
                .find(|address| address.to_string() == spec)
                .cloned()
                .map_or(SpecResolution::NotFound, SpecResolution::Resolved)
        }

        fn addresses_in(
            &self,
            path: &Utf8Path,
            recursive: bool,
        ) -> Result<Vec<Address>, ResolveError> {
            Ok(self
                .addresses
                .iter()
                .filter(|address| {
                    if recursive {
                        address.spec_path().starts_with(path)
                    } else {
                        address.spec_path() == path
                    }
                })
                .cloned()
                .collect())
        }
    }

    fn parser(mapper: Arc<FakeMapper>) -> SpecParser {
        SpecParser::new(mapper, &[] as &[&str]).unwrap()
    }

    #[test]
    fn test_single_spec() {
        let mapper = FakeMapper::new(&["src/core:lib"]);
        let addresses = parser(mapper).parse_addresses("src/core:lib", true).unwrap();
        assert_eq!(addresses, vec![Address::new("src/core", "lib")]);
    }

    #[test]
    fn test_siblings_vs_descendants() {
        let mapper = FakeMapper::new(&["src:a", "src/core:lib", "src/core/io:io"]);

        let siblings = parser(mapper.clone())
            .parse_addresses("src/core:", true)
            .unwrap();
        assert_eq!(siblings, vec![Address::new("src/core", "lib")]);

        let descendants = parser(mapper).parse_addresses("src/core::", true).unwrap();
        assert_eq!(
            descendants,
            vec![
                Address::new("src/core", "lib"),
                Address::new("src/core/io", "io"),
            ],
        );
    }

    #[test]
    fn test_fail_fast_controls_unresolvable() {
        let mapper = FakeMapper::new(&["src/core:lib"]);

        let err = parser(mapper.clone()).parse_addresses("src/gone:lib", true);
        assert!(matches!(err, Err(ResolveError::NotFound(_))));

        // Without fail-fast the bad spec is skipped, not fatal.
        let addresses = parser(mapper).parse_addresses("src/gone:lib", false).unwrap();
        assert!(addresses.is_empty());
    }

    #[test]
    fn test_spec_excludes() {
        let mapper = FakeMapper::new(&["src/core:lib", "src/core/testing:util"]);
        let parser = SpecParser::new(mapper, &["*/testing"]).unwrap();

        let addresses = parser.parse_addresses("src::", true).unwrap();
        assert_eq!(addresses, vec![Address::new("src/core", "lib")]);
    }
}
