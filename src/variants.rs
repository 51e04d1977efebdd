//! Variant key/value overrides and their merge law.

use std::collections::BTreeMap;

use crate::record::Record;

/// A single `(key, value)` override pair.
pub type Variant = (String, String);

/// Merges `right` over `left`, returning the canonical form.
///
/// The canonical form is `None` when both sides are empty or absent, and
/// otherwise a key-sorted list of pairs in which keys present in `right`
/// override the same key in `left`. Inputs are never mutated and keys are
/// expected to be unique within each side.
pub fn merge(left: Option<&[Variant]>, right: Option<&[Variant]>) -> Option<Vec<Variant>> {
    let mut merged: BTreeMap<String, String> = BTreeMap::new();

    for (key, value) in left.into_iter().flatten() {
        merged.insert(key.clone(), value.clone());
    }
    for (key, value) in right.into_iter().flatten() {
        merged.insert(key.clone(), value.clone());
    }

    if merged.is_empty() {
        None
    } else {
        Some(merged.into_iter().collect())
    }
}

/// A record holding default variant values for a target.
///
/// Defaults are applied whenever a caller does not specify a variant key;
/// callers combine them with requested values through [`merge`].
#[derive(Debug, Clone)]
pub struct Variants {
    record: Record,
    default: Option<Vec<Variant>>,
}

impl Variants {
    pub fn new(default: Option<Vec<Variant>>) -> Self {
        Self {
            record: Record::named("variants"),
            default,
        }
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn default_variants(&self) -> Option<&[Variant]> {
        self.default.as_deref()
    }

    /// Merges the requested variants over this record's defaults.
    pub fn apply(&self, requested: Option<&[Variant]>) -> Option<Vec<Variant>> {
        merge(self.default_variants(), requested)
    }
}
