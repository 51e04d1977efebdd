//! The base addressable record underlying every build object.
//!
//! A [`Record`] is a name, an optional back-reference to the [`Address`]
//! that named it, and an open map of attributes. Concrete object types
//! (targets, source sets, variants) declare a [`Shape`] against which their
//! attributes are validated once, at construction; afterwards the map is
//! read-only. The only later mutation allowed is binding the address once
//! the record is picked up by the evaluator.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::address::Address;
use crate::error::ShapeError;

/// The expected kind of a declared attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Number,
    Bool,
    List,
    Map,
    /// Accept any value, including null.
    Any,
}

impl ValueKind {
    fn accepts(self, value: &Value) -> bool {
        match self {
            ValueKind::String => value.is_string(),
            ValueKind::Number => value.is_number(),
            ValueKind::Bool => value.is_boolean(),
            ValueKind::List => value.is_array(),
            ValueKind::Map => value.is_object(),
            ValueKind::Any => true,
        }
    }

    fn name(self) -> &'static str {
        match self {
            ValueKind::String => "a string",
            ValueKind::Number => "a number",
            ValueKind::Bool => "a boolean",
            ValueKind::List => "a list",
            ValueKind::Map => "a map",
            ValueKind::Any => "any value",
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a map",
    }
}

/// The declared attribute shape of a concrete record type.
///
/// Declared fields are type-checked at construction; attributes outside the
/// declaration pass through into the open extension map unchecked.
#[derive(Debug, Clone, Copy)]
pub struct Shape {
    pub type_name: &'static str,
    pub fields: &'static [(&'static str, ValueKind)],
}

impl Shape {
    pub const fn new(type_name: &'static str, fields: &'static [(&'static str, ValueKind)]) -> Self {
        Self { type_name, fields }
    }

    fn validate(&self, attrs: &BTreeMap<String, Value>) -> Result<(), ShapeError> {
        for &(field, kind) in self.fields {
            if let Some(value) = attrs.get(field) {
                if !kind.accepts(value) {
                    return Err(ShapeError::AttributeKind {
                        type_name: self.type_name,
                        field,
                        expected: kind.name(),
                        found: kind_of(value),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Base addressable record: a name, an open attribute map, and an optional
/// back-reference to the address that named it.
#[derive(Debug, Clone)]
pub struct Record {
    name: Option<String>,
    address: Option<Address>,
    attrs: BTreeMap<String, Value>,
}

impl Record {
    /// Validates `attrs` against `shape` and constructs the record.
    pub fn new(
        shape: &Shape,
        name: Option<String>,
        attrs: BTreeMap<String, Value>,
    ) -> Result<Self, ShapeError> {
        shape.validate(&attrs)?;
        Ok(Self {
            name,
            address: None,
            attrs,
        })
    }

    /// A record with no attributes, used by object types whose fields are
    /// all explicit.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            address: None,
            attrs: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    /// Binds the address that named this record. Records are read-only after
    /// construction except for this single binding.
    pub fn bind_address(&mut self, address: Address) {
        self.address = Some(address);
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The declared tags of this record, read from the `tags` attribute.
    /// Non-string entries are stringified, matching how tag filters compare.
    pub fn tags(&self) -> Vec<String> {
        match self.attrs.get("tags") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SHAPE: Shape = Shape::new(
        "TestRecord",
        &[("sources", ValueKind::List), ("main", ValueKind::String)],
    );

    fn attrs(value: Value) -> BTreeMap<String, Value> {
        value
            .as_object()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    #[test]
    fn test_valid_shape() {
        let record = Record::new(
            &SHAPE,
            Some("lib".into()),
            attrs(json!({ "sources": ["a.rs"], "main": "a.rs", "open": 42 })),
        )
        .unwrap();

        assert_eq!(record.name(), Some("lib"));
        assert_eq!(record.attr("open"), Some(&json!(42)));
    }

    #[test]
    fn test_bad_attribute_kind() {
        let err = Record::new(&SHAPE, None, attrs(json!({ "main": 42 }))).unwrap_err();
        assert!(err.to_string().contains("'main'"));
    }

    #[test]
    fn test_address_binding() {
        let mut record = Record::named("lib");
        assert!(record.address().is_none());

        record.bind_address(Address::new("src", "lib"));
        assert_eq!(record.address().unwrap().to_string(), "src:lib");
    }

    #[test]
    fn test_tags() {
        let record = Record::new(
            &SHAPE,
            None,
            attrs(json!({ "tags": ["integration", 3] })),
        )
        .unwrap();
        assert_eq!(record.tags(), vec!["integration".to_string(), "3".to_string()]);

        assert!(Record::named("lib").tags().is_empty());
    }
}
