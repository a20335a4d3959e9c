//! Property values

use super::reference::Reference;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered property bag of a resource
pub type Properties = IndexMap<String, PropertyValue>;

/// A value inside a resource, output or condition body.
///
/// Only the container structure is checked locally. Whether a property is
/// valid for a given resource kind is decided by the provisioning service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<PropertyValue>),
    Map(Properties),
    Ref(Reference),
}

impl PropertyValue {
    /// Build a mapping value from key/value pairs, keeping their order
    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<PropertyValue>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build a list value
    pub fn list<V: Into<PropertyValue>>(items: impl IntoIterator<Item = V>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Self::Ref(r) => Some(r),
            _ => None,
        }
    }

    /// All references in this value, depth-first, mapping keys in insertion order
    pub fn references(&self) -> Vec<&Reference> {
        let mut found = Vec::new();
        self.collect_references(&mut found);
        found
    }

    fn collect_references<'a>(&'a self, found: &mut Vec<&'a Reference>) {
        match self {
            Self::Ref(r) => found.push(r),
            Self::List(items) => items.iter().for_each(|v| v.collect_references(found)),
            Self::Map(entries) => entries.values().for_each(|v| v.collect_references(found)),
            _ => {}
        }
    }
}

impl From<Reference> for PropertyValue {
    fn from(r: Reference) -> Self {
        Self::Ref(r)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for PropertyValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for PropertyValue {
    fn from(n: i32) -> Self {
        Self::Integer(n.into())
    }
}

impl From<u16> for PropertyValue {
    fn from(n: u16) -> Self {
        Self::Integer(n.into())
    }
}

impl From<u32> for PropertyValue {
    fn from(n: u32) -> Self {
        Self::Integer(n.into())
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl<V: Into<PropertyValue>> From<Vec<V>> for PropertyValue {
    fn from(items: Vec<V>) -> Self {
        Self::list(items)
    }
}

impl From<Properties> for PropertyValue {
    fn from(entries: Properties) -> Self {
        Self::Map(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_references_depth_first() {
        let value = PropertyValue::map([
            ("VpcId", PropertyValue::from(Reference::to("VPC"))),
            (
                "Nested",
                PropertyValue::list([
                    PropertyValue::from(Reference::to("Subnet1")),
                    PropertyValue::map([("Inner", Reference::attr("Subnet2", "Arn"))]),
                ]),
            ),
            ("Plain", PropertyValue::from("10.0.0.0/24")),
        ]);

        let targets: Vec<String> = value.references().iter().map(|r| r.to_string()).collect();
        assert_eq!(targets, vec!["VPC", "Subnet1", "Subnet2.Arn"]);
    }

    #[test]
    fn test_scalar_conversions() {
        assert_eq!(PropertyValue::from(true), PropertyValue::Bool(true));
        assert_eq!(PropertyValue::from(443u16), PropertyValue::Integer(443));
        assert_eq!(PropertyValue::from("x").as_str(), Some("x"));
        assert_eq!(
            PropertyValue::from(vec!["AmazonProvidedDNS"]),
            PropertyValue::List(vec![PropertyValue::String("AmazonProvidedDNS".into())])
        );
    }
}
