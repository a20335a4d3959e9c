//! Symbolic references between graph entities

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pseudo parameters supplied by the provisioning service itself.
///
/// They always resolve and never need to be declared in a graph.
pub const PSEUDO_PARAMETERS: &[&str] = &[
    "AWS::AccountId",
    "AWS::NotificationARNs",
    "AWS::NoValue",
    "AWS::Partition",
    "AWS::Region",
    "AWS::StackId",
    "AWS::StackName",
    "AWS::URLSuffix",
];

/// Pointer to another entity by logical name, optionally qualified by an attribute.
///
/// A plain reference addresses the entity's identifier (`Ref`), an attribute
/// reference addresses a named attribute of a resource (`Fn::GetAtt`).
/// Resolution happens when the graph is rendered, so the target may be added
/// after the entity that references it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    pub target: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Reference {
    pub fn to(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            attribute: None,
        }
    }

    pub fn attr(target: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            attribute: Some(attribute.into()),
        }
    }

    /// Whether this reference names a pseudo parameter
    pub fn is_pseudo(&self) -> bool {
        self.attribute.is_none() && PSEUDO_PARAMETERS.contains(&self.target.as_str())
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attribute {
            Some(attribute) => write!(f, "{}.{}", self.target, attribute),
            None => write!(f, "{}", self.target),
        }
    }
}

/// Shorthand for `Reference::to(target).into()` when building properties
pub fn reference(target: impl Into<String>) -> crate::PropertyValue {
    Reference::to(target).into()
}

/// Shorthand for `Reference::attr(target, attribute).into()`
pub fn get_att(target: impl Into<String>, attribute: impl Into<String>) -> crate::PropertyValue {
    Reference::attr(target, attribute).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pseudo_parameter() {
        assert!(Reference::to("AWS::Region").is_pseudo());
        assert!(!Reference::to("VPC").is_pseudo());
        assert!(!Reference::attr("AWS::Region", "Arn").is_pseudo());
    }

    #[test]
    fn test_display() {
        assert_eq!(Reference::to("VPC").to_string(), "VPC");
        assert_eq!(
            Reference::attr("VPC", "CidrBlock").to_string(),
            "VPC.CidrBlock"
        );
    }
}
