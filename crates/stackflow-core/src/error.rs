//! Graph construction and rendering errors

use crate::model::EntityKind;
use std::fmt;
use thiserror::Error;

/// Errors raised while building or validating a graph
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Duplicate logical name '{name}' (already used by a {existing})")]
    DuplicateName { name: String, existing: EntityKind },

    #[error("Invalid logical name '{0}': must be non-empty and alphanumeric")]
    InvalidName(String),

    #[error("Unresolved references: {}", format_unresolved(.0))]
    UnresolvedReferences(Vec<UnresolvedReference>),
}

/// Errors raised while rendering a graph into a template document
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Template has no resources")]
    EmptyGraph,

    #[error("Unresolved references: {}", format_unresolved(.0))]
    UnresolvedReference(Vec<UnresolvedReference>),

    #[error("'{entity}' holds a non-finite number ({value}), which a template cannot encode")]
    NonFiniteNumber { entity: String, value: f64 },

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Why a reference could not be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// No entity with the target name exists
    Missing,
    /// The target exists but cannot be addressed this way
    /// (e.g. `Ref` to an output, or an attribute of a parameter)
    NotAddressable(EntityKind),
}

/// A single reference that failed to resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    /// Logical name of the entity holding the reference
    pub source: String,
    pub target: String,
    pub attribute: Option<String>,
    pub reason: UnresolvedReason,
}

impl fmt::Display for UnresolvedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = match &self.attribute {
            Some(attribute) => format!("{}.{}", self.target, attribute),
            None => self.target.clone(),
        };
        match self.reason {
            UnresolvedReason::Missing => write!(f, "{} -> {} (not declared)", self.source, target),
            UnresolvedReason::NotAddressable(kind) => {
                write!(f, "{} -> {} (cannot reference a {})", self.source, target, kind)
            }
        }
    }
}

fn format_unresolved(items: &[UnresolvedReference]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, GraphError>;
