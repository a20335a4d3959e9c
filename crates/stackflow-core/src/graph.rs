//! Resource graph
//!
//! The graph is the aggregate root of a stack definition: an insertion-ordered
//! set of parameters, resources, outputs and conditions sharing one logical
//! name namespace. References between entities are only checked by
//! [`ResourceGraph::resolve_references`], so entities can be added in any order.

use crate::error::{GraphError, Result, UnresolvedReason, UnresolvedReference};
use crate::model::{
    Condition, Entity, EntityKind, Output, Parameter, Reference, Resource,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Default template format version
pub const DEFAULT_FORMAT_VERSION: &str = "2010-09-09";

/// Stack definition: named entities plus template metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceGraph {
    name: String,
    format_version: String,
    description: Option<String>,
    entities: IndexMap<String, Entity>,
}

impl ResourceGraph {
    /// Create an empty graph for the stack `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            format_version: DEFAULT_FORMAT_VERSION.to_string(),
            description: None,
            entities: IndexMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_format_version(mut self, version: impl Into<String>) -> Self {
        self.format_version = version.into();
        self
    }

    /// Stack name this graph deploys to
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format_version(&self) -> &str {
        &self.format_version
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn add_parameter(&mut self, name: impl Into<String>, parameter: Parameter) -> Result<()> {
        self.insert(name.into(), Entity::Parameter(parameter))
    }

    /// Add a resource. Its properties are not checked against the provider schema.
    pub fn add(&mut self, name: impl Into<String>, resource: Resource) -> Result<()> {
        self.insert(name.into(), Entity::Resource(resource))
    }

    pub fn add_output(&mut self, name: impl Into<String>, output: impl Into<Output>) -> Result<()> {
        self.insert(name.into(), Entity::Output(output.into()))
    }

    pub fn add_condition(&mut self, name: impl Into<String>, condition: Condition) -> Result<()> {
        self.insert(name.into(), Entity::Condition(condition))
    }

    fn insert(&mut self, name: String, entity: Entity) -> Result<()> {
        if !is_valid_name(&name) {
            return Err(GraphError::InvalidName(name));
        }
        if let Some(existing) = self.entities.get(&name) {
            return Err(GraphError::DuplicateName {
                name,
                existing: existing.kind(),
            });
        }

        tracing::trace!("Added {} '{}'", entity.kind(), name);
        self.entities.insert(name, entity);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    /// Number of entities of every kind
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// All entities in insertion order
    pub fn entities(&self) -> impl Iterator<Item = (&str, &Entity)> {
        self.entities.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn parameters(&self) -> impl Iterator<Item = (&str, &Parameter)> {
        self.entities().filter_map(|(name, entity)| match entity {
            Entity::Parameter(p) => Some((name, p)),
            _ => None,
        })
    }

    pub fn resources(&self) -> impl Iterator<Item = (&str, &Resource)> {
        self.entities().filter_map(|(name, entity)| match entity {
            Entity::Resource(r) => Some((name, r)),
            _ => None,
        })
    }

    pub fn outputs(&self) -> impl Iterator<Item = (&str, &Output)> {
        self.entities().filter_map(|(name, entity)| match entity {
            Entity::Output(o) => Some((name, o)),
            _ => None,
        })
    }

    pub fn conditions(&self) -> impl Iterator<Item = (&str, &Condition)> {
        self.entities().filter_map(|(name, entity)| match entity {
            Entity::Condition(c) => Some((name, c)),
            _ => None,
        })
    }

    pub fn resource_count(&self) -> usize {
        self.resources().count()
    }

    /// Parameters without a default, which must be supplied at deploy time
    pub fn required_parameters(&self) -> impl Iterator<Item = &str> {
        self.parameters()
            .filter(|(_, p)| p.is_required())
            .map(|(name, _)| name)
    }

    /// Check that every reference in the graph names an addressable entity.
    ///
    /// All failures are reported, in entity insertion order and then
    /// depth-first within each entity.
    pub fn resolve_references(&self) -> Result<()> {
        let mut unresolved = Vec::new();

        for (source, entity) in self.entities() {
            match entity {
                Entity::Parameter(_) => {}
                Entity::Resource(resource) => {
                    for value in resource.properties.values() {
                        for reference in value.references() {
                            self.check_reference(source, reference, &mut unresolved);
                        }
                    }
                    for dependency in &resource.depends_on {
                        self.check_dependency(source, dependency, &mut unresolved);
                    }
                }
                Entity::Output(output) => {
                    for reference in output.value.references() {
                        self.check_reference(source, reference, &mut unresolved);
                    }
                }
                Entity::Condition(condition) => {
                    for reference in condition.expression.references() {
                        self.check_reference(source, reference, &mut unresolved);
                    }
                }
            }
        }

        if unresolved.is_empty() {
            Ok(())
        } else {
            tracing::debug!("{} unresolved reference(s) in '{}'", unresolved.len(), self.name);
            Err(GraphError::UnresolvedReferences(unresolved))
        }
    }

    fn check_reference(
        &self,
        source: &str,
        reference: &Reference,
        unresolved: &mut Vec<UnresolvedReference>,
    ) {
        if reference.is_pseudo() {
            return;
        }

        let reason = match (self.entities.get(&reference.target), &reference.attribute) {
            (None, _) => Some(UnresolvedReason::Missing),
            (Some(Entity::Resource(_)), _) => None,
            (Some(Entity::Parameter(_)), None) => None,
            (Some(entity), _) => Some(UnresolvedReason::NotAddressable(entity.kind())),
        };

        if let Some(reason) = reason {
            unresolved.push(UnresolvedReference {
                source: source.to_string(),
                target: reference.target.clone(),
                attribute: reference.attribute.clone(),
                reason,
            });
        }
    }

    fn check_dependency(
        &self,
        source: &str,
        dependency: &str,
        unresolved: &mut Vec<UnresolvedReference>,
    ) {
        let reason = match self.entities.get(dependency).map(Entity::kind) {
            None => Some(UnresolvedReason::Missing),
            Some(EntityKind::Resource) => None,
            Some(kind) => Some(UnresolvedReason::NotAddressable(kind)),
        };

        if let Some(reason) = reason {
            unresolved.push(UnresolvedReference {
                source: source.to_string(),
                target: dependency.to_string(),
                attribute: None,
                reason,
            });
        }
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric())
}
