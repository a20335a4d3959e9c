//! Graph entity definitions

mod parameter;
mod reference;
mod resource;
mod value;

pub use parameter::{Parameter, ParameterType};
pub use reference::{PSEUDO_PARAMETERS, Reference, get_att, reference};
pub use resource::{Condition, Output, Resource, ResourceTypeId, kinds};
pub use value::{Properties, PropertyValue};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Any entity that can live in a graph under a logical name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum Entity {
    Parameter(Parameter),
    Resource(Resource),
    Output(Output),
    Condition(Condition),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Parameter(_) => EntityKind::Parameter,
            Entity::Resource(_) => EntityKind::Resource,
            Entity::Output(_) => EntityKind::Output,
            Entity::Condition(_) => EntityKind::Condition,
        }
    }
}

/// Kind of a graph entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Parameter,
    Resource,
    Output,
    Condition,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Parameter => write!(f, "parameter"),
            EntityKind::Resource => write!(f, "resource"),
            EntityKind::Output => write!(f, "output"),
            EntityKind::Condition => write!(f, "condition"),
        }
    }
}
