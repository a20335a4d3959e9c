//! Template rendering
//!
//! Converts a [`ResourceGraph`] into the provider's template document.
//! Sections and their entries keep the graph's insertion order so that the
//! same graph always renders to byte-identical output.

use crate::error::{GraphError, RenderError};
use crate::graph::ResourceGraph;
use crate::model::{Output, Parameter, PropertyValue, Reference, Resource};
use serde_json::{Map, Value, json};

/// A rendered template
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Value,
}

impl Document {
    pub fn as_value(&self) -> &Value {
        &self.root
    }

    pub fn into_value(self) -> Value {
        self.root
    }

    /// Look up a node by JSON pointer (e.g. `/Resources/VPC/Type`)
    pub fn pointer(&self, path: &str) -> Option<&Value> {
        self.root.pointer(path)
    }

    /// Compact JSON, as submitted to the provisioning service
    pub fn to_json(&self) -> Result<String, RenderError> {
        Ok(serde_json::to_string(&self.root)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, RenderError> {
        Ok(serde_json::to_string_pretty(&self.root)?)
    }

    pub fn to_yaml(&self) -> Result<String, RenderError> {
        Ok(serde_yaml::to_string(&self.root)?)
    }
}

/// Render a graph into a template document.
///
/// Fails with [`RenderError::EmptyGraph`] when the graph declares no
/// resources and with [`RenderError::UnresolvedReference`] when any
/// reference does not resolve.
pub fn render(graph: &ResourceGraph) -> Result<Document, RenderError> {
    if graph.resource_count() == 0 {
        return Err(RenderError::EmptyGraph);
    }
    graph.resolve_references().map_err(|err| match err {
        GraphError::UnresolvedReferences(items) => RenderError::UnresolvedReference(items),
        other => RenderError::Graph(other),
    })?;

    let mut root = Map::new();
    root.insert(
        "AWSTemplateFormatVersion".to_string(),
        Value::String(graph.format_version().to_string()),
    );
    if let Some(description) = graph.description() {
        root.insert(
            "Description".to_string(),
            Value::String(description.to_string()),
        );
    }

    let parameters: Map<String, Value> = graph
        .parameters()
        .map(|(name, p)| (name.to_string(), render_parameter(p)))
        .collect();
    if !parameters.is_empty() {
        root.insert("Parameters".to_string(), Value::Object(parameters));
    }

    let conditions = graph
        .conditions()
        .map(|(name, c)| Ok((name.to_string(), render_value(name, &c.expression)?)))
        .collect::<Result<Map<String, Value>, RenderError>>()?;
    if !conditions.is_empty() {
        root.insert("Conditions".to_string(), Value::Object(conditions));
    }

    let resources = graph
        .resources()
        .map(|(name, r)| Ok((name.to_string(), render_resource(name, r)?)))
        .collect::<Result<Map<String, Value>, RenderError>>()?;
    root.insert("Resources".to_string(), Value::Object(resources));

    let outputs = graph
        .outputs()
        .map(|(name, o)| Ok((name.to_string(), render_output(name, o)?)))
        .collect::<Result<Map<String, Value>, RenderError>>()?;
    if !outputs.is_empty() {
        root.insert("Outputs".to_string(), Value::Object(outputs));
    }

    tracing::debug!(
        "Rendered template for '{}' ({} resources)",
        graph.name(),
        graph.resource_count()
    );
    Ok(Document {
        root: Value::Object(root),
    })
}

fn render_parameter(parameter: &Parameter) -> Value {
    let mut node = Map::new();
    node.insert(
        "Type".to_string(),
        Value::String(parameter.param_type.as_str().to_string()),
    );
    if let Some(description) = &parameter.description {
        node.insert("Description".to_string(), Value::String(description.clone()));
    }
    if parameter.no_echo {
        node.insert("NoEcho".to_string(), Value::Bool(true));
    }
    if let Some(default) = &parameter.default {
        node.insert("Default".to_string(), Value::String(default.clone()));
    }
    if !parameter.allowed_values.is_empty() {
        node.insert("AllowedValues".to_string(), json!(parameter.allowed_values));
    }
    Value::Object(node)
}

fn render_resource(name: &str, resource: &Resource) -> Result<Value, RenderError> {
    let mut node = Map::new();
    node.insert(
        "Type".to_string(),
        Value::String(resource.kind.as_str().to_string()),
    );
    if !resource.depends_on.is_empty() {
        node.insert("DependsOn".to_string(), json!(resource.depends_on));
    }
    if !resource.properties.is_empty() {
        let properties = resource
            .properties
            .iter()
            .map(|(k, v)| Ok((k.clone(), render_value(name, v)?)))
            .collect::<Result<Map<String, Value>, RenderError>>()?;
        node.insert("Properties".to_string(), Value::Object(properties));
    }
    Ok(Value::Object(node))
}

fn render_output(name: &str, output: &Output) -> Result<Value, RenderError> {
    let mut node = Map::new();
    if let Some(description) = &output.description {
        node.insert("Description".to_string(), Value::String(description.clone()));
    }
    node.insert("Value".to_string(), render_value(name, &output.value)?);
    if let Some(export_name) = &output.export_name {
        node.insert("Export".to_string(), json!({ "Name": export_name }));
    }
    Ok(Value::Object(node))
}

/// `entity` names the owner of the value for error messages
fn render_value(entity: &str, value: &PropertyValue) -> Result<Value, RenderError> {
    Ok(match value {
        PropertyValue::Null => Value::Null,
        PropertyValue::Bool(b) => Value::Bool(*b),
        PropertyValue::Integer(n) => Value::from(*n),
        PropertyValue::Float(n) => serde_json::Number::from_f64(*n)
            .map(Value::Number)
            .ok_or_else(|| RenderError::NonFiniteNumber {
                entity: entity.to_string(),
                value: *n,
            })?,
        PropertyValue::String(s) => Value::String(s.clone()),
        PropertyValue::List(items) => Value::Array(
            items
                .iter()
                .map(|item| render_value(entity, item))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        PropertyValue::Map(entries) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| Ok((k.clone(), render_value(entity, v)?)))
                .collect::<Result<Map<String, Value>, RenderError>>()?,
        ),
        PropertyValue::Ref(reference) => render_reference(reference),
    })
}

fn render_reference(reference: &Reference) -> Value {
    match &reference.attribute {
        Some(attribute) => json!({ "Fn::GetAtt": [reference.target, attribute] }),
        None => json!({ "Ref": reference.target }),
    }
}
