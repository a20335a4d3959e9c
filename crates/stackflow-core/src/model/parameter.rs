//! Template parameters

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterType {
    String,
    Number,
    NumberList,
    CommaDelimitedList,
    StringList,
    /// Provider-specific type such as `AWS::EC2::KeyPair::KeyName`
    Other(String),
}

impl ParameterType {
    /// Name of the type in the rendered template
    pub fn as_str(&self) -> &str {
        match self {
            Self::String => "String",
            Self::Number => "Number",
            Self::NumberList => "List<Number>",
            Self::CommaDelimitedList => "CommaDelimitedList",
            Self::StringList => "List<String>",
            Self::Other(name) => name,
        }
    }

    /// Parse from the rendered type name
    pub fn parse(s: &str) -> Self {
        match s {
            "String" => Self::String,
            "Number" => Self::Number,
            "List<Number>" => Self::NumberList,
            "CommaDelimitedList" => Self::CommaDelimitedList,
            "List<String>" => Self::StringList,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value supplied by the caller at deploy time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub param_type: ParameterType,

    /// Mask the value in the provider's console and API responses
    #[serde(default)]
    pub no_echo: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Parameter {
    pub fn new(param_type: ParameterType) -> Self {
        Self {
            param_type,
            no_echo: false,
            default: None,
            allowed_values: Vec::new(),
            description: None,
        }
    }

    pub fn string() -> Self {
        Self::new(ParameterType::String)
    }

    pub fn number() -> Self {
        Self::new(ParameterType::Number)
    }

    pub fn with_no_echo(mut self, no_echo: bool) -> Self {
        self.no_echo = no_echo;
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_allowed_values<S: Into<String>>(mut self, values: impl IntoIterator<Item = S>) -> Self {
        self.allowed_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// A parameter without a default must be supplied at deploy time
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names_round_trip() {
        for ty in [
            ParameterType::String,
            ParameterType::Number,
            ParameterType::NumberList,
            ParameterType::CommaDelimitedList,
            ParameterType::StringList,
            ParameterType::Other("AWS::EC2::KeyPair::KeyName".into()),
        ] {
            assert_eq!(ParameterType::parse(ty.as_str()), ty);
        }
    }

    #[test]
    fn test_required() {
        assert!(Parameter::string().is_required());
        assert!(!Parameter::string().with_default("10.0.0.0/16").is_required());
    }
}
