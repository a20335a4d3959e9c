//! Resources, outputs and conditions

use super::reference::Reference;
use super::value::{Properties, PropertyValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a resource kind in the provider's catalog (e.g. `AWS::EC2::VPC`).
///
/// The catalog itself lives with the provider; this is an opaque tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceTypeId(String);

impl ResourceTypeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceTypeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Resource kinds used by the bundled stacks
pub mod kinds {
    pub const EC2_VPC: &str = "AWS::EC2::VPC";
    pub const EC2_SUBNET: &str = "AWS::EC2::Subnet";
    pub const EC2_INTERNET_GATEWAY: &str = "AWS::EC2::InternetGateway";
    pub const EC2_VPC_GATEWAY_ATTACHMENT: &str = "AWS::EC2::VPCGatewayAttachment";
    pub const EC2_ROUTE_TABLE: &str = "AWS::EC2::RouteTable";
    pub const EC2_ROUTE: &str = "AWS::EC2::Route";
    pub const EC2_SUBNET_ROUTE_TABLE_ASSOCIATION: &str = "AWS::EC2::SubnetRouteTableAssociation";
    pub const EC2_NETWORK_ACL: &str = "AWS::EC2::NetworkAcl";
    pub const EC2_NETWORK_ACL_ENTRY: &str = "AWS::EC2::NetworkAclEntry";
    pub const EC2_SUBNET_NETWORK_ACL_ASSOCIATION: &str = "AWS::EC2::SubnetNetworkAclAssociation";
    pub const EC2_DHCP_OPTIONS: &str = "AWS::EC2::DHCPOptions";
}

/// A declared infrastructure resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub kind: ResourceTypeId,

    #[serde(default)]
    pub properties: Properties,

    /// Explicit ordering dependencies on other resources
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

impl Resource {
    pub fn new(kind: impl Into<ResourceTypeId>) -> Self {
        Self {
            kind: kind.into(),
            properties: Properties::new(),
            depends_on: Vec::new(),
        }
    }

    /// Set a property, replacing any previous value under the same key
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.depends_on.push(name.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }
}

/// A value exported after a successful deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub value: PropertyValue,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_name: Option<String>,
}

impl Output {
    pub fn new(value: impl Into<PropertyValue>) -> Self {
        Self {
            value: value.into(),
            description: None,
            export_name: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_export_name(mut self, name: impl Into<String>) -> Self {
        self.export_name = Some(name.into());
        self
    }
}

impl From<PropertyValue> for Output {
    fn from(value: PropertyValue) -> Self {
        Self::new(value)
    }
}

impl From<Reference> for Output {
    fn from(reference: Reference) -> Self {
        Self::new(reference)
    }
}

/// A named boolean expression evaluated by the provisioning service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Condition {
    pub expression: PropertyValue,
}

impl Condition {
    pub fn new(expression: impl Into<PropertyValue>) -> Self {
        Self {
            expression: expression.into(),
        }
    }

    /// `Fn::Equals` of two values
    pub fn equals(left: impl Into<PropertyValue>, right: impl Into<PropertyValue>) -> Self {
        Self::new(PropertyValue::map([(
            "Fn::Equals",
            PropertyValue::List(vec![left.into(), right.into()]),
        )]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_builder() {
        let vpc = Resource::new(kinds::EC2_VPC)
            .with("CidrBlock", Reference::to("VpcCidr"))
            .with("EnableDnsSupport", true);

        assert_eq!(vpc.kind.as_str(), "AWS::EC2::VPC");
        assert_eq!(vpc.properties.len(), 2);
        assert_eq!(
            vpc.property("CidrBlock"),
            Some(&PropertyValue::Ref(Reference::to("VpcCidr")))
        );
    }

    #[test]
    fn test_with_replaces_value_in_place() {
        let subnet = Resource::new(kinds::EC2_SUBNET)
            .with("CidrBlock", "10.0.0.0/24")
            .with("AvailabilityZone", "ap-northeast-1b")
            .with("CidrBlock", "10.0.1.0/24");

        let keys: Vec<&str> = subnet.properties.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["CidrBlock", "AvailabilityZone"]);
        assert_eq!(
            subnet.property("CidrBlock").and_then(PropertyValue::as_str),
            Some("10.0.1.0/24")
        );
    }
}
