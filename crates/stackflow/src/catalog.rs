//! Built-in stacks
//!
//! Each stack is a list of entity specifications that [`StackSpec::into_graph`]
//! feeds into a [`ResourceGraph`] in declaration order.

use stackflow_core::{
    GraphError, Output, Parameter, PropertyValue, Resource, ResourceGraph, kinds, reference,
};

pub struct StackSpec {
    /// Catalog key used on the command line
    pub key: &'static str,

    /// Stack name used when none is given
    pub default_stack_name: &'static str,

    pub summary: &'static str,
    pub description: Option<&'static str>,
    pub parameters: Vec<(&'static str, Parameter)>,
    pub resources: Vec<(&'static str, Resource)>,
    pub outputs: Vec<(&'static str, Output)>,
}

impl StackSpec {
    pub fn into_graph(self, stack_name: Option<&str>) -> Result<ResourceGraph, GraphError> {
        let mut graph = ResourceGraph::new(stack_name.unwrap_or(self.default_stack_name));
        if let Some(description) = self.description {
            graph = graph.with_description(description);
        }
        for (name, parameter) in self.parameters {
            graph.add_parameter(name, parameter)?;
        }
        for (name, resource) in self.resources {
            graph.add(name, resource)?;
        }
        for (name, output) in self.outputs {
            graph.add_output(name, output)?;
        }
        Ok(graph)
    }
}

/// All built-in stacks, in display order
pub fn all() -> Vec<StackSpec> {
    vec![sample(), vpc()]
}

pub fn find(key: &str) -> Option<StackSpec> {
    all().into_iter().find(|spec| spec.key == key)
}

pub fn keys() -> Vec<&'static str> {
    all().iter().map(|spec| spec.key).collect()
}

fn vpc_resource() -> Resource {
    Resource::new(kinds::EC2_VPC)
        .with("CidrBlock", reference("VpcCidr"))
        .with("EnableDnsSupport", true)
        .with("EnableDnsHostnames", true)
}

fn sample() -> StackSpec {
    StackSpec {
        key: "sample",
        default_stack_name: "sample-stack",
        summary: "Single VPC with DNS support",
        description: None,
        parameters: vec![("VpcCidr", Parameter::string())],
        resources: vec![("VPC", vpc_resource())],
        outputs: vec![],
    }
}

fn subnet(availability_zone: &str, cidr_block: &str) -> Resource {
    Resource::new(kinds::EC2_SUBNET)
        .with("VpcId", reference("VPC"))
        .with("AvailabilityZone", availability_zone)
        .with("CidrBlock", cidr_block)
}

fn network_acl_entry(rule_number: i32, egress: bool, from: i32, to: i32) -> Resource {
    Resource::new(kinds::EC2_NETWORK_ACL_ENTRY)
        .with("NetworkAclId", reference("PublicNetworkAcl"))
        .with("RuleNumber", rule_number)
        .with("Protocol", 6)
        .with("RuleAction", "allow")
        .with("Egress", egress)
        .with("CidrBlock", "0.0.0.0/0")
        .with("PortRange", PropertyValue::map([("From", from), ("To", to)]))
}

fn subnet_route_table_association(subnet: &str) -> Resource {
    Resource::new(kinds::EC2_SUBNET_ROUTE_TABLE_ASSOCIATION)
        .with("SubnetId", reference(subnet))
        .with("RouteTableId", reference("PublicRouteTable"))
}

fn subnet_network_acl_association(subnet: &str) -> Resource {
    Resource::new(kinds::EC2_SUBNET_NETWORK_ACL_ASSOCIATION)
        .with("SubnetId", reference(subnet))
        .with("NetworkAclId", reference("PublicNetworkAcl"))
}

fn vpc() -> StackSpec {
    StackSpec {
        key: "vpc",
        default_stack_name: "vpc-stack",
        summary: "Public VPC with two subnets, internet gateway and network ACL",
        description: Some("Sample CloudFormation Stack"),
        parameters: vec![("VpcCidr", Parameter::string())],
        resources: vec![
            ("VPC", vpc_resource()),
            ("Subnet1", subnet("ap-northeast-1b", "10.0.0.0/24")),
            ("Subnet2", subnet("ap-northeast-1c", "10.0.2.0/24")),
            ("InternetGateway", Resource::new(kinds::EC2_INTERNET_GATEWAY)),
            (
                "VPCGatewayAttachment",
                Resource::new(kinds::EC2_VPC_GATEWAY_ATTACHMENT)
                    .with("VpcId", reference("VPC"))
                    .with("InternetGatewayId", reference("InternetGateway")),
            ),
            (
                "PublicRouteTable",
                Resource::new(kinds::EC2_ROUTE_TABLE).with("VpcId", reference("VPC")),
            ),
            (
                "PublicRoute",
                // The gateway must be attached before a route can target it
                Resource::new(kinds::EC2_ROUTE)
                    .with("RouteTableId", reference("PublicRouteTable"))
                    .with("DestinationCidrBlock", "0.0.0.0/0")
                    .with("GatewayId", reference("InternetGateway"))
                    .depends_on("VPCGatewayAttachment"),
            ),
            (
                "Subnet1RouteTableAssociation",
                subnet_route_table_association("Subnet1"),
            ),
            (
                "Subnet2RouteTableAssociation",
                subnet_route_table_association("Subnet2"),
            ),
            (
                "PublicNetworkAcl",
                Resource::new(kinds::EC2_NETWORK_ACL).with("VpcId", reference("VPC")),
            ),
            (
                "InboundHTTPPublicNetworkAclEntry",
                network_acl_entry(100, false, 80, 80),
            ),
            (
                "InboundSSHPublicNetworkAclEntry",
                network_acl_entry(102, false, 22, 22),
            ),
            (
                "InboundEphemeralPublicNetworkAclEntry",
                network_acl_entry(103, false, 1024, 65535),
            ),
            (
                "OutboundPublicNetworkAclEntry",
                network_acl_entry(100, true, 0, 65535),
            ),
            (
                "Subnet1NetworkAclAssociation",
                subnet_network_acl_association("Subnet1"),
            ),
            (
                "Subnet2NetworkAclAssociation",
                subnet_network_acl_association("Subnet2"),
            ),
            (
                "DHCPOptions",
                Resource::new(kinds::EC2_DHCP_OPTIONS)
                    .with("DomainName", "ap-northeast-1.compute.internal")
                    .with(
                        "DomainNameServers",
                        PropertyValue::list(["AmazonProvidedDNS"]),
                    ),
            ),
        ],
        outputs: vec![
            ("VpcId", Output::new(reference("VPC"))),
            ("Subnet1Id", Output::new(reference("Subnet1"))),
            ("Subnet2Id", Output::new(reference("Subnet2"))),
        ],
    }
}
