//! StackFlow Core
//!
//! Declarative model of a CloudFormation-style stack and its template renderer.
//!
//! A stack is described as a [`ResourceGraph`]: parameters, resources,
//! outputs and conditions keyed by unique logical names. Building the graph
//! is pure data manipulation; references between entities are validated
//! and turned into provider-native `Ref` / `Fn::GetAtt` nodes when the
//! graph is rendered with [`render`].
//!
//! ```
//! use stackflow_core::{Parameter, Resource, ResourceGraph, kinds, reference, render};
//!
//! let mut graph = ResourceGraph::new("sample-stack");
//! graph.add_parameter("VpcCidr", Parameter::string()).unwrap();
//! graph
//!     .add("VPC", Resource::new(kinds::EC2_VPC).with("CidrBlock", reference("VpcCidr")))
//!     .unwrap();
//! graph.add_output("VpcId", reference("VPC")).unwrap();
//!
//! let document = render(&graph).unwrap();
//! assert_eq!(
//!     document.pointer("/Resources/VPC/Properties/CidrBlock"),
//!     Some(&serde_json::json!({ "Ref": "VpcCidr" }))
//! );
//! ```

pub mod error;
pub mod graph;
pub mod model;
pub mod template;

// Re-exports
pub use error::{GraphError, RenderError, Result, UnresolvedReason, UnresolvedReference};
pub use graph::{DEFAULT_FORMAT_VERSION, ResourceGraph};
pub use model::{
    Condition, Entity, EntityKind, Output, Parameter, ParameterType, Properties, PropertyValue,
    Reference, Resource, ResourceTypeId, get_att, kinds, reference,
};
pub use template::{Document, render};
