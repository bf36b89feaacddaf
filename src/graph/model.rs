use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// A wire field that may be missing, explicitly `null`, or carry a value.
///
/// Studio documents are inconsistent about optional fields, so the model keeps
/// all three states apart and writes back exactly what it read.
#[derive(Debug, Clone, PartialEq)]
pub enum Nullable<T> {
    Absent,
    Null,
    Present(T),
}

impl<T> Default for Nullable<T> {
    fn default() -> Self {
        Nullable::Absent
    }
}

impl<T> Nullable<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Nullable::Absent)
    }

    pub fn as_ref(&self) -> Option<&T> {
        match self {
            Nullable::Present(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_mut(&mut self) -> Option<&mut T> {
        match self {
            Nullable::Present(value) => Some(value),
            _ => None,
        }
    }
}

impl<T: Serialize> Serialize for Nullable<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Nullable::Present(value) => value.serialize(serializer),
            _ => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Nullable<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(|value| match value {
            Some(value) => Nullable::Present(value),
            None => Nullable::Null,
        })
    }
}

/// The full experiment document as exchanged with the service.
///
/// Only `Graph` is typed; every other root key is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentDocument {
    #[serde(rename = "Graph")]
    pub graph: GraphSection,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `Graph` sub-tree: module nodes and the internal edge list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSection {
    #[serde(rename = "ModuleNodes")]
    pub module_nodes: Vec<ModuleNode>,
    #[serde(rename = "EdgesInternal")]
    pub edges: Vec<Edge>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One processing step of an experiment graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleNode {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(
        rename = "Comment",
        default,
        skip_serializing_if = "Nullable::is_absent"
    )]
    pub comment: Nullable<String>,
    #[serde(
        rename = "ModuleParameters",
        default,
        skip_serializing_if = "Nullable::is_absent"
    )]
    pub parameters: Nullable<Vec<ModuleParameter>>,
    #[serde(
        rename = "InputPortsInternal",
        default,
        skip_serializing_if = "Nullable::is_absent"
    )]
    pub input_ports: Nullable<Vec<Port>>,
    #[serde(
        rename = "OutputPortsInternal",
        default,
        skip_serializing_if = "Nullable::is_absent"
    )]
    pub output_ports: Nullable<Vec<Port>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ModuleNode {
    /// Creates a bare node with empty parameter and port collections.
    pub fn new(id: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            comment: Nullable::Present(comment.into()),
            parameters: Nullable::Present(Vec::new()),
            input_ports: Nullable::Present(Vec::new()),
            output_ports: Nullable::Present(Vec::new()),
            extra: Map::new(),
        }
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_ref().map(String::as_str)
    }

    pub fn parameters(&self) -> &[ModuleParameter] {
        self.parameters.as_ref().map_or(&[], Vec::as_slice)
    }

    pub fn input_ports(&self) -> &[Port] {
        self.input_ports.as_ref().map_or(&[], Vec::as_slice)
    }

    pub fn output_ports(&self) -> &[Port] {
        self.output_ports.as_ref().map_or(&[], Vec::as_slice)
    }

    /// Looks up a parameter value by name.
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters()
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.value.as_ref())
    }
}

/// A named module parameter. `Value` is usually a string on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleParameter {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value", default, skip_serializing_if = "Nullable::is_absent")]
    pub value: Nullable<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An input or output port descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A connection from a producer's output port to a consumer's input port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(rename = "SourceOutputPortId")]
    pub source_output_port_id: String,
    #[serde(rename = "DestinationInputPortId")]
    pub destination_input_port_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Edge {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source_output_port_id: source.into(),
            destination_input_port_id: destination.into(),
            extra: Map::new(),
        }
    }
}
