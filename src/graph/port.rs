use std::fmt;

/// Separator between node id and port name in compound port ids.
pub const PORT_SEPARATOR: char = ':';

/// Which end of an edge a port can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortRole {
    /// An input port, referenced by `DestinationInputPortId`.
    Input,
    /// An output port, referenced by `SourceOutputPortId`.
    Output,
}

impl fmt::Display for PortRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortRole::Input => write!(f, "input"),
            PortRole::Output => write!(f, "output"),
        }
    }
}

/// A `(nodeId, portName)` pair, rendered on the wire as `"<nodeId>:<portName>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortRef {
    pub node_id: String,
    pub port_name: String,
}

impl PortRef {
    pub fn new(node_id: impl Into<String>, port_name: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            port_name: port_name.into(),
        }
    }

    /// Splits a compound id at the first separator. Returns `None` when there is none.
    pub fn parse(compound: &str) -> Option<Self> {
        compound
            .split_once(PORT_SEPARATOR)
            .map(|(node_id, port_name)| Self::new(node_id, port_name))
    }

    pub fn compound_id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.node_id, PORT_SEPARATOR, self.port_name)
    }
}
