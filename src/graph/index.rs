use super::model::{ExperimentDocument, GraphSection};
use super::port::{PortRef, PortRole};
use ahash::AHashMap;
use std::fmt;

/// Lookup tables over one [`GraphSection`], built per mutation call.
///
/// Comments are not unique: the node index keeps the first node carrying each
/// comment. Use [`GraphIndex::all_by_comment`] when every match matters.
pub struct GraphIndex<'a> {
    graph: &'a GraphSection,
    by_comment: AHashMap<&'a str, usize>,
    by_id: AHashMap<&'a str, usize>,
    ports: AHashMap<&'a str, Vec<(&'a str, PortRole)>>,
}

impl<'a> GraphIndex<'a> {
    pub fn build(graph: &'a GraphSection) -> Self {
        let mut by_comment = AHashMap::new();
        let mut by_id = AHashMap::new();
        let mut ports: AHashMap<&'a str, Vec<(&'a str, PortRole)>> = AHashMap::new();

        for (position, node) in graph.module_nodes.iter().enumerate() {
            if let Some(comment) = node.comment() {
                by_comment.entry(comment).or_insert(position);
            }
            by_id.entry(node.id.as_str()).or_insert(position);

            let node_ports = ports.entry(node.id.as_str()).or_default();
            node_ports.extend(
                node.input_ports()
                    .iter()
                    .map(|p| (p.name.as_str(), PortRole::Input)),
            );
            node_ports.extend(
                node.output_ports()
                    .iter()
                    .map(|p| (p.name.as_str(), PortRole::Output)),
            );
        }

        log::debug!(
            "Indexed {} distinct comments and {} node ids",
            by_comment.len(),
            by_id.len()
        );

        Self {
            graph,
            by_comment,
            by_id,
            ports,
        }
    }

    /// Position of the first node whose `Comment` equals `comment`.
    pub fn first_by_comment(&self, comment: &str) -> Option<usize> {
        self.by_comment.get(comment).copied()
    }

    /// Positions of every node whose `Comment` equals `comment`, in document order.
    pub fn all_by_comment(&self, comment: &str) -> Vec<usize> {
        self.graph
            .module_nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.comment() == Some(comment))
            .map(|(position, _)| position)
            .collect()
    }

    pub fn by_id(&self, node_id: &str) -> Option<usize> {
        self.by_id.get(node_id).copied()
    }

    /// Reference to the first port of the given direction on the node at `position`.
    pub fn first_port(&self, position: usize, role: PortRole) -> Option<PortRef> {
        let node = self.graph.module_nodes.get(position)?;
        let ports = match role {
            PortRole::Input => node.input_ports(),
            PortRole::Output => node.output_ports(),
        };
        ports.first().map(|port| PortRef::new(&node.id, &port.name))
    }

    pub fn has_port(&self, port: &PortRef, role: PortRole) -> bool {
        self.ports
            .get(port.node_id.as_str())
            .is_some_and(|ports| {
                ports
                    .iter()
                    .any(|(name, r)| *name == port.port_name && *r == role)
            })
    }
}

/// A structural problem found by [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphIssue {
    DuplicateNodeId(String),
    MalformedPortId {
        edge: usize,
        port_id: String,
    },
    DanglingPort {
        edge: usize,
        port: PortRef,
        role: PortRole,
    },
}

impl fmt::Display for GraphIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphIssue::DuplicateNodeId(id) => write!(f, "node id '{}' is used more than once", id),
            GraphIssue::MalformedPortId { edge, port_id } => {
                write!(f, "edge #{} has malformed port id '{}'", edge, port_id)
            }
            GraphIssue::DanglingPort { edge, port, role } => write!(
                f,
                "edge #{} references {} port '{}' which does not exist",
                edge, role, port
            ),
        }
    }
}

/// Checks node id uniqueness and that every edge endpoint names an existing
/// port of the right direction.
pub fn validate(document: &ExperimentDocument) -> Vec<GraphIssue> {
    let graph = &document.graph;
    let index = GraphIndex::build(graph);
    let mut issues = Vec::new();

    for (position, node) in graph.module_nodes.iter().enumerate() {
        if index.by_id(&node.id) != Some(position) {
            issues.push(GraphIssue::DuplicateNodeId(node.id.clone()));
        }
    }

    for (edge_position, edge) in graph.edges.iter().enumerate() {
        let endpoints = [
            (&edge.source_output_port_id, PortRole::Output),
            (&edge.destination_input_port_id, PortRole::Input),
        ];
        for (port_id, role) in endpoints {
            match PortRef::parse(port_id) {
                Some(port) if index.has_port(&port, role) => {}
                Some(port) => issues.push(GraphIssue::DanglingPort {
                    edge: edge_position,
                    port,
                    role,
                }),
                None => issues.push(GraphIssue::MalformedPortId {
                    edge: edge_position,
                    port_id: port_id.clone(),
                }),
            }
        }
    }

    issues
}
