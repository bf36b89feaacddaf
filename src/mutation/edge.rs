use crate::config::EdgeOrdering;
use crate::error::StudioError;
use crate::graph::{ExperimentDocument, GraphIndex, PortRef, PortRole};
use itertools::Itertools;

/// Result of [`rewire_edge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeRewire {
    /// The output port every matched edge now starts from.
    pub source: PortRef,
    /// The input port that selected the edges.
    pub destination: PortRef,
    pub edges_rewired: usize,
    /// Matched edges taken out of the list by [`EdgeOrdering::LastMatchAppended`].
    pub edges_dropped: usize,
}

/// Points every edge entering `destination_comment`'s first input port at
/// `source_comment`'s first output port.
///
/// Both nodes are resolved before anything is touched, so a lookup failure
/// leaves the document unchanged. Edges that do not enter the destination port
/// keep their relative order; where the matched edges end up depends on `ordering`.
pub fn rewire_edge(
    document: &mut ExperimentDocument,
    source_comment: &str,
    destination_comment: &str,
    ordering: EdgeOrdering,
) -> Result<EdgeRewire, StudioError> {
    let (source, destination) = {
        let index = GraphIndex::build(&document.graph);
        let destination = resolve_port(&index, destination_comment, PortRole::Input)?;
        let source = resolve_port(&index, source_comment, PortRole::Output)?;
        (source, destination)
    };

    let destination_id = destination.compound_id();
    let source_id = source.compound_id();
    let edges = &mut document.graph.edges;

    let matched = edges
        .iter()
        .positions(|edge| edge.destination_input_port_id == destination_id)
        .collect_vec();
    for &position in &matched {
        edges[position].source_output_port_id = source_id.clone();
    }

    let mut edges_dropped = 0;
    if let Some(&last) = matched.last() {
        match ordering {
            EdgeOrdering::LastMatchAppended => {
                let edge = edges.remove(last);
                edges.retain(|e| e.destination_input_port_id != destination_id);
                edges.push(edge);
                edges_dropped = matched.len() - 1;
            }
            EdgeOrdering::KeepMatchesMoveLast => {
                let edge = edges.remove(last);
                edges.push(edge);
            }
            EdgeOrdering::Preserve => {}
        }
    }
    if edges_dropped > 0 {
        log::warn!(
            "Dropped {} earlier edge(s) into {}; only the last one was kept",
            edges_dropped,
            destination_id
        );
    }

    if matched.is_empty() {
        log::warn!(
            "No edge enters '{}' ({}); nothing was rewired",
            destination_comment,
            destination_id
        );
    } else {
        log::debug!(
            "Rewired {} edge(s) into {} to start at {}",
            matched.len(),
            destination_id,
            source_id
        );
    }

    Ok(EdgeRewire {
        source,
        destination,
        edges_rewired: matched.len(),
        edges_dropped,
    })
}

fn resolve_port(index: &GraphIndex<'_>, comment: &str, role: PortRole) -> Result<PortRef, StudioError> {
    let position = index
        .first_by_comment(comment)
        .ok_or_else(|| StudioError::ModuleNotFound(comment.to_string()))?;
    index
        .first_port(position, role)
        .ok_or_else(|| StudioError::PortNotFound {
            comment: comment.to_string(),
            role,
        })
}
