use crate::config::MutationPolicy;
use crate::error::StudioError;
use crate::graph::{ExperimentDocument, GraphIndex, ModuleNode};

/// Comment given to modules created by [`add_module`] unless one is supplied.
pub const NEW_MODULE_COMMENT: &str = "New module";

/// Result of [`add_module`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleAdded {
    pub node_id: String,
    /// Position of the new node in `ModuleNodes`.
    pub position: usize,
}

/// Appends an empty module node with the caller-supplied id.
pub fn add_module(
    document: &mut ExperimentDocument,
    node_id: &str,
    comment: Option<&str>,
    policy: &MutationPolicy,
) -> Result<ModuleAdded, StudioError> {
    if policy.reject_duplicate_ids && GraphIndex::build(&document.graph).by_id(node_id).is_some() {
        return Err(StudioError::DuplicateNodeId(node_id.to_string()));
    }

    let nodes = &mut document.graph.module_nodes;
    nodes.push(ModuleNode::new(
        node_id,
        comment.unwrap_or(NEW_MODULE_COMMENT),
    ));

    Ok(ModuleAdded {
        node_id: node_id.to_string(),
        position: nodes.len() - 1,
    })
}
