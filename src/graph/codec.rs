use super::model::ExperimentDocument;
use crate::error::StudioError;
use serde_json::Value;

pub const GRAPH_KEY: &str = "Graph";
pub const MODULE_NODES_KEY: &str = "ModuleNodes";
pub const EDGES_KEY: &str = "EdgesInternal";

/// Parses raw document text into an [`ExperimentDocument`].
///
/// The section shape is checked before typed decoding so a document missing
/// `Graph`, `ModuleNodes` or `EdgesInternal` fails with a message naming the
/// section rather than a generic decoder error.
pub fn parse(raw: &str) -> Result<ExperimentDocument, StudioError> {
    let tree: Value = serde_json::from_str(raw)
        .map_err(|e| StudioError::MalformedDocument(format!("document is not valid JSON: {}", e)))?;
    check_sections(&tree)?;

    let document: ExperimentDocument = serde_json::from_value(tree)
        .map_err(|e| StudioError::MalformedDocument(e.to_string()))?;
    log::debug!(
        "Parsed experiment document: {} module nodes, {} edges",
        document.graph.module_nodes.len(),
        document.graph.edges.len()
    );
    Ok(document)
}

/// Serializes a document back to compact wire text.
pub fn serialize(document: &ExperimentDocument) -> Result<String, StudioError> {
    serde_json::to_string(document).map_err(|e| {
        StudioError::MalformedDocument(format!("document could not be serialized: {}", e))
    })
}

fn check_sections(tree: &Value) -> Result<(), StudioError> {
    let root = tree
        .as_object()
        .ok_or_else(|| malformed("document root is not an object"))?;
    let graph = root
        .get(GRAPH_KEY)
        .ok_or_else(|| malformed(&format!("missing `{}` section", GRAPH_KEY)))?
        .as_object()
        .ok_or_else(|| malformed(&format!("`{}` is not an object", GRAPH_KEY)))?;

    for key in [MODULE_NODES_KEY, EDGES_KEY] {
        match graph.get(key) {
            Some(Value::Array(_)) => {}
            Some(_) => return Err(malformed(&format!("`{}.{}` is not an array", GRAPH_KEY, key))),
            None => return Err(malformed(&format!("missing `{}.{}` section", GRAPH_KEY, key))),
        }
    }
    Ok(())
}

fn malformed(message: &str) -> StudioError {
    StudioError::MalformedDocument(message.to_string())
}
