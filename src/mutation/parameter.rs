use crate::config::MutationPolicy;
use crate::error::StudioError;
use crate::graph::{ExperimentDocument, GraphIndex, Nullable};
use serde_json::Value;

/// Result of [`set_parameter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterEdit {
    /// Nodes whose comment matched.
    pub nodes_matched: usize,
    /// Parameters whose value was overwritten, across all matched nodes.
    pub parameters_updated: usize,
}

/// Overwrites `parameter` with `value` on every node labelled `comment`.
///
/// All nodes sharing the comment are edited, not only the first. A miss is a
/// no-op unless `policy.strict_lookup` is set.
pub fn set_parameter(
    document: &mut ExperimentDocument,
    comment: &str,
    parameter: &str,
    value: &str,
    policy: &MutationPolicy,
) -> Result<ParameterEdit, StudioError> {
    let targets = GraphIndex::build(&document.graph).all_by_comment(comment);

    let mut parameters_updated = 0;
    for &position in &targets {
        let node = &mut document.graph.module_nodes[position];
        let Some(parameters) = node.parameters.as_mut() else {
            continue;
        };
        for entry in parameters.iter_mut().filter(|p| p.name == parameter) {
            entry.value = Nullable::Present(Value::String(value.to_string()));
            parameters_updated += 1;
        }
    }

    let edit = ParameterEdit {
        nodes_matched: targets.len(),
        parameters_updated,
    };

    if parameters_updated == 0 {
        if policy.strict_lookup {
            return Err(if targets.is_empty() {
                StudioError::ModuleNotFound(comment.to_string())
            } else {
                StudioError::ParameterNotFound {
                    comment: comment.to_string(),
                    parameter: parameter.to_string(),
                }
            });
        }
        log::warn!(
            "set_parameter matched {} node(s) labelled '{}' but no parameter '{}'; nothing changed",
            edit.nodes_matched,
            comment,
            parameter
        );
    }

    Ok(edit)
}
