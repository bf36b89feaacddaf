//! Label-based edits of an experiment graph.
//!
//! Every operation works on a freshly parsed [`ExperimentDocument`] and is
//! computed entirely in memory; persisting the result is the caller's job
//! (see [`StudioClient`](crate::client::StudioClient)).

mod edge;
mod module;
mod parameter;

pub use edge::{EdgeRewire, rewire_edge};
pub use module::{ModuleAdded, NEW_MODULE_COMMENT, add_module};
pub use parameter::{ParameterEdit, set_parameter};

use crate::config::MutationPolicy;
use crate::error::StudioError;
use crate::graph::ExperimentDocument;

pub const MODIFIED_PARAMETER_TAG: &str = "[Modified Parameter] ";
pub const MODIFIED_EDGE_TAG: &str = "[Modified Edge] ";
pub const ADDED_MODULE_TAG: &str = "[Added Module] ";

/// One graph edit, addressed by node comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    SetParameter {
        comment: String,
        parameter: String,
        value: String,
    },
    RewireEdge {
        source_comment: String,
        destination_comment: String,
    },
    AddModule {
        node_id: String,
        comment: Option<String>,
    },
}

/// What a [`Mutation`] changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Parameter(ParameterEdit),
    Edge(EdgeRewire),
    Module(ModuleAdded),
}

impl MutationOutcome {
    /// Number of graph elements the mutation touched.
    pub fn changes(&self) -> usize {
        match self {
            MutationOutcome::Parameter(edit) => edit.parameters_updated,
            MutationOutcome::Edge(rewire) => rewire.edges_rewired,
            MutationOutcome::Module(_) => 1,
        }
    }
}

impl Mutation {
    pub fn set_parameter(
        comment: impl Into<String>,
        parameter: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Mutation::SetParameter {
            comment: comment.into(),
            parameter: parameter.into(),
            value: value.into(),
        }
    }

    pub fn rewire_edge(
        source_comment: impl Into<String>,
        destination_comment: impl Into<String>,
    ) -> Self {
        Mutation::RewireEdge {
            source_comment: source_comment.into(),
            destination_comment: destination_comment.into(),
        }
    }

    pub fn add_module(node_id: impl Into<String>) -> Self {
        Mutation::AddModule {
            node_id: node_id.into(),
            comment: None,
        }
    }

    /// Prefix put in front of a save-as name for this kind of edit.
    pub fn tag(&self) -> &'static str {
        match self {
            Mutation::SetParameter { .. } => MODIFIED_PARAMETER_TAG,
            Mutation::RewireEdge { .. } => MODIFIED_EDGE_TAG,
            Mutation::AddModule { .. } => ADDED_MODULE_TAG,
        }
    }

    /// Applies the edit to `document` in place.
    pub fn apply(
        &self,
        document: &mut ExperimentDocument,
        policy: &MutationPolicy,
    ) -> Result<MutationOutcome, StudioError> {
        match self {
            Mutation::SetParameter {
                comment,
                parameter,
                value,
            } => set_parameter(document, comment, parameter, value, policy)
                .map(MutationOutcome::Parameter),
            Mutation::RewireEdge {
                source_comment,
                destination_comment,
            } => rewire_edge(
                document,
                source_comment,
                destination_comment,
                policy.edge_ordering,
            )
            .map(MutationOutcome::Edge),
            Mutation::AddModule { node_id, comment } => {
                add_module(document, node_id, comment.as_deref(), policy)
                    .map(MutationOutcome::Module)
            }
        }
    }
}
