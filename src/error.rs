use crate::graph::PortRole;
use thiserror::Error;

/// Failures reported by a [`Gateway`](crate::gateway::Gateway) implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Resource '{0}' was not found")]
    NotFound(String),

    #[error("Request was rejected by the service: {0}")]
    Rejected(String),

    #[error("Authorization failed for workspace '{0}'")]
    Unauthorized(String),

    #[error("Workspace '{0}' does not exist")]
    WorkspaceNotFound(String),

    #[error("Transport failure: {0}")]
    Transport(String),
}

/// Errors surfaced by the experiment SDK.
#[derive(Error, Debug)]
pub enum StudioError {
    #[error("Experiment '{0}' was not found")]
    ExperimentNotFound(String),

    #[error("Malformed experiment document: {0}")]
    MalformedDocument(String),

    #[error("Failed to persist experiment '{experiment_id}': {source}")]
    PersistenceError {
        experiment_id: String,
        #[source]
        source: GatewayError,
    },

    #[error("Destination workspace '{workspace_id}' rejected the transfer: {reason}")]
    UnpackError {
        workspace_id: String,
        reason: String,
    },

    #[error("{phase} activity '{activity_id}' did not complete after {attempts} polls")]
    CopyTimeout {
        phase: CopyPhase,
        activity_id: String,
        attempts: u32,
    },

    #[error("Copy of experiment '{0}' was cancelled")]
    Cancelled(String),

    #[error("A module node with id '{0}' already exists")]
    DuplicateNodeId(String),

    #[error("No module node has the comment '{0}'")]
    ModuleNotFound(String),

    #[error("Module node '{comment}' has no {role} port")]
    PortNotFound { comment: String, role: PortRole },

    #[error("No module node '{comment}' has a parameter named '{parameter}'")]
    ParameterNotFound { comment: String, parameter: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// The two polling phases of a cross-workspace copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyPhase {
    Pack,
    Unpack,
}

impl std::fmt::Display for CopyPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CopyPhase::Pack => write!(f, "Pack"),
            CopyPhase::Unpack => write!(f, "Unpack"),
        }
    }
}

impl StudioError {
    /// Maps a gateway failure on a read of `experiment_id`.
    ///
    /// Authorization, transport and unknown-workspace failures pass through unchanged.
    pub(crate) fn on_fetch(experiment_id: &str, error: GatewayError) -> Self {
        match error {
            GatewayError::NotFound(_) | GatewayError::Rejected(_) => {
                StudioError::ExperimentNotFound(experiment_id.to_string())
            }
            other => StudioError::Gateway(other),
        }
    }

    /// Maps a gateway failure on a request that acts on `experiment_id`, such
    /// as a run or a pack. Only `NotFound` means the experiment is missing; a
    /// rejection passes through unchanged.
    pub(crate) fn on_request(experiment_id: &str, error: GatewayError) -> Self {
        match error {
            GatewayError::NotFound(_) => StudioError::ExperimentNotFound(experiment_id.to_string()),
            other => StudioError::Gateway(other),
        }
    }

    /// Maps a gateway failure on a write of `experiment_id`.
    pub(crate) fn on_persist(experiment_id: &str, error: GatewayError) -> Self {
        match error {
            GatewayError::NotFound(_) | GatewayError::Rejected(_) => StudioError::PersistenceError {
                experiment_id: experiment_id.to_string(),
                source: error,
            },
            other => StudioError::Gateway(other),
        }
    }
}
