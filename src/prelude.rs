//! Prelude module for convenient imports
//!
//! Re-exports the client, the gateway contract and the graph model.
//!
//! ```rust,no_run
//! use studio_graph::prelude::*;
//!
//! # fn run_example<G: Gateway>(client: StudioClient<G>) -> Result<(), StudioError> {
//! let source = WorkspaceSettings::new("ws-a", "token-a", "West Europe");
//! let destination = WorkspaceSettings::new("ws-b", "token-b", "West Europe");
//!
//! client.rewire_edge(&source, "exp-1", "Normalize", "Train Model", "")?;
//! client.copy_experiment(&source, "exp-1", &destination, &CancellationToken::new())?;
//! # Ok(())
//! # }
//! ```

// Client surface
pub use crate::client::{MutationReport, StudioClient, StudioClientBuilder};
pub use crate::copy::{CopyOrchestrator, CopyReport};
pub use crate::mutation::{Mutation, MutationOutcome};

// Configuration
pub use crate::config::{EdgeOrdering, MutationPolicy, PollPolicy, StudioConfig};

// Gateway contract and wire types
pub use crate::gateway::{
    Activity, ActivitySide, ExperimentSummary, Gateway, ResourceFormat, UploadReceipt,
    WorkspaceSettings,
};

// Graph model
pub use crate::graph::{Edge, ExperimentDocument, GraphSection, ModuleNode, PortRef, PortRole};

// Error types
pub use crate::error::{GatewayError, StudioError};

pub use tokio_util::sync::CancellationToken;
