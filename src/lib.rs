//! # studio-graph - Experiment graph SDK for Studio workspaces
//!
//! **studio-graph** edits the JSON experiment documents of a Studio workspace
//! and moves experiments between workspaces. Graph edits address modules by
//! their human-readable comment instead of their opaque ids.
//!
//! ## Core Workflow
//!
//! 1.  **Pick a Gateway**: Implement [`gateway::Gateway`] over your transport, or use
//!     the in-process [`gateway::memory::MemoryGateway`].
//! 2.  **Build a Client**: `StudioClient::builder(gateway)`, optionally fed from a
//!     [`config::StudioConfig`] file.
//! 3.  **Edit**: `set_parameter`, `rewire_edge` and `add_module` fetch the document,
//!     apply the edit in memory and persist it, either in place or as a tagged copy.
//! 4.  **Move**: `copy_experiment` packs an experiment in one workspace and unpacks
//!     it in another, polling both activities under a [`config::PollPolicy`].
//!
//! ## Quick Start
//!
//! ```rust
//! use studio_graph::gateway::memory::MemoryGateway;
//! use studio_graph::prelude::*;
//!
//! fn main() -> Result<(), StudioError> {
//!     let workspace = WorkspaceSettings::new("ws-1", "token", "South Central US");
//!     let gateway = MemoryGateway::new().with_workspace(&workspace);
//!     gateway.insert_experiment(
//!         &workspace,
//!         ExperimentSummary::new("exp-1", "Churn"),
//!         r#"{"ExperimentId":"exp-1","Description":"Churn","Graph":{
//!             "ModuleNodes":[{"Id":"n1","Comment":"Split",
//!                 "ModuleParameters":[{"Name":"Fraction","Value":"0.5"}],
//!                 "InputPortsInternal":[],"OutputPortsInternal":[]}],
//!             "EdgesInternal":[]}}"#,
//!     )?;
//!
//!     let client = StudioClient::new(gateway);
//!     let edit = client.set_parameter(&workspace, "exp-1", "Split", "Fraction", "0.7", "v2")?;
//!     assert_eq!(edit.parameters_updated, 1);
//!
//!     let copies = client.list_experiments(&workspace)?;
//!     assert!(copies.iter().any(|e| e.description == "[Modified Parameter] v2"));
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod copy;
pub mod error;
pub mod gateway;
pub mod graph;
pub mod mutation;
pub mod prelude;
