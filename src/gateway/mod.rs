//! The remote collaborator contract: everything this crate needs from the
//! Studio service, plus the wire types exchanged with it.
//!
//! Transport, authentication and retries belong to the implementation. The
//! crate ships [`memory::MemoryGateway`], an in-process implementation.

pub mod memory;

use crate::error::GatewayError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::path::Path;

/// Terminal status of an [`Activity`].
pub const ACTIVITY_COMPLETE: &str = "Complete";

/// Identifies and authorizes a workspace. Acts as the scope of every gateway call.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WorkspaceSettings {
    pub workspace_id: String,
    pub authorization_token: String,
    /// Region of the workspace, e.g. `"South Central US"`.
    pub location: String,
}

impl WorkspaceSettings {
    pub fn new(
        workspace_id: impl Into<String>,
        authorization_token: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            authorization_token: authorization_token.into(),
            location: location.into(),
        }
    }
}

impl fmt::Debug for WorkspaceSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkspaceSettings")
            .field("workspace_id", &self.workspace_id)
            .field("authorization_token", &"<redacted>")
            .field("location", &self.location)
            .finish()
    }
}

/// Run status attached to an experiment summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ExperimentStatus {
    pub status_code: String,
    pub status_detail: String,
}

/// The typed summary returned alongside an experiment's raw document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ExperimentSummary {
    pub experiment_id: String,
    pub description: String,
    pub etag: String,
    pub creator: String,
    pub is_archived: bool,
    pub status: Option<ExperimentStatus>,
}

impl ExperimentSummary {
    pub fn new(experiment_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            experiment_id: experiment_id.into(),
            description: description.into(),
            ..Self::default()
        }
    }
}

impl AsRef<str> for ExperimentSummary {
    fn as_ref(&self) -> &str {
        &self.experiment_id
    }
}

/// A remote long-running operation, tracked by polling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Activity {
    pub activity_id: String,
    pub status: String,
    /// Transfer handle, set once a pack activity completes.
    #[serde(default)]
    pub location: Option<String>,
}

impl Activity {
    pub fn is_complete(&self) -> bool {
        self.status == ACTIVITY_COMPLETE
    }
}

/// Which workspace an activity status request is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivitySide {
    Source,
    Destination,
}

impl ActivitySide {
    pub fn is_source(self) -> bool {
        self == ActivitySide::Source
    }
}

/// Data formats accepted for resource uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceFormat {
    #[serde(rename = "GenericCSV")]
    GenericCsv,
    #[serde(rename = "GenericCSVNoHeader")]
    GenericCsvNoHeader,
    #[serde(rename = "GenericTSV")]
    GenericTsv,
    #[serde(rename = "GenericTSVNoHeader")]
    GenericTsvNoHeader,
    #[serde(rename = "ARFF")]
    Arff,
    Zip,
    RData,
    PlainText,
}

impl ResourceFormat {
    /// Name of the format as the service spells it.
    pub fn wire_name(self) -> &'static str {
        match self {
            ResourceFormat::GenericCsv => "GenericCSV",
            ResourceFormat::GenericCsvNoHeader => "GenericCSVNoHeader",
            ResourceFormat::GenericTsv => "GenericTSV",
            ResourceFormat::GenericTsvNoHeader => "GenericTSVNoHeader",
            ResourceFormat::Arff => "ARFF",
            ResourceFormat::Zip => "Zip",
            ResourceFormat::RData => "RData",
            ResourceFormat::PlainText => "PlainText",
        }
    }
}

impl fmt::Display for ResourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Confirmation of a finished upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub resource_id: String,
    pub name: String,
    pub format: ResourceFormat,
    pub size_bytes: u64,
}

/// Operations the SDK consumes from the Studio service.
pub trait Gateway {
    /// Fetches an experiment's summary together with its raw document text.
    fn get_experiment_by_id(
        &self,
        scope: &WorkspaceSettings,
        experiment_id: &str,
    ) -> Result<(ExperimentSummary, String), GatewayError>;

    fn list_experiments(
        &self,
        scope: &WorkspaceSettings,
    ) -> Result<Vec<ExperimentSummary>, GatewayError>;

    /// Overwrites the experiment identified by `summary`.
    fn save_experiment(
        &self,
        scope: &WorkspaceSettings,
        summary: &ExperimentSummary,
        raw_document: &str,
    ) -> Result<(), GatewayError>;

    /// Stores the document as a new experiment named `new_name`.
    fn save_experiment_as(
        &self,
        scope: &WorkspaceSettings,
        summary: &ExperimentSummary,
        raw_document: &str,
        new_name: &str,
    ) -> Result<(), GatewayError>;

    fn remove_experiment_by_id(
        &self,
        scope: &WorkspaceSettings,
        experiment_id: &str,
    ) -> Result<(), GatewayError>;

    fn run_experiment(
        &self,
        scope: &WorkspaceSettings,
        summary: &ExperimentSummary,
        raw_document: &str,
    ) -> Result<(), GatewayError>;

    fn pack_experiment(
        &self,
        scope: &WorkspaceSettings,
        experiment_id: &str,
    ) -> Result<Activity, GatewayError>;

    fn unpack_experiment(
        &self,
        scope: &WorkspaceSettings,
        transfer_handle: &str,
        target_region: &str,
    ) -> Result<Activity, GatewayError>;

    fn get_activity_status(
        &self,
        scope: &WorkspaceSettings,
        activity_id: &str,
        side: ActivitySide,
    ) -> Result<Activity, GatewayError>;

    /// Uploads a local file. The returned future resolves once the service
    /// has accepted the resource.
    fn upload_resource(
        &self,
        scope: &WorkspaceSettings,
        format: ResourceFormat,
        path: &Path,
    ) -> impl Future<Output = Result<UploadReceipt, GatewayError>> + Send;
}
