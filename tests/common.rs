//! Common test utilities: experiment documents and a ready-made in-memory service.
use serde_json::{Value, json};
use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use studio_graph::gateway::memory::MemoryGateway;
use studio_graph::prelude::*;

pub const SOURCE_REGION: &str = "South Central US";

/// The experiment every scenario starts from.
pub const EXPERIMENT_ID: &str = "exp-0001";

/// Three modules, labelled "A", "B" and "C", with one edge `A -> B`.
///
/// A has an output port, B and C have one input and one output port each.
/// B carries a `Fraction` parameter, C carries none.
#[allow(dead_code)]
pub fn scenario_document() -> Value {
    json!({
        "ExperimentId": EXPERIMENT_ID,
        "Description": "Scenario",
        "Etag": "W/\"1\"",
        "Creator": "tests",
        "IsArchived": false,
        "Status": {"StatusCode": "Draft", "StatusDetail": "None"},
        "Graph": {
            "ModuleNodes": [
                {
                    "Id": "node-a",
                    "ModuleId": "module://reader",
                    "Comment": "A",
                    "ModuleParameters": [{"Name": "Source", "Value": "blob://data.csv", "ValueType": "Literal"}],
                    "InputPortsInternal": [],
                    "OutputPortsInternal": [{"Name": "Results dataset", "NodeId": "node-a"}]
                },
                {
                    "Id": "node-b",
                    "ModuleId": "module://split",
                    "Comment": "B",
                    "ModuleParameters": [{"Name": "Fraction", "Value": "0.5"}],
                    "InputPortsInternal": [{"Name": "Dataset"}],
                    "OutputPortsInternal": [{"Name": "Results dataset1"}]
                },
                {
                    "Id": "node-c",
                    "ModuleId": "module://normalize",
                    "Comment": "C",
                    "ModuleParameters": [],
                    "InputPortsInternal": [{"Name": "Dataset"}],
                    "OutputPortsInternal": [{"Name": "Transformed dataset"}]
                }
            ],
            "EdgesInternal": [
                {
                    "SourceOutputPortId": "node-a:Results dataset",
                    "DestinationInputPortId": "node-b:Dataset"
                }
            ],
            "SerializedClientData": "<Layout/>"
        },
        "WebService": null
    })
}

#[allow(dead_code)]
pub fn scenario_raw() -> String {
    scenario_document().to_string()
}

#[allow(dead_code)]
pub fn workspace(id: &str, region: &str) -> WorkspaceSettings {
    WorkspaceSettings::new(id, format!("token-{}", id), region)
}

#[allow(dead_code)]
pub fn source_workspace() -> WorkspaceSettings {
    workspace("ws-source", SOURCE_REGION)
}

/// A service with the source workspace holding the scenario experiment.
#[allow(dead_code)]
pub fn seeded_gateway() -> MemoryGateway {
    let source = source_workspace();
    let gateway = MemoryGateway::new().with_workspace(&source);
    gateway
        .insert_experiment(
            &source,
            ExperimentSummary::new(EXPERIMENT_ID, "Scenario"),
            scenario_raw(),
        )
        .expect("seeding the source workspace failed");
    gateway
}

/// A client that never sleeps between polls.
#[allow(dead_code)]
pub fn client(gateway: MemoryGateway) -> StudioClient<MemoryGateway> {
    StudioClient::builder(gateway)
        .poll_policy(PollPolicy::immediate(10))
        .build()
}

/// Reads back the stored document of an experiment as JSON.
#[allow(dead_code)]
pub fn stored_document(gateway: &MemoryGateway, workspace_id: &str, experiment_id: &str) -> Value {
    let (_, raw) = gateway
        .experiment(workspace_id, experiment_id)
        .expect("experiment is missing");
    serde_json::from_str(&raw).expect("stored document is not JSON")
}

/// Wraps [`MemoryGateway`] and bends selected answers, for the failure paths
/// the in-memory service never produces on its own.
#[allow(dead_code)]
#[derive(Default)]
pub struct ScriptedGateway {
    pub inner: MemoryGateway,
    /// Pack activities complete without a transfer location.
    pub strip_handle: bool,
    /// Unpack activities never leave `InProgress`.
    pub stall_destination: bool,
    /// Run and pack requests are refused by the service.
    pub reject_requests: bool,
    /// Cancels the token when the n-th source poll is answered.
    pub cancel_on_source_poll: Option<(u32, CancellationToken)>,
    pub source_polls: AtomicU32,
}

#[allow(dead_code)]
impl ScriptedGateway {
    pub fn new(inner: MemoryGateway) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    fn rejected(&self) -> Result<(), GatewayError> {
        if self.reject_requests {
            Err(GatewayError::Rejected("service is draining".to_string()))
        } else {
            Ok(())
        }
    }

    fn stalled(&self, mut activity: Activity) -> Activity {
        if self.stall_destination {
            activity.status = "InProgress".to_string();
        }
        activity
    }
}

impl Gateway for ScriptedGateway {
    fn get_experiment_by_id(
        &self,
        scope: &WorkspaceSettings,
        experiment_id: &str,
    ) -> Result<(ExperimentSummary, String), GatewayError> {
        self.inner.get_experiment_by_id(scope, experiment_id)
    }

    fn list_experiments(
        &self,
        scope: &WorkspaceSettings,
    ) -> Result<Vec<ExperimentSummary>, GatewayError> {
        self.inner.list_experiments(scope)
    }

    fn save_experiment(
        &self,
        scope: &WorkspaceSettings,
        summary: &ExperimentSummary,
        raw_document: &str,
    ) -> Result<(), GatewayError> {
        self.inner.save_experiment(scope, summary, raw_document)
    }

    fn save_experiment_as(
        &self,
        scope: &WorkspaceSettings,
        summary: &ExperimentSummary,
        raw_document: &str,
        new_name: &str,
    ) -> Result<(), GatewayError> {
        self.inner.save_experiment_as(scope, summary, raw_document, new_name)
    }

    fn remove_experiment_by_id(
        &self,
        scope: &WorkspaceSettings,
        experiment_id: &str,
    ) -> Result<(), GatewayError> {
        self.inner.remove_experiment_by_id(scope, experiment_id)
    }

    fn run_experiment(
        &self,
        scope: &WorkspaceSettings,
        summary: &ExperimentSummary,
        raw_document: &str,
    ) -> Result<(), GatewayError> {
        self.rejected()?;
        self.inner.run_experiment(scope, summary, raw_document)
    }

    fn pack_experiment(
        &self,
        scope: &WorkspaceSettings,
        experiment_id: &str,
    ) -> Result<Activity, GatewayError> {
        self.rejected()?;
        let mut activity = self.inner.pack_experiment(scope, experiment_id)?;
        if self.strip_handle {
            activity.location = None;
        }
        Ok(activity)
    }

    fn unpack_experiment(
        &self,
        scope: &WorkspaceSettings,
        transfer_handle: &str,
        target_region: &str,
    ) -> Result<Activity, GatewayError> {
        let activity = self.inner.unpack_experiment(scope, transfer_handle, target_region)?;
        Ok(self.stalled(activity))
    }

    fn get_activity_status(
        &self,
        scope: &WorkspaceSettings,
        activity_id: &str,
        side: ActivitySide,
    ) -> Result<Activity, GatewayError> {
        let mut activity = self.inner.get_activity_status(scope, activity_id, side)?;
        if side.is_source() {
            let polls = self.source_polls.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some((at, token)) = &self.cancel_on_source_poll {
                if polls == *at {
                    token.cancel();
                }
            }
            if self.strip_handle {
                activity.location = None;
            }
            Ok(activity)
        } else {
            Ok(self.stalled(activity))
        }
    }

    fn upload_resource(
        &self,
        scope: &WorkspaceSettings,
        format: ResourceFormat,
        path: &Path,
    ) -> impl Future<Output = Result<UploadReceipt, GatewayError>> + Send {
        self.inner.upload_resource(scope, format, path)
    }
}
