use super::{
    ACTIVITY_COMPLETE, Activity, ActivitySide, ExperimentSummary, Gateway, ResourceFormat,
    UploadReceipt, WorkspaceSettings,
};
use crate::error::GatewayError;
use ahash::AHashMap;
use parking_lot::Mutex;
use std::fs;
use std::future::Future;
use std::path::Path;

const IN_PROGRESS: &str = "InProgress";

/// Gateway operations, as counted by [`MemoryGateway::calls`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayCall {
    GetExperiment,
    ListExperiments,
    Save,
    SaveAs,
    Remove,
    Run,
    Pack,
    Unpack,
    SourcePoll,
    DestinationPoll,
    Upload,
}

/// An in-process Studio service.
///
/// Workspaces are registered with their token and region; every call is
/// checked against them. Pack and unpack activities report `"InProgress"` until
/// they have been polled [`with_pending_polls`](Self::with_pending_polls)
/// times. Transfers only unpack into the region they were packed in.
#[derive(Default)]
pub struct MemoryGateway {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    workspaces: AHashMap<String, MemoryWorkspace>,
    transfers: AHashMap<String, Transfer>,
    activities: AHashMap<String, ActivityRecord>,
    calls: AHashMap<GatewayCall, usize>,
    pending_polls: u32,
    reject_writes: bool,
    next_id: u64,
}

struct MemoryWorkspace {
    token: String,
    region: String,
    experiments: Vec<StoredExperiment>,
    resources: Vec<UploadReceipt>,
    runs: Vec<String>,
}

struct StoredExperiment {
    summary: ExperimentSummary,
    raw: String,
}

struct Transfer {
    region: String,
    summary: ExperimentSummary,
    raw: String,
}

struct ActivityRecord {
    workspace_id: String,
    side: ActivitySide,
    remaining: u32,
    location: Option<String>,
}

impl MemoryState {
    fn record(&mut self, call: GatewayCall) {
        *self.calls.entry(call).or_default() += 1;
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{:04}", prefix, self.next_id)
    }

    fn workspace(&mut self, scope: &WorkspaceSettings) -> Result<&mut MemoryWorkspace, GatewayError> {
        let workspace = self
            .workspaces
            .get_mut(&scope.workspace_id)
            .ok_or_else(|| GatewayError::WorkspaceNotFound(scope.workspace_id.clone()))?;
        if workspace.token != scope.authorization_token {
            return Err(GatewayError::Unauthorized(scope.workspace_id.clone()));
        }
        Ok(workspace)
    }

    fn check_writable(&self) -> Result<(), GatewayError> {
        if self.reject_writes {
            Err(GatewayError::Rejected("workspace is read-only".to_string()))
        } else {
            Ok(())
        }
    }

    fn start_activity(
        &mut self,
        scope: &WorkspaceSettings,
        side: ActivitySide,
        location: Option<String>,
    ) -> Activity {
        let activity_id = self.next_id("activity");
        let record = ActivityRecord {
            workspace_id: scope.workspace_id.clone(),
            side,
            remaining: self.pending_polls,
            location,
        };
        let activity = record.report(&activity_id);
        self.activities.insert(activity_id, record);
        activity
    }
}

impl MemoryWorkspace {
    fn find(&self, experiment_id: &str) -> Result<&StoredExperiment, GatewayError> {
        self.experiments
            .iter()
            .find(|e| e.summary.experiment_id == experiment_id)
            .ok_or_else(|| GatewayError::NotFound(experiment_id.to_string()))
    }

    fn upsert(&mut self, summary: ExperimentSummary, raw: String) {
        match self
            .experiments
            .iter_mut()
            .find(|e| e.summary.experiment_id == summary.experiment_id)
        {
            Some(existing) => {
                existing.summary = summary;
                existing.raw = raw;
            }
            None => self.experiments.push(StoredExperiment { summary, raw }),
        }
    }
}

impl ActivityRecord {
    fn report(&self, activity_id: &str) -> Activity {
        let complete = self.remaining == 0;
        Activity {
            activity_id: activity_id.to_string(),
            status: if complete { ACTIVITY_COMPLETE } else { IN_PROGRESS }.to_string(),
            location: if complete { self.location.clone() } else { None },
        }
    }
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a workspace; its token and region are taken from `settings`.
    pub fn with_workspace(self, settings: &WorkspaceSettings) -> Self {
        self.add_workspace(settings);
        self
    }

    /// Number of status polls after which new activities report `"Complete"`.
    /// With zero, activities complete as soon as they are requested.
    pub fn with_pending_polls(self, polls: u32) -> Self {
        self.state.lock().pending_polls = polls;
        self
    }

    pub fn add_workspace(&self, settings: &WorkspaceSettings) {
        self.state.lock().workspaces.insert(
            settings.workspace_id.clone(),
            MemoryWorkspace {
                token: settings.authorization_token.clone(),
                region: settings.location.clone(),
                experiments: Vec::new(),
                resources: Vec::new(),
                runs: Vec::new(),
            },
        );
    }

    /// Stores an experiment directly, bypassing write rejection and call counting.
    pub fn insert_experiment(
        &self,
        scope: &WorkspaceSettings,
        summary: ExperimentSummary,
        raw_document: impl Into<String>,
    ) -> Result<(), GatewayError> {
        let mut state = self.state.lock();
        state.workspace(scope)?.upsert(summary, raw_document.into());
        Ok(())
    }

    /// Makes every save, save-as and remove fail with [`GatewayError::Rejected`].
    pub fn set_reject_writes(&self, reject: bool) {
        self.state.lock().reject_writes = reject;
    }

    pub fn experiment(&self, workspace_id: &str, experiment_id: &str) -> Option<(ExperimentSummary, String)> {
        let state = self.state.lock();
        let workspace = state.workspaces.get(workspace_id)?;
        workspace
            .find(experiment_id)
            .ok()
            .map(|e| (e.summary.clone(), e.raw.clone()))
    }

    pub fn experiments(&self, workspace_id: &str) -> Vec<ExperimentSummary> {
        self.state
            .lock()
            .workspaces
            .get(workspace_id)
            .map(|w| w.experiments.iter().map(|e| e.summary.clone()).collect())
            .unwrap_or_default()
    }

    pub fn resources(&self, workspace_id: &str) -> Vec<UploadReceipt> {
        self.state
            .lock()
            .workspaces
            .get(workspace_id)
            .map(|w| w.resources.clone())
            .unwrap_or_default()
    }

    /// Ids of experiments submitted for a run, in submission order.
    pub fn runs(&self, workspace_id: &str) -> Vec<String> {
        self.state
            .lock()
            .workspaces
            .get(workspace_id)
            .map(|w| w.runs.clone())
            .unwrap_or_default()
    }

    pub fn calls(&self, call: GatewayCall) -> usize {
        self.state.lock().calls.get(&call).copied().unwrap_or(0)
    }

    pub fn reset_calls(&self) {
        self.state.lock().calls.clear();
    }
}

impl Gateway for MemoryGateway {
    fn get_experiment_by_id(
        &self,
        scope: &WorkspaceSettings,
        experiment_id: &str,
    ) -> Result<(ExperimentSummary, String), GatewayError> {
        let mut state = self.state.lock();
        state.record(GatewayCall::GetExperiment);
        let stored = state.workspace(scope)?.find(experiment_id)?;
        Ok((stored.summary.clone(), stored.raw.clone()))
    }

    fn list_experiments(
        &self,
        scope: &WorkspaceSettings,
    ) -> Result<Vec<ExperimentSummary>, GatewayError> {
        let mut state = self.state.lock();
        state.record(GatewayCall::ListExperiments);
        let workspace = state.workspace(scope)?;
        Ok(workspace
            .experiments
            .iter()
            .map(|e| e.summary.clone())
            .collect())
    }

    fn save_experiment(
        &self,
        scope: &WorkspaceSettings,
        summary: &ExperimentSummary,
        raw_document: &str,
    ) -> Result<(), GatewayError> {
        let mut state = self.state.lock();
        state.record(GatewayCall::Save);
        state.check_writable()?;
        if summary.experiment_id.is_empty() {
            return Err(GatewayError::Rejected(
                "experiment id is required to save".to_string(),
            ));
        }
        state
            .workspace(scope)?
            .upsert(summary.clone(), raw_document.to_string());
        Ok(())
    }

    fn save_experiment_as(
        &self,
        scope: &WorkspaceSettings,
        summary: &ExperimentSummary,
        raw_document: &str,
        new_name: &str,
    ) -> Result<(), GatewayError> {
        let mut state = self.state.lock();
        state.record(GatewayCall::SaveAs);
        state.check_writable()?;
        state.workspace(scope)?;

        let copy = ExperimentSummary {
            experiment_id: state.next_id("experiment"),
            description: new_name.to_string(),
            etag: String::new(),
            ..summary.clone()
        };
        state
            .workspace(scope)?
            .upsert(copy, raw_document.to_string());
        Ok(())
    }

    fn remove_experiment_by_id(
        &self,
        scope: &WorkspaceSettings,
        experiment_id: &str,
    ) -> Result<(), GatewayError> {
        let mut state = self.state.lock();
        state.record(GatewayCall::Remove);
        state.check_writable()?;
        let workspace = state.workspace(scope)?;
        let before = workspace.experiments.len();
        workspace
            .experiments
            .retain(|e| e.summary.experiment_id != experiment_id);
        if workspace.experiments.len() == before {
            return Err(GatewayError::NotFound(experiment_id.to_string()));
        }
        Ok(())
    }

    fn run_experiment(
        &self,
        scope: &WorkspaceSettings,
        summary: &ExperimentSummary,
        _raw_document: &str,
    ) -> Result<(), GatewayError> {
        let mut state = self.state.lock();
        state.record(GatewayCall::Run);
        let workspace = state.workspace(scope)?;
        workspace.find(&summary.experiment_id)?;
        workspace.runs.push(summary.experiment_id.clone());
        Ok(())
    }

    fn pack_experiment(
        &self,
        scope: &WorkspaceSettings,
        experiment_id: &str,
    ) -> Result<Activity, GatewayError> {
        let mut state = self.state.lock();
        state.record(GatewayCall::Pack);
        let workspace = state.workspace(scope)?;
        let stored = workspace.find(experiment_id)?;
        let transfer = Transfer {
            region: workspace.region.clone(),
            summary: stored.summary.clone(),
            raw: stored.raw.clone(),
        };

        let handle = format!("transfer://{}/{}", transfer.region, state.next_id("package"));
        state.transfers.insert(handle.clone(), transfer);
        Ok(state.start_activity(scope, ActivitySide::Source, Some(handle)))
    }

    fn unpack_experiment(
        &self,
        scope: &WorkspaceSettings,
        transfer_handle: &str,
        target_region: &str,
    ) -> Result<Activity, GatewayError> {
        let mut state = self.state.lock();
        state.record(GatewayCall::Unpack);
        let region = state.workspace(scope)?.region.clone();

        let transfer = state
            .transfers
            .get(transfer_handle)
            .ok_or_else(|| GatewayError::Rejected(format!("unknown transfer handle '{}'", transfer_handle)))?;
        if transfer.region != target_region || region != target_region {
            return Err(GatewayError::Rejected(format!(
                "package from region '{}' cannot be unpacked in region '{}'",
                transfer.region, target_region
            )));
        }

        let summary = transfer.summary.clone();
        let raw = transfer.raw.clone();
        let copy = ExperimentSummary {
            experiment_id: state.next_id("experiment"),
            ..summary
        };
        state.workspace(scope)?.upsert(copy, raw);
        Ok(state.start_activity(scope, ActivitySide::Destination, None))
    }

    fn get_activity_status(
        &self,
        scope: &WorkspaceSettings,
        activity_id: &str,
        side: ActivitySide,
    ) -> Result<Activity, GatewayError> {
        let mut state = self.state.lock();
        state.record(if side.is_source() {
            GatewayCall::SourcePoll
        } else {
            GatewayCall::DestinationPoll
        });
        state.workspace(scope)?;

        let record = state
            .activities
            .get_mut(activity_id)
            .filter(|r| r.workspace_id == scope.workspace_id && r.side == side)
            .ok_or_else(|| GatewayError::NotFound(activity_id.to_string()))?;
        record.remaining = record.remaining.saturating_sub(1);
        Ok(record.report(activity_id))
    }

    fn upload_resource(
        &self,
        scope: &WorkspaceSettings,
        format: ResourceFormat,
        path: &Path,
    ) -> impl Future<Output = Result<UploadReceipt, GatewayError>> + Send {
        async move {
            let bytes = fs::read(path).map_err(|e| {
                GatewayError::Rejected(format!("cannot read '{}': {}", path.display(), e))
            })?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());

            let mut state = self.state.lock();
            state.record(GatewayCall::Upload);
            state.workspace(scope)?;
            let receipt = UploadReceipt {
                resource_id: state.next_id("resource"),
                name,
                format,
                size_bytes: bytes.len() as u64,
            };
            state.workspace(scope)?.resources.push(receipt.clone());
            Ok::<_, GatewayError>(receipt)
        }
    }
}
