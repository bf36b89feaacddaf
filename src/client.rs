//! The user-facing facade: experiment CRUD, label-based graph mutations with
//! save-as, cross-workspace copy and resource upload, all routed through a
//! single [`Gateway`].

use crate::config::{MutationPolicy, PollPolicy, StudioConfig};
use crate::copy::{CopyOrchestrator, CopyReport};
use crate::error::{GatewayError, StudioError};
use crate::gateway::{ExperimentSummary, Gateway, ResourceFormat, UploadReceipt, WorkspaceSettings};
use crate::graph::{self, ExperimentDocument};
use crate::mutation::{
    self, ADDED_MODULE_TAG, EdgeRewire, MODIFIED_EDGE_TAG, MODIFIED_PARAMETER_TAG, ModuleAdded,
    Mutation, MutationOutcome, ParameterEdit,
};
use std::fs;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Result of a persisted [`Mutation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationReport {
    /// The experiment the mutation was read from.
    pub experiment_id: String,
    /// Full name of the new experiment when the result was saved as a copy.
    pub saved_as: Option<String>,
    pub outcome: MutationOutcome,
}

pub struct StudioClientBuilder<G> {
    gateway: G,
    mutation_policy: MutationPolicy,
    poll_policy: PollPolicy,
}

impl<G: Gateway> StudioClientBuilder<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            mutation_policy: MutationPolicy::default(),
            poll_policy: PollPolicy::default(),
        }
    }

    /// Takes both policies from a loaded configuration.
    pub fn config(mut self, config: &StudioConfig) -> Self {
        self.mutation_policy = config.mutation;
        self.poll_policy = config.poll;
        self
    }

    pub fn mutation_policy(mut self, policy: MutationPolicy) -> Self {
        self.mutation_policy = policy;
        self
    }

    /// A `max_attempts` of zero is raised to one.
    pub fn poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll_policy = policy;
        self
    }

    pub fn build(self) -> StudioClient<G> {
        StudioClient {
            gateway: self.gateway,
            mutation_policy: self.mutation_policy,
            poll_policy: self.poll_policy.at_least_once(),
        }
    }
}

/// Experiment operations against one Studio service.
///
/// Every call takes the [`WorkspaceSettings`] it is scoped to, so a single
/// client can serve any number of workspaces.
pub struct StudioClient<G> {
    gateway: G,
    mutation_policy: MutationPolicy,
    poll_policy: PollPolicy,
}

impl<G: Gateway> StudioClient<G> {
    pub fn new(gateway: G) -> Self {
        StudioClientBuilder::new(gateway).build()
    }

    pub fn builder(gateway: G) -> StudioClientBuilder<G> {
        StudioClientBuilder::new(gateway)
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn mutation_policy(&self) -> &MutationPolicy {
        &self.mutation_policy
    }

    pub fn poll_policy(&self) -> &PollPolicy {
        &self.poll_policy
    }

    // --- Experiments ---

    pub fn get_experiment(
        &self,
        scope: &WorkspaceSettings,
        experiment: impl AsRef<str>,
    ) -> Result<ExperimentSummary, StudioError> {
        self.fetch(scope, experiment.as_ref()).map(|(summary, _)| summary)
    }

    /// Fetches an experiment and parses its graph.
    pub fn get_document(
        &self,
        scope: &WorkspaceSettings,
        experiment: impl AsRef<str>,
    ) -> Result<(ExperimentSummary, ExperimentDocument), StudioError> {
        let (summary, raw) = self.fetch(scope, experiment.as_ref())?;
        let document = graph::parse(&raw)?;
        Ok((summary, document))
    }

    pub fn list_experiments(
        &self,
        scope: &WorkspaceSettings,
    ) -> Result<Vec<ExperimentSummary>, StudioError> {
        Ok(self.gateway.list_experiments(scope)?)
    }

    /// Overwrites an experiment with `raw_document`.
    pub fn save_experiment(
        &self,
        scope: &WorkspaceSettings,
        summary: &ExperimentSummary,
        raw_document: &str,
    ) -> Result<(), StudioError> {
        self.gateway
            .save_experiment(scope, summary, raw_document)
            .map_err(|e| StudioError::on_persist(&summary.experiment_id, e))
    }

    /// Stores `raw_document` as a new experiment named exactly `new_name`.
    pub fn save_experiment_as(
        &self,
        scope: &WorkspaceSettings,
        summary: &ExperimentSummary,
        raw_document: &str,
        new_name: &str,
    ) -> Result<(), StudioError> {
        self.gateway
            .save_experiment_as(scope, summary, raw_document, new_name)
            .map_err(|e| StudioError::on_persist(&summary.experiment_id, e))
    }

    pub fn delete_experiment(
        &self,
        scope: &WorkspaceSettings,
        experiment: impl AsRef<str>,
    ) -> Result<(), StudioError> {
        let experiment_id = experiment.as_ref();
        self.gateway
            .remove_experiment_by_id(scope, experiment_id)
            .map_err(|e| match e {
                GatewayError::NotFound(_) => StudioError::ExperimentNotFound(experiment_id.to_string()),
                other => StudioError::on_persist(experiment_id, other),
            })?;
        log::info!("Deleted experiment '{}' from workspace '{}'", experiment_id, scope.workspace_id);
        Ok(())
    }

    /// Deletes each experiment in turn and returns the ones that failed.
    pub fn delete_experiments<I, S>(
        &self,
        scope: &WorkspaceSettings,
        experiments: I,
    ) -> Vec<(String, StudioError)>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        experiments
            .into_iter()
            .filter_map(|experiment| {
                let experiment_id = experiment.as_ref();
                self.delete_experiment(scope, experiment_id).err().map(|e| {
                    log::warn!("Delete of experiment '{}' failed: {}", experiment_id, e);
                    (experiment_id.to_string(), e)
                })
            })
            .collect()
    }

    /// Submits the experiment as currently stored for a run.
    pub fn run_experiment(
        &self,
        scope: &WorkspaceSettings,
        experiment: impl AsRef<str>,
    ) -> Result<(), StudioError> {
        let experiment_id = experiment.as_ref();
        let (summary, raw) = self.fetch(scope, experiment_id)?;
        self.gateway
            .run_experiment(scope, &summary, &raw)
            .map_err(|e| StudioError::on_request(experiment_id, e))?;
        log::info!("Submitted experiment '{}' for a run", experiment_id);
        Ok(())
    }

    /// Writes the raw document of an experiment to disk.
    ///
    /// Without `output`, or when `output` is a directory, the file is named
    /// `<ExperimentId>.json`. Returns the path written.
    pub fn export_experiment(
        &self,
        scope: &WorkspaceSettings,
        experiment: impl AsRef<str>,
        output: Option<&Path>,
    ) -> Result<PathBuf, StudioError> {
        let experiment_id = experiment.as_ref();
        let (_, raw) = self.fetch(scope, experiment_id)?;

        let file_name = format!("{}.json", experiment_id);
        let path = match output {
            Some(dir) if dir.is_dir() => dir.join(file_name),
            Some(file) => file.to_path_buf(),
            None => PathBuf::from(file_name),
        };
        fs::write(&path, raw)?;
        log::info!("Exported experiment '{}' to '{}'", experiment_id, path.display());
        Ok(path)
    }

    /// Reads an exported document and stores it in `scope`.
    ///
    /// With an empty `new_name` the experiment named in the document is
    /// overwritten; otherwise a new experiment called `new_name` is created.
    pub fn import_experiment(
        &self,
        scope: &WorkspaceSettings,
        input: impl AsRef<Path>,
        new_name: &str,
    ) -> Result<ExperimentSummary, StudioError> {
        let input = input.as_ref();
        let raw = fs::read_to_string(input)?;
        graph::parse(&raw)?;
        let summary: ExperimentSummary = serde_json::from_str(&raw)
            .map_err(|e| StudioError::MalformedDocument(e.to_string()))?;

        if new_name.is_empty() {
            self.save_experiment(scope, &summary, &raw)?;
        } else {
            self.save_experiment_as(scope, &summary, &raw, new_name)?;
        }
        log::info!("Imported '{}' into workspace '{}'", input.display(), scope.workspace_id);
        Ok(summary)
    }

    // --- Graph mutations ---

    /// Fetches, edits and persists an experiment.
    ///
    /// The edit is computed entirely before anything is written. With a
    /// non-empty `save_as`, the result goes to a new experiment named
    /// [`Mutation::tag`] followed by `save_as`; otherwise the original is
    /// overwritten.
    pub fn apply(
        &self,
        scope: &WorkspaceSettings,
        experiment: impl AsRef<str>,
        mutation: &Mutation,
        save_as: &str,
    ) -> Result<MutationReport, StudioError> {
        let experiment_id = experiment.as_ref();
        let (outcome, saved_as) =
            self.mutate(scope, experiment_id, mutation.tag(), save_as, |document, policy| {
                mutation.apply(document, policy)
            })?;
        log::debug!("'{}' touched {} graph elements", experiment_id, outcome.changes());
        Ok(MutationReport {
            experiment_id: experiment_id.to_string(),
            saved_as,
            outcome,
        })
    }

    /// Sets `parameter` to `value` on every module whose comment is `comment`.
    pub fn set_parameter(
        &self,
        scope: &WorkspaceSettings,
        experiment: impl AsRef<str>,
        comment: &str,
        parameter: &str,
        value: &str,
        save_as: &str,
    ) -> Result<ParameterEdit, StudioError> {
        self.mutate(
            scope,
            experiment.as_ref(),
            MODIFIED_PARAMETER_TAG,
            save_as,
            |document, policy| mutation::set_parameter(document, comment, parameter, value, policy),
        )
        .map(|(edit, _)| edit)
    }

    /// Feeds the destination module's first input from the source module's
    /// first output.
    pub fn rewire_edge(
        &self,
        scope: &WorkspaceSettings,
        experiment: impl AsRef<str>,
        source_comment: &str,
        destination_comment: &str,
        save_as: &str,
    ) -> Result<EdgeRewire, StudioError> {
        self.mutate(
            scope,
            experiment.as_ref(),
            MODIFIED_EDGE_TAG,
            save_as,
            |document, policy| {
                mutation::rewire_edge(
                    document,
                    source_comment,
                    destination_comment,
                    policy.edge_ordering,
                )
            },
        )
        .map(|(rewire, _)| rewire)
    }

    /// Appends an empty module node. `comment` defaults to
    /// [`NEW_MODULE_COMMENT`](crate::mutation::NEW_MODULE_COMMENT).
    pub fn add_module(
        &self,
        scope: &WorkspaceSettings,
        experiment: impl AsRef<str>,
        node_id: &str,
        comment: Option<&str>,
        save_as: &str,
    ) -> Result<ModuleAdded, StudioError> {
        self.mutate(
            scope,
            experiment.as_ref(),
            ADDED_MODULE_TAG,
            save_as,
            |document, policy| mutation::add_module(document, node_id, comment, policy),
        )
        .map(|(added, _)| added)
    }

    /// Fetch, parse, edit, serialize, persist. Returns the edit's outcome and
    /// the save-as name, if one was used.
    fn mutate<T>(
        &self,
        scope: &WorkspaceSettings,
        experiment_id: &str,
        tag: &str,
        save_as: &str,
        edit: impl FnOnce(&mut ExperimentDocument, &MutationPolicy) -> Result<T, StudioError>,
    ) -> Result<(T, Option<String>), StudioError> {
        let (summary, raw) = self.fetch(scope, experiment_id)?;
        let mut document = graph::parse(&raw)?;
        let outcome = edit(&mut document, &self.mutation_policy)?;
        let updated = graph::serialize(&document)?;

        let saved_as = if save_as.is_empty() {
            self.save_experiment(scope, &summary, &updated)?;
            log::info!("Applied {}to experiment '{}'", tag, experiment_id);
            None
        } else {
            let name = format!("{}{}", tag, save_as);
            self.save_experiment_as(scope, &summary, &updated, &name)?;
            log::info!("Applied {}to experiment '{}', saved as '{}'", tag, experiment_id, name);
            Some(name)
        };
        Ok((outcome, saved_as))
    }

    // --- Cross-workspace copy ---

    pub fn copy_experiment(
        &self,
        source: &WorkspaceSettings,
        experiment: impl AsRef<str>,
        destination: &WorkspaceSettings,
        cancel: &CancellationToken,
    ) -> Result<(), StudioError> {
        self.orchestrator(cancel)
            .copy_experiment(source, experiment.as_ref(), destination)
    }

    pub fn copy_experiments<I, S>(
        &self,
        source: &WorkspaceSettings,
        experiments: I,
        destination: &WorkspaceSettings,
        cancel: &CancellationToken,
    ) -> CopyReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.orchestrator(cancel)
            .copy_experiments(source, experiments, destination)
    }

    pub fn copy_all_experiments(
        &self,
        source: &WorkspaceSettings,
        destination: &WorkspaceSettings,
        cancel: &CancellationToken,
    ) -> Result<CopyReport, StudioError> {
        self.orchestrator(cancel)
            .copy_all_experiments(source, destination)
    }

    // --- Resources ---

    /// Uploads a local file as a dataset resource.
    pub async fn upload_resource(
        &self,
        scope: &WorkspaceSettings,
        format: ResourceFormat,
        path: impl AsRef<Path>,
    ) -> Result<UploadReceipt, StudioError> {
        let path = path.as_ref();
        let receipt = self.gateway.upload_resource(scope, format, path).await?;
        log::info!(
            "Uploaded '{}' as {} resource '{}'",
            path.display(),
            format,
            receipt.resource_id
        );
        Ok(receipt)
    }

    fn orchestrator(&self, cancel: &CancellationToken) -> CopyOrchestrator<'_, G> {
        CopyOrchestrator::new(&self.gateway, self.poll_policy).with_cancellation(cancel.clone())
    }

    fn fetch(
        &self,
        scope: &WorkspaceSettings,
        experiment_id: &str,
    ) -> Result<(ExperimentSummary, String), StudioError> {
        self.gateway
            .get_experiment_by_id(scope, experiment_id)
            .map_err(|e| StudioError::on_fetch(experiment_id, e))
    }
}
