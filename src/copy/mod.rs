//! Cross-workspace experiment copy: pack in the source workspace, wait, unpack
//! the transfer in the destination workspace, wait.

mod poll;

use crate::config::PollPolicy;
use crate::error::{GatewayError, StudioError};
use crate::gateway::{ActivitySide, Gateway, WorkspaceSettings};
use poll::poll_until_complete;
use std::fmt;
use tokio_util::sync::CancellationToken;

/// Progress of a single experiment copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyState {
    RequestedPack,
    PollingPack,
    Packed,
    RequestedUnpack,
    PollingUnpack,
    Done,
}

impl fmt::Display for CopyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CopyState::RequestedPack => "requested pack",
            CopyState::PollingPack => "polling pack",
            CopyState::Packed => "packed",
            CopyState::RequestedUnpack => "requested unpack",
            CopyState::PollingUnpack => "polling unpack",
            CopyState::Done => "done",
        };
        f.write_str(name)
    }
}

/// Outcome of a batch copy. Every experiment is attempted, whatever happened
/// to the ones before it.
#[derive(Debug, Default)]
pub struct CopyReport {
    pub copied: Vec<String>,
    pub failed: Vec<(String, StudioError)>,
}

impl CopyReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.copied.len() + self.failed.len()
    }
}

/// Drives the pack / transfer / unpack protocol against a [`Gateway`].
pub struct CopyOrchestrator<'a, G> {
    gateway: &'a G,
    policy: PollPolicy,
    cancel: CancellationToken,
}

impl<'a, G: Gateway> CopyOrchestrator<'a, G> {
    pub fn new(gateway: &'a G, policy: PollPolicy) -> Self {
        Self {
            gateway,
            policy: policy.at_least_once(),
            cancel: CancellationToken::new(),
        }
    }

    /// Uses `token` to abort polling. Cancelling it stops the copy in progress
    /// and fails every copy started afterwards.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Copies one experiment from `source` into `destination`.
    ///
    /// The copy shows up in the destination's experiment list under an id the
    /// service picks; nothing is returned beyond success.
    pub fn copy_experiment(
        &self,
        source: &WorkspaceSettings,
        experiment_id: &str,
        destination: &WorkspaceSettings,
    ) -> Result<(), StudioError> {
        self.check_cancelled(experiment_id)?;
        self.gateway
            .get_experiment_by_id(source, experiment_id)
            .map_err(|e| StudioError::on_fetch(experiment_id, e))?;

        self.enter(CopyState::RequestedPack, experiment_id);
        let activity = self
            .gateway
            .pack_experiment(source, experiment_id)
            .map_err(|e| StudioError::on_request(experiment_id, e))?;

        self.enter(CopyState::PollingPack, experiment_id);
        let (packed, source_polls) = poll_until_complete(
            self.gateway,
            source,
            activity,
            ActivitySide::Source,
            &self.policy,
            &self.cancel,
            experiment_id,
        )?;
        let handle = packed.location.ok_or_else(|| StudioError::UnpackError {
            workspace_id: destination.workspace_id.clone(),
            reason: format!("pack activity '{}' completed without a transfer location", packed.activity_id),
        })?;
        self.enter(CopyState::Packed, experiment_id);

        self.check_cancelled(experiment_id)?;
        self.enter(CopyState::RequestedUnpack, experiment_id);
        let activity = self
            .gateway
            .unpack_experiment(destination, &handle, &destination.location)
            .map_err(|e| match e {
                GatewayError::Rejected(reason) | GatewayError::NotFound(reason) => {
                    StudioError::UnpackError {
                        workspace_id: destination.workspace_id.clone(),
                        reason,
                    }
                }
                other => StudioError::Gateway(other),
            })?;

        self.enter(CopyState::PollingUnpack, experiment_id);
        let (_, destination_polls) = poll_until_complete(
            self.gateway,
            destination,
            activity,
            ActivitySide::Destination,
            &self.policy,
            &self.cancel,
            experiment_id,
        )?;

        self.enter(CopyState::Done, experiment_id);
        log::info!(
            "Copied experiment '{}' from workspace '{}' to '{}' ({} source polls, {} destination polls)",
            experiment_id,
            source.workspace_id,
            destination.workspace_id,
            source_polls,
            destination_polls
        );
        Ok(())
    }

    /// Copies each experiment in turn. Failures are collected, not propagated.
    pub fn copy_experiments<I, S>(
        &self,
        source: &WorkspaceSettings,
        experiment_ids: I,
        destination: &WorkspaceSettings,
    ) -> CopyReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = CopyReport::default();
        for experiment_id in experiment_ids {
            let experiment_id = experiment_id.as_ref();
            match self.copy_experiment(source, experiment_id, destination) {
                Ok(()) => report.copied.push(experiment_id.to_string()),
                Err(e) => {
                    log::warn!("Copy of experiment '{}' failed: {}", experiment_id, e);
                    report.failed.push((experiment_id.to_string(), e));
                }
            }
        }

        log::info!(
            "Batch copy finished: {} copied, {} failed",
            report.copied.len(),
            report.failed.len()
        );
        report
    }

    /// Copies every experiment of `source`. Only listing the source fails eagerly.
    pub fn copy_all_experiments(
        &self,
        source: &WorkspaceSettings,
        destination: &WorkspaceSettings,
    ) -> Result<CopyReport, StudioError> {
        let experiments = self.gateway.list_experiments(source)?;
        Ok(self.copy_experiments(source, &experiments, destination))
    }

    fn check_cancelled(&self, experiment_id: &str) -> Result<(), StudioError> {
        if self.cancel.is_cancelled() {
            Err(StudioError::Cancelled(experiment_id.to_string()))
        } else {
            Ok(())
        }
    }

    fn enter(&self, state: CopyState, experiment_id: &str) {
        log::debug!("Copy of '{}': {}", experiment_id, state);
    }
}
