//! Cross-workspace copy tests
//!
//! Pack, transfer and unpack against the in-memory service with scripted
//! activity progress.
mod common;
use common::*;
use studio_graph::error::CopyPhase;
use studio_graph::gateway::memory::{GatewayCall, MemoryGateway};
use studio_graph::prelude::*;
use std::thread;
use std::time::Duration;

#[cfg(test)]
mod copy_tests {
    use super::*;

    fn destination_workspace() -> WorkspaceSettings {
        workspace("ws-destination", SOURCE_REGION)
    }

    fn two_workspaces(pending_polls: u32) -> MemoryGateway {
        seeded_gateway()
            .with_workspace(&destination_workspace())
            .with_pending_polls(pending_polls)
    }

    #[test]
    fn test_copy_polls_each_side_until_complete() {
        let source = source_workspace();
        let destination = destination_workspace();
        let client = client(two_workspaces(2));

        client
            .copy_experiment(&source, EXPERIMENT_ID, &destination, &CancellationToken::new())
            .expect("copy failed");

        let gateway = client.gateway();
        assert_eq!(gateway.calls(GatewayCall::Pack), 1);
        assert_eq!(gateway.calls(GatewayCall::Unpack), 1);
        assert_eq!(gateway.calls(GatewayCall::SourcePoll), 2);
        assert_eq!(gateway.calls(GatewayCall::DestinationPoll), 2);

        let copies = gateway.experiments(&destination.workspace_id);
        assert_eq!(copies.len(), 1);
        assert_eq!(copies[0].description, "Scenario");
        assert_eq!(
            stored_document(gateway, &destination.workspace_id, &copies[0].experiment_id),
            scenario_document()
        );
        assert_eq!(gateway.experiments(&source.workspace_id).len(), 1);
    }

    #[test]
    fn test_activities_complete_on_request() {
        let client = client(two_workspaces(0));
        client
            .copy_experiment(
                &source_workspace(),
                EXPERIMENT_ID,
                &destination_workspace(),
                &CancellationToken::new(),
            )
            .unwrap();

        assert_eq!(client.gateway().calls(GatewayCall::SourcePoll), 0);
        assert_eq!(client.gateway().calls(GatewayCall::DestinationPoll), 0);
    }

    #[test]
    fn test_copy_times_out_after_max_attempts() {
        let client = StudioClient::builder(two_workspaces(5))
            .poll_policy(PollPolicy::immediate(3))
            .build();

        let result = client.copy_experiment(
            &source_workspace(),
            EXPERIMENT_ID,
            &destination_workspace(),
            &CancellationToken::new(),
        );
        assert!(matches!(
            result,
            Err(StudioError::CopyTimeout { phase: CopyPhase::Pack, attempts: 3, .. })
        ));
        assert_eq!(client.gateway().calls(GatewayCall::SourcePoll), 3);
        assert_eq!(client.gateway().calls(GatewayCall::Unpack), 0);
    }

    #[test]
    fn test_cancelled_copy_stops_before_packing() {
        let client = client(two_workspaces(2));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = client.copy_experiment(
            &source_workspace(),
            EXPERIMENT_ID,
            &destination_workspace(),
            &cancel,
        );
        assert!(matches!(result, Err(StudioError::Cancelled(id)) if id == EXPERIMENT_ID));
        assert_eq!(client.gateway().calls(GatewayCall::Pack), 0);
    }

    #[test]
    fn test_cross_region_transfer_is_rejected() {
        let source = source_workspace();
        let destination = workspace("ws-europe", "West Europe");
        let gateway = seeded_gateway().with_workspace(&destination);
        let client = client(gateway);

        let result =
            client.copy_experiment(&source, EXPERIMENT_ID, &destination, &CancellationToken::new());
        assert!(matches!(
            result,
            Err(StudioError::UnpackError { ref workspace_id, .. }) if workspace_id == "ws-europe"
        ));
        assert!(client.gateway().experiments("ws-europe").is_empty());
    }

    #[test]
    fn test_missing_experiment_is_not_packed() {
        let client = client(two_workspaces(0));
        let result = client.copy_experiment(
            &source_workspace(),
            "exp-missing",
            &destination_workspace(),
            &CancellationToken::new(),
        );
        assert!(matches!(result, Err(StudioError::ExperimentNotFound(_))));
        assert_eq!(client.gateway().calls(GatewayCall::Pack), 0);
    }

    #[test]
    fn test_batch_copy_collects_failures() {
        let client = client(two_workspaces(1));
        let report = client.copy_experiments(
            &source_workspace(),
            [EXPERIMENT_ID, "exp-missing", EXPERIMENT_ID],
            &destination_workspace(),
            &CancellationToken::new(),
        );

        assert_eq!(report.attempted(), 3);
        assert!(!report.is_success());
        assert_eq!(report.copied, vec![EXPERIMENT_ID, EXPERIMENT_ID]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "exp-missing");
        assert_eq!(
            client.gateway().experiments(&destination_workspace().workspace_id).len(),
            2
        );
    }

    #[test]
    fn test_copy_all_experiments() {
        let source = source_workspace();
        let gateway = two_workspaces(1);
        gateway
            .insert_experiment(&source, ExperimentSummary::new("exp-0002", "Second"), scenario_raw())
            .unwrap();
        let client = client(gateway);

        let report = client
            .copy_all_experiments(&source, &destination_workspace(), &CancellationToken::new())
            .unwrap();
        assert!(report.is_success());
        assert_eq!(report.copied, vec![EXPERIMENT_ID, "exp-0002"]);

        let mut names: Vec<String> = client
            .gateway()
            .experiments(&destination_workspace().workspace_id)
            .into_iter()
            .map(|e| e.description)
            .collect();
        names.sort();
        assert_eq!(names, vec!["Scenario", "Second"]);
    }

    #[test]
    fn test_copy_all_fails_when_source_cannot_be_listed() {
        let client = client(two_workspaces(0));
        let locked = WorkspaceSettings::new("ws-source", "stale-token", SOURCE_REGION);

        let result =
            client.copy_all_experiments(&locked, &destination_workspace(), &CancellationToken::new());
        assert!(matches!(
            result,
            Err(StudioError::Gateway(GatewayError::Unauthorized(_)))
        ));
    }

    #[test]
    fn test_orchestrator_shares_its_cancellation_token() {
        let gateway = two_workspaces(0);
        let orchestrator = CopyOrchestrator::new(&gateway, PollPolicy::immediate(1));
        orchestrator.cancellation_token().cancel();

        let report = orchestrator.copy_experiments(
            &source_workspace(),
            [EXPERIMENT_ID],
            &destination_workspace(),
        );
        assert_eq!(report.copied.len(), 0);
        assert!(matches!(report.failed[0].1, StudioError::Cancelled(_)));
    }

    fn scripted(gateway: ScriptedGateway) -> StudioClient<ScriptedGateway> {
        StudioClient::builder(gateway)
            .poll_policy(PollPolicy::immediate(3))
            .build()
    }

    #[test]
    fn test_pack_without_transfer_location_fails_unpack() {
        let client = scripted(ScriptedGateway {
            strip_handle: true,
            ..ScriptedGateway::new(two_workspaces(1))
        });

        let result = client.copy_experiment(
            &source_workspace(),
            EXPERIMENT_ID,
            &destination_workspace(),
            &CancellationToken::new(),
        );
        assert!(matches!(
            result,
            Err(StudioError::UnpackError { ref workspace_id, .. }) if workspace_id == "ws-destination"
        ));
        assert_eq!(client.gateway().inner.calls(GatewayCall::SourcePoll), 1);
        assert_eq!(client.gateway().inner.calls(GatewayCall::Unpack), 0);
    }

    #[test]
    fn test_stalled_unpack_times_out_in_unpack_phase() {
        let client = scripted(ScriptedGateway {
            stall_destination: true,
            ..ScriptedGateway::new(two_workspaces(0))
        });

        let result = client.copy_experiment(
            &source_workspace(),
            EXPERIMENT_ID,
            &destination_workspace(),
            &CancellationToken::new(),
        );
        assert!(matches!(
            result,
            Err(StudioError::CopyTimeout { phase: CopyPhase::Unpack, attempts: 3, .. })
        ));
        assert_eq!(client.gateway().inner.calls(GatewayCall::Unpack), 1);
        assert_eq!(client.gateway().inner.calls(GatewayCall::DestinationPoll), 3);
    }

    #[test]
    fn test_cancel_while_polling_pack_stops_polling() {
        let cancel = CancellationToken::new();
        let client = scripted(ScriptedGateway {
            cancel_on_source_poll: Some((1, cancel.clone())),
            ..ScriptedGateway::new(two_workspaces(3))
        });

        let result =
            client.copy_experiment(&source_workspace(), EXPERIMENT_ID, &destination_workspace(), &cancel);
        assert!(matches!(result, Err(StudioError::Cancelled(id)) if id == EXPERIMENT_ID));
        assert_eq!(client.gateway().inner.calls(GatewayCall::SourcePoll), 1);
        assert_eq!(client.gateway().inner.calls(GatewayCall::Unpack), 0);
    }

    #[test]
    fn test_cancel_after_packing_skips_unpack() {
        let cancel = CancellationToken::new();
        let client = scripted(ScriptedGateway {
            cancel_on_source_poll: Some((2, cancel.clone())),
            ..ScriptedGateway::new(two_workspaces(2))
        });

        let result =
            client.copy_experiment(&source_workspace(), EXPERIMENT_ID, &destination_workspace(), &cancel);
        assert!(matches!(result, Err(StudioError::Cancelled(_))));
        assert_eq!(client.gateway().inner.calls(GatewayCall::SourcePoll), 2);
        assert_eq!(client.gateway().inner.calls(GatewayCall::Unpack), 0);
        assert!(client.gateway().inner.experiments("ws-destination").is_empty());
    }

    #[test]
    fn test_cancel_during_poll_interval_skips_the_status_request() {
        let gateway = two_workspaces(5);
        let cancel = CancellationToken::new();
        let orchestrator = CopyOrchestrator::new(&gateway, PollPolicy::new(Duration::from_millis(200), 10))
            .with_cancellation(cancel.clone());

        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            cancel.cancel();
        });
        let result =
            orchestrator.copy_experiment(&source_workspace(), EXPERIMENT_ID, &destination_workspace());
        canceller.join().unwrap();

        assert!(matches!(result, Err(StudioError::Cancelled(_))));
        assert_eq!(gateway.calls(GatewayCall::SourcePoll), 0);
    }

    #[test]
    fn test_rejected_pack_is_a_gateway_error() {
        let client = scripted(ScriptedGateway {
            reject_requests: true,
            ..ScriptedGateway::new(two_workspaces(0))
        });

        let result = client.copy_experiment(
            &source_workspace(),
            EXPERIMENT_ID,
            &destination_workspace(),
            &CancellationToken::new(),
        );
        assert!(matches!(
            result,
            Err(StudioError::Gateway(GatewayError::Rejected(_)))
        ));
    }

    #[test]
    fn test_zero_attempt_policy_still_polls_once() {
        let gateway = two_workspaces(1);
        let orchestrator = CopyOrchestrator::new(&gateway, PollPolicy::immediate(0));

        orchestrator
            .copy_experiment(&source_workspace(), EXPERIMENT_ID, &destination_workspace())
            .expect("copy failed");
        assert_eq!(gateway.calls(GatewayCall::SourcePoll), 1);
        assert_eq!(gateway.calls(GatewayCall::DestinationPoll), 1);
    }
}
