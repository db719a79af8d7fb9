//! Run lifecycle controller.
//!
//! Owns a single run slot. The controller never schedules anything itself:
//! the caller decides when to `poll`, how long to wait between polls, and
//! whether to keep going after a `ConnectionLost`. Each public operation
//! makes at most one request to the backend.

use chrono::Utc;
use std::collections::HashSet;

use crate::cost::{estimate_cost, CostEstimate, ModelPricing};
use crate::results::RunResults;
use crate::run::error::{RunError, RunResult};
use crate::run::state::{RunStateMachine, TransitionRecord};
use crate::run::types::{
    BenchmarkRun, CancelMode, CancelOutcome, FailureKind, MetricConfig, RunFailure, RunHandle,
    RunProgress, RunSnapshot, RunStatus, StartRequest, MAX_MODELS_PER_RUN,
};
use crate::service::{BenchmarkService, ServiceError};

/// The one run this controller tracks.
#[derive(Debug)]
struct RunSlot {
    run: BenchmarkRun,
    machine: RunStateMachine,
    results: Option<RunResults>,
}

/// Drives one benchmark run at a time against a [`BenchmarkService`].
///
/// Independent runs need independent controllers; nothing is shared between
/// instances.
pub struct RunController<S: BenchmarkService> {
    service: S,
    slot: Option<RunSlot>,
}

impl<S: BenchmarkService> RunController<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            slot: None,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Last known state of the run in the slot, terminal or not.
    pub fn current(&self) -> Option<&BenchmarkRun> {
        self.slot.as_ref().map(|s| &s.run)
    }

    /// Whether the slot holds a run that has not reached a terminal state.
    pub fn is_active(&self) -> bool {
        self.slot.as_ref().is_some_and(|s| !s.run.is_terminal())
    }

    /// Status transitions observed for the run in the slot.
    pub fn transitions(&self) -> &[TransitionRecord] {
        self.slot
            .as_ref()
            .map(|s| s.machine.transitions())
            .unwrap_or(&[])
    }

    /// Pre-flight cost estimate for running `pricing` over `dataset_ref`.
    ///
    /// Informational only: it reads the dataset's shape from the backend and
    /// leaves the run slot untouched.
    pub async fn estimate(
        &self,
        dataset_ref: &str,
        pricing: &[ModelPricing],
    ) -> RunResult<CostEstimate> {
        let shape = self
            .service
            .dataset(dataset_ref)
            .await
            .map_err(|e| map_call_error("dataset", e))?;
        let estimate = estimate_cost(&shape, pricing);
        tracing::debug!(
            dataset = dataset_ref,
            documents = shape.document_count,
            cost_usd = estimate.cost_usd,
            "Cost estimated"
        );
        Ok(estimate)
    }

    /// Start a new run.
    ///
    /// The returned handle is optimistic local state: `Queued` (or `Running`
    /// if the backend says so) with zero progress.
    pub async fn start(
        &mut self,
        dataset_ref: &str,
        model_ids: &[String],
        metric_config: MetricConfig,
    ) -> RunResult<RunHandle> {
        validate_selection(model_ids)?;

        if let Some(slot) = self.slot.as_ref().filter(|s| !s.run.is_terminal()) {
            return Err(RunError::RunAlreadyActive {
                run_id: slot.run.run_id.clone(),
            });
        }

        let request = StartRequest::new(dataset_ref, model_ids, &metric_config);
        let ack = self.service.start(&request).await.map_err(|e| {
            tracing::warn!(dataset = dataset_ref, error = %e, "Benchmark start refused");
            RunError::UpstreamUnavailable {
                operation: "start".to_string(),
                message: e.to_string(),
            }
        })?;

        let mut machine = RunStateMachine::new();
        if ack.status == Some(RunStatus::Running) {
            // Running straight from Queued is always legal.
            let _ = machine.advance(RunStatus::Running, Some("accepted by backend"));
        }

        let now = Utc::now();
        let run = BenchmarkRun {
            run_id: ack.run_id.clone(),
            dataset_id: dataset_ref.to_string(),
            status: machine.current(),
            selected_models: model_ids.to_vec(),
            metric_config,
            progress: RunProgress {
                total_models: model_ids.len() as u32,
                ..Default::default()
            },
            started_at: now,
            updated_at: now,
            cancel_requested: false,
            failure: None,
        };

        tracing::info!(
            run_id = %run.run_id,
            dataset = %run.dataset_id,
            models = run.selected_models.len(),
            message = ack.message.as_deref().unwrap_or(""),
            "Benchmark run started"
        );

        self.slot = Some(RunSlot {
            run: run.clone(),
            machine,
            results: None,
        });
        Ok(run)
    }

    /// Fetch the latest snapshot of `run_id`.
    ///
    /// Once the run is terminal the retained snapshot is returned without
    /// contacting the backend. A transport failure leaves local state as it
    /// was. A snapshot that breaks the lifecycle rules fails the run locally
    /// and is reported as [`RunError::ProtocolViolation`].
    pub async fn poll(&mut self, run_id: &str) -> RunResult<RunSnapshot> {
        let slot = self.slot_for(run_id)?;
        if slot.run.is_terminal() {
            return Ok(slot.run.clone());
        }

        let snapshot = self
            .service
            .status(run_id)
            .await
            .map_err(|e| map_call_error("poll", e))?;

        let slot = self.slot_for(run_id)?;
        if snapshot.run_id != run_id {
            let detail = format!("snapshot for run {} returned for {}", snapshot.run_id, run_id);
            return Err(reject(slot, detail));
        }

        let total_models = slot.run.selected_models.len() as u32;
        let previous = slot.run.progress.clone();
        if let Err(violation) =
            slot.machine
                .observe(&previous, snapshot.status, &snapshot.progress, total_models)
        {
            return Err(reject(slot, violation.to_string()));
        }

        let was = slot.run.status;
        slot.run.status = slot.machine.current();
        slot.run.progress = RunProgress {
            total_models,
            ..snapshot.progress
        };
        slot.run.updated_at = Utc::now();

        if slot.run.status == RunStatus::Failed {
            slot.run.failure = Some(RunFailure {
                kind: FailureKind::Remote,
                message: snapshot
                    .error
                    .unwrap_or_else(|| "backend reported failure".to_string()),
            });
        }

        if was != slot.run.status {
            tracing::info!(
                run_id = %run_id,
                from = %was,
                to = %slot.run.status,
                models_completed = slot.run.progress.models_completed,
                "Benchmark run status changed"
            );
        } else {
            tracing::debug!(
                run_id = %run_id,
                models_completed = slot.run.progress.models_completed,
                documents_embedded = slot.run.progress.documents_embedded,
                current_model = slot.run.progress.current_model.as_deref().unwrap_or(""),
                "Benchmark progress"
            );
        }

        Ok(slot.run.clone())
    }

    /// Ask the backend to stop `run_id`.
    ///
    /// With [`CancelMode::Wait`] the run stays in the slot and the caller
    /// keeps polling until the backend reports a terminal state. With
    /// [`CancelMode::Forget`] the run is marked `Cancelled` locally right
    /// away and the slot is free, even if the cancel request itself failed;
    /// that failure is still returned.
    pub async fn cancel(&mut self, run_id: &str, mode: CancelMode) -> RunResult<CancelOutcome> {
        let slot = self.slot_for(run_id)?;
        if slot.run.is_terminal() {
            return Ok(CancelOutcome::AlreadyTerminal(slot.run.status));
        }

        let sent = self
            .service
            .cancel(run_id)
            .await
            .map_err(|e| map_call_error("cancel", e));

        let slot = self.slot_for(run_id)?;
        match mode {
            CancelMode::Wait => {
                sent?;
                slot.run.cancel_requested = true;
                slot.run.updated_at = Utc::now();
                tracing::info!(run_id = %run_id, "Cancel requested; waiting for backend");
                Ok(CancelOutcome::Requested)
            }
            CancelMode::Forget => {
                // Any non-terminal state may move to Cancelled.
                let _ = slot
                    .machine
                    .advance(RunStatus::Cancelled, Some("abandoned locally"));
                slot.run.status = RunStatus::Cancelled;
                slot.run.cancel_requested = true;
                slot.run.updated_at = Utc::now();
                slot.run.failure = Some(RunFailure {
                    kind: FailureKind::Abandoned,
                    message: match &sent {
                        Ok(()) => "cancelled and abandoned without waiting".to_string(),
                        Err(e) => format!("abandoned; cancel request failed: {e}"),
                    },
                });
                tracing::info!(run_id = %run_id, acknowledged = sent.is_ok(), "Run abandoned");
                sent.map(|_| CancelOutcome::Abandoned)
            }
        }
    }

    /// Per-model results of a completed run, in selection order.
    ///
    /// Fetched from the backend on first call and cached for the lifetime of
    /// the slot.
    pub async fn fetch_results(&mut self, run_id: &str) -> RunResult<&RunResults> {
        let slot = self.slot_for(run_id)?;
        if slot.run.status != RunStatus::Completed {
            return Err(RunError::ResultsUnavailable {
                run_id: run_id.to_string(),
                status: slot.run.status,
            });
        }

        if slot.results.is_none() {
            let fetched = self
                .service
                .results(run_id)
                .await
                .map_err(|e| map_call_error("results", e))?;
            let slot = self.slot_for(run_id)?;
            let ordered = order_by_selection(fetched, &slot.run.selected_models);
            tracing::info!(
                run_id = %run_id,
                models = ordered.model_results.len(),
                "Benchmark results fetched"
            );
            slot.results = Some(ordered);
        }

        let slot = self.slot_for(run_id)?;
        slot.results
            .as_ref()
            .ok_or_else(|| RunError::ResultsUnavailable {
                run_id: run_id.to_string(),
                status: slot.run.status,
            })
    }

    fn slot_for(&mut self, run_id: &str) -> RunResult<&mut RunSlot> {
        match self.slot.as_mut() {
            Some(slot) if slot.run.run_id == run_id => Ok(slot),
            _ => Err(RunError::UnknownRun {
                run_id: run_id.to_string(),
            }),
        }
    }
}

fn validate_selection(model_ids: &[String]) -> RunResult<()> {
    if model_ids.is_empty() {
        return Err(RunError::InvalidSelection {
            reason: "no models selected".to_string(),
        });
    }
    if model_ids.len() > MAX_MODELS_PER_RUN {
        return Err(RunError::InvalidSelection {
            reason: format!(
                "{} models selected; at most {} per run",
                model_ids.len(),
                MAX_MODELS_PER_RUN
            ),
        });
    }
    let mut seen = HashSet::new();
    if let Some(dup) = model_ids.iter().find(|id| !seen.insert(id.as_str())) {
        return Err(RunError::InvalidSelection {
            reason: format!("model {dup} selected more than once"),
        });
    }
    Ok(())
}

fn map_call_error(operation: &str, err: ServiceError) -> RunError {
    match err {
        ServiceError::Rejected { message, .. } => RunError::UpstreamUnavailable {
            operation: operation.to_string(),
            message,
        },
        ServiceError::Transport(message) => RunError::ConnectionLost {
            operation: operation.to_string(),
            message,
        },
    }
}

/// Fail the run locally, keeping the last accepted progress.
fn reject(slot: &mut RunSlot, detail: String) -> RunError {
    tracing::warn!(run_id = %slot.run.run_id, detail = %detail, "Rejecting benchmark snapshot");
    let _ = slot.machine.fail(&detail);
    slot.run.status = RunStatus::Failed;
    slot.run.updated_at = Utc::now();
    slot.run.failure = Some(RunFailure {
        kind: FailureKind::ProtocolViolation,
        message: detail.clone(),
    });
    RunError::ProtocolViolation {
        run_id: slot.run.run_id.clone(),
        detail,
    }
}

/// Reorder results to selection order, dropping models that were not selected.
fn order_by_selection(mut results: RunResults, selected: &[String]) -> RunResults {
    let mut ordered = Vec::with_capacity(selected.len());
    for model_id in selected {
        match results
            .model_results
            .iter()
            .position(|r| &r.model_id == model_id)
        {
            Some(pos) => ordered.push(results.model_results.swap_remove(pos)),
            None => tracing::warn!(model = %model_id, "No result returned for selected model"),
        }
    }
    for extra in &results.model_results {
        tracing::warn!(model = %extra.model_id, "Dropping result for model outside the selection");
    }
    results.model_results = ordered;
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::DatasetShape;
    use crate::results::{IrMetrics, ModelResult, PerformanceMetrics};
    use crate::run::types::{StartAck, StatusSnapshot};
    use crate::service::MockBenchmarkService;

    fn models(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn ack(run_id: &str) -> StartAck {
        StartAck {
            run_id: run_id.to_string(),
            status: Some(RunStatus::Running),
            message: None,
        }
    }

    fn snapshot(run_id: &str, status: RunStatus, models_done: u32, docs: u64) -> StatusSnapshot {
        StatusSnapshot {
            run_id: run_id.to_string(),
            status,
            progress: RunProgress {
                models_completed: models_done,
                total_models: 2,
                documents_embedded: docs,
                total_documents: 100,
                ..Default::default()
            },
            error: None,
        }
    }

    fn result(id: &str) -> ModelResult {
        ModelResult {
            model_id: id.to_string(),
            ir_metrics: IrMetrics::default(),
            performance: PerformanceMetrics::default(),
            per_query_results: Vec::new(),
        }
    }

    async fn started(mut mock: MockBenchmarkService) -> RunController<MockBenchmarkService> {
        mock.expect_start().returning(|_| Ok(ack("r1")));
        let mut controller = RunController::new(mock);
        controller
            .start("ds", &models(&["a", "b"]), MetricConfig::default())
            .await
            .unwrap();
        controller
    }

    #[tokio::test]
    async fn test_start_returns_optimistic_handle() {
        let mut mock = MockBenchmarkService::new();
        mock.expect_start()
            .withf(|req| req.dataset_id == "ds" && req.model_ids.len() == 2)
            .times(1)
            .returning(|_| {
                Ok(StartAck {
                    run_id: "r1".into(),
                    status: None,
                    message: Some("Benchmark started".into()),
                })
            });
        let mut controller = RunController::new(mock);

        let handle = controller
            .start("ds", &models(&["a", "b"]), MetricConfig::default())
            .await
            .unwrap();
        assert_eq!(handle.run_id, "r1");
        assert_eq!(handle.status, RunStatus::Queued);
        assert_eq!(handle.progress.models_completed, 0);
        assert_eq!(handle.progress.total_models, 2);
        assert!(controller.is_active());
    }

    #[tokio::test]
    async fn test_start_rejects_bad_selection() {
        let mut mock = MockBenchmarkService::new();
        mock.expect_start().never();
        let mut controller = RunController::new(mock);

        let err = controller
            .start("ds", &[], MetricConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::InvalidSelection { .. }));

        let err = controller
            .start("ds", &models(&["a", "a"]), MetricConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::InvalidSelection { .. }));

        let seven = models(&["1", "2", "3", "4", "5", "6", "7"]);
        let err = controller
            .start("ds", &seven, MetricConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::InvalidSelection { .. }));
        assert!(controller.current().is_none());
    }

    #[tokio::test]
    async fn test_start_while_active_is_refused() {
        let mut controller = started(MockBenchmarkService::new()).await;
        let err = controller
            .start("ds", &models(&["c"]), MetricConfig::default())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RunError::RunAlreadyActive {
                run_id: "r1".into()
            }
        );
    }

    #[tokio::test]
    async fn test_start_failure_is_upstream_unavailable() {
        let mut mock = MockBenchmarkService::new();
        mock.expect_start()
            .returning(|_| Err(ServiceError::Transport("connection refused".into())));
        let mut controller = RunController::new(mock);
        let err = controller
            .start("ds", &models(&["a"]), MetricConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::UpstreamUnavailable { .. }));
        assert!(!controller.is_active());
    }

    #[tokio::test]
    async fn test_poll_transport_failure_keeps_state() {
        let mut mock = MockBenchmarkService::new();
        mock.expect_status()
            .times(1)
            .returning(|_| Err(ServiceError::Transport("timed out".into())));
        let mut controller = started(mock).await;

        let err = controller.poll("r1").await.unwrap_err();
        assert!(matches!(err, RunError::ConnectionLost { .. }));
        assert_eq!(controller.current().unwrap().status, RunStatus::Running);
        assert!(controller.is_active());
    }

    #[tokio::test]
    async fn test_poll_rejection_is_upstream_unavailable() {
        let mut mock = MockBenchmarkService::new();
        mock.expect_status().returning(|_| {
            Err(ServiceError::Rejected {
                status: Some(404),
                message: "Run 'r1' not found".into(),
            })
        });
        let mut controller = started(mock).await;
        let err = controller.poll("r1").await.unwrap_err();
        assert!(matches!(err, RunError::UpstreamUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_progress_decrease_fails_run() {
        let mut mock = MockBenchmarkService::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_status()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(snapshot("r1", RunStatus::Running, 1, 60)));
        mock.expect_status()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(snapshot("r1", RunStatus::Running, 0, 80)));
        let mut controller = started(mock).await;

        controller.poll("r1").await.unwrap();
        let err = controller.poll("r1").await.unwrap_err();
        assert!(matches!(err, RunError::ProtocolViolation { .. }));

        let run = controller.current().unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.progress.models_completed, 1);
        assert_eq!(
            run.failure.as_ref().map(|f| f.kind),
            Some(FailureKind::ProtocolViolation)
        );

        // Terminal: served locally, no further request (times(1) above).
        let again = controller.poll("r1").await.unwrap();
        assert_eq!(again.status, RunStatus::Failed);
    }

    #[tokio::test]
    async fn test_estimate_reads_dataset_shape() {
        let mut mock = MockBenchmarkService::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_dataset()
            .withf(|id| id == "ds")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(DatasetShape {
                    document_count: 1000,
                    avg_doc_length: 400.0,
                })
            });
        mock.expect_dataset()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(ServiceError::Transport("refused".into())));
        mock.expect_start().never();
        let controller = RunController::new(mock);

        let pricing = [
            ModelPricing {
                model_id: "paid".into(),
                price_per_1k_tokens: 0.0001,
            },
            ModelPricing {
                model_id: "free".into(),
                price_per_1k_tokens: 0.0,
            },
        ];
        let estimate = controller.estimate("ds", &pricing).await.unwrap();
        assert_eq!(estimate.estimated_tokens, 100_000.0);
        assert_eq!(estimate.paid_models, 1);
        assert!((estimate.cost_usd - 0.01).abs() < 1e-12);
        assert!(controller.current().is_none());

        let err = controller.estimate("ds", &pricing).await.unwrap_err();
        assert!(matches!(err, RunError::ConnectionLost { ref operation, .. } if operation == "dataset"));
    }

    #[tokio::test]
    async fn test_total_models_follows_selection() {
        let mut mock = MockBenchmarkService::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_status()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                let mut snap = snapshot("r1", RunStatus::Running, 0, 10);
                snap.progress.total_models = 0;
                Ok(snap)
            });
        mock.expect_status()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                let mut snap = snapshot("r1", RunStatus::Running, 1, 20);
                snap.progress.total_models = 7;
                Ok(snap)
            });
        let mut controller = started(mock).await;

        // Unset on the backend: the selection size is kept.
        let snap = controller.poll("r1").await.unwrap();
        assert_eq!(snap.progress.total_models, 2);

        let err = controller.poll("r1").await.unwrap_err();
        assert!(matches!(err, RunError::ProtocolViolation { .. }));
        let run = controller.current().unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.progress.total_models, 2);
        assert_eq!(run.progress.documents_embedded, 10);
    }

    #[tokio::test]
    async fn test_remote_failure_is_recorded() {
        let mut mock = MockBenchmarkService::new();
        mock.expect_status().times(1).returning(|_| {
            let mut snap = snapshot("r1", RunStatus::Failed, 1, 100);
            snap.error = Some("CUDA out of memory".into());
            Ok(snap)
        });
        let mut controller = started(mock).await;

        let run = controller.poll("r1").await.unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        let failure = run.failure.unwrap();
        assert_eq!(failure.kind, FailureKind::Remote);
        assert_eq!(failure.message, "CUDA out of memory");
        assert!(!controller.is_active());
    }

    #[tokio::test]
    async fn test_unknown_run_id() {
        let mut controller = started(MockBenchmarkService::new()).await;
        let err = controller.poll("other").await.unwrap_err();
        assert_eq!(
            err,
            RunError::UnknownRun {
                run_id: "other".into()
            }
        );
    }

    #[tokio::test]
    async fn test_cancel_wait_keeps_tracking() {
        let mut mock = MockBenchmarkService::new();
        mock.expect_cancel().times(1).returning(|_| Ok(()));
        let mut controller = started(mock).await;

        let outcome = controller.cancel("r1", CancelMode::Wait).await.unwrap();
        assert_eq!(outcome, CancelOutcome::Requested);
        let run = controller.current().unwrap();
        assert_eq!(run.status, RunStatus::Running);
        assert!(run.cancel_requested);
        assert!(controller.is_active());
    }

    #[tokio::test]
    async fn test_cancel_forget_frees_slot_even_on_failure() {
        let mut mock = MockBenchmarkService::new();
        mock.expect_cancel()
            .times(1)
            .returning(|_| Err(ServiceError::Transport("reset by peer".into())));
        mock.expect_start().returning(|_| Ok(ack("r2")));
        let mut controller = RunController::new(mock);
        controller
            .start("ds", &models(&["a"]), MetricConfig::default())
            .await
            .unwrap();
        let first = controller.current().unwrap().run_id.clone();

        let err = controller
            .cancel(&first, CancelMode::Forget)
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::ConnectionLost { .. }));
        let run = controller.current().unwrap();
        assert_eq!(run.status, RunStatus::Cancelled);
        assert_eq!(
            run.failure.as_ref().map(|f| f.kind),
            Some(FailureKind::Abandoned)
        );
        assert!(!controller.is_active());

        // Slot is free for a new run.
        assert!(controller
            .start("ds", &models(&["b"]), MetricConfig::default())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_cancel_after_terminal_is_noop() {
        let mut mock = MockBenchmarkService::new();
        mock.expect_status()
            .returning(|_| Ok(snapshot("r1", RunStatus::Completed, 2, 100)));
        mock.expect_cancel().never();
        let mut controller = started(mock).await;
        controller.poll("r1").await.unwrap();

        let outcome = controller.cancel("r1", CancelMode::Wait).await.unwrap();
        assert_eq!(outcome, CancelOutcome::AlreadyTerminal(RunStatus::Completed));
    }

    #[tokio::test]
    async fn test_results_only_after_completion_and_cached() {
        let mut mock = MockBenchmarkService::new();
        mock.expect_status()
            .times(1)
            .returning(|_| Ok(snapshot("r1", RunStatus::Completed, 2, 100)));
        mock.expect_results().times(1).returning(|_| {
            Ok(RunResults {
                run_id: "r1".into(),
                dataset_id: "ds".into(),
                model_results: vec![result("stray"), result("b"), result("a")],
                top_k_values: vec![1, 5, 10],
                similarity_metric: "cosine".into(),
            })
        });
        let mut controller = started(mock).await;

        let err = controller.fetch_results("r1").await.unwrap_err();
        assert!(matches!(err, RunError::ResultsUnavailable { .. }));

        controller.poll("r1").await.unwrap();
        let ids: Vec<String> = controller
            .fetch_results("r1")
            .await
            .unwrap()
            .model_results
            .iter()
            .map(|r| r.model_id.clone())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);

        // Second call is served from cache (results expected once).
        assert_eq!(
            controller.fetch_results("r1").await.unwrap().model_results.len(),
            2
        );
    }

    #[tokio::test]
    async fn test_transition_log() {
        let mut mock = MockBenchmarkService::new();
        mock.expect_status()
            .returning(|_| Ok(snapshot("r1", RunStatus::Completed, 2, 100)));
        mock.expect_start().returning(|_| {
            Ok(StartAck {
                run_id: "r1".into(),
                status: None,
                message: None,
            })
        });
        let mut controller = RunController::new(mock);
        controller
            .start("ds", &models(&["a", "b"]), MetricConfig::default())
            .await
            .unwrap();
        controller.poll("r1").await.unwrap();

        let log = controller.transitions();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].from, RunStatus::Queued);
        assert_eq!(log[0].to, RunStatus::Completed);
    }
}
