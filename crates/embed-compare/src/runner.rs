//! Polling loop that follows a run from start to a terminal state.
//!
//! The controller in `comparison` never waits on its own; this module owns
//! the cadence. It polls on a fixed interval, tolerates a bounded number of
//! consecutive transport failures, and turns an interrupt into a cancel.

use std::future::Future;
use std::time::Duration;

use anyhow::{bail, Result};
use comparison::cost::{CostEstimate, ModelPricing};
use comparison::results::RunResults;
use comparison::run::{
    BenchmarkRun, CancelMode, CancelOutcome, MetricConfig, RunController, RunError, RunSnapshot,
    RunStatus,
};
use comparison::service::BenchmarkService;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

/// Knobs for [`execute`].
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub poll_interval: Duration,
    /// Abandon locally on interrupt instead of waiting for the backend.
    pub forget_on_interrupt: bool,
    /// How long to keep polling for a confirmed cancel before abandoning.
    pub cancel_grace: Duration,
    /// Consecutive retryable failures tolerated before giving up.
    pub max_consecutive_errors: u32,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
            forget_on_interrupt: false,
            cancel_grace: Duration::from_secs(30),
            max_consecutive_errors: 5,
        }
    }
}

/// How a followed run ended.
#[derive(Debug)]
pub enum RunOutcome {
    Completed {
        run: BenchmarkRun,
        results: RunResults,
    },
    Cancelled(BenchmarkRun),
    Failed(BenchmarkRun),
}

impl RunOutcome {
    pub fn run(&self) -> &BenchmarkRun {
        match self {
            Self::Completed { run, .. } | Self::Cancelled(run) | Self::Failed(run) => run,
        }
    }
}

/// Log the estimated API spend of a run before it starts.
///
/// The estimate is informational; when the dataset cannot be read the run
/// goes ahead without one.
pub async fn preflight<S: BenchmarkService>(
    controller: &RunController<S>,
    dataset: &str,
    pricing: &[ModelPricing],
) -> Option<CostEstimate> {
    match controller.estimate(dataset, pricing).await {
        Ok(estimate) => {
            info!(dataset, estimate = %estimate.summary(), "Estimated API cost (upper bound)");
            Some(estimate)
        }
        Err(e) => {
            warn!(dataset, error = %e, "No cost estimate; dataset shape unavailable");
            None
        }
    }
}

/// Start a run and follow it until it ends or `interrupt` resolves.
pub async fn execute<S, F>(
    controller: &mut RunController<S>,
    dataset: &str,
    models: &[String],
    metric_config: MetricConfig,
    options: &RunOptions,
    interrupt: F,
) -> Result<RunOutcome>
where
    S: BenchmarkService,
    F: Future<Output = ()>,
{
    let handle = controller.start(dataset, models, metric_config).await?;
    info!(run_id = %handle.run_id, "Following benchmark run");
    follow(controller, &handle.run_id, options, interrupt).await
}

/// Poll `run_id` until it reaches a terminal state.
pub async fn follow<S, F>(
    controller: &mut RunController<S>,
    run_id: &str,
    options: &RunOptions,
    interrupt: F,
) -> Result<RunOutcome>
where
    S: BenchmarkService,
    F: Future<Output = ()>,
{
    // tokio's interval panics on a zero period.
    let period = options.poll_interval.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(interrupt);

    let mut interrupted = false;
    let mut cancel_deadline: Option<Instant> = None;
    let mut failures = 0u32;

    loop {
        tokio::select! {
            _ = &mut interrupt, if !interrupted => {
                interrupted = true;
                let mode = if options.forget_on_interrupt {
                    CancelMode::Forget
                } else {
                    CancelMode::Wait
                };
                warn!(run_id = %run_id, ?mode, "Interrupted; cancelling run");
                match controller.cancel(run_id, mode).await {
                    Ok(CancelOutcome::Requested) => {
                        cancel_deadline = Some(Instant::now() + options.cancel_grace);
                    }
                    Ok(CancelOutcome::Abandoned) => break,
                    Ok(CancelOutcome::AlreadyTerminal(status)) => {
                        info!(run_id = %run_id, %status, "Run already finished");
                        break;
                    }
                    Err(e) => {
                        // Forget has already released the run; Wait cannot
                        // proceed without an acknowledged cancel.
                        warn!(run_id = %run_id, error = %e, "Cancel request failed; abandoning run");
                        if mode == CancelMode::Wait {
                            abandon(controller, run_id).await;
                        }
                        break;
                    }
                }
            }
            _ = ticker.tick() => {
                if cancel_deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                    warn!(run_id = %run_id, "Cancel not confirmed in time; abandoning run");
                    abandon(controller, run_id).await;
                    break;
                }
                match controller.poll(run_id).await {
                    Ok(snapshot) => {
                        failures = 0;
                        log_progress(&snapshot);
                        if snapshot.is_terminal() {
                            break;
                        }
                    }
                    Err(e @ RunError::ProtocolViolation { .. }) => {
                        warn!(run_id = %run_id, error = %e, "Run failed locally");
                        break;
                    }
                    Err(e) if e.is_retryable() => {
                        failures += 1;
                        warn!(run_id = %run_id, error = %e, failures, "Poll failed");
                        if failures >= options.max_consecutive_errors {
                            return Err(e.into());
                        }
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }

    let Some(run) = controller.current().cloned() else {
        bail!("run {run_id} is no longer tracked");
    };
    match run.status {
        RunStatus::Completed => {
            let results = fetch_results(controller, run_id, options).await?;
            Ok(RunOutcome::Completed { run, results })
        }
        RunStatus::Cancelled => Ok(RunOutcome::Cancelled(run)),
        RunStatus::Failed => Ok(RunOutcome::Failed(run)),
        status => bail!("run {run_id} left the poll loop in non-terminal state {status}"),
    }
}

/// Release the run locally. The slot is freed even when the backend does
/// not acknowledge the cancel.
async fn abandon<S: BenchmarkService>(controller: &mut RunController<S>, run_id: &str) {
    if let Err(e) = controller.cancel(run_id, CancelMode::Forget).await {
        warn!(run_id = %run_id, error = %e, "Cancel request failed while abandoning run");
    }
}

async fn fetch_results<S: BenchmarkService>(
    controller: &mut RunController<S>,
    run_id: &str,
    options: &RunOptions,
) -> Result<RunResults> {
    let mut failures = 0u32;
    loop {
        match controller.fetch_results(run_id).await {
            Ok(results) => return Ok(results.clone()),
            Err(e) if e.is_retryable() && failures + 1 < options.max_consecutive_errors => {
                failures += 1;
                warn!(run_id = %run_id, error = %e, failures, "Fetching results failed");
                tokio::time::sleep(options.poll_interval).await;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn log_progress(snapshot: &RunSnapshot) {
    let p = &snapshot.progress;
    info!(
        run_id = %snapshot.run_id,
        status = %snapshot.status,
        models = %format!("{}/{}", p.models_completed, p.total_models),
        documents = %format!("{}/{}", p.documents_embedded, p.total_documents),
        percent = %format!("{:.0}", p.model_fraction() * 100.0),
        current_model = p.current_model.as_deref().unwrap_or("-"),
        eta_seconds = p.eta_seconds.unwrap_or(0.0),
        "Benchmark progress"
    );
}
