use anyhow::{Context, Result};
use clap::Parser;
use comparison::cost::{estimate_cost, DatasetShape, ModelPricing};
use comparison::service::BenchmarkService;
use comparison::results::report_schema;
use comparison::run::{MetricConfig, RunController};
use comparison::service::HttpBenchmarkService;
use embed_compare::cli::{Cli, Commands, EstimateArgs, RankArgs, RunArgs};
use embed_compare::config::CompareConfig;
use embed_compare::output;
use embed_compare::runner::{self, RunOptions, RunOutcome};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = CompareConfig::load(cli.config.as_deref(), cli.url.as_deref(), &cli.weights)?;

    match cli.command {
        Commands::Models => {
            print!("{}", output::format_catalog(&config.catalog));
        }
        Commands::Estimate(args) => estimate(&config, args).await?,
        Commands::Run(args) => run(&config, args).await?,
        Commands::Rank(args) => rank(&config, args)?,
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&report_schema())?);
        }
    }
    Ok(())
}

async fn estimate(config: &CompareConfig, args: EstimateArgs) -> Result<()> {
    let pricing = pricing_for(config, &args.models);
    let shape = match (args.dataset.as_deref(), args.documents, args.avg_doc_length) {
        (Some(dataset), _, _) => {
            let service = HttpBenchmarkService::new(&config.service)
                .context("Failed to set up benchmark service client")?;
            service
                .dataset(dataset)
                .await
                .with_context(|| format!("Failed to read dataset {}", dataset))?
        }
        (None, Some(document_count), Some(avg_doc_length)) => DatasetShape {
            document_count,
            avg_doc_length,
        },
        _ => anyhow::bail!("Give --dataset, or both --documents and --avg-doc-length"),
    };
    let estimate = estimate_cost(&shape, &pricing);
    print!("{}", output::format_estimate(&estimate));
    Ok(())
}

fn pricing_for(config: &CompareConfig, models: &[String]) -> Vec<ModelPricing> {
    for id in models {
        if config.catalog.get(id).is_none() {
            warn!(model = %id, "Model not in catalog; treated as free");
        }
    }
    ModelPricing::from_catalog(&config.catalog, models)
}

async fn run(config: &CompareConfig, args: RunArgs) -> Result<()> {
    let service = HttpBenchmarkService::new(&config.service)
        .context("Failed to set up benchmark service client")?;
    info!(
        url = %service.base_url(),
        dataset = %args.dataset,
        models = args.models.len(),
        "Starting comparison"
    );

    let metric_config = MetricConfig {
        top_k_values: args.top_k.clone(),
        similarity_metric: args.similarity.into(),
        normalize_embeddings: !args.no_normalize,
    };
    let options = RunOptions {
        poll_interval: config.service.poll_interval,
        forget_on_interrupt: args.forget_on_interrupt,
        ..RunOptions::default()
    };
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    let mut controller = RunController::new(service);
    runner::preflight(&controller, &args.dataset, &pricing_for(config, &args.models)).await;
    let outcome = runner::execute(
        &mut controller,
        &args.dataset,
        &args.models,
        metric_config,
        &options,
        interrupt,
    )
    .await?;

    match outcome {
        RunOutcome::Completed { run, results } => {
            let (report, records) =
                output::build_report(&results, run.progress.elapsed_seconds, &config.weights);
            if let Some(leader) = report.ranking.leader() {
                info!(
                    run_id = %run.run_id,
                    leader = %leader.model_id,
                    score = leader.composite_score,
                    "Comparison complete"
                );
            }
            let text = output::render(&report, &records, None, args.format.into())?;
            output::write_output(&text, args.output.as_deref())
        }
        RunOutcome::Cancelled(run) => {
            warn!(run_id = %run.run_id, "Run cancelled; no report produced");
            Ok(())
        }
        RunOutcome::Failed(run) => {
            let reason = run
                .failure
                .map(|f| f.message)
                .unwrap_or_else(|| "unknown failure".to_string());
            anyhow::bail!("Run {} failed: {}", run.run_id, reason)
        }
    }
}

fn rank(config: &CompareConfig, args: RankArgs) -> Result<()> {
    let results = output::load_results(&args.results)?;
    let (report, records) = output::build_report(&results, 0.0, &config.weights);
    if report.ranking.degenerate_weights {
        warn!("All ranking weights are zero; every model scores 0");
    }
    let show = args.show.map(|a| a.class());
    let text = output::render(&report, &records, show, args.format.into())?;
    output::write_output(&text, args.output.as_deref())
}
