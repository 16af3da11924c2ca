use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use oncohub_lib::config::{self, AppConfig};
use oncohub_lib::models::{HubModule, MetricSpec, Reducer, ResourceType};
use oncohub_lib::pipeline::{self, format_aggregate, PatientQuery, Pipeline};

/// Fetch lab/genomic results for patients, summarize them and request
/// treatment-suggestion insights. Connection settings come from the
/// environment (or a .env file).
#[derive(Parser)]
#[command(name = "oncohub", version)]
struct Cli {
    /// Patient identifiers to query
    #[arg(required = true)]
    patients: Vec<String>,

    /// FHIR resource type (Observation or DiagnosticReport)
    #[arg(long, default_value = "Observation")]
    resource: ResourceType,

    /// Hub module that frames the insight (e.g. mutation_risk, tumor_evolution)
    #[arg(long, default_value = "mutation_risk")]
    module: HubModule,

    /// mean, sum or count
    #[arg(long, default_value = "mean")]
    reducer: Reducer,

    /// Only aggregate results for this test name
    #[arg(long)]
    test: Option<String>,

    /// Only aggregate final results
    #[arg(long)]
    final_only: bool,

    /// Skip the reasoning-service call
    #[arg(long)]
    no_insight: bool,

    /// Write each patient's records to CSV under this directory
    /// (defaults to the app data exports directory when given without a value)
    #[arg(long)]
    export: Option<Option<PathBuf>>,
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    oncohub_lib::init_tracing();

    let cli = Cli::parse();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = AppConfig::from_env().context("loading configuration")?;

    let reducer = cli.reducer;
    let mut metric = if reducer == Reducer::Mean && cli.test.is_none() {
        MetricSpec::mutation_risk()
    } else {
        MetricSpec::new(format!("value_{reducer}"), reducer)
    };
    if let Some(test) = &cli.test {
        metric = metric.for_test(test.as_str());
    }
    if cli.final_only {
        metric = metric.final_only();
    }

    let queries = cli
        .patients
        .iter()
        .map(|id| PatientQuery::new(id, cli.resource))
        .collect::<Result<Vec<_>, _>>()
        .context("invalid patient identifier")?;

    let mut hub = if cli.no_insight {
        Pipeline::without_insights(&config)?
    } else {
        Pipeline::new(&config)?
    };
    let outcomes = hub.run(&config.credentials(), &queries, &metric, cli.module)?;

    println!("== {} ==", cli.module.title());
    for outcome in &outcomes {
        let patient_id = outcome.query.patient_id();
        println!("\nPatient {patient_id}");

        let report = match &outcome.result {
            Ok(report) => report,
            Err(e) => {
                println!("  fetch failed: {e}");
                continue;
            }
        };

        if report.records.is_empty() {
            println!("  no {} data found", outcome.query.resource_type());
        }
        for record in &report.records {
            println!(
                "  {:<24} {:<16} {}",
                record.test_name, record.value.to_string(), record.status
            );
        }
        println!("  {}", format_aggregate(&report.aggregate));

        match &report.insight {
            Some(Ok(insight)) => println!("\n  Insight ({}):\n{}", insight.model, insight.text),
            Some(Err(e)) => println!("\n  insight unavailable: {e}"),
            None => {}
        }

        if let Some(target) = &cli.export {
            let default_path = pipeline::default_export_path(patient_id);
            let path = match target {
                Some(dir) => dir.join(default_path.file_name().context("export file name")?),
                None => default_path,
            };
            let rows = pipeline::export_to_file(&path, &report.records)
                .with_context(|| format!("exporting {}", path.display()))?;
            println!("  exported {rows} rows to {}", path.display());
        }
    }

    Ok(())
}
