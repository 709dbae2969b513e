use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use glucose_pipeline::app::daily_batch_use_case::DailyBatchUseCase;
use glucose_pipeline::config::Config;
use glucose_pipeline::infra::{CsvPatientSource, JsonDatasetSink};
use glucose_pipeline::observability;
use glucose_pipeline::pipeline::context::PipelineContext;
use glucose_pipeline::pipeline::BatchSummary;

#[derive(Parser)]
#[command(name = "glucose_pipeline")]
#[command(about = "Daily patient glucose batch: redact, validate, enrich and partition")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one day's batch and write both completeness datasets
    Run(BatchArgs),
    /// Process one day's batch and print the counts without writing
    Inspect(BatchArgs),
}

#[derive(Args)]
struct BatchArgs {
    /// Batch date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    date: Option<String>,
    /// Config file; defaults to pipeline.toml if present
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the input directory
    #[arg(long)]
    input_dir: Option<PathBuf>,
    /// Override the output directory
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

impl BatchArgs {
    fn context(&self, config: &Config) -> anyhow::Result<PipelineContext> {
        let batch_date = match &self.date {
            Some(d) => PipelineContext::parse_date(d)?,
            None => chrono::Local::now().date_naive(),
        };
        let input_dir = self.input_dir.clone().unwrap_or_else(|| config.paths.input_dir.clone());
        let output_dir = self.output_dir.clone().unwrap_or_else(|| config.paths.output_dir.clone());
        Ok(PipelineContext::new(batch_date, input_dir, output_dir))
    }
}

fn print_summary(summary: &BatchSummary) {
    println!("\n📊 Batch {}:", summary.batch_date);
    println!("   Loaded: {}", summary.loaded);
    println!("   Rejected (out of range): {}", summary.rejected);
    println!("   Complete: {}", summary.complete);
    println!("   With missed readings: {}", summary.incomplete);
    for (level, count) in &summary.levels {
        println!("   {}: {}", level, count);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load environment variables
    dotenv::dotenv().ok();

    let args = match &cli.command {
        Commands::Run(args) | Commands::Inspect(args) => args,
    };
    let config = Config::load(args.config.as_deref())?;

    let _log_guard = observability::init_logging(&config.logging)?;
    let metrics = observability::metrics::init(config.metrics.textfile.as_deref())?;

    let ctx = args.context(&config)?;
    info!(
        batch_date = %ctx.date_str(),
        input = %ctx.input_path().display(),
        output_dir = %ctx.output_dir().display(),
        "Starting batch"
    );

    let use_case = DailyBatchUseCase::with_default_processor(
        Box::new(CsvPatientSource::new()),
        Box::new(JsonDatasetSink::new()),
    );

    let outcome = match cli.command {
        Commands::Run(_) => {
            println!("🚀 Running batch for {}...", ctx.date_str());
            use_case.run(&ctx).await.map(|report| {
                print_summary(&report.summary);
                for receipt in &report.receipts {
                    println!("   Output: {} ({} records)", receipt.location.display(), receipt.record_count);
                }
            })
        }
        Commands::Inspect(_) => {
            println!("🔍 Inspecting batch for {}...", ctx.date_str());
            use_case.inspect(&ctx).await.map(|summary| print_summary(&summary))
        }
    };

    if let Some(metrics) = &metrics {
        metrics.flush()?;
    }

    outcome?;
    println!("✅ Done");
    Ok(())
}
