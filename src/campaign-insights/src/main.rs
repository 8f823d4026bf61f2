//! Campaign Insights: marketing workbook to cleaned sheets, analyses and
//! an HTML report.

mod pipeline;

use clap::{Args, Parser, Subcommand};
use insights_core::PipelineConfig;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "campaign-insights")]
#[command(about = "Marketing analytics pipeline: ingest, clean, analyse and report")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Default)]
struct GlobalArgs {
    /// TOML configuration file
    #[arg(long, global = true, env = "CAMPAIGN_INSIGHTS_CONFIG")]
    config: Option<PathBuf>,

    /// Workbook file (.xlsx, .xls, .ods), CSV directory or CSV file (overrides config)
    #[arg(long, global = true)]
    input: Option<PathBuf>,

    /// Directory for clean sheets, the artifact and the report (overrides config)
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Number of k-means clusters (overrides config)
    #[arg(long, global = true)]
    cluster_count: Option<usize>,

    /// Column the forecaster predicts (overrides config)
    #[arg(long, global = true)]
    forecast_target: Option<String>,

    /// Seed for every random choice in the analyses (overrides config)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Emit logs as JSON lines
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the whole pipeline
    Run,
    /// Ingest and clean the workbook, writing the clean sheets
    Clean,
    /// Analyse previously written clean sheets
    Analyze,
    /// Render the report from an existing insights.json
    Render {
        /// Artifact to render; defaults to <output-dir>/insights.json
        #[arg(long)]
        artifact: Option<PathBuf>,
    },
    /// Serve an existing insights.json over HTTP
    Serve {
        #[arg(long)]
        artifact: Option<PathBuf>,
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
}

impl GlobalArgs {
    fn apply(&self, config: &mut PipelineConfig) {
        if let Some(input) = &self.input {
            config.input_path = input.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(k) = self.cluster_count {
            config.cluster_count = k;
        }
        if let Some(target) = &self.forecast_target {
            config.forecast_target = target.clone();
        }
        if let Some(seed) = self.seed {
            config.random_seed = seed;
        }
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "campaign_insights=info,insights_=info,tower_http=info".into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.log_json);

    let mut config = PipelineConfig::load(cli.global.config.as_deref())?;
    cli.global.apply(&mut config);
    config.validate()?;

    info!(
        input = %config.input_path.display(),
        output_dir = %config.output_dir.display(),
        cluster_count = config.cluster_count,
        forecast_target = %config.forecast_target,
        seed = config.random_seed,
        "Configuration loaded"
    );

    match cli.command {
        Command::Run => {
            let (_, summary) = pipeline::run(&config)?;
            println!("{summary}");
        }
        Command::Clean => {
            let output = pipeline::clean(&config)?;
            for report in &output.reports {
                println!(
                    "{}: {} rows in, {} out, {} duplicates, {} dropped",
                    report.sheet,
                    report.rows_in,
                    report.rows_out,
                    report.duplicates_removed,
                    report.rows_dropped
                );
            }
        }
        Command::Analyze => {
            let (artifact, path) = pipeline::analyze(&config)?;
            info!(path = %path.display(), degraded = artifact.degraded.len(), "Analysis written");
        }
        Command::Render { artifact } => {
            let path = artifact.unwrap_or_else(|| pipeline::artifact_path(&config));
            let artifact = pipeline::load_artifact(&path)?;
            let (report, summary) = pipeline::render(&artifact, &config)?;
            println!("{summary}");
            info!(path = %report.display(), "Report rendered");
        }
        Command::Serve {
            artifact,
            host,
            port,
        } => {
            if let Some(host) = host {
                config.report.host = host;
            }
            if let Some(port) = port {
                config.report.port = port;
            }
            let path = artifact.unwrap_or_else(|| pipeline::artifact_path(&config));
            let artifact = pipeline::load_artifact(&path)?;
            pipeline::serve(&config, artifact).await?;
        }
    }

    Ok(())
}
