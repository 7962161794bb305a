use std::path::PathBuf;

use anyhow::Context as _;
use clap::{ArgGroup, Parser};
use mediashift::{AssetJob, Orchestrator, PipelineConfig, UniquenessLevel, write_reports};

#[derive(Parser, Debug)]
#[command(name = "mediashift", version, about)]
#[command(group(ArgGroup::new("mode").required(true).args(["cli", "preview", "analyze"])))]
struct Cli {
    /// Transform `<input>` into `<output>` at `<level>`.
    #[arg(long)]
    cli: bool,

    /// Transform only the first seconds of `<input>` into `<output>`.
    #[arg(long)]
    preview: bool,

    /// Fingerprint `<input>` and print the result as JSON.
    #[arg(long)]
    analyze: bool,

    /// Source image or video.
    input: PathBuf,

    /// Output path.
    output: Option<PathBuf>,

    /// Uniqueness level (1 = low, 2 = medium, 3 = high).
    #[arg(value_parser = clap::value_parser!(u8).range(1..=3))]
    level: Option<u8>,

    /// Fixed seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,

    /// Pipeline config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the checkpoint directory.
    #[arg(long)]
    checkpoint_dir: Option<PathBuf>,

    /// Override frame worker threads.
    #[arg(long)]
    threads: Option<usize>,

    /// Minimum mean hash delta in percent; the report flags runs that miss it.
    #[arg(long)]
    target_delta: Option<f64>,

    /// Write the run report JSON here.
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut cfg = match &cli.config {
        Some(path) => PipelineConfig::from_json_path(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = &cli.checkpoint_dir {
        cfg.checkpoint_dir = dir.clone();
    }
    if cli.threads.is_some() {
        cfg.threads = cli.threads;
    }
    if cli.target_delta.is_some() {
        cfg.target_delta_percent = cli.target_delta;
    }
    let orchestrator = Orchestrator::with_ffmpeg(cfg)?;

    if cli.analyze {
        let analysis = orchestrator.analyze_source(&cli.input)?;
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    let (Some(output), Some(level)) = (cli.output.clone(), cli.level) else {
        anyhow::bail!("usage: mediashift --cli <input> <output> <level>");
    };
    let mut job = AssetJob::new(&cli.input, output, UniquenessLevel::new(level)?);
    if let Some(seed) = cli.seed {
        job = job.with_seed(seed);
    }

    let report = if cli.preview {
        orchestrator.preview(&job)?
    } else {
        orchestrator.outcome(&job)
    };
    if let Some(path) = &cli.report {
        write_reports(path, std::slice::from_ref(&report))
            .with_context(|| format!("write report '{}'", path.display()))?;
    }
    println!("{}", report.to_json_pretty()?);

    if !report.is_success() {
        anyhow::bail!(
            "{} {}: {}",
            cli.input.display(),
            match report.status {
                mediashift::RunStatus::Cancelled => "cancelled",
                _ => "failed",
            },
            report.reason.as_deref().unwrap_or("unknown error")
        );
    }
    eprintln!("wrote {}", report.output.display());
    Ok(())
}
