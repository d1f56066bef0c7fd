use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{info, warn};
use uuid::Uuid;

use mml_config::{HarnessConfig, LoadedConfig, UnusedKeyPolicy};
use mml_probe::{ProbeSettings, ProcessRunner};
use mml_trace::Trace;

#[derive(Parser)]
#[command(name = "mml")]
#[command(about = "Memory-allocator lab grading harness", long_about = None)]
struct Cli {
    /// Layered config paths in merge order (defaults are always the bottom layer)
    #[arg(long = "config", global = true)]
    config_paths: Vec<String>,

    /// Fail instead of warning when a config layer sets keys nothing reads
    #[arg(long, global = true, default_value_t = false)]
    strict_config: bool,

    #[command(subcommand)]
    cmd: Option<Commands>,

    /// Run options; global so they apply before or after the subcommand
    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild, evaluate every trace, print the table and score (default)
    Grade,

    /// List discovered traces with their operation counts
    ListTraces,

    /// Compute layered config hash + print canonical JSON
    ConfigHash,
}

#[derive(Args, Clone, Default)]
struct RunArgs {
    /// Override traces.dir
    #[arg(long, global = true)]
    traces_dir: Option<PathBuf>,

    /// Do not run the clean rebuild first
    #[arg(long, global = true, default_value_t = false)]
    skip_build: bool,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Write <dir>/<run_id>/{manifest.json,grade_report.json}
    #[arg(long, global = true)]
    export_dir: Option<PathBuf>,
}

#[derive(Copy, Clone, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();
    let policy = if cli.strict_config {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let loaded = load_config(&cli.config_paths, policy)?;

    match cli.cmd {
        None | Some(Commands::Grade) => grade(loaded, cli.run).await,

        Some(Commands::ListTraces) => {
            let mut cfg = loaded.config;
            if let Some(dir) = cli.run.traces_dir {
                cfg.traces.dir = dir;
            }
            list_traces(&cfg)
        }

        Some(Commands::ConfigHash) => {
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
            Ok(())
        }
    }
}

/// Logs go to stderr so stdout stays the report (table or JSON).
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();
}

fn load_config(paths: &[String], policy: UnusedKeyPolicy) -> Result<LoadedConfig> {
    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    let loaded = mml_config::load_layered_yaml(&path_refs)?;

    let unused = mml_config::report_unused_keys(&loaded.config_json, policy)?;
    if !unused.is_clean() {
        warn!(
            keys = ?unused.unused_leaf_pointers,
            "config sets keys the harness does not read"
        );
    }
    info!(config_hash = %loaded.config_hash, layers = paths.len(), "config loaded");
    Ok(loaded)
}

async fn grade(loaded: LoadedConfig, args: RunArgs) -> Result<()> {
    let mut cfg = loaded.config;
    if let Some(dir) = args.traces_dir {
        cfg.traces.dir = dir;
    }
    if args.skip_build {
        cfg.build.enabled = false;
    }
    if let Some(dir) = args.export_dir {
        cfg.exports.dir = Some(dir);
    }

    let runner = ProcessRunner;

    mml_probe::rebuild(&runner, &cfg.build, cfg.tools.workdir.as_deref())
        .await
        .context("rebuild failed; grading not started")?;

    let files = mml_trace::discover(&cfg.traces.dir, &cfg.traces.extension)?;
    if files.is_empty() {
        warn!(dir = %cfg.traces.dir.display(), ext = %cfg.traces.extension, "no traces found");
    } else {
        info!(count = files.len(), dir = %cfg.traces.dir.display(), "traces discovered");
    }

    let settings = ProbeSettings::from_config(&cfg);
    let report = mml_eval::evaluate_all(&runner, &settings, &files).await?;
    let graded = mml_score::grade(report);

    match args.format {
        OutputFormat::Table => print!("{}", mml_score::render_text(&graded)),
        OutputFormat::Json => {
            let json = mml_score::render_json(&graded).context("serialize grade report failed")?;
            println!("{json}");
        }
    }

    if let Some(root) = &cfg.exports.dir {
        let run_id = Uuid::new_v4();
        let host_fp = mml_artifacts::host_fingerprint();
        let out = mml_artifacts::init_run_artifacts(mml_artifacts::InitRunArtifactsArgs {
            exports_root: root,
            run_id,
            config_hash: &loaded.config_hash,
            traces_dir: &cfg.traces.dir,
            host_fingerprint: &host_fp,
        })?;
        let report_path = mml_score::write_grade_report_json(&out.run_dir, &graded)
            .with_context(|| format!("write grade report failed: {}", out.run_dir.display()))?;
        info!(%run_id, path = %report_path.display(), "grade report exported");
        eprintln!("export_dir={}", out.run_dir.display());
    }

    Ok(())
}

fn list_traces(cfg: &HarnessConfig) -> Result<()> {
    let files = mml_trace::discover(&cfg.traces.dir, &cfg.traces.extension)?;
    if files.is_empty() {
        println!("No traces found in {}", cfg.traces.dir.display());
    }
    for file in &files {
        match Trace::load(file) {
            Ok(t) => println!("{}\t{}", t.path.display(), t.operation_count),
            Err(e) => println!("{}\tERROR {}", file.path.display(), e),
        }
    }
    Ok(())
}
