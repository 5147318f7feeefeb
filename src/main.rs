//! pymetrics CLI - Code health metrics for Python projects.

use std::fs;
use std::io::{stdout, Write};
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pymetrics::analyzers::{complexity, dependency, patterns, performance, quality, security};
use pymetrics::cli::{AnalyzeArgs, Cli, Command, DepsArgs, HealthArgs, InitArgs, QualityArgs};
use pymetrics::config::{Config, OutputFormat};
use pymetrics::coordinator::{Coordinator, Pipeline, ProjectFeatures};
use pymetrics::core::Error;
use pymetrics::health::{DependencyHealth, HealthStatus};
use pymetrics::output::Renderer;

/// Exit status when the overall score misses `--fail-under`.
const THRESHOLD_EXIT: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            match e.downcast_ref::<Error>() {
                Some(Error::ThresholdViolation { .. }) => ExitCode::from(THRESHOLD_EXIT),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Command::Init(args) = &cli.command {
        return init(&cli.path, args);
    }

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load_default(&cli.path)
            .with_context(|| format!("loading configuration for {}", cli.path.display()))?,
    };
    if let Some(jobs) = cli.jobs {
        config.jobs = jobs;
    }
    let format = cli.format.map(OutputFormat::from).unwrap_or(config.output.format);
    let renderer = Renderer::new(format, config.output.color && !cli.no_color);

    match &cli.command {
        Command::Analyze(args) => analyze(&cli.path, config, args, &renderer),
        Command::Complexity => {
            let features = extract(&cli.path, &config, "complexity")?;
            let files: Vec<_> = features.files.into_iter().map(|f| f.complexity).collect();
            emit(&renderer, &complexity::summarize(&files, &config.complexity))
        }
        Command::Quality(args) => quality_report(&cli.path, config, args, &renderer),
        Command::Security => {
            let features = extract(&cli.path, &config, "security")?;
            let files: Vec<_> = features.files.into_iter().map(|f| f.security).collect();
            emit(&renderer, &security::summarize(&files))
        }
        Command::Performance => {
            let features = extract(&cli.path, &config, "performance")?;
            let files: Vec<_> = features.files.into_iter().map(|f| f.performance).collect();
            emit(&renderer, &performance::summarize(&files))
        }
        Command::Patterns => {
            let features = extract(&cli.path, &config, "patterns")?;
            let files: Vec<_> = features.files.into_iter().map(|f| f.patterns).collect();
            emit(&renderer, &patterns::summarize(&files))
        }
        Command::Deps(args) => deps(&cli.path, config, args, &renderer),
        Command::Health(args) => health(&cli.path, &config, args, &renderer),
        Command::Init(_) => Ok(()),
    }
}

fn analyze(path: &Path, config: Config, args: &AnalyzeArgs, renderer: &Renderer) -> anyhow::Result<()> {
    let fail_under = args.fail_under.or(config.score.fail_under);
    let mut pipeline = Pipeline::new(path, config)?
        .refresh_health(args.refresh)
        .show_progress(true);
    if args.no_coverage {
        pipeline = pipeline.with_coverage(None);
    }
    if args.no_health {
        pipeline = pipeline.with_health(None);
    }

    let report = pipeline.run()?;
    let mut out = stdout().lock();
    renderer.render_report(&report, &mut out)?;
    out.flush()?;
    report.check_threshold(fail_under)?;
    Ok(())
}

fn quality_report(path: &Path, config: Config, args: &QualityArgs, renderer: &Renderer) -> anyhow::Result<()> {
    let mut pipeline = single_analyzer(path, config, "quality")?.with_health(None);
    if args.no_coverage {
        pipeline = pipeline.with_coverage(None);
    }
    let features = pipeline.extract()?;
    let coverage = pipeline.coverage(&features.root);
    let files: Vec<_> = features.files.into_iter().map(|f| f.quality).collect();
    emit(renderer, &quality::summarize(&files, coverage))
}

#[derive(Serialize)]
struct DepsReport {
    #[serde(flatten)]
    metrics: dependency::DependencyMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    health: Option<HealthStatus>,
}

fn deps(path: &Path, config: Config, args: &DepsArgs, renderer: &Renderer) -> anyhow::Result<()> {
    let mut pipeline = single_analyzer(path, config, "dependency")?
        .with_coverage(None)
        .refresh_health(args.refresh);
    if args.no_health {
        pipeline = pipeline.with_health(None);
    }
    let features = pipeline.extract()?;
    let health = pipeline.health(&features.root);
    let manifest = features.root.join(&pipeline.config().dependency.manifest);
    let requirements = dependency::read_requirements(&manifest);
    let files: Vec<_> = features.files.into_iter().map(|f| f.dependency).collect();
    let metrics = dependency::summarize(&files, requirements, health.as_ref(), &pipeline.config().dependency);
    emit(renderer, &DepsReport { metrics, health })
}

fn health(path: &Path, config: &Config, args: &HealthArgs, renderer: &Renderer) -> anyhow::Result<()> {
    let checker = DependencyHealth::for_project(path, &config.dependency);
    let manifest = path.join(&config.dependency.manifest);
    let status = checker.check(&manifest, args.refresh);
    emit(renderer, &status)
}

fn init(path: &Path, args: &InitArgs) -> anyhow::Result<()> {
    let target = args.output.clone().unwrap_or_else(|| path.join("pymetrics.toml"));
    if target.exists() && !args.force {
        return Err(Error::InvalidArgument(format!(
            "{} already exists (use --force to overwrite)",
            target.display()
        ))
        .into());
    }
    fs::write(&target, Config::default_toml()).with_context(|| format!("writing {}", target.display()))?;
    println!("Wrote {}", target.display());
    Ok(())
}

fn single_analyzer(path: &Path, config: Config, name: &str) -> anyhow::Result<Pipeline> {
    let coordinator = Coordinator::new(config.effective_jobs())?.only(&[name]);
    Ok(Pipeline::new(path, config)?
        .with_coordinator(coordinator)
        .show_progress(true))
}

fn extract(path: &Path, config: &Config, name: &str) -> anyhow::Result<ProjectFeatures> {
    let pipeline = single_analyzer(path, config.clone(), name)?
        .with_coverage(None)
        .with_health(None);
    Ok(pipeline.extract()?)
}

fn emit<T: Serialize>(renderer: &Renderer, data: &T) -> anyhow::Result<()> {
    let mut out = stdout().lock();
    renderer.render(data, &mut out)?;
    out.flush()?;
    Ok(())
}
