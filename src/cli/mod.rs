//! CLI implementation using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config;

/// pymetrics - Code health metrics for Python projects.
#[derive(Parser)]
#[command(name = "pymetrics")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the project to analyze
    #[arg(short, long, default_value = ".")]
    pub path: PathBuf,

    /// Output format (defaults to the configured format)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Number of parallel workers (default: number of CPUs)
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run every analyzer and report the overall score with recommendations
    #[command(alias = "all")]
    Analyze(AnalyzeArgs),

    /// Cyclomatic, cognitive and Halstead complexity plus maintainability
    #[command(alias = "cx")]
    Complexity,

    /// Type hints, documentation, lint issues, naming and code smells
    Quality(QualityArgs),

    /// Vulnerable calls, sensitive data exposure and protective patterns
    #[command(alias = "sec")]
    Security,

    /// Loop hotspots, memory and I/O markers, caching opportunities
    #[command(alias = "perf")]
    Performance,

    /// Design pattern matches and architectural style
    Patterns,

    /// Imports, requirements, import cycles and dependency health
    #[command(alias = "dependencies")]
    Deps(DepsArgs),

    /// Check dependency health through the on-disk cache
    Health(HealthArgs),

    /// Write a commented default configuration file
    Init(InitArgs),
}

#[derive(Args, Default)]
pub struct AnalyzeArgs {
    /// Exit with a failure status when the overall score is below this value
    #[arg(long)]
    pub fail_under: Option<f64>,

    /// Skip running the test suite under coverage
    #[arg(long)]
    pub no_coverage: bool,

    /// Skip the dependency health check
    #[arg(long)]
    pub no_health: bool,

    /// Ignore cached dependency health and re-run the check
    #[arg(long)]
    pub refresh: bool,
}

#[derive(Args, Default)]
pub struct QualityArgs {
    /// Skip running the test suite under coverage
    #[arg(long)]
    pub no_coverage: bool,
}

#[derive(Args, Default)]
pub struct DepsArgs {
    /// Skip the dependency health check
    #[arg(long)]
    pub no_health: bool,

    /// Ignore cached dependency health and re-run the check
    #[arg(long)]
    pub refresh: bool,
}

#[derive(Args, Default)]
pub struct HealthArgs {
    /// Ignore the cache and re-run the check
    #[arg(long)]
    pub refresh: bool,
}

#[derive(Args, Default)]
pub struct InitArgs {
    /// Overwrite an existing configuration file
    #[arg(long)]
    pub force: bool,

    /// Where to write the file (default: pymetrics.toml in the project path)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    #[value(alias = "md")]
    Markdown,
    Text,
}

impl From<OutputFormat> for config::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => config::OutputFormat::Json,
            OutputFormat::Markdown => config::OutputFormat::Markdown,
            OutputFormat::Text => config::OutputFormat::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_default_path() {
        let cli = Cli::try_parse_from(["pymetrics", "complexity"]).unwrap();
        assert_eq!(cli.path, PathBuf::from("."));
        assert!(cli.format.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_custom_path_and_jobs() {
        let cli = Cli::try_parse_from(["pymetrics", "-p", "/tmp", "-j", "4", "security"]).unwrap();
        assert_eq!(cli.path, PathBuf::from("/tmp"));
        assert_eq!(cli.jobs, Some(4));
        assert!(matches!(cli.command, Command::Security));
    }

    #[test]
    fn test_cli_format() {
        let cli = Cli::try_parse_from(["pymetrics", "-f", "json", "patterns"]).unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Json));
        let cli = Cli::try_parse_from(["pymetrics", "--format", "md", "patterns"]).unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Markdown));
        assert!(Cli::try_parse_from(["pymetrics", "-f", "yaml", "patterns"]).is_err());
    }

    #[test]
    fn test_cli_format_maps_to_config() {
        assert_eq!(config::OutputFormat::from(OutputFormat::Text), config::OutputFormat::Text);
        assert_eq!(config::OutputFormat::from(OutputFormat::Json), config::OutputFormat::Json);
    }

    #[test]
    fn test_analyze_args() {
        let cli = Cli::try_parse_from([
            "pymetrics",
            "analyze",
            "--fail-under",
            "75",
            "--no-coverage",
            "--refresh",
        ])
        .unwrap();
        match cli.command {
            Command::Analyze(args) => {
                assert_eq!(args.fail_under, Some(75.0));
                assert!(args.no_coverage);
                assert!(!args.no_health);
                assert!(args.refresh);
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_aliases() {
        let cli = Cli::try_parse_from(["pymetrics", "all"]).unwrap();
        assert!(matches!(cli.command, Command::Analyze(_)));
        let cli = Cli::try_parse_from(["pymetrics", "dependencies", "--no-health"]).unwrap();
        assert!(matches!(cli.command, Command::Deps(DepsArgs { no_health: true, .. })));
    }

    #[test]
    fn test_health_and_init() {
        let cli = Cli::try_parse_from(["pymetrics", "health", "--refresh"]).unwrap();
        assert!(matches!(cli.command, Command::Health(HealthArgs { refresh: true })));
        let cli = Cli::try_parse_from(["pymetrics", "init", "--force"]).unwrap();
        assert!(matches!(cli.command, Command::Init(InitArgs { force: true, .. })));
    }
}
