//! pymetrics - Code health metrics engine for Python projects.
//!
//! Parses Python sources with tree-sitter and runs six independent
//! analyzers per file (complexity, quality, security, performance, design
//! patterns and dependencies). Per-file results are folded into project
//! metrics, a weighted overall score and ranked recommendations.
//!
//! # Example
//!
//! ```no_run
//! use pymetrics::config::Config;
//! use pymetrics::coordinator::Pipeline;
//!
//! let config = Config::load_default(".").unwrap();
//! let report = Pipeline::new(".", config).unwrap().run().unwrap();
//! println!(
//!     "{} files, overall score {:.1} ({})",
//!     report.metrics.total_files, report.metrics.overall_score, report.metrics.grade
//! );
//! ```

pub mod analyzers;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod core;
pub mod coverage;
pub mod health;
pub mod output;
pub mod parser;
pub mod score;

pub use core::{AnalysisContext, Analyzer, Error, Result, SourceUnit};
pub use score::{ProjectMetrics, ProjectReport};
