//! Core types and traits for code analysis.

mod analyzer;
mod error;
mod file_set;
pub mod process;
pub mod progress;
mod source_unit;

pub use analyzer::{AnalysisContext, Analyzer, Summary};
pub use error::{Error, Result};
pub use file_set::{is_python_source, FileSet};
pub use source_unit::SourceUnit;
