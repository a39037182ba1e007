use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use trialscreen_runtime::ScreeningMode;

#[derive(Parser)]
#[command(name = "trialscreen")]
#[command(version, about = "Screen bibliographic records for MI pharmacological RCTs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Screen a RIS or JSON export and write decisions
    Screen {
        /// Records to screen (.ris/.txt as RIS, .json as a JSON array)
        #[arg(short, long)]
        input: PathBuf,

        /// Criteria file (YAML or JSON)
        #[arg(short, long)]
        criteria: PathBuf,

        /// Runtime configuration (YAML or JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Export format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: ExportFormat,

        /// Override the configured screening mode
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Verify RCT design from the DOI full text
        #[arg(long)]
        verify_doi: bool,

        /// Screen only the first N records
        #[arg(long)]
        limit: Option<usize>,

        /// Log each decision through the logging applier
        #[arg(long)]
        apply: bool,
    },

    /// Validate a criteria file
    Check {
        /// Criteria file (YAML or JSON)
        file: PathBuf,
    },

    /// Screen a single record and print the detailed report as JSON
    Explain {
        #[arg(long)]
        title: String,

        #[arg(long = "abstract", default_value = "")]
        abstract_text: String,

        /// Criteria file (default: no keyword criteria)
        #[arg(short, long)]
        criteria: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
    Jsonl,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ModeArg {
    Stringent,
    Blended,
    Llm,
}

impl From<ModeArg> for ScreeningMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Stringent => ScreeningMode::Stringent,
            ModeArg::Blended => ScreeningMode::Blended,
            ModeArg::Llm => ScreeningMode::Llm,
        }
    }
}
