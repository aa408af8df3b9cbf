use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "lakeview",
    version,
    about = "Viewer for data-lake quality reports — grading, trends, and interactive autofix composition"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Upload a CSV to the analysis service and view the report
    Analyze(AnalyzeArgs),
    /// Render a saved report payload, whatever vintage produced it
    View(ViewArgs),
    /// Pick autofix steps and compose the runnable script
    Compose(ComposeArgs),
    /// Write report artifacts (autofix script, data contract) to disk
    Export(ExportArgs),
    /// Upload a CSV and download it cleaned by the selected steps
    Clean(CleanArgs),
    Version,
}

#[derive(clap::Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// CSV file to upload
    #[arg(value_name = "CSV")]
    pub file: PathBuf,

    /// Dataset name sent to the service (default: file stem)
    #[arg(long)]
    pub dataset_name: Option<String>,

    /// Analysis service base URL
    #[arg(long, env = "LAKEVIEW_SERVER", default_value = "http://localhost:8000")]
    pub server: String,

    /// Also write the canonical report JSON here
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Print canonical JSON instead of the rendered view
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ViewArgs {
    /// Report payload file (raw service JSON or canonical)
    #[arg(value_name = "REPORT")]
    pub report: PathBuf,

    /// Print canonical JSON instead of the rendered view
    #[arg(long)]
    pub json: bool,

    /// Trend window: most recent runs to chart
    #[arg(long, default_value_t = lakeview_core::DEFAULT_WINDOW)]
    pub window: usize,

    /// Also write the trend chart as SVG
    #[arg(long)]
    pub svg: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ComposeArgs {
    /// Report payload file
    #[arg(value_name = "REPORT")]
    pub report: PathBuf,

    /// Comma-separated step ids to select instead of producer defaults
    #[arg(long, value_delimiter = ',')]
    pub select: Vec<String>,

    /// Select every step
    #[arg(long, conflicts_with = "select")]
    pub all: bool,

    /// Start from an empty selection (locked steps stay)
    #[arg(long, conflicts_with_all = ["select", "all"])]
    pub none: bool,

    /// Print the composed script to stdout and exit (no TUI)
    #[arg(long)]
    pub print: bool,

    /// Write the composed script here and exit (no TUI)
    #[arg(long)]
    pub out: Option<PathBuf>,
}

impl ComposeArgs {
    /// Any flag that implies a scripted run skips the interactive picker.
    pub fn headless(&self) -> bool {
        self.print || self.out.is_some() || !self.select.is_empty() || self.all || self.none
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct ExportArgs {
    /// Report payload file
    #[arg(value_name = "REPORT")]
    pub report: PathBuf,

    /// Write the autofix script (producer-recommended selection)
    #[arg(long)]
    pub script: bool,

    /// Write the data contract YAML
    #[arg(long)]
    pub contract: bool,

    /// Output directory
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
}

#[derive(clap::Args, Debug, Clone)]
pub struct CleanArgs {
    /// CSV file to upload
    #[arg(value_name = "CSV")]
    pub file: PathBuf,

    /// Report whose plan drives step selection
    #[arg(long)]
    pub report: PathBuf,

    /// Comma-separated step ids to run instead of producer defaults
    #[arg(long, value_delimiter = ',')]
    pub select: Vec<String>,

    /// Analysis service base URL
    #[arg(long, env = "LAKEVIEW_SERVER", default_value = "http://localhost:8000")]
    pub server: String,

    /// Directory for the cleaned file (default: the input's directory)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}
