use super::args::{Cli, Command};

pub mod analyze;
pub mod clean;
pub mod compose;
pub mod export;
pub mod view;

use crate::exit_codes;
use lakeview_core::{Report, ViewError};
use std::path::Path;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Analyze(args) => analyze::run(args).await,
        Command::View(args) => view::run(args),
        Command::Compose(args) => compose::run(args),
        Command::Export(args) => export::run(args),
        Command::Clean(args) => clean::run(args).await,
        Command::Version => {
            println!("lakeview {}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::SUCCESS)
        }
    }
}

/// Surface a core error on stderr and map it to the exit-code contract.
pub(crate) fn fail(err: &ViewError) -> anyhow::Result<i32> {
    eprintln!("error: {err}");
    Ok(exit_codes::for_error(err))
}

/// Read a payload file and reconcile it, whatever vintage wrote it.
pub(crate) fn load_report(path: &Path) -> Result<Report, ViewError> {
    let bytes = std::fs::read(path)?;
    lakeview_core::ingest_slice(&bytes)
}
