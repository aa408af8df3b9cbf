use std::path::PathBuf;

use crate::cli::args::CleanArgs;
use crate::cli::commands::{fail, load_report};
use crate::exit_codes;
use lakeview_core::autofix::{ordered_selection, ComposerState};
use lakeview_core::client::{clean_options_json, AnalyzeClient};
use lakeview_core::export::save_cleaned_csv;
use lakeview_core::ViewError;

pub async fn run(args: CleanArgs) -> anyhow::Result<i32> {
    let report = match load_report(&args.report) {
        Ok(report) => report,
        Err(e) => return fail(&e),
    };
    let Some(plan) = report.autofix.plan.as_ref().filter(|p| !p.steps.is_empty()) else {
        eprintln!("report has no autofix plan, nothing to clean with");
        return Ok(exit_codes::SUCCESS);
    };

    let mut state = ComposerState::NoPlan.reconcile(&report);
    if !args.select.is_empty() {
        state = state.select_none(plan);
        for id in &args.select {
            let before = state.clone();
            state = state.toggle(plan, id);
            if state == before {
                tracing::warn!(step = %id, "not a togglable step id, ignoring");
            }
        }
    }
    let Some(selection) = state.selection() else {
        eprintln!("report has no autofix plan, nothing to clean with");
        return Ok(exit_codes::SUCCESS);
    };
    let steps = ordered_selection(plan, selection);
    if steps.is_empty() {
        eprintln!("no steps selected, refusing to upload a no-op clean");
        return Ok(exit_codes::SUCCESS);
    }

    let bytes = match std::fs::read(&args.file) {
        Ok(bytes) => bytes,
        Err(e) => return fail(&ViewError::Io(e)),
    };
    let file_name = args
        .file
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("upload.csv")
        .to_owned();

    let client = AnalyzeClient::new(&args.server);
    tracing::info!(server = %client.base_url(), steps = steps.len(), "cleaning");
    let cleaned = match client
        .clean(&file_name, bytes, &clean_options_json(&steps))
        .await
    {
        Ok(cleaned) => cleaned,
        Err(e) => return fail(&e),
    };

    let dir: PathBuf = match &args.out_dir {
        Some(dir) => dir.clone(),
        None => args
            .file
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    match save_cleaned_csv(&dir, &args.file, &cleaned) {
        Ok(path) => {
            eprintln!("wrote {}", path.display());
            Ok(exit_codes::SUCCESS)
        }
        Err(e) => fail(&e),
    }
}
