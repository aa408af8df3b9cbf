use crate::cli::args::AnalyzeArgs;
use crate::cli::commands::fail;
use crate::cli::render;
use crate::exit_codes;
use lakeview_core::{AnalyzeClient, ViewError, DEFAULT_WINDOW};

pub async fn run(args: AnalyzeArgs) -> anyhow::Result<i32> {
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
    let dataset_name = args.dataset_name.clone().or_else(|| {
        args.file
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_owned)
    });

    let client = AnalyzeClient::new(&args.server);
    tracing::info!(server = %client.base_url(), file = %file_name, "analyzing");
    let report = match client
        .analyze(&file_name, bytes, dataset_name.as_deref())
        .await
    {
        Ok(report) => report,
        Err(e) => return fail(&e),
    };

    if let Some(out) = &args.out {
        let canonical = serde_json::to_string_pretty(&report)?;
        if let Err(e) = std::fs::write(out, canonical) {
            return fail(&ViewError::Io(e));
        }
        eprintln!("wrote {}", out.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render::render_report(&report, DEFAULT_WINDOW));
    }
    Ok(exit_codes::SUCCESS)
}
