use crate::cli::args::ExportArgs;
use crate::cli::commands::{fail, load_report};
use crate::exit_codes;
use lakeview_core::autofix::{script_for, ComposerState};
use lakeview_core::export::{save_contract, save_script};

pub fn run(args: ExportArgs) -> anyhow::Result<i32> {
    let report = match load_report(&args.report) {
        Ok(report) => report,
        Err(e) => return fail(&e),
    };

    // Neither flag means both artifacts.
    let want_script = args.script || !args.contract;
    let want_contract = args.contract || !args.script;

    if want_script {
        let state = ComposerState::NoPlan.reconcile(&report);
        match script_for(&report, &state) {
            Some(script) => match save_script(&args.dir, &report, &script) {
                Ok(path) => eprintln!("wrote {}", path.display()),
                Err(e) => return fail(&e),
            },
            None => eprintln!("report has no autofix plan, skipping script"),
        }
    }

    if want_contract {
        match save_contract(&args.dir, &report) {
            Ok(Some(path)) => eprintln!("wrote {}", path.display()),
            Ok(None) => eprintln!("report carries no contract, skipping"),
            Err(e) => return fail(&e),
        }
    }

    Ok(exit_codes::SUCCESS)
}
