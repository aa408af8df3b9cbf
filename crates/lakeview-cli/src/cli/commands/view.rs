use crate::cli::args::ViewArgs;
use crate::cli::commands::{fail, load_report};
use crate::cli::render;
use crate::exit_codes;
use lakeview_core::trend::{trend_view, ChartGeometry};
use lakeview_core::ViewError;

pub fn run(args: ViewArgs) -> anyhow::Result<i32> {
    let report = match load_report(&args.report) {
        Ok(report) => report,
        Err(e) => return fail(&e),
    };

    if let Some(svg_path) = &args.svg {
        let geom = ChartGeometry::default();
        let view = trend_view(&report.history, args.window, &geom);
        let svg = render::render_trend_svg(&view, &geom);
        if let Err(e) = std::fs::write(svg_path, svg) {
            return fail(&ViewError::Io(e));
        }
        eprintln!("wrote {}", svg_path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render::render_report(&report, args.window));
    }
    Ok(exit_codes::SUCCESS)
}
