//! Step selection and script composition. Interactive by default, headless
//! when any scripting flag is given.

use anyhow::Context;

use crate::cli::args::ComposeArgs;
use crate::cli::commands::{fail, load_report};
use crate::exit_codes;
use lakeview_core::autofix::{script_for, ComposerState};
use lakeview_core::report::{AutofixPlan, Report};
use lakeview_core::ViewError;

pub fn run(args: ComposeArgs) -> anyhow::Result<i32> {
    let report = match load_report(&args.report) {
        Ok(report) => report,
        Err(e) => return fail(&e),
    };
    let state = ComposerState::NoPlan.reconcile(&report);
    if state.selection().is_none() {
        eprintln!("report has no autofix plan, nothing to compose");
        return Ok(exit_codes::SUCCESS);
    }

    if args.headless() {
        return headless(&args, &report, state);
    }
    interactive(report, state)
}

fn headless(args: &ComposeArgs, report: &Report, state: ComposerState) -> anyhow::Result<i32> {
    let plan = report
        .autofix
        .plan
        .as_ref()
        .context("plan vanished between reconcile and compose")?;

    let mut state = state;
    if args.all {
        state = state.select_all(plan);
    } else if args.none {
        state = state.select_none(plan);
    } else if !args.select.is_empty() {
        state = state.select_none(plan);
        for id in &args.select {
            let before = state.clone();
            state = state.toggle(plan, id);
            if state == before {
                tracing::warn!(step = %id, "not a togglable step id, ignoring");
            }
        }
    }

    let script = script_for(report, &state)
        .context("plan vanished between reconcile and compose")?;

    if let Some(out) = &args.out {
        if let Err(e) = std::fs::write(out, &script) {
            return fail(&ViewError::Io(e));
        }
        eprintln!("wrote {}", out.display());
    }
    if args.print || args.out.is_none() {
        print!("{script}");
        if !script.ends_with('\n') {
            println!();
        }
    }
    Ok(exit_codes::SUCCESS)
}

#[cfg(not(feature = "tui"))]
fn interactive(_report: Report, _state: ComposerState) -> anyhow::Result<i32> {
    eprintln!("built without the tui feature; use --print, --out or --select");
    Ok(exit_codes::INTERNAL_ERROR)
}

#[cfg(feature = "tui")]
fn interactive(report: Report, state: ComposerState) -> anyhow::Result<i32> {
    let mut app = tui::AppState::new(report, state);
    tui::run_tui(&mut app)?;
    Ok(exit_codes::SUCCESS)
}

/// Step metadata shown in list rows. Shared by the picker and its tests.
pub(crate) fn step_row(plan: &AutofixPlan, state: &ComposerState, index: usize) -> String {
    let step = &plan.steps[index];
    let mark = if state.is_selected(&step.id) { 'x' } else { ' ' };
    let lock = if step.locked { " (locked)" } else { "" };
    match &step.category {
        Some(category) => format!("[{mark}] {}  {} <{category}>{lock}", step.id, step.label),
        None => format!("[{mark}] {}  {}{lock}", step.id, step.label),
    }
}

#[cfg(feature = "tui")]
mod tui {
    use anyhow::Result;
    use crossterm::event::{self, Event, KeyCode, KeyModifiers};
    use crossterm::terminal::{
        disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
    };
    use crossterm::ExecutableCommand;
    use ratatui::backend::CrosstermBackend;
    use ratatui::layout::{Constraint, Direction, Layout};
    use ratatui::style::{Color, Modifier, Style};
    use ratatui::text::Line;
    use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
    use ratatui::Terminal;
    use std::io::stdout;

    use super::step_row;
    use lakeview_core::autofix::{ordered_selection, script_for, ComposerState};
    use lakeview_core::export::save_script;
    use lakeview_core::report::Report;

    pub(super) struct AppState {
        report: Report,
        state: ComposerState,
        list_state: ListState,
        status: String,
    }

    impl AppState {
        pub(super) fn new(report: Report, state: ComposerState) -> Self {
            let mut list_state = ListState::default();
            list_state.select(Some(0));
            Self {
                report,
                state,
                list_state,
                status: "space toggle | a all | n none | s save | c copy | q quit".to_owned(),
            }
        }

        fn step_count(&self) -> usize {
            self.report.plan_steps().len()
        }

        fn move_selection(&mut self, delta: i64) {
            let len = self.step_count();
            if len == 0 {
                return;
            }
            let current = self.list_state.selected().unwrap_or(0) as i64;
            let next = (current + delta).clamp(0, len as i64 - 1);
            self.list_state.select(Some(next as usize));
        }

        fn toggle_current(&mut self) {
            let Some(index) = self.list_state.selected() else {
                return;
            };
            let Some(plan) = self.report.autofix.plan.as_ref() else {
                return;
            };
            let Some(step) = plan.steps.get(index) else {
                return;
            };
            if step.locked {
                self.status = format!("{} is locked", step.id);
                return;
            }
            self.state = self.state.toggle(plan, &step.id);
            self.update_count_status();
        }

        fn select_all(&mut self) {
            if let Some(plan) = self.report.autofix.plan.as_ref() {
                self.state = self.state.select_all(plan);
                self.update_count_status();
            }
        }

        fn select_none(&mut self) {
            if let Some(plan) = self.report.autofix.plan.as_ref() {
                self.state = self.state.select_none(plan);
                self.update_count_status();
            }
        }

        fn update_count_status(&mut self) {
            if let (Some(plan), Some(selection)) =
                (self.report.autofix.plan.as_ref(), self.state.selection())
            {
                let picked = ordered_selection(plan, selection).len();
                self.status = format!("{picked}/{} steps selected", plan.steps.len());
            }
        }

        fn save(&mut self) {
            let Some(script) = script_for(&self.report, &self.state) else {
                return;
            };
            // Best effort: a failed write lands in the status line, never
            // tears down the terminal.
            match save_script(std::path::Path::new("."), &self.report, &script) {
                Ok(path) => self.status = format!("saved {}", path.display()),
                Err(e) => self.status = format!("save failed: {e}"),
            }
        }

        fn copy(&mut self) {
            let Some(script) = script_for(&self.report, &self.state) else {
                return;
            };
            self.status = copy_to_clipboard(&script);
        }

        fn preview(&self) -> String {
            script_for(&self.report, &self.state).unwrap_or_default()
        }
    }

    #[cfg(feature = "clipboard")]
    fn copy_to_clipboard(script: &str) -> String {
        match arboard::Clipboard::new().and_then(|mut c| c.set_text(script.to_owned())) {
            Ok(()) => "copied to clipboard".to_owned(),
            Err(e) => {
                tracing::debug!(error = %e, "clipboard copy failed");
                format!("copy failed: {e}")
            }
        }
    }

    #[cfg(not(feature = "clipboard"))]
    fn copy_to_clipboard(_script: &str) -> String {
        "built without the clipboard feature".to_owned()
    }

    pub(super) fn run_tui(state: &mut AppState) -> Result<()> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let result = run_tui_inner(state);

        // Always restore terminal state, even if the event loop errored.
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);

        result
    }

    fn run_tui_inner(state: &mut AppState) -> Result<()> {
        let backend = CrosstermBackend::new(stdout());
        let mut terminal = Terminal::new(backend)?;

        loop {
            terminal.draw(|f| draw_ui(f, state))?;

            if event::poll(std::time::Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => break,
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            break
                        }
                        KeyCode::Char('j') | KeyCode::Down => state.move_selection(1),
                        KeyCode::Char('k') | KeyCode::Up => state.move_selection(-1),
                        KeyCode::Char(' ') | KeyCode::Enter => state.toggle_current(),
                        KeyCode::Char('a') => state.select_all(),
                        KeyCode::Char('n') => state.select_none(),
                        KeyCode::Char('s') => state.save(),
                        KeyCode::Char('c') => state.copy(),
                        _ => {}
                    }
                }
            }
        }
        Ok(())
    }

    fn draw_ui(f: &mut ratatui::Frame, state: &mut AppState) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(3)])
            .split(f.area());
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(rows[0]);

        let items: Vec<ListItem> = match state.report.autofix.plan.as_ref() {
            Some(plan) => (0..plan.steps.len())
                .map(|i| ListItem::new(Line::from(step_row(plan, &state.state, i))))
                .collect(),
            None => Vec::new(),
        };
        let title = format!(
            "Autofix steps — {} (run {})",
            state.report.dataset_name, state.report.run_id
        );
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        f.render_stateful_widget(list, columns[0], &mut state.list_state);

        let preview = Paragraph::new(state.preview())
            .block(Block::default().borders(Borders::ALL).title("Composed script"))
            .wrap(Wrap { trim: false });
        f.render_widget(preview, columns[1]);

        let status = Paragraph::new(state.status.clone())
            .block(Block::default().borders(Borders::ALL).title("Status"));
        f.render_widget(status, rows[1]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lakeview_core::report::ingest::ingest;
    use serde_json::json;

    #[test]
    fn step_rows_show_selection_and_locks() {
        let report = ingest(&json!({
            "dataset_name": "d", "run_id": "r",
            "autofix_plan": { "steps": [
                { "id": "a", "label": "Fix A", "category": "missing", "enabled": true },
                { "id": "b", "label": "Fix B", "enabled": false },
            ]},
        }))
        .unwrap();
        let plan = report.autofix.plan.as_ref().unwrap();
        let state = ComposerState::NoPlan.reconcile(&report);
        assert_eq!(step_row(plan, &state, 0), "[x] a  Fix A <missing>");
        assert_eq!(step_row(plan, &state, 1), "[ ] b  Fix B");
    }
}
