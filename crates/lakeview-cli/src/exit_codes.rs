//! Exit codes for the lakeview binary. Part of the CLI contract; scripts
//! branch on these.

use lakeview_core::ViewError;

pub const SUCCESS: i32 = 0;
pub const INVALID_REPORT: i32 = 1; // Payload not recognizable as a report
pub const INTERNAL_ERROR: i32 = 2; // Unexpected failure inside the CLI
pub const TRANSPORT_ERROR: i32 = 5; // Analyze/clean call failed
pub const IO_ERROR: i32 = 6; // Local file read/write failed

/// Map a core error onto the CLI contract.
pub fn for_error(err: &ViewError) -> i32 {
    match err {
        ViewError::Validation { .. } => INVALID_REPORT,
        ViewError::Transport { .. } => TRANSPORT_ERROR,
        ViewError::Io(_) => IO_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_matches_the_library_contract() {
        let errors = [
            ViewError::validation("x"),
            ViewError::Transport {
                status: Some(500),
                body: String::new(),
            },
            ViewError::Io(std::io::Error::other("x")),
        ];
        for err in errors {
            assert_eq!(for_error(&err), err.exit_code());
        }
    }
}
