//! Export artifacts: composed scripts, contracts, cleaned CSVs.
//!
//! File names are derived from report identity and sanitized so a hostile
//! dataset name cannot traverse directories.

use std::path::{Path, PathBuf};

use crate::errors::ViewResult;
use crate::report::Report;

/// Replace anything outside `[A-Za-z0-9._-]` with an underscore.
pub fn sanitize_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "unnamed".to_owned()
    } else {
        cleaned
    }
}

/// `autofix_<dataset>_<run>.py`
pub fn script_file_name(dataset_name: &str, run_id: &str) -> String {
    format!(
        "autofix_{}_{}.py",
        sanitize_component(dataset_name),
        sanitize_component(run_id)
    )
}

/// `<dataset>_contract.yaml`
pub fn contract_file_name(dataset_name: &str) -> String {
    format!("{}_contract.yaml", sanitize_component(dataset_name))
}

/// `autofixed_<stem>.csv` for the uploaded file's stem.
pub fn cleaned_csv_name(original: &Path) -> String {
    let stem = original
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("data");
    format!("autofixed_{}.csv", sanitize_component(stem))
}

/// Write the composed script into `dir`, named after the report.
pub fn save_script(dir: &Path, report: &Report, script: &str) -> ViewResult<PathBuf> {
    let path = dir.join(script_file_name(&report.dataset_name, &report.run_id));
    std::fs::write(&path, script)?;
    tracing::info!(path = %path.display(), "wrote autofix script");
    Ok(path)
}

/// Write the producer's contract YAML, `None` when the report has none.
pub fn save_contract(dir: &Path, report: &Report) -> ViewResult<Option<PathBuf>> {
    let Some(yaml) = report.contract_yaml.as_deref() else {
        return Ok(None);
    };
    let path = dir.join(contract_file_name(&report.dataset_name));
    std::fs::write(&path, yaml)?;
    tracing::info!(path = %path.display(), "wrote data contract");
    Ok(Some(path))
}

/// Write cleaned CSV bytes, named after the original upload.
pub fn save_cleaned_csv(dir: &Path, original: &Path, bytes: &[u8]) -> ViewResult<PathBuf> {
    let path = dir.join(cleaned_csv_name(original));
    std::fs::write(&path, bytes)?;
    tracing::info!(path = %path.display(), "wrote cleaned csv");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ingest::ingest;
    use serde_json::json;

    #[test]
    fn names_are_sanitized() {
        assert_eq!(
            script_file_name("../etc/passwd", "run 1"),
            "autofix_.._etc_passwd_run_1.py"
        );
        assert_eq!(contract_file_name("orders"), "orders_contract.yaml");
        assert_eq!(
            cleaned_csv_name(Path::new("/tmp/sales q3.csv")),
            "autofixed_sales_q3.csv"
        );
        assert_eq!(sanitize_component(""), "unnamed");
    }

    #[test]
    fn contract_save_is_a_no_op_without_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let report = ingest(&json!({ "dataset_name": "d", "run_id": "r" })).unwrap();
        assert!(save_contract(dir.path(), &report).unwrap().is_none());
    }

    #[test]
    fn script_and_contract_land_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let report = ingest(&json!({
            "dataset_name": "orders",
            "run_id": "run-7",
            "contract_yaml": "dataset: orders\n",
        }))
        .unwrap();

        let script_path = save_script(dir.path(), &report, "print('hi')\n").unwrap();
        assert_eq!(
            script_path.file_name().unwrap().to_str().unwrap(),
            "autofix_orders_run-7.py"
        );
        assert_eq!(std::fs::read_to_string(&script_path).unwrap(), "print('hi')\n");

        let contract_path = save_contract(dir.path(), &report).unwrap().unwrap();
        assert_eq!(
            std::fs::read_to_string(contract_path).unwrap(),
            "dataset: orders\n"
        );
    }
}
