//! HTTP client for the analysis service.
//!
//! Two endpoints matter: `POST /analyze` takes a CSV upload and returns a
//! report payload, `POST /clean` takes the same upload plus composition
//! options and returns cleaned CSV bytes. Failures are never retried
//! here; a retry is always an explicit user action.

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;

use crate::errors::{ViewError, ViewResult};
use crate::report::{ingest, Report};

#[derive(Debug, Clone)]
pub struct AnalyzeClient {
    http: reqwest::Client,
    base_url: String,
}

impl AnalyzeClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upload a CSV for analysis and reconcile the response into a
    /// [`Report`], whatever payload vintage the service speaks.
    pub async fn analyze(
        &self,
        file_name: &str,
        csv_bytes: Vec<u8>,
        dataset_name: Option<&str>,
    ) -> ViewResult<Report> {
        let mut form = Form::new().part("file", csv_part(file_name, csv_bytes)?);
        if let Some(name) = dataset_name {
            form = form.text("dataset_name", name.to_owned());
        }

        tracing::debug!(url = %self.base_url, file = %file_name, "posting csv for analysis");
        let response = self
            .http
            .post(format!("{}/analyze", self.base_url))
            .multipart(form)
            .send()
            .await?;
        let bytes = read_success(response).await?;
        ingest::ingest_slice(&bytes)
    }

    /// Upload a CSV plus composition options, get cleaned CSV bytes back.
    /// `options_json` is passed through opaquely as the `options_json`
    /// form field.
    pub async fn clean(
        &self,
        file_name: &str,
        csv_bytes: Vec<u8>,
        options_json: &str,
    ) -> ViewResult<Vec<u8>> {
        let form = Form::new()
            .part("file", csv_part(file_name, csv_bytes)?)
            .text("options_json", options_json.to_owned());

        tracing::debug!(url = %self.base_url, file = %file_name, "posting csv for cleaning");
        let response = self
            .http
            .post(format!("{}/clean", self.base_url))
            .multipart(form)
            .send()
            .await?;
        read_success(response).await
    }
}

fn csv_part(file_name: &str, bytes: Vec<u8>) -> ViewResult<Part> {
    Part::bytes(bytes)
        .file_name(file_name.to_owned())
        .mime_str("text/csv")
        .map_err(ViewError::from)
}

/// Single place that decides whether a response is usable. Non-2xx turns
/// into a transport error carrying the status and the raw body text.
async fn read_success(response: reqwest::Response) -> ViewResult<Vec<u8>> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.bytes().await?.to_vec());
    }
    let body = body_excerpt(response, status).await;
    Err(ViewError::Transport {
        status: Some(status.as_u16()),
        body,
    })
}

async fn body_excerpt(response: reqwest::Response, status: StatusCode) -> String {
    const MAX: usize = 2048;
    match response.text().await {
        Ok(text) if !text.trim().is_empty() => {
            let mut excerpt = text.trim().to_owned();
            if excerpt.len() > MAX {
                let mut cut = MAX;
                while !excerpt.is_char_boundary(cut) {
                    cut -= 1;
                }
                excerpt.truncate(cut);
            }
            excerpt
        }
        _ => format!(
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("unknown error")
        ),
    }
}

/// Options payload for `clean`: the selected step ids in plan order.
pub fn clean_options_json(step_ids: &[String]) -> String {
    serde_json::json!({ "steps": step_ids }).to_string()
}
