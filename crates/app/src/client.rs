use anyhow::{bail, Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub document_id: String,
}

/// Thin client for a running backend.
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn upload(&self, path: &Path) -> Result<UploadResponse> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("document.pdf")
            .to_string();

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")?;
        let response = self
            .client
            .post(format!("{}/upload", self.base_url))
            .multipart(Form::new().part("file", part))
            .send()
            .await
            .context("upload request failed")?;

        let status = response.status();
        let body: Value = response.json().await.context("upload response was not JSON")?;
        if !status.is_success() {
            bail!("upload failed with {status}: {}", error_message(&body));
        }
        Ok(serde_json::from_value(body)?)
    }

    pub async fn compare(&self, document_id: &str, query: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/compare", self.base_url))
            .form(&[("document_id", document_id), ("query", query)])
            .send()
            .await
            .context("compare request failed")?;

        let status = response.status();
        let body: Value = response.json().await.context("compare response was not JSON")?;
        if !status.is_success() {
            bail!("compare failed with {status}: {}", error_message(&body));
        }

        comparison_text(&body).context("response has no comparison_result")
    }
}

fn comparison_text(body: &Value) -> Option<String> {
    match body.get("comparison_result")? {
        Value::String(text) => Some(text.clone()),
        // some deployments wrap the model message as {"content": ...}
        other => other.get("content").and_then(Value::as_str).map(str::to_string),
    }
}

fn error_message(body: &Value) -> String {
    body.get("error")
        .or_else(|| body.get("detail"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string())
}
