//! CLI commands implementation

use anyhow::{bail, Context, Result};
use herbmate_core::{HerbmateConfig, PredictionResult};
use herbmate_store::{store_from_config, ArtifactResolver, ModelArtifact};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::PathBuf;

/// API client for communicating with the daemon
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Health response from API
#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model_loaded: bool,
    #[serde(default)]
    pub model_error: Option<String>,
}

/// Error body returned by the API
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Upload an image and print the prediction
pub async fn predict(client: &ApiClient, image: PathBuf, top: usize, json: bool) -> Result<()> {
    let bytes = tokio::fs::read(&image)
        .await
        .with_context(|| format!("reading {}", image.display()))?;
    let filename = image
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    let form = Form::new().part("file", Part::bytes(bytes).file_name(filename));

    let response = client
        .client
        .post(client.url("/predict"))
        .multipart(form)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await?;
        let message = serde_json::from_str::<ErrorResponse>(&text)
            .map(|e| e.error)
            .unwrap_or(text);
        bail!("Prediction failed ({}): {}", status, message);
    }

    let result: PredictionResult = response.json().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("Predicted class: {}", result.predicted_class);
    println!();
    println!("{:<8} {:>12}", "CLASS", "SCORE");
    for (class, score) in top_scores(&result, top) {
        println!("{:<8} {:>12.6}", class, score);
    }

    Ok(())
}

/// Highest scores of the first batch row, best first
fn top_scores(result: &PredictionResult, n: usize) -> Vec<(usize, f32)> {
    let mut scores: Vec<(usize, f32)> = result
        .predictions
        .first()
        .map(|row| row.iter().copied().enumerate().collect())
        .unwrap_or_default();
    scores.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    scores.truncate(n);
    scores
}

/// Show daemon health
pub async fn health(client: &ApiClient) -> Result<()> {
    let response = client.client.get(client.url("/health")).send().await?;

    if !response.status().is_success() {
        bail!("Health check failed: {}", response.status());
    }

    let health: HealthResponse = response.json().await?;
    println!("Status:       {}", health.status);
    println!("Version:      {}", health.version);
    println!(
        "Model:        {}",
        if health.model_loaded { "loaded" } else { "unavailable" }
    );
    if let Some(reason) = health.model_error {
        println!("Model error:  {}", reason);
    }

    Ok(())
}

/// Resolve the model artifact locally, downloading it if needed
pub async fn fetch(config: Option<PathBuf>) -> Result<()> {
    let mut config = match config {
        Some(path) => HerbmateConfig::from_file(&path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => HerbmateConfig::default(),
    };
    config.apply_env();

    let resolver = ArtifactResolver::new(store_from_config(&config.store)?);
    let artifact = ModelArtifact::from(&config.artifact);
    let path = resolver.resolve(&artifact).await?;

    println!("Model '{}' available at {}", artifact.name, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = ApiClient::new("http://localhost:8080/");
        assert_eq!(client.url("/predict"), "http://localhost:8080/predict");
    }

    #[test]
    fn test_top_scores() {
        let result = PredictionResult {
            predicted_class: 1,
            predictions: vec![vec![0.1, 0.7, 0.2, 0.7]],
        };
        assert_eq!(top_scores(&result, 2), vec![(1, 0.7), (3, 0.7)]);
        assert_eq!(top_scores(&result, 10).len(), 4);
    }
}
