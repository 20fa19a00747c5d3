//! Snapshot downloads from the group API.

use anyhow::{anyhow, bail, Context, Result};
use clap::ValueEnum;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::ApiConfig;

/// The API resources mirrored into the data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Snapshot {
    Schedule,
    Exams,
}

impl Snapshot {
    pub const ALL: [Snapshot; 2] = [Snapshot::Schedule, Snapshot::Exams];

    pub fn api_path(self) -> &'static str {
        match self {
            Snapshot::Schedule => "/api/schedule",
            Snapshot::Exams => "/api/exams",
        }
    }

    /// File name the viewer watches for
    pub fn file_name(self) -> &'static str {
        match self {
            Snapshot::Schedule => "schedule.json",
            Snapshot::Exams => "exams.json",
        }
    }
}

/// Check that `body` is a JSON array, or an object with an `items` array, and count the
/// entries.
pub fn count_items(body: &str) -> Result<usize> {
    let value: Value = serde_json::from_str(body).context("Response is not valid JSON")?;
    match &value {
        Value::Array(items) => Ok(items.len()),
        Value::Object(map) => map
            .get("items")
            .and_then(Value::as_array)
            .map(Vec::len)
            .ok_or_else(|| anyhow!("Response object has no `items` array")),
        _ => bail!("Response is neither an array nor an object"),
    }
}

/// Write `body` next to its final location and rename it into place, so a watcher never
/// sees a half-written file.
pub fn write_snapshot(dir: &Path, snapshot: Snapshot, body: &str) -> Result<PathBuf> {
    let target = dir.join(snapshot.file_name());
    let partial = dir.join(format!("{}.part", snapshot.file_name()));

    std::fs::write(&partial, body)
        .with_context(|| format!("Failed to write {}", partial.display()))?;
    std::fs::rename(&partial, &target)
        .with_context(|| format!("Failed to move snapshot to {}", target.display()))?;

    Ok(target)
}

/// HTTP client bound to one API.
pub struct Fetcher {
    client: reqwest::Client,
    config: ApiConfig,
}

impl Fetcher {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, config })
    }

    /// Download one snapshot and return its validated body.
    pub async fn fetch(&self, snapshot: Snapshot) -> Result<String> {
        let url = self.config.endpoint(snapshot.api_path());
        debug!(url = %url, "Requesting snapshot");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?
            .error_for_status()
            .with_context(|| format!("{} returned an error status", url))?;
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        let count = count_items(&body).with_context(|| format!("Unexpected body from {}", url))?;
        info!(snapshot = ?snapshot, count, "Fetched snapshot");
        Ok(body)
    }
}
