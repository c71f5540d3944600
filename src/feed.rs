// src/feed.rs
//! Retrieval of raw drifter feeds and their split into a field table.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::record::MIN_RECORD_ARITY;

/// Anything that can turn a feed location into its raw text body.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, location: &str) -> Result<String>;
    fn name(&self) -> &'static str;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedFetcher for HttpFetcher {
    async fn fetch(&self, location: &str) -> Result<String> {
        let resp = self
            .client
            .get(location)
            .send()
            .await
            .with_context(|| format!("GET {location}"))?
            .error_for_status()
            .with_context(|| format!("GET {location}"))?;
        resp.text()
            .await
            .with_context(|| format!("reading body of {location}"))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Reads archived feeds from disk (`/path/feed.dat` or `file:///path/feed.dat`).
pub struct FileFetcher;

#[async_trait]
impl FeedFetcher for FileFetcher {
    async fn fetch(&self, location: &str) -> Result<String> {
        let path = Path::new(location.strip_prefix("file://").unwrap_or(location));
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("reading feed file {}", path.display()))?;
        // Same lossy decoding as `reqwest::Response::text`.
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// Picks HTTP or file retrieval from the location's scheme.
pub struct AutoFetcher {
    http: HttpFetcher,
    file: FileFetcher,
}

impl AutoFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: HttpFetcher::new(timeout)?,
            file: FileFetcher,
        })
    }
}

#[async_trait]
impl FeedFetcher for AutoFetcher {
    async fn fetch(&self, location: &str) -> Result<String> {
        if is_http(location) {
            self.http.fetch(location).await
        } else {
            self.file.fetch(location).await
        }
    }

    fn name(&self) -> &'static str {
        "auto"
    }
}

fn is_http(location: &str) -> bool {
    let l = location.trim_start().to_ascii_lowercase();
    l.starts_with("http://") || l.starts_with("https://")
}

/// Split a feed body into rows of whitespace-separated fields.
///
/// Blank lines are skipped. Every row must have the same number of fields as
/// the first one, and at least [`MIN_RECORD_ARITY`].
pub fn parse_table(body: &str) -> Result<Vec<Vec<&str>>> {
    let mut rows: Vec<Vec<&str>> = Vec::new();
    let mut arity = None;

    for (lineno, line) in body.lines().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        let expected = *arity.get_or_insert(fields.len());
        if expected < MIN_RECORD_ARITY {
            bail!(
                "line {}: feed rows have {expected} fields, need at least {MIN_RECORD_ARITY}",
                lineno + 1
            );
        }
        if fields.len() != expected {
            bail!(
                "line {}: wrong number of fields (got {}, expected {expected})",
                lineno + 1,
                fields.len()
            );
        }
        rows.push(fields);
    }

    Ok(rows)
}
