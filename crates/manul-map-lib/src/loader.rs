//! Geo data loader
//!
//! The three documents are fetched concurrently and joined all-or-nothing:
//! either every one of them loads and parses, or the whole load fails with
//! the first error and no partial data is handed out.

use crate::feature::{PointRecord, RangeDocument};
use crate::{LoadError, PARSE_SNIPPET_CHARS, Result};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::pin::Pin;

/// Boxed fetch future; `Send` on native so it can run on the tokio runtime
#[cfg(not(target_arch = "wasm32"))]
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

/// Boxed fetch future; browser futures are not `Send`
#[cfg(target_arch = "wasm32")]
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + 'a>>;

/// Source of raw document text
pub trait ResourceFetcher: Send + Sync {
    /// Human-readable location of a resource, used in errors
    fn describe(&self, locator: &str) -> String;

    /// Fetch the full body of a resource
    fn fetch<'a>(&'a self, locator: &'a str) -> FetchFuture<'a>;
}

/// Locators of the three documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoSources {
    pub zoos: String,
    pub reserves: String,
    pub range: String,
}

impl Default for GeoSources {
    fn default() -> Self {
        Self {
            zoos: "data/zoos.json".to_string(),
            reserves: "data/reserves.json".to_string(),
            range: "data/range.json".to_string(),
        }
    }
}

/// Everything the map needs, parsed but not yet validated
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoData {
    pub zoos: Vec<PointRecord>,
    pub reserves: Vec<PointRecord>,
    pub range: RangeDocument,
}

/// Parse a JSON document, keeping the head of the body on failure
pub fn parse_json<T: DeserializeOwned>(url: &str, text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|e| LoadError::Parse {
        url: url.to_string(),
        reason: e.to_string(),
        snippet: text.chars().take(PARSE_SNIPPET_CHARS).collect(),
    })
}

async fn fetch_json<T: DeserializeOwned>(fetcher: &dyn ResourceFetcher, locator: &str) -> Result<T> {
    let text = fetcher.fetch(locator).await?;
    parse_json(&fetcher.describe(locator), &text)
}

/// Load zoos, reserves and range concurrently
pub async fn load_geo_data(fetcher: &dyn ResourceFetcher, sources: &GeoSources) -> Result<GeoData> {
    let started = instant::Instant::now();
    let (zoos, reserves, range) = tokio::try_join!(
        fetch_json::<Vec<PointRecord>>(fetcher, &sources.zoos),
        fetch_json::<Vec<PointRecord>>(fetcher, &sources.reserves),
        fetch_json::<RangeDocument>(fetcher, &sources.range),
    )?;

    tracing::info!(
        zoos = zoos.len(),
        reserves = reserves.len(),
        polygons = range.polygons.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Loaded geo data"
    );

    Ok(GeoData {
        zoos,
        reserves,
        range,
    })
}

/// Fetches documents over HTTP relative to a base URL
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base: reqwest::Url,
}

impl HttpFetcher {
    /// `base` is usually the page or site root the data directory lives under
    pub fn new(base: &str) -> Result<Self> {
        let base = reqwest::Url::parse(base).map_err(|e| LoadError::Fetch {
            url: base.to_string(),
            reason: format!("invalid base URL: {e}"),
        })?;
        Ok(Self {
            client: reqwest::Client::new(),
            base,
        })
    }

    fn resolve(&self, locator: &str) -> Result<reqwest::Url> {
        self.base.join(locator).map_err(|e| LoadError::Fetch {
            url: locator.to_string(),
            reason: e.to_string(),
        })
    }
}

impl ResourceFetcher for HttpFetcher {
    fn describe(&self, locator: &str) -> String {
        self.resolve(locator)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| locator.to_string())
    }

    fn fetch<'a>(&'a self, locator: &'a str) -> FetchFuture<'a> {
        Box::pin(async move {
            let url = self.resolve(locator)?;
            let fetch_error = |reason: String| LoadError::Fetch {
                url: url.to_string(),
                reason,
            };

            tracing::debug!(%url, "Fetching");
            let response = self
                .client
                .get(url.clone())
                .header(reqwest::header::CACHE_CONTROL, "no-cache")
                .send()
                .await
                .map_err(|e| fetch_error(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(fetch_error(format!("HTTP {}", status.as_u16())));
            }

            response.text().await.map_err(|e| fetch_error(e.to_string()))
        })
    }
}

/// Reads documents from a local data directory
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct FileFetcher {
    root: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileFetcher {
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl ResourceFetcher for FileFetcher {
    fn describe(&self, locator: &str) -> String {
        self.root.join(locator).display().to_string()
    }

    fn fetch<'a>(&'a self, locator: &'a str) -> FetchFuture<'a> {
        Box::pin(async move {
            let path = self.root.join(locator);
            tracing::debug!(path = %path.display(), "Reading");
            tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| LoadError::Fetch {
                    url: path.display().to_string(),
                    reason: e.to_string(),
                })
        })
    }
}
