//! Loading the three chart assets.
//!
//! Assets are resolved against a base URL (`file://` or `http(s)://`) and
//! fetched concurrently. Each loader degrades instead of failing: a missing or
//! malformed data file yields no rows, a broken theme yields an empty theme,
//! and a broken chart spec yields `{}`. The fault is logged either way.

use crate::config::{AssetPaths, FieldMap, PipelineConfig};
use crate::data::{transform, CityRow, FeatureCollection};
use crate::spec::Theme;
use crate::{Error, Result};
use serde_json::{json, Value};
use std::path::Path;
#[cfg(feature = "http")]
use std::time::Duration;
use url::Url;

/// Everything a render cycle needs from the network
#[derive(Debug, Clone)]
pub struct Assets {
    pub rows: Vec<CityRow>,
    pub theme: Theme,
    pub chart: Value,
}

pub struct AssetLoader {
    base: Url,
    paths: AssetPaths,
    fields: FieldMap,
    #[cfg(feature = "http")]
    client: reqwest::Client,
}

impl AssetLoader {
    /// Loader rooted at `base`. Directory URLs need a trailing slash.
    pub fn new(base: Url, config: &PipelineConfig) -> Result<Self> {
        #[cfg(feature = "http")]
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timing.request_timeout_ms))
            .build()
            .map_err(|e| Error::NetworkError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base,
            paths: config.assets.clone(),
            fields: config.fields.clone(),
            #[cfg(feature = "http")]
            client,
        })
    }

    /// Loader for a URL or a local directory.
    pub fn from_location(location: &str, config: &PipelineConfig) -> Result<Self> {
        let base = match Url::parse(location) {
            Ok(url) if url.scheme() != "file" || location.ends_with('/') => url,
            Ok(url) => with_trailing_slash(url),
            Err(_) => directory_url(Path::new(location))?,
        };
        Self::new(base, config)
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn resolve(&self, relative: &str) -> Result<Url> {
        self.base
            .join(relative)
            .map_err(|e| Error::AssetError(format!("Bad asset path {}: {}", relative, e)))
    }

    /// Fetch `relative` as text.
    pub async fn fetch_text(&self, relative: &str) -> Result<String> {
        let url = self.resolve(relative)?;
        match url.scheme() {
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| Error::AssetError(format!("Not a local path: {}", url)))?;
                tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|e| Error::AssetError(format!("Failed to read {}: {}", path.display(), e)))
            }
            "http" | "https" => self.fetch_http(url).await,
            other => Err(Error::AssetError(format!("Unsupported scheme {} for {}", other, url))),
        }
    }

    #[cfg(feature = "http")]
    async fn fetch_http(&self, url: Url) -> Result<String> {
        let res = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::NetworkError(format!("HTTP GET {} failed: {}", url, e)))?;
        let res = res
            .error_for_status()
            .map_err(|e| Error::NetworkError(format!("HTTP GET {} failed: {}", url, e)))?;
        Ok(res.text().await?)
    }

    #[cfg(not(feature = "http"))]
    async fn fetch_http(&self, url: Url) -> Result<String> {
        Err(Error::NetworkError(format!("HTTP support is disabled; cannot fetch {}", url)))
    }

    pub async fn fetch_json(&self, relative: &str) -> Result<Value> {
        let text = self.fetch_text(relative).await?;
        serde_json::from_str(&text).map_err(|e| Error::ParseError(format!("{}: {}", relative, e)))
    }

    /// Valid city rows from the data asset, in file order. Empty on failure.
    pub async fn load_table(&self) -> Vec<CityRow> {
        let loaded = self
            .fetch_json(&self.paths.data)
            .await
            .and_then(|doc| serde_json::from_value::<FeatureCollection>(doc).map_err(Error::from));
        match loaded {
            Ok(collection) => transform(&collection, &self.fields),
            Err(e) => {
                log::error!("Error loading data from {}: {}", self.paths.data, e);
                Vec::new()
            }
        }
    }

    /// Theme asset, or an empty theme on failure.
    pub async fn load_theme(&self) -> Theme {
        match self.fetch_json(&self.paths.theme).await {
            Ok(doc) => Theme::from_value(&doc),
            Err(e) => {
                log::error!("Error loading theme from {}: {}", self.paths.theme, e);
                Theme::default()
            }
        }
    }

    /// Base chart specification, or `{}` on failure.
    pub async fn load_chart_spec(&self) -> Value {
        match self.fetch_json(&self.paths.chart).await {
            Ok(doc) => doc,
            Err(e) => {
                log::error!("Error loading chart spec from {}: {}", self.paths.chart, e);
                json!({})
            }
        }
    }

    /// All three assets, fetched concurrently.
    pub async fn load_all(&self) -> Assets {
        let (rows, theme, chart) = futures::join!(self.load_table(), self.load_theme(), self.load_chart_spec());
        Assets { rows, theme, chart }
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn directory_url(dir: &Path) -> Result<Url> {
    let absolute = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        std::env::current_dir()?.join(dir)
    };
    Url::from_directory_path(&absolute)
        .map_err(|_| Error::ConfigError(format!("Invalid asset directory: {}", absolute.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_dir() -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("public")
    }

    #[tokio::test]
    async fn loads_shipped_assets_from_disk() {
        let loader = AssetLoader::from_location(fixture_dir().to_str().unwrap(), &PipelineConfig::default()).unwrap();
        let assets = loader.load_all().await;
        assert!(assets.rows.len() >= 15);
        assert!(!assets.theme.config.is_empty());
        assert_eq!(assets.chart["mark"], json!("bar"));
    }

    #[tokio::test]
    async fn missing_assets_degrade() {
        let dir = std::env::temp_dir().join("cochart-missing-assets");
        let loader = AssetLoader::from_location(dir.to_str().unwrap(), &PipelineConfig::default()).unwrap();
        let assets = loader.load_all().await;
        assert!(assets.rows.is_empty());
        assert_eq!(assets.theme, Theme::default());
        assert_eq!(assets.chart, json!({}));
    }

    #[test]
    fn resolves_relative_to_directory() {
        let loader = AssetLoader::from_location("http://localhost:8080/static", &PipelineConfig::default()).unwrap();
        assert_eq!(
            loader.resolve("data/x.geojson").unwrap().as_str(),
            "http://localhost:8080/data/x.geojson"
        );
        let loader = AssetLoader::from_location("http://localhost:8080/static/", &PipelineConfig::default()).unwrap();
        assert_eq!(
            loader.resolve("data/x.geojson").unwrap().as_str(),
            "http://localhost:8080/static/data/x.geojson"
        );
    }
}
