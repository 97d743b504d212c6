// ABOUTME: Pass-through client for the external movie catalog (TMDB-compatible API)
// ABOUTME: Uses the server's bearer API key and bounds every request with a timeout

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::error::{AppError, Result};

/// Read-only view of the movie catalog. Responses are forwarded unmodified.
#[async_trait]
pub trait MovieCatalog: Send + Sync {
    async fn search(&self, title: &str) -> Result<Vec<Value>>;
    async fn popular(&self) -> Result<Vec<Value>>;
    async fn details(&self, movie_id: i32) -> Result<Value>;
    /// First entry of the provider's video list, in provider order.
    async fn trailer(&self, movie_id: i32) -> Result<Option<Value>>;
}

#[derive(Debug, Deserialize)]
struct ResultsPage {
    #[serde(default)]
    results: Vec<Value>,
}

pub struct TmdbCatalog {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl TmdbCatalog {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> anyhow::Result<Self> {
        // A trailing slash keeps `Url::join` from dropping the last path segment
        let base_url = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{}/", base_url))?
        };

        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .user_agent(concat!("reelmark/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| AppError::Internal(format!("Invalid catalog path {}: {}", path, e)))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = self.endpoint(path)?;
        tracing::debug!("Catalog request: {}", url);

        let response = self
            .http
            .get(url)
            .query(query)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read catalog response body".to_string());
            return Err(AppError::Catalog(format!(
                "{} returned {}: {}",
                path, status, message
            )));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl MovieCatalog for TmdbCatalog {
    async fn search(&self, title: &str) -> Result<Vec<Value>> {
        let page: ResultsPage = self.get_json("search/movie", &[("query", title)]).await?;
        Ok(page.results)
    }

    async fn popular(&self) -> Result<Vec<Value>> {
        let page: ResultsPage = self.get_json("movie/popular", &[]).await?;
        Ok(page.results)
    }

    async fn details(&self, movie_id: i32) -> Result<Value> {
        self.get_json(&format!("movie/{}", movie_id), &[]).await
    }

    async fn trailer(&self, movie_id: i32) -> Result<Option<Value>> {
        let page: ResultsPage = self
            .get_json(&format!("movie/{}/videos", movie_id), &[])
            .await?;
        Ok(page.results.into_iter().next())
    }
}
