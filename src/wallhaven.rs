use crate::config::SearchConfig;
use crate::error::SourceError;
use crate::image_source::{ImageSource, SearchQuery};
use futures::FutureExt;
use futures::future::BoxFuture;
use image::DynamicImage;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Deserialize, Debug)]
struct SearchResponse {
    data: Vec<Listing>,
}

#[derive(Deserialize, Debug)]
struct Listing {
    // full resolution image url
    path: String,
}

/// Image source backed by the wallhaven.cc search API.
pub struct WallhavenSource {
    client: Client,
    config: SearchConfig,
}

impl WallhavenSource {
    pub fn new(config: SearchConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("desktop2/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }

    fn query_params(&self, query: &SearchQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("categories", self.config.categories.clone()),
            ("purity", self.config.purity.clone()),
            ("resolutions", self.config.resolutions.clone()),
            ("order", self.config.order.clone()),
        ];

        match query {
            SearchQuery::Random => {
                params.push(("sorting", "random".to_string()));
                params.push(("seed", random_seed()));
            }
            SearchQuery::Term(term) => {
                params.push(("sorting", "date_added".to_string()));
                params.push(("q", term.clone()));
            }
        }

        if let Some(key) = &self.config.api_key {
            params.push(("apikey", key.clone()));
        }

        params
    }

    async fn search(&self, query: SearchQuery) -> Result<Vec<String>, SourceError> {
        let endpoint = &self.config.endpoint;
        info!("Querying wallhaven for {}", query);

        let resp = self
            .client
            .get(endpoint)
            .query(&self.query_params(&query))
            .send()
            .await
            .map_err(|e| network(endpoint, e))?;

        if !resp.status().is_success() {
            return Err(SourceError::Status {
                url: endpoint.clone(),
                status: resp.status(),
            });
        }

        let body: SearchResponse = resp.json().await.map_err(|e| network(endpoint, e))?;
        debug!("Wallhaven returned {} listing(s)", body.data.len());
        Ok(body.data.into_iter().map(|l| l.path).collect())
    }

    async fn download(&self, url: String) -> Result<DynamicImage, SourceError> {
        let target = normalize_url(&url);

        let resp = self
            .client
            .get(&target)
            .send()
            .await
            .map_err(|e| network(&url, e))?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(SourceError::Status { url, status });
        }

        let bytes = resp.bytes().await.map_err(|e| network(&url, e))?;
        let decoded = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes)).await?;
        decoded.map_err(|e| SourceError::Decode { url, source: e })
    }
}

impl ImageSource for WallhavenSource {
    fn list_urls(&self, query: SearchQuery) -> BoxFuture<'_, Result<Vec<String>, SourceError>> {
        self.search(query).boxed()
    }

    fn fetch_image(&self, url: String) -> BoxFuture<'_, Result<DynamicImage, SourceError>> {
        self.download(url).boxed()
    }
}

fn network(url: &str, source: reqwest::Error) -> SourceError {
    SourceError::Network {
        url: url.to_string(),
        source,
    }
}

fn random_seed() -> String {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    (0..6)
        .map(|_| ALPHABET[rand::random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Scheme-less `www.` input is fetched over http.
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.to_lowercase().starts_with("www.") {
        format!("http://{}", trimmed)
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(api_key: Option<&str>) -> WallhavenSource {
        let config = SearchConfig {
            api_key: api_key.map(String::from),
            ..SearchConfig::default()
        };
        WallhavenSource::new(config).unwrap()
    }

    fn value<'a>(params: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        params.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_term_query_sorted_by_date() {
        let params = source(None).query_params(&SearchQuery::Term("sunset beach".into()));
        assert_eq!(value(&params, "sorting"), Some("date_added"));
        assert_eq!(value(&params, "q"), Some("sunset beach"));
        assert_eq!(value(&params, "categories"), Some("100"));
        assert_eq!(value(&params, "resolutions"), Some("1920x1080"));
        assert_eq!(value(&params, "seed"), None);
        assert_eq!(value(&params, "apikey"), None);
    }

    #[test]
    fn test_random_query_is_seeded() {
        let params = source(Some("secret")).query_params(&SearchQuery::Random);
        assert_eq!(value(&params, "sorting"), Some("random"));
        assert_eq!(value(&params, "q"), None);
        assert_eq!(value(&params, "seed").map(str::len), Some(6));
        assert_eq!(value(&params, "apikey"), Some("secret"));
    }

    #[test]
    fn test_parse_search_response() {
        let body = r#"{"data":[{"id":"abc","path":"https://w.wallhaven.cc/full/ab/wallhaven-abc.jpg"}],"meta":{}}"#;
        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.data[0].path, "https://w.wallhaven.cc/full/ab/wallhaven-abc.jpg");
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("www.example.com/a.jpg"), "http://www.example.com/a.jpg");
        assert_eq!(normalize_url(" https://example.com/a.jpg "), "https://example.com/a.jpg");
    }
}
