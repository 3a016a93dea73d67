use crate::image_source::{ImageCandidate, ImageSource, SearchQuery};
use futures::{StreamExt, future, stream};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const DEFAULT_STATUS: &str = "Enter URL, File Path or a Search";
pub const SEARCHING: &str = "Searching...";
pub const DOWNLOADING: &str = "Downloading...";
pub const OPENING: &str = "Opening...";

/// Transient status text shown above the search box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLabel {
    text: String,
}

impl Default for StatusLabel {
    fn default() -> Self {
        Self {
            text: DEFAULT_STATUS.to_string(),
        }
    }
}

impl StatusLabel {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set(&mut self, text: &str) {
        debug!("Status: {}", text);
        self.text = text.to_string();
    }

    pub fn reset(&mut self) {
        self.set(DEFAULT_STATUS);
    }

    pub fn is_default(&self) -> bool {
        self.text == DEFAULT_STATUS
    }
}

#[derive(Debug, Default)]
pub enum SearchState {
    #[default]
    Idle,
    Running(SearchQuery),
    Completed(Vec<ImageCandidate>),
}

struct SearchRequest {
    ticket: u64,
    query: SearchQuery,
}

/// Result of one worker run, handed back to the UI context.
#[derive(Debug)]
pub struct SearchOutcome {
    ticket: u64,
    pub query: SearchQuery,
    pub candidates: Vec<ImageCandidate>,
}

/// Single-flight search. One worker task resolves queries; a request made
/// while a search is running is rejected outright.
pub struct SearchPipeline {
    state: SearchState,
    ticket: u64,
    requests: mpsc::Sender<SearchRequest>,
    outcomes: mpsc::Receiver<SearchOutcome>,
    worker: JoinHandle<()>,
}

impl SearchPipeline {
    /// Spawns the worker on the current tokio runtime.
    pub fn spawn(source: Arc<dyn ImageSource>, concurrency: usize) -> Self {
        let (request_tx, request_rx) = mpsc::channel(1);
        let (outcome_tx, outcome_rx) = mpsc::channel(1);
        let worker = tokio::spawn(run_worker(source, concurrency, request_rx, outcome_tx));

        Self {
            state: SearchState::Idle,
            ticket: 0,
            requests: request_tx,
            outcomes: outcome_rx,
            worker,
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state, SearchState::Running(_))
    }

    pub fn start(&mut self, query: SearchQuery, status: &mut StatusLabel) -> bool {
        if self.is_busy() {
            debug!("Search for {} rejected, already running", query);
            return false;
        }

        self.ticket += 1;
        let request = SearchRequest {
            ticket: self.ticket,
            query: query.clone(),
        };

        if let Err(e) = self.requests.try_send(request) {
            warn!("Search worker unavailable: {}", e);
            return false;
        }

        info!("Searching for {}", query);
        self.state = SearchState::Running(query);
        status.set(SEARCHING);
        true
    }

    /// Waits for the worker to finish the running search.
    pub async fn next_outcome(&mut self) -> Option<SearchOutcome> {
        self.outcomes.recv().await
    }

    /// Moves Running -> Completed -> Idle and hands back the results. Outcomes
    /// that don't belong to the running search are discarded.
    pub fn complete(
        &mut self,
        outcome: SearchOutcome,
        status: &mut StatusLabel,
    ) -> Option<Vec<ImageCandidate>> {
        let current = matches!(&self.state, SearchState::Running(_)) && outcome.ticket == self.ticket;
        if !current {
            warn!("Discarding stale results for {}", outcome.query);
            return None;
        }

        info!(
            "Search for {} finished with {} image(s)",
            outcome.query,
            outcome.candidates.len()
        );
        self.state = SearchState::Completed(outcome.candidates);

        let results = match std::mem::take(&mut self.state) {
            SearchState::Completed(results) => results,
            _ => Vec::new(),
        };
        status.reset();
        Some(results)
    }
}

impl Drop for SearchPipeline {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn run_worker(
    source: Arc<dyn ImageSource>,
    concurrency: usize,
    mut requests: mpsc::Receiver<SearchRequest>,
    outcomes: mpsc::Sender<SearchOutcome>,
) {
    while let Some(request) = requests.recv().await {
        let candidates = resolve(source.as_ref(), &request.query, concurrency).await;
        let outcome = SearchOutcome {
            ticket: request.ticket,
            query: request.query,
            candidates,
        };

        if outcomes.send(outcome).await.is_err() {
            break;
        }
    }
    debug!("Search worker stopped");
}

/// Lists URLs for `query` and fetches them, keeping listing order. Failed
/// fetches are dropped; a failed listing yields no images.
pub async fn resolve(
    source: &dyn ImageSource,
    query: &SearchQuery,
    concurrency: usize,
) -> Vec<ImageCandidate> {
    let urls = match source.list_urls(query.clone()).await {
        Ok(urls) => dedup_urls(urls),
        Err(e) => {
            warn!("Listing images for {} failed: {}", query, e);
            return Vec::new();
        }
    };

    stream::iter(urls)
        .map(|url| async move {
            match source.fetch_image(url.clone()).await {
                Ok(image) => Some(ImageCandidate::from_url(url, image)),
                Err(e) => {
                    debug!("Dropping candidate: {}", e);
                    None
                }
            }
        })
        .buffered(concurrency.max(1))
        .filter_map(future::ready)
        .collect()
        .await
}

/// First occurrence wins.
pub fn dedup_urls(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter().filter(|u| seen.insert(u.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_source::ImageOrigin;
    use crate::image_source::testing::StubSource;
    use tokio::sync::Notify;

    fn origins(candidates: &[ImageCandidate]) -> Vec<String> {
        candidates.iter().map(|c| c.origin().to_string()).collect()
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let urls = vec!["A", "B", "A", "C"].into_iter().map(String::from).collect();
        assert_eq!(dedup_urls(urls), vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_resolve_drops_failed_fetches() {
        let mut source = StubSource::with_urls(&["u1", "u2", "u1", "u3"]);
        source.broken.insert("u2".to_string());

        let candidates = resolve(&source, &SearchQuery::Random, 2).await;
        assert_eq!(origins(&candidates), vec!["u1", "u3"]);
        let mut fetched = source.fetched.lock().unwrap().clone();
        fetched.sort();
        assert_eq!(fetched, vec!["u1", "u2", "u3"]);
    }

    #[tokio::test]
    async fn test_resolve_listing_failure_is_empty() {
        let mut source = StubSource::with_urls(&["u1"]);
        source.listing_fails = true;

        let candidates = resolve(&source, &SearchQuery::Term("x".into()), 4).await;
        assert!(candidates.is_empty());
        assert!(source.fetched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_random_search_end_to_end() {
        let source = Arc::new(StubSource::with_urls(&["u1", "u2"]));
        let mut pipeline = SearchPipeline::spawn(source.clone(), 4);
        let mut status = StatusLabel::default();

        assert!(pipeline.start(SearchQuery::Random, &mut status));
        assert_eq!(status.text(), SEARCHING);

        let outcome = pipeline.next_outcome().await.unwrap();
        let results = pipeline.complete(outcome, &mut status).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].origin(), &ImageOrigin::Url("u1".into()));
        assert!(matches!(pipeline.state(), SearchState::Idle));
        assert!(status.is_default());
        assert_eq!(*source.queries.lock().unwrap(), vec![SearchQuery::Random]);
    }

    #[tokio::test]
    async fn test_start_while_running_is_rejected() {
        let gate = Arc::new(Notify::new());
        let source = Arc::new(StubSource {
            gate: Some(gate.clone()),
            ..StubSource::with_urls(&["u1"])
        });
        let mut pipeline = SearchPipeline::spawn(source.clone(), 1);
        let mut status = StatusLabel::default();

        assert!(pipeline.start(SearchQuery::Random, &mut status));
        assert!(!pipeline.start(SearchQuery::Term("cats".into()), &mut status));
        assert!(matches!(pipeline.state(), SearchState::Running(SearchQuery::Random)));

        gate.notify_one();
        let outcome = pipeline.next_outcome().await.unwrap();
        assert_eq!(outcome.query, SearchQuery::Random);
        assert_eq!(pipeline.complete(outcome, &mut status).map(|r| r.len()), Some(1));

        // Delivered exactly once, and the rejected query never reached the source.
        assert!(pipeline.outcomes.try_recv().is_err());
        assert_eq!(*source.queries.lock().unwrap(), vec![SearchQuery::Random]);

        assert!(pipeline.start(SearchQuery::Term("cats".into()), &mut status));
    }

    #[tokio::test]
    async fn test_outcome_without_running_search_is_discarded() {
        let source = Arc::new(StubSource::with_urls(&["u1"]));
        let mut pipeline = SearchPipeline::spawn(source, 1);
        let mut status = StatusLabel::default();

        assert!(pipeline.start(SearchQuery::Random, &mut status));
        let outcome = pipeline.next_outcome().await.unwrap();
        let stale = SearchOutcome {
            ticket: outcome.ticket + 7,
            query: SearchQuery::Random,
            candidates: Vec::new(),
        };

        assert!(pipeline.complete(stale, &mut status).is_none());
        assert!(pipeline.is_busy());
        assert!(pipeline.complete(outcome, &mut status).is_some());
        assert!(!pipeline.is_busy());
    }
}
