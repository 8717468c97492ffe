//! Keyed query cache sitting between the views and the API
//!
//! Reads never block: they return whatever the cache holds and, when the
//! entry is missing, stale or invalidated, start one background fetch for
//! that key. Writes go through `Mutation` handles and update or invalidate
//! the affected entries when they succeed.

mod infinite;
mod mutation;

pub use infinite::FeedQuery;
pub use mutation::Mutation;
#[cfg(test)]
pub use mutation::MutationState;

use crate::api::{ApiClient, TokenApi, UploadApi};
use crate::constants::{CACHE_GC_TIME, CACHE_SWEEP_INTERVAL};
use crate::error::ApiError;
use crate::types::{CreateTokenDto, Token, TokenPage, TokenQueryParams, TokenStats, UpdateTokenDto};
use eframe::egui;
use infinite::FeedEntry;
use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};
use url::Url;

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Snapshot of one cached read
#[derive(Debug, Clone, PartialEq)]
pub struct Query<T> {
    pub data: Option<T>,
    pub error: Option<String>,
    pub is_fetching: bool,
}

pub(crate) struct Entry<T> {
    pub(crate) data: Option<T>,
    pub(crate) error: Option<String>,
    pub(crate) updated_at: Option<Instant>,
    pub(crate) read_at: Option<Instant>,
    pub(crate) fetching: bool,
    pub(crate) invalidated: bool,
    /// Bumped on every invalidation so fetches started earlier can tell
    pub(crate) generation: u64,
}

impl<T> Default for Entry<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            updated_at: None,
            read_at: None,
            fetching: false,
            invalidated: false,
            generation: 0,
        }
    }
}

impl<T: Clone> Entry<T> {
    fn ready(data: T) -> Self {
        Self {
            data: Some(data),
            updated_at: Some(Instant::now()),
            ..Self::default()
        }
    }

    fn is_stale(&self, stale_time: Duration) -> bool {
        self.updated_at.map_or(true, |at| at.elapsed() >= stale_time)
    }

    /// Failed entries stay failed until invalidated.
    pub(crate) fn needs_fetch(&self, stale_time: Duration) -> bool {
        if self.fetching {
            return false;
        }
        self.invalidated || (self.error.is_none() && (self.data.is_none() || self.is_stale(stale_time)))
    }

    /// Nothing in flight and neither read nor written within `gc_time`
    pub(crate) fn is_unused(&self, now: Instant, gc_time: Duration) -> bool {
        !self.fetching
            && self
                .read_at
                .max(self.updated_at)
                .map_or(true, |at| now.saturating_duration_since(at) >= gc_time)
    }

    pub(crate) fn invalidate(&mut self) {
        self.invalidated = true;
        self.generation += 1;
    }

    fn begin(&mut self) -> u64 {
        self.fetching = true;
        self.generation
    }

    fn resolve(&mut self, result: Result<T, ApiError>, generation: u64) {
        self.fetching = false;
        match result {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
                self.updated_at = Some(Instant::now());
            }
            Err(e) => self.error = Some(e.display_message()),
        }
        if generation == self.generation {
            self.invalidated = false;
        }
    }

    fn snapshot(&self) -> Query<T> {
        Query {
            data: self.data.clone(),
            error: self.error.clone(),
            is_fetching: self.fetching,
        }
    }
}

/// Picks the entry for a key out of the cache
type Slot<K, T> = for<'a, 'b> fn(&'a mut Cache, &'b K) -> &'a mut Entry<T>;

#[derive(Default)]
struct Cache {
    lists: HashMap<TokenQueryParams, Entry<TokenPage>>,
    feeds: HashMap<TokenQueryParams, FeedEntry>,
    details: HashMap<String, Entry<Token>>,
    stats: Entry<TokenStats>,
    swept_at: Option<Instant>,
}

impl Cache {
    fn list_slot(&mut self, key: &TokenQueryParams) -> &mut Entry<TokenPage> {
        self.lists.entry(key.clone()).or_default()
    }

    fn detail_slot(&mut self, id: &String) -> &mut Entry<Token> {
        self.details.entry(id.clone()).or_default()
    }

    fn stats_slot(&mut self, _: &()) -> &mut Entry<TokenStats> {
        &mut self.stats
    }

    /// Drop keyed entries nobody used for `gc_time`. Returns how many went.
    fn evict_unused(&mut self, now: Instant, gc_time: Duration) -> usize {
        let count = |cache: &Self| cache.lists.len() + cache.feeds.len() + cache.details.len();
        let before = count(self);
        self.lists.retain(|_, entry| !entry.is_unused(now, gc_time));
        self.feeds.retain(|_, feed| !feed.is_unused(now, gc_time));
        self.details.retain(|_, entry| !entry.is_unused(now, gc_time));
        before - count(self)
    }

    fn sweep(&mut self, now: Instant) {
        if self
            .swept_at
            .is_some_and(|at| now.saturating_duration_since(at) < CACHE_SWEEP_INTERVAL)
        {
            return;
        }
        self.swept_at = Some(now);
        let dropped = self.evict_unused(now, CACHE_GC_TIME);
        if dropped > 0 {
            debug!(dropped, "Evicted unused queries");
        }
    }

    /// Everything derived from the token listing
    fn invalidate_lists(&mut self) {
        self.lists.values_mut().for_each(Entry::invalidate);
        self.feeds.values_mut().for_each(|feed| feed.pages.invalidate());
        self.stats.invalidate();
    }
}

#[derive(Clone)]
pub struct QueryClient {
    runtime: Handle,
    tokens: TokenApi,
    uploads: UploadApi,
    cache: Arc<Mutex<Cache>>,
    ctx: egui::Context,
    stale_time: Duration,
    base_url: Url,
}

impl QueryClient {
    pub fn new(client: ApiClient, runtime: Handle, ctx: egui::Context, stale_time: Duration) -> Self {
        Self {
            runtime,
            base_url: client.base_url().clone(),
            tokens: TokenApi::new(client.clone()),
            uploads: UploadApi::new(client),
            cache: Arc::new(Mutex::new(Cache::default())),
            ctx,
            stale_time,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ---- reads ----

    /// One page of a listing (management table)
    pub fn list(&self, params: &TokenQueryParams) -> Query<TokenPage> {
        let api = self.tokens.clone();
        let key = params.clone();
        self.read(params.clone(), Cache::list_slot, move || async move { api.list(&key).await })
    }

    pub fn token(&self, id: &str) -> Query<Token> {
        let api = self.tokens.clone();
        let key = id.to_string();
        self.read(id.to_string(), Cache::detail_slot, move || async move { api.get(&key).await })
    }

    pub fn stats(&self) -> Query<TokenStats> {
        let api = self.tokens.clone();
        self.read((), Cache::stats_slot, move || async move { api.stats().await })
    }

    fn read<K, T, F, Fut>(&self, key: K, slot: Slot<K, T>, fetch: F) -> Query<T>
    where
        K: Debug + Send + 'static,
        T: Clone + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let now = Instant::now();
        let mut cache = lock(&self.cache);
        cache.sweep(now);
        let entry = slot(&mut cache, &key);
        entry.read_at = Some(now);
        let mut snapshot = entry.snapshot();
        if !entry.needs_fetch(self.stale_time) {
            return snapshot;
        }

        let generation = entry.begin();
        snapshot.is_fetching = true;
        drop(cache);

        debug!(key = ?key, "Fetching query");
        let request = fetch();
        let shared = Arc::clone(&self.cache);
        let ctx = self.ctx.clone();
        self.runtime.spawn(async move {
            let result = request.await;
            if let Err(e) = &result {
                warn!(key = ?key, error = %e, "Query failed");
            }
            slot(&mut lock(&shared), &key).resolve(result, generation);
            ctx.request_repaint();
        });
        snapshot
    }

    /// Infinite feed for `params` (page ignored). Starts with page 1.
    pub fn feed(&self, params: &TokenQueryParams) -> FeedQuery {
        let key = params.without_page();
        let now = Instant::now();
        let mut cache = lock(&self.cache);
        cache.sweep(now);
        let feed = cache.feeds.entry(key.clone()).or_default();
        feed.pages.read_at = Some(now);
        let mut snapshot = feed.snapshot();
        if !feed.needs_fetch(self.stale_time) {
            return snapshot;
        }

        let count = feed.loaded_pages();
        let generation = feed.pages.begin();
        snapshot.is_fetching = true;
        drop(cache);

        debug!(key = ?key, pages = count.max(1), "Loading feed");
        let api = self.tokens.clone();
        let shared = Arc::clone(&self.cache);
        let ctx = self.ctx.clone();
        self.runtime.spawn(async move {
            let result = infinite::load_pages(&api, &key, count).await;
            if let Err(e) = &result {
                warn!(key = ?key, error = %e, "Feed load failed");
            }
            if let Some(feed) = lock(&shared).feeds.get_mut(&key) {
                feed.pages.resolve(result, generation);
            }
            ctx.request_repaint();
        });
        snapshot
    }

    /// Load the page after the last one in the feed. No-op while anything
    /// is in flight for the feed or when the last page is already loaded.
    pub fn fetch_next_page(&self, params: &TokenQueryParams) {
        let key = params.without_page();
        let mut cache = lock(&self.cache);
        let Some(feed) = cache.feeds.get_mut(&key) else {
            return;
        };
        if !feed.can_fetch_next() {
            return;
        }
        let Some(number) = feed.next_page() else {
            return;
        };
        feed.fetching_next = true;
        let generation = feed.pages.generation;
        drop(cache);

        debug!(key = ?key, page = number, "Fetching next page");
        let api = self.tokens.clone();
        let shared = Arc::clone(&self.cache);
        let ctx = self.ctx.clone();
        self.runtime.spawn(async move {
            let result = api.list(&key.with_page(number)).await;
            if let Err(e) = &result {
                warn!(key = ?key, page = number, error = %e, "Next page failed");
            }
            if let Some(feed) = lock(&shared).feeds.get_mut(&key) {
                feed.resolve_next(number, result, generation);
            }
            ctx.request_repaint();
        });
    }

    // ---- cache control ----

    /// Mark every entry for refetch, failed ones included
    pub fn invalidate_all(&self) {
        let mut cache = lock(&self.cache);
        cache.invalidate_lists();
        cache.details.values_mut().for_each(Entry::invalidate);
        drop(cache);
        self.ctx.request_repaint();
    }

    // ---- writes ----

    pub fn create_token(&self, dto: CreateTokenDto) -> Mutation<Token> {
        let api = self.tokens.clone();
        let request = async move {
            api.ensure_symbol_free(&dto.symbol).await?;
            api.create(&dto).await
        };
        self.mutate("create token", request, |cache, token: &Token| {
            cache.details.insert(token.id.clone(), Entry::ready(token.clone()));
            cache.invalidate_lists();
        })
    }

    pub fn update_token(&self, id: String, dto: UpdateTokenDto) -> Mutation<Token> {
        let api = self.tokens.clone();
        self.mutate(
            "update token",
            async move { api.update(&id, &dto).await },
            |cache, token: &Token| {
                cache.details.insert(token.id.clone(), Entry::ready(token.clone()));
                cache.invalidate_lists();
            },
        )
    }

    pub fn delete_token(&self, id: String) -> Mutation<()> {
        let api = self.tokens.clone();
        let key = id.clone();
        self.mutate("delete token", async move { api.delete(&id).await }, move |cache, _| {
            cache.details.remove(&key);
            cache.invalidate_lists();
        })
    }

    /// Read, presign and upload the image at `path`. Cancelling `cancel`
    /// abandons the transfer and fails the mutation.
    pub fn upload_logo(&self, path: PathBuf, cancel: CancellationToken) -> Mutation<String> {
        let api = self.uploads.clone();
        let upload = async move {
            tokio::select! {
                _ = cancel.cancelled() => Err(ApiError::Cancelled),
                result = api.upload_file(&path) => result,
            }
        };
        self.mutate("upload logo", upload, |_, _| {})
    }

    pub fn delete_image(&self, url: String) -> Mutation<()> {
        let api = self.uploads.clone();
        self.mutate("delete image", async move { api.delete_image(&url).await }, |_, _| {})
    }

    fn mutate<T, Fut, S>(&self, action: &'static str, request: Fut, on_success: S) -> Mutation<T>
    where
        T: Clone + Send + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
        S: FnOnce(&mut Cache, &T) + Send + 'static,
    {
        let mutation = Mutation::pending();
        let handle = mutation.clone();
        let shared = Arc::clone(&self.cache);
        let ctx = self.ctx.clone();
        self.runtime.spawn(async move {
            let result = request.await;
            match &result {
                Ok(value) => on_success(&mut lock(&shared), value),
                Err(ApiError::Cancelled) => debug!(action, "Mutation cancelled"),
                Err(e) => error!(action, error = %e, message = %e.display_message(), "Mutation failed"),
            }
            handle.resolve(result.map_err(|e| e.display_message()));
            ctx.request_repaint();
        });
        mutation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{client_for, token_json};
    use httpmock::prelude::*;
    use serde_json::json;

    fn query_client(server: &MockServer, stale_time: Duration) -> QueryClient {
        QueryClient::new(client_for(server), Handle::current(), egui::Context::default(), stale_time)
    }

    async fn settle(mut done: impl FnMut() -> bool) {
        for _ in 0..200 {
            if done() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached in time");
    }

    fn list_body(tokens: Vec<serde_json::Value>) -> serde_json::Value {
        let total = tokens.len();
        json!({
            "success": true,
            "message": "ok",
            "data": tokens,
            "meta": {"total": total, "page": 1, "limit": 10, "total_pages": 1}
        })
    }

    fn admin_params() -> TokenQueryParams {
        TokenQueryParams {
            page: Some(1),
            limit: Some(10),
            ..Default::default()
        }
    }

    fn cached_list(client: &QueryClient, params: &TokenQueryParams) -> Option<TokenPage> {
        lock(&client.cache).lists.get(params).and_then(|e| e.data.clone())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn identical_reads_share_one_request() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/tokens");
                then.status(200)
                    .delay(Duration::from_millis(50))
                    .json_body(list_body(vec![token_json("t1", "Bitcoin", "BTC")]));
            })
            .await;

        let client = query_client(&server, Duration::from_secs(300));
        let params = admin_params();
        let first = client.list(&params);
        let second = client.list(&params);
        assert!(first.is_fetching && second.is_fetching);
        assert!(second.data.is_none() && second.error.is_none());

        settle(|| !client.list(&params).is_fetching).await;
        assert_eq!(client.list(&params).data.unwrap().tokens.len(), 1);
        mock.assert_hits_async(1).await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stale_entries_refetch_on_read() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/tokens/stats");
                then.status(200).json_body(json!({
                    "success": true,
                    "data": {"total_tokens": 1, "total_market_cap": 10.0, "average_price": 10.0}
                }));
            })
            .await;

        let client = query_client(&server, Duration::ZERO);
        client.stats();
        settle(|| lock(&client.cache).stats.updated_at.is_some()).await;

        let again = client.stats();
        assert!(again.is_fetching);
        assert_eq!(again.data.unwrap().total_tokens, 1);
        settle(|| !lock(&client.cache).stats.fetching).await;
        mock.assert_hits_async(2).await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn created_token_shows_up_in_next_list() {
        let server = MockServer::start_async().await;
        let empty_list = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/tokens");
                then.status(200).json_body(list_body(vec![]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/tokens");
                then.status(201).json_body(json!({
                    "success": true,
                    "message": "created",
                    "data": token_json("t1", "Bitcoin", "BTC")
                }));
            })
            .await;

        let client = query_client(&server, Duration::from_secs(300));
        let params = admin_params();
        client.list(&params);
        settle(|| cached_list(&client, &params).is_some()).await;
        assert!(cached_list(&client, &params).unwrap().tokens.is_empty());

        let created = client.create_token(CreateTokenDto {
            name: "Bitcoin".into(),
            symbol: "BTC".into(),
            ..Default::default()
        });
        settle(|| !created.is_pending()).await;
        assert!(matches!(created.state(), MutationState::Success(ref t) if t.id == "t1"));
        assert!(lock(&client.cache).stats.invalidated);

        empty_list.delete_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/tokens");
                then.status(200)
                    .json_body(list_body(vec![token_json("t1", "Bitcoin", "BTC")]));
            })
            .await;

        let after = client.list(&params);
        assert!(after.is_fetching);
        settle(|| {
            cached_list(&client, &params).is_some_and(|p| p.tokens.iter().any(|t| t.symbol == "BTC"))
        })
        .await;

        // Detail entry was seeded by the mutation, no request needed
        let detail = client.token("t1");
        assert!(!detail.is_fetching);
        assert_eq!(detail.data.unwrap().name, "Bitcoin");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn deleted_token_is_gone_from_next_list() {
        let server = MockServer::start_async().await;
        let full_list = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/tokens");
                then.status(200).json_body(list_body(vec![
                    token_json("t1", "Bitcoin", "BTC"),
                    token_json("t2", "Ether", "ETH"),
                ]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(DELETE).path("/api/tokens/t1");
                then.status(200).json_body(json!({"success": true, "message": "deleted"}));
            })
            .await;

        let client = query_client(&server, Duration::from_secs(300));
        let params = admin_params();
        client.list(&params);
        settle(|| cached_list(&client, &params).is_some()).await;

        let deleted = client.delete_token("t1".into());
        settle(|| !deleted.is_pending()).await;
        assert_eq!(deleted.state(), MutationState::Success(()));

        full_list.delete_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/tokens");
                then.status(200).json_body(list_body(vec![token_json("t2", "Ether", "ETH")]));
            })
            .await;

        client.list(&params);
        settle(|| cached_list(&client, &params).is_some_and(|p| p.tokens.len() == 1)).await;
        let page = cached_list(&client, &params).unwrap();
        assert!(page.tokens.iter().all(|t| t.id != "t1"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_mutation_keeps_cache_and_reports_server_text() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(PUT).path("/api/tokens/t1");
                then.status(400).json_body(json!({
                    "success": false,
                    "message": "Validation failed",
                    "error": "Symbol already taken"
                }));
            })
            .await;

        let client = query_client(&server, Duration::from_secs(300));
        let updated = client.update_token("t1".into(), UpdateTokenDto::default());
        settle(|| !updated.is_pending()).await;
        assert_eq!(updated.state(), MutationState::Failed("Symbol already taken".into()));
        assert!(lock(&client.cache).details.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_read_waits_for_invalidation() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/tokens/t1");
                then.status(500).json_body(json!({"success": false, "message": "boom"}));
            })
            .await;

        let client = query_client(&server, Duration::from_secs(300));
        client.token("t1");
        settle(|| client.token("t1").error.is_some()).await;
        assert_eq!(client.token("t1").error.as_deref(), Some("boom"));
        mock.assert_hits_async(1).await;

        client.invalidate_all();
        assert!(client.token("t1").is_fetching);
        settle(|| !client.token("t1").is_fetching).await;
        mock.assert_hits_async(2).await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn feed_loads_pages_in_sequence() {
        let server = MockServer::start_async().await;
        let page_one = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/tokens").query_param("page", "1");
                then.status(200).json_body(json!({
                    "success": true,
                    "data": [token_json("t1", "Bitcoin", "BTC"), token_json("t2", "Ether", "ETH")],
                    "meta": {"total": 3, "page": 1, "limit": 2, "total_pages": 2}
                }));
            })
            .await;
        let page_two = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/tokens").query_param("page", "2");
                then.status(200).delay(Duration::from_millis(50)).json_body(json!({
                    "success": true,
                    "data": [token_json("t3", "Solana", "SOL")],
                    "meta": {"total": 3, "page": 2, "limit": 2, "total_pages": 2}
                }));
            })
            .await;

        let client = query_client(&server, Duration::from_secs(300));
        let params = TokenQueryParams {
            limit: Some(2),
            ..Default::default()
        };

        // Nothing to extend before the first page lands
        client.fetch_next_page(&params);
        assert!(client.feed(&params).is_loading());
        settle(|| client.feed(&params).loaded).await;
        let feed = client.feed(&params);
        assert_eq!(feed.tokens.len(), 2);
        assert!(feed.has_next_page);

        client.fetch_next_page(&params);
        client.fetch_next_page(&params);
        assert!(client.feed(&params).is_fetching_next_page);
        settle(|| !client.feed(&params).is_fetching_next_page).await;

        let feed = client.feed(&params);
        let symbols: Vec<_> = feed.tokens.iter().map(|t| t.symbol.as_str()).collect();
        assert_eq!(symbols, ["BTC", "ETH", "SOL"]);
        assert!(!feed.has_next_page);

        client.fetch_next_page(&params);
        page_one.assert_hits_async(1).await;
        page_two.assert_hits_async(1).await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn mutation_reloads_every_feed_page_and_stats() {
        let server = MockServer::start_async().await;
        let page_one = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/tokens").query_param("page", "1");
                then.status(200).json_body(json!({
                    "success": true,
                    "data": [token_json("t1", "Bitcoin", "BTC"), token_json("t2", "Ether", "ETH")],
                    "meta": {"total": 3, "page": 1, "limit": 2, "total_pages": 2}
                }));
            })
            .await;
        let page_two = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/tokens").query_param("page", "2");
                then.status(200).delay(Duration::from_millis(100)).json_body(json!({
                    "success": true,
                    "data": [token_json("t3", "Solana", "SOL")],
                    "meta": {"total": 3, "page": 2, "limit": 2, "total_pages": 2}
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(DELETE).path("/api/tokens/t9");
                then.status(200).json_body(json!({"success": true, "message": "deleted"}));
            })
            .await;

        let client = query_client(&server, Duration::from_secs(300));
        let params = TokenQueryParams {
            limit: Some(2),
            ..Default::default()
        };
        client.feed(&params);
        settle(|| client.feed(&params).loaded).await;
        client.fetch_next_page(&params);
        settle(|| client.feed(&params).tokens.len() == 3).await;

        let deleted = client.delete_token("t9".into());
        settle(|| !deleted.is_pending()).await;
        assert!(lock(&client.cache).stats.invalidated);

        // Old pages stay visible until the whole reload lands
        let reloading = client.feed(&params);
        assert!(reloading.is_fetching);
        assert_eq!(reloading.tokens.len(), 3);
        settle(|| !client.feed(&params).is_fetching).await;

        let symbols: Vec<_> = client.feed(&params).tokens.iter().map(|t| t.symbol.clone()).collect();
        assert_eq!(symbols, ["BTC", "ETH", "SOL"]);
        page_one.assert_hits_async(2).await;
        page_two.assert_hits_async(2).await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn create_rejects_taken_symbol() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/tokens/symbol/BTC");
                then.status(200).json_body(json!({
                    "success": true,
                    "message": "ok",
                    "data": token_json("t1", "Bitcoin", "BTC")
                }));
            })
            .await;
        let create = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/tokens");
                then.status(201).json_body(json!({"success": true, "data": token_json("t2", "Bitcoin", "BTC")}));
            })
            .await;

        let client = query_client(&server, Duration::from_secs(300));
        let created = client.create_token(CreateTokenDto {
            name: "Bitcoin".into(),
            symbol: "BTC".into(),
            ..Default::default()
        });
        settle(|| !created.is_pending()).await;
        assert_eq!(
            created.state(),
            MutationState::Failed("Token with symbol BTC already exists".into())
        );
        create.assert_hits_async(0).await;
    }

    #[test]
    fn unread_entries_are_evicted() {
        let start = Instant::now();
        let mut cache = Cache::default();
        let old = admin_params();
        let recent = TokenQueryParams {
            page: Some(2),
            ..admin_params()
        };
        cache.list_slot(&old).read_at = Some(start);
        cache.list_slot(&recent).read_at = Some(start + Duration::from_secs(200));
        let loading = cache.detail_slot(&"t1".to_string());
        loading.read_at = Some(start);
        loading.fetching = true;
        cache.feeds.entry(TokenQueryParams::default()).or_default().pages.read_at = Some(start);

        let dropped = cache.evict_unused(start + Duration::from_secs(300), Duration::from_secs(300));
        assert_eq!(dropped, 2);
        assert!(cache.lists.contains_key(&recent));
        assert!(!cache.lists.contains_key(&old));
        assert!(cache.details.contains_key("t1"));
        assert!(cache.feeds.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn upload_can_be_cancelled() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/upload/presigned-url");
                then.status(200).delay(Duration::from_secs(5)).json_body(json!({"success": true}));
            })
            .await;

        let path = std::env::temp_dir().join(format!("token-catalog-desk-cancel-{}.png", std::process::id()));
        std::fs::write(&path, b"png").unwrap();

        let client = query_client(&server, Duration::from_secs(300));
        let cancel = CancellationToken::new();
        let upload = client.upload_logo(path.clone(), cancel.clone());
        cancel.cancel();
        settle(|| !upload.is_pending()).await;
        assert_eq!(upload.state(), MutationState::Failed("upload cancelled".into()));
        std::fs::remove_file(&path).ok();
    }
}
