//! Process-local query cache
//!
//! Entries are stored as JSON values keyed by [`QueryKey`], each with the
//! time it was last filled, an invalidated flag and a count of how often it
//! has been invalidated. At most one fetch per key is in flight; concurrent
//! readers share it. Locks are never held across an await.
//!
//! Entries nobody has read within the eviction window are dropped by
//! [`QueryCache::collect_garbage`].

use futures::future::{AbortHandle, Abortable, BoxFuture, FutureExt, Shared};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use txanalyzer_client::ApiResult;

use crate::error::{QueryError, QueryResult};
use crate::key::QueryKey;

/// Produces a fresh value for one key
pub type Fetcher = Arc<dyn Fn() -> BoxFuture<'static, QueryResult<Value>> + Send + Sync>;

type SharedFetch = Shared<BoxFuture<'static, QueryResult<Value>>>;

type Entries = Mutex<HashMap<QueryKey, Entry>>;

/// Default eviction window for unread entries
pub const DEFAULT_GC_TIME: Duration = Duration::from_secs(5 * 60);

/// Per-query behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// How long a filled entry counts as fresh
    pub stale_time: Duration,
    /// A disabled query never fetches
    pub enabled: bool,
    /// Refetch when the dashboard regains focus, if stale
    pub refetch_on_focus: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: Duration::ZERO,
            enabled: true,
            refetch_on_focus: true,
        }
    }
}

impl QueryOptions {
    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn refetch_on_focus(mut self, refetch_on_focus: bool) -> Self {
        self.refetch_on_focus = refetch_on_focus;
        self
    }
}

/// A typed read: key, options and how to fetch
pub struct Query<T> {
    key: QueryKey,
    options: QueryOptions,
    fetcher: Fetcher,
    _data: PhantomData<fn() -> T>,
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            options: self.options,
            fetcher: Arc::clone(&self.fetcher),
            _data: PhantomData,
        }
    }
}

impl<T> Query<T>
where
    T: Serialize + Send + 'static,
{
    pub fn new<F, Fut>(key: QueryKey, options: QueryOptions, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<T>> + Send + 'static,
    {
        let fetcher: Fetcher = Arc::new(move || {
            let request = fetch();
            async move {
                let data = request.await?;
                Ok::<_, QueryError>(serde_json::to_value(&data)?)
            }
            .boxed()
        });

        Self {
            key,
            options,
            fetcher,
            _data: PhantomData,
        }
    }
}

impl<T> Query<T> {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn options(&self) -> QueryOptions {
        self.options
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// No data yet
    Pending,
    Success,
    /// The last fetch failed
    Error,
}

/// Snapshot of one query for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<T> {
    pub data: Option<T>,
    pub status: QueryStatus,
    pub is_fetching: bool,
    pub error: Option<QueryError>,
}

impl<T> QueryState<T> {
    /// No data and a fetch is running
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Pending && self.is_fetching
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }
}

impl QueryState<Value> {
    fn decode<T: DeserializeOwned>(self) -> QueryState<T> {
        match self.data.map(serde_json::from_value::<T>).transpose() {
            Ok(data) => QueryState {
                data,
                status: self.status,
                is_fetching: self.is_fetching,
                error: self.error,
            },
            Err(e) => QueryState {
                data: None,
                status: QueryStatus::Error,
                is_fetching: self.is_fetching,
                error: Some(QueryError::from(e)),
            },
        }
    }
}

struct InFlight {
    id: u64,
    future: SharedFetch,
    abort: AbortHandle,
}

struct Entry {
    data: Option<Value>,
    error: Option<QueryError>,
    updated_at: Option<Instant>,
    invalidated: bool,
    invalidation_count: u32,
    options: QueryOptions,
    fetcher: Option<Fetcher>,
    in_flight: Option<InFlight>,
    last_used: Instant,
}

impl Entry {
    fn new(options: QueryOptions) -> Self {
        Self {
            data: None,
            error: None,
            updated_at: None,
            invalidated: false,
            invalidation_count: 0,
            options,
            fetcher: None,
            in_flight: None,
            last_used: Instant::now(),
        }
    }

    fn register(&mut self, options: QueryOptions, fetcher: &Fetcher) {
        self.options = options;
        self.fetcher = Some(Arc::clone(fetcher));
        self.last_used = Instant::now();
    }

    /// A render only fetches what it cannot show: nothing cached yet, or
    /// an entry someone invalidated. Failures wait for a reset.
    fn needs_fetch_on_observe(&self) -> bool {
        self.in_flight.is_none() && (self.invalidated || (self.data.is_none() && self.error.is_none()))
    }

    fn is_stale(&self, now: Instant) -> bool {
        if self.invalidated || self.data.is_none() {
            return true;
        }
        match self.updated_at {
            Some(at) => now.saturating_duration_since(at) >= self.options.stale_time,
            None => true,
        }
    }

    fn fill(&mut self, data: Value) {
        let now = Instant::now();
        self.data = Some(data);
        self.error = None;
        self.updated_at = Some(now);
        self.last_used = now;
        self.invalidated = false;
    }

    fn state(&self) -> QueryState<Value> {
        let status = if self.error.is_some() {
            QueryStatus::Error
        } else if self.data.is_some() {
            QueryStatus::Success
        } else {
            QueryStatus::Pending
        };
        QueryState {
            data: self.data.clone(),
            status,
            is_fetching: self.in_flight.is_some(),
            error: self.error.clone(),
        }
    }
}

enum Lookup {
    Cached(Value),
    Pending(SharedFetch),
}

fn lock(entries: &Entries) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
    entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Store the outcome of fetch `id`, unless it was cancelled or superseded
fn settle(entries: &Entries, key: &QueryKey, id: u64, result: &QueryResult<Value>) {
    let mut entries = lock(entries);
    let Some(entry) = entries.get_mut(key) else {
        return;
    };
    if entry.in_flight.as_ref().map(|f| f.id) != Some(id) {
        log::debug!(target: "txanalyzer::query", "discarding superseded fetch for {}", key);
        return;
    }
    entry.in_flight = None;

    match result {
        Ok(data) => {
            log::debug!(target: "txanalyzer::query", "filled {}", key);
            entry.fill(data.clone());
        }
        Err(QueryError::Cancelled) => {}
        Err(error) => {
            log::debug!(target: "txanalyzer::query", "fetch for {} failed: {}", key, error);
            entry.error = Some(error.clone());
        }
    }
}

pub struct QueryCache {
    entries: Arc<Entries>,
    next_fetch_id: AtomicU64,
    gc_time: Duration,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::with_gc_time(DEFAULT_GC_TIME)
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gc_time(gc_time: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            next_fetch_id: AtomicU64::new(0),
            gc_time,
        }
    }

    pub fn gc_time(&self) -> Duration {
        self.gc_time
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
        lock(&self.entries)
    }

    /// Fresh cached data, or the result of a (possibly shared) fetch
    pub async fn fetch<T: DeserializeOwned>(&self, query: &Query<T>) -> QueryResult<T> {
        if !query.options.enabled {
            log::debug!(target: "txanalyzer::query", "{} is disabled", query.key);
            return Err(QueryError::Disabled);
        }

        let value = match self.lookup(&query.key, query.options, &query.fetcher) {
            Lookup::Cached(value) => value,
            Lookup::Pending(future) => future.await?,
        };
        Ok(serde_json::from_value(value)?)
    }

    fn lookup(&self, key: &QueryKey, options: QueryOptions, fetcher: &Fetcher) -> Lookup {
        let mut entries = self.entries();
        let entry = entries
            .entry(key.clone())
            .or_insert_with(|| Entry::new(options));
        entry.register(options, fetcher);

        if !entry.is_stale(Instant::now()) {
            if let Some(data) = &entry.data {
                log::debug!(target: "txanalyzer::query", "cache hit {}", key);
                return Lookup::Cached(data.clone());
            }
        }

        if let Some(in_flight) = &entry.in_flight {
            log::debug!(target: "txanalyzer::query", "joining in-flight fetch for {}", key);
            return Lookup::Pending(in_flight.future.clone());
        }

        log::debug!(target: "txanalyzer::query", "cache miss {}", key);
        Lookup::Pending(self.start(key, entry, fetcher))
    }

    fn start(&self, key: &QueryKey, entry: &mut Entry, fetcher: &Fetcher) -> SharedFetch {
        let id = self.next_fetch_id.fetch_add(1, Ordering::Relaxed);
        let (abort, registration) = AbortHandle::new_pair();
        let request = Abortable::new(fetcher(), registration);
        let entries = Arc::clone(&self.entries);
        let settle_key = key.clone();

        let future = async move {
            let result = match request.await {
                Ok(result) => result,
                Err(_aborted) => Err(QueryError::Cancelled),
            };
            settle(&entries, &settle_key, id, &result);
            result
        }
        .boxed()
        .shared();

        entry.in_flight = Some(InFlight {
            id,
            future: future.clone(),
            abort,
        });
        future
    }

    /// Current state of a query; starts a background fetch when nothing is
    /// cached yet or the entry was invalidated, and none is running
    ///
    /// Cached data past its stale time is still served as is: repeated
    /// renders do not refetch it. [`QueryCache::refetch_stale`] and
    /// [`QueryCache::on_focus`] do. An entry whose last fetch failed is not
    /// retried here until it is invalidated or reset with
    /// [`QueryCache::reset_failed`]. A disabled query leaves no entry
    /// behind. Must be called from within a tokio runtime.
    pub fn observe<T: DeserializeOwned>(&self, query: &Query<T>) -> QueryState<T> {
        if !query.options.enabled {
            let entries = self.entries();
            let state = entries.get(&query.key).map(Entry::state).unwrap_or(QueryState {
                data: None,
                status: QueryStatus::Pending,
                is_fetching: false,
                error: None,
            });
            drop(entries);
            return state.decode();
        }

        let (state, started) = {
            let mut entries = self.entries();
            let entry = entries
                .entry(query.key.clone())
                .or_insert_with(|| Entry::new(query.options));
            entry.register(query.options, &query.fetcher);

            let started = if entry.needs_fetch_on_observe() {
                log::debug!(target: "txanalyzer::query", "background fetch for {}", query.key);
                Some(self.start(&query.key, entry, &query.fetcher))
            } else {
                None
            };
            (entry.state(), started)
        };

        if let Some(future) = started {
            tokio::spawn(future);
        }
        state.decode()
    }

    /// Refetch every enabled, stale entry that opted into focus refetching
    pub fn on_focus(&self) -> usize {
        self.refetch_where("focus", |_, entry| entry.options.refetch_on_focus)
    }

    /// Refetch enabled, stale entries under `prefix`, as a page load does
    ///
    /// Failed entries are skipped; reset them first to retry.
    pub fn refetch_stale(&self, prefix: &QueryKey) -> usize {
        self.refetch_where("reload", |key, entry| key.starts_with(prefix) && entry.error.is_none())
    }

    fn refetch_where(&self, reason: &str, eligible: impl Fn(&QueryKey, &Entry) -> bool) -> usize {
        let now = Instant::now();
        let started: Vec<SharedFetch> = {
            let mut entries = self.entries();
            let mut started = Vec::new();
            for (key, entry) in entries.iter_mut() {
                if !entry.options.enabled
                    || entry.in_flight.is_some()
                    || !entry.is_stale(now)
                    || !eligible(key, entry)
                {
                    continue;
                }
                let Some(fetcher) = entry.fetcher.clone() else {
                    continue;
                };
                log::debug!(target: "txanalyzer::query", "{} refetch for {}", reason, key);
                entry.last_used = now;
                started.push(self.start(key, entry, &fetcher));
            }
            started
        };

        let count = started.len();
        for future in started {
            tokio::spawn(future);
        }
        count
    }

    /// Drop entries nobody has read within the eviction window; returns
    /// how many were dropped. Entries with a fetch running are kept.
    pub fn collect_garbage(&self) -> usize {
        let now = Instant::now();
        let gc_time = self.gc_time;
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|key, entry| {
            let keep = entry.in_flight.is_some() || now.saturating_duration_since(entry.last_used) < gc_time;
            if !keep {
                log::debug!(target: "txanalyzer::query", "evicted {}", key);
            }
            keep
        });
        before - entries.len()
    }

    /// Run [`QueryCache::collect_garbage`] once per eviction window until
    /// the cache is dropped
    pub fn spawn_garbage_collector(cache: &Arc<QueryCache>) -> JoinHandle<()> {
        let period = cache.gc_time;
        let cache = Arc::downgrade(cache);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                let evicted = cache.collect_garbage();
                if evicted > 0 {
                    log::debug!(target: "txanalyzer::query", "evicted {} idle entries", evicted);
                }
            }
        })
    }

    /// Mark every entry under `prefix` stale; returns how many became stale
    ///
    /// Entries already stale are left alone, so their invalidation count
    /// only moves once per fill. Running fetches are detached and their
    /// results discarded.
    pub fn invalidate_queries(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.entries();
        let mut newly = 0;
        for (key, entry) in entries.iter_mut().filter(|(key, _)| key.starts_with(prefix)) {
            entry.in_flight = None;
            if !entry.invalidated {
                entry.invalidated = true;
                entry.invalidation_count += 1;
                newly += 1;
                log::debug!(target: "txanalyzer::query", "invalidated {}", key);
            }
        }
        newly
    }

    /// Abort running fetches under `prefix`; returns how many were aborted
    pub fn cancel_queries(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.entries();
        let mut cancelled = 0;
        for (key, entry) in entries.iter_mut().filter(|(key, _)| key.starts_with(prefix)) {
            if let Some(in_flight) = entry.in_flight.take() {
                in_flight.abort.abort();
                cancelled += 1;
                log::debug!(target: "txanalyzer::query", "cancelled fetch for {}", key);
            }
        }
        cancelled
    }

    /// Forget failures under `prefix` so the next observe retries
    pub fn reset_failed(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.entries();
        let mut reset = 0;
        for (_, entry) in entries.iter_mut().filter(|(key, _)| key.starts_with(prefix)) {
            if entry.error.take().is_some() {
                reset += 1;
            }
        }
        reset
    }

    pub fn get_query_data<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let data = self.entries().get(key).and_then(|entry| entry.data.clone())?;
        serde_json::from_value(data).ok()
    }

    pub fn set_query_data<T: Serialize>(&self, key: &QueryKey, data: &T) -> QueryResult<()> {
        let value = serde_json::to_value(data)?;
        self.entries()
            .entry(key.clone())
            .or_insert_with(|| Entry::new(QueryOptions::default()))
            .fill(value);
        Ok(())
    }

    /// Cached values under `prefix`, for rollback
    pub fn snapshot(&self, prefix: &QueryKey) -> Vec<(QueryKey, Value)> {
        self.entries()
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .filter_map(|(key, entry)| entry.data.clone().map(|data| (key.clone(), data)))
            .collect()
    }

    pub fn restore(&self, snapshot: Vec<(QueryKey, Value)>) {
        let mut entries = self.entries();
        for (key, data) in snapshot {
            log::debug!(target: "txanalyzer::query", "restored {}", key);
            entries
                .entry(key)
                .or_insert_with(|| Entry::new(QueryOptions::default()))
                .fill(data);
        }
    }

    pub fn invalidation_count(&self, key: &QueryKey) -> u32 {
        self.entries().get(key).map_or(0, |entry| entry.invalidation_count)
    }

    pub fn is_invalidated(&self, key: &QueryKey) -> bool {
        self.entries().get(key).map_or(false, |entry| entry.invalidated)
    }

    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.entries().get(key).map_or(false, |entry| entry.in_flight.is_some())
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}
