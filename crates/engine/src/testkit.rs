//! Test doubles shared by the engine tests.

use async_trait::async_trait;
use listings_core::{Article, ChangeEvent, Collection, Dispatch, Permission, SymbolInfo};
use listings_feeds::{AnnouncementFeed, ExchangeClient, FeedError, FeedResult};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::time::Instant;

/// Scripted exchange client.
///
/// Listing calls pop queued responses; once the queue is empty the last
/// successful response repeats.
#[derive(Default)]
pub struct MockExchangeClient {
    symbols: Mutex<VecDeque<FeedResult<Collection>>>,
    last_symbols: Mutex<Collection>,
    assets: Mutex<VecDeque<FeedResult<Collection>>>,
    last_assets: Mutex<Collection>,
    infos: Mutex<HashMap<String, SymbolInfo>>,
    rejected: Mutex<HashSet<String>>,
    permissions: Mutex<Vec<Permission>>,
    info_calls: Mutex<Vec<(String, Instant)>>,
    symbol_fetches: AtomicUsize,
}

impl MockExchangeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_symbols(&self, response: FeedResult<Collection>) {
        self.symbols.lock().unwrap().push_back(response);
    }

    pub fn push_assets(&self, response: FeedResult<Collection>) {
        self.assets.lock().unwrap().push_back(response);
    }

    pub fn add_symbol_info(&self, info: SymbolInfo) {
        self.infos
            .lock()
            .unwrap()
            .insert(info.symbol.to_string(), info);
    }

    /// Make `symbol_info` fail permanently for `symbol`.
    pub fn reject_symbol_info(&self, symbol: &str) {
        self.rejected.lock().unwrap().insert(symbol.to_string());
    }

    pub fn symbol_fetches(&self) -> usize {
        self.symbol_fetches.load(Ordering::SeqCst)
    }

    pub fn info_calls(&self) -> Vec<String> {
        self.info_calls
            .lock()
            .unwrap()
            .iter()
            .map(|(symbol, _)| symbol.clone())
            .collect()
    }

    /// When each `symbol_info` call happened, in call order.
    pub fn info_call_times(&self) -> Vec<Instant> {
        self.info_calls.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }

    pub fn asset_permissions(&self) -> Vec<Permission> {
        self.permissions.lock().unwrap().clone()
    }

    fn next(
        queue: &Mutex<VecDeque<FeedResult<Collection>>>,
        last: &Mutex<Collection>,
    ) -> FeedResult<Collection> {
        match queue.lock().unwrap().pop_front() {
            Some(Ok(collection)) => {
                *last.lock().unwrap() = collection.clone();
                Ok(collection)
            }
            Some(Err(e)) => Err(e),
            None => Ok(last.lock().unwrap().clone()),
        }
    }
}

#[async_trait]
impl ExchangeClient for MockExchangeClient {
    async fn list_symbols(&self) -> FeedResult<Collection> {
        self.symbol_fetches.fetch_add(1, Ordering::SeqCst);
        Self::next(&self.symbols, &self.last_symbols)
    }

    async fn list_base_assets(&self, permission: Permission) -> FeedResult<Collection> {
        self.permissions.lock().unwrap().push(permission);
        Self::next(&self.assets, &self.last_assets)
    }

    async fn symbol_info(&self, symbol: &str) -> FeedResult<SymbolInfo> {
        self.info_calls
            .lock()
            .unwrap()
            .push((symbol.to_string(), Instant::now()));
        if self.rejected.lock().unwrap().contains(symbol) {
            return Err(FeedError::Api {
                code: -1100,
                message: "Illegal characters found in parameter 'symbol'".to_string(),
            });
        }
        self.infos
            .lock()
            .unwrap()
            .get(symbol)
            .cloned()
            .ok_or_else(|| FeedError::NotFound(symbol.to_string()))
    }
}

#[derive(Default)]
pub struct MockAnnouncementFeed {
    responses: Mutex<VecDeque<FeedResult<Vec<Article>>>>,
}

impl MockAnnouncementFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: FeedResult<Vec<Article>>) {
        self.responses.lock().unwrap().push_back(response);
    }
}

#[async_trait]
impl AnnouncementFeed for MockAnnouncementFeed {
    async fn latest_articles(&self) -> FeedResult<Vec<Article>> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Dispatcher that records every event it receives.
#[derive(Default)]
pub struct RecordingDispatch {
    events: Mutex<Vec<ChangeEvent>>,
}

impl RecordingDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Dispatch for RecordingDispatch {
    fn dispatch(&self, event: ChangeEvent) {
        self.events.lock().unwrap().push(event);
    }
}
