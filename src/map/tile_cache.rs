// src/map/tile_cache.rs
//! Bounded tile resource cache with capped concurrent fetching and LRU eviction

use super::{
    address::TileAddress,
    source::{RawTile, TileSource},
    upload::TileUploader,
};
use crate::error::{MapError, Result};
use futures::FutureExt;
use std::collections::{HashMap, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Load state of one cache entry. Only `Ready` owns a resource.
#[derive(Debug)]
pub enum TileState<H> {
    Queued,
    /// A fetch is in flight; `ticket` identifies it
    Loading { ticket: u64 },
    Ready(H),
    /// The fetch failed. Not retried until the entry is evicted.
    Error(String),
}

impl<H> TileState<H> {
    pub fn handle(&self) -> Option<&H> {
        match self {
            TileState::Ready(handle) => Some(handle),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TileState::Queued => "queued",
            TileState::Loading { .. } => "loading",
            TileState::Ready(_) => "ready",
            TileState::Error(_) => "error",
        }
    }
}

#[derive(Debug)]
pub struct CacheEntry<H> {
    state: TileState<H>,
    last_used_frame: u64,
}

impl<H> CacheEntry<H> {
    pub fn state(&self) -> &TileState<H> {
        &self.state
    }

    pub fn last_used_frame(&self) -> u64 {
        self.last_used_frame
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub resident: usize,
    pub queued: usize,
    pub loading: usize,
    pub ready: usize,
    pub errored: usize,
    pub in_flight: usize,
    pub queue_len: usize,
    pub evicted_last_frame: usize,
    pub evicted_total: u64,
    pub fetches_started: u64,
    pub fetch_failures: u64,
    pub stale_completions: u64,
}

struct Completion {
    address: TileAddress,
    ticket: u64,
    result: Result<RawTile>,
}

/// Keeps tile resources in step with the visible tile set.
///
/// All state is mutated on the owning thread. Fetches run as Tokio tasks and
/// hand their results back over a channel; they are applied by
/// [`TileCache::reconcile`], [`TileCache::process_completions`] or
/// [`TileCache::wait_for_completion`].
pub struct TileCache<U: TileUploader> {
    source: Arc<dyn TileSource>,
    uploader: U,
    entries: HashMap<TileAddress, CacheEntry<U::Handle>>,
    queue: VecDeque<TileAddress>,
    in_flight: usize,
    max_parallel: usize,
    max_cache: usize,
    next_ticket: u64,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    evicted_last_frame: usize,
    evicted_total: u64,
    fetches_started: u64,
    fetch_failures: u64,
    stale_completions: u64,
}

impl<U: TileUploader> TileCache<U> {
    pub fn new(source: Arc<dyn TileSource>, uploader: U, max_parallel: usize, max_cache: usize) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            source,
            uploader,
            entries: HashMap::new(),
            queue: VecDeque::new(),
            in_flight: 0,
            max_parallel: max_parallel.max(1),
            max_cache,
            next_ticket: 0,
            completions_tx,
            completions_rx,
            evicted_last_frame: 0,
            evicted_total: 0,
            fetches_started: 0,
            fetch_failures: 0,
            stale_completions: 0,
        }
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    /// Raising the limit starts queued fetches right away.
    pub fn set_max_parallel(&mut self, max_parallel: usize) {
        self.max_parallel = max_parallel.max(1);
        self.drain_queue();
    }

    pub fn max_cache(&self) -> usize {
        self.max_cache
    }

    /// Takes effect at the next [`TileCache::reconcile`].
    pub fn set_max_cache(&mut self, max_cache: usize) {
        self.max_cache = max_cache;
    }

    /// Bring the cache in line with this frame's visible tiles.
    ///
    /// Known addresses are touched, new ones are queued, queued fetches are
    /// started up to the concurrency limit, and least-recently-used entries
    /// are evicted down to capacity. Entries seen in `frame_id` are never
    /// evicted, so the cache may stay over capacity while they are on screen.
    ///
    /// # Panics
    ///
    /// Starting a fetch spawns a Tokio task, so this must run inside a Tokio
    /// runtime.
    pub fn reconcile(&mut self, visible: &[TileAddress], frame_id: u64) {
        self.process_completions();

        for address in visible {
            if let Some(entry) = self.entries.get_mut(address) {
                entry.last_used_frame = frame_id;
                continue;
            }
            self.entries.insert(
                *address,
                CacheEntry {
                    state: TileState::Queued,
                    last_used_frame: frame_id,
                },
            );
            self.queue.push_back(*address);
        }

        self.drain_queue();
        self.evict(frame_id);
    }

    /// Apply every fetch result that has arrived, without waiting.
    pub fn process_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.apply_completion(completion);
            applied += 1;
        }
        applied
    }

    /// Wait for the next fetch to finish and apply it. Returns `false` at once
    /// when nothing is in flight.
    pub async fn wait_for_completion(&mut self) -> bool {
        if self.in_flight == 0 {
            return false;
        }
        match self.completions_rx.recv().await {
            Some(completion) => {
                self.apply_completion(completion);
                true
            }
            None => false,
        }
    }

    fn drain_queue(&mut self) {
        while self.in_flight < self.max_parallel {
            let Some(address) = self.queue.pop_front() else {
                break;
            };

            // evicted or re-requested since it was queued
            let Some(entry) = self.entries.get_mut(&address) else {
                continue;
            };
            if !matches!(entry.state, TileState::Queued) {
                continue;
            }

            self.next_ticket += 1;
            let ticket = self.next_ticket;
            entry.state = TileState::Loading { ticket };
            self.in_flight += 1;
            self.fetches_started += 1;
            debug!("Fetching tile {} (ticket {})", address, ticket);

            // a panicking fetch must still report back, or its slot is lost
            let fetch = AssertUnwindSafe(self.source.fetch(address)).catch_unwind();
            let completions = self.completions_tx.clone();
            tokio::spawn(async move {
                let result = fetch
                    .await
                    .unwrap_or_else(|_| Err(MapError::Fetch(format!("fetch of {} panicked", address))));
                // the cache may have been dropped; nothing was uploaded yet
                let _ = completions.send(Completion {
                    address,
                    ticket,
                    result,
                });
            });
        }
    }

    fn apply_completion(&mut self, completion: Completion) {
        let Completion {
            address,
            ticket,
            result,
        } = completion;
        self.in_flight = self.in_flight.saturating_sub(1);

        let live = self
            .entries
            .get_mut(&address)
            .filter(|entry| matches!(entry.state, TileState::Loading { ticket: t } if t == ticket));

        match (live, result) {
            (Some(entry), Ok(tile)) => {
                entry.state = TileState::Ready(self.uploader.upload(tile));
                debug!("Tile {} ready", address);
            }
            (Some(entry), Err(e)) => {
                warn!("Tile load error for {}: {}", address, e);
                entry.state = TileState::Error(e.to_string());
                self.fetch_failures += 1;
            }
            (None, Ok(tile)) => {
                let handle = self.uploader.upload(tile);
                self.uploader.release(handle);
                self.stale_completions += 1;
                debug!("Discarded stale tile {} (ticket {})", address, ticket);
            }
            (None, Err(e)) => {
                self.stale_completions += 1;
                debug!("Stale fetch for {} failed: {}", address, e);
            }
        }

        self.drain_queue();
    }

    fn evict(&mut self, frame_id: u64) {
        self.evicted_last_frame = 0;
        if self.entries.len() <= self.max_cache {
            return;
        }

        let mut by_age: Vec<(u64, TileAddress)> = self
            .entries
            .iter()
            .map(|(address, entry)| (entry.last_used_frame, *address))
            .collect();
        by_age.sort_unstable();

        let excess = self.entries.len() - self.max_cache;
        for (last_used, address) in by_age.into_iter().take(excess) {
            if last_used == frame_id {
                continue;
            }
            if let Some(entry) = self.entries.remove(&address) {
                if let TileState::Ready(handle) = entry.state {
                    self.uploader.release(handle);
                }
                self.evicted_last_frame += 1;
            }
        }

        self.evicted_total += self.evicted_last_frame as u64;
        if self.evicted_last_frame > 0 {
            debug!(
                "Evicted {} tiles, {} resident (capacity {})",
                self.evicted_last_frame,
                self.entries.len(),
                self.max_cache
            );
        }
    }

    /// Release every resource and forget all entries. Fetches still in
    /// flight are discarded when they finish.
    pub fn clear(&mut self) {
        for (_, entry) in self.entries.drain() {
            if let TileState::Ready(handle) = entry.state {
                self.uploader.release(handle);
            }
        }
        self.queue.clear();
    }

    pub fn get(&self, address: &TileAddress) -> Option<&CacheEntry<U::Handle>> {
        self.entries.get(address)
    }

    pub fn state(&self, address: &TileAddress) -> Option<&TileState<U::Handle>> {
        self.entries.get(address).map(|entry| &entry.state)
    }

    /// Resource to draw for `address`, if it is loaded
    pub fn handle(&self, address: &TileAddress) -> Option<&U::Handle> {
        self.state(address).and_then(TileState::handle)
    }

    pub fn contains(&self, address: &TileAddress) -> bool {
        self.entries.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn uploader(&self) -> &U {
        &self.uploader
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            resident: self.entries.len(),
            in_flight: self.in_flight,
            queue_len: self.queue.len(),
            evicted_last_frame: self.evicted_last_frame,
            evicted_total: self.evicted_total,
            fetches_started: self.fetches_started,
            fetch_failures: self.fetch_failures,
            stale_completions: self.stale_completions,
            ..Default::default()
        };
        for entry in self.entries.values() {
            match entry.state {
                TileState::Queued => stats.queued += 1,
                TileState::Loading { .. } => stats.loading += 1,
                TileState::Ready(_) => stats.ready += 1,
                TileState::Error(_) => stats.errored += 1,
            }
        }
        stats
    }
}

impl<U: TileUploader> Drop for TileCache<U> {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{source::FetchFuture, upload::TexturePool};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::oneshot;

    /// Source whose fetches resolve only when the test says so
    #[derive(Clone, Default)]
    struct ManualSource {
        inner: Arc<Mutex<ManualState>>,
    }

    #[derive(Default)]
    struct ManualState {
        calls: Vec<TileAddress>,
        pending: HashMap<TileAddress, VecDeque<oneshot::Sender<Result<RawTile>>>>,
    }

    impl ManualSource {
        fn calls(&self) -> Vec<TileAddress> {
            self.inner.lock().unwrap().calls.clone()
        }

        fn calls_for(&self, address: TileAddress) -> usize {
            self.calls().iter().filter(|a| **a == address).count()
        }

        /// Resolve the oldest outstanding fetch of `address`
        fn resolve(&self, address: TileAddress, result: Result<RawTile>) {
            let sender = self
                .inner
                .lock()
                .unwrap()
                .pending
                .get_mut(&address)
                .and_then(VecDeque::pop_front)
                .expect("no outstanding fetch for address");
            let _ = sender.send(result);
        }
    }

    impl TileSource for ManualSource {
        fn fetch(&self, address: TileAddress) -> FetchFuture {
            let (tx, rx) = oneshot::channel();
            {
                let mut state = self.inner.lock().unwrap();
                state.calls.push(address);
                state.pending.entry(address).or_default().push_back(tx);
            }
            async move {
                rx.await
                    .unwrap_or_else(|_| Err(MapError::Fetch("request abandoned".to_string())))
            }
            .boxed()
        }
    }

    /// Source whose column-0 fetches panic mid-flight
    struct FaultySource;

    impl TileSource for FaultySource {
        fn fetch(&self, address: TileAddress) -> FetchFuture {
            async move {
                assert_ne!(address.x, 0, "decoder failure for {}", address);
                Ok(tile())
            }
            .boxed()
        }
    }

    fn tile() -> RawTile {
        RawTile {
            width: 2,
            height: 2,
            pixels: vec![7; 16],
        }
    }

    fn addr(x: u32) -> TileAddress {
        TileAddress::new(4, 0, x, 0)
    }

    fn new_cache(source: &ManualSource, max_parallel: usize, max_cache: usize) -> TileCache<TexturePool> {
        TileCache::new(Arc::new(source.clone()), TexturePool::new(), max_parallel, max_cache)
    }

    #[tokio::test]
    async fn test_new_tiles_queue_behind_concurrency_cap() {
        let source = ManualSource::default();
        let mut cache = new_cache(&source, 2, 100);

        cache.reconcile(&[addr(0), addr(1), addr(2)], 1);

        assert_eq!(source.calls(), vec![addr(0), addr(1)]);
        assert_eq!(cache.in_flight(), 2);
        assert_eq!(cache.queue_len(), 1);
        assert_eq!(cache.state(&addr(0)).map(TileState::label), Some("loading"));
        assert_eq!(cache.state(&addr(2)).map(TileState::label), Some("queued"));
        assert_eq!(cache.get(&addr(2)).map(CacheEntry::last_used_frame), Some(1));
    }

    #[tokio::test]
    async fn test_completion_frees_slot_for_next_fetch() {
        let source = ManualSource::default();
        let mut cache = new_cache(&source, 2, 100);
        cache.reconcile(&[addr(0), addr(1), addr(2)], 1);

        source.resolve(addr(0), Ok(tile()));
        assert!(cache.wait_for_completion().await);

        assert!(cache.handle(&addr(0)).is_some());
        assert_eq!(cache.state(&addr(2)).map(TileState::label), Some("loading"));
        assert_eq!(source.calls().len(), 3);
        assert_eq!(cache.in_flight(), 2);
        assert_eq!(cache.queue_len(), 0);
        assert_eq!(cache.uploader().live_textures(), 1);
    }

    #[tokio::test]
    async fn test_no_duplicate_in_flight_fetch() {
        let source = ManualSource::default();
        let mut cache = new_cache(&source, 4, 100);

        cache.reconcile(&[addr(0)], 1);
        cache.reconcile(&[addr(0)], 2);
        cache.reconcile(&[addr(0), addr(0)], 3);

        assert_eq!(source.calls_for(addr(0)), 1);
        assert_eq!(cache.get(&addr(0)).map(CacheEntry::last_used_frame), Some(3));
    }

    #[tokio::test]
    async fn test_world_copies_are_fetched_separately() {
        let source = ManualSource::default();
        let mut cache = new_cache(&source, 4, 100);
        let primary = TileAddress::new(1, 0, 1, 0);
        let copy = TileAddress::new(1, 1, 1, 0);

        cache.reconcile(&[primary, copy], 1);

        assert_eq!(cache.len(), 2);
        assert_eq!(source.calls(), vec![primary, copy]);
    }

    #[tokio::test]
    async fn test_failure_marks_error_without_retry() {
        let source = ManualSource::default();
        let mut cache = new_cache(&source, 4, 100);
        cache.reconcile(&[addr(0)], 1);

        source.resolve(addr(0), Err(MapError::Fetch("HTTP 500".to_string())));
        assert!(cache.wait_for_completion().await);

        match cache.state(&addr(0)) {
            Some(TileState::Error(msg)) => assert!(msg.contains("HTTP 500")),
            other => panic!("expected error state, got {:?}", other.map(TileState::label)),
        }
        assert!(cache.handle(&addr(0)).is_none());

        cache.reconcile(&[addr(0)], 2);
        assert_eq!(source.calls_for(addr(0)), 1);
        assert_eq!(cache.stats().fetch_failures, 1);
        assert_eq!(cache.stats().errored, 1);
    }

    #[tokio::test]
    async fn test_panicking_fetch_frees_its_slot() {
        let mut cache = TileCache::new(Arc::new(FaultySource), TexturePool::new(), 1, 100);
        cache.reconcile(&[addr(0), addr(1)], 1);
        assert_eq!(cache.queue_len(), 1);

        let finished = tokio::time::timeout(Duration::from_secs(5), cache.wait_for_completion())
            .await
            .expect("panicked fetch never reported back");
        assert!(finished);
        match cache.state(&addr(0)) {
            Some(TileState::Error(msg)) => assert!(msg.contains("panicked")),
            other => panic!("expected error state, got {:?}", other.map(TileState::label)),
        }

        // the freed slot goes to the queued tile
        assert_eq!(cache.state(&addr(1)).map(TileState::label), Some("loading"));
        let finished = tokio::time::timeout(Duration::from_secs(5), cache.wait_for_completion())
            .await
            .expect("second fetch never reported back");
        assert!(finished);
        assert!(cache.handle(&addr(1)).is_some());
        assert_eq!(cache.in_flight(), 0);
        assert_eq!(cache.stats().fetch_failures, 1);
    }

    #[tokio::test]
    async fn test_lowered_capacity_applies_at_next_reconcile() {
        let source = ManualSource::default();
        let mut cache = new_cache(&source, 8, 10);
        for frame in 1..=5u64 {
            cache.reconcile(&[addr(frame as u32 - 1)], frame);
        }

        cache.set_max_cache(2);
        assert_eq!(cache.max_cache(), 2);
        assert_eq!(cache.len(), 5);

        cache.reconcile(&[addr(5)], 6);
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&addr(4)));
        assert!(cache.contains(&addr(5)));
        assert_eq!(cache.stats().evicted_last_frame, 4);
    }

    #[tokio::test]
    async fn test_current_frame_is_never_evicted() {
        let source = ManualSource::default();
        let mut cache = new_cache(&source, 8, 2);

        let visible: Vec<_> = (0..5).map(addr).collect();
        cache.reconcile(&visible, 7);

        assert_eq!(cache.len(), 5);
        assert_eq!(cache.stats().evicted_last_frame, 0);
        assert!(visible.iter().all(|a| cache.contains(a)));
    }

    #[tokio::test]
    async fn test_lru_evicts_oldest_frame() {
        let source = ManualSource::default();
        let mut cache = new_cache(&source, 8, 3);

        for frame in 1..=4u64 {
            cache.reconcile(&[addr(frame as u32)], frame);
        }
        assert_eq!(cache.len(), 3);
        assert!(!cache.contains(&addr(1)));
        assert!((2..=4).all(|x| cache.contains(&addr(x))));

        cache.reconcile(&[addr(5)], 5);
        assert!(!cache.contains(&addr(2)));
        assert_eq!(cache.stats().evicted_total, 2);
    }

    #[tokio::test]
    async fn test_touching_an_entry_protects_it() {
        let source = ManualSource::default();
        let mut cache = new_cache(&source, 8, 2);

        cache.reconcile(&[addr(1)], 1);
        cache.reconcile(&[addr(2)], 2);
        // addr(1) is seen again, so addr(2) becomes the oldest
        cache.reconcile(&[addr(1), addr(3)], 3);

        assert!(cache.contains(&addr(1)));
        assert!(!cache.contains(&addr(2)));
        assert!(cache.contains(&addr(3)));
    }

    #[tokio::test]
    async fn test_evicting_ready_tile_releases_resource() {
        let source = ManualSource::default();
        let mut cache = new_cache(&source, 4, 1);
        cache.reconcile(&[addr(0)], 1);
        source.resolve(addr(0), Ok(tile()));
        assert!(cache.wait_for_completion().await);
        assert_eq!(cache.uploader().live_textures(), 1);

        cache.reconcile(&[addr(1)], 2);

        assert!(!cache.contains(&addr(0)));
        assert_eq!(cache.uploader().release_count(), 1);
        assert_eq!(cache.uploader().live_textures(), 0);
    }

    #[tokio::test]
    async fn test_stale_completion_is_released_not_resurrected() {
        let source = ManualSource::default();
        let mut cache = new_cache(&source, 4, 1);

        cache.reconcile(&[addr(0)], 1);
        cache.reconcile(&[addr(1)], 2);
        assert!(!cache.contains(&addr(0)));
        assert_eq!(cache.in_flight(), 2);

        source.resolve(addr(0), Ok(tile()));
        assert!(cache.wait_for_completion().await);

        assert!(!cache.contains(&addr(0)));
        assert_eq!(cache.uploader().upload_count(), 1);
        assert_eq!(cache.uploader().release_count(), 1);
        assert_eq!(cache.uploader().live_textures(), 0);
        assert_eq!(cache.stats().stale_completions, 1);
        assert_eq!(cache.in_flight(), 1);
    }

    #[tokio::test]
    async fn test_rerequested_tile_ignores_old_fetch() {
        let source = ManualSource::default();
        let mut cache = new_cache(&source, 4, 1);

        cache.reconcile(&[addr(0)], 1);
        cache.reconcile(&[addr(1)], 2);
        cache.reconcile(&[addr(0)], 3);
        assert_eq!(source.calls_for(addr(0)), 2);

        // the first fetch belongs to the evicted entry
        source.resolve(addr(0), Ok(tile()));
        assert!(cache.wait_for_completion().await);
        assert_eq!(cache.state(&addr(0)).map(TileState::label), Some("loading"));

        source.resolve(addr(0), Ok(tile()));
        assert!(cache.wait_for_completion().await);
        assert!(cache.handle(&addr(0)).is_some());
        assert_eq!(cache.uploader().live_textures(), 1);
    }

    #[tokio::test]
    async fn test_process_completions_does_not_block() {
        let source = ManualSource::default();
        let mut cache = new_cache(&source, 4, 100);
        cache.reconcile(&[addr(0)], 1);
        assert_eq!(cache.process_completions(), 0);

        source.resolve(addr(0), Ok(tile()));
        let mut applied = 0;
        for _ in 0..50 {
            tokio::task::yield_now().await;
            applied = cache.process_completions();
            if applied > 0 {
                break;
            }
        }
        assert_eq!(applied, 1);
        assert!(cache.handle(&addr(0)).is_some());
    }

    #[tokio::test]
    async fn test_wait_returns_when_idle() {
        let source = ManualSource::default();
        let mut cache = new_cache(&source, 4, 100);
        assert!(!cache.wait_for_completion().await);
    }

    #[tokio::test]
    async fn test_raising_parallel_limit_starts_queued() {
        let source = ManualSource::default();
        let mut cache = new_cache(&source, 1, 100);
        cache.reconcile(&[addr(0), addr(1), addr(2)], 1);
        assert_eq!(source.calls().len(), 1);

        cache.set_max_parallel(3);
        assert_eq!(source.calls().len(), 3);
        assert_eq!(cache.queue_len(), 0);
    }

    #[tokio::test]
    async fn test_evicted_queued_tile_is_never_fetched() {
        let source = ManualSource::default();
        let mut cache = new_cache(&source, 1, 1);

        cache.reconcile(&[addr(0), addr(1)], 1);
        cache.reconcile(&[addr(2)], 2);
        assert!(!cache.contains(&addr(1)));

        source.resolve(addr(0), Ok(tile()));
        assert!(cache.wait_for_completion().await);
        assert_eq!(source.calls_for(addr(1)), 0);
        assert_eq!(source.calls_for(addr(2)), 1);
    }

    #[tokio::test]
    async fn test_clear_releases_all_resources() {
        let source = ManualSource::default();
        let mut cache = new_cache(&source, 4, 100);
        cache.reconcile(&[addr(0), addr(1)], 1);
        source.resolve(addr(0), Ok(tile()));
        assert!(cache.wait_for_completion().await);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.uploader().live_textures(), 0);

        source.resolve(addr(1), Ok(tile()));
        assert!(cache.wait_for_completion().await);
        assert!(cache.is_empty());
        assert_eq!(cache.uploader().live_textures(), 0);
    }

    #[tokio::test]
    async fn test_stats_snapshot() {
        let source = ManualSource::default();
        let mut cache = new_cache(&source, 1, 100);
        cache.reconcile(&[addr(0), addr(1)], 1);
        source.resolve(addr(0), Ok(tile()));
        assert!(cache.wait_for_completion().await);

        let stats = cache.stats();
        assert_eq!(stats.resident, 2);
        assert_eq!(stats.ready, 1);
        assert_eq!(stats.loading, 1);
        assert_eq!(stats.queued, 0);
        assert_eq!(stats.fetches_started, 2);
        assert_eq!(stats.in_flight, 1);
    }
}
