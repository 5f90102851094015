// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The resource cache: deduplicated, prioritized, concurrency-bounded asset loading.
//!
//! Every asset is identified by its normalized [`AssetKey`]. The cache
//! guarantees that:
//! - a key is fetched at most once while a fetch for it is running, with every
//!   concurrent caller receiving the same [`AssetHandle`] or the same error;
//! - a failed key is never cached and can be requested again;
//! - preloads never run more than `max_concurrent_loads` fetches at once.

mod flight;
mod queue;

use crate::events::{LoadEvent, PreloadSummary};
use ahash::AHashMap;
use flight::{Flight, InFlight};
use queue::LoadQueue;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use terra_core::asset::{
    Asset, AssetFetcher, AssetHandle, AssetKey, AssetKind, LoadOptions, LoadRequest,
    SamplerParams, TextureSource,
};
use terra_core::{
    AssetError, CacheConfig, EventBus, QualityConsumer, QualityLevel, QualitySettings,
};
use tokio::sync::watch;
use tokio::task::JoinSet;

/// Load bookkeeping since the last clear.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadCounters {
    /// Loads the cache has accepted: queued preload entries plus direct loads
    /// that issued a fetch.
    pub submitted: usize,
    /// Loads that ended with a usable asset.
    pub loaded: usize,
    /// Loads that ended in an error.
    pub failed: usize,
}

impl LoadCounters {
    /// Loads that finished either way.
    pub fn settled(&self) -> usize {
        self.loaded + self.failed
    }

    /// Fraction of submitted loads that settled, `1.0` when nothing was submitted.
    pub fn progress(&self) -> f32 {
        if self.submitted == 0 {
            1.0
        } else {
            self.settled() as f32 / self.submitted as f32
        }
    }
}

struct CacheState {
    assets: AHashMap<AssetKey, AssetHandle>,
    in_flight: AHashMap<AssetKey, InFlight>,
    queue: LoadQueue,
    counters: LoadCounters,
    level: QualityLevel,
    generation: u64,
    next_flight_id: u64,
}

impl CacheState {
    fn remove_flight(&mut self, key: &AssetKey, id: u64) {
        if self.in_flight.get(key).is_some_and(|entry| entry.id == id) {
            self.in_flight.remove(key);
        }
    }
}

struct CacheInner {
    fetcher: Arc<dyn AssetFetcher>,
    max_concurrent_loads: usize,
    state: Mutex<CacheState>,
    drain_lock: tokio::sync::Mutex<()>,
    disposed: AtomicBool,
    events: EventBus<LoadEvent>,
}

impl CacheInner {
    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// What a caller must do to obtain an asset, decided under the state lock.
enum Step {
    Cached(AssetHandle),
    Follow(watch::Receiver<flight::FlightResult>),
    Lead { flight: Flight, generation: u64 },
}

/// A load the counters already include, settled exactly once.
///
/// Dropping it unfinished, e.g. when the task running it is aborted, counts
/// the load as failed so progress still reaches `1.0`.
struct QueuedEntry {
    cache: ResourceCache,
    key: AssetKey,
    generation: u64,
    settled: bool,
}

impl QueuedEntry {
    fn new(cache: ResourceCache, key: AssetKey, generation: u64) -> Self {
        Self {
            cache,
            key,
            generation,
            settled: false,
        }
    }

    fn finish(mut self, ok: bool) {
        self.settled = true;
        self.cache.settle(self.generation, &self.key, ok);
    }
}

impl Drop for QueuedEntry {
    fn drop(&mut self) {
        if !self.settled {
            log::debug!("Load of '{}' cancelled before it finished", self.key);
            self.cache.settle(self.generation, &self.key, false);
        }
    }
}

/// Caches loaded assets by key and schedules their loading.
///
/// The cache is a cheap handle: clones share the same state, so it can be
/// handed to spawned tasks and registered as a [`QualityConsumer`].
#[derive(Clone)]
pub struct ResourceCache {
    inner: Arc<CacheInner>,
}

impl ResourceCache {
    /// Creates an empty cache loading through `fetcher`.
    pub fn new(fetcher: Arc<dyn AssetFetcher>, config: &CacheConfig) -> Self {
        Self::with_level(fetcher, config, QualityLevel::default())
    }

    /// Creates an empty cache whose loads start at `level`.
    pub fn with_level(
        fetcher: Arc<dyn AssetFetcher>,
        config: &CacheConfig,
        level: QualityLevel,
    ) -> Self {
        let max_concurrent_loads = config.effective_max_concurrent_loads();
        log::debug!(
            "Resource cache created (max {} concurrent loads, quality {})",
            max_concurrent_loads,
            level
        );
        Self {
            inner: Arc::new(CacheInner {
                fetcher,
                max_concurrent_loads,
                state: Mutex::new(CacheState {
                    assets: AHashMap::new(),
                    in_flight: AHashMap::new(),
                    queue: LoadQueue::new(),
                    counters: LoadCounters::default(),
                    level,
                    generation: 0,
                    next_flight_id: 0,
                }),
                drain_lock: tokio::sync::Mutex::new(()),
                disposed: AtomicBool::new(false),
                events: EventBus::new(),
            }),
        }
    }

    /// Loads an asset, or returns the cached handle without fetching.
    ///
    /// Concurrent calls for the same uncached key share one fetch and resolve
    /// to the same handle or the same error. A failure is not cached.
    pub async fn load_asset(
        &self,
        url: impl Into<AssetKey>,
        kind: AssetKind,
        options: LoadOptions,
    ) -> Result<AssetHandle, AssetError> {
        let request = LoadRequest::new(url, kind).with_options(options);
        self.resolve(&request, false).await
    }

    /// Loads a single 2D texture.
    pub async fn load_texture(
        &self,
        url: impl Into<AssetKey>,
        options: LoadOptions,
    ) -> Result<AssetHandle, AssetError> {
        self.load_asset(url, AssetKind::Texture, options).await
    }

    /// Loads a cube texture from its face URLs, keyed by the joined face list.
    pub async fn load_cube_texture<S: AsRef<str>>(
        &self,
        faces: &[S],
        options: LoadOptions,
    ) -> Result<AssetHandle, AssetError> {
        self.load_asset(AssetKey::cube(faces), AssetKind::CubeTexture, options)
            .await
    }

    /// Loads a named set of textures concurrently and returns them by name.
    ///
    /// Every entry is counted toward [`progress`](Self::progress) up front and
    /// settles on its own, so progress advances per texture. All entries run
    /// at once, outside the preload queue and its concurrency bound. The call
    /// waits for every entry; if any failed, the first failure is returned and
    /// the textures that did load stay cached.
    pub async fn load_textures<N: Into<String>>(
        &self,
        textures: impl IntoIterator<Item = (N, TextureSource)>,
        options: LoadOptions,
    ) -> Result<AHashMap<String, AssetHandle>, AssetError> {
        if self.is_disposed() {
            return Err(AssetError::Disposed);
        }
        let entries: Vec<(String, LoadRequest)> = textures
            .into_iter()
            .map(|(name, source)| (name.into(), source.into_request(options)))
            .collect();
        let generation = {
            let mut state = self.inner.lock_state();
            state.counters.submitted += entries.len();
            state.generation
        };
        log::debug!("Loading a set of {} texture(s)", entries.len());

        let mut tasks = JoinSet::new();
        for (name, request) in entries {
            let entry = QueuedEntry::new(self.clone(), request.key.clone(), generation);
            tasks.spawn(async move {
                let result = entry.cache.resolve(&request, true).await;
                entry.finish(result.is_ok());
                (name, result)
            });
        }

        let mut loaded = AHashMap::new();
        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((name, Ok(handle))) => {
                    loaded.insert(name, handle);
                }
                Ok((name, Err(err))) => {
                    log::warn!("Texture '{name}' failed: {err}");
                    first_error.get_or_insert(err);
                }
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                Err(err) => {
                    log::error!("Texture load task did not complete: {err}");
                    first_error.get_or_insert(AssetError::Disposed);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(loaded),
        }
    }

    /// Queues `requests` by descending priority and loads the queue in batches.
    ///
    /// Each batch holds at most `max_concurrent_loads` entries and runs
    /// concurrently; the next batch starts once every entry of the previous
    /// one has settled. Failures are logged and reported in the summary, never
    /// propagated. Only one caller drains the queue at a time.
    pub async fn preload(&self, requests: impl IntoIterator<Item = LoadRequest>) -> PreloadSummary {
        if self.is_disposed() {
            return PreloadSummary::default();
        }

        let mut requests: Vec<LoadRequest> = requests.into_iter().collect();
        requests.sort_by(|a, b| b.priority.cmp(&a.priority));
        {
            let mut state = self.inner.lock_state();
            let mut queued = 0;
            for request in requests {
                if state.queue.push(request) {
                    queued += 1;
                }
            }
            state.counters.submitted += queued;
            log::debug!("Queued {} preload request(s), {} waiting", queued, state.queue.len());
        }

        self.drain().await
    }

    async fn drain(&self) -> PreloadSummary {
        let _drainer = self.inner.drain_lock.lock().await;
        let mut summary = PreloadSummary::default();

        loop {
            let Some((batch, generation)) = self.next_batch() else {
                break;
            };
            log::trace!("Starting preload batch of {} asset(s)", batch.len());

            let mut tasks = JoinSet::new();
            for request in batch {
                let entry = QueuedEntry::new(self.clone(), request.key.clone(), generation);
                tasks.spawn(async move {
                    let result = entry.cache.resolve(&request, true).await;
                    entry.finish(result.is_ok());
                    result
                });
            }

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(Ok(_)) => summary.loaded += 1,
                    Ok(Err(err)) => {
                        log::warn!("Preload entry failed: {err}");
                        summary.failed.push(err);
                    }
                    Err(err) => log::error!("Preload task did not complete: {err}"),
                }
            }
        }

        if summary.total() > 0 {
            log::info!(
                "Preload drained: {} loaded, {} failed",
                summary.loaded,
                summary.failed.len()
            );
            self.inner.events.publish(LoadEvent::Drained {
                loaded: summary.loaded,
                failed: summary.failed.len(),
            });
        }
        summary
    }

    fn next_batch(&self) -> Option<(Vec<LoadRequest>, u64)> {
        if self.is_disposed() {
            return None;
        }
        let mut state = self.inner.lock_state();
        let batch = state.queue.take(self.inner.max_concurrent_loads);
        (!batch.is_empty()).then_some((batch, state.generation))
    }

    /// Resolves one request. Queued requests are settled by the caller.
    async fn resolve(&self, request: &LoadRequest, queued: bool) -> Result<AssetHandle, AssetError> {
        match self.plan(&request.key, queued)? {
            Step::Cached(handle) => Ok(handle),
            Step::Follow(receiver) => flight::follow(&request.key, receiver).await,
            Step::Lead { flight, generation } => {
                self.lead(request, flight, generation, queued).await
            }
        }
    }

    fn plan(&self, key: &AssetKey, queued: bool) -> Result<Step, AssetError> {
        if self.is_disposed() {
            return Err(AssetError::Disposed);
        }
        let mut state = self.inner.lock_state();
        if let Some(handle) = state.assets.get(key) {
            return Ok(Step::Cached(handle.clone()));
        }
        if let Some(entry) = state.in_flight.get(key) {
            return Ok(Step::Follow(entry.receiver.clone()));
        }

        state.next_flight_id += 1;
        let (flight, entry) = Flight::open(self.inner.clone(), key.clone(), state.next_flight_id);
        state.in_flight.insert(key.clone(), entry);
        if !queued {
            state.counters.submitted += 1;
        }
        Ok(Step::Lead {
            flight,
            generation: state.generation,
        })
    }

    async fn lead(
        &self,
        request: &LoadRequest,
        flight: Flight,
        generation: u64,
        queued: bool,
    ) -> Result<AssetHandle, AssetError> {
        let key = &request.key;
        log::debug!("Loading {} '{}'", request.kind, key);
        self.inner.events.publish(LoadEvent::Started {
            key: key.clone(),
            kind: request.kind,
        });

        let fetched = self.inner.fetcher.fetch(key, request.kind).await;

        let result = {
            let mut state = self.inner.lock_state();
            state.remove_flight(key, flight.id());
            match fetched {
                _ if self.is_disposed() => Err(AssetError::Disposed),
                Ok(payload) => {
                    let params = SamplerParams::from_options(&request.options, &state.level.settings());
                    let handle = AssetHandle::new(Asset::new(key.clone(), request.kind, payload, params));
                    if state.generation == generation {
                        state.assets.insert(key.clone(), handle.clone());
                    } else {
                        log::debug!("'{key}' finished after the cache was cleared; not caching it");
                    }
                    Ok(handle)
                }
                Err(err) => Err(AssetError::load(key, &err)),
            }
        };

        match &result {
            Ok(handle) => log::debug!("Loaded '{}' ({} bytes)", key, handle.payload().byte_len()),
            Err(AssetError::Disposed) => log::debug!("Dropped '{key}': cache disposed"),
            Err(err) => {
                log::error!("{err}");
                self.inner.events.publish(LoadEvent::Failed {
                    key: key.clone(),
                    reason: err.clone(),
                });
            }
        }

        flight.complete(result.clone());
        if !queued {
            self.settle(generation, key, result.is_ok());
        }
        result
    }

    /// Counts a finished load, unless the cache was cleared since it started.
    fn settle(&self, generation: u64, key: &AssetKey, ok: bool) {
        let counters = {
            let mut state = self.inner.lock_state();
            if state.generation != generation {
                return;
            }
            if ok {
                state.counters.loaded += 1;
            } else {
                state.counters.failed += 1;
            }
            state.counters
        };
        self.inner.events.publish(LoadEvent::Progress {
            key: key.clone(),
            settled: counters.settled(),
            submitted: counters.submitted,
        });
    }

    /// Fraction of submitted loads that settled (failures included), in `[0, 1]`.
    ///
    /// Returns `1.0` when nothing was submitted. It never decreases unless new
    /// work is submitted or the cache is cleared.
    pub fn progress(&self) -> f32 {
        self.counters().progress()
    }

    /// A snapshot of the load counters.
    pub fn counters(&self) -> LoadCounters {
        self.inner.lock_state().counters
    }

    /// Sets the active quality level and re-applies its anisotropy to every
    /// cached texture in place. Nothing is fetched again.
    pub fn set_quality_level(&self, level: QualityLevel) -> QualitySettings {
        let settings = level.settings();
        if self.is_disposed() {
            return settings;
        }
        let updated = {
            let mut state = self.inner.lock_state();
            state.level = level;
            state
                .assets
                .values()
                .filter(|asset| asset.apply_quality(&settings))
                .count()
        };
        log::info!(
            "Texture quality set to {} (anisotropy {}x, {} asset(s) updated)",
            level,
            settings.anisotropy,
            updated
        );
        settings
    }

    /// Like [`set_quality_level`](Self::set_quality_level), by name.
    /// Unknown names fall back to `medium` with a warning.
    pub fn set_quality_by_name(&self, name: &str) -> QualitySettings {
        self.set_quality_level(QualityLevel::from_name_or_medium(name))
    }

    /// The level newly loaded textures are configured for.
    pub fn quality_level(&self) -> QualityLevel {
        self.inner.lock_state().level
    }

    /// The cached handle for `url`, if loaded.
    pub fn get(&self, url: impl Into<AssetKey>) -> Option<AssetHandle> {
        self.inner.lock_state().assets.get(&url.into()).cloned()
    }

    /// Returns `true` if `url` is cached.
    pub fn contains(&self, url: impl Into<AssetKey>) -> bool {
        self.inner.lock_state().assets.contains_key(&url.into())
    }

    /// Number of cached assets.
    pub fn len(&self) -> usize {
        self.inner.lock_state().assets.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of preload requests waiting for a batch slot.
    pub fn queued_len(&self) -> usize {
        self.inner.lock_state().queue.len()
    }

    /// Number of fetches currently running.
    pub fn in_flight_len(&self) -> usize {
        self.inner.lock_state().in_flight.len()
    }

    /// Upper bound on concurrent preload fetches.
    pub fn max_concurrent_loads(&self) -> usize {
        self.inner.max_concurrent_loads
    }

    /// Opens a subscription to load events.
    pub fn subscribe(&self) -> flume::Receiver<LoadEvent> {
        self.inner.events.subscribe()
    }

    /// Releases every cached asset and forgets queued and running loads.
    ///
    /// Loads already running finish for their callers but are not cached.
    /// Counters start over. Calling it twice is harmless.
    pub fn clear(&self) {
        let released: Vec<AssetHandle> = {
            let mut state = self.inner.lock_state();
            state.generation += 1;
            state.queue.clear();
            state.in_flight.clear();
            state.counters = LoadCounters::default();
            state.assets.drain().map(|(_, handle)| handle).collect()
        };
        for asset in &released {
            asset.release();
        }
        log::info!("Resource cache cleared ({} asset(s) released)", released.len());
    }

    /// Clears the cache and makes every later call a no-op.
    ///
    /// Loads return [`AssetError::Disposed`] afterwards. Idempotent.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.clear();
        self.inner.events.close();
        log::info!("Resource cache disposed");
    }

    /// Returns `true` after [`dispose`](Self::dispose).
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }
}

impl QualityConsumer for ResourceCache {
    fn apply_quality(&self, level: QualityLevel, _settings: &QualitySettings) {
        self.set_quality_level(level);
    }
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock_state();
        f.debug_struct("ResourceCache")
            .field("assets", &state.assets.len())
            .field("in_flight", &state.in_flight.len())
            .field("queued", &state.queue.len())
            .field("counters", &state.counters)
            .field("level", &state.level)
            .finish()
    }
}
