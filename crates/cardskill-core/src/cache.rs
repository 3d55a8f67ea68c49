//! Dataset cache: TTL-bounded snapshots of upstream documents.
//!
//! Each snapshot is the raw upstream JSON wrapped with its fetch time, so a
//! change to a parser never requires invalidating the cache. The card list
//! and the optional skills document are cached under separate keys. Storage and
//! network access sit behind [`CacheStore`] and [`Fetcher`] so the whole
//! load path can run against in-memory fakes.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::card::CardRecord;
use crate::error::CardError;
use crate::fetch::Fetcher;
use crate::game::{Game, Server};
use crate::skill::SkillTable;

/// Persisted form: `{"fetched_at": ..., "data": <upstream JSON>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub fetched_at: DateTime<Utc>,
    pub data: Value,
}

impl CacheEntry {
    pub fn new(data: Value) -> Self {
        Self {
            fetched_at: Utc::now(),
            data,
        }
    }

    /// An entry stamped in the future is treated as stale.
    pub fn is_fresh(&self, ttl: TimeDelta, now: DateTime<Utc>) -> bool {
        let age = now - self.fetched_at;
        age >= TimeDelta::zero() && age < ttl
    }
}

pub trait CacheStore {
    /// Missing, unreadable and corrupt entries all read as `None`.
    fn read(&self, key: &str) -> Option<CacheEntry>;
    fn write(&self, key: &str, entry: &CacheEntry) -> Result<(), CardError>;
}

impl<S: CacheStore + ?Sized> CacheStore for &S {
    fn read(&self, key: &str) -> Option<CacheEntry> {
        (**self).read(key)
    }

    fn write(&self, key: &str, entry: &CacheEntry) -> Result<(), CardError> {
        (**self).write(key, entry)
    }
}

/// One `<key>.json` file per dataset inside a cache directory.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    dir: PathBuf,
}

impl FileCacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl CacheStore for FileCacheStore {
    fn read(&self, key: &str) -> Option<CacheEntry> {
        let path = self.path_for(key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "Cache file not readable");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Ignoring corrupt cache file");
                None
            }
        }
    }

    fn write(&self, key: &str, entry: &CacheEntry) -> Result<(), CardError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let serialized = serde_json::to_string(entry)?;
        let temp_path = build_temp_path(&path);
        fs::write(&temp_path, serialized)?;
        if let Err(err) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            return Err(err.into());
        }
        Ok(())
    }
}

fn build_temp_path(path: &Path) -> PathBuf {
    let mut temp_path = path.to_path_buf();
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if !ext.is_empty() => {
            temp_path.set_extension(format!("{ext}.{}.tmp", std::process::id()));
        }
        _ => {
            temp_path.set_extension(format!("{}.tmp", std::process::id()));
        }
    }
    temp_path
}

/// In-process store, used by tests and one-shot embedding.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: RefCell<HashMap<String, CacheEntry>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, entry: CacheEntry) -> Self {
        let store = Self::default();
        store.entries.borrow_mut().insert(key.to_string(), entry);
        store
    }

    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.borrow().get(key).cloned()
    }
}

impl CacheStore for MemoryCacheStore {
    fn read(&self, key: &str) -> Option<CacheEntry> {
        self.get(key)
    }

    fn write(&self, key: &str, entry: &CacheEntry) -> Result<(), CardError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), entry.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DatasetOrigin {
    /// Served from a snapshot younger than the TTL.
    Cache,
    /// Fetched during this load.
    Network,
    /// The refresh failed; an expired snapshot was used instead.
    StaleCache {
        fetched_at: DateTime<Utc>,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub records: Vec<CardRecord>,
    pub origin: DatasetOrigin,
}

#[derive(Debug, Clone)]
pub struct SkillDataset {
    pub table: SkillTable,
    pub origin: DatasetOrigin,
}

/// Cache-or-fetch loader for a game's card list and skills document.
pub struct DatasetCache<S, F> {
    store: S,
    fetcher: F,
    ttl: TimeDelta,
    /// URL overrides keyed by cache key.
    urls: HashMap<&'static str, String>,
}

impl<S: CacheStore, F: Fetcher> DatasetCache<S, F> {
    pub fn new(store: S, fetcher: F, ttl: TimeDelta) -> Self {
        Self {
            store,
            fetcher,
            ttl,
            urls: HashMap::new(),
        }
    }

    /// Override the card list URL for one game.
    pub fn with_url(mut self, game: Game, url: impl Into<String>) -> Self {
        self.urls.insert(game.cache_key(), url.into());
        self
    }

    /// Override the skills document URL; ignored for games without one.
    pub fn with_skills_url(mut self, game: Game, url: impl Into<String>) -> Self {
        if let Some(source) = game.skill_source() {
            self.urls.insert(source.cache_key, url.into());
        }
        self
    }

    pub fn url(&self, game: Game) -> &str {
        self.urls
            .get(game.cache_key())
            .map(String::as_str)
            .unwrap_or(game.schema().cards_url)
    }

    pub fn skills_url(&self, game: Game) -> Option<&str> {
        let source = game.skill_source()?;
        Some(
            self.urls
                .get(source.cache_key)
                .map(String::as_str)
                .unwrap_or(source.url),
        )
    }

    pub fn load(
        &self,
        game: Game,
        server: Server,
        force_refresh: bool,
    ) -> Result<Dataset, CardError> {
        let (records, origin) = self.load_document(
            game.cache_key(),
            self.url(game),
            force_refresh,
            |data| game.parse_cards(data, server),
        )?;
        info!(game = %game, cards = records.len(), ?origin, "Card data ready");
        Ok(Dataset { records, origin })
    }

    /// The game's skill table, or `None` when it publishes no skills document.
    pub fn load_skills(
        &self,
        game: Game,
        force_refresh: bool,
    ) -> Result<Option<SkillDataset>, CardError> {
        let (Some(source), Some(url)) = (game.skill_source(), self.skills_url(game)) else {
            return Ok(None);
        };
        let (table, origin) =
            self.load_document(source.cache_key, url, force_refresh, |data| source.parse(data))?;
        info!(game = %game, skills = table.len(), ?origin, "Skill data ready");
        Ok(Some(SkillDataset { table, origin }))
    }

    fn load_document<T>(
        &self,
        key: &str,
        url: &str,
        force_refresh: bool,
        parse: impl Fn(&Value) -> Result<T, CardError>,
    ) -> Result<(T, DatasetOrigin), CardError> {
        let cached = self.store.read(key);

        if !force_refresh {
            if let Some(entry) = cached.as_ref() {
                if entry.is_fresh(self.ttl, Utc::now()) {
                    match parse(&entry.data) {
                        Ok(value) => {
                            debug!(dataset = key, fetched_at = %entry.fetched_at, "Using cached data");
                            return Ok((value, DatasetOrigin::Cache));
                        }
                        Err(err) => {
                            warn!(dataset = key, error = %err, "Cached data unusable, refetching");
                        }
                    }
                } else {
                    info!(dataset = key, fetched_at = %entry.fetched_at, "Cache expired, will fetch");
                }
            } else {
                info!(dataset = key, "Cache miss, will fetch");
            }
        }

        match self.refresh(key, url, &parse) {
            Ok(value) => Ok((value, DatasetOrigin::Network)),
            Err(err) => {
                let Some(entry) = cached else {
                    return Err(err);
                };
                match parse(&entry.data) {
                    Ok(value) => {
                        warn!(
                            dataset = key,
                            error = %err,
                            fetched_at = %entry.fetched_at,
                            "Refresh failed, falling back to stale cache"
                        );
                        Ok((
                            value,
                            DatasetOrigin::StaleCache {
                                fetched_at: entry.fetched_at,
                                reason: err.to_string(),
                            },
                        ))
                    }
                    Err(_) => Err(err),
                }
            }
        }
    }

    fn refresh<T>(
        &self,
        key: &str,
        url: &str,
        parse: &impl Fn(&Value) -> Result<T, CardError>,
    ) -> Result<T, CardError> {
        let data = self.fetcher.fetch_json(url)?;
        let value = parse(&data)?;

        let entry = CacheEntry::new(data);
        if let Err(err) = self.store.write(key, &entry) {
            warn!(dataset = key, error = %err, "Failed to write cache");
        }

        debug!(dataset = key, url, "Fetched upstream data");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use serde_json::json;
    use tempfile::tempdir;

    use super::*;

    struct StubFetcher {
        payload: Option<Value>,
        calls: Cell<usize>,
    }

    impl StubFetcher {
        fn ok(payload: Value) -> Self {
            Self {
                payload: Some(payload),
                calls: Cell::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                payload: None,
                calls: Cell::new(0),
            }
        }
    }

    impl Fetcher for StubFetcher {
        fn fetch_json(&self, _url: &str) -> Result<Value, CardError> {
            self.calls.set(self.calls.get() + 1);
            self.payload
                .clone()
                .ok_or_else(|| CardError::fetch("connection refused"))
        }
    }

    fn cards(prefix: &str) -> Value {
        json!([{
            "id": 1,
            "characterId": 1,
            "cardRarityType": "rarity_3",
            "attr": "cool",
            "prefix": prefix,
            "assetbundleName": "res001_no001",
            "releaseAt": 1_600_000_000_000i64
        }])
    }

    fn aged(data: Value, age: TimeDelta) -> CacheEntry {
        CacheEntry {
            fetched_at: Utc::now() - age,
            data,
        }
    }

    fn ttl() -> TimeDelta {
        TimeDelta::hours(1)
    }

    #[test]
    fn fresh_entry_skips_network() {
        let store = MemoryCacheStore::with_entry(
            "sekai-cards",
            aged(cards("cached"), TimeDelta::minutes(10)),
        );
        let fetcher = StubFetcher::ok(cards("network"));
        let cache = DatasetCache::new(&store, &fetcher, ttl());

        let dataset = cache.load(Game::Sekai, Server::Jp, false).expect("load");
        assert_eq!(dataset.origin, DatasetOrigin::Cache);
        assert_eq!(dataset.records[0].title, "cached");
        assert_eq!(fetcher.calls.get(), 0);
    }

    #[test]
    fn expired_entry_is_refetched_and_overwritten() {
        let store =
            MemoryCacheStore::with_entry("sekai-cards", aged(cards("old"), TimeDelta::hours(2)));
        let fetcher = StubFetcher::ok(cards("new"));
        let cache = DatasetCache::new(&store, &fetcher, ttl());

        let dataset = cache.load(Game::Sekai, Server::Jp, false).expect("load");
        assert_eq!(dataset.origin, DatasetOrigin::Network);
        assert_eq!(dataset.records[0].title, "new");
        assert_eq!(fetcher.calls.get(), 1);

        let stored = store.get("sekai-cards").expect("written");
        assert_eq!(stored.data, cards("new"));
        assert!(stored.is_fresh(ttl(), Utc::now()));
    }

    #[test]
    fn force_refresh_ignores_fresh_entry() {
        let store = MemoryCacheStore::with_entry(
            "sekai-cards",
            aged(cards("cached"), TimeDelta::minutes(1)),
        );
        let fetcher = StubFetcher::ok(cards("network"));
        let cache = DatasetCache::new(&store, &fetcher, ttl());

        let dataset = cache.load(Game::Sekai, Server::Jp, true).expect("load");
        assert_eq!(dataset.records[0].title, "network");
        assert_eq!(fetcher.calls.get(), 1);
    }

    #[test]
    fn failed_fetch_falls_back_to_stale_entry() {
        let store =
            MemoryCacheStore::with_entry("sekai-cards", aged(cards("stale"), TimeDelta::days(3)));
        let fetcher = StubFetcher::failing();
        let cache = DatasetCache::new(&store, &fetcher, ttl());

        let dataset = cache.load(Game::Sekai, Server::Jp, true).expect("fallback");
        assert_eq!(dataset.records[0].title, "stale");
        match dataset.origin {
            DatasetOrigin::StaleCache { reason, .. } => {
                assert!(reason.contains("connection refused"), "{reason}");
            }
            other => panic!("unexpected origin {other:?}"),
        }
    }

    #[test]
    fn failed_fetch_without_cache_is_an_error() {
        let store = MemoryCacheStore::new();
        let fetcher = StubFetcher::failing();
        let cache = DatasetCache::new(&store, &fetcher, ttl());

        let err = cache.load(Game::Sekai, Server::Jp, false).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Fetch);
    }

    #[test]
    fn unparseable_upstream_counts_as_fetch_failure() {
        let store = MemoryCacheStore::new();
        let fetcher = StubFetcher::ok(json!({"unexpected": true}));
        let cache = DatasetCache::new(&store, &fetcher, ttl());

        let err = cache.load(Game::Sekai, Server::Jp, false).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Fetch);
        assert!(store.get("sekai-cards").is_none());
    }

    #[test]
    fn url_override_is_used() {
        let cache = DatasetCache::new(MemoryCacheStore::new(), StubFetcher::failing(), ttl())
            .with_url(Game::Bandori, "http://localhost/cards.json");
        assert_eq!(cache.url(Game::Bandori), "http://localhost/cards.json");
        assert_eq!(cache.url(Game::Sekai), Game::Sekai.schema().cards_url);
        assert_eq!(
            cache.skills_url(Game::Bandori),
            Game::Bandori.skill_source().map(|source| source.url)
        );
        assert_eq!(cache.skills_url(Game::Sekai), None);

        let cache = cache
            .with_skills_url(Game::Bandori, "http://localhost/skills.json")
            .with_skills_url(Game::Sekai, "http://localhost/ignored.json");
        assert_eq!(cache.skills_url(Game::Bandori), Some("http://localhost/skills.json"));
        assert_eq!(cache.url(Game::Bandori), "http://localhost/cards.json");
        assert_eq!(cache.skills_url(Game::Sekai), None);
    }

    #[test]
    fn file_store_round_trips_and_tolerates_corruption() {
        let temp = tempdir().expect("tempdir");
        let store = FileCacheStore::new(temp.path().join("nested"));
        assert!(store.read("sekai-cards").is_none());

        let entry = CacheEntry::new(cards("on disk"));
        store.write("sekai-cards", &entry).expect("write");
        assert_eq!(store.read("sekai-cards"), Some(entry));

        fs::write(store.path_for("sekai-cards"), "{not json").expect("corrupt");
        assert!(store.read("sekai-cards").is_none());
    }

    #[test]
    fn future_timestamps_count_as_stale() {
        let now = Utc::now();
        let entry = CacheEntry {
            fetched_at: now + TimeDelta::hours(5),
            data: Value::Null,
        };
        assert!(!entry.is_fresh(ttl(), now));
        assert!(!entry.is_fresh(TimeDelta::days(365), now));

        let just_written = CacheEntry {
            fetched_at: now,
            data: Value::Null,
        };
        assert!(just_written.is_fresh(ttl(), now));
    }

    #[test]
    fn skewed_entry_is_refetched() {
        let store = MemoryCacheStore::with_entry(
            "sekai-cards",
            aged(cards("from the future"), -TimeDelta::days(2)),
        );
        let fetcher = StubFetcher::ok(cards("network"));
        let cache = DatasetCache::new(&store, &fetcher, ttl());

        let dataset = cache.load(Game::Sekai, Server::Jp, false).expect("load");
        assert_eq!(dataset.origin, DatasetOrigin::Network);
        assert_eq!(dataset.records[0].title, "network");
        assert_eq!(fetcher.calls.get(), 1);
    }

    /// Reads like an empty store; every write fails.
    struct ReadOnlyStore;

    impl CacheStore for ReadOnlyStore {
        fn read(&self, _key: &str) -> Option<CacheEntry> {
            None
        }

        fn write(&self, _key: &str, _entry: &CacheEntry) -> Result<(), CardError> {
            Err(CardError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only cache",
            )))
        }
    }

    #[test]
    fn failed_cache_write_still_returns_fetched_records() {
        let fetcher = StubFetcher::ok(cards("network"));
        let cache = DatasetCache::new(ReadOnlyStore, &fetcher, ttl());

        let dataset = cache.load(Game::Sekai, Server::Jp, false).expect("load");
        assert_eq!(dataset.origin, DatasetOrigin::Network);
        assert_eq!(dataset.records.len(), 1);
        assert_eq!(dataset.records[0].title, "network");
        assert_eq!(fetcher.calls.get(), 1);
    }

    #[test]
    fn failed_rename_leaves_no_temp_file() {
        let temp = tempdir().expect("tempdir");
        let store = FileCacheStore::new(temp.path());
        // A directory at the target path makes the rename fail.
        fs::create_dir_all(store.path_for("sekai-cards").join("blocker")).expect("blocker");

        let err = store
            .write("sekai-cards", &CacheEntry::new(cards("never lands")))
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);

        let leftovers: Vec<_> = fs::read_dir(temp.path())
            .expect("read dir")
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "{leftovers:?}");
    }

    fn skills() -> Value {
        json!({
            "47": {
                "description": ["スコアが{1}秒間100%UP"],
                "duration": [5, 7]
            }
        })
    }

    #[test]
    fn skills_are_cached_under_their_own_key() {
        let store = MemoryCacheStore::new();
        let fetcher = StubFetcher::ok(skills());
        let cache = DatasetCache::new(&store, &fetcher, ttl());

        let loaded = cache
            .load_skills(Game::Bandori, false)
            .expect("load")
            .expect("bandori has skills");
        assert_eq!(loaded.origin, DatasetOrigin::Network);
        assert!(loaded.table.get(47).is_some());
        assert_eq!(store.get("bandori-skills").map(|entry| entry.data), Some(skills()));
        assert!(store.get("bandori-cards").is_none());

        let again = cache
            .load_skills(Game::Bandori, false)
            .expect("load")
            .expect("bandori has skills");
        assert_eq!(again.origin, DatasetOrigin::Cache);
        assert_eq!(fetcher.calls.get(), 1);
    }

    #[test]
    fn games_without_skills_document_load_nothing() {
        let fetcher = StubFetcher::failing();
        let cache = DatasetCache::new(MemoryCacheStore::new(), &fetcher, ttl());
        assert!(cache.load_skills(Game::Sekai, true).expect("no-op").is_none());
        assert_eq!(fetcher.calls.get(), 0);
    }
}
