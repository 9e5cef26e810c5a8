// SPDX-FileCopyrightText: 2026 Riflett Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tiered memory store: an in-process map over a durable tier.
//!
//! The durable tier is chosen once, on first use: the SQL row store, then
//! the flat snapshot, then nothing (volatile). The map is hydrated from
//! whichever tier wins and stays authoritative for the process lifetime.
//! Durable writes are best-effort; failures are logged and the map is
//! updated regardless.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, info, warn};

use riflett_config::model::{MemoryConfig, RiflettConfig, StorageShape};
use riflett_core::types::{OperatingPicture, RemoteHit, RemoteScope, SearchOptions, SearchScope};
use riflett_core::{
    FlatKeyValueStore, HealthStatus, IdentityResolver, MemoryKind, MemoryRecord, MemoryRow,
    RemoteSearch, RiflettError,
};
use riflett_storage::queries::memory_rows;
use riflett_storage::{FileKeyValueStore, RowBackend};

use crate::embedder::{EmbeddingProvider, cosine_prefix, l2_normalize};
use crate::snapshot::{self, SNAPSHOT_KEY};

/// Minimum number of remote hits requested for a brief.
const MIN_BRIEF_LIMIT: usize = 3;

/// Text used to pay the embedder's cold-start cost.
const WARMUP_TEXT: &str = "hi";

/// Where the durable SQL tier lives.
#[derive(Debug, Clone)]
pub struct DurableSpec {
    pub path: String,
    pub shape: StorageShape,
}

/// Which durable tier backs the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TierKind {
    Sql,
    Flat,
    Volatile,
}

impl TierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TierKind::Sql => "sql",
            TierKind::Flat => "flat",
            TierKind::Volatile => "volatile",
        }
    }
}

enum ActiveTier {
    Sql(RowBackend),
    Flat(Arc<dyn FlatKeyValueStore>),
    Volatile,
}

impl ActiveTier {
    fn kind(&self) -> TierKind {
        match self {
            ActiveTier::Sql(_) => TierKind::Sql,
            ActiveTier::Flat(_) => TierKind::Flat,
            ActiveTier::Volatile => TierKind::Volatile,
        }
    }
}

/// A row to be written. Missing `ts` means now; missing embedding means
/// the text is embedded.
#[derive(Debug, Clone)]
pub struct NewRow {
    pub id: String,
    pub kind: MemoryKind,
    pub text: String,
    pub ts: Option<i64>,
    pub embedding: Option<Vec<f32>>,
}

impl NewRow {
    pub fn new(id: impl Into<String>, kind: MemoryKind, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            text: text.into(),
            ts: None,
            embedding: None,
        }
    }

    pub fn at(mut self, ts: i64) -> Self {
        self.ts = Some(ts);
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

/// Personalized context for an utterance, fetched for a known user.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryBrief {
    pub operating_picture: OperatingPicture,
    pub hits: Vec<RemoteHit>,
    pub records: Vec<MemoryRecord>,
}

/// Store health as reported by [`MemoryStore::health`].
#[derive(Debug, Clone)]
pub struct MemoryHealth {
    pub tier: TierKind,
    /// Rows held in process.
    pub rows: usize,
    /// Rows in the durable SQL tier, when that tier is active.
    pub durable_rows: Option<usize>,
    pub status: HealthStatus,
}

/// Builder for [`MemoryStore`].
pub struct MemoryStoreBuilder {
    config: MemoryConfig,
    embedder: EmbeddingProvider,
    durable: Option<DurableSpec>,
    flat: Option<Arc<dyn FlatKeyValueStore>>,
    remote: Option<Arc<dyn RemoteSearch>>,
    identity: Option<Arc<dyn IdentityResolver>>,
}

impl MemoryStoreBuilder {
    /// Builder with both durable tiers taken from the full configuration.
    pub fn from_config(config: &RiflettConfig) -> Self {
        let mut builder = MemoryStore::builder(config.memory.clone()).flat(Arc::new(
            FileKeyValueStore::new(&config.storage.snapshot_dir),
        ));
        if config.storage.enabled {
            builder = builder.durable(DurableSpec {
                path: config.storage.database_path.clone(),
                shape: config.storage.shape,
            });
        }
        builder
    }

    pub fn embedder(mut self, embedder: EmbeddingProvider) -> Self {
        self.embedder = embedder;
        self
    }

    pub fn durable(mut self, spec: DurableSpec) -> Self {
        self.durable = Some(spec);
        self
    }

    pub fn flat(mut self, flat: Arc<dyn FlatKeyValueStore>) -> Self {
        self.flat = Some(flat);
        self
    }

    pub fn remote(mut self, remote: Arc<dyn RemoteSearch>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn identity(mut self, identity: Arc<dyn IdentityResolver>) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn build(self) -> MemoryStore {
        MemoryStore {
            config: self.config,
            embedder: self.embedder,
            durable: self.durable,
            flat: self.flat,
            remote: self.remote,
            identity: self.identity,
            rows: RwLock::new(HashMap::new()),
            tier: OnceCell::new(),
        }
    }
}

/// Text + vector + metadata cache with similarity search.
///
/// Construct one per process (or per test) and share it by reference.
pub struct MemoryStore {
    config: MemoryConfig,
    embedder: EmbeddingProvider,
    durable: Option<DurableSpec>,
    flat: Option<Arc<dyn FlatKeyValueStore>>,
    remote: Option<Arc<dyn RemoteSearch>>,
    identity: Option<Arc<dyn IdentityResolver>>,
    rows: RwLock<HashMap<String, MemoryRow>>,
    tier: OnceCell<ActiveTier>,
}

impl MemoryStore {
    pub fn builder(config: MemoryConfig) -> MemoryStoreBuilder {
        let embedder = EmbeddingProvider::hashing(config.embedding_dim);
        MemoryStoreBuilder {
            config,
            embedder,
            durable: None,
            flat: None,
            remote: None,
            identity: None,
        }
    }

    pub fn embedder(&self) -> &EmbeddingProvider {
        &self.embedder
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Select and hydrate the durable tier. Concurrent first callers share
    /// one in-flight initialization.
    async fn tier(&self) -> &ActiveTier {
        self.tier.get_or_init(|| self.open_tier()).await
    }

    async fn open_tier(&self) -> ActiveTier {
        if let Some(spec) = &self.durable {
            match self.open_sql(spec).await {
                Ok(tier) => return self.selected(tier),
                Err(e) => {
                    warn!(error = %e, path = %spec.path, "durable tier unavailable, falling back to flat snapshot");
                    metrics::counter!("riflett_memory_fallback_total", "stage" => "storage")
                        .increment(1);
                }
            }
        }

        if let Some(flat) = &self.flat {
            match self.open_flat(Arc::clone(flat)).await {
                Ok(tier) => return self.selected(tier),
                Err(e) => {
                    warn!(error = %e, "flat snapshot unavailable, keeping memory in process only");
                    metrics::counter!("riflett_memory_fallback_total", "stage" => "storage")
                        .increment(1);
                }
            }
        }

        self.selected(ActiveTier::Volatile)
    }

    fn selected(&self, tier: ActiveTier) -> ActiveTier {
        let kind = tier.kind();
        info!(tier = kind.as_str(), "memory tier selected");
        metrics::counter!("riflett_memory_tier_total", "tier" => kind.as_str()).increment(1);
        tier
    }

    async fn open_sql(&self, spec: &DurableSpec) -> Result<ActiveTier, RiflettError> {
        let db = RowBackend::open(&spec.path, spec.shape).await?;
        let rows = memory_rows::recent_rows(&db, self.config.candidate_limit).await?;
        self.hydrate(rows).await;
        Ok(ActiveTier::Sql(db))
    }

    async fn open_flat(&self, flat: Arc<dyn FlatKeyValueStore>) -> Result<ActiveTier, RiflettError> {
        let rows = match flat.get(SNAPSHOT_KEY).await? {
            Some(json) => snapshot::decode(&json),
            None => Vec::new(),
        };
        self.hydrate(rows).await;
        Ok(ActiveTier::Flat(flat))
    }

    async fn hydrate(&self, rows: Vec<MemoryRow>) {
        let mut map = self.rows.write().await;
        let count = rows.len();
        for row in rows {
            map.insert(row.id.clone(), row);
        }
        evict_oldest(&mut map, self.config.snapshot_capacity);
        debug!(rows = count, "memory map hydrated");
    }

    /// Initialize the tier and embed once so the first real call is fast.
    pub async fn warmup(&self) {
        self.tier().await;
        let _ = self.embedder.embed(WARMUP_TEXT).await;
    }

    /// Insert or overwrite a row. The map is always updated; durable
    /// persistence is best-effort.
    pub async fn upsert(&self, new: NewRow) -> MemoryRow {
        let tier = self.tier().await;

        let embedding = match new.embedding {
            Some(v) if !v.is_empty() => l2_normalize(v),
            _ => self.embedder.embed(&new.text).await,
        };
        let row = MemoryRow {
            id: new.id,
            kind: new.kind,
            text: new.text,
            ts: new.ts.unwrap_or_else(now_ms),
            embedding,
        };

        {
            let mut map = self.rows.write().await;
            map.insert(row.id.clone(), row.clone());
            // Evicted rows stay in the SQL tier when it is active.
            evict_oldest(&mut map, self.config.snapshot_capacity);
        }

        let persisted = match tier {
            ActiveTier::Sql(db) => memory_rows::upsert_row(db, &row).await,
            ActiveTier::Flat(flat) => self.write_snapshot(flat.as_ref()).await,
            ActiveTier::Volatile => Ok(()),
        };
        if let Err(e) = persisted {
            warn!(id = %row.id, tier = tier.kind().as_str(), error = %e, "durable upsert failed, row kept in process");
            metrics::counter!("riflett_memory_fallback_total", "stage" => "storage").increment(1);
        }

        row
    }

    /// Delete a row from the map and the durable tier. Absent ids are a no-op.
    pub async fn remove(&self, id: &str) {
        let tier = self.tier().await;
        let removed = self.rows.write().await.remove(id).is_some();

        let persisted = match tier {
            ActiveTier::Sql(db) => memory_rows::delete_row(db, id).await,
            ActiveTier::Flat(flat) if removed => self.write_snapshot(flat.as_ref()).await,
            _ => Ok(()),
        };
        if let Err(e) = persisted {
            warn!(id, tier = tier.kind().as_str(), error = %e, "durable remove failed");
            metrics::counter!("riflett_memory_fallback_total", "stage" => "storage").increment(1);
        }
    }

    async fn write_snapshot(&self, flat: &dyn FlatKeyValueStore) -> Result<(), RiflettError> {
        let json = {
            let map = self.rows.read().await;
            snapshot::encode(map.values(), self.config.snapshot_capacity)?
        };
        flat.set(SNAPSHOT_KEY, json).await
    }

    /// Top `top_k` records for `query`, restricted to `kinds` (empty = all).
    ///
    /// With a remote collaborator and a known user the remote results are
    /// returned as-is (and cached locally) whenever there is at least one;
    /// otherwise local rows are ranked by cosine similarity.
    pub async fn search_top_n(
        &self,
        query: &str,
        kinds: &[MemoryKind],
        top_k: usize,
    ) -> Vec<MemoryRecord> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        let top_k = top_k.clamp(1, self.config.max_top_k.max(1));
        self.tier().await;

        if let Some(mut remote) = self.remote_search(query, kinds, top_k).await {
            remote.sort_by(|a, b| b.score.total_cmp(&a.score));
            remote.truncate(top_k);
            return remote;
        }

        let query_vector = self.embedder.embed(query).await;
        let mut records = self.rank_local(&query_vector, kinds).await;
        records.truncate(top_k);
        records
    }

    async fn remote_search(
        &self,
        query: &str,
        kinds: &[MemoryKind],
        top_k: usize,
    ) -> Option<Vec<MemoryRecord>> {
        let remote = self.remote.as_ref()?;
        let user_id = self.identity.as_ref()?.current_user_id().await?;

        let scope = remote_scope_for(kinds);
        match remote
            .search(&user_id, query, &scope, SearchOptions { limit: top_k })
            .await
        {
            Ok(hits) if !hits.is_empty() => Some(self.ingest_hits(&hits).await),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "remote search failed, ranking local rows");
                metrics::counter!("riflett_memory_fallback_total", "stage" => "remote")
                    .increment(1);
                None
            }
        }
    }

    /// Turn remote hits into records and cache each one locally.
    async fn ingest_hits(&self, hits: &[RemoteHit]) -> Vec<MemoryRecord> {
        let now = now_ms();
        let mut records = Vec::with_capacity(hits.len());
        for (index, hit) in hits.iter().enumerate() {
            let kind = MemoryKind::from_str_value(&hit.kind);
            let row = self
                .upsert(
                    NewRow::new(format!("{}:{}", kind.as_str(), hit.id), kind, hit.snippet.clone())
                        .at(now - index as i64),
                )
                .await;
            records.push(MemoryRecord {
                row,
                score: hit.score,
            });
        }
        records
    }

    /// Local rows scored against `query_vector`, best first.
    ///
    /// Candidates are the most recent `candidate_limit` rows in scope; the
    /// stable sort keeps recency order among equal scores.
    async fn rank_local(&self, query_vector: &[f32], kinds: &[MemoryKind]) -> Vec<MemoryRecord> {
        let candidates: Vec<MemoryRow> = {
            let map = self.rows.read().await;
            let mut in_scope: Vec<&MemoryRow> = map
                .values()
                .filter(|row| kinds.is_empty() || kinds.contains(&row.kind))
                .collect();
            in_scope.sort_by(|a, b| newest_first(a, b));
            in_scope
                .into_iter()
                .take(self.config.candidate_limit)
                .cloned()
                .collect()
        };

        let mut records: Vec<MemoryRecord> = candidates
            .into_iter()
            .map(|row| {
                let score = cosine_prefix(query_vector, &row.embedding);
                MemoryRecord { row, score }
            })
            .collect();
        records.sort_by(|a, b| b.score.total_cmp(&a.score));
        records
    }

    /// Local rows whose similarity to `query` is at least `threshold`.
    pub async fn related(
        &self,
        query: &str,
        kinds: &[MemoryKind],
        threshold: f32,
    ) -> Vec<MemoryRecord> {
        if query.trim().is_empty() {
            return Vec::new();
        }
        self.tier().await;
        let query_vector = self.embedder.embed(query.trim()).await;
        self.rank_local(&query_vector, kinds)
            .await
            .into_iter()
            .take_while(|r| r.score >= threshold)
            .collect()
    }

    /// Best stored row of `kind` that `text` would duplicate, if any.
    pub async fn find_near_duplicate(&self, text: &str, kind: MemoryKind) -> Option<MemoryRecord> {
        self.related(text, &[kind], self.config.dedupe_threshold)
            .await
            .into_iter()
            .next()
    }

    /// Operating picture plus remote hits for a known user.
    ///
    /// Fails with [`RiflettError::NotAuthenticated`] when neither `uid` nor
    /// the identity resolver yields a user. Remote failures degrade to an
    /// empty picture and no hits.
    pub async fn get_brief(
        &self,
        uid: Option<&str>,
        intent_label: &str,
        query: &str,
        limit: Option<usize>,
    ) -> Result<MemoryBrief, RiflettError> {
        let user_id = match uid {
            Some(uid) if !uid.is_empty() => uid.to_string(),
            _ => match &self.identity {
                Some(identity) => identity
                    .current_user_id()
                    .await
                    .ok_or(RiflettError::NotAuthenticated)?,
                None => return Err(RiflettError::NotAuthenticated),
            },
        };

        let limit = limit
            .unwrap_or(self.config.brief_limit)
            .min(self.config.brief_limit)
            .max(MIN_BRIEF_LIMIT);

        let Some(remote) = &self.remote else {
            return Ok(MemoryBrief {
                operating_picture: OperatingPicture::default(),
                hits: Vec::new(),
                records: Vec::new(),
            });
        };

        let operating_picture = match remote.operating_picture(&user_id).await {
            Ok(Some(picture)) => picture,
            Ok(None) => OperatingPicture::default(),
            Err(e) => {
                warn!(error = %e, "operating picture unavailable, using default");
                metrics::counter!("riflett_memory_fallback_total", "stage" => "remote")
                    .increment(1);
                OperatingPicture::default()
            }
        };

        let hits = if query.trim().is_empty() {
            Vec::new()
        } else {
            let scope = scope_for_intent(intent_label);
            match remote
                .search(&user_id, query.trim(), &scope, SearchOptions { limit })
                .await
            {
                Ok(hits) => hits,
                Err(e) => {
                    warn!(error = %e, "brief search failed, returning picture only");
                    metrics::counter!("riflett_memory_fallback_total", "stage" => "remote")
                        .increment(1);
                    Vec::new()
                }
            }
        };

        let records = self.ingest_hits(&hits).await;
        Ok(MemoryBrief {
            operating_picture,
            hits,
            records,
        })
    }

    /// Active tier, row count, and a liveness probe of the durable tier.
    pub async fn health(&self) -> MemoryHealth {
        let tier = self.tier().await;
        let rows = self.rows.read().await.len();
        let (durable_rows, status) = match tier {
            ActiveTier::Sql(db) => match memory_rows::count_rows(db).await {
                Ok(count) => (Some(count), HealthStatus::Healthy),
                Err(e) => (
                    None,
                    HealthStatus::Unhealthy(format!("durable tier probe failed: {e}")),
                ),
            },
            ActiveTier::Flat(_) => (None, HealthStatus::Degraded("using flat snapshot tier".into())),
            ActiveTier::Volatile => (
                None,
                HealthStatus::Degraded("no durable tier, memory is volatile".into()),
            ),
        };
        MemoryHealth {
            tier: tier.kind(),
            rows,
            durable_rows,
            status,
        }
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Newest `ts` first; equal timestamps order by id.
fn newest_first(a: &MemoryRow, b: &MemoryRow) -> Ordering {
    b.ts.cmp(&a.ts).then_with(|| a.id.cmp(&b.id))
}

/// Keep only the `capacity` most recent rows.
fn evict_oldest(map: &mut HashMap<String, MemoryRow>, capacity: usize) {
    if map.len() <= capacity {
        return;
    }
    let mut by_age: Vec<&MemoryRow> = map.values().collect();
    by_age.sort_by(|a, b| newest_first(a, b));
    let stale: Vec<String> = by_age
        .into_iter()
        .skip(capacity)
        .map(|row| row.id.clone())
        .collect();
    for id in stale {
        map.remove(&id);
    }
}

/// Map local kinds onto the remote collaborator's scope vocabulary.
pub fn remote_scope_for(kinds: &[MemoryKind]) -> SearchScope {
    let mut scopes = Vec::new();
    if kinds
        .iter()
        .any(|k| matches!(k, MemoryKind::Entry | MemoryKind::Pref))
    {
        scopes.push(RemoteScope::Entry);
    }
    if kinds.contains(&MemoryKind::Goal) {
        scopes.push(RemoteScope::Goal);
    }
    if kinds
        .iter()
        .any(|k| matches!(k, MemoryKind::Schedule | MemoryKind::Event))
    {
        scopes.push(RemoteScope::Schedule);
    }
    if scopes.is_empty() {
        SearchScope::All
    } else {
        SearchScope::Kinds(scopes)
    }
}

/// Remote scope implied by an intent label: goal and schedule words narrow
/// it, journal/reflection words (or nothing) select entries.
pub fn scope_for_intent(label: &str) -> SearchScope {
    let label = label.to_lowercase();
    let mut scopes = Vec::new();
    if label.contains("goal") {
        scopes.push(RemoteScope::Goal);
    }
    if label.contains("schedule") || label.contains("calendar") {
        scopes.push(RemoteScope::Schedule);
    }
    if scopes.is_empty() || label.contains("journal") || label.contains("reflect") {
        scopes.push(RemoteScope::Entry);
    }
    SearchScope::Kinds(scopes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use riflett_test_utils::{MemoryKeyValueStore, ScriptedRemoteSearch, StaticIdentity};

    fn volatile_store() -> MemoryStore {
        MemoryStore::builder(MemoryConfig::default()).build()
    }

    fn hit(id: &str, kind: &str, score: f32, snippet: &str) -> RemoteHit {
        RemoteHit {
            id: id.into(),
            kind: kind.into(),
            score,
            title: None,
            snippet: snippet.into(),
        }
    }

    #[tokio::test]
    async fn self_query_scores_one() {
        let store = volatile_store();
        store
            .upsert(NewRow::new("entry:1", MemoryKind::Entry, "ran five miles at dawn"))
            .await;
        let results = store
            .search_top_n("ran five miles at dawn", &[MemoryKind::Entry], 5)
            .await;
        assert_eq!(results.len(), 1);
        assert!((results[0].score - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn results_are_bounded_and_sorted() {
        let store = volatile_store();
        for i in 0..12 {
            store
                .upsert(NewRow::new(format!("entry:{i}"), MemoryKind::Entry, format!("note number {i}")).at(i))
                .await;
        }
        let results = store.search_top_n("note number 3", &[], 4).await;
        assert_eq!(results.len(), 4);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(results[0].row.id, "entry:3");
    }

    #[tokio::test]
    async fn kinds_filter_and_empty_query() {
        let store = volatile_store();
        store.upsert(NewRow::new("goal:1", MemoryKind::Goal, "learn piano")).await;
        store.upsert(NewRow::new("entry:1", MemoryKind::Entry, "learn piano")).await;

        let goals = store.search_top_n("learn piano", &[MemoryKind::Goal], 5).await;
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].row.kind, MemoryKind::Goal);
        assert!(store.search_top_n("   ", &[], 5).await.is_empty());
    }

    #[tokio::test]
    async fn top_k_is_clamped() {
        let store = volatile_store();
        for i in 0..30 {
            store
                .upsert(NewRow::new(format!("entry:{i}"), MemoryKind::Entry, format!("t{i}")))
                .await;
        }
        assert_eq!(store.search_top_n("t", &[], 0).await.len(), 1);
        assert_eq!(store.search_top_n("t", &[], 100).await.len(), 20);
    }

    #[tokio::test]
    async fn ties_keep_recency_order() {
        let store = volatile_store();
        let v = vec![1.0, 0.0];
        store
            .upsert(NewRow::new("entry:old", MemoryKind::Entry, "a").at(1).with_embedding(v.clone()))
            .await;
        store
            .upsert(NewRow::new("entry:new", MemoryKind::Entry, "b").at(2).with_embedding(v))
            .await;
        let ranked = store.rank_local(&[1.0, 0.0], &[]).await;
        assert_eq!(ranked[0].row.id, "entry:new");
        assert_eq!(ranked[1].row.id, "entry:old");
    }

    #[tokio::test]
    async fn equal_timestamps_rank_by_id() {
        let store = volatile_store();
        let v = vec![1.0, 0.0];
        for id in ["entry:c", "entry:a", "entry:b"] {
            store
                .upsert(NewRow::new(id, MemoryKind::Entry, id).at(7).with_embedding(v.clone()))
                .await;
        }
        for _ in 0..3 {
            let ids: Vec<_> = store
                .rank_local(&[1.0, 0.0], &[])
                .await
                .into_iter()
                .map(|r| r.row.id)
                .collect();
            assert_eq!(ids, ["entry:a", "entry:b", "entry:c"]);
        }
    }

    #[tokio::test]
    async fn upsert_normalizes_supplied_embedding() {
        let store = volatile_store();
        let row = store
            .upsert(NewRow::new("pref:1", MemoryKind::Pref, "x").with_embedding(vec![3.0, 4.0]))
            .await;
        assert_eq!(row.embedding, vec![0.6, 0.8]);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let store = volatile_store();
        store.upsert(NewRow::new("entry:1", MemoryKind::Entry, "hello")).await;
        store.remove("entry:1").await;
        store.remove("entry:1").await;
        assert!(store.search_top_n("hello", &[], 5).await.is_empty());
    }

    #[tokio::test]
    async fn volatile_tier_caps_rows() {
        let config = MemoryConfig {
            snapshot_capacity: 3,
            ..MemoryConfig::default()
        };
        let store = MemoryStore::builder(config).build();
        for i in 0..5 {
            store
                .upsert(NewRow::new(format!("entry:{i}"), MemoryKind::Entry, "same").at(i))
                .await;
        }
        let health = store.health().await;
        assert_eq!(health.tier, TierKind::Volatile);
        assert_eq!(health.rows, 3);
        let ids: Vec<_> = store
            .search_top_n("same", &[], 10)
            .await
            .into_iter()
            .map(|r| r.row.id)
            .collect();
        assert!(!ids.contains(&"entry:0".to_string()));
    }

    #[tokio::test]
    async fn remote_results_replace_local_and_are_cached() {
        let remote = Arc::new(ScriptedRemoteSearch::with_hits(vec![
            hit("9", "goal", 0.7, "finish the thesis"),
            hit("4", "journal", 0.5, "wrote two pages"),
        ]));
        let store = MemoryStore::builder(MemoryConfig::default())
            .remote(remote.clone())
            .identity(Arc::new(StaticIdentity::user("u1")))
            .build();
        store.upsert(NewRow::new("entry:local", MemoryKind::Entry, "thesis")).await;

        let results = store.search_top_n("thesis", &[MemoryKind::Goal], 5).await;
        let ids: Vec<_> = results.iter().map(|r| r.row.id.as_str()).collect();
        assert_eq!(ids, ["goal:9", "entry:4"]);
        assert_eq!(results[0].score, 0.7);
        assert!(results[0].row.ts > results[1].row.ts);

        let calls = remote.calls();
        assert_eq!(calls[0].user_id, "u1");
        assert_eq!(calls[0].scope, SearchScope::Kinds(vec![RemoteScope::Goal]));
        assert_eq!(store.health().await.rows, 3);
    }

    #[tokio::test]
    async fn remote_results_are_sorted_before_truncation() {
        let remote = Arc::new(ScriptedRemoteSearch::with_hits(vec![
            hit("1", "entry", 0.2, "low"),
            hit("2", "entry", 0.9, "high"),
            hit("3", "entry", 0.5, "middle"),
        ]));
        let store = MemoryStore::builder(MemoryConfig::default())
            .remote(remote)
            .identity(Arc::new(StaticIdentity::user("u1")))
            .build();

        let scores: Vec<f32> = store
            .search_top_n("q", &[], 5)
            .await
            .iter()
            .map(|r| r.score)
            .collect();
        assert_eq!(scores, [0.9, 0.5, 0.2]);
    }

    #[tokio::test]
    async fn remote_failure_falls_back_to_local() {
        let store = MemoryStore::builder(MemoryConfig::default())
            .remote(Arc::new(ScriptedRemoteSearch::failing()))
            .identity(Arc::new(StaticIdentity::user("u1")))
            .build();
        store.upsert(NewRow::new("entry:1", MemoryKind::Entry, "garden")).await;
        let results = store.search_top_n("garden", &[], 5).await;
        assert_eq!(results[0].row.id, "entry:1");
    }

    #[tokio::test]
    async fn remote_skipped_without_identity() {
        let remote = Arc::new(ScriptedRemoteSearch::with_hits(vec![hit("1", "entry", 0.9, "x")]));
        let store = MemoryStore::builder(MemoryConfig::default())
            .remote(remote.clone())
            .identity(Arc::new(StaticIdentity::anonymous()))
            .build();
        store.search_top_n("anything", &[], 5).await;
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn brief_requires_identity() {
        let store = volatile_store();
        let err = store.get_brief(None, "entry_create", "hi", None).await.unwrap_err();
        assert!(matches!(err, RiflettError::NotAuthenticated));
    }

    #[tokio::test]
    async fn brief_clamps_limit_and_infers_scope() {
        let remote = Arc::new(ScriptedRemoteSearch::with_hits(vec![hit("1", "goal", 0.8, "run")]));
        let store = MemoryStore::builder(MemoryConfig::default())
            .remote(remote.clone())
            .build();
        let brief = store
            .get_brief(Some("u2"), "goal_check", "how am I doing", Some(1))
            .await
            .unwrap();
        assert_eq!(brief.records.len(), 1);
        assert_eq!(brief.operating_picture.cadence_profile.cadence, "none");

        let calls = remote.calls();
        assert_eq!(calls[0].limit, 3);
        assert_eq!(calls[0].scope, SearchScope::Kinds(vec![RemoteScope::Goal]));
    }

    #[tokio::test]
    async fn near_duplicate_uses_dedupe_threshold() {
        let store = volatile_store();
        store.upsert(NewRow::new("goal:1", MemoryKind::Goal, "read twelve books this year")).await;
        let dup = store
            .find_near_duplicate("read twelve books this year", MemoryKind::Goal)
            .await;
        assert_eq!(dup.map(|r| r.row.id), Some("goal:1".to_string()));
        assert!(
            store
                .find_near_duplicate("completely unrelated words", MemoryKind::Goal)
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn flat_tier_persists_across_instances() {
        let flat = Arc::new(MemoryKeyValueStore::new());
        let first = MemoryStore::builder(MemoryConfig::default())
            .flat(flat.clone())
            .build();
        first.upsert(NewRow::new("entry:1", MemoryKind::Entry, "kept")).await;
        assert_eq!(first.health().await.tier, TierKind::Flat);

        let second = MemoryStore::builder(MemoryConfig::default())
            .flat(flat)
            .build();
        let results = second.search_top_n("kept", &[], 5).await;
        assert_eq!(results[0].row.id, "entry:1");
    }

    #[test]
    fn kind_scope_mapping() {
        assert_eq!(remote_scope_for(&[]), SearchScope::All);
        assert_eq!(
            remote_scope_for(&[MemoryKind::Pref, MemoryKind::Event]),
            SearchScope::Kinds(vec![RemoteScope::Entry, RemoteScope::Schedule])
        );
    }

    #[test]
    fn intent_scope_inference() {
        assert_eq!(
            scope_for_intent("entry_create"),
            SearchScope::Kinds(vec![RemoteScope::Entry])
        );
        assert_eq!(
            scope_for_intent("Calendar goal review"),
            SearchScope::Kinds(vec![RemoteScope::Goal, RemoteScope::Schedule])
        );
        assert_eq!(
            scope_for_intent("goal reflection"),
            SearchScope::Kinds(vec![RemoteScope::Goal, RemoteScope::Entry])
        );
    }
}
