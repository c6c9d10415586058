//! # Token Store
//!
//! Owns the issued-token collection. The persisted form is the full ordered
//! collection as a JSON array under [`TOKEN_COLLECTION_KEY`]; the in-memory
//! form is the same records plus an index keyed by token value.
//!
//! ## Lifecycle
//!
//! 1. [`TokenStore::initialize`] loads the collection, writing an empty one
//!    if none exists. Running it again over the same backend is harmless.
//! 2. [`TokenStore::append_token`], [`TokenStore::check`],
//!    [`TokenStore::sweep_expired`] while serving.
//! 3. [`TokenStore::flush`] on shutdown.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tollgate_core::{AccessToken, TokenRecord};

use crate::backend::KeyValueBackend;
use crate::error::{BackendError, StoreError};

/// Well-known key the token collection is persisted under.
pub const TOKEN_COLLECTION_KEY: &str = "token";

/// Store tuning.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Key the collection is persisted under.
    pub key: String,
    /// Upper bound on any single backend call.
    pub timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            key: TOKEN_COLLECTION_KEY.to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Outcome of looking up a presented token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    /// No tokens have been issued (or all were swept).
    Empty,
    /// The token exists and has not expired.
    Valid,
    /// Tokens exist, but none matches the presented value unexpired.
    Invalid,
}

/// In-memory mirror of the persisted collection.
#[derive(Debug, Default)]
struct TokenTable {
    records: Vec<TokenRecord>,
    /// Latest expiry per token value. Duplicate values collapse to the
    /// furthest expiry, which validates exactly when any duplicate would.
    index: HashMap<AccessToken, i64>,
}

impl TokenTable {
    fn from_records(records: Vec<TokenRecord>) -> Self {
        let mut table = Self::default();
        for record in records {
            table.push(record);
        }
        table
    }

    fn push(&mut self, record: TokenRecord) {
        self.index
            .entry(record.value.clone())
            .and_modify(|exp| *exp = (*exp).max(record.expires_at_millis))
            .or_insert(record.expires_at_millis);
        self.records.push(record);
    }
}

/// The durable keeper of issued-token records.
///
/// Cloning is cheap; clones share the backend, the index, and the writer
/// lock.
#[derive(Debug, Clone)]
pub struct TokenStore {
    backend: Arc<dyn KeyValueBackend>,
    options: StoreOptions,
    table: Arc<RwLock<TokenTable>>,
    writer: Arc<Mutex<()>>,
}

impl TokenStore {
    /// Acquire the backend and load the token collection.
    ///
    /// A missing, empty, or `null` collection is replaced with an empty
    /// array. A collection that exists but does not decode is an error.
    pub async fn initialize(
        backend: Arc<dyn KeyValueBackend>,
        options: StoreOptions,
    ) -> Result<Self, StoreError> {
        let key = options.key.clone();
        let raw = run_backend(&backend, options.timeout, "get", move |b| b.get(&key)).await?;

        let records = match raw.as_deref().map(|bytes| decode(&options.key, bytes)) {
            Some(Ok(Some(records))) => records,
            Some(Err(e)) => return Err(e),
            None | Some(Ok(None)) => {
                let key = options.key.clone();
                let empty = encode(&[])?;
                run_backend(&backend, options.timeout, "set", move |b| b.set(&key, &empty))
                    .await?;
                tracing::info!(key = %options.key, "created empty token collection");
                Vec::new()
            }
        };

        tracing::info!(key = %options.key, tokens = records.len(), "token store initialized");

        Ok(Self {
            backend,
            options,
            table: Arc::new(RwLock::new(TokenTable::from_records(records))),
            writer: Arc::new(Mutex::new(())),
        })
    }

    /// The full current collection, in issue order.
    pub fn list_tokens(&self) -> Vec<TokenRecord> {
        self.table.read().records.clone()
    }

    /// Number of stored records, expired ones included.
    pub fn len(&self) -> usize {
        self.table.read().records.len()
    }

    /// Whether no records are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append one record and durably commit the collection before returning.
    ///
    /// The read-modify-write runs under the writer lock. The in-memory index
    /// is only updated once the backend write has succeeded, so a failed
    /// append leaves no trace. No duplicate check is made.
    ///
    /// A write that outlives the timeout is reported as
    /// [`StoreError::Timeout`] but keeps the writer lock until the backend
    /// call returns. If that late write succeeds the record is committed,
    /// and the next writer builds on it.
    pub async fn append_token(
        &self,
        value: AccessToken,
        expires_at_millis: i64,
    ) -> Result<TokenRecord, StoreError> {
        let record = TokenRecord::new(value, expires_at_millis);
        let guard = self.lock_writer().await?;

        let mut next = self.list_tokens();
        next.push(record.clone());
        let tokens = next.len();
        self.commit(guard, next).await?;

        tracing::debug!(
            expires_at = record.expires_at_millis,
            tokens,
            "token appended"
        );
        Ok(record)
    }

    /// Look up a presented token at `now_millis`.
    ///
    /// Expiry is inclusive: a token expiring at exactly `now_millis` is
    /// still valid.
    pub fn check(&self, token: &AccessToken, now_millis: i64) -> TokenStatus {
        let table = self.table.read();
        if table.records.is_empty() {
            return TokenStatus::Empty;
        }
        match table.index.get(token) {
            Some(&expires) if expires >= now_millis => TokenStatus::Valid,
            _ => TokenStatus::Invalid,
        }
    }

    /// Remove every record that expired before `now_millis`.
    ///
    /// Returns the number of records removed. Nothing is written when
    /// nothing expired.
    pub async fn sweep_expired(&self, now_millis: i64) -> Result<usize, StoreError> {
        let guard = self.lock_writer().await?;

        let current = self.list_tokens();
        let before = current.len();
        let retained: Vec<TokenRecord> = current
            .into_iter()
            .filter(|r| r.is_live_at(now_millis))
            .collect();
        let removed = before - retained.len();
        if removed == 0 {
            return Ok(0);
        }

        self.commit(guard, retained).await?;
        tracing::info!(removed, remaining = before - removed, "expired tokens swept");
        Ok(removed)
    }

    /// Rewrite the collection and flush the backend.
    pub async fn flush(&self) -> Result<(), StoreError> {
        let guard = self.lock_writer().await?;
        let records = self.list_tokens();
        let tokens = records.len();
        let bytes = encode(&records)?;
        let key = self.options.key.clone();
        run_backend(&self.backend, self.options.timeout, "flush", move |b| {
            let _guard = guard;
            b.set(&key, &bytes)?;
            b.flush()
        })
        .await?;
        tracing::info!(tokens, "token store flushed");
        Ok(())
    }

    /// Wait for the writer lock, bounded by the store timeout so a wedged
    /// backend cannot queue writers forever.
    async fn lock_writer(&self) -> Result<OwnedMutexGuard<()>, StoreError> {
        let timeout = self.options.timeout;
        tokio::time::timeout(timeout, Arc::clone(&self.writer).lock_owned())
            .await
            .map_err(|_| StoreError::Timeout {
                op: "lock",
                after: timeout,
            })
    }

    /// Persist `records`, then install them as the in-memory table.
    ///
    /// Both steps run inside the blocking task that owns `guard`, so the
    /// lock is released only once the backend call has returned, whether or
    /// not the caller is still waiting for it.
    async fn commit(
        &self,
        guard: OwnedMutexGuard<()>,
        records: Vec<TokenRecord>,
    ) -> Result<(), StoreError> {
        let bytes = encode(&records)?;
        let key = self.options.key.clone();
        let table = Arc::clone(&self.table);
        run_backend(&self.backend, self.options.timeout, "set", move |b| {
            let _guard = guard;
            b.set(&key, &bytes)?;
            *table.write() = TokenTable::from_records(records);
            Ok(())
        })
        .await
    }
}

/// Run a blocking backend call on the blocking pool, bounded by `timeout`.
async fn run_backend<T, F>(
    backend: &Arc<dyn KeyValueBackend>,
    timeout: Duration,
    op: &'static str,
    f: F,
) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce(&dyn KeyValueBackend) -> Result<T, BackendError> + Send + 'static,
{
    let backend = Arc::clone(backend);
    let task = tokio::task::spawn_blocking(move || f(backend.as_ref()));
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result.map_err(|source| StoreError::Backend { op, source }),
        Ok(Err(join)) => Err(StoreError::Task(join.to_string())),
        Err(_) => Err(StoreError::Timeout { op, after: timeout }),
    }
}

fn decode(key: &str, bytes: &[u8]) -> Result<Option<Vec<TokenRecord>>, StoreError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice::<Option<Vec<TokenRecord>>>(bytes).map_err(|source| {
        StoreError::Corrupt {
            key: key.to_string(),
            source,
        }
    })
}

fn encode(records: &[TokenRecord]) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(records).map_err(StoreError::Encode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::file::FileBackend;
    use std::collections::HashSet;

    fn token(s: &str) -> AccessToken {
        AccessToken::parse(s).unwrap()
    }

    async fn memory_store() -> (MemoryBackend, TokenStore) {
        let backend = MemoryBackend::new();
        let store = TokenStore::initialize(Arc::new(backend.clone()), StoreOptions::default())
            .await
            .unwrap();
        (backend, store)
    }

    fn persisted(backend: &MemoryBackend) -> serde_json::Value {
        let bytes = backend.get(TOKEN_COLLECTION_KEY).unwrap().unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Backend whose every call fails.
    #[derive(Debug)]
    struct BrokenBackend;

    impl KeyValueBackend for BrokenBackend {
        fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, BackendError> {
            Err(BackendError::Unavailable("disk on fire".into()))
        }
        fn set(&self, _key: &str, _value: &[u8]) -> Result<(), BackendError> {
            Err(BackendError::Unavailable("disk on fire".into()))
        }
    }

    /// Backend that reads fine but refuses writes after initialization.
    #[derive(Debug, Default)]
    struct ReadOnlyBackend {
        inner: MemoryBackend,
        locked: std::sync::atomic::AtomicBool,
    }

    impl KeyValueBackend for ReadOnlyBackend {
        fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BackendError> {
            self.inner.get(key)
        }
        fn set(&self, key: &str, value: &[u8]) -> Result<(), BackendError> {
            if self.locked.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(BackendError::Unavailable("read-only".into()));
            }
            self.inner.set(key, value)
        }
    }

    /// Backend whose reads hang longer than any sane timeout.
    #[derive(Debug)]
    struct SlowBackend;

    impl KeyValueBackend for SlowBackend {
        fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, BackendError> {
            std::thread::sleep(Duration::from_millis(500));
            Ok(None)
        }
        fn set(&self, _key: &str, _value: &[u8]) -> Result<(), BackendError> {
            Ok(())
        }
    }

    /// Backend whose next write stalls for `delay` once armed.
    #[derive(Debug)]
    struct StallOnceBackend {
        inner: MemoryBackend,
        armed: std::sync::atomic::AtomicBool,
        delay: Duration,
    }

    impl StallOnceBackend {
        fn new(delay: Duration) -> Self {
            Self {
                inner: MemoryBackend::new(),
                armed: std::sync::atomic::AtomicBool::new(false),
                delay,
            }
        }

        fn arm(&self) {
            self.armed.store(true, std::sync::atomic::Ordering::SeqCst);
        }
    }

    impl KeyValueBackend for StallOnceBackend {
        fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BackendError> {
            self.inner.get(key)
        }
        fn set(&self, key: &str, value: &[u8]) -> Result<(), BackendError> {
            if self.armed.swap(false, std::sync::atomic::Ordering::SeqCst) {
                std::thread::sleep(self.delay);
            }
            self.inner.set(key, value)
        }
    }

    const STALL: Duration = Duration::from_millis(300);
    const SHORT_TIMEOUT: Duration = Duration::from_millis(50);

    async fn stalling_store() -> (Arc<StallOnceBackend>, TokenStore) {
        let backend = Arc::new(StallOnceBackend::new(STALL));
        let options = StoreOptions {
            timeout: SHORT_TIMEOUT,
            ..StoreOptions::default()
        };
        let store = TokenStore::initialize(backend.clone(), options)
            .await
            .unwrap();
        (backend, store)
    }

    fn persisted_values(backend: &MemoryBackend) -> Vec<String> {
        let bytes = backend.get(TOKEN_COLLECTION_KEY).unwrap().unwrap();
        let records: Vec<TokenRecord> = serde_json::from_slice(&bytes).unwrap();
        records.into_iter().map(|r| r.value.into_string()).collect()
    }

    fn listed_values(store: &TokenStore) -> Vec<String> {
        store
            .list_tokens()
            .into_iter()
            .map(|r| r.value.into_string())
            .collect()
    }

    // ── initialize ───────────────────────────────────────────────

    #[tokio::test]
    async fn initialize_creates_empty_collection() {
        let (backend, store) = memory_store().await;
        assert!(store.is_empty());
        assert!(store.list_tokens().is_empty());
        assert_eq!(persisted(&backend), serde_json::json!([]));
    }

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let (backend, store) = memory_store().await;
        store.append_token(token("abc"), 10).await.unwrap();

        let again = TokenStore::initialize(Arc::new(backend.clone()), StoreOptions::default())
            .await
            .unwrap();
        assert_eq!(again.list_tokens().len(), 1);
        assert_eq!(again.list_tokens()[0].value, token("abc"));
    }

    #[tokio::test]
    async fn initialize_treats_null_and_blank_as_empty() {
        for raw in [&b"null"[..], &b""[..], &b"  \n"[..]] {
            let backend = MemoryBackend::new();
            backend.set(TOKEN_COLLECTION_KEY, raw).unwrap();
            let store = TokenStore::initialize(Arc::new(backend.clone()), StoreOptions::default())
                .await
                .unwrap();
            assert!(store.is_empty());
            assert_eq!(persisted(&backend), serde_json::json!([]));
        }
    }

    #[tokio::test]
    async fn initialize_loads_existing_collection() {
        let backend = MemoryBackend::new();
        backend
            .set(
                TOKEN_COLLECTION_KEY,
                br#"[{"token":"a","tokenExpire":100},{"token":"b","tokenExpire":"200"}]"#,
            )
            .unwrap();
        let store = TokenStore::initialize(Arc::new(backend), StoreOptions::default())
            .await
            .unwrap();
        let records = store.list_tokens();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].expires_at_millis, 200);
    }

    #[tokio::test]
    async fn initialize_rejects_corrupt_collection() {
        let backend = MemoryBackend::new();
        backend.set(TOKEN_COLLECTION_KEY, b"{not json").unwrap();
        let err = TokenStore::initialize(Arc::new(backend), StoreOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn initialize_surfaces_backend_failure() {
        let err = TokenStore::initialize(Arc::new(BrokenBackend), StoreOptions::default())
            .await
            .unwrap_err();
        assert!(
            matches!(err, StoreError::Backend { op: "get", .. }),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn initialize_times_out_on_slow_backend() {
        let options = StoreOptions {
            timeout: Duration::from_millis(20),
            ..StoreOptions::default()
        };
        let err = TokenStore::initialize(Arc::new(SlowBackend), options)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Timeout { op: "get", .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn custom_key_is_honoured() {
        let backend = MemoryBackend::new();
        let options = StoreOptions {
            key: "issued".into(),
            ..StoreOptions::default()
        };
        let store = TokenStore::initialize(Arc::new(backend.clone()), options)
            .await
            .unwrap();
        store.append_token(token("abc"), 1).await.unwrap();
        assert!(backend.get("issued").unwrap().is_some());
        assert!(backend.get(TOKEN_COLLECTION_KEY).unwrap().is_none());
    }

    // ── append / list ────────────────────────────────────────────

    #[tokio::test]
    async fn append_persists_before_returning() {
        let (backend, store) = memory_store().await;
        store.append_token(token("abc"), 1_000).await.unwrap();
        store.append_token(token("def"), 2_000).await.unwrap();

        assert_eq!(
            persisted(&backend),
            serde_json::json!([
                {"token": "abc", "tokenExpire": 1_000},
                {"token": "def", "tokenExpire": 2_000},
            ])
        );
        let listed: Vec<_> = store
            .list_tokens()
            .into_iter()
            .map(|r| r.value.into_string())
            .collect();
        assert_eq!(listed, vec!["abc", "def"]);
    }

    #[tokio::test]
    async fn append_does_not_deduplicate() {
        let (_backend, store) = memory_store().await;
        store.append_token(token("dup"), 1_000).await.unwrap();
        store.append_token(token("dup"), 500).await.unwrap();
        assert_eq!(store.len(), 2);
        // Either duplicate validating is enough.
        assert_eq!(store.check(&token("dup"), 900), TokenStatus::Valid);
    }

    #[tokio::test]
    async fn failed_append_leaves_no_trace() {
        let backend = Arc::new(ReadOnlyBackend::default());
        let store = TokenStore::initialize(backend.clone(), StoreOptions::default())
            .await
            .unwrap();
        store.append_token(token("kept"), 1_000).await.unwrap();

        backend.locked.store(true, std::sync::atomic::Ordering::SeqCst);
        let err = store.append_token(token("lost"), 1_000).await.unwrap_err();
        assert!(matches!(err, StoreError::Backend { op: "set", .. }), "got {err:?}");

        assert_eq!(store.len(), 1);
        assert_eq!(store.check(&token("lost"), 0), TokenStatus::Invalid);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_lose_nothing() {
        let (backend, store) = memory_store().await;

        let handles: Vec<_> = (0..64)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .append_token(AccessToken::generate(), i64::MAX)
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut issued = HashSet::new();
        for handle in handles {
            issued.insert(handle.await.unwrap().value);
        }
        assert_eq!(issued.len(), 64);
        assert_eq!(store.len(), 64);

        let reloaded = TokenStore::initialize(Arc::new(backend), StoreOptions::default())
            .await
            .unwrap();
        let stored: HashSet<_> = reloaded.list_tokens().into_iter().map(|r| r.value).collect();
        assert_eq!(stored, issued);
    }

    // ── write timeouts ───────────────────────────────────────────

    #[tokio::test]
    async fn timed_out_append_blocks_writers_until_it_lands() {
        let (backend, store) = stalling_store().await;

        backend.arm();
        let err = store.append_token(token("a"), 1_000).await.unwrap_err();
        assert!(matches!(err, StoreError::Timeout { op: "set", .. }), "got {err:?}");

        // The stalled write still owns the lock, so an overlapping append is
        // refused rather than acknowledged and later overwritten.
        let err = store.append_token(token("b"), 1_000).await.unwrap_err();
        assert!(matches!(err, StoreError::Timeout { op: "lock", .. }), "got {err:?}");

        tokio::time::sleep(STALL * 2).await;
        assert_eq!(persisted_values(&backend.inner), vec!["a"]);
        assert_eq!(listed_values(&store), vec!["a"]);

        store.append_token(token("c"), 1_000).await.unwrap();
        let reloaded = TokenStore::initialize(
            Arc::new(backend.inner.clone()),
            StoreOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(listed_values(&reloaded), vec!["a", "c"]);
        assert_eq!(listed_values(&store), vec!["a", "c"]);
    }

    #[tokio::test]
    async fn append_after_timed_out_write_is_durable() {
        let (backend, store) = stalling_store().await;

        backend.arm();
        assert!(store.append_token(token("slow"), 1_000).await.is_err());
        tokio::time::sleep(STALL * 2).await;

        store.append_token(token("acked"), 1_000).await.unwrap();
        assert_eq!(persisted_values(&backend.inner), vec!["slow", "acked"]);
        assert_eq!(store.check(&token("acked"), 0), TokenStatus::Valid);
    }

    #[tokio::test]
    async fn sweep_times_out_on_stalled_write() {
        let (backend, store) = stalling_store().await;
        store.append_token(token("old"), 1).await.unwrap();
        store.append_token(token("new"), 1_000).await.unwrap();

        backend.arm();
        let err = store.sweep_expired(10).await.unwrap_err();
        assert!(matches!(err, StoreError::Timeout { op: "set", .. }), "got {err:?}");

        tokio::time::sleep(STALL * 2).await;
        assert_eq!(persisted_values(&backend.inner), vec!["new"]);
        assert_eq!(listed_values(&store), vec!["new"]);
    }

    #[tokio::test]
    async fn flush_times_out_on_stalled_write() {
        let (backend, store) = stalling_store().await;
        store.append_token(token("abc"), 1_000).await.unwrap();

        backend.arm();
        let err = store.flush().await.unwrap_err();
        assert!(matches!(err, StoreError::Timeout { op: "flush", .. }), "got {err:?}");

        tokio::time::sleep(STALL * 2).await;
        store.flush().await.unwrap();
        assert_eq!(persisted_values(&backend.inner), vec!["abc"]);
    }

    // ── check ────────────────────────────────────────────────────

    #[tokio::test]
    async fn check_on_empty_store_is_empty() {
        let (_backend, store) = memory_store().await;
        assert_eq!(store.check(&token("abc"), 0), TokenStatus::Empty);
    }

    #[tokio::test]
    async fn check_expiry_boundary_is_inclusive() {
        let (_backend, store) = memory_store().await;
        store.append_token(token("abc"), 1_000).await.unwrap();
        assert_eq!(store.check(&token("abc"), 1_000), TokenStatus::Valid);
        assert_eq!(store.check(&token("abc"), 1_001), TokenStatus::Invalid);
    }

    #[tokio::test]
    async fn check_unknown_token_is_invalid() {
        let (_backend, store) = memory_store().await;
        store.append_token(token("abc"), 1_000).await.unwrap();
        assert_eq!(store.check(&token("xyz"), 0), TokenStatus::Invalid);
    }

    // ── sweep ────────────────────────────────────────────────────

    #[tokio::test]
    async fn sweep_removes_only_expired_records() {
        let (backend, store) = memory_store().await;
        store.append_token(token("old"), 100).await.unwrap();
        store.append_token(token("edge"), 200).await.unwrap();
        store.append_token(token("new"), 300).await.unwrap();

        let removed = store.sweep_expired(200).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.check(&token("old"), 0), TokenStatus::Invalid);
        assert_eq!(store.check(&token("edge"), 200), TokenStatus::Valid);
        assert_eq!(
            persisted(&backend),
            serde_json::json!([
                {"token": "edge", "tokenExpire": 200},
                {"token": "new", "tokenExpire": 300},
            ])
        );
    }

    #[tokio::test]
    async fn sweep_with_nothing_expired_is_noop() {
        let (_backend, store) = memory_store().await;
        store.append_token(token("abc"), 1_000).await.unwrap();
        assert_eq!(store.sweep_expired(0).await.unwrap(), 0);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn sweep_of_everything_leaves_empty_store() {
        let (_backend, store) = memory_store().await;
        store.append_token(token("abc"), 1).await.unwrap();
        assert_eq!(store.sweep_expired(10).await.unwrap(), 1);
        assert_eq!(store.check(&token("abc"), 10), TokenStatus::Empty);
    }

    // ── flush / file backend ─────────────────────────────────────

    #[tokio::test]
    async fn file_backed_store_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        {
            let backend = Arc::new(FileBackend::open(dir.path()).unwrap());
            let store = TokenStore::initialize(backend, StoreOptions::default())
                .await
                .unwrap();
            store.append_token(token("persisted"), 5_000).await.unwrap();
            store.flush().await.unwrap();
        }

        let backend = Arc::new(FileBackend::open(dir.path()).unwrap());
        let store = TokenStore::initialize(backend, StoreOptions::default())
            .await
            .unwrap();
        assert_eq!(store.check(&token("persisted"), 5_000), TokenStatus::Valid);
    }

    #[tokio::test]
    async fn flush_surfaces_backend_failure() {
        let backend = Arc::new(ReadOnlyBackend::default());
        let store = TokenStore::initialize(backend.clone(), StoreOptions::default())
            .await
            .unwrap();
        backend.locked.store(true, std::sync::atomic::Ordering::SeqCst);
        assert!(store.flush().await.is_err());
    }
}
