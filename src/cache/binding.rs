//! Reactive Query Binding Module
//!
//! A view-facing handle over [`QueryCache`]: it exposes the last loaded
//! value, a loading flag and the last error as one observable snapshot, and
//! re-fetches when asked or when its key changes. The shape is what a
//! dashboard widget needs: render cached data immediately when a fresh entry
//! exists, otherwise show a spinner while the producer runs, and keep
//! showing the previous data during refreshes.
//!
//! Fetches run on spawned tasks and are never cancelled: dropping a binding
//! lets an in-flight fetch finish and land in the cache, where the next
//! mount benefits from it. The published state always tracks the newest
//! load, so a slow fetch superseded by a re-key or refetch still writes to
//! the cache but no longer touches `data`, `error` or `loading`.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

use crate::cache::{CacheStore, QueryCache};

type BoxedProducer<V, E> =
    Arc<dyn Fn() -> Pin<Box<dyn Future<Output = Result<V, E>> + Send>> + Send + Sync>;

// == Query State ==
/// Observable snapshot published by a [`QueryBinding`].
///
/// Errors are shared behind `Arc` so snapshots stay cloneable without
/// requiring `Clone` of the error type.
#[derive(Debug)]
pub struct QueryState<V, E> {
    /// Last successfully loaded value, if any. Kept through refreshes and
    /// failures so views never blank out.
    pub data: Option<V>,
    /// Failure of the most recent fetch, cleared when a new fetch starts.
    pub error: Option<Arc<E>>,
    /// True while a fetch for the current key is outstanding.
    pub loading: bool,
}

impl<V: Clone, E> Clone for QueryState<V, E> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            error: self.error.clone(),
            loading: self.loading,
        }
    }
}

impl<V, E> Default for QueryState<V, E> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            loading: false,
        }
    }
}

// == Query Binding ==
/// Binds one cache key and its producer to an observable query state.
///
/// Mounting with a fresh cached entry settles immediately as a success
/// without a loading transition and without invoking the producer;
/// otherwise the state goes through loading and settles when the spawned
/// fetch completes.
pub struct QueryBinding<S: CacheStore, E> {
    cache: QueryCache<S>,
    key: String,
    ttl: Option<Duration>,
    producer: BoxedProducer<S::Value, E>,
    state: Arc<watch::Sender<QueryState<S::Value, E>>>,
    /// Bumped on every load; a fetch only publishes its result while it is
    /// still the newest one, so a slow fetch for a previous key cannot
    /// overwrite the state after a re-key.
    generation: Arc<AtomicU64>,
}

impl<S, E> QueryBinding<S, E>
where
    S: CacheStore,
    S::Value: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    // == Mount ==
    /// Binds `key` to `producer` and performs the initial load.
    ///
    /// A `None` TTL means the cache's configured default, applied to every
    /// store this binding performs.
    pub async fn mount<F, Fut>(
        cache: QueryCache<S>,
        key: impl Into<String>,
        ttl: Option<Duration>,
        producer: F,
    ) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<S::Value, E>> + Send + 'static,
    {
        let (tx, _) = watch::channel(QueryState::default());
        let binding = Self {
            cache,
            key: key.into(),
            ttl,
            producer: box_producer(producer),
            state: Arc::new(tx),
            generation: Arc::new(AtomicU64::new(0)),
        };
        binding.load(false).await;
        binding
    }

    // == Refetch ==
    /// Re-runs the query bypassing freshness: the producer always runs and
    /// its result overwrites the cache entry.
    ///
    /// Returns once the fetch has been started; observe completion through
    /// [`settled`](Self::settled) or [`subscribe`](Self::subscribe).
    pub async fn refetch(&self) {
        self.load(true).await;
    }

    // == Set Key ==
    /// Points the binding at a new key and the producer that matches it,
    /// then re-runs the query.
    ///
    /// This is the "identifying parameter became known" path: a binding
    /// mounted before sign-in can be re-keyed once the user id exists.
    pub async fn set_key<F, Fut>(&mut self, key: impl Into<String>, producer: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<S::Value, E>> + Send + 'static,
    {
        self.key = key.into();
        self.producer = box_producer(producer);
        self.load(false).await;
    }

    // == Accessors ==
    /// Current snapshot.
    pub fn state(&self) -> QueryState<S::Value, E> {
        self.state.borrow().clone()
    }

    /// Last successfully loaded value.
    pub fn data(&self) -> Option<S::Value> {
        self.state.borrow().data.clone()
    }

    /// True while a fetch for the current key is outstanding.
    pub fn loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Failure of the most recent fetch, if it failed.
    pub fn error(&self) -> Option<Arc<E>> {
        self.state.borrow().error.clone()
    }

    /// The key currently bound.
    pub fn key(&self) -> &str {
        &self.key
    }

    // == Subscribe ==
    /// Watch receiver over state snapshots, for consumers that re-render on
    /// change.
    pub fn subscribe(&self) -> watch::Receiver<QueryState<S::Value, E>> {
        self.state.subscribe()
    }

    // == Settled ==
    /// Waits until no fetch is outstanding and returns the snapshot.
    pub async fn settled(&self) -> QueryState<S::Value, E> {
        let mut rx = self.state.subscribe();
        let state = rx
            .wait_for(|state| !state.loading)
            // The sender lives in `self`, the channel cannot close here.
            .await
            .expect("binding state channel closed");
        state.clone()
    }

    // == Load ==
    /// Serves from cache unless `bypass`, then spawns the producer fetch.
    async fn load(&self, bypass: bool) {
        // Supersede any in-flight fetch: its late result may still land in
        // the cache, but it no longer drives this binding's state.
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if !bypass {
            if let Some(value) = self.cache.get(&self.key).await {
                // Fresh entry: settle directly, no loading transition.
                self.state.send_replace(QueryState {
                    data: Some(value),
                    error: None,
                    loading: false,
                });
                return;
            }
        }

        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        let cache = self.cache.clone();
        let key = self.key.clone();
        let ttl = self.ttl;
        let producer = Arc::clone(&self.producer);
        let state = Arc::clone(&self.state);
        let generations = Arc::clone(&self.generation);

        // Spawned, not awaited: dropping the binding does not abort the
        // fetch, and a late result still lands under last-write-wins.
        tokio::spawn(async move {
            let result = cache.refresh(&key, ttl, || producer()).await;

            // A newer load has taken over the state; the cache write above
            // already happened, which is all a superseded fetch owes.
            if generations.load(Ordering::SeqCst) != generation {
                debug!("query '{}' superseded, discarding stale binding update", key);
                return;
            }

            match result {
                Ok(value) => state.send_modify(|s| {
                    s.data = Some(value);
                    s.error = None;
                    s.loading = false;
                }),
                Err(err) => {
                    debug!("query '{}' failed, surfacing error to binding", key);
                    state.send_modify(|s| {
                        s.error = Some(Arc::new(err));
                        s.loading = false;
                    });
                }
            }
        });
    }
}

fn box_producer<V, E, F, Fut>(producer: F) -> BoxedProducer<V, E>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<V, E>> + Send + 'static,
{
    Arc::new(move || {
        Box::pin(producer()) as Pin<Box<dyn Future<Output = Result<V, E>> + Send>>
    })
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::sleep;

    fn new_cache() -> QueryCache<MemoryStore<String>> {
        QueryCache::with_defaults()
    }

    #[tokio::test]
    async fn test_mount_cold_goes_through_loading() {
        let cache = new_cache();

        let binding: QueryBinding<_, String> =
            QueryBinding::mount(cache, "greeting_u1", None, || async {
                sleep(Duration::from_millis(50)).await;
                Ok("hello".to_string())
            })
            .await;

        assert!(binding.loading());
        assert_eq!(binding.data(), None);

        let state = binding.settled().await;
        assert_eq!(state.data, Some("hello".to_string()));
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_mount_warm_settles_without_loading() {
        let cache = new_cache();
        cache.set("greeting_u1", "cached".to_string(), None).await;
        let calls = Arc::new(AtomicUsize::new(0));

        let producer_calls = Arc::clone(&calls);
        let binding: QueryBinding<_, String> =
            QueryBinding::mount(cache, "greeting_u1", None, move || {
                let calls = Arc::clone(&producer_calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("fetched".to_string())
                }
            })
            .await;

        assert!(!binding.loading());
        assert_eq!(binding.data(), Some("cached".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_refetch_bypasses_fresh_entry() {
        let cache = new_cache();
        cache.set("greeting_u1", "cached".to_string(), None).await;
        let calls = Arc::new(AtomicUsize::new(0));

        let producer_calls = Arc::clone(&calls);
        let binding: QueryBinding<_, String> =
            QueryBinding::mount(cache.clone(), "greeting_u1", None, move || {
                let calls = Arc::clone(&producer_calls);
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    Ok(format!("fetched-{}", n))
                }
            })
            .await;

        // Warm mount did not invoke the producer.
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        binding.refetch().await;
        let state = binding.settled().await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(state.data, Some("fetched-1".to_string()));
        assert_eq!(cache.get("greeting_u1").await, Some("fetched-1".to_string()));
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_data() {
        let cache = new_cache();
        let calls = Arc::new(AtomicUsize::new(0));

        let producer_calls = Arc::clone(&calls);
        let binding: QueryBinding<_, String> =
            QueryBinding::mount(cache.clone(), "greeting_u1", None, move || {
                let calls = Arc::clone(&producer_calls);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Ok("first".to_string())
                    } else {
                        Err("backend down".to_string())
                    }
                }
            })
            .await;

        let state = binding.settled().await;
        assert_eq!(state.data, Some("first".to_string()));

        binding.refetch().await;
        let state = binding.settled().await;

        assert_eq!(state.data, Some("first".to_string()));
        assert_eq!(state.error.as_deref(), Some(&"backend down".to_string()));
        // The failed refresh also left the cache entry alone.
        assert_eq!(cache.get("greeting_u1").await, Some("first".to_string()));
    }

    #[tokio::test]
    async fn test_set_key_reruns_query() {
        let cache = new_cache();

        let mut binding: QueryBinding<_, String> =
            QueryBinding::mount(cache.clone(), "greeting_en", None, || async {
                Ok("hello".to_string())
            })
            .await;
        binding.settled().await;

        binding
            .set_key("greeting_fr", || async { Ok("bonjour".to_string()) })
            .await;
        let state = binding.settled().await;

        assert_eq!(binding.key(), "greeting_fr");
        assert_eq!(state.data, Some("bonjour".to_string()));
        // Both keys are cached now.
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_set_key_serves_fresh_entry_without_producer() {
        let cache = new_cache();
        cache.set("greeting_fr", "bonjour".to_string(), None).await;
        let calls = Arc::new(AtomicUsize::new(0));

        let mut binding: QueryBinding<_, String> =
            QueryBinding::mount(cache, "greeting_en", None, || async {
                Ok("hello".to_string())
            })
            .await;
        binding.settled().await;

        let producer_calls = Arc::clone(&calls);
        binding
            .set_key("greeting_fr", move || {
                let calls = Arc::clone(&producer_calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("refetched".to_string())
                }
            })
            .await;

        assert!(!binding.loading());
        assert_eq!(binding.data(), Some("bonjour".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_superseded_fetch_does_not_overwrite_rekeyed_state() {
        let cache = new_cache();
        cache.set("greeting_fr", "bonjour".to_string(), None).await;

        // Cold mount starts a slow fetch for the old key.
        let mut binding: QueryBinding<_, String> =
            QueryBinding::mount(cache.clone(), "greeting_en", None, || async {
                sleep(Duration::from_millis(60)).await;
                Ok("hello".to_string())
            })
            .await;
        assert!(binding.loading());

        // Re-keying to a fresh entry settles immediately.
        binding
            .set_key("greeting_fr", || async { Ok("refetched".to_string()) })
            .await;
        assert_eq!(binding.data(), Some("bonjour".to_string()));
        assert!(!binding.loading());

        sleep(Duration::from_millis(120)).await;

        // The old fetch finished and landed in the cache, but the binding
        // state still belongs to the new key.
        assert_eq!(binding.data(), Some("bonjour".to_string()));
        assert!(!binding.loading());
        assert!(binding.error().is_none());
        assert_eq!(cache.get("greeting_en").await, Some("hello".to_string()));
    }

    #[tokio::test]
    async fn test_dropping_binding_does_not_cancel_fetch() {
        let cache = new_cache();

        let binding: QueryBinding<_, String> =
            QueryBinding::mount(cache.clone(), "slow_key", None, || async {
                sleep(Duration::from_millis(50)).await;
                Ok("late".to_string())
            })
            .await;
        drop(binding);

        sleep(Duration::from_millis(120)).await;

        // The spawned fetch finished and populated the cache anyway.
        assert_eq!(cache.get("slow_key").await, Some("late".to_string()));
    }

    #[tokio::test]
    async fn test_subscribe_sees_transitions() {
        let cache = new_cache();
        let binding: QueryBinding<_, String> =
            QueryBinding::mount(cache, "greeting_u1", None, || async {
                sleep(Duration::from_millis(30)).await;
                Ok("hello".to_string())
            })
            .await;

        let mut rx = binding.subscribe();
        assert!(rx.borrow().loading);

        let settled = rx
            .wait_for(|state| !state.loading)
            .await
            .expect("channel closed");
        assert_eq!(settled.data, Some("hello".to_string()));
    }
}
