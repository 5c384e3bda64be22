//! Query dispatcher
//!
//! The single path every content query takes: cache lookup, then (on a miss)
//! a retried backend fetch, then cache population.

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

use crate::cache::{CacheKey, QueryCache};
use crate::data::{BackendError, ContentBackend, QueryParams};
use crate::logging::QueryLogger;
use crate::retry::{with_retry, RetryPolicy};

/// Routes content queries through the cache and retry layers
#[derive(Clone)]
pub struct QueryDispatcher {
    backend: Arc<dyn ContentBackend>,
    cache: Arc<QueryCache>,
    retry: RetryPolicy,
    logger: Arc<dyn QueryLogger>,
}

impl QueryDispatcher {
    pub fn new(
        backend: Arc<dyn ContentBackend>,
        cache: Arc<QueryCache>,
        retry: RetryPolicy,
        logger: Arc<dyn QueryLogger>,
    ) -> Self {
        Self {
            backend,
            cache,
            retry,
            logger,
        }
    }

    /// The cache shared by this dispatcher
    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Drops every cached result, e.g. after content was edited
    pub fn invalidate_all(&self) {
        self.cache.clear();
        self.logger.info("Cache cleared", &Value::Null);
    }

    /// Runs a query, answering from the cache when possible
    ///
    /// Passing `None` as the key bypasses the cache entirely. When every retry
    /// fails the last backend error is returned; a stale cached value is never
    /// used as a fallback.
    pub async fn dispatch(
        &self,
        key: Option<&CacheKey>,
        query: &str,
        params: &QueryParams,
    ) -> Result<Value, BackendError> {
        if let Some(key) = key {
            if let Some(cached) = self.cache.get_entry(key) {
                self.logger.info(
                    "Cache hit",
                    &json!({ "key": key.to_string(), "cached_at": cached.cached_at.to_rfc3339() }),
                );
                return Ok(cached.data);
            }
        }

        let started = Instant::now();
        let backend = &self.backend;
        let result = with_retry(&self.retry, self.logger.as_ref(), || {
            backend.fetch(query, params)
        })
        .await?;

        if let Some(key) = key {
            self.cache.set(key.clone(), result.clone());
        }

        self.logger.info(
            "Query completed",
            &json!({
                "key": key.map(ToString::to_string),
                "duration_ms": started.elapsed().as_millis() as u64,
                "result_size": result_size(&result),
            }),
        );

        Ok(result)
    }
}

/// Number of documents in a query result
///
/// Arrays count their elements, `null` counts as nothing and any other value
/// is a single document.
pub fn result_size(value: &Value) -> usize {
    match value {
        Value::Array(items) => items.len(),
        Value::Null => 0,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{Collection, ManualClock};
    use crate::logging::{LogLevel, RecordingLogger};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Backend that replays scripted responses and counts calls
    struct ScriptedBackend {
        responses: parking_lot::Mutex<VecDeque<Result<Value, BackendError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn new(responses: Vec<Result<Value, BackendError>>) -> Self {
            Self {
                responses: parking_lot::Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ContentBackend for ScriptedBackend {
        async fn fetch(&self, _query: &str, _params: &QueryParams) -> Result<Value, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(api_error("script exhausted")))
        }
    }

    fn api_error(message: &str) -> BackendError {
        BackendError::Api {
            status: 503,
            message: message.to_string(),
        }
    }

    fn setup(
        responses: Vec<Result<Value, BackendError>>,
    ) -> (QueryDispatcher, Arc<ScriptedBackend>, Arc<RecordingLogger>) {
        let backend = Arc::new(ScriptedBackend::new(responses));
        let logger = Arc::new(RecordingLogger::new());
        let clock = Arc::new(ManualClock::default());
        let cache = Arc::new(QueryCache::with_clock(Duration::from_secs(300), clock));
        let retry = RetryPolicy::new(3, Duration::ZERO);
        let dispatcher = QueryDispatcher::new(backend.clone(), cache, retry, logger.clone());
        (dispatcher, backend, logger)
    }

    #[tokio::test]
    async fn test_cache_hit_skips_backend() {
        let (dispatcher, backend, logger) = setup(vec![]);
        let key = CacheKey::All(Collection::Project);
        dispatcher.cache().set(key.clone(), json!([{ "title": "cached" }]));

        let result = dispatcher
            .dispatch(Some(&key), "*", &QueryParams::new())
            .await
            .unwrap();

        assert_eq!(result, json!([{ "title": "cached" }]));
        assert_eq!(backend.calls(), 0);
        assert_eq!(logger.records()[0].message, "Cache hit");
    }

    #[tokio::test]
    async fn test_miss_fetches_and_populates_cache() {
        let (dispatcher, backend, _logger) = setup(vec![Ok(json!({ "title": "X" }))]);
        let key = CacheKey::document(Collection::Project, "p-1");

        let result = dispatcher
            .dispatch(Some(&key), "*", &QueryParams::new())
            .await
            .unwrap();

        assert_eq!(result, json!({ "title": "X" }));
        assert_eq!(backend.calls(), 1);
        assert_eq!(dispatcher.cache().get(&key), Some(json!({ "title": "X" })));
    }

    #[tokio::test]
    async fn test_no_key_bypasses_cache() {
        let (dispatcher, backend, _logger) = setup(vec![Ok(json!(1)), Ok(json!(2))]);

        let first = dispatcher.dispatch(None, "*", &QueryParams::new()).await.unwrap();
        let second = dispatcher.dispatch(None, "*", &QueryParams::new()).await.unwrap();

        assert_eq!(first, json!(1));
        assert_eq!(second, json!(2));
        assert_eq!(backend.calls(), 2);
        assert!(dispatcher.cache().is_empty());
    }

    #[tokio::test]
    async fn test_exhausted_retries_return_last_error_and_leave_cache_empty() {
        let (dispatcher, backend, _logger) = setup(vec![
            Err(api_error("first")),
            Err(api_error("second")),
            Err(api_error("third")),
        ]);
        let key = CacheKey::Recent;

        let err = dispatcher
            .dispatch(Some(&key), "*", &QueryParams::new())
            .await
            .unwrap_err();

        assert!(matches!(err, BackendError::Api { ref message, .. } if message == "third"));
        assert_eq!(backend.calls(), 3);
        assert!(dispatcher.cache().get(&key).is_none());
    }

    #[tokio::test]
    async fn test_completed_query_logs_duration_and_size() {
        let (dispatcher, _backend, logger) = setup(vec![Ok(json!([1, 2, 3]))]);

        dispatcher
            .dispatch(Some(&CacheKey::Recent), "*", &QueryParams::new())
            .await
            .unwrap();

        let record = logger.records().pop().unwrap();
        assert_eq!(record.level, LogLevel::Info);
        assert_eq!(record.message, "Query completed");
        assert_eq!(record.context["key"], "recent-content");
        assert_eq!(record.context["result_size"], 3);
        assert!(record.context["duration_ms"].is_u64());
    }

    #[tokio::test]
    async fn test_invalidate_all_forces_refetch() {
        let (dispatcher, backend, _logger) = setup(vec![Ok(json!("a")), Ok(json!("b"))]);
        let key = CacheKey::Singleton(Collection::About);

        dispatcher.dispatch(Some(&key), "*", &QueryParams::new()).await.unwrap();
        dispatcher.invalidate_all();
        let second = dispatcher.dispatch(Some(&key), "*", &QueryParams::new()).await.unwrap();

        assert_eq!(second, json!("b"));
        assert_eq!(backend.calls(), 2);
    }

    #[test]
    fn test_result_size() {
        assert_eq!(result_size(&json!([1, 2])), 2);
        assert_eq!(result_size(&json!([])), 0);
        assert_eq!(result_size(&Value::Null), 0);
        assert_eq!(result_size(&json!({ "a": 1 })), 1);
    }
}
