//! A metahub node.
//!
//! Serves the broadcast receiver endpoint peers announce changes to, and
//! wires the shared resource store, the local entity cache, the catalog and
//! the outbound broadcaster into one process with graceful shutdown.
//!
//! ```text
//! PUT /v1/cache/{entity_type}/{entity_name}/{event}   -> 200, or 400 on a bad token
//! GET /v1/cache/stats                                 -> cache and delivery counters
//! GET /v1/health
//! ```

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::NodeConfig;
pub use error::{ServerError, ServerResult};
pub use handler::{ReceiverCounters, ReceiverState, StatsResponse};
pub use server::MetahubNode;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::sync::{Arc, Mutex};

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use tower::util::ServiceExt;

    use metahub_cache::{BroadcastHandler, CacheError, CacheResult, CacheService, HandleOutcome};
    use metahub_store::{InMemoryResourceStore, ResourceStore};
    use metahub_types::{BroadcastEvent, EntityType, EventKind};

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<BroadcastEvent>>,
        fail: bool,
    }

    impl BroadcastHandler for Recorder {
        fn handle(&self, event: &BroadcastEvent) -> CacheResult<HandleOutcome> {
            self.seen.lock().expect("lock poisoned").push(event.clone());
            if self.fail {
                return Err(CacheError::NameMismatch {
                    entity_type: event.entity_type,
                    path: "/cube/x.json".into(),
                    expected: event.entity_name.clone(),
                    found: "y".into(),
                });
            }
            Ok(HandleOutcome::Rebuilt)
        }
    }

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = router::build_router(ReceiverState::new(Arc::new(Recorder::default())));
        let response = app.oneshot(request(Method::GET, "/v1/health")).await.unwrap();
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn valid_event_is_dispatched_once() {
        let recorder = Arc::new(Recorder::default());
        let state = ReceiverState::new(recorder.clone());
        let app = router::build_router(state.clone());

        let response = app
            .oneshot(request(Method::PUT, "/v1/cache/cube/sales/update"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.counters().handled.get(), 1);
        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec![BroadcastEvent::new(EntityType::Cube, "sales", EventKind::Update)]
        );
    }

    #[tokio::test]
    async fn unknown_tokens_are_rejected_without_dispatch() {
        let recorder = Arc::new(Recorder::default());
        let state = ReceiverState::new(recorder.clone());

        for uri in ["/v1/cache/widget/a/UPDATE", "/v1/cache/CUBE/a/RENAME"] {
            let response = router::build_router(state.clone())
                .oneshot(request(Method::PUT, uri))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
        assert_eq!(state.counters().rejected.load(Ordering::Relaxed), 2);
        assert_eq!(state.counters().handled.get(), 0);
        assert!(recorder.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn handler_failure_still_answers_ok() {
        let recorder = Arc::new(Recorder {
            fail: true,
            ..Recorder::default()
        });
        let state = ReceiverState::new(recorder.clone());

        let response = router::build_router(state.clone())
            .oneshot(request(Method::PUT, "/v1/cache/CUBE/x/DROP"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.counters().failed.load(Ordering::Relaxed), 1);
        assert_eq!(state.counters().handled.get(), 1);
    }

    #[tokio::test]
    async fn post_is_accepted_like_put() {
        let state = ReceiverState::new(Arc::new(Recorder::default()));
        let response = router::build_router(state.clone())
            .oneshot(request(Method::POST, "/v1/cache/table/DB.T/CREATE"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.counters().handled.get(), 1);
    }

    #[tokio::test]
    async fn event_rebuilds_cache_and_shows_in_stats() {
        let store: Arc<dyn ResourceStore> = Arc::new(InMemoryResourceStore::new());
        store
            .put("/project/p.json", br#"{"name":"p","last_modified":0}"#, 10)
            .unwrap();
        let cache = Arc::new(CacheService::new(Arc::clone(&store)));
        let state = ReceiverState::for_cache(Arc::clone(&cache));

        let response = router::build_router(state.clone())
            .oneshot(request(Method::PUT, "/v1/cache/PROJECT/p/CREATE"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(cache.project("p").unwrap().last_modified, 10);

        let response = router::build_router(state)
            .oneshot(request(Method::GET, "/v1/cache/stats"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let stats: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(stats["events_handled"], 1);
        assert_eq!(stats["cache"]["projects"], 1);
        assert!(stats["broadcast"].is_null());
    }
}
