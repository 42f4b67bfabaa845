use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, info, warn};

use metahub_broadcast::{BroadcastStats, Broadcaster, SignalCounter};
use metahub_cache::{BroadcastHandler, CacheService, CacheStats, HandleOutcome};
use metahub_types::BroadcastEvent;

use crate::error::ServerResult;

/// Inbound event counters.
#[derive(Debug, Default)]
pub struct ReceiverCounters {
    /// Decoded events whose handling has finished, successfully or not.
    pub handled: SignalCounter,
    pub rejected: AtomicU64,
    pub failed: AtomicU64,
}

/// Shared state of the receiver endpoint.
#[derive(Clone)]
pub struct ReceiverState {
    handler: Arc<dyn BroadcastHandler>,
    cache: Option<Arc<CacheService>>,
    broadcaster: Option<Arc<Broadcaster>>,
    counters: Arc<ReceiverCounters>,
}

impl ReceiverState {
    pub fn new(handler: Arc<dyn BroadcastHandler>) -> Self {
        Self {
            handler,
            cache: None,
            broadcaster: None,
            counters: Arc::new(ReceiverCounters::default()),
        }
    }

    /// Receiver for a node whose handler is its cache service.
    pub fn for_cache(cache: Arc<CacheService>) -> Self {
        let mut state = Self::new(cache.clone());
        state.cache = Some(cache);
        state
    }

    pub fn with_broadcaster(mut self, broadcaster: Arc<Broadcaster>) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    pub fn counters(&self) -> &Arc<ReceiverCounters> {
        &self.counters
    }
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub cache: Option<CacheStats>,
    pub events_handled: u64,
    pub events_rejected: u64,
    pub events_failed: u64,
    pub broadcast: Option<BroadcastStats>,
}

/// Receive one notification and run it through the registered handler.
///
/// Answers 400 when a token does not decode and 200 otherwise, whatever
/// the handler's outcome. Handler failures are logged here only.
pub async fn event_handler(
    State(state): State<ReceiverState>,
    Path((entity_type, entity_name, event)): Path<(String, String, String)>,
) -> ServerResult<StatusCode> {
    debug!(%entity_type, %entity_name, %event, "event RECEIVED");
    let event = match BroadcastEvent::decode(&entity_type, &entity_name, &event) {
        Ok(event) => event,
        Err(e) => {
            state.counters.rejected.fetch_add(1, Ordering::Relaxed);
            warn!(%entity_type, %entity_name, %event, error = %e, "event rejected");
            return Err(e.into());
        }
    };
    debug!(%event, "event DECODED");

    let handler = Arc::clone(&state.handler);
    let dispatched = event.clone();
    debug!(%event, "event DISPATCHED");
    let outcome = tokio::task::spawn_blocking(move || handler.handle(&dispatched)).await;

    match outcome {
        Ok(Ok(HandleOutcome::Rebuilt)) => info!(%event, "event REBUILT"),
        Ok(Ok(HandleOutcome::Removed)) => info!(%event, "event REMOVED"),
        Ok(Err(e)) => {
            state.counters.failed.fetch_add(1, Ordering::Relaxed);
            error!(%event, error = %e, "event FAILED");
        }
        Err(e) => {
            state.counters.failed.fetch_add(1, Ordering::Relaxed);
            error!(%event, error = %e, "event FAILED: handler panicked");
        }
    }
    state.counters.handled.increment();
    Ok(StatusCode::OK)
}

pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "name": "metahub",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn stats_handler(State(state): State<ReceiverState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        cache: state.cache.as_ref().map(|c| c.stats()),
        events_handled: state.counters.handled.get(),
        events_rejected: state.counters.rejected.load(Ordering::Relaxed),
        events_failed: state.counters.failed.load(Ordering::Relaxed),
        broadcast: state.broadcaster.as_ref().map(|b| b.stats()),
    })
}
