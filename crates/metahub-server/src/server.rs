use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use metahub_broadcast::{Broadcaster, SignalCounter};
use metahub_cache::CacheService;
use metahub_catalog::Catalog;
use metahub_store::{FileResourceStore, ResourceStore};

use crate::config::NodeConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::ReceiverState;
use crate::router::build_router;

/// One metahub node: the shared store, this node's cache, the broadcaster,
/// the catalog that ties them together, and the receiver endpoint.
pub struct MetahubNode {
    config: NodeConfig,
    store: Arc<FileResourceStore>,
    cache: Arc<CacheService>,
    broadcaster: Arc<Broadcaster>,
    catalog: Arc<Catalog>,
    receiver: ReceiverState,
}

impl MetahubNode {
    /// Open the store, warm the cache and start the broadcaster.
    ///
    /// Must run inside a tokio runtime. Fails if the metadata root is missing.
    pub fn open(config: NodeConfig) -> ServerResult<Self> {
        let store = Arc::new(FileResourceStore::open(&config.metadata_root)?);
        let shared: Arc<dyn ResourceStore> = store.clone();

        let cache = Arc::new(CacheService::new(Arc::clone(&shared)));
        let loaded = cache.resync_all()?;

        let broadcaster = Arc::new(Broadcaster::new(config.broadcaster_config())?);
        let catalog = Arc::new(Catalog::new(shared, Arc::clone(&cache), Arc::clone(&broadcaster)));
        let receiver = ReceiverState::for_cache(Arc::clone(&cache)).with_broadcaster(Arc::clone(&broadcaster));

        info!(
            root = %store.root().display(),
            peers = broadcaster.targets().len(),
            cached = loaded,
            "metahub node opened"
        );
        Ok(Self {
            config,
            store,
            cache,
            broadcaster,
            catalog,
            receiver,
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<FileResourceStore> {
        &self.store
    }

    pub fn cache(&self) -> &Arc<CacheService> {
        &self.cache
    }

    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        &self.broadcaster
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Counter of inbound events this node has finished handling.
    pub fn events_handled(&self) -> &SignalCounter {
        &self.receiver.counters().handled
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.receiver.clone())
    }

    /// Serve on the configured address until Ctrl-C, then shut down.
    pub async fn serve(self) -> ServerResult<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        info!("metahub node listening on {}", self.config.bind_addr);
        self.serve_with_listener(listener, shutdown_signal()).await?;
        self.shutdown().await;
        Ok(())
    }

    /// Serve on `listener` until `signal` resolves.
    pub async fn serve_with_listener<F>(&self, listener: TcpListener, signal: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(listener, self.router())
            .with_graceful_shutdown(signal)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }

    /// Drain outbound deliveries for at most the configured grace period.
    pub async fn shutdown(&self) {
        let abandoned = self.broadcaster.shutdown(self.config.shutdown_grace()).await;
        if abandoned > 0 {
            warn!(abandoned, "deliveries abandoned at shutdown");
        }
        info!("metahub node stopped");
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
