use std::sync::Arc;

use tokio::runtime::Handle;

use metahub_broadcast::{Broadcaster, BroadcasterConfig, HttpTransport};
use metahub_cache::CacheService;
use metahub_catalog::Catalog;
use metahub_store::InMemoryResourceStore;

use crate::executable::ExecutableContext;

/// A catalog over an in-memory store with no peers. Needs a tokio runtime.
pub(crate) fn catalog_context() -> ExecutableContext {
    let store = Arc::new(InMemoryResourceStore::new());
    let cache = Arc::new(CacheService::new(store.clone()));
    let transport = HttpTransport::new(std::time::Duration::from_secs(1)).unwrap();
    let broadcaster = Arc::new(Broadcaster::with_transport(
        BroadcasterConfig::default(),
        Arc::new(transport),
        Handle::current(),
    ));
    ExecutableContext::new(Arc::new(Catalog::new(store, cache, broadcaster)))
}
