use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use metahub_types::{BroadcastEvent, EntityType, EventKind, PeerNode};

use crate::config::BroadcasterConfig;
use crate::counter::SignalCounter;
use crate::error::{BroadcastError, BroadcastResult};
use crate::transport::{HttpTransport, PeerTransport};

/// Delivery counters, for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastStats {
    pub announced: u64,
    pub delivered: u64,
    pub failed: u64,
    pub in_flight: usize,
}

#[derive(Debug, Default)]
struct Outcomes {
    delivered: AtomicU64,
    failed: AtomicU64,
}

/// Process-wide best-effort fan-out of change notifications.
///
/// Construct one per process and share it by `Arc` with every mutation
/// path. `announce` returns immediately; each peer delivery runs as its own
/// task on the broadcaster's runtime, bounded by the configured timeout.
/// Failed deliveries are logged and dropped, never retried.
pub struct Broadcaster {
    targets: Vec<PeerNode>,
    timeout: Duration,
    transport: Arc<dyn PeerTransport>,
    runtime: Handle,
    tasks: Mutex<JoinSet<()>>,
    announced: SignalCounter,
    outcomes: Arc<Outcomes>,
    closed: AtomicBool,
}

impl Broadcaster {
    /// Create a broadcaster speaking HTTP, bound to the current runtime.
    pub fn new(config: BroadcasterConfig) -> BroadcastResult<Self> {
        let runtime = Handle::try_current().map_err(|e| BroadcastError::Runtime(e.to_string()))?;
        let transport = HttpTransport::new(config.timeout)?;
        Ok(Self::with_transport(config, Arc::new(transport), runtime))
    }

    /// Create a broadcaster over an arbitrary transport and runtime.
    pub fn with_transport(
        config: BroadcasterConfig,
        transport: Arc<dyn PeerTransport>,
        runtime: Handle,
    ) -> Self {
        let targets = config.targets();
        info!(peers = targets.len(), timeout_ms = config.timeout.as_millis() as u64, "broadcaster started");
        Self {
            targets,
            timeout: config.timeout,
            transport,
            runtime,
            tasks: Mutex::new(JoinSet::new()),
            announced: SignalCounter::new(),
            outcomes: Arc::new(Outcomes::default()),
            closed: AtomicBool::new(false),
        }
    }

    /// Peers that receive announcements.
    pub fn targets(&self) -> &[PeerNode] {
        &self.targets
    }

    /// Notify every peer of a committed change.
    ///
    /// Call only after the mutation is durable in the resource store.
    /// Never blocks on the network and never fails.
    pub fn announce(&self, entity_type: EntityType, entity_name: &str, kind: EventKind) {
        self.announce_event(BroadcastEvent::new(entity_type, entity_name, kind));
    }

    pub fn announce_event(&self, event: BroadcastEvent) {
        self.announced.increment();

        // `shutdown` sets `closed` while holding this lock, so nothing can be
        // spawned into the set it has already taken.
        let mut tasks = self.tasks.lock().expect("broadcaster lock poisoned");
        if self.closed.load(Ordering::SeqCst) {
            debug!(%event, "broadcaster shut down, announcement dropped");
            return;
        }

        debug!(%event, peers = self.targets.len(), "announcing");
        while tasks.try_join_next().is_some() {}

        for peer in &self.targets {
            let peer = peer.clone();
            let event = event.clone();
            let transport = Arc::clone(&self.transport);
            let outcomes = Arc::clone(&self.outcomes);
            let timeout = self.timeout;
            tasks.spawn_on(
                async move {
                    let result = match tokio::time::timeout(timeout, transport.deliver(&peer, &event)).await {
                        Ok(result) => result,
                        Err(_) => Err(BroadcastError::Timeout(peer.to_string())),
                    };
                    match result {
                        Ok(()) => {
                            outcomes.delivered.fetch_add(1, Ordering::Relaxed);
                            debug!(%peer, %event, "broadcast delivered");
                        }
                        Err(e) => {
                            outcomes.failed.fetch_add(1, Ordering::Relaxed);
                            warn!(%peer, %event, error = %e, "broadcast delivery failed, dropped");
                        }
                    }
                },
                &self.runtime,
            );
        }
    }

    /// Counter of `announce` calls, one per call regardless of peer count.
    pub fn counter(&self) -> &SignalCounter {
        &self.announced
    }

    /// Deliveries spawned but not yet finished.
    pub fn in_flight(&self) -> usize {
        let mut tasks = self.tasks.lock().expect("broadcaster lock poisoned");
        while tasks.try_join_next().is_some() {}
        tasks.len()
    }

    pub fn stats(&self) -> BroadcastStats {
        BroadcastStats {
            announced: self.announced.get(),
            delivered: self.outcomes.delivered.load(Ordering::Relaxed),
            failed: self.outcomes.failed.load(Ordering::Relaxed),
            in_flight: self.in_flight(),
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Stop accepting announcements and drain in-flight deliveries.
    ///
    /// Waits at most `grace`; deliveries still running after that are
    /// aborted. Returns the number of aborted deliveries.
    pub async fn shutdown(&self, grace: Duration) -> usize {
        let mut tasks = {
            let mut guard = self.tasks.lock().expect("broadcaster lock poisoned");
            self.closed.store(true, Ordering::SeqCst);
            std::mem::take(&mut *guard)
        };
        let pending = tasks.len();

        let drained = tokio::time::timeout(grace, async {
            while tasks.join_next().await.is_some() {}
        })
        .await
        .is_ok();

        if drained {
            info!(drained = pending, "broadcaster shut down");
            return 0;
        }
        let abandoned = tasks.len();
        tasks.abort_all();
        while tasks.join_next().await.is_some() {}
        warn!(abandoned, "broadcaster shut down with deliveries still in flight");
        abandoned
    }
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("targets", &self.targets)
            .field("timeout", &self.timeout)
            .field("announced", &self.announced.get())
            .field("closed", &self.is_shut_down())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;

    /// Records deliveries; peers in `down` fail, peers in `slow` hang.
    #[derive(Default)]
    struct FakeTransport {
        delivered: Mutex<Vec<(PeerNode, BroadcastEvent)>>,
        down: HashSet<PeerNode>,
        slow: HashSet<PeerNode>,
        done: SignalCounter,
    }

    #[async_trait]
    impl PeerTransport for FakeTransport {
        async fn deliver(&self, peer: &PeerNode, event: &BroadcastEvent) -> BroadcastResult<()> {
            if self.slow.contains(peer) {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            if self.down.contains(peer) {
                self.done.increment();
                return Err(BroadcastError::Transport("connection refused".into()));
            }
            self.delivered
                .lock()
                .unwrap()
                .push((peer.clone(), event.clone()));
            self.done.increment();
            Ok(())
        }
    }

    fn peer(s: &str) -> PeerNode {
        PeerNode::parse(s).unwrap()
    }

    fn broadcaster(transport: Arc<FakeTransport>, peers: &[&str]) -> Broadcaster {
        let config = BroadcasterConfig::new(peers.iter().map(|p| peer(p)).collect())
            .with_self_address(peer("self:1"))
            .with_timeout(Duration::from_millis(200));
        Broadcaster::with_transport(config, transport, Handle::current())
    }

    #[tokio::test]
    async fn announce_reaches_every_peer_but_self() {
        let transport = Arc::new(FakeTransport::default());
        let b = broadcaster(Arc::clone(&transport), &["a:1", "self:1", "b:1"]);

        b.announce(EntityType::Cube, "sales", EventKind::Create);
        assert_eq!(b.counter().get(), 1);
        assert!(transport.done.wait_for(2, Duration::from_secs(5)).await);

        let delivered = transport.delivered.lock().unwrap().clone();
        let peers: HashSet<PeerNode> = delivered.iter().map(|(p, _)| p.clone()).collect();
        assert_eq!(peers, HashSet::from([peer("a:1"), peer("b:1")]));
        for (_, event) in delivered {
            assert_eq!(event, BroadcastEvent::new(EntityType::Cube, "sales", EventKind::Create));
        }
    }

    #[tokio::test]
    async fn counter_counts_calls_not_deliveries() {
        let transport = Arc::new(FakeTransport::default());
        let b = broadcaster(Arc::clone(&transport), &["a:1", "b:1", "c:1"]);
        b.announce(EntityType::Cube, "x", EventKind::Update);
        b.announce(EntityType::Project, "p", EventKind::Update);
        assert_eq!(b.counter().get(), 2);
        assert!(transport.done.wait_for(6, Duration::from_secs(5)).await);
        assert_eq!(b.counter().reset(), 2);
        assert_eq!(b.counter().get(), 0);
    }

    #[tokio::test]
    async fn no_peers_still_counts() {
        let transport = Arc::new(FakeTransport::default());
        let b = broadcaster(Arc::clone(&transport), &[]);
        b.announce(EntityType::Table, "DB.T", EventKind::Drop);
        assert_eq!(b.counter().get(), 1);
        assert_eq!(b.in_flight(), 0);
    }

    #[tokio::test]
    async fn failing_peer_does_not_affect_others() {
        let transport = Arc::new(FakeTransport {
            down: HashSet::from([peer("bad:1")]),
            ..Default::default()
        });
        let b = broadcaster(Arc::clone(&transport), &["bad:1", "good:1"]);
        b.announce(EntityType::Cube, "c", EventKind::Update);

        assert!(transport.done.wait_for(2, Duration::from_secs(5)).await);
        assert_eq!(b.shutdown(Duration::from_secs(1)).await, 0);
        let stats = b.stats();
        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(transport.delivered.lock().unwrap()[0].0, peer("good:1"));
    }

    #[tokio::test]
    async fn slow_peer_times_out_without_blocking_caller() {
        let transport = Arc::new(FakeTransport {
            slow: HashSet::from([peer("slow:1")]),
            ..Default::default()
        });
        let b = broadcaster(Arc::clone(&transport), &["slow:1", "fast:1"]);

        let started = std::time::Instant::now();
        b.announce(EntityType::Cube, "c", EventKind::Update);
        assert!(started.elapsed() < Duration::from_millis(100));

        assert!(transport.done.wait_for(1, Duration::from_secs(5)).await);
        assert_eq!(b.shutdown(Duration::from_secs(2)).await, 0);
        assert_eq!(b.stats().failed, 1);
        assert_eq!(b.stats().delivered, 1);
    }

    #[tokio::test]
    async fn shutdown_abandons_after_grace() {
        let transport = Arc::new(FakeTransport {
            slow: HashSet::from([peer("slow:1")]),
            ..Default::default()
        });
        let config = BroadcasterConfig::new(vec![peer("slow:1")]).with_timeout(Duration::from_secs(3600));
        let b = Broadcaster::with_transport(config, transport, Handle::current());
        b.announce(EntityType::Cube, "c", EventKind::Update);
        assert_eq!(b.in_flight(), 1);

        assert_eq!(b.shutdown(Duration::from_millis(20)).await, 1);
        assert!(b.is_shut_down());
        assert_eq!(b.in_flight(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn announces_racing_shutdown_leave_nothing_behind() {
        let transport = Arc::new(FakeTransport {
            slow: HashSet::from([peer("slow:1")]),
            ..Default::default()
        });
        let config = BroadcasterConfig::new(vec![peer("slow:1")]).with_timeout(Duration::from_secs(3600));
        let b = Arc::new(Broadcaster::with_transport(config, transport, Handle::current()));

        let announcers: Vec<_> = (0..4)
            .map(|_| {
                let b = Arc::clone(&b);
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        b.announce(EntityType::Cube, "c", EventKind::Update);
                    }
                })
            })
            .collect();
        b.shutdown(Duration::from_millis(10)).await;
        for announcer in announcers {
            announcer.join().unwrap();
        }

        assert_eq!(b.counter().get(), 2000);
        assert_eq!(b.in_flight(), 0);
    }

    #[tokio::test]
    async fn announce_after_shutdown_is_dropped() {
        let transport = Arc::new(FakeTransport::default());
        let b = broadcaster(Arc::clone(&transport), &["a:1"]);
        b.shutdown(Duration::from_millis(10)).await;
        b.announce(EntityType::Cube, "c", EventKind::Update);
        assert_eq!(b.counter().get(), 1);
        assert_eq!(b.in_flight(), 0);
        assert!(transport.delivered.lock().unwrap().is_empty());
    }
}
