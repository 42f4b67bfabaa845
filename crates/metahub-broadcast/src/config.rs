use std::time::Duration;

use metahub_types::PeerNode;

/// Default bound on a single peer delivery.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for a [`crate::Broadcaster`].
#[derive(Clone, Debug)]
pub struct BroadcasterConfig {
    /// This node's own address, excluded from fan-out when it appears in `peers`.
    pub self_address: Option<PeerNode>,
    /// Static cluster membership.
    pub peers: Vec<PeerNode>,
    /// Bound on one delivery. Expiry counts as a failed delivery.
    pub timeout: Duration,
}

impl BroadcasterConfig {
    pub fn new(peers: Vec<PeerNode>) -> Self {
        Self {
            self_address: None,
            peers,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_self_address(mut self, address: PeerNode) -> Self {
        self.self_address = Some(address);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Peers that should receive announcements: the configured list minus
    /// this node and minus duplicates, in configuration order.
    pub fn targets(&self) -> Vec<PeerNode> {
        let mut targets: Vec<PeerNode> = Vec::with_capacity(self.peers.len());
        for peer in &self.peers {
            if self.self_address.as_ref() == Some(peer) || targets.contains(peer) {
                continue;
            }
            targets.push(peer.clone());
        }
        targets
    }
}

impl Default for BroadcasterConfig {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
