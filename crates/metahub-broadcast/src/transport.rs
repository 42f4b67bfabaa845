use std::time::Duration;

use async_trait::async_trait;
use metahub_types::{BroadcastEvent, PeerNode};

use crate::endpoint;
use crate::error::{BroadcastError, BroadcastResult};

/// Delivers one notification to one peer.
///
/// Implementations report failure but never retry; the broadcaster decides
/// what to do with a failed delivery.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn deliver(&self, peer: &PeerNode, event: &BroadcastEvent) -> BroadcastResult<()>;
}

/// HTTP transport speaking the receiver's wire contract.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> BroadcastResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| BroadcastError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PeerTransport for HttpTransport {
    async fn deliver(&self, peer: &PeerNode, event: &BroadcastEvent) -> BroadcastResult<()> {
        let url = endpoint::event_url(peer, event)?;
        let response = self.client.put(url).send().await.map_err(|e| {
            if e.is_timeout() {
                BroadcastError::Timeout(peer.to_string())
            } else {
                BroadcastError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BroadcastError::Rejected {
                peer: peer.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
