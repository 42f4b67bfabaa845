use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A cluster member address.
///
/// Membership is static: the peer list is loaded once at process start and
/// never changes for the lifetime of the process. The address is a base URL
/// such as `http://10.0.0.2:7070`. A bare `host:port` is accepted and given
/// the `http://` scheme.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeerNode {
    address: String,
}

impl PeerNode {
    /// Parse and normalize a peer address.
    pub fn parse(raw: &str) -> Result<Self, TypeError> {
        let trimmed = raw.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(TypeError::InvalidPeer(raw.to_string()));
        }
        let address = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("http://{trimmed}")
        };
        let host = address
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or_default();
        if host.is_empty() || host.contains(char::is_whitespace) {
            return Err(TypeError::InvalidPeer(raw.to_string()));
        }
        Ok(Self { address })
    }

    /// Normalized base URL, without a trailing slash.
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl fmt::Display for PeerNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

impl TryFrom<String> for PeerNode {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PeerNode> for String {
    fn from(peer: PeerNode) -> Self {
        peer.address
    }
}
