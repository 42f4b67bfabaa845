use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use metahub_broadcast::BroadcasterConfig;
use metahub_types::PeerNode;

use crate::error::{ServerError, ServerResult};

/// Configuration of one metahub node.
///
/// ```toml
/// bind_addr = "0.0.0.0:7070"
/// metadata_root = "/var/lib/metahub"
/// self_address = "http://10.0.0.1:7070"
/// peers = ["http://10.0.0.1:7070", "http://10.0.0.2:7070"]
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub bind_addr: SocketAddr,
    /// Root directory of the shared resource store. Must exist.
    pub metadata_root: PathBuf,
    /// This node's address as peers know it; excluded from fan-out.
    pub self_address: Option<PeerNode>,
    /// Static cluster membership.
    pub peers: Vec<PeerNode>,
    pub broadcast_timeout_ms: u64,
    pub shutdown_grace_ms: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 7070)),
            metadata_root: PathBuf::from("metadata"),
            self_address: None,
            peers: Vec::new(),
            broadcast_timeout_ms: 5000,
            shutdown_grace_ms: 3000,
        }
    }
}

impl NodeConfig {
    pub fn from_toml_str(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn broadcast_timeout(&self) -> Duration {
        Duration::from_millis(self.broadcast_timeout_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    pub fn broadcaster_config(&self) -> BroadcasterConfig {
        let mut config = BroadcasterConfig::new(self.peers.clone()).with_timeout(self.broadcast_timeout());
        config.self_address = self.self_address.clone();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = NodeConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:7070".parse::<SocketAddr>().unwrap());
        assert_eq!(c.broadcast_timeout(), Duration::from_secs(5));
        assert_eq!(c.shutdown_grace(), Duration::from_secs(3));
        assert!(c.peers.is_empty());
    }

    #[test]
    fn parse_toml() {
        let c = NodeConfig::from_toml_str(
            r#"
            bind_addr = "0.0.0.0:8080"
            metadata_root = "/srv/meta"
            self_address = "10.0.0.1:8080"
            peers = ["10.0.0.1:8080", "http://10.0.0.2:8080/"]
            broadcast_timeout_ms = 250
            "#,
        )
        .unwrap();
        assert_eq!(c.metadata_root, PathBuf::from("/srv/meta"));
        assert_eq!(c.peers[1].address(), "http://10.0.0.2:8080");
        assert_eq!(c.shutdown_grace_ms, 3000);

        let b = c.broadcaster_config();
        assert_eq!(b.timeout, Duration::from_millis(250));
        assert_eq!(b.targets(), vec![PeerNode::parse("10.0.0.2:8080").unwrap()]);
    }

    #[test]
    fn bad_toml_is_config_error() {
        assert!(matches!(
            NodeConfig::from_toml_str("peers = [\"\"]"),
            Err(ServerError::Config(_))
        ));
        assert!(matches!(
            NodeConfig::from_toml_str("bind_addr = 7"),
            Err(ServerError::Config(_))
        ));
    }

    #[test]
    fn load_missing_file_fails() {
        assert!(NodeConfig::load("/nonexistent/metahub.toml").is_err());
    }
}
