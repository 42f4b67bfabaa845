//! Cluster change-notification fan-out for metahub.
//!
//! After a mutation commits to the resource store, the mutating code calls
//! [`Broadcaster::announce`]. The broadcaster sends the event to every peer
//! except this node, each delivery on its own task, and returns at once.
//!
//! Delivery is at-most-once and best-effort: failures and timeouts are
//! logged and dropped. Peer caches are derived state and heal on the next
//! successful event, an explicit resync, or a restart.

pub mod broadcaster;
pub mod config;
pub mod counter;
pub mod endpoint;
pub mod error;
pub mod transport;

pub use broadcaster::{BroadcastStats, Broadcaster};
pub use config::BroadcasterConfig;
pub use counter::SignalCounter;
pub use error::{BroadcastError, BroadcastResult};
pub use transport::{HttpTransport, PeerTransport};
