//! The wire contract shared by the broadcaster and the receiver.
//!
//! A notification is a single `PUT {peer}/v1/cache/{type}/{name}/{event}`
//! with an empty body. `type` is the lower-case entity token, `event` is
//! one of `CREATE`, `UPDATE` or `DROP`. Receivers decode both tokens
//! case-insensitively.

use metahub_types::{BroadcastEvent, PeerNode};
use reqwest::Url;

use crate::error::{BroadcastError, BroadcastResult};

/// Router pattern for inbound notifications.
pub const EVENT_ROUTE: &str = "/v1/cache/:entity_type/:entity_name/:event";

/// Liveness probe.
pub const HEALTH_ROUTE: &str = "/v1/health";

/// Cached entry counts and event counters.
pub const STATS_ROUTE: &str = "/v1/cache/stats";

const EVENT_PREFIX: [&str; 2] = ["v1", "cache"];

/// Upper-case event token as sent on the wire.
pub fn event_token(event: &BroadcastEvent) -> String {
    event.kind.token().to_ascii_uppercase()
}

/// Full notification URL for `event` at `peer`.
///
/// The entity name is percent-encoded as one path segment.
pub fn event_url(peer: &PeerNode, event: &BroadcastEvent) -> BroadcastResult<Url> {
    let mut url =
        Url::parse(peer.address()).map_err(|e| BroadcastError::InvalidUrl(format!("{peer}: {e}")))?;
    let kind = event_token(event);
    url.path_segments_mut()
        .map_err(|_| BroadcastError::InvalidUrl(peer.to_string()))?
        .pop_if_empty()
        .extend(EVENT_PREFIX)
        .extend([event.entity_type.token(), event.entity_name.as_str(), kind.as_str()]);
    Ok(url)
}
