//! Version timestamps.
//!
//! A resource version is a last-modified timestamp in milliseconds since the
//! UNIX epoch. It is monotonic per path but not wall-clock authoritative: a
//! backend may round it, so the stored value can differ slightly from the
//! requested one. `0` means "absent".

use std::time::{SystemTime, UNIX_EPOCH};

/// Last-modified version timestamp, in milliseconds.
pub type Version = u64;

/// Version reported for a resource that does not exist.
pub const ABSENT_VERSION: Version = 0;

/// Wall-clock milliseconds since the UNIX epoch.
pub fn current_version() -> Version {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as Version
}

/// The version a writer should request when replacing `old`.
///
/// Always strictly greater than `old`, even if the clock went backwards or
/// two writes land in the same millisecond.
pub fn next_version(old: Version) -> Version {
    current_version().max(old.saturating_add(1))
}
