use thiserror::Error;

/// Errors from constructing a broadcaster or delivering to one peer.
///
/// Delivery errors never reach the writer that called `announce`; the
/// broadcaster logs them and drops the event.
#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("peer {peer} answered {status}")]
    Rejected { peer: String, status: u16 },

    #[error("delivery to {0} timed out")]
    Timeout(String),

    #[error("invalid peer url {0}")]
    InvalidUrl(String),

    #[error("no async runtime available: {0}")]
    Runtime(String),
}

pub type BroadcastResult<T> = Result<T, BroadcastError>;
