use jiff::Timestamp;
use thiserror::Error;

/// Errors returned by Snowflake initialization and ID generation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    #[error("invalid node id {node_id}; expected 0..={max_node_id}")]
    InvalidNodeId { node_id: u16, max_node_id: u16 },
    #[error("epoch is ahead of current clock time: epoch={epoch}, now={now}")]
    EpochAhead { epoch: Timestamp, now: Timestamp },
    #[error("clock moved backwards by {behind_millis}ms")]
    ClockMovedBackwards { behind_millis: i64 },
    #[error("timestamp field exhausted; the epoch is too far in the past")]
    OverTimeLimit,
    #[error("generator state lock is poisoned")]
    StatePoisoned,
}
