//! Analytics engine error types

use thiserror::Error;

use crate::store::feed::FeedError;
use crate::store::query::QueryError;

/// Errors surfaced by the aggregation engine
///
/// None of these is fatal to readers: the engine keeps serving the last
/// published snapshot (stale-flagged when the feed is down) whatever
/// happens on the subscribe and refresh paths.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Feed subscription lost or never established
    #[error("change feed unavailable: {0}")]
    FeedUnavailable(#[from] FeedError),

    /// A one-shot refresh query failed; cached metrics remain valid
    #[error("refresh query failed: {0}")]
    Query(#[from] QueryError),
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
