use thiserror::Error;

use crate::types::SchoolDay;

/// Errors raised while turning upstream JSON into lesson templates
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid schedule JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("schedule body is neither an array nor an object with an `items` array")]
    UnexpectedShape,

    #[error("\"{first}\" and \"{second}\" both occupy pair {pair} on {day} in overlapping weeks")]
    OverlappingSlots {
        day: SchoolDay,
        pair: u8,
        first: String,
        second: String,
    },
}
