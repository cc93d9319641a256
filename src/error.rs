use thiserror::Error;

/// Errors produced by the stats host and page-side helpers.
///
/// None of these cross the message boundary: the batcher normalizes every
/// failure to a `null` result, so this enum stays internal to the host and
/// the thumbnail-parsing path.
#[derive(Debug, Error)]
pub enum ThumbrateError {
    /// Upstream statistics API unreachable or non-2xx.
    #[error("Upstream fetch failed: {0}")]
    UpstreamFetch(#[from] reqwest::Error),

    /// Upstream body did not match the documented response shape.
    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),

    /// Thumbnail URL does not identify a video.
    #[error("Invalid thumbnail URL: {0}")]
    InvalidThumbnailUrl(String),
}

pub type Result<T> = std::result::Result<T, ThumbrateError>;
