//! Video-id extraction from thumbnail image URLs.
//!
//! Thumbnails look like `https://i.ytimg.com/vi/<video-id>/hqdefault.jpg`
//! (or `/vi_webp/...` for webp variants). Chapter thumbnails reuse the same
//! path shape with an `hqdefault_<n>` filename and do not identify a
//! distinct video, so they are rejected.

use crate::error::{Result, ThumbrateError};
use url::Url;

/// Extract the video id from a thumbnail image URL.
pub fn extract_video_id(thumbnail_url: &str) -> Result<String> {
    let url = Url::parse(thumbnail_url).map_err(|_| {
        ThumbrateError::InvalidThumbnailUrl(format!("Not a URL: {thumbnail_url}"))
    })?;

    let host = url.host_str().ok_or_else(|| {
        ThumbrateError::InvalidThumbnailUrl(format!("No host in URL: {thumbnail_url}"))
    })?;
    if host != "ytimg.com" && !host.ends_with(".ytimg.com") {
        return Err(ThumbrateError::InvalidThumbnailUrl(format!(
            "Not a thumbnail host: {host}"
        )));
    }

    let mut segments = url.path_segments().ok_or_else(|| {
        ThumbrateError::InvalidThumbnailUrl(format!("No path in URL: {thumbnail_url}"))
    })?;

    match segments.next() {
        Some("vi") | Some("vi_webp") => {}
        _ => {
            return Err(ThumbrateError::InvalidThumbnailUrl(format!(
                "Not a video thumbnail path: {thumbnail_url}"
            )));
        }
    }

    let video_id = segments.next().filter(|s| !s.is_empty()).ok_or_else(|| {
        ThumbrateError::InvalidThumbnailUrl(format!("No video id in URL: {thumbnail_url}"))
    })?;

    // Chapter thumbnails are hqdefault_<n>; custom uploaded thumbnails
    // (hqdefault_custom_<n>) belong to a real video and pass through.
    if let Some(filename) = segments.next()
        && filename.starts_with("hqdefault_")
        && !filename.starts_with("hqdefault_custom_")
    {
        return Err(ThumbrateError::InvalidThumbnailUrl(format!(
            "Chapter thumbnail: {thumbnail_url}"
        )));
    }

    Ok(video_id.to_string())
}
