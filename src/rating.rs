//! Like/view rating math and percentage formatting.

/// Like/view ratio in `0..=1`.
///
/// A video with zero views rates as `0`, not as undefined.
pub fn rating(likes: u64, views: u64) -> f64 {
    if views > 0 {
        likes as f64 / views as f64
    } else {
        0.0
    }
}

/// Format a rating as a percentage with exactly `decimals` fraction digits.
///
/// Truncates rather than rounds, so a rating just short of perfect never
/// displays as 100%: `0.99999` at two decimals is `"99.99%"`. Exactly `1.0`
/// is the one value rendered as `"100%"`. `decimals` is clamped to `0..=3`.
pub fn format_percentage(rating: f64, decimals: u32) -> String {
    if rating == 1.0 {
        return "100%".to_string();
    }
    let decimals = decimals.min(3);
    let scale = 10f64.powi(decimals as i32);
    let percent = (rating * 100.0 * scale).floor() / scale;
    format!("{percent:.prec$}%", prec = decimals as usize)
}
