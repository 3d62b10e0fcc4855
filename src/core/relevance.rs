//! Distance-to-relevance scoring and excerpt truncation.
//!
//! Both are presentation concerns: the store keeps full content and raw
//! distances, and only the formatted view is scored and shortened.

/// Maximum number of characters shown per result.
pub const EXCERPT_LEN: usize = 300;

/// Appended to an excerpt that was cut short.
pub const TRUNCATION_MARKER: &str = "...";

/// Converts a nearest-neighbor distance into a relevance score in `[0, 1]`.
///
/// Assumes distances roughly bounded in `[0, 2]` (cosine distance), so the
/// transform is `clamp(1 - distance / 2, 0, 1)`. `NaN` maps to `0`.
#[must_use]
pub fn relevance_from_distance(distance: f32) -> f32 {
    let score = 1.0 - distance / 2.0;
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 1.0)
}

/// Formats a relevance score as a percentage with one decimal place.
#[must_use]
pub fn format_relevance(relevance: f32) -> String {
    format!("{:.1}%", relevance * 100.0)
}

/// Shortens `content` to [`EXCERPT_LEN`] characters plus [`TRUNCATION_MARKER`].
///
/// Counts Unicode scalar values, so multi-byte text is never split inside a
/// character. Content at or under the limit is returned unchanged. The flag
/// is `true` when the content was cut.
#[must_use]
pub fn excerpt(content: &str) -> (String, bool) {
    match content.char_indices().nth(EXCERPT_LEN) {
        Some((cut, _)) => (format!("{}{TRUNCATION_MARKER}", &content[..cut]), true),
        None => (content.to_string(), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case(0.0, 1.0 ; "identical")]
    #[test_case(1.0, 0.5 ; "orthogonal")]
    #[test_case(2.0, 0.0 ; "opposite")]
    #[test_case(3.5, 0.0 ; "beyond range clamps to zero")]
    #[test_case(-0.5, 1.0 ; "negative clamps to one")]
    fn test_relevance_from_distance(distance: f32, expected: f32) {
        assert!((relevance_from_distance(distance) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_relevance_nan() {
        assert!(relevance_from_distance(f32::NAN).abs() < f32::EPSILON);
    }

    #[test]
    fn test_format_relevance() {
        assert_eq!(format_relevance(0.8765), "87.7%");
        assert_eq!(format_relevance(0.0), "0.0%");
    }

    #[test]
    fn test_excerpt_long_content() {
        let content = "a".repeat(500);
        let (shown, truncated) = excerpt(&content);
        assert!(truncated);
        assert_eq!(shown.len(), EXCERPT_LEN + TRUNCATION_MARKER.len());
        assert!(shown.starts_with(&"a".repeat(EXCERPT_LEN)));
        assert!(shown.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_excerpt_short_content() {
        let content = "b".repeat(50);
        assert_eq!(excerpt(&content), (content, false));
    }

    #[test]
    fn test_excerpt_exact_limit() {
        let content = "c".repeat(EXCERPT_LEN);
        assert_eq!(excerpt(&content), (content, false));
    }

    #[test_case(EXCERPT_LEN + 1 ; "one over")]
    #[test_case(EXCERPT_LEN + TRUNCATION_MARKER.len() ; "same byte length as excerpt")]
    fn test_excerpt_just_over_limit_is_flagged(len: usize) {
        let (shown, truncated) = excerpt(&"d".repeat(len));
        assert!(truncated);
        assert_eq!(shown.chars().count(), EXCERPT_LEN + TRUNCATION_MARKER.len());
    }

    #[test]
    fn test_excerpt_multibyte() {
        let content = "é".repeat(400);
        let (shown, truncated) = excerpt(&content);
        assert!(truncated);
        assert_eq!(shown.chars().count(), EXCERPT_LEN + TRUNCATION_MARKER.len());
    }

    proptest! {
        #[test]
        fn prop_relevance_in_unit_interval(distance in -10.0_f32..10.0) {
            let r = relevance_from_distance(distance);
            prop_assert!((0.0..=1.0).contains(&r));
        }

        #[test]
        fn prop_relevance_non_increasing(a in 0.0_f32..2.0, b in 0.0_f32..2.0) {
            let (near, far) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(relevance_from_distance(near) >= relevance_from_distance(far));
        }
    }
}
