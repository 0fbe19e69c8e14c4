//! Candidate JSON extraction from raw judge completions
//!
//! Judge models wrap their JSON inconsistently: bare, inside a ```json fence,
//! inside an untagged fence, or surrounded by commentary. [`extract`] picks
//! the best candidate substring; it does not validate it.

const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";

/// Extract the best candidate JSON object from a judge completion.
///
/// Strategies, first match wins:
/// 1. interior of a ```json fenced block
/// 2. interior of any fenced block, minus its language-tag line
/// 3. first `{` through last `}`
/// 4. the whole text
///
/// Returns `None` when there is nothing to parse (empty or whitespace-only
/// input, or an empty fenced block).
pub fn extract(raw: &str) -> Option<&str> {
    let candidate = json_fenced(raw)
        .or_else(|| any_fenced(raw))
        .or_else(|| brace_span(raw))
        .unwrap_or(raw)
        .trim();

    if candidate.is_empty() {
        None
    } else {
        Some(candidate)
    }
}

fn json_fenced(raw: &str) -> Option<&str> {
    let start = raw.find(JSON_FENCE)? + JSON_FENCE.len();
    let end = start + raw[start..].find(FENCE)?;
    Some(&raw[start..end])
}

fn any_fenced(raw: &str) -> Option<&str> {
    let mut start = raw.find(FENCE)? + FENCE.len();

    // Skip a language tag such as `javascript` or an empty remainder line
    if let Some(newline) = raw[start..].find('\n') {
        let tag = raw[start..start + newline].trim();
        if tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            start += newline + 1;
        }
    }

    let end = start + raw[start..].find(FENCE)?;
    Some(&raw[start..end])
}

/// Greedy first-`{` to last-`}` span, inclusive.
pub(crate) fn brace_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end > start {
        Some(&raw[start..=end])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_fence_with_commentary() {
        let raw = "Here is my evaluation:\n```json\n  {\"overall_score\": 8}\n```\nLet me know!";
        assert_eq!(extract(raw), Some("{\"overall_score\": 8}"));
    }

    #[test]
    fn test_json_fence_preferred_over_earlier_plain_fence() {
        let raw = "```\nnot this\n```\n```json\n{\"a\": 1}\n```";
        assert_eq!(extract(raw), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_untagged_fence() {
        let raw = "Result:\n```\n{\"overall_score\": 6}\n```";
        assert_eq!(extract(raw), Some("{\"overall_score\": 6}"));
    }

    #[test]
    fn test_other_language_tag_skipped() {
        let raw = "```javascript\n{\"overall_score\": 6}\n```";
        assert_eq!(extract(raw), Some("{\"overall_score\": 6}"));
    }

    #[test]
    fn test_inline_fence_keeps_content() {
        let raw = "``` {\"overall_score\": 6}\n```";
        assert_eq!(extract(raw), Some("{\"overall_score\": 6}"));
    }

    #[test]
    fn test_unclosed_fence_falls_back_to_braces() {
        let raw = "```json\n{\"overall_score\": 4, \"x\": {\"y\": 1}}";
        assert_eq!(extract(raw), Some("{\"overall_score\": 4, \"x\": {\"y\": 1}}"));
    }

    #[test]
    fn test_brace_span_with_surrounding_prose() {
        let raw = "Sure! {\"a\": {\"b\": 2}} Hope this helps.";
        assert_eq!(extract(raw), Some("{\"a\": {\"b\": 2}}"));
    }

    #[test]
    fn test_no_json_returns_trimmed_text() {
        assert_eq!(extract("  I cannot evaluate this.  "), Some("I cannot evaluate this."));
    }

    #[test]
    fn test_reversed_braces_return_text() {
        assert_eq!(extract("} oops {"), Some("} oops {"));
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(extract(""), None);
        assert_eq!(extract("   \n"), None);
        assert_eq!(extract("```json\n```"), None);
    }
}
