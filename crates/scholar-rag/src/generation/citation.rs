//! Source snippet helpers: truncation and query-term highlighting

use unicode_segmentation::UnicodeSegmentation;

/// Truncate a snippet to a maximum length while preserving word boundaries
pub fn truncate_snippet(snippet: &str, max_len: usize) -> String {
    if snippet.len() <= max_len {
        return snippet.to_string();
    }

    let mut cut = 0;
    for (idx, segment) in snippet.split_word_bound_indices() {
        if idx + segment.len() > max_len {
            break;
        }
        cut = idx + segment.len();
    }

    // A single token longer than max_len: fall back to a char boundary
    if cut == 0 {
        cut = max_len;
        while cut > 0 && !snippet.is_char_boundary(cut) {
            cut -= 1;
        }
    }

    format!("{}...", snippet[..cut].trim_end())
}

/// Highlight query terms in a snippet using <mark> tags
///
/// Terms shorter than 3 characters are skipped to avoid marking noise.
pub fn highlight_snippet(snippet: &str, query_terms: &[&str]) -> String {
    let mut highlighted = snippet.to_string();

    for term in query_terms {
        if term.len() < 3 {
            continue;
        }

        let re = regex::RegexBuilder::new(&regex::escape(term))
            .case_insensitive(true)
            .build();

        if let Ok(re) = re {
            highlighted = re
                .replace_all(&highlighted, |caps: &regex::Captures| {
                    format!("<mark>{}</mark>", &caps[0])
                })
                .to_string();
        }
    }

    highlighted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_at_word_boundary() {
        let snippet = "This is a very long snippet that needs to be truncated.";
        let truncated = truncate_snippet(snippet, 20);

        assert!(truncated.len() <= 23); // 20 + "..."
        assert!(truncated.ends_with("..."));
        assert!(!truncated.contains("truncated"));
    }

    #[test]
    fn short_snippet_is_unchanged() {
        assert_eq!(truncate_snippet("short", 20), "short");
    }

    #[test]
    fn truncation_is_utf8_safe() {
        let snippet = "tempo de execução de algoritmos em notação assintótica";
        let truncated = truncate_snippet(snippet, 21);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn highlights_terms_case_insensitively() {
        let snippet = "Dynamic Programming solves overlapping subproblems.";
        let highlighted = highlight_snippet(snippet, &["dynamic", "subproblems"]);

        assert!(highlighted.contains("<mark>Dynamic</mark>"));
        assert!(highlighted.contains("<mark>subproblems</mark>"));
    }

    #[test]
    fn skips_very_short_terms() {
        let snippet = "an algorithm is a procedure";
        let highlighted = highlight_snippet(snippet, &["an", "is"]);
        assert!(!highlighted.contains("<mark>"));
    }
}
