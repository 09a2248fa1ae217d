//! `@handle` extraction from message text.

use std::collections::HashSet;

/// Handles mentioned in `body`.
///
/// The body is split on every non-alphanumeric character. A token counts as a
/// mention when the original text contains `@` immediately followed by it.
/// Matching against the original text keeps runs like `@alice@bob` correct.
pub fn scan(body: &str) -> HashSet<String> {
    body.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .filter(|token| body.contains(&format!("@{}", token)))
        .map(str::to_string)
        .collect()
}

/// Mentions present in `new_body` that `old_body` did not already have.
pub fn scan_delta(new_body: &str, old_body: &str) -> HashSet<String> {
    let old = scan(old_body);
    scan(new_body)
        .into_iter()
        .filter(|handle| !old.contains(handle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_mention() {
        assert_eq!(scan("hi @alice bye"), set(&["alice"]));
    }

    #[test]
    fn test_no_mentions() {
        assert!(scan("hello world").is_empty());
        assert!(scan("").is_empty());
        assert!(scan("@ @@ @!").is_empty());
    }

    #[test]
    fn test_duplicate_mentions_collapse() {
        assert_eq!(scan("@alice and @alice again"), set(&["alice"]));
    }

    #[test]
    fn test_adjacent_mentions() {
        assert_eq!(
            scan("hi@johnsmith0@johnsmith hello!"),
            set(&["johnsmith0", "johnsmith"])
        );
    }

    #[test]
    fn test_punctuation_terminates_handle() {
        assert_eq!(scan("thanks @bob, see you"), set(&["bob"]));
        assert_eq!(scan("(@carol)"), set(&["carol"]));
    }

    #[test]
    fn test_bare_word_is_not_a_mention() {
        // "bob" appears as a word but never after '@'
        assert_eq!(scan("@alice told bob"), set(&["alice"]));
    }

    #[test]
    fn test_delta_only_new_mentions() {
        assert_eq!(scan_delta("@alice @bob hi", "@alice hi"), set(&["bob"]));
        assert!(scan_delta("@alice changed text", "@alice hi").is_empty());
        assert_eq!(scan_delta("@alice", ""), set(&["alice"]));
    }

    #[test]
    fn test_delta_ignores_removed_mentions() {
        assert!(scan_delta("plain text", "@alice hi").is_empty());
    }
}
