//! Client-side re-ranking of racer search results.
//!
//! The site's own ordering is close to random, so results are sorted by how
//! many characters a username shares with the query.

use crate::records::RacerIdentity;
use std::collections::HashMap;

/// Character-overlap ratio of two strings in `0.0..=1.0`, case-insensitive.
///
/// Counts the characters both strings share (as multisets) and returns
/// `2 * shared / (len(a) + len(b))`. Two empty strings are identical.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().flat_map(char::to_lowercase).collect();
    let b: Vec<char> = b.chars().flat_map(char::to_lowercase).collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let mut available: HashMap<char, usize> = HashMap::new();
    for c in &b {
        *available.entry(*c).or_default() += 1;
    }

    let shared = a
        .iter()
        .filter(|c| match available.get_mut(*c) {
            Some(n) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        })
        .count();

    (2 * shared) as f64 / total as f64
}

/// Sort `items` by descending similarity of `key(item)` to `query`.
///
/// The sort is stable: equally similar items keep their original order.
pub fn rank_by<T>(items: Vec<T>, query: &str, key: impl Fn(&T) -> &str) -> Vec<T> {
    let mut scored: Vec<(f64, T)> = items
        .into_iter()
        .map(|item| (similarity(key(&item), query), item))
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().map(|(_, item)| item).collect()
}

/// Rank racer search results by username similarity to `query`.
#[must_use]
pub fn rank(candidates: Vec<RacerIdentity>, query: &str) -> Vec<RacerIdentity> {
    rank_by(candidates, query, |c| c.username.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity() {
        assert!((similarity("abc", "abc") - 1.0).abs() < f64::EPSILON);
        assert!((similarity("abc", "xyz")).abs() < f64::EPSILON);
        assert!((similarity("ABC", "abc") - 1.0).abs() < f64::EPSILON);
        assert!((similarity("", "") - 1.0).abs() < f64::EPSILON);
        assert!((similarity("abd", "abc") - 2.0 / 3.0).abs() < 1e-9);
        // order does not matter, only shared characters
        assert!((similarity("cba", "abc") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rank_is_deterministic() {
        let candidates = vec!["xyz", "abd", "abc"];
        for _ in 0..5 {
            let ranked = rank_by(candidates.clone(), "abc", |s| *s);
            assert_eq!(ranked, vec!["abc", "abd", "xyz"]);
        }
    }

    #[test]
    fn test_rank_ties_keep_original_order() {
        let ranked = rank_by(vec!["ab", "ba", "zz"], "ab", |s| *s);
        assert_eq!(ranked, vec!["ab", "ba", "zz"]);
    }
}
