//! Word-frequency metrics over free-text metadata
//!
//! Estimates how similar two bits of metadata are from their word
//! distributions alone. Order and punctuation never matter: "foo bar" and
//! "Bar, Foo" are the same title.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};

lazy_static! {
    /// Token boundary: any run of non-word characters.
    static ref SEPARATOR: Regex = Regex::new(r"\W+").expect("static regex");

    /// English articles ignored by title comparison.
    static ref TITLE_STOPWORDS: HashSet<&'static str> =
        ["a", "an", "the"].into_iter().collect();
}

/// The lowercased tokens of a string, duplicates kept.
pub fn word_list(s: &str) -> Vec<String> {
    SEPARATOR
        .split(s)
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

/// The set of lowercased tokens of a string.
pub fn wordbag(s: &str) -> HashSet<String> {
    word_list(s).into_iter().collect()
}

/// Relative word frequencies across a batch of strings.
///
/// Every token of every string counts; the result maps each word to
/// count / total tokens. An empty batch (or one with no tokens) yields an
/// empty map rather than dividing by zero.
pub fn word_frequency_histogram<S: AsRef<str>>(texts: &[S]) -> HashMap<String, f64> {
    let mut counts: HashMap<String, f64> = HashMap::new();
    let mut words = 0.0;
    for text in texts {
        for word in word_list(text.as_ref()) {
            *counts.entry(word).or_insert(0.0) += 1.0;
            words += 1.0;
        }
    }
    if words > 0.0 {
        for v in counts.values_mut() {
            *v /= words;
        }
    }
    counts
}

/// Histogram distance between two batches of strings.
///
/// The distance is the sum, over the union of both vocabularies, of the
/// absolute difference between each word's relative frequency on either
/// side, with absence counting as zero. Identical frequency profiles give
/// 0; disjoint vocabularies give 2 (each side loses all its mass).
pub fn histogram_distance<A: AsRef<str>, B: AsRef<str>>(texts_1: &[A], texts_2: &[B]) -> f64 {
    let histogram_1 = word_frequency_histogram(texts_1);
    let histogram_2 = word_frequency_histogram(texts_2);

    let mut distance = 0.0;
    for (word, freq) in &histogram_1 {
        distance += (freq - histogram_2.get(word).copied().unwrap_or(0.0)).abs();
    }
    for (word, freq) in &histogram_2 {
        if !histogram_1.contains_key(word) {
            distance += freq.abs();
        }
    }
    distance
}

/// Jaccard similarity of two strings' wordbags after stopword removal.
///
/// Defined as 1 when both bags are empty after stopword removal: there is
/// nothing left to disagree on.
pub fn word_match_proportion(s1: &str, s2: &str, stopwords: &HashSet<&str>) -> f64 {
    let b1: HashSet<String> = wordbag(s1)
        .into_iter()
        .filter(|w| !stopwords.contains(w.as_str()))
        .collect();
    let b2: HashSet<String> = wordbag(s2)
        .into_iter()
        .filter(|w| !stopwords.contains(w.as_str()))
        .collect();
    let total = b1.union(&b2).count();
    if total == 0 {
        return 1.0;
    }
    let shared = b1.intersection(&b2).count();
    shared as f64 / total as f64
}

/// Title similarity: word match proportion ignoring English articles.
pub fn title_similarity(title_1: &str, title_2: &str) -> f64 {
    word_match_proportion(title_1, title_2, &TITLE_STOPWORDS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wordbag_ignores_case_and_punctuation() {
        assert_eq!(wordbag("Foo, Bar."), wordbag("bar foo"));
    }

    #[test]
    fn title_similarity_ignores_order_and_punctuation() {
        assert_eq!(1.0, title_similarity("foo bar", "foo bar"));
        assert_eq!(1.0, title_similarity("foo bar", "bar, foo"));
        assert_eq!(1.0, title_similarity("foo bar.", "FOO BAR"));
    }

    #[test]
    fn title_similarity_ignores_articles() {
        assert_eq!(1.0, title_similarity("The Moby Dick", "Moby Dick"));
    }

    #[test]
    fn word_match_proportion_of_string_with_itself() {
        let none = HashSet::new();
        assert_eq!(1.0, word_match_proportion("some title", "some title", &none));
    }

    #[test]
    fn empty_after_stopwords_is_a_perfect_match() {
        let stopwords: HashSet<&str> = ["a", "an", "the"].into_iter().collect();
        assert_eq!(1.0, word_match_proportion("the", "a an", &stopwords));
    }

    #[test]
    fn histogram_of_empty_batch_is_empty() {
        let empty: [&str; 0] = [];
        assert!(word_frequency_histogram(&empty).is_empty());
    }

    #[test]
    fn identical_profiles_have_zero_distance() {
        // Same words, different order and case.
        let a1 = ["The First Title", "The Second Title"];
        let a2 = ["title the second", "FIRST, THE TITLE"];
        assert_eq!(0.0, histogram_distance(&a1, &a2));
    }

    #[test]
    fn disjoint_vocabularies_have_distance_two() {
        let a1 = ["These Words Have Absolutely"];
        let a2 = ["Nothing In Common, Really"];
        assert_eq!(2.0, histogram_distance(&a1, &a2));
    }
}
