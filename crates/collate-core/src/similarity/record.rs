//! Author and record comparators
//!
//! Author matching compares whole names as wordbags, so "Melville, Herman"
//! and "Herman Melville" match while "Herman Melville" and "Herman Wouk" do
//! not. Alternate names (pseudonyms) count as usable names for a match.

use std::collections::HashSet;

use collate_domain::Contributor;

use crate::catalog::{Catalog, WorkId, WorkRecord};
use crate::similarity::text::{histogram_distance, title_similarity, wordbag};

/// Every wordbag a contributor can be known by: primary name plus aliases.
fn contributor_wordbags(contributor: &Contributor) -> Vec<HashSet<String>> {
    let mut bags = vec![wordbag(&contributor.name)];
    for alias in &contributor.alternate_names {
        bags.push(wordbag(alias));
    }
    bags
}

/// Find a candidate any of whose names matches any of `bags`. Returns the
/// candidate's index.
fn matching_author_in(bags: &[HashSet<String>], candidates: &[Vec<HashSet<String>>]) -> Option<usize> {
    candidates.iter().position(|candidate| {
        candidate.iter().any(|name| bags.contains(name))
    })
}

/// Whether `name` matches any candidate's primary name or aliases.
pub fn author_found_in(name: &str, candidates: &[Contributor]) -> bool {
    let bags = vec![wordbag(name)];
    let candidate_bags: Vec<Vec<HashSet<String>>> =
        candidates.iter().map(contributor_wordbags).collect();
    matching_author_in(&bags, &candidate_bags).is_some()
}

/// What proportion of the two author lists can be matched up?
///
/// A greedy pass: match every author in list 1 against list 2, then every
/// not-yet-matched author in list 2 against list 1; the score is
/// successes / attempts. Two empty lists are a perfect match. This is a
/// deliberate heuristic, not a maximum bipartite matching — an author
/// matched from one side is only excluded from the reverse pass, never
/// re-assigned.
pub fn author_similarity(authors_1: &[Contributor], authors_2: &[Contributor]) -> f64 {
    if authors_1.is_empty() && authors_2.is_empty() {
        return 1.0;
    }

    let bags_1: Vec<Vec<HashSet<String>>> = authors_1.iter().map(contributor_wordbags).collect();
    let bags_2: Vec<Vec<HashSet<String>>> = authors_2.iter().map(contributor_wordbags).collect();

    let mut attempts = 0u32;
    let mut successes = 0u32;
    let mut matched: HashSet<usize> = HashSet::new();
    for author in &bags_1 {
        attempts += 1;
        if let Some(index) = matching_author_in(author, &bags_2) {
            successes += 1;
            matched.insert(index);
        }
    }
    for (index, author) in bags_2.iter().enumerate() {
        if matched.contains(&index) {
            // Already matched from the other record's pass.
            continue;
        }
        attempts += 1;
        if matching_author_in(author, &bags_1).is_some() {
            successes += 1;
        }
    }

    f64::from(successes) / f64::from(attempts)
}

/// Default record-to-record comparator: equal-weight mean of title and
/// author similarity. The title component is only counted when both records
/// carry a title; the author component is always counted.
pub fn record_similarity(a: &WorkRecord, b: &WorkRecord) -> f64 {
    let mut total = author_similarity(&a.contributors, &b.contributors);
    let mut components = 1.0;
    if let (Some(t1), Some(t2)) = (&a.title, &b.title) {
        total += title_similarity(t1, t2);
        components += 1.0;
    }
    total / components
}

/// Default Work-to-Work comparator used by the merge guard.
///
/// Compares the full title sets via histogram distance (mapped from its
/// [0, 2] range into a [0, 1] similarity) and the unions of each Work's
/// contributors via author similarity, equal weight. Works whose ids are
/// unknown score 0.
pub fn work_similarity(catalog: &Catalog, a: WorkId, b: WorkId) -> f64 {
    let (Some(work_a), Some(work_b)) = (catalog.work(a), catalog.work(b)) else {
        return 0.0;
    };

    let mut titles_a: Vec<String> = Vec::new();
    let mut titles_b: Vec<String> = Vec::new();
    let mut contributors_a: Vec<Contributor> = Vec::new();
    let mut contributors_b: Vec<Contributor> = Vec::new();
    for (titles, contributors, work) in [
        (&mut titles_a, &mut contributors_a, work_a),
        (&mut titles_b, &mut contributors_b, work_b),
    ] {
        for record_id in &work.records {
            if let Some(record) = catalog.record(*record_id) {
                if let Some(title) = &record.title {
                    titles.push(title.clone());
                }
                contributors.extend(record.contributors.iter().cloned());
            }
        }
    }

    let author_component = author_similarity(&contributors_a, &contributors_b);
    if titles_a.is_empty() || titles_b.is_empty() {
        return author_component;
    }
    let title_component = 1.0 - histogram_distance(&titles_a, &titles_b) / 2.0;
    (title_component + author_component) / 2.0
}
