//! Deriving a Work's canonical display metadata
//!
//! The presentation fields are a majority vote over the Work's member
//! records: the most frequent title and the most frequent Author-role
//! contributor win, with equal frequencies broken by taking the
//! lexicographically smallest string so recalculation is deterministic.
//! Multi-author works are a known limitation: only one author string is
//! derived.

use std::collections::BTreeMap;

use collate_domain::ContributorRole;

use crate::catalog::{Catalog, CatalogError, WorkId};

/// Quality of a consolidation, as a function of how many independent
/// records corroborate it. Strictly increasing in the record count.
pub fn quality_for_record_count(records: usize) -> f64 {
    (1.0 + records as f64).ln()
}

/// Recompute a Work's canonical title, author and quality score in place.
pub fn calculate_presentation(catalog: &mut Catalog, work_id: WorkId) -> Result<(), CatalogError> {
    let work = catalog
        .work(work_id)
        .ok_or(CatalogError::UnknownWork(work_id))?;

    let mut title_votes: BTreeMap<String, usize> = BTreeMap::new();
    let mut author_votes: BTreeMap<String, usize> = BTreeMap::new();
    let mut records = 0usize;
    for record_id in &work.records {
        let Some(record) = catalog.record(*record_id) else {
            continue;
        };
        records += 1;
        if let Some(title) = &record.title {
            *title_votes.entry(title.clone()).or_insert(0) += 1;
        }
        for contributor in &record.contributors {
            if contributor.has_role(ContributorRole::Author) {
                *author_votes.entry(contributor.name.clone()).or_insert(0) += 1;
            }
        }
    }

    let title = most_frequent(title_votes);
    let author = most_frequent(author_votes);
    let quality = quality_for_record_count(records);

    let work = catalog.work_mut(work_id)?;
    work.title = title;
    work.author = author;
    work.quality = quality;
    Ok(())
}

/// The key with the highest count. The map iterates in key order, and only
/// a strictly higher count displaces the incumbent, so ties resolve to the
/// lexicographically smallest key.
fn most_frequent(votes: BTreeMap<String, usize>) -> Option<String> {
    let mut best: Option<(String, usize)> = None;
    for (candidate, count) in votes {
        let better = best.as_ref().map_or(true, |(_, best_count)| count > *best_count);
        if better {
            best = Some((candidate, count));
        }
    }
    best.map(|(candidate, _)| candidate)
}
