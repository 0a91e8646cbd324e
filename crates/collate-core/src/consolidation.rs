//! Work consolidation: clustering records and pools into Works
//!
//! The consolidator decides, for a license pool, whether to adopt an
//! existing Work, create a new one, or merge conflicting Works. Evidence
//! comes from the equivalence graph; the merge guard uses an injectable
//! Work comparator so callers (and tests) can substitute their own policy.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::catalog::{Catalog, CatalogError, PoolId, RecordId, WorkId};
use crate::presentation::calculate_presentation;
use crate::similarity::record::work_similarity;

/// Bounds for the equivalence traversal and the default merge policy.
#[derive(Clone, Copy, Debug)]
pub struct ConsolidationConfig {
    /// Maximum hops through the equivalence graph.
    pub levels: u32,
    /// Minimum cumulative path confidence for an identifier to count as
    /// equivalent.
    pub equivalence_threshold: f64,
    /// Minimum Work similarity for a policy merge via
    /// [`WorkConsolidator::merge_into_default`].
    pub merge_threshold: f64,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            levels: 3,
            equivalence_threshold: 0.5,
            merge_threshold: 0.5,
        }
    }
}

/// The consolidation engine. Stateless apart from its configuration; all
/// data lives in the catalog.
#[derive(Clone, Copy, Debug, Default)]
pub struct WorkConsolidator {
    pub config: ConsolidationConfig,
}

impl WorkConsolidator {
    pub fn new(config: ConsolidationConfig) -> Self {
        Self { config }
    }

    /// Assign a license pool to a Work, creating or merging Works as the
    /// evidence requires. Returns the Work and whether it was newly
    /// created. Re-running on an already-consolidated pool is a no-op.
    pub fn calculate_work(
        &self,
        catalog: &mut Catalog,
        pool_id: PoolId,
    ) -> Result<(WorkId, bool), CatalogError> {
        let pool = catalog
            .pool(pool_id)
            .ok_or(CatalogError::UnknownPool(pool_id))?;
        if let Some(work_id) = pool.work {
            return Ok((work_id, false));
        }
        let pool_source = pool.source;
        let pool_identifier = pool.identifier;

        // The easy case: the pool's own source already has a record for
        // this identifier, and that record belongs to a Work. Adopt it
        // without any similarity computation.
        let primary = catalog
            .records()
            .find(|r| r.source == pool_source && r.primary_identifier == pool_identifier)
            .map(|r| (r.id, r.work));
        if let Some((_, Some(work_id))) = primary {
            catalog.add_pool_to_work(pool_id, work_id)?;
            calculate_presentation(catalog, work_id)?;
            debug!(pool = %pool_id, work = %work_id, "pool adopted its primary record's work");
            return Ok((work_id, false));
        }

        // Gather every record reachable from the pool's identifier through
        // the equivalence graph.
        let equivalent = catalog.equivalent_identifiers(
            pool_identifier,
            self.config.levels,
            self.config.equivalence_threshold,
            None,
        )?;
        let candidates: Vec<RecordId> = catalog
            .records()
            .filter(|r| equivalent.contains(&r.primary_identifier))
            .map(|r| r.id)
            .collect();

        // The distinct Works already claiming any candidate.
        let mut claimants: BTreeSet<WorkId> = BTreeSet::new();
        for record_id in &candidates {
            if let Some(work_id) = catalog.record(*record_id).and_then(|r| r.work) {
                claimants.insert(work_id);
            }
        }

        let (work_id, created) = match claimants.first().copied() {
            None => (catalog.new_work(), true),
            Some(only) if claimants.len() == 1 => (only, false),
            Some(first) => {
                // Conflict: several Works claim equivalent records. Keep
                // the one with the most member records and merge the rest
                // into it. Iteration is in ascending id order, so ties go
                // to the lowest id.
                let survivor = claimants.iter().copied().fold(first, |best, candidate| {
                    let best_records = catalog.work(best).map_or(0, |w| w.records.len());
                    let candidate_records =
                        catalog.work(candidate).map_or(0, |w| w.records.len());
                    if candidate_records > best_records {
                        candidate
                    } else {
                        best
                    }
                });
                info!(
                    pool = %pool_id,
                    survivor = %survivor,
                    conflicting = claimants.len(),
                    "consolidation conflict, merging works"
                );
                for other in claimants {
                    if other != survivor {
                        self.merge_into(catalog, other, survivor, 0.0, work_similarity)?;
                    }
                }
                (survivor, false)
            }
        };

        for record_id in candidates {
            catalog.add_record_to_work(record_id, work_id)?;
        }
        catalog.add_pool_to_work(pool_id, work_id)?;
        calculate_presentation(catalog, work_id)?;
        debug!(pool = %pool_id, work = %work_id, created, "pool consolidated");
        Ok((work_id, created))
    }

    /// Merge `source` into `target` if the comparator scores them at or
    /// above `threshold`. Below the threshold nothing is mutated and the
    /// result is `Ok(false)` — not similar enough is a policy outcome, not
    /// an error. A threshold of 0 forces the merge. Merging a Work into
    /// itself is a no-op success.
    ///
    /// Reassignment is a set union on membership, so a retry after a
    /// partial failure cannot duplicate members.
    pub fn merge_into<F>(
        &self,
        catalog: &mut Catalog,
        source: WorkId,
        target: WorkId,
        threshold: f64,
        similarity: F,
    ) -> Result<bool, CatalogError>
    where
        F: Fn(&Catalog, WorkId, WorkId) -> f64,
    {
        if catalog.work(target).is_none() {
            return Err(CatalogError::UnknownWork(target));
        }
        if source == target {
            return Ok(true);
        }
        let source_work = catalog
            .work(source)
            .ok_or(CatalogError::UnknownWork(source))?;

        let score = similarity(catalog, source, target);
        if score < threshold {
            debug!(%source, %target, score, threshold, "merge rejected, not similar enough");
            return Ok(false);
        }

        let records: Vec<RecordId> = source_work.records.iter().copied().collect();
        let pools: Vec<PoolId> = source_work.pools.iter().copied().collect();
        for record_id in records {
            catalog.add_record_to_work(record_id, target)?;
        }
        for pool_id in pools {
            catalog.add_pool_to_work(pool_id, target)?;
        }
        catalog.delete_work(source)?;
        calculate_presentation(catalog, target)?;
        info!(%source, %target, score, "works merged");
        Ok(true)
    }

    /// [`merge_into`](Self::merge_into) with the default Work comparator
    /// and configured threshold.
    pub fn merge_into_default(
        &self,
        catalog: &mut Catalog,
        source: WorkId,
        target: WorkId,
    ) -> Result<bool, CatalogError> {
        self.merge_into(
            catalog,
            source,
            target,
            self.config.merge_threshold,
            work_similarity,
        )
    }
}
