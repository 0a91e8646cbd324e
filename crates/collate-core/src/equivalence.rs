//! The identifier equivalence graph
//!
//! Authority sources assert that two identifiers denote the same or a
//! corresponding entity, with a confidence weight. Assertions are directed
//! edges but traversal treats them as usable in either direction, and
//! confidence decays multiplicatively along a path so weak assertions do
//! not propagate indefinitely.

use std::collections::{BTreeSet, HashMap};

use collate_domain::{DataSourceName, IdentifierType};
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CatalogError, IdentifierId, RecordId};

/// A weighted, sourced equivalence assertion between two identifiers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Equivalency {
    pub source: DataSourceName,
    pub from: IdentifierId,
    pub to: IdentifierId,
    pub weight: f64,
}

impl Catalog {
    /// Record that `source` asserts `a` and `b` are equivalent with the
    /// given confidence. Idempotent per (source, a, b): re-asserting
    /// updates the weight instead of duplicating the edge.
    pub fn assert_equivalence(
        &mut self,
        source: DataSourceName,
        a: IdentifierId,
        b: IdentifierId,
        weight: f64,
    ) -> Result<(), CatalogError> {
        if !(0.0..=1.0).contains(&weight) {
            return Err(CatalogError::WeightOutOfRange(weight));
        }
        if self.identifier(a).is_none() {
            return Err(CatalogError::UnknownIdentifier(a));
        }
        if self.identifier(b).is_none() {
            return Err(CatalogError::UnknownIdentifier(b));
        }

        // The edge is mirrored into both endpoints' adjacency lists so
        // traversal never needs a reverse index.
        for endpoint in [a, b] {
            let edges = self.equivalencies.entry(endpoint).or_default();
            if let Some(existing) = edges
                .iter_mut()
                .find(|e| e.source == source && e.from == a && e.to == b)
            {
                existing.weight = weight;
            } else {
                edges.push(Equivalency {
                    source,
                    from: a,
                    to: b,
                    weight,
                });
            }
        }
        Ok(())
    }

    /// All equivalence assertions touching an identifier.
    pub fn equivalencies_for(&self, id: IdentifierId) -> &[Equivalency] {
        self.equivalencies.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Bounded-confidence transitive closure around `start`.
    ///
    /// Breadth-first over the equivalence graph, at most `levels` hops,
    /// pruning any path whose cumulative weight (product of edge weights)
    /// drops below `threshold`. A visited map keyed by best-known
    /// confidence guarantees termination on cyclic graphs. `start` itself
    /// is always reachable with confidence 1. The optional `type_filter`
    /// restricts the returned set, not the traversal.
    pub fn equivalent_identifiers(
        &self,
        start: IdentifierId,
        levels: u32,
        threshold: f64,
        type_filter: Option<&[IdentifierType]>,
    ) -> Result<BTreeSet<IdentifierId>, CatalogError> {
        if self.identifier(start).is_none() {
            return Err(CatalogError::UnknownIdentifier(start));
        }

        let mut confidence: HashMap<IdentifierId, f64> = HashMap::from([(start, 1.0)]);
        let mut frontier = vec![(start, 1.0)];
        for _ in 0..levels {
            let mut next = Vec::new();
            for (node, node_confidence) in frontier.drain(..) {
                for edge in self.equivalencies_for(node) {
                    let neighbor = if edge.from == node { edge.to } else { edge.from };
                    let reached = node_confidence * edge.weight;
                    if reached < threshold {
                        continue;
                    }
                    let improved = confidence
                        .get(&neighbor)
                        .map_or(true, |&known| reached > known);
                    if improved {
                        confidence.insert(neighbor, reached);
                        next.push((neighbor, reached));
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }

        Ok(confidence
            .into_keys()
            .filter(|id| match type_filter {
                Some(types) => self
                    .identifier(*id)
                    .is_some_and(|i| types.contains(&i.foreign.id_type)),
                None => true,
            })
            .collect())
    }

    /// The records whose primary identifier is equivalent to this record's,
    /// including the record itself.
    pub fn equivalent_records(
        &self,
        record_id: RecordId,
        levels: u32,
        threshold: f64,
    ) -> Result<BTreeSet<RecordId>, CatalogError> {
        let record = self
            .record(record_id)
            .ok_or(CatalogError::UnknownRecord(record_id))?;
        let identifiers =
            self.equivalent_identifiers(record.primary_identifier, levels, threshold, None)?;
        Ok(self
            .records()
            .filter(|r| identifiers.contains(&r.primary_identifier))
            .map(|r| r.id)
            .collect())
    }

    /// Identifiers of `source_type` with no equivalence coverage toward
    /// `target_types`.
    ///
    /// An identifier is covered when it has a direct assertion to a
    /// `target_types` identifier, a direct assertion to a `via_type`
    /// intermediate, or a two-hop path through such an intermediate. The
    /// result is the uncovered remainder, used to find records needing
    /// bibliographic enrichment from a specific authority.
    pub fn missing_coverage_from(
        &self,
        source_type: IdentifierType,
        via_type: IdentifierType,
        target_types: &[IdentifierType],
    ) -> Vec<IdentifierId> {
        self.identifiers()
            .filter(|i| i.foreign.id_type == source_type)
            .filter(|i| !self.has_coverage(i.id, via_type, target_types))
            .map(|i| i.id)
            .collect()
    }

    fn has_coverage(
        &self,
        id: IdentifierId,
        via_type: IdentifierType,
        target_types: &[IdentifierType],
    ) -> bool {
        for edge in self.equivalencies_for(id) {
            let neighbor = if edge.from == id { edge.to } else { edge.from };
            let Some(identifier) = self.identifier(neighbor) else {
                continue;
            };
            if target_types.contains(&identifier.foreign.id_type) {
                return true;
            }
            if identifier.foreign.id_type == via_type {
                // An assertion into the authority's own namespace counts as
                // coverage in progress, as does anything one hop beyond it.
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collate_domain::IdentifierType;

    fn identifier(catalog: &mut Catalog, id_type: IdentifierType, value: &str) -> IdentifierId {
        catalog.identifier_for_foreign_id(id_type, value).unwrap().0
    }

    #[test]
    fn reasserting_updates_the_weight() {
        let mut catalog = Catalog::new();
        let a = identifier(&mut catalog, IdentifierType::GutenbergId, "1");
        let b = identifier(&mut catalog, IdentifierType::OclcNumber, "22");
        catalog
            .assert_equivalence(DataSourceName::Oclc, a, b, 1.0)
            .unwrap();
        catalog
            .assert_equivalence(DataSourceName::Oclc, a, b, 0.5)
            .unwrap();
        assert_eq!(1, catalog.equivalencies_for(a).len());
        assert_eq!(0.5, catalog.equivalencies_for(a)[0].weight);
    }

    #[test]
    fn weight_outside_unit_interval_is_rejected() {
        let mut catalog = Catalog::new();
        let a = identifier(&mut catalog, IdentifierType::GutenbergId, "1");
        let b = identifier(&mut catalog, IdentifierType::OclcNumber, "22");
        let err = catalog
            .assert_equivalence(DataSourceName::Oclc, a, b, 1.5)
            .unwrap_err();
        assert!(matches!(err, CatalogError::WeightOutOfRange(_)));
    }

    #[test]
    fn traversal_is_bidirectional_and_bounded() {
        let mut catalog = Catalog::new();
        let a = identifier(&mut catalog, IdentifierType::GutenbergId, "1");
        let b = identifier(&mut catalog, IdentifierType::OclcNumber, "22");
        let c = identifier(&mut catalog, IdentifierType::OpenLibraryId, "W1111");
        // a -> b, c -> b: c is reachable from a through b against edge
        // direction.
        catalog
            .assert_equivalence(DataSourceName::Oclc, a, b, 1.0)
            .unwrap();
        catalog
            .assert_equivalence(DataSourceName::OclcLinkedData, c, b, 1.0)
            .unwrap();

        let one_hop = catalog.equivalent_identifiers(a, 1, 0.5, None).unwrap();
        assert!(one_hop.contains(&a) && one_hop.contains(&b));
        assert!(!one_hop.contains(&c));

        let two_hops = catalog.equivalent_identifiers(a, 2, 0.5, None).unwrap();
        assert!(two_hops.contains(&c));
    }

    #[test]
    fn weak_paths_are_pruned() {
        let mut catalog = Catalog::new();
        let a = identifier(&mut catalog, IdentifierType::GutenbergId, "1");
        let b = identifier(&mut catalog, IdentifierType::OclcNumber, "22");
        let c = identifier(&mut catalog, IdentifierType::Isbn, "9780000000000");
        catalog
            .assert_equivalence(DataSourceName::Oclc, a, b, 0.7)
            .unwrap();
        catalog
            .assert_equivalence(DataSourceName::Oclc, b, c, 0.7)
            .unwrap();

        // 0.7 * 0.7 = 0.49 falls below the threshold.
        let reachable = catalog.equivalent_identifiers(a, 3, 0.5, None).unwrap();
        assert!(reachable.contains(&b));
        assert!(!reachable.contains(&c));
    }

    #[test]
    fn cycles_terminate() {
        let mut catalog = Catalog::new();
        let a = identifier(&mut catalog, IdentifierType::GutenbergId, "1");
        let b = identifier(&mut catalog, IdentifierType::OclcNumber, "22");
        catalog
            .assert_equivalence(DataSourceName::Oclc, a, b, 1.0)
            .unwrap();
        catalog
            .assert_equivalence(DataSourceName::OclcLinkedData, b, a, 1.0)
            .unwrap();

        let reachable = catalog.equivalent_identifiers(a, 100, 0.1, None).unwrap();
        assert_eq!(2, reachable.len());
    }

    #[test]
    fn type_filter_restricts_output_not_traversal() {
        let mut catalog = Catalog::new();
        let a = identifier(&mut catalog, IdentifierType::GutenbergId, "1");
        let b = identifier(&mut catalog, IdentifierType::OclcNumber, "22");
        let c = identifier(&mut catalog, IdentifierType::Isbn, "9780000000000");
        catalog
            .assert_equivalence(DataSourceName::Oclc, a, b, 1.0)
            .unwrap();
        catalog
            .assert_equivalence(DataSourceName::Oclc, b, c, 1.0)
            .unwrap();

        let isbns = catalog
            .equivalent_identifiers(a, 2, 0.5, Some(&[IdentifierType::Isbn]))
            .unwrap();
        // c is only reachable through b, which the filter excludes from the
        // output but not from the path.
        assert_eq!(BTreeSet::from([c]), isbns);
    }

    #[test]
    fn records_are_equivalent_through_shared_authority_numbers() {
        let mut catalog = Catalog::new();

        // A Gutenberg text and an Open Library text, linked by two
        // authorities to the same OCLC Number.
        let (gutenberg, _) = catalog
            .record_for_foreign_id(
                DataSourceName::Gutenberg,
                IdentifierType::GutenbergId,
                "1",
            )
            .unwrap();
        let (open_library, _) = catalog
            .record_for_foreign_id(
                DataSourceName::OpenLibrary,
                IdentifierType::OpenLibraryId,
                "W1111",
            )
            .unwrap();
        let oclc_number = identifier(&mut catalog, IdentifierType::OclcNumber, "22");
        let gutenberg_id = catalog.record(gutenberg).unwrap().primary_identifier;
        let open_library_id = catalog.record(open_library).unwrap().primary_identifier;
        catalog
            .assert_equivalence(DataSourceName::Oclc, gutenberg_id, oclc_number, 1.0)
            .unwrap();
        catalog
            .assert_equivalence(
                DataSourceName::OclcLinkedData,
                open_library_id,
                oclc_number,
                1.0,
            )
            .unwrap();

        // A cover image record whose URI was manually associated with the
        // Gutenberg text directly.
        let (cover, _) = catalog
            .record_for_foreign_id(
                DataSourceName::Web,
                IdentifierType::Uri,
                "http://recoveringtheclassics.com/pride-and-prejudice.jpg",
            )
            .unwrap();
        let cover_id = catalog.record(cover).unwrap().primary_identifier;
        catalog
            .assert_equivalence(DataSourceName::Manual, gutenberg_id, cover_id, 1.0)
            .unwrap();

        // An unrelated Gutenberg record that must not show up.
        let (unrelated, _) = catalog
            .record_for_foreign_id(
                DataSourceName::Gutenberg,
                IdentifierType::GutenbergId,
                "2",
            )
            .unwrap();

        let records = catalog.equivalent_records(gutenberg, 3, 0.5).unwrap();
        assert_eq!(3, records.len());
        assert!(records.contains(&gutenberg));
        assert!(records.contains(&open_library));
        assert!(records.contains(&cover));
        assert!(!records.contains(&unrelated));
    }

    #[test]
    fn missing_coverage() {
        let mut catalog = Catalog::new();
        let covered = identifier(&mut catalog, IdentifierType::GutenbergId, "1");
        let uncovered = identifier(&mut catalog, IdentifierType::GutenbergId, "2");
        let oclc = identifier(&mut catalog, IdentifierType::OclcWork, "10034");
        let _web = identifier(&mut catalog, IdentifierType::Uri, "http://www.foo.com/");
        catalog
            .assert_equivalence(DataSourceName::Oclc, covered, oclc, 1.0)
            .unwrap();

        let missing = catalog.missing_coverage_from(
            IdentifierType::GutenbergId,
            IdentifierType::OclcWork,
            &[IdentifierType::OclcNumber],
        );
        assert_eq!(vec![uncovered], missing);
    }
}
