//! The in-memory catalog: identifiers, records, license pools, works
//!
//! Arena-style store with typed sequential ids. Lookup-or-create
//! constructors return `(id, was_new)` pairs; everything iterates in id
//! order so consolidation decisions are deterministic.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use collate_domain::{
    Contributor, ContributorRole, DataSource, DataSourceName, ForeignId, IdentifierType,
};
use serde::{Deserialize, Serialize};

use crate::equivalence::Equivalency;
use crate::monitor::UnresolvedIdentifier;

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
            Deserialize,
        )]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Id of an identifier node in the catalog.
    IdentifierId
);
entity_id!(
    /// Id of a bibliographic record.
    RecordId
);
entity_id!(
    /// Id of a license pool.
    PoolId
);
entity_id!(
    /// Id of a Work.
    WorkId
);

/// Errors from the catalog. Every variant is a caller contract violation or
/// a dangling id; recoverable conditions (no match, below threshold) are
/// expressed as ordinary return values instead.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("identifier value may not be empty")]
    EmptyIdentifierValue,

    #[error("data source \"{0}\" does not offer licenses")]
    SourceOffersNoLicenses(DataSourceName),

    // The field cannot be called `source`: thiserror would treat it as the
    // error's cause and demand an Error impl on DataSourceName.
    #[error(
        "license pools for data source '{data_source}' are keyed to identifier type \
         '{expected}' (not '{provided}', which was provided)"
    )]
    PoolIdentifierTypeMismatch {
        data_source: DataSourceName,
        expected: IdentifierType,
        provided: IdentifierType,
    },

    #[error("equivalence weight {0} is outside [0, 1]")]
    WeightOutOfRange(f64),

    #[error("unknown identifier {0}")]
    UnknownIdentifier(IdentifierId),

    #[error("unknown record {0}")]
    UnknownRecord(RecordId),

    #[error("unknown license pool {0}")]
    UnknownPool(PoolId),

    #[error("unknown work {0}")]
    UnknownWork(WorkId),
}

/// A node in the identifier graph: one external key for an edition or work.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Identifier {
    pub id: IdentifierId,
    pub foreign: ForeignId,
}

/// One source's bibliographic view of one edition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkRecord {
    pub id: RecordId,
    pub source: DataSourceName,
    pub primary_identifier: IdentifierId,
    pub title: Option<String>,
    pub language: Option<String>,
    pub contributors: Vec<Contributor>,
    pub work: Option<WorkId>,
}

impl WorkRecord {
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn set_language(&mut self, language: impl Into<String>) {
        self.language = Some(language.into());
    }

    /// Credit a contributor, accumulating roles on re-fetch rather than
    /// duplicating the name.
    pub fn add_contributor(&mut self, name: impl Into<String>, role: ContributorRole) {
        let name = name.into();
        if let Some(existing) = self.contributors.iter_mut().find(|c| c.name == name) {
            if !existing.roles.contains(&role) {
                existing.roles.push(role);
            }
            return;
        }
        self.contributors.push(Contributor::new(name).with_role(role));
    }
}

/// One licensing source's availability state for one edition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LicensePool {
    pub id: PoolId,
    pub source: DataSourceName,
    pub identifier: IdentifierId,
    pub work: Option<WorkId>,
    pub licenses_owned: i64,
    pub licenses_available: i64,
    pub licenses_reserved: i64,
    pub patrons_in_hold_queue: i64,
}

/// A canonical cluster of records and license pools believed to describe
/// the same real-world work, plus its derived presentation fields.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Work {
    pub id: WorkId,
    pub records: BTreeSet<RecordId>,
    pub pools: BTreeSet<PoolId>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub quality: f64,
    pub presentation_ready: bool,
    pub presentation_ready_exception: Option<String>,
}

/// The whole catalog. Single-writer by design: the consolidation pipeline
/// threads `&mut Catalog` through one scheduled worker at a time.
#[derive(Debug, Default)]
pub struct Catalog {
    identifiers: BTreeMap<IdentifierId, Identifier>,
    identifiers_by_foreign: HashMap<ForeignId, IdentifierId>,
    records: BTreeMap<RecordId, WorkRecord>,
    records_by_key: HashMap<(DataSourceName, ForeignId), RecordId>,
    pools: BTreeMap<PoolId, LicensePool>,
    pools_by_key: HashMap<(DataSourceName, ForeignId), PoolId>,
    works: BTreeMap<WorkId, Work>,
    pub(crate) equivalencies: BTreeMap<IdentifierId, Vec<Equivalency>>,
    unresolved: BTreeMap<IdentifierId, UnresolvedIdentifier>,
    next_identifier: u64,
    next_record: u64,
    next_pool: u64,
    next_work: u64,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    // ----- identifiers -----

    /// Look up or create the identifier for a foreign (type, value) pair.
    pub fn identifier_for_foreign_id(
        &mut self,
        id_type: IdentifierType,
        value: &str,
    ) -> Result<(IdentifierId, bool), CatalogError> {
        if value.trim().is_empty() {
            return Err(CatalogError::EmptyIdentifierValue);
        }
        let foreign = ForeignId::new(id_type, value);
        if let Some(&id) = self.identifiers_by_foreign.get(&foreign) {
            return Ok((id, false));
        }
        let id = IdentifierId(self.next_identifier);
        self.next_identifier += 1;
        self.identifiers_by_foreign.insert(foreign.clone(), id);
        self.identifiers.insert(id, Identifier { id, foreign });
        Ok((id, true))
    }

    pub fn identifier(&self, id: IdentifierId) -> Option<&Identifier> {
        self.identifiers.get(&id)
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &Identifier> {
        self.identifiers.values()
    }

    // ----- records -----

    /// Look up or create a source's record for a foreign id.
    pub fn record_for_foreign_id(
        &mut self,
        source: DataSourceName,
        id_type: IdentifierType,
        value: &str,
    ) -> Result<(RecordId, bool), CatalogError> {
        let (identifier, _) = self.identifier_for_foreign_id(id_type, value)?;
        let key = (source, ForeignId::new(id_type, value));
        if let Some(&id) = self.records_by_key.get(&key) {
            return Ok((id, false));
        }
        let id = RecordId(self.next_record);
        self.next_record += 1;
        self.records_by_key.insert(key, id);
        self.records.insert(
            id,
            WorkRecord {
                id,
                source,
                primary_identifier: identifier,
                title: None,
                language: None,
                contributors: Vec::new(),
                work: None,
            },
        );
        Ok((id, true))
    }

    pub fn record(&self, id: RecordId) -> Option<&WorkRecord> {
        self.records.get(&id)
    }

    pub fn record_mut(&mut self, id: RecordId) -> Result<&mut WorkRecord, CatalogError> {
        self.records
            .get_mut(&id)
            .ok_or(CatalogError::UnknownRecord(id))
    }

    pub fn records(&self) -> impl Iterator<Item = &WorkRecord> {
        self.records.values()
    }

    // ----- license pools -----

    /// Look up or create a licensing source's pool for a foreign id.
    ///
    /// A source that offers no licenses cannot have pools, and a licensing
    /// source only issues pools keyed to its own primary identifier type.
    /// Both are contract violations, not retryable conditions.
    pub fn pool_for_foreign_id(
        &mut self,
        source: DataSourceName,
        id_type: IdentifierType,
        value: &str,
    ) -> Result<(PoolId, bool), CatalogError> {
        let facts = DataSource::lookup(source);
        if !facts.offers_licenses {
            return Err(CatalogError::SourceOffersNoLicenses(source));
        }
        match facts.primary_identifier_type {
            Some(expected) if expected != id_type => {
                return Err(CatalogError::PoolIdentifierTypeMismatch {
                    data_source: source,
                    expected,
                    provided: id_type,
                });
            }
            _ => {}
        }

        let (identifier, _) = self.identifier_for_foreign_id(id_type, value)?;
        let key = (source, ForeignId::new(id_type, value));
        if let Some(&id) = self.pools_by_key.get(&key) {
            return Ok((id, false));
        }
        let id = PoolId(self.next_pool);
        self.next_pool += 1;
        self.pools_by_key.insert(key, id);
        self.pools.insert(
            id,
            LicensePool {
                id,
                source,
                identifier,
                work: None,
                licenses_owned: 0,
                licenses_available: 0,
                licenses_reserved: 0,
                patrons_in_hold_queue: 0,
            },
        );
        Ok((id, true))
    }

    pub fn pool(&self, id: PoolId) -> Option<&LicensePool> {
        self.pools.get(&id)
    }

    pub fn pool_mut(&mut self, id: PoolId) -> Result<&mut LicensePool, CatalogError> {
        self.pools.get_mut(&id).ok_or(CatalogError::UnknownPool(id))
    }

    pub fn pools(&self) -> impl Iterator<Item = &LicensePool> {
        self.pools.values()
    }

    /// Pools not yet consolidated into any Work.
    pub fn pools_with_no_work(&self) -> Vec<PoolId> {
        self.pools
            .values()
            .filter(|p| p.work.is_none())
            .map(|p| p.id)
            .collect()
    }

    // ----- works -----

    pub fn new_work(&mut self) -> WorkId {
        let id = WorkId(self.next_work);
        self.next_work += 1;
        self.works.insert(
            id,
            Work {
                id,
                ..Work::default()
            },
        );
        id
    }

    pub fn work(&self, id: WorkId) -> Option<&Work> {
        self.works.get(&id)
    }

    pub fn work_mut(&mut self, id: WorkId) -> Result<&mut Work, CatalogError> {
        self.works.get_mut(&id).ok_or(CatalogError::UnknownWork(id))
    }

    pub fn works(&self) -> impl Iterator<Item = &Work> {
        self.works.values()
    }

    pub fn work_count(&self) -> usize {
        self.works.len()
    }

    /// Attach a record to a work, detaching it from its previous work if
    /// any. Membership is a set: re-attaching is a no-op.
    pub fn add_record_to_work(
        &mut self,
        record_id: RecordId,
        work_id: WorkId,
    ) -> Result<(), CatalogError> {
        if !self.works.contains_key(&work_id) {
            return Err(CatalogError::UnknownWork(work_id));
        }
        let record = self
            .records
            .get_mut(&record_id)
            .ok_or(CatalogError::UnknownRecord(record_id))?;
        if let Some(previous) = record.work.replace(work_id) {
            if previous != work_id {
                if let Some(work) = self.works.get_mut(&previous) {
                    work.records.remove(&record_id);
                }
            }
        }
        self.works
            .get_mut(&work_id)
            .ok_or(CatalogError::UnknownWork(work_id))?
            .records
            .insert(record_id);
        Ok(())
    }

    /// Attach a pool to a work, detaching it from its previous work if any.
    pub fn add_pool_to_work(
        &mut self,
        pool_id: PoolId,
        work_id: WorkId,
    ) -> Result<(), CatalogError> {
        if !self.works.contains_key(&work_id) {
            return Err(CatalogError::UnknownWork(work_id));
        }
        let pool = self
            .pools
            .get_mut(&pool_id)
            .ok_or(CatalogError::UnknownPool(pool_id))?;
        if let Some(previous) = pool.work.replace(work_id) {
            if previous != work_id {
                if let Some(work) = self.works.get_mut(&previous) {
                    work.pools.remove(&pool_id);
                }
            }
        }
        self.works
            .get_mut(&work_id)
            .ok_or(CatalogError::UnknownWork(work_id))?
            .pools
            .insert(pool_id);
        Ok(())
    }

    /// Delete a work. Members must have been reassigned first; any stragglers
    /// are orphaned back to unconsolidated.
    pub fn delete_work(&mut self, work_id: WorkId) -> Result<(), CatalogError> {
        let work = self
            .works
            .remove(&work_id)
            .ok_or(CatalogError::UnknownWork(work_id))?;
        for record_id in work.records {
            if let Some(record) = self.records.get_mut(&record_id) {
                if record.work == Some(work_id) {
                    record.work = None;
                }
            }
        }
        for pool_id in work.pools {
            if let Some(pool) = self.pools.get_mut(&pool_id) {
                if pool.work == Some(work_id) {
                    pool.work = None;
                }
            }
        }
        Ok(())
    }

    // ----- unresolved identifiers -----

    /// Queue an identifier for resolution by the monitor. Re-registering an
    /// already-queued identifier is a no-op.
    pub fn register_unresolved(&mut self, id: IdentifierId) -> Result<(), CatalogError> {
        if !self.identifiers.contains_key(&id) {
            return Err(CatalogError::UnknownIdentifier(id));
        }
        self.unresolved
            .entry(id)
            .or_insert_with(|| UnresolvedIdentifier::new(id));
        Ok(())
    }

    pub fn unresolved(&self, id: IdentifierId) -> Option<&UnresolvedIdentifier> {
        self.unresolved.get(&id)
    }

    pub fn unresolved_mut(
        &mut self,
        id: IdentifierId,
    ) -> Result<&mut UnresolvedIdentifier, CatalogError> {
        self.unresolved
            .get_mut(&id)
            .ok_or(CatalogError::UnknownIdentifier(id))
    }

    pub fn unresolved_iter(&self) -> impl Iterator<Item = &UnresolvedIdentifier> {
        self.unresolved.values()
    }

    pub fn clear_unresolved(&mut self, id: IdentifierId) {
        self.unresolved.remove(&id);
    }
}
