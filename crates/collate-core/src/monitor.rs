//! Scheduled passes over the catalog
//!
//! Two monitors: one resolves queued identifiers into records and license
//! pools by calling upstream coverage providers, one makes consolidated
//! Works presentation-ready. Both process bounded batches and record
//! per-item outcomes instead of aborting the pass — only caller contract
//! violations propagate as errors.

use chrono::{DateTime, Duration, Utc};
use collate_domain::{DataSource, DataSourceName};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, CatalogError, IdentifierId, WorkId};
use crate::presentation::calculate_presentation;

/// Resolution state for an identifier awaiting bibliographic coverage.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnresolvedIdentifier {
    pub identifier: IdentifierId,
    pub status_code: Option<u16>,
    pub exception: Option<String>,
    pub first_attempt: Option<DateTime<Utc>>,
    pub most_recent_attempt: Option<DateTime<Utc>>,
    /// Persistent failures stop retrying; transient ones retry after the
    /// monitor's retry window.
    pub terminal: bool,
}

impl UnresolvedIdentifier {
    pub fn new(identifier: IdentifierId) -> Self {
        Self {
            identifier,
            status_code: None,
            exception: None,
            first_attempt: None,
            most_recent_attempt: None,
            terminal: false,
        }
    }

    fn record_failure(&mut self, status_code: u16, message: String, now: DateTime<Utc>, terminal: bool) {
        self.status_code = Some(status_code);
        self.exception = Some(message);
        self.first_attempt.get_or_insert(now);
        self.most_recent_attempt = Some(now);
        self.terminal = terminal;
    }
}

/// How an upstream coverage attempt failed.
#[derive(Debug, thiserror::Error)]
pub enum CoverageError {
    /// Network failure or upstream flakiness; the identifier is retried on
    /// a later pass.
    #[error("upstream source unavailable: {0}")]
    Transient(String),

    /// The upstream answered but can never supply coverage for this
    /// identifier; never retried.
    #[error("persistent failure: {0}")]
    Persistent(String),

    /// 5xx-equivalent: the whole provider is down, so give up on it for
    /// the rest of this pass.
    #[error("provider returned server error: {0}")]
    ProviderDown(String),
}

/// The seam to an upstream bibliographic provider. Implementations do
/// their network I/O here and write whatever coverage they obtained
/// (records, equivalencies, measurements) into the catalog.
pub trait CoverageProvider {
    /// The data source this provider supplies coverage for.
    fn source(&self) -> DataSourceName;

    /// Obtain coverage for one identifier.
    fn ensure_coverage(
        &mut self,
        catalog: &mut Catalog,
        identifier: IdentifierId,
    ) -> Result<(), CoverageError>;
}

/// What a resolution pass accomplished.
#[derive(Debug, Default)]
pub struct ResolutionOutcome {
    pub resolved: Vec<IdentifierId>,
    pub failed: Vec<IdentifierId>,
}

/// Turns unresolved identifiers into records with license pools by calling
/// coverage providers, in bounded batches per provider.
#[derive(Clone, Debug)]
pub struct IdentifierResolutionMonitor {
    pub batch_size: usize,
    /// Cap on batches per provider per pass, so one huge backlog cannot
    /// starve the other identifier types.
    pub max_batches: usize,
    /// How long to wait before retrying a failed identifier.
    pub retry_window: Duration,
}

impl Default for IdentifierResolutionMonitor {
    fn default() -> Self {
        Self {
            batch_size: 25,
            max_batches: 10,
            retry_window: Duration::days(1),
        }
    }
}

impl IdentifierResolutionMonitor {
    /// Run one pass over every provider. Per-item failures are recorded on
    /// the unresolved entry and the pass continues; only catalog contract
    /// violations surface as errors.
    pub fn run_once(
        &self,
        catalog: &mut Catalog,
        providers: &mut [&mut dyn CoverageProvider],
        now: DateTime<Utc>,
    ) -> Result<ResolutionOutcome, CatalogError> {
        let mut outcome = ResolutionOutcome::default();
        for provider in providers.iter_mut() {
            let source = DataSource::lookup(provider.source());
            let Some(id_type) = source.primary_identifier_type else {
                continue;
            };

            let mut batches = 0;
            'provider: while batches < self.max_batches {
                let batch: Vec<IdentifierId> = catalog
                    .unresolved_iter()
                    .filter(|u| self.needs_processing(u, now))
                    .filter(|u| {
                        catalog
                            .identifier(u.identifier)
                            .is_some_and(|i| i.foreign.id_type == id_type)
                    })
                    .map(|u| u.identifier)
                    .take(self.batch_size)
                    .collect();
                if batch.is_empty() {
                    break;
                }
                batches += 1;

                for identifier_id in batch {
                    match provider.ensure_coverage(catalog, identifier_id) {
                        Ok(()) => {
                            self.resolve(catalog, source, identifier_id)?;
                            outcome.resolved.push(identifier_id);
                        }
                        Err(CoverageError::ProviderDown(message)) => {
                            warn!(source = %source.name, %message, "provider down, abandoning for this pass");
                            catalog.unresolved_mut(identifier_id)?.record_failure(
                                500, message, now, false,
                            );
                            outcome.failed.push(identifier_id);
                            break 'provider;
                        }
                        Err(CoverageError::Transient(message)) => {
                            debug!(identifier = %identifier_id, %message, "transient resolution failure");
                            catalog.unresolved_mut(identifier_id)?.record_failure(
                                502, message, now, false,
                            );
                            outcome.failed.push(identifier_id);
                        }
                        Err(CoverageError::Persistent(message)) => {
                            warn!(identifier = %identifier_id, %message, "persistent resolution failure");
                            catalog.unresolved_mut(identifier_id)?.record_failure(
                                500, message, now, true,
                            );
                            outcome.failed.push(identifier_id);
                        }
                    }
                }
            }
        }
        info!(
            resolved = outcome.resolved.len(),
            failed = outcome.failed.len(),
            "identifier resolution pass complete"
        );
        Ok(outcome)
    }

    fn needs_processing(&self, unresolved: &UnresolvedIdentifier, now: DateTime<Utc>) -> bool {
        if unresolved.terminal {
            return false;
        }
        match (&unresolved.exception, unresolved.most_recent_attempt) {
            (None, _) => true,
            (Some(_), None) => true,
            (Some(_), Some(attempt)) => now - attempt > self.retry_window,
        }
    }

    /// A covered identifier becomes a record, and a license pool when the
    /// source licenses books, and leaves the unresolved queue.
    fn resolve(
        &self,
        catalog: &mut Catalog,
        source: DataSource,
        identifier_id: IdentifierId,
    ) -> Result<(), CatalogError> {
        let foreign = catalog
            .identifier(identifier_id)
            .ok_or(CatalogError::UnknownIdentifier(identifier_id))?
            .foreign
            .clone();
        catalog.record_for_foreign_id(source.name, foreign.id_type, &foreign.value)?;
        if source.offers_licenses {
            catalog.pool_for_foreign_id(source.name, foreign.id_type, &foreign.value)?;
        }
        catalog.clear_unresolved(identifier_id);
        debug!(identifier = %identifier_id, source = %source.name, "identifier resolved");
        Ok(())
    }
}

/// Makes consolidated Works presentation-ready in bounded batches. A Work
/// with no derivable canonical title is recorded as a terminal failure so
/// it is not retried forever.
#[derive(Clone, Debug)]
pub struct PresentationReadyMonitor {
    pub batch_size: usize,
}

impl Default for PresentationReadyMonitor {
    fn default() -> Self {
        Self { batch_size: 10 }
    }
}

impl PresentationReadyMonitor {
    /// Returns how many Works became presentation-ready.
    pub fn run_once(&self, catalog: &mut Catalog) -> Result<usize, CatalogError> {
        let pending: Vec<WorkId> = catalog
            .works()
            .filter(|w| !w.presentation_ready && w.presentation_ready_exception.is_none())
            .map(|w| w.id)
            .take(self.batch_size)
            .collect();

        let mut ready = 0;
        for work_id in pending {
            calculate_presentation(catalog, work_id)?;
            let work = catalog.work_mut(work_id)?;
            if work.title.is_some() {
                work.presentation_ready = true;
                ready += 1;
            } else {
                work.presentation_ready_exception =
                    Some("no canonical title derivable from member records".to_string());
                warn!(work = %work_id, "work cannot be made presentation-ready");
            }
        }
        if ready > 0 {
            info!(ready, "presentation pass complete");
        }
        Ok(ready)
    }
}
