//! Work consolidation and similarity scoring
//!
//! This crate clusters bibliographic records from many sources into
//! canonical Works:
//! - similarity: word-frequency and wordbag metrics over titles and authors
//! - catalog: the in-memory store of identifiers, records, pools and works
//! - equivalence: the weighted identifier-equivalence graph and its
//!   bounded-confidence closure
//! - consolidation: attaching license pools to Works, merging Works
//! - presentation: deriving a Work's canonical title, author and quality
//! - circulation: applying circulation events to license pools
//! - monitor: scheduled passes that resolve identifiers and make Works
//!   presentation-ready

pub mod catalog;
pub mod circulation;
pub mod consolidation;
pub mod equivalence;
pub mod monitor;
pub mod presentation;
pub mod similarity;

pub use catalog::{
    Catalog, CatalogError, Identifier, IdentifierId, LicensePool, PoolId, RecordId, Work,
    WorkId, WorkRecord,
};
pub use circulation::{apply_event, CirculationEvent, CirculationEventType};
pub use consolidation::{ConsolidationConfig, WorkConsolidator};
pub use equivalence::Equivalency;
pub use monitor::{
    CoverageError, CoverageProvider, IdentifierResolutionMonitor, PresentationReadyMonitor,
    ResolutionOutcome, UnresolvedIdentifier,
};
pub use presentation::calculate_presentation;
pub use similarity::record::{
    author_found_in, author_similarity, record_similarity, work_similarity,
};
pub use similarity::text::{
    histogram_distance, title_similarity, word_frequency_histogram, word_match_proportion,
    wordbag,
};
