//! Similarity metrics for bibliographic metadata
//!
//! Two layers: `text` holds the pure word-frequency functions, `record`
//! builds author and record comparators on top of them.

pub mod record;
pub mod text;
