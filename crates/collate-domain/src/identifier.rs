//! Identifier namespaces and foreign identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// The namespaces in which an edition or work can be identified.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IdentifierType {
    GutenbergId,
    OverdriveId,
    ThreemId,
    Axis360Id,
    OpenLibraryId,
    OclcWork,
    OclcNumber,
    Isbn,
    Asin,
    Uri,
}

impl IdentifierType {
    /// Human-readable name, matching the upstream feeds' vocabulary.
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierType::GutenbergId => "Gutenberg ID",
            IdentifierType::OverdriveId => "Overdrive ID",
            IdentifierType::ThreemId => "3M ID",
            IdentifierType::Axis360Id => "Axis 360 ID",
            IdentifierType::OpenLibraryId => "OLID",
            IdentifierType::OclcWork => "OCLC Work ID",
            IdentifierType::OclcNumber => "OCLC Number",
            IdentifierType::Isbn => "ISBN",
            IdentifierType::Asin => "ASIN",
            IdentifierType::Uri => "URI",
        }
    }
}

impl fmt::Display for IdentifierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A (type, value) pair identifying an edition in some external namespace.
///
/// Equality and hashing cover both fields; the value is stored verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ForeignId {
    pub id_type: IdentifierType,
    pub value: String,
}

impl ForeignId {
    pub fn new(id_type: IdentifierType, value: impl Into<String>) -> Self {
        Self {
            id_type,
            value: value.into(),
        }
    }
}

impl fmt::Display for ForeignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.id_type, self.value)
    }
}
