//! Data sources: the providers that supply bibliographic or licensing data

use crate::identifier::IdentifierType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The well-known providers this pipeline ingests from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DataSourceName {
    Gutenberg,
    Overdrive,
    ThreeM,
    Axis360,
    OpenLibrary,
    Oclc,
    OclcLinkedData,
    Web,
    Manual,
}

impl DataSourceName {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSourceName::Gutenberg => "Gutenberg",
            DataSourceName::Overdrive => "Overdrive",
            DataSourceName::ThreeM => "3M",
            DataSourceName::Axis360 => "Axis 360",
            DataSourceName::OpenLibrary => "Open Library",
            DataSourceName::Oclc => "OCLC Classify",
            DataSourceName::OclcLinkedData => "OCLC Linked Data",
            DataSourceName::Web => "Web",
            DataSourceName::Manual => "Manual intervention",
        }
    }
}

impl fmt::Display for DataSourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static facts about a data source: whether it licenses books, and which
/// identifier namespace its records and license pools are keyed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    pub name: DataSourceName,
    pub offers_licenses: bool,
    pub primary_identifier_type: Option<IdentifierType>,
}

/// The table of sources this pipeline knows about.
const WELL_KNOWN_SOURCES: &[DataSource] = &[
    DataSource {
        name: DataSourceName::Gutenberg,
        offers_licenses: true,
        primary_identifier_type: Some(IdentifierType::GutenbergId),
    },
    DataSource {
        name: DataSourceName::Overdrive,
        offers_licenses: true,
        primary_identifier_type: Some(IdentifierType::OverdriveId),
    },
    DataSource {
        name: DataSourceName::ThreeM,
        offers_licenses: true,
        primary_identifier_type: Some(IdentifierType::ThreemId),
    },
    DataSource {
        name: DataSourceName::Axis360,
        offers_licenses: true,
        primary_identifier_type: Some(IdentifierType::Axis360Id),
    },
    DataSource {
        name: DataSourceName::OpenLibrary,
        offers_licenses: false,
        primary_identifier_type: Some(IdentifierType::OpenLibraryId),
    },
    DataSource {
        name: DataSourceName::Oclc,
        offers_licenses: false,
        primary_identifier_type: Some(IdentifierType::OclcNumber),
    },
    DataSource {
        name: DataSourceName::OclcLinkedData,
        offers_licenses: false,
        primary_identifier_type: Some(IdentifierType::OclcNumber),
    },
    DataSource {
        name: DataSourceName::Web,
        offers_licenses: true,
        primary_identifier_type: Some(IdentifierType::Uri),
    },
    DataSource {
        name: DataSourceName::Manual,
        offers_licenses: false,
        primary_identifier_type: None,
    },
];

impl DataSource {
    /// All well-known sources.
    pub fn well_known() -> &'static [DataSource] {
        WELL_KNOWN_SOURCES
    }

    /// Look up the static facts for a source.
    pub fn lookup(name: DataSourceName) -> DataSource {
        // The table covers every enum variant.
        *WELL_KNOWN_SOURCES
            .iter()
            .find(|s| s.name == name)
            .unwrap_or(&DataSource {
                name,
                offers_licenses: false,
                primary_identifier_type: None,
            })
    }
}
