//! Domain types shared across the collate metadata pipeline
//!
//! This crate provides the value types the reconciliation engine works on:
//! - DataSource: a provider of bibliographic or licensing data
//! - IdentifierType / ForeignId: namespaced external identifiers
//! - Contributor: a person credited on an edition, with aliases and roles
//! - LanguageCodes: ISO-639-2 lookup tables

pub mod contributor;
pub mod identifier;
pub mod language;
pub mod source;

pub use contributor::*;
pub use identifier::*;
pub use language::*;
pub use source::*;
