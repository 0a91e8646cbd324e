//! Contributors: the people credited on an edition

use serde::{Deserialize, Serialize};

/// What a contributor did for an edition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContributorRole {
    Author,
    Editor,
    Translator,
    Illustrator,
    Narrator,
    Introduction,
    Unknown,
}

/// One source's view of a person credited on an edition.
///
/// Sources disagree about name order and spelling ("Melville, Herman" vs
/// "Herman Melville"), and some list pseudonyms as alternate names. The
/// similarity layer compares contributors by wordbag, so no normalization
/// happens here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub name: String,
    pub alternate_names: Vec<String>,
    pub roles: Vec<ContributorRole>,
}

impl Contributor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alternate_names: Vec::new(),
            roles: Vec::new(),
        }
    }

    pub fn with_role(mut self, role: ContributorRole) -> Self {
        self.roles.push(role);
        self
    }

    pub fn with_alternate_name(mut self, name: impl Into<String>) -> Self {
        self.alternate_names.push(name.into());
        self
    }

    /// Whether this contributor is credited in the given role.
    pub fn has_role(&self, role: ContributorRole) -> bool {
        self.roles.contains(&role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_roles_and_aliases() {
        let c = Contributor::new("Charles Dodgson")
            .with_alternate_name("Lewis Carroll")
            .with_role(ContributorRole::Author);
        assert!(c.has_role(ContributorRole::Author));
        assert!(!c.has_role(ContributorRole::Editor));
        assert_eq!(c.alternate_names, vec!["Lewis Carroll"]);
    }
}
