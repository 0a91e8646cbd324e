//! ISO-639-2 language code lookups
//!
//! The data file is the Library of Congress pipe-separated table
//! (<http://www.loc.gov/standards/iso639-2/>), trimmed to the languages the
//! upstream feeds actually deliver. It is parsed once into an immutable
//! mapping; callers share a reference via [`LanguageCodes::shared`].

use lazy_static::lazy_static;
use std::collections::HashMap;

const ISO_639_2: &str = include_str!("../resources/ISO-639-2.txt");

lazy_static! {
    static ref SHARED: LanguageCodes = LanguageCodes::parse(ISO_639_2);
}

/// Conversion between ISO-639-2 (three-letter) and ISO-639-1 (two-letter)
/// codes, plus English display names.
#[derive(Debug, Default)]
pub struct LanguageCodes {
    two_to_three: HashMap<String, String>,
    three_to_two: HashMap<String, String>,
    english_names: HashMap<String, Vec<String>>,
}

impl LanguageCodes {
    /// The process-wide table, parsed from the embedded data file.
    pub fn shared() -> &'static LanguageCodes {
        &SHARED
    }

    /// Parse a LOC-format table: `alpha3|terminologic|alpha2|names|french`.
    /// Malformed lines are skipped.
    pub fn parse(data: &str) -> Self {
        let mut codes = LanguageCodes::default();
        for line in data.lines() {
            let fields: Vec<&str> = line.trim().split('|').collect();
            let [alpha_3, terminologic, alpha_2, names, _french] = fields.as_slice() else {
                continue;
            };
            let names: Vec<String> = names
                .split(';')
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .collect();
            if !alpha_2.is_empty() {
                codes.two_to_three
                    .insert(alpha_2.to_string(), alpha_3.to_string());
                codes.three_to_two
                    .insert(alpha_3.to_string(), alpha_2.to_string());
                codes.english_names
                    .insert(alpha_2.to_string(), names.clone());
            }
            if !terminologic.is_empty() {
                codes.three_to_two
                    .insert(terminologic.to_string(), alpha_2.to_string());
                codes.english_names
                    .insert(terminologic.to_string(), names.clone());
            }
            codes.english_names.insert(alpha_3.to_string(), names);
        }
        codes
    }

    /// Two-letter code to three-letter bibliographic code.
    pub fn two_to_three(&self, code: &str) -> Option<&str> {
        self.two_to_three.get(code).map(|s| s.as_str())
    }

    /// Three-letter code to two-letter code.
    pub fn three_to_two(&self, code: &str) -> Option<&str> {
        self.three_to_two.get(code).map(|s| s.as_str())
    }

    /// English names for a two- or three-letter code. Empty for unknown codes.
    pub fn english_names(&self, code: &str) -> &[String] {
        self.english_names
            .get(code)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups() {
        let c = LanguageCodes::shared();
        assert_eq!(c.two_to_three("en"), Some("eng"));
        assert_eq!(c.three_to_two("eng"), Some("en"));
        assert_eq!(c.english_names("en"), ["English"]);
        assert_eq!(c.english_names("eng"), ["English"]);

        assert_eq!(c.two_to_three("es"), Some("spa"));
        assert_eq!(c.three_to_two("spa"), Some("es"));
        assert_eq!(c.english_names("es"), ["Spanish", "Castilian"]);
        assert_eq!(c.english_names("spa"), ["Spanish", "Castilian"]);

        assert_eq!(c.two_to_three("zh"), Some("chi"));
        assert_eq!(c.three_to_two("chi"), Some("zh"));
        assert_eq!(c.english_names("zh"), ["Chinese"]);
        assert_eq!(c.english_names("chi"), ["Chinese"]);
    }

    #[test]
    fn terminologic_codes_resolve() {
        let c = LanguageCodes::shared();
        assert_eq!(c.three_to_two("zho"), Some("zh"));
        assert_eq!(c.english_names("deu"), ["German"]);
    }

    #[test]
    fn unknown_codes() {
        let c = LanguageCodes::shared();
        assert_eq!(c.two_to_three("nosuchlanguage"), None);
        assert_eq!(c.three_to_two("nosuchlanguage"), None);
        assert!(c.english_names("nosuchlanguage").is_empty());
    }
}
