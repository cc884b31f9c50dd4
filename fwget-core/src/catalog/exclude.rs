//! Exclusion words for catalog queries
//!
//! `--exclude` takes a comma-separated list. Only the package filename and
//! description are checked against it; target and deviceclass are not.

use std::collections::BTreeSet;
use std::str::FromStr;

use super::CatalogEntry;

/// Lowercased words that remove an entry from query results
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    words: BTreeSet<String>,
}

impl ExclusionSet {
    /// An exclusion set that excludes nothing
    pub fn none() -> Self {
        Self::default()
    }

    /// Parse a comma-separated specification
    ///
    /// Segments are trimmed and empty segments dropped: the empty string is a
    /// substring of everything and would exclude every entry.
    pub fn parse(spec: &str) -> Self {
        let words = spec
            .split(',')
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    /// True if any word occurs in the entry's id or description
    pub fn excludes(&self, entry: &CatalogEntry) -> bool {
        if self.words.is_empty() {
            return false;
        }
        let id = entry.id.to_lowercase();
        let description = entry.description.to_lowercase();
        self.words
            .iter()
            .any(|w| id.contains(w.as_str()) || description.contains(w.as_str()))
    }
}

impl FromStr for ExclusionSet {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

#[cfg(test)]
mod exclude_tests {
    use super::*;

    fn entry(id: &str, description: &str, target: &str) -> CatalogEntry {
        CatalogEntry {
            id: id.to_string(),
            date: "2024-01-01".to_string(),
            description: description.to_string(),
            target: target.to_string(),
            deviceclass: "server".to_string(),
        }
    }

    #[test]
    fn test_empty_spec_yields_empty_set() {
        let set = ExclusionSet::parse("");
        assert!(set.is_empty());
        assert!(!set.excludes(&entry("fw.rpm", "anything", "t")));
    }

    #[test]
    fn test_blank_segments_are_dropped() {
        let set = ExclusionSet::parse(" , ,,");
        assert!(set.is_empty());

        let set = ExclusionSet::parse("a,,b,");
        assert_eq!(set.words().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_words_are_lowercased_and_trimmed() {
        let set = ExclusionSet::parse(" BIOS , iLo");
        assert_eq!(set.words().collect::<Vec<_>>(), vec!["bios", "ilo"]);
    }

    #[test]
    fn test_checks_id_and_description_only() {
        let set = ExclusionSet::parse("dl380");

        assert!(set.excludes(&entry("fw-DL380.rpm", "System ROM", "x")));
        assert!(set.excludes(&entry("fw.rpm", "ROM for DL380", "x")));
        // target is not consulted
        assert!(!set.excludes(&entry("fw.rpm", "System ROM", "DL380")));
    }

    #[test]
    fn test_from_str() {
        let set: ExclusionSet = "windows,vmware".parse().unwrap();
        assert_eq!(set.len(), 2);
    }
}
