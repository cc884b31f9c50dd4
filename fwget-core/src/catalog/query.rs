//! Catalog queries: search, locate and list
//!
//! Matching is a case-insensitive substring test. Results of `search` and
//! `locate` are ordered newest-first by comparing the `date` strings, which
//! only matches calendar order for zero-padded dates such as `YYYY-MM-DD`.

use super::{Catalog, CatalogEntry, ExclusionSet};

impl Catalog {
    /// Search filename, description, target and deviceclass
    ///
    /// An empty query matches every entry. Entries with equal dates keep
    /// their catalog order.
    pub fn search(&self, query: &str, exclude: &ExclusionSet) -> Vec<&CatalogEntry> {
        let query = query.to_lowercase();
        self.matching(exclude, |entry| {
            contains(&entry.id, &query)
                || contains(&entry.description, &query)
                || contains(&entry.target, &query)
                || contains(&entry.deviceclass, &query)
        })
    }

    /// Search filename and description only, returning package ids
    ///
    /// Callers turn each id into a download URL by appending it to the
    /// content location.
    pub fn locate(&self, query: &str, exclude: &ExclusionSet) -> Vec<&str> {
        let query = query.to_lowercase();
        self.matching(exclude, |entry| {
            contains(&entry.id, &query) || contains(&entry.description, &query)
        })
        .into_iter()
        .map(|entry| entry.id.as_str())
        .collect()
    }

    /// Every entry, ordered by filename descending
    pub fn list(&self) -> Vec<&CatalogEntry> {
        let mut results: Vec<&CatalogEntry> = self.entries().iter().collect();
        results.sort_by(|a, b| b.id.cmp(&a.id));
        results
    }

    fn matching<F>(&self, exclude: &ExclusionSet, predicate: F) -> Vec<&CatalogEntry>
    where
        F: Fn(&CatalogEntry) -> bool,
    {
        let mut results: Vec<&CatalogEntry> = self
            .entries()
            .iter()
            .filter(|entry| predicate(*entry))
            .filter(|entry| !exclude.excludes(*entry))
            .collect();

        // sort_by is stable, so equal dates stay in catalog order
        results.sort_by(|a, b| b.date.cmp(&a.date));

        tracing::debug!(
            "{} of {} catalog entries matched",
            results.len(),
            self.len()
        );
        results
    }
}

/// `needle` must already be lowercase
fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

#[cfg(test)]
mod query_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scenario_catalog() -> Catalog {
        Catalog::from_json(
            r#"{
                "fw1.fwpkg": {"date": "2023-01-01", "description": "DL380 BIOS", "target": "DL380", "deviceclass": "server"},
                "fw2.fwpkg": {"date": "2024-06-01", "description": "DL360 iLO", "target": "DL360", "deviceclass": "server"}
            }"#,
        )
        .unwrap()
    }

    fn ids<'a>(entries: &[&'a CatalogEntry]) -> Vec<&'a str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_search_by_description() {
        let catalog = scenario_catalog();
        let results = catalog.search("bios", &ExclusionSet::none());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "fw1.fwpkg");
        assert_eq!(results[0].description, "DL380 BIOS");
    }

    #[test]
    fn test_search_with_exclusion() {
        let catalog = scenario_catalog();
        let results = catalog.search("dl3", &ExclusionSet::parse("bios"));
        assert_eq!(ids(&results), vec!["fw2.fwpkg"]);
    }

    #[test]
    fn test_search_orders_newest_first() {
        let catalog = scenario_catalog();
        let results = catalog.search("server", &ExclusionSet::none());
        assert_eq!(ids(&results), vec!["fw2.fwpkg", "fw1.fwpkg"]);
    }

    #[test]
    fn test_search_matches_target_and_deviceclass() {
        let catalog = Catalog::from_json(
            r#"{
                "a.rpm": {"date": "1", "description": "x", "target": "Gen10-NIC", "deviceclass": "y"},
                "b.rpm": {"date": "2", "description": "x", "target": "y", "deviceclass": "Storage"}
            }"#,
        )
        .unwrap();

        assert_eq!(ids(&catalog.search("gen10", &ExclusionSet::none())), vec!["a.rpm"]);
        assert_eq!(ids(&catalog.search("STORAGE", &ExclusionSet::none())), vec!["b.rpm"]);
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let catalog = scenario_catalog();
        assert_eq!(catalog.search("", &ExclusionSet::none()).len(), 2);
        assert_eq!(catalog.locate("", &ExclusionSet::none()).len(), 2);
    }

    #[test]
    fn test_no_match_and_empty_catalog() {
        let catalog = scenario_catalog();
        assert!(catalog.search("zzz-not-present", &ExclusionSet::none()).is_empty());

        let empty = Catalog::default();
        assert!(empty.search("", &ExclusionSet::none()).is_empty());
        assert!(empty.locate("x", &ExclusionSet::none()).is_empty());
        assert!(empty.list().is_empty());
    }

    #[test]
    fn test_locate_ignores_target_and_deviceclass() {
        let catalog = scenario_catalog();
        // "server" only appears in deviceclass
        assert!(catalog.locate("server", &ExclusionSet::none()).is_empty());
        assert_eq!(
            catalog.locate("ilo", &ExclusionSet::none()),
            vec!["fw2.fwpkg"]
        );
    }

    #[test]
    fn test_locate_with_exclusion() {
        let catalog = scenario_catalog();
        assert_eq!(
            catalog.locate("fw", &ExclusionSet::parse("ilo")),
            vec!["fw1.fwpkg"]
        );
    }

    #[test]
    fn test_equal_dates_keep_catalog_order() {
        let catalog = Catalog::from_json(
            r#"{
                "c.rpm": {"date": "2022-05-05", "description": "nic", "target": "t", "deviceclass": "d"},
                "a.rpm": {"date": "2022-05-05", "description": "nic", "target": "t", "deviceclass": "d"},
                "new.rpm": {"date": "2023-01-01", "description": "nic", "target": "t", "deviceclass": "d"},
                "b.rpm": {"date": "2022-05-05", "description": "nic", "target": "t", "deviceclass": "d"}
            }"#,
        )
        .unwrap();

        assert_eq!(
            ids(&catalog.search("nic", &ExclusionSet::none())),
            vec!["new.rpm", "c.rpm", "a.rpm", "b.rpm"]
        );
        assert_eq!(
            catalog.locate("nic", &ExclusionSet::none()),
            vec!["new.rpm", "c.rpm", "a.rpm", "b.rpm"]
        );
    }

    #[test]
    fn test_list_sorted_by_id_descending() {
        let catalog = scenario_catalog();
        assert_eq!(ids(&catalog.list()), vec!["fw2.fwpkg", "fw1.fwpkg"]);
    }
}
