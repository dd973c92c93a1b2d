//! The entry catalog: groups → entries, in discovery order.
//!
//! A catalog is an immutable snapshot. Discovery builds a complete new
//! catalog which the host swaps in atomically, so readers observe either
//! the previous snapshot or the full new one, never a partial population.

use std::collections::{HashMap, HashSet};
use wog_store::Discovered;
use wog_types::{Entry, EntryId};
use wog_utils::IdGenerator;

use crate::CatalogError;

/// Immutable snapshot of discovered groups and entries.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    generation: u64,
    groups: Vec<String>,
    entries: Vec<Entry>,
    by_id: HashMap<EntryId, usize>,
}

impl Catalog {
    /// The catalog before discovery ran, and after dispose.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Assign fresh ids to discovered sources and build a snapshot.
    pub fn build(
        discovered: Vec<Discovered>,
        ids: &dyn IdGenerator,
        generation: u64,
    ) -> Result<Self, CatalogError> {
        let entries = discovered
            .into_iter()
            .map(|found| Entry::new(ids.generate(), found.path, found.group))
            .collect();
        Self::from_entries(entries, generation)
    }

    /// Build a snapshot from entries that already carry ids.
    ///
    /// Groups are derived from the entries in first-seen order, so every
    /// group has at least one entry.
    pub fn from_entries(entries: Vec<Entry>, generation: u64) -> Result<Self, CatalogError> {
        let mut groups = Vec::new();
        let mut seen_groups = HashSet::new();
        let mut by_id = HashMap::with_capacity(entries.len());

        for (index, entry) in entries.iter().enumerate() {
            if entry.group.is_empty() {
                return Err(CatalogError::MissingGroup {
                    path: entry.path.clone(),
                });
            }
            if by_id.insert(entry.id.clone(), index).is_some() {
                return Err(CatalogError::DuplicateId(entry.id.clone()));
            }
            if seen_groups.insert(entry.group.clone()) {
                groups.push(entry.group.clone());
            }
        }

        Ok(Self {
            generation,
            groups,
            entries,
            by_id,
        })
    }

    /// Incremented by the host on every successful population.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Group names in discovery order.
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Entries of `group` in discovery order. Empty for unknown groups.
    pub fn entries<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a Entry> + 'a {
        self.entries.iter().filter(move |entry| entry.group == group)
    }

    /// All entries in discovery order.
    pub fn all_entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entry(&self, id: &str) -> Option<&Entry> {
        self.by_id.get(id).map(|&index| &self.entries[index])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;
    use wog_nullables::NullIdGenerator;

    fn sample() -> Catalog {
        let discovered = vec![
            Discovered::new("/var/log/syslog", "System"),
            Discovered::new("/var/log/nginx/access.log", "Web"),
            Discovered::new("/var/log/auth.log", "System"),
        ];
        Catalog::build(discovered, &NullIdGenerator::new("log"), 1).unwrap()
    }

    #[test]
    fn empty_catalog_answers_every_query() {
        let catalog = Catalog::empty();
        assert!(catalog.groups().is_empty());
        assert_eq!(catalog.entries("System").count(), 0);
        assert!(catalog.entry("log-1").is_none());
        assert!(catalog.is_empty());
    }

    #[test]
    fn groups_keep_discovery_order() {
        let catalog = sample();
        assert_eq!(catalog.groups(), ["System".to_string(), "Web".to_string()]);
    }

    #[test]
    fn entries_filter_by_group_in_order() {
        let catalog = sample();
        let system: Vec<&str> = catalog.entries("System").map(|e| e.path.as_str()).collect();
        assert_eq!(system, vec!["/var/log/syslog", "/var/log/auth.log"]);
        assert_eq!(catalog.entries("Nope").count(), 0);
    }

    #[test]
    fn ids_are_assigned_at_build_time() {
        let catalog = sample();
        let entry = catalog.entry("log-2").unwrap();
        assert_eq!(entry.path, "/var/log/nginx/access.log");
        assert_eq!(entry.group, "Web");
        assert!(catalog.entry("log-4").is_none());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let discovered = vec![Discovered::new("/a", "A"), Discovered::new("/b", "A")];
        let err = Catalog::build(discovered, &NullIdGenerator::constant("same"), 1).unwrap_err();
        assert_eq!(err, CatalogError::DuplicateId(EntryId::new("same")));
    }

    #[test]
    fn entries_without_group_are_rejected() {
        let err = Catalog::from_entries(vec![Entry::new("x", "/x", "")], 1).unwrap_err();
        assert!(matches!(err, CatalogError::MissingGroup { .. }));
    }

    fn discovered_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
        prop::collection::vec(("/[a-z]{1,8}", "[A-D]"), 0..40)
    }

    proptest! {
        /// Every entry listed under a group belongs to that group.
        #[test]
        fn entries_belong_to_their_group(found in discovered_strategy()) {
            let discovered = found.iter().map(|(p, g)| Discovered::new(p.as_str(), g.as_str())).collect();
            let catalog = Catalog::build(discovered, &NullIdGenerator::new("e"), 1).unwrap();
            for group in catalog.groups() {
                for entry in catalog.entries(group) {
                    prop_assert_eq!(&entry.group, group);
                }
            }
        }

        /// The group list is exactly the distinct groups of all entries.
        #[test]
        fn groups_equal_distinct_entry_groups(found in discovered_strategy()) {
            let discovered = found.iter().map(|(p, g)| Discovered::new(p.as_str(), g.as_str())).collect();
            let catalog = Catalog::build(discovered, &NullIdGenerator::new("e"), 1).unwrap();
            let listed: BTreeSet<&String> = catalog.groups().iter().collect();
            let distinct: BTreeSet<&String> = catalog.all_entries().iter().map(|e| &e.group).collect();
            prop_assert_eq!(listed.len(), catalog.groups().len());
            prop_assert_eq!(listed, distinct);
        }

        /// Lookup by id returns the entry listed under its group.
        #[test]
        fn lookup_agrees_with_group_listing(found in discovered_strategy()) {
            let discovered = found.iter().map(|(p, g)| Discovered::new(p.as_str(), g.as_str())).collect();
            let catalog = Catalog::build(discovered, &NullIdGenerator::new("e"), 1).unwrap();
            for entry in catalog.all_entries() {
                let found = catalog.entry(entry.id.as_str()).unwrap();
                prop_assert_eq!(found, entry);
                prop_assert!(catalog.entries(&entry.group).any(|e| e == entry));
            }
        }
    }
}
