//! SearchProjection - filtered, read-only view of the store
//!
//! Each match keeps the [`Slot`] it came from, so a row picked in the
//! filtered view commits the right entry in the full list.

use crate::entry::Entry;
use crate::store::{EntryStore, Slot};

/// One visible row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<'a> {
    pub slot: Slot,
    pub entry: &'a Entry,
}

/// Rows whose raw key contains `term`, case-insensitively, in display
/// order. The buffer is included whenever its key matches, which an empty
/// term always does.
pub fn filter<'a>(store: &'a EntryStore, term: &str) -> Vec<Match<'a>> {
    let needle = term.to_lowercase();
    store
        .rows()
        .filter(|(_, entry)| entry.key.to_lowercase().contains(&needle))
        .map(|(slot, entry)| Match { slot, entry })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Field;

    fn store() -> EntryStore {
        EntryStore::initialize(vec![Entry::new("Apple", "1"), Entry::new("banana", "2")])
    }

    #[test]
    fn test_case_insensitive_substring() {
        let store = store();
        // Substring, not prefix: "banana" contains an "a" as well
        let matches = filter(&store, "A");
        let keys: Vec<&str> = matches.iter().map(|m| m.entry.key.as_str()).collect();
        assert_eq!(keys, vec!["Apple", "banana"]);

        let matches = filter(&store, "APP");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].entry.key, "Apple");
        assert_eq!(matches[0].slot, Slot::Entry(0));
    }

    #[test]
    fn test_empty_term_returns_everything() {
        let store = store();
        let matches = filter(&store, "");
        assert_eq!(matches.len(), 3);
        assert_eq!(matches[0].slot, Slot::Buffer);
    }

    #[test]
    fn test_slots_map_back_to_full_list() {
        let store = store();
        let matches = filter(&store, "nan");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].slot, Slot::Entry(1));
        assert_eq!(store.get(matches[0].slot), Some(matches[0].entry));
    }

    #[test]
    fn test_matches_raw_untrimmed_key() {
        let mut store = store();
        store.set_field(Slot::Buffer, Field::Key, "  draft");
        assert_eq!(filter(&store, "  d").len(), 1);
        assert_eq!(filter(&store, "  d")[0].slot, Slot::Buffer);

        // An empty buffer drops out once the term is non-empty
        store.set_field(Slot::Buffer, Field::Key, "");
        assert!(filter(&store, "x").is_empty());
    }
}
