//! Commit commands
//!
//! A commit on a slot is first planned into a [`Command`] from the slot's
//! current contents, then applied. Both the in-memory post-state and the
//! payload handed to the store come from the same `apply`, so they cannot
//! disagree.

use crate::entry::{Completeness, Entry};
use crate::store::Slot;

/// A state change to the stored entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Insert a committed buffer at the front of the list
    Add(Entry),
    /// Replace the entry at `index` with its trimmed form
    Update { index: usize, entry: Entry },
    /// Remove the entry at `index`
    Delete { index: usize },
}

/// Why a commit produced no command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The buffer is missing its key or its secret
    IncompleteBuffer,
    /// A stored entry has exactly one field cleared
    PartialEdit,
    /// The slot does not address an entry
    UnknownSlot,
}

impl IgnoreReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            IgnoreReason::IncompleteBuffer => "buffer needs both a key and a secret",
            IgnoreReason::PartialEdit => "fill both fields to save, or clear both to delete",
            IgnoreReason::UnknownSlot => "no such entry",
        }
    }
}

/// Outcome of planning a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Apply(Command),
    Ignore(IgnoreReason),
}

impl Command {
    /// Decide what committing `slot` means given its current contents.
    ///
    /// `current` is `None` when the slot does not exist.
    pub fn plan(slot: Slot, current: Option<&Entry>) -> Decision {
        let Some(current) = current else {
            return Decision::Ignore(IgnoreReason::UnknownSlot);
        };

        match (slot, current.completeness()) {
            (Slot::Buffer, Completeness::Complete) => {
                Decision::Apply(Command::Add(current.trimmed()))
            }
            (Slot::Buffer, _) => Decision::Ignore(IgnoreReason::IncompleteBuffer),
            (Slot::Entry(index), Completeness::Complete) => Decision::Apply(Command::Update {
                index,
                entry: current.trimmed(),
            }),
            (Slot::Entry(index), Completeness::Blank) => {
                Decision::Apply(Command::Delete { index })
            }
            (Slot::Entry(_), Completeness::Partial) => {
                Decision::Ignore(IgnoreReason::PartialEdit)
            }
        }
    }

    /// Apply to any list shaped like the entry list. `make` builds the
    /// element stored for an added or updated entry.
    pub fn apply_to<T: Clone>(&self, items: &[T], make: impl Fn(&Entry) -> T) -> Vec<T> {
        let mut next = items.to_vec();
        match self {
            Command::Add(entry) => next.insert(0, make(entry)),
            Command::Update { index, entry } => {
                if let Some(item) = next.get_mut(*index) {
                    *item = make(entry);
                }
            }
            Command::Delete { index } => {
                if *index < next.len() {
                    next.remove(*index);
                }
            }
        }
        next
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Add(_) => "add",
            Command::Update { .. } => "update",
            Command::Delete { .. } => "delete",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_buffer() {
        let full = Entry::new(" a ", " p ");
        assert_eq!(
            Command::plan(Slot::Buffer, Some(&full)),
            Decision::Apply(Command::Add(Entry::new("a", "p")))
        );

        let half = Entry::new("a", "   ");
        assert_eq!(
            Command::plan(Slot::Buffer, Some(&half)),
            Decision::Ignore(IgnoreReason::IncompleteBuffer)
        );

        // A blank buffer is just as inert as a half-filled one
        assert_eq!(
            Command::plan(Slot::Buffer, Some(&Entry::empty())),
            Decision::Ignore(IgnoreReason::IncompleteBuffer)
        );
    }

    #[test]
    fn test_plan_entry() {
        assert_eq!(
            Command::plan(Slot::Entry(2), Some(&Entry::new("a", "p2 "))),
            Decision::Apply(Command::Update {
                index: 2,
                entry: Entry::new("a", "p2")
            })
        );
        assert_eq!(
            Command::plan(Slot::Entry(2), Some(&Entry::new(" ", ""))),
            Decision::Apply(Command::Delete { index: 2 })
        );
        assert_eq!(
            Command::plan(Slot::Entry(2), Some(&Entry::new("a", ""))),
            Decision::Ignore(IgnoreReason::PartialEdit)
        );
        assert_eq!(
            Command::plan(Slot::Entry(9), None),
            Decision::Ignore(IgnoreReason::UnknownSlot)
        );
    }

    #[test]
    fn test_apply() {
        let tail = vec![Entry::new("a", "1"), Entry::new("b", "2")];

        let added = Command::Add(Entry::new("c", "3")).apply_to(&tail, Entry::clone);
        assert_eq!(added[0], Entry::new("c", "3"));
        assert_eq!(&added[1..], &tail[..]);

        let updated = Command::Update {
            index: 1,
            entry: Entry::new("b", "22"),
        }
        .apply_to(&tail, Entry::clone);
        assert_eq!(updated, vec![Entry::new("a", "1"), Entry::new("b", "22")]);

        let deleted = Command::Delete { index: 0 }.apply_to(&tail, Entry::clone);
        assert_eq!(deleted, vec![Entry::new("b", "2")]);

        // Out-of-range indices leave the list alone
        assert_eq!(Command::Delete { index: 5 }.apply_to(&tail, Entry::clone), tail);
    }
}
