// zilf-core - Association table
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The global association table: (item, indicator) -> value.
//!
//! Entries keep their position for the life of the table. Removing an entry
//! leaves an empty slot, so an ASOC cursor pointing at it reads as gone
//! instead of silently moving to a different entry.

use std::rc::Rc;

use indexmap::IndexMap;
use zilf_value::{AtomId, ObListId, ZilVal};

/// Identity of an association item or indicator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssocKey {
    Atom(AtomId),
    Fix(i32),
    Char(char),
    String(Rc<str>),
    ObList(ObListId),
    /// A tied record by identity, at a view offset.
    Record(usize, usize),
}

impl AssocKey {
    /// The key for a value, or `None` if the value cannot be associated.
    #[must_use]
    pub fn of(value: &ZilVal) -> Option<AssocKey> {
        let key = match value.unlocated() {
            ZilVal::Atom(a) => AssocKey::Atom(*a),
            ZilVal::Fix(n) => AssocKey::Fix(*n),
            ZilVal::Char(c) => AssocKey::Char(*c),
            ZilVal::String(s) => AssocKey::String(s.clone()),
            ZilVal::ObList(o) => AssocKey::ObList(*o),
            ZilVal::Struct(r) => AssocKey::Record(r.record_addr(), r.offset()),
            _ => return None,
        };
        Some(key)
    }
}

/// One association.
#[derive(Debug, Clone, PartialEq)]
pub struct AssocEntry {
    pub item: ZilVal,
    pub indicator: ZilVal,
    pub value: ZilVal,
}

#[derive(Debug, Default)]
pub struct AssocTable {
    /// `None` marks a removed entry.
    entries: IndexMap<(AssocKey, AssocKey), Option<AssocEntry>>,
}

impl AssocTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or (with `None`) remove an association. Returns the previous value.
    pub fn put(
        &mut self,
        item: (AssocKey, ZilVal),
        indicator: (AssocKey, ZilVal),
        value: Option<ZilVal>,
    ) -> Option<ZilVal> {
        let key = (item.0, indicator.0);
        match value {
            Some(value) => {
                let entry = AssocEntry {
                    item: item.1,
                    indicator: indicator.1,
                    value,
                };
                self.entries
                    .insert(key, Some(entry))
                    .flatten()
                    .map(|old| old.value)
            }
            None => self
                .entries
                .get_mut(&key)
                .and_then(Option::take)
                .map(|old| old.value),
        }
    }

    #[must_use]
    pub fn get(&self, item: &AssocKey, indicator: &AssocKey) -> Option<&ZilVal> {
        self.entries
            .get(&(item.clone(), indicator.clone()))
            .and_then(Option::as_ref)
            .map(|entry| &entry.value)
    }

    /// Position of the first live entry.
    #[must_use]
    pub fn first(&self) -> Option<usize> {
        self.live_from(0)
    }

    /// Position of the next live entry after `cursor`.
    #[must_use]
    pub fn next(&self, cursor: usize) -> Option<usize> {
        self.live_from(cursor + 1)
    }

    /// The entry at `cursor`, `None` if it was removed or never existed.
    #[must_use]
    pub fn entry(&self, cursor: usize) -> Option<&AssocEntry> {
        self.entries
            .get_index(cursor)
            .and_then(|(_, entry)| entry.as_ref())
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().filter(|e| e.is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first().is_none()
    }

    fn live_from(&self, start: usize) -> Option<usize> {
        (start..self.entries.len()).find(|&i| self.entry(i).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(n: u32) -> (AssocKey, ZilVal) {
        let v = ZilVal::Atom(AtomId(n));
        (AssocKey::of(&v).unwrap(), v)
    }

    #[test]
    fn test_put_get_remove() {
        let mut table = AssocTable::new();
        assert_eq!(table.put(atom(1), atom(2), Some(ZilVal::Fix(10))), None);
        assert_eq!(
            table.get(&atom(1).0, &atom(2).0),
            Some(&ZilVal::Fix(10))
        );
        assert_eq!(
            table.put(atom(1), atom(2), Some(ZilVal::Fix(11))),
            Some(ZilVal::Fix(10))
        );
        assert_eq!(table.put(atom(1), atom(2), None), Some(ZilVal::Fix(11)));
        assert_eq!(table.get(&atom(1).0, &atom(2).0), None);
        assert!(table.is_empty());
    }

    #[test]
    fn test_cursor_skips_removed_entries() {
        let mut table = AssocTable::new();
        table.put(atom(1), atom(9), Some(ZilVal::Fix(1)));
        table.put(atom(2), atom(9), Some(ZilVal::Fix(2)));
        table.put(atom(3), atom(9), Some(ZilVal::Fix(3)));

        let first = table.first().unwrap();
        let second = table.next(first).unwrap();
        table.put(atom(2), atom(9), None);

        assert!(table.entry(second).is_none());
        let third = table.next(first).unwrap();
        assert_eq!(table.entry(third).unwrap().value, ZilVal::Fix(3));
        assert_eq!(table.next(third), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_lists_cannot_be_associated() {
        assert_eq!(AssocKey::of(&ZilVal::list(vec![])), None);
        assert_eq!(
            AssocKey::of(&ZilVal::string("k")),
            Some(AssocKey::String("k".into()))
        );
    }
}
