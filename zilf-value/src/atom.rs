// zilf-value - Atom and OBLIST identities
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Atoms are interned symbolic names.
//!
//! # Identity
//!
//! The value model never holds an atom record directly. An atom is an
//! [`AtomId`], a stable index into the symbol table's arena, and a namespace
//! is an [`ObListId`]. Equality of ids is atom identity: two atoms with the
//! same text on the same OBLIST always share one id, while equal text on two
//! OBLISTs (or on none) yields distinct ids.
//!
//! The records themselves (text, owning OBLIST, well-known tag) live in the
//! runtime crate's symbol table, which is the only place that can create ids.

use std::fmt;

/// Identity of an interned atom.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomId(pub u32);

impl AtomId {
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for AtomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AtomId({})", self.0)
    }
}

/// Identity of an OBLIST (namespace).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObListId(pub u32);

impl ObListId {
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ObListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObListId({})", self.0)
    }
}

macro_rules! std_atoms {
    ($($variant:ident => $text:expr),* $(,)?) => {
        /// Atoms the engine itself refers to by name.
        ///
        /// Each is interned on the ROOT oblist when a context is created and
        /// tagged so the engine can recognise it without comparing text.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum StdAtom {
            $($variant),*
        }

        impl StdAtom {
            /// Every well-known atom, in interning order.
            pub const ALL: &'static [StdAtom] = &[$(StdAtom::$variant),*];

            /// The atom's printed name.
            #[must_use]
            pub fn text(self) -> &'static str {
                match self {
                    $(StdAtom::$variant => $text),*
                }
            }
        }
    };
}

std_atoms! {
    T => "T",
    Oblist => "OBLIST",
    Decl => "DECL",
    Root => "ROOT",
    Initial => "INITIAL",
    Quote => "QUOTE",
    Lval => "LVAL",
    Gval => "GVAL",
    Or => "OR",
    Primtype => "PRIMTYPE",
    Rest => "REST",
    Opt => "OPT",
    Optional => "OPTIONAL",
    Any => "ANY",
    Structured => "STRUCTURED",
    Applicable => "APPLICABLE",
    Routine => "ROUTINE",
}

impl fmt::Display for StdAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_std_atom_texts_are_unique() {
        let mut texts: Vec<_> = StdAtom::ALL.iter().map(|a| a.text()).collect();
        texts.sort_unstable();
        texts.dedup();
        assert_eq!(texts.len(), StdAtom::ALL.len());
    }

    #[test]
    fn test_ids_compare_by_index() {
        assert_eq!(AtomId(3), AtomId(3));
        assert_ne!(AtomId(3), AtomId(4));
        assert_eq!(ObListId(7).index(), 7);
    }
}
