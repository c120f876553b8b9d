// zilf-core - Symbol table: atoms and OBLISTs
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Symbol table for atoms and the OBLISTs that hold them.
//!
//! Atoms live in an arena indexed by [`AtomId`]. An OBLIST is an
//! insertion-ordered map from text to atom id, and an atom records which
//! OBLIST (at most one) currently holds it. Unqualified names are resolved
//! through a stack of search paths; each `BLOCK` pushes a path and each
//! `ENDBLOCK` pops one, but the base path `[INITIAL, ROOT]` always remains.
//!
//! Resolution is permissive: a name found on no OBLIST of the current path
//! is created on the path's first OBLIST.

use std::rc::Rc;

use indexmap::IndexMap;
use log::{debug, trace};
use rustc_hash::FxHashMap;
use zilf_value::{AtomId, ObListId, StdAtom};

use crate::error::{Error, Result};

/// Separator in path-qualified atom names: `FOO!-MYOBL`.
pub const PATH_SEPARATOR: &str = "!-";

#[derive(Debug)]
struct AtomRecord {
    text: Rc<str>,
    oblist: Option<ObListId>,
    std: Option<StdAtom>,
}

#[derive(Debug, Default)]
struct ObListRecord {
    name: Option<AtomId>,
    atoms: IndexMap<Rc<str>, AtomId>,
}

/// The atom arena, OBLISTs and search path stack.
#[derive(Debug)]
pub struct SymbolTable {
    atoms: Vec<AtomRecord>,
    oblists: Vec<ObListRecord>,
    /// OBLIST naming: `<GETPROP name OBLIST>`
    named: FxHashMap<AtomId, ObListId>,
    /// Indexed by `StdAtom as usize`
    std_ids: Vec<AtomId>,
    root: ObListId,
    initial: ObListId,
    paths: Vec<Vec<ObListId>>,
}

impl SymbolTable {
    /// Create a table with ROOT (holding the well-known atoms) and INITIAL,
    /// searched in the order `[INITIAL, ROOT]`.
    pub fn new() -> Self {
        let mut table = SymbolTable {
            atoms: Vec::new(),
            oblists: Vec::new(),
            named: FxHashMap::default(),
            std_ids: Vec::with_capacity(StdAtom::ALL.len()),
            root: ObListId(0),
            initial: ObListId(0),
            paths: Vec::new(),
        };

        table.root = table.new_oblist(None);
        table.initial = table.new_oblist(None);

        for &std in StdAtom::ALL {
            let id = table.intern(table.root, std.text());
            table.atoms[id.index()].std = Some(std);
            table.std_ids.push(id);
        }

        let (root_name, initial_name) = (table.std(StdAtom::Root), table.std(StdAtom::Initial));
        table.name_oblist(root_name, table.root);
        table.name_oblist(initial_name, table.initial);

        table.paths.push(vec![table.initial, table.root]);
        table
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> ObListId {
        self.root
    }

    #[inline]
    #[must_use]
    pub fn initial(&self) -> ObListId {
        self.initial
    }

    /// The id of a well-known atom.
    #[inline]
    #[must_use]
    pub fn std(&self, atom: StdAtom) -> AtomId {
        self.std_ids[atom as usize]
    }

    /// The well-known tag of an atom, if it has one.
    #[inline]
    #[must_use]
    pub fn std_tag(&self, atom: AtomId) -> Option<StdAtom> {
        self.atoms[atom.index()].std
    }

    #[inline]
    #[must_use]
    pub fn is_std(&self, atom: AtomId, std: StdAtom) -> bool {
        self.std_tag(atom) == Some(std)
    }

    /// The atom's printed name.
    #[inline]
    #[must_use]
    pub fn text(&self, atom: AtomId) -> &str {
        &self.atoms[atom.index()].text
    }

    #[must_use]
    pub fn text_rc(&self, atom: AtomId) -> Rc<str> {
        self.atoms[atom.index()].text.clone()
    }

    /// The OBLIST currently holding the atom.
    #[inline]
    #[must_use]
    pub fn oblist_of(&self, atom: AtomId) -> Option<ObListId> {
        self.atoms[atom.index()].oblist
    }

    #[must_use]
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Atoms
    // ─────────────────────────────────────────────────────────────────────────

    /// Create an atom that is on no OBLIST.
    pub fn new_atom(&mut self, text: &str) -> AtomId {
        let id = AtomId(self.atoms.len() as u32);
        self.atoms.push(AtomRecord {
            text: Rc::from(text),
            oblist: None,
            std: None,
        });
        trace!("created atom {} ({:?})", text, id);
        id
    }

    /// Return the atom named `text` on `oblist`, creating it if needed.
    pub fn intern(&mut self, oblist: ObListId, text: &str) -> AtomId {
        if let Some(id) = self.lookup(oblist, text) {
            return id;
        }

        let id = self.new_atom(text);
        let record = &mut self.atoms[id.index()];
        record.oblist = Some(oblist);
        let key = record.text.clone();
        self.oblists[oblist.index()].atoms.insert(key, id);
        id
    }

    #[inline]
    #[must_use]
    pub fn lookup(&self, oblist: ObListId, text: &str) -> Option<AtomId> {
        self.oblists[oblist.index()].atoms.get(text).copied()
    }

    /// Put an atom on an OBLIST.
    ///
    /// Fails if the atom is on a different OBLIST, or if the target already
    /// holds another atom with the same name. Attaching an atom to the OBLIST
    /// it is already on does nothing.
    pub fn attach(&mut self, atom: AtomId, oblist: ObListId) -> Result<()> {
        match self.oblist_of(atom) {
            Some(current) if current == oblist => return Ok(()),
            Some(current) => {
                return Err(Error::AtomOnOtherObList {
                    atom: self.text(atom).to_string(),
                    oblist: self.oblist_display(current),
                });
            }
            None => {}
        }

        if self.lookup(oblist, self.text(atom)).is_some() {
            return Err(Error::DuplicateAtomName {
                name: self.text(atom).to_string(),
                oblist: self.oblist_display(oblist),
            });
        }

        let record = &mut self.atoms[atom.index()];
        record.oblist = Some(oblist);
        let key = record.text.clone();
        self.oblists[oblist.index()].atoms.insert(key, atom);
        Ok(())
    }

    /// Take an atom off its OBLIST, returning the OBLIST it was on.
    pub fn detach(&mut self, atom: AtomId) -> Option<ObListId> {
        let oblist = self.atoms[atom.index()].oblist.take()?;
        let text = self.atoms[atom.index()].text.clone();
        self.oblists[oblist.index()].atoms.shift_remove(&*text);
        Some(oblist)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // OBLISTs
    // ─────────────────────────────────────────────────────────────────────────

    pub fn new_oblist(&mut self, name: Option<AtomId>) -> ObListId {
        let id = ObListId(self.oblists.len() as u32);
        self.oblists.push(ObListRecord::default());
        if let Some(name) = name {
            self.name_oblist(name, id);
        }
        id
    }

    /// Make `name` refer to `oblist`.
    pub fn name_oblist(&mut self, name: AtomId, oblist: ObListId) {
        self.named.insert(name, oblist);
        self.oblists[oblist.index()].name.get_or_insert(name);
    }

    /// Forget the OBLIST named by `name`, returning it.
    pub fn unname_oblist(&mut self, name: AtomId) -> Option<ObListId> {
        let oblist = self.named.remove(&name)?;
        let record = &mut self.oblists[oblist.index()];
        if record.name == Some(name) {
            record.name = None;
        }
        Some(oblist)
    }

    #[must_use]
    pub fn oblist_named(&self, name: AtomId) -> Option<ObListId> {
        self.named.get(&name).copied()
    }

    /// The OBLIST named by `name`, creating it on first use.
    pub fn oblist_for(&mut self, name: AtomId) -> ObListId {
        match self.oblist_named(name) {
            Some(oblist) => oblist,
            None => {
                debug!("creating OBLIST {}", self.text(name));
                self.new_oblist(Some(name))
            }
        }
    }

    #[must_use]
    pub fn oblist_name(&self, oblist: ObListId) -> Option<AtomId> {
        self.oblists[oblist.index()].name
    }

    /// Atoms on the OBLIST, in insertion order.
    pub fn atoms_in(&self, oblist: ObListId) -> impl Iterator<Item = AtomId> + '_ {
        self.oblists[oblist.index()].atoms.values().copied()
    }

    #[must_use]
    pub fn oblist_display(&self, oblist: ObListId) -> String {
        match self.oblist_name(oblist) {
            Some(name) => self.text(name).to_string(),
            None => format!("#OBLIST {}", oblist.0),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Search paths
    // ─────────────────────────────────────────────────────────────────────────

    /// The search path unqualified names are currently resolved against.
    #[must_use]
    pub fn path(&self) -> &[ObListId] {
        self.paths.last().map_or(&[], Vec::as_slice)
    }

    /// Number of pushed paths above the base.
    #[must_use]
    pub fn block_depth(&self) -> usize {
        self.paths.len() - 1
    }

    pub fn push_path(&mut self, path: Vec<ObListId>) -> Result<()> {
        if path.is_empty() {
            return Err(Error::misplaced("BLOCK", "search path must name an OBLIST"));
        }
        debug!("BLOCK {:?} (depth {})", path, self.paths.len());
        self.paths.push(path);
        Ok(())
    }

    /// Pop the current path, returning it. The base path cannot be popped.
    pub fn pop_path(&mut self) -> Result<Vec<ObListId>> {
        if self.paths.len() <= 1 {
            return Err(Error::misplaced("ENDBLOCK", "no BLOCK in effect"));
        }
        let path = self.paths.pop().unwrap_or_default();
        debug!("ENDBLOCK {:?} (depth {})", path, self.paths.len());
        Ok(path)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Resolution
    // ─────────────────────────────────────────────────────────────────────────

    /// Find an unqualified name on the current path without creating it.
    #[must_use]
    pub fn find(&self, text: &str) -> Option<AtomId> {
        self.path()
            .iter()
            .find_map(|&oblist| self.lookup(oblist, text))
    }

    /// Resolve an unqualified name: first match on the current path wins, and
    /// a name found nowhere is created on the path's first OBLIST.
    pub fn resolve(&mut self, text: &str) -> AtomId {
        if let Some(atom) = self.find(text) {
            return atom;
        }
        let head = self.path().first().copied().unwrap_or(self.initial);
        self.intern(head, text)
    }

    /// Resolve a possibly path-qualified name.
    ///
    /// `A!-B` is the atom `A` on the OBLIST named by `B`, where `B` is itself
    /// resolved the same way, so `A!-B!-C` splits at the first separator into
    /// `A` and `B!-C`. `A!-` is `A` on ROOT.
    pub fn resolve_path(&mut self, text: &str) -> AtomId {
        match text.split_once(PATH_SEPARATOR) {
            None => self.resolve(text),
            Some((name, "")) => self.intern(self.root, name),
            Some((name, owner)) => {
                let owner = self.resolve_path(owner);
                let oblist = self.oblist_for(owner);
                self.intern(oblist, name)
            }
        }
    }

    /// Printed form of an atom, qualified when the current path would not
    /// resolve its bare name back to it.
    #[must_use]
    pub fn display(&self, atom: AtomId) -> String {
        let text = self.text(atom);
        if self.find(text) == Some(atom) {
            return text.to_string();
        }
        match self.oblist_of(atom) {
            Some(oblist) if oblist == self.root => format!("{}{}", text, PATH_SEPARATOR),
            Some(oblist) => match self.oblist_name(oblist) {
                Some(name) => format!("{}{}{}", text, PATH_SEPARATOR, self.display(name)),
                None => format!("{}{}#OBLIST {}", text, PATH_SEPARATOR, oblist.0),
            },
            None => format!("{}{}#FALSE ()", text, PATH_SEPARATOR),
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
