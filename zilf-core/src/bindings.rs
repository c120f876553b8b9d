// zilf-core - Global bindings and scoped rebinding
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Global value cells and scoped local rebinding.
//!
//! A [`RebindGuard`] installs a binding in a frame and puts back whatever the
//! frame held before when it is dropped, so the previous view is restored on
//! every exit path, including `?` propagation.

use rustc_hash::FxHashMap;
use zilf_value::{AtomId, ZilVal};

use crate::env::{Binding, LocalEnv};

/// Per-atom global value cells.
#[derive(Debug, Default)]
pub struct GlobalTable {
    cells: FxHashMap<AtomId, Binding>,
}

impl GlobalTable {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, atom: AtomId) -> Option<ZilVal> {
        self.cells.get(&atom).and_then(|b| b.value.clone())
    }

    #[must_use]
    pub fn is_assigned(&self, atom: AtomId) -> bool {
        self.cells.get(&atom).is_some_and(Binding::is_assigned)
    }

    /// Assign, keeping any declaration already attached.
    pub fn set(&mut self, atom: AtomId, value: ZilVal) {
        self.cells.entry(atom).or_default().value = Some(value);
    }

    /// Clear the value, keeping the cell and its declaration. Returns whether
    /// a value was present.
    pub fn unassign(&mut self, atom: AtomId) -> bool {
        self.cells
            .get_mut(&atom)
            .and_then(|b| b.value.take())
            .is_some()
    }

    #[must_use]
    pub fn decl(&self, atom: AtomId) -> Option<ZilVal> {
        self.cells.get(&atom).and_then(|b| b.decl.clone())
    }

    pub fn set_decl(&mut self, atom: AtomId, decl: Option<ZilVal>) {
        self.cells.entry(atom).or_default().decl = decl;
    }

    /// Atoms with a global value.
    pub fn assigned_atoms(&self) -> impl Iterator<Item = AtomId> + '_ {
        self.cells
            .iter()
            .filter(|(_, b)| b.is_assigned())
            .map(|(atom, _)| *atom)
    }
}

/// RAII guard for a scoped local binding.
///
/// Holds its own reference to the frame, so the context stays free for the
/// code running inside the scope.
#[must_use = "the binding is undone when the guard is dropped"]
#[derive(Debug)]
pub struct RebindGuard {
    frame: LocalEnv,
    atom: AtomId,
    previous: Option<Binding>,
}

impl RebindGuard {
    /// Bind `atom` in `frame`, shadowing any outer binding until the guard
    /// is dropped.
    pub fn install(frame: &LocalEnv, atom: AtomId, binding: Binding) -> Self {
        let previous = frame.bind(atom, binding);
        RebindGuard {
            frame: frame.clone(),
            atom,
            previous,
        }
    }

    #[must_use]
    pub fn atom(&self) -> AtomId {
        self.atom
    }
}

impl Drop for RebindGuard {
    fn drop(&mut self) {
        self.frame.restore(self.atom, self.previous.take());
    }
}
