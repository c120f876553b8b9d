// zilf-core - Local environment frames
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Local binding frames.
//!
//! Frames form a chain through parent references. Local lookup walks from
//! the current frame outward, so a binding made by a caller is visible to
//! everything it calls until that frame is left (dynamic scoping).
//!
//! ```
//! use zilf_core::{Binding, LocalEnv};
//! use zilf_value::{AtomId, ZilVal};
//!
//! let x = AtomId(7);
//! let env = LocalEnv::new();
//! env.bind(x, Binding::assigned(ZilVal::Fix(1)));
//!
//! let child = env.child();
//! assert_eq!(child.get(x), Some(ZilVal::Fix(1)));
//!
//! child.bind(x, Binding::assigned(ZilVal::Fix(2)));
//! assert_eq!(child.get(x), Some(ZilVal::Fix(2)));
//! assert_eq!(env.get(x), Some(ZilVal::Fix(1)));
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use zilf_value::{AtomId, ZilVal};

/// One value cell. A binding can exist while unassigned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Binding {
    pub value: Option<ZilVal>,
    /// Declaration pattern checked on assignment.
    pub decl: Option<ZilVal>,
}

impl Binding {
    pub fn assigned(value: ZilVal) -> Self {
        Binding {
            value: Some(value),
            decl: None,
        }
    }

    pub fn unassigned() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_decl(mut self, decl: Option<ZilVal>) -> Self {
        self.decl = decl;
        self
    }

    #[must_use]
    pub fn is_assigned(&self) -> bool {
        self.value.is_some()
    }
}

/// A local binding frame. Clones share the frame.
#[derive(Clone, Debug)]
pub struct LocalEnv {
    slots: Rc<RefCell<Slots>>,
}

#[derive(Debug, Default)]
struct Slots {
    cells: FxHashMap<AtomId, Binding>,
    parent: Option<LocalEnv>,
}

impl LocalEnv {
    /// A frame with no parent.
    pub fn new() -> Self {
        Self::over(None)
    }

    fn over(parent: Option<LocalEnv>) -> Self {
        let slots = Slots {
            parent,
            ..Slots::default()
        };
        LocalEnv {
            slots: Rc::new(RefCell::new(slots)),
        }
    }

    /// A fresh frame inside this one.
    #[must_use]
    pub fn child(&self) -> Self {
        Self::over(Some(self.clone()))
    }

    #[must_use]
    pub fn parent(&self) -> Option<LocalEnv> {
        self.slots.borrow().parent.clone()
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.slots.borrow().parent.is_none()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &LocalEnv) -> bool {
        Rc::ptr_eq(&self.slots, &other.slots)
    }

    /// Number of frames from here to the root, inclusive.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut current = self.parent();
        while let Some(env) = current {
            depth += 1;
            current = env.parent();
        }
        depth
    }

    /// Install a binding in this frame, returning the one it replaces here.
    pub fn bind(&self, atom: AtomId, binding: Binding) -> Option<Binding> {
        self.slots.borrow_mut().cells.insert(atom, binding)
    }

    /// Remove this frame's binding for `atom`.
    pub fn unbind(&self, atom: AtomId) -> Option<Binding> {
        self.slots.borrow_mut().cells.remove(&atom)
    }

    /// Put back what [`bind`](Self::bind) returned.
    pub fn restore(&self, atom: AtomId, previous: Option<Binding>) {
        match previous {
            Some(binding) => {
                self.bind(atom, binding);
            }
            None => {
                self.unbind(atom);
            }
        }
    }

    /// Whether this frame (not its parents) binds `atom`.
    #[must_use]
    pub fn binds_here(&self, atom: AtomId) -> bool {
        self.slots.borrow().cells.contains_key(&atom)
    }

    /// The nearest frame, starting with this one, that binds `atom`.
    fn binder_of(&self, atom: AtomId) -> Option<LocalEnv> {
        let mut frame = Some(self.clone());
        while let Some(env) = frame {
            if env.binds_here(atom) {
                return Some(env);
            }
            frame = env.parent();
        }
        None
    }

    /// The binding `atom` has as seen from this frame.
    #[must_use]
    pub fn lookup(&self, atom: AtomId) -> Option<Binding> {
        let binder = self.binder_of(atom)?;
        let slots = binder.slots.borrow();
        slots.cells.get(&atom).cloned()
    }

    /// The innermost binding's value, if bound and assigned.
    #[must_use]
    pub fn get(&self, atom: AtomId) -> Option<ZilVal> {
        self.lookup(atom).and_then(|b| b.value)
    }

    #[must_use]
    pub fn is_bound(&self, atom: AtomId) -> bool {
        self.lookup(atom).is_some()
    }

    /// Run `f` on the binding `atom` has as seen from this frame; `None`
    /// when nothing in the chain binds it.
    pub fn with_binding_mut<R>(&self, atom: AtomId, f: impl FnOnce(&mut Binding) -> R) -> Option<R> {
        let binder = self.binder_of(atom)?;
        let mut slots = binder.slots.borrow_mut();
        slots.cells.get_mut(&atom).map(f)
    }

    /// Assign the innermost binding. Returns false if there is none.
    pub fn assign(&self, atom: AtomId, value: ZilVal) -> bool {
        self.with_binding_mut(atom, |b| b.value = Some(value))
            .is_some()
    }

    /// Clear the innermost binding's value, keeping the binding and its
    /// declaration. Returns false if there is none.
    pub fn unassign(&self, atom: AtomId) -> bool {
        self.with_binding_mut(atom, |b| b.value = None).is_some()
    }
}

impl Default for LocalEnv {
    fn default() -> Self {
        Self::over(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const X: AtomId = AtomId(1);
    const Y: AtomId = AtomId(2);

    #[test]
    fn test_lookup_walks_parents() {
        let root = LocalEnv::new();
        root.bind(X, Binding::assigned(ZilVal::Fix(1)));
        let child = root.child().child();
        assert_eq!(child.get(X), Some(ZilVal::Fix(1)));
        assert_eq!(child.get(Y), None);
        assert_eq!(child.depth(), 3);
    }

    #[test]
    fn test_assign_updates_innermost() {
        let root = LocalEnv::new();
        root.bind(X, Binding::assigned(ZilVal::Fix(1)));
        let child = root.child();
        child.bind(X, Binding::assigned(ZilVal::Fix(2)));

        assert!(child.assign(X, ZilVal::Fix(3)));
        assert_eq!(child.get(X), Some(ZilVal::Fix(3)));
        assert_eq!(root.get(X), Some(ZilVal::Fix(1)));

        assert!(!child.assign(Y, ZilVal::Fix(0)));
    }

    #[test]
    fn test_unassign_keeps_binding_and_decl() {
        let env = LocalEnv::new();
        env.bind(
            X,
            Binding::assigned(ZilVal::Fix(1)).with_decl(Some(ZilVal::Atom(AtomId(99)))),
        );
        assert!(env.unassign(X));
        let binding = env.lookup(X).unwrap();
        assert!(!binding.is_assigned());
        assert_eq!(binding.decl, Some(ZilVal::Atom(AtomId(99))));
        assert!(env.is_bound(X));
    }

    #[test]
    fn test_restore_removes_fresh_binding() {
        let env = LocalEnv::new();
        let previous = env.bind(X, Binding::assigned(ZilVal::Fix(5)));
        assert!(previous.is_none());
        env.restore(X, previous);
        assert!(!env.binds_here(X));
    }
}
