// zilf-core - Evaluation context
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The context that owns every process-wide table.
//!
//! Nothing in the engine reaches for ambient state: the symbol table, the
//! global and local bindings, the association table, the layout cache and
//! the error sink all hang off a [`Context`] that is passed explicitly to
//! every operation.

use std::fmt;

use log::debug;
use zilf_value::{
    AtomId, Layout, LayoutCache, ObListId, Shape, SourceLine, StdAtom, StructRef, ZilVal,
};

use crate::assoc::{AssocEntry, AssocKey, AssocTable};
use crate::bindings::{GlobalTable, RebindGuard};
use crate::builtins;
use crate::decl;
use crate::env::{Binding, LocalEnv};
use crate::error::{Axis, Error, Result};
use crate::oblist::SymbolTable;
use crate::print;
use crate::sink::{ErrorSink, LogSink};

/// Tunables for a [`Context`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextOptions {
    /// Check declarations on assignment and binding.
    pub check_decls: bool,
    /// Maximum nesting of `eval` calls.
    pub max_eval_depth: usize,
    /// Maximum nesting of macro expansions. Values inside a replacement
    /// count from the replacement's level.
    pub max_expansion_depth: usize,
}

impl Default for ContextOptions {
    fn default() -> Self {
        ContextOptions {
            check_decls: true,
            max_eval_depth: 10_000,
            max_expansion_depth: 500,
        }
    }
}

/// All evaluator state.
pub struct Context {
    symbols: SymbolTable,
    globals: GlobalTable,
    assocs: AssocTable,
    layouts: LayoutCache,
    root_env: LocalEnv,
    env: LocalEnv,
    options: ContextOptions,
    sink: Box<dyn ErrorSink>,
    reported: usize,
    eval_depth: usize,
}

impl Context {
    /// Create a context with default options, the builtin library and a
    /// logging error sink.
    pub fn new() -> Self {
        Self::with_options(ContextOptions::default())
    }

    pub fn with_options(options: ContextOptions) -> Self {
        let root_env = LocalEnv::new();
        let mut ctx = Context {
            symbols: SymbolTable::new(),
            globals: GlobalTable::new(),
            assocs: AssocTable::new(),
            layouts: LayoutCache::new(),
            env: root_env.clone(),
            root_env,
            options,
            sink: Box::new(LogSink),
            reported: 0,
            eval_depth: 0,
        };
        builtins::register_builtins(&mut ctx);
        ctx
    }

    /// Create a context that reports to `sink`.
    pub fn with_sink(sink: impl ErrorSink + 'static) -> Self {
        let mut ctx = Self::new();
        ctx.sink = Box::new(sink);
        ctx
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Symbols
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    #[inline]
    pub fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.symbols
    }

    /// Resolve a (possibly `!-` qualified) name against the current path.
    pub fn atom(&mut self, text: &str) -> AtomId {
        self.symbols.resolve_path(text)
    }

    #[inline]
    pub fn std(&self, atom: StdAtom) -> AtomId {
        self.symbols.std(atom)
    }

    /// `T` for true, `<>` for false.
    pub fn truth(&self, b: bool) -> ZilVal {
        ZilVal::truth(b, self.std(StdAtom::T))
    }

    pub fn format(&self, value: &ZilVal) -> String {
        print::format_value(&self.symbols, value)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Options
    // ─────────────────────────────────────────────────────────────────────────

    pub fn options(&self) -> &ContextOptions {
        &self.options
    }

    #[inline]
    pub fn check_decls(&self) -> bool {
        self.options.check_decls
    }

    /// Turn declaration checking on or off, returning the previous setting.
    pub fn set_check_decls(&mut self, enabled: bool) -> bool {
        std::mem::replace(&mut self.options.check_decls, enabled)
    }

    /// Set the maximum eval depth, returning the previous limit.
    pub fn set_max_eval_depth(&mut self, depth: usize) -> usize {
        std::mem::replace(&mut self.options.max_eval_depth, depth)
    }

    /// Set the maximum expansion nesting, returning the previous limit.
    pub fn set_max_expansion_depth(&mut self, depth: usize) -> usize {
        std::mem::replace(&mut self.options.max_expansion_depth, depth)
    }

    pub(crate) fn enter_eval(&mut self) -> Result<()> {
        if self.eval_depth >= self.options.max_eval_depth {
            return Err(Error::EvalDepth {
                limit: self.options.max_eval_depth,
            });
        }
        self.eval_depth += 1;
        Ok(())
    }

    pub(crate) fn leave_eval(&mut self) {
        self.eval_depth = self.eval_depth.saturating_sub(1);
    }

    /// Current eval nesting.
    pub fn eval_depth(&self) -> usize {
        self.eval_depth
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Diagnostics
    // ─────────────────────────────────────────────────────────────────────────

    /// Hand a recoverable error to the sink.
    pub fn report(&mut self, error: &Error, source: &SourceLine) {
        self.reported += 1;
        self.sink.report(error, source);
    }

    /// Number of errors reported so far.
    pub fn reported(&self) -> usize {
        self.reported
    }

    /// Swap in a new sink, returning the old one.
    pub fn set_sink(&mut self, sink: Box<dyn ErrorSink>) -> Box<dyn ErrorSink> {
        std::mem::replace(&mut self.sink, sink)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Declarations
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether `value` satisfies `pattern`, regardless of the checking toggle.
    pub fn decl_matches(&self, value: &ZilVal, pattern: &ZilVal) -> bool {
        decl::matches(&self.symbols, value, pattern)
    }

    /// Fail if checking is on and `value` violates `decl`.
    pub fn check_decl(&self, target: AtomId, value: &ZilVal, decl: Option<&ZilVal>) -> Result<()> {
        let Some(decl) = decl else {
            return Ok(());
        };
        if !self.options.check_decls || self.decl_matches(value, decl) {
            return Ok(());
        }
        Err(Error::DeclViolation {
            target: self.symbols.display(target),
            value: self.format(value),
            decl: self.format(decl),
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Local bindings
    // ─────────────────────────────────────────────────────────────────────────

    /// The current frame.
    #[inline]
    pub fn env(&self) -> &LocalEnv {
        &self.env
    }

    #[inline]
    pub fn root_env(&self) -> &LocalEnv {
        &self.root_env
    }

    /// Run `f` with `frame` as the current frame, restoring the previous one
    /// afterwards whether `f` succeeds or not.
    pub fn with_frame<T>(
        &mut self,
        frame: LocalEnv,
        f: impl FnOnce(&mut Context) -> Result<T>,
    ) -> Result<T> {
        let saved = std::mem::replace(&mut self.env, frame);
        let result = f(self);
        self.env = saved;
        result
    }

    pub fn get_local(&self, atom: AtomId) -> Option<ZilVal> {
        self.env.get(atom)
    }

    pub fn local_binding(&self, atom: AtomId) -> Option<Binding> {
        self.env.lookup(atom)
    }

    /// Assign the innermost local binding, creating one in the root frame
    /// when none is visible.
    pub fn set_local(&mut self, atom: AtomId, value: ZilVal) -> Result<()> {
        let decl = self.env.lookup(atom).and_then(|b| b.decl);
        self.check_decl(atom, &value, decl.as_ref())?;
        if !self.env.assign(atom, value.clone()) {
            self.root_env.bind(atom, Binding::assigned(value));
        }
        Ok(())
    }

    /// Create a binding in `frame`, checking the value against `decl`.
    pub fn bind_local(
        &mut self,
        frame: &LocalEnv,
        atom: AtomId,
        value: Option<ZilVal>,
        decl: Option<ZilVal>,
    ) -> Result<()> {
        if let Some(value) = &value {
            self.check_decl(atom, value, decl.as_ref())?;
        }
        frame.bind(atom, Binding { value, decl });
        Ok(())
    }

    /// Clear the innermost local binding's value. Returns whether one exists.
    pub fn unassign_local(&mut self, atom: AtomId) -> bool {
        self.env.unassign(atom)
    }

    /// Shadow `atom` in the current frame until the guard is dropped.
    pub fn rebind(&mut self, atom: AtomId, value: ZilVal) -> Result<RebindGuard> {
        let frame = self.env.clone();
        self.rebind_in(&frame, atom, value, None)
    }

    /// Shadow `atom` in `frame` with a declared binding until the guard is
    /// dropped.
    pub fn rebind_in(
        &mut self,
        frame: &LocalEnv,
        atom: AtomId,
        value: ZilVal,
        decl: Option<ZilVal>,
    ) -> Result<RebindGuard> {
        self.check_decl(atom, &value, decl.as_ref())?;
        Ok(RebindGuard::install(
            frame,
            atom,
            Binding::assigned(value).with_decl(decl),
        ))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Global bindings
    // ─────────────────────────────────────────────────────────────────────────

    pub fn get_global(&self, atom: AtomId) -> Option<ZilVal> {
        self.globals.get(atom)
    }

    pub fn set_global(&mut self, atom: AtomId, value: ZilVal) -> Result<()> {
        let decl = self.globals.decl(atom);
        self.check_decl(atom, &value, decl.as_ref())?;
        self.globals.set(atom, value);
        Ok(())
    }

    /// Set a global without consulting its declaration.
    pub(crate) fn define_global(&mut self, atom: AtomId, value: ZilVal) {
        self.globals.set(atom, value);
    }

    pub fn unassign_global(&mut self, atom: AtomId) -> bool {
        self.globals.unassign(atom)
    }

    pub fn global_decl(&self, atom: AtomId) -> Option<ZilVal> {
        self.globals.decl(atom)
    }

    /// Attach a global declaration. An existing value must satisfy it.
    pub fn set_global_decl(&mut self, atom: AtomId, decl: ZilVal) -> Result<()> {
        if let Some(value) = self.globals.get(atom) {
            self.check_decl(atom, &value, Some(&decl))?;
        }
        self.globals.set_decl(atom, Some(decl));
        Ok(())
    }

    /// Local value only.
    pub fn lval(&self, atom: AtomId) -> Result<ZilVal> {
        self.get_local(atom).ok_or_else(|| self.unbound(atom, Axis::Local))
    }

    /// Global value only.
    pub fn gval(&self, atom: AtomId) -> Result<ZilVal> {
        self.get_global(atom)
            .ok_or_else(|| self.unbound(atom, Axis::Global))
    }

    /// Local value, else global value.
    pub fn value_of(&self, atom: AtomId) -> Result<ZilVal> {
        self.get_local(atom)
            .or_else(|| self.get_global(atom))
            .ok_or_else(|| self.unbound(atom, Axis::LocalOrGlobal))
    }

    pub(crate) fn unbound(&self, atom: AtomId, axis: Axis) -> Error {
        Error::UnboundAtom {
            atom: self.symbols.display(atom),
            axis,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Associations
    // ─────────────────────────────────────────────────────────────────────────

    fn assoc_key(&self, op: &'static str, param: &'static str, value: &ZilVal) -> Result<AssocKey> {
        AssocKey::of(value).ok_or_else(|| {
            Error::type_constraint(
                op,
                param,
                "ATOM, FIX, CHARACTER, STRING, OBLIST or record",
                value.type_name(),
            )
        })
    }

    fn is_oblist_indicator(&self, item: &ZilVal, indicator: &ZilVal) -> Option<AtomId> {
        match (item.unlocated(), indicator.unlocated()) {
            (ZilVal::Atom(name), ZilVal::Atom(ind)) if self.symbols.is_std(*ind, StdAtom::Oblist) => {
                Some(*name)
            }
            _ => None,
        }
    }

    /// Set or (with `None`) remove an association, returning the previous
    /// value.
    ///
    /// The `OBLIST` indicator on an atom names an OBLIST.
    pub fn put_prop(
        &mut self,
        item: &ZilVal,
        indicator: &ZilVal,
        value: Option<ZilVal>,
    ) -> Result<Option<ZilVal>> {
        if let Some(name) = self.is_oblist_indicator(item, indicator) {
            let previous = self.symbols.oblist_named(name).map(ZilVal::ObList);
            match value.map(ZilVal::into_unlocated) {
                Some(ZilVal::ObList(ol)) => {
                    self.symbols.unname_oblist(name);
                    self.symbols.name_oblist(name, ol);
                }
                Some(other) => {
                    return Err(Error::type_constraint(
                        "PUTPROP",
                        "value",
                        "OBLIST",
                        other.type_name(),
                    ));
                }
                None => {
                    self.symbols.unname_oblist(name);
                }
            }
            return Ok(previous);
        }

        let item_key = self.assoc_key("PUTPROP", "item", item)?;
        let indicator_key = self.assoc_key("PUTPROP", "indicator", indicator)?;
        Ok(self.assocs.put(
            (item_key, item.clone()),
            (indicator_key, indicator.clone()),
            value,
        ))
    }

    pub fn get_prop(&self, item: &ZilVal, indicator: &ZilVal) -> Result<Option<ZilVal>> {
        if let Some(name) = self.is_oblist_indicator(item, indicator) {
            return Ok(self.symbols.oblist_named(name).map(ZilVal::ObList));
        }
        let item_key = self.assoc_key("GETPROP", "item", item)?;
        let indicator_key = self.assoc_key("GETPROP", "indicator", indicator)?;
        Ok(self.assocs.get(&item_key, &indicator_key).cloned())
    }

    pub fn assocs(&self) -> &AssocTable {
        &self.assocs
    }

    /// The entry an ASOC cursor points at, if it is still live.
    pub fn assoc_entry(&self, cursor: usize) -> Option<&AssocEntry> {
        self.assocs.entry(cursor)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Tied records
    // ─────────────────────────────────────────────────────────────────────────

    pub fn layout_of<T: Shape>(&mut self) -> std::rc::Rc<Layout> {
        if !self.layouts.is_derived::<T>() {
            debug!("deriving layout for {}", T::TYPE_NAME);
        }
        self.layouts.layout_of::<T>()
    }

    /// Wrap a record as a value viewable as a list.
    pub fn wrap<T: Shape>(&mut self, record: T) -> ZilVal {
        ZilVal::Struct(self.wrap_record(record))
    }

    pub fn wrap_record<T: Shape>(&mut self, record: T) -> StructRef {
        if !self.layouts.is_derived::<T>() {
            debug!("deriving layout for {}", T::TYPE_NAME);
        }
        self.layouts.wrap(record)
    }

    pub fn layouts(&self) -> &LayoutCache {
        &self.layouts
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Blocks
    // ─────────────────────────────────────────────────────────────────────────

    pub fn push_block(&mut self, path: Vec<ObListId>) -> Result<()> {
        self.symbols.push_path(path)
    }

    pub fn pop_block(&mut self) -> Result<Vec<ObListId>> {
        self.symbols.pop_path()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("atoms", &self.symbols.atom_count())
            .field("block_depth", &self.symbols.block_depth())
            .field("frames", &self.env.depth())
            .field("options", &self.options)
            .field("reported", &self.reported)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::CollectingSink;

    #[test]
    fn test_value_of_prefers_local() {
        let mut ctx = Context::new();
        let x = ctx.atom("X");
        ctx.set_global(x, ZilVal::Fix(1)).unwrap();
        assert_eq!(ctx.value_of(x).unwrap(), ZilVal::Fix(1));
        ctx.set_local(x, ZilVal::Fix(2)).unwrap();
        assert_eq!(ctx.value_of(x).unwrap(), ZilVal::Fix(2));
        assert_eq!(ctx.gval(x).unwrap(), ZilVal::Fix(1));
    }

    #[test]
    fn test_unbound_names_axis() {
        let mut ctx = Context::new();
        let x = ctx.atom("NOWHERE");
        assert!(matches!(
            ctx.lval(x),
            Err(Error::UnboundAtom { axis: Axis::Local, .. })
        ));
        assert!(matches!(
            ctx.gval(x),
            Err(Error::UnboundAtom { axis: Axis::Global, .. })
        ));
        assert!(matches!(
            ctx.value_of(x),
            Err(Error::UnboundAtom { axis: Axis::LocalOrGlobal, .. })
        ));
    }

    #[test]
    fn test_set_local_without_binding_lands_in_root() {
        let mut ctx = Context::new();
        let x = ctx.atom("X");
        let child = ctx.env().child();
        ctx.with_frame(child, |ctx| ctx.set_local(x, ZilVal::Fix(4)))
            .unwrap();
        assert_eq!(ctx.root_env().get(x), Some(ZilVal::Fix(4)));
    }

    #[test]
    fn test_with_frame_restores_on_error() {
        let mut ctx = Context::new();
        let root = ctx.env().clone();
        let child = root.child();
        let result: Result<()> = ctx.with_frame(child, |_| Err(Error::Internal("x".into())));
        assert!(result.is_err());
        assert!(ctx.env().ptr_eq(&root));
    }

    #[test]
    fn test_global_decl_enforced_and_toggle() {
        let mut ctx = Context::new();
        let x = ctx.atom("X");
        let fix = ctx.atom("FIX");
        ctx.set_global_decl(x, ZilVal::Atom(fix)).unwrap();

        let err = ctx.set_global(x, ZilVal::string("s")).unwrap_err();
        assert!(matches!(err, Error::DeclViolation { .. }));

        assert!(ctx.set_check_decls(false));
        ctx.set_global(x, ZilVal::string("s")).unwrap();
        assert!(!ctx.set_check_decls(true));
        assert!(ctx.set_global(x, ZilVal::string("t")).is_err());
    }

    #[test]
    fn test_oblist_property_names_oblists() {
        let mut ctx = Context::new();
        let name = ZilVal::Atom(ctx.atom("MYOBL"));
        let oblist = ZilVal::Atom(ctx.std(StdAtom::Oblist));
        assert_eq!(ctx.get_prop(&name, &oblist).unwrap(), None);

        let ol = ctx.symbols_mut().new_oblist(None);
        ctx.put_prop(&name, &oblist, Some(ZilVal::ObList(ol))).unwrap();
        assert_eq!(ctx.get_prop(&name, &oblist).unwrap(), Some(ZilVal::ObList(ol)));

        ctx.put_prop(&name, &oblist, None).unwrap();
        assert_eq!(ctx.get_prop(&name, &oblist).unwrap(), None);
    }

    #[test]
    fn test_report_counts_and_forwards() {
        let sink = CollectingSink::new();
        let mut ctx = Context::with_sink(sink.clone());
        ctx.report(&Error::syntax("ADECL", "bad"), &SourceLine::Unknown);
        assert_eq!(ctx.reported(), 1);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_eval_depth_setter_returns_previous() {
        let mut ctx = Context::new();
        assert_eq!(ctx.set_max_eval_depth(50), 10_000);
        assert_eq!(ctx.set_max_eval_depth(60), 50);
    }
}
