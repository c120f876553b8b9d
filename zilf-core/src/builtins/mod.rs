// zilf-core - Builtin dispatch
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Native procedures and the signatures that guard them.
//!
//! Every builtin declares a [`Signature`]: required and optional parameter
//! slots, each with a [`Constraint`], and at most one trailing sequence group
//! that gathers the remaining arguments. Arity and types are checked before
//! the body runs, so a body only ever sees arguments its signature admits.

pub mod assoc;
pub mod atoms;
pub mod bindings;
pub mod forms;
pub mod structures;

use std::any::Any;
use std::rc::Rc;

use zilf_value::{AtomId, ObListId, TypeTag, ZilBuiltin, ZilVal};

use crate::context::Context;
use crate::error::{AritySpec, Error, Result};

/// Type alias for a builtin body.
pub type BuiltinBody = dyn Fn(&mut Context, BoundArgs) -> Result<ZilVal>;

// ============================================================================
// Signatures
// ============================================================================

/// What a parameter slot admits.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Any,
    Type(TypeTag),
    Union(&'static [TypeTag]),
    Structured,
    Applicable,
}

impl Constraint {
    #[must_use]
    pub fn accepts(&self, value: &ZilVal) -> bool {
        match self {
            Constraint::Any => true,
            Constraint::Type(tag) => value.type_tag() == *tag,
            Constraint::Union(tags) => tags.contains(&value.type_tag()),
            Constraint::Structured => value.is_structured(),
            Constraint::Applicable => value.is_applicable(),
        }
    }

    /// How the constraint reads in error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Constraint::Any => "ANY".to_string(),
            Constraint::Type(tag) => tag.name().to_string(),
            Constraint::Union(tags) => tags
                .iter()
                .map(|t| t.name())
                .collect::<Vec<_>>()
                .join(" or "),
            Constraint::Structured => "STRUCTURED".to_string(),
            Constraint::Applicable => "APPLICABLE".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: &'static str,
    pub optional: bool,
    pub constraint: Constraint,
}

/// A run of trailing arguments gathered into one aggregate.
#[derive(Debug, Clone)]
pub struct SeqGroup {
    pub name: &'static str,
    pub constraint: Constraint,
    pub min: usize,
}

/// The declared shape of a builtin's arguments.
#[derive(Debug, Clone)]
pub struct Signature {
    name: &'static str,
    params: Vec<Param>,
    seq: Option<SeqGroup>,
}

impl Signature {
    pub fn new(name: &'static str) -> Self {
        Signature {
            name,
            params: Vec::new(),
            seq: None,
        }
    }

    /// Add a required slot. Required slots come before optional ones.
    #[must_use]
    pub fn required(mut self, name: &'static str, constraint: Constraint) -> Self {
        debug_assert!(
            self.params.iter().all(|p| !p.optional),
            "{}: required parameter after optional",
            self.name
        );
        self.params.push(Param {
            name,
            optional: false,
            constraint,
        });
        self
    }

    #[must_use]
    pub fn optional(mut self, name: &'static str, constraint: Constraint) -> Self {
        self.params.push(Param {
            name,
            optional: true,
            constraint,
        });
        self
    }

    /// Gather every remaining argument, requiring at least `min` of them.
    #[must_use]
    pub fn seq(mut self, name: &'static str, constraint: Constraint, min: usize) -> Self {
        self.seq = Some(SeqGroup {
            name,
            constraint,
            min,
        });
        self
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Arity derived from the slots.
    #[must_use]
    pub fn arity(&self) -> AritySpec {
        let required = self.params.iter().filter(|p| !p.optional).count();
        match &self.seq {
            Some(seq) => AritySpec::AtLeast(required + seq.min),
            None => AritySpec::from_bounds(required, Some(self.params.len())),
        }
    }

    /// Check `args` against the signature and sort them into slots.
    pub fn bind(&self, args: Vec<ZilVal>) -> Result<BoundArgs> {
        let arity = self.arity();
        if !arity.accepts(args.len()) {
            return Err(Error::arity(self.name, arity, args.len()));
        }

        let mut values = Vec::with_capacity(self.params.len());
        let mut seq = Vec::new();
        for (i, arg) in args.into_iter().map(ZilVal::into_unlocated).enumerate() {
            let (param, constraint) = match self.params.get(i) {
                Some(p) => (p.name, &p.constraint),
                None => match &self.seq {
                    Some(group) => (group.name, &group.constraint),
                    None => return Err(Error::arity(self.name, arity.clone(), i + 1)),
                },
            };
            if !constraint.accepts(&arg) {
                return Err(Error::type_constraint(
                    self.name,
                    param,
                    constraint.describe(),
                    arg.type_name(),
                ));
            }
            if i < self.params.len() {
                values.push(Some(arg));
            } else {
                seq.push(arg);
            }
        }
        values.resize(self.params.len(), None);

        Ok(BoundArgs {
            name: self.name,
            names: self.params.iter().map(|p| p.name).collect(),
            values,
            seq,
        })
    }
}

// ============================================================================
// Bound arguments
// ============================================================================

/// Arguments sorted into their signature's slots.
#[derive(Debug)]
pub struct BoundArgs {
    name: &'static str,
    names: Vec<&'static str>,
    values: Vec<Option<ZilVal>>,
    seq: Vec<ZilVal>,
}

impl BoundArgs {
    fn mismatch(&self, i: usize, expected: &str, got: &ZilVal) -> Error {
        let param = self.names.get(i).copied().unwrap_or("argument");
        Error::type_constraint(self.name, param, expected, got.type_name())
    }

    /// The builtin's name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// A required slot.
    ///
    /// # Panics
    ///
    /// Panics if slot `i` is optional and was not supplied.
    #[must_use]
    pub fn req(&self, i: usize) -> &ZilVal {
        self.values[i]
            .as_ref()
            .expect("required slot filled by Signature::bind")
    }

    #[must_use]
    pub fn opt(&self, i: usize) -> Option<&ZilVal> {
        self.values.get(i).and_then(Option::as_ref)
    }

    /// Move a slot's value out.
    pub fn take(&mut self, i: usize) -> Option<ZilVal> {
        self.values.get_mut(i).and_then(Option::take)
    }

    /// The sequence group's arguments.
    #[must_use]
    pub fn seq(&self) -> &[ZilVal] {
        &self.seq
    }

    #[must_use]
    pub fn into_seq(self) -> Vec<ZilVal> {
        self.seq
    }

    pub fn atom(&self, i: usize) -> Result<AtomId> {
        match self.req(i) {
            ZilVal::Atom(a) => Ok(*a),
            other => Err(self.mismatch(i, "ATOM", other)),
        }
    }

    pub fn fix(&self, i: usize) -> Result<i32> {
        match self.req(i) {
            ZilVal::Fix(n) => Ok(*n),
            other => Err(self.mismatch(i, "FIX", other)),
        }
    }

    pub fn opt_fix(&self, i: usize) -> Result<Option<i32>> {
        match self.opt(i) {
            None => Ok(None),
            Some(ZilVal::Fix(n)) => Ok(Some(*n)),
            Some(other) => Err(self.mismatch(i, "FIX", other)),
        }
    }

    pub fn oblist(&self, i: usize) -> Result<ObListId> {
        match self.req(i) {
            ZilVal::ObList(ol) => Ok(*ol),
            other => Err(self.mismatch(i, "OBLIST", other)),
        }
    }

    pub fn string(&self, i: usize) -> Result<Rc<str>> {
        match self.req(i) {
            ZilVal::String(s) => Ok(s.clone()),
            other => Err(self.mismatch(i, "STRING", other)),
        }
    }

    pub fn asoc(&self, i: usize) -> Result<usize> {
        match self.req(i) {
            ZilVal::Asoc(cursor) => Ok(*cursor),
            other => Err(self.mismatch(i, "ASOC", other)),
        }
    }
}

// ============================================================================
// Native procedures
// ============================================================================

/// A native body paired with its signature.
pub struct Builtin {
    signature: Signature,
    body: Box<BuiltinBody>,
}

impl Builtin {
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

/// Create a native procedure.
pub fn make_builtin(
    signature: Signature,
    body: impl Fn(&mut Context, BoundArgs) -> Result<ZilVal> + 'static,
) -> ZilBuiltin {
    let name = signature.name();
    let imp: Rc<dyn Any> = Rc::new(Builtin {
        signature,
        body: Box::new(body),
    });
    ZilBuiltin::new(name, imp)
}

/// Check `args` against the builtin's signature, then run its body.
pub fn call_builtin(ctx: &mut Context, builtin: &ZilBuiltin, args: Vec<ZilVal>) -> Result<ZilVal> {
    let imp = builtin.imp().clone();
    let native = imp.downcast_ref::<Builtin>().ok_or_else(|| {
        Error::Internal(format!("{} has no native implementation", builtin.name()))
    })?;
    let bound = native.signature.bind(args)?;
    (native.body)(ctx, bound)
}

fn define(ctx: &mut Context, value: ZilVal, name: &'static str) {
    let root = ctx.symbols().root();
    let atom = ctx.symbols_mut().intern(root, name);
    ctx.define_global(atom, value);
}

/// Define a SUBR (evaluated arguments) on ROOT.
pub fn define_subr(
    ctx: &mut Context,
    signature: Signature,
    body: impl Fn(&mut Context, BoundArgs) -> Result<ZilVal> + 'static,
) {
    let name = signature.name();
    define(ctx, ZilVal::Subr(make_builtin(signature, body)), name);
}

/// Define an FSUBR (unevaluated arguments) on ROOT.
pub fn define_fsubr(
    ctx: &mut Context,
    signature: Signature,
    body: impl Fn(&mut Context, BoundArgs) -> Result<ZilVal> + 'static,
) {
    let name = signature.name();
    define(ctx, ZilVal::Fsubr(make_builtin(signature, body)), name);
}

/// Register every builtin in the context.
pub fn register_builtins(ctx: &mut Context) {
    atoms::register(ctx);
    bindings::register(ctx);
    structures::register(ctx);
    assoc::register(ctx);
    forms::register(ctx);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig() -> Signature {
        Signature::new("TEST")
            .required("a", Constraint::Type(TypeTag::Fix))
            .optional("b", Constraint::Union(&[TypeTag::Atom, TypeTag::String]))
    }

    #[test]
    fn test_arity_from_slots() {
        assert_eq!(sig().arity(), AritySpec::Range(1, 2));
        assert_eq!(
            Signature::new("S").seq("xs", Constraint::Any, 1).arity(),
            AritySpec::AtLeast(1)
        );
        assert_eq!(Signature::new("N").arity(), AritySpec::Exact(0));
    }

    #[test]
    fn test_bind_sorts_slots() {
        let bound = sig().bind(vec![ZilVal::Fix(1)]).unwrap();
        assert_eq!(bound.fix(0).unwrap(), 1);
        assert_eq!(bound.opt(1), None);

        let s = Signature::new("S")
            .required("a", Constraint::Any)
            .seq("xs", Constraint::Type(TypeTag::Fix), 0);
        let bound = s
            .bind(vec![ZilVal::falsey(), ZilVal::Fix(2), ZilVal::Fix(3)])
            .unwrap();
        assert_eq!(bound.seq(), &[ZilVal::Fix(2), ZilVal::Fix(3)]);
    }

    #[test]
    fn test_bind_rejects_wrong_count() {
        let err = sig().bind(vec![]).unwrap_err();
        assert_eq!(
            err,
            Error::ArityError {
                name: "TEST".into(),
                expected: AritySpec::Range(1, 2),
                got: 0,
            }
        );
        assert!(sig().bind(vec![ZilVal::Fix(1); 3]).is_err());
    }

    #[test]
    fn test_bind_rejects_wrong_type() {
        let err = sig()
            .bind(vec![ZilVal::Fix(1), ZilVal::Fix(2)])
            .unwrap_err();
        assert_eq!(
            err,
            Error::type_constraint("TEST", "b", "ATOM or STRING", "FIX")
        );
    }

    #[test]
    fn test_call_builtin_runs_body() {
        let mut ctx = Context::new();
        let double = make_builtin(
            Signature::new("DOUBLE").required("n", Constraint::Type(TypeTag::Fix)),
            |_, args| Ok(ZilVal::Fix(args.fix(0)? * 2)),
        );
        assert_eq!(
            call_builtin(&mut ctx, &double, vec![ZilVal::Fix(21)]).unwrap(),
            ZilVal::Fix(42)
        );
    }

    #[test]
    fn test_foreign_builtin_is_internal_error() {
        let mut ctx = Context::new();
        let bogus = ZilBuiltin::new("BOGUS", Rc::new(5_u8));
        let err = call_builtin(&mut ctx, &bogus, vec![]).unwrap_err();
        assert!(!err.is_recoverable());
    }
}
