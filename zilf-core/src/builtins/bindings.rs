// zilf-core - Binding built-in functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Local and global values, and declarations

use zilf_value::{TypeTag, ZilVal};

use super::{BoundArgs, Constraint, Signature, define_fsubr, define_subr};
use crate::context::Context;
use crate::error::{Error, Result};

const ATOM: Constraint = Constraint::Type(TypeTag::Atom);

pub fn register(ctx: &mut Context) {
    define_subr(
        ctx,
        Signature::new("SET")
            .required("atom", ATOM)
            .required("value", Constraint::Any),
        builtin_set,
    );
    define_subr(
        ctx,
        Signature::new("SETG")
            .required("atom", ATOM)
            .required("value", Constraint::Any),
        builtin_setg,
    );
    define_subr(ctx, Signature::new("LVAL").required("atom", ATOM), builtin_lval);
    define_subr(ctx, Signature::new("GVAL").required("atom", ATOM), builtin_gval);
    define_subr(ctx, Signature::new("VALUE").required("atom", ATOM), builtin_value);
    define_subr(ctx, Signature::new("ASSIGNED?").required("atom", ATOM), builtin_assigned_p);
    define_subr(ctx, Signature::new("GASSIGNED?").required("atom", ATOM), builtin_gassigned_p);
    define_subr(ctx, Signature::new("BOUND?").required("atom", ATOM), builtin_bound_p);
    define_subr(ctx, Signature::new("UNASSIGN").required("atom", ATOM), builtin_unassign);
    define_subr(ctx, Signature::new("GUNASSIGN").required("atom", ATOM), builtin_gunassign);
    define_fsubr(
        ctx,
        Signature::new("GDECL").seq("decls", Constraint::Any, 0),
        builtin_gdecl,
    );
    define_subr(
        ctx,
        Signature::new("DECL?")
            .required("value", Constraint::Any)
            .required("pattern", Constraint::Any),
        builtin_decl_p,
    );
    define_subr(
        ctx,
        Signature::new("DECL-CHECK").required("enable", Constraint::Any),
        builtin_decl_check,
    );
}

// ============================================================================
// Values
// ============================================================================

/// <SET atom value> - Assign the innermost local binding, returns value
fn builtin_set(ctx: &mut Context, mut args: BoundArgs) -> Result<ZilVal> {
    let atom = args.atom(0)?;
    let value = args.take(1).unwrap_or_else(ZilVal::falsey);
    ctx.set_local(atom, value.clone())?;
    Ok(value)
}

/// <SETG atom value> - Assign the global value, returns value
fn builtin_setg(ctx: &mut Context, mut args: BoundArgs) -> Result<ZilVal> {
    let atom = args.atom(0)?;
    let value = args.take(1).unwrap_or_else(ZilVal::falsey);
    ctx.set_global(atom, value.clone())?;
    Ok(value)
}

/// <LVAL atom> - Local value
fn builtin_lval(ctx: &mut Context, args: BoundArgs) -> Result<ZilVal> {
    ctx.lval(args.atom(0)?)
}

/// <GVAL atom> - Global value
fn builtin_gval(ctx: &mut Context, args: BoundArgs) -> Result<ZilVal> {
    ctx.gval(args.atom(0)?)
}

/// <VALUE atom> - Local value if there is one, else global value
fn builtin_value(ctx: &mut Context, args: BoundArgs) -> Result<ZilVal> {
    ctx.value_of(args.atom(0)?)
}

// ============================================================================
// Predicates
// ============================================================================

/// <ASSIGNED? atom> - Whether the atom has a local value
fn builtin_assigned_p(ctx: &mut Context, args: BoundArgs) -> Result<ZilVal> {
    let atom = args.atom(0)?;
    Ok(ctx.truth(ctx.get_local(atom).is_some()))
}

/// <GASSIGNED? atom> - Whether the atom has a global value
fn builtin_gassigned_p(ctx: &mut Context, args: BoundArgs) -> Result<ZilVal> {
    let atom = args.atom(0)?;
    Ok(ctx.truth(ctx.get_global(atom).is_some()))
}

/// <BOUND? atom> - Whether a local binding is visible, assigned or not
fn builtin_bound_p(ctx: &mut Context, args: BoundArgs) -> Result<ZilVal> {
    let atom = args.atom(0)?;
    Ok(ctx.truth(ctx.local_binding(atom).is_some()))
}

// ============================================================================
// Unassignment
// ============================================================================

/// <UNASSIGN atom> - Clear the innermost local value, returns atom
fn builtin_unassign(ctx: &mut Context, args: BoundArgs) -> Result<ZilVal> {
    let atom = args.atom(0)?;
    ctx.unassign_local(atom);
    Ok(ZilVal::Atom(atom))
}

/// <GUNASSIGN atom> - Clear the global value, keeping its declaration
fn builtin_gunassign(ctx: &mut Context, args: BoundArgs) -> Result<ZilVal> {
    let atom = args.atom(0)?;
    ctx.unassign_global(atom);
    Ok(ZilVal::Atom(atom))
}

// ============================================================================
// Declarations
// ============================================================================

/// <GDECL (atom...) pattern ...> - Declare global values
fn builtin_gdecl(ctx: &mut Context, args: BoundArgs) -> Result<ZilVal> {
    let decls = args.into_seq();
    if decls.len() % 2 != 0 {
        return Err(Error::syntax(
            "GDECL",
            "expected pairs of (atom...) and a pattern",
        ));
    }
    for pair in decls.chunks(2) {
        let (names, pattern) = (&pair[0], &pair[1]);
        let ZilVal::List(atoms, _) = names else {
            return Err(Error::syntax(
                "GDECL",
                format!("expected a LIST of atoms, got {}", ctx.format(names)),
            ));
        };
        for item in atoms {
            let Some(atom) = item.as_atom() else {
                return Err(Error::syntax(
                    "GDECL",
                    format!("expected an atom, got {}", ctx.format(item)),
                ));
            };
            ctx.set_global_decl(atom, pattern.clone())?;
        }
    }
    Ok(ctx.truth(true))
}

/// <DECL? value pattern> - Whether the value matches the pattern
fn builtin_decl_p(ctx: &mut Context, args: BoundArgs) -> Result<ZilVal> {
    let matched = ctx.decl_matches(args.req(0), args.req(1));
    Ok(ctx.truth(matched))
}

/// <DECL-CHECK flag> - Turn declaration checking on or off, returns the
/// previous setting
fn builtin_decl_check(ctx: &mut Context, args: BoundArgs) -> Result<ZilVal> {
    let previous = ctx.set_check_decls(args.req(0).is_true());
    Ok(ctx.truth(previous))
}
