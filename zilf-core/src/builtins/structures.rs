// zilf-core - Structure built-in functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Structure operations: LIST, VECTOR, FORM, CHTYPE, NTH, PUT, REST,
//! LENGTH, LENGTH?, EMPTY?, TYPE
//!
//! Every operation goes through the structure protocol, so tied records
//! answer exactly like lists.

use zilf_value::{TypeTag, ZilVal};

use super::{BoundArgs, Constraint, Signature, define_subr};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::structure;

const STRUCTURED: Constraint = Constraint::Structured;
const FIX: Constraint = Constraint::Type(TypeTag::Fix);

pub fn register(ctx: &mut Context) {
    define_subr(
        ctx,
        Signature::new("LIST").seq("elements", Constraint::Any, 0),
        |_, args| Ok(ZilVal::list(args.into_seq())),
    );
    define_subr(
        ctx,
        Signature::new("VECTOR").seq("elements", Constraint::Any, 0),
        |_, args| Ok(ZilVal::vector(args.into_seq())),
    );
    define_subr(
        ctx,
        Signature::new("FORM").seq("elements", Constraint::Any, 0),
        |_, args| Ok(ZilVal::form(args.into_seq())),
    );
    define_subr(
        ctx,
        Signature::new("CHTYPE")
            .required("value", STRUCTURED)
            .required("type", Constraint::Type(TypeTag::Atom)),
        builtin_chtype,
    );
    define_subr(
        ctx,
        Signature::new("NTH")
            .required("structure", STRUCTURED)
            .optional("index", FIX),
        builtin_nth,
    );
    define_subr(
        ctx,
        Signature::new("PUT")
            .required("structure", STRUCTURED)
            .required("index", FIX)
            .required("value", Constraint::Any),
        builtin_put,
    );
    define_subr(
        ctx,
        Signature::new("REST")
            .required("structure", STRUCTURED)
            .optional("count", FIX),
        builtin_rest,
    );
    define_subr(
        ctx,
        Signature::new("LENGTH").required("structure", STRUCTURED),
        builtin_length,
    );
    define_subr(
        ctx,
        Signature::new("LENGTH?")
            .required("structure", STRUCTURED)
            .required("limit", FIX),
        builtin_length_p,
    );
    define_subr(
        ctx,
        Signature::new("EMPTY?").required("structure", STRUCTURED),
        builtin_empty_p,
    );
    define_subr(
        ctx,
        Signature::new("TYPE").required("value", Constraint::Any),
        builtin_type,
    );
}

/// Convert a 1-based position into a 0-based index.
pub(crate) fn one_based(n: i32, value: &ZilVal) -> Result<usize> {
    if n < 1 {
        return Err(Error::IndexOutOfRange {
            index: 0,
            length: structure::length(value).unwrap_or(0),
        });
    }
    Ok((n - 1) as usize)
}

fn count(n: i32) -> Result<usize> {
    usize::try_from(n).map_err(|_| Error::IndexOutOfRange { index: 0, length: 0 })
}

/// A length as a FIX, for structures too long to count in one.
fn length_fix(name: &'static str, n: usize) -> Result<ZilVal> {
    i32::try_from(n)
        .map(ZilVal::Fix)
        .map_err(|_| Error::type_constraint(name, "structure", "length that fits a FIX", n.to_string()))
}

// ============================================================================
// Conversion
// ============================================================================

/// <CHTYPE structure type> - Same elements, different list-like type
fn builtin_chtype(ctx: &mut Context, args: BoundArgs) -> Result<ZilVal> {
    let target = args.atom(1)?;
    let name = ctx.symbols().text(target);
    let elements = structure::elements(args.req(0))?;
    match TypeTag::from_name(name) {
        Some(TypeTag::List) => Ok(ZilVal::list(elements)),
        Some(TypeTag::Form) => Ok(ZilVal::form(elements)),
        Some(TypeTag::Vector) => Ok(ZilVal::vector(elements)),
        Some(TypeTag::Splice) => Ok(ZilVal::splice(elements)),
        Some(TypeTag::False) => Ok(ZilVal::False(elements.into_iter().collect())),
        _ => Err(Error::type_constraint(
            "CHTYPE",
            "type",
            "LIST, FORM, VECTOR, SPLICE or FALSE",
            name.to_string(),
        )),
    }
}

// ============================================================================
// Access
// ============================================================================

/// <NTH structure [n]> - The nth element, 1-based
fn builtin_nth(_ctx: &mut Context, args: BoundArgs) -> Result<ZilVal> {
    let target = args.req(0);
    let n = args.opt_fix(1)?.unwrap_or(1);
    structure::nth(target, one_based(n, target)?)
}

/// <PUT structure n value> - Replace the nth element
///
/// LIST-like values return a new structure; records are updated in place.
fn builtin_put(_ctx: &mut Context, mut args: BoundArgs) -> Result<ZilVal> {
    let n = args.fix(1)?;
    let value = args.take(2).unwrap_or_else(ZilVal::falsey);
    let target = args.req(0);
    structure::put(target, one_based(n, target)?, value)
}

/// <REST structure [n]> - Skip the first n elements
fn builtin_rest(_ctx: &mut Context, args: BoundArgs) -> Result<ZilVal> {
    let skip = count(args.opt_fix(1)?.unwrap_or(1))?;
    structure::rest(args.req(0), skip)
}

/// <LENGTH structure>
fn builtin_length(_ctx: &mut Context, args: BoundArgs) -> Result<ZilVal> {
    length_fix("LENGTH", structure::length(args.req(0))?)
}

/// <LENGTH? structure limit> - The length if at most limit, else FALSE
fn builtin_length_p(_ctx: &mut Context, args: BoundArgs) -> Result<ZilVal> {
    let limit = count(args.fix(1)?)?;
    match structure::length_bounded(args.req(0), limit)? {
        Some(n) => length_fix("LENGTH?", n),
        None => Ok(ZilVal::falsey()),
    }
}

/// <EMPTY? structure>
fn builtin_empty_p(ctx: &mut Context, args: BoundArgs) -> Result<ZilVal> {
    let empty = structure::is_empty(args.req(0))?;
    Ok(ctx.truth(empty))
}

/// <TYPE value> - The type name as an atom on ROOT
fn builtin_type(ctx: &mut Context, args: BoundArgs) -> Result<ZilVal> {
    let name = args.req(0).type_name();
    let root = ctx.symbols().root();
    Ok(ZilVal::Atom(ctx.symbols_mut().intern(root, name)))
}
