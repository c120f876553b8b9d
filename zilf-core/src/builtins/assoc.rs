// zilf-core - Association built-in functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Association operations: PUTPROP, GETPROP, ASSOCIATIONS, NEXT, ITEM,
//! INDICATOR, AVALUE

use zilf_value::{TypeTag, ZilVal};

use super::{BoundArgs, Constraint, Signature, define_subr};
use crate::assoc::AssocEntry;
use crate::context::Context;
use crate::error::Result;

const ASOC: Constraint = Constraint::Type(TypeTag::Asoc);

pub fn register(ctx: &mut Context) {
    define_subr(
        ctx,
        Signature::new("PUTPROP")
            .required("item", Constraint::Any)
            .required("indicator", Constraint::Any)
            .optional("value", Constraint::Any),
        builtin_putprop,
    );
    define_subr(
        ctx,
        Signature::new("GETPROP")
            .required("item", Constraint::Any)
            .required("indicator", Constraint::Any)
            .optional("default", Constraint::Any),
        builtin_getprop,
    );
    define_subr(ctx, Signature::new("ASSOCIATIONS"), builtin_associations);
    define_subr(ctx, Signature::new("NEXT").required("asoc", ASOC), builtin_next);
    define_subr(ctx, Signature::new("ITEM").required("asoc", ASOC), |ctx, args| {
        entry_field(ctx, &args, |e| &e.item)
    });
    define_subr(
        ctx,
        Signature::new("INDICATOR").required("asoc", ASOC),
        |ctx, args| entry_field(ctx, &args, |e| &e.indicator),
    );
    define_subr(ctx, Signature::new("AVALUE").required("asoc", ASOC), |ctx, args| {
        entry_field(ctx, &args, |e| &e.value)
    });
}

fn cursor_value(cursor: Option<usize>) -> ZilVal {
    cursor.map_or_else(ZilVal::falsey, ZilVal::Asoc)
}

/// <PUTPROP item indicator [value]> - Associate a value, returns item
///
/// Without a value, removes the association and returns the old value, or
/// FALSE if there was none.
fn builtin_putprop(ctx: &mut Context, mut args: BoundArgs) -> Result<ZilVal> {
    let value = args.take(2);
    let removing = value.is_none();
    let previous = ctx.put_prop(args.req(0), args.req(1), value)?;
    if removing {
        Ok(previous.unwrap_or_else(ZilVal::falsey))
    } else {
        Ok(args.req(0).clone())
    }
}

/// <GETPROP item indicator [default]> - The associated value, else default
/// or FALSE
fn builtin_getprop(ctx: &mut Context, mut args: BoundArgs) -> Result<ZilVal> {
    let found = ctx.get_prop(args.req(0), args.req(1))?;
    Ok(found
        .or_else(|| args.take(2))
        .unwrap_or_else(ZilVal::falsey))
}

/// <ASSOCIATIONS> - Cursor on the first association, or FALSE
fn builtin_associations(ctx: &mut Context, _args: BoundArgs) -> Result<ZilVal> {
    Ok(cursor_value(ctx.assocs().first()))
}

/// <NEXT asoc> - Cursor on the following association, or FALSE
fn builtin_next(ctx: &mut Context, args: BoundArgs) -> Result<ZilVal> {
    let cursor = args.asoc(0)?;
    Ok(cursor_value(ctx.assocs().next(cursor)))
}

/// Read one part of the entry under a cursor; FALSE once it is removed.
fn entry_field(
    ctx: &mut Context,
    args: &BoundArgs,
    part: fn(&AssocEntry) -> &ZilVal,
) -> Result<ZilVal> {
    let cursor = args.asoc(0)?;
    Ok(ctx
        .assoc_entry(cursor)
        .map_or_else(ZilVal::falsey, |entry| part(entry).clone()))
}
