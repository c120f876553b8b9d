// zilf-core - Atom and OBLIST built-in functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Atom and OBLIST operations: ATOM, SPNAME, LOOKUP, INSERT, REMOVE, OBLIST?,
//! MOBLIST, ROOT, BLOCK, ENDBLOCK, PARSE

use zilf_value::{TypeTag, ZilVal};

use super::{BoundArgs, Constraint, Signature, define_subr};
use crate::context::Context;
use crate::error::{Error, Result};

const ATOM: Constraint = Constraint::Type(TypeTag::Atom);
const STRING: Constraint = Constraint::Type(TypeTag::String);
const OBLIST: Constraint = Constraint::Type(TypeTag::ObList);

pub fn register(ctx: &mut Context) {
    define_subr(ctx, Signature::new("ATOM").required("name", STRING), builtin_atom);
    define_subr(ctx, Signature::new("SPNAME").required("atom", ATOM), builtin_spname);
    define_subr(
        ctx,
        Signature::new("LOOKUP")
            .required("name", STRING)
            .required("oblist", OBLIST),
        builtin_lookup,
    );
    define_subr(
        ctx,
        Signature::new("INSERT")
            .required("atom", Constraint::Union(&[TypeTag::Atom, TypeTag::String]))
            .required("oblist", OBLIST),
        builtin_insert,
    );
    define_subr(ctx, Signature::new("REMOVE").required("atom", ATOM), builtin_remove);
    define_subr(ctx, Signature::new("OBLIST?").required("atom", ATOM), builtin_oblist_p);
    define_subr(ctx, Signature::new("MOBLIST").required("name", ATOM), builtin_moblist);
    define_subr(ctx, Signature::new("ROOT"), builtin_root);
    define_subr(
        ctx,
        Signature::new("BLOCK").required("path", Constraint::Type(TypeTag::List)),
        builtin_block,
    );
    define_subr(ctx, Signature::new("ENDBLOCK"), builtin_endblock);
    define_subr(ctx, Signature::new("PARSE").required("text", STRING), builtin_parse);
}

// ============================================================================
// Atoms
// ============================================================================

/// <ATOM "name"> - Create a new atom on no OBLIST
fn builtin_atom(ctx: &mut Context, args: BoundArgs) -> Result<ZilVal> {
    let name = args.string(0)?;
    Ok(ZilVal::Atom(ctx.symbols_mut().new_atom(&name)))
}

/// <SPNAME atom> - The atom's printed name, unqualified
fn builtin_spname(ctx: &mut Context, args: BoundArgs) -> Result<ZilVal> {
    let atom = args.atom(0)?;
    Ok(ZilVal::String(ctx.symbols().text_rc(atom)))
}

/// <LOOKUP "name" oblist> - The atom with that name on the OBLIST, or FALSE
fn builtin_lookup(ctx: &mut Context, args: BoundArgs) -> Result<ZilVal> {
    let name = args.string(0)?;
    let oblist = args.oblist(1)?;
    Ok(ctx
        .symbols()
        .lookup(oblist, &name)
        .map_or_else(ZilVal::falsey, ZilVal::Atom))
}

/// <INSERT atom-or-name oblist> - Put an atom on an OBLIST
///
/// Given a string, creates the atom there; fails if the name is taken.
fn builtin_insert(ctx: &mut Context, args: BoundArgs) -> Result<ZilVal> {
    let oblist = args.oblist(1)?;
    match args.req(0) {
        ZilVal::String(name) => {
            let syms = ctx.symbols_mut();
            if syms.lookup(oblist, name).is_some() {
                return Err(Error::DuplicateAtomName {
                    name: name.to_string(),
                    oblist: syms.oblist_display(oblist),
                });
            }
            Ok(ZilVal::Atom(syms.intern(oblist, name)))
        }
        _ => {
            let atom = args.atom(0)?;
            ctx.symbols_mut().attach(atom, oblist)?;
            Ok(ZilVal::Atom(atom))
        }
    }
}

/// <REMOVE atom> - Take an atom off its OBLIST; FALSE if it was on none
fn builtin_remove(ctx: &mut Context, args: BoundArgs) -> Result<ZilVal> {
    let atom = args.atom(0)?;
    Ok(match ctx.symbols_mut().detach(atom) {
        Some(_) => ZilVal::Atom(atom),
        None => ZilVal::falsey(),
    })
}

/// <OBLIST? atom> - The OBLIST the atom is on, or FALSE
fn builtin_oblist_p(ctx: &mut Context, args: BoundArgs) -> Result<ZilVal> {
    let atom = args.atom(0)?;
    Ok(ctx
        .symbols()
        .oblist_of(atom)
        .map_or_else(ZilVal::falsey, ZilVal::ObList))
}

// ============================================================================
// OBLISTs and search paths
// ============================================================================

/// <MOBLIST name> - The OBLIST named by an atom, created on first use
fn builtin_moblist(ctx: &mut Context, args: BoundArgs) -> Result<ZilVal> {
    let name = args.atom(0)?;
    Ok(ZilVal::ObList(ctx.symbols_mut().oblist_for(name)))
}

/// <ROOT> - The ROOT OBLIST
fn builtin_root(ctx: &mut Context, _args: BoundArgs) -> Result<ZilVal> {
    Ok(ZilVal::ObList(ctx.symbols().root()))
}

/// <BLOCK (oblist...)> - Push a search path
fn builtin_block(ctx: &mut Context, args: BoundArgs) -> Result<ZilVal> {
    let list = args.req(0).clone();
    let ZilVal::List(items, _) = &list else {
        return Err(Error::type_constraint("BLOCK", "path", "LIST", list.type_name()));
    };
    let path = items
        .iter()
        .map(|item| match item {
            ZilVal::ObList(ol) => Ok(*ol),
            other => Err(Error::type_constraint(
                "BLOCK",
                "path",
                "LIST of OBLISTs",
                other.type_name(),
            )),
        })
        .collect::<Result<Vec<_>>>()?;
    ctx.push_block(path)?;
    Ok(list)
}

/// <ENDBLOCK> - Pop the search path pushed by the matching BLOCK
fn builtin_endblock(ctx: &mut Context, _args: BoundArgs) -> Result<ZilVal> {
    let path = ctx.pop_block()?;
    Ok(ZilVal::list(path.into_iter().map(ZilVal::ObList)))
}

/// <PARSE "text"> - A FIX for numeric text, otherwise the atom it names
fn builtin_parse(ctx: &mut Context, args: BoundArgs) -> Result<ZilVal> {
    let text = args.string(0)?;
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::syntax("PARSE", "empty text"));
    }
    if let Ok(n) = text.parse::<i32>() {
        return Ok(ZilVal::Fix(n));
    }
    Ok(ZilVal::Atom(ctx.atom(text)))
}
