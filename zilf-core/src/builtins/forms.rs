// zilf-core - Form built-in functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Evaluation and definition: QUOTE, EVAL, FUNCTION, DEFINE, DEFMAC, EXPAND,
//! ROUTINE

use std::rc::Rc;

use zilf_value::{AtomId, StdAtom, TypeTag, ZilFunction, ZilVal};

use super::{BoundArgs, Constraint, Signature, define_fsubr, define_subr};
use crate::context::Context;
use crate::error::Result;
use crate::eval::{eval, parse_arg_spec};
use crate::expand::expand_value;
use crate::routine::define_routine;

const ATOM: Constraint = Constraint::Type(TypeTag::Atom);
const LIST: Constraint = Constraint::Type(TypeTag::List);

pub fn register(ctx: &mut Context) {
    define_fsubr(
        ctx,
        Signature::new("QUOTE").required("value", Constraint::Any),
        |_, mut args| Ok(args.take(0).unwrap_or_else(ZilVal::falsey)),
    );
    define_subr(
        ctx,
        Signature::new("EVAL").required("value", Constraint::Any),
        |ctx, args| eval(ctx, args.req(0)),
    );
    define_fsubr(
        ctx,
        Signature::new("FUNCTION")
            .required("args", LIST)
            .seq("body", Constraint::Any, 1),
        builtin_function,
    );
    define_fsubr(
        ctx,
        Signature::new("DEFINE")
            .required("name", ATOM)
            .required("args", LIST)
            .seq("body", Constraint::Any, 1),
        |ctx, args| define("DEFINE", ctx, args, ZilVal::Function),
    );
    define_fsubr(
        ctx,
        Signature::new("DEFMAC")
            .required("name", ATOM)
            .required("args", LIST)
            .seq("body", Constraint::Any, 1),
        |ctx, args| {
            define("DEFMAC", ctx, args, |f| {
                ZilVal::Macro(Rc::new(ZilVal::Function(f)))
            })
        },
    );
    define_subr(
        ctx,
        Signature::new("EXPAND").required("value", Constraint::Any),
        builtin_expand,
    );
    define_fsubr(
        ctx,
        Signature::new("ROUTINE")
            .required("name", ATOM)
            .required("args", LIST)
            .seq("body", Constraint::Any, 0),
        builtin_routine,
    );
}

fn build_function(
    form: &'static str,
    ctx: &Context,
    name: Option<AtomId>,
    args_list: &ZilVal,
    body: Vec<ZilVal>,
) -> Result<Rc<ZilFunction>> {
    let spec = parse_arg_spec(form, args_list, ctx.std(StdAtom::Quote))?;
    Ok(Rc::new(ZilFunction::new(name, spec, body)))
}

/// <FUNCTION (args) body...> - An anonymous function
fn builtin_function(ctx: &mut Context, args: BoundArgs) -> Result<ZilVal> {
    let params = args.req(0).clone();
    let function = build_function("FUNCTION", ctx, None, &params, args.into_seq())?;
    Ok(ZilVal::Function(function))
}

/// <DEFINE name (args) body...> and <DEFMAC name (args) body...>
///
/// Sets the global value of name and returns name.
fn define(
    form: &'static str,
    ctx: &mut Context,
    args: BoundArgs,
    wrap: fn(Rc<ZilFunction>) -> ZilVal,
) -> Result<ZilVal> {
    let name = args.atom(0)?;
    let params = args.req(1).clone();
    let function = build_function(form, ctx, Some(name), &params, args.into_seq())?;
    ctx.set_global(name, wrap(function))?;
    Ok(ZilVal::Atom(name))
}

/// <EXPAND value> - Expand macros in value without evaluating it
///
/// A value that expands to other than exactly one result comes back as a
/// SPLICE.
fn builtin_expand(ctx: &mut Context, args: BoundArgs) -> Result<ZilVal> {
    let mut expanded = expand_value(ctx, args.req(0))?;
    if expanded.len() == 1 {
        Ok(expanded.remove(0))
    } else {
        Ok(ZilVal::splice(expanded))
    }
}

/// <ROUTINE name (args) body...> - Define a routine, returns name
fn builtin_routine(ctx: &mut Context, args: BoundArgs) -> Result<ZilVal> {
    let name = args.atom(0)?;
    let params = args.req(1).clone();
    let source = params.source();
    define_routine(ctx, name, &params, args.into_seq(), source)?;
    Ok(ZilVal::Atom(name))
}
