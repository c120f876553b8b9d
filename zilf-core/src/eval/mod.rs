// zilf-core - Evaluator
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The evaluator.
//!
//! Atoms and scalars evaluate to themselves. LISTs and VECTORs evaluate
//! element-wise, splicing any SPLICE results into place. A FORM applies the
//! value of its head; see [`apply`] for how each applicable type treats its
//! arguments.

pub mod apply;
pub mod argspec;

use im::Vector;
use zilf_value::ZilVal;

use crate::context::Context;
use crate::error::{Axis, Error, Result};
use crate::expand;

pub use apply::{apply, apply_form, apply_function};
pub use argspec::parse_arg_spec;

/// Evaluate a value.
pub fn eval(ctx: &mut Context, value: &ZilVal) -> Result<ZilVal> {
    ctx.enter_eval()?;
    let result = eval_inner(ctx, value);
    ctx.leave_eval();
    result
}

fn eval_inner(ctx: &mut Context, value: &ZilVal) -> Result<ZilVal> {
    match value.unlocated() {
        ZilVal::Form(items, _) => eval_form(ctx, value, items),
        ZilVal::List(items, meta) => {
            let items = eval_elements(ctx, items)?;
            Ok(ZilVal::List(items.into_iter().collect(), meta.clone()))
        }
        ZilVal::Vector(items, meta) => {
            let items = eval_elements(ctx, items)?;
            Ok(ZilVal::Vector(items.into_iter().collect(), meta.clone()))
        }
        ZilVal::Adecl(adecl, _) => {
            let result = eval(ctx, &adecl.value)?;
            if ctx.check_decls() && !ctx.decl_matches(&result, &adecl.decl) {
                return Err(Error::DeclViolation {
                    target: ctx.format(&adecl.value),
                    value: ctx.format(&result),
                    decl: ctx.format(&adecl.decl),
                });
            }
            Ok(result)
        }
        // a located scalar evaluates to the bare value
        other => Ok(other.clone()),
    }
}

fn eval_form(ctx: &mut Context, form: &ZilVal, items: &Vector<ZilVal>) -> Result<ZilVal> {
    let Some(head) = items.front() else {
        return Ok(ZilVal::falsey());
    };

    let applicable = match head.unlocated() {
        ZilVal::Atom(atom) => ctx
            .get_global(*atom)
            .or_else(|| ctx.get_local(*atom))
            .ok_or_else(|| ctx.unbound(*atom, Axis::LocalOrGlobal))?,
        ZilVal::Form(..) => eval(ctx, head)?,
        other => other.clone(),
    }
    .into_unlocated();

    if let ZilVal::Macro(_) = applicable {
        let replacements = expand::expand_before_evaluation(ctx, form)?;
        return eval_body(ctx, &replacements);
    }

    let args: Vec<ZilVal> = items.iter().skip(1).cloned().collect();
    apply_form(ctx, &applicable, &args)
}

/// Evaluate each element in order, splicing after-evaluation expansions.
pub fn eval_elements<'a>(
    ctx: &mut Context,
    items: impl IntoIterator<Item = &'a ZilVal>,
) -> Result<Vec<ZilVal>> {
    let mut out = Vec::new();
    for item in items {
        let value = eval(ctx, item)?;
        out.extend(expand::expand_after_evaluation(value));
    }
    Ok(out)
}

/// Evaluate a sequence, returning the last value. An empty body is FALSE.
pub fn eval_body(ctx: &mut Context, body: &[ZilVal]) -> Result<ZilVal> {
    let mut last = ZilVal::falsey();
    for item in body {
        last = eval(ctx, item)?;
    }
    Ok(last)
}
