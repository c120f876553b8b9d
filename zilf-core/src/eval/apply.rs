// zilf-core - Application
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Applying SUBRs, FSUBRs, FUNCTIONs, MACROs and FIXes.

use std::rc::Rc;

use zilf_value::{ArgItem, ZilFunction, ZilVal};

use super::{eval, eval_body, eval_elements};
use crate::builtins::call_builtin;
use crate::builtins::structures::one_based;
use crate::context::Context;
use crate::error::{AritySpec, Error, Result};
use crate::expand;
use crate::structure;

/// Apply a value to the unevaluated arguments of a form.
///
/// SUBRs and FIXes get evaluated arguments, FSUBRs get them as written,
/// FUNCTIONs get evaluated arguments except for quoted parameters, and a
/// MACRO's expansion is evaluated in place of the call.
pub fn apply_form(ctx: &mut Context, applicable: &ZilVal, raw_args: &[ZilVal]) -> Result<ZilVal> {
    match applicable.unlocated() {
        ZilVal::Subr(builtin) => {
            let args = eval_elements(ctx, raw_args)?;
            call_builtin(ctx, builtin, args)
        }
        ZilVal::Fsubr(builtin) => call_builtin(ctx, builtin, raw_args.to_vec()),
        ZilVal::Function(func) => {
            let args = eval_function_args(ctx, func, raw_args)?;
            apply_function(ctx, func, args)
        }
        ZilVal::Macro(inner) => {
            let expansion = apply(ctx, inner, raw_args.to_vec())?;
            let replacements = expand::expand_after_evaluation(expansion);
            eval_body(ctx, &replacements)
        }
        ZilVal::Fix(n) => {
            let args = eval_elements(ctx, raw_args)?;
            apply_fix(*n, args)
        }
        other => Err(Error::NotApplicable {
            value: ctx.format(other),
        }),
    }
}

/// Apply a value to arguments that are used exactly as given.
pub fn apply(ctx: &mut Context, applicable: &ZilVal, args: Vec<ZilVal>) -> Result<ZilVal> {
    match applicable.unlocated() {
        ZilVal::Subr(builtin) | ZilVal::Fsubr(builtin) => call_builtin(ctx, builtin, args),
        ZilVal::Function(func) => apply_function(ctx, func, args),
        ZilVal::Macro(inner) => apply(ctx, inner, args),
        ZilVal::Fix(n) => apply_fix(*n, args),
        other => Err(Error::NotApplicable {
            value: ctx.format(other),
        }),
    }
}

/// The parameter receiving the argument at `position`.
fn param_at(func: &ZilFunction, position: usize) -> Option<&ArgItem> {
    let spec = &func.spec;
    if position < spec.required.len() {
        return spec.required.get(position);
    }
    let position = position - spec.required.len();
    if position < spec.optional.len() {
        return spec.optional.get(position);
    }
    spec.rest.as_ref()
}

fn eval_function_args(
    ctx: &mut Context,
    func: &ZilFunction,
    raw_args: &[ZilVal],
) -> Result<Vec<ZilVal>> {
    let mut args = Vec::with_capacity(raw_args.len());
    for raw in raw_args {
        let quoted = param_at(func, args.len()).is_some_and(|p| p.quoted);
        if quoted {
            args.push(raw.unlocated().clone());
        } else {
            let value = eval(ctx, raw)?;
            args.extend(expand::expand_after_evaluation(value));
        }
    }
    Ok(args)
}

fn function_name(ctx: &Context, func: &ZilFunction) -> String {
    match func.name {
        Some(name) => ctx.symbols().display(name),
        None => "FUNCTION".to_string(),
    }
}

/// Bind `args` to the function's parameters in a fresh frame and evaluate
/// its body there.
///
/// Defaults of optional and auxiliary parameters are evaluated in the new
/// frame, in order, so a default can refer to earlier parameters.
pub fn apply_function(ctx: &mut Context, func: &Rc<ZilFunction>, args: Vec<ZilVal>) -> Result<ZilVal> {
    let spec = &func.spec;
    let arity = AritySpec::from_bounds(spec.min_args(), spec.max_args());
    if !arity.accepts(args.len()) {
        return Err(Error::arity(function_name(ctx, func), arity, args.len()));
    }

    let frame = ctx.env().child();
    let body_frame = frame.clone();
    ctx.with_frame(body_frame, |ctx| {
        let mut args = args.into_iter().map(ZilVal::into_unlocated);

        for item in &spec.required {
            let Some(value) = args.next() else {
                return Err(Error::Internal("argument count checked above".into()));
            };
            ctx.bind_local(&frame, item.atom, Some(value), item.decl.clone())?;
        }

        for item in &spec.optional {
            let value = match (args.next(), &item.default) {
                (Some(value), _) => Some(value),
                (None, Some(default)) => Some(eval(ctx, default)?),
                (None, None) => None,
            };
            ctx.bind_local(&frame, item.atom, value, item.decl.clone())?;
        }

        if let Some(rest) = &spec.rest {
            let list = ZilVal::list(args.by_ref());
            ctx.bind_local(&frame, rest.atom, Some(list), rest.decl.clone())?;
        }

        for item in &spec.aux {
            let value = match &item.default {
                Some(default) => Some(eval(ctx, default)?),
                None => None,
            };
            ctx.bind_local(&frame, item.atom, value, item.decl.clone())?;
        }

        eval_body(ctx, &func.body)
    })
}

/// A FIX applied to a structure: `<2 .L>` is `<NTH .L 2>`, `<2 .L X>` is
/// `<PUT .L 2 X>`.
fn apply_fix(n: i32, args: Vec<ZilVal>) -> Result<ZilVal> {
    if !(1..=2).contains(&args.len()) {
        return Err(Error::arity(n.to_string(), AritySpec::Range(1, 2), args.len()));
    }
    let mut args = args.into_iter();
    let target = args.next().unwrap_or_else(ZilVal::falsey);
    let index = one_based(n, &target)?;
    match args.next() {
        None => structure::nth(&target, index),
        Some(value) => structure::put(&target, index, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use zilf_value::ArgSpec;

    fn function(ctx: &mut Context, spec: ArgSpec, body: Vec<ZilVal>) -> Rc<ZilFunction> {
        let name = ctx.atom("F");
        Rc::new(ZilFunction::new(Some(name), spec, body))
    }

    #[test]
    fn test_fix_applies_as_nth_and_put() {
        let list = ZilVal::list(vec![ZilVal::Fix(10), ZilVal::Fix(20)]);
        assert_eq!(apply_fix(2, vec![list.clone()]).unwrap(), ZilVal::Fix(20));
        assert_eq!(
            apply_fix(1, vec![list, ZilVal::Fix(5)]).unwrap(),
            ZilVal::list(vec![ZilVal::Fix(5), ZilVal::Fix(20)])
        );
        assert_eq!(
            apply_fix(1, vec![]).unwrap_err().kind(),
            ErrorKind::WrongArgumentCount
        );
    }

    #[test]
    fn test_function_arity_names_function() {
        let mut ctx = Context::new();
        let x = ctx.atom("X");
        let spec = ArgSpec {
            required: vec![ArgItem::new(x)],
            ..ArgSpec::default()
        };
        let f = function(&mut ctx, spec, vec![ZilVal::Atom(x)]);
        let err = apply_function(&mut ctx, &f, vec![]).unwrap_err();
        assert_eq!(
            err,
            Error::ArityError {
                name: "F".into(),
                expected: AritySpec::Exact(1),
                got: 0,
            }
        );
    }

    #[test]
    fn test_function_binds_and_unwinds_frame() {
        let mut ctx = Context::new();
        let x = ctx.atom("X");
        let lval = ZilVal::Atom(ctx.atom("LVAL"));
        let spec = ArgSpec {
            required: vec![ArgItem::new(x)],
            ..ArgSpec::default()
        };
        let f = function(&mut ctx, spec, vec![ZilVal::form(vec![lval, ZilVal::Atom(x)])]);
        let root = ctx.env().clone();
        assert_eq!(
            apply_function(&mut ctx, &f, vec![ZilVal::Fix(7)]).unwrap(),
            ZilVal::Fix(7)
        );
        assert!(ctx.env().ptr_eq(&root));
        assert_eq!(ctx.get_local(x), None);
    }

    #[test]
    fn test_quoted_param_receives_raw_argument() {
        let mut ctx = Context::new();
        let x = ctx.atom("X");
        let lval = ZilVal::Atom(ctx.atom("LVAL"));
        let mut item = ArgItem::new(x);
        item.quoted = true;
        let spec = ArgSpec {
            required: vec![item],
            ..ArgSpec::default()
        };
        let f = function(&mut ctx, spec, vec![ZilVal::form(vec![lval, ZilVal::Atom(x)])]);
        let unevaluated = ZilVal::form(vec![ZilVal::Atom(ctx.atom("NOT-CALLED"))]);
        let result = apply_form(&mut ctx, &ZilVal::Function(f), &[unevaluated.clone()]).unwrap();
        assert_eq!(result, unevaluated);
    }
}
