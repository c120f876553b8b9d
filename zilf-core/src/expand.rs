// zilf-core - Macro expansion
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The expansion engine.
//!
//! Two phases apply to a value about to be evaluated or compiled:
//!
//! - *Before evaluation*: a FORM whose head names a MACRO is replaced by
//!   whatever the macro returns, applied to the form's unevaluated
//!   arguments.
//! - *After evaluation*: a SPLICE stands for its elements.
//!
//! Either phase turns one value into zero or more replacements. [`expand_all`]
//! walks a tree depth-first, left to right, splicing replacements into their
//! container and re-expanding each replacement until nothing changes. The
//! walk keeps its own stack instead of recursing. Each replacement sits one
//! level below its call and everything inside it inherits that level, so
//! nested expansions add up; past the context's limit a position is cut off
//! with an error.
//!
//! Recoverable errors inside the walk do not abort it: the error goes to the
//! context's sink and the failing position becomes FALSE.

use std::collections::VecDeque;
use std::rc::Rc;

use log::trace;
use zilf_value::{Adecl, Meta, SourceLine, StdAtom, ZilVal};

use crate::context::Context;
use crate::error::{Error, Result};
use crate::eval::apply;

/// The macro a value would expand through, if any.
fn macro_for(ctx: &Context, value: &ZilVal) -> Option<ZilVal> {
    let ZilVal::Form(items, _) = value else {
        return None;
    };
    let head = items.front()?.unlocated();
    let candidate = match head {
        ZilVal::Atom(atom) => ctx.get_global(*atom).or_else(|| ctx.get_local(*atom))?,
        ZilVal::Macro(_) => head.clone(),
        _ => return None,
    };
    match candidate.into_unlocated() {
        ZilVal::Macro(inner) => Some((*inner).clone()),
        _ => None,
    }
}

/// Whether `value` is a FORM calling a MACRO.
pub fn should_expand_before_evaluation(ctx: &Context, value: &ZilVal) -> bool {
    macro_for(ctx, value).is_some()
}

/// Expand a macro call once.
///
/// The macro is applied to the form's arguments as written; its result is
/// spliced by [`expand_after_evaluation`]. Every replacement is marked as
/// expanded and carries the original form's source position. A value that is
/// not a macro call comes back unchanged.
pub fn expand_before_evaluation(ctx: &mut Context, value: &ZilVal) -> Result<Vec<ZilVal>> {
    let Some(applicable) = macro_for(ctx, value) else {
        return Ok(vec![value.clone()]);
    };
    let ZilVal::Form(items, _) = value else {
        return Ok(vec![value.clone()]);
    };

    let args: Vec<ZilVal> = items.iter().skip(1).cloned().collect();
    let result = apply(ctx, &applicable, args)?;
    let source = value.source();
    let replacements: Vec<ZilVal> = expand_after_evaluation(result)
        .into_iter()
        .map(|v| v.with_meta(Meta::expanded_from(source.clone())))
        .collect();

    trace!(
        "expanded {} at {} into {} value(s)",
        ctx.format(value),
        source,
        replacements.len()
    );
    Ok(replacements)
}

/// Whether `value` stands for something other than itself after evaluation.
pub fn should_expand_after_evaluation(value: &ZilVal) -> bool {
    matches!(value.unlocated(), ZilVal::Splice(_))
}

/// The values an evaluation result contributes to its container.
pub fn expand_after_evaluation(value: ZilVal) -> Vec<ZilVal> {
    match value.into_unlocated() {
        ZilVal::Splice(items) => items.into_iter().collect(),
        other => vec![other],
    }
}

// ============================================================================
// Tree walk
// ============================================================================

/// What to rebuild when a frame's children are done.
enum Shell {
    Top,
    List(Option<Rc<Meta>>),
    Form(Option<Rc<Meta>>),
    Vector(Option<Rc<Meta>>),
    Adecl {
        decl: ZilVal,
        meta: Option<Rc<Meta>>,
        source: SourceLine,
    },
}

struct Frame {
    shell: Shell,
    /// Children still to visit, with their expansion depth.
    pending: VecDeque<(ZilVal, usize)>,
    output: Vec<ZilVal>,
}

impl Frame {
    fn new<'a>(shell: Shell, items: impl IntoIterator<Item = &'a ZilVal>, depth: usize) -> Self {
        Frame {
            shell,
            pending: items.into_iter().map(|v| (v.clone(), depth)).collect(),
            output: Vec::new(),
        }
    }
}

fn is_quote_form(ctx: &Context, value: &ZilVal) -> bool {
    match value {
        ZilVal::Form(items, _) => items
            .front()
            .and_then(ZilVal::as_atom)
            .is_some_and(|a| ctx.symbols().is_std(a, StdAtom::Quote)),
        _ => false,
    }
}

/// Report a recoverable error and produce the FALSE that replaces the
/// failing position. Unrecoverable errors propagate.
fn recover(ctx: &mut Context, error: Error, source: &SourceLine) -> Result<ZilVal> {
    if !error.is_recoverable() {
        return Err(error);
    }
    ctx.report(&error, source);
    Ok(ZilVal::falsey())
}

/// Finish a frame, producing what it contributes to its parent.
fn finish(ctx: &mut Context, frame: Frame) -> Result<Vec<ZilVal>> {
    let Frame { shell, output, .. } = frame;
    let rebuilt = match shell {
        Shell::Top => return Ok(output),
        Shell::List(meta) => ZilVal::List(output.into_iter().collect(), meta),
        Shell::Form(meta) => ZilVal::Form(output.into_iter().collect(), meta),
        Shell::Vector(meta) => ZilVal::Vector(output.into_iter().collect(), meta),
        Shell::Adecl { decl, meta, source } => {
            let mut output = output.into_iter();
            match (output.next(), output.next()) {
                (Some(value), None) => ZilVal::Adecl(Rc::new(Adecl { value, decl }), meta),
                _ => {
                    let error = Error::syntax("ADECL", "value must expand to exactly one value");
                    recover(ctx, error, &source)?
                }
            }
        }
    };
    Ok(vec![rebuilt])
}

/// Expand every macro call in `items` and everything nested in them.
///
/// Returns the spliced result. Only unrecoverable errors are returned; the
/// rest are reported through the context's sink.
pub fn expand_all(ctx: &mut Context, items: &[ZilVal]) -> Result<Vec<ZilVal>> {
    let limit = ctx.options().max_expansion_depth;
    let mut stack = vec![Frame::new(Shell::Top, items, 0)];

    loop {
        let Some(top) = stack.last_mut() else {
            return Err(Error::Internal("expansion stack emptied early".into()));
        };

        let Some((value, depth)) = top.pending.pop_front() else {
            let done = stack.pop().ok_or_else(|| Error::Internal("expansion stack emptied early".into()))?;
            let contributed = finish(ctx, done)?;
            match stack.last_mut() {
                Some(parent) => parent.output.extend(contributed),
                None => return Ok(contributed),
            }
            continue;
        };

        if depth > limit {
            let placeholder = recover(ctx, Error::ExpansionDepth { limit }, &value.source())?;
            top.output.push(placeholder);
            continue;
        }

        if should_expand_before_evaluation(ctx, &value) {
            match expand_before_evaluation(ctx, &value) {
                Ok(replacements) => {
                    let top = stack
                        .last_mut()
                        .ok_or_else(|| Error::Internal("expansion stack emptied early".into()))?;
                    for replacement in replacements.into_iter().rev() {
                        top.pending.push_front((replacement, depth + 1));
                    }
                }
                Err(error) => {
                    let placeholder = recover(ctx, error, &value.source())?;
                    if let Some(top) = stack.last_mut() {
                        top.output.push(placeholder);
                    }
                }
            }
            continue;
        }

        let child = match &value {
            ZilVal::Form(..) if is_quote_form(ctx, &value) => None,
            ZilVal::Form(items, meta) => Some(Frame::new(Shell::Form(meta.clone()), items, depth)),
            ZilVal::List(items, meta) => Some(Frame::new(Shell::List(meta.clone()), items, depth)),
            ZilVal::Vector(items, meta) => {
                Some(Frame::new(Shell::Vector(meta.clone()), items, depth))
            }
            ZilVal::Adecl(adecl, meta) => Some(Frame::new(
                Shell::Adecl {
                    decl: adecl.decl.clone(),
                    meta: meta.clone(),
                    source: value.source(),
                },
                [&adecl.value],
                depth,
            )),
            _ => None,
        };

        match child {
            Some(frame) => stack.push(frame),
            None => {
                if let Some(top) = stack.last_mut() {
                    top.output.push(value);
                }
            }
        }
    }
}

/// Expand a single value, which may become any number of values.
pub fn expand_value(ctx: &mut Context, value: &ZilVal) -> Result<Vec<ZilVal>> {
    expand_all(ctx, std::slice::from_ref(value))
}
