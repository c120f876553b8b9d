// zilf-core - ROUTINE records
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! ROUTINE records and routine expansion.
//!
//! A routine is what the compiler eventually turns into bytecode. Here it is
//! a tied record, so it reads as `(NAME ARGS body...)`:
//!
//! | position | field | access |
//! |----------|-------|--------|
//! | 0 | `NAME` | read-only atom |
//! | 1 | `ARGS` | argument list; writing it re-parses the list |
//! | 2.. | `BODY` | the body forms |

use log::debug;
use zilf_value::{ArgSpec, AtomId, FieldError, LayoutBuilder, Shape, SourceLine, StdAtom, StructRef, ZilVal};

use crate::context::Context;
use crate::error::{Error, Result};
use crate::eval::parse_arg_spec;
use crate::expand::expand_all;

#[derive(Debug)]
pub struct Routine {
    name: AtomId,
    spec: ArgSpec,
    body: Vec<ZilVal>,
    /// QUOTE, for printing quoted parameters back as `'X`.
    quote: AtomId,
    source: SourceLine,
}

impl Shape for Routine {
    const TYPE_NAME: &'static str = "ROUTINE";

    fn declare(layout: &mut LayoutBuilder<Self>) {
        layout
            .read_only("NAME", |r| ZilVal::Atom(r.name))
            .field(
                "ARGS",
                |r| r.spec.to_list(r.quote),
                |r, v| {
                    if !matches!(v.unlocated(), ZilVal::List(..)) {
                        return Err("LIST".into());
                    }
                    match parse_arg_spec("ROUTINE", &v, r.quote) {
                        Ok(spec) => {
                            r.spec = spec;
                            Ok(())
                        }
                        Err(Error::BadSyntax { message, .. }) => Err(FieldError::Invalid(message)),
                        Err(other) => Err(FieldError::Invalid(other.to_string())),
                    }
                },
            )
            .rest("BODY", |r| &r.body, |r| &mut r.body);
    }
}

impl Routine {
    pub fn new(name: AtomId, spec: ArgSpec, body: Vec<ZilVal>, quote: AtomId) -> Self {
        Routine {
            name,
            spec,
            body,
            quote,
            source: SourceLine::Unknown,
        }
    }

    #[must_use]
    pub fn at(mut self, source: SourceLine) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub fn name(&self) -> AtomId {
        self.name
    }

    #[must_use]
    pub fn spec(&self) -> &ArgSpec {
        &self.spec
    }

    #[must_use]
    pub fn body(&self) -> &[ZilVal] {
        &self.body
    }

    #[must_use]
    pub fn source(&self) -> &SourceLine {
        &self.source
    }
}

/// Build a routine from `<ROUTINE name (args) body...>` and make it the
/// global value of `name`. Returns the record.
pub fn define_routine(
    ctx: &mut Context,
    name: AtomId,
    args: &ZilVal,
    body: Vec<ZilVal>,
    source: SourceLine,
) -> Result<StructRef> {
    let quote = ctx.std(StdAtom::Quote);
    let spec = parse_arg_spec("ROUTINE", args, quote)?;
    let routine = Routine::new(name, spec, body, quote).at(source);
    let record = ctx.wrap_record(routine);
    ctx.set_global(name, ZilVal::Struct(record.clone()))?;
    Ok(record)
}

/// Run the expansion engine over a routine's argument defaults, then over
/// its body, and store the results back into the record.
///
/// A default must expand to exactly one value; anything else is reported
/// and replaced by FALSE. Returns the number of errors reported.
pub fn expand_routine(ctx: &mut Context, routine: &StructRef) -> Result<usize> {
    let Some((name, mut spec, body, source)) = routine.with(|r: &Routine| {
        (r.name, r.spec.clone(), r.body.clone(), r.source.clone())
    }) else {
        return Err(Error::type_constraint(
            "EXPAND-ROUTINE",
            "routine",
            Routine::TYPE_NAME,
            routine.layout().type_name(),
        ));
    };

    let before = ctx.reported();
    debug!("expanding routine {} from {}", ctx.symbols().display(name), source);

    for item in spec.defaults_mut() {
        let Some(default) = item.default.take() else {
            continue;
        };
        let mut expanded = expand_all(ctx, std::slice::from_ref(&default))?;
        item.default = Some(if expanded.len() == 1 {
            expanded.remove(0)
        } else {
            let error = Error::syntax(
                "ROUTINE",
                format!(
                    "default for {} must expand to exactly one value, got {}",
                    ctx.symbols().display(item.atom),
                    expanded.len()
                ),
            );
            let at = if default.source().is_known() {
                default.source()
            } else {
                source.clone()
            };
            ctx.report(&error, &at);
            ZilVal::falsey()
        });
    }

    let body = expand_all(ctx, &body)?;

    routine.with_mut(|r: &mut Routine| {
        r.spec = spec;
        r.body = body;
    });

    let errors = ctx.reported() - before;
    debug!(
        "expanded routine {} with {} error(s)",
        ctx.symbols().display(name),
        errors
    );
    Ok(errors)
}
