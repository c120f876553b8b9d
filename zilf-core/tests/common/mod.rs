// zilf-core - Common test utilities
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Shared test helpers for zilf-core integration tests.
//!
//! # Usage
//!
//! In your test file, add:
//! ```ignore
//! mod common;
//! use common::*;
//! ```
//!
//! # Available Helpers
//!
//! - [`new_ctx`] - A context reporting into a [`CollectingSink`]
//! - [`atom`] - Resolve a name to an atom value
//! - [`form`] - Build `<HEAD args...>`
//! - [`quoted`] - Build `<QUOTE value>`
//! - [`call`] - Evaluate `<HEAD args...>`
//! - [`fixes`] - Build a LIST of FIXes
//! - [`def_native_macro`] - Install a macro with a native body

#![allow(dead_code)]

use std::rc::Rc;

pub use zilf_core::builtins::{BoundArgs, Constraint, Signature, make_builtin};
pub use zilf_core::zilf_value::{AtomId, Meta, SourceLine, StdAtom, TypeTag, ZilVal};
pub use zilf_core::{CollectingSink, Context, Error, ErrorKind, Result, eval, expand_all};

/// Install `env_logger` once so `RUST_LOG` works under `cargo test`.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A context whose reports land in the returned sink.
#[must_use]
pub fn new_ctx() -> (Context, CollectingSink) {
    init_logging();
    let sink = CollectingSink::new();
    (Context::with_sink(sink.clone()), sink)
}

pub fn atom(ctx: &mut Context, name: &str) -> ZilVal {
    ZilVal::Atom(ctx.atom(name))
}

pub fn form(ctx: &mut Context, head: &str, args: Vec<ZilVal>) -> ZilVal {
    let mut items = vec![atom(ctx, head)];
    items.extend(args);
    ZilVal::form(items)
}

pub fn quoted(ctx: &mut Context, value: ZilVal) -> ZilVal {
    form(ctx, "QUOTE", vec![value])
}

/// Evaluate `<HEAD args...>`.
pub fn call(ctx: &mut Context, head: &str, args: Vec<ZilVal>) -> Result<ZilVal> {
    let f = form(ctx, head, args);
    eval(ctx, &f)
}

#[must_use]
pub fn fixes(ns: &[i32]) -> ZilVal {
    ZilVal::list(ns.iter().copied().map(ZilVal::Fix))
}

/// Make `name` a macro whose expansion is computed by `body` from the call's
/// unevaluated arguments.
pub fn def_native_macro(
    ctx: &mut Context,
    name: &'static str,
    body: impl Fn(&mut Context, BoundArgs) -> Result<ZilVal> + 'static,
) -> ZilVal {
    let atom = ctx.atom(name);
    let builtin = make_builtin(Signature::new(name).seq("args", Constraint::Any, 0), body);
    ctx.set_global(atom, ZilVal::Macro(Rc::new(ZilVal::Fsubr(builtin))))
        .expect("macro definition has no declaration to violate");
    ZilVal::Atom(atom)
}
