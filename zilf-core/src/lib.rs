// zilf-core - Evaluator core for ZIL
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # zilf-core
//!
//! The evaluator core of a ZIL compiler: atoms and OBLISTs, local and
//! global bindings, tied record layouts, the macro expansion engine, and
//! the builtin dispatch that drives them.
//!
//! All state lives in a [`Context`]:
//!
//! ```
//! use zilf_core::{Context, eval};
//! use zilf_core::zilf_value::ZilVal;
//!
//! let mut ctx = Context::new();
//! let length = ctx.atom("LENGTH");
//! let form = ZilVal::form(vec![
//!     ZilVal::Atom(length),
//!     ZilVal::list(vec![ZilVal::Fix(1), ZilVal::Fix(2)]),
//! ]);
//! assert_eq!(eval(&mut ctx, &form).unwrap(), ZilVal::Fix(2));
//! ```

pub mod assoc;
pub mod bindings;
pub mod builtins;
pub mod context;
pub mod decl;
pub mod env;
pub mod error;
pub mod eval;
pub mod expand;
pub mod oblist;
pub mod print;
pub mod routine;
pub mod sink;
pub mod structure;

pub use bindings::{GlobalTable, RebindGuard};
pub use builtins::{Constraint, Signature, define_fsubr, define_subr, register_builtins};
pub use context::{Context, ContextOptions};
pub use env::{Binding, LocalEnv};
pub use error::{AritySpec, Axis, Error, ErrorKind, Result};
pub use eval::{apply, eval};
pub use expand::{expand_all, expand_value};
pub use oblist::SymbolTable;
pub use routine::{Routine, define_routine, expand_routine};
pub use sink::{CollectingSink, ErrorSink, LogSink};

// Re-export the value crate for convenience
pub use zilf_value;
