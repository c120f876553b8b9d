// zilf-value - Procedure types
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Procedure values: native builtins and interpreted FUNCTIONs, plus the
//! argument specification both FUNCTIONs and ROUTINEs declare.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use im::Vector;

use crate::atom::AtomId;
use crate::value::ZilVal;

// ============================================================================
// Native builtins
// ============================================================================

/// A native procedure.
///
/// The implementation is type-erased here because it takes the runtime
/// context, which lives in the runtime crate. The runtime downcasts it back
/// when dispatching.
#[derive(Clone)]
pub struct ZilBuiltin {
    name: &'static str,
    imp: Rc<dyn Any>,
}

impl ZilBuiltin {
    pub fn new(name: &'static str, imp: Rc<dyn Any>) -> Self {
        ZilBuiltin { name, imp }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn imp(&self) -> &Rc<dyn Any> {
        &self.imp
    }
}

impl fmt::Debug for ZilBuiltin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<builtin {}>", self.name)
    }
}

impl PartialEq for ZilBuiltin {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.imp, &other.imp)
    }
}

// ============================================================================
// Argument specifications
// ============================================================================

/// One parameter in an argument list.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgItem {
    pub atom: AtomId,
    /// Declaration pattern from an ADECL parameter (`X:FIX`).
    pub decl: Option<ZilVal>,
    /// Default expression for optional and auxiliary parameters.
    pub default: Option<ZilVal>,
    /// Quoted parameters (`'X`) receive their argument unevaluated.
    pub quoted: bool,
}

impl ArgItem {
    pub fn new(atom: AtomId) -> Self {
        ArgItem {
            atom,
            decl: None,
            default: None,
            quoted: false,
        }
    }
}

/// A parsed argument list: `(A B "OPT" (C 1) "ARGS" R "AUX" D)`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArgSpec {
    pub required: Vec<ArgItem>,
    pub optional: Vec<ArgItem>,
    pub rest: Option<ArgItem>,
    pub aux: Vec<ArgItem>,
}

impl ArgSpec {
    #[must_use]
    pub fn min_args(&self) -> usize {
        self.required.len()
    }

    /// Maximum argument count, or `None` when a rest parameter is declared.
    #[must_use]
    pub fn max_args(&self) -> Option<usize> {
        if self.rest.is_some() {
            None
        } else {
            Some(self.required.len() + self.optional.len())
        }
    }

    /// Parameters that carry a default expression, in declaration order.
    pub fn defaults_mut(&mut self) -> impl Iterator<Item = &mut ArgItem> {
        self.optional
            .iter_mut()
            .chain(self.aux.iter_mut())
            .filter(|item| item.default.is_some())
    }

    /// Rebuild the list form this spec was parsed from.
    ///
    /// `quote` is the QUOTE atom, used to print quoted parameters as `'X`.
    #[must_use]
    pub fn to_list(&self, quote: AtomId) -> ZilVal {
        let mut items = Vector::new();
        for item in &self.required {
            items.push_back(param_value(item, quote));
        }
        if !self.optional.is_empty() {
            items.push_back(ZilVal::string("OPT"));
            for item in &self.optional {
                items.push_back(defaulted_value(item, quote));
            }
        }
        if let Some(rest) = &self.rest {
            items.push_back(ZilVal::string("ARGS"));
            items.push_back(param_value(rest, quote));
        }
        if !self.aux.is_empty() {
            items.push_back(ZilVal::string("AUX"));
            for item in &self.aux {
                items.push_back(defaulted_value(item, quote));
            }
        }
        ZilVal::List(items, None)
    }
}

fn param_value(item: &ArgItem, quote: AtomId) -> ZilVal {
    let base = if item.quoted {
        ZilVal::form(vec![ZilVal::Atom(quote), ZilVal::Atom(item.atom)])
    } else {
        ZilVal::Atom(item.atom)
    };
    match &item.decl {
        Some(decl) => ZilVal::adecl(base, decl.clone()),
        None => base,
    }
}

fn defaulted_value(item: &ArgItem, quote: AtomId) -> ZilVal {
    let param = param_value(item, quote);
    match &item.default {
        Some(default) => ZilVal::list(vec![param, default.clone()]),
        None => param,
    }
}

// ============================================================================
// Interpreted functions
// ============================================================================

/// A FUNCTION: an argument spec plus a body evaluated in a fresh frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ZilFunction {
    pub name: Option<AtomId>,
    pub spec: ArgSpec,
    pub body: Vec<ZilVal>,
}

impl ZilFunction {
    pub fn new(name: Option<AtomId>, spec: ArgSpec, body: Vec<ZilVal>) -> Self {
        ZilFunction { name, spec, body }
    }
}
