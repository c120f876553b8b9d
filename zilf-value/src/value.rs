// zilf-value - Core value type
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The value type shared by the reader, the evaluator core and the compiler.

use std::fmt;
use std::rc::Rc;

use im::Vector;

use crate::atom::{AtomId, ObListId};
use crate::function::{ZilBuiltin, ZilFunction};
use crate::source::{Meta, SourceLine};
use crate::tied::StructRef;

// ============================================================================
// Type tags
// ============================================================================

/// The type of a value, as named in declarations and builtin signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Atom,
    Fix,
    Char,
    String,
    False,
    List,
    Form,
    Vector,
    Adecl,
    Splice,
    Subr,
    Fsubr,
    Function,
    Macro,
    /// Any tied record; the record's own type name is reported by
    /// [`ZilVal::type_name`].
    Struct,
    Asoc,
    ObList,
}

impl TypeTag {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Atom => "ATOM",
            TypeTag::Fix => "FIX",
            TypeTag::Char => "CHARACTER",
            TypeTag::String => "STRING",
            TypeTag::False => "FALSE",
            TypeTag::List => "LIST",
            TypeTag::Form => "FORM",
            TypeTag::Vector => "VECTOR",
            TypeTag::Adecl => "ADECL",
            TypeTag::Splice => "SPLICE",
            TypeTag::Subr => "SUBR",
            TypeTag::Fsubr => "FSUBR",
            TypeTag::Function => "FUNCTION",
            TypeTag::Macro => "MACRO",
            TypeTag::Struct => "RECORD",
            TypeTag::Asoc => "ASOC",
            TypeTag::ObList => "OBLIST",
        }
    }

    /// Look up a builtin type by its printed name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<TypeTag> {
        let tag = match name {
            "ATOM" => TypeTag::Atom,
            "FIX" => TypeTag::Fix,
            "CHARACTER" => TypeTag::Char,
            "STRING" => TypeTag::String,
            "FALSE" => TypeTag::False,
            "LIST" => TypeTag::List,
            "FORM" => TypeTag::Form,
            "VECTOR" => TypeTag::Vector,
            "ADECL" => TypeTag::Adecl,
            "SPLICE" => TypeTag::Splice,
            "SUBR" => TypeTag::Subr,
            "FSUBR" => TypeTag::Fsubr,
            "FUNCTION" => TypeTag::Function,
            "MACRO" => TypeTag::Macro,
            "ASOC" => TypeTag::Asoc,
            "OBLIST" => TypeTag::ObList,
            _ => return None,
        };
        Some(tag)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Values
// ============================================================================

/// A value paired with a declaration: `X:FIX`.
#[derive(Debug, Clone, PartialEq)]
pub struct Adecl {
    pub value: ZilVal,
    pub decl: ZilVal,
}

/// A value without a metadata slot of its own, tagged with one.
///
/// Produced when expansion or a host attaches a position to a scalar. Never
/// wraps another `Located` or a value that has its own slot.
#[derive(Debug, Clone)]
pub struct Located {
    pub value: ZilVal,
    pub meta: Rc<Meta>,
}

/// A ZIL value.
///
/// LIST, FORM and VECTOR contents are persistent vectors with structural
/// sharing. Compound values read from source carry optional [`Meta`]; any
/// other value gets it through [`ZilVal::Located`]. Tied records are shared,
/// mutable, and compared by identity.
#[derive(Debug, Clone)]
pub enum ZilVal {
    Atom(AtomId),
    /// Fixed-point number
    Fix(i32),
    Char(char),
    String(Rc<str>),
    /// The false value, which may carry a reason: `#FALSE ("not found")`
    False(Vector<ZilVal>),
    List(Vector<ZilVal>, Option<Rc<Meta>>),
    /// A form to be evaluated: `<F A B>`
    Form(Vector<ZilVal>, Option<Rc<Meta>>),
    Vector(Vector<ZilVal>, Option<Rc<Meta>>),
    Adecl(Rc<Adecl>, Option<Rc<Meta>>),
    /// Elements to be spliced into the surrounding structure
    Splice(Vector<ZilVal>),
    /// Native procedure receiving evaluated arguments
    Subr(ZilBuiltin),
    /// Native procedure receiving unevaluated arguments
    Fsubr(ZilBuiltin),
    Function(Rc<ZilFunction>),
    /// Wraps an applicable value whose result replaces the calling form
    Macro(Rc<ZilVal>),
    /// A tied record (or a view into one) seen as a list
    Struct(StructRef),
    /// Association cursor
    Asoc(usize),
    ObList(ObListId),
    /// A value of any other variant carrying a source position. Equality and
    /// type queries look through it.
    Located(Rc<Located>),
}

impl ZilVal {
    /// The canonical false value `<>`.
    pub fn falsey() -> Self {
        ZilVal::False(Vector::new())
    }

    pub fn string(s: impl Into<Rc<str>>) -> Self {
        ZilVal::String(s.into())
    }

    pub fn list(items: impl IntoIterator<Item = ZilVal>) -> Self {
        ZilVal::List(items.into_iter().collect(), None)
    }

    pub fn form(items: impl IntoIterator<Item = ZilVal>) -> Self {
        ZilVal::Form(items.into_iter().collect(), None)
    }

    pub fn vector(items: impl IntoIterator<Item = ZilVal>) -> Self {
        ZilVal::Vector(items.into_iter().collect(), None)
    }

    pub fn splice(items: impl IntoIterator<Item = ZilVal>) -> Self {
        ZilVal::Splice(items.into_iter().collect())
    }

    pub fn adecl(value: ZilVal, decl: ZilVal) -> Self {
        ZilVal::Adecl(Rc::new(Adecl { value, decl }), None)
    }

    /// Convert a truth value, using `t` for true.
    pub fn truth(b: bool, t: AtomId) -> Self {
        if b { ZilVal::Atom(t) } else { ZilVal::falsey() }
    }

    /// The value itself, without any [`ZilVal::Located`] tag.
    #[inline]
    #[must_use]
    pub fn unlocated(&self) -> &ZilVal {
        match self {
            ZilVal::Located(l) => &l.value,
            other => other,
        }
    }

    #[must_use]
    pub fn into_unlocated(self) -> ZilVal {
        match self {
            ZilVal::Located(l) => l.value.clone(),
            other => other,
        }
    }

    #[must_use]
    pub fn type_tag(&self) -> TypeTag {
        match self {
            ZilVal::Atom(_) => TypeTag::Atom,
            ZilVal::Fix(_) => TypeTag::Fix,
            ZilVal::Char(_) => TypeTag::Char,
            ZilVal::String(_) => TypeTag::String,
            ZilVal::False(_) => TypeTag::False,
            ZilVal::List(_, _) => TypeTag::List,
            ZilVal::Form(_, _) => TypeTag::Form,
            ZilVal::Vector(_, _) => TypeTag::Vector,
            ZilVal::Adecl(_, _) => TypeTag::Adecl,
            ZilVal::Splice(_) => TypeTag::Splice,
            ZilVal::Subr(_) => TypeTag::Subr,
            ZilVal::Fsubr(_) => TypeTag::Fsubr,
            ZilVal::Function(_) => TypeTag::Function,
            ZilVal::Macro(_) => TypeTag::Macro,
            ZilVal::Struct(_) => TypeTag::Struct,
            ZilVal::Asoc(_) => TypeTag::Asoc,
            ZilVal::ObList(_) => TypeTag::ObList,
            ZilVal::Located(l) => l.value.type_tag(),
        }
    }

    /// The printed type name; tied records report their shape's name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self.unlocated() {
            ZilVal::Struct(s) => s.layout().type_name(),
            other => other.type_tag().name(),
        }
    }

    /// The underlying storage type, as tested by `<PRIMTYPE ...>` declarations.
    #[must_use]
    pub fn primtype(&self) -> &'static str {
        match self.unlocated() {
            ZilVal::List(_, _)
            | ZilVal::Form(_, _)
            | ZilVal::False(_)
            | ZilVal::Splice(_)
            | ZilVal::Struct(_) => "LIST",
            ZilVal::Vector(_, _) | ZilVal::Adecl(_, _) => "VECTOR",
            ZilVal::Fix(_) | ZilVal::Char(_) => "FIX",
            ZilVal::String(_) => "STRING",
            ZilVal::Atom(_) => "ATOM",
            other => other.type_tag().name(),
        }
    }

    /// Everything except FALSE is true.
    #[inline]
    #[must_use]
    pub fn is_true(&self) -> bool {
        !matches!(self.unlocated(), ZilVal::False(_))
    }

    #[must_use]
    pub fn is_applicable(&self) -> bool {
        matches!(
            self.unlocated(),
            ZilVal::Subr(_)
                | ZilVal::Fsubr(_)
                | ZilVal::Function(_)
                | ZilVal::Macro(_)
                | ZilVal::Fix(_)
        )
    }

    /// Whether the value can be viewed as a sequence of elements.
    #[must_use]
    pub fn is_structured(&self) -> bool {
        matches!(
            self.unlocated(),
            ZilVal::List(_, _)
                | ZilVal::Form(_, _)
                | ZilVal::Vector(_, _)
                | ZilVal::False(_)
                | ZilVal::Splice(_)
                | ZilVal::String(_)
                | ZilVal::Struct(_)
        )
    }

    #[must_use]
    pub fn as_atom(&self) -> Option<AtomId> {
        match self.unlocated() {
            ZilVal::Atom(a) => Some(*a),
            _ => None,
        }
    }

    // ------------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------------

    /// The metadata slot, for values that have one.
    #[must_use]
    pub fn meta(&self) -> Option<&Rc<Meta>> {
        match self {
            ZilVal::List(_, m) | ZilVal::Form(_, m) | ZilVal::Vector(_, m) | ZilVal::Adecl(_, m) => {
                m.as_ref()
            }
            ZilVal::Located(l) => Some(&l.meta),
            _ => None,
        }
    }

    /// The value's source position, `Unknown` if it has none.
    #[must_use]
    pub fn source(&self) -> SourceLine {
        self.meta()
            .map(|m| m.source.clone())
            .unwrap_or_default()
    }

    /// Whether this value was produced by macro expansion.
    #[must_use]
    pub fn is_expanded(&self) -> bool {
        self.meta().is_some_and(|m| m.expanded)
    }

    /// Replace the metadata. Values without a slot of their own are wrapped
    /// in [`ZilVal::Located`].
    #[must_use]
    pub fn with_meta(self, meta: Meta) -> Self {
        let meta = Rc::new(meta);
        match self.into_unlocated() {
            ZilVal::List(items, _) => ZilVal::List(items, Some(meta)),
            ZilVal::Form(items, _) => ZilVal::Form(items, Some(meta)),
            ZilVal::Vector(items, _) => ZilVal::Vector(items, Some(meta)),
            ZilVal::Adecl(inner, _) => ZilVal::Adecl(inner, Some(meta)),
            value => ZilVal::Located(Rc::new(Located { value, meta })),
        }
    }

    /// Shorthand for attaching a source position to a freshly built value.
    #[must_use]
    pub fn at(self, source: SourceLine) -> Self {
        self.with_meta(Meta::at(source))
    }
}

impl PartialEq for ZilVal {
    fn eq(&self, other: &Self) -> bool {
        match (self.unlocated(), other.unlocated()) {
            (ZilVal::Atom(a), ZilVal::Atom(b)) => a == b,
            (ZilVal::Fix(a), ZilVal::Fix(b)) => a == b,
            (ZilVal::Char(a), ZilVal::Char(b)) => a == b,
            (ZilVal::String(a), ZilVal::String(b)) => a == b,
            (ZilVal::False(a), ZilVal::False(b)) => a == b,
            (ZilVal::List(a, _), ZilVal::List(b, _)) => a == b,
            (ZilVal::Form(a, _), ZilVal::Form(b, _)) => a == b,
            (ZilVal::Vector(a, _), ZilVal::Vector(b, _)) => a == b,
            (ZilVal::Adecl(a, _), ZilVal::Adecl(b, _)) => a == b,
            (ZilVal::Splice(a), ZilVal::Splice(b)) => a == b,
            (ZilVal::Subr(a), ZilVal::Subr(b)) => a == b,
            (ZilVal::Fsubr(a), ZilVal::Fsubr(b)) => a == b,
            (ZilVal::Function(a), ZilVal::Function(b)) => Rc::ptr_eq(a, b),
            (ZilVal::Macro(a), ZilVal::Macro(b)) => a == b,
            (ZilVal::Struct(a), ZilVal::Struct(b)) => a.same_view(b),
            (ZilVal::Asoc(a), ZilVal::Asoc(b)) => a == b,
            (ZilVal::ObList(a), ZilVal::ObList(b)) => a == b,
            _ => false,
        }
    }
}

impl From<i32> for ZilVal {
    fn from(n: i32) -> Self {
        ZilVal::Fix(n)
    }
}

impl From<AtomId> for ZilVal {
    fn from(a: AtomId) -> Self {
        ZilVal::Atom(a)
    }
}

impl From<&str> for ZilVal {
    fn from(s: &str) -> Self {
        ZilVal::string(s)
    }
}
