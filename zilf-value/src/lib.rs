// zilf-value - Value model for the ZIL evaluator core
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # zilf-value
//!
//! The value model shared by the reader, the evaluator core and the
//! compiler: atom identities, the `ZilVal` enum, source metadata, procedure
//! descriptions and tied record layouts.

pub mod atom;
pub mod function;
pub mod source;
pub mod tied;
pub mod value;

pub use atom::{AtomId, ObListId, StdAtom};
pub use function::{ArgItem, ArgSpec, ZilBuiltin, ZilFunction};
pub use im::Vector;
pub use source::{Meta, SourceLine};
pub use tied::{
    FieldDescriptor, FieldError, FieldSetter, Layout, LayoutBuilder, LayoutCache, LayoutError, Shape,
    StructRef, TiedIter, TiedRecord,
};
pub use value::{Adecl, Located, TypeTag, ZilVal};
