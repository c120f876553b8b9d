// zilf-value - Tied record layouts
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Tied layouts project typed Rust records onto a positional list view.
//!
//! A record type implements [`Shape`] and declares, once, which of its fields
//! appear at which position and which trailing `Vec` (if any) absorbs every
//! position past the fixed fields:
//!
//! ```
//! use zilf_value::{LayoutBuilder, LayoutCache, Shape, ZilVal};
//!
//! #[derive(Debug)]
//! struct Word {
//!     text: ZilVal,
//!     flags: i32,
//!     synonyms: Vec<ZilVal>,
//! }
//!
//! impl Shape for Word {
//!     const TYPE_NAME: &'static str = "WORD";
//!
//!     fn declare(layout: &mut LayoutBuilder<Self>) {
//!         layout
//!             .read_only("TEXT", |w| w.text.clone())
//!             .field("FLAGS", |w| ZilVal::Fix(w.flags), |w, v| match v {
//!                 ZilVal::Fix(n) => {
//!                     w.flags = n;
//!                     Ok(())
//!                 }
//!                 _ => Err("FIX".into()),
//!             })
//!             .rest("SYNONYMS", |w| &w.synonyms, |w| &mut w.synonyms);
//!     }
//! }
//!
//! let mut cache = LayoutCache::new();
//! let word = cache.wrap(Word { text: ZilVal::string("lamp"), flags: 0, synonyms: vec![] });
//! word.set(1, ZilVal::Fix(4)).unwrap();
//! word.set(2, ZilVal::string("light")).unwrap();
//! assert_eq!(word.len(), 3);
//! assert_eq!(word.get(1), Some(ZilVal::Fix(4)));
//! ```
//!
//! The [`Layout`] for a shape is built on first use and cached by the
//! record's `TypeId`; every instance of the shape shares it. Fixed positions
//! are O(1) accessor calls, and [`StructRef::rest`] produces views that alias
//! the same record.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::value::ZilVal;

// ============================================================================
// Errors
// ============================================================================

/// Failures raised by layout access.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// Write to a field declared read-only
    ReadOnlyField {
        type_name: &'static str,
        field: &'static str,
    },
    /// A field's setter rejected the value's type
    WrongFieldType {
        type_name: &'static str,
        field: &'static str,
        expected: &'static str,
        got: &'static str,
    },
    /// A field's setter accepted the type but not the contents
    InvalidField {
        type_name: &'static str,
        field: &'static str,
        message: String,
    },
    /// Write into the catch-all past its end
    IndexOutOfRange { index: usize, length: usize },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::ReadOnlyField { type_name, field } => {
                write!(f, "{} field {} is read-only", type_name, field)
            }
            LayoutError::WrongFieldType {
                type_name,
                field,
                expected,
                got,
            } => write!(
                f,
                "{} field {} expects {}, got {}",
                type_name, field, expected, got
            ),
            LayoutError::InvalidField {
                type_name,
                field,
                message,
            } => write!(f, "{} field {}: {}", type_name, field, message),
            LayoutError::IndexOutOfRange { index, length } => {
                write!(
                    f,
                    "index {} out of range for structure of length {}",
                    index, length
                )
            }
        }
    }
}

impl std::error::Error for LayoutError {}

// ============================================================================
// Shapes
// ============================================================================

/// A record type with a declared list layout.
pub trait Shape: Any + fmt::Debug + Sized {
    /// The type name reported for instances (e.g. `ROUTINE`).
    const TYPE_NAME: &'static str;

    /// Declare the fixed fields, in position order, and the optional catch-all.
    fn declare(layout: &mut LayoutBuilder<Self>);
}

/// Object-safe view of a [`Shape`] instance.
pub trait TiedRecord: Any + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Shape> TiedRecord for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn downcast<T: Shape>(record: &dyn TiedRecord) -> &T {
    record
        .as_any()
        .downcast_ref::<T>()
        .expect("tied layout applied to a record of another shape")
}

fn downcast_mut<T: Shape>(record: &mut dyn TiedRecord) -> &mut T {
    record
        .as_any_mut()
        .downcast_mut::<T>()
        .expect("tied layout applied to a record of another shape")
}

// ============================================================================
// Descriptors
// ============================================================================

/// Why a setter rejected a value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldError {
    /// Wrong type; carries the expected type's name.
    WrongType(&'static str),
    /// Right type, unusable contents.
    Invalid(String),
}

impl From<&'static str> for FieldError {
    fn from(expected: &'static str) -> Self {
        FieldError::WrongType(expected)
    }
}

/// Setter signature.
pub type FieldSetter<T> = fn(&mut T, ZilVal) -> Result<(), FieldError>;

trait FieldAccess {
    fn get(&self, record: &dyn TiedRecord) -> ZilVal;
    fn set(&self, record: &mut dyn TiedRecord, value: ZilVal) -> Option<Result<(), FieldError>>;
}

struct TypedField<T> {
    get: fn(&T) -> ZilVal,
    set: Option<FieldSetter<T>>,
}

impl<T: Shape> FieldAccess for TypedField<T> {
    fn get(&self, record: &dyn TiedRecord) -> ZilVal {
        (self.get)(downcast::<T>(record))
    }

    fn set(&self, record: &mut dyn TiedRecord, value: ZilVal) -> Option<Result<(), FieldError>> {
        self.set.map(|set| set(downcast_mut::<T>(record), value))
    }
}

trait CatchAllAccess {
    fn items<'a>(&self, record: &'a dyn TiedRecord) -> &'a Vec<ZilVal>;
    fn items_mut<'a>(&self, record: &'a mut dyn TiedRecord) -> &'a mut Vec<ZilVal>;
}

struct TypedCatchAll<T> {
    get: fn(&T) -> &Vec<ZilVal>,
    get_mut: fn(&mut T) -> &mut Vec<ZilVal>,
}

impl<T: Shape> CatchAllAccess for TypedCatchAll<T> {
    fn items<'a>(&self, record: &'a dyn TiedRecord) -> &'a Vec<ZilVal> {
        (self.get)(downcast::<T>(record))
    }

    fn items_mut<'a>(&self, record: &'a mut dyn TiedRecord) -> &'a mut Vec<ZilVal> {
        (self.get_mut)(downcast_mut::<T>(record))
    }
}

/// One fixed position in a layout.
pub struct FieldDescriptor {
    name: &'static str,
    read_only: bool,
    access: Box<dyn FieldAccess>,
}

impl FieldDescriptor {
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }
}

struct CatchAllDescriptor {
    name: &'static str,
    access: Box<dyn CatchAllAccess>,
}

/// Collects a shape's declaration. See [`Shape::declare`].
pub struct LayoutBuilder<T: Shape> {
    fields: Vec<FieldDescriptor>,
    catch_all: Option<CatchAllDescriptor>,
    _shape: PhantomData<fn() -> T>,
}

impl<T: Shape> LayoutBuilder<T> {
    fn new() -> Self {
        LayoutBuilder {
            fields: Vec::new(),
            catch_all: None,
            _shape: PhantomData,
        }
    }

    /// Declare the next fixed position as a writable field.
    pub fn field(
        &mut self,
        name: &'static str,
        get: fn(&T) -> ZilVal,
        set: FieldSetter<T>,
    ) -> &mut Self {
        self.fields.push(FieldDescriptor {
            name,
            read_only: false,
            access: Box::new(TypedField { get, set: Some(set) }),
        });
        self
    }

    /// Declare the next fixed position as a read-only field.
    pub fn read_only(&mut self, name: &'static str, get: fn(&T) -> ZilVal) -> &mut Self {
        self.fields.push(FieldDescriptor {
            name,
            read_only: true,
            access: Box::new(TypedField { get, set: None }),
        });
        self
    }

    /// Declare the catch-all that absorbs every position past the fixed fields.
    ///
    /// # Panics
    ///
    /// Panics if a catch-all was already declared for this shape.
    pub fn rest(
        &mut self,
        name: &'static str,
        get: fn(&T) -> &Vec<ZilVal>,
        get_mut: fn(&mut T) -> &mut Vec<ZilVal>,
    ) -> &mut Self {
        assert!(
            self.catch_all.is_none(),
            "{} declares more than one catch-all",
            T::TYPE_NAME
        );
        self.catch_all = Some(CatchAllDescriptor {
            name,
            access: Box::new(TypedCatchAll { get, get_mut }),
        });
        self
    }

    fn build(self) -> Layout {
        Layout {
            type_name: T::TYPE_NAME,
            fields: self.fields,
            catch_all: self.catch_all,
        }
    }
}

// ============================================================================
// Layouts
// ============================================================================

/// The derived list projection of one shape.
pub struct Layout {
    type_name: &'static str,
    fields: Vec<FieldDescriptor>,
    catch_all: Option<CatchAllDescriptor>,
}

impl Layout {
    /// Derive the layout for a shape. Prefer [`LayoutCache::layout_of`], which
    /// derives each shape only once.
    #[must_use]
    pub fn derive<T: Shape>() -> Layout {
        let mut builder = LayoutBuilder::<T>::new();
        T::declare(&mut builder);
        builder.build()
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Number of fixed fields; positions below this map 1:1 onto fields.
    #[must_use]
    pub fn min_length(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    #[must_use]
    pub fn catch_all_name(&self) -> Option<&'static str> {
        self.catch_all.as_ref().map(|c| c.name)
    }

    /// Position of a named fixed field.
    #[must_use]
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    fn catch_all_len(&self, record: &dyn TiedRecord) -> usize {
        self.catch_all
            .as_ref()
            .map_or(0, |c| c.access.items(record).len())
    }

    fn total_len(&self, record: &dyn TiedRecord) -> usize {
        self.fields.len() + self.catch_all_len(record)
    }

    fn get(&self, record: &dyn TiedRecord, index: usize) -> Option<ZilVal> {
        if let Some(field) = self.fields.get(index) {
            return Some(field.access.get(record));
        }
        let catch_all = self.catch_all.as_ref()?;
        catch_all
            .access
            .items(record)
            .get(index - self.fields.len())
            .cloned()
    }

    fn set(
        &self,
        record: &mut dyn TiedRecord,
        index: usize,
        value: ZilVal,
    ) -> Result<(), LayoutError> {
        if let Some(field) = self.fields.get(index) {
            let got = value.type_name();
            return match field.access.set(record, value) {
                None => Err(LayoutError::ReadOnlyField {
                    type_name: self.type_name,
                    field: field.name,
                }),
                Some(Ok(())) => Ok(()),
                Some(Err(FieldError::WrongType(expected))) => Err(LayoutError::WrongFieldType {
                    type_name: self.type_name,
                    field: field.name,
                    expected,
                    got,
                }),
                Some(Err(FieldError::Invalid(message))) => Err(LayoutError::InvalidField {
                    type_name: self.type_name,
                    field: field.name,
                    message,
                }),
            };
        }

        let Some(catch_all) = &self.catch_all else {
            return Ok(());
        };
        let items = catch_all.access.items_mut(record);
        let slot = index - self.fields.len();
        match slot.cmp(&items.len()) {
            std::cmp::Ordering::Less => {
                items[slot] = value;
                Ok(())
            }
            std::cmp::Ordering::Equal => {
                items.push(value);
                Ok(())
            }
            std::cmp::Ordering::Greater => Err(LayoutError::IndexOutOfRange {
                index,
                length: self.fields.len() + items.len(),
            }),
        }
    }
}

impl fmt::Debug for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.fields.iter().map(|field| field.name).collect();
        f.debug_struct("Layout")
            .field("type_name", &self.type_name)
            .field("fields", &names)
            .field("catch_all", &self.catch_all_name())
            .finish()
    }
}

/// Layouts keyed by shape identity.
#[derive(Default)]
pub struct LayoutCache {
    layouts: FxHashMap<TypeId, Rc<Layout>>,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared layout for `T`, derived on first request.
    pub fn layout_of<T: Shape>(&mut self) -> Rc<Layout> {
        self.layouts
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Rc::new(Layout::derive::<T>()))
            .clone()
    }

    #[must_use]
    pub fn is_derived<T: Shape>(&self) -> bool {
        self.layouts.contains_key(&TypeId::of::<T>())
    }

    /// Number of distinct shapes derived so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    /// Wrap a record as a list-viewable value.
    pub fn wrap<T: Shape>(&mut self, record: T) -> StructRef {
        self.wrap_shared(Rc::new(RefCell::new(record)))
    }

    /// Wrap a record the caller keeps a typed handle to.
    pub fn wrap_shared<T: Shape>(&mut self, record: Rc<RefCell<T>>) -> StructRef {
        let layout = self.layout_of::<T>();
        StructRef {
            record,
            layout,
            offset: 0,
        }
    }
}

impl fmt::Debug for LayoutCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutCache")
            .field("shapes", &self.layouts.len())
            .finish()
    }
}

// ============================================================================
// Record references and views
// ============================================================================

/// A shared reference to a tied record, offset by zero or more positions.
///
/// Views produced by [`StructRef::rest`] share the record, so writes through
/// any view are visible through all of them.
#[derive(Clone)]
pub struct StructRef {
    record: Rc<RefCell<dyn TiedRecord>>,
    layout: Rc<Layout>,
    offset: usize,
}

impl StructRef {
    #[must_use]
    pub fn layout(&self) -> &Rc<Layout> {
        &self.layout
    }

    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Exact number of positions visible through this view.
    #[must_use]
    pub fn len(&self) -> usize {
        let record = self.record.borrow();
        self.layout.total_len(&*record).saturating_sub(self.offset)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len_bounded(0) == Some(0)
    }

    /// The length if it does not exceed `limit`, otherwise `None`.
    #[must_use]
    pub fn len_bounded(&self, limit: usize) -> Option<usize> {
        let fixed = self.layout.min_length().saturating_sub(self.offset);
        if fixed > limit {
            return None;
        }
        let record = self.record.borrow();
        let skipped_rest = self.offset.saturating_sub(self.layout.min_length());
        let rest = self
            .layout
            .catch_all_len(&*record)
            .saturating_sub(skipped_rest);
        if rest > limit - fixed {
            None
        } else {
            Some(fixed + rest)
        }
    }

    /// Element at `index`, or `None` past the end.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<ZilVal> {
        let record = self.record.borrow();
        self.layout.get(&*record, self.offset + index)
    }

    /// Write the element at `index`.
    ///
    /// Writing one past the end of the catch-all appends to it. Past the
    /// fixed fields of a shape without a catch-all, the write is ignored.
    pub fn set(&self, index: usize, value: ZilVal) -> Result<(), LayoutError> {
        let mut record = self.record.borrow_mut();
        self.layout.set(&mut *record, self.offset + index, value)
    }

    #[must_use]
    pub fn first(&self) -> Option<ZilVal> {
        self.get(0)
    }

    /// A view skipping `skip` more positions, or `None` past the end.
    #[must_use]
    pub fn rest(&self, skip: usize) -> Option<StructRef> {
        if skip > self.len() {
            return None;
        }
        Some(StructRef {
            record: self.record.clone(),
            layout: self.layout.clone(),
            offset: self.offset + skip,
        })
    }

    /// Lazily enumerate the visible positions. Each call starts over.
    #[must_use]
    pub fn iter(&self) -> TiedIter {
        TiedIter {
            view: self.clone(),
            pos: 0,
        }
    }

    /// Whether both refer to the same record.
    #[must_use]
    pub fn same_record(&self, other: &StructRef) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.record), Rc::as_ptr(&other.record))
    }

    /// Whether both refer to the same record at the same offset.
    #[must_use]
    pub fn same_view(&self, other: &StructRef) -> bool {
        self.same_record(other) && self.offset == other.offset
    }

    /// Address of the record, stable for as long as any reference lives.
    #[must_use]
    pub fn record_addr(&self) -> usize {
        Rc::as_ptr(&self.record) as *const () as usize
    }

    /// Typed read access, `None` if the record is not a `T`.
    pub fn with<T: Shape, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let record = self.record.borrow();
        record.as_any().downcast_ref::<T>().map(f)
    }

    /// Typed write access, `None` if the record is not a `T`.
    pub fn with_mut<T: Shape, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut record = self.record.borrow_mut();
        record.as_any_mut().downcast_mut::<T>().map(f)
    }
}

thread_local! {
    /// Records whose `Debug` output is in progress on this thread.
    static DEBUG_OPEN: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

impl fmt::Debug for StructRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} ", self.layout.type_name)?;
        let addr = self.record_addr();
        if DEBUG_OPEN.with(|open| open.borrow().contains(&addr)) {
            return f.write_str("...");
        }
        match self.record.try_borrow() {
            Ok(record) => {
                DEBUG_OPEN.with(|open| open.borrow_mut().push(addr));
                let written = write!(f, "{:?}", &*record);
                DEBUG_OPEN.with(|open| open.borrow_mut().pop());
                written?;
            }
            Err(_) => f.write_str("<borrowed>")?,
        }
        if self.offset > 0 {
            write!(f, " +{}", self.offset)?;
        }
        Ok(())
    }
}

/// Iterator over a [`StructRef`]'s positions.
pub struct TiedIter {
    view: StructRef,
    pos: usize,
}

impl Iterator for TiedIter {
    type Item = ZilVal;

    fn next(&mut self) -> Option<ZilVal> {
        let item = self.view.get(self.pos)?;
        self.pos += 1;
        Some(item)
    }
}
