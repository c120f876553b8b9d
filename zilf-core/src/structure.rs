// zilf-core - Structure protocol
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! One list protocol over every structured value.
//!
//! LIST, FORM, VECTOR, SPLICE, FALSE, STRING and tied records all answer the
//! same questions, so builtins never special-case records. Positions are
//! 0-based here; the 1-based numbering of `NTH` and `PUT` is the builtins'
//! business.
//!
//! Persistent contents are never mutated: [`put`] on a LIST returns the new
//! LIST. Tied records are updated in place and [`put`] returns the same
//! reference.

use im::Vector;
use zilf_value::{StructRef, ZilVal};

use crate::error::{Error, Result};

fn not_structured(op: &'static str, value: &ZilVal) -> Error {
    Error::type_constraint(op, "structure", "STRUCTURED", value.type_name())
}

fn out_of_range(index: usize, length: usize) -> Error {
    Error::IndexOutOfRange { index, length }
}

/// The persistent contents of a value, if it has any.
fn items(value: &ZilVal) -> Option<&Vector<ZilVal>> {
    match value.unlocated() {
        ZilVal::List(items, _)
        | ZilVal::Form(items, _)
        | ZilVal::Vector(items, _)
        | ZilVal::Splice(items)
        | ZilVal::False(items) => Some(items),
        _ => None,
    }
}

/// Exact length.
pub fn length(value: &ZilVal) -> Result<usize> {
    if let Some(items) = items(value) {
        return Ok(items.len());
    }
    match value.unlocated() {
        ZilVal::String(s) => Ok(s.chars().count()),
        ZilVal::Struct(r) => Ok(r.len()),
        other => Err(not_structured("LENGTH", other)),
    }
}

/// The length if it is at most `limit`, otherwise `None`.
pub fn length_bounded(value: &ZilVal, limit: usize) -> Result<Option<usize>> {
    let value = value.unlocated();
    if let ZilVal::Struct(r) = value {
        return Ok(r.len_bounded(limit));
    }
    if let ZilVal::String(s) = value {
        let n = s.chars().take(limit + 1).count();
        return Ok((n <= limit).then_some(n));
    }
    let n = length(value)?;
    Ok((n <= limit).then_some(n))
}

pub fn is_empty(value: &ZilVal) -> Result<bool> {
    Ok(length_bounded(value, 0)? == Some(0))
}

/// Element at `index`.
pub fn nth(value: &ZilVal, index: usize) -> Result<ZilVal> {
    let found = match value.unlocated() {
        ZilVal::String(s) => s.chars().nth(index).map(ZilVal::Char),
        ZilVal::Struct(r) => r.get(index),
        other => match items(other) {
            Some(items) => items.get(index).cloned(),
            None => return Err(not_structured("NTH", other)),
        },
    };
    match found {
        Some(v) => Ok(v),
        None => Err(out_of_range(index, length(value)?)),
    }
}

/// First element, `None` when empty.
pub fn first(value: &ZilVal) -> Result<Option<ZilVal>> {
    match value.unlocated() {
        ZilVal::Struct(r) => Ok(r.first()),
        ZilVal::String(s) => Ok(s.chars().next().map(ZilVal::Char)),
        other => match items(other) {
            Some(items) => Ok(items.front().cloned()),
            None => Err(not_structured("NTH", other)),
        },
    }
}

/// Replace the element at `index`, returning the updated structure.
pub fn put(value: &ZilVal, index: usize, new: ZilVal) -> Result<ZilVal> {
    fn replaced(items: &Vector<ZilVal>, index: usize, new: ZilVal) -> Result<Vector<ZilVal>> {
        if index >= items.len() {
            return Err(out_of_range(index, items.len()));
        }
        Ok(items.update(index, new))
    }

    match value.unlocated() {
        ZilVal::List(items, meta) => Ok(ZilVal::List(replaced(items, index, new)?, meta.clone())),
        ZilVal::Form(items, meta) => Ok(ZilVal::Form(replaced(items, index, new)?, meta.clone())),
        ZilVal::Vector(items, meta) => {
            Ok(ZilVal::Vector(replaced(items, index, new)?, meta.clone()))
        }
        ZilVal::Splice(items) => Ok(ZilVal::Splice(replaced(items, index, new)?)),
        ZilVal::False(items) => Ok(ZilVal::False(replaced(items, index, new)?)),
        ZilVal::String(s) => {
            let ZilVal::Char(c) = *new.unlocated() else {
                return Err(Error::type_constraint(
                    "PUT",
                    "value",
                    "CHARACTER",
                    new.type_name(),
                ));
            };
            let mut chars: Vec<char> = s.chars().collect();
            if index >= chars.len() {
                return Err(out_of_range(index, chars.len()));
            }
            chars[index] = c;
            Ok(ZilVal::string(chars.into_iter().collect::<String>()))
        }
        ZilVal::Struct(r) => {
            r.set(index, new)?;
            Ok(value.clone())
        }
        other => Err(not_structured("PUT", other)),
    }
}

/// Everything after the first `skip` elements.
///
/// LIST-like values rest to a LIST, VECTORs to a VECTOR, STRINGs to a
/// STRING, and tied records to a view of the same record.
pub fn rest(value: &ZilVal, skip: usize) -> Result<ZilVal> {
    match value.unlocated() {
        ZilVal::Vector(items, _) => {
            if skip > items.len() {
                return Err(out_of_range(skip, items.len()));
            }
            Ok(ZilVal::Vector(items.clone().split_off(skip), None))
        }
        ZilVal::String(s) => {
            let len = s.chars().count();
            if skip > len {
                return Err(out_of_range(skip, len));
            }
            Ok(ZilVal::string(s.chars().skip(skip).collect::<String>()))
        }
        ZilVal::Struct(r) => rest_view(r, skip).map(ZilVal::Struct),
        other => match items(other) {
            Some(items) => {
                if skip > items.len() {
                    return Err(out_of_range(skip, items.len()));
                }
                Ok(ZilVal::List(items.clone().split_off(skip), None))
            }
            None => Err(not_structured("REST", other)),
        },
    }
}

fn rest_view(r: &StructRef, skip: usize) -> Result<StructRef> {
    r.rest(skip).ok_or_else(|| out_of_range(skip, r.len()))
}

/// All elements, in order.
pub fn elements(value: &ZilVal) -> Result<Vec<ZilVal>> {
    match value.unlocated() {
        ZilVal::String(s) => Ok(s.chars().map(ZilVal::Char).collect()),
        ZilVal::Struct(r) => Ok(r.iter().collect()),
        other => match items(other) {
            Some(items) => Ok(items.iter().cloned().collect()),
            None => Err(not_structured("ELEMENTS", other)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixes(ns: &[i32]) -> ZilVal {
        ZilVal::list(ns.iter().copied().map(ZilVal::Fix))
    }

    #[test]
    fn test_put_on_list_is_persistent() {
        let original = fixes(&[1, 2, 3]);
        let updated = put(&original, 1, ZilVal::Fix(9)).unwrap();
        assert_eq!(updated, fixes(&[1, 9, 3]));
        assert_eq!(original, fixes(&[1, 2, 3]));
    }

    #[test]
    fn test_rest_of_form_is_list() {
        let form = ZilVal::form(vec![ZilVal::Fix(1), ZilVal::Fix(2)]);
        assert_eq!(rest(&form, 1).unwrap(), fixes(&[2]));
        assert_eq!(rest(&form, 2).unwrap(), fixes(&[]));
        assert!(matches!(
            rest(&form, 3),
            Err(Error::IndexOutOfRange { index: 3, length: 2 })
        ));
    }

    #[test]
    fn test_strings_are_structures_of_characters() {
        let s = ZilVal::string("abc");
        assert_eq!(length(&s).unwrap(), 3);
        assert_eq!(nth(&s, 2).unwrap(), ZilVal::Char('c'));
        assert_eq!(rest(&s, 1).unwrap(), ZilVal::string("bc"));
        assert_eq!(put(&s, 0, ZilVal::Char('x')).unwrap(), ZilVal::string("xbc"));
        assert!(put(&s, 0, ZilVal::Fix(1)).is_err());
    }

    #[test]
    fn test_length_bounded() {
        let list = fixes(&[1, 2, 3]);
        assert_eq!(length_bounded(&list, 1).unwrap(), None);
        assert_eq!(length_bounded(&list, 3).unwrap(), Some(3));
        assert!(!is_empty(&list).unwrap());
        assert!(is_empty(&ZilVal::falsey()).unwrap());
    }

    #[test]
    fn test_scalars_are_not_structured() {
        let err = length(&ZilVal::Fix(3)).unwrap_err();
        assert!(matches!(err, Error::TypeConstraint { .. }));
        assert!(nth(&ZilVal::Fix(3), 0).is_err());
    }

    #[test]
    fn test_nth_out_of_range() {
        assert!(matches!(
            nth(&fixes(&[1]), 1),
            Err(Error::IndexOutOfRange { index: 1, length: 1 })
        ));
    }
}
