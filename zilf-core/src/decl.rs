// zilf-core - Declaration patterns
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Matching values against declaration patterns.
//!
//! A pattern is one of:
//!
//! - a type atom (`FIX`, `LIST`, a tied record's type name, ...)
//! - `ANY`, `STRUCTURED` or `APPLICABLE`
//! - `<OR p ...>`, `<PRIMTYPE t>` or `<QUOTE v>`
//! - a structure pattern `<LIST p1 p2 ...>` matched against the elements
//!   in order, where an element pattern may be a VECTOR group:
//!   `[REST q ...]` repeats the group to the end, `[OPT q ...]` matches the
//!   group against whatever elements remain, and `[n q ...]` repeats it
//!   exactly `n` times.
//!
//! Elements left over after the last pattern are allowed.

use zilf_value::{StdAtom, ZilVal};

use crate::oblist::SymbolTable;
use crate::structure;

/// Whether `value` satisfies `pattern`.
pub fn matches(syms: &SymbolTable, value: &ZilVal, pattern: &ZilVal) -> bool {
    let value = value.unlocated();
    match pattern.unlocated() {
        ZilVal::Atom(atom) => match syms.std_tag(*atom) {
            Some(StdAtom::Any) => true,
            Some(StdAtom::Structured) => value.is_structured(),
            Some(StdAtom::Applicable) => value.is_applicable(),
            _ => value.type_name() == syms.text(*atom),
        },
        ZilVal::Form(items, _) => {
            let Some(head) = items.front().and_then(ZilVal::as_atom) else {
                return false;
            };
            let args: Vec<&ZilVal> = items.iter().skip(1).collect();
            match syms.std_tag(head) {
                Some(StdAtom::Or) => args.iter().any(|p| matches(syms, value, p)),
                Some(StdAtom::Primtype) => match args.first().and_then(|p| p.as_atom()) {
                    Some(t) => value.primtype() == syms.text(t),
                    None => false,
                },
                Some(StdAtom::Quote) => args.first().is_some_and(|v| *v == value),
                _ => {
                    matches(syms, value, &ZilVal::Atom(head))
                        && match structure::elements(value) {
                            Ok(elements) => matches_elements(syms, &elements, &args),
                            Err(_) => false,
                        }
                }
            }
        }
        _ => false,
    }
}

enum Group<'a> {
    Rest(Vec<&'a ZilVal>),
    Opt(Vec<&'a ZilVal>),
    Repeat(usize, Vec<&'a ZilVal>),
}

fn group<'a>(syms: &SymbolTable, pattern: &'a ZilVal) -> Option<Group<'a>> {
    let ZilVal::Vector(items, _) = pattern.unlocated() else {
        return None;
    };
    let body: Vec<&ZilVal> = items.iter().skip(1).collect();
    match items.front()?.unlocated() {
        ZilVal::Atom(a) => match syms.std_tag(*a) {
            Some(StdAtom::Rest) => Some(Group::Rest(body)),
            Some(StdAtom::Opt | StdAtom::Optional) => Some(Group::Opt(body)),
            _ => None,
        },
        ZilVal::Fix(n) if *n >= 0 => Some(Group::Repeat(*n as usize, body)),
        _ => None,
    }
}

fn matches_elements(syms: &SymbolTable, elements: &[ZilVal], patterns: &[&ZilVal]) -> bool {
    let mut pos = 0;
    for pattern in patterns {
        match group(syms, pattern) {
            Some(Group::Rest(body)) => {
                if body.is_empty() {
                    return true;
                }
                return elements[pos..]
                    .iter()
                    .zip(body.iter().cycle())
                    .all(|(e, p)| matches(syms, e, p));
            }
            Some(Group::Opt(body)) => {
                for p in body {
                    let Some(e) = elements.get(pos) else {
                        return true;
                    };
                    if !matches(syms, e, p) {
                        return false;
                    }
                    pos += 1;
                }
            }
            Some(Group::Repeat(count, body)) => {
                for _ in 0..count {
                    for p in &body {
                        let Some(e) = elements.get(pos) else {
                            return false;
                        };
                        if !matches(syms, e, p) {
                            return false;
                        }
                        pos += 1;
                    }
                }
            }
            None => {
                let Some(e) = elements.get(pos) else {
                    return false;
                };
                if !matches(syms, e, pattern) {
                    return false;
                }
                pos += 1;
            }
        }
    }
    true
}
