// zilf-core - Property-based tests for the evaluator core
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Property-based tests for core invariants.
//!
//! Tests the following properties:
//! - Interning the same text on the same OBLIST yields the same atom
//! - Record length and enumeration agree with the writes made
//! - Splicing contributes exactly the spliced elements
//! - PUT on a LIST leaves the original untouched

mod common;

use common::*;
use proptest::prelude::*;
use zilf_core::SymbolTable;
use zilf_core::zilf_value::{LayoutBuilder, LayoutCache, Shape};

#[derive(Debug)]
struct Row {
    key: ZilVal,
    cells: Vec<ZilVal>,
}

impl Shape for Row {
    const TYPE_NAME: &'static str = "ROW";

    fn declare(layout: &mut LayoutBuilder<Self>) {
        layout
            .read_only("KEY", |r| r.key.clone())
            .rest("CELLS", |r| &r.cells, |r| &mut r.cells);
    }
}

// =============================================================================
// Strategies
// =============================================================================

fn arb_name() -> impl Strategy<Value = String> {
    "[A-Z][A-Z0-9?-]{0,8}"
}

fn arb_fixes(max_len: usize) -> impl Strategy<Value = Vec<i32>> {
    prop::collection::vec(-1000i32..1000, 0..=max_len)
}

// =============================================================================
// Interning
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn intern_is_idempotent(name in arb_name()) {
        let mut syms = SymbolTable::new();
        let initial = syms.initial();
        let a = syms.intern(initial, &name);
        let b = syms.intern(initial, &name);
        prop_assert_eq!(a, b);
        prop_assert_eq!(syms.text(a), name.as_str());
        prop_assert_eq!(syms.resolve(&name), a);
    }

    #[test]
    fn distinct_names_are_distinct_atoms(a in arb_name(), b in arb_name()) {
        prop_assume!(a != b);
        let mut syms = SymbolTable::new();
        let initial = syms.initial();
        prop_assert_ne!(syms.intern(initial, &a), syms.intern(initial, &b));
    }
}

// =============================================================================
// Tied records
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn record_length_tracks_appends(cells in arb_fixes(10), limit in 0usize..15) {
        let mut cache = LayoutCache::new();
        let row = cache.wrap(Row { key: ZilVal::Fix(0), cells: Vec::new() });
        for (i, &n) in cells.iter().enumerate() {
            row.set(i + 1, ZilVal::Fix(n)).unwrap();
        }

        let len = cells.len() + 1;
        prop_assert_eq!(row.len(), len);
        prop_assert_eq!(row.len_bounded(limit), (len <= limit).then_some(len));

        let mut expected = vec![ZilVal::Fix(0)];
        expected.extend(cells.iter().copied().map(ZilVal::Fix));
        prop_assert_eq!(row.iter().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn rest_view_shortens_by_skip(cells in arb_fixes(8), skip in 0usize..10) {
        let mut cache = LayoutCache::new();
        let row = cache.wrap(Row {
            key: ZilVal::Fix(0),
            cells: cells.iter().copied().map(ZilVal::Fix).collect(),
        });
        let len = row.len();
        match row.rest(skip) {
            Some(view) => {
                prop_assert!(skip <= len);
                prop_assert_eq!(view.len(), len - skip);
                prop_assert_eq!(view.first(), row.get(skip));
            }
            None => prop_assert!(skip > len),
        }
    }
}

// =============================================================================
// Splicing
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn splice_contributes_its_elements(prefix in arb_fixes(4), spread in arb_fixes(6)) {
        let (mut ctx, sink) = new_ctx();
        let items: Vec<ZilVal> = spread.iter().copied().map(ZilVal::Fix).collect();
        let spread_macro = def_native_macro(&mut ctx, "SPREAD", move |_, _| {
            Ok(ZilVal::splice(items.clone()))
        });

        let mut input: Vec<ZilVal> = prefix.iter().copied().map(ZilVal::Fix).collect();
        input.push(ZilVal::form(vec![spread_macro]));
        let out = expand_all(&mut ctx, &[ZilVal::list(input)]).unwrap();

        let mut expected = prefix.clone();
        expected.extend(&spread);
        prop_assert_eq!(out, vec![fixes(&expected)]);
        prop_assert!(sink.is_empty());
    }

    #[test]
    fn put_on_list_is_persistent(ns in prop::collection::vec(-100i32..100, 1..8), v in -100i32..100) {
        let (mut ctx, _sink) = new_ctx();
        let original = fixes(&ns);
        let index = ns.len() as i32;
        let quoted_list = quoted(&mut ctx, original.clone());
        let updated = call(&mut ctx, "PUT", vec![quoted_list, ZilVal::Fix(index), ZilVal::Fix(v)]).unwrap();

        let mut expected = ns.clone();
        expected[ns.len() - 1] = v;
        prop_assert_eq!(updated, fixes(&expected));
        prop_assert_eq!(original, fixes(&ns));
    }
}
