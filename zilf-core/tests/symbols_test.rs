// zilf-core - Symbol table integration tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Integration tests for atoms, OBLISTs and search paths.

mod common;

use common::*;
use zilf_core::SymbolTable;

// =============================================================================
// Interning
// =============================================================================

#[test]
fn test_intern_is_idempotent() {
    let mut syms = SymbolTable::new();
    let initial = syms.initial();
    let a = syms.intern(initial, "FOO");
    let b = syms.intern(initial, "FOO");
    assert_eq!(a, b);
    assert_eq!(syms.lookup(initial, "FOO"), Some(a));
}

#[test]
fn test_same_text_on_two_oblists_is_two_atoms() {
    let mut syms = SymbolTable::new();
    let a = syms.intern(syms.initial(), "FOO");
    let b = syms.intern(syms.root(), "FOO");
    assert_ne!(a, b);
    assert_eq!(syms.text(a), syms.text(b));
}

#[test]
fn test_std_atoms_live_on_root() {
    let syms = SymbolTable::new();
    for &std in StdAtom::ALL {
        let atom = syms.std(std);
        assert_eq!(syms.oblist_of(atom), Some(syms.root()));
        assert_eq!(syms.text(atom), std.text());
        assert!(syms.is_std(atom, std));
    }
}

// =============================================================================
// Attach and detach
// =============================================================================

#[test]
fn test_attach_to_second_oblist_conflicts() {
    let mut syms = SymbolTable::new();
    let other = syms.new_oblist(None);
    let atom = syms.intern(syms.initial(), "LAMP");
    let err = syms.attach(atom, other).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NamespaceConflict);
    assert!(matches!(err, Error::AtomOnOtherObList { .. }));
}

#[test]
fn test_detach_then_reattach() {
    let mut syms = SymbolTable::new();
    let other = syms.new_oblist(None);
    let initial = syms.initial();
    let atom = syms.intern(initial, "LAMP");

    assert_eq!(syms.detach(atom), Some(initial));
    assert_eq!(syms.lookup(initial, "LAMP"), None);
    assert_eq!(syms.text(atom), "LAMP");

    syms.attach(atom, other).unwrap();
    assert_eq!(syms.oblist_of(atom), Some(other));
    assert_eq!(syms.lookup(other, "LAMP"), Some(atom));
}

#[test]
fn test_attach_onto_taken_name_conflicts() {
    let mut syms = SymbolTable::new();
    let initial = syms.initial();
    syms.intern(initial, "LAMP");
    let stray = syms.new_atom("LAMP");
    let err = syms.attach(stray, initial).unwrap_err();
    assert!(matches!(err, Error::DuplicateAtomName { .. }));
}

// =============================================================================
// Search paths
// =============================================================================

#[test]
fn test_first_match_on_path_wins() {
    let mut syms = SymbolTable::new();
    let a = syms.new_oblist(None);
    let b = syms.new_oblist(None);
    let a1 = syms.intern(a, "X");
    let b1 = syms.intern(b, "X");

    syms.push_path(vec![b]).unwrap();
    syms.push_path(vec![a, b]).unwrap();
    assert_eq!(syms.resolve("X"), a1);

    syms.pop_path().unwrap();
    assert_eq!(syms.resolve("X"), b1);
    syms.pop_path().unwrap();
}

#[test]
fn test_miss_inserts_into_path_head() {
    let mut syms = SymbolTable::new();
    let a = syms.new_oblist(None);
    let b = syms.new_oblist(None);
    syms.push_path(vec![a, b]).unwrap();
    let fresh = syms.resolve("NEVER-SEEN");
    assert_eq!(syms.oblist_of(fresh), Some(a));
    assert_eq!(syms.resolve("NEVER-SEEN"), fresh);
}

#[test]
fn test_pop_at_base_is_misplaced() {
    let mut syms = SymbolTable::new();
    let err = syms.pop_path().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MisplacedOperation);
    assert_eq!(syms.block_depth(), 0);
    assert_eq!(syms.path(), &[syms.initial(), syms.root()]);
}

#[test]
fn test_qualified_names() {
    let mut syms = SymbolTable::new();
    let qualified = syms.resolve_path("X!-MYLIB");
    let mylib_name = syms.resolve("MYLIB");
    let mylib = syms.oblist_named(mylib_name).unwrap();
    assert_eq!(syms.oblist_of(qualified), Some(mylib));

    let bare = syms.resolve("X");
    assert_ne!(bare, qualified);
    assert_eq!(syms.display(qualified), "X!-MYLIB");
    assert_eq!(syms.display(bare), "X");

    let on_root = syms.resolve_path("Y!-");
    assert_eq!(syms.oblist_of(on_root), Some(syms.root()));
}

#[test]
fn test_qualified_names_nest_to_the_right() {
    let mut syms = SymbolTable::new();
    let x = syms.resolve_path("X!-INNER!-OUTER");

    // OUTER is an ordinary atom; INNER lives on OUTER's OBLIST
    let outer_name = syms.resolve("OUTER");
    let outer = syms.oblist_named(outer_name).unwrap();
    let inner_name = syms.lookup(outer, "INNER").unwrap();
    let inner = syms.oblist_named(inner_name).unwrap();
    assert_eq!(syms.oblist_of(x), Some(inner));
    assert_eq!(syms.lookup(inner, "X"), Some(x));
    assert_eq!(syms.find("INNER"), None);

    assert_eq!(syms.display(x), "X!-INNER!-OUTER");
    assert_eq!(syms.resolve_path("X!-INNER!-OUTER"), x);
}

// =============================================================================
// Through the evaluator
// =============================================================================

#[test]
fn test_block_narrows_resolution() {
    let (mut ctx, _sink) = new_ctx();
    let pkg_name = atom(&mut ctx, "PKG");
    let q = quoted(&mut ctx, pkg_name);
    let pkg = call(&mut ctx, "MOBLIST", vec![q]).unwrap();
    let root = call(&mut ctx, "ROOT", vec![]).unwrap();

    let outside = ctx.atom("THING");
    let path = ZilVal::list(vec![pkg.clone(), root]);
    let q = quoted(&mut ctx, path);
    call(&mut ctx, "BLOCK", vec![q]).unwrap();
    let inside = ctx.atom("THING");
    assert_ne!(inside, outside);
    assert_eq!(ZilVal::ObList(ctx.symbols().oblist_of(inside).unwrap()), pkg);
    call(&mut ctx, "ENDBLOCK", vec![]).unwrap();

    assert_eq!(ctx.atom("THING"), outside);
}
