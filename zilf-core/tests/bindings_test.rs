// zilf-core - Binding integration tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Integration tests for local frames, global values, scoped rebinding and
//! declaration checking.

mod common;

use common::*;
use zilf_core::{Axis, Binding, LocalEnv};

// =============================================================================
// Rebind
// =============================================================================

fn read_v(ctx: &mut Context, v: AtomId) -> ZilVal {
    ctx.value_of(v).unwrap()
}

#[test]
fn test_rebind_shadows_global_then_restores() {
    let (mut ctx, _sink) = new_ctx();
    let v = ctx.atom("V");
    ctx.set_global(v, ZilVal::Fix(1)).unwrap();
    {
        let _guard = ctx.rebind(v, ZilVal::Fix(2)).unwrap();
        assert_eq!(read_v(&mut ctx, v), ZilVal::Fix(2));
    }
    assert_eq!(read_v(&mut ctx, v), ZilVal::Fix(1));
    assert_eq!(ctx.get_local(v), None);
}

fn failing_scope(ctx: &mut Context, v: AtomId) -> Result<()> {
    let _guard = ctx.rebind(v, ZilVal::Fix(2))?;
    assert_eq!(ctx.value_of(v)?, ZilVal::Fix(2));
    let nope = ctx.atom("NOPE");
    ctx.gval(nope)?;
    Ok(())
}

#[test]
fn test_rebind_restores_on_error() {
    let (mut ctx, _sink) = new_ctx();
    let v = ctx.atom("V");
    ctx.set_global(v, ZilVal::Fix(1)).unwrap();

    let err = failing_scope(&mut ctx, v).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnboundAtom);
    assert_eq!(read_v(&mut ctx, v), ZilVal::Fix(1));
}

#[test]
fn test_nested_rebinds_unwind_in_order() {
    let (mut ctx, _sink) = new_ctx();
    let v = ctx.atom("V");
    let outer = ctx.rebind(v, ZilVal::Fix(1)).unwrap();
    {
        let _inner = ctx.rebind(v, ZilVal::Fix(2)).unwrap();
        assert_eq!(ctx.get_local(v), Some(ZilVal::Fix(2)));
    }
    assert_eq!(ctx.get_local(v), Some(ZilVal::Fix(1)));
    drop(outer);
    assert_eq!(ctx.get_local(v), None);
}

#[test]
fn test_rebind_checks_declaration() {
    let (mut ctx, _sink) = new_ctx();
    let v = ctx.atom("V");
    let fix = atom(&mut ctx, "FIX");
    let frame = ctx.env().clone();
    let err = ctx
        .rebind_in(&frame, v, ZilVal::string("x"), Some(fix))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DeclarationViolation);
    assert_eq!(ctx.get_local(v), None);
}

// =============================================================================
// Frames
// =============================================================================

#[test]
fn test_child_frames_see_parent_bindings() {
    let root = LocalEnv::new();
    let a = AtomId(100);
    root.bind(a, Binding::assigned(ZilVal::Fix(1)));
    let child = root.child();
    assert_eq!(child.get(a), Some(ZilVal::Fix(1)));

    child.bind(a, Binding::unassigned());
    assert!(child.is_bound(a));
    assert_eq!(child.get(a), None);
    assert_eq!(root.get(a), Some(ZilVal::Fix(1)));
}

#[test]
fn test_function_frames_are_dynamic() {
    let (mut ctx, _sink) = new_ctx();
    // <DEFINE INNER () .OUTER-ARG>
    let outer_arg = atom(&mut ctx, "OUTER-ARG");
    let lval = form(&mut ctx, "LVAL", vec![outer_arg.clone()]);
    let inner = atom(&mut ctx, "INNER");
    call(
        &mut ctx,
        "DEFINE",
        vec![inner, ZilVal::list(vec![]), lval],
    )
    .unwrap();
    // <DEFINE OUTER (OUTER-ARG) <INNER>>
    let inner_call = form(&mut ctx, "INNER", vec![]);
    let outer = atom(&mut ctx, "OUTER");
    call(
        &mut ctx,
        "DEFINE",
        vec![outer, ZilVal::list(vec![outer_arg]), inner_call],
    )
    .unwrap();

    assert_eq!(
        call(&mut ctx, "OUTER", vec![ZilVal::Fix(9)]).unwrap(),
        ZilVal::Fix(9)
    );
    let err = call(&mut ctx, "INNER", vec![]).unwrap_err();
    assert_eq!(
        err,
        Error::UnboundAtom {
            atom: "OUTER-ARG".into(),
            axis: Axis::Local,
        }
    );
}

// =============================================================================
// Unbound errors name the axis
// =============================================================================

#[test]
fn test_unbound_axes() {
    let (mut ctx, _sink) = new_ctx();
    let x = ctx.atom("X");
    let messages: Vec<String> = [
        ctx.lval(x).unwrap_err(),
        ctx.gval(x).unwrap_err(),
        ctx.value_of(x).unwrap_err(),
    ]
    .iter()
    .map(ToString::to_string)
    .collect();
    assert_eq!(
        messages,
        vec![
            "atom X has no local value",
            "atom X has no global value",
            "atom X has no local or global value",
        ]
    );
}

// =============================================================================
// Declaration checking toggle
// =============================================================================

#[test]
fn test_decl_toggle() {
    let (mut ctx, _sink) = new_ctx();
    let n = ctx.atom("N");
    let fix = atom(&mut ctx, "FIX");
    ctx.set_global_decl(n, fix).unwrap();

    assert!(ctx.set_global(n, ZilVal::string("a")).is_err());

    assert!(ctx.set_check_decls(false));
    ctx.set_global(n, ZilVal::string("a")).unwrap();

    assert!(!ctx.set_check_decls(true));
    let err = ctx.set_global(n, ZilVal::string("b")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DeclarationViolation);
    assert_eq!(ctx.get_global(n), Some(ZilVal::string("a")));
}

#[test]
fn test_adecl_parameter_checked_on_call() {
    let (mut ctx, _sink) = new_ctx();
    // <DEFINE ID (X:FIX) .X>
    let x = atom(&mut ctx, "X");
    let fix = atom(&mut ctx, "FIX");
    let lval = form(&mut ctx, "LVAL", vec![x.clone()]);
    let id = atom(&mut ctx, "ID");
    call(
        &mut ctx,
        "DEFINE",
        vec![id, ZilVal::list(vec![ZilVal::adecl(x, fix)]), lval],
    )
    .unwrap();

    assert_eq!(call(&mut ctx, "ID", vec![ZilVal::Fix(3)]).unwrap(), ZilVal::Fix(3));
    let err = call(&mut ctx, "ID", vec![ZilVal::string("s")]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DeclarationViolation);
}
