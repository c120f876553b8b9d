// zilf-core - Tied layout integration tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Integration tests for records with declared layouts, seen through the
//! context's layout cache and the structure builtins.

mod common;

use common::*;
use zilf_core::zilf_value::{LayoutBuilder, Shape};

#[derive(Debug)]
struct Exit {
    dir: ZilVal,
    to: ZilVal,
    flags: Vec<ZilVal>,
}

impl Shape for Exit {
    const TYPE_NAME: &'static str = "EXIT";

    fn declare(layout: &mut LayoutBuilder<Self>) {
        layout
            .read_only("DIR", |e| e.dir.clone())
            .field(
                "TO",
                |e| e.to.clone(),
                |e, v| match v {
                    ZilVal::Atom(_) => {
                        e.to = v;
                        Ok(())
                    }
                    _ => Err("ATOM".into()),
                },
            )
            .rest("FLAGS", |e| &e.flags, |e| &mut e.flags);
    }
}

fn exit(ctx: &mut Context) -> ZilVal {
    let dir = atom(ctx, "NORTH");
    let to = atom(ctx, "KITCHEN");
    ctx.wrap(Exit {
        dir,
        to,
        flags: Vec::new(),
    })
}

fn record(value: &ZilVal) -> &zilf_core::zilf_value::StructRef {
    match value {
        ZilVal::Struct(r) => r,
        other => panic!("expected a record, got {:?}", other),
    }
}

// =============================================================================
// Direct access
// =============================================================================

#[test]
fn test_fields_then_catch_all_enumerate_in_order() {
    let (mut ctx, _sink) = new_ctx();
    let value = exit(&mut ctx);
    let r = record(&value);
    let hall = atom(&mut ctx, "HALL");
    r.set(1, hall.clone()).unwrap();
    r.set(2, ZilVal::Fix(7)).unwrap();
    r.set(3, ZilVal::Fix(8)).unwrap();

    let north = atom(&mut ctx, "NORTH");
    let items: Vec<_> = r.iter().collect();
    assert_eq!(items, vec![north, hall, ZilVal::Fix(7), ZilVal::Fix(8)]);
    assert_eq!(r.len(), 4);
    assert_eq!(r.len_bounded(3), None);
    assert_eq!(r.get(4), None);
}

#[test]
fn test_rest_view_aliases_record() {
    let (mut ctx, _sink) = new_ctx();
    let value = exit(&mut ctx);
    let r = record(&value);
    r.set(2, ZilVal::Fix(1)).unwrap();

    let view = r.rest(1).unwrap();
    assert_eq!(view.len(), 2);
    view.set(1, ZilVal::Fix(5)).unwrap();
    assert_eq!(r.get(2), Some(ZilVal::Fix(5)));
    assert!(view.same_record(r));
    assert!(!view.same_view(r));
}

#[test]
fn test_write_errors() {
    let (mut ctx, _sink) = new_ctx();
    let value = exit(&mut ctx);
    let r = record(&value);

    let err: Error = r.set(0, ZilVal::Fix(1)).unwrap_err().into();
    assert_eq!(err.kind(), ErrorKind::ReadOnlyField);
    assert_eq!(err.to_string(), "EXIT field DIR is read-only");

    let err: Error = r.set(1, ZilVal::Fix(1)).unwrap_err().into();
    assert_eq!(err.kind(), ErrorKind::TypeConstraintViolation);

    let err: Error = r.set(5, ZilVal::Fix(1)).unwrap_err().into();
    assert_eq!(err.kind(), ErrorKind::OutOfRange);
    assert_eq!(r.len(), 2);
}

#[test]
fn test_layout_derived_once_per_shape() {
    let (mut ctx, _sink) = new_ctx();
    let before = ctx.layouts().len();
    let a = exit(&mut ctx);
    let after_first = ctx.layouts().len();
    let b = exit(&mut ctx);
    assert_eq!(after_first, before + 1);
    assert_eq!(ctx.layouts().len(), after_first);
    assert!(std::rc::Rc::ptr_eq(record(&a).layout(), record(&b).layout()));
    assert_eq!(record(&a).layout().type_name(), "EXIT");
}

// =============================================================================
// Through the builtins
// =============================================================================

#[test]
fn test_structure_builtins_see_records() {
    let (mut ctx, _sink) = new_ctx();
    let value = exit(&mut ctx);

    assert_eq!(
        call(&mut ctx, "LENGTH", vec![value.clone()]).unwrap(),
        ZilVal::Fix(2)
    );
    let kitchen = atom(&mut ctx, "KITCHEN");
    assert_eq!(
        call(&mut ctx, "NTH", vec![value.clone(), ZilVal::Fix(2)]).unwrap(),
        kitchen
    );

    // PUT one past the end appends to FLAGS and returns the same record
    let put = call(
        &mut ctx,
        "PUT",
        vec![value.clone(), ZilVal::Fix(3), ZilVal::Fix(42)],
    )
    .unwrap();
    assert!(record(&put).same_view(record(&value)));
    assert_eq!(record(&value).get(2), Some(ZilVal::Fix(42)));

    let rest = call(&mut ctx, "REST", vec![value.clone(), ZilVal::Fix(2)]).unwrap();
    assert_eq!(
        call(&mut ctx, "NTH", vec![rest, ZilVal::Fix(1)]).unwrap(),
        ZilVal::Fix(42)
    );

    let ty = call(&mut ctx, "TYPE", vec![value.clone()]).unwrap();
    let root = ctx.symbols().root();
    assert_eq!(ty, ZilVal::Atom(ctx.symbols().lookup(root, "EXIT").unwrap()));

    let err = call(&mut ctx, "PUT", vec![value, ZilVal::Fix(1), ZilVal::Fix(0)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ReadOnlyField);
}

#[test]
fn test_length_query_on_records() {
    let (mut ctx, _sink) = new_ctx();
    let value = exit(&mut ctx);
    assert_eq!(
        call(&mut ctx, "LENGTH?", vec![value.clone(), ZilVal::Fix(1)]).unwrap(),
        ZilVal::falsey()
    );
    assert_eq!(
        call(&mut ctx, "LENGTH?", vec![value.clone(), ZilVal::Fix(5)]).unwrap(),
        ZilVal::Fix(2)
    );
    assert_eq!(
        call(&mut ctx, "EMPTY?", vec![value]).unwrap(),
        ZilVal::falsey()
    );
}
