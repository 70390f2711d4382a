mod failures;
mod operators;

use std::sync::Arc;

use crate::error::TranslateError;
use crate::expr::{BinaryOp, Expr, Param};
use crate::fold::ClosureEvaluator;
use crate::names::DefaultNames;
use crate::signature::{ParamShape, Signature};
use crate::translate::translate_predicate;
use crate::types::{EnumDef, TypeRef};
use crate::value::Value;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn critter() -> TypeRef {
    TypeRef::complex("Critter")
}

fn status_def() -> Arc<EnumDef> {
    Arc::new(EnumDef::new(
        "Status",
        TypeRef::Int32,
        vec![("Active".into(), 1), ("Retired".into(), 2)],
    ))
}

fn status() -> TypeRef {
    TypeRef::Enum(status_def())
}

fn prop(target: &Expr, name: &str, ty: TypeRef) -> Expr {
    Expr::property(target.clone(), name, ty)
}

fn int(v: i32) -> Expr {
    Expr::value(Value::Int32(v))
}

fn string(s: &str) -> Expr {
    Expr::value(Value::String(s.into()))
}

fn bin(op: BinaryOp, l: Expr, r: Expr) -> Expr {
    Expr::binary(op, l, r)
}

fn seq_call(name: &'static str, params: Vec<ParamShape>, args: Vec<Expr>, ty: TypeRef) -> Expr {
    Expr::call(
        Signature::static_method("enumerable", name, params),
        None,
        args,
        ty,
    )
}

/// Build `x => body(x)` over a `Critter` parameter.
fn lambda(body: impl FnOnce(&Expr) -> Expr) -> Expr {
    let x = Param::new("x", critter());
    let this = Expr::param(&x);
    Expr::lambda(vec![x], body(&this))
}

fn translate(lambda: &Expr) -> String {
    try_translate(lambda).unwrap_or_else(|e| panic!("translation failed: {e}"))
}

fn try_translate(lambda: &Expr) -> Result<String, TranslateError> {
    translate_predicate(lambda, &DefaultNames, &ClosureEvaluator::new())
}

fn assert_unsupported(lambda: &Expr, expected: &str) {
    let err = try_translate(lambda).expect_err("expected translation to fail");
    let msg = err.to_string();
    assert!(
        msg.contains(expected),
        "expected error containing `{expected}`, got: {msg}"
    );
}
