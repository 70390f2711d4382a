use crate::expr::{Expr, ExprKind, UnaryOp};
use crate::types::TypeRef;

/// Operand cleanup before a binary node is emitted: conversion unwrapping,
/// then enum and nullable-enum comparison detection.
pub(super) fn normalize_operands(left: &Expr, right: &Expr) -> (Expr, Expr) {
    let left = unwrap_conversion(left, right);
    let right = unwrap_conversion(right, &left);
    let (left, right) = enum_comparison(left, right, true);
    nullable_enum_comparison(left, right, true)
}

/// Drops `as` on object-typed operands (unless compared with `null`) and
/// lifting conversions `T -> T?`.
fn unwrap_conversion(expr: &Expr, other: &Expr) -> Expr {
    if let ExprKind::Unary { op, operand } = &expr.kind {
        match op {
            UnaryOp::TypeAs if operand.ty == TypeRef::Object && !other.is_null_constant() => {
                return operand.as_ref().clone();
            }
            UnaryOp::Convert if expr.ty.nullable_inner() == Some(&operand.ty) => {
                return operand.as_ref().clone();
            }
            _ => {}
        }
    }
    expr.clone()
}

/// `Convert(enum -> integral) op integralConstant` becomes an enum-to-enum
/// comparison. Tried once more with the sides swapped.
fn enum_comparison(left: Expr, right: Expr, retry_swapped: bool) -> (Expr, Expr) {
    if left.ty.is_integral()
        && let Some(operand) = left.unary_operand(UnaryOp::Convert)
        && let Some(def) = operand.ty.as_enum()
        && right.ty == left.ty
        && let Some(value) = right.as_constant()
        && let Some(enum_value) = value.to_enum(def)
    {
        let rewritten = Expr::constant(enum_value, operand.ty.clone());
        return (operand.clone(), rewritten);
    }
    if retry_swapped {
        let (r, l) = enum_comparison(right, left, false);
        return (l, r);
    }
    (left, right)
}

/// `Convert(enum? -> int?) op Convert(enumConstant -> int?)` becomes
/// `enum? op enumConstant`. Tried once more with the sides swapped.
fn nullable_enum_comparison(left: Expr, right: Expr, retry_swapped: bool) -> (Expr, Expr) {
    if left.ty != right.ty || !left.ty.is_nullable() {
        return (left, right);
    }
    if let Some(left_operand) = left.unary_operand(UnaryOp::Convert)
        && let Some(constant) = right.unary_operand(UnaryOp::Convert)
        && constant.is_constant()
        && constant.ty.is_enum()
    {
        return (left_operand.clone(), constant.clone());
    }
    if retry_swapped {
        let (r, l) = nullable_enum_comparison(right, left, false);
        return (l, r);
    }
    (left, right)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::expr::{BinaryOp, Param};
    use crate::types::EnumDef;
    use crate::value::Value;

    fn status() -> TypeRef {
        TypeRef::Enum(Arc::new(EnumDef::new(
            "Status",
            TypeRef::Int32,
            vec![("Active".into(), 1)],
        )))
    }

    fn member(name: &str, ty: TypeRef) -> Expr {
        let x = Param::new("x", TypeRef::complex("Critter"));
        Expr::property(Expr::param(&x), name, ty)
    }

    #[test]
    fn enum_constant_on_either_side() {
        let converted = Expr::convert(member("Status", status()), TypeRef::Int32);
        let one = Expr::value(Value::Int32(1));

        let (l, r) = normalize_operands(&converted, &one);
        assert_eq!(l.ty, status());
        assert_eq!(r.ty, status());
        assert!(matches!(r.as_constant(), Some(Value::Enum(e)) if e.value == 1));

        let (l, r) = normalize_operands(&one, &converted);
        assert_eq!(l.ty, status());
        assert!(matches!(l.as_constant(), Some(Value::Enum(_))));
        assert_eq!(r.ty, status());
    }

    #[test]
    fn enum_against_non_constant_is_kept() {
        let converted = Expr::convert(member("Status", status()), TypeRef::Int32);
        let other = member("Rank", TypeRef::Int32);
        let (l, r) = normalize_operands(&converted, &other);
        assert_eq!(l, converted);
        assert_eq!(r, other);
    }

    #[test]
    fn nullable_enum_pattern() {
        let int_opt = TypeRef::nullable(TypeRef::Int32);
        let left = Expr::convert(
            member("Status", TypeRef::nullable(status())),
            int_opt.clone(),
        );
        let active = Expr::value(Value::Int32(1).to_enum(status().as_enum().unwrap()).unwrap());
        let right = Expr::convert(active.clone(), int_opt);

        let (l, r) = normalize_operands(&left, &right);
        assert_eq!(l.ty, TypeRef::nullable(status()));
        assert_eq!(r, active);

        let (l, r) = normalize_operands(&right, &left);
        assert_eq!(l, active);
        assert_eq!(r.ty, TypeRef::nullable(status()));
    }

    #[test]
    fn lifting_and_object_as_are_unwrapped() {
        let age = member("Age", TypeRef::Int32);
        let lifted = Expr::convert(age.clone(), TypeRef::nullable(TypeRef::Int32));
        let five = Expr::constant(Value::Int32(5), TypeRef::nullable(TypeRef::Int32));
        let (l, _) = normalize_operands(&lifted, &five);
        assert_eq!(l, age);

        let obj = member("Payload", TypeRef::Object);
        let as_string = Expr::type_as(obj.clone(), TypeRef::String);
        let text = Expr::value(Value::String("a".into()));
        let (l, _) = normalize_operands(&as_string, &text);
        assert_eq!(l, obj);

        let null = Expr::null(TypeRef::String);
        let (l, _) = normalize_operands(&as_string, &null);
        assert_eq!(l, as_string);
    }

    #[test]
    fn comparison_op_is_irrelevant_to_cleanup() {
        let e = Expr::binary(
            BinaryOp::Lt,
            member("Age", TypeRef::Int32),
            Expr::value(Value::Int32(3)),
        );
        if let ExprKind::Binary { left, right, .. } = &e.kind {
            let (l, r) = normalize_operands(left, right);
            assert_eq!(&l, left.as_ref());
            assert_eq!(&r, right.as_ref());
        }
    }
}
