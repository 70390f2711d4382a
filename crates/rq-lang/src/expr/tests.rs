use super::*;

fn critter() -> Param {
    Param::new("x", TypeRef::complex("Critter"))
}

#[test]
fn params_with_same_name_are_distinct() {
    let a = Param::new("x", TypeRef::Int32);
    let b = Param::new("x", TypeRef::Int32);
    assert_ne!(a, b);
    assert!(Expr::param(&a).is_param(&a));
    assert!(!Expr::param(&a).is_param(&b));
    assert!(Expr::param(&a).is_param(&a.clone()));
}

#[test]
fn comparison_yields_bool() {
    let x = critter();
    let age = Expr::property(Expr::param(&x), "Age", TypeRef::Int32);
    let cmp = Expr::binary(BinaryOp::Gt, age.clone(), Expr::value(Value::Int32(18)));
    assert_eq!(cmp.ty, TypeRef::Bool);
    let sum = Expr::binary(BinaryOp::Add, age, Expr::value(Value::Int32(1)));
    assert_eq!(sum.ty, TypeRef::Int32);
}

#[test]
fn property_owner_follows_target_type() {
    let x = critter();
    let name = Expr::property(Expr::param(&x), "Name", TypeRef::String);
    let len = Expr::property(name, "Length", TypeRef::Int32);
    match &len.kind {
        ExprKind::Member { member, .. } => {
            assert_eq!(member.owner, "string");
            assert_eq!(member.name, "Length");
        }
        other => panic!("expected member, got {other:?}"),
    }
}

#[test]
fn format_lambda_for_diagnostics() {
    let x = critter();
    let age = Expr::property(Expr::param(&x), "Age", TypeRef::Int32);
    let body = Expr::binary(
        BinaryOp::And,
        Expr::binary(BinaryOp::Gt, age, Expr::value(Value::Int32(18))),
        Expr::not(Expr::value(Value::Bool(false))),
    );
    let lambda = Expr::lambda(vec![x], body);
    assert_eq!(lambda.to_string(), "x => (x.Age > 18) && !false");
}

#[test]
fn format_multi_param_lambda_and_cast() {
    let a = Param::new("a", TypeRef::Int32);
    let b = Param::new("b", TypeRef::Int32);
    let body = Expr::binary(
        BinaryOp::Eq,
        Expr::convert(Expr::param(&a), TypeRef::Int64),
        Expr::convert(Expr::param(&b), TypeRef::Int64),
    );
    let lambda = Expr::lambda(vec![a, b], body);
    assert_eq!(
        lambda.to_string(),
        "(a, b) => cast<int64>(a) == cast<int64>(b)"
    );
    assert_eq!(lambda.node_kind(), NodeKind::Lambda);
    assert_eq!(NodeKind::Lambda.to_string(), "lambda");
}

#[test]
fn unary_operand_matches_operator() {
    let c = Expr::convert(Expr::value(Value::Int32(1)), TypeRef::Int64);
    assert!(c.unary_operand(UnaryOp::Convert).is_some());
    assert!(c.unary_operand(UnaryOp::TypeAs).is_none());
    assert!(Expr::null(TypeRef::String).is_null_constant());
}
