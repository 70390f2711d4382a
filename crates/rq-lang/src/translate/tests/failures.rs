use super::*;
use crate::expr::{NodeKind, UnaryOp};

#[test]
fn multi_parameter_lambda() {
    let a = Param::new("a", critter());
    let b = Param::new("b", critter());
    let body = bin(
        BinaryOp::Eq,
        prop(&Expr::param(&a), "Name", TypeRef::String),
        prop(&Expr::param(&b), "Name", TypeRef::String),
    );
    let l = Expr::lambda(vec![a, b], body);
    let err = try_translate(&l).unwrap_err();
    match &err {
        TranslateError::UnsupportedConstruct { kind, node, reason } => {
            assert_eq!(*kind, NodeKind::Lambda);
            assert!(node.starts_with("(a, b) =>"), "node: {node}");
            assert_eq!(reason, "only one parameter supported");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.to_string().contains("lambda"));
}

#[test]
fn nested_multi_parameter_lambda() {
    let item = TypeRef::complex("Item");
    let l = lambda(|x| {
        let i = Param::new("i", item.clone());
        let j = Param::new("j", TypeRef::Int32);
        seq_call(
            "Any",
            vec![ParamShape::Sequence, ParamShape::Predicate],
            vec![
                prop(x, "Items", TypeRef::list(item.clone())),
                Expr::lambda(vec![i, j], Expr::value(Value::Bool(true))),
            ],
            TypeRef::Bool,
        )
    });
    assert_unsupported(&l, "only one parameter supported");
}

#[test]
fn unknown_method_names_declaring_type() {
    let l = lambda(|x| {
        Expr::call(
            Signature::method("Critter", "Frobnicate", vec![]),
            Some(x.clone()),
            vec![],
            TypeRef::Bool,
        )
    });
    assert_unsupported(
        &l,
        "don't know what to do with method Frobnicate declared in Critter",
    );
}

#[test]
fn negation_is_unsupported() {
    let l = lambda(|x| {
        bin(
            BinaryOp::Gt,
            Expr::unary(UnaryOp::Negate, prop(x, "Age", TypeRef::Int32), TypeRef::Int32),
            int(0),
        )
    });
    assert_unsupported(&l, "Negate");
}

#[test]
fn stray_quote_is_unsupported() {
    let l = lambda(|x| {
        let inner = Param::new("y", critter());
        bin(
            BinaryOp::Eq,
            prop(x, "Name", TypeRef::String),
            Expr::quote(Expr::lambda(vec![inner], string("a"))),
        )
    });
    assert_unsupported(&l, "Quote");
}

#[test]
fn object_construction_is_unsupported() {
    let l = lambda(|x| {
        bin(
            BinaryOp::Eq,
            prop(x, "Friend", critter()),
            Expr::new(
                crate::expr::ExprKind::New {
                    type_name: "Critter".into(),
                    args: vec![],
                },
                critter(),
            ),
        )
    });
    assert_unsupported(&l, "object construction not supported");
}

#[test]
fn unmapped_binary_operator() {
    let l = lambda(|x| {
        bin(
            BinaryOp::Eq,
            bin(
                BinaryOp::Coalesce,
                prop(x, "Nick", TypeRef::String),
                string("none"),
            ),
            string("bob"),
        )
    });
    assert_unsupported(&l, "binary operator Coalesce not supported");
}

#[test]
fn int64_literal_is_malformed() {
    let l = lambda(|x| {
        bin(
            BinaryOp::Gt,
            prop(x, "Serial", TypeRef::Int64),
            Expr::value(Value::Int64(5)),
        )
    });
    let err = try_translate(&l).unwrap_err();
    assert!(
        matches!(&err, TranslateError::MalformedLiteral { type_name, .. } if type_name == "int64"),
        "{err}"
    );
}

#[test]
fn unresolvable_type_name() {
    let l = lambda(|x| Expr::type_is(prop(x, "Friend", critter()), TypeRef::list(critter())));
    let err = try_translate(&l).unwrap_err();
    assert_eq!(
        err,
        TranslateError::AmbiguousTypeResolution {
            type_name: "list<Critter>".into()
        }
    );
}

#[test]
fn failure_deep_in_tree_fails_whole_translation() {
    let l = lambda(|x| {
        bin(
            BinaryOp::And,
            bin(BinaryOp::Gt, prop(x, "Age", TypeRef::Int32), int(18)),
            bin(
                BinaryOp::Or,
                bin(BinaryOp::Eq, prop(x, "Name", TypeRef::String), string("bob")),
                Expr::not(Expr::unary(
                    UnaryOp::ArrayLength,
                    prop(x, "Tags", TypeRef::array(TypeRef::String)),
                    TypeRef::Int32,
                )),
            ),
        )
    });
    assert_unsupported(&l, "ArrayLength");
}

#[test]
fn first_failure_is_reported() {
    let l = lambda(|x| {
        bin(
            BinaryOp::And,
            Expr::call(
                Signature::method("Critter", "First", vec![]),
                Some(x.clone()),
                vec![],
                TypeRef::Bool,
            ),
            Expr::call(
                Signature::method("Critter", "Second", vec![]),
                Some(x.clone()),
                vec![],
                TypeRef::Bool,
            ),
        )
    });
    assert_unsupported(&l, "method First declared in Critter");
}

#[test]
fn mapped_property_without_receiver() {
    let l = lambda(|_| {
        bin(
            BinaryOp::Gt,
            Expr::member(None, Signature::property("string", "Length"), TypeRef::Int32),
            int(3),
        )
    });
    let err = try_translate(&l).unwrap_err();
    assert!(
        matches!(err, TranslateError::UnsupportedConstruct { .. }),
        "{err:?}"
    );
    assert!(err.to_string().contains("string.Length expects 1 operands, got 0"), "{err}");
}

#[test]
fn mapped_call_with_missing_arguments() {
    let l = lambda(|_| seq_call("Any", vec![ParamShape::Sequence], vec![], TypeRef::Bool));
    assert_unsupported(&l, "enumerable.Any expects 1 operands, got 0");

    let l = lambda(|x| {
        Expr::call(
            Signature::method("string", "StartsWith", vec![ParamShape::String]),
            Some(prop(x, "Name", TypeRef::String)),
            vec![],
            TypeRef::Bool,
        )
    });
    assert_unsupported(&l, "string.StartsWith expects 2 operands, got 1");
}
