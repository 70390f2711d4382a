use super::*;
use crate::expr::ExprKind;
use crate::mapping::binary_token;

fn num(x: &Expr, name: &str) -> Expr {
    prop(x, name, TypeRef::Int32)
}

#[test]
fn arithmetic_grouping() {
    let l = lambda(|x| {
        bin(
            BinaryOp::Gt,
            bin(
                BinaryOp::Mul,
                bin(BinaryOp::Add, num(x, "A"), num(x, "B")),
                num(x, "C"),
            ),
            int(10),
        )
    });
    assert_eq!(translate(&l), "(a add b) mul c gt 10");

    let l = lambda(|x| {
        bin(
            BinaryOp::Eq,
            bin(
                BinaryOp::Sub,
                num(x, "A"),
                bin(BinaryOp::Sub, num(x, "B"), num(x, "C")),
            ),
            int(0),
        )
    });
    assert_eq!(translate(&l), "a sub (b sub c) eq 0");
}

#[test]
fn modulo_binds_tighter_than_comparison() {
    let l = lambda(|x| {
        bin(
            BinaryOp::Eq,
            bin(BinaryOp::Mod, num(x, "A"), int(2)),
            int(0),
        )
    });
    assert_eq!(translate(&l), "a mod 2 eq 0");
}

#[test]
fn logical_grouping() {
    let flag = |x: &Expr, n: &str| prop(x, n, TypeRef::Bool);
    let l = lambda(|x| {
        bin(
            BinaryOp::Or,
            flag(x, "A"),
            bin(BinaryOp::And, flag(x, "B"), flag(x, "C")),
        )
    });
    assert_eq!(translate(&l), "a or b and c");

    let l = lambda(|x| {
        bin(
            BinaryOp::And,
            bin(BinaryOp::Or, flag(x, "A"), flag(x, "B")),
            flag(x, "C"),
        )
    });
    assert_eq!(translate(&l), "(a or b) and c");
}

#[test]
fn comparing_comparisons() {
    let l = lambda(|x| {
        bin(
            BinaryOp::Eq,
            bin(BinaryOp::Gt, num(x, "A"), int(1)),
            bin(BinaryOp::Gt, num(x, "B"), int(2)),
        )
    });
    assert_eq!(translate(&l), "(a gt 1) eq (b gt 2)");
}

#[test]
fn not_wraps_operand() {
    let l = lambda(|x| Expr::not(bin(BinaryOp::Gt, num(x, "A"), int(1))));
    assert_eq!(translate(&l), "not (a gt 1)");
}

#[test]
fn conditional_arguments_need_no_parens() {
    let l = lambda(|x| {
        bin(
            BinaryOp::Gt,
            Expr::conditional(
                prop(x, "Flag", TypeRef::Bool),
                bin(BinaryOp::Add, num(x, "A"), int(1)),
                num(x, "B"),
            ),
            int(3),
        )
    });
    assert_eq!(translate(&l), "iif(flag,a add 1,b) gt 3");
}

// ---------------------------------------------------------------------------
// Precedence safety: re-parsing the output by textual precedence must give
// back the original tree, and no emitted parenthesis is redundant.
// ---------------------------------------------------------------------------

const OPS: [BinaryOp; 8] = [
    BinaryOp::Or,
    BinaryOp::And,
    BinaryOp::Eq,
    BinaryOp::Gt,
    BinaryOp::Add,
    BinaryOp::Sub,
    BinaryOp::Mul,
    BinaryOp::Div,
];

fn token_precedence(token: &str) -> Option<u8> {
    Some(match token {
        "or" => 1,
        "and" => 2,
        "eq" | "ne" | "gt" | "ge" | "lt" | "le" => 3,
        "add" | "sub" => 4,
        "mul" | "div" | "mod" => 5,
        _ => return None,
    })
}

fn tokenize(text: &str) -> Vec<String> {
    text.replace('(', " ( ")
        .replace(')', " ) ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn parse_primary(tokens: &[String], pos: &mut usize) -> Option<String> {
    let tok = tokens[*pos].clone();
    *pos += 1;
    if tok == "(" {
        let inner = parse_climb(tokens, pos, 1)?;
        assert_eq!(tokens[*pos], ")");
        *pos += 1;
        Some(inner)
    } else {
        Some(tok)
    }
}

/// Precedence climbing; comparisons do not chain, so `a eq b eq c` has no
/// parse.
fn parse_climb(tokens: &[String], pos: &mut usize, min: u8) -> Option<String> {
    let mut lhs = parse_primary(tokens, pos)?;
    let mut compared = false;
    while let Some(tok) = tokens.get(*pos) {
        let Some(p) = token_precedence(tok) else {
            break;
        };
        if p < min {
            break;
        }
        if p == 3 {
            if compared {
                return None;
            }
            compared = true;
        }
        let op = tok.clone();
        *pos += 1;
        let rhs = parse_climb(tokens, pos, p + 1)?;
        lhs = format!("({op} {lhs} {rhs})");
    }
    Some(lhs)
}

fn reparse(text: &str) -> Option<String> {
    let tokens = tokenize(text);
    let mut pos = 0;
    let tree = parse_climb(&tokens, &mut pos, 1)?;
    assert_eq!(pos, tokens.len(), "trailing tokens in {text}");
    Some(tree)
}

fn shape(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Binary { op, left, right } => {
            let (token, _) = binary_token(*op).unwrap();
            format!("({token} {} {})", shape(left), shape(right))
        }
        ExprKind::Member { member, .. } => crate::names::to_camel_case(&member.name),
        other => panic!("unexpected node {other:?}"),
    }
}

#[test]
fn reparse_matches_tree_for_all_two_level_shapes() {
    for outer in OPS {
        for inner in OPS {
            for nested_right in [false, true] {
                let x = Param::new("x", critter());
                let this = Expr::param(&x);
                let leaf = |n: &str| num(&this, n);
                let body = if nested_right {
                    bin(outer, leaf("A"), bin(inner, leaf("B"), leaf("C")))
                } else {
                    bin(outer, bin(inner, leaf("A"), leaf("B")), leaf("C"))
                };
                let expected = shape(&body);
                let text = translate(&Expr::lambda(vec![x], body));
                assert_eq!(reparse(&text), Some(expected.clone()), "output `{text}`");

                if text.contains('(') {
                    let bare = text.replace(['(', ')'], "");
                    assert_ne!(
                        reparse(&bare),
                        Some(expected),
                        "redundant parentheses in `{text}`"
                    );
                }
            }
        }
    }
}
