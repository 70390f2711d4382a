use super::{BinaryOp, Expr, ExprKind, UnaryOp};

/// Source-like rendering of a node, used in diagnostics. Nested binaries are
/// always parenthesized so the shape is unambiguous.
pub fn format_expr(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Binary { op, left, right } => {
            if *op == BinaryOp::ArrayIndex {
                return format!("{}[{}]", format_expr(left), format_expr(right));
            }
            format!(
                "{} {} {}",
                operand(left),
                binary_symbol(*op),
                operand(right)
            )
        }
        ExprKind::Unary { op, operand: inner } => match op {
            UnaryOp::Not => format!("!{}", operand(inner)),
            UnaryOp::Negate => format!("-{}", operand(inner)),
            UnaryOp::Convert => format!("cast<{}>({})", expr.ty, format_expr(inner)),
            UnaryOp::TypeAs => format!("{} as {}", operand(inner), expr.ty),
            UnaryOp::Quote => format_expr(inner),
            UnaryOp::ArrayLength => format!("{}.length", operand(inner)),
        },
        ExprKind::Conditional {
            test,
            if_true,
            if_false,
        } => format!(
            "{} ? {} : {}",
            operand(test),
            operand(if_true),
            operand(if_false)
        ),
        ExprKind::Constant(v) => v.to_string(),
        ExprKind::Member { target, member } => match target {
            Some(t) => format!("{}.{}", operand(t), member.name),
            None => format!("{}.{}", member.owner, member.name),
        },
        ExprKind::Call {
            method,
            target,
            args,
        } => {
            let args = join(args);
            match target {
                Some(t) => format!("{}.{}({args})", operand(t), method.name),
                None => format!("{}.{}({args})", method.owner, method.name),
            }
        }
        ExprKind::Lambda(lambda) => {
            let body = format_expr(&lambda.body);
            match lambda.params.as_slice() {
                [p] => format!("{} => {body}", p.name),
                params => {
                    let names = params
                        .iter()
                        .map(|p| p.name.to_string())
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("({names}) => {body}")
                }
            }
        }
        ExprKind::Parameter(p) => p.name.to_string(),
        ExprKind::TypeIs { operand: inner, target } => {
            format!("{} is {target}", operand(inner))
        }
        ExprKind::NewArray(items) => format!("[{}]", join(items)),
        ExprKind::New { type_name, args } => format!("new {type_name}({})", join(args)),
        ExprKind::ListInit { type_name, items } => {
            format!("new {type_name} {{ {} }}", join(items))
        }
    }
}

fn operand(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Binary { op, .. } if *op != BinaryOp::ArrayIndex => {
            format!("({})", format_expr(expr))
        }
        ExprKind::Conditional { .. }
        | ExprKind::Lambda(_)
        | ExprKind::TypeIs { .. }
        | ExprKind::Unary {
            op: UnaryOp::TypeAs,
            ..
        } => format!("({})", format_expr(expr)),
        _ => format_expr(expr),
    }
}

fn join(items: &[Expr]) -> String {
    items.iter().map(format_expr).collect::<Vec<_>>().join(", ")
}

fn binary_symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::And => "&&",
        BinaryOp::Or => "||",
        BinaryOp::Eq => "==",
        BinaryOp::Ne => "!=",
        BinaryOp::Gt => ">",
        BinaryOp::Ge => ">=",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
        BinaryOp::BitAnd => "&",
        BinaryOp::BitOr => "|",
        BinaryOp::Xor => "^",
        BinaryOp::Coalesce => "??",
        BinaryOp::ArrayIndex => "[]",
    }
}
