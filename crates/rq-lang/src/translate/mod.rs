mod binary;
mod calls;

use crate::error::TranslateError;
use crate::expr::{Expr, ExprKind, Lambda, Param, UnaryOp};
use crate::fold::ClosureEvaluator;
use crate::mapping::binary_token;
use crate::names::{NameResolver, type_literal};
use crate::segment::{Precedence, Segment};
use crate::types::TypeRef;

/// Translate a single-parameter lambda into query text.
pub fn translate_predicate(
    lambda: &Expr,
    names: &dyn NameResolver,
    evaluator: &ClosureEvaluator,
) -> Result<String, TranslateError> {
    let text = Translator::new(names, evaluator)
        .translate_lambda(lambda)
        .finalize()?;
    rq_trace!(xlat, predicate = %lambda, output = %text, "predicate translated");
    Ok(text)
}

// ---------------------------------------------------------------------------
// Visitor
// ---------------------------------------------------------------------------

/// Compiles typed expression nodes into query segments.
///
/// A translator is immutable; nested lambdas are compiled by a fresh child
/// that inherits the root parameter.
pub struct Translator<'a> {
    names: &'a dyn NameResolver,
    evaluator: &'a ClosureEvaluator,
    this: Option<Param>,
}

impl<'a> Translator<'a> {
    pub fn new(names: &'a dyn NameResolver, evaluator: &'a ClosureEvaluator) -> Self {
        Self {
            names,
            evaluator,
            this: None,
        }
    }

    fn child(&self, this: Option<Param>) -> Translator<'a> {
        Translator {
            names: self.names,
            evaluator: self.evaluator,
            this,
        }
    }

    /// Root entry: runs the closure evaluator, binds `this` when not yet
    /// bound and compiles the body.
    pub fn translate_lambda(&self, expr: &Expr) -> Segment {
        let ExprKind::Lambda(lambda) = &expr.kind else {
            return self.translate(expr);
        };
        let [param] = lambda.params.as_slice() else {
            return unsupported(expr, "only one parameter supported");
        };
        let evaluated = self.evaluator.evaluate(&lambda.body);
        let this = self.this.clone().or_else(|| Some(param.clone()));
        self.child(this).translate(&evaluated)
    }

    /// One case per node kind.
    pub fn translate(&self, expr: &Expr) -> Segment {
        match &expr.kind {
            ExprKind::Binary { op, left, right } => self.binary(expr, *op, left, right),
            ExprKind::Unary { op, operand } => self.unary(expr, *op, operand),
            ExprKind::Conditional {
                test,
                if_true,
                if_false,
            } => Segment::formatted(
                "iif({0},{1},{2})",
                vec![
                    self.translate(test),
                    self.translate(if_true),
                    self.translate(if_false),
                ],
            ),
            ExprKind::Constant(value) => {
                match crate::encode::encode_constant(value, &expr.ty, self.names) {
                    Ok(text) => Segment::terminal(text),
                    Err(e) => Segment::unsupported(e),
                }
            }
            ExprKind::Member { target, member } => self.member(expr, target.as_deref(), member),
            ExprKind::Call {
                method,
                target,
                args,
            } => self.call(expr, method, target.as_deref(), args),
            ExprKind::Lambda(lambda) => self.nested_lambda(expr, lambda),
            ExprKind::Parameter(p) => {
                if self.is_this_param(p) {
                    Segment::terminal("this")
                } else {
                    Segment::terminal(p.name.to_string())
                }
            }
            ExprKind::TypeIs { operand, target } => self.type_is(operand, target),
            ExprKind::NewArray(items) => {
                let template = (0..items.len())
                    .map(|i| format!("{{{i}}}"))
                    .collect::<Vec<_>>()
                    .join(",");
                Segment::formatted(
                    format!("[{template}]"),
                    items.iter().map(|i| self.translate(i)).collect(),
                )
            }
            ExprKind::New { .. } => unsupported(expr, "object construction not supported server side"),
            ExprKind::ListInit { .. } => {
                unsupported(expr, "list initialisation not supported server side")
            }
        }
    }

    fn nested_lambda(&self, expr: &Expr, lambda: &Lambda) -> Segment {
        let [param] = lambda.params.as_slice() else {
            return unsupported(expr, "only one parameter supported");
        };
        let body = self.child(self.this.clone()).translate_lambda(expr);
        Segment::formatted(
            "{0}:{1}",
            vec![Segment::terminal(param.name.to_string()), body],
        )
    }

    fn binary(
        &self,
        expr: &Expr,
        op: crate::expr::BinaryOp,
        left: &Expr,
        right: &Expr,
    ) -> Segment {
        let Some((token, precedence)) = binary_token(op) else {
            return unsupported(expr, format!("binary operator {op:?} not supported"));
        };
        let (left, right) = binary::normalize_operands(left, right);
        Segment::infix(
            precedence,
            self.translate(&left),
            token,
            self.translate(&right),
        )
    }

    fn unary(&self, expr: &Expr, op: UnaryOp, operand: &Expr) -> Segment {
        match op {
            UnaryOp::Not => Segment::formatted("not ({0})", vec![self.translate(operand)]),
            UnaryOp::TypeAs => match type_literal(&expr.ty, self.names) {
                Ok(ty) => Segment::scope(
                    Precedence::TypeAs,
                    Segment::formatted(
                        "{0} as {1}",
                        vec![self.translate(operand), Segment::terminal(ty)],
                    ),
                ),
                Err(e) => Segment::unsupported(e),
            },
            UnaryOp::Convert => {
                if operand.ty.is_enum() {
                    return self.translate(operand);
                }
                let ty = match type_literal(&expr.ty, self.names) {
                    Ok(ty) => Segment::terminal(ty),
                    Err(e) => return Segment::unsupported(e),
                };
                if self.is_this(operand) {
                    Segment::formatted("cast({0})", vec![ty])
                } else {
                    Segment::formatted("cast({0},{1})", vec![self.translate(operand), ty])
                }
            }
            UnaryOp::Negate | UnaryOp::Quote | UnaryOp::ArrayLength => {
                unsupported(expr, format!("unary {op:?} not handled"))
            }
        }
    }

    fn type_is(&self, operand: &Expr, target: &TypeRef) -> Segment {
        let ty = match type_literal(target, self.names) {
            Ok(ty) => Segment::terminal(ty),
            Err(e) => return Segment::unsupported(e),
        };
        if self.is_this(operand) {
            Segment::formatted("isof({0})", vec![ty])
        } else {
            Segment::formatted("isof({0},{1})", vec![self.translate(operand), ty])
        }
    }

    fn is_this(&self, expr: &Expr) -> bool {
        matches!(&expr.kind, ExprKind::Parameter(p) if self.is_this_param(p))
    }

    fn is_this_param(&self, p: &Param) -> bool {
        self.this.as_ref() == Some(p)
    }
}

fn unsupported(expr: &Expr, reason: impl Into<String>) -> Segment {
    Segment::unsupported(TranslateError::unsupported(expr, reason))
}

#[cfg(test)]
mod tests;
