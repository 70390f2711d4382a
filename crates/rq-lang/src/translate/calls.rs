use super::{Translator, unsupported};
use crate::expr::{Expr, UnaryOp};
use crate::mapping::{self, map_safe_get};
use crate::segment::Segment;
use crate::signature::Signature;
use crate::value::Value;

impl Translator<'_> {
    pub(super) fn member(&self, expr: &Expr, target: Option<&Expr>, member: &Signature) -> Segment {
        if let Some(mapping) = mapping::lookup(member) {
            let args = target.map(|t| vec![self.translate(t)]).unwrap_or_default();
            if args.len() != mapping.arity() {
                return arity_mismatch(expr, member, mapping.arity(), args.len());
            }
            return mapping.apply(args);
        }
        let Some(target) = target else {
            return unsupported(
                expr,
                format!("static member {} not supported", member.qualified_name()),
            );
        };
        let name = Segment::terminal(self.names.member_name(&member.owner, &member.name));
        if self.is_this(target) {
            name
        } else {
            Segment::formatted("{0}.{1}", vec![self.translate(target), name])
        }
    }

    pub(super) fn call(
        &self,
        expr: &Expr,
        method: &Signature,
        target: Option<&Expr>,
        args: &[Expr],
    ) -> Segment {
        if *method == map_safe_get()
            && let Some(target) = target
            && let Some(Value::String(key)) = args.first().and_then(Expr::as_constant)
            && is_symbol(key)
        {
            return Segment::formatted(
                "{0}.{1}",
                vec![self.translate(target), Segment::terminal(key.clone())],
            );
        }

        let Some(mapping) = mapping::lookup(method) else {
            return unsupported(
                expr,
                format!(
                    "don't know what to do with method {} declared in {}",
                    method.name, method.owner
                ),
            );
        };

        let unquote = method.enumerable_counterpart().is_some();
        let mut segments = Vec::with_capacity(args.len() + 1);
        if let Some(target) = target {
            segments.push(self.translate(target));
        }
        for arg in args {
            let arg = match arg.unary_operand(UnaryOp::Quote) {
                Some(inner) if unquote => inner,
                _ => arg,
            };
            segments.push(self.translate(arg));
        }
        if segments.len() != mapping.arity() {
            return arity_mismatch(expr, method, mapping.arity(), segments.len());
        }
        mapping.apply(segments)
    }
}

fn arity_mismatch(expr: &Expr, sig: &Signature, expected: usize, found: usize) -> Segment {
    unsupported(
        expr,
        format!(
            "{} expects {expected} operands, got {found}",
            sig.qualified_name()
        ),
    )
}

/// Non-empty, not starting with a digit, only `[A-Za-z0-9_]`.
fn is_symbol(text: &str) -> bool {
    text.chars()
        .next()
        .is_some_and(|c| !c.is_numeric())
        && text.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::is_symbol;

    #[test]
    fn symbol_keys() {
        assert!(is_symbol("color"));
        assert!(is_symbol("_x1"));
        assert!(!is_symbol("1st"));
        assert!(!is_symbol(""));
        assert!(!is_symbol("has space"));
        assert!(!is_symbol("dash-ed"));
    }
}
