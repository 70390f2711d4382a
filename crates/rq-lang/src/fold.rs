use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::expr::{BinaryOp, Expr, ExprKind, Lambda};
use crate::mapping::string_concat;
use crate::signature::{ParamShape, Signature};
use crate::types::TypeRef;
use crate::value::Value;

/// Why a fold was abandoned. Never escapes the evaluator: the original
/// sub-expression is kept instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FoldError {
    #[error("arithmetic overflow")]
    Overflow,
    #[error("division by zero")]
    DivideByZero,
    #[error("argument out of range: {0}")]
    OutOfRange(String),
    #[error("unexpected operand {0}")]
    BadOperand(String),
}

/// Evaluates a pure method or property: receiver (if any), then arguments.
pub type PureFn = Arc<dyn Fn(Option<&Value>, &[Value]) -> Result<Value, FoldError> + Send + Sync>;

/// Pre-pass replacing captured variables with their values and folding
/// constant sub-expressions.
#[derive(Clone)]
pub struct ClosureEvaluator {
    functions: HashMap<Signature, PureFn>,
    fold_constants: bool,
}

impl fmt::Debug for ClosureEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClosureEvaluator")
            .field("functions", &self.functions.len())
            .field("fold_constants", &self.fold_constants)
            .finish()
    }
}

impl Default for ClosureEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl ClosureEvaluator {
    /// Evaluator with the built-in string and math functions.
    pub fn new() -> Self {
        let mut ev = Self::empty();
        register_builtins(&mut ev);
        ev
    }

    /// Evaluator that only resolves captured variables and folds operators.
    pub fn empty() -> Self {
        Self {
            functions: HashMap::new(),
            fold_constants: true,
        }
    }

    /// Register a pure function under `sig`.
    pub fn with_function<F>(mut self, sig: Signature, f: F) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> Result<Value, FoldError> + Send + Sync + 'static,
    {
        self.register(sig, f);
        self
    }

    /// When disabled only captured variables are substituted.
    pub fn with_constant_folding(mut self, enabled: bool) -> Self {
        self.fold_constants = enabled;
        self
    }

    fn register<F>(&mut self, sig: Signature, f: F)
    where
        F: Fn(Option<&Value>, &[Value]) -> Result<Value, FoldError> + Send + Sync + 'static,
    {
        self.functions.insert(sig, Arc::new(f));
    }

    pub fn is_pure(&self, sig: &Signature) -> bool {
        self.functions.contains_key(sig)
    }

    /// Equivalent tree with captured values inlined and constant parts folded.
    pub fn evaluate(&self, expr: &Expr) -> Expr {
        match &expr.kind {
            ExprKind::Member { target, member } => {
                let target = target.as_ref().map(|t| self.evaluate(t));
                if let Some(Expr {
                    kind: ExprKind::Constant(value),
                    ..
                }) = &target
                {
                    if let Value::Record(record) = value
                        && let Some(field) = record.get(&member.name)
                    {
                        return Expr::constant(field.clone(), expr.ty.clone());
                    }
                    if let Some(folded) = self.apply_pure(member, Some(value), &[], expr) {
                        return folded;
                    }
                }
                Expr::member(target, member.clone(), expr.ty.clone())
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.evaluate(left);
                let right = self.evaluate(right);
                if *op == BinaryOp::Add
                    && left.ty == TypeRef::String
                    && right.ty == TypeRef::String
                {
                    let concat = Expr::call(string_concat(), None, vec![left, right], TypeRef::String);
                    return self.evaluate(&concat);
                }
                if self.fold_constants
                    && let (Some(l), Some(r)) = (left.as_constant(), right.as_constant())
                    && left.ty == right.ty
                {
                    match fold_binary(*op, l, r) {
                        Ok(Some(value)) => return Expr::constant(value, expr.ty.clone()),
                        Ok(None) => {}
                        Err(e) => {
                            rq_debug!(fold, node = %expr, error = %e, "fold abandoned");
                        }
                    }
                }
                Expr::new(
                    ExprKind::Binary {
                        op: *op,
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    expr.ty.clone(),
                )
            }
            ExprKind::Call {
                method,
                target,
                args,
            } => {
                let target = target.as_ref().map(|t| self.evaluate(t));
                let args: Vec<Expr> = args.iter().map(|a| self.evaluate(a)).collect();
                let receiver = match &target {
                    Some(t) => t.as_constant().map(Some),
                    None => Some(None),
                };
                let values: Option<Vec<Value>> =
                    args.iter().map(|a| a.as_constant().cloned()).collect();
                if let (Some(receiver), Some(values)) = (receiver, values)
                    && let Some(folded) = self.apply_pure(method, receiver, &values, expr)
                {
                    return folded;
                }
                Expr::call(method.clone(), target, args, expr.ty.clone())
            }
            ExprKind::Unary { op, operand } => {
                Expr::unary(*op, self.evaluate(operand), expr.ty.clone())
            }
            ExprKind::Conditional {
                test,
                if_true,
                if_false,
            } => Expr::new(
                ExprKind::Conditional {
                    test: Box::new(self.evaluate(test)),
                    if_true: Box::new(self.evaluate(if_true)),
                    if_false: Box::new(self.evaluate(if_false)),
                },
                expr.ty.clone(),
            ),
            ExprKind::Lambda(lambda) => Expr::new(
                ExprKind::Lambda(Lambda {
                    params: lambda.params.clone(),
                    body: Box::new(self.evaluate(&lambda.body)),
                }),
                expr.ty.clone(),
            ),
            ExprKind::TypeIs { operand, target } => Expr::new(
                ExprKind::TypeIs {
                    operand: Box::new(self.evaluate(operand)),
                    target: target.clone(),
                },
                expr.ty.clone(),
            ),
            ExprKind::NewArray(items) => Expr::new(
                ExprKind::NewArray(items.iter().map(|i| self.evaluate(i)).collect()),
                expr.ty.clone(),
            ),
            ExprKind::Constant(_)
            | ExprKind::Parameter(_)
            | ExprKind::New { .. }
            | ExprKind::ListInit { .. } => expr.clone(),
        }
    }

    fn apply_pure(
        &self,
        sig: &Signature,
        receiver: Option<&Value>,
        args: &[Value],
        node: &Expr,
    ) -> Option<Expr> {
        if !self.fold_constants {
            return None;
        }
        let f = self.functions.get(sig)?;
        match f(receiver, args) {
            Ok(value) => Some(Expr::constant(value, node.ty.clone())),
            Err(e) => {
                rq_debug!(fold, node = %node, error = %e, "fold abandoned");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

/// Folds arithmetic and comparison on Int32, Int64 and Decimal. `Ok(None)`
/// means the pair is not foldable.
fn fold_binary(op: BinaryOp, l: &Value, r: &Value) -> Result<Option<Value>, FoldError> {
    match (l, r) {
        (Value::Int32(a), Value::Int32(b)) => fold_ints(op, *a, *b, Value::Int32),
        (Value::Int64(a), Value::Int64(b)) => fold_ints(op, *a, *b, Value::Int64),
        (Value::Decimal(a), Value::Decimal(b)) => fold_decimals(op, *a, *b),
        _ => Ok(None),
    }
}

trait CheckedInt: Copy + Ord + Default {
    fn add(self, o: Self) -> Option<Self>;
    fn sub(self, o: Self) -> Option<Self>;
    fn mul(self, o: Self) -> Option<Self>;
    fn div(self, o: Self) -> Option<Self>;
    fn rem(self, o: Self) -> Option<Self>;
}

macro_rules! checked_int {
    ($($t:ty),*) => {$(
        impl CheckedInt for $t {
            fn add(self, o: Self) -> Option<Self> { self.checked_add(o) }
            fn sub(self, o: Self) -> Option<Self> { self.checked_sub(o) }
            fn mul(self, o: Self) -> Option<Self> { self.checked_mul(o) }
            fn div(self, o: Self) -> Option<Self> { self.checked_div(o) }
            fn rem(self, o: Self) -> Option<Self> { self.checked_rem(o) }
        }
    )*};
}

checked_int!(i32, i64);

fn fold_ints<T: CheckedInt>(
    op: BinaryOp,
    a: T,
    b: T,
    wrap: fn(T) -> Value,
) -> Result<Option<Value>, FoldError> {
    if matches!(op, BinaryOp::Div | BinaryOp::Mod) && b == T::default() {
        return Err(FoldError::DivideByZero);
    }
    let arith = match op {
        BinaryOp::Add => a.add(b),
        BinaryOp::Sub => a.sub(b),
        BinaryOp::Mul => a.mul(b),
        BinaryOp::Div => a.div(b),
        BinaryOp::Mod => a.rem(b),
        _ => return Ok(compare(op, a.cmp(&b))),
    };
    arith.map(|v| Some(wrap(v))).ok_or(FoldError::Overflow)
}

fn fold_decimals(op: BinaryOp, a: Decimal, b: Decimal) -> Result<Option<Value>, FoldError> {
    if matches!(op, BinaryOp::Div | BinaryOp::Mod) && b.is_zero() {
        return Err(FoldError::DivideByZero);
    }
    let arith = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div => a.checked_div(b),
        BinaryOp::Mod => a.checked_rem(b),
        _ => return Ok(compare(op, a.cmp(&b))),
    };
    arith
        .map(|v| Some(Value::Decimal(v)))
        .ok_or(FoldError::Overflow)
}

fn compare(op: BinaryOp, ord: std::cmp::Ordering) -> Option<Value> {
    let b = match op {
        BinaryOp::Eq => ord.is_eq(),
        BinaryOp::Ne => ord.is_ne(),
        BinaryOp::Gt => ord.is_gt(),
        BinaryOp::Ge => ord.is_ge(),
        BinaryOp::Lt => ord.is_lt(),
        BinaryOp::Le => ord.is_le(),
        _ => return None,
    };
    Some(Value::Bool(b))
}

// ---------------------------------------------------------------------------
// Built-in pure functions
// ---------------------------------------------------------------------------

fn text(v: Option<&Value>) -> Result<&str, FoldError> {
    match v {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(FoldError::BadOperand(other.to_string())),
        None => Err(FoldError::BadOperand("null".into())),
    }
}

fn index(v: Option<&Value>) -> Result<usize, FoldError> {
    match v {
        Some(Value::Int32(i)) => {
            usize::try_from(*i).map_err(|_| FoldError::OutOfRange(format!("index {i}")))
        }
        Some(other) => Err(FoldError::BadOperand(other.to_string())),
        None => Err(FoldError::BadOperand("null".into())),
    }
}

fn substring(s: &str, start: usize, len: Option<usize>) -> Result<Value, FoldError> {
    let chars: Vec<char> = s.chars().collect();
    let end = match len {
        Some(len) => start.checked_add(len).ok_or(FoldError::Overflow)?,
        None => chars.len(),
    };
    if start > chars.len() || end > chars.len() {
        return Err(FoldError::OutOfRange(format!(
            "substring {start}..{end} of {} chars",
            chars.len()
        )));
    }
    Ok(Value::String(chars[start..end].iter().collect()))
}

fn register_builtins(ev: &mut ClosureEvaluator) {
    use ParamShape as P;

    let string = |name: &'static str, params: Vec<ParamShape>| Signature::method("string", name, params);

    ev.register(Signature::property("string", "Length"), |s, _| {
        let n = text(s)?.chars().count();
        i32::try_from(n)
            .map(Value::Int32)
            .map_err(|_| FoldError::Overflow)
    });
    ev.register(string("ToLower", vec![]), |s, _| {
        Ok(Value::String(text(s)?.to_lowercase()))
    });
    ev.register(string("ToUpper", vec![]), |s, _| {
        Ok(Value::String(text(s)?.to_uppercase()))
    });
    ev.register(string("Trim", vec![]), |s, _| {
        Ok(Value::String(text(s)?.trim().to_string()))
    });
    ev.register(string("StartsWith", vec![P::String]), |s, a| {
        Ok(Value::Bool(text(s)?.starts_with(text(a.first())?)))
    });
    ev.register(string("EndsWith", vec![P::String]), |s, a| {
        Ok(Value::Bool(text(s)?.ends_with(text(a.first())?)))
    });
    ev.register(string("Contains", vec![P::String]), |s, a| {
        Ok(Value::Bool(text(s)?.contains(text(a.first())?)))
    });
    ev.register(string("IndexOf", vec![P::String]), |s, a| {
        let s = text(s)?;
        let pos = s
            .find(text(a.first())?)
            .map(|byte| s[..byte].chars().count() as i64)
            .unwrap_or(-1);
        i32::try_from(pos)
            .map(Value::Int32)
            .map_err(|_| FoldError::Overflow)
    });
    ev.register(string("Substring", vec![P::Int32]), |s, a| {
        substring(text(s)?, index(a.first())?, None)
    });
    ev.register(string("Substring", vec![P::Int32, P::Int32]), |s, a| {
        substring(text(s)?, index(a.first())?, Some(index(a.get(1))?))
    });
    ev.register(string("Replace", vec![P::String, P::String]), |s, a| {
        let from = text(a.first())?;
        if from.is_empty() {
            return Err(FoldError::OutOfRange("empty search string".into()));
        }
        Ok(Value::String(text(s)?.replace(from, text(a.get(1))?)))
    });
    ev.register(string_concat(), |_, a| {
        let mut out = String::new();
        for v in a {
            match v {
                Value::Null => {}
                Value::String(s) => out.push_str(s),
                other => return Err(FoldError::BadOperand(other.to_string())),
            }
        }
        Ok(Value::String(out))
    });

    for p in [P::Double, P::Decimal] {
        ev.register(
            Signature::static_method("math", "Round", vec![p.clone()]),
            |_, a| round_with(a, f64::round_ties_even, |d| d.round()),
        );
        ev.register(
            Signature::static_method("math", "Floor", vec![p.clone()]),
            |_, a| round_with(a, f64::floor, |d| d.floor()),
        );
        ev.register(
            Signature::static_method("math", "Ceiling", vec![p]),
            |_, a| round_with(a, f64::ceil, |d| d.ceil()),
        );
    }
}

fn round_with(
    args: &[Value],
    on_double: fn(f64) -> f64,
    on_decimal: fn(&Decimal) -> Decimal,
) -> Result<Value, FoldError> {
    match args.first() {
        Some(Value::Double(v)) => Ok(Value::Double(on_double(*v))),
        Some(Value::Decimal(d)) => Ok(Value::Decimal(on_decimal(d))),
        Some(other) => Err(FoldError::BadOperand(other.to_string())),
        None => Err(FoldError::BadOperand("missing argument".into())),
    }
}
