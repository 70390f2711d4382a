use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::signature::Signature;
use crate::types::TypeRef;
use crate::value::Value;

mod display;

pub use display::format_expr;

// ---------------------------------------------------------------------------
// Typed expression tree
// ---------------------------------------------------------------------------

/// A typed expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        if_true: Box<Expr>,
        if_false: Box<Expr>,
    },
    Constant(Value),
    /// Property or field access. `target` is `None` for static members.
    Member {
        target: Option<Box<Expr>>,
        member: Signature,
    },
    /// Method call. `target` is `None` for static methods.
    Call {
        method: Signature,
        target: Option<Box<Expr>>,
        args: Vec<Expr>,
    },
    Lambda(Lambda),
    Parameter(Param),
    /// `operand is target`
    TypeIs {
        operand: Box<Expr>,
        target: TypeRef,
    },
    NewArray(Vec<Expr>),
    /// Object construction. Representable, never translatable.
    New {
        type_name: String,
        args: Vec<Expr>,
    },
    /// Collection initializer. Representable, never translatable.
    ListInit {
        type_name: String,
        items: Vec<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    And,
    Or,
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    Xor,
    Coalesce,
    ArrayIndex,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Lt | BinaryOp::Le
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Negate,
    Convert,
    TypeAs,
    Quote,
    ArrayLength,
}

/// Node kind names used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Binary(BinaryOp),
    Unary(UnaryOp),
    Conditional,
    Constant,
    Member,
    Call,
    Lambda,
    Parameter,
    TypeIs,
    NewArray,
    New,
    ListInit,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Binary(op) => write!(f, "binary {op:?}"),
            NodeKind::Unary(op) => write!(f, "unary {op:?}"),
            NodeKind::Conditional => f.write_str("conditional"),
            NodeKind::Constant => f.write_str("constant"),
            NodeKind::Member => f.write_str("member access"),
            NodeKind::Call => f.write_str("method call"),
            NodeKind::Lambda => f.write_str("lambda"),
            NodeKind::Parameter => f.write_str("parameter"),
            NodeKind::TypeIs => f.write_str("type test"),
            NodeKind::NewArray => f.write_str("new array"),
            NodeKind::New => f.write_str("new"),
            NodeKind::ListInit => f.write_str("list init"),
        }
    }
}

// ---------------------------------------------------------------------------
// Lambdas and parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub params: Vec<Param>,
    pub body: Box<Expr>,
}

static NEXT_PARAM_ID: AtomicU64 = AtomicU64::new(1);

/// A lambda parameter. Each `Param::new` yields a distinct identity; clones
/// share it, so two parameters with the same name never alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Param {
    pub name: Arc<str>,
    pub ty: TypeRef,
    id: u64,
}

impl Param {
    pub fn new(name: &str, ty: TypeRef) -> Self {
        Self {
            name: Arc::from(name),
            ty,
            id: NEXT_PARAM_ID.fetch_add(1, Ordering::Relaxed),
        }
    }
}

// ---------------------------------------------------------------------------
// Construction helpers
// ---------------------------------------------------------------------------

impl Expr {
    pub fn new(kind: ExprKind, ty: TypeRef) -> Self {
        Self { kind, ty }
    }

    pub fn constant(value: Value, ty: TypeRef) -> Self {
        Self::new(ExprKind::Constant(value), ty)
    }

    /// Constant typed after its own value.
    pub fn value(value: Value) -> Self {
        let ty = value.type_of();
        Self::constant(value, ty)
    }

    pub fn null(ty: TypeRef) -> Self {
        Self::constant(Value::Null, ty)
    }

    pub fn param(p: &Param) -> Self {
        Self::new(ExprKind::Parameter(p.clone()), p.ty.clone())
    }

    /// Property access; the signature owner follows the target's type.
    pub fn property(target: Expr, name: &str, ty: TypeRef) -> Self {
        let member = Signature::property(target.ty.signature_owner(), name.to_string());
        Self::member(Some(target), member, ty)
    }

    pub fn member(target: Option<Expr>, member: Signature, ty: TypeRef) -> Self {
        Self::new(
            ExprKind::Member {
                target: target.map(Box::new),
                member,
            },
            ty,
        )
    }

    pub fn call(method: Signature, target: Option<Expr>, args: Vec<Expr>, ty: TypeRef) -> Self {
        Self::new(
            ExprKind::Call {
                method,
                target: target.map(Box::new),
                args,
            },
            ty,
        )
    }

    /// Binary node; logical and comparison operators yield `bool`, the rest
    /// take the left operand's type.
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        let ty = if op.is_logical() || op.is_comparison() {
            TypeRef::Bool
        } else {
            left.ty.clone()
        };
        Self::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            ty,
        )
    }

    pub fn unary(op: UnaryOp, operand: Expr, ty: TypeRef) -> Self {
        Self::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            ty,
        )
    }

    pub fn not(operand: Expr) -> Self {
        Self::unary(UnaryOp::Not, operand, TypeRef::Bool)
    }

    pub fn convert(operand: Expr, ty: TypeRef) -> Self {
        Self::unary(UnaryOp::Convert, operand, ty)
    }

    pub fn type_as(operand: Expr, ty: TypeRef) -> Self {
        Self::unary(UnaryOp::TypeAs, operand, ty)
    }

    pub fn quote(lambda: Expr) -> Self {
        let ty = TypeRef::Quoted(Box::new(lambda.ty.clone()));
        Self::unary(UnaryOp::Quote, lambda, ty)
    }

    pub fn conditional(test: Expr, if_true: Expr, if_false: Expr) -> Self {
        let ty = if_true.ty.clone();
        Self::new(
            ExprKind::Conditional {
                test: Box::new(test),
                if_true: Box::new(if_true),
                if_false: Box::new(if_false),
            },
            ty,
        )
    }

    pub fn lambda(params: Vec<Param>, body: Expr) -> Self {
        let ty = TypeRef::function(
            params.iter().map(|p| p.ty.clone()).collect(),
            body.ty.clone(),
        );
        Self::new(
            ExprKind::Lambda(Lambda {
                params,
                body: Box::new(body),
            }),
            ty,
        )
    }

    pub fn type_is(operand: Expr, target: TypeRef) -> Self {
        Self::new(
            ExprKind::TypeIs {
                operand: Box::new(operand),
                target,
            },
            TypeRef::Bool,
        )
    }

    pub fn new_array(item_ty: TypeRef, items: Vec<Expr>) -> Self {
        Self::new(ExprKind::NewArray(items), TypeRef::array(item_ty))
    }

    // -- inspection ---------------------------------------------------------

    pub fn node_kind(&self) -> NodeKind {
        match &self.kind {
            ExprKind::Binary { op, .. } => NodeKind::Binary(*op),
            ExprKind::Unary { op, .. } => NodeKind::Unary(*op),
            ExprKind::Conditional { .. } => NodeKind::Conditional,
            ExprKind::Constant(_) => NodeKind::Constant,
            ExprKind::Member { .. } => NodeKind::Member,
            ExprKind::Call { .. } => NodeKind::Call,
            ExprKind::Lambda(_) => NodeKind::Lambda,
            ExprKind::Parameter(_) => NodeKind::Parameter,
            ExprKind::TypeIs { .. } => NodeKind::TypeIs,
            ExprKind::NewArray(_) => NodeKind::NewArray,
            ExprKind::New { .. } => NodeKind::New,
            ExprKind::ListInit { .. } => NodeKind::ListInit,
        }
    }

    pub fn as_constant(&self) -> Option<&Value> {
        match &self.kind {
            ExprKind::Constant(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self.kind, ExprKind::Constant(_))
    }

    pub fn is_null_constant(&self) -> bool {
        matches!(self.kind, ExprKind::Constant(Value::Null))
    }

    pub fn is_param(&self, p: &Param) -> bool {
        matches!(&self.kind, ExprKind::Parameter(q) if q == p)
    }

    /// Operand of a unary node with the given operator.
    pub fn unary_operand(&self, op: UnaryOp) -> Option<&Expr> {
        match &self.kind {
            ExprKind::Unary { op: o, operand } if *o == op => Some(operand),
            _ => None,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_expr(self))
    }
}

#[cfg(test)]
mod tests;
