use rust_decimal::Decimal;
use uuid::Uuid;

use crate::catalog::TypeExpr;
use crate::expr::BinaryOp;
use crate::value::DateTimeValue;

/// A parsed, untyped lambda: `x => body` or `(a, b) => body`.
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaSource {
    pub params: Vec<String>,
    pub body: SurfaceExpr,
}

/// Untyped expression as written in predicate text.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceExpr {
    Literal(Literal),
    /// Parameter or type name; which one is decided when binding.
    Ident(String),
    /// `@name`, a value supplied by the caller.
    Captured(String),
    Member {
        target: Box<SurfaceExpr>,
        name: String,
    },
    Call {
        target: Box<SurfaceExpr>,
        name: String,
        args: Vec<SurfaceExpr>,
    },
    /// `target[key]`
    Index {
        target: Box<SurfaceExpr>,
        key: Box<SurfaceExpr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<SurfaceExpr>,
        right: Box<SurfaceExpr>,
    },
    Not(Box<SurfaceExpr>),
    Negate(Box<SurfaceExpr>),
    Conditional {
        test: Box<SurfaceExpr>,
        if_true: Box<SurfaceExpr>,
        if_false: Box<SurfaceExpr>,
    },
    Is {
        operand: Box<SurfaceExpr>,
        ty: TypeExpr,
    },
    As {
        operand: Box<SurfaceExpr>,
        ty: TypeExpr,
    },
    /// `cast<T>(operand)`
    Cast {
        ty: TypeExpr,
        operand: Box<SurfaceExpr>,
    },
    Array(Vec<SurfaceExpr>),
    Lambda(Box<LambdaSource>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Unsuffixed integer; typed `int32` when it fits, else `int64`.
    Int(i64),
    /// `L` suffix.
    Long(i64),
    Double(f64),
    /// `f` suffix.
    Single(f32),
    /// `m` suffix.
    Decimal(Decimal),
    String(String),
    Char(char),
    Bool(bool),
    Null,
    DateTime(DateTimeValue),
    Guid(Uuid),
}

impl SurfaceExpr {
    pub fn binary(op: BinaryOp, left: SurfaceExpr, right: SurfaceExpr) -> Self {
        SurfaceExpr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn member(target: SurfaceExpr, name: &str) -> Self {
        SurfaceExpr::Member {
            target: Box::new(target),
            name: name.to_string(),
        }
    }

    pub fn ident(name: &str) -> Self {
        SurfaceExpr::Ident(name.to_string())
    }
}
