use crate::expr::{Expr, NodeKind};

/// Fatal translation failure. Any of these aborts the whole translation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TranslateError {
    #[error("unsupported {kind} `{node}`: {reason}")]
    UnsupportedConstruct {
        kind: NodeKind,
        node: String,
        reason: String,
    },
    #[error("unable to resolve external name of type `{type_name}`")]
    AmbiguousTypeResolution { type_name: String },
    #[error("malformed {type_name} literal: {reason}")]
    MalformedLiteral { type_name: String, reason: String },
    #[error("template `{template}` has {slots} slots but {operands} operands")]
    UnfilledTemplate {
        template: String,
        slots: usize,
        operands: usize,
    },
}

impl TranslateError {
    /// Unsupported-construct error describing `node`.
    pub fn unsupported(node: &Expr, reason: impl Into<String>) -> Self {
        TranslateError::UnsupportedConstruct {
            kind: node.node_kind(),
            node: node.to_string(),
            reason: reason.into(),
        }
    }

    pub fn malformed(type_name: impl ToString, reason: impl Into<String>) -> Self {
        TranslateError::MalformedLiteral {
            type_name: type_name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Failure to type a parsed lambda against the catalog.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BindError {
    #[error("unknown resource type `{0}`")]
    UnknownResource(String),
    #[error("unknown type `{0}`")]
    UnknownType(String),
    #[error("unknown identifier `{0}`")]
    UnknownIdentifier(String),
    #[error("captured variable `@{0}` has no value")]
    UnknownVariable(String),
    #[error("type `{owner}` has no member `{name}`")]
    UnknownMember { owner: String, name: String },
    #[error("type `{owner}` has no method `{name}` taking {arity} argument(s)")]
    UnknownMethod {
        owner: String,
        name: String,
        arity: usize,
    },
    #[error("enum `{enum_name}` has no member `{member}`")]
    UnknownEnumMember { enum_name: String, member: String },
    #[error("operator `{op}` cannot combine `{left}` and `{right}`")]
    OperandMismatch {
        op: String,
        left: String,
        right: String,
    },
    #[error("expected `{expected}`, found `{found}`")]
    TypeMismatch { expected: String, found: String },
    #[error("literal out of range: {0}")]
    LiteralOutOfRange(String),
}
