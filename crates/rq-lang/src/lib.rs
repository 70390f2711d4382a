#[macro_use]
mod log_macros;

pub mod catalog;
pub mod compile;
pub mod encode;
pub mod error;
pub mod expr;
pub mod fold;
pub mod lambda;
pub mod mapping;
pub mod names;
pub mod segment;
pub mod signature;
pub mod translate;
pub mod types;
pub mod value;

mod parse_utils;

#[cfg(test)]
mod fixtures;

pub use catalog::{MemberNaming, ResourceCatalog, parse_rqs};
pub use compile::{PredicateCompiler, compile_predicate};
pub use error::{BindError, TranslateError};
pub use expr::Expr;
pub use fold::ClosureEvaluator;
pub use lambda::{bind_lambda, parse_lambda};
pub use names::{DefaultNames, NameResolver};
pub use translate::translate_predicate;
pub use types::TypeRef;
pub use value::{Record, Value};
