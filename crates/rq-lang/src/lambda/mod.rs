//! Predicate text: `x => x.Age > 18 && x.Name.StartsWith("B")`.
//!
//! Parsing yields an untyped [`LambdaSource`]; binding against a
//! [`ResourceCatalog`](crate::catalog::ResourceCatalog) produces the typed
//! [`Expr`](crate::expr::Expr) tree the translator consumes.

use winnow::prelude::*;

mod ast;
mod bind;
mod parser;

pub use ast::{LambdaSource, Literal, SurfaceExpr};
pub use bind::bind_lambda;


/// Parse a single lambda. Trailing input is an error.
pub fn parse_lambda(input: &str) -> anyhow::Result<LambdaSource> {
    parser::lambda_file
        .parse(input)
        .map_err(|e| anyhow::anyhow!("parse error: {e}"))
}
