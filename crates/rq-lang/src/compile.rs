use std::sync::Arc;

use crate::catalog::ResourceCatalog;
use crate::error::BindError;
use crate::expr::{Expr, ExprKind};
use crate::fold::ClosureEvaluator;
use crate::lambda::{bind_lambda, parse_lambda};
use crate::translate::translate_predicate;
use crate::types::TypeRef;
use crate::value::{Record, Value};

/// Type name of the environment record holding `@name` values.
const CLOSURE_TYPE: &str = "Closure";

/// Parse, bind and translate `source` as a predicate over `resource`.
pub fn compile_predicate(
    source: &str,
    resource: &str,
    catalog: &ResourceCatalog,
) -> anyhow::Result<String> {
    PredicateCompiler::new(catalog).compile(source, resource)
}

/// Compiles predicate and selector text against one catalog.
///
/// Captured variables (`@name`) are supplied with
/// [`with_variable`](Self::with_variable) and inlined by the closure
/// evaluator before translation.
#[derive(Debug, Clone)]
pub struct PredicateCompiler<'a> {
    catalog: &'a ResourceCatalog,
    evaluator: ClosureEvaluator,
    captured: Record,
}

impl<'a> PredicateCompiler<'a> {
    pub fn new(catalog: &'a ResourceCatalog) -> Self {
        Self {
            catalog,
            evaluator: ClosureEvaluator::new(),
            captured: Record::new(CLOSURE_TYPE),
        }
    }

    pub fn with_evaluator(mut self, evaluator: ClosureEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Value for `@name` in compiled text.
    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.captured = self.captured.with_field(name, value);
        self
    }

    /// Parse and type `source` with its parameter bound to `resource`.
    pub fn bind(&self, source: &str, resource: &str) -> anyhow::Result<Expr> {
        let root = self.resource_type(resource)?;
        let parsed = parse_lambda(source)?;
        let captured = Arc::new(self.captured.clone());
        let lambda = bind_lambda(&parsed, &root, self.catalog, &captured)?;
        rq_trace!(xlat, resource, expr = %lambda, "lambda bound");
        Ok(lambda)
    }

    /// Compile a predicate; its body must be `bool`.
    pub fn compile(&self, source: &str, resource: &str) -> anyhow::Result<String> {
        let lambda = self.bind(source, resource)?;
        let body_ty = lambda_result(&lambda);
        if body_ty != TypeRef::Bool {
            return Err(BindError::TypeMismatch {
                expected: TypeRef::Bool.to_string(),
                found: body_ty.to_string(),
            }
            .into());
        }
        self.translate(&lambda)
    }

    /// Compile a selector such as `x => x.Name` (used for ordering,
    /// projection and expansion paths).
    pub fn compile_selector(&self, source: &str, resource: &str) -> anyhow::Result<String> {
        let lambda = self.bind(source, resource)?;
        self.translate(&lambda)
    }

    fn translate(&self, lambda: &Expr) -> anyhow::Result<String> {
        let text = translate_predicate(lambda, self.catalog, &self.evaluator)?;
        rq_debug!(xlat, output = %text, "compiled");
        Ok(text)
    }

    fn resource_type(&self, resource: &str) -> Result<TypeRef, BindError> {
        self.catalog
            .resource(resource)
            .map(|t| TypeRef::complex(&t.name))
            .ok_or_else(|| BindError::UnknownResource(resource.to_string()))
    }
}

fn lambda_result(lambda: &Expr) -> TypeRef {
    match &lambda.kind {
        ExprKind::Lambda(l) => l.body.ty.clone(),
        _ => lambda.ty.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::critters;

    fn compile(source: &str) -> String {
        compile_predicate(source, "Critter", &critters())
            .unwrap_or_else(|e| panic!("compile `{source}`: {e}"))
    }

    fn compile_err(source: &str) -> String {
        compile_predicate(source, "Critter", &critters())
            .expect_err("expected compile failure")
            .to_string()
    }

    #[test]
    fn comparisons_and_logic() {
        assert_eq!(
            compile(r#"x => x.Age > 18 && x.Name == "bob""#),
            "age gt 18 and name eq 'bob'"
        );
        assert_eq!(
            compile(r#"x => (x.Age > 18 || x.IsCute) && x.Name != "O'Neil""#),
            "(age gt 18 or isCute) and name ne 'O''Neil'"
        );
    }

    #[test]
    fn enums_render_member_names() {
        assert_eq!(compile("x => x.Status == Status.Active"), "status eq 'Active'");
        assert_eq!(compile("x => x.Size != Size.Small"), "size ne 'Small'");
        assert_eq!(
            compile("x => x.PreviousStatus == Status.Retired"),
            "previousStatus eq 'Retired'"
        );
    }

    #[test]
    fn nullable_members() {
        assert_eq!(compile("x => x.Weight > 10"), "weight gt 10");
        assert_eq!(compile("x => x.Weight == null"), "weight eq null");
        assert_eq!(compile("x => x.Weight.HasValue"), "weight ne null");
    }

    #[test]
    fn collections() {
        assert_eq!(compile(r#"x => x.Tags.Contains("v")"#), "'v' in tags");
        assert_eq!(
            compile("x => x.Items.Any(i => i.Price > 10)"),
            "items.any(i:i.price gt 10)"
        );
        assert_eq!(
            compile(r#"x => x.Orders.Any(o => o.Label == "gift")"#),
            "orders.any(o:o.tag eq 'gift')"
        );
        assert_eq!(
            compile("x => x.Items.Any(i => i.Owner == x.Name)"),
            "items.any(i:i.owner eq name)"
        );
    }

    #[test]
    fn external_names_from_catalog() {
        assert_eq!(compile(r#"x => x.Nick == "rex""#), "nickname eq 'rex'");
        assert_eq!(
            compile(r#"x => cast<Dog>(x).Bark == "woof""#),
            "cast(t'Hound').bark eq 'woof'"
        );
        assert_eq!(compile("x => x is Dog"), "isof(t'Hound')");
    }

    #[test]
    fn string_functions() {
        assert_eq!(
            compile(r#"x => x.Name.StartsWith("b") && x.Name.Length > 2"#),
            "startswith(name,'b') and length(name) gt 2"
        );
        assert_eq!(
            compile(r#"x => x.Name.Contains("ob")"#),
            "substringof('ob',name)"
        );
    }

    #[test]
    fn map_access() {
        assert_eq!(
            compile(r#"x => x.Attributes.SafeGet("color") == "red""#),
            "attributes.color eq 'red'"
        );
        assert_eq!(
            compile(r#"x => x.Attributes["two words"] == "red""#),
            "attributes['two words'] eq 'red'"
        );
    }

    #[test]
    fn captured_variables_are_inlined() {
        let catalog = critters();
        let compiler = PredicateCompiler::new(&catalog)
            .with_variable("limit", Value::Int32(7))
            .with_variable("who", Value::String("bob".into()));
        assert_eq!(
            compiler
                .compile("x => x.Age < @limit && x.Name == @who", "Critter")
                .unwrap(),
            "age lt 7 and name eq 'bob'"
        );
    }

    #[test]
    fn string_concatenation_of_constants_folds() {
        assert_eq!(compile(r#"x => x.Name == "a" + "b""#), "name eq 'ab'");
    }

    #[test]
    fn numeric_promotion_emits_cast() {
        assert_eq!(compile("x => x.Age > 2.5"), "cast(age,t'Double') gt 2.5");
        assert_eq!(compile("x => x.Height > 2"), "height gt 2.0");
        assert_eq!(compile("x => x.Height > 2.5e3"), "height gt 2500.0");
        assert!(compile_predicate("x => x.Height > 1e300", "Critter", &critters()).is_ok());
    }

    #[test]
    fn derived_resource_sees_inherited_fields() {
        let catalog = critters();
        assert_eq!(
            compile_predicate(r#"d => d.Bark == "woof" && d.Nick == "rex""#, "Dog", &catalog)
                .unwrap(),
            "bark eq 'woof' and nickname eq 'rex'"
        );
    }

    #[test]
    fn declared_member_naming() {
        let catalog = critters().with_naming(crate::catalog::MemberNaming::Declared);
        assert_eq!(
            compile_predicate("x => x.Age > 1", "Critter", &catalog).unwrap(),
            "Age gt 1"
        );
    }

    #[test]
    fn selectors_need_not_be_boolean() {
        let catalog = critters();
        let compiler = PredicateCompiler::new(&catalog);
        assert_eq!(
            compiler.compile_selector("x => x.Friend.Name", "Critter").unwrap(),
            "friend.name"
        );
        assert!(compiler.compile("x => x.Name", "Critter").is_err());
    }

    #[test]
    fn failures_surface_their_cause() {
        assert!(compile_err("(a, b) => a.Age > b.Age").contains("only one parameter supported"));
        assert!(compile_err("x => x.Nope > 1").contains("no member `Nope`"));
        assert!(compile_err("x => x.Age >").contains("parse error"));
        assert!(compile_err("x => x.Serial > 5").contains("don't know how to send"));
        assert!(compile_err(r#"x => x.Tags[0] == "a""#).contains("get_Item"));
        let err = compile_predicate("x => true", "Item", &critters()).unwrap_err();
        assert!(err.to_string().contains("unknown resource type `Item`"));
    }
}
