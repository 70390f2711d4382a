use std::sync::Arc;

use rust_decimal::Decimal;

use super::ast::{LambdaSource, Literal, SurfaceExpr};
use crate::catalog::{ResourceCatalog, TypeExpr};
use crate::error::BindError;
use crate::expr::{BinaryOp, Expr, ExprKind, Param, UnaryOp};
use crate::mapping::{map_get_item, map_safe_get};
use crate::signature::{ParamShape, Signature};
use crate::types::{SequenceKind, TypeRef};
use crate::value::{Record, Value};

/// Type `source` against `catalog` with every lambda parameter of the root
/// lambda typed as `root`. `@name` references read from `captured`.
pub fn bind_lambda(
    source: &LambdaSource,
    root: &TypeRef,
    catalog: &ResourceCatalog,
    captured: &Arc<Record>,
) -> Result<Expr, BindError> {
    let mut binder = Binder {
        catalog,
        captured,
        scope: Vec::new(),
    };
    let params = vec![root.clone(); source.params.len()];
    binder.lambda(source, params)
}

struct Binder<'a> {
    catalog: &'a ResourceCatalog,
    captured: &'a Arc<Record>,
    /// Parameters in scope, innermost last.
    scope: Vec<Param>,
}

impl Binder<'_> {
    fn lambda(&mut self, source: &LambdaSource, types: Vec<TypeRef>) -> Result<Expr, BindError> {
        let params: Vec<Param> = source
            .params
            .iter()
            .zip(types)
            .map(|(name, ty)| Param::new(name, ty))
            .collect();
        let depth = self.scope.len();
        self.scope.extend(params.iter().cloned());
        let body = self.bind(&source.body);
        self.scope.truncate(depth);
        Ok(Expr::lambda(params, body?))
    }

    fn bind(&mut self, expr: &SurfaceExpr) -> Result<Expr, BindError> {
        match expr {
            SurfaceExpr::Literal(lit) => literal(lit),
            SurfaceExpr::Ident(name) => self
                .lookup_param(name)
                .map(|p| Expr::param(&p))
                .ok_or_else(|| BindError::UnknownIdentifier(name.clone())),
            SurfaceExpr::Captured(name) => self.captured_var(name),
            SurfaceExpr::Member { target, name } => {
                if let Some(constant) = self.enum_constant(target, name)? {
                    return Ok(constant);
                }
                let target = self.bind(target)?;
                self.member(target, name)
            }
            SurfaceExpr::Call { target, name, args } => {
                if let SurfaceExpr::Ident(owner) = target.as_ref()
                    && owner.eq_ignore_ascii_case("math")
                    && self.lookup_param(owner).is_none()
                {
                    return self.math_call(name, args);
                }
                let target = self.bind(target)?;
                self.call(target, name, args)
            }
            SurfaceExpr::Index { target, key } => {
                let target = self.bind(target)?;
                let key = self.bind(key)?;
                self.index(target, key)
            }
            SurfaceExpr::Binary { op, left, right } => {
                let left = self.bind(left)?;
                let right = self.bind(right)?;
                binary(*op, left, right)
            }
            SurfaceExpr::Not(inner) => {
                let inner = self.bind(inner)?;
                expect_type(&inner, &TypeRef::Bool)?;
                Ok(Expr::not(inner))
            }
            SurfaceExpr::Negate(inner) => {
                let inner = self.bind(inner)?;
                if !inner.ty.non_nullable().is_numeric() {
                    return Err(mismatch("-", &inner.ty, &inner.ty));
                }
                let ty = inner.ty.clone();
                Ok(Expr::unary(UnaryOp::Negate, inner, ty))
            }
            SurfaceExpr::Conditional {
                test,
                if_true,
                if_false,
            } => {
                let test = self.bind(test)?;
                expect_type(&test, &TypeRef::Bool)?;
                let if_true = self.bind(if_true)?;
                let if_false = self.bind(if_false)?;
                let (if_true, if_false) = unify("?:", if_true, if_false)?;
                Ok(Expr::conditional(test, if_true, if_false))
            }
            SurfaceExpr::Is { operand, ty } => {
                let operand = self.bind(operand)?;
                let ty = self.resolve_type(ty)?;
                Ok(Expr::type_is(operand, ty))
            }
            SurfaceExpr::As { operand, ty } => {
                let operand = self.bind(operand)?;
                let ty = self.resolve_type(ty)?;
                let ty = if ty.is_reference() || ty.is_nullable() {
                    ty
                } else {
                    TypeRef::nullable(ty)
                };
                Ok(Expr::type_as(operand, ty))
            }
            SurfaceExpr::Cast { ty, operand } => {
                let operand = self.bind(operand)?;
                let ty = self.resolve_type(ty)?;
                if operand.ty == ty {
                    return Ok(operand);
                }
                if let Some(value) = operand.as_constant()
                    && ty.non_nullable().is_numeric()
                    && operand.ty.is_numeric()
                {
                    let converted = convert_value(value, ty.non_nullable())?;
                    let constant = Expr::constant(converted, ty.non_nullable().clone());
                    return Ok(lift(constant, &ty));
                }
                Ok(Expr::convert(operand, ty))
            }
            SurfaceExpr::Array(items) => {
                let items = items
                    .iter()
                    .map(|i| self.bind(i))
                    .collect::<Result<Vec<_>, _>>()?;
                array(items)
            }
            SurfaceExpr::Lambda(_) => Err(BindError::TypeMismatch {
                expected: "value".into(),
                found: "lambda outside of a method argument".into(),
            }),
        }
    }

    fn lookup_param(&self, name: &str) -> Option<Param> {
        self.scope.iter().rev().find(|p| &*p.name == name).cloned()
    }

    fn resolve_type(&self, ty: &TypeExpr) -> Result<TypeRef, BindError> {
        self.catalog
            .resolve(ty)
            .ok_or_else(|| BindError::UnknownType(ty.to_string()))
    }

    /// `@name` reads a member of the closure environment constant.
    fn captured_var(&self, name: &str) -> Result<Expr, BindError> {
        let value = self
            .captured
            .get(name)
            .ok_or_else(|| BindError::UnknownVariable(name.to_string()))?;
        let env_type = self.captured.type_name.clone();
        let env = Expr::constant(
            Value::Record(self.captured.clone()),
            TypeRef::complex(&env_type),
        );
        Ok(Expr::member(
            Some(env),
            Signature::property(env_type, name.to_string()),
            value.type_of(),
        ))
    }

    /// `Enum.Member` when `target` names an enum rather than a parameter.
    fn enum_constant(&self, target: &SurfaceExpr, name: &str) -> Result<Option<Expr>, BindError> {
        let SurfaceExpr::Ident(type_name) = target else {
            return Ok(None);
        };
        if self.lookup_param(type_name).is_some() {
            return Ok(None);
        }
        let Some(def) = self.catalog.enum_def(type_name) else {
            return Ok(None);
        };
        let value = def
            .member_value(name)
            .ok_or_else(|| BindError::UnknownEnumMember {
                enum_name: def.name.clone(),
                member: name.to_string(),
            })?;
        let value = Value::Int64(value)
            .to_enum(def)
            .ok_or_else(|| BindError::LiteralOutOfRange(name.to_string()))?;
        Ok(Some(Expr::constant(value, TypeRef::Enum(def.clone()))))
    }

    // -- members -------------------------------------------------------------

    fn member(&self, target: Expr, name: &str) -> Result<Expr, BindError> {
        let unknown = || BindError::UnknownMember {
            owner: target.ty.to_string(),
            name: name.to_string(),
        };
        let (canonical, ty) = match &target.ty {
            TypeRef::Complex(owner) => {
                let (_, field) = self.catalog.find_field(owner, name).ok_or_else(unknown)?;
                let ty = self
                    .catalog
                    .resolve(&field.ty)
                    .ok_or_else(|| BindError::UnknownType(field.ty.to_string()))?;
                (field.name.clone(), ty)
            }
            TypeRef::String => match_name(name, &["Length"])
                .map(|n| (n, TypeRef::Int32))
                .ok_or_else(unknown)?,
            TypeRef::Sequence(SequenceKind::List, _) => match_name(name, &["Count"])
                .map(|n| (n, TypeRef::Int32))
                .ok_or_else(unknown)?,
            TypeRef::Sequence(SequenceKind::Array, _) => match_name(name, &["Length"])
                .map(|n| (n, TypeRef::Int32))
                .ok_or_else(unknown)?,
            TypeRef::DateTime => {
                match_name(name, &["Year", "Month", "Day", "Hour", "Minute", "Second"])
                    .map(|n| (n, TypeRef::Int32))
                    .ok_or_else(unknown)?
            }
            TypeRef::Nullable(inner) => match match_name(name, &["HasValue", "Value"]) {
                Some(n) if n == "HasValue" => (n, TypeRef::Bool),
                Some(n) => (n, inner.as_ref().clone()),
                None => return Err(unknown()),
            },
            _ => return Err(unknown()),
        };
        Ok(Expr::property(target, &canonical, ty))
    }

    // -- calls -----------------------------------------------------------------

    fn call(&mut self, target: Expr, name: &str, args: &[SurfaceExpr]) -> Result<Expr, BindError> {
        let unknown = |owner: &TypeRef| BindError::UnknownMethod {
            owner: owner.to_string(),
            name: name.to_string(),
            arity: args.len(),
        };
        match &target.ty {
            TypeRef::String => {
                let args = self.bind_args(args)?;
                string_call(target, name, args)
            }
            TypeRef::Map(_, value) => {
                let value = value.as_ref().clone();
                match (match_name(name, &["SafeGet"]), args) {
                    (Some(_), [key]) => {
                        let key = self.bind(key)?;
                        let key = coerce_to(key, map_key(&target.ty))?;
                        Ok(Expr::call(map_safe_get(), Some(target), vec![key], value))
                    }
                    _ => Err(unknown(&target.ty)),
                }
            }
            TypeRef::Sequence(kind, item) => {
                let (kind, item) = (*kind, item.as_ref().clone());
                self.sequence_call(target, kind, item, name, args)
            }
            other => Err(unknown(other)),
        }
    }

    fn bind_args(&mut self, args: &[SurfaceExpr]) -> Result<Vec<Expr>, BindError> {
        args.iter().map(|a| self.bind(a)).collect()
    }

    fn sequence_call(
        &mut self,
        target: Expr,
        kind: SequenceKind,
        item: TypeRef,
        name: &str,
        args: &[SurfaceExpr],
    ) -> Result<Expr, BindError> {
        const METHODS: [&str; 12] = [
            "Any",
            "All",
            "Count",
            "Where",
            "Select",
            "First",
            "FirstOrDefault",
            "Sum",
            "Min",
            "Max",
            "Average",
            "Contains",
        ];
        let unknown = || BindError::UnknownMethod {
            owner: target.ty.to_string(),
            name: name.to_string(),
            arity: args.len(),
        };
        let method = match_name(name, &METHODS).ok_or_else(unknown)?;
        let queryable = kind == SequenceKind::Queryable;
        let owner = if queryable { "queryable" } else { "enumerable" };
        let source_shape = if queryable {
            ParamShape::Queryable
        } else {
            ParamShape::Sequence
        };

        if method == "Contains" {
            let [arg] = args else { return Err(unknown()) };
            let arg = self.bind(arg)?;
            let arg = coerce_to(arg, &item)?;
            if kind == SequenceKind::List {
                let sig = Signature::method("list", "Contains", vec![ParamShape::Item]);
                return Ok(Expr::call(sig, Some(target), vec![arg], TypeRef::Bool));
            }
            let sig = Signature::static_method(owner, "Contains", vec![source_shape, ParamShape::Item]);
            return Ok(Expr::call(sig, None, vec![target, arg], TypeRef::Bool));
        }

        let lambda = match args {
            [] if !matches!(method.as_str(), "All" | "Where" | "Select") => None,
            [SurfaceExpr::Lambda(source)] => {
                let mut types = vec![item.clone()];
                types.resize(source.params.len().max(1), TypeRef::Int32);
                Some(self.lambda(source, types)?)
            }
            _ => return Err(unknown()),
        };

        let predicate = matches!(
            method.as_str(),
            "Any" | "All" | "Count" | "Where" | "First" | "FirstOrDefault"
        );
        let body_ty = lambda.as_ref().map(|l| match &l.ty {
            TypeRef::Function(_, ret) => ret.as_ref().clone(),
            other => other.clone(),
        });
        if predicate && let Some(ty) = &body_ty && *ty != TypeRef::Bool {
            return Err(BindError::TypeMismatch {
                expected: TypeRef::Bool.to_string(),
                found: ty.to_string(),
            });
        }

        let value_ty = body_ty.clone().unwrap_or_else(|| item.clone());
        let sequence = |elem: TypeRef| {
            if queryable {
                TypeRef::queryable(elem)
            } else {
                TypeRef::enumerable(elem)
            }
        };
        let ret = match method.as_str() {
            "Any" | "All" => TypeRef::Bool,
            "Count" => TypeRef::Int32,
            "Where" => sequence(item.clone()),
            "Select" => sequence(value_ty),
            "First" | "FirstOrDefault" => item.clone(),
            "Average" => match value_ty.non_nullable() {
                TypeRef::Decimal => TypeRef::Decimal,
                TypeRef::Single => TypeRef::Single,
                _ => TypeRef::Double,
            },
            _ => value_ty,
        };

        let mut params = vec![source_shape];
        let mut call_args = vec![target];
        if let Some(lambda) = lambda {
            let shape = if predicate {
                ParamShape::Predicate
            } else {
                ParamShape::Selector
            };
            if queryable {
                params.push(ParamShape::Quoted(Box::new(shape)));
                call_args.push(Expr::quote(lambda));
            } else {
                params.push(shape);
                call_args.push(lambda);
            }
        }
        let sig = Signature::static_method(owner, method, params);
        Ok(Expr::call(sig, None, call_args, ret))
    }

    /// `Math.Round(x)`, `Math.Floor(x)`, `Math.Ceiling(x)`.
    fn math_call(&mut self, name: &str, args: &[SurfaceExpr]) -> Result<Expr, BindError> {
        let unknown = || BindError::UnknownMethod {
            owner: "math".into(),
            name: name.to_string(),
            arity: args.len(),
        };
        let method = match_name(name, &["Round", "Floor", "Ceiling"]).ok_or_else(unknown)?;
        let [arg] = args else { return Err(unknown()) };
        let arg = self.bind(arg)?;
        let (shape, ty) = match arg.ty {
            TypeRef::Decimal => (ParamShape::Decimal, TypeRef::Decimal),
            ref t if t.is_numeric() => (ParamShape::Double, TypeRef::Double),
            ref t => {
                return Err(BindError::TypeMismatch {
                    expected: "double or decimal".into(),
                    found: t.to_string(),
                });
            }
        };
        let arg = coerce_to(arg, &ty)?;
        let sig = Signature::static_method("math", method, vec![shape]);
        Ok(Expr::call(sig, None, vec![arg], ty))
    }

    // -- indexers --------------------------------------------------------------

    fn index(&self, target: Expr, key: Expr) -> Result<Expr, BindError> {
        match target.ty.clone() {
            TypeRef::Map(k, v) => {
                let key = coerce_to(key, &k)?;
                Ok(Expr::call(map_get_item(), Some(target), vec![key], *v))
            }
            TypeRef::Sequence(SequenceKind::List, item) => {
                let key = coerce_to(key, &TypeRef::Int32)?;
                let sig = Signature::method("list", "get_Item", vec![ParamShape::Int32]);
                Ok(Expr::call(sig, Some(target), vec![key], *item))
            }
            TypeRef::Sequence(SequenceKind::Array, item) => {
                let key = coerce_to(key, &TypeRef::Int32)?;
                Ok(Expr::new(
                    ExprKind::Binary {
                        op: BinaryOp::ArrayIndex,
                        left: Box::new(target),
                        right: Box::new(key),
                    },
                    *item,
                ))
            }
            other => Err(BindError::UnknownMember {
                owner: other.to_string(),
                name: "[]".into(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// String methods
// ---------------------------------------------------------------------------

fn string_call(target: Expr, name: &str, args: Vec<Expr>) -> Result<Expr, BindError> {
    use ParamShape as P;
    const METHODS: [&str; 10] = [
        "StartsWith",
        "EndsWith",
        "Contains",
        "IndexOf",
        "ToLower",
        "ToUpper",
        "Trim",
        "Substring",
        "Replace",
        "Equals",
    ];
    let unknown = || BindError::UnknownMethod {
        owner: "string".into(),
        name: name.to_string(),
        arity: args.len(),
    };
    let method = match_name(name, &METHODS).ok_or_else(unknown)?;
    let (params, ret) = match (method.as_str(), args.len()) {
        ("StartsWith" | "EndsWith" | "Contains" | "Equals", 1) => (vec![P::String], TypeRef::Bool),
        ("IndexOf", 1) if args[0].ty == TypeRef::Char => (vec![P::Char], TypeRef::Int32),
        ("IndexOf", 1) => (vec![P::String], TypeRef::Int32),
        ("ToLower" | "ToUpper" | "Trim", 0) => (vec![], TypeRef::String),
        ("Substring", 1) => (vec![P::Int32], TypeRef::String),
        ("Substring", 2) => (vec![P::Int32, P::Int32], TypeRef::String),
        ("Replace", 2) => (vec![P::String, P::String], TypeRef::String),
        _ => return Err(unknown()),
    };
    let args = args
        .into_iter()
        .zip(&params)
        .map(|(arg, shape)| coerce_to(arg, &shape_type(shape)))
        .collect::<Result<Vec<_>, _>>()?;
    let sig = Signature::method("string", method, params);
    Ok(Expr::call(sig, Some(target), args, ret))
}

fn shape_type(shape: &ParamShape) -> TypeRef {
    match shape {
        ParamShape::Char => TypeRef::Char,
        ParamShape::Int32 => TypeRef::Int32,
        _ => TypeRef::String,
    }
}

fn map_key(ty: &TypeRef) -> &TypeRef {
    match ty {
        TypeRef::Map(k, _) => k,
        other => other,
    }
}

/// Canonical spelling of `name` among `known`, compared ignoring ASCII case.
fn match_name(name: &str, known: &[&str]) -> Option<String> {
    known
        .iter()
        .find(|k| k.eq_ignore_ascii_case(name))
        .map(|k| k.to_string())
}

// ---------------------------------------------------------------------------
// Literals and arrays
// ---------------------------------------------------------------------------

fn literal(lit: &Literal) -> Result<Expr, BindError> {
    let value = match lit {
        Literal::Int(v) => match i32::try_from(*v) {
            Ok(i) => Value::Int32(i),
            Err(_) => Value::Int64(*v),
        },
        Literal::Long(v) => Value::Int64(*v),
        Literal::Double(v) => Value::Double(*v),
        Literal::Single(v) => Value::Single(*v),
        Literal::Decimal(v) => Value::Decimal(*v),
        Literal::String(s) => Value::String(s.clone()),
        Literal::Char(c) => Value::Char(*c),
        Literal::Bool(b) => Value::Bool(*b),
        Literal::DateTime(dt) => Value::DateTime(*dt),
        Literal::Guid(g) => Value::Guid(*g),
        Literal::Null => return Ok(Expr::null(TypeRef::Object)),
    };
    Ok(Expr::value(value))
}

/// `[a, b]`: items unified pairwise onto the first non-null item's type.
fn array(items: Vec<Expr>) -> Result<Expr, BindError> {
    let mut item_ty = items
        .iter()
        .find(|i| !i.is_null_constant())
        .map(|i| i.ty.clone())
        .unwrap_or(TypeRef::Object);
    for i in &items {
        if i.ty.is_numeric() && item_ty.is_numeric() && i.ty != item_ty && !i.is_constant() {
            item_ty = promote(&item_ty, &i.ty).ok_or_else(|| mismatch("[]", &item_ty, &i.ty))?;
        }
    }
    let items = items
        .into_iter()
        .map(|i| coerce_to(i, &item_ty))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Expr::new_array(item_ty, items))
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Result<Expr, BindError> {
    let token = op_token(op);
    if op.is_logical() {
        expect_type(&left, &TypeRef::Bool)?;
        expect_type(&right, &TypeRef::Bool)?;
        return Ok(Expr::binary(op, left, right));
    }

    if op == BinaryOp::Add && (left.ty == TypeRef::String || right.ty == TypeRef::String) {
        if left.ty != right.ty {
            return Err(mismatch(token, &left.ty, &right.ty));
        }
        return Ok(Expr::binary(op, left, right));
    }

    if op.is_comparison() {
        if let Some((l, r)) = null_comparison(op, &left, &right)? {
            return Ok(Expr::binary(op, l, r));
        }
        if let Some((l, r)) = enum_comparison(&left, &right)? {
            return Ok(Expr::binary(op, l, r));
        }
        let ordered = !matches!(op, BinaryOp::Eq | BinaryOp::Ne);
        let base = left.ty.non_nullable();
        if ordered
            && !base.is_numeric()
            && !matches!(base, TypeRef::DateTime | TypeRef::Char)
        {
            return Err(mismatch(token, &left.ty, &right.ty));
        }
        let (l, r) = unify(token, left, right)?;
        return Ok(Expr::binary(op, l, r));
    }

    // Arithmetic
    if !left.ty.non_nullable().is_numeric() || !right.ty.non_nullable().is_numeric() {
        return Err(mismatch(token, &left.ty, &right.ty));
    }
    let (l, r) = unify(token, left, right)?;
    Ok(Expr::binary(op, l, r))
}

fn op_token(op: BinaryOp) -> &'static str {
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

/// Comparison against a `null` literal: the literal takes the other side's
/// type, lifting value types to nullable.
fn null_comparison(op: BinaryOp, left: &Expr, right: &Expr) -> Result<Option<(Expr, Expr)>, BindError> {
    let (left_null, right_null) = (is_null_literal(left), is_null_literal(right));
    if !left_null && !right_null {
        return Ok(None);
    }
    if !matches!(op, BinaryOp::Eq | BinaryOp::Ne) || (left_null && right_null) {
        return Err(mismatch(op_token(op), &left.ty, &right.ty));
    }
    let lift_side = |e: &Expr| {
        if e.ty.is_reference() || e.ty.is_nullable() {
            e.clone()
        } else {
            Expr::convert(e.clone(), TypeRef::nullable(e.ty.clone()))
        }
    };
    Ok(Some(if left_null {
        let r = lift_side(right);
        (Expr::null(r.ty.clone()), r)
    } else {
        let l = lift_side(left);
        let null = Expr::null(l.ty.clone());
        (l, null)
    }))
}

/// Enum comparisons go through the underlying integer type: literal enum
/// members become integer constants, everything else is converted. Lifted
/// when either side is nullable.
fn enum_comparison(left: &Expr, right: &Expr) -> Result<Option<(Expr, Expr)>, BindError> {
    let left_enum = left.ty.non_nullable().as_enum();
    let right_enum = right.ty.non_nullable().as_enum();
    let def = match (left_enum, right_enum) {
        (None, None) => return Ok(None),
        (Some(l), Some(r)) if l == r => l.clone(),
        _ => return Err(mismatch("==", &left.ty, &right.ty)),
    };
    // Arithmetic on small enums happens in int32
    let underlying = match def.underlying {
        TypeRef::Int64 => TypeRef::Int64,
        _ => TypeRef::Int32,
    };
    let lifted = left.ty.is_nullable() || right.ty.is_nullable();
    let target = if lifted {
        TypeRef::nullable(underlying.clone())
    } else {
        underlying.clone()
    };
    let side = |e: &Expr| -> Result<Expr, BindError> {
        if !lifted && let Some(Value::Enum(v)) = e.as_constant() {
            let raw = convert_value(&Value::Int64(v.value), &underlying)?;
            return Ok(Expr::constant(raw, underlying.clone()));
        }
        Ok(Expr::convert(e.clone(), target.clone()))
    };
    Ok(Some((side(left)?, side(right)?)))
}

/// Bring two operands to a common type: numeric promotion (literals are
/// converted in place) and nullable lifting.
fn unify(token: &str, left: Expr, right: Expr) -> Result<(Expr, Expr), BindError> {
    if left.ty == right.ty {
        return Ok((left, right));
    }
    if is_null_literal(&left) || is_null_literal(&right) {
        let (l, r) = (left.ty.clone(), right.ty.clone());
        return null_comparison(BinaryOp::Eq, &left, &right)?
            .ok_or_else(|| mismatch(token, &l, &r));
    }
    let (lt, rt) = (left.ty.non_nullable().clone(), right.ty.non_nullable().clone());
    let base = if lt == rt {
        lt
    } else if lt.is_numeric() && rt.is_numeric() {
        if is_numeric_literal(&right) && !is_numeric_literal(&left) && literal_fits(&right, &lt) {
            promote(&lt, &lt)
        } else if is_numeric_literal(&left) && !is_numeric_literal(&right) && literal_fits(&left, &rt) {
            promote(&rt, &rt)
        } else {
            promote(&lt, &rt)
        }
        .ok_or_else(|| mismatch(token, &left.ty, &right.ty))?
    } else {
        return Err(mismatch(token, &left.ty, &right.ty));
    };
    let lifted = left.ty.is_nullable() || right.ty.is_nullable();
    let target = if lifted {
        TypeRef::nullable(base)
    } else {
        base
    };
    Ok((coerce_to(left, &target)?, coerce_to(right, &target)?))
}

/// Binary numeric promotion. `None` for decimal mixed with floating point.
fn promote(a: &TypeRef, b: &TypeRef) -> Option<TypeRef> {
    use TypeRef::{Decimal, Double, Int32, Int64, Single};
    Some(match (a, b) {
        (Decimal, Double | Single) | (Double | Single, Decimal) => return None,
        (Decimal, _) | (_, Decimal) => Decimal,
        (Double, _) | (_, Double) => Double,
        (Single, _) | (_, Single) => Single,
        (Int64, _) | (_, Int64) => Int64,
        _ => Int32,
    })
}

/// Convert `expr` to `target`, in place for literals.
fn coerce_to(expr: Expr, target: &TypeRef) -> Result<Expr, BindError> {
    if expr.ty == *target {
        return Ok(expr);
    }
    if is_null_literal(&expr) {
        if target.is_reference() || target.is_nullable() {
            return Ok(Expr::null(target.clone()));
        }
        return Err(BindError::TypeMismatch {
            expected: target.to_string(),
            found: "null".into(),
        });
    }
    let base = target.non_nullable();
    if is_numeric_literal(&expr)
        && base.is_numeric()
        && let Some(value) = expr.as_constant()
    {
        let constant = Expr::constant(convert_value(value, base)?, base.clone());
        return Ok(lift(constant, target));
    }
    let source = expr.ty.non_nullable();
    let convertible = source == base
        || (source.is_numeric() && base.is_numeric())
        || *target == TypeRef::Object;
    if !convertible {
        return Err(BindError::TypeMismatch {
            expected: target.to_string(),
            found: expr.ty.to_string(),
        });
    }
    Ok(Expr::convert(expr, target.clone()))
}

/// Wrap a non-nullable expression in a lifting conversion when `target` is
/// nullable.
fn lift(expr: Expr, target: &TypeRef) -> Expr {
    if target.is_nullable() && expr.ty != *target {
        Expr::convert(expr, target.clone())
    } else {
        expr
    }
}

fn convert_value(value: &Value, to: &TypeRef) -> Result<Value, BindError> {
    let out_of_range = || BindError::LiteralOutOfRange(format!("{value} as {to}"));
    if let Some(i) = value.as_i64()
        && !matches!(value, Value::Enum(_))
    {
        return Ok(match to {
            TypeRef::Byte => Value::Byte(u8::try_from(i).map_err(|_| out_of_range())?),
            TypeRef::Int32 => Value::Int32(i32::try_from(i).map_err(|_| out_of_range())?),
            TypeRef::Int64 => Value::Int64(i),
            TypeRef::Double => Value::Double(i as f64),
            TypeRef::Single => Value::Single(i as f32),
            TypeRef::Decimal => Value::Decimal(Decimal::from(i)),
            _ => return Err(out_of_range()),
        });
    }
    Ok(match (value, to) {
        (Value::Double(v), TypeRef::Double) => Value::Double(*v),
        (Value::Double(v), TypeRef::Decimal) => {
            Value::Decimal(Decimal::try_from(*v).map_err(|_| out_of_range())?)
        }
        (Value::Single(v), TypeRef::Single) => Value::Single(*v),
        (Value::Single(v), TypeRef::Double) => Value::Double(f64::from(*v)),
        (Value::Decimal(v), TypeRef::Decimal) => Value::Decimal(*v),
        _ => return Err(out_of_range()),
    })
}

/// Whether a numeric literal converts to `to` without loss.
fn literal_fits(expr: &Expr, to: &TypeRef) -> bool {
    match (expr.as_constant(), to) {
        (Some(Value::Double(_)), TypeRef::Single) => false,
        (Some(Value::Decimal(_)), TypeRef::Double | TypeRef::Single) => false,
        (Some(Value::Double(_) | Value::Single(_)), t) if t.is_integral() => false,
        (Some(v), t) => convert_value(v, t).is_ok(),
        (None, _) => false,
    }
}

fn is_numeric_literal(expr: &Expr) -> bool {
    expr.is_constant() && !expr.is_null_constant() && expr.ty.is_numeric()
}

/// An untyped `null` literal (typed `object` until unified).
fn is_null_literal(expr: &Expr) -> bool {
    expr.is_null_constant() && expr.ty == TypeRef::Object
}

fn expect_type(expr: &Expr, ty: &TypeRef) -> Result<(), BindError> {
    if expr.ty == *ty {
        Ok(())
    } else {
        Err(BindError::TypeMismatch {
            expected: ty.to_string(),
            found: expr.ty.to_string(),
        })
    }
}

fn mismatch(op: &str, left: &TypeRef, right: &TypeRef) -> BindError {
    BindError::OperandMismatch {
        op: op.to_string(),
        left: left.to_string(),
        right: right.to_string(),
    }
}
