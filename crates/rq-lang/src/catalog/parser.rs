use winnow::ascii::multispace1;
use winnow::combinator::{cut_err, opt, repeat};
use winnow::error::{AddContext, ContextError, ErrMode, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::stream::Stream;
use winnow::token::literal;

use super::schema::{Decl, EnumDecl, FieldDecl, TypeCategory, TypeDecl, TypeExpr};
use crate::parse_utils::{ident, integer_literal, kw, quoted_string, ws_skip};
use crate::types::{SequenceKind, TypeRef};

// ---------------------------------------------------------------------------
// Top-level grammar
// ---------------------------------------------------------------------------

pub(super) fn rqs_file(input: &mut &str) -> ModalResult<Vec<Decl>> {
    ws_skip.parse_next(input)?;
    let decls: Vec<Decl> = repeat(0.., decl).parse_next(input)?;
    ws_skip.parse_next(input)?;
    Ok(decls)
}

fn decl(input: &mut &str) -> ModalResult<Decl> {
    ws_skip.parse_next(input)?;
    if opt(kw("enum")).parse_next(input)?.is_some() {
        return cut_err(enum_body).map(Decl::Enum).parse_next(input);
    }
    let category = if opt(kw("resource")).parse_next(input)?.is_some() {
        TypeCategory::Resource
    } else if opt(kw("value")).parse_next(input)?.is_some() {
        TypeCategory::Value
    } else {
        kw("anonymous")
            .context(StrContext::Label("declaration keyword"))
            .parse_next(input)?;
        TypeCategory::Anonymous
    };
    cut_err(|i: &mut &str| type_body(i, category))
        .map(Decl::Type)
        .parse_next(input)
}

fn type_body(input: &mut &str, category: TypeCategory) -> ModalResult<TypeDecl> {
    let _ = multispace1.parse_next(input)?;
    let name = cut_err(ident)
        .context(StrContext::Expected(StrContextValue::Description(
            "type name",
        )))
        .parse_next(input)?;

    ws_skip.parse_next(input)?;
    cut_err(literal("{"))
        .context(StrContext::Expected(StrContextValue::Description("'{'")))
        .parse_next(input)?;

    // Attributes and the fields block in any order
    let mut uri = None;
    let mut json = None;
    let mut base = None;
    let mut fields: Option<Vec<FieldDecl>> = None;

    loop {
        ws_skip.parse_next(input)?;
        if opt(literal("}")).parse_next(input)?.is_some() {
            break;
        }
        if let Some(u) = opt(string_attr("uri")).parse_next(input)? {
            uri = Some(u);
        } else if let Some(j) = opt(string_attr("json")).parse_next(input)? {
            json = Some(j);
        } else if let Some(b) = opt(base_attr).parse_next(input)? {
            base = Some(b);
        } else if let Some(f) = opt(fields_block).parse_next(input)? {
            fields = Some(f);
        } else {
            return Err(ErrMode::Cut(ContextError::new().add_context(
                input,
                &input.checkpoint(),
                StrContext::Expected(StrContextValue::Description(
                    "uri, json, base, or fields",
                )),
            )));
        }
    }

    Ok(TypeDecl {
        name: name.to_string(),
        category,
        uri,
        json,
        base,
        fields: fields.unwrap_or_default(),
    })
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// `<key> = "value"`
fn string_attr<'a>(key: &'static str) -> impl FnMut(&mut &'a str) -> ModalResult<String> {
    move |input: &mut &'a str| {
        kw(key).parse_next(input)?;
        ws_skip.parse_next(input)?;
        cut_err(literal("="))
            .context(StrContext::Expected(StrContextValue::Description("'='")))
            .parse_next(input)?;
        ws_skip.parse_next(input)?;
        cut_err(quoted_string)
            .context(StrContext::Expected(StrContextValue::Description(
                "quoted string",
            )))
            .parse_next(input)
    }
}

/// `base = TypeName`
fn base_attr(input: &mut &str) -> ModalResult<String> {
    kw("base").parse_next(input)?;
    ws_skip.parse_next(input)?;
    cut_err(literal("="))
        .context(StrContext::Expected(StrContextValue::Description("'='")))
        .parse_next(input)?;
    ws_skip.parse_next(input)?;
    let name = cut_err(ident).parse_next(input)?;
    Ok(name.to_string())
}

// ---------------------------------------------------------------------------
// Fields block
// ---------------------------------------------------------------------------

fn fields_block(input: &mut &str) -> ModalResult<Vec<FieldDecl>> {
    kw("fields").parse_next(input)?;
    ws_skip.parse_next(input)?;
    cut_err(literal("{"))
        .context(StrContext::Expected(StrContextValue::Description("'{'")))
        .parse_next(input)?;

    let mut defs = Vec::new();
    loop {
        ws_skip.parse_next(input)?;
        if opt(literal("}")).parse_next(input)?.is_some() {
            break;
        }
        let field = cut_err(field_decl)
            .context(StrContext::Expected(StrContextValue::Description(
                "field declaration",
            )))
            .parse_next(input)?;
        defs.push(field);
    }
    Ok(defs)
}

pub(super) fn field_decl(input: &mut &str) -> ModalResult<FieldDecl> {
    let name = ident.parse_next(input)?;
    ws_skip.parse_next(input)?;
    cut_err(literal(":"))
        .context(StrContext::Expected(StrContextValue::Description("':'")))
        .parse_next(input)?;
    ws_skip.parse_next(input)?;
    let ty = cut_err(type_expr).parse_next(input)?;

    let checkpoint = input.checkpoint();
    ws_skip.parse_next(input)?;
    let external = if opt(kw("as")).parse_next(input)?.is_some() {
        ws_skip.parse_next(input)?;
        Some(
            cut_err(quoted_string)
                .context(StrContext::Expected(StrContextValue::Description(
                    "external name",
                )))
                .parse_next(input)?,
        )
    } else {
        input.reset(&checkpoint);
        None
    };

    Ok(FieldDecl {
        name: name.to_string(),
        ty,
        external,
    })
}

// ---------------------------------------------------------------------------
// Type expressions
// ---------------------------------------------------------------------------

/// `scalar | Name | list<T> | array<T> | seq<T> | query<T> | map<K,V>`,
/// optionally followed by `?`.
pub(crate) fn type_expr(input: &mut &str) -> ModalResult<TypeExpr> {
    let name = ident
        .context(StrContext::Expected(StrContextValue::Description("type")))
        .parse_next(input)?;

    let base = match name {
        "list" | "array" | "seq" | "query" => {
            let kind = match name {
                "list" => SequenceKind::List,
                "array" => SequenceKind::Array,
                "seq" => SequenceKind::Enumerable,
                _ => SequenceKind::Queryable,
            };
            let args = type_args(input, 1)?;
            let mut args = args.into_iter();
            match args.next() {
                Some(item) => TypeExpr::Sequence(kind, Box::new(item)),
                None => return Err(ErrMode::Cut(ContextError::new())),
            }
        }
        "map" => {
            let mut args = type_args(input, 2)?.into_iter();
            match (args.next(), args.next()) {
                (Some(k), Some(v)) => TypeExpr::Map(Box::new(k), Box::new(v)),
                _ => return Err(ErrMode::Cut(ContextError::new())),
            }
        }
        other => match scalar_type(other) {
            Some(t) => TypeExpr::Scalar(t),
            None => TypeExpr::Named(other.to_string()),
        },
    };

    if opt(literal("?")).parse_next(input)?.is_some() {
        Ok(TypeExpr::Nullable(Box::new(base)))
    } else {
        Ok(base)
    }
}

/// `<T>` or `<K, V>` with exactly `count` arguments.
fn type_args(input: &mut &str, count: usize) -> ModalResult<Vec<TypeExpr>> {
    ws_skip.parse_next(input)?;
    cut_err(literal("<"))
        .context(StrContext::Expected(StrContextValue::Description("'<'")))
        .parse_next(input)?;
    let mut args = Vec::with_capacity(count);
    for i in 0..count {
        if i > 0 {
            ws_skip.parse_next(input)?;
            cut_err(literal(","))
                .context(StrContext::Expected(StrContextValue::Description("','")))
                .parse_next(input)?;
        }
        ws_skip.parse_next(input)?;
        args.push(cut_err(type_expr).parse_next(input)?);
    }
    ws_skip.parse_next(input)?;
    cut_err(literal(">"))
        .context(StrContext::Expected(StrContextValue::Description("'>'")))
        .parse_next(input)?;
    Ok(args)
}

fn scalar_type(name: &str) -> Option<TypeRef> {
    Some(match name {
        "bool" => TypeRef::Bool,
        "char" => TypeRef::Char,
        "string" => TypeRef::String,
        "byte" => TypeRef::Byte,
        "int32" => TypeRef::Int32,
        "int64" => TypeRef::Int64,
        "double" => TypeRef::Double,
        "single" => TypeRef::Single,
        "decimal" => TypeRef::Decimal,
        "datetime" => TypeRef::DateTime,
        "guid" => TypeRef::Guid,
        "object" => TypeRef::Object,
        _ => return None,
    })
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// `Name [: int32] { A = 1, B, C = 7 }`; members without a value continue
/// from the previous one.
fn enum_body(input: &mut &str) -> ModalResult<EnumDecl> {
    let _ = multispace1.parse_next(input)?;
    let name = cut_err(ident)
        .context(StrContext::Expected(StrContextValue::Description(
            "enum name",
        )))
        .parse_next(input)?;

    ws_skip.parse_next(input)?;
    let underlying = if opt(literal(":")).parse_next(input)?.is_some() {
        ws_skip.parse_next(input)?;
        cut_err(type_expr)
            .context(StrContext::Expected(StrContextValue::Description(
                "underlying type",
            )))
            .parse_next(input)?
    } else {
        TypeExpr::Scalar(TypeRef::Int32)
    };
    let underlying = match underlying {
        TypeExpr::Scalar(t) => t,
        // Rejected by validation with a readable message.
        other => TypeRef::complex(&other.to_string()),
    };

    ws_skip.parse_next(input)?;
    cut_err(literal("{"))
        .context(StrContext::Expected(StrContextValue::Description("'{'")))
        .parse_next(input)?;

    let mut members = Vec::new();
    let mut next = 0i64;
    loop {
        ws_skip.parse_next(input)?;
        if opt(literal("}")).parse_next(input)?.is_some() {
            break;
        }
        let member = cut_err(ident)
            .context(StrContext::Expected(StrContextValue::Description(
                "enum member",
            )))
            .parse_next(input)?;
        ws_skip.parse_next(input)?;
        let value = if opt(literal("=")).parse_next(input)?.is_some() {
            ws_skip.parse_next(input)?;
            cut_err(integer_literal)
                .context(StrContext::Expected(StrContextValue::Description(
                    "integer value",
                )))
                .parse_next(input)?
        } else {
            next
        };
        members.push((member.to_string(), value));
        next = value.saturating_add(1);

        ws_skip.parse_next(input)?;
        if opt(literal(",")).parse_next(input)?.is_none() {
            ws_skip.parse_next(input)?;
            cut_err(literal("}"))
                .context(StrContext::Expected(StrContextValue::Description(
                    "',' or '}'",
                )))
                .parse_next(input)?;
            break;
        }
    }

    Ok(EnumDecl {
        name: name.to_string(),
        underlying,
        members,
    })
}
