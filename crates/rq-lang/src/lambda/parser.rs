use std::str::FromStr;

use rust_decimal::Decimal;
use uuid::Uuid;
use winnow::combinator::{alt, cut_err, delimited, opt, preceded, separated};
use winnow::error::{AddContext, ContextError, ErrMode, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::stream::Stream;
use winnow::token::{any, literal, take_while};

use super::ast::{LambdaSource, Literal, SurfaceExpr};
use crate::catalog::type_expr;
use crate::expr::BinaryOp;
use crate::parse_utils::{ident, kw, quoted_string, single_quoted, ws_skip};
use crate::value::DateTimeValue;

// ---------------------------------------------------------------------------
// Lambdas
// ---------------------------------------------------------------------------

pub(super) fn lambda_file(input: &mut &str) -> ModalResult<LambdaSource> {
    ws_skip.parse_next(input)?;
    let parsed = lambda
        .context(StrContext::Expected(StrContextValue::Description(
            "lambda `x => ...`",
        )))
        .parse_next(input)?;
    ws_skip.parse_next(input)?;
    Ok(parsed)
}

/// `x => body` or `(a, b) => body`
pub(super) fn lambda(input: &mut &str) -> ModalResult<LambdaSource> {
    let params = lambda_head.parse_next(input)?;
    ws_skip.parse_next(input)?;
    let body = cut_err(parse_expr)
        .context(StrContext::Expected(StrContextValue::Description(
            "lambda body",
        )))
        .parse_next(input)?;
    Ok(LambdaSource { params, body })
}

fn lambda_head(input: &mut &str) -> ModalResult<Vec<String>> {
    let params = alt((
        ident.map(|p: &str| vec![p.to_string()]),
        delimited(
            literal("("),
            separated(
                0..,
                preceded(ws_skip, ident).map(str::to_string),
                preceded(ws_skip, literal(",")),
            ),
            preceded(ws_skip, literal(")")),
        ),
    ))
    .parse_next(input)?;
    ws_skip.parse_next(input)?;
    literal("=>").parse_next(input)?;
    Ok(params)
}

// ---------------------------------------------------------------------------
// Precedence levels (lowest to highest)
// ---------------------------------------------------------------------------

pub(super) fn parse_expr(input: &mut &str) -> ModalResult<SurfaceExpr> {
    cond_expr.parse_next(input)
}

/// `cond_expr = or_expr [ "?" cond_expr ":" cond_expr ]`
fn cond_expr(input: &mut &str) -> ModalResult<SurfaceExpr> {
    let test = or_expr.parse_next(input)?;
    let checkpoint = input.checkpoint();
    ws_skip.parse_next(input)?;
    // `??` is not a conditional
    if input.starts_with("??") || opt(literal("?")).parse_next(input)?.is_none() {
        input.reset(&checkpoint);
        return Ok(test);
    }
    ws_skip.parse_next(input)?;
    let if_true = cut_err(cond_expr).parse_next(input)?;
    ws_skip.parse_next(input)?;
    cut_err(literal(":"))
        .context(StrContext::Expected(StrContextValue::Description("':'")))
        .parse_next(input)?;
    ws_skip.parse_next(input)?;
    let if_false = cut_err(cond_expr).parse_next(input)?;
    Ok(SurfaceExpr::Conditional {
        test: Box::new(test),
        if_true: Box::new(if_true),
        if_false: Box::new(if_false),
    })
}

/// `or_expr = and_expr { "||" and_expr }`
fn or_expr(input: &mut &str) -> ModalResult<SurfaceExpr> {
    let mut left = and_expr.parse_next(input)?;
    loop {
        let checkpoint = input.checkpoint();
        ws_skip.parse_next(input)?;
        if opt(literal("||")).parse_next(input)?.is_some() {
            ws_skip.parse_next(input)?;
            let right = cut_err(and_expr).parse_next(input)?;
            left = SurfaceExpr::binary(BinaryOp::Or, left, right);
        } else {
            input.reset(&checkpoint);
            break;
        }
    }
    Ok(left)
}

/// `and_expr = eq_expr { "&&" eq_expr }`
fn and_expr(input: &mut &str) -> ModalResult<SurfaceExpr> {
    let mut left = eq_expr.parse_next(input)?;
    loop {
        let checkpoint = input.checkpoint();
        ws_skip.parse_next(input)?;
        if opt(literal("&&")).parse_next(input)?.is_some() {
            ws_skip.parse_next(input)?;
            let right = cut_err(eq_expr).parse_next(input)?;
            left = SurfaceExpr::binary(BinaryOp::And, left, right);
        } else {
            input.reset(&checkpoint);
            break;
        }
    }
    Ok(left)
}

/// `eq_expr = rel_expr { ("==" | "!=") rel_expr }`
fn eq_expr(input: &mut &str) -> ModalResult<SurfaceExpr> {
    let mut left = rel_expr.parse_next(input)?;
    loop {
        let checkpoint = input.checkpoint();
        ws_skip.parse_next(input)?;
        let op = opt(alt((
            literal("==").value(BinaryOp::Eq),
            literal("!=").value(BinaryOp::Ne),
        )))
        .parse_next(input)?;
        if let Some(op) = op {
            ws_skip.parse_next(input)?;
            let right = cut_err(rel_expr).parse_next(input)?;
            left = SurfaceExpr::binary(op, left, right);
        } else {
            input.reset(&checkpoint);
            break;
        }
    }
    Ok(left)
}

/// `rel_expr = add_expr { rel_op add_expr | "is" type | "as" type }`
fn rel_expr(input: &mut &str) -> ModalResult<SurfaceExpr> {
    let mut left = add_expr.parse_next(input)?;
    loop {
        let checkpoint = input.checkpoint();
        ws_skip.parse_next(input)?;
        if opt(kw("is")).parse_next(input)?.is_some() {
            ws_skip.parse_next(input)?;
            let ty = cut_err(type_expr).parse_next(input)?;
            left = SurfaceExpr::Is {
                operand: Box::new(left),
                ty,
            };
        } else if opt(kw("as")).parse_next(input)?.is_some() {
            ws_skip.parse_next(input)?;
            let ty = cut_err(type_expr).parse_next(input)?;
            left = SurfaceExpr::As {
                operand: Box::new(left),
                ty,
            };
        } else if let Some(op) = opt(rel_op).parse_next(input)? {
            ws_skip.parse_next(input)?;
            let right = cut_err(add_expr).parse_next(input)?;
            left = SurfaceExpr::binary(op, left, right);
        } else {
            input.reset(&checkpoint);
            break;
        }
    }
    Ok(left)
}

fn rel_op(input: &mut &str) -> ModalResult<BinaryOp> {
    alt((
        literal("<=").value(BinaryOp::Le),
        literal(">=").value(BinaryOp::Ge),
        literal("<").value(BinaryOp::Lt),
        literal(">").value(BinaryOp::Gt),
    ))
    .parse_next(input)
}

/// `add_expr = mul_expr { ("+" | "-") mul_expr }`
fn add_expr(input: &mut &str) -> ModalResult<SurfaceExpr> {
    let mut left = mul_expr.parse_next(input)?;
    loop {
        let checkpoint = input.checkpoint();
        ws_skip.parse_next(input)?;
        let op = opt(alt((
            literal("+").value(BinaryOp::Add),
            literal("-").value(BinaryOp::Sub),
        )))
        .parse_next(input)?;
        if let Some(op) = op {
            ws_skip.parse_next(input)?;
            let right = cut_err(mul_expr).parse_next(input)?;
            left = SurfaceExpr::binary(op, left, right);
        } else {
            input.reset(&checkpoint);
            break;
        }
    }
    Ok(left)
}

/// `mul_expr = unary_expr { ("*" | "/" | "%") unary_expr }`
fn mul_expr(input: &mut &str) -> ModalResult<SurfaceExpr> {
    let mut left = unary_expr.parse_next(input)?;
    loop {
        let checkpoint = input.checkpoint();
        ws_skip.parse_next(input)?;
        let op = opt(alt((
            literal("*").value(BinaryOp::Mul),
            literal("/").value(BinaryOp::Div),
            literal("%").value(BinaryOp::Mod),
        )))
        .parse_next(input)?;
        if let Some(op) = op {
            ws_skip.parse_next(input)?;
            let right = cut_err(unary_expr).parse_next(input)?;
            left = SurfaceExpr::binary(op, left, right);
        } else {
            input.reset(&checkpoint);
            break;
        }
    }
    Ok(left)
}

/// `unary_expr = "!" unary_expr | "-" number | "-" unary_expr | postfix_expr`
fn unary_expr(input: &mut &str) -> ModalResult<SurfaceExpr> {
    if opt(literal("!")).parse_next(input)?.is_some() {
        ws_skip.parse_next(input)?;
        let inner = cut_err(unary_expr).parse_next(input)?;
        return Ok(SurfaceExpr::Not(Box::new(inner)));
    }
    if opt(literal("-")).parse_next(input)?.is_some() {
        ws_skip.parse_next(input)?;
        if let Some(lit) = opt(number_literal).parse_next(input)? {
            return Ok(SurfaceExpr::Literal(negate_literal(lit)));
        }
        let inner = cut_err(unary_expr).parse_next(input)?;
        return Ok(SurfaceExpr::Negate(Box::new(inner)));
    }
    postfix_expr.parse_next(input)
}

fn negate_literal(lit: Literal) -> Literal {
    match lit {
        Literal::Int(v) => Literal::Int(-v),
        Literal::Long(v) => Literal::Long(-v),
        Literal::Double(v) => Literal::Double(-v),
        Literal::Single(v) => Literal::Single(-v),
        Literal::Decimal(v) => Literal::Decimal(-v),
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Postfix: member access, method calls, indexers
// ---------------------------------------------------------------------------

fn postfix_expr(input: &mut &str) -> ModalResult<SurfaceExpr> {
    let mut target = primary.parse_next(input)?;
    loop {
        let checkpoint = input.checkpoint();
        ws_skip.parse_next(input)?;
        if opt(literal(".")).parse_next(input)?.is_some() {
            ws_skip.parse_next(input)?;
            let name = cut_err(ident)
                .context(StrContext::Expected(StrContextValue::Description(
                    "member name",
                )))
                .parse_next(input)?
                .to_string();
            ws_skip.parse_next(input)?;
            if opt(literal("(")).parse_next(input)?.is_some() {
                let args = call_args.parse_next(input)?;
                target = SurfaceExpr::Call {
                    target: Box::new(target),
                    name,
                    args,
                };
            } else {
                target = SurfaceExpr::Member {
                    target: Box::new(target),
                    name,
                };
            }
        } else if opt(literal("[")).parse_next(input)?.is_some() {
            ws_skip.parse_next(input)?;
            let key = cut_err(parse_expr).parse_next(input)?;
            ws_skip.parse_next(input)?;
            cut_err(literal("]"))
                .context(StrContext::Expected(StrContextValue::Description("']'")))
                .parse_next(input)?;
            target = SurfaceExpr::Index {
                target: Box::new(target),
                key: Box::new(key),
            };
        } else {
            input.reset(&checkpoint);
            break;
        }
    }
    Ok(target)
}

/// Arguments after `(`; lambdas are allowed in argument position.
fn call_args(input: &mut &str) -> ModalResult<Vec<SurfaceExpr>> {
    ws_skip.parse_next(input)?;
    if opt(literal(")")).parse_next(input)?.is_some() {
        return Ok(vec![]);
    }
    let args: Vec<SurfaceExpr> =
        separated(1.., (ws_skip, argument).map(|(_, e)| e), literal(",")).parse_next(input)?;
    ws_skip.parse_next(input)?;
    cut_err(literal(")"))
        .context(StrContext::Expected(StrContextValue::Description("')'")))
        .parse_next(input)?;
    Ok(args)
}

fn argument(input: &mut &str) -> ModalResult<SurfaceExpr> {
    let e = match opt(lambda).parse_next(input)? {
        Some(l) => SurfaceExpr::Lambda(Box::new(l)),
        None => parse_expr.parse_next(input)?,
    };
    ws_skip.parse_next(input)?;
    Ok(e)
}

// ---------------------------------------------------------------------------
// Primary
// ---------------------------------------------------------------------------

fn primary(input: &mut &str) -> ModalResult<SurfaceExpr> {
    alt((
        number_literal.map(SurfaceExpr::Literal),
        quoted_string.map(|s| SurfaceExpr::Literal(Literal::String(s))),
        char_literal.map(SurfaceExpr::Literal),
        datetime_literal.map(SurfaceExpr::Literal),
        guid_literal.map(SurfaceExpr::Literal),
        kw("true").map(|_| SurfaceExpr::Literal(Literal::Bool(true))),
        kw("false").map(|_| SurfaceExpr::Literal(Literal::Bool(false))),
        kw("null").map(|_| SurfaceExpr::Literal(Literal::Null)),
        captured,
        cast_expr,
        array_expr,
        paren_expr,
        ident.map(SurfaceExpr::ident),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "expression",
    )))
    .parse_next(input)
}

fn paren_expr(input: &mut &str) -> ModalResult<SurfaceExpr> {
    literal("(").parse_next(input)?;
    ws_skip.parse_next(input)?;
    let inner = cut_err(parse_expr).parse_next(input)?;
    ws_skip.parse_next(input)?;
    cut_err(literal(")"))
        .context(StrContext::Expected(StrContextValue::Description("')'")))
        .parse_next(input)?;
    Ok(inner)
}

/// `[a, b, c]`
fn array_expr(input: &mut &str) -> ModalResult<SurfaceExpr> {
    literal("[").parse_next(input)?;
    ws_skip.parse_next(input)?;
    if opt(literal("]")).parse_next(input)?.is_some() {
        return Ok(SurfaceExpr::Array(vec![]));
    }
    let items: Vec<SurfaceExpr> = separated(
        1..,
        (ws_skip, parse_expr, ws_skip).map(|(_, e, _)| e),
        literal(","),
    )
    .parse_next(input)?;
    cut_err(literal("]"))
        .context(StrContext::Expected(StrContextValue::Description("']'")))
        .parse_next(input)?;
    Ok(SurfaceExpr::Array(items))
}

/// `@name`
fn captured(input: &mut &str) -> ModalResult<SurfaceExpr> {
    literal("@").parse_next(input)?;
    let name = cut_err(ident)
        .context(StrContext::Expected(StrContextValue::Description(
            "variable name",
        )))
        .parse_next(input)?;
    Ok(SurfaceExpr::Captured(name.to_string()))
}

/// `cast<T>(operand)`
fn cast_expr(input: &mut &str) -> ModalResult<SurfaceExpr> {
    kw("cast").parse_next(input)?;
    ws_skip.parse_next(input)?;
    literal("<").parse_next(input)?;
    ws_skip.parse_next(input)?;
    let ty = cut_err(type_expr).parse_next(input)?;
    ws_skip.parse_next(input)?;
    cut_err(literal(">"))
        .context(StrContext::Expected(StrContextValue::Description("'>'")))
        .parse_next(input)?;
    ws_skip.parse_next(input)?;
    cut_err(literal("("))
        .context(StrContext::Expected(StrContextValue::Description("'('")))
        .parse_next(input)?;
    ws_skip.parse_next(input)?;
    let operand = cut_err(parse_expr).parse_next(input)?;
    ws_skip.parse_next(input)?;
    cut_err(literal(")"))
        .context(StrContext::Expected(StrContextValue::Description("')'")))
        .parse_next(input)?;
    Ok(SurfaceExpr::Cast {
        ty,
        operand: Box::new(operand),
    })
}

// ---------------------------------------------------------------------------
// Literals
// ---------------------------------------------------------------------------

/// Integer, `L` long, double, `f` single or `m` decimal.
pub(super) fn number_literal(input: &mut &str) -> ModalResult<Literal> {
    let integer_part = take_while(1.., |c: char| c.is_ascii_digit()).parse_next(input)?;
    let checkpoint = input.checkpoint();
    let frac_part = if opt(literal(".")).parse_next(input)?.is_some() {
        match opt(take_while(1.., |c: char| c.is_ascii_digit())).parse_next(input)? {
            Some(frac) => Some(frac),
            None => {
                // `1.Equals(..)`: the dot starts a member access
                input.reset(&checkpoint);
                None
            }
        }
    } else {
        None
    };
    let exponent = exponent_part.parse_next(input)?;
    let mut text = match frac_part {
        Some(frac) => format!("{integer_part}.{frac}"),
        None => integer_part.to_string(),
    };
    if let Some(exp) = &exponent {
        text.push_str(exp);
    }
    let real = frac_part.is_some() || exponent.is_some();

    let suffix = opt(alt((
        literal("L"),
        literal("l"),
        literal("f"),
        literal("F"),
        literal("m"),
        literal("M"),
        literal("d"),
        literal("D"),
    )))
    .parse_next(input)?;
    if input.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_') {
        return Err(malformed_number(input));
    }

    let lit = match (suffix.map(|s| s.to_ascii_lowercase()).as_deref(), real) {
        (Some("l"), false) => text.parse().map(Literal::Long).ok(),
        (Some("l"), true) => None,
        (Some("f"), _) => text.parse().map(Literal::Single).ok(),
        (Some("m"), _) if exponent.is_some() => {
            Decimal::from_scientific(&text).map(Literal::Decimal).ok()
        }
        (Some("m"), _) => Decimal::from_str(&text).map(Literal::Decimal).ok(),
        (Some(_), _) | (None, true) => text.parse().map(Literal::Double).ok(),
        (None, false) => text.parse().map(Literal::Int).ok(),
    };
    lit.ok_or_else(|| malformed_number(input))
}

/// `e5`, `E-3`, `e+10`. An `e` without digits is left unconsumed.
fn exponent_part(input: &mut &str) -> ModalResult<Option<String>> {
    let checkpoint = input.checkpoint();
    if opt(alt((literal("e"), literal("E")))).parse_next(input)?.is_none() {
        return Ok(None);
    }
    let sign = opt(alt((literal("+"), literal("-")))).parse_next(input)?;
    match opt(take_while(1.., |c: char| c.is_ascii_digit())).parse_next(input)? {
        Some(digits) => Ok(Some(format!("e{}{digits}", sign.unwrap_or("")))),
        None => {
            input.reset(&checkpoint);
            Ok(None)
        }
    }
}

fn malformed_number(input: &mut &str) -> ErrMode<ContextError> {
    ErrMode::Cut(ContextError::new().add_context(
        input,
        &input.checkpoint(),
        StrContext::Expected(StrContextValue::Description("number literal")),
    ))
}

/// `'c'`, with `\'` and `\\` escapes.
fn char_literal(input: &mut &str) -> ModalResult<Literal> {
    literal("'").parse_next(input)?;
    let mut c = any.parse_next(input)?;
    if c == '\\' {
        c = cut_err(any).parse_next(input)?;
    }
    cut_err(literal("'"))
        .context(StrContext::Expected(StrContextValue::Description(
            "closing quote of char literal",
        )))
        .parse_next(input)?;
    Ok(Literal::Char(c))
}

/// `datetime'2014-03-05T10:20:30Z'`
fn datetime_literal(input: &mut &str) -> ModalResult<Literal> {
    literal("datetime").parse_next(input)?;
    let text = single_quoted.parse_next(input)?;
    match DateTimeValue::parse(&text) {
        Some(v) => Ok(Literal::DateTime(v)),
        None => Err(ErrMode::Cut(ContextError::new().add_context(
            input,
            &input.checkpoint(),
            StrContext::Expected(StrContextValue::Description(
                "datetime 'yyyy-MM-ddTHH:mm:ss'",
            )),
        ))),
    }
}

/// `guid'xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx'`
fn guid_literal(input: &mut &str) -> ModalResult<Literal> {
    literal("guid").parse_next(input)?;
    let text = single_quoted.parse_next(input)?;
    match Uuid::parse_str(&text) {
        Ok(v) => Ok(Literal::Guid(v)),
        Err(_) => Err(ErrMode::Cut(ContextError::new().add_context(
            input,
            &input.checkpoint(),
            StrContext::Expected(StrContextValue::Description("guid")),
        ))),
    }
}
