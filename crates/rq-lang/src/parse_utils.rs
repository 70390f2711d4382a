use winnow::ascii::multispace0;
use winnow::combinator::{cut_err, opt};
use winnow::error::{ContextError, ErrMode, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, literal, take_while};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

pub fn ident<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    // First character must be alphabetic or underscore (not digit).
    if !input.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        return Err(ErrMode::Backtrack(ContextError::new()));
    }
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_').parse_next(input)
}

// ---------------------------------------------------------------------------
// Strings
// ---------------------------------------------------------------------------

/// `"..."` with `\"` and `\\` escapes.
pub fn quoted_string(input: &mut &str) -> ModalResult<String> {
    literal("\"").parse_next(input)?;
    let mut out = String::new();
    loop {
        let chunk = take_while(0.., |c: char| c != '"' && c != '\\').parse_next(input)?;
        out.push_str(chunk);
        if opt(literal("\\")).parse_next(input)?.is_some() {
            let escaped = cut_err(any)
                .context(StrContext::Expected(StrContextValue::Description(
                    "escaped character",
                )))
                .parse_next(input)?;
            out.push(escaped);
            continue;
        }
        break;
    }
    cut_err(literal("\""))
        .context(StrContext::Expected(StrContextValue::Description(
            "closing quote",
        )))
        .parse_next(input)?;
    Ok(out)
}

/// `'...'` with `''` standing for one quote. Used by prefixed literals
/// such as `datetime'..'`.
pub fn single_quoted(input: &mut &str) -> ModalResult<String> {
    literal("'").parse_next(input)?;
    let mut out = String::new();
    loop {
        let chunk = take_while(0.., |c: char| c != '\'').parse_next(input)?;
        out.push_str(chunk);
        cut_err(literal("'"))
            .context(StrContext::Expected(StrContextValue::Description(
                "closing quote",
            )))
            .parse_next(input)?;
        if opt(literal("'")).parse_next(input)?.is_some() {
            out.push('\'');
        } else {
            break;
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Whitespace & comments
// ---------------------------------------------------------------------------

/// Skip whitespace and `# ...` line comments.
pub fn ws_skip(input: &mut &str) -> ModalResult<()> {
    loop {
        let _ = multispace0.parse_next(input)?;
        if opt(literal("#")).parse_next(input)?.is_some() {
            let _ = take_while(0.., |c: char| c != '\n').parse_next(input)?;
        } else {
            break;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Keyword matching with word boundary
// ---------------------------------------------------------------------------

/// Match an exact keyword string, ensuring it's not a prefix of a longer
/// identifier (i.e. the next character is not alphanumeric or `_`).
pub fn kw<'a>(keyword: &'static str) -> impl FnMut(&mut &'a str) -> ModalResult<()> {
    move |input: &mut &'a str| {
        let saved = *input;
        literal(keyword).parse_next(input)?;
        if input.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_') {
            *input = saved;
            return Err(ErrMode::Backtrack(ContextError::new()));
        }
        Ok(())
    }
}

/// Signed integer literal (digits only, no decimal point).
pub fn integer_literal(input: &mut &str) -> ModalResult<i64> {
    let saved = *input;
    let negative = opt(literal("-")).parse_next(input)?.is_some();
    let digits = take_while(1.., |c: char| c.is_ascii_digit()).parse_next(input)?;
    if input.starts_with('.') {
        *input = saved;
        return Err(ErrMode::Backtrack(ContextError::new()));
    }
    let magnitude: i64 = digits.parse().map_err(|_| {
        *input = saved;
        ErrMode::Cut(ContextError::new())
    })?;
    Ok(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaped_double_quoted() {
        let s = quoted_string.parse(r#""say \"hi\" \\ bye""#).unwrap();
        assert_eq!(s, r#"say "hi" \ bye"#);
    }

    #[test]
    fn doubled_single_quotes() {
        assert_eq!(single_quoted.parse("'O''Neil'").unwrap(), "O'Neil");
        assert_eq!(single_quoted.parse("''").unwrap(), "");
        assert!(single_quoted.parse("'open").is_err());
    }

    #[test]
    fn keyword_boundary() {
        assert!(kw("enum").parse("enum").is_ok());
        assert!(kw("enum").parse("enumeration").is_err());
    }

    #[test]
    fn integers() {
        assert_eq!(integer_literal.parse("-12").unwrap(), -12);
        assert_eq!(integer_literal.parse("7").unwrap(), 7);
        assert!(integer_literal.parse("1.5").is_err());
    }

    #[test]
    fn comments_are_skipped() {
        let mut input = "  # note\n  # more\n  x";
        ws_skip(&mut input).unwrap();
        assert_eq!(input, "x");
    }
}
