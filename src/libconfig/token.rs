//! Terminal combinators: whitespace and comments, setting names, scalar
//! literals and the `@include` directive

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, tag_no_case, take_till, take_until, take_while, take_while_m_n},
    character::complete::{char, digit0, digit1, hex_digit1, multispace1, one_of, satisfy, space0},
    combinator::{map, map_opt, not, opt, recognize, value},
    error::ErrorKind,
    multi::{fold_many0, many0, many0_count},
    sequence::{pair, preceded, terminated, tuple},
    IResult,
};

use super::{ParseError, Value};

pub(crate) type PResult<'a, O> = IResult<&'a str, O, SyntaxError<'a>>;

/// Error carried through the combinators
#[derive(Debug)]
pub(crate) enum SyntaxError<'a> {
    /// Failure at a position in the text being parsed
    At { input: &'a str, message: String },
    /// Failure already located in an included file
    Located(ParseError),
}

impl<'a> nom::error::ParseError<&'a str> for SyntaxError<'a> {
    fn from_error_kind(input: &'a str, _kind: ErrorKind) -> Self {
        SyntaxError::At {
            input,
            message: format!("unexpected {}", found(input)),
        }
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

/// Unrecoverable error at `input`
pub(crate) fn fail(input: &str, message: impl Into<String>) -> nom::Err<SyntaxError<'_>> {
    nom::Err::Failure(SyntaxError::At {
        input,
        message: message.into(),
    })
}

pub(crate) fn expected<'a>(input: &'a str, what: &str) -> nom::Err<SyntaxError<'a>> {
    fail(input, format!("expected {}, found {}", what, found(input)))
}

/// Replace a recoverable error with `failure`
pub(crate) fn commit<'a, O>(
    result: PResult<'a, O>,
    failure: impl FnOnce() -> nom::Err<SyntaxError<'a>>,
) -> PResult<'a, O> {
    match result {
        Err(nom::Err::Error(_)) => Err(failure()),
        other => other,
    }
}

/// Describe what starts at `input`, for diagnostics
pub(crate) fn found(input: &str) -> String {
    match input.chars().next() {
        None => "end of input".to_string(),
        Some(c) if is_name_char(c) => {
            let word: String = input.chars().take_while(|&c| is_name_char(c)).collect();
            format!("`{}`", word)
        }
        Some(c) => format!("`{}`", c),
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '*')
}

/// Whitespace and `#`, `//`, `/* */` comments
pub(crate) fn trivia(input: &str) -> PResult<'_, ()> {
    value((), many0_count(alt((multispace1, line_comment, block_comment))))(input)
}

fn line_comment(input: &str) -> PResult<'_, &str> {
    recognize(pair(alt((tag("#"), tag("//"))), take_till(|c: char| c == '\n')))(input)
}

fn block_comment(input: &str) -> PResult<'_, &str> {
    let (rest, _) = tag("/*")(input)?;
    let (rest, body) = commit(take_until("*/")(rest), || fail(input, "unterminated comment"))?;
    let (rest, _) = tag("*/")(rest)?;
    Ok((rest, body))
}

/// `[A-Za-z*][-A-Za-z0-9_*]*`
pub(crate) fn setting_name(input: &str) -> PResult<'_, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '*'),
        take_while(is_name_char),
    ))(input)
}

/// Any scalar: strings (adjacent literals joined), booleans, integers and
/// floats
pub(crate) fn scalar(input: &str) -> PResult<'_, Value> {
    alt((
        map(string, Value::Str),
        map(boolean, Value::Bool),
        map(hex_integer, Value::Int),
        map(float, Value::Float),
        map(integer, Value::Int),
    ))(input)
}

fn boolean(input: &str) -> PResult<'_, bool> {
    terminated(
        alt((
            value(true, tag_no_case("true")),
            value(false, tag_no_case("false")),
        )),
        not(satisfy(is_name_char)),
    )(input)
}

fn long_suffix(input: &str) -> PResult<'_, Option<&str>> {
    opt(alt((tag("LL"), tag("L"))))(input)
}

fn hex_integer(input: &str) -> PResult<'_, i64> {
    let (rest, (sign, _, digits, _)) =
        tuple((opt(one_of("+-")), tag_no_case("0x"), hex_digit1, long_suffix))(input)?;
    let magnitude = u64::from_str_radix(digits, 16)
        .map_err(|_| fail(input, format!("hex integer out of range `0x{}`", digits)))?;
    // 64-bit hex literals keep their bit pattern
    let value = magnitude as i64;
    Ok((rest, if sign == Some('-') { value.wrapping_neg() } else { value }))
}

fn exponent(input: &str) -> PResult<'_, &str> {
    recognize(tuple((one_of("eE"), opt(one_of("+-")), digit1)))(input)
}

fn float(input: &str) -> PResult<'_, f64> {
    let (rest, text) = recognize(pair(
        opt(one_of("+-")),
        alt((
            recognize(tuple((digit1, char('.'), digit0, opt(exponent)))),
            recognize(tuple((char('.'), digit1, opt(exponent)))),
            recognize(pair(digit1, exponent)),
        )),
    ))(input)?;
    let value = text
        .parse::<f64>()
        .map_err(|_| fail(input, format!("invalid float `{}`", text)))?;
    Ok((rest, value))
}

fn integer(input: &str) -> PResult<'_, i64> {
    let (rest, text) = recognize(pair(opt(one_of("+-")), digit1))(input)?;
    let (rest, _) = long_suffix(rest)?;
    let value = text
        .parse::<i64>()
        .map_err(|_| fail(input, format!("integer out of range `{}`", text)))?;
    Ok((rest, value))
}

enum Fragment<'a> {
    Literal(&'a str),
    Escaped(char),
}

/// `\\ \" \n \r \t \f \xHH`
fn escape(input: &str) -> PResult<'_, char> {
    let (rest, _) = char('\\')(input)?;
    let result = alt((
        value('\\', char('\\')),
        value('"', char('"')),
        value('\n', char('n')),
        value('\r', char('r')),
        value('\t', char('t')),
        value('\u{0c}', char('f')),
        map_opt(
            preceded(char('x'), take_while_m_n(2, 2, |c: char| c.is_ascii_hexdigit())),
            |hex: &str| u8::from_str_radix(hex, 16).ok().map(char::from),
        ),
    ))(rest);
    commit(result, || {
        let shown: String = input.chars().take(2).collect();
        fail(input, format!("invalid escape `{}`", shown))
    })
}

fn string_literal(input: &str) -> PResult<'_, String> {
    let (rest, _) = char('"')(input)?;
    let (rest, text) = fold_many0(
        alt((
            map(is_not("\"\\"), Fragment::Literal),
            map(escape, Fragment::Escaped),
        )),
        String::new,
        |mut text, fragment| {
            match fragment {
                Fragment::Literal(s) => text.push_str(s),
                Fragment::Escaped(c) => text.push(c),
            }
            text
        },
    )(rest)?;
    let (rest, _) = commit(char('"')(rest), || fail(input, "unterminated string"))?;
    Ok((rest, text))
}

/// A string literal followed by any adjacent literals, joined
fn string(input: &str) -> PResult<'_, String> {
    let (rest, first) = string_literal(input)?;
    let (rest, more) = many0(preceded(trivia, string_literal))(rest)?;
    let joined = more.iter().fold(first, |mut joined, next| {
        joined.push_str(next);
        joined
    });
    Ok((rest, joined))
}

/// `@include "path"`, returning the path
pub(crate) fn include_directive(input: &str) -> PResult<'_, String> {
    let (rest, _) = char('@')(input)?;
    let (rest, word) = take_while(|c: char| c.is_ascii_alphabetic())(rest)?;
    if word != "include" {
        return Err(fail(input, format!("unknown directive `@{}`", word)));
    }
    let (rest, _) = space0(rest)?;
    commit(string_literal(rest), || {
        expected(rest, "a quoted path after `@include`")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalars(text: &str) -> Vec<Value> {
        let (rest, values) = many0(preceded(trivia, scalar))(text).unwrap();
        assert_eq!(rest.trim(), "");
        values
    }

    fn message(result: PResult<'_, impl std::fmt::Debug>) -> String {
        match result {
            Err(nom::Err::Failure(SyntaxError::At { message, .. })) => message,
            other => panic!("expected a failure, got {:?}", other),
        }
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            scalars("1 -2 +3 0x1F 42L 7LL 1.5 .5 2. 1e3 -2.5E-3 0xFFFFFFFFFFFFFFFF"),
            vec![
                Value::Int(1),
                Value::Int(-2),
                Value::Int(3),
                Value::Int(31),
                Value::Int(42),
                Value::Int(7),
                Value::Float(1.5),
                Value::Float(0.5),
                Value::Float(2.0),
                Value::Float(1000.0),
                Value::Float(-0.0025),
                Value::Int(-1),
            ]
        );
    }

    #[test]
    fn test_booleans_and_names() {
        assert_eq!(scalars("TRUE false"), vec![Value::Bool(true), Value::Bool(false)]);
        assert_eq!(setting_name("trueish = 1").unwrap(), (" = 1", "trueish"));
        assert!(boolean("trueish").is_err());
        assert_eq!(setting_name("*a-b_1: x").unwrap(), (": x", "*a-b_1"));
        assert!(setting_name("1a").is_err());
    }

    #[test]
    fn test_comments_are_skipped() {
        let (rest, ()) = trivia("# hash\n// slash\n/* block\n comment */  a").unwrap();
        assert_eq!(rest, "a");
        assert_eq!(message(trivia("/* never closed")), "unterminated comment");
    }

    #[test]
    fn test_string_escapes_and_concatenation() {
        assert_eq!(
            scalars(r#""a\"b\\c\n\x41""#),
            vec![Value::Str("a\"b\\c\nA".into())]
        );
        assert_eq!(
            scalars(r#""Agana, " "" /* gap */ "Guam" 1"#),
            vec![Value::Str("Agana, Guam".into()), Value::Int(1)]
        );
        assert_eq!(message(scalar(r#""bad \q""#)), "invalid escape `\\q`");
        assert_eq!(message(scalar("\"open")), "unterminated string");
    }

    #[test]
    fn test_integer_out_of_range() {
        assert!(message(scalar("99999999999999999999")).contains("out of range"));
    }

    #[test]
    fn test_include_directive() {
        let (rest, path) = include_directive("@include \"stations.cfg\"\nx = 1;").unwrap();
        assert_eq!(path, "stations.cfg");
        assert_eq!(rest, "\nx = 1;");

        assert_eq!(
            message(include_directive("@import \"x\"")),
            "unknown directive `@import`"
        );
        assert!(message(include_directive("@include stations")).contains("quoted path"));
    }
}
