//! Document structure: settings, groups, lists, arrays and `@include`
//! splicing, built on the combinators in [`super::token`]

use nom::character::complete::{char, one_of};
use nom::combinator::opt;
use std::mem::discriminant;
use std::path::Path;

use super::token::{
    commit, expected, fail, include_directive, scalar, setting_name, trivia, PResult,
    SyntaxError,
};
use super::{Group, ParseError, Value};

/// Maximum nesting of `@include` directives
const MAX_INCLUDE_DEPTH: usize = 10;

/// Maximum nesting of groups, lists and arrays
const MAX_NESTING: usize = 32;

/// One source text being parsed, with what its `@include`s resolve against
pub(crate) struct Document<'s> {
    source: &'s str,
    origin: &'s str,
    base_dir: &'s Path,
    include_depth: usize,
}

impl<'s> Document<'s> {
    pub(crate) fn new(source: &'s str, origin: &'s str, base_dir: &'s Path) -> Self {
        Document {
            source,
            origin,
            base_dir,
            include_depth: 0,
        }
    }

    /// The top level of a document is an unbraced group
    pub(crate) fn parse(&self) -> Result<Value, ParseError> {
        self.root().map(Value::Group)
    }

    fn root(&self) -> Result<Group, ParseError> {
        match self.settings(self.source, None, 0) {
            Ok((_, group)) => Ok(group),
            Err(nom::Err::Error(error)) | Err(nom::Err::Failure(error)) => Err(self.locate(error)),
            Err(nom::Err::Incomplete(_)) => Err(self.error_at(
                &self.source[self.source.len()..],
                "unexpected end of input",
            )),
        }
    }

    fn locate(&self, error: SyntaxError<'_>) -> ParseError {
        match error {
            SyntaxError::Located(error) => error,
            SyntaxError::At { input, message } => self.error_at(input, message),
        }
    }

    /// `input` is always a suffix of `source`
    fn error_at(&self, input: &str, message: impl Into<String>) -> ParseError {
        let offset = self.source.len().saturating_sub(input.len());
        let consumed = &self.source[..offset];
        let line = consumed.matches('\n').count() + 1;
        let column = consumed
            .rsplit('\n')
            .next()
            .map_or(0, |tail| tail.chars().count())
            + 1;
        ParseError {
            origin: self.origin.to_string(),
            line,
            column,
            message: message.into(),
        }
    }

    /// Settings up to `close`, or to the end of input for the top level.
    /// The closing character is left for the caller.
    fn settings(&self, input: &'s str, close: Option<char>, nesting: usize) -> PResult<'s, Group> {
        let mut group = Group::new();
        let mut input = input;
        loop {
            let (rest, _) = trivia(input)?;
            if rest.is_empty() || close.is_some_and(|close| rest.starts_with(close)) {
                return Ok((rest, group));
            }

            if rest.starts_with('@') {
                let (after, path) = include_directive(rest)?;
                for (name, value) in self.include(rest, &path)? {
                    if group.contains_key(&name) {
                        return Err(fail(rest, format!("duplicate setting `{}`", name)));
                    }
                    group.insert(name, value);
                }
                input = after;
                continue;
            }

            let start = rest;
            let (rest, name) = commit(setting_name(start), || expected(start, "a setting name"))?;
            let (rest, _) = trivia(rest)?;
            let (rest, _) = commit(one_of("=:")(rest), || {
                expected(rest, &format!("`=` or `:` after `{}`", name))
            })?;
            let (rest, _) = trivia(rest)?;
            let (rest, value) = self.value(rest, nesting)?;
            if group.contains_key(name) {
                return Err(fail(start, format!("duplicate setting `{}`", name)));
            }
            group.insert(name.to_string(), value);

            let (rest, _) = trivia(rest)?;
            let (rest, _) = opt(one_of(";,"))(rest)?;
            input = rest;
        }
    }

    fn value(&self, input: &'s str, nesting: usize) -> PResult<'s, Value> {
        let open = match input.chars().next() {
            Some(open @ ('{' | '(' | '[')) => open,
            _ => return commit(scalar(input), || expected(input, "a value")),
        };
        if nesting >= MAX_NESTING {
            return Err(fail(input, "groups, lists and arrays nested too deeply"));
        }

        let (inner, _) = char(open)(input)?;
        match open {
            '{' => {
                let (rest, group) = self.settings(inner, Some('}'), nesting + 1)?;
                let (rest, ()) = self.close(input, rest, '}')?;
                Ok((rest, Value::Group(group)))
            }
            '(' => {
                let (rest, items) = self.sequence(input, inner, ')', nesting + 1)?;
                Ok((rest, Value::List(items)))
            }
            _ => {
                let (rest, items) = self.sequence(input, inner, ']', nesting + 1)?;
                check_array(input, &items)?;
                Ok((rest, Value::Array(items)))
            }
        }
    }

    /// Comma separated values up to `close`; a trailing comma is allowed
    fn sequence(
        &self,
        open: &'s str,
        input: &'s str,
        close: char,
        nesting: usize,
    ) -> PResult<'s, Vec<Value>> {
        let mut items = Vec::new();
        let mut input = input;
        loop {
            let (rest, _) = trivia(input)?;
            if rest.starts_with(close) || rest.is_empty() {
                let (rest, ()) = self.close(open, rest, close)?;
                return Ok((rest, items));
            }

            let (rest, item) = self.value(rest, nesting)?;
            items.push(item);
            let (rest, _) = trivia(rest)?;
            match opt(char(','))(rest)? {
                (rest, Some(_)) => input = rest,
                (rest, None) => {
                    let (rest, ()) = self.close(open, rest, close)?;
                    return Ok((rest, items));
                }
            }
        }
    }

    fn close(&self, open: &'s str, input: &'s str, close: char) -> PResult<'s, ()> {
        let (input, _) = trivia(input)?;
        if input.is_empty() {
            let bracket: String = open.chars().take(1).collect();
            return Err(fail(open, format!("unclosed `{}`", bracket)));
        }
        let (rest, _) = commit(char(close)(input), || {
            expected(input, &format!("`{}`", close))
        })?;
        Ok((rest, ()))
    }

    /// Settings of an included file, parsed as a document of its own
    fn include(&self, at: &'s str, path: &str) -> Result<Group, nom::Err<SyntaxError<'s>>> {
        if self.include_depth >= MAX_INCLUDE_DEPTH {
            return Err(fail(at, format!("include nesting too deep at \"{}\"", path)));
        }

        let full_path = self.base_dir.join(path);
        let text = std::fs::read_to_string(&full_path).map_err(|e| {
            fail(at, format!("cannot include \"{}\": {}", full_path.display(), e))
        })?;
        let origin = full_path.display().to_string();
        let base_dir = super::include_base(&full_path);

        let nested = Document {
            source: &text,
            origin: &origin,
            base_dir: &base_dir,
            include_depth: self.include_depth + 1,
        };
        nested
            .root()
            .map_err(|error| nom::Err::Failure(SyntaxError::Located(error)))
    }
}

/// Arrays hold scalars of one type
fn check_array<'s>(open: &'s str, items: &[Value]) -> Result<(), nom::Err<SyntaxError<'s>>> {
    if let Some(bad) = items.iter().find(|v| !v.is_scalar()) {
        return Err(fail(
            open,
            format!("array elements must be scalars, found {}", bad.type_name()),
        ));
    }
    if let Some(first) = items.first() {
        if items.iter().any(|v| discriminant(v) != discriminant(first)) {
            return Err(fail(open, "array elements must all have the same type"));
        }
    }
    Ok(())
}
