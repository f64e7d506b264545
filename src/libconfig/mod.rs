//! Reader for the libconfig text format used by dumphfdl system tables
//!
//! A system table looks like:
//!
//! ```text
//! version = 51;
//! stations = (
//!   {
//!     id = 1;
//!     name = "Shannon, Ireland";
//!     lat = 52.7;
//!     lon = -8.92;
//!     frequencies = ( 2998, 3476, 5720 );
//!   }
//! );
//! ```
//!
//! The grammar is built from `nom` combinators; `@include`d files are parsed
//! as documents of their own and their settings spliced into the enclosing
//! group.

mod parser;
mod token;

use indexmap::IndexMap;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::error::ConvertError;

/// Settings of a group, in the order they appear in the source
pub type Group = IndexMap<String, Value>;

/// A parsed libconfig value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// `[ ... ]`, scalars of a single type
    Array(Vec<Value>),
    /// `( ... )`, any values
    List(Vec<Value>),
    /// `{ ... }`
    Group(Group),
}

impl Value {
    /// Look up a setting when this value is a group
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Group(group) => group.get(name),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Elements of an array or a list
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) | Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Value::Group(group) => Some(group),
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_)
        )
    }

    /// Name of the value's type, as used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::List(_) => "list",
            Value::Group(_) => "group",
        }
    }
}

impl fmt::Display for Value {
    /// Scalars print the way the original converter substituted them into
    /// strings: floats keep a fractional part (`10.0`), integers do not.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) if x.is_finite() => f.write_str(&float_repr(*x)),
            Value::Float(x) if x.is_nan() => write!(f, "nan"),
            Value::Float(x) if *x > 0.0 => write!(f, "inf"),
            Value::Float(_) => write!(f, "-inf"),
            Value::Str(s) => write!(f, "{}", s),
            Value::Array(items) | Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Group(group) => {
                write!(f, "{{")?;
                for (i, (name, value)) in group.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Shortest round-trip form, exponents spelled with a sign and at least two
/// digits (`5e-05`, `1e+16`)
fn float_repr(x: f64) -> String {
    let repr = format!("{:?}", x);
    match repr.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => repr,
    }
}

/// Malformed configuration syntax, located by source, line and column
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{origin}:{line}:{column}: {message}")]
pub struct ParseError {
    pub origin: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Parse a document held in memory. `@include` paths resolve against
/// `base_dir`.
pub fn parse_source(text: &str, origin: &str, base_dir: &Path) -> Result<Value, ParseError> {
    parser::Document::new(text, origin, base_dir).parse()
}

/// Parse a document held in memory, resolving `@include` against the
/// current directory.
pub fn parse_str(text: &str) -> Result<Value, ParseError> {
    parse_source(text, "<string>", Path::new("."))
}

/// Read and parse a system table. A path of `-` reads standard input.
pub fn load(path: &Path) -> Result<Value, ConvertError> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|source| ConvertError::InputAccess {
                path: path.to_path_buf(),
                source,
            })?;
        return Ok(parse_source(&text, "<stdin>", Path::new("."))?);
    }

    let text = std::fs::read_to_string(path).map_err(|source| ConvertError::InputAccess {
        path: path.to_path_buf(),
        source,
    })?;
    let base_dir = include_base(path);
    Ok(parse_source(&text, &path.display().to_string(), &base_dir)?)
}

/// Directory that `@include` directives in `path` resolve against
pub(crate) fn include_base(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
