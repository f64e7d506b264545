//! JSON output: `{"stations": {...}, "bands": {...}}`
//!
//! The document is laid out exactly as the original Python converter wrote
//! it with `json.dump`: `", "` and `": "` separators, no indentation, and
//! non-ASCII text escaped as `\uXXXX`. Band keys become JSON strings.

use serde::Serialize;
use serde_json::ser::Formatter;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::bands::{BandTable, StationTable};
use crate::error::ConvertError;

/// The output document
#[derive(Debug, Serialize)]
pub struct SystemTable<'a> {
    pub stations: &'a StationTable,
    pub bands: &'a BandTable,
}

/// Compact JSON with spaced separators and ASCII-only output
#[derive(Debug, Default, Clone, Copy)]
pub struct CompatFormatter;

impl Formatter for CompatFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            if c.is_ascii() && c != '\x7f' {
                continue;
            }
            writer.write_all(fragment[start..i].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = i + c.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// Serialize any value with [`CompatFormatter`]
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, CompatFormatter);
    value.serialize(&mut serializer)?;
    Ok(out)
}

/// Write the document to `path`, replacing any existing file. The document
/// is fully serialized before the file is opened.
pub fn write_json(path: &Path, table: &SystemTable<'_>) -> Result<(), ConvertError> {
    let write_error = |source: io::Error| ConvertError::Write {
        path: path.to_path_buf(),
        source,
    };

    let bytes = to_json(table).map_err(|e| write_error(e.into()))?;
    std::fs::write(path, &bytes).map_err(write_error)?;

    debug!(path = %path.display(), bytes = bytes.len(), "wrote system table");
    Ok(())
}

/// Check that the directory `path` would be written into exists
pub fn check_output_path(path: &Path) -> Result<PathBuf, ConvertError> {
    let parent = std::path::absolute(path)
        .ok()
        .and_then(|absolute| absolute.parent().map(Path::to_path_buf));

    match parent {
        Some(dir) if dir.is_dir() => Ok(path.to_path_buf()),
        Some(dir) => Err(ConvertError::OutputPath { path: dir }),
        None => Err(ConvertError::OutputPath {
            path: path.to_path_buf(),
        }),
    }
}
