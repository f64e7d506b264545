//! Command-line interface definitions and argument parsing

use clap::Parser;
use std::io;
use std::path::PathBuf;

use crate::error::ConvertError;
use crate::output::check_output_path;

/// Convert a dumphfdl system table into a JSON station and band table
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the system table configuration (`-` for standard input)
    #[arg(value_name = "SYSTABLE", value_parser = readable_input)]
    pub systable: PathBuf,

    /// Output path for the JSON document
    #[arg(short, long, value_name = "FILE", default_value = "systable.json", value_parser = writable_output)]
    pub output: PathBuf,

    /// Enable verbose output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Silence all diagnostics
    #[arg(short, long)]
    pub quiet: bool,
}

/// How much diagnostic output a run emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    /// Errors only
    #[default]
    Normal,
    Verbose,
}

impl Args {
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else if self.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }
}

/// The input must be a readable file, or `-`
fn readable_input(value: &str) -> Result<PathBuf, ConvertError> {
    let path = PathBuf::from(value);
    if value == "-" {
        return Ok(path);
    }

    let input_error = |source: io::Error| ConvertError::InputAccess {
        path: path.clone(),
        source,
    };
    let metadata = std::fs::metadata(&path).map_err(input_error)?;
    if metadata.is_dir() {
        return Err(input_error(io::Error::new(
            io::ErrorKind::InvalidInput,
            "is a directory",
        )));
    }
    std::fs::File::open(&path).map_err(input_error)?;
    Ok(path)
}

fn writable_output(value: &str) -> Result<PathBuf, ConvertError> {
    check_output_path(value.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_verbosity() {
        let mut args = Args {
            systable: PathBuf::from("systable.conf"),
            output: PathBuf::from("systable.json"),
            verbose: false,
            quiet: false,
        };
        assert_eq!(args.verbosity(), Verbosity::Normal);

        args.verbose = true;
        assert_eq!(args.verbosity(), Verbosity::Verbose);

        args.quiet = true;
        assert_eq!(args.verbosity(), Verbosity::Quiet);
    }

    #[test]
    fn test_parse_defaults() {
        let input = NamedTempFile::new().unwrap();
        let args = Args::try_parse_from(["bandforge", input.path().to_str().unwrap()]).unwrap();

        assert_eq!(args.systable, input.path());
        assert_eq!(args.output, PathBuf::from("systable.json"));
        assert_eq!(args.verbosity(), Verbosity::Normal);
    }

    #[test]
    fn test_parse_rejects_bad_paths() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.conf");
        assert!(Args::try_parse_from(["bandforge", missing.to_str().unwrap()]).is_err());
        assert!(Args::try_parse_from(["bandforge", dir.path().to_str().unwrap()]).is_err());

        let input = NamedTempFile::new().unwrap();
        let output = dir.path().join("absent").join("out.json");
        assert!(Args::try_parse_from([
            "bandforge",
            input.path().to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .is_err());
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Args::try_parse_from(["bandforge", "-", "-v", "-q"]).is_err());
        let args = Args::try_parse_from(["bandforge", "-", "--quiet"]).unwrap();
        assert_eq!(args.verbosity(), Verbosity::Quiet);
    }
}
