//! Command-line options of the driver.

use std::fmt;
use std::path::PathBuf;

use xtc_part::{LinkConfig, LoadOptions};

pub const USAGE: &str = "\
Usage: xtcc [options] <file.xtc>...

Options:
  --no-link           Load the files only
  --types             Compute and print the structural type of every class
  --allow-trailing    Accept bytes after a file's component tree
  --error-limit=<n>   Keep at most n link errors (default 50)
  -h, --help          Print this message

Environment:
  RUST_LOG            tracing filter, e.g. RUST_LOG=xtc_part=debug
  XTC_LOG_TREE        print tracing output as an indented tree";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    pub link: bool,
    pub types: bool,
    pub load: LoadOptions,
    pub link_config: LinkConfig,
    pub files: Vec<PathBuf>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            link: true,
            types: false,
            load: LoadOptions::default(),
            link_config: LinkConfig::default(),
            files: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UsageError {
    /// `-h` or `--help`; not a failure.
    Help,
    UnknownFlag(String),
    BadErrorLimit(String),
    NoFiles,
    /// `--types` needs linked parts.
    TypesWithoutLink,
}

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsageError::Help => f.write_str("help requested"),
            UsageError::UnknownFlag(flag) => write!(f, "unknown option {flag}"),
            UsageError::BadErrorLimit(value) => {
                write!(f, "--error-limit expects a number, got {value:?}")
            }
            UsageError::NoFiles => f.write_str("no input files"),
            UsageError::TypesWithoutLink => f.write_str("--types cannot be combined with --no-link"),
        }
    }
}

impl std::error::Error for UsageError {}

impl Options {
    /// Parse arguments, program name excluded.
    pub fn parse<I, S>(args: I) -> Result<Options, UsageError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut options = Options::default();
        for arg in args {
            let arg = arg.into();
            match arg.as_str() {
                "-h" | "--help" => return Err(UsageError::Help),
                "--no-link" => options.link = false,
                "--types" => options.types = true,
                "--allow-trailing" => options.load.allow_trailing = true,
                flag if flag.starts_with("--error-limit=") => {
                    let value = &flag["--error-limit=".len()..];
                    options.link_config.error_limit = value
                        .parse()
                        .map_err(|_| UsageError::BadErrorLimit(value.to_owned()))?;
                }
                flag if flag.starts_with('-') && flag.len() > 1 => {
                    return Err(UsageError::UnknownFlag(arg));
                }
                _ => options.files.push(PathBuf::from(arg)),
            }
        }
        if options.files.is_empty() {
            return Err(UsageError::NoFiles);
        }
        if options.types && !options.link {
            return Err(UsageError::TypesWithoutLink);
        }
        Ok(options)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
