//! Command-line arguments.
//!
//! ```text
//! ember-host [--config <path>] [script.lua ...]
//! ```

use anyhow::{bail, Result};
use std::path::PathBuf;

/// Parsed command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    /// Explicit configuration file; the default location is used otherwise.
    pub config: Option<PathBuf>,
    /// Scripts to run once at startup, in order.
    pub scripts: Vec<PathBuf>,
}

impl Args {
    /// Parse arguments, excluding the program name.
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = Args::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-c" | "--config" => match args.next() {
                    Some(path) => parsed.config = Some(PathBuf::from(path)),
                    None => bail!("{} requires a path", arg),
                },
                flag if flag.starts_with('-') && flag.len() > 1 => {
                    bail!("unknown option: {}", flag)
                }
                script => parsed.scripts.push(PathBuf::from(script)),
            }
        }

        Ok(parsed)
    }

    pub fn from_env() -> Result<Self> {
        Self::parse(std::env::args().skip(1))
    }
}
