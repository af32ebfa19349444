use crate::error::{DedupError, Result};
use std::ffi::OsStr;
use std::path::PathBuf;

pub const USAGE: &str = "Arguments: <input directory> <output directory> [extension1,extension2,...]";

/// Validated run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub filter: Option<ExtensionFilter>,
}

impl Config {
    /// Checks that both directories exist and parses the optional extension list.
    /// Nothing on disk is touched.
    pub fn from_args(input: PathBuf, output: PathBuf, extensions: Option<&str>) -> Result<Self> {
        if !input.is_dir() {
            return Err(DedupError::Usage(format!(
                "Input directory {} does not exist",
                input.display()
            )));
        }
        if !output.is_dir() {
            return Err(DedupError::Usage(format!(
                "Output directory {} does not exist",
                output.display()
            )));
        }
        let filter = extensions.map(ExtensionFilter::parse);
        Ok(Config {
            input_dir: input,
            output_dir: output,
            filter,
        })
    }
}

/// One `*.<ext>` glob per requested extension, kept in the order given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter {
    patterns: Vec<String>,
}

impl ExtensionFilter {
    /// Every comma-separated token maps literally to `*.<token>`, so an empty
    /// token yields `*.`.
    pub fn parse(list: &str) -> Self {
        let patterns = list.split(',').map(|token| format!("*.{token}")).collect();
        ExtensionFilter { patterns }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

/// Case-sensitive glob match of a file name. `*` matches any run, `?` one byte.
pub fn glob_match(pattern: &str, name: &OsStr) -> bool {
    let pattern = pattern.as_bytes();
    let text = name.as_encoded_bytes();

    let (mut p, mut t) = (0, 0);
    // (pattern index of last '*', text index it is currently absorbing up to)
    let mut star: Option<(usize, usize)> = None;
    while t < text.len() {
        if p < pattern.len() && pattern[p] == b'*' {
            star = Some((p, t));
            p += 1;
        } else if p < pattern.len() && (pattern[p] == b'?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if let Some((star_p, star_t)) = star {
            p = star_p + 1;
            t = star_t + 1;
            star = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }
    while p < pattern.len() && pattern[p] == b'*' {
        p += 1;
    }
    p == pattern.len()
}
