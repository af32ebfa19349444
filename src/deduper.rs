use crate::config::{glob_match, Config, ExtensionFilter};
use crate::error::{DedupError, Result};
use md5::{Digest, Md5};
use std::{
    ffi::{OsStr, OsString},
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};
use tracing::{debug, info, trace};

const BUFFER_SIZE: usize = 64 * 1024;

/// Counts of what a traversal did, for diagnostics only. Skips are never
/// reported above debug level. Repeat visits from overlapping extension
/// patterns count as skips.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub copied: usize,
    pub skipped: usize,
}

enum Outcome {
    Copied,
    Skipped,
}

/// Copies every distinct (name, content) pair from an input tree into a
/// hash-sharded output tree. The output tree itself is the record of what
/// has already been stored, so repeated runs only add new slots.
pub struct Deduper {
    output_dir: PathBuf,
    filter: Option<ExtensionFilter>,
    stats: RunStats,
}

impl Deduper {
    pub fn new(output_dir: &Path, filter: Option<ExtensionFilter>) -> Self {
        Deduper {
            output_dir: output_dir.to_owned(),
            filter,
            stats: RunStats::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.output_dir, config.filter.clone())
    }

    /// Walks `input_dir` depth first, subdirectories before the directory's own files.
    pub fn traverse(&mut self, input_dir: &Path) -> Result<RunStats> {
        self.stats = RunStats::default();
        self.scan_directory(input_dir)?;
        info!(
            copied = self.stats.copied,
            skipped = self.stats.skipped,
            "traversal finished"
        );
        Ok(self.stats)
    }

    fn scan_directory(&mut self, path: &Path) -> Result<()> {
        trace!(dir = %path.display(), "scanning");
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(path).map_err(|e| DedupError::io(path, e))? {
            let entry = entry.map_err(|e| DedupError::io(path, e))?;
            entries.push(entry.path());
        }
        entries.sort();

        let (dirs, files): (Vec<PathBuf>, Vec<PathBuf>) =
            entries.into_iter().partition(|p| p.is_dir());

        for dir in &dirs {
            self.scan_directory(dir)?;
        }

        let files: Vec<PathBuf> = files.into_iter().filter(|p| p.is_file()).collect();
        match self.filter.clone() {
            None => {
                for file in &files {
                    self.handle_file(file)?;
                }
            }
            Some(filter) => {
                // Each pattern enumerates on its own, so a file matching two
                // patterns is visited twice.
                for pattern in filter.patterns() {
                    for file in &files {
                        if file.file_name().is_some_and(|n| glob_match(pattern, n)) {
                            self.handle_file(file)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn handle_file(&mut self, path: &Path) -> Result<()> {
        match copy_into_slot(path, &self.output_dir)? {
            Outcome::Copied => self.stats.copied += 1,
            Outcome::Skipped => self.stats.skipped += 1,
        }
        Ok(())
    }
}

fn copy_into_slot(path: &Path, output_dir: &Path) -> Result<Outcome> {
    let Some(name) = path.file_name() else {
        return Ok(Outcome::Skipped);
    };
    let hash = content_hash(path)?;
    let slot = slot_path(output_dir, name, &hash);
    if slot.is_dir() {
        debug!(file = %path.display(), slot = %slot.display(), "already stored");
        return Ok(Outcome::Skipped);
    }

    std::fs::create_dir_all(&slot).map_err(|e| DedupError::io(&slot, e))?;
    let target = slot.join(name);
    std::fs::copy(path, &target).map_err(|e| DedupError::io(path, e))?;
    info!(file = %path.display(), target = %target.display(), "copied");
    Ok(Outcome::Copied)
}

/// `<output>/<hash[0:2]>/<name> - <hash>`
pub fn slot_path(output_dir: &Path, name: &OsStr, hash: &str) -> PathBuf {
    let mut slot_name = OsString::from(name);
    slot_name.push(" - ");
    slot_name.push(hash);
    output_dir.join(&hash[..2]).join(slot_name)
}

/// Lowercase hex MD5 of the file's content.
pub fn content_hash(path: &Path) -> Result<String> {
    Ok(hex::encode(hash_file(path)?))
}

fn hash_file(path: &Path) -> Result<Vec<u8>> {
    let mut hasher = Md5::new();
    let file = File::open(path).map_err(|e| DedupError::io(path, e))?;
    let mut reader = BufReader::new(file);
    let mut buffer = vec![0u8; BUFFER_SIZE];
    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| DedupError::io(path, e))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(hasher.finalize().to_vec())
}
