//! Optional local env file support.
//!
//! Hosted deployments inject variables directly into the process environment,
//! so the file is a local-development convenience and its absence is not an
//! error.

use std::path::{Path, PathBuf};

use tracing::debug;

/// What happened when merging the env file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvFileOutcome {
    /// Every line of the file was merged.
    Loaded(PathBuf),
    /// Some lines failed to parse and were skipped; the rest were merged.
    Partial { path: PathBuf, skipped_lines: usize },
    /// The file was missing or unreadable, nothing was merged.
    Skipped,
}

/// Merges `KEY=VALUE` pairs from `path` into the process environment.
///
/// Variables that are already set are left untouched, so the real
/// environment always takes precedence over the file. Lines that fail to
/// parse are skipped and the rest of the file is still read.
pub fn merge_into_env(path: impl AsRef<Path>) -> EnvFileOutcome {
    let path = path.as_ref();
    let contents = match read_file(path) {
        Ok(contents) => contents,
        Err(e) => {
            debug!("Could not load env file ({}): {}", path.display(), e);
            return EnvFileOutcome::Skipped;
        }
    };

    let mut entries = Vec::new();
    let mut skipped_lines = 0;
    for item in dotenvy::from_read_iter(contents.as_bytes()) {
        match item {
            Ok(entry) => entries.push(entry),
            // The error carries the raw line, which may hold a credential.
            Err(dotenvy::Error::LineParse(_, column)) => {
                debug!(
                    "Skipping malformed line in {} (column {})",
                    path.display(),
                    column
                );
                skipped_lines += 1;
            }
            Err(e) => {
                debug!("Stopped reading env file ({}): {}", path.display(), e);
                skipped_lines += 1;
                break;
            }
        }
    }

    // `from_read` is the non-overriding loader; feed it only lines it will accept.
    let mut normalized = String::new();
    for (key, value) in &entries {
        normalized.push_str(key);
        normalized.push('=');
        normalized.push_str(&quote(value));
        normalized.push('\n');
    }
    if let Err(e) = dotenvy::from_read(normalized.as_bytes()) {
        debug!("Could not merge env file ({}): {}", path.display(), e);
        return EnvFileOutcome::Skipped;
    }

    debug!("Merged {} variable(s) from {}", entries.len(), path.display());
    if skipped_lines == 0 {
        EnvFileOutcome::Loaded(path.to_path_buf())
    } else {
        EnvFileOutcome::Partial {
            path: path.to_path_buf(),
            skipped_lines,
        }
    }
}

/// Parses `path` without touching the process environment.
///
/// # Errors
///
/// Returns the dotenv error if the file cannot be opened or a line fails to parse.
pub fn read_entries(path: impl AsRef<Path>) -> Result<Vec<(String, String)>, dotenvy::Error> {
    let contents = read_file(path.as_ref()).map_err(dotenvy::Error::Io)?;
    dotenvy::from_read_iter(contents.as_bytes()).collect()
}

/// Reads the file, dropping a UTF-8 byte order mark.
fn read_file(path: &Path) -> std::io::Result<String> {
    let mut contents = std::fs::read_to_string(path)?;
    if contents.starts_with('\u{feff}') {
        contents.drain(..'\u{feff}'.len_utf8());
    }
    Ok(contents)
}

/// Double-quotes `value` so the dotenv parser reads it back verbatim.
fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\\' | '"' | '$' => {
                quoted.push('\\');
                quoted.push(c);
            }
            '\n' => quoted.push_str("\\n"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
