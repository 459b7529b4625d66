//! Finding the functions defined in source files.
//!
//! A [`SymbolTagger`] turns a list of source files into the locations of the
//! functions they define. Two taggers are available, chosen per document by
//! name through [`tagger_for`]:
//!
//! - `ctags`: runs Universal Ctags as a subprocess.
//! - `heuristic`: matches function definitions with per-language regular
//!   expressions. No external tools are needed.

use std::{
    io::{Read, Write},
    path::{Path, PathBuf},
    process::{Command, ExitStatus, Stdio},
    sync::LazyLock,
    thread,
    time::{Duration, Instant},
};

use regex::Regex;

use crate::domain::code::is_source_file;

/// A function definition found by a tagger.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TagLocation {
    /// The function name.
    pub symbol: String,
    /// The file, relative to the repository root.
    pub path: PathBuf,
    /// Line of the definition (1-based).
    pub line: usize,
}

/// Errors that can occur while tagging source files.
#[derive(Debug, thiserror::Error)]
pub enum TagError {
    /// The tagger program couldn't be started.
    #[error("failed to run `{program}`")]
    Spawn {
        /// The program.
        program: String,
        /// The underlying error.
        source: std::io::Error,
    },

    /// Talking to the tagger program failed.
    #[error("failed to communicate with the tagger process")]
    Io(#[from] std::io::Error),

    /// A helper thread panicked.
    #[error("tagger i/o thread panicked")]
    Thread,

    /// The tagger program exited unsuccessfully.
    #[error("tagger exited with {status}")]
    Failed {
        /// The exit status.
        status: ExitStatus,
    },

    /// The tagger took too long.
    #[error("tagger timed out after {0:?}")]
    Timeout(Duration),

    /// A record's line field doesn't start with `line:`.
    #[error("line number unknown prefix: {record:?}")]
    MissingLinePrefix {
        /// The offending record.
        record: String,
    },

    /// A record's line number doesn't parse.
    #[error("failed to parse line number: {record:?}")]
    InvalidLineNumber {
        /// The offending record.
        record: String,
    },

    /// A source file couldn't be read.
    #[error("failed to read source file {}", path.display())]
    Read {
        /// The file.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// No tagger has the requested name.
    #[error("unknown code parser `{0}`")]
    Unknown(String),
}

/// Finds the functions defined in source files.
pub trait SymbolTagger: Send + Sync {
    /// The name the tagger is selected by.
    fn name(&self) -> &'static str;

    /// Tags `files`, given relative to `root`.
    ///
    /// Returned locations are relative to `root` too.
    ///
    /// # Errors
    ///
    /// Returns an error if the files can't be read or tagged.
    fn tag(&self, root: &Path, files: &[PathBuf]) -> Result<Vec<TagLocation>, TagError>;
}

/// Selects a tagger by name.
///
/// # Errors
///
/// Returns an error if no tagger has that name.
pub fn tagger_for(name: &str) -> Result<Box<dyn SymbolTagger>, TagError> {
    match name {
        "ctags" => Ok(Box::new(CtagsTagger::default())),
        "heuristic" => Ok(Box::new(HeuristicTagger)),
        other => Err(TagError::Unknown(other.to_string())),
    }
}

const CTAGS_ARGS: &[&str] = &[
    "--fields=n",
    "--kinds-C=f",
    "--kinds-C++=f",
    "--kinds-Go=f",
    "--kinds-Rust=f",
    "--kinds-Python=f",
    "-f",
    "-",
    "-L",
    "-",
];

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Tags files with Universal Ctags.
#[derive(Debug, Clone)]
pub struct CtagsTagger {
    /// The ctags executable.
    pub program: String,
    /// How long ctags may run before it is killed.
    pub timeout: Duration,
}

impl Default for CtagsTagger {
    fn default() -> Self {
        Self {
            program: "ctags".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl SymbolTagger for CtagsTagger {
    fn name(&self) -> &'static str {
        "ctags"
    }

    #[tracing::instrument(skip(self, files), fields(files = files.len()))]
    fn tag(&self, root: &Path, files: &[PathBuf]) -> Result<Vec<TagLocation>, TagError> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let mut child = Command::new(&self.program)
            .args(CTAGS_ARGS)
            .current_dir(root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| TagError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let mut file_list = files
            .iter()
            .map(|file| file.display().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        file_list.push('\n');
        let mut stdin = child.stdin.take().ok_or(TagError::Thread)?;
        let writer = thread::spawn(move || stdin.write_all(file_list.as_bytes()));

        let mut stdout = child.stdout.take().ok_or(TagError::Thread)?;
        let reader = thread::spawn(move || {
            let mut output = String::new();
            stdout.read_to_string(&mut output).map(|_| output)
        });

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                if let Err(error) = child.kill() {
                    tracing::warn!(%error, "failed to kill timed out ctags process");
                }
                child.wait()?;
                return Err(TagError::Timeout(self.timeout));
            }
            thread::sleep(POLL_INTERVAL);
        };

        let output = reader.join().map_err(|_| TagError::Thread)??;
        if !status.success() {
            return Err(TagError::Failed { status });
        }
        writer.join().map_err(|_| TagError::Thread)??;

        parse_ctags_output(&output)
    }
}

/// Parses the tab-separated output of `ctags --fields=n -f -`.
///
/// Records with fewer than four fields (such as ctags' own metadata),
/// anonymous functions and files that aren't source files are skipped.
///
/// # Errors
///
/// Returns an error if the fourth field of a record isn't a `line:` field.
pub fn parse_ctags_output(output: &str) -> Result<Vec<TagLocation>, TagError> {
    let mut tags = Vec::new();
    for record in output.lines() {
        let fields: Vec<&str> = record.split('\t').collect();
        if fields.len() < 4 {
            continue;
        }
        let symbol = fields[0];
        if symbol.starts_with("__anon") {
            continue;
        }
        let path = Path::new(fields[1]);
        if !is_source_file(path) {
            continue;
        }
        let line = fields[3]
            .strip_prefix("line:")
            .ok_or_else(|| TagError::MissingLinePrefix {
                record: record.to_string(),
            })?
            .parse()
            .map_err(|_| TagError::InvalidLineNumber {
                record: record.to_string(),
            })?;

        tags.push(TagLocation {
            symbol: symbol.to_string(),
            path: path.to_path_buf(),
            line,
        });
    }
    Ok(tags)
}

static RUST_FN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:(?:const|async|unsafe|extern(?:\s+"[^"]*")?)\s+)*fn\s+([A-Za-z_]\w*)"#,
    )
    .expect("rust function pattern is a valid regex")
});

static GO_FUNC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^func\s+(?:\([^)]*\)\s*)?([A-Za-z_]\w*)")
        .expect("go function pattern is a valid regex")
});

static PYTHON_DEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:async\s+)?def\s+([A-Za-z_]\w*)")
        .expect("python function pattern is a valid regex")
});

static C_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z_][\w\s*&<>:,]*[\s*&])?([A-Za-z_~][\w:~]*)\s*\([^;]*$")
        .expect("c function pattern is a valid regex")
});

const C_KEYWORDS: &[&str] = &[
    "if", "else", "for", "while", "do", "switch", "case", "return", "sizeof", "defined",
];

/// Tags files by matching function definitions line by line.
///
/// Only definitions starting on a single line are found. C-family
/// definitions must start at the beginning of the line.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicTagger;

impl HeuristicTagger {
    fn pattern(path: &Path) -> &'static Regex {
        match path.extension().and_then(|extension| extension.to_str()) {
            Some("rs") => &RUST_FN,
            Some("go") => &GO_FUNC,
            Some("py") => &PYTHON_DEF,
            _ => &C_FUNCTION,
        }
    }

    /// Tags the text of one file.
    #[must_use]
    pub fn tag_source(path: &Path, source: &str) -> Vec<TagLocation> {
        let pattern = Self::pattern(path);
        source
            .lines()
            .enumerate()
            .filter_map(|(index, line)| {
                let symbol = pattern.captures(line)?.get(1)?.as_str();
                if C_KEYWORDS.contains(&symbol) {
                    return None;
                }
                Some(TagLocation {
                    symbol: symbol.to_string(),
                    path: path.to_path_buf(),
                    line: index + 1,
                })
            })
            .collect()
    }
}

impl SymbolTagger for HeuristicTagger {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn tag(&self, root: &Path, files: &[PathBuf]) -> Result<Vec<TagLocation>, TagError> {
        let mut tags = Vec::new();
        for file in files {
            let path = root.join(file);
            let source = std::fs::read_to_string(&path)
                .map_err(|source| TagError::Read { path, source })?;
            tags.extend(Self::tag_source(file, &source));
        }
        Ok(tags)
    }
}
