//! store
//!
//! The sectioned key/value metadata file and its update protocol.
//!
//! # Format
//!
//! One section per package, raw lines kept verbatim:
//!
//! ```text
//! # registry metadata, refreshed by metabump
//! [fzf]
//! REPO = "junegunn/fzf"
//! VERSION = "0.60.3"
//! SHA = "0f6b1d..."
//! ```
//!
//! A line whose trimmed form is `[name]` opens a section; every other line
//! belongs to the section currently open (or to the document preamble before
//! the first header). Comments and blank lines are ordinary storage lines.
//!
//! # Update protocol
//!
//! [`Document::update`] rewrites a line only when the decoded value actually
//! differs from the incoming one, and reports what it rewrote. Lines are
//! never inserted, deleted, or reordered, so [`Document::save`] after a
//! run that changed nothing reproduces the input byte for byte.
//!
//! # Key matching
//!
//! An entry line is split at its first unquoted `=`; the trimmed left-hand
//! side is the key, compared for exact equality. Keys are opaque strings and
//! may carry quoted segments (`deps."cfg-tool"`), which is why the split has
//! to be quote-aware.

pub mod scalar;

pub use scalar::ScalarError;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use thiserror::Error;

/// Logical key → new value mapping merged into one section.
pub type KeyValues = BTreeMap<String, String>;

/// Errors from metadata store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The metadata file could not be read or written.
    #[error("{path}: {source}")]
    Io {
        /// Path of the file being accessed
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// No section with the requested package name.
    #[error("unknown package: {0}")]
    PackageNotFound(String),

    /// The section exists but does not declare the requested key.
    #[error("package '{package}' has no key '{key}'")]
    KeyNotFound {
        /// Section that was searched
        package: String,
        /// Key that was not found
        key: String,
    },

    /// A new value could not be encoded as a scalar.
    #[error(transparent)]
    Scalar(#[from] ScalarError),
}

/// One rewritten entry line, old and new raw forms included for auditing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// Key whose line was rewritten
    pub key: String,
    /// The line as it was before the rewrite
    pub old_line: String,
    /// The line as written now
    pub new_line: String,
}

/// A named block of the metadata file corresponding to one package.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    name: String,
    lines: Vec<String>,
}

impl Section {
    /// Index of the first entry line declaring `key`, if any.
    fn find_key(&self, key: &str) -> Option<usize> {
        find_key_in(&self.lines, key)
    }
}

/// Index of the first non-comment, non-blank line declaring `key`.
fn find_key_in(lines: &[String], key: &str) -> Option<usize> {
    lines.iter().position(|line| {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return false;
        }
        matches!(split_entry(trimmed), Some((lhs, _)) if lhs == key)
    })
}

/// Owned snapshot of one section, handed to fetch recipes.
///
/// Recipes run on spawned tasks and must not touch the live document, so
/// they read package metadata through this clone instead.
#[derive(Debug, Clone)]
pub struct PackageView {
    name: String,
    lines: Vec<String>,
}

impl PackageView {
    /// Package name this view was taken from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Decoded value of `key` in the snapshot.
    pub fn get(&self, key: &str) -> Result<String, StoreError> {
        let idx = find_key_in(&self.lines, key).ok_or_else(|| StoreError::KeyNotFound {
            package: self.name.clone(),
            key: key.to_string(),
        })?;
        let (_, raw) = split_entry(self.lines[idx].trim()).expect("find_key matched an entry");
        Ok(scalar::decode(raw.trim()))
    }

    /// The `REPO` key, the one every GitHub-backed recipe needs.
    pub fn repo(&self) -> Result<String, StoreError> {
        self.get("REPO")
    }
}

/// In-memory metadata document: preamble plus ordered sections.
///
/// Produced whole by [`Document::load`] and only ever mutated through
/// [`Document::update`]'s targeted line rewrites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    preamble: Vec<String>,
    sections: Vec<Section>,
    /// Whether the source text ended with a newline; [`Document::render`]
    /// reproduces it so an update never changes the final byte.
    trailing_newline: bool,
}

impl Document {
    /// Load and parse the metadata file at `path`.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let text = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    /// Parse document text. Never fails: unrecognized lines are storage.
    pub fn parse(text: &str) -> Self {
        let mut preamble = Vec::new();
        let mut sections: Vec<Section> = Vec::new();
        for line in text.lines() {
            let line = line.trim_end();
            let trimmed = line.trim();
            if trimmed.len() >= 2 && trimmed.starts_with('[') && trimmed.ends_with(']') {
                sections.push(Section {
                    name: trimmed[1..trimmed.len() - 1].to_string(),
                    lines: Vec::new(),
                });
                continue;
            }
            match sections.last_mut() {
                Some(section) => section.lines.push(line.to_string()),
                None => preamble.push(line.to_string()),
            }
        }
        Document {
            preamble,
            sections,
            trailing_newline: text.is_empty() || text.ends_with('\n'),
        }
    }

    /// Section names in document order.
    pub fn package_names(&self) -> Vec<String> {
        self.sections.iter().map(|s| s.name.clone()).collect()
    }

    /// Whether a section named `package` exists.
    pub fn contains(&self, package: &str) -> bool {
        self.sections.iter().any(|s| s.name == package)
    }

    /// Owned snapshot of `package` for use by fetch recipes.
    pub fn view(&self, package: &str) -> Result<PackageView, StoreError> {
        let section = self.section(package)?;
        Ok(PackageView {
            name: section.name.clone(),
            lines: section.lines.clone(),
        })
    }

    /// Decoded value of `key` in section `package`.
    pub fn get(&self, package: &str, key: &str) -> Result<String, StoreError> {
        let section = self.section(package)?;
        let idx = section.find_key(key).ok_or_else(|| StoreError::KeyNotFound {
            package: package.to_string(),
            key: key.to_string(),
        })?;
        let (_, raw) = split_entry(section.lines[idx].trim()).expect("find_key matched an entry");
        Ok(scalar::decode(raw.trim()))
    }

    /// Merge `changes` into section `package`, rewriting only entries whose
    /// decoded value differs.
    ///
    /// Every key must already exist in the section; this store updates
    /// entries, it never inserts them. Returns the rewrites that happened
    /// (empty when everything was already up to date). Validation runs
    /// before any mutation, so a missing key leaves the section untouched.
    pub fn update(&mut self, package: &str, changes: &KeyValues) -> Result<Vec<Rewrite>, StoreError> {
        let section_idx = self
            .sections
            .iter()
            .position(|s| s.name == package)
            .ok_or_else(|| StoreError::PackageNotFound(package.to_string()))?;

        // Resolve all keys first: either the whole change set applies or
        // none of it does.
        let mut resolved = Vec::with_capacity(changes.len());
        for (key, value) in changes {
            let idx = self.sections[section_idx].find_key(key).ok_or_else(|| {
                StoreError::KeyNotFound {
                    package: package.to_string(),
                    key: key.clone(),
                }
            })?;
            resolved.push((key, value, idx));
        }

        let mut rewrites = Vec::new();
        for (key, value, idx) in resolved {
            let section = &mut self.sections[section_idx];
            let old_line = section.lines[idx].clone();
            let (_, raw) = split_entry(old_line.trim()).expect("find_key matched an entry");
            if scalar::decode(raw.trim()) == *value {
                continue;
            }
            let new_line = format!("{key} = {}", scalar::encode(value)?);
            section.lines[idx] = new_line.clone();
            rewrites.push(Rewrite {
                key: key.clone(),
                old_line,
                new_line,
            });
        }
        Ok(rewrites)
    }

    /// Serialize back to text: preamble, then each section header followed by
    /// its storage lines, in stored order.
    pub fn render(&self) -> String {
        let headers: Vec<String> = self
            .sections
            .iter()
            .map(|s| format!("[{}]", s.name))
            .collect();
        let mut lines: Vec<&str> = self.preamble.iter().map(String::as_str).collect();
        for (section, header) in self.sections.iter().zip(&headers) {
            lines.push(header);
            lines.extend(section.lines.iter().map(String::as_str));
        }
        if lines.is_empty() {
            String::new()
        } else {
            let mut out = lines.join("\n");
            if self.trailing_newline {
                out.push('\n');
            }
            out
        }
    }

    /// Write the rendered document to `path`, replacing prior content.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        fs::write(path, self.render()).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    fn section(&self, package: &str) -> Result<&Section, StoreError> {
        self.sections
            .iter()
            .find(|s| s.name == package)
            .ok_or_else(|| StoreError::PackageNotFound(package.to_string()))
    }
}

/// Split an entry line at its first unquoted `=`.
///
/// Returns `(trimmed_lhs, rhs)` or None for lines with no unquoted `=`.
/// Both single and double quotes suspend the split, so dotted keys with
/// quoted segments stay intact on the left-hand side.
fn split_entry(line: &str) -> Option<(&str, &str)> {
    let mut in_single = false;
    let mut in_double = false;
    for (i, c) in line.char_indices() {
        match c {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '=' if !in_single && !in_double => {
                return Some((line[..i].trim_end(), &line[i + 1..]));
            }
            _ => {}
        }
    }
    None
}
