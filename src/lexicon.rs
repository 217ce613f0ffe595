//! Term-definition lookup for graph node labels.
//!
//! Loaded once at startup and read-only afterwards; the corpus assembler
//! consults it to attach mouseover definitions to graph nodes whose label
//! has an entry.

use std::path::Path;

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error, Diagnostic)]
pub enum LexiconError {
    #[error("failed to read lexicon file {path:?}: {source}")]
    #[diagnostic(
        code(parseboard::lexicon::io),
        help("Check that the lexicon path exists and is readable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("lexicon line {line} is not of the form label<TAB>definition")]
    #[diagnostic(code(parseboard::lexicon::malformed_line))]
    MalformedLine { line: usize },
}

/// Read-only mapping from a node label to its definition text.
#[derive(Clone, Debug, Default)]
pub struct Lexicon {
    definitions: FxHashMap<String, String>,
}

impl Lexicon {
    /// Build a lexicon from label/definition pairs.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            definitions: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Load a lexicon from a file of `label<TAB>definition` lines.
    /// Blank lines and `#` comment lines are skipped.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LexiconError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| LexiconError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let mut definitions = FxHashMap::default();
        for (line_no, line) in text.lines().enumerate() {
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let (label, definition) = line
                .split_once('\t')
                .ok_or(LexiconError::MalformedLine { line: line_no + 1 })?;
            definitions.insert(label.to_string(), definition.to_string());
        }
        info!(path = %path.display(), entries = definitions.len(), "loaded lexicon");
        Ok(Self { definitions })
    }

    /// Definition for a label, if one is known.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&str> {
        self.definitions.get(label).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn lookup_hits_and_misses() {
        let lexicon = Lexicon::from_entries([("want-01", "to desire")]);
        assert_eq!(lexicon.get("want-01"), Some("to desire"));
        assert_eq!(lexicon.get("go-02"), None);
    }

    #[test]
    fn load_skips_comments_and_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# frames").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "want-01\tto desire").unwrap();
        writeln!(file, "go-02\tto move").unwrap();
        let lexicon = Lexicon::load(file.path()).unwrap();
        assert_eq!(lexicon.len(), 2);
        assert_eq!(lexicon.get("go-02"), Some("to move"));
    }

    #[test]
    fn load_rejects_lines_without_tab() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "want-01 to desire").unwrap();
        assert!(matches!(
            Lexicon::load(file.path()),
            Err(LexiconError::MalformedLine { line: 1 })
        ));
    }
}
