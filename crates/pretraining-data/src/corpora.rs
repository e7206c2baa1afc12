use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Which portion of a dataset a corpus belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitLabel {
    Train,
    Validation,
    Test,
}

impl fmt::Display for SplitLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SplitLabel::Train => "train",
            SplitLabel::Validation => "validation",
            SplitLabel::Test => "test",
        };
        f.write_str(name)
    }
}

/// Line-ending handling applied when a corpus is read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Newlines {
    /// `\r\n` and lone `\r` become `\n`.
    #[default]
    Universal,
    /// Bytes are kept exactly as stored.
    Keep,
}

impl Newlines {
    pub fn apply(self, text: String) -> String {
        if self == Newlines::Keep || !text.contains('\r') {
            return text;
        }

        let mut out = String::with_capacity(text.len());
        let mut chars = text.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch == '\r' {
                chars.next_if_eq(&'\n');
                out.push('\n');
            } else {
                out.push(ch);
            }
        }
        out
    }
}

/// Immutable UTF-8 text tagged with its split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corpus {
    label: SplitLabel,
    text: String,
}

impl Corpus {
    /// Reads a whole UTF-8 file. Missing, unreadable and non-UTF-8 files all
    /// surface as [`Error::InputNotFound`].
    pub fn read(path: &Path, label: SplitLabel, newlines: Newlines) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| Error::InputNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        let text = newlines.apply(raw);
        log::debug!(
            "read {label} corpus from {} ({} bytes)",
            path.display(),
            text.len()
        );
        Ok(Self { label, text })
    }

    pub fn label(&self) -> SplitLabel {
        self.label
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in symbols (Unicode scalar values), not bytes.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_utf8_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.txt");
        fs::write(&path, "naïve café\n").unwrap();

        let corpus = Corpus::read(&path, SplitLabel::Train, Newlines::Universal).unwrap();
        assert_eq!(corpus.label(), SplitLabel::Train);
        assert_eq!(corpus.text(), "naïve café\n");
        assert_eq!(corpus.char_len(), 11);
    }

    #[test]
    fn missing_file_is_input_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.txt");

        match Corpus::read(&path, SplitLabel::Validation, Newlines::Keep) {
            Err(Error::InputNotFound { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected InputNotFound, got {other:?}"),
        }
    }

    #[test]
    fn invalid_utf8_is_input_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.txt");
        fs::write(&path, [0x63, 0x61, 0x66, 0xe9]).unwrap();

        assert!(matches!(
            Corpus::read(&path, SplitLabel::Test, Newlines::Universal),
            Err(Error::InputNotFound { .. })
        ));
    }

    #[test]
    fn universal_newlines_fold_crlf_and_lone_cr() {
        assert_eq!(Newlines::Universal.apply("a\r\nb\rc\n\r\n".into()), "a\nb\nc\n\n");
        assert_eq!(Newlines::Universal.apply("\r\r\n".into()), "\n\n");
        assert_eq!(Newlines::Keep.apply("a\r\nb".into()), "a\r\nb");
    }

    #[test]
    fn read_applies_newline_policy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crlf.txt");
        fs::write(&path, "one\r\ntwo\r\n").unwrap();

        let folded = Corpus::read(&path, SplitLabel::Train, Newlines::Universal).unwrap();
        assert_eq!(folded.text(), "one\ntwo\n");
        assert_eq!(folded.char_len(), 8);

        let raw = Corpus::read(&path, SplitLabel::Train, Newlines::Keep).unwrap();
        assert_eq!(raw.text(), "one\r\ntwo\r\n");
    }

    #[test]
    fn labels_display_lowercase() {
        assert_eq!(SplitLabel::Validation.to_string(), "validation");
    }
}
