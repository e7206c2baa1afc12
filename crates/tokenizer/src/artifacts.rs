use crate::config::ArtifactsCfg;
use crate::errors::{Error, Result};
use crate::types::ArtifactPaths;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokenizers::models::bpe::BPE;
use tokenizers::Tokenizer;

const TOKENIZER_JSON_ERR: &str = "tokenizer json not found at";
const VOCAB_JSON_ERR: &str = "vocab json not found at";
const MERGES_TXT_ERR: &str = "merges txt not found at";
const JSON_ERR: &str = "json artifact not found at";

pub fn load_tokenizer_from_json(path: &Path) -> Result<Tokenizer> {
    ensure_file(path, TOKENIZER_JSON_ERR)?;
    Tokenizer::from_file(path).map_err(Error::from)
}

pub fn load_bpe_from_vocab_merges(vocab: &Path, merges: &Path) -> Result<BPE> {
    ensure_file(vocab, VOCAB_JSON_ERR)?;
    ensure_file(merges, MERGES_TXT_ERR)?;

    let vocab_str = path_to_string(vocab)?;
    let merges_str = path_to_string(merges)?;

    BPE::from_file(&vocab_str, &merges_str)
        .build()
        .map_err(Error::from)
}

/// A set of files replaced together.
///
/// [`stage`](Self::stage) writes and syncs each file to a temporary sibling of
/// its target; nothing visible changes until [`commit`](Self::commit) renames
/// them into place. Dropping an uncommitted batch removes every staged file,
/// so a failure while staging leaves all targets as they were.
#[derive(Default)]
pub struct AtomicBatch {
    staged: Vec<(NamedTempFile, PathBuf)>,
}

/// A staged file that could not be renamed onto its target.
#[derive(Debug, thiserror::Error)]
#[error("failed to replace {}: {source}", .path.display())]
pub struct CommitError {
    pub path: PathBuf,
    pub source: io::Error,
}

impl AtomicBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    pub fn stage<F>(&mut self, path: &Path, write: F) -> io::Result<()>
    where
        F: FnOnce(&mut dyn Write) -> io::Result<()>,
    {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let mut tmp = NamedTempFile::new_in(&parent)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            write(&mut writer)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        self.staged.push((tmp, path.to_path_buf()));
        Ok(())
    }

    /// Renames every staged file onto its target, in staging order. On a
    /// rename failure the files not yet renamed are discarded.
    pub fn commit(self) -> std::result::Result<(), CommitError> {
        for (tmp, path) in self.staged {
            tmp.persist(&path)
                .map_err(|err| CommitError { path, source: err.error })?;
        }
        Ok(())
    }
}

/// Writes `path` through a temporary sibling file that is renamed into place
/// only after `write` succeeds and the data is synced. On any failure the
/// temporary file is removed and `path` is left untouched.
pub fn write_atomic<F>(path: &Path, write: F) -> io::Result<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let mut batch = AtomicBatch::new();
    batch.stage(path, write)?;
    batch.commit().map_err(|err| err.source)
}

pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let data = serde_json::to_vec_pretty(value)?;
    write_atomic(path, |writer| {
        writer.write_all(&data)?;
        writer.write_all(b"\n")
    })?;
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    ensure_file(path, JSON_ERR)?;
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let value = serde_json::from_reader(reader)?;
    Ok(value)
}

pub fn resolve_paths(cfg: &ArtifactsCfg) -> Result<ArtifactPaths> {
    let dir = cfg.dir.as_path();
    if !dir.is_dir() {
        return Err(Error::Artifact(format!(
            "artifact directory not found at {}",
            dir.display()
        )));
    }

    let resolve = |value: &Option<PathBuf>| -> Option<PathBuf> {
        value.as_ref().map(|path| absolute_in_dir(dir, path))
    };

    let tokenizer_json = resolve(&cfg.tokenizer_json);
    let vocab_json = resolve(&cfg.vocab_json);
    let merges_txt = resolve(&cfg.merges_txt);

    if let Some(ref path) = tokenizer_json {
        ensure_file(path, TOKENIZER_JSON_ERR)?;
    }

    if let Some(ref path) = vocab_json {
        ensure_file(path, VOCAB_JSON_ERR)?;
    }

    if let Some(ref path) = merges_txt {
        ensure_file(path, MERGES_TXT_ERR)?;
    }

    if tokenizer_json.is_none() {
        match (&vocab_json, &merges_txt) {
            (Some(_), Some(_)) => {}
            (None, Some(path)) => {
                return Err(Error::Artifact(format!(
                    "vocab json path is required when merges txt is set (missing for {})",
                    path.display()
                )));
            }
            (Some(path), None) => {
                return Err(Error::Artifact(format!(
                    "merges txt path is required when vocab json is set (missing for {})",
                    path.display()
                )));
            }
            (None, None) => {
                return Err(Error::Artifact(
                    "artifacts must specify either tokenizer_json or both vocab_json and merges_txt".into(),
                ));
            }
        }
    }

    Ok(ArtifactPaths {
        json: tokenizer_json,
        vocab: vocab_json,
        merges: merges_txt,
    })
}

fn absolute_in_dir(dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() || path.starts_with(dir) {
        path.to_path_buf()
    } else {
        dir.join(path)
    }
}

fn ensure_file(path: &Path, context: &str) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(Error::Artifact(format!("{context} {}", path.display())))
    }
}

fn path_to_string(path: &Path) -> Result<String> {
    path.to_str()
        .map(|s| s.to_owned())
        .ok_or_else(|| Error::Artifact(format!("path is not valid UTF-8: {}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        fs::write(&path, b"old contents").unwrap();

        write_atomic(&path, |w| w.write_all(b"new")).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn failed_atomic_write_leaves_no_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");

        let err = write_atomic(&path, |w| {
            w.write_all(b"partial")?;
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        })
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);

        assert!(!path.exists());
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 0, "temporary file should be cleaned up");
    }

    #[test]
    fn failed_atomic_write_keeps_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        fs::write(&path, b"previous").unwrap();

        let _ = write_atomic(&path, |_| Err(io::Error::new(io::ErrorKind::Other, "boom")));
        assert_eq!(fs::read(&path).unwrap(), b"previous");
    }

    #[test]
    fn batch_replaces_every_target_on_commit() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.bin");
        let second = dir.path().join("nested").join("b.bin");
        fs::write(&first, b"old").unwrap();

        let mut batch = AtomicBatch::new();
        batch.stage(&first, |w| w.write_all(b"new a")).unwrap();
        batch.stage(&second, |w| w.write_all(b"new b")).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(fs::read(&first).unwrap(), b"old", "staging must not touch targets");

        batch.commit().unwrap();
        assert_eq!(fs::read(&first).unwrap(), b"new a");
        assert_eq!(fs::read(&second).unwrap(), b"new b");
    }

    #[test]
    fn failed_stage_discards_the_whole_batch() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.bin");
        fs::write(&first, b"old").unwrap();

        let mut batch = AtomicBatch::new();
        batch.stage(&first, |w| w.write_all(b"new a")).unwrap();
        let failed = batch.stage(&dir.path().join("b.bin"), |_| {
            Err(io::Error::new(io::ErrorKind::Other, "boom"))
        });
        assert!(failed.is_err());
        drop(batch);

        assert_eq!(fs::read(&first).unwrap(), b"old");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn commit_onto_a_directory_reports_the_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("occupied");
        fs::create_dir(&target).unwrap();

        let mut batch = AtomicBatch::new();
        batch.stage(&target, |w| w.write_all(b"data")).unwrap();
        let err = batch.commit().unwrap_err();
        assert_eq!(err.path, target);
        assert!(target.is_dir());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn resolve_requires_some_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ArtifactsCfg {
            dir: dir.path().to_path_buf(),
            tokenizer_json: None,
            vocab_json: None,
            merges_txt: None,
        };
        assert!(matches!(resolve_paths(&cfg), Err(Error::Artifact(_))));
    }

    #[test]
    fn resolve_rejects_merges_without_vocab() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("merges.txt"), "#version: 0.2\n").unwrap();
        let cfg = ArtifactsCfg {
            dir: dir.path().to_path_buf(),
            tokenizer_json: None,
            vocab_json: None,
            merges_txt: Some(PathBuf::from("merges.txt")),
        };
        let err = resolve_paths(&cfg).unwrap_err();
        assert!(err.to_string().contains("vocab json path is required"));
    }

    #[test]
    fn resolve_joins_relative_paths_onto_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tokenizer.json"), "{}").unwrap();
        let cfg = ArtifactsCfg {
            dir: dir.path().to_path_buf(),
            tokenizer_json: Some(PathBuf::from("tokenizer.json")),
            vocab_json: None,
            merges_txt: None,
        };
        let paths = resolve_paths(&cfg).unwrap();
        assert_eq!(paths.json, Some(dir.path().join("tokenizer.json")));
    }
}
