//! Persisted form of a [`CharVocab`].
//!
//! Both directions of the mapping are written out so that loading is a plain
//! deserialization plus consistency checks, with nothing rebuilt from a corpus.

use crate::artifacts::{read_json, AtomicBatch};
use crate::errors::{Error, Result};
use crate::types::TokenId;
use crate::vocab::CharVocab;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub vocab_size: usize,
    pub itos: BTreeMap<TokenId, String>,
    pub stoi: BTreeMap<String, TokenId>,
}

impl Manifest {
    pub fn from_vocab(vocab: &CharVocab) -> Self {
        Self {
            vocab_size: vocab.len(),
            itos: vocab
                .itos()
                .into_iter()
                .map(|(id, symbol)| (id, symbol.to_string()))
                .collect(),
            stoi: vocab
                .stoi()
                .into_iter()
                .map(|(symbol, id)| (symbol.to_string(), id))
                .collect(),
        }
    }

    pub fn to_vocab(&self) -> Result<CharVocab> {
        if self.vocab_size == 0 {
            return Err(Error::Validation("manifest vocab_size must be greater than zero".into()));
        }

        if self.itos.len() != self.vocab_size || self.stoi.len() != self.vocab_size {
            return Err(Error::Validation(format!(
                "manifest declares vocab_size {} but has {} itos and {} stoi entries",
                self.vocab_size,
                self.itos.len(),
                self.stoi.len()
            )));
        }

        let mut symbols = Vec::with_capacity(self.vocab_size);
        for (expected, (&id, symbol)) in self.itos.iter().enumerate() {
            if id as usize != expected {
                return Err(Error::Validation(format!(
                    "manifest ids are not contiguous: expected {expected}, found {id}"
                )));
            }

            let mut chars = symbol.chars();
            let ch = match (chars.next(), chars.next()) {
                (Some(ch), None) => ch,
                _ => {
                    return Err(Error::Validation(format!(
                        "manifest symbol {symbol:?} for id {id} is not a single character"
                    )));
                }
            };

            match self.stoi.get(symbol) {
                Some(&back) if back == id => {}
                Some(&back) => {
                    return Err(Error::Validation(format!(
                        "manifest maps id {id} to {symbol:?} but {symbol:?} to id {back}"
                    )));
                }
                None => {
                    return Err(Error::Validation(format!(
                        "manifest stoi is missing symbol {symbol:?}"
                    )));
                }
            }

            symbols.push(ch);
        }

        CharVocab::from_symbols(symbols)
    }
}

pub fn persist(vocab: &CharVocab) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(&Manifest::from_vocab(vocab))?;
    bytes.push(b'\n');
    Ok(bytes)
}

pub fn load(bytes: &[u8]) -> Result<CharVocab> {
    let manifest: Manifest = serde_json::from_slice(bytes)?;
    manifest.to_vocab()
}

/// Adds the manifest for `vocab` to `batch`; it lands with the batch commit.
pub fn stage_manifest(batch: &mut AtomicBatch, path: &Path, vocab: &CharVocab) -> Result<()> {
    let bytes = persist(vocab)?;
    batch.stage(path, |writer| writer.write_all(&bytes))?;
    log::debug!("staged manifest with {} symbols for {}", vocab.len(), path.display());
    Ok(())
}

pub fn read_manifest(path: &Path) -> Result<CharVocab> {
    let manifest: Manifest = read_json(path)?;
    manifest.to_vocab()
}
