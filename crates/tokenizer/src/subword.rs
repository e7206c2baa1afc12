//! Adapter over a fixed, pre-trained subword table.
//!
//! The table itself is opaque: it is loaded once and queried per call, and no
//! local copy of its mapping is kept.

use crate::artifacts::{load_bpe_from_vocab_merges, load_tokenizer_from_json, resolve_paths};
use crate::config::SubwordCfg;
use crate::errors::{Error, Result};
use crate::pretokenizer::{build_byte_level, build_byte_level_decoder};
use crate::types::{ArtifactPaths, TokenId};
use tokenizers::Tokenizer;

/// Capability exposed by an external subword vocabulary.
pub trait SubwordEncoder {
    /// Encodes `text` as plain text; strings that look like special tokens
    /// are not given special treatment.
    fn encode_ordinary(&self, text: &str) -> Result<Vec<TokenId>>;

    fn vocab_size(&self) -> usize;

    fn decode(&self, ids: &[TokenId]) -> Result<String>;
}

impl SubwordEncoder for Tokenizer {
    fn encode_ordinary(&self, text: &str) -> Result<Vec<TokenId>> {
        let encoding = self.encode(text, false)?;
        Ok(encoding.get_ids().to_vec())
    }

    fn vocab_size(&self) -> usize {
        self.get_vocab_size(true)
    }

    fn decode(&self, ids: &[TokenId]) -> Result<String> {
        (**self).decode(ids, false).map_err(Error::from)
    }
}

impl<E: SubwordEncoder + ?Sized> SubwordEncoder for &E {
    fn encode_ordinary(&self, text: &str) -> Result<Vec<TokenId>> {
        (**self).encode_ordinary(text)
    }

    fn vocab_size(&self) -> usize {
        (**self).vocab_size()
    }

    fn decode(&self, ids: &[TokenId]) -> Result<String> {
        (**self).decode(ids)
    }
}

pub(crate) fn build(cfg: &SubwordCfg) -> Result<Tokenizer> {
    let ArtifactPaths { json, vocab, merges } = resolve_paths(&cfg.artifacts)?;

    let mut tokenizer = if let Some(json_path) = json {
        load_tokenizer_from_json(&json_path)?
    } else {
        let vocab_path = vocab.ok_or_else(|| {
            Error::Artifact("vocab_json path is required when tokenizer_json is absent".into())
        })?;
        let merges_path = merges.ok_or_else(|| {
            Error::Artifact("merges_txt path is required when tokenizer_json is absent".into())
        })?;

        let bpe = load_bpe_from_vocab_merges(&vocab_path, &merges_path)?;
        let mut tokenizer = Tokenizer::new(bpe);
        tokenizer.with_pre_tokenizer(Some(build_byte_level(&cfg.pretokenizer)));
        tokenizer.with_decoder(Some(build_byte_level_decoder()));
        tokenizer
    };

    // Corpus text that spells an added special token (e.g. `<|endoftext|>`)
    // is encoded like any other text.
    tokenizer.set_encode_special_tokens(true);
    ensure_send_sync(&tokenizer);

    Ok(tokenizer)
}

/// Checks that the external table decodes its own encoding of `sample` back
/// to `sample`.
pub fn verify_roundtrip<E: SubwordEncoder + ?Sized>(encoder: &E, sample: &str) -> Result<()> {
    let ids = encoder.encode_ordinary(sample)?;
    let decoded = encoder.decode(&ids)?;
    if decoded != sample {
        let shown: String = sample.chars().take(64).collect();
        return Err(Error::Validation(format!(
            "subword vocabulary does not round-trip sample {shown:?} ({} ids)",
            ids.len()
        )));
    }
    Ok(())
}

fn ensure_send_sync<T: Send + Sync>(_: &T) {}

#[cfg(test)]
mod tests {
    use super::*;

    /// One id per byte, decoded back through UTF-8.
    struct ByteTable;

    impl SubwordEncoder for ByteTable {
        fn encode_ordinary(&self, text: &str) -> Result<Vec<TokenId>> {
            Ok(text.bytes().map(TokenId::from).collect())
        }

        fn vocab_size(&self) -> usize {
            256
        }

        fn decode(&self, ids: &[TokenId]) -> Result<String> {
            let bytes: Vec<u8> = ids.iter().map(|&id| id as u8).collect();
            String::from_utf8(bytes).map_err(|err| Error::Validation(err.to_string()))
        }
    }

    /// Drops everything outside ASCII, so it cannot round-trip other text.
    struct AsciiOnly;

    impl SubwordEncoder for AsciiOnly {
        fn encode_ordinary(&self, text: &str) -> Result<Vec<TokenId>> {
            Ok(text.bytes().filter(u8::is_ascii).map(TokenId::from).collect())
        }

        fn vocab_size(&self) -> usize {
            128
        }

        fn decode(&self, ids: &[TokenId]) -> Result<String> {
            Ok(ids.iter().map(|&id| id as u8 as char).collect())
        }
    }

    #[test]
    fn lossless_table_passes_roundtrip_check() {
        verify_roundtrip(&ByteTable, "naïve café ☂").unwrap();
    }

    #[test]
    fn lossy_table_fails_roundtrip_check() {
        let err = verify_roundtrip(&AsciiOnly, "naïve").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    fn encode_owned<E: SubwordEncoder>(encoder: E, text: &str) -> Vec<TokenId> {
        encoder.encode_ordinary(text).unwrap()
    }

    #[test]
    fn references_forward_to_the_table() {
        let table = ByteTable;
        assert_eq!(encode_owned(&table, "hi"), vec![104, 105]);
        assert_eq!((&table).vocab_size(), 256);
    }
}
