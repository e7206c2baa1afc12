//! Vocabularies and tokenizers for preparing training token streams.
//!
//! Two vocabulary providers are supported:
//!
//! * [`CharVocab`], built locally from the distinct characters of a corpus.
//!   Ids follow code-point order, so a corpus always produces the same
//!   vocabulary, and [`manifest`] persists it for later decoding.
//! * A pre-trained subword table exposed through [`SubwordEncoder`]. The table
//!   is opaque and read-only; [`build_from_artifacts`] loads one from a
//!   bundled `tokenizer.json` or from a `vocab.json` + `merges.txt` pair
//!   assembled into a byte-level BPE.
//!
//! Every id handed out must fit in 16 bits ([`TOKEN_ID_LIMIT`]) before it can
//! be serialized; character vocabularies enforce that at construction.

pub mod artifacts;
pub mod config;
pub mod errors;
pub mod manifest;

mod pretokenizer;
mod subword;
mod types;
mod validate;
mod vocab;

pub use config::{ArtifactsCfg, ByteLevelCfg, SubwordCfg};
pub use errors::{Error, Result};
pub use manifest::Manifest;
pub use subword::{verify_roundtrip, SubwordEncoder};
pub use types::{sha256_of_files, TokenId, TOKEN_ID_LIMIT};
pub use validate::ensure_vocab_fits;
pub use vocab::CharVocab;

pub fn build_from_artifacts(cfg: &SubwordCfg) -> Result<tokenizers::Tokenizer> {
    validate::validate_config(cfg)?;
    let tokenizer = subword::build(cfg)?;
    validate::validate_tokenizer(&tokenizer)?;
    log::info!(
        "loaded subword vocabulary with {} entries",
        tokenizer.get_vocab_size(true)
    );
    Ok(tokenizer)
}
