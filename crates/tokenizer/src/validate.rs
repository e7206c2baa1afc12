use crate::config::SubwordCfg;
use crate::errors::{Error, Result};
use crate::types::TOKEN_ID_LIMIT;
use tokenizers::Tokenizer;

pub fn ensure_vocab_fits(size: usize) -> Result<()> {
    if size > TOKEN_ID_LIMIT as usize {
        return Err(Error::VocabularyTooLarge {
            size,
            limit: TOKEN_ID_LIMIT,
        });
    }
    Ok(())
}

pub fn validate_config(cfg: &SubwordCfg) -> Result<()> {
    if !cfg.expects_single_file() && !cfg.expects_split_files() {
        return Err(Error::InvalidConfig(
            "subword artifacts need tokenizer_json or both vocab_json and merges_txt",
        ));
    }

    let dir = cfg.artifacts.dir.as_path();
    if dir.exists() && !dir.is_dir() {
        return Err(Error::Validation(format!(
            "artifact directory path '{}' exists but is not a directory",
            dir.display()
        )));
    }

    Ok(())
}

/// The external table is reported as received; ids beyond 16 bits are only
/// rejected when a stream that contains them is serialized.
pub fn validate_tokenizer(tok: &Tokenizer) -> Result<()> {
    let size = tok.get_vocab_size(true);
    if size == 0 {
        return Err(Error::Validation("subword vocabulary is empty".into()));
    }

    if size > TOKEN_ID_LIMIT as usize {
        log::warn!(
            "subword vocabulary has {size} entries; ids at or above {TOKEN_ID_LIMIT} cannot be serialized"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ArtifactsCfg, ByteLevelCfg};
    use std::path::PathBuf;

    #[test]
    fn limit_is_inclusive_of_sixteen_bits() {
        assert!(ensure_vocab_fits(65_536).is_ok());
        assert!(matches!(
            ensure_vocab_fits(65_537),
            Err(Error::VocabularyTooLarge { size: 65_537, limit: 65_536 })
        ));
    }

    #[test]
    fn config_without_artifacts_is_invalid() {
        let cfg = SubwordCfg {
            pretokenizer: ByteLevelCfg::default(),
            artifacts: ArtifactsCfg {
                dir: PathBuf::from("."),
                tokenizer_json: None,
                vocab_json: Some(PathBuf::from("vocab.json")),
                merges_txt: None,
            },
        };
        assert!(matches!(validate_config(&cfg), Err(Error::InvalidConfig(_))));
    }
}
