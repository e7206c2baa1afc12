use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where to find a pre-trained subword table and how to pre-tokenize for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubwordCfg {
    #[serde(default)]
    pub pretokenizer: ByteLevelCfg,
    pub artifacts: ArtifactsCfg,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ByteLevelCfg {
    pub add_prefix_space: bool,
    pub trim_offsets: bool,
    pub use_regex: bool,
}

impl Default for ByteLevelCfg {
    // GPT-2 settings
    fn default() -> Self {
        Self {
            add_prefix_space: false,
            trim_offsets: true,
            use_regex: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactsCfg {
    #[serde(default = "default_artifacts_dir")]
    pub dir: PathBuf,
    pub tokenizer_json: Option<PathBuf>,
    pub vocab_json: Option<PathBuf>,
    pub merges_txt: Option<PathBuf>,
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from(".")
}

impl SubwordCfg {
    pub fn from_tokenizer_json(path: impl Into<PathBuf>) -> Self {
        Self {
            pretokenizer: ByteLevelCfg::default(),
            artifacts: ArtifactsCfg {
                dir: default_artifacts_dir(),
                tokenizer_json: Some(path.into()),
                vocab_json: None,
                merges_txt: None,
            },
        }
    }

    pub fn from_vocab_merges(vocab: impl Into<PathBuf>, merges: impl Into<PathBuf>) -> Self {
        Self {
            pretokenizer: ByteLevelCfg::default(),
            artifacts: ArtifactsCfg {
                dir: default_artifacts_dir(),
                tokenizer_json: None,
                vocab_json: Some(vocab.into()),
                merges_txt: Some(merges.into()),
            },
        }
    }

    pub fn expects_single_file(&self) -> bool {
        self.artifacts.tokenizer_json.is_some()
    }

    pub fn expects_split_files(&self) -> bool {
        self.artifacts.vocab_json.is_some() && self.artifacts.merges_txt.is_some()
    }

    /// Re-roots a relative artifact directory at `base`.
    pub fn apply_base_path(&mut self, base: &Path) {
        if self.artifacts.dir.is_relative() {
            self.artifacts.dir = base.join(&self.artifacts.dir);
        }
    }
}
