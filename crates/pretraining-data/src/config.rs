use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokenizer::SubwordCfg;

use crate::corpora::Newlines;
use crate::errors::{Error, Result};
use crate::splitting::DEFAULT_TRAIN_FRACTION;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepareConfig {
    pub output: OutputConfig,
    pub dataset: DatasetConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub dir: PathBuf,
    #[serde(default = "default_train_bin")]
    pub train_bin: PathBuf,
    #[serde(default = "default_val_bin")]
    pub val_bin: PathBuf,
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,
    #[serde(default)]
    pub summary: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum DatasetConfig {
    Char(CharDatasetConfig),
    Subword(SubwordDatasetConfig),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharDatasetConfig {
    pub input: PathBuf,
    #[serde(default = "default_train_fraction")]
    pub train_fraction: f64,
    #[serde(default)]
    pub newlines: Newlines,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubwordDatasetConfig {
    pub tokenizer: SubwordCfg,
    pub train: PathBuf,
    pub validation: PathBuf,
    #[serde(default)]
    pub test: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub verify_roundtrip: bool,
    #[serde(default = "default_roundtrip_sample_chars")]
    pub roundtrip_sample_chars: usize,
    #[serde(default)]
    pub newlines: Newlines,
}

fn default_train_bin() -> PathBuf {
    PathBuf::from("train.bin")
}

fn default_val_bin() -> PathBuf {
    PathBuf::from("val.bin")
}

fn default_manifest() -> PathBuf {
    PathBuf::from("meta.json")
}

fn default_train_fraction() -> f64 {
    DEFAULT_TRAIN_FRACTION
}

fn default_true() -> bool {
    true
}

fn default_roundtrip_sample_chars() -> usize {
    1024
}

impl PrepareConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| Error::InputNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: PrepareConfig = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&contents)?,
            Some("toml") | Some("tml") | None => toml::from_str(&contents)?,
            Some(other) => {
                return Err(Error::ConfigFormat(format!(
                    "unsupported configuration extension '{}'",
                    other
                )));
            }
        };

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        config.apply_base_path(base_dir);
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let mut errors = self.output.problems();

        match &self.dataset {
            DatasetConfig::Char(char_cfg) => {
                let fraction = char_cfg.train_fraction;
                if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
                    errors.push(format!(
                        "dataset.train_fraction must be within [0, 1], got {fraction}"
                    ));
                }
            }
            DatasetConfig::Subword(subword_cfg) => {
                if !subword_cfg.tokenizer.expects_single_file()
                    && !subword_cfg.tokenizer.expects_split_files()
                {
                    errors.push(
                        "dataset.tokenizer must provide `tokenizer_json` or both `vocab_json` and `merges_txt`"
                            .to_string(),
                    );
                }
                if subword_cfg.verify_roundtrip && subword_cfg.roundtrip_sample_chars == 0 {
                    errors.push(
                        "dataset.roundtrip_sample_chars must be greater than 0 when verify_roundtrip is set"
                            .to_string(),
                    );
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(errors))
        }
    }

    fn apply_base_path(&mut self, base: &Path) {
        self.output.dir = rebase(base, &self.output.dir);
        match &mut self.dataset {
            DatasetConfig::Char(char_cfg) => {
                char_cfg.input = rebase(base, &char_cfg.input);
            }
            DatasetConfig::Subword(subword_cfg) => {
                subword_cfg.train = rebase(base, &subword_cfg.train);
                subword_cfg.validation = rebase(base, &subword_cfg.validation);
                if let Some(test) = subword_cfg.test.as_mut() {
                    *test = rebase(base, test);
                }
                subword_cfg.tokenizer.apply_base_path(base);
            }
        }
    }
}

impl OutputConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            train_bin: default_train_bin(),
            val_bin: default_val_bin(),
            manifest: default_manifest(),
            summary: None,
        }
    }

    pub fn train_path(&self) -> PathBuf {
        self.dir.join(&self.train_bin)
    }

    pub fn val_path(&self) -> PathBuf {
        self.dir.join(&self.val_bin)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(&self.manifest)
    }

    pub fn summary_path(&self) -> Option<PathBuf> {
        self.summary.as_ref().map(|summary| self.dir.join(summary))
    }

    fn problems(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let named = [
            ("output.train_bin", &self.train_bin),
            ("output.val_bin", &self.val_bin),
            ("output.manifest", &self.manifest),
        ];
        for (key, path) in named {
            if path.as_os_str().is_empty() {
                errors.push(format!("{key} must not be empty"));
            }
        }

        let mut targets = vec![self.train_path(), self.val_path(), self.manifest_path()];
        if let Some(summary) = self.summary_path() {
            targets.push(summary);
        }
        targets.sort();
        if targets.windows(2).any(|pair| pair[0] == pair[1]) {
            errors.push("output files must have distinct paths".to_string());
        }

        errors
    }
}

fn rebase(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
