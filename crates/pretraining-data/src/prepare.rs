//! End-to-end preparation runs.
//!
//! A run reads its corpora, tokenizes them, range-checks *every* stream it is
//! about to write, and stages the token files (and, for the character
//! variant, the manifest) as one [`AtomicBatch`]. The outputs are renamed into
//! place only after all of them have been written and synced.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tokenizer::artifacts::{write_json_atomic, AtomicBatch};
use tokenizer::{manifest, sha256_of_files, verify_roundtrip, CharVocab, SubwordEncoder, TokenId};

use crate::binary::{check_range, read_token_file, stage_token_file};
use crate::config::{
    CharDatasetConfig, DatasetConfig, OutputConfig, PrepareConfig, SubwordDatasetConfig,
};
use crate::corpora::{Corpus, SplitLabel};
use crate::errors::{Error, Result};
use crate::splitting::{split_by_ratio, SplitPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Char,
    Subword,
}

#[derive(Debug, Clone, Serialize)]
pub struct SegmentReport {
    pub label: SplitLabel,
    pub path: PathBuf,
    pub tokens: usize,
    pub bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrepareReport {
    pub variant: Variant,
    pub split: SplitPolicy,
    /// Char variant: the whole dataset. Subword variant: train plus test.
    pub corpus_chars: usize,
    pub vocab_size: usize,
    pub train: SegmentReport,
    pub validation: SegmentReport,
    pub manifest: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    #[serde(flatten)]
    report: &'a PrepareReport,
    train_sha256: String,
    val_sha256: String,
    created_at: String,
}

/// Runs whichever variant `config` selects and writes the optional summary.
pub fn run(config: &PrepareConfig) -> Result<PrepareReport> {
    let report = match &config.dataset {
        DatasetConfig::Char(char_cfg) => prepare_char(char_cfg, &config.output)?,
        DatasetConfig::Subword(subword_cfg) => {
            let table = tokenizer::build_from_artifacts(&subword_cfg.tokenizer)?;
            prepare_subword(&table, subword_cfg, &config.output)?
        }
    };

    if let Some(summary_path) = config.output.summary_path() {
        write_summary(&summary_path, &report)?;
    }

    Ok(report)
}

pub fn prepare_char(cfg: &CharDatasetConfig, output: &OutputConfig) -> Result<PrepareReport> {
    let corpus = Corpus::read(&cfg.input, SplitLabel::Train, cfg.newlines)?;
    let corpus_chars = corpus.char_len();
    log::info!("length of dataset in characters: {corpus_chars}");

    let vocab = CharVocab::build(corpus.text())?;
    let alphabet: String = vocab.symbols().iter().collect();
    log::info!("all the unique characters: {alphabet}");
    log::info!("vocab size: {}", vocab.len());

    let plan = split_by_ratio(corpus.text(), cfg.train_fraction)?;
    let train_ids = vocab.encode(plan.train)?;
    let val_ids = vocab.encode(plan.validation)?;
    log::info!("train has {} tokens", train_ids.len());
    log::info!("val has {} tokens", val_ids.len());

    let mut batch = AtomicBatch::new();
    let (train, validation) = stage_segments(&mut batch, output, &train_ids, &val_ids)?;

    let manifest_path = output.manifest_path();
    manifest::stage_manifest(&mut batch, &manifest_path, &vocab)
        .map_err(|err| serialization_error(&manifest_path, err))?;

    batch.commit()?;
    log_segments(&train, &validation);
    log::info!("wrote manifest to {}", manifest_path.display());

    Ok(PrepareReport {
        variant: Variant::Char,
        split: SplitPolicy::Ratio {
            train_fraction: cfg.train_fraction,
        },
        corpus_chars,
        vocab_size: vocab.len(),
        train,
        validation,
        manifest: Some(manifest_path),
    })
}

pub fn prepare_subword<E: SubwordEncoder + ?Sized>(
    encoder: &E,
    cfg: &SubwordDatasetConfig,
    output: &OutputConfig,
) -> Result<PrepareReport> {
    let train = Corpus::read(&cfg.train, SplitLabel::Train, cfg.newlines)?;
    let validation = Corpus::read(&cfg.validation, SplitLabel::Validation, cfg.newlines)?;
    let test = cfg
        .test
        .as_deref()
        .map(|path| Corpus::read(path, SplitLabel::Test, cfg.newlines))
        .transpose()?;

    let corpus_chars = train.char_len() + test.as_ref().map_or(0, Corpus::char_len);
    log::info!("train + test length in characters: {corpus_chars}");

    let vocab_size = encoder.vocab_size();
    log::info!("subword vocabulary reports {vocab_size} entries");

    if cfg.verify_roundtrip {
        let sample = leading_chars(train.text(), cfg.roundtrip_sample_chars);
        if !sample.is_empty() {
            verify_roundtrip(encoder, sample)?;
        }
    }

    let train_ids = encoder.encode_ordinary(train.text())?;
    let val_ids = encoder.encode_ordinary(validation.text())?;
    log::info!("train has {} tokens", train_ids.len());
    log::info!("val has {} tokens", val_ids.len());

    let mut batch = AtomicBatch::new();
    let (train, validation) = stage_segments(&mut batch, output, &train_ids, &val_ids)?;
    batch.commit()?;
    log_segments(&train, &validation);

    Ok(PrepareReport {
        variant: Variant::Subword,
        split: SplitPolicy::PrePartitioned,
        corpus_chars,
        vocab_size,
        train,
        validation,
        manifest: None,
    })
}

fn stage_segments(
    batch: &mut AtomicBatch,
    output: &OutputConfig,
    train_ids: &[TokenId],
    val_ids: &[TokenId],
) -> Result<(SegmentReport, SegmentReport)> {
    check_range(train_ids)?;
    check_range(val_ids)?;

    let train = stage_segment(batch, SplitLabel::Train, output.train_path(), train_ids)?;
    let validation = stage_segment(batch, SplitLabel::Validation, output.val_path(), val_ids)?;
    Ok((train, validation))
}

fn stage_segment(
    batch: &mut AtomicBatch,
    label: SplitLabel,
    path: PathBuf,
    ids: &[TokenId],
) -> Result<SegmentReport> {
    if ids.is_empty() {
        log::warn!("{label} segment is empty; {} will be zero bytes", path.display());
    }
    let bytes = stage_token_file(batch, &path, ids)?;
    Ok(SegmentReport {
        label,
        path,
        tokens: ids.len(),
        bytes,
    })
}

fn log_segments(train: &SegmentReport, validation: &SegmentReport) {
    for segment in [train, validation] {
        log::info!("wrote {} tokens to {}", segment.label, segment.path.display());
    }
}

pub fn write_summary(path: &Path, report: &PrepareReport) -> Result<()> {
    let created_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let summary = RunSummary {
        report,
        train_sha256: sha256_of_files(&[report.train.path.as_path()])?,
        val_sha256: sha256_of_files(&[report.validation.path.as_path()])?,
        created_at: format!("unix:{created_at}"),
    };
    write_json_atomic(path, &summary).map_err(|err| serialization_error(path, err))?;
    log::info!("wrote run summary to {}", path.display());
    Ok(())
}

/// What a token file holds, optionally decoded through a character manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    pub tokens: usize,
    pub max_id: Option<u16>,
    pub preview: Option<String>,
}

pub fn inspect_token_file(
    bin: &Path,
    manifest_path: Option<&Path>,
    preview_tokens: usize,
) -> Result<Inspection> {
    let ids = read_token_file(bin)?;
    let max_id = ids.iter().copied().max();

    let preview = match manifest_path {
        Some(path) => {
            let vocab = manifest::read_manifest(path)?;
            let head: Vec<TokenId> = ids
                .iter()
                .take(preview_tokens)
                .map(|&id| TokenId::from(id))
                .collect();
            Some(vocab.decode(&head)?)
        }
        None => None,
    };

    Ok(Inspection {
        tokens: ids.len(),
        max_id,
        preview,
    })
}

fn leading_chars(text: &str, count: usize) -> &str {
    match text.char_indices().nth(count) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

fn serialization_error(path: &Path, err: tokenizer::Error) -> Error {
    match err {
        tokenizer::Error::Io(source) => Error::Serialization {
            path: path.to_path_buf(),
            source,
        },
        other => Error::Tokenizer(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_chars_respects_char_boundaries() {
        assert_eq!(leading_chars("héllo", 2), "hé");
        assert_eq!(leading_chars("hi", 10), "hi");
        assert_eq!(leading_chars("", 3), "");
    }

    #[test]
    fn io_failures_become_serialization_errors() {
        let err = serialization_error(
            Path::new("meta.json"),
            tokenizer::Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")),
        );
        assert!(matches!(err, Error::Serialization { .. }));

        let err = serialization_error(Path::new("meta.json"), tokenizer::Error::EmptyCorpus);
        assert!(matches!(err, Error::Tokenizer(tokenizer::Error::EmptyCorpus)));
    }
}
