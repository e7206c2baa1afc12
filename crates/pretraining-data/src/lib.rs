//! Turns raw text corpora into flat `u16` token files for model training.
//!
//! A run reads one or more UTF-8 corpora, tokenizes them with either a
//! character vocabulary derived from the corpus or an external subword table,
//! splits them into training and validation streams, and writes each stream as
//! little-endian `u16` values with no header. The character variant also
//! writes a JSON manifest so ids can be decoded later.

pub mod binary;
pub mod config;
pub mod corpora;
pub mod errors;
pub mod prepare;
pub mod splitting;

pub use config::{
    CharDatasetConfig, DatasetConfig, OutputConfig, PrepareConfig, SubwordDatasetConfig,
};
pub use corpora::{Corpus, Newlines, SplitLabel};
pub use errors::{Error, Result};
pub use prepare::{prepare_char, prepare_subword, run, PrepareReport};
pub use splitting::{split_by_ratio, SplitPlan, SplitPolicy};
