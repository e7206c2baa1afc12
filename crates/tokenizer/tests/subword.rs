use std::fs;
use std::path::Path;

use tokenizer::errors::Result;
use tokenizer::{build_from_artifacts, verify_roundtrip, Error, SubwordCfg, SubwordEncoder};
use tokenizers::AddedToken;

// Minimal GPT-2 style byte-level BPE: "Ġ" stands for a leading space.
const VOCAB_JSON: &str =
    r#"{"a": 0, "b": 1, "Ġ": 2, "ab": 3, "Ġab": 4, "<": 5, "|": 6, ">": 7, "e": 8}"#;
const MERGES_TXT: &str = "#version: 0.2\na b\nĠ ab\n";

fn write_table(dir: &Path) -> Result<SubwordCfg> {
    fs::write(dir.join("vocab.json"), VOCAB_JSON)?;
    fs::write(dir.join("merges.txt"), MERGES_TXT)?;
    Ok(SubwordCfg::from_vocab_merges(
        dir.join("vocab.json"),
        dir.join("merges.txt"),
    ))
}

#[test]
fn vocab_and_merges_build_a_byte_level_table() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let cfg = write_table(tmp.path())?;
    let tok = build_from_artifacts(&cfg)?;

    assert_eq!(SubwordEncoder::vocab_size(&tok), 9);
    let ids = tok.encode_ordinary("ab ab")?;
    assert_eq!(ids, vec![3, 4]);
    assert_eq!(SubwordEncoder::decode(&tok, &ids)?, "ab ab");
    verify_roundtrip(&tok, "ab ab ab")?;
    Ok(())
}

#[test]
fn missing_table_is_an_artifact_error() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = SubwordCfg::from_tokenizer_json(tmp.path().join("tokenizer.json"));
    let err = build_from_artifacts(&cfg).unwrap_err();
    assert!(matches!(err, Error::Artifact(_)), "unexpected error: {err}");
}

#[test]
fn special_token_text_is_encoded_as_ordinary_text() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let cfg = write_table(tmp.path())?;
    let mut tok = build_from_artifacts(&cfg)?;
    tok.add_special_tokens(&[AddedToken::from("<|e|>", true)]);
    let json_path = tmp.path().join("tokenizer.json");
    tok.save(&json_path, false)?;

    let table = build_from_artifacts(&SubwordCfg::from_tokenizer_json(json_path.clone()))?;
    assert_eq!(table.token_to_id("<|e|>"), Some(9));

    let ids = table.encode_ordinary("ab<|e|>")?;
    assert_eq!(ids, vec![3, 5, 6, 8, 6, 7]);
    assert_eq!(SubwordEncoder::decode(&table, &ids)?, "ab<|e|>");
    Ok(())
}
