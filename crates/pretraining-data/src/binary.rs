//! Flat token files: each id is an unsigned 16-bit little-endian integer, with
//! no header, length prefix or delimiter. A file of `n` tokens is exactly
//! `2 * n` bytes long.

use std::fs;
use std::io::Write;
use std::path::Path;

use tokenizer::artifacts::AtomicBatch;
use tokenizer::{TokenId, TOKEN_ID_LIMIT};

use crate::errors::{Error, Result};

pub const BYTES_PER_TOKEN: u64 = 2;

/// Fails on the first id that does not fit in 16 bits.
pub fn check_range(ids: &[TokenId]) -> Result<()> {
    match ids.iter().position(|&id| id >= TOKEN_ID_LIMIT) {
        Some(position) => Err(Error::Range {
            id: ids[position],
            position,
            limit: TOKEN_ID_LIMIT,
        }),
        None => Ok(()),
    }
}

pub fn encode_u16_le(ids: &[TokenId]) -> Result<Vec<u8>> {
    check_range(ids)?;
    let mut bytes = Vec::with_capacity(ids.len() * BYTES_PER_TOKEN as usize);
    for &id in ids {
        bytes.extend_from_slice(&(id as u16).to_le_bytes());
    }
    Ok(bytes)
}

/// Range-checks `ids` and stages them for `path` in `batch`. Returns the
/// number of bytes the file will hold once the batch is committed.
pub fn stage_token_file(batch: &mut AtomicBatch, path: &Path, ids: &[TokenId]) -> Result<u64> {
    let bytes = encode_u16_le(ids)?;
    batch
        .stage(path, |writer| writer.write_all(&bytes))
        .map_err(|source| Error::Serialization {
            path: path.to_path_buf(),
            source,
        })?;

    let staged = bytes.len() as u64;
    log::debug!("staged {} tokens ({staged} bytes) for {}", ids.len(), path.display());
    Ok(staged)
}

/// Range-checks `ids`, then writes them atomically to `path`. Nothing is
/// created when the check fails. Returns the number of bytes written.
pub fn write_token_file(path: &Path, ids: &[TokenId]) -> Result<u64> {
    let mut batch = AtomicBatch::new();
    let written = stage_token_file(&mut batch, path, ids)?;
    batch.commit()?;
    Ok(written)
}

pub fn read_token_file(path: &Path) -> Result<Vec<u16>> {
    let bytes = fs::read(path).map_err(|source| Error::InputNotFound {
        path: path.to_path_buf(),
        source,
    })?;
    if bytes.len() as u64 % BYTES_PER_TOKEN != 0 {
        return Err(Error::CorruptTokenFile {
            path: path.to_path_buf(),
            len: bytes.len() as u64,
        });
    }

    Ok(bytes
        .chunks_exact(BYTES_PER_TOKEN as usize)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

/// Token count recovered from the file size alone.
pub fn token_count(path: &Path) -> Result<u64> {
    let len = fs::metadata(path)
        .map_err(|source| Error::InputNotFound {
            path: path.to_path_buf(),
            source,
        })?
        .len();
    if len % BYTES_PER_TOKEN != 0 {
        return Err(Error::CorruptTokenFile {
            path: path.to_path_buf(),
            len,
        });
    }
    Ok(len / BYTES_PER_TOKEN)
}
