use crate::errors::Result;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Integer id of one symbol in a token stream.
pub type TokenId = u32;

/// Exclusive upper bound on token ids. Streams are serialized as `u16`, so
/// every id handed to a writer, and every vocabulary size, must fit below it.
pub const TOKEN_ID_LIMIT: u32 = 1 << 16;

/// Artifact locations after resolution against the artifact directory.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub json: Option<PathBuf>,
    pub vocab: Option<PathBuf>,
    pub merges: Option<PathBuf>,
}

pub fn sha256_of_files(paths: &[&Path]) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8 * 1024];

    for path in paths {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        loop {
            let read = reader.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }
    }

    Ok(format!("{:x}", hasher.finalize()))
}
