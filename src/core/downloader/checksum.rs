use std::path::Path;

use md5::{Digest, Md5};
use tokio::io::AsyncReadExt;

use crate::core::error::{FetcherError, FetcherResult};

const READ_CHUNK: usize = 64 * 1024;

/// Lower-case hex MD5 of an in-memory buffer.
pub fn md5_hex(bytes: &[u8]) -> String {
    hex::encode(Md5::digest(bytes))
}

/// Lower-case hex MD5 of a file, read in chunks.
pub async fn md5_file(path: &Path) -> FetcherResult<String> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(FetcherError::io(path))?;
    let mut hasher = Md5::new();
    let mut buf = vec![0u8; READ_CHUNK];

    loop {
        let n = file.read(&mut buf).await.map_err(FetcherError::io(path))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Extract the digest from a published checksum file.
///
/// The format is `<hex-digest>  <filename>`; only the leading token is used.
pub fn parse_checksum(content: &str, url: &str) -> FetcherResult<String> {
    let token = content
        .split_whitespace()
        .next()
        .filter(|t| t.chars().all(|c| c.is_ascii_hexdigit()))
        .ok_or_else(|| FetcherError::InvalidChecksumFile {
            url: url.to_string(),
        })?;
    Ok(token.to_ascii_lowercase())
}
