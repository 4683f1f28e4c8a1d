//! Content comparison of captured frames.

use std::path::Path;

use async_trait::async_trait;
use tokio::fs::{self, File};
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};

use crate::error::{MediaError, MediaResult};

const CHUNK_SIZE: usize = 64 * 1024;

/// Decides whether two frame files hold the same image.
#[async_trait]
pub trait FrameComparator: Send + Sync {
    async fn files_equal(&self, a: &Path, b: &Path) -> MediaResult<bool>;
}

/// Byte-for-byte comparison.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteComparator;

#[async_trait]
impl FrameComparator for ByteComparator {
    async fn files_equal(&self, a: &Path, b: &Path) -> MediaResult<bool> {
        let (meta_a, meta_b) = (metadata(a).await?, metadata(b).await?);
        if meta_a.len() != meta_b.len() {
            return Ok(false);
        }

        let mut reader_a = BufReader::new(File::open(a).await?);
        let mut reader_b = BufReader::new(File::open(b).await?);
        let mut buf_a = vec![0u8; CHUNK_SIZE];
        let mut buf_b = vec![0u8; CHUNK_SIZE];

        loop {
            let n_a = fill(&mut reader_a, &mut buf_a).await?;
            let n_b = fill(&mut reader_b, &mut buf_b).await?;
            if n_a != n_b || buf_a[..n_a] != buf_b[..n_b] {
                return Ok(false);
            }
            if n_a == 0 {
                return Ok(true);
            }
        }
    }
}

async fn metadata(path: &Path) -> MediaResult<std::fs::Metadata> {
    fs::metadata(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => MediaError::FileNotFound(path.to_path_buf()),
        _ => MediaError::Io(e),
    })
}

/// Read until `buf` is full or the reader is exhausted.
async fn fill<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
