//! Backpressure-safe envelope output

use crate::errors::Result;
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Write `bytes` in chunks of at most `chunk_size`, then flush.
///
/// Each `write` may accept fewer bytes than offered; the loop resumes from
/// the first unaccepted byte and suspends while the destination is full.
pub async fn write_all_chunked<W>(writer: &mut W, bytes: &[u8], chunk_size: usize) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let chunk_size = chunk_size.max(1);
    let mut offset = 0;

    while offset < bytes.len() {
        let end = (offset + chunk_size).min(bytes.len());
        let written = writer.write(&bytes[offset..end]).await?;
        if written == 0 {
            return Err(io::Error::new(io::ErrorKind::WriteZero, "output stream accepted no bytes").into());
        }
        offset += written;
    }

    writer.flush().await?;
    tracing::debug!(bytes = bytes.len(), "envelope written");
    Ok(())
}
