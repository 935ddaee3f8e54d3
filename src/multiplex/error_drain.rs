//! Passthrough of the filter's error stream

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

/// Copy the filter's error stream to `sink` until it closes.
///
/// Failures are logged and swallowed: losing the filter's diagnostics must
/// never stop the documents flowing. Returns the number of bytes copied.
pub async fn drain_errors<R, W>(mut filter_errors: R, mut sink: W) -> u64
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let copied = match tokio::io::copy(&mut filter_errors, &mut sink).await {
        Ok(copied) => copied,
        Err(e) => {
            tracing::warn!("error processing standard error: {}", e);
            return 0;
        }
    };

    if let Err(e) = sink.flush().await {
        tracing::warn!("error flushing standard error: {}", e);
    }
    tracing::trace!("Error drain: copied {} bytes", copied);
    copied
}
