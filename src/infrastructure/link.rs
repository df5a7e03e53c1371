//! Chunk Links
//!
//! Anything that accepts the framed image chunk by chunk: the BLE
//! characteristic, a file on disk, or a dry run that only logs.

use crate::domain::error::TransportError;
use crate::domain::models::TransferReport;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info};

/// Destination for ordered image chunks.
///
/// A write must complete before the next one starts; the receiver
/// reassembles by arrival order.
#[allow(async_fn_in_trait)]
pub trait ChunkWriter {
    async fn write_chunk(&mut self, index: usize, chunk: &[u8]) -> Result<(), TransportError>;
}

/// Delays inserted between writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pacing {
    pub after_first: Duration,
    pub between_chunks: Duration,
}

impl Pacing {
    pub fn from_millis(after_first_ms: u64, between_chunks_ms: u64) -> Self {
        Self {
            after_first: Duration::from_millis(after_first_ms),
            between_chunks: Duration::from_millis(between_chunks_ms),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

/// Write every chunk in order, stopping at the first failure.
///
/// Pauses only separate writes; nothing waits after the last chunk.
/// Chunks already delivered are not rolled back.
pub async fn send_chunks<'a, W, I>(
    writer: &mut W,
    chunks: I,
    pacing: Pacing,
) -> Result<TransferReport, TransportError>
where
    W: ChunkWriter,
    I: ExactSizeIterator<Item = &'a [u8]>,
{
    let total = chunks.len();
    let mut report = TransferReport::default();

    for (index, chunk) in chunks.enumerate() {
        if let Err(e) = writer.write_chunk(index, chunk).await {
            error!(
                "Chunk {}/{} failed after {} bytes sent: {}",
                index + 1,
                total,
                report.bytes_sent,
                e
            );
            return Err(e);
        }
        report.chunks_sent += 1;
        report.bytes_sent += chunk.len();
        info!("Sent chunk {}/{}: {} bytes", index + 1, total, chunk.len());

        if index + 1 == total {
            break;
        }
        let delay = if index == 0 {
            pacing.after_first
        } else {
            pacing.between_chunks
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    info!(
        "Transfer complete: {} chunks, {} bytes",
        report.chunks_sent, report.bytes_sent
    );
    Ok(report)
}

/// Logs chunks without sending them anywhere
#[derive(Debug, Default)]
pub struct DryRunLink {
    pub chunk_lens: Vec<usize>,
}

impl ChunkWriter for DryRunLink {
    async fn write_chunk(&mut self, index: usize, chunk: &[u8]) -> Result<(), TransportError> {
        debug!(
            "[dry-run] chunk {} ({} bytes): {:02X?}",
            index,
            chunk.len(),
            &chunk[..chunk.len().min(16)]
        );
        self.chunk_lens.push(chunk.len());
        Ok(())
    }
}

/// Appends chunks to a file, reproducing the wire payload on disk
pub struct FileLink {
    file: File,
    path: PathBuf,
}

impl FileLink {
    pub fn create(path: &Path) -> Result<Self, TransportError> {
        let file = File::create(path)?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ChunkWriter for FileLink {
    async fn write_chunk(&mut self, _index: usize, chunk: &[u8]) -> Result<(), TransportError> {
        self.file.write_all(chunk)?;
        self.file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::framer::{frame, split, ChunkLimits};

    /// Records writes and fails on a chosen chunk
    struct MockLink {
        received: Vec<Vec<u8>>,
        fail_at: Option<usize>,
    }

    impl ChunkWriter for MockLink {
        async fn write_chunk(&mut self, index: usize, chunk: &[u8]) -> Result<(), TransportError> {
            if self.fail_at == Some(index) {
                return Err(TransportError::Disconnected);
            }
            self.received.push(chunk.to_vec());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_chunks_arrive_in_order() {
        let payload: Vec<u8> = (0..=255u8).cycle().take(2345).collect();
        let mut link = MockLink {
            received: Vec::new(),
            fail_at: None,
        };

        let report = send_chunks(&mut link, split(&payload, 500, 500), Pacing::none())
            .await
            .unwrap();

        assert_eq!(report.chunks_sent, 5);
        assert_eq!(report.bytes_sent, 2345);
        assert_eq!(link.received.concat(), payload);
    }

    #[tokio::test]
    async fn test_stops_at_first_failure() {
        let payload = vec![7u8; 1800];
        let mut link = MockLink {
            received: Vec::new(),
            fail_at: Some(2),
        };

        let result = send_chunks(&mut link, split(&payload, 500, 500), Pacing::none()).await;

        assert!(matches!(result, Err(TransportError::Disconnected)));
        assert_eq!(link.received.len(), 2);
    }

    #[tokio::test]
    async fn test_dry_run_counts_chunks() {
        let frame = frame(&[0x11; 992], 1984, 1, ChunkLimits::default());
        let mut link = DryRunLink::default();
        send_chunks(&mut link, frame.chunks(), Pacing::none())
            .await
            .unwrap();
        assert_eq!(link.chunk_lens, vec![500, 500]);
    }

    #[tokio::test]
    async fn test_file_link_reproduces_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.bin");
        let frame = frame(&[0x12, 0x34, 0x0F, 0x8C], 4, 2, ChunkLimits::new(1, 3).unwrap());

        let mut link = FileLink::create(&path).unwrap();
        let report = send_chunks(&mut link, frame.chunks(), Pacing::none())
            .await
            .unwrap();
        drop(link);

        assert_eq!(report.chunks_sent, 2);
        assert_eq!(
            std::fs::read(&path).unwrap(),
            vec![0x04, 0, 0, 0, 0x02, 0, 0, 0, 0x12, 0x34, 0x0F, 0x8C]
        );
    }

    #[tokio::test]
    async fn test_pacing_is_applied() {
        let payload = vec![0u8; 30];
        let mut link = DryRunLink::default();
        let started = std::time::Instant::now();
        send_chunks(
            &mut link,
            split(&payload, 10, 10),
            Pacing::from_millis(20, 10),
        )
        .await
        .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_no_pause_after_last_chunk() {
        let payload = vec![0u8; 20];
        let mut link = DryRunLink::default();
        let pacing = Pacing::from_millis(0, 60_000);

        let report = tokio::time::timeout(
            Duration::from_secs(5),
            send_chunks(&mut link, split(&payload, 10, 10), pacing),
        )
        .await
        .expect("send waited after the final chunk")
        .unwrap();
        assert_eq!(report.chunks_sent, 2);

        let single = tokio::time::timeout(
            Duration::from_secs(5),
            send_chunks(&mut link, split(&payload, 50, 10), Pacing::from_millis(60_000, 0)),
        )
        .await
        .expect("send waited after a lone chunk")
        .unwrap();
        assert_eq!(single.chunks_sent, 1);
    }
}
