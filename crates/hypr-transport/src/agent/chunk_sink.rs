//! Channel the tool loop emits UI chunks into.

use hypr_core::UiMessageChunk;
use tokio::sync::mpsc;

/// Sending half of a turn's chunk stream.
///
/// `emit` returns `false` once the consumer is gone; the loop treats that as
/// a reason to stop.
#[derive(Clone, Debug)]
pub struct ChunkSink {
    tx: mpsc::Sender<UiMessageChunk>,
}

impl ChunkSink {
    /// Wrap a sender.
    pub fn new(tx: mpsc::Sender<UiMessageChunk>) -> Self {
        Self { tx }
    }

    /// Send one chunk, waiting for capacity.
    pub async fn emit(&self, chunk: UiMessageChunk) -> bool {
        let chunk_type = chunk.chunk_type();
        if self.tx.send(chunk).await.is_err() {
            tracing::debug!(chunk_type, "chunk receiver dropped");
            return false;
        }
        true
    }

    /// True once the receiver has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emit_delivers_in_order() {
        let (tx, mut rx) = mpsc::channel(4);
        let sink = ChunkSink::new(tx);
        assert!(sink.emit(UiMessageChunk::StartStep).await);
        assert!(sink.emit(UiMessageChunk::FinishStep).await);
        assert_eq!(rx.recv().await, Some(UiMessageChunk::StartStep));
        assert_eq!(rx.recv().await, Some(UiMessageChunk::FinishStep));
    }

    #[tokio::test]
    async fn emit_after_receiver_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sink = ChunkSink::new(tx);
        assert!(sink.is_closed());
        assert!(!sink.emit(UiMessageChunk::Abort).await);
    }
}
