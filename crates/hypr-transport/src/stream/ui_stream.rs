//! Receiver side of a turn.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use hypr_core::{HyprUIMessage, UiMessageChunk};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::stream::accumulator::UiMessageAccumulator;

/// Chunks of one assistant response, plus the messages the caller sent.
///
/// `original_messages` are the caller's messages before context
/// augmentation, so the UI can diff against what it already shows.
#[derive(Debug)]
pub struct UiMessageStream {
    original_messages: Vec<HyprUIMessage>,
    chunks: ReceiverStream<UiMessageChunk>,
    cancel: CancellationToken,
}

impl UiMessageStream {
    /// Wrap a chunk receiver.
    pub fn new(
        original_messages: Vec<HyprUIMessage>,
        rx: mpsc::Receiver<UiMessageChunk>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            original_messages,
            chunks: ReceiverStream::new(rx),
            cancel,
        }
    }

    /// Messages as the caller sent them.
    pub fn original_messages(&self) -> &[HyprUIMessage] {
        &self.original_messages
    }

    /// Ask the producer to stop. An `abort` chunk follows.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Token shared with the producer.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Drain the stream into an accumulator.
    pub async fn accumulate(mut self) -> UiMessageAccumulator {
        let mut acc = UiMessageAccumulator::new(&self.original_messages);
        while let Some(chunk) = self.chunks.next().await {
            acc.apply(&chunk);
        }
        acc
    }
}

impl Stream for UiMessageStream {
    type Item = UiMessageChunk;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().chunks).poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn yields_chunks_then_ends() {
        let (tx, rx) = mpsc::channel(4);
        let mut stream = UiMessageStream::new(vec![], rx, CancellationToken::new());
        tx.send(UiMessageChunk::StartStep).await.unwrap();
        drop(tx);
        assert_eq!(stream.next().await, Some(UiMessageChunk::StartStep));
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn stop_cancels_shared_token() {
        let (_tx, rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        let stream = UiMessageStream::new(vec![], rx, cancel.clone());
        stream.stop();
        assert!(cancel.is_cancelled());
        assert!(stream.cancellation_token().is_cancelled());
    }

    #[tokio::test]
    async fn keeps_original_messages() {
        let (_tx, rx) = mpsc::channel(1);
        let original = vec![HyprUIMessage::user("u1", "hi")];
        let stream = UiMessageStream::new(original.clone(), rx, CancellationToken::new());
        assert_eq!(stream.original_messages(), original.as_slice());
    }
}
