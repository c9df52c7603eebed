//! Progress channel abstraction.
//!
//! A progress channel is a duplex message stream. The coordinator sends one
//! message per settled batch plus the terminal sentinel, and the peer
//! acknowledges each by echoing it back. Frames that do not decode to a
//! [`ProgressEvent`] are skipped by implementations.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use shortlist_core::ProgressEvent;

use crate::error::ChannelError;

/// An open progress channel, owned by a single job.
#[async_trait]
pub trait ProgressChannel: Send {
    /// Send an event to the peer.
    async fn send(&mut self, event: &ProgressEvent) -> Result<(), ChannelError>;

    /// Wait for the next recognized event from the peer.
    ///
    /// Returns `None` once the peer has closed the channel.
    async fn recv(&mut self) -> Option<Result<ProgressEvent, ChannelError>>;

    /// Close the channel. Errors while closing are not reported.
    async fn close(&mut self);
}

/// Opens one progress channel per job.
#[async_trait]
pub trait ProgressConnector: Send + Sync {
    /// Channel type produced by this connector.
    type Channel: ProgressChannel + 'static;

    /// Open a fresh channel.
    async fn connect(&self) -> Result<Self::Channel, ChannelError>;
}

/// Connector for in-process channels that echo every message back.
///
/// Behaves like the remote progress relay without a network hop.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopbackConnector;

#[async_trait]
impl ProgressConnector for LoopbackConnector {
    type Channel = LoopbackChannel;

    async fn connect(&self) -> Result<Self::Channel, ChannelError> {
        Ok(LoopbackChannel::new())
    }
}

/// In-process echo channel. Messages go through their wire encoding.
pub struct LoopbackChannel {
    tx: Option<mpsc::UnboundedSender<String>>,
    rx: mpsc::UnboundedReceiver<String>,
}

impl LoopbackChannel {
    /// Create an open loopback channel.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx: Some(tx), rx }
    }

    /// Push a raw text frame as if the peer had sent it.
    pub fn inject(&self, text: impl Into<String>) -> Result<(), ChannelError> {
        match &self.tx {
            Some(tx) => tx.send(text.into()).map_err(|_| ChannelError::Closed),
            None => Err(ChannelError::Closed),
        }
    }
}

impl Default for LoopbackChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProgressChannel for LoopbackChannel {
    async fn send(&mut self, event: &ProgressEvent) -> Result<(), ChannelError> {
        self.inject(event.to_wire())
    }

    async fn recv(&mut self) -> Option<Result<ProgressEvent, ChannelError>> {
        loop {
            let text = self.rx.recv().await?;
            match ProgressEvent::from_wire(&text) {
                Some(event) => return Some(Ok(event)),
                None => debug!(frame = %text, "Ignoring unrecognized progress frame"),
            }
        }
    }

    async fn close(&mut self) {
        // Dropping the sender lets `recv` drain and then return `None`.
        self.tx = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_loopback_echoes_events() {
        let mut channel = LoopbackConnector.connect().await.unwrap();

        channel.send(&ProgressEvent::progress(50.0)).await.unwrap();
        channel.send(&ProgressEvent::Completed).await.unwrap();

        assert_eq!(
            channel.recv().await.unwrap().unwrap(),
            ProgressEvent::progress(50.0)
        );
        assert_eq!(channel.recv().await.unwrap().unwrap(), ProgressEvent::Completed);
    }

    #[tokio::test]
    async fn test_loopback_skips_malformed_frames() {
        let mut channel = LoopbackChannel::new();
        channel.inject("garbage").unwrap();
        channel.inject(r#"{"message": "hi"}"#).unwrap();
        channel.send(&ProgressEvent::progress(10.0)).await.unwrap();

        assert_eq!(
            channel.recv().await.unwrap().unwrap(),
            ProgressEvent::progress(10.0)
        );
    }

    #[tokio::test]
    async fn test_loopback_close_ends_stream() {
        let mut channel = LoopbackChannel::new();
        channel.close().await;

        assert!(channel.send(&ProgressEvent::Completed).await.is_err());
        assert!(channel.recv().await.is_none());
    }
}
