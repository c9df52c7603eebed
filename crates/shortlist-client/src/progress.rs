//! WebSocket progress channel.
//!
//! The service exposes a relay at `/ws/progress` that echoes every progress
//! message back to the sender and closes after echoing the terminal one.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use shortlist_bulk::{ChannelError, ProgressChannel, ProgressConnector};
use shortlist_core::ProgressEvent;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens a fresh WebSocket connection to the progress relay per job.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    /// Create a connector for the given relay URL.
    ///
    /// A missing scheme defaults to `ws://`. `wss://` URLs are kept as given
    /// but refused by [`ProgressConnector::connect`], since no TLS backend is
    /// linked for the relay connection.
    pub fn new(url: &str) -> Self {
        let url = if !url.starts_with("ws://") && !url.starts_with("wss://") {
            format!("ws://{}", url)
        } else {
            url.to_string()
        };
        Self { url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ProgressConnector for WsConnector {
    type Channel = WsProgressChannel;

    async fn connect(&self) -> Result<WsProgressChannel, ChannelError> {
        if self.url.starts_with("wss://") {
            return Err(ChannelError::Connect(format!(
                "{}: TLS progress relays (wss://) are not supported, use ws://",
                self.url
            )));
        }

        let (stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| ChannelError::Connect(format!("{}: {}", self.url, e)))?;

        info!(url = %self.url, "Progress channel connected");
        Ok(WsProgressChannel { stream })
    }
}

/// An open WebSocket progress channel.
pub struct WsProgressChannel {
    stream: WsStream,
}

#[async_trait]
impl ProgressChannel for WsProgressChannel {
    async fn send(&mut self, event: &ProgressEvent) -> Result<(), ChannelError> {
        self.stream
            .send(Message::Text(event.to_wire().into()))
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<ProgressEvent, ChannelError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => match ProgressEvent::from_wire(text.as_str()) {
                    Some(event) => return Some(Ok(event)),
                    None => debug!(frame = %text.as_str(), "Ignoring unrecognized progress frame"),
                },
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "Progress relay closed the channel");
                    return None;
                }
                // Pings are answered by tungstenite on the next write.
                Ok(_) => {}
                Err(e) => return Some(Err(ChannelError::Transport(e.to_string()))),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            debug!(error = %e, "Error while closing progress channel");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_defaults_to_ws() {
        assert_eq!(
            WsConnector::new("localhost:8000/ws/progress").url(),
            "ws://localhost:8000/ws/progress"
        );
        assert_eq!(
            WsConnector::new("wss://example.com/ws/progress").url(),
            "wss://example.com/ws/progress"
        );
    }

    #[tokio::test]
    async fn test_wss_refused_before_dialing() {
        let connector = WsConnector::new("wss://127.0.0.1:1/ws/progress");
        match connector.connect().await {
            Err(ChannelError::Connect(msg)) => assert!(msg.contains("not supported"), "{msg}"),
            Err(other) => panic!("expected connect error, got {other:?}"),
            Ok(_) => panic!("wss relay must be refused"),
        }
    }
}
