//! Two-frame publish/subscribe transport.
//!
//! Messages are `(topic, payload)` pairs framed as one line with the topic
//! prefix first; topics must not contain whitespace. A subscriber's first
//! line names its topic prefix filter (the empty prefix subscribes to
//! everything), matching the usual prefix-filter socket semantics. Used for
//! change-notification delivery derived from path subscriptions.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::uri::Uri;
use crate::error::TransportError;

/// Fan-out capacity before slow subscribers start missing messages.
const CHANNEL_CAPACITY: usize = 256;

/// A topic/payload publisher fanning out to connected subscribers.
pub struct Publisher {
    sender: broadcast::Sender<(String, String)>,
}

impl Default for Publisher {
    fn default() -> Self {
        Self::new()
    }
}

impl Publisher {
    /// Creates a publisher with the default fan-out capacity.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publishes `payload` on `topic`. Dropped when nobody subscribes.
    pub fn publish(&self, topic: &str, payload: &str) {
        let _ = self.sender.send((topic.to_string(), payload.to_string()));
    }

    /// Serves subscribers on an already-bound listener.
    pub async fn run(&self, listener: TcpListener) -> Result<(), TransportError> {
        loop {
            let (stream, peer) = listener.accept().await?;
            debug!(peer = %peer, "accepted subscriber");
            let receiver = self.sender.subscribe();
            tokio::spawn(async move {
                let _ = serve_subscriber(stream, receiver).await;
            });
        }
    }

    /// Binds the URI's authority and serves subscribers forever.
    pub async fn serve(&self, uri: &Uri) -> Result<(), TransportError> {
        let listener = TcpListener::bind(uri.authority()).await?;
        info!(uri = %uri, "publishing on PUB socket");
        self.run(listener).await
    }
}

async fn serve_subscriber(
    stream: TcpStream,
    mut receiver: broadcast::Receiver<(String, String)>,
) -> Result<(), TransportError> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();
    let filter = lines
        .next_line()
        .await?
        .ok_or(TransportError::ConnectionClosed)?;
    loop {
        match receiver.recv().await {
            Ok((topic, payload)) => {
                if !topic.starts_with(&filter) {
                    continue;
                }
                writer
                    .write_all(format!("{topic} {payload}\n").as_bytes())
                    .await?;
            }
            // A lagging subscriber loses messages, not its connection.
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => return Ok(()),
        }
    }
}

/// Connects to a publisher, subscribes to the `topic` prefix, and hands every
/// received frame to `deliver`.
pub async fn subscribe(
    uri: &Uri,
    topic: &str,
    mut deliver: impl FnMut(&str, &str),
) -> Result<(), TransportError> {
    let stream = TcpStream::connect(uri.authority()).await?;
    let (reader, mut writer) = stream.into_split();
    writer.write_all(format!("{topic}\n").as_bytes()).await?;
    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        let (topic, payload) = line.split_once(' ').unwrap_or((line.as_str(), ""));
        deliver(topic, payload);
    }
    Ok(())
}
