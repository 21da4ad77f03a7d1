//! Line-oriented request/reply transport.
//!
//! Each inbound line is one complete request string; each request gets
//! exactly one reply line. The bound address comes from a normalized
//! transport [`Uri`].

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

use super::uri::Uri;
use crate::error::TransportError;
use crate::protocol::jsonrpc::Service;

/// Serves `service` on an already-bound listener.
pub async fn run(listener: TcpListener, service: Arc<Service>) -> Result<(), TransportError> {
    loop {
        let (stream, peer) = listener.accept().await?;
        debug!(peer = %peer, "accepted requester");
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            if let Err(error) = serve_connection(stream, service).await {
                debug!(error = %error, "requester connection ended");
            }
        });
    }
}

/// Binds the URI's authority and serves `service` forever.
pub async fn serve(uri: &Uri, service: Arc<Service>) -> Result<(), TransportError> {
    let listener = TcpListener::bind(uri.authority()).await?;
    info!(uri = %uri, "serving JSON-RPC on request/reply socket");
    run(listener, service).await
}

async fn serve_connection(stream: TcpStream, service: Arc<Service>) -> Result<(), TransportError> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        if line.is_empty() {
            continue;
        }
        debug!("> {line}");
        let reply = service.handle_request(&line);
        debug!("< {reply}");
        writer.write_all(reply.as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::keyval;
    use serde_json::{json, Value};
    use tokio::io::AsyncBufReadExt;

    #[tokio::test]
    async fn test_one_reply_line_per_request_line() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(run(listener, Arc::new(keyval::service())));

        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        writer
            .write_all(
                b"{\"jsonrpc\": \"2.0\", \"id\": 1, \"method\": \"set\", \
                  \"params\": {\"key\": \"k\", \"val\": \"v\"}}\n",
            )
            .await
            .unwrap();
        let reply: Value = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert_eq!(reply, json!({"jsonrpc": "2.0", "id": 1, "result": null}));

        writer
            .write_all(
                b"{\"jsonrpc\": \"2.0\", \"id\": 2, \"method\": \"get\", \
                  \"params\": {\"key\": \"k\"}, \"metadata\": {\"async\": true}}\n",
            )
            .await
            .unwrap();
        let reply: Value = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert_eq!(reply, json!({"jsonrpc": "2.0", "id": 2, "result": "v"}));

        // malformed input still gets its one reply
        writer.write_all(b"{not json\n").await.unwrap();
        let reply: Value = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert_eq!(reply["error"]["code"], json!(-32700));
        assert_eq!(reply["id"], json!(null));
    }
}
