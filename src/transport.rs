//! # Stream transport
//!
//! Push subscription over TCP. Each line on the socket is one JSON frame
//! `{"event": <name>, "data": <payload>}`, in both directions.

use anyhow::{Context, Result};
use fleet_state::{Frame, PushTransport, Subscription};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{debug, warn};

/// Longest line accepted from the stream server.
const MAX_FRAME_LEN: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct TcpTransport {
    addr: String,
}

impl TcpTransport {
    #[must_use]
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }
}

impl PushTransport for TcpTransport {
    type Subscription = TcpSubscription;

    async fn subscribe(&self) -> Result<TcpSubscription> {
        let stream = TcpStream::connect(&self.addr)
            .await
            .with_context(|| format!("connecting to stream server {}", self.addr))?;
        debug!(addr = %self.addr, "stream socket open");

        Ok(TcpSubscription {
            lines: Framed::new(stream, LinesCodec::new_with_max_length(MAX_FRAME_LEN)),
        })
    }
}

#[derive(Debug)]
pub struct TcpSubscription {
    lines: Framed<TcpStream, LinesCodec>,
}

impl Subscription for TcpSubscription {
    async fn emit(&mut self, event: &str) -> Result<()> {
        let line = serde_json::to_string(&Frame::new(event, Value::Null))
            .context("serializing outbound frame")?;
        self.lines.send(line).await.with_context(|| format!("sending `{event}`"))
    }

    async fn next_frame(&mut self) -> Option<Result<Frame>> {
        loop {
            let line = match self.lines.next().await? {
                Ok(line) => line,
                Err(e) => return Some(Err(e).context("reading stream")),
            };
            if line.trim().is_empty() {
                continue;
            }

            // a line that is not a frame at all is skipped, the stream stays up
            match serde_json::from_str::<Frame>(&line) {
                Ok(frame) => return Some(Ok(frame)),
                Err(e) => warn!(monotonic_counter.unparsed_frames = 1, error = %e, "skipping line"),
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        SinkExt::<String>::close(&mut self.lines).await.context("closing stream socket")
    }
}
