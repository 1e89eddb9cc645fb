use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tokio_util::sync::CancellationToken;

use crate::handler::context::HandlerContext;
use crate::server::dispatch;

#[derive(Debug, Clone, Copy)]
pub struct ConnectionLimits {
    pub max_frame_len: usize,
    pub idle_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
}

/// Build the length-delimited codec shared by server and client
/// (u32 BE length field).
pub fn frame_codec(max_frame_len: usize) -> LengthDelimitedCodec {
    let mut builder = tokio_util::codec::length_delimited::Builder::new();
    builder.length_field_length(4);
    builder.max_frame_length(max_frame_len);
    builder.new_codec()
}

/// Run the accept loop until `shutdown` fires. Connections are served one
/// at a time in accept order; a failing connection is logged and dropped
/// and the loop moves on. Only an accept failure ends the loop with `Err`.
pub async fn serve(
    listener: &TcpListener,
    handler_ctx: &mut HandlerContext,
    limits: &ConnectionLimits,
    shutdown: &CancellationToken,
) -> anyhow::Result<()> {
    loop {
        let (stream, remote) = tokio::select! {
            _ = shutdown.cancelled() => {
                log::debug!("Shutdown requested while waiting for a connection");
                return Ok(());
            }
            accepted = listener.accept() => accepted.context("failed to accept connection")?,
        };
        log::info!("Accepted connection from {}", remote);

        match handle_connection(stream, remote, handler_ctx, limits, shutdown).await {
            Ok(()) => log::info!("Connection from {} closed", remote),
            Err(e) => log::error!("Connection from {} terminated with error: {:?}", remote, e),
        }
    }
}

/// Serve one peer: read a request frame, write its reply, repeat.
async fn handle_connection(
    stream: TcpStream,
    remote: SocketAddr,
    handler_ctx: &mut HandlerContext,
    limits: &ConnectionLimits,
    shutdown: &CancellationToken,
) -> anyhow::Result<()> {
    let mut framed = Framed::new(stream, frame_codec(limits.max_frame_len));

    loop {
        let next = tokio::select! {
            _ = shutdown.cancelled() => {
                log::debug!("Shutdown requested, closing connection from {}", remote);
                return Ok(());
            }
            next = next_frame(&mut framed, limits.idle_timeout) => next,
        };
        let frame = match next {
            Some(frame) => frame.context("failed to read frame")?,
            None => return Ok(()),
        };
        log::debug!("Received {} byte frame from {}", frame.len(), remote);

        let out = dispatch::dispatch_frame(frame.freeze(), handler_ctx)?;
        // A peer that stops reading can park the write; shutdown must still win.
        tokio::select! {
            _ = shutdown.cancelled() => {
                log::debug!("Shutdown requested while replying to {}", remote);
                return Ok(());
            }
            sent = send_reply(&mut framed, out, limits.write_timeout) => sent?,
        }
        log::debug!("Response sent to {}", remote);
    }
}

// `None` on clean disconnect or when the peer stays idle past the limit.
async fn next_frame(
    framed: &mut Framed<TcpStream, LengthDelimitedCodec>,
    idle_timeout: Option<Duration>,
) -> Option<std::io::Result<bytes::BytesMut>> {
    match idle_timeout {
        Some(limit) => match tokio::time::timeout(limit, framed.next()).await {
            Ok(next) => next,
            Err(_) => {
                log::warn!("Peer idle for {:?}, disconnecting", limit);
                None
            }
        },
        None => framed.next().await,
    }
}

async fn send_reply(
    framed: &mut Framed<TcpStream, LengthDelimitedCodec>,
    out: Vec<u8>,
    write_timeout: Option<Duration>,
) -> anyhow::Result<()> {
    let send = framed.send(Bytes::from(out));
    match write_timeout {
        Some(limit) => tokio::time::timeout(limit, send)
            .await
            .map_err(|_| anyhow::anyhow!("peer did not take the reply within {:?}", limit))?
            .context("failed to send response"),
        None => send.await.context("failed to send response"),
    }
}
