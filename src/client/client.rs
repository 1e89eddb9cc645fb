use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::common::config::{ClientConfig, DEFAULT_MAX_FRAME_LEN};
use crate::common::message::{ErrorCode, Request, Response, decode_response, encode_request};
use crate::common::range::DelayRange;
use crate::server::transport::frame_codec;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("timed out after {timeout:?} connecting to {addr}")]
    ConnectTimeout { addr: String, timeout: Duration },
    #[error("no reply within {0:?}")]
    RequestTimeout(Duration),
    #[error("server closed the connection")]
    Closed,
    #[error("server rejected the request ({code:?}): {message}")]
    Rejected { code: ErrorCode, message: String },
    #[error("previous exchange did not complete, reconnect before sending another request")]
    Desynchronized,
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
}

/// Request channel to a delay server.
///
/// Exchanges are strictly alternating: `request` takes `&mut self`, and a
/// request whose reply never arrived (timeout, dropped future, transport
/// error) leaves the channel unusable so a late reply can never be read as
/// the answer to a newer request.
pub struct DelayClient {
    framed: Framed<TcpStream, LengthDelimitedCodec>,
    peer: SocketAddr,
    request_timeout: Duration,
    in_flight: bool,
}

impl DelayClient {
    pub async fn connect(client_config: &ClientConfig) -> Result<Self, ClientError> {
        Self::connect_to(
            &client_config.server_addr,
            client_config.connect_timeout(),
            client_config.request_timeout(),
        )
        .await
    }

    pub async fn connect_to(
        addr: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, ClientError> {
        let stream = match tokio::time::timeout(connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(ClientError::Connect {
                    addr: addr.to_string(),
                    source,
                });
            }
            Err(_) => {
                return Err(ClientError::ConnectTimeout {
                    addr: addr.to_string(),
                    timeout: connect_timeout,
                });
            }
        };
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;
        log::debug!("Connected to delay server at {}", peer);

        Ok(Self {
            framed: Framed::new(stream, frame_codec(DEFAULT_MAX_FRAME_LEN)),
            peer,
            request_timeout,
            in_flight: false,
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// `false` once an exchange was abandoned before its reply arrived.
    pub fn is_synchronized(&self) -> bool {
        !self.in_flight
    }

    /// Ask the server for a delay in `range`.
    pub async fn request(&mut self, range: &DelayRange) -> Result<f64, ClientError> {
        log::info!("Requesting delay with range: {}", range);
        let value = self.exchange(Request::delay(range)).await?;
        log::info!("Delay received: {:.2} seconds", value);
        Ok(value)
    }

    /// Send bounds without validating them locally; the server decides.
    pub async fn request_raw(&mut self, min: f64, max: f64) -> Result<f64, ClientError> {
        self.exchange(Request::Delay { min, max }).await
    }

    /// Block the calling task for `delay` seconds.
    pub async fn simulate(&self, delay: f64) {
        let duration = Duration::try_from_secs_f64(delay).unwrap_or_else(|_| {
            log::warn!("Cannot sleep for {} seconds, skipping", delay);
            Duration::ZERO
        });
        tokio::time::sleep(duration).await;
    }

    async fn exchange(&mut self, request: Request) -> Result<f64, ClientError> {
        if self.in_flight {
            return Err(ClientError::Desynchronized);
        }
        let frame = encode_request(&request).map_err(|e| ClientError::Protocol(e.to_string()))?;

        self.in_flight = true;
        let timeout = self.request_timeout;
        let response = tokio::time::timeout(timeout, self.round_trip(frame))
            .await
            .map_err(|_| ClientError::RequestTimeout(timeout))??;
        self.in_flight = false;

        match response {
            Response::Delay { value } => Ok(value),
            Response::Error { code, message } => Err(ClientError::Rejected { code, message }),
        }
    }

    async fn round_trip(&mut self, frame: Vec<u8>) -> Result<Response, ClientError> {
        self.framed.send(Bytes::from(frame)).await?;
        let reply = self.framed.next().await.ok_or(ClientError::Closed)??;
        decode_response(&reply).map_err(|e| ClientError::Protocol(e.to_string()))
    }
}
