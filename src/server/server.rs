use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::common::config::{ServerConfig, load_server_config};
use crate::handler::context::HandlerContext;
use crate::server::signal::spawn_shutdown_listener;
use crate::server::transport::{self, ConnectionLimits};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Bound, not serving yet.
    Idle,
    Running,
    Stopping,
    /// Listener released; the server cannot serve again.
    Stopped,
}

/// Reply endpoint that maps each incoming range to one delay value.
///
/// The listener is acquired in [`DelayServer::bind`] and released when
/// [`DelayServer::serve_forever`] returns, whether it stopped on request or
/// failed.
pub struct DelayServer {
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    handler_ctx: HandlerContext,
    limits: ConnectionLimits,
    shutdown: CancellationToken,
    state: watch::Sender<ServerState>,
}

impl DelayServer {
    pub async fn bind(server_config: &ServerConfig) -> Result<Self> {
        Self::bind_with(server_config, HandlerContext::from_config(server_config)).await
    }

    pub async fn bind_with(
        server_config: &ServerConfig,
        handler_ctx: HandlerContext,
    ) -> Result<Self> {
        let addr = server_config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;
        let local_addr = listener.local_addr()?;
        log::info!("Random delay server listening on {}", local_addr);

        Ok(Self {
            listener: Some(listener),
            local_addr,
            handler_ctx,
            limits: ConnectionLimits {
                max_frame_len: server_config.max_frame_len,
                idle_timeout: server_config.idle_timeout(),
                write_timeout: server_config.write_timeout(),
            },
            shutdown: CancellationToken::new(),
            state: watch::Sender::new(ServerState::Idle),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> ServerState {
        *self.state.borrow()
    }

    /// Follows lifecycle changes while [`DelayServer::serve_forever`] holds
    /// the server.
    pub fn state_handle(&self) -> watch::Receiver<ServerState> {
        self.state.subscribe()
    }

    /// Cancelling the returned token stops [`DelayServer::serve_forever`] at
    /// its next wait point: waiting for a peer, for a request, or for the
    /// peer to take a reply.
    pub fn shutdown_handle(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn handler_context(&self) -> &HandlerContext {
        &self.handler_ctx
    }

    pub async fn serve_forever(&mut self) -> Result<()> {
        let listener = self
            .listener
            .take()
            .ok_or_else(|| anyhow::anyhow!("server on {} already stopped", self.local_addr))?;
        self.state.send_replace(ServerState::Running);

        let result = transport::serve(
            &listener,
            &mut self.handler_ctx,
            &self.limits,
            &self.shutdown,
        )
        .await;

        self.state.send_replace(ServerState::Stopping);
        log::info!(
            "Stopping server on {} (served {}, rejected {})",
            self.local_addr,
            self.handler_ctx.served,
            self.handler_ctx.rejected
        );
        drop(listener);
        self.state.send_replace(ServerState::Stopped);

        if let Err(e) = &result {
            log::error!("Server loop failed: {:?}", e);
        }
        result
    }
}

pub async fn server_start(config_path: Option<&str>, bind_override: Option<&str>) -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Starting random delay server...");

    let mut server_config = load_server_config(config_path)?;
    if let Some(bind) = bind_override {
        server_config.override_bind(bind)?;
    }

    let mut server = DelayServer::bind(&server_config).await?;
    let signal_task = spawn_shutdown_listener(server.shutdown_handle());
    let result = server.serve_forever().await;
    signal_task.abort();
    result
}
