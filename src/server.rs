//! Server lifecycle
//!
//! [`ProxyServer`] collects the handler, channel and configuration;
//! [`ProxyServer::start`] binds the listener, spawns the dispatch thread and
//! returns a [`ServerHandle`] that controls the running server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::api::{create_router, AppState};
use crate::automation::AutomationHandler;
use crate::channel::{NullChannel, PassThroughChannel};
use crate::config::Config;
use crate::dispatch::Dispatch;
use crate::error::ServerError;
use crate::rpc::RpcDispatcher;

/// How long `stop` waits for the listener and sessions to wind down
const STOP_GRACE: Duration = Duration::from_secs(2);

pub struct ProxyServer {
    config: Config,
    handler: Option<Box<dyn AutomationHandler>>,
    channel: Box<dyn PassThroughChannel>,
}

impl ProxyServer {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            handler: None,
            channel: Box::new(NullChannel::new()),
        }
    }

    pub fn with_handler(mut self, handler: impl AutomationHandler + 'static) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    pub fn with_channel(mut self, channel: impl PassThroughChannel + 'static) -> Self {
        self.channel = Box::new(channel);
        self
    }

    /// Bind and start serving; port 0 picks an ephemeral port
    pub async fn start(self) -> Result<ServerHandle, ServerError> {
        let addr = self.config.bind_addr()?;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;

        let mut rpc = RpcDispatcher::new(self.config.token.clone());
        rpc.set_handler(self.handler);
        let dispatch = Arc::new(Dispatch::spawn(rpc, self.channel)?);
        let state = Arc::new(AppState::new(dispatch));
        let app = create_router(state.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            let shutdown = async move {
                let _ = shutdown_rx.await;
            };
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                tracing::error!("Server error: {}", e);
            }
        });

        tracing::info!(
            "Automation proxy listening on {} (auth {})",
            local_addr,
            if self.config.token.is_some() { "enabled" } else { "disabled" }
        );

        Ok(ServerHandle {
            local_addr,
            state,
            shutdown: Some(shutdown_tx),
            server: Some(server),
        })
    }
}

/// Control surface of a running server
pub struct ServerHandle {
    local_addr: SocketAddr,
    state: Arc<AppState>,
    shutdown: Option<oneshot::Sender<()>>,
    server: Option<JoinHandle<()>>,
}

impl ServerHandle {
    pub fn is_listening(&self) -> bool {
        self.server.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn session_count(&self) -> usize {
        self.state.active_session_count()
    }

    /// Replace the handler; takes effect between frames
    pub fn set_handler(&self, handler: impl AutomationHandler + 'static) {
        self.state.dispatch.set_handler(Some(Box::new(handler)));
    }

    /// Remove the handler; later requests fail with "Handler is not configured"
    pub fn clear_handler(&self) {
        self.state.dispatch.set_handler(None);
    }

    /// Close every session and the listener
    pub async fn stop(&mut self) {
        let Some(server) = self.server.take() else {
            return;
        };
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }

        let dispatch = self.state.dispatch.clone();
        if let Err(e) = tokio::task::spawn_blocking(move || dispatch.shutdown()).await {
            tracing::error!("Dispatch thread did not stop cleanly: {}", e);
        }

        if tokio::time::timeout(STOP_GRACE, server).await.is_err() {
            tracing::warn!("Listener did not stop within {:?}", STOP_GRACE);
        }

        let deadline = tokio::time::Instant::now() + STOP_GRACE;
        while self.session_count() > 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        tracing::info!("Automation proxy on {} stopped", self.local_addr);
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
