//! DNS server setup and lifecycle management.

use hickory_server::ServerFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, UdpSocket};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::dispatcher::QueryDispatcher;
use crate::error::DnsError;
use crate::registration;
use crate::store::RecordStore;

/// Idle timeout for TCP DNS connections.
const TCP_TIMEOUT: Duration = Duration::from_secs(30);

/// Authoritative DNS server for the configured root zones.
pub struct DnsServer {
    config: Config,
    store: Arc<dyn RecordStore>,
}

impl DnsServer {
    /// Create a server answering from `store`.
    pub fn new(config: Config, store: Arc<dyn RecordStore>) -> Self {
        Self { config, store }
    }

    /// Dispatcher the listeners hand requests to.
    pub fn dispatcher(&self) -> QueryDispatcher {
        QueryDispatcher::new(self.config.dns.clone(), self.store.clone())
    }

    /// Bind the configured addresses and serve until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), DnsError> {
        let addr = self.config.dns.listen_addr;

        let udp_socket = UdpSocket::bind(addr).await?;
        info!(%addr, "DNS UDP listening");

        let tcp_listener = TcpListener::bind(addr).await?;
        info!(%addr, "DNS TCP listening");

        self.serve(udp_socket, tcp_listener, shutdown).await
    }

    /// Serve on already-bound sockets until `shutdown` is cancelled.
    ///
    /// The registration endpoint is started alongside when configured.
    pub async fn serve(
        self,
        udp_socket: UdpSocket,
        tcp_listener: TcpListener,
        shutdown: CancellationToken,
    ) -> Result<(), DnsError> {
        info!(
            zones = ?self.config.dns.root_zones,
            axfr_allow = ?self.config.dns.axfr_allow,
            "Starting registry-dns server"
        );

        let registration_handle = self.start_registration(shutdown.clone()).await?;

        let mut server = ServerFuture::new(self.dispatcher());
        server.register_socket(udp_socket);
        server.register_listener(tcp_listener, TCP_TIMEOUT);

        info!("DNS server ready to serve queries");

        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("DNS server shutdown requested");
            }
            result = server.block_until_done() => {
                if let Err(e) = result {
                    error!("DNS server error: {}", e);
                }
                shutdown.cancel();
            }
        }

        if let Some(handle) = registration_handle {
            debug!("waiting for registration endpoint to stop");
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("registration endpoint error: {}", e),
                Err(e) => error!("registration task failed: {}", e),
            }
        }

        info!("DNS server stopped");
        Ok(())
    }

    async fn start_registration(
        &self,
        shutdown: CancellationToken,
    ) -> Result<Option<JoinHandle<std::io::Result<()>>>, DnsError> {
        let Some(registration_config) = &self.config.registration else {
            debug!("registration endpoint disabled");
            return Ok(None);
        };

        let listener = TcpListener::bind(registration_config.listen_addr).await?;
        info!(addr = %registration_config.listen_addr, "registration endpoint listening");

        let router = registration::routes(self.store.clone());
        Ok(Some(tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await
        })))
    }
}
