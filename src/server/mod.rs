pub mod api;
pub mod errors;
pub mod relay;

use crate::cli::Args;
use std::error::Error;
use std::net::SocketAddr;
use axum::Router;
use log::{ info, warn, error };

pub struct Server {
    addr: String,
    app: Router,
    args: Args,
}

impl Server {
    pub fn new(addr: String, state: api::AppState, args: Args) -> Self {
        Self {
            addr,
            app: api::create_router(state),
            args,
        }
    }

    pub async fn run(self) -> Result<(), Box<dyn Error + Send + Sync>> {
        match (self.args.enable_tls, self.args.tls_cert_path.clone(), self.args.tls_key_path.clone()) {
            (true, Some(cert_path), Some(key_path)) => {
                self.start_https_server(cert_path, key_path).await
            }
            (true, _, _) => {
                error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
                Err("TLS enabled without cert/key".into())
            }
            (false, _, _) => self.start_http_server().await,
        }
    }

    async fn start_http_server(self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let listener = tokio::net::TcpListener::bind(&self.addr).await.map_err(|e| {
            error!("Failed to bind HTTP server to {}: {}. Try a different port.", self.addr, e);
            e
        })?;
        info!("HTTP server listening on: http://{}", listener.local_addr()?);

        axum::serve(listener, self.app.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        info!("HTTP server stopped");
        Ok(())
    }

    async fn start_https_server(
        self,
        cert_path: String,
        key_path: String
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = self.addr.parse::<SocketAddr>()?;
        info!("TLS enabled. Loading certificate from '{}' and key from '{}'", cert_path, key_path);
        let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
            cert_path,
            key_path
        ).await?;

        let handle = axum_server::Handle::new();
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            shutdown_handle.graceful_shutdown(None);
        });

        info!("HTTPS server listening on: https://{}", addr);
        axum_server::bind_rustls(addr, tls_config)
            .handle(handle)
            .serve(self.app.into_make_service())
            .await?;
        info!("HTTPS server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
