pub mod api;
mod certs;
pub mod cli;
pub mod config;
pub mod metrics;
pub mod tracing;

use ::tracing::{error, info};
use anyhow::{anyhow, Result};
use axum::{
    routing::{get, post},
    Router,
};
use axum_server::Handle;
use dns_mutator::{Decoder, DecoderConfig, PodMutator};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tower_http::trace::{self, TraceLayer};

use crate::{
    api::{
        handlers::{metrics_handler, mutate_pod_handler, readiness_handler},
        state::ApiServerState,
    },
    config::{Config, TlsConfig},
    metrics::MutationMetrics,
};

/// Path the mutating webhook is registered against.
pub const MUTATE_POD_PATH: &str = "/mutate-pod";

const GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

pub struct PodAdmissionWebhook {
    router: Router,
    metrics_router: Router,
    addr: SocketAddr,
    metrics_addr: Option<SocketAddr>,
    tls_config: TlsConfig,
}

impl PodAdmissionWebhook {
    pub fn new_from_config(config: Config) -> Result<Self> {
        // The decoder configuration is built once and shared, read-only,
        // by all the requests.
        let decoder = Decoder::new(DecoderConfig::default());
        let mutator = PodMutator::new(decoder);
        let metrics = Arc::new(MutationMetrics::new()?);

        let state = Arc::new(ApiServerState {
            mutator,
            metrics: metrics.clone(),
        });

        let router = Router::new()
            .route(MUTATE_POD_PATH, post(mutate_pod_handler))
            .route("/readiness", get(readiness_handler))
            .with_state(state)
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(trace::DefaultMakeSpan::new().level(::tracing::Level::INFO))
                    .on_response(trace::DefaultOnResponse::new().level(::tracing::Level::INFO)),
            );

        let metrics_router = Router::new()
            .route("/metrics", get(metrics_handler))
            .with_state(metrics);

        Ok(Self {
            router,
            metrics_router,
            addr: config.addr,
            metrics_addr: config.metrics_addr,
            tls_config: config.tls_config,
        })
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn metrics_router(&self) -> Router {
        self.metrics_router.clone()
    }

    /// Serve the webhook over HTTPS, and the metrics over HTTP when enabled,
    /// until SIGINT or SIGTERM is received.
    pub async fn run(self) -> Result<()> {
        let rustls_config =
            certs::create_tls_config_and_watch_certificate_changes(self.tls_config).await?;

        let webhook_handle = Handle::new();
        let metrics_handle = Handle::new();
        tokio::spawn(shutdown_signal(vec![
            webhook_handle.clone(),
            metrics_handle.clone(),
        ]));

        let webhook_server = axum_server::bind_rustls(self.addr, rustls_config)
            .handle(webhook_handle)
            .serve(self.router.into_make_service());
        info!(address = self.addr.to_string().as_str(), "started HTTPS server");

        match self.metrics_addr {
            Some(metrics_addr) => {
                let metrics_server = axum_server::bind(metrics_addr)
                    .handle(metrics_handle)
                    .serve(self.metrics_router.into_make_service());
                info!(
                    address = metrics_addr.to_string().as_str(),
                    "started metrics server"
                );

                tokio::try_join!(webhook_server, metrics_server)
                    .map_err(|e| anyhow!("server error: {e}"))?;
            }
            None => {
                info!("metrics server disabled");
                webhook_server
                    .await
                    .map_err(|e| anyhow!("server error: {e}"))?;
            }
        }

        info!("servers stopped");
        Ok(())
    }
}

async fn shutdown_signal(handles: Vec<Handle>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("cannot listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received, stopping servers");
    for handle in handles {
        handle.graceful_shutdown(Some(GRACEFUL_SHUTDOWN_TIMEOUT));
    }
}
