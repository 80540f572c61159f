use axum::Router;
use pod_admission_webhook::{
    config::{Config, TlsConfig},
    PodAdmissionWebhook,
};
use std::net::SocketAddr;
use tempfile::tempdir;

pub(crate) fn default_test_config() -> Config {
    // The routers are exercised without binding any socket, the certificate
    // files only need a plausible location.
    let cert_dir = tempdir().unwrap();

    Config {
        addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
        metrics_addr: Some(SocketAddr::from(([127, 0, 0, 1], 8080))),
        tls_config: TlsConfig::from_cert_dir(cert_dir.path(), "tls.crt", "tls.key"),
        log_level: "info".to_owned(),
        log_fmt: "json".to_owned(),
        log_no_color: false,
    }
}

pub(crate) fn webhook(config: Config) -> PodAdmissionWebhook {
    PodAdmissionWebhook::new_from_config(config).unwrap()
}

pub(crate) fn app(config: Config) -> Router {
    webhook(config).router()
}
