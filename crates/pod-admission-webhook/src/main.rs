use anyhow::{anyhow, Result};
use pod_admission_webhook::{cli, config::Config, tracing::setup_tracing, PodAdmissionWebhook};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli::build_cli().get_matches();
    let config = Config::from_args(&matches)?;

    // rustls needs a process-wide crypto provider, axum-server enables more than one
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("cannot install the rustls crypto provider"))?;

    let tracer_provider = setup_tracing(&config.log_level, &config.log_fmt, config.log_no_color)?;

    info!("setting up webhook server");
    let webhook = PodAdmissionWebhook::new_from_config(config)?;

    info!("starting webhook server");
    let result = webhook.run().await;
    if let Err(e) = &result {
        error!(error = %e, "problem running webhook server");
    }

    if let Some(provider) = tracer_provider {
        if let Err(e) = provider.shutdown() {
            eprintln!("cannot shut down the OpenTelemetry tracer provider: {e}");
        }
    }

    result
}
