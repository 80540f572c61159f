use std::time::Duration;

use anyhow::{anyhow, Result};
use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};

const MUTATION_LATENCY_BUCKETS: &[f64] = &[0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1];

/// The outcome of one admission request, as seen by the metrics.
pub struct MutationEvaluation {
    pub(crate) operation: String,
    pub(crate) allowed: bool,
    pub(crate) mutated: bool,
    pub(crate) error_code: Option<u16>,
}

impl MutationEvaluation {
    fn labels(&self) -> [String; 4] {
        [
            self.operation.clone(),
            self.allowed.to_string(),
            self.mutated.to_string(),
            self.error_code
                .map(|code| code.to_string())
                .unwrap_or_default(),
        ]
    }
}

/// Metrics exposed on the metrics endpoint.
pub struct MutationMetrics {
    registry: Registry,
    mutations_total: CounterVec,
    mutation_latency: HistogramVec,
}

impl MutationMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let label_names = ["operation", "allowed", "mutated", "error_code"];

        let mutations_total = CounterVec::new(
            Opts::new(
                "pod_admission_webhook_mutations_total",
                "Admission requests processed by the pod mutator",
            ),
            &label_names,
        )?;
        registry.register(Box::new(mutations_total.clone()))?;

        let mutation_latency = HistogramVec::new(
            HistogramOpts::new(
                "pod_admission_webhook_mutation_latency_seconds",
                "Time spent processing an admission request",
            )
            .buckets(MUTATION_LATENCY_BUCKETS.to_vec()),
            &label_names,
        )?;
        registry.register(Box::new(mutation_latency.clone()))?;

        Ok(Self {
            registry,
            mutations_total,
            mutation_latency,
        })
    }

    pub fn record(&self, evaluation: &MutationEvaluation, latency: Duration) {
        let labels = evaluation.labels();
        let labels: Vec<&str> = labels.iter().map(String::as_str).collect();

        self.mutations_total.with_label_values(&labels).inc();
        self.mutation_latency
            .with_label_values(&labels)
            .observe(latency.as_secs_f64());
    }

    /// Render all the metrics using the Prometheus text format.
    pub fn encode_text(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| anyhow!("cannot encode metrics: {e}"))?;

        String::from_utf8(buffer).map_err(|e| anyhow!("metrics are not valid UTF-8: {e}"))
    }
}
