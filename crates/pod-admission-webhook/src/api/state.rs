use dns_mutator::PodMutator;
use std::sync::Arc;

use crate::metrics::MutationMetrics;

pub(crate) struct ApiServerState {
    pub(crate) mutator: PodMutator,
    pub(crate) metrics: Arc<MutationMetrics>,
}
