use axum::{
    extract::{self, FromRequest, FromRequestParts},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use dns_mutator::{
    admission_request::AdmissionRequest, admission_response::AdmissionResponse, RequestContext,
};
use serde::Deserialize;
use std::{sync::Arc, time::Instant};
use tracing::{debug, error, warn, Span};

use crate::{
    api::{
        admission_review::{AdmissionReviewRequest, AdmissionReviewResponse},
        api_error::ApiError,
        state::ApiServerState,
        timeout::parse_timeout,
    },
    metrics::{MutationEvaluation, MutationMetrics},
};

// create an extractor that internally uses `axum::Json` but has a custom rejection
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub(crate) struct JsonExtractor<T>(T);

// same as above, for the query string
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub(crate) struct QueryExtractor<T>(T);

#[derive(Deserialize)]
pub(crate) struct MutateParams {
    /// Go duration string set by the API server, e.g. `10s`
    timeout: Option<String>,
}

#[tracing::instrument(
    name = "mutation",
    fields(
        request_uid=tracing::field::Empty,
        host=crate::config::HOSTNAME.as_str(),
        name=tracing::field::Empty,
        namespace=tracing::field::Empty,
        operation=tracing::field::Empty,
        kind_group=tracing::field::Empty,
        kind_version=tracing::field::Empty,
        kind=tracing::field::Empty,
        allowed=tracing::field::Empty,
        mutated=tracing::field::Empty,
        response_code=tracing::field::Empty,
        response_message=tracing::field::Empty,
    ),
    skip_all)]
/// Ensure the DNS options of the Pod carried by the AdmissionReview.
pub(crate) async fn mutate_pod_handler(
    extract::State(state): extract::State<Arc<ApiServerState>>,
    QueryExtractor(params): QueryExtractor<MutateParams>,
    JsonExtractor(admission_review): JsonExtractor<AdmissionReviewRequest>,
) -> Result<Json<AdmissionReviewResponse>, ApiError> {
    let start_time = Instant::now();
    debug!(admission_request = ?admission_review.request, "received admission review");

    populate_span_with_admission_request_data(&admission_review.request);

    let ctx = match params.timeout.as_deref() {
        Some(timeout) => {
            let timeout = parse_timeout(timeout).map_err(|e| {
                warn!(error = %e, "invalid timeout query parameter");
                ApiError::bad_request(format!("invalid timeout: {e}"))
            })?;
            start_time
                .checked_add(timeout)
                .map(RequestContext::with_deadline)
                .unwrap_or_default()
        }
        None => RequestContext::new(),
    };

    let response = state.mutator.handle(&ctx, &admission_review.request);

    record_metrics(
        &state.metrics,
        &admission_review.request,
        &response,
        start_time,
    );
    populate_span_with_mutation_results(&response);

    Ok(Json(AdmissionReviewResponse::answering(
        &admission_review,
        response,
    )))
}

pub(crate) async fn readiness_handler() -> StatusCode {
    StatusCode::OK
}

pub(crate) async fn metrics_handler(
    extract::State(metrics): extract::State<Arc<MutationMetrics>>,
) -> Result<impl IntoResponse, ApiError> {
    let body = metrics.encode_text().map_err(|e| {
        error!("metrics error: {}", e);
        ApiError::internal_server_error()
    })?;

    Ok((
        [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
        body,
    ))
}

fn record_metrics(
    metrics: &MutationMetrics,
    request: &AdmissionRequest,
    response: &AdmissionResponse,
    start_time: Instant,
) {
    let evaluation = MutationEvaluation {
        operation: request.operation.to_string(),
        allowed: response.allowed,
        mutated: response.patch.is_some(),
        error_code: response.status.as_ref().and_then(|status| status.code),
    };
    metrics.record(&evaluation, start_time.elapsed());
}

fn populate_span_with_admission_request_data(adm_req: &AdmissionRequest) {
    Span::current().record("kind", adm_req.kind.kind.as_str());
    Span::current().record("kind_group", adm_req.kind.group.as_str());
    Span::current().record("kind_version", adm_req.kind.version.as_str());
    Span::current().record("name", adm_req.name.clone().unwrap_or_default().as_str());
    Span::current().record(
        "namespace",
        adm_req.namespace.clone().unwrap_or_default().as_str(),
    );
    Span::current().record("operation", adm_req.operation.as_str());
    Span::current().record("request_uid", adm_req.uid.as_str());
}

fn populate_span_with_mutation_results(response: &AdmissionResponse) {
    Span::current().record("allowed", response.allowed);
    Span::current().record("mutated", response.patch.is_some());
    if let Some(status) = &response.status {
        if let Some(code) = &status.code {
            Span::current().record("response_code", code);
        }
        if let Some(message) = &status.message {
            Span::current().record("response_message", message.as_str());
        }
    }
}
