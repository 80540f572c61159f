use dns_mutator::admission_request::AdmissionRequest;
use dns_mutator::admission_response::AdmissionResponse;
use serde::{Deserialize, Serialize};

pub const ADMISSION_REVIEW_KIND: &str = "AdmissionReview";
pub const ADMISSION_V1: &str = "admission.k8s.io/v1";

/// The envelope posted by the API server to the webhook.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    pub request: AdmissionRequest,
}

/// The envelope returned to the API server. It must carry the same
/// `apiVersion` as the review it answers.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    pub response: AdmissionResponse,
}

impl AdmissionReviewResponse {
    pub fn new(response: AdmissionResponse) -> Self {
        AdmissionReviewResponse {
            api_version: Some(String::from(ADMISSION_V1)),
            kind: Some(String::from(ADMISSION_REVIEW_KIND)),
            response,
        }
    }

    /// Answer `review`, echoing its `apiVersion` (`admission.k8s.io/v1` when
    /// the request did not state one).
    pub fn answering(review: &AdmissionReviewRequest, response: AdmissionResponse) -> Self {
        AdmissionReviewResponse {
            api_version: review
                .api_version
                .clone()
                .or_else(|| Some(String::from(ADMISSION_V1))),
            ..AdmissionReviewResponse::new(response)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn review(api_version: Option<&str>) -> AdmissionReviewRequest {
        serde_json::from_value(json!({
            "apiVersion": api_version,
            "kind": "AdmissionReview",
            "request": {
                "uid": "uid",
                "kind": {"group": "", "version": "v1", "kind": "Pod"},
                "resource": {"group": "", "version": "v1", "resource": "pods"},
                "operation": "CREATE",
                "object": {"apiVersion": "v1", "kind": "Pod"}
            }
        }))
        .expect("deserialization should work")
    }

    #[test]
    fn response_echoes_request_api_version() {
        let review = review(Some("admission.k8s.io/v1beta1"));

        let response =
            AdmissionReviewResponse::answering(&review, AdmissionResponse::allow("uid".into()));

        assert_eq!(
            response.api_version.as_deref(),
            Some("admission.k8s.io/v1beta1")
        );
        assert_eq!(response.kind.as_deref(), Some(ADMISSION_REVIEW_KIND));
    }

    #[test]
    fn response_defaults_to_v1() {
        let review = review(None);

        let response =
            AdmissionReviewResponse::answering(&review, AdmissionResponse::allow("uid".into()));

        assert_eq!(response.api_version.as_deref(), Some(ADMISSION_V1));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "apiVersion": "admission.k8s.io/v1",
                "kind": "AdmissionReview",
                "response": {"uid": "uid", "allowed": true}
            })
        );
    }
}
