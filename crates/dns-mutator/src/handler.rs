use k8s_openapi::api::core::v1::Pod;
use tracing::{debug, error, warn};

use crate::{
    admission_request::AdmissionRequest,
    admission_response::AdmissionResponse,
    context::RequestContext,
    decoder::Decoder,
    dns_policy, encoder,
    errors::MutationError,
    patch,
};

/// Handles the admission requests of Pods, making sure they carry the
/// canonical DNS resolver options.
///
/// The mutator holds no per-request state and can be shared by any number
/// of concurrent requests.
#[derive(Clone, Debug)]
pub struct PodMutator {
    decoder: Decoder,
}

impl PodMutator {
    pub fn new(decoder: Decoder) -> Self {
        PodMutator { decoder }
    }

    /// Process a single admission request.
    ///
    /// This never fails: decoding problems are reported with a 400 response,
    /// encoding problems with a 500 one and an already expired request with
    /// a 504 one.
    pub fn handle(&self, ctx: &RequestContext, request: &AdmissionRequest) -> AdmissionResponse {
        let uid = request.uid.clone();

        if ctx.is_expired() {
            warn!(uid = uid.as_str(), "request deadline exceeded before mutation started");
            return AdmissionResponse::reject(
                uid,
                String::from("request deadline exceeded"),
                504,
            );
        }

        let patch = match self.mutate(request) {
            Ok(patch) => patch,
            Err(e) => {
                error!(uid = uid.as_str(), error = %e, "cannot mutate pod");
                return AdmissionResponse::reject(uid, e.to_string(), e.status_code());
            }
        };

        debug!(
            uid = uid.as_str(),
            operations = patch.0.len(),
            "pod mutation patch computed"
        );

        AdmissionResponse::from_patch(uid.clone(), &patch).unwrap_or_else(|e| {
            error!(uid = uid.as_str(), error = %e, "cannot build admission response");
            AdmissionResponse::reject(uid, e.to_string(), e.status_code())
        })
    }

    /// Decode, mutate and re-encode the Pod, returning the patch that
    /// describes the change. The request itself is never modified.
    pub fn mutate(&self, request: &AdmissionRequest) -> Result<json_patch::Patch, MutationError> {
        let original = self.decoder.raw_object(request)?;
        let mut pod: Pod = self.decoder.decode_raw(original)?;

        // The decode/encode round trip is lossy (e.g. `creationTimestamp: null`
        // is dropped), an untouched Pod must not be diffed.
        if !dns_policy::ensure_dns_options(&mut pod) {
            debug!(uid = request.uid.as_str(), "pod already defines dns options");
            return Ok(json_patch::Patch(Vec::new()));
        }

        let mutated = encoder::encode(&pod)?;

        Ok(patch::create_patch(original, &mutated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{admission_response::PatchType, decoder::DecoderConfig};
    use rstest::rstest;
    use serde_json::{Value, json};
    use std::time::Duration;

    fn mutator() -> PodMutator {
        PodMutator::new(Decoder::new(DecoderConfig::default()))
    }

    fn pod_with_spec(spec: Value) -> Value {
        json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {"name": "nginx", "namespace": "default"},
            "spec": spec,
        })
    }

    fn admission_request(object: Option<Value>, operation: &str) -> AdmissionRequest {
        serde_json::from_value(json!({
            "uid": "705ab4f5-6393-11e8-b7cc-42010a800002",
            "kind": {"group": "", "version": "v1", "kind": "Pod"},
            "resource": {"group": "", "version": "v1", "resource": "pods"},
            "name": "nginx",
            "namespace": "default",
            "operation": operation,
            "userInfo": {"username": "admin"},
            "object": object,
        }))
        .expect("deserialization should work")
    }

    fn apply(response: &AdmissionResponse, original: &Value) -> Value {
        let patch = response.patch_operations().expect("valid patch");
        let mut patched = original.clone();
        json_patch::patch(&mut patched, &patch.0).expect("patch should apply");
        patched
    }

    fn canonical_options() -> Value {
        json!([
            {"name": "ndots", "value": "2"},
            {"name": "timeout", "value": "1"},
            {"name": "single-request-reopen"}
        ])
    }

    #[test]
    fn pod_without_dns_config_gets_the_canonical_options() {
        let object = pod_with_spec(json!({"containers": [{"name": "nginx", "image": "nginx"}]}));
        let request = admission_request(Some(object.clone()), "CREATE");

        let response = mutator().handle(&RequestContext::new(), &request);

        assert_eq!(response.uid, request.uid);
        assert!(response.allowed);
        assert!(response.status.is_none());
        assert_eq!(response.patch_type, Some(PatchType::JSONPatch));
        assert_eq!(
            serde_json::to_value(response.patch_operations().unwrap()).unwrap(),
            json!([{
                "op": "add",
                "path": "/spec/dnsConfig",
                "value": {"options": canonical_options()}
            }])
        );
        assert_eq!(
            apply(&response, &object)["spec"]["dnsConfig"]["options"],
            canonical_options()
        );
    }

    #[rstest]
    #[case::empty_options(json!({"options": []}))]
    #[case::no_options(json!({"nameservers": ["10.0.0.10"]}))]
    fn pod_with_empty_dns_options(#[case] dns_config: Value) {
        let object = pod_with_spec(json!({
            "containers": [{"name": "nginx"}],
            "dnsConfig": dns_config.clone(),
        }));
        let request = admission_request(Some(object.clone()), "CREATE");

        let response = mutator().handle(&RequestContext::new(), &request);

        assert!(response.allowed);
        let patched = apply(&response, &object);
        assert_eq!(patched["spec"]["dnsConfig"]["options"], canonical_options());
        assert_eq!(
            patched["spec"]["dnsConfig"].get("nameservers"),
            dns_config.get("nameservers")
        );
    }

    #[test]
    fn pod_with_dns_options_is_not_patched() {
        let object = pod_with_spec(json!({
            "containers": [{"name": "nginx"}],
            "dnsConfig": {"options": [{"name": "custom"}]},
        }));
        let request = admission_request(Some(object), "CREATE");

        let response = mutator().handle(&RequestContext::new(), &request);

        assert!(response.allowed);
        assert!(response.status.is_none());
        assert!(response.patch.is_none());
        assert!(response.patch_type.is_none());
        assert!(response.patch_operations().unwrap().0.is_empty());
    }

    #[test]
    fn pod_with_dns_options_sent_by_the_api_server_is_not_patched() {
        // null and empty fields do not survive a decode/encode round trip
        let object = json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {
                "name": "nginx",
                "namespace": "default",
                "creationTimestamp": null
            },
            "spec": {
                "containers": [{"name": "nginx", "image": "nginx", "resources": {}}],
                "dnsConfig": {"options": [{"name": "custom"}]}
            },
            "status": {}
        });
        let request = admission_request(Some(object), "CREATE");

        let response = mutator().handle(&RequestContext::new(), &request);

        assert!(response.allowed);
        assert!(response.patch.is_none());
        assert!(response.patch_type.is_none());
        assert!(mutator().mutate(&request).unwrap().0.is_empty());
    }

    #[test]
    fn pod_without_type_fields_is_mutated() {
        let object = json!({
            "metadata": {"name": "nginx", "namespace": "default"},
            "spec": {"containers": [{"name": "nginx"}]}
        });
        let request = admission_request(Some(object.clone()), "CREATE");

        let response = mutator().handle(&RequestContext::new(), &request);

        assert!(response.allowed);
        assert!(response.status.is_none());
        assert_eq!(
            apply(&response, &object)["spec"]["dnsConfig"]["options"],
            canonical_options()
        );
    }

    #[test]
    fn patch_matches_direct_encoding_of_the_mutated_pod() {
        let object = pod_with_spec(json!({
            "containers": [{"name": "nginx", "image": "nginx", "ports": [{"containerPort": 80}]}],
            "restartPolicy": "Always",
        }));
        let request = admission_request(Some(object.clone()), "CREATE");

        let response = mutator().handle(&RequestContext::new(), &request);

        let mut pod: Pod = serde_json::from_value(object.clone()).unwrap();
        dns_policy::ensure_dns_options(&mut pod);
        assert_eq!(apply(&response, &object), encoder::encode(&pod).unwrap());
    }

    #[test]
    fn request_is_left_untouched() {
        let object = pod_with_spec(json!({"containers": [{"name": "nginx"}]}));
        let request = admission_request(Some(object.clone()), "CREATE");

        mutator().handle(&RequestContext::new(), &request);

        assert_eq!(request.object.map(|o| o.0), Some(object));
    }

    #[rstest]
    #[case::malformed_object(Some(json!({"apiVersion": "v1", "kind": "Pod", "spec": "nope"})), "CREATE")]
    #[case::not_a_pod(Some(json!({"apiVersion": "v1", "kind": "ConfigMap"})), "CREATE")]
    #[case::delete_without_object(None, "DELETE")]
    fn undecodable_requests_are_rejected(#[case] object: Option<Value>, #[case] operation: &str) {
        let request = admission_request(object, operation);

        let response = mutator().handle(&RequestContext::new(), &request);

        assert!(!response.allowed);
        assert!(response.patch.is_none());
        assert!(response.patch_type.is_none());
        let status = response.status.expect("status should be set");
        assert_eq!(status.code, Some(400));
        assert!(status.message.is_some());
    }

    #[test]
    fn expired_request_is_rejected() {
        let object = pod_with_spec(json!({"containers": [{"name": "nginx"}]}));
        let request = admission_request(Some(object), "CREATE");

        let response = mutator().handle(&RequestContext::with_timeout(Duration::ZERO), &request);

        assert!(!response.allowed);
        assert!(response.patch.is_none());
        assert_eq!(response.status.unwrap().code, Some(504));
    }

    #[test]
    fn mutation_is_deterministic() {
        let object = pod_with_spec(json!({"containers": [{"name": "nginx"}]}));
        let request = admission_request(Some(object), "CREATE");
        let mutator = mutator();

        let first = mutator.handle(&RequestContext::new(), &request);
        let second = mutator.handle(&RequestContext::new(), &request);

        assert_eq!(first, second);
    }
}
