use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::{EncodeError, ResponseError};

/// This models the admission/v1/AdmissionResponse object of Kubernetes
/// See https://pkg.go.dev/k8s.io/api/admission/v1#AdmissionResponse
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResponse {
    /// UID is an identifier for the individual request/response.
    /// This must be copied over from the corresponding AdmissionRequest.
    pub uid: String,

    /// Allowed indicates whether or not the admission request was permitted.
    pub allowed: bool,

    /// The type of Patch. Currently we only allow "JSONPatch".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch_type: Option<PatchType>,

    /// The patch body, base64 encoded. Currently we only support "JSONPatch"
    /// which implements RFC 6902.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,

    /// Status contains extra details into why an admission request was denied.
    /// This field IS NOT consulted in any way if "Allowed" is "true".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AdmissionResponseStatus>,

    /// AuditAnnotations is an unstructured key value map set by remote admission controller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_annotations: Option<HashMap<String, String>>,

    /// warnings is a list of warning messages to return to the requesting API client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
}

/// PatchType is the type of patch being used to represent the mutated object
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
pub enum PatchType {
    #[serde(rename = "JSONPatch")]
    #[default]
    JSONPatch,
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
pub struct AdmissionResponseStatus {
    /// A human-readable description of the status of this operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// A machine-readable description of why this operation is in the
    /// "Failure" status. A Reason clarifies an HTTP status code but does
    /// not override it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<StatusReason>,

    /// Suggested HTTP return code for this status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
}

/// StatusReason is an enumeration of possible failure causes.
/// Each StatusReason must map to a single HTTP status code, but multiple reasons may map to the same
/// HTTP status code.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub enum StatusReason {
    /// The server has declined to indicate a specific reason.
    #[serde(rename = "")]
    Unknown,

    /// The request itself was invalid.
    /// Status code 400.
    BadRequest,

    /// An internal error occurred.
    /// Status code 500.
    InternalError,

    /// The request could not be completed within the given time.
    /// Status code 504.
    Timeout,
}

impl StatusReason {
    pub fn from_code(code: u16) -> StatusReason {
        match code {
            400 => StatusReason::BadRequest,
            500 => StatusReason::InternalError,
            504 => StatusReason::Timeout,
            _ => StatusReason::Unknown,
        }
    }
}

impl AdmissionResponse {
    /// Accept the request without changing it.
    pub fn allow(uid: String) -> AdmissionResponse {
        AdmissionResponse {
            uid,
            allowed: true,
            ..Default::default()
        }
    }

    pub fn reject(uid: String, message: String, code: u16) -> AdmissionResponse {
        AdmissionResponse {
            uid,
            allowed: false,
            status: Some(AdmissionResponseStatus {
                message: Some(message),
                reason: Some(StatusReason::from_code(code)),
                code: Some(code),
            }),
            ..Default::default()
        }
    }

    /// Accept the request, attaching the given patch. An empty patch
    /// produces a plain "allowed" response without patch fields.
    pub fn from_patch(uid: String, patch: &json_patch::Patch) -> Result<AdmissionResponse, EncodeError> {
        if patch.0.is_empty() {
            return Ok(AdmissionResponse::allow(uid));
        }

        let patch = serde_json::to_string(patch)
            .map(|s| general_purpose::STANDARD.encode(s))
            .map_err(EncodeError::Patch)?;

        Ok(AdmissionResponse {
            uid,
            allowed: true,
            patch_type: Some(PatchType::JSONPatch),
            patch: Some(patch),
            ..Default::default()
        })
    }

    /// The patch operations carried by this response. Responses without a
    /// patch yield an empty operation list.
    pub fn patch_operations(&self) -> Result<json_patch::Patch, ResponseError> {
        match &self.patch {
            None => Ok(json_patch::Patch(Vec::new())),
            Some(encoded) => {
                let raw = general_purpose::STANDARD.decode(encoded)?;
                Ok(serde_json::from_slice(&raw)?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(400, StatusReason::BadRequest)]
    #[case(500, StatusReason::InternalError)]
    #[case(504, StatusReason::Timeout)]
    #[case(418, StatusReason::Unknown)]
    fn create_reject_response(#[case] code: u16, #[case] reason: StatusReason) {
        let uid = String::from("UID");
        let message = String::from("test message");

        let response = AdmissionResponse::reject(uid.clone(), message.clone(), code);
        assert_eq!(response.uid, uid);
        assert!(!response.allowed);
        assert_eq!(response.patch, None);
        assert_eq!(response.patch_type, None);

        let status = response.status.unwrap();
        assert_eq!(status.code, Some(code));
        assert_eq!(status.message, Some(message));
        assert_eq!(status.reason, Some(reason));
    }

    #[test]
    fn create_from_empty_patch() {
        let response =
            AdmissionResponse::from_patch(String::from("UID"), &json_patch::Patch(Vec::new()))
                .unwrap();

        assert!(response.allowed);
        assert!(response.status.is_none());
        assert!(response.patch.is_none());
        assert!(response.patch_type.is_none());
        assert!(response.patch_operations().unwrap().0.is_empty());
    }

    #[test]
    fn create_from_patch() {
        let req_obj = json!({"hello": "world"});
        let mutated_obj = json!({
            "hello": "world",
            "ciao": "mondo",
        });
        let expected_diff = json_patch::diff(&req_obj, &mutated_obj);

        let response =
            AdmissionResponse::from_patch(String::from("UID"), &expected_diff).unwrap();

        assert!(response.allowed);
        assert_eq!(response.patch_type, Some(PatchType::JSONPatch));
        assert_eq!(response.patch_operations().unwrap(), expected_diff);
    }

    #[test]
    fn serialized_response_uses_wire_names() {
        let patch = json_patch::diff(&json!({}), &json!({"a": 1}));
        let response = AdmissionResponse::from_patch(String::from("UID"), &patch).unwrap();

        let serialized = serde_json::to_value(&response).unwrap();
        assert_eq!(serialized["patchType"], json!("JSONPatch"));
        assert!(serialized["patch"].is_string());
        assert!(serialized.get("status").is_none());
        assert!(serialized.get("warnings").is_none());
    }

    #[test]
    fn invalid_patch_payload_is_reported() {
        let response = AdmissionResponse {
            patch: Some(String::from("not base64!")),
            ..AdmissionResponse::allow(String::from("UID"))
        };

        assert!(matches!(
            response.patch_operations(),
            Err(ResponseError::Base64(_))
        ));
    }
}
