//! Admission pipeline of the pod DNS webhook: decode the Pod embedded in an
//! AdmissionRequest, ensure its DNS resolver options, re-encode it and answer
//! with the JSON patch describing the change.

pub use json_patch;
pub use k8s_openapi;

pub mod admission_request;
pub mod admission_response;
pub mod context;
pub mod decoder;
pub mod dns_policy;
pub mod encoder;
pub mod errors;
pub mod handler;
pub mod patch;

pub use context::RequestContext;
pub use decoder::{Decoder, DecoderConfig};
pub use handler::PodMutator;
