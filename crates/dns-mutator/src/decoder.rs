use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::admission_request::{AdmissionRequest, GroupVersionKind};
use crate::errors::DecodeError;

/// Settings shared by every decode operation. Built once at startup and
/// never changed afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecoderConfig {
    /// The only kind of object the decoder accepts.
    pub expected_kind: GroupVersionKind,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        DecoderConfig {
            expected_kind: GroupVersionKind::new("", "v1", "Pod"),
        }
    }
}

/// Turns the object embedded inside of an AdmissionRequest into a typed value.
#[derive(Clone, Debug, Default)]
pub struct Decoder {
    config: DecoderConfig,
}

impl Decoder {
    pub fn new(config: DecoderConfig) -> Self {
        Decoder { config }
    }

    pub fn decode<T: DeserializeOwned>(&self, request: &AdmissionRequest) -> Result<T, DecodeError> {
        let raw = self.raw_object(request)?;
        self.decode_raw(raw)
    }

    /// Return the object sent by the API server, after checking the request
    /// is about the expected kind.
    pub fn raw_object<'a>(&self, request: &'a AdmissionRequest) -> Result<&'a Value, DecodeError> {
        if request.kind != self.config.expected_kind {
            return Err(DecodeError::UnexpectedKind {
                expected: self.config.expected_kind.clone(),
                actual: request.kind.clone(),
            });
        }

        match &request.object {
            Some(raw) if !raw.0.is_null() => Ok(&raw.0),
            _ => Err(DecodeError::NoContent),
        }
    }

    /// Deserialize `raw` into `T`. Type fields missing from the document
    /// default to the expected kind, present ones must match it.
    pub fn decode_raw<T: DeserializeOwned>(&self, raw: &Value) -> Result<T, DecodeError> {
        let document = raw.as_object().ok_or(DecodeError::NotAnObject)?;

        let expected = &self.config.expected_kind;
        let expected_api_version = expected.api_version();
        let api_version = document.get("apiVersion").and_then(Value::as_str);
        let kind = document.get("kind").and_then(Value::as_str);

        if api_version.is_some_and(|v| v != expected_api_version)
            || kind.is_some_and(|k| k != expected.kind)
        {
            let api_version = api_version.unwrap_or(&expected_api_version);
            let (group, version) = api_version.split_once('/').unwrap_or(("", api_version));
            return Err(DecodeError::UnexpectedKind {
                expected: expected.clone(),
                actual: GroupVersionKind::new(group, version, kind.unwrap_or(&expected.kind)),
            });
        }

        let malformed = |source| DecodeError::Malformed {
            kind: expected.kind.clone(),
            source,
        };

        if document.contains_key("apiVersion") && document.contains_key("kind") {
            return T::deserialize(raw).map_err(malformed);
        }

        let mut defaulted = document.clone();
        defaulted
            .entry("apiVersion")
            .or_insert_with(|| Value::String(expected_api_version.clone()));
        defaulted
            .entry("kind")
            .or_insert_with(|| Value::String(expected.kind.clone()));

        T::deserialize(Value::Object(defaulted)).map_err(malformed)
    }
}
