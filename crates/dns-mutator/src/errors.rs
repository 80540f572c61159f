use thiserror::Error;

use crate::admission_request::GroupVersionKind;

/// The embedded object could not be turned into the expected type.
/// This is always the caller's fault.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("there is no content to decode")]
    NoContent,

    #[error("unable to decode {actual} into {expected}")]
    UnexpectedKind {
        expected: GroupVersionKind,
        actual: GroupVersionKind,
    },

    #[error("object is not a JSON map")]
    NotAnObject,

    #[error("cannot decode {kind} object: {source}")]
    Malformed {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DecodeError {
    pub fn status_code(&self) -> u16 {
        400
    }
}

/// Serialization failure after the object has been mutated.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("cannot encode mutated object: {0}")]
    Object(#[source] serde_json::Error),

    #[error("cannot encode JSON patch: {0}")]
    Patch(#[source] serde_json::Error),
}

impl EncodeError {
    pub fn status_code(&self) -> u16 {
        500
    }
}

#[derive(Error, Debug)]
pub enum MutationError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

impl MutationError {
    pub fn status_code(&self) -> u16 {
        match self {
            MutationError::Decode(e) => e.status_code(),
            MutationError::Encode(e) => e.status_code(),
        }
    }
}

/// Raised when reading back the patch stored inside of an AdmissionResponse.
#[derive(Error, Debug)]
pub enum ResponseError {
    #[error("patch is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("patch is not a valid JSON patch document: {0}")]
    Deserialize(#[from] serde_json::Error),
}
