use serde::Serialize;
use serde_json::Value;

use crate::errors::EncodeError;

/// Serialize a mutated object with the same JSON schema the decoder reads.
pub fn encode<T: Serialize>(object: &T) -> Result<Value, EncodeError> {
    serde_json::to_value(object).map_err(EncodeError::Object)
}
