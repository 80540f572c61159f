use serde_json::Value;

/// Compute the JSON patch (RFC 6902) that turns `original` into `mutated`.
/// Identical documents produce an empty patch.
pub fn create_patch(original: &Value, mutated: &Value) -> json_patch::Patch {
    json_patch::diff(original, mutated)
}
