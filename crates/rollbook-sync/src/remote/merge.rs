use serde_json::Value;

/// Field-level merge of `patch` into `target`.
///
/// Objects merge key by key, recursively. Any other patch value, arrays
/// included, replaces the target value outright.
pub fn merge_fields(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (field, value) in patch {
                merge_fields(target.entry(field.clone()).or_insert(Value::Null), value);
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}
