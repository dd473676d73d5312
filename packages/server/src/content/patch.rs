use serde_json::Value;

use super::items::Item;
use crate::error::AppError;

/// Apply a JSON merge patch (RFC 7386) to `target` in place.
///
/// Objects merge recursively, `null` removes a key, anything else replaces.
fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch_map) = patch else {
        *target = patch.clone();
        return;
    };

    if !target.is_object() {
        *target = Value::Object(Default::default());
    }
    let Value::Object(target_map) = target else {
        return;
    };

    for (key, value) in patch_map {
        if value.is_null() {
            target_map.remove(key);
        } else {
            merge_patch(target_map.entry(key.clone()).or_insert(Value::Null), value);
        }
    }
}

/// Merge `patch` into a copy of `item`.
///
/// The item keeps its id whatever the patch says. The result is decoded
/// into the typed record but not validated.
pub fn apply_patch<T: Item>(item: &T, patch: &Value) -> Result<T, AppError> {
    if !patch.is_object() {
        return Err(AppError::Validation(
            "Update body must be a JSON object".into(),
        ));
    }
    let mut doc = serde_json::to_value(item)
        .map_err(|e| AppError::Internal(format!("Failed to encode {}: {e}", T::KIND)))?;
    merge_patch(&mut doc, patch);

    let mut updated: T = serde_json::from_value(doc)
        .map_err(|e| AppError::Validation(format!("Invalid {} update: {e}", T::KIND)))?;
    updated.set_id(item.id());
    Ok(updated)
}
