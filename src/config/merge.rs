//! Layer merging
//!
//! - Objects: merged key by key, recursively
//! - Arrays and scalars: the overlay replaces the base

use serde_json::Value;

/// Merge `overlay` into `base` in place.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        base_map.insert(key, overlay_value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Merge layers in order; the last layer has the highest precedence.
pub fn merge_layers(layers: Vec<Value>) -> Value {
    let mut merged = Value::Null;
    for layer in layers {
        deep_merge(&mut merged, layer);
    }
    merged
}
