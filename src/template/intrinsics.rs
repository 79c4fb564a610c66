//! Intrinsic function helpers
//!
//! Constructors for the handful of intrinsics the synthesizer emits, plus a
//! walker that collects every logical id a value points at.

use serde_json::{json, Map, Value};

use crate::domain::output::placeholders;

pub fn reference(logical_id: &str) -> Value {
    json!({ "Ref": logical_id })
}

pub fn get_att(logical_id: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [logical_id, attribute] })
}

pub fn sub(expression: &str) -> Value {
    json!({ "Fn::Sub": expression })
}

/// One element renders as a scalar, several as a list
pub fn one_or_many(mut values: Vec<Value>) -> Value {
    if values.len() == 1 {
        values.remove(0)
    } else {
        Value::Array(values)
    }
}

/// Logical ids referenced anywhere inside `value`.
///
/// Pseudo parameters (`AWS::Region` and friends) are not resources and are
/// skipped.
pub fn referenced_ids(value: &Value) -> Vec<String> {
    let mut ids = Vec::new();
    collect(value, &mut ids);
    ids
}

fn collect(value: &Value, ids: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if collect_intrinsic(map, ids) {
                return;
            }
            for nested in map.values() {
                collect(nested, ids);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect(item, ids);
            }
        }
        _ => {}
    }
}

// Returns true when `map` is a single-key intrinsic that was fully handled.
fn collect_intrinsic(map: &Map<String, Value>, ids: &mut Vec<String>) -> bool {
    if map.len() != 1 {
        return false;
    }

    if let Some(Value::String(target)) = map.get("Ref") {
        if !target.contains("::") {
            ids.push(target.clone());
        }
        return true;
    }

    if let Some(args) = map.get("Fn::GetAtt") {
        match args {
            Value::Array(parts) => {
                if let Some(Value::String(target)) = parts.first() {
                    ids.push(target.clone());
                }
            }
            Value::String(dotted) => {
                if let Some(target) = dotted.split('.').next() {
                    ids.push(target.to_string());
                }
            }
            _ => {}
        }
        return true;
    }

    if let Some(args) = map.get("Fn::Sub") {
        match args {
            Value::String(expression) => ids.extend(placeholders(expression)),
            Value::Array(parts) => {
                let variables = parts.get(1).and_then(Value::as_object);
                if let Some(Value::String(expression)) = parts.first() {
                    ids.extend(
                        placeholders(expression)
                            .into_iter()
                            .filter(|name| variables.map_or(true, |v| !v.contains_key(name))),
                    );
                }
                if let Some(variables) = variables {
                    for nested in variables.values() {
                        collect(nested, ids);
                    }
                }
            }
            _ => {}
        }
        return true;
    }

    false
}
