//! Canonical JSON rendering for hash input.
//!
//! `serde_json`'s default formatting is already compact, but object key
//! order depends on how the value was built. Hash input cannot depend on
//! insertion order (the same metadata payload must hash identically no
//! matter which producer assembled it), so objects are rendered with keys
//! sorted bytewise, recursively.
//!
//! Numbers and strings are rendered exactly as `serde_json` renders them,
//! keeping escaping and number formatting identical to the rest of the
//! ecosystem.

use std::collections::BTreeMap;

use serde_json::Value;

/// Render `value` as canonical JSON: compact, with object keys sorted
/// bytewise at every nesting level.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        // Number and String delegate to serde_json so formatting and string
        // escaping stay byte-identical with ordinary serialization.
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => {
            out.push_str(&Value::String(s.clone()).to_string());
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let sorted: BTreeMap<&String, &Value> = map.iter().collect();
            out.push('{');
            for (i, (key, item)) in sorted.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_value(out, item);
            }
            out.push('}');
        }
    }
}
