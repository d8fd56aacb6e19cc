//! Case conversion for the API: admin UI sends camelCase keys, columns are snake_case.

use serde_json::{Map, Value};

/// "image_url" -> "imageUrl"
pub fn to_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut capitalize_next = false;
    for c in s.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            out.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// "eventDate" -> "event_date"; snake_case input is returned unchanged.
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Convert all keys of a JSON object from snake_case to camelCase (in place).
pub fn object_keys_to_camel_case(obj: &mut Map<String, Value>) {
    let keys: Vec<String> = obj.keys().cloned().collect();
    for k in keys {
        let camel = to_camel_case(&k);
        if camel != k {
            if let Some(v) = obj.remove(&k) {
                obj.insert(camel, v);
            }
        }
    }
}

/// Apply camelCase conversion to a row. Non-objects are left alone.
pub fn value_keys_to_camel_case(value: &mut Value) {
    if let Value::Object(ref mut map) = value {
        object_keys_to_camel_case(map);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_identifiers() {
        assert_eq!(to_camel_case("image_url"), "imageUrl");
        assert_eq!(to_snake_case("eventDate"), "event_date");
        assert_eq!(to_snake_case("event_date"), "event_date");
        assert_eq!(to_camel_case("title"), "title");
    }

    #[test]
    fn converts_row_keys() {
        let mut row = json!({ "id": 1, "image_url": "u", "created_at": "t" });
        value_keys_to_camel_case(&mut row);
        assert_eq!(row, json!({ "id": 1, "imageUrl": "u", "createdAt": "t" }));
    }
}
