use serde_json::Value;

use crate::schema::Record;

/// Parse generated text as a record. Anything but a JSON object is `None`.
pub fn parse_record(text: &str) -> Option<Record> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Object(record)) => Some(record),
        _ => None,
    }
}

/// Parse generated text as any JSON value.
pub fn parse_value(text: &str) -> Option<Value> {
    serde_json::from_str(text.trim()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_record() {
        let record = parse_record(r#" {"försäkring": "Folksam", "tandvård": true} "#).unwrap();
        assert_eq!(record["försäkring"], "Folksam");
        assert_eq!(record["tandvård"], true);
    }

    #[test]
    fn test_malformed_record() {
        assert!(parse_record("försäkring: Folksam, tandvård: ja").is_none());
        assert!(parse_record(r#"{"tandvård": true"#).is_none());
        assert!(parse_record("").is_none());
    }

    #[test]
    fn test_non_object_is_not_a_record() {
        assert!(parse_record("[1, 2]").is_none());
        assert!(parse_record("\"text\"").is_none());
        assert!(parse_record("null").is_none());
    }

    #[test]
    fn test_parse_value_accepts_any_json() {
        assert_eq!(parse_value("[1, 2]"), Some(json!([1, 2])));
        assert_eq!(parse_value("\"Ja\""), Some(json!("Ja")));
        assert!(parse_value("Ja, Folksam ersätter tandvård.").is_none());
    }
}
