use serde_json::Value;

use crate::schema::Record;

/// One step of the aggregation fold.
///
/// The first non-empty record seeds the accumulator. Later records merge
/// field by field: two booleans combine with OR, a field seen for the first
/// time is added, and any other existing value stays as first observed,
/// `null` included. The one exception is a boolean arriving on an existing
/// `null`, which takes the boolean. Empty records leave the accumulator
/// untouched.
pub fn merge(acc: Option<Record>, next: Record) -> Option<Record> {
    if next.is_empty() {
        return acc;
    }

    let Some(mut aggregated) = acc else {
        return Some(next);
    };

    for (key, incoming) in next {
        match aggregated.get_mut(&key) {
            Some(Value::Bool(current)) => {
                if let Value::Bool(flag) = incoming {
                    *current = *current || flag;
                }
            }
            Some(current) if current.is_null() && incoming.is_boolean() => *current = incoming,
            Some(_) => {}
            None => {
                aggregated.insert(key, incoming);
            }
        }
    }

    Some(aggregated)
}

/// Fold per-chunk records, in chunk order, into one document record.
///
/// Returns an empty record when every input is empty.
pub fn aggregate<I>(records: I) -> Record
where
    I: IntoIterator<Item = Record>,
{
    records.into_iter().fold(None, merge).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(values: Vec<Value>) -> Vec<Record> {
        values
            .into_iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_boolean_or() {
        let merged = aggregate(records(vec![json!({"a": true}), json!({"a": false})]));
        assert_eq!(merged, record(json!({"a": true})));

        let merged = aggregate(records(vec![json!({"a": false}), json!({"a": false})]));
        assert_eq!(merged, record(json!({"a": false})));

        let merged = aggregate(records(vec![json!({"a": false}), json!({"a": true})]));
        assert_eq!(merged, record(json!({"a": true})));
    }

    #[test]
    fn test_first_seen_wins_for_non_boolean() {
        let merged = aggregate(records(vec![
            json!({"name": "Folksam"}),
            json!({"name": "Trygg-Hansa"}),
        ]));
        assert_eq!(merged, record(json!({"name": "Folksam"})));
    }

    #[test]
    fn test_empty_records_are_skipped() {
        let merged = aggregate(records(vec![json!({"a": true}), json!({}), json!({"a": false})]));
        assert_eq!(merged, record(json!({"a": true})));
    }

    #[test]
    fn test_empty_first_chunk_seeds_from_next() {
        let merged = aggregate(records(vec![
            json!({}),
            json!({"name": "Folksam", "a": false}),
            json!({"name": "Trygg-Hansa", "a": true}),
        ]));
        assert_eq!(merged, record(json!({"name": "Folksam", "a": true})));
    }

    #[test]
    fn test_all_empty_is_empty() {
        assert!(aggregate(records(vec![json!({}), json!({})])).is_empty());
        assert!(aggregate(Vec::<Record>::new()).is_empty());
    }

    #[test]
    fn test_new_fields_from_later_chunks_are_added() {
        let merged = aggregate(records(vec![
            json!({"försäkring": "Folksam", "tandvård": true}),
            json!({"tandvård": false, "sjukhusvård": true}),
        ]));
        assert_eq!(
            merged,
            record(json!({"försäkring": "Folksam", "tandvård": true, "sjukhusvård": true}))
        );
        let keys: Vec<&str> = merged.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["försäkring", "tandvård", "sjukhusvård"]);
    }

    #[test]
    fn test_boolean_does_not_replace_metadata() {
        let merged = aggregate(records(vec![json!({"karenstid": "3 månader"}), json!({"karenstid": true})]));
        assert_eq!(merged, record(json!({"karenstid": "3 månader"})));
    }

    #[test]
    fn test_null_is_kept_against_later_metadata() {
        let merged = aggregate(records(vec![
            json!({"försäkring": null}),
            json!({"försäkring": "Trygg-Hansa"}),
        ]));
        assert_eq!(merged, record(json!({"försäkring": null})));
    }

    #[test]
    fn test_boolean_fills_null() {
        let merged = aggregate(records(vec![
            json!({"försäkring": null, "usa": null}),
            json!({"försäkring": "Folksam", "usa": false}),
            json!({"försäkring": "If", "usa": true}),
        ]));
        assert_eq!(merged, record(json!({"försäkring": null, "usa": true})));
    }

    #[test]
    fn test_non_boolean_never_replaces_existing() {
        let merged = aggregate(records(vec![
            json!({"a": false, "b": "x", "c": 5, "d": ["självrisk"]}),
            json!({"a": "ja", "b": 5, "c": null, "d": {"belopp": 1000}}),
            json!({"a": null, "b": "y", "c": "fem", "d": "ingen"}),
        ]));
        assert_eq!(
            merged,
            record(json!({"a": false, "b": "x", "c": 5, "d": ["självrisk"]}))
        );
    }

    #[test]
    fn test_merge_step() {
        assert_eq!(merge(None, Record::new()), None);
        let seeded = merge(None, record(json!({"a": false}))).unwrap();
        assert_eq!(seeded, record(json!({"a": false})));
        let next = merge(Some(seeded), record(json!({"a": true}))).unwrap();
        assert_eq!(next, record(json!({"a": true})));
    }
}
