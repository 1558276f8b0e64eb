//! Deterministic truncation of oversized list payloads.
//!
//! A top-level list longer than the limit is wrapped as
//! `{items, total_count, returned_count, truncated, truncation_note}`. An
//! object has each over-long top-level list shortened in place and gains a
//! `_truncation_info` entry with `<field>_truncated`, `<field>_total_count`
//! and `<field>_returned_count` keys. Everything else passes through
//! unchanged, and bounding a bounded value again is a no-op.

use gateway_primitives::{TruncatedField, TruncationReport};
use serde_json::{Map, Value, json};
use tracing::info;

/// Default list length limit.
pub const DEFAULT_MAX_ITEMS: usize = 100;

/// Metadata key added to truncated objects.
pub const TRUNCATION_INFO_FIELD: &str = "_truncation_info";

const FIELD_NOTE: &str = "Some list fields were limited to prevent huge responses";

/// Bounds `value` to `max_items` list elements and reports what was cut.
#[must_use]
pub fn bound(value: Value, max_items: usize) -> (Value, TruncationReport) {
    let mut report = TruncationReport::default();
    let bounded = match value {
        Value::Array(items) if items.len() > max_items => {
            let total_count = items.len();
            info!(total_count, max_items, "truncating list response");
            report.fields.push(TruncatedField {
                field: None,
                total_count,
                returned_count: max_items,
            });
            json!({
                "items": items.into_iter().take(max_items).collect::<Vec<_>>(),
                "total_count": total_count,
                "returned_count": max_items,
                "truncated": true,
                "truncation_note": format!("Response limited to {max_items} items out of {total_count} total items"),
            })
        }
        Value::Object(map) => Value::Object(bound_fields(map, max_items, &mut report)),
        other => other,
    };
    (bounded, report)
}

fn bound_fields(mut map: Map<String, Value>, max_items: usize, report: &mut TruncationReport) -> Map<String, Value> {
    let mut info = Map::new();
    for (field, value) in &mut map {
        if field == TRUNCATION_INFO_FIELD {
            continue;
        }
        let Value::Array(items) = value else { continue };
        if items.len() <= max_items {
            continue;
        }
        let total_count = items.len();
        info!(field = %field, total_count, max_items, "truncating list field");
        items.truncate(max_items);
        info.insert(format!("{field}_truncated"), Value::Bool(true));
        info.insert(format!("{field}_total_count"), json!(total_count));
        info.insert(format!("{field}_returned_count"), json!(max_items));
        report.fields.push(TruncatedField {
            field: Some(field.clone()),
            total_count,
            returned_count: max_items,
        });
    }

    if !info.is_empty() {
        info.insert("truncation_note".to_owned(), Value::String(FIELD_NOTE.to_owned()));
        match map.get_mut(TRUNCATION_INFO_FIELD) {
            Some(Value::Object(existing)) => existing.extend(info),
            _ => {
                map.insert(TRUNCATION_INFO_FIELD.to_owned(), Value::Object(info));
            }
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(n: usize) -> Value {
        Value::Array((0..n).map(|i| json!(i)).collect())
    }

    #[test]
    fn list_at_limit_is_untouched() {
        let value = numbers(3);
        let (bounded, report) = bound(value.clone(), 3);
        assert_eq!(bounded, value);
        assert!(report.is_empty());
    }

    #[test]
    fn list_over_limit_is_wrapped() {
        let (bounded, report) = bound(numbers(4), 3);
        assert_eq!(bounded["items"], json!([0, 1, 2]));
        assert_eq!(bounded["total_count"], json!(4));
        assert_eq!(bounded["returned_count"], json!(3));
        assert_eq!(bounded["truncated"], json!(true));
        assert_eq!(
            report.fields,
            vec![TruncatedField { field: None, total_count: 4, returned_count: 3 }]
        );
    }

    #[test]
    fn object_fields_are_truncated_in_place() {
        let value = json!({"payments": numbers(5), "tags": numbers(2), "total": 5});
        let (bounded, report) = bound(value, 2);
        assert_eq!(bounded["payments"], json!([0, 1]));
        assert_eq!(bounded["tags"], json!([0, 1]));
        assert_eq!(bounded["total"], json!(5));

        let info = &bounded[TRUNCATION_INFO_FIELD];
        assert_eq!(info["payments_truncated"], json!(true));
        assert_eq!(info["payments_total_count"], json!(5));
        assert_eq!(info["payments_returned_count"], json!(2));
        assert!(info.get("tags_truncated").is_none());
        assert_eq!(report.fields.len(), 1);
        assert_eq!(report.fields[0].field.as_deref(), Some("payments"));
    }

    #[test]
    fn bounding_is_idempotent() {
        for value in [numbers(10), json!({"items": numbers(10), "data": numbers(1)})] {
            let (once, _) = bound(value, 4);
            let (twice, report) = bound(once.clone(), 4);
            assert_eq!(once, twice);
            assert!(report.is_empty());
        }
    }

    #[test]
    fn scalars_pass_through() {
        for value in [json!("text"), json!(1), Value::Null, json!({"nested": {"list": numbers(9)}})] {
            let (bounded, report) = bound(value.clone(), 2);
            assert_eq!(bounded, value);
            assert!(report.is_empty());
        }
    }

    #[test]
    fn existing_info_is_merged() {
        let value = json!({"a": numbers(3), TRUNCATION_INFO_FIELD: {"upstream": true}});
        let (bounded, _) = bound(value, 1);
        let info = &bounded[TRUNCATION_INFO_FIELD];
        assert_eq!(info["upstream"], json!(true));
        assert_eq!(info["a_total_count"], json!(3));
    }
}
