//! Migration of stored or imported JSON into well-formed varieties.
//!
//! Everything decoded from disk or from a backup file enters the crate as
//! [`UntrustedJson`] and only becomes a [`Variety`] by passing through here.
//! Nothing in this module fails: a malformed field falls back to its default,
//! a malformed document falls back to an empty collection.
//!
//! The rules only ever grow. A fallback for a field that was once written
//! must never be removed, or old backups stop loading.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::models::{new_id, Event, EventKind, Note, Photo, PhotoKind, Timestamp, Variety};

pub const DEFAULT_BREEDER: &str = "Unknown";
pub const DEFAULT_NAME: &str = "Unknown Rose";

/// Decoded JSON of unknown shape.
#[derive(Debug, Clone, PartialEq)]
pub struct UntrustedJson(Value);

impl UntrustedJson {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text).map(Self)
    }

    pub fn is_array(&self) -> bool {
        self.0.is_array()
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}

/// Turns a stored document into varieties. A top-level value that is not an
/// array yields an empty collection.
pub fn sanitize_document(input: UntrustedJson) -> Vec<Variety> {
    match input.0 {
        Value::Array(records) => records.iter().map(sanitize_variety).collect(),
        other => {
            warn!(kind = json_kind(&other), "stored document is not an array, starting empty");
            vec![]
        }
    }
}

/// The lighter pass applied to imported backups: a missing or empty `id` is
/// replaced and the child collections are forced to arrays, then the record
/// goes through the regular field coercion.
pub fn sanitize_import(input: UntrustedJson) -> Vec<Variety> {
    let Value::Array(records) = input.0 else {
        return vec![];
    };
    records
        .into_iter()
        .map(|record| {
            let mut object = match record {
                Value::Object(object) => object,
                _ => Map::new(),
            };
            if !is_truthy(object.get("id")) {
                object.insert("id".into(), Value::String(new_id()));
            }
            for key in ["events", "photos", "notes"] {
                if !object.get(key).is_some_and(Value::is_array) {
                    object.insert(key.into(), Value::Array(vec![]));
                }
            }
            sanitize_variety(&Value::Object(object))
        })
        .collect()
}

/// Coerces one record. Non-object records behave like `{}`.
pub fn sanitize_variety(record: &Value) -> Variety {
    let empty = Map::new();
    let object = record.as_object().unwrap_or(&empty);

    let id = string_field(object, "id").unwrap_or_else(|| {
        debug!("variety without a string id, generating one");
        new_id()
    });

    Variety {
        id,
        breeder: string_field(object, "breeder").unwrap_or_else(|| DEFAULT_BREEDER.to_string()),
        name: string_field(object, "name").unwrap_or_else(|| DEFAULT_NAME.to_string()),
        registration_date: timestamp_field(object, "registrationDate")
            .unwrap_or_else(Timestamp::now),
        planting_date: timestamp_field(object, "plantingDate"),
        transplant_date: timestamp_field(object, "transplantDate"),
        events: children(object, "events", sanitize_event),
        photos: children(object, "photos", sanitize_photo),
        notes: children(object, "notes", sanitize_note),
        memo: string_field(object, "memo").unwrap_or_default(),
        rose_type: object.get("roseType").and_then(integral_number),
        feature: string_field(object, "feature"),
    }
}

fn sanitize_event(object: &Map<String, Value>) -> Event {
    Event {
        id: string_field(object, "id").unwrap_or_else(new_id),
        kind: object
            .get("type")
            .and_then(Value::as_str)
            .and_then(EventKind::from_code)
            .unwrap_or(EventKind::Other),
        date: timestamp_field(object, "date").unwrap_or_else(Timestamp::now),
        details: string_field(object, "details").unwrap_or_default(),
        sub_type: string_field(object, "subType"),
    }
}

fn sanitize_photo(object: &Map<String, Value>) -> Photo {
    Photo {
        id: string_field(object, "id").unwrap_or_else(new_id),
        url: string_field(object, "url").unwrap_or_default(),
        date: timestamp_field(object, "date").unwrap_or_else(Timestamp::now),
        kind: object
            .get("type")
            .and_then(Value::as_str)
            .and_then(PhotoKind::from_code)
            .unwrap_or(PhotoKind::General),
        note: string_field(object, "note"),
    }
}

fn sanitize_note(object: &Map<String, Value>) -> Note {
    Note {
        id: string_field(object, "id").unwrap_or_else(new_id),
        date: timestamp_field(object, "date").unwrap_or_else(Timestamp::now),
        content: string_field(object, "content").unwrap_or_default(),
    }
}

/// Non-object entries are holes and are dropped.
fn children<T>(
    object: &Map<String, Value>,
    key: &str,
    sanitize: impl Fn(&Map<String, Value>) -> T,
) -> Vec<T> {
    match object.get(key) {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_object).map(sanitize).collect(),
        _ => vec![],
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_owned)
}

fn timestamp_field(object: &Map<String, Value>, key: &str) -> Option<Timestamp> {
    object.get(key).and_then(Value::as_str).map(Timestamp::from_raw)
}

// Resistance tiers are whole numbers; `2.0` is accepted, `2.5` is not.
fn integral_number(value: &Value) -> Option<i64> {
    let Value::Number(number) = value else {
        return None;
    };
    if let Some(n) = number.as_i64() {
        return Some(n);
    }
    let f = number.as_f64()?;
    (f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(_) => true,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn untrusted(value: Value) -> UntrustedJson {
        UntrustedJson::new(value)
    }

    fn assert_well_formed(variety: &Variety) {
        let json = serde_json::to_value(variety).unwrap();
        for key in ["events", "photos", "notes"] {
            assert!(json[key].is_array(), "{key} must be an array");
        }
        assert!(json["memo"].is_string());
        assert!(json["registrationDate"].is_string());
    }

    #[test]
    fn non_array_documents_become_empty() {
        for value in [json!({}), json!(null), json!("roses"), json!(3), json!(true)] {
            assert!(sanitize_document(untrusted(value)).is_empty());
        }
    }

    #[test]
    fn every_field_falls_back_independently() {
        let varieties = sanitize_document(untrusted(json!([{
            "id": 12,
            "breeder": null,
            "name": ["x"],
            "registrationDate": 0,
            "events": "none",
            "photos": {},
            "notes": null,
            "memo": 5,
            "roseType": "1",
            "feature": false,
            "plantingDate": 20240101,
            "transplantDate": {}
        }])));
        assert_eq!(varieties.len(), 1);
        let v = &varieties[0];
        assert!(uuid::Uuid::parse_str(&v.id).is_ok());
        assert_eq!(v.breeder, DEFAULT_BREEDER);
        assert_eq!(v.name, DEFAULT_NAME);
        assert!(v.registration_date.parse().is_some());
        assert!(v.events.is_empty() && v.photos.is_empty() && v.notes.is_empty());
        assert_eq!(v.memo, "");
        assert_eq!(v.rose_type, None);
        assert_eq!(v.feature, None);
        assert_eq!(v.planting_date, None);
        assert_eq!(v.transplant_date, None);
        assert_well_formed(v);
    }

    #[test]
    fn well_formed_records_pass_through() {
        let record = json!({
            "id": "r1",
            "breeder": "Delbard",
            "name": "Nahema",
            "registrationDate": "2023-04-01T10:00:00.000Z",
            "plantingDate": "2023-04-02T00:00:00.000Z",
            "events": [{"id": "e1", "type": "FERTILIZER", "date": "2023-05-01T00:00:00.000Z", "details": "Solid", "subType": "SOLID"}],
            "photos": [{"id": "p1", "url": "data:image/jpeg;base64,AA==", "date": "2023-05-02T00:00:00.000Z", "type": "BLOOM"}],
            "notes": [{"id": "n1", "date": "2023-05-03T00:00:00.000Z", "content": "first bud"}],
            "memo": "climber",
            "roseType": 2,
            "feature": "Soft pink"
        });
        let v = sanitize_variety(&record);
        assert_eq!(serde_json::to_value(&v).unwrap(), record);
    }

    #[test]
    fn children_are_coerced_and_holes_dropped() {
        let v = sanitize_variety(&json!({
            "events": [null, 3, {"type": "REPOTTING", "details": 9}, {"id": "e2", "type": "PRUNING", "date": "2024-01-01"}],
            "photos": [{"url": "data:,", "type": "SELFIE", "note": 1}],
            "notes": [[], {"content": "hi"}]
        }));
        assert_eq!(v.events.len(), 2);
        assert_eq!(v.events[0].kind, EventKind::Other);
        assert_eq!(v.events[0].details, "");
        assert_eq!(v.events[1].id, "e2");
        assert_eq!(v.events[1].kind, EventKind::Pruning);
        assert_eq!(v.photos[0].kind, PhotoKind::General);
        assert_eq!(v.photos[0].note, None);
        assert_eq!(v.notes.len(), 1);
        assert_eq!(v.notes[0].content, "hi");
    }

    #[test]
    fn rose_type_accepts_whole_numbers_only() {
        assert_eq!(sanitize_variety(&json!({"roseType": 0})).rose_type, Some(0));
        assert_eq!(sanitize_variety(&json!({"roseType": 3.0})).rose_type, Some(3));
        assert_eq!(sanitize_variety(&json!({"roseType": 2.5})).rose_type, None);
    }

    #[test]
    fn sanitizing_is_idempotent_and_survives_a_round_trip() {
        let inputs = [
            json!([{}, {"name": "A"}, 7, {"events": [{}], "photos": [{}], "notes": [{}]}]),
            json!([{"id": "x", "roseType": 1.0, "plantingDate": "garbage"}]),
            json!([]),
        ];
        for input in inputs {
            let once = sanitize_document(untrusted(input));
            let text = serde_json::to_string(&once).unwrap();
            let twice = sanitize_document(UntrustedJson::parse(&text).unwrap());
            assert_eq!(once, twice);
            let value = serde_json::to_value(&twice).unwrap();
            assert_eq!(sanitize_document(untrusted(value)), once);
        }
    }

    #[test]
    fn import_generates_ids_and_arrays() {
        let varieties = sanitize_import(untrusted(json!([{"breeder": "X"}])));
        assert_eq!(varieties.len(), 1);
        let v = &varieties[0];
        assert!(uuid::Uuid::parse_str(&v.id).is_ok());
        assert_eq!(v.breeder, "X");
        assert!(v.events.is_empty() && v.photos.is_empty() && v.notes.is_empty());
    }

    #[test]
    fn import_replaces_empty_ids_but_keeps_real_ones() {
        let varieties = sanitize_import(untrusted(json!([{"id": ""}, {"id": "keep"}])));
        assert!(!varieties[0].id.is_empty());
        assert_eq!(varieties[1].id, "keep");

        // the boot-time pass keeps any string, even an empty one
        let stored = sanitize_document(untrusted(json!([{"id": ""}])));
        assert_eq!(stored[0].id, "");
    }
}
