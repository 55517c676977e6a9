use std::fmt;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a fresh record id.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// An ISO-8601 timestamp as it is stored in the document.
///
/// The stored text is kept verbatim: older backups may carry strings this
/// version cannot parse, and those must survive a load/save cycle untouched.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(date: DateTime<Utc>) -> Self {
        Self(date.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn parse(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.0)
            .map(|d| d.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(&self.0, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|d| d.and_utc())
            })
    }

    /// Calendar day of the timestamp, if it can be parsed.
    pub fn day(&self) -> Option<NaiveDate> {
        self.parse().map(|d| d.date_naive())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Fertilizer,
    Transplant,
    Pruning,
    Planting,
    PestControl,
    Bloom,
    Other,
}

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::Fertilizer,
        EventKind::Transplant,
        EventKind::Pruning,
        EventKind::Planting,
        EventKind::PestControl,
        EventKind::Bloom,
        EventKind::Other,
    ];

    pub fn code(self) -> &'static str {
        match self {
            EventKind::Fertilizer => "FERTILIZER",
            EventKind::Transplant => "TRANSPLANT",
            EventKind::Pruning => "PRUNING",
            EventKind::Planting => "PLANTING",
            EventKind::PestControl => "PEST_CONTROL",
            EventKind::Bloom => "BLOOM",
            EventKind::Other => "OTHER",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.code() == code)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhotoKind {
    PruningBefore,
    PruningAfter,
    General,
    Bloom,
}

impl PhotoKind {
    pub const ALL: [PhotoKind; 4] = [
        PhotoKind::PruningBefore,
        PhotoKind::PruningAfter,
        PhotoKind::General,
        PhotoKind::Bloom,
    ];

    pub fn code(self) -> &'static str {
        match self {
            PhotoKind::PruningBefore => "PRUNING_BEFORE",
            PhotoKind::PruningAfter => "PRUNING_AFTER",
            PhotoKind::General => "GENERAL",
            PhotoKind::Bloom => "BLOOM",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.code() == code)
    }

    pub fn is_pruning(self) -> bool {
        matches!(self, PhotoKind::PruningBefore | PhotoKind::PruningAfter)
    }
}

/// A dated care action.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub date: Timestamp,
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: String,
    /// Inline data URI.
    pub url: String,
    pub date: Timestamp,
    #[serde(rename = "type")]
    pub kind: PhotoKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A journal entry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub date: Timestamp,
    pub content: String,
}

/// One tracked rose cultivar and everything recorded about it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Variety {
    pub id: String,
    pub breeder: String,
    pub name: String,
    pub registration_date: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planting_date: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transplant_date: Option<Timestamp>,
    pub events: Vec<Event>,
    pub photos: Vec<Photo>,
    pub notes: Vec<Note>,
    pub memo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rose_type: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,
}

impl Variety {
    /// A freshly registered variety with no history.
    pub fn new(breeder: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            breeder: breeder.into(),
            name: name.into(),
            registration_date: Timestamp::now(),
            planting_date: None,
            transplant_date: None,
            events: vec![],
            photos: vec![],
            notes: vec![],
            memo: String::new(),
            rose_type: None,
            feature: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_uses_millisecond_zulu_format() {
        let date = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(
            Timestamp::from_datetime(date).as_str(),
            "2024-03-09T07:05:01.000Z"
        );
    }

    #[test]
    fn timestamp_day_accepts_plain_dates_and_rejects_garbage() {
        assert_eq!(
            Timestamp::from_raw("2023-11-02").day(),
            NaiveDate::from_ymd_opt(2023, 11, 2)
        );
        assert_eq!(
            Timestamp::from_raw("2023-11-02T23:30:00+09:00").day(),
            NaiveDate::from_ymd_opt(2023, 11, 2)
        );
        assert_eq!(Timestamp::from_raw("last spring").day(), None);
    }

    #[test]
    fn variety_without_rose_type_serializes_without_the_field() {
        let variety = Variety::new("Meilland", "Bolero");
        let json = serde_json::to_value(&variety).unwrap();
        let object = json.as_object().unwrap();
        assert!(!object.contains_key("roseType"));
        assert!(!object.contains_key("feature"));
        assert_eq!(object["events"], serde_json::json!([]));
        assert_eq!(object["memo"], "");
        assert!(object.contains_key("registrationDate"));
    }

    #[test]
    fn event_wire_names_match_document_format() {
        let event = Event {
            id: "e1".into(),
            kind: EventKind::PestControl,
            date: Timestamp::from_raw("2024-05-01T00:00:00.000Z"),
            details: "Aphids".into(),
            sub_type: Some("PEST".into()),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "PEST_CONTROL");
        assert_eq!(json["subType"], "PEST");
        for kind in EventKind::ALL {
            assert_eq!(serde_json::to_value(kind).unwrap(), kind.code());
            assert_eq!(EventKind::from_code(kind.code()), Some(kind));
        }
        for kind in PhotoKind::ALL {
            assert_eq!(serde_json::to_value(kind).unwrap(), kind.code());
        }
    }
}
