//! Pure edits of a single variety.
//!
//! Every function takes the current variety and returns the next one; the
//! caller hands the result to [`RecordStore::update`](crate::store::RecordStore::update).
//! The `id` of the variety never changes.

use std::marker::PhantomData;

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};

use crate::catalog::{self, Choice, Issue, LibraryEntry};
use crate::confirm::Intent;
use crate::error::{Error, Result};
use crate::models::{new_id, Event, EventKind, Note, Photo, PhotoKind, Timestamp, Variety};

pub const DEFAULT_PRUNING_DETAILS: &str = "Pruning Session";

/// Events, photos and notes: the dated records hanging off a variety.
pub trait Child: Clone {
    const KIND: &'static str;
    const DELETE_PROMPT: &'static str;

    fn id(&self) -> &str;
    fn date(&self) -> &Timestamp;
    fn list(variety: &Variety) -> &Vec<Self>;
    fn list_mut(variety: &mut Variety) -> &mut Vec<Self>;
}

impl Child for Event {
    const KIND: &'static str = "event";
    const DELETE_PROMPT: &'static str = "Delete this event?";

    fn id(&self) -> &str {
        &self.id
    }
    fn date(&self) -> &Timestamp {
        &self.date
    }
    fn list(variety: &Variety) -> &Vec<Self> {
        &variety.events
    }
    fn list_mut(variety: &mut Variety) -> &mut Vec<Self> {
        &mut variety.events
    }
}

impl Child for Photo {
    const KIND: &'static str = "photo";
    const DELETE_PROMPT: &'static str = "Delete this photo?";

    fn id(&self) -> &str {
        &self.id
    }
    fn date(&self) -> &Timestamp {
        &self.date
    }
    fn list(variety: &Variety) -> &Vec<Self> {
        &variety.photos
    }
    fn list_mut(variety: &mut Variety) -> &mut Vec<Self> {
        &mut variety.photos
    }
}

impl Child for Note {
    const KIND: &'static str = "note";
    const DELETE_PROMPT: &'static str = "Delete this note?";

    fn id(&self) -> &str {
        &self.id
    }
    fn date(&self) -> &Timestamp {
        &self.date
    }
    fn list(variety: &Variety) -> &Vec<Self> {
        &variety.notes
    }
    fn list_mut(variety: &mut Variety) -> &mut Vec<Self> {
        &mut variety.notes
    }
}

/// A requested, not yet confirmed, removal of one child record.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildRemoval<C> {
    id: String,
    _kind: PhantomData<C>,
}

impl<C> ChildRemoval<C> {
    pub fn id(&self) -> &str {
        &self.id
    }
}

pub fn find_child<'a, C: Child>(variety: &'a Variety, id: &str) -> Result<&'a C> {
    C::list(variety)
        .iter()
        .find(|c| c.id() == id)
        .ok_or_else(|| Error::ChildNotFound { kind: C::KIND, id: id.to_string() })
}

/// Prepends a child record.
pub fn append<C: Child>(variety: &Variety, child: C) -> Variety {
    let mut next = variety.clone();
    C::list_mut(&mut next).insert(0, child);
    next
}

/// Replaces the child record with the same id, keeping its position.
pub fn replace<C: Child>(variety: &Variety, child: C) -> Result<Variety> {
    let mut next = variety.clone();
    let slot = C::list_mut(&mut next)
        .iter_mut()
        .find(|c| c.id() == child.id())
        .ok_or_else(|| Error::ChildNotFound { kind: C::KIND, id: child.id().to_string() })?;
    *slot = child;
    Ok(next)
}

pub fn request_remove<C: Child>(variety: &Variety, id: &str) -> Result<Intent<ChildRemoval<C>>> {
    let child = find_child::<C>(variety, id)?;
    Ok(Intent::new(
        C::DELETE_PROMPT,
        ChildRemoval { id: child.id().to_string(), _kind: PhantomData },
    ))
}

pub fn remove<C: Child>(variety: &Variety, removal: ChildRemoval<C>) -> Result<Variety> {
    find_child::<C>(variety, &removal.id)?;
    let mut next = variety.clone();
    C::list_mut(&mut next).retain(|c| c.id() != removal.id);
    Ok(next)
}

/// Display order: newest first. Unparseable dates sort last. The stored
/// order is left alone.
pub fn newest_first<C: Child>(items: &[C]) -> Vec<&C> {
    let mut sorted: Vec<&C> = items.iter().collect();
    sorted.sort_by_key(|c| std::cmp::Reverse(c.date().parse()));
    sorted
}

/// The timestamp stored for a record made on `day`: the current time of day
/// when `day` is today, midnight otherwise.
pub fn timestamp_for_day(day: NaiveDate, now: DateTime<Utc>) -> Timestamp {
    let time = if day == now.date_naive() {
        NaiveTime::from_hms_opt(now.hour(), now.minute(), now.second()).unwrap_or(NaiveTime::MIN)
    } else {
        NaiveTime::MIN
    };
    Timestamp::from_datetime(day.and_time(time).and_utc())
}

/// Moves a timestamp to another day, keeping its time of day.
pub fn move_to_day(original: &Timestamp, day: NaiveDate) -> Timestamp {
    let time = original
        .parse()
        .map(|d| NaiveTime::from_hms_opt(d.hour(), d.minute(), d.second()).unwrap_or(NaiveTime::MIN))
        .unwrap_or(NaiveTime::MIN);
    Timestamp::from_datetime(day.and_time(time).and_utc())
}

/// A brand-new variety. Known names pick up their catalog defaults.
pub fn register(breeder: &str, name: &str) -> Result<Variety> {
    if breeder.trim().is_empty() {
        return Err(Error::BlankField("breeder"));
    }
    if name.trim().is_empty() {
        return Err(Error::BlankField("name"));
    }
    let mut variety = Variety::new(breeder, name);
    catalog::apply_library_defaults(&mut variety);
    Ok(variety)
}

/// Renames a variety. When the new name is in the rose library, the returned
/// intent offers to also take over its resistance tier and description.
pub fn edit_identity(
    variety: &Variety,
    name: &str,
    breeder: &str,
) -> Result<(Variety, Option<Intent<&'static LibraryEntry>>)> {
    if name.trim().is_empty() {
        return Err(Error::BlankField("name"));
    }
    if breeder.trim().is_empty() {
        return Err(Error::BlankField("breeder"));
    }
    let suggestion = (name != variety.name)
        .then(|| catalog::library_entry(name))
        .flatten()
        .map(|entry| {
            Intent::new(
                format!(
                    "Update variety details (Type {}, Feature) based on \"{}\"?",
                    entry.rose_type, entry.name
                ),
                entry,
            )
        });
    let mut next = variety.clone();
    next.name = name.to_string();
    next.breeder = breeder.to_string();
    Ok((next, suggestion))
}

pub fn apply_library_entry(variety: &Variety, entry: &LibraryEntry) -> Variety {
    let mut next = variety.clone();
    next.rose_type = Some(entry.rose_type);
    next.feature = Some(entry.feature.to_string());
    next
}

pub fn set_planting_date(variety: &Variety, date: Option<Timestamp>) -> Variety {
    let mut next = variety.clone();
    next.planting_date = date;
    next
}

pub fn set_transplant_date(variety: &Variety, date: Option<Timestamp>) -> Variety {
    let mut next = variety.clone();
    next.transplant_date = date;
    next
}

pub fn set_memo(variety: &Variety, memo: &str) -> Variety {
    let mut next = variety.clone();
    next.memo = memo.to_string();
    next
}

pub fn record_fertilizer(variety: &Variety, fertilizer: &Choice, date: Timestamp) -> Variety {
    append(
        variety,
        Event {
            id: new_id(),
            kind: EventKind::Fertilizer,
            date,
            details: fertilizer.label.to_string(),
            sub_type: Some(fertilizer.code.to_string()),
        },
    )
}

/// One component of a potting mix.
#[derive(Debug, Clone, PartialEq)]
pub struct SoilPart {
    pub soil: &'static Choice,
    /// Shown instead of the label for the `OTHER` soil.
    pub custom_name: Option<String>,
    pub percent: u32,
}

impl SoilPart {
    fn display_name(&self) -> String {
        if self.soil.code == "OTHER" {
            self.custom_name.clone().unwrap_or_else(|| "Other".to_string())
        } else {
            self.soil.short_label().to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransplantPlan {
    pub kind: &'static Choice,
    pub pot_size: Option<String>,
    pub soil: Vec<SoilPart>,
}

impl TransplantPlan {
    pub fn total_percent(&self) -> u32 {
        self.soil.iter().fold(0u32, |total, part| total.saturating_add(part.percent))
    }

    /// `"<kind>[ [pot]] | Soil: <soil> (<n>%) + ..."`
    pub fn details(&self) -> String {
        let soil = self
            .soil
            .iter()
            .map(|part| format!("{} ({}%)", part.display_name(), part.percent))
            .collect::<Vec<_>>()
            .join(" + ");
        let pot = match self.pot_size.as_deref() {
            Some(size) if !size.is_empty() => format!(" [{}]", size),
            _ => String::new(),
        };
        format!("{}{} | Soil: {}", self.kind.label, pot, soil)
    }
}

/// Logs a transplant and moves the variety's transplant date in the same
/// replacement.
pub fn record_transplant(variety: &Variety, plan: &TransplantPlan, date: Timestamp) -> Variety {
    let mut next = append(
        variety,
        Event {
            id: new_id(),
            kind: EventKind::Transplant,
            date: date.clone(),
            details: plan.details(),
            sub_type: Some(plan.kind.code.to_string()),
        },
    );
    next.transplant_date = Some(date);
    next
}

pub fn record_issue(variety: &Variety, issue: &Issue, date: Timestamp) -> Variety {
    append(
        variety,
        Event {
            id: new_id(),
            kind: EventKind::PestControl,
            date,
            details: issue.label.to_string(),
            sub_type: None,
        },
    )
}

/// A pruning session: one event plus optional before/after photos, all
/// carrying the same timestamp. Nothing links the photos to the event beyond
/// that date; see [`pruning_photos_for`].
pub fn record_pruning(
    variety: &Variety,
    date: Timestamp,
    details: &str,
    before: Option<String>,
    after: Option<String>,
) -> Variety {
    let details = match details.trim() {
        "" => DEFAULT_PRUNING_DETAILS,
        trimmed => trimmed,
    };
    let mut next = append(
        variety,
        Event {
            id: new_id(),
            kind: EventKind::Pruning,
            date: date.clone(),
            details: details.to_string(),
            sub_type: None,
        },
    );
    for (url, kind) in [(before, PhotoKind::PruningBefore), (after, PhotoKind::PruningAfter)] {
        if let Some(url) = url {
            next = append(
                &next,
                Photo {
                    id: new_id(),
                    url,
                    date: date.clone(),
                    kind,
                    note: Some(details.to_string()),
                },
            );
        }
    }
    next
}

pub fn record_bloom(variety: &Variety, url: String, date: Timestamp) -> Variety {
    append(
        variety,
        Photo { id: new_id(), url, date, kind: PhotoKind::Bloom, note: None },
    )
}

pub fn record_note(variety: &Variety, date: Timestamp, content: &str) -> Result<Variety> {
    if content.trim().is_empty() {
        return Err(Error::EmptyNote);
    }
    Ok(append(
        variety,
        Note { id: new_id(), date, content: content.to_string() },
    ))
}

pub fn edit_event(variety: &Variety, id: &str, date: Timestamp, details: &str) -> Result<Variety> {
    let mut event = find_child::<Event>(variety, id)?.clone();
    event.date = date;
    event.details = details.to_string();
    replace(variety, event)
}

/// Moves a photo to another day (keeping its time of day) and optionally
/// rewrites its note.
pub fn edit_photo(variety: &Variety, id: &str, day: NaiveDate, note: Option<String>) -> Result<Variety> {
    let mut photo = find_child::<Photo>(variety, id)?.clone();
    photo.date = move_to_day(&photo.date, day);
    if note.is_some() {
        photo.note = note;
    }
    replace(variety, photo)
}

pub fn edit_note(variety: &Variety, id: &str, date: Timestamp, content: &str) -> Result<Variety> {
    find_child::<Note>(variety, id)?;
    replace(variety, Note { id: id.to_string(), date, content: content.to_string() })
}

/// Pruning photos taken on the calendar day of `event`. Best effort: two
/// sessions on the same day share their photos.
pub fn pruning_photos_for<'a>(variety: &'a Variety, event: &Event) -> Vec<&'a Photo> {
    let Some(day) = event.date.day() else {
        return vec![];
    };
    variety
        .photos
        .iter()
        .filter(|p| p.kind.is_pruning() && p.date.day() == Some(day))
        .collect()
}
