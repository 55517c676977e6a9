use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, NaiveTime, Utc};
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::debug;

use crate::autosave::{self, AutoSaver, AutosaveConfig, SaveStatus};
use crate::catalog::{self, BREEDERS, FERTILIZERS, ISSUES, SOIL_TYPES, TRANSPLANT_TYPES};
use crate::cli::{Commands, DateSetting, EditEventArgs, EditNoteArgs, EditPhotoArgs, TransplantArgs};
use crate::confirm::{Confirm, Intent};
use crate::models::{Event, Note, Photo, Timestamp, Variety};
use crate::mutators::{self, SoilPart, TransplantPlan};
use crate::photo;
use crate::router::Router;
use crate::storage::KeyValueStorage;
use crate::store::RecordStore;
use crate::transfer;

/// The running application: the loaded collection, the screen state and the
/// background writer.
pub struct App {
    store: RecordStore,
    router: Router,
    storage: Arc<dyn KeyValueStorage>,
    confirmer: Box<dyn Confirm + Send>,
    saver: AutoSaver,
}

impl App {
    /// Loads whatever is persisted and starts auto-saving. Must be called
    /// inside a tokio runtime.
    pub fn open(
        storage: Arc<dyn KeyValueStorage>,
        save_config: AutosaveConfig,
        confirmer: Box<dyn Confirm + Send>,
    ) -> Self {
        let store = RecordStore::new(autosave::load(storage.as_ref()));
        let saver = AutoSaver::spawn(storage.clone(), store.subscribe(), save_config);
        Self { store, router: Router::new(), storage, confirmer, saver }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn save_status(&self) -> SaveStatus {
        self.saver.current_status()
    }

    /// Writes pending changes, stops the background writer and reports how
    /// the last write went.
    pub async fn close(self) -> SaveStatus {
        let status = self.saver.status();
        self.saver.shutdown().await;
        let last = *status.borrow();
        last
    }

    pub async fn execute(&mut self, command: Commands) -> Result<()> {
        debug!(?command, "executing");
        match command {
            Commands::List { search_param, ids } => {
                self.router.show_list();
                self.list(search_param.as_deref(), ids);
            }
            Commands::Show { id } => {
                let variety = self.variety(&id)?;
                self.router.show_detail(&variety.id);
                print_variety(&variety);
            }
            Commands::Add(args) => {
                self.router.show_new();
                let mut variety = mutators::register(&args.breeder, &args.name)?;
                variety.memo = args.memo;
                let id = variety.id.clone();
                self.store.add(variety);
                self.router.variety_added();
                println!("Variety added, ID: {}", id);
            }
            Commands::Edit(args) => {
                let current = self.variety(&args.id)?;
                self.router.begin_edit(&current.id);
                let name = args.name.unwrap_or_else(|| current.name.clone());
                let breeder = args.breeder.unwrap_or_else(|| current.breeder.clone());
                let edited = self.edit_identity(&current, &name, &breeder);
                self.router.end_edit();
                edited?;
                println!("Variety ID {} updated", current.id);
            }
            Commands::Delete { id } => {
                let intent = self.store.request_remove(&id)?;
                match self.confirm(intent) {
                    Some(removal) => {
                        let removed = self.store.remove(removal)?;
                        self.router.variety_removed(&removed.id);
                        println!("Variety ID {} removed", removed.id);
                    }
                    None => println!("Nothing deleted"),
                }
            }
            Commands::SetDates(args) => {
                let mut next = self.variety(&args.id)?;
                if let Some(planted) = args.planted {
                    next = mutators::set_planting_date(&next, date_setting(planted));
                }
                if let Some(transplanted) = args.transplanted {
                    next = mutators::set_transplant_date(&next, date_setting(transplanted));
                }
                self.commit(next)?;
            }
            Commands::Memo { id, text } => {
                let current = self.variety(&id)?;
                self.commit(mutators::set_memo(&current, &text))?;
            }
            Commands::Fertilize(args) => {
                let current = self.variety(&args.id)?;
                let fertilizer = catalog::fertilizer(&args.kind).ok_or_else(|| unknown("fertilizer", &args.kind))?;
                self.commit(mutators::record_fertilizer(&current, fertilizer, stamp(args.date)))?;
            }
            Commands::Transplant(args) => {
                let current = self.variety(&args.id)?;
                let plan = transplant_plan(&args)?;
                if plan.total_percent() != 100 {
                    eprintln!("Warning: soil mix adds up to {}%", plan.total_percent());
                }
                self.commit(mutators::record_transplant(&current, &plan, stamp(args.date)))?;
            }
            Commands::Treat(args) => {
                let current = self.variety(&args.id)?;
                let issue = catalog::issue(&args.issue).ok_or_else(|| unknown("issue", &args.issue))?;
                self.commit(mutators::record_issue(&current, issue, stamp(args.date)))?;
            }
            Commands::Prune(args) => {
                let current = self.variety(&args.id)?;
                let (before, after) = tokio::join!(encode_optional(args.before), encode_optional(args.after));
                let next = mutators::record_pruning(&current, stamp(args.date), &args.details, before?, after?);
                self.commit(next)?;
            }
            Commands::Bloom(args) => {
                let current = self.variety(&args.id)?;
                let url = photo::encode_photo_file(args.photo.clone())
                    .await
                    .with_context(|| format!("could not use {}", args.photo.display()))?;
                self.commit(mutators::record_bloom(&current, url, Timestamp::now()))?;
            }
            Commands::Note(args) => {
                let current = self.variety(&args.id)?;
                self.commit(mutators::record_note(&current, stamp(args.date), &args.content)?)?;
            }
            Commands::EditEvent(args) => self.edit_event(args)?,
            Commands::DeleteEvent { id, event_id } => self.delete_child::<Event>(&id, &event_id)?,
            Commands::EditPhoto(args) => self.edit_photo(args)?,
            Commands::DeletePhoto { id, photo_id } => self.delete_child::<Photo>(&id, &photo_id)?,
            Commands::EditNote(args) => self.edit_note(args)?,
            Commands::DeleteNote { id, note_id } => self.delete_child::<Note>(&id, &note_id)?,
            Commands::Export { out, stdout } => {
                self.router.show_settings();
                if stdout {
                    println!("{}", transfer::export_json(self.store.varieties())?);
                } else {
                    let path = transfer::export_to_dir(self.store.varieties(), &out, Utc::now().date_naive())?;
                    println!("Backup written to {}", path.display());
                }
            }
            Commands::Import { file } => {
                self.router.show_settings();
                let intent = transfer::read_import(&file)?;
                println!("{} contains {} varieties", file.display(), intent.action().varieties().len());
                match self.confirm(intent) {
                    Some(pending) => {
                        let count = pending.apply(&mut self.store);
                        self.router.imported();
                        println!("Data imported successfully! ({} varieties)", count);
                    }
                    None => println!("Import cancelled"),
                }
            }
            Commands::Reset => {
                let intent = Intent::new("Delete ALL saved data? This cannot be undone.", ());
                if self.confirm(intent).is_some() {
                    autosave::reset(self.storage.as_ref())?;
                    self.store.replace_all(vec![]);
                    self.router.imported();
                    println!("Saved data cleared");
                } else {
                    println!("Nothing deleted");
                }
            }
            Commands::Catalog { breeder } => print_catalog(breeder.as_deref()),
            Commands::Shell => println!("Already in the shell"),
        }
        self.router.resolve(&self.store);
        Ok(())
    }

    fn variety(&self, id: &str) -> Result<Variety> {
        self.store
            .find(id)
            .cloned()
            .ok_or_else(|| crate::Error::VarietyNotFound(id.to_string()).into())
    }

    fn commit(&mut self, next: Variety) -> Result<()> {
        let id = next.id.clone();
        self.store.update(next)?;
        self.router.show_detail(&id);
        println!("Variety ID {} updated", id);
        Ok(())
    }

    fn confirm<T>(&mut self, intent: Intent<T>) -> Option<T> {
        let confirmer = self.confirmer.as_mut();
        blocking(move || intent.resolve(confirmer))
    }

    fn list(&self, search: Option<&str>, ids: bool) {
        let varieties: Vec<&Variety> = match search {
            Some(term) => self.store.search(term),
            None => self.store.varieties().iter().collect(),
        };
        if varieties.is_empty() {
            println!("No varieties found");
            return;
        }
        for variety in varieties {
            if ids {
                println!("{}, '{}'", variety.id, variety.name);
            } else {
                println!(
                    "Name: '{}'\nBreeder: '{}'\nType: {}\nEvents: {}, Photos: {}, Notes: {}\nID: '{}'",
                    variety.name,
                    variety.breeder,
                    variety.rose_type.map_or("-".to_string(), |t| t.to_string()),
                    variety.events.len(),
                    variety.photos.len(),
                    variety.notes.len(),
                    variety.id,
                );
                println!();
            }
        }
    }

    fn edit_identity(&mut self, current: &Variety, name: &str, breeder: &str) -> Result<()> {
        let (mut next, suggestion) = mutators::edit_identity(current, name, breeder)?;
        if let Some(entry) = suggestion.and_then(|intent| self.confirm(intent)) {
            next = mutators::apply_library_entry(&next, entry);
        }
        self.store.update(next)?;
        Ok(())
    }

    fn edit_event(&mut self, args: EditEventArgs) -> Result<()> {
        let current = self.variety(&args.id)?;
        let event = mutators::find_child::<Event>(&current, &args.event_id)?;
        let date = args.date.unwrap_or_else(|| event.date.clone());
        let details = args.details.unwrap_or_else(|| event.details.clone());
        self.commit(mutators::edit_event(&current, &args.event_id, date, &details)?)
    }

    fn edit_photo(&mut self, args: EditPhotoArgs) -> Result<()> {
        let current = self.variety(&args.id)?;
        let photo = mutators::find_child::<Photo>(&current, &args.photo_id)?;
        let day = match args.date {
            Some(day) => day,
            None => photo
                .date
                .day()
                .ok_or_else(|| anyhow!("photo {} has an unreadable date, pass --date", photo.id))?,
        };
        self.commit(mutators::edit_photo(&current, &args.photo_id, day, args.note)?)
    }

    fn edit_note(&mut self, args: EditNoteArgs) -> Result<()> {
        let current = self.variety(&args.id)?;
        let note = mutators::find_child::<Note>(&current, &args.note_id)?;
        let date = args.date.map(midnight).unwrap_or_else(|| note.date.clone());
        let content = args.content.unwrap_or_else(|| note.content.clone());
        self.commit(mutators::edit_note(&current, &args.note_id, date, &content)?)
    }

    fn delete_child<C: mutators::Child>(&mut self, id: &str, child_id: &str) -> Result<()> {
        let current = self.variety(id)?;
        let intent = mutators::request_remove::<C>(&current, child_id)?;
        match self.confirm(intent) {
            Some(removal) => self.commit(mutators::remove(&current, removal)?),
            None => {
                println!("Nothing deleted");
                Ok(())
            }
        }
    }
}

/// Runs a blocking call (a confirmation read from the terminal) without
/// stalling the other tasks of a multi-threaded runtime.
pub(crate) fn blocking<R>(f: impl FnOnce() -> R) -> R {
    match Handle::try_current().map(|handle| handle.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(f),
        _ => f(),
    }
}

fn stamp(day: Option<NaiveDate>) -> Timestamp {
    let now = Utc::now();
    mutators::timestamp_for_day(day.unwrap_or_else(|| now.date_naive()), now)
}

fn midnight(day: NaiveDate) -> Timestamp {
    Timestamp::from_datetime(day.and_time(NaiveTime::MIN).and_utc())
}

fn date_setting(setting: DateSetting) -> Option<Timestamp> {
    match setting {
        DateSetting::Clear => None,
        DateSetting::Day(day) => Some(midnight(day)),
    }
}

fn unknown(kind: &'static str, value: &str) -> anyhow::Error {
    crate::Error::UnknownChoice { kind, value: value.to_string() }.into()
}

async fn encode_optional(path: Option<PathBuf>) -> Result<Option<String>> {
    match path {
        Some(path) => {
            let url = photo::encode_photo_file(path.clone())
                .await
                .with_context(|| format!("could not use {}", path.display()))?;
            Ok(Some(url))
        }
        None => Ok(None),
    }
}

fn transplant_plan(args: &TransplantArgs) -> Result<TransplantPlan> {
    let kind = catalog::transplant_type(&args.kind).ok_or_else(|| unknown("transplant type", &args.kind))?;
    let soil = args.soil.iter().map(|raw| parse_soil(raw)).collect::<Result<Vec<_>>>()?;
    Ok(TransplantPlan { kind, pot_size: args.pot_size.clone(), soil })
}

/// `CODE:PERCENT` or `OTHER:PERCENT:NAME`
pub fn parse_soil(raw: &str) -> Result<SoilPart> {
    let mut parts = raw.splitn(3, ':');
    let code = parts.next().unwrap_or_default();
    let soil = catalog::soil_type(code).ok_or_else(|| unknown("soil", code))?;
    let percent = match parts.next() {
        Some(p) => p
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|percent| *percent <= 100)
            .ok_or_else(|| anyhow!("expected 0 to 100"))
            .with_context(|| format!("invalid soil percentage in '{}'", raw))?,
        None => 100,
    };
    let custom_name = parts.next().map(str::to_string).filter(|n| !n.is_empty());
    Ok(SoilPart { soil, custom_name, percent })
}

fn print_variety(variety: &Variety) {
    println!(
        "Name: '{}'\nBreeder: '{}'\nType: {}\nFeature: {}\nRegistered: {}\nPlanted: {}\nTransplanted: {}\nMemo: {}\nID: '{}'",
        variety.name,
        variety.breeder,
        variety.rose_type.map_or("-".to_string(), |t| t.to_string()),
        variety.feature.as_deref().unwrap_or("-"),
        variety.registration_date,
        variety.planting_date.as_ref().map_or("-".to_string(), |d| d.to_string()),
        variety.transplant_date.as_ref().map_or("-".to_string(), |d| d.to_string()),
        variety.memo,
        variety.id,
    );

    let events = mutators::newest_first(&variety.events);
    if events.is_empty() {
        println!("Events: none");
    } else {
        println!("Events:");
        for (i, event) in events.iter().enumerate() {
            println!(
                "  Event {}:\n    Date: {}\n    Type: {}\n    Details: '{}'\n    ID: {}",
                i + 1,
                event.date,
                event.kind.code(),
                event.details,
                event.id
            );
            if let Some(sub_type) = &event.sub_type {
                println!("    Sub type: {}", sub_type);
            }
            if event.kind == crate::models::EventKind::Pruning {
                for photo in mutators::pruning_photos_for(variety, event) {
                    println!("    Photo: {} ({})", photo.id, photo.kind.code());
                }
            }
        }
    }

    let photos = mutators::newest_first(&variety.photos);
    if photos.is_empty() {
        println!("Photos: none");
    } else {
        println!("Photos:");
        for photo in photos {
            println!(
                "  {} {} {} ({} bytes){}",
                photo.id,
                photo.date,
                photo.kind.code(),
                photo.url.len(),
                photo.note.as_deref().map(|n| format!(" '{}'", n)).unwrap_or_default()
            );
        }
    }

    let notes = mutators::newest_first(&variety.notes);
    if notes.is_empty() {
        println!("Notes: none");
    } else {
        println!("Notes:");
        for note in notes {
            println!("  {} {}\n    {}", note.id, note.date, note.content);
        }
    }
}

fn print_catalog(breeder_filter: Option<&str>) {
    let filter = breeder_filter.map(str::to_lowercase);
    for breeder in BREEDERS {
        if let Some(filter) = &filter {
            if !breeder.name.to_lowercase().contains(filter) {
                continue;
            }
        }
        println!("{}", breeder.name);
        for name in breeder.varieties {
            match catalog::library_entry(name) {
                Some(entry) => println!("  {} (Type {}): {}", name, entry.rose_type, entry.feature),
                None => println!("  {}", name),
            }
        }
    }
    if filter.is_some() {
        return;
    }
    println!("\nFertilizers:");
    for choice in FERTILIZERS {
        println!("  {:<14} {}", choice.code, choice.label);
    }
    println!("Transplant types:");
    for choice in TRANSPLANT_TYPES {
        println!("  {:<14} {}", choice.code, choice.label);
    }
    println!("Soils:");
    for choice in SOIL_TYPES {
        println!("  {:<14} {}", choice.code, choice.label);
    }
    println!("Issues:");
    for issue in ISSUES {
        println!("  {:<11} {}", format!("{:?}", issue.kind), issue.label);
    }
}
