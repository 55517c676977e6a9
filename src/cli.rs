use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clap::{Args, Parser, Subcommand};

use crate::models::Timestamp;

#[derive(Parser, Debug)]
#[command(name = "rosarium")]
#[command(about = "A CLI to keep track of my roses: care, pruning, blooms and journal entries")]
pub struct Cli {
    /// Directory holding the saved collection (overrides ROSARIUM_DATA_DIR)
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Answer yes to every confirmation
    #[arg(short = 'y', long = "yes", global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// One line typed into the interactive shell.
#[derive(Parser, Debug)]
#[command(name = "rosarium", no_binary_name = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List varieties (optionally filtered by name or breeder)
    #[command(alias = "view")]
    List {
        /// Match against name or breeder
        #[arg(long = "search-param")]
        search_param: Option<String>,
        /// Only print ids and names
        #[arg(long = "ids")]
        ids: bool,
    },
    /// Show one variety with its whole history
    Show { id: String },
    /// Register a new variety
    Add(AddArgs),
    /// Rename a variety or change its breeder
    Edit(EditArgs),
    /// Delete a variety and everything recorded about it
    Delete { id: String },
    /// Set or clear the planting and transplant dates
    SetDates(SetDatesArgs),
    /// Replace the general memo
    Memo { id: String, text: String },
    /// Record a fertilizer application
    Fertilize(FertilizeArgs),
    /// Record a transplant (also moves the transplant date)
    Transplant(TransplantArgs),
    /// Record a pest or disease treatment
    Treat(TreatArgs),
    /// Record a pruning session with optional before/after photos
    Prune(PruneArgs),
    /// Add a bloom photo
    Bloom(BloomArgs),
    /// Add a journal entry
    Note(NoteArgs),
    /// Change the date or details of an event
    EditEvent(EditEventArgs),
    /// Delete an event
    DeleteEvent { id: String, event_id: String },
    /// Move a photo to another day or change its note
    EditPhoto(EditPhotoArgs),
    /// Delete a photo
    DeletePhoto { id: String, photo_id: String },
    /// Rewrite a journal entry
    EditNote(EditNoteArgs),
    /// Delete a journal entry
    DeleteNote { id: String, note_id: String },
    /// Write a dated JSON backup of every variety
    Export {
        /// Directory for the backup file
        #[arg(long, default_value = ".")]
        out: PathBuf,
        /// Print the backup instead of writing a file
        #[arg(long)]
        stdout: bool,
    },
    /// Replace every variety with the contents of a backup
    Import { file: PathBuf },
    /// Delete the saved collection (last resort for corrupted data)
    Reset,
    /// Show breeders, known varieties and care choices
    Catalog {
        /// Only list the varieties of breeders matching this text
        #[arg(long)]
        breeder: Option<String>,
    },
    /// Interactive mode with auto-save
    Shell,
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Breeder of the rose
    #[arg(short = 'b', long = "breeder")]
    pub breeder: String,
    /// Variety name; names from the catalog fill in type and feature
    #[arg(short = 'n', long = "name")]
    pub name: String,
    /// Initial memo
    #[arg(long, default_value = "")]
    pub memo: String,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    pub id: String,
    /// New name
    #[arg(short, long)]
    pub name: Option<String>,
    /// New breeder
    #[arg(short, long)]
    pub breeder: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct SetDatesArgs {
    pub id: String,
    /// Planting day (YYYY-MM-DD), or "none" to clear
    #[arg(long, value_parser = parse_date_setting)]
    pub planted: Option<DateSetting>,
    /// Last transplant day (YYYY-MM-DD), or "none" to clear
    #[arg(long, value_parser = parse_date_setting)]
    pub transplanted: Option<DateSetting>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSetting {
    Clear,
    Day(NaiveDate),
}

#[derive(Args, Debug, Clone)]
pub struct FertilizeArgs {
    pub id: String,
    /// VITALIZER, SOLID or LIQUID
    #[arg(short, long, default_value = "VITALIZER")]
    pub kind: String,
    /// Day of the application (YYYY-MM-DD, default today)
    #[arg(long, value_parser = parse_day)]
    pub date: Option<NaiveDate>,
}

#[derive(Args, Debug, Clone)]
pub struct TransplantArgs {
    pub id: String,
    /// TRANSPLANT, POT_UP, SOIL_RENEWAL or GROUND
    #[arg(short, long, default_value = "TRANSPLANT")]
    pub kind: String,
    /// Pot size, free text
    #[arg(long)]
    pub pot_size: Option<String>,
    /// Soil component as CODE:PERCENT or OTHER:PERCENT:NAME (repeatable)
    #[arg(long = "soil", default_value = "PREMIUM_ROSE:100")]
    pub soil: Vec<String>,
    #[arg(long, value_parser = parse_day)]
    pub date: Option<NaiveDate>,
}

#[derive(Args, Debug, Clone)]
pub struct TreatArgs {
    pub id: String,
    /// Issue label or its English name, e.g. "Black Spot"
    #[arg(short, long)]
    pub issue: String,
    #[arg(long, value_parser = parse_day)]
    pub date: Option<NaiveDate>,
}

#[derive(Args, Debug, Clone)]
pub struct PruneArgs {
    pub id: String,
    /// What was done
    #[arg(short, long, default_value = "")]
    pub details: String,
    /// Picture taken before pruning
    #[arg(long)]
    pub before: Option<PathBuf>,
    /// Picture taken after pruning
    #[arg(long)]
    pub after: Option<PathBuf>,
    #[arg(long, value_parser = parse_day)]
    pub date: Option<NaiveDate>,
}

#[derive(Args, Debug, Clone)]
pub struct BloomArgs {
    pub id: String,
    /// Picture of the bloom
    #[arg(short, long)]
    pub photo: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct NoteArgs {
    pub id: String,
    pub content: String,
    #[arg(long, value_parser = parse_day)]
    pub date: Option<NaiveDate>,
}

#[derive(Args, Debug, Clone)]
pub struct EditEventArgs {
    pub id: String,
    pub event_id: String,
    /// New date: YYYY-MM-DD, YYYY-MM-DDTHH:MM or RFC 3339
    #[arg(long, value_parser = parse_when)]
    pub date: Option<Timestamp>,
    #[arg(long)]
    pub details: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct EditPhotoArgs {
    pub id: String,
    pub photo_id: String,
    /// New day; the time of day is kept
    #[arg(long, value_parser = parse_day)]
    pub date: Option<NaiveDate>,
    #[arg(long)]
    pub note: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct EditNoteArgs {
    pub id: String,
    pub note_id: String,
    #[arg(long)]
    pub content: Option<String>,
    #[arg(long, value_parser = parse_day)]
    pub date: Option<NaiveDate>,
}

pub fn parse_day(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}', expected YYYY-MM-DD", raw))
}

fn parse_date_setting(raw: &str) -> Result<DateSetting, String> {
    match raw.trim() {
        "none" | "" => Ok(DateSetting::Clear),
        day => parse_day(day).map(DateSetting::Day),
    }
}

/// A full timestamp from a day, a local-style minute or RFC 3339.
pub fn parse_when(raw: &str) -> Result<Timestamp, String> {
    let raw = raw.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Timestamp::from_datetime(date.with_timezone(&Utc)));
    }
    if let Ok(date) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M") {
        return Ok(Timestamp::from_datetime(date.and_utc()));
    }
    parse_day(raw).map(|day| Timestamp::from_datetime(day.and_time(chrono::NaiveTime::MIN).and_utc()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_the_subcommand() {
        let cli = Cli::try_parse_from(["rosarium", "list", "--ids", "--data-dir", "/tmp/r", "-y"]).unwrap();
        assert!(cli.yes);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/r")));
        assert!(matches!(cli.command, Commands::List { ids: true, search_param: None }));
    }

    #[test]
    fn shell_lines_have_no_binary_name() {
        let line = ShellLine::try_parse_from(["note", "abc", "first bud", "--date", "2024-04-01"]).unwrap();
        match line.command {
            Commands::Note(args) => {
                assert_eq!(args.id, "abc");
                assert_eq!(args.content, "first bud");
                assert_eq!(args.date, NaiveDate::from_ymd_opt(2024, 4, 1));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn set_dates_accepts_none() {
        let cli = Cli::try_parse_from(["rosarium", "set-dates", "x", "--planted", "none", "--transplanted", "2024-02-02"])
            .unwrap();
        match cli.command {
            Commands::SetDates(args) => {
                assert_eq!(args.planted, Some(DateSetting::Clear));
                assert_eq!(
                    args.transplanted,
                    Some(DateSetting::Day(NaiveDate::from_ymd_opt(2024, 2, 2).unwrap()))
                );
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn when_accepts_three_shapes() {
        assert_eq!(parse_when("2024-04-01").unwrap().as_str(), "2024-04-01T00:00:00.000Z");
        assert_eq!(parse_when("2024-04-01T08:30").unwrap().as_str(), "2024-04-01T08:30:00.000Z");
        assert_eq!(
            parse_when("2024-04-01T08:30:00+09:00").unwrap().as_str(),
            "2024-03-31T23:30:00.000Z"
        );
        assert!(parse_when("April").is_err());
    }
}
