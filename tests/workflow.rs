use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use rosarium::app::App;
use rosarium::autosave::{self, AutosaveConfig, SaveStatus};
use rosarium::cli::{Commands, ShellLine};
use rosarium::confirm::{AssumeYes, Confirm, Decline};
use rosarium::models::EventKind;
use rosarium::router::View;
use rosarium::storage::{FileStorage, KeyValueStorage, STORAGE_KEY};
use rosarium::transfer;

fn command(words: &[&str]) -> Commands {
    ShellLine::try_parse_from(words).unwrap().command
}

fn open(storage: &Arc<FileStorage>, confirmer: impl Confirm + Send + 'static) -> App {
    let storage: Arc<dyn KeyValueStorage> = storage.clone();
    App::open(storage, AutosaveConfig::default(), Box::new(confirmer))
}

#[tokio::test]
async fn care_history_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FileStorage::open(dir.path()).unwrap());

    let mut app = open(&storage, AssumeYes);
    app.execute(command(&["add", "-b", "Meilland", "-n", "ナエマ"])).await.unwrap();
    assert_eq!(app.router().view(), &View::List);
    let id = app.store().varieties()[0].id.clone();

    app.execute(command(&["fertilize", &id, "--kind", "liquid", "--date", "2024-03-01"]))
        .await
        .unwrap();
    app.execute(command(&[
        "transplant", &id, "--pot-size", "8号", "--soil", "PREMIUM_ROSE:70", "--soil", "OTHER:30:Perlite",
        "--date", "2024-03-10",
    ]))
    .await
    .unwrap();
    app.execute(command(&["prune", &id, "--date", "2024-02-01"])).await.unwrap();
    app.execute(command(&["note", &id, "first buds", "--date", "2024-04-01"])).await.unwrap();
    assert_eq!(app.router().view(), &View::Detail(id.clone()));
    assert_eq!(app.close().await, SaveStatus::Saved);

    let app = open(&storage, Decline);
    let variety = app.store().find(&id).unwrap();
    assert_eq!(variety.rose_type, Some(2));
    assert_eq!(variety.events.len(), 3);
    assert_eq!(variety.notes[0].content, "first buds");

    let transplant = variety.events.iter().find(|e| e.kind == EventKind::Transplant).unwrap();
    assert!(transplant.details.contains("Perlite (30%)"), "{}", transplant.details);
    assert_eq!(variety.transplant_date.as_ref(), Some(&transplant.date));

    let pruning = variety.events.iter().find(|e| e.kind == EventKind::Pruning).unwrap();
    assert_eq!(pruning.details, "Pruning Session");
    app.close().await;
}

#[tokio::test]
async fn declined_deletes_change_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FileStorage::open(dir.path()).unwrap());

    let mut app = open(&storage, Decline);
    app.execute(command(&["add", "-b", "David Austin", "-n", "Olivia"])).await.unwrap();
    let id = app.store().varieties()[0].id.clone();
    app.execute(command(&["note", &id, "keep me"])).await.unwrap();
    let note_id = app.store().varieties()[0].notes[0].id.clone();

    app.execute(command(&["delete-note", &id, &note_id])).await.unwrap();
    app.execute(command(&["delete", &id])).await.unwrap();
    assert_eq!(app.store().len(), 1);
    assert_eq!(app.store().varieties()[0].notes.len(), 1);
    app.close().await;

    assert_eq!(autosave::load(storage.as_ref()).len(), 1);
}

#[tokio::test]
async fn a_rejected_rename_closes_the_edit() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FileStorage::open(dir.path()).unwrap());
    let mut app = open(&storage, AssumeYes);
    app.execute(command(&["add", "-b", "Meilland", "-n", "Bolero"])).await.unwrap();
    let id = app.store().varieties()[0].id.clone();

    assert!(app.execute(command(&["edit", &id, "--name", " "])).await.is_err());
    assert_eq!(app.router().editing(), None);
    assert_eq!(app.store().varieties()[0].name, "Bolero");

    app.execute(command(&["edit", &id, "--name", "Bolero Rouge"])).await.unwrap();
    assert_eq!(app.router().editing(), None);
    assert_eq!(app.store().varieties()[0].name, "Bolero Rouge");
    app.close().await;
}

#[tokio::test]
async fn unknown_ids_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FileStorage::open(dir.path()).unwrap());
    let mut app = open(&storage, AssumeYes);

    let err = app.execute(command(&["memo", "missing", "hello"])).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<rosarium::Error>(), Some(rosarium::Error::VarietyNotFound(_))));
    app.close().await;

    // nothing was ever stored, so nothing gets written
    assert!(!storage.path_for(STORAGE_KEY).exists());
}

#[tokio::test]
async fn backup_moves_a_collection_between_data_dirs() {
    let home = tempfile::tempdir().unwrap();
    let elsewhere = tempfile::tempdir().unwrap();
    let backups = tempfile::tempdir().unwrap();

    let storage = Arc::new(FileStorage::open(home.path()).unwrap());
    let mut app = open(&storage, AssumeYes);
    app.execute(command(&["add", "-b", "Delbard", "-n", "Chartreuse de Parme"])).await.unwrap();
    app.execute(command(&["export", "--out", backups.path().to_str().unwrap()])).await.unwrap();
    app.close().await;

    let file = backups.path().join(transfer::backup_file_name(Utc::now().date_naive()));
    assert!(file.exists());

    let other = Arc::new(FileStorage::open(elsewhere.path()).unwrap());
    let mut app = open(&other, AssumeYes);
    app.execute(command(&["add", "-b", "Meilland", "-n", "Bolero"])).await.unwrap();
    app.execute(command(&["import", file.to_str().unwrap()])).await.unwrap();
    assert_eq!(app.store().len(), 1);
    assert_eq!(app.store().varieties()[0].name, "Chartreuse de Parme");
    assert_eq!(app.close().await, SaveStatus::Saved);

    assert_eq!(autosave::load(other.as_ref())[0].breeder, "Delbard");
}

#[tokio::test]
async fn reset_forgets_everything() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FileStorage::open(dir.path()).unwrap());

    let mut app = open(&storage, AssumeYes);
    app.execute(command(&["add", "-b", "Meilland", "-n", "Bolero"])).await.unwrap();
    app.close().await;
    assert!(storage.path_for(STORAGE_KEY).exists());

    let mut app = open(&storage, AssumeYes);
    app.execute(command(&["reset"])).await.unwrap();
    assert!(app.store().is_empty());
    app.close().await;

    assert!(!storage.path_for(STORAGE_KEY).exists());
    assert!(autosave::load(storage.as_ref()).is_empty());
}
