use posture_core::model::{ProgramDay, ProgramState, SessionRecord, UserSettings};
use posture_core::time::{fixed_now, local_date};
use storage::record::{DecodeQuality, PROGRESS_KEY, ProgressRecord, decode_lenient};
use storage::repository::{KeyValueStore, Storage};
use storage::sqlite::SqliteRepository;

#[tokio::test]
async fn sqlite_roundtrip_persists_progress_blob() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let mut record = SessionRecord::empty(local_date(fixed_now()));
    record.complete_morning("07:45 AM");
    let state =
        ProgramState::from_persisted(ProgramDay::clamped(17), Some(record), UserSettings::default());
    let json = ProgressRecord::from_state(&state).to_json().unwrap();

    repo.set(PROGRESS_KEY, &json).await.unwrap();
    let stored = repo.get(PROGRESS_KEY).await.unwrap().expect("stored blob");

    let (decoded, quality) = decode_lenient(&stored);
    assert_eq!(quality, DecodeQuality::Intact);
    assert_eq!(decoded, state);
}

#[tokio::test]
async fn sqlite_set_overwrites_and_remove_clears() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_overwrite?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    repo.set(PROGRESS_KEY, "first").await.unwrap();
    repo.set(PROGRESS_KEY, "second").await.unwrap();
    assert_eq!(
        repo.get(PROGRESS_KEY).await.unwrap().as_deref(),
        Some("second")
    );

    repo.remove(PROGRESS_KEY).await.unwrap();
    assert_eq!(repo.get(PROGRESS_KEY).await.unwrap(), None);
    repo.remove(PROGRESS_KEY).await.unwrap();
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.migrate().await.expect("second migrate");
}

#[tokio::test]
async fn storage_sqlite_builds_a_working_store() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage?mode=memory&cache=shared")
        .await
        .expect("storage");
    assert_eq!(storage.kv.get(PROGRESS_KEY).await.unwrap(), None);
    storage.kv.set(PROGRESS_KEY, "{}").await.unwrap();
    assert_eq!(
        storage.kv.get(PROGRESS_KEY).await.unwrap().as_deref(),
        Some("{}")
    );
}
