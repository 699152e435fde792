use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Duration;
use posture_core::model::{ProgramDay, SessionKind, SettingsPatch};
use posture_core::time::{fixed_clock, fixed_now, local_date};
use services::{AppServices, Clock, ProgressStore, RoutineService};
use storage::repository::{InMemoryRepository, KeyValueStore, Storage, StorageError};

/// Backend that refuses every read and write, like a full or disabled disk.
#[derive(Default)]
struct UnavailableStore {
    writes: AtomicUsize,
}

#[async_trait]
impl KeyValueStore for UnavailableStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Connection("storage disabled".into()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::Connection("quota exceeded".into()))
    }

    async fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Connection("storage disabled".into()))
    }
}

async fn finish_day(routine: &mut RoutineService) -> Vec<Option<ProgramDay>> {
    let mut advanced = Vec::new();
    advanced.push(routine.complete(SessionKind::Morning).await.advanced_to);
    for _ in 0..3 {
        advanced.push(routine.complete(SessionKind::Microbreak).await.advanced_to);
    }
    advanced.push(routine.complete(SessionKind::Evening).await.advanced_to);
    advanced
}

#[tokio::test]
async fn completing_day_five_advances_exactly_once() {
    let storage = Storage::in_memory();
    let mut routine = RoutineService::load(fixed_clock(), &storage).await;
    routine.set_day(5).await;

    let advanced = finish_day(&mut routine).await;

    assert_eq!(
        advanced,
        vec![None, None, None, None, Some(ProgramDay::clamped(6))]
    );
    assert_eq!(routine.store().current_day().value(), 6);
    assert_eq!(routine.next_session(), None);

    // Re-checking the already complete record must not advance again.
    let again = routine.complete(SessionKind::Evening).await;
    assert!(again.day_complete);
    assert_eq!(again.advanced_to, None);
    let again = routine.complete(SessionKind::Microbreak).await;
    assert!(!again.recorded);
    assert_eq!(again.advanced_to, None);
    assert_eq!(routine.store().current_day().value(), 6);
}

#[tokio::test]
async fn reload_of_completed_day_does_not_advance_again() {
    let storage = Storage::in_memory();
    let mut routine = RoutineService::load(fixed_clock(), &storage).await;
    routine.set_day(5).await;
    finish_day(&mut routine).await;
    drop(routine);

    let mut reloaded = RoutineService::load(fixed_clock(), &storage).await;
    assert_eq!(reloaded.store().current_day().value(), 6);
    let report = reloaded.complete(SessionKind::Evening).await;
    assert_eq!(report.advanced_to, None);
    assert_eq!(reloaded.store().current_day().value(), 6);
}

#[tokio::test]
async fn next_calendar_day_starts_fresh_and_can_advance_again() {
    let storage = Storage::in_memory();
    let mut routine = RoutineService::load(fixed_clock(), &storage).await;
    routine.set_day(5).await;
    finish_day(&mut routine).await;

    let mut tomorrow = fixed_clock();
    tomorrow.advance(Duration::days(1));
    let mut routine = RoutineService::load(tomorrow, &storage).await;

    let view = routine.dashboard().await;
    assert_eq!(view.day.value(), 6);
    assert_eq!(view.next, Some(SessionKind::Morning));
    assert!(!view.day_complete);

    let advanced = finish_day(&mut routine).await;
    assert_eq!(advanced.last().copied().flatten(), Some(ProgramDay::clamped(7)));
}

#[tokio::test]
async fn evening_first_does_not_advance_until_everything_is_done() {
    let mut routine = AppServices::in_memory(fixed_clock()).await;

    let report = routine.complete(SessionKind::Evening).await;
    assert!(!report.day_complete);
    assert_eq!(report.advanced_to, None);

    routine.complete(SessionKind::Morning).await;
    routine.complete(SessionKind::Microbreak).await;
    routine.complete(SessionKind::Microbreak).await;
    let report = routine.complete(SessionKind::Microbreak).await;

    assert!(report.day_complete);
    assert_eq!(report.advanced_to, Some(ProgramDay::clamped(2)));
}

#[tokio::test]
async fn final_day_completes_without_advancing() {
    let mut routine = RoutineService::load(fixed_clock(), &Storage::in_memory()).await;
    routine.set_day(84).await;

    let advanced = finish_day(&mut routine).await;

    assert!(advanced.iter().all(Option::is_none));
    assert_eq!(routine.store().current_day(), ProgramDay::LAST);
    assert!(routine.dashboard().await.day_complete);
}

#[tokio::test]
async fn unavailable_storage_degrades_to_memory() {
    let backend = Arc::new(UnavailableStore::default());
    let mut store = ProgressStore::load(fixed_clock(), backend.clone()).await;

    assert_eq!(store.current_day(), ProgramDay::FIRST);
    assert_eq!(
        store.today_session().map(|s| s.date()),
        Some(local_date(fixed_now()))
    );

    store.complete_morning().await;
    store.set_day(9).await;
    store
        .update_settings(SettingsPatch {
            reminder_enabled: Some(true),
            ..SettingsPatch::default()
        })
        .await;
    store.clear().await;
    store.set_day(3).await;

    assert_eq!(store.current_day().value(), 3);
    assert!(backend.writes.load(Ordering::SeqCst) >= 4);
}

#[tokio::test]
async fn progress_survives_restart() {
    let repo = InMemoryRepository::new();
    let storage = Storage {
        kv: Arc::new(repo.clone()),
    };
    let clock = Clock::fixed(fixed_now());

    let mut routine = RoutineService::load(clock, &storage).await;
    routine.set_day(30).await;
    routine.complete(SessionKind::Morning).await;
    routine.complete(SessionKind::Microbreak).await;
    routine
        .update_settings(SettingsPatch {
            microbreak_interval: Some(60),
            ..SettingsPatch::default()
        })
        .await;

    let reloaded = RoutineService::load(clock, &storage).await;
    let store = reloaded.store();
    assert_eq!(store.current_day().value(), 30);
    let session = store.today_session().unwrap();
    assert!(session.morning().is_completed());
    assert_eq!(session.microbreaks().len(), 1);
    assert_eq!(store.settings().microbreak_interval(), 60);
    assert_eq!(reloaded.share_code(), "POSTURE-D30-P2");
}

#[tokio::test]
async fn reset_after_progress_returns_to_day_one() {
    let mut routine = RoutineService::load(fixed_clock(), &Storage::in_memory()).await;
    routine.set_day(50).await;
    routine.complete(SessionKind::Morning).await;

    routine.reset_progress().await;

    let view = routine.dashboard().await;
    assert_eq!(view.day, ProgramDay::FIRST);
    assert_eq!(view.next, Some(SessionKind::Morning));
    assert_eq!(view.share_code, "POSTURE-D1-P1");
}

#[tokio::test]
async fn sqlite_backed_routine_persists() {
    let url = "sqlite:file:memdb_routine?mode=memory&cache=shared";
    let mut routine = services::AppServices::new_sqlite(url, fixed_clock())
        .await
        .expect("sqlite routine");
    routine.set_day(15).await;
    routine.complete(SessionKind::Morning).await;

    let reloaded = services::AppServices::new_sqlite(url, fixed_clock())
        .await
        .expect("sqlite routine");
    assert_eq!(reloaded.store().current_day().value(), 15);
    assert!(reloaded.store().today_session().unwrap().morning().is_completed());
}
