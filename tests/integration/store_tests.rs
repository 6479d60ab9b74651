use rusqlite::types::Value;

use timeshift::storage::{SnapshotStore, file_sha256};
use timeshift::test_utils::{TravelSnapshot, write_travel_db};
use timeshift::ShiftError;

use crate::fixture::{dump_table, text_column};

#[test]
fn restore_discards_prior_working_state() {
    let snapshot = TravelSnapshot::sample().unwrap();
    let store = snapshot.store();
    std::fs::write(&snapshot.working_path, b"scribbled over").unwrap();

    let report = store.restore().unwrap();
    assert_eq!(report.sha256, file_sha256(&snapshot.backup_path).unwrap());
    assert_eq!(
        std::fs::read(&snapshot.working_path).unwrap(),
        std::fs::read(&snapshot.backup_path).unwrap()
    );
}

#[test]
fn restore_twice_is_identical() {
    let snapshot = TravelSnapshot::basic().unwrap();
    let store = snapshot.store();
    let first = store.restore().unwrap();
    let second = store.restore().unwrap();
    assert_eq!(first, second);
}

#[test]
fn load_keeps_sentinels_verbatim() {
    let snapshot = TravelSnapshot::sample().unwrap();
    let store = snapshot.store();
    store.restore().unwrap();

    let dataset = store.load_all_tables().unwrap();
    assert_eq!(
        dataset.table_names(),
        vec!["bookings", "flights", "tickets", "boarding_passes"]
    );
    let flights = dataset.table("flights").unwrap();
    assert_eq!(
        flights.column_values("actual_departure").unwrap()[2],
        &Value::Text("\\N".to_string())
    );
    assert_eq!(flights.declared_type("actual_departure"), Some("TIMESTAMP"));
}

#[test]
fn persist_round_trips_unchanged_dataset() {
    let snapshot = TravelSnapshot::sample().unwrap();
    let store = snapshot.store();
    store.restore().unwrap();

    let dataset = store.load_all_tables().unwrap();
    store.persist_all_tables(&dataset).unwrap();
    assert_eq!(store.load_all_tables().unwrap(), dataset);
}

#[test]
fn persist_failure_rolls_back_every_table() {
    let snapshot = TravelSnapshot::sample().unwrap();
    let store = snapshot.store();
    store.restore().unwrap();
    let before: Vec<_> = ["bookings", "flights"]
        .iter()
        .map(|t| dump_table(&snapshot.working_path, t))
        .collect();

    let mut dataset = store.load_all_tables().unwrap();
    // bookings is replaced first and succeeds; flights then violates NOT NULL.
    let bookings = dataset.table_mut("bookings").unwrap();
    let rows = bookings.len();
    assert!(bookings.replace_column("book_date", vec![Value::Null; rows]));
    let flights = dataset.table_mut("flights").unwrap();
    let rows = flights.len();
    assert!(flights.replace_column("flight_no", vec![Value::Null; rows]));

    let err = store.persist_all_tables(&dataset).unwrap_err();
    assert!(matches!(err, ShiftError::PersistFailure(_)), "{err}");
    assert!(err.to_string().contains("flights"));

    let after: Vec<_> = ["bookings", "flights"]
        .iter()
        .map(|t| dump_table(&snapshot.working_path, t))
        .collect();
    assert_eq!(before, after);
}

#[test]
fn partial_load_of_named_tables() {
    let snapshot = TravelSnapshot::sample().unwrap();
    let store = snapshot.store();
    store.restore().unwrap();

    let dataset = store.load_tables(&["flights"]).unwrap();
    assert_eq!(dataset.table_names(), vec!["flights"]);
    let err = store.load_tables(&["flights", "hotels"]).unwrap_err();
    assert!(matches!(err, ShiftError::SchemaMismatch(_)));
}

#[test]
fn seed_installs_backup_and_working_copy() {
    let snapshot = TravelSnapshot::basic().unwrap();
    let download = snapshot.root().join("download.sqlite");
    write_travel_db(&download, &[], &[]).unwrap();

    let store = SnapshotStore::new(
        snapshot.root().join("fresh.sqlite"),
        snapshot.root().join("fresh.backup.sqlite"),
    );
    let report = store.seed(&download, false).unwrap();
    assert!(report.installed);
    assert_eq!(
        file_sha256(store.backup_path()).unwrap(),
        file_sha256(&download).unwrap()
    );
    assert!(store.working_path().exists());

    // A second seed without overwrite keeps the existing backup.
    let again = store.seed(&snapshot.backup_path, false).unwrap();
    assert!(!again.installed);
    assert_eq!(
        file_sha256(store.backup_path()).unwrap(),
        file_sha256(&download).unwrap()
    );

    let replaced = store.seed(&snapshot.backup_path, true).unwrap();
    assert!(replaced.installed);
    assert_eq!(
        text_column(store.working_path(), "flights", "actual_departure"),
        vec![Some("2024-01-01T10:00:00+00:00".to_string())]
    );
}
