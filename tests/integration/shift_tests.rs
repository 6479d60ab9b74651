use chrono::{DateTime, FixedOffset, TimeDelta, Utc};

use timeshift::shift::{AnchorPolicy, ColumnRef, FixedClock, ShiftPlan, TimeShiftEngine, Timestamp};
use timeshift::storage::{Database, file_sha256};
use timeshift::test_utils::{BookingRow, FlightRow, TravelSnapshot};

use crate::fixture::{dump_table, june_first, schema_objects, text, text_column};

fn engine(snapshot: &TravelSnapshot) -> TimeShiftEngine<FixedClock> {
    TimeShiftEngine::new(snapshot.store()).with_clock(FixedClock(june_first()))
}

fn instant(value: &str) -> DateTime<Utc> {
    Timestamp::parse(value).unwrap().to_utc()
}

#[test]
fn anchor_lands_on_now_and_lead_time_is_kept() {
    let snapshot = TravelSnapshot::basic().unwrap();
    let report = engine(&snapshot).run().unwrap();

    assert_eq!(report.offset, TimeDelta::days(517));
    assert_eq!(report.offset_display, "+517 days 00:00:00");
    assert!(report.persisted);
    assert_eq!(report.working_path, snapshot.working_path);

    let path = &snapshot.working_path;
    assert_eq!(
        text_column(path, "flights", "actual_departure"),
        vec![text("2025-06-01 10:00:00+00:00")]
    );
    assert_eq!(
        text_column(path, "flights", "actual_arrival"),
        vec![text("2025-06-01 11:05:00+00:00")]
    );
    assert_eq!(
        text_column(path, "bookings", "book_date"),
        vec![text("2025-05-25 08:00:00+00:00")]
    );
}

#[test]
fn sentinel_rows_are_ignored_and_stay_missing() {
    let snapshot = TravelSnapshot::sample().unwrap();
    let report = engine(&snapshot).run().unwrap();

    // Anchor is flight 2 (18:00-04:00); now is localized to -04:00.
    assert_eq!(report.zone, "-04:00");
    assert_eq!(report.anchor.to_rfc3339(), "2024-04-30T18:00:00-04:00");
    assert_eq!(report.current_time.to_rfc3339(), "2025-06-01T10:00:00-04:00");
    assert_eq!(report.offset, TimeDelta::days(396) + TimeDelta::hours(16));

    let path = &snapshot.working_path;
    assert_eq!(
        text_column(path, "flights", "actual_departure"),
        vec![
            text("2025-05-30 05:45:00+00:00"),
            text("2025-06-01 14:00:00+00:00"),
            None,
            None,
        ]
    );
    assert_eq!(
        text_column(path, "flights", "scheduled_departure")[2],
        text("2025-06-03 03:15:00+00:00")
    );
    assert_eq!(
        text_column(path, "bookings", "book_date"),
        vec![
            text("2025-05-03 08:30:00+00:00"),
            text("2025-05-22 04:05:10.250000+00:00"),
            None,
            text("2025-05-31 19:59:59.999999+00:00"),
        ]
    );

    let departures = report.columns.iter().find(|c| c.column == "actual_departure").unwrap();
    assert_eq!((departures.shifted, departures.missing), (2, 2));
}

#[test]
fn relative_intervals_are_preserved() {
    let snapshot = TravelSnapshot::sample().unwrap();
    let before: Vec<DateTime<Utc>> = ["2024-04-01 12:30:00.000000-04:00", "2024-04-28 09:45:00.000000-04:00"]
        .map(instant)
        .to_vec();

    engine(&snapshot).run().unwrap();

    let path = &snapshot.working_path;
    let book = instant(text_column(path, "bookings", "book_date")[0].as_deref().unwrap());
    let dep = instant(text_column(path, "flights", "scheduled_departure")[0].as_deref().unwrap());
    assert_eq!(dep - book, before[1] - before[0]);
}

#[test]
fn repeated_runs_are_idempotent() {
    let snapshot = TravelSnapshot::sample().unwrap();
    let engine = engine(&snapshot);

    let first = engine.run().unwrap();
    let tables = ["bookings", "flights", "tickets", "boarding_passes"];
    let after_first: Vec<_> = tables.iter().map(|t| dump_table(&snapshot.working_path, t)).collect();

    let second = engine.run().unwrap();
    let after_second: Vec<_> = tables.iter().map(|t| dump_table(&snapshot.working_path, t)).collect();

    assert_eq!(first.offset, second.offset);
    assert_eq!(after_first, after_second);
}

#[test]
fn untouched_columns_round_trip_exactly() {
    let snapshot = TravelSnapshot::sample().unwrap();
    engine(&snapshot).run().unwrap();

    for table in ["tickets", "boarding_passes"] {
        assert_eq!(
            dump_table(&snapshot.working_path, table),
            dump_table(&snapshot.backup_path, table),
            "{table} changed"
        );
    }
    for (table, col) in [
        ("flights", "flight_id"),
        ("flights", "flight_no"),
        ("flights", "status"),
        ("bookings", "book_ref"),
        ("bookings", "total_amount"),
    ] {
        assert_eq!(
            crate::fixture::column(&snapshot.working_path, table, col),
            crate::fixture::column(&snapshot.backup_path, table, col),
            "{table}.{col} changed"
        );
    }
}

#[test]
fn schema_objects_survive_the_shift() {
    let snapshot = TravelSnapshot::sample().unwrap();
    engine(&snapshot).run().unwrap();

    assert_eq!(
        schema_objects(&snapshot.working_path, "index"),
        schema_objects(&snapshot.backup_path, "index")
    );
    assert!(schema_objects(&snapshot.working_path, "index").contains(&"flights_flight_no".to_string()));
    let working = Database::open_read_only(&snapshot.working_path).unwrap().catalog().unwrap();
    let backup = Database::open_read_only(&snapshot.backup_path).unwrap().catalog().unwrap();
    let mut names = working.table_names();
    names.sort_unstable();
    let mut expected = backup.table_names();
    expected.sort_unstable();
    assert_eq!(names, expected);
    for name in names {
        assert_eq!(working.table(name), backup.table(name), "{name} schema changed");
    }
}

#[test]
fn backup_is_never_modified() {
    let snapshot = TravelSnapshot::sample().unwrap();
    let before = file_sha256(&snapshot.backup_path).unwrap();
    engine(&snapshot).run().unwrap();
    assert_eq!(file_sha256(&snapshot.backup_path).unwrap(), before);
}

#[test]
fn preview_matches_run_without_writing() {
    let snapshot = TravelSnapshot::sample().unwrap();
    let engine = engine(&snapshot);

    let preview = engine.preview().unwrap();
    assert!(!preview.persisted);
    assert!(preview.restore.is_none());
    assert!(!snapshot.working_path.exists());

    let run = engine.run().unwrap();
    assert_eq!(preview.offset, run.offset);
    assert_eq!(preview.anchor, run.anchor);
    assert_eq!(preview.columns, run.columns);
}

#[test]
fn convert_policy_places_now_in_reference_zone() {
    let snapshot = TravelSnapshot::sample().unwrap();
    let localize = engine(&snapshot).preview().unwrap();
    let convert = engine(&snapshot)
        .with_policy(AnchorPolicy::Convert)
        .preview()
        .unwrap();

    let minus4 = FixedOffset::west_opt(4 * 3600).unwrap();
    assert_eq!(convert.current_time, june_first().with_timezone(&minus4));
    assert_eq!(localize.offset - convert.offset, TimeDelta::hours(4));
}

#[test]
fn utc_reference_makes_policies_agree() {
    let snapshot = TravelSnapshot::basic().unwrap();
    let localize = engine(&snapshot).preview().unwrap();
    let convert = engine(&snapshot)
        .with_policy(AnchorPolicy::Convert)
        .preview()
        .unwrap();
    assert_eq!(localize.offset, convert.offset);
}

#[test]
fn naive_reference_values_are_read_as_utc() {
    let snapshot = TravelSnapshot::new(
        &[FlightRow::on_time(7, "2024-01-01 10:00:00", "2024-01-01 11:00")],
        &[BookingRow::new("X1", "2023-12-25")],
    )
    .unwrap();
    let report = engine(&snapshot).run().unwrap();
    assert_eq!(report.zone, "naive");
    assert_eq!(report.offset, TimeDelta::days(517));
    assert_eq!(
        text_column(&snapshot.working_path, "bookings", "book_date"),
        vec![text("2025-05-25 00:00:00+00:00")]
    );
}

#[test]
fn partial_load_only_rewrites_planned_tables() {
    let snapshot = TravelSnapshot::sample().unwrap();
    let report = engine(&snapshot).with_load_all_tables(false).run().unwrap();
    assert_eq!(report.tables, 2);
    assert_eq!(
        dump_table(&snapshot.working_path, "boarding_passes"),
        dump_table(&snapshot.backup_path, "boarding_passes")
    );
    assert_eq!(
        text_column(&snapshot.working_path, "flights", "actual_departure")[1],
        text("2025-06-01 14:00:00+00:00")
    );
}

#[test]
fn custom_plan_limits_the_shift_set() {
    let snapshot = TravelSnapshot::basic().unwrap();
    let plan = ShiftPlan::new(
        ColumnRef::new("flights", "actual_departure"),
        vec![ColumnRef::new("bookings", "book_date")],
        vec!["\\N".to_string()],
    );
    engine(&snapshot).with_plan(plan).run().unwrap();

    let path = &snapshot.working_path;
    assert_eq!(
        text_column(path, "flights", "scheduled_departure"),
        vec![text("2024-01-01T10:00:00+00:00")]
    );
    assert_eq!(
        text_column(path, "flights", "actual_departure"),
        vec![text("2025-06-01 10:00:00+00:00")]
    );
}

#[test]
fn update_dates_returns_working_path() {
    let snapshot = TravelSnapshot::basic().unwrap();
    let before = Utc::now();
    let path = timeshift::shift::update_dates(&snapshot.working_path, &snapshot.backup_path).unwrap();
    assert_eq!(path, snapshot.working_path);

    let shifted = instant(text_column(&path, "flights", "actual_departure")[0].as_deref().unwrap());
    assert!(shifted >= before - TimeDelta::seconds(1));
    assert!(shifted <= Utc::now());
}
