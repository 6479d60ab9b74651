use chrono::{DateTime, Datelike, FixedOffset, TimeDelta, TimeZone, Utc};
use proptest::prelude::*;
use rusqlite::types::Value;

use timeshift::dataset::{Dataset, Table};
use timeshift::shift::{AnchorPolicy, ShiftPlan, Timestamp, apply_offset, compute_offset, format_utc};

const BASE: i64 = 1_700_000_000;

/// A cell of a temporal column: seconds past `BASE` plus microseconds, or missing.
fn arb_cell() -> impl Strategy<Value = Option<(i64, u32)>> {
    prop::option::weighted(0.8, (0i64..60 * 86_400, 0u32..1_000_000))
}

fn arb_zone() -> impl Strategy<Value = FixedOffset> {
    (-12i32..=14).prop_map(|hours| FixedOffset::east_opt(hours * 3600).unwrap())
}

fn render(cell: Option<(i64, u32)>, zone: FixedOffset) -> Value {
    match cell {
        None => Value::Text("\\N".to_string()),
        Some((secs, micros)) => {
            let instant = Utc.timestamp_opt(BASE + secs, micros * 1_000).unwrap();
            let local = instant.with_timezone(&zone);
            Value::Text(local.format("%Y-%m-%d %H:%M:%S%.6f%:z").to_string())
        }
    }
}

fn dataset(departures: &[Option<(i64, u32)>], bookings: &[Option<(i64, u32)>], zone: FixedOffset) -> Dataset {
    let columns = [
        "scheduled_departure",
        "scheduled_arrival",
        "actual_departure",
        "actual_arrival",
    ];
    let mut flights = Table::new("flights", columns.map(String::from).to_vec());
    for cell in departures {
        let value = render(*cell, zone);
        flights.push_row(vec![value.clone(), value.clone(), value.clone(), value]);
    }
    let mut booking_table = Table::new("bookings", vec!["book_date".to_string()]);
    for cell in bookings {
        booking_table.push_row(vec![render(*cell, zone)]);
    }
    [flights, booking_table].into_iter().collect()
}

fn instants(dataset: &Dataset, table: &str, column: &str) -> Vec<Option<DateTime<Utc>>> {
    dataset
        .table(table)
        .unwrap()
        .column_values(column)
        .unwrap()
        .into_iter()
        .map(|value| match value {
            Value::Text(text) if text != "\\N" => Some(Timestamp::parse(text).unwrap().to_utc()),
            _ => None,
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn shift_preserves_every_interval_and_every_gap(
        departures in prop::collection::vec(arb_cell(), 1..12),
        bookings in prop::collection::vec(arb_cell(), 0..12),
        zone in arb_zone(),
        offset_secs in -400i64 * 86_400..800 * 86_400,
    ) {
        let plan = ShiftPlan::default();
        let offset = TimeDelta::seconds(offset_secs);
        let mut data = dataset(&departures, &bookings, zone);
        let before_book = instants(&data, "bookings", "book_date");
        let before_dep = instants(&data, "flights", "scheduled_departure");

        apply_offset(&mut data, &plan, offset).unwrap();

        let after_book = instants(&data, "bookings", "book_date");
        let after_dep = instants(&data, "flights", "scheduled_departure");

        for (before, after) in before_book.iter().zip(&after_book).chain(before_dep.iter().zip(&after_dep)) {
            match (before, after) {
                (Some(b), Some(a)) => prop_assert_eq!(*a - *b, offset),
                (None, None) => {}
                other => prop_assert!(false, "missing-ness changed: {:?}", other),
            }
        }
    }

    #[test]
    fn latest_reference_value_lands_on_now(
        departures in prop::collection::vec(arb_cell(), 1..12),
        zone in arb_zone(),
        now_secs in 0i64..4_000_000_000,
        convert in any::<bool>(),
    ) {
        prop_assume!(departures.iter().any(Option::is_some));
        let plan = ShiftPlan::default();
        let policy = if convert { AnchorPolicy::Convert } else { AnchorPolicy::Localize };
        let now = Utc.timestamp_opt(now_secs, 0).unwrap();
        let mut data = dataset(&departures, &[], zone);

        let computation = compute_offset(&data, &plan, policy, now).unwrap();
        apply_offset(&mut data, &plan, computation.offset).unwrap();

        let latest = instants(&data, "flights", "actual_departure")
            .into_iter()
            .flatten()
            .max()
            .unwrap();
        prop_assert_eq!(latest, computation.current_time.with_timezone(&Utc));
        if convert {
            prop_assert_eq!(latest, now);
        }
    }

    #[test]
    fn formatted_instants_parse_back_exactly(secs in -2_000_000_000i64..4_000_000_000, nanos in 0u32..1_000_000_000) {
        let instant = Utc.timestamp_opt(secs, nanos).unwrap();
        prop_assert_eq!(Timestamp::parse(&format_utc(instant)).unwrap().to_utc(), instant);
    }

    #[test]
    fn parsed_instants_stay_near_four_digit_years(
        text in "[+-]?[0-9]{1,6}-[0-9]{2}-[0-9]{2}( [0-9]{2}:[0-9]{2}:[0-9]{2})?([+-][0-9]{2}:[0-9]{2})?",
    ) {
        if let Some(ts) = Timestamp::parse(&text) {
            prop_assert!((-1..=10_000).contains(&ts.to_utc().year()), "{text}");
            prop_assert!(text.as_bytes()[..4].iter().all(u8::is_ascii_digit));
        }
    }
}
