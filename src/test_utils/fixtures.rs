use std::path::{Path, PathBuf};

use rusqlite::{Connection, params};
use tempfile::TempDir;

use crate::error::Result;
use crate::storage::SnapshotStore;

/// Schema of the travel snapshot, trimmed to the tables the assistant reads.
pub const TRAVEL_SCHEMA: &str = r"
CREATE TABLE bookings (
    book_ref TEXT PRIMARY KEY,
    book_date TIMESTAMP,
    total_amount REAL
);
CREATE TABLE flights (
    flight_id INTEGER PRIMARY KEY,
    flight_no TEXT NOT NULL,
    scheduled_departure TIMESTAMP,
    scheduled_arrival TIMESTAMP,
    departure_airport TEXT,
    arrival_airport TEXT,
    status TEXT,
    actual_departure TIMESTAMP,
    actual_arrival TIMESTAMP
);
CREATE INDEX flights_flight_no ON flights (flight_no);
CREATE TABLE tickets (
    ticket_no TEXT PRIMARY KEY,
    book_ref TEXT,
    passenger_id TEXT
);
CREATE TABLE boarding_passes (
    ticket_no TEXT,
    flight_id INTEGER,
    seat_no TEXT,
    boarding_no INTEGER,
    barcode BLOB
);
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightRow {
    pub flight_id: i64,
    pub flight_no: String,
    pub scheduled_departure: String,
    pub scheduled_arrival: String,
    pub actual_departure: String,
    pub actual_arrival: String,
}

impl FlightRow {
    /// A flight that left and landed on schedule.
    pub fn on_time(flight_id: i64, departure: &str, arrival: &str) -> Self {
        Self {
            flight_id,
            flight_no: format!("LX{flight_id:04}"),
            scheduled_departure: departure.to_string(),
            scheduled_arrival: arrival.to_string(),
            actual_departure: departure.to_string(),
            actual_arrival: arrival.to_string(),
        }
    }

    /// A scheduled flight that has not departed yet.
    pub fn scheduled(flight_id: i64, departure: &str, arrival: &str) -> Self {
        Self {
            actual_departure: "\\N".to_string(),
            actual_arrival: "\\N".to_string(),
            ..Self::on_time(flight_id, departure, arrival)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRow {
    pub book_ref: String,
    pub book_date: String,
}

impl BookingRow {
    pub fn new(book_ref: &str, book_date: &str) -> Self {
        Self {
            book_ref: book_ref.to_string(),
            book_date: book_date.to_string(),
        }
    }
}

/// Create a travel snapshot at `path` holding `flights` and `bookings`, plus
/// one ticket and boarding pass per booking.
pub fn write_travel_db(path: &Path, flights: &[FlightRow], bookings: &[BookingRow]) -> Result<()> {
    let mut conn = Connection::open(path)?;
    conn.execute_batch(TRAVEL_SCHEMA)?;
    let tx = conn.transaction()?;
    {
        let mut insert = tx.prepare(
            "INSERT INTO flights (flight_id, flight_no, scheduled_departure, scheduled_arrival, \
             departure_airport, arrival_airport, status, actual_departure, actual_arrival) \
             VALUES (?1, ?2, ?3, ?4, 'BSL', 'ZRH', 'Arrived', ?5, ?6)",
        )?;
        for f in flights {
            insert.execute(params![
                f.flight_id,
                f.flight_no,
                f.scheduled_departure,
                f.scheduled_arrival,
                f.actual_departure,
                f.actual_arrival
            ])?;
        }
    }
    {
        let mut booking = tx.prepare("INSERT INTO bookings VALUES (?1, ?2, ?3)")?;
        let mut ticket = tx.prepare("INSERT INTO tickets VALUES (?1, ?2, ?3)")?;
        let mut pass = tx.prepare("INSERT INTO boarding_passes VALUES (?1, ?2, ?3, ?4, ?5)")?;
        for (i, b) in bookings.iter().enumerate() {
            let n = i64::try_from(i).unwrap_or(i64::MAX);
            let ticket_no = format!("T{n:06}");
            booking.execute(params![b.book_ref, b.book_date, 1250.5_f64])?;
            ticket.execute(params![ticket_no, b.book_ref, format!("P{n:04} 123456")])?;
            let flight_id = flights.first().map_or(0, |f| f.flight_id);
            pass.execute(params![ticket_no, flight_id, "12A", n + 1, vec![0xde_u8, 0xad, 0xbe, 0xef]])?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// A pristine backup and a working path in an isolated temp directory.
pub struct TravelSnapshot {
    pub temp_dir: TempDir,
    pub working_path: PathBuf,
    pub backup_path: PathBuf,
}

impl TravelSnapshot {
    /// Backup seeded with the given rows; the working copy does not exist
    /// until a restore.
    pub fn new(flights: &[FlightRow], bookings: &[BookingRow]) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let working_path = temp_dir.path().join("travel2.sqlite");
        let backup_path = temp_dir.path().join("travel2.backup.sqlite");
        write_travel_db(&backup_path, flights, bookings)?;
        Ok(Self {
            temp_dir,
            working_path,
            backup_path,
        })
    }

    /// The two-row scenario: one flight at `2024-01-01T10:00:00+00:00` and a
    /// booking made seven days before it.
    pub fn basic() -> Result<Self> {
        Self::new(
            &[FlightRow::on_time(
                1,
                "2024-01-01T10:00:00+00:00",
                "2024-01-01T11:05:00+00:00",
            )],
            &[BookingRow::new("00A1B2", "2023-12-25T08:00:00+00:00")],
        )
    }

    /// A mix of departed and scheduled flights in `-04:00`, sentinels
    /// included, with several bookings.
    pub fn sample() -> Result<Self> {
        Self::new(
            &[
                FlightRow::on_time(1, "2024-04-28 09:45:00.000000-04:00", "2024-04-28 11:20:00.000000-04:00"),
                FlightRow::on_time(2, "2024-04-30 18:00:00.000000-04:00", "2024-04-30 21:35:00.000000-04:00"),
                FlightRow::scheduled(3, "2024-05-02 07:15:00.000000-04:00", "2024-05-02 08:40:00.000000-04:00"),
                FlightRow::scheduled(4, "2024-05-05 13:00:00.000000-04:00", "2024-05-05 16:10:00.000000-04:00"),
            ],
            &[
                BookingRow::new("0A1B2C", "2024-04-01 12:30:00.000000-04:00"),
                BookingRow::new("1B2C3D", "2024-04-20 08:05:10.250000-04:00"),
                BookingRow::new("2C3D4E", "\\N"),
                BookingRow::new("3D4E5F", "2024-04-29 23:59:59.999999-04:00"),
            ],
        )
    }

    pub fn store(&self) -> SnapshotStore {
        SnapshotStore::new(&self.working_path, &self.backup_path)
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }
}
