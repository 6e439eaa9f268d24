#![allow(dead_code)]

use anyhow::{bail, Result};
use chrono::NaiveDateTime;
use ember::db;
use ember::reminder::clock::{Clock, TimeBasis};
use ember::reminder::source::MedicationSource;
use ember::reminder::types::Medication;
use rusqlite::Connection;

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.pragma_update(None, "foreign_keys", "ON").unwrap();
    db::schema::init_schema(&conn).unwrap();
    db::migrations::run_migrations(&conn).unwrap();
    conn
}

/// Parse `YYYY-MM-DDTHH:MM:SS`.
pub fn at(text: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S").unwrap()
}

/// A clock pinned to `text`, in the local basis the reminder defaults to.
pub fn clock_at(text: &str) -> Clock {
    Clock::fixed(TimeBasis::Local, at(text))
}

pub fn med(name: &str, dosage: &str, frequency: &str, last_taken: Option<&str>) -> Medication {
    Medication {
        name: name.into(),
        dosage: dosage.into(),
        frequency: frequency.into(),
        last_taken: last_taken.map(str::to_string),
    }
}

/// A medication source returning a fixed list.
pub struct StaticSource(pub Vec<Medication>);

impl MedicationSource for StaticSource {
    async fn fetch_medications(&self) -> Result<Vec<Medication>> {
        Ok(self.0.clone())
    }

    fn describe(&self) -> String {
        "static".into()
    }
}

/// A medication source that is always down.
pub struct DownSource;

impl MedicationSource for DownSource {
    async fn fetch_medications(&self) -> Result<Vec<Medication>> {
        bail!("connection refused")
    }

    fn describe(&self) -> String {
        "down".into()
    }
}

/// Serve `app` on an ephemeral local port. Returns the base URL.
pub async fn spawn_app(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

pub fn alert_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM alerts", [], |row| row.get(0))
        .unwrap()
}
