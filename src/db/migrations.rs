//! Forward-only schema migration framework.
//!
//! Tracks the schema version in `schema_meta` and runs sequential migrations
//! to bring the database up to [`CURRENT_SCHEMA_VERSION`].

use rusqlite::Connection;

/// The schema version that the current binary expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Get the current schema version from the database.
pub fn get_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = 'schema_version'",
        [],
        |row| {
            let val: String = row.get(0)?;
            Ok(val.parse::<u32>().unwrap_or(0))
        },
    )
}

/// Update the stored schema version.
fn update_schema_version(conn: &Connection, version: u32) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE schema_meta SET value = ?1 WHERE key = 'schema_version'",
        [version.to_string()],
    )?;
    Ok(())
}

/// Run any pending forward-only migrations. Each migration runs in a transaction.
pub fn run_migrations(conn: &Connection) -> rusqlite::Result<()> {
    let mut version = get_schema_version(conn)?;
    tracing::debug!(schema_version = version, target = CURRENT_SCHEMA_VERSION, "checking migrations");

    while version < CURRENT_SCHEMA_VERSION {
        let next = version + 1;
        tracing::info!(from = version, to = next, "running migration");

        let tx = conn.unchecked_transaction()?;
        match next {
            2 => migrate_v1_to_v2(&tx)?,
            _ => {
                tracing::error!(version = next, "unknown migration target");
                break;
            }
        }
        update_schema_version(&tx, next)?;
        tx.commit()?;

        version = next;
    }

    Ok(())
}

/// Migration v1 → v2: make `(name, date)` unique on `alerts`.
///
/// Databases written before the constraint may already hold same-day
/// duplicates from racing pollers; the oldest row of each pair survives.
fn migrate_v1_to_v2(conn: &Connection) -> rusqlite::Result<()> {
    let removed = conn.execute(
        "DELETE FROM alerts WHERE id NOT IN (SELECT MIN(id) FROM alerts GROUP BY name, date)",
        [],
    )?;
    if removed > 0 {
        tracing::warn!(removed, "collapsed duplicate same-day alerts");
    }
    conn.execute_batch(
        "DROP INDEX IF EXISTS idx_alerts_name_date;
         CREATE UNIQUE INDEX IF NOT EXISTS idx_alerts_name_date_unique ON alerts(name, date);",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "foreign_keys", "ON").unwrap();
        crate::db::schema::init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn get_schema_version_returns_1_on_fresh_db() {
        let conn = test_db();
        assert_eq!(get_schema_version(&conn).unwrap(), 1);
    }

    #[test]
    fn run_migrations_upgrades_to_current() {
        let conn = test_db();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn migration_v1_to_v2_collapses_duplicates() {
        let conn = test_db();
        for ts in ["2024-01-01T08:00:00.000000", "2024-01-01T09:00:00.000000"] {
            conn.execute(
                "INSERT INTO alerts (name, message, timestamp, date) VALUES ('Aspirin', 'Aspirin (100mg) is due!', ?1, '2024-01-01T00:00:00.000000')",
                [ts],
            )
            .unwrap();
        }

        run_migrations(&conn).unwrap();

        let (count, earliest): (i64, String) = conn
            .query_row("SELECT COUNT(*), MIN(timestamp) FROM alerts", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(earliest, "2024-01-01T08:00:00.000000");
    }

    #[test]
    fn unique_index_rejects_same_day_duplicate() {
        let conn = test_db();
        run_migrations(&conn).unwrap();

        let insert = "INSERT INTO alerts (name, message, timestamp, date) VALUES ('Aspirin', 'm', 't', '2024-01-01T00:00:00.000000')";
        conn.execute(insert, []).unwrap();
        assert!(conn.execute(insert, []).is_err());
    }

    #[test]
    fn migrations_are_idempotent() {
        let conn = test_db();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap(); // second call should not error
        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
    }
}
