//! CLI `doctor` command: run database diagnostics and print a health report.

use anyhow::{Context, Result};

use ember::config::EmberConfig;
use ember::db;

/// Run database diagnostics and print a health report.
pub fn doctor(config: &EmberConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run `ember poll` or `ember med add` to initialize.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path)
        .map(|m| m.len())
        .unwrap_or(0);

    let conn = db::open_database(&db_path)
        .context("failed to open database (may be corrupt)")?;

    let report = db::check_database_health(&conn)
        .context("failed to run health check")?;

    println!("Ember Health Report");
    println!("===================");
    println!();
    println!("Database:          {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);
    println!("Time basis:        {}", config.reminder.time_basis);
    println!("Medication source: {}", config.reminder.medications_url);
    println!();
    println!("Row counts:");
    println!("  Scheduled meds:  {}", report.schedule_count);
    println!("  Alerts:          {}", report.alert_count);
    println!("  Dose log:        {}", report.log_count);
    println!();
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
        println!();
        println!("Recovery: restore the database file from a backup, or move it aside");
        println!("and let Ember create a fresh one (alert history will be lost).");
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
