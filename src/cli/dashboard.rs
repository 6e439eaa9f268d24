//! CLI `dashboard` command: terminal view of schedule, due list and alert history.

use anyhow::Result;

use ember::config::EmberConfig;
use ember::reminder::clock::Clock;
use ember::reminder::due::check_due;
use ember::reminder::source::{HttpMedicationSource, MedicationSource};
use ember::reminder::{alerts, schedule};

use super::short_stamp;

/// Print the schedule, what is due right now, and the latest alerts.
pub async fn dashboard(config: &EmberConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = ember::db::open_database(&db_path)?;
    let clock = Clock::system(config.reminder.time_basis);

    println!("Medication Tracker");
    println!("{}", "=".repeat(40));
    println!();

    println!("Schedule:");
    let meds = schedule::list_schedule(&conn)?;
    if meds.is_empty() {
        println!("  (empty) add one with `ember med add <name> <dosage> <frequency>`");
    }
    for med in &meds {
        println!(
            "  {:<20} {:<12} {:<16} last taken: {}",
            med.name,
            med.dosage,
            med.frequency,
            med.last_taken.as_deref().unwrap_or("never")
        );
    }
    println!();

    println!("Due Now:");
    let source = HttpMedicationSource::from_config(&config.reminder)?;
    match source.fetch_medications().await {
        Ok(live) => {
            let mut any = false;
            for med in &live {
                match check_due(med.last_taken.as_deref(), &med.frequency, &clock) {
                    Ok(true) => {
                        any = true;
                        println!("  ! {} ({}) is due now!", med.name, med.dosage);
                    }
                    Ok(false) => {}
                    Err(e) => println!("  ? {}: {e}", med.name),
                }
            }
            if !any {
                println!("  nothing due");
            }
        }
        Err(e) => println!("  Error fetching medications from {}: {e:#}", source.describe()),
    }
    println!();

    println!("Missed Alerts History:");
    let history = alerts::recent_alerts(&conn, config.reminder.history_limit)?;
    if history.is_empty() {
        println!("  none");
    }
    for alert in &history {
        println!("  [{}] {}", short_stamp(alert.timestamp), alert.message);
    }

    Ok(())
}
