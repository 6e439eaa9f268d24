//! CLI `med` commands: manage the medication schedule and record doses.

use anyhow::{bail, Result};

use ember::config::EmberConfig;
use ember::reminder::clock::Clock;
use ember::reminder::schedule;

use super::short_stamp;

pub fn add(
    config: &EmberConfig,
    name: &str,
    dosage: &str,
    frequency: &str,
    last_taken: Option<&str>,
) -> Result<()> {
    let conn = ember::db::open_database(config.resolved_db_path())?;
    let clock = Clock::system(config.reminder.time_basis);

    let med = schedule::add_medication(&conn, name, dosage, frequency, last_taken, &clock)?;
    println!("Added {} ({}), id {}", med.name, med.dosage, med.id);
    Ok(())
}

pub fn list(config: &EmberConfig) -> Result<()> {
    let conn = ember::db::open_database(config.resolved_db_path())?;

    let meds = schedule::list_schedule(&conn)?;
    if meds.is_empty() {
        println!("No medications scheduled.");
        return Ok(());
    }
    for med in &meds {
        println!("{}", med.id);
        println!("  {} ({}), {}", med.name, med.dosage, med.frequency);
        println!(
            "  last taken: {}",
            med.last_taken.as_deref().unwrap_or("never")
        );
    }
    Ok(())
}

pub fn remove(config: &EmberConfig, id: &str) -> Result<()> {
    let conn = ember::db::open_database(config.resolved_db_path())?;
    if !schedule::remove_medication(&conn, id)? {
        bail!("medication not found: {id}");
    }
    println!("Removed {id}");
    Ok(())
}

/// Record a dose taken now.
pub fn taken(config: &EmberConfig, id: &str) -> Result<()> {
    let mut conn = ember::db::open_database(config.resolved_db_path())?;
    let clock = Clock::system(config.reminder.time_basis);

    match schedule::log_dose_taken(&mut conn, id, &clock)? {
        Some(log) => println!("Recorded: {} taken [{}]", log.name, short_stamp(log.timestamp)),
        None => bail!("medication not found: {id}"),
    }
    Ok(())
}
