//! CLI `poll` command: run one reminder cycle.

use anyhow::Result;

use ember::config::EmberConfig;
use ember::reminder::clock::Clock;
use ember::reminder::poller::check_and_alert;
use ember::reminder::source::HttpMedicationSource;

/// Fetch medications, log alerts for the ones due, and print a summary.
pub async fn poll(config: &EmberConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let mut conn = ember::db::open_database(&db_path)?;

    let source = HttpMedicationSource::from_config(&config.reminder)?;
    let clock = Clock::system(config.reminder.time_basis);

    let report = check_and_alert(&mut conn, &source, &clock).await?;

    for alert in &report.created {
        println!("Alert logged: {}", alert.message);
    }
    for (name, value) in &report.malformed {
        println!("Invalid date format for {name}: {value}");
    }
    println!(
        "Checked {} medications: {} due, {} new alerts, {} already alerted today.",
        report.checked,
        report.due,
        report.created.len(),
        report.already_alerted
    );

    Ok(())
}
