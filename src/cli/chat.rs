//! CLI `chat` command: line-based companion conversation.

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use ember::companion::create_companion;
use ember::companion::geo::{Coordinates, DeviceLocation};
use ember::companion::responder::Session;
use ember::config::EmberConfig;
use ember::reminder::clock::Clock;

/// Map CLI flags to the device location state for every turn.
pub fn device_location(lat: Option<f64>, lon: Option<f64>, no_location: bool) -> DeviceLocation {
    if no_location {
        return DeviceLocation::Denied;
    }
    match (lat, lon) {
        (Some(latitude), Some(longitude)) => DeviceLocation::At(Coordinates {
            latitude,
            longitude,
        }),
        _ => DeviceLocation::NoFix,
    }
}

/// Answer `message` once, or run a REPL over stdin until EOF.
pub async fn chat(config: &EmberConfig, device: DeviceLocation, message: Option<&str>) -> Result<()> {
    let companion = create_companion(&config.companion)?;
    let basis = config.reminder.time_basis;
    let mut session = Session::new();

    if let Some(message) = message {
        let clock = Clock::system(basis);
        if let Some(reply) = companion.respond(&mut session, message, device, &clock).await {
            println!("{reply}");
        }
        return Ok(());
    }

    println!("Memory Companion (Ctrl-D to leave)");
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"\nYou: ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let clock = Clock::system(basis);
        if let Some(reply) = companion.respond(&mut session, &line, device, &clock).await {
            println!("Companion: {reply}");
        }
    }

    tracing::debug!(turns = session.turns(), "chat ended");
    println!();
    Ok(())
}
