//! Caregiver support tools.
//!
//! Ember bundles two independent flows that share nothing but a config file:
//!
//! | Flow | Entry point | Collaborators |
//! |------|-------------|---------------|
//! | **Medication reminder** | `ember poll` | medication source (HTTP JSON), SQLite alert store |
//! | **Companion** | `ember chat` | chat model (Gemini), reverse geocoding, IP geolocation |
//!
//! The reminder's rule: a medication is due once the time since it was last
//! taken reaches its frequency threshold (24h for "daily", 12h for "twice",
//! 8h otherwise), and each medication gets at most one alert per calendar day.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: SQLite database initialization, schema, migrations, and health checks
//! - [`reminder`]: Due-check rule, alert dedup, schedule store, and the poll cycle
//! - [`companion`]: Conversational companion with geolocation fallbacks
//! - [`server`]: HTTP dashboard API and medication source

pub mod companion;
pub mod config;
pub mod db;
pub mod reminder;
pub mod server;
