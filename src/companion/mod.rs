//! Conversational companion for caregivers: location questions answered from
//! geolocation, everything else from a chat model.

pub mod geo;
pub mod llm;
pub mod prompt;
pub mod responder;

use anyhow::Result;

use crate::config::CompanionConfig;
use geo::HttpGeolocator;
use llm::GeminiChat;
use responder::Companion;

/// Build the companion wired to the configured HTTP services.
pub fn create_companion(config: &CompanionConfig) -> Result<Companion<HttpGeolocator, GeminiChat>> {
    let geo = HttpGeolocator::from_config(config)?;
    let model = GeminiChat::from_config(config)?;
    if config.api_key.is_empty() {
        tracing::warn!("no GEMINI_API_KEY configured; only location questions will be answered");
    }
    Ok(Companion::new(geo, model, config.fallback_location.clone()))
}
