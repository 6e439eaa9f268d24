//! One conversational turn.
//!
//! Messages mentioning "location" are answered from geolocation alone;
//! everything else goes to the chat model with the date and a best-effort
//! place as context. Per-conversation state lives in a [`Session`] owned by
//! the caller.

use super::geo::{DeviceLocation, Geolocator};
use super::llm::ChatModel;
use super::prompt::compose_prompt;
use crate::reminder::clock::Clock;

/// Reply used when the chat model cannot be reached.
pub const MODEL_UNAVAILABLE_REPLY: &str =
    "I'm having a little trouble finding my words right now. Please try again in a moment.";

/// State carried across turns of one conversation.
#[derive(Debug, Default, Clone)]
pub struct Session {
    turns: u64,
    last_response: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of turns that produced a reply.
    pub fn turns(&self) -> u64 {
        self.turns
    }

    pub fn last_response(&self) -> Option<&str> {
        self.last_response.as_deref()
    }
}

pub struct Companion<G, M> {
    geo: G,
    model: M,
    fallback_location: String,
}

impl<G: Geolocator, M: ChatModel> Companion<G, M> {
    pub fn new(geo: G, model: M, fallback_location: impl Into<String>) -> Self {
        Self {
            geo,
            model,
            fallback_location: fallback_location.into(),
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Answer one message. Blank input yields `None` and leaves the session
    /// untouched.
    pub async fn respond(
        &self,
        session: &mut Session,
        input: &str,
        device: DeviceLocation,
        clock: &Clock,
    ) -> Option<String> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        let reply = if input.to_lowercase().contains("location") {
            self.describe_location(device).await
        } else {
            self.gentle_reply(input, clock).await
        };

        session.turns += 1;
        session.last_response = Some(reply.clone());
        Some(reply)
    }

    async fn describe_location(&self, device: DeviceLocation) -> String {
        match device {
            DeviceLocation::Denied => "Location access was denied or unavailable.".to_string(),
            DeviceLocation::At(coords) => {
                if let Some(address) = self.geo.reverse_geocode(coords).await {
                    return format!("You are at: **{address}**");
                }
                match self.geo.ip_place().await {
                    Some(place) => format!(
                        "I couldn't fetch the full address, but you are likely in **{place}**."
                    ),
                    None => "Sorry, I'm unable to determine your location right now.".to_string(),
                }
            }
            DeviceLocation::NoFix => match self.geo.ip_place().await {
                Some(place) => format!("You might be in **{place}**."),
                None => "Sorry, I couldn't get your coordinates.".to_string(),
            },
        }
    }

    async fn gentle_reply(&self, input: &str, clock: &Clock) -> String {
        let location = match self.geo.context_place().await {
            Some(place) => place.to_string(),
            None => self.fallback_location.clone(),
        };
        let prompt = compose_prompt(input, clock.now().date(), &location);

        match self.model.reply(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "chat model unavailable");
                MODEL_UNAVAILABLE_REPLY.to_string()
            }
        }
    }
}
