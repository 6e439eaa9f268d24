mod helpers;

use std::sync::Mutex;

use helpers::clock_at;
use ember::companion::geo::{Coordinates, DeviceLocation, Geolocator, IpPlace};
use ember::companion::llm::{ChatModel, LlmError};
use ember::companion::responder::{Companion, Session, MODEL_UNAVAILABLE_REPLY};

#[derive(Default)]
struct FakeGeo {
    address: Option<String>,
    ip: Option<IpPlace>,
    context: Option<IpPlace>,
}

impl Geolocator for FakeGeo {
    async fn reverse_geocode(&self, _at: Coordinates) -> Option<String> {
        self.address.clone()
    }

    async fn ip_place(&self) -> Option<IpPlace> {
        self.ip.clone()
    }

    async fn context_place(&self) -> Option<IpPlace> {
        self.context.clone()
    }
}

/// Echoes a canned reply and remembers the last prompt.
struct FakeModel {
    reply: Option<String>,
    last_prompt: Mutex<Option<String>>,
}

impl FakeModel {
    fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            last_prompt: Mutex::new(None),
        }
    }

    fn broken() -> Self {
        Self {
            reply: None,
            last_prompt: Mutex::new(None),
        }
    }
}

impl ChatModel for FakeModel {
    async fn reply(&self, prompt: &str) -> Result<String, LlmError> {
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        self.reply.clone().ok_or(LlmError::EmptyReply)
    }
}

fn place(city: &str, region: &str) -> Option<IpPlace> {
    Some(IpPlace {
        city: city.into(),
        region: Some(region.into()),
    })
}

const HOME: Coordinates = Coordinates {
    latitude: 51.5,
    longitude: -0.12,
};

async fn ask(geo: FakeGeo, device: DeviceLocation) -> String {
    let companion = Companion::new(geo, FakeModel::replying("unused"), "your cozy place");
    let mut session = Session::new();
    companion
        .respond(&mut session, "What is my LOCATION?", device, &clock_at("2024-01-01T10:00:00"))
        .await
        .unwrap()
}

#[tokio::test]
async fn location_with_address() {
    let geo = FakeGeo {
        address: Some("221B Baker Street, London".into()),
        ..Default::default()
    };
    assert_eq!(
        ask(geo, DeviceLocation::At(HOME)).await,
        "You are at: **221B Baker Street, London**"
    );
}

#[tokio::test]
async fn location_falls_back_to_ip_when_geocoding_fails() {
    let geo = FakeGeo {
        ip: place("London", "England"),
        ..Default::default()
    };
    assert_eq!(
        ask(geo, DeviceLocation::At(HOME)).await,
        "I couldn't fetch the full address, but you are likely in **London, England**."
    );
}

#[tokio::test]
async fn location_total_failure_with_coordinates() {
    assert_eq!(
        ask(FakeGeo::default(), DeviceLocation::At(HOME)).await,
        "Sorry, I'm unable to determine your location right now."
    );
}

#[tokio::test]
async fn location_without_fix_uses_ip() {
    let geo = FakeGeo {
        ip: place("Austin", "Texas"),
        ..Default::default()
    };
    assert_eq!(
        ask(geo, DeviceLocation::NoFix).await,
        "You might be in **Austin, Texas**."
    );
    assert_eq!(
        ask(FakeGeo::default(), DeviceLocation::NoFix).await,
        "Sorry, I couldn't get your coordinates."
    );
}

#[tokio::test]
async fn location_denied() {
    let geo = FakeGeo {
        address: Some("ignored".into()),
        ip: place("Austin", "Texas"),
        ..Default::default()
    };
    assert_eq!(
        ask(geo, DeviceLocation::Denied).await,
        "Location access was denied or unavailable."
    );
}

#[tokio::test]
async fn other_messages_go_to_the_model_with_context() {
    let geo = FakeGeo {
        context: place("Leeds", "England"),
        ..Default::default()
    };
    let companion = Companion::new(geo, FakeModel::replying("That is very common."), "your cozy place");
    let mut session = Session::new();

    let reply = companion
        .respond(
            &mut session,
            "  Is it normal that she forgets my name?  ",
            DeviceLocation::NoFix,
            &clock_at("2024-01-01T10:00:00"),
        )
        .await;

    assert_eq!(reply.as_deref(), Some("That is very common."));
    assert_eq!(session.turns(), 1);
    assert_eq!(session.last_response(), Some("That is very common."));

    let prompt = sent_prompt(&companion);
    assert!(prompt.contains("you are in Leeds, England."));
    assert!(prompt.contains("User: Is it normal that she forgets my name?"));
}

#[tokio::test]
async fn prompt_falls_back_to_cozy_place() {
    let model = FakeModel::replying("ok");
    let companion = Companion::new(FakeGeo::default(), model, "your cozy place");
    let mut session = Session::new();

    companion
        .respond(&mut session, "hello", DeviceLocation::NoFix, &clock_at("2024-03-15T10:00:00"))
        .await;

    let prompt = sent_prompt(&companion);
    assert!(prompt.starts_with("Today is Friday, March 15, and you are in your cozy place."));
    assert!(prompt.trim_end().ends_with("User: hello"));
}

fn sent_prompt(companion: &Companion<FakeGeo, FakeModel>) -> String {
    companion.model().last_prompt.lock().unwrap().clone().unwrap()
}

#[tokio::test]
async fn model_failure_gives_fallback_reply() {
    let companion = Companion::new(FakeGeo::default(), FakeModel::broken(), "your cozy place");
    let mut session = Session::new();

    let reply = companion
        .respond(&mut session, "hello", DeviceLocation::NoFix, &clock_at("2024-01-01T10:00:00"))
        .await;

    assert_eq!(reply.as_deref(), Some(MODEL_UNAVAILABLE_REPLY));
}

#[tokio::test]
async fn blank_input_is_ignored() {
    let companion = Companion::new(FakeGeo::default(), FakeModel::replying("hi"), "your cozy place");
    let mut session = Session::new();

    let reply = companion
        .respond(&mut session, "   ", DeviceLocation::NoFix, &clock_at("2024-01-01T10:00:00"))
        .await;

    assert!(reply.is_none());
    assert_eq!(session.turns(), 0);
    assert!(session.last_response().is_none());
}

#[tokio::test]
async fn sessions_are_independent() {
    let companion = Companion::new(FakeGeo::default(), FakeModel::replying("hi"), "your cozy place");
    let clock = clock_at("2024-01-01T10:00:00");
    let mut first = Session::new();
    let mut second = Session::new();

    companion.respond(&mut first, "one", DeviceLocation::NoFix, &clock).await;
    companion.respond(&mut first, "two", DeviceLocation::NoFix, &clock).await;
    companion.respond(&mut second, "three", DeviceLocation::NoFix, &clock).await;

    assert_eq!(first.turns(), 2);
    assert_eq!(second.turns(), 1);
}
