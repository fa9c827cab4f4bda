use chrono::Local;
use weatherpins_core::{AppState, Location, Message};

pub fn temperature(value: Option<f64>) -> String {
    match value {
        Some(t) => format!("{t:.1}°C"),
        None => "--".to_string(),
    }
}

pub fn location_line(location: &Location) -> String {
    let updated = location
        .timestamp
        .map(|ts| ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "never".to_string());

    format!(
        "{id}  {address} ({lat:.4}, {lon:.4})  {user} <{email}>  {temp}  updated {updated}",
        id = location.id,
        address = location.address,
        lat = location.latitude,
        lon = location.longitude,
        user = location.username,
        email = location.email,
        temp = temperature(location.current_temp),
    )
}

pub fn locations_text(state: &AppState) -> String {
    if state.locations.is_empty() {
        return "No saved locations.".to_string();
    }

    state.locations.iter().map(location_line).collect::<Vec<_>>().join("\n")
}

pub fn locations(state: &AppState) {
    println!("{}", locations_text(state));
}

/// Listing to show after a one-shot command. Nothing when the command failed,
/// since the list was never loaded from the store.
pub fn listing_after_action(state: &AppState) -> Option<String> {
    match &state.message {
        Some(msg) if msg.is_error() => None,
        _ => Some(locations_text(state)),
    }
}

pub fn message(state: &AppState) {
    match &state.message {
        Some(Message::Success(text)) => println!("✔ {text}"),
        Some(Message::Error(text)) => eprintln!("✘ {text}"),
        None => {}
    }
}
