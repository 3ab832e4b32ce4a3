// THEORY:
// The wire layer turns reveal events into JSON lines. Each object carries an
// OSC-style address (`/reveal/cell/<col>/<row>`), so a bridge to an OSC or WebSocket
// endpoint can route on the address without parsing the rest.

use motion_reveal::RevealEvent;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct WireEvent {
    pub address: String,
    pub col: u32,
    pub row: u32,
    pub brightness: f64,
    pub normalized_brightness: f64,
    pub timestamp_millis: u64,
}

impl From<&RevealEvent> for WireEvent {
    fn from(event: &RevealEvent) -> Self {
        Self {
            address: format!("/reveal/cell/{}/{}", event.col, event.row),
            col: event.col,
            row: event.row,
            brightness: event.brightness,
            normalized_brightness: event.normalized_brightness(),
            timestamp_millis: event.timestamp_millis,
        }
    }
}

pub fn encode(event: &RevealEvent) -> serde_json::Result<String> {
    serde_json::to_string(&WireEvent::from(event))
}
