// THEORY:
// A `RevealEvent` is raised exactly once when a cell flips from hidden to revealed.
// The engine never knows how an event leaves the process. It hands each event to
// every registered `RevealSink` on the driving thread; a sink may forward it to a
// channel, a closure, a network encoder or a plain `Vec`.

use tokio::sync::mpsc;

/// Raised exactly once when a cell flips from hidden to revealed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RevealEvent {
    pub col: u32,
    pub row: u32,
    /// Mean luminance (0..=255) of the cell's reference-image segment.
    pub brightness: f64,
    /// Milliseconds since the UNIX epoch.
    pub timestamp_millis: u64,
}

impl RevealEvent {
    /// Brightness scaled to 0.0..=1.0.
    pub fn normalized_brightness(&self) -> f64 {
        self.brightness / 255.0
    }
}

/// Receives reveal events as they are produced.
pub trait RevealSink: Send {
    fn on_reveal(&mut self, event: &RevealEvent);
}

/// Closure-based sink for simple cases.
pub struct FnSink<F: FnMut(&RevealEvent) + Send>(pub F);

impl<F: FnMut(&RevealEvent) + Send> RevealSink for FnSink<F> {
    fn on_reveal(&mut self, event: &RevealEvent) {
        (self.0)(event)
    }
}

/// Collects events in memory.
impl RevealSink for Vec<RevealEvent> {
    fn on_reveal(&mut self, event: &RevealEvent) {
        self.push(event.clone());
    }
}

/// Forwards events to an async consumer. Sending never blocks the tick; once the
/// receiver is dropped, events are discarded.
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<RevealEvent>,
}

impl ChannelSink {
    pub fn new(sender: mpsc::UnboundedSender<RevealEvent>) -> Self {
        Self { sender }
    }

    /// A sink plus the receiver transport code should drain.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<RevealEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl RevealSink for ChannelSink {
    fn on_reveal(&mut self, event: &RevealEvent) {
        let _ = self.sender.send(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(col: u32, row: u32) -> RevealEvent {
        RevealEvent {
            col,
            row,
            brightness: 127.5,
            timestamp_millis: 42,
        }
    }

    #[test]
    fn normalizes_brightness() {
        assert_eq!(event(0, 0).normalized_brightness(), 0.5);
    }

    #[test]
    fn fn_sink_calls_closure() {
        let mut seen = Vec::new();
        {
            let mut sink = FnSink(|e: &RevealEvent| seen.push((e.col, e.row)));
            sink.on_reveal(&event(1, 2));
        }
        assert_eq!(seen, vec![(1, 2)]);
    }

    #[tokio::test]
    async fn channel_sink_delivers_to_receiver() {
        let (mut sink, mut receiver) = ChannelSink::channel();
        sink.on_reveal(&event(3, 4));
        drop(sink);
        assert_eq!(receiver.recv().await, Some(event(3, 4)));
        assert_eq!(receiver.recv().await, None);
    }

    #[test]
    fn channel_sink_survives_dropped_receiver() {
        let (mut sink, receiver) = ChannelSink::channel();
        drop(receiver);
        sink.on_reveal(&event(0, 0));
    }
}
