//! Event sinks for registry notifications
//!
//! Delivery is fire-and-forget: a sink must never block the registry and
//! must never call back into it.

#[cfg(test)]
use std::sync::{Mutex, PoisonError};
use tokio::sync::broadcast;
use vitals_hud_core::{EventSink, HudEvent};

/// Default buffer for `BroadcastSink` subscribers
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Logs every event, stats updates at trace level
#[derive(Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: HudEvent) {
        match &event {
            HudEvent::StatsUpdate(update) => {
                log::trace!("{} {}", event.name(), update.id);
            }
            _ => log::info!("{} {}", event.name(), event.payload()),
        }
    }
}

/// Drops everything
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: HudEvent) {}
}

/// Fans events out to any number of async subscribers
///
/// Subscribers that fall behind lose the oldest events; the next update for
/// a widget supersedes the missed ones anyway.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<HudEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HudEvent> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventSink for BroadcastSink {
    fn emit(&self, event: HudEvent) {
        // No subscribers is not an error
        let _ = self.tx.send(event);
    }
}

/// Keeps every event in memory for unit tests
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    events: Mutex<Vec<HudEvent>>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<HudEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stats updates recorded for one render id
    pub fn stats_updates(&self, id: &str) -> Vec<HudEvent> {
        self.events()
            .into_iter()
            .filter(|event| matches!(event, HudEvent::StatsUpdate(_)) && event.widget_id() == Some(id))
            .collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events()
            .iter()
            .filter(|event| event.name() == name)
            .count()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
impl EventSink for RecordingSink {
    fn emit(&self, event: HudEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
