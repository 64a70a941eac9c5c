//! Consolidated registry state, guarded by one lock

use std::collections::{HashMap, HashSet};
use tokio_util::sync::CancellationToken;
use vitals_hud_core::{DataPayload, Source};

pub(crate) struct RegistryState {
    /// Keyed by short id
    pub sources: HashMap<String, Source>,
    /// Keyed by render id
    pub cache: HashMap<String, DataPayload>,
    /// Cancellation for the monitor task of each polled native source
    pub active: HashMap<String, CancellationToken>,
    /// Widgets switched off in the config at the last reconfiguration
    pub disabled: HashSet<String>,
}

impl RegistryState {
    pub fn new(sources: HashMap<String, Source>, disabled: HashSet<String>) -> Self {
        Self {
            sources,
            cache: HashMap::new(),
            active: HashMap::new(),
            disabled,
        }
    }

    /// Whether the widget is currently live
    ///
    /// Natives are live while they are being polled; sidecars unless their
    /// widget is disabled.
    pub fn is_active(&self, id: &str, source: &Source) -> bool {
        match source {
            Source::Native(_) => self.active.contains_key(id),
            Source::Sidecar(_) => !self.disabled.contains(id),
        }
    }

    pub fn is_native(&self, id: &str) -> bool {
        self.sources.get(id).is_some_and(Source::is_native)
    }

    /// Cancel every monitor task; returns how many were running
    pub fn cancel_all(&mut self) -> usize {
        let count = self.active.len();
        for (_, token) in self.active.drain() {
            token.cancel();
        }
        count
    }

    /// Find a source by short id, falling back to render id
    pub fn resolve(&self, id: &str) -> Option<&Source> {
        self.sources
            .get(id)
            .or_else(|| self.sources.values().find(|source| source.render_id() == id))
    }
}
