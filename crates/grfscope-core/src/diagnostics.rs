//! Diagnostics emitted while resolving variables and walking graphs.
//!
//! Recoverable content problems are reported as structured [`Diagnostic`]
//! events through a [`DiagnosticsSink`] injected into the resolver context.
//! They never abort a query.
//!
//! # Sinks
//!
//! - [`TracingSink`]: logs each distinct event once through `tracing`
//! - [`RecordingSink`]: keeps every event in memory, for tests and tools

use std::collections::BTreeSet;
use std::sync::Mutex;

use crate::feature::FeatureKind;

/// A recoverable problem found during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Diagnostic {
    /// A variable id the feature does not implement was requested.
    UnknownVariable {
        /// Variable id.
        id: u8,
        /// Feature whose resolver was asked.
        kind: FeatureKind,
        /// Entity index the query was about.
        index: u32,
    },
    /// A graph walk exceeded the maximum depth and was abandoned.
    GraphTooDeep {
        /// Feature whose graph was walked.
        kind: FeatureKind,
        /// Entity index the query was about.
        index: u32,
    },
}

/// Receiver of diagnostics.
///
/// Sinks take `&self` so one sink can be shared by every context built during
/// a session; implementations use interior mutability where they keep state.
pub trait DiagnosticsSink: Send + Sync {
    /// Receives one event.
    fn report(&self, diagnostic: Diagnostic);

    /// Forgets per-content state, called when content is reloaded.
    fn reset(&self) {}
}

/// Sink that forwards events to `tracing`, once per (kind, variable) pair.
///
/// Unknown variables are typically requested on every redraw of an
/// inspector, so repeated events for the same pair are suppressed.
#[derive(Debug, Default)]
pub struct TracingSink {
    seen: Mutex<BTreeSet<(FeatureKind, u8)>>,
}

impl TracingSink {
    /// Creates a sink with no events seen.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DiagnosticsSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::UnknownVariable { id, kind, index } => {
                let first = self
                    .seen
                    .lock()
                    .map(|mut seen| seen.insert((kind, id)))
                    .unwrap_or(true);
                if first {
                    tracing::debug!(
                        target: "grf",
                        kind = %kind,
                        index,
                        "Unhandled {} variable 0x{:02X}",
                        kind,
                        id
                    );
                }
            }
            Diagnostic::GraphTooDeep { kind, index } => {
                tracing::warn!(target: "grf", kind = %kind, index, "graph walk too deep, giving up");
            }
        }
    }

    /// Forgets which events were already logged, so reloaded content gets
    /// its unknown variables reported again.
    fn reset(&self) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.clear();
        }
    }
}

/// Sink that records every event in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Diagnostic>>,
}

impl RecordingSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains and returns the recorded events.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    /// Number of events currently recorded.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Returns true if nothing was recorded.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap().is_empty()
    }
}

impl DiagnosticsSink for RecordingSink {
    fn report(&self, diagnostic: Diagnostic) {
        if let Ok(mut events) = self.events.lock() {
            events.push(diagnostic);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unknown(id: u8) -> Diagnostic {
        Diagnostic::UnknownVariable {
            id,
            kind: FeatureKind::Canals,
            index: 3,
        }
    }

    #[test]
    fn recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        sink.report(unknown(0x82));
        sink.report(unknown(0x84));
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.take(), vec![unknown(0x82), unknown(0x84)]);
        assert!(sink.is_empty());
    }

    #[test]
    fn tracing_sink_remembers_reported_pairs() {
        let sink = TracingSink::new();
        sink.report(unknown(0x82));
        sink.report(unknown(0x82));
        assert_eq!(sink.seen.lock().unwrap().len(), 1);
        sink.reset();
        assert!(sink.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn sinks_are_object_safe() {
        fn _accepts(_sink: &dyn DiagnosticsSink) {}
        _accepts(&TracingSink::new());
        _accepts(&RecordingSink::new());
    }
}
