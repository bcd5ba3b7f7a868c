use std::collections::VecDeque;

/// Structured diagnostics the host can poll instead of scraping free-form log lines, per
/// the runtime's external error-handling contract (recoverable runtime errors, logical
/// errors, and dropped input events all surface here).
#[derive(Clone, Debug)]
pub enum DiagnosticEvent {
    SystemFailed { tick: u64, system: &'static str, consecutive_failures: u32 },
    SystemDegraded { tick: u64, system: &'static str },
    RenderContextLost,
    RenderContextRestored,
    RenderFallenBackToSoftware,
    CanvasShrunk { requested: (u32, u32), actual: (u32, u32) },
    UnknownInputEventDropped { kind: String },
}

/// Bounded ring buffer of recent diagnostics, plus a running count of dropped input
/// events (spec's "counted in diagnostics" requirement for unknown event kinds). The
/// host drains it at whatever rate it samples the runtime's diagnostic channel.
pub struct Diagnostics {
    recent: VecDeque<DiagnosticEvent>,
    capacity: usize,
    dropped_input_events: u64,
}

impl Diagnostics {
    pub fn new(capacity: usize) -> Self {
        Self {
            recent: VecDeque::with_capacity(capacity),
            capacity,
            dropped_input_events: 0,
        }
    }

    pub fn push(&mut self, event: DiagnosticEvent) {
        if let DiagnosticEvent::UnknownInputEventDropped { .. } = &event {
            self.dropped_input_events += 1;
        }
        if self.recent.len() == self.capacity {
            self.recent.pop_front();
        }
        self.recent.push_back(event);
    }

    /// Drains every diagnostic queued since the last call.
    pub fn drain(&mut self) -> Vec<DiagnosticEvent> {
        self.recent.drain(..).collect()
    }

    pub fn dropped_input_event_count(&self) -> u64 {
        self.dropped_input_events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_buffer_evicts_oldest_past_capacity() {
        let mut diagnostics = Diagnostics::new(2);
        diagnostics.push(DiagnosticEvent::RenderContextLost);
        diagnostics.push(DiagnosticEvent::RenderContextRestored);
        diagnostics.push(DiagnosticEvent::RenderFallenBackToSoftware);

        let drained = diagnostics.drain();
        assert_eq!(drained.len(), 2);
        assert!(matches!(drained[0], DiagnosticEvent::RenderContextRestored));
        assert!(matches!(drained[1], DiagnosticEvent::RenderFallenBackToSoftware));
    }

    #[test]
    fn counts_dropped_input_events_independent_of_drain() {
        let mut diagnostics = Diagnostics::new(16);
        diagnostics.push(DiagnosticEvent::UnknownInputEventDropped { kind: "touch".to_owned() });
        diagnostics.drain();
        diagnostics.push(DiagnosticEvent::UnknownInputEventDropped { kind: "gamepad".to_owned() });

        assert_eq!(diagnostics.dropped_input_event_count(), 2);
    }
}
