//! Competition window value object.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

/// When the competition runs.
///
/// Either bound may be absent. A missing start means the competition has
/// always been open; a missing end means it never closes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitionWindow {
    #[serde(default)]
    pub start: Option<Timestamp>,
    #[serde(default)]
    pub end: Option<Timestamp>,
    #[serde(default)]
    pub paused: bool,
}

impl CompetitionWindow {
    /// A window with no bounds that is not paused.
    pub fn always_open() -> Self {
        Self::default()
    }

    pub fn between(start: Timestamp, end: Timestamp) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            paused: false,
        }
    }

    pub fn paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }

    /// Returns true if competitors may play right now.
    ///
    /// Bounds are exclusive. A paused competition is never active.
    pub fn is_active(&self, now: Timestamp) -> bool {
        if self.paused {
            return false;
        }
        match (self.start, self.end) {
            (Some(start), Some(end)) => now.is_after(&start) && now.is_before(&end),
            (Some(start), None) => now.is_after(&start),
            (None, Some(end)) => now.is_before(&end),
            (None, None) => true,
        }
    }

    /// Returns true once the start has passed, or if there is no start.
    pub fn has_started(&self, now: Timestamp) -> bool {
        self.start.map_or(true, |start| now.is_after(&start))
    }

    /// Returns true once the end has passed. Never true without an end.
    pub fn has_ended(&self, now: Timestamp) -> bool {
        self.end.map_or(false, |end| now.is_after(&end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: u64) -> Timestamp {
        Timestamp::from_unix_secs(secs)
    }

    fn window() -> CompetitionWindow {
        CompetitionWindow::between(at(1_000), at(2_000))
    }

    #[test]
    fn unbounded_window_is_always_active() {
        let w = CompetitionWindow::always_open();
        assert!(w.is_active(at(0)));
        assert!(w.has_started(at(0)));
        assert!(!w.has_ended(at(u32::MAX as u64)));
    }

    #[test]
    fn bounded_window_is_active_only_inside() {
        let w = window();
        assert!(!w.is_active(at(500)));
        assert!(w.is_active(at(1_500)));
        assert!(!w.is_active(at(2_500)));
    }

    #[test]
    fn bounds_are_exclusive() {
        let w = window();
        assert!(!w.is_active(at(1_000)));
        assert!(!w.is_active(at(2_000)));
        assert!(!w.has_started(at(1_000)));
        assert!(!w.has_ended(at(2_000)));
    }

    #[test]
    fn start_only_window_never_ends() {
        let w = CompetitionWindow {
            start: Some(at(1_000)),
            ..Default::default()
        };
        assert!(!w.is_active(at(999)));
        assert!(w.is_active(at(1_000_000)));
        assert!(!w.has_ended(at(1_000_000)));
    }

    #[test]
    fn end_only_window_has_always_started() {
        let w = CompetitionWindow {
            end: Some(at(2_000)),
            ..Default::default()
        };
        assert!(w.has_started(at(0)));
        assert!(w.is_active(at(1)));
        assert!(w.has_ended(at(2_001)));
    }

    #[test]
    fn paused_window_is_inactive_but_started() {
        let w = window().paused(true);
        assert!(!w.is_active(at(1_500)));
        assert!(w.has_started(at(1_500)));
        assert!(!w.has_ended(at(1_500)));
    }
}
