// ✋ Drag Session - Idle → Dragging(baseline, accumulated) → Idle
//
// While dragging, the working position is shown optimistically and nothing
// is committed. The end event commits once; an end with zero accumulated
// movement is a click instead.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragSession {
    #[default]
    Idle,
    Dragging {
        clinic: String,
        baseline: (f64, f64),
        accumulated: (f64, f64),
    },
}

/// What an end event resolved to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DragOutcome {
    /// Moved: store the new offset
    Commit { clinic: String, x: f64, y: f64 },
    /// Did not move: treat as a click on the label
    Click { clinic: String },
    /// End without a start
    Ignored,
}

impl DragSession {
    pub fn is_dragging(&self) -> bool {
        matches!(self, DragSession::Dragging { .. })
    }

    /// Begin a session from the label's current offset. A start during an
    /// unfinished session replaces it.
    pub fn start(&mut self, clinic: &str, baseline: (f64, f64)) {
        *self = DragSession::Dragging {
            clinic: clinic.to_string(),
            baseline,
            accumulated: (0.0, 0.0),
        };
    }

    /// Accumulate a pointer delta. Returns the working offset, or None
    /// when no session is active.
    pub fn drag_by(&mut self, dx: f64, dy: f64) -> Option<(f64, f64)> {
        match self {
            DragSession::Dragging {
                baseline,
                accumulated,
                ..
            } => {
                if dx.is_finite() && dy.is_finite() {
                    accumulated.0 += dx;
                    accumulated.1 += dy;
                }
                Some((baseline.0 + accumulated.0, baseline.1 + accumulated.1))
            }
            DragSession::Idle => None,
        }
    }

    /// Working offset for `clinic` if it is the one being dragged
    pub fn working_offset(&self, clinic: &str) -> Option<(f64, f64)> {
        match self {
            DragSession::Dragging {
                clinic: c,
                baseline,
                accumulated,
            } if c == clinic => Some((baseline.0 + accumulated.0, baseline.1 + accumulated.1)),
            _ => None,
        }
    }

    /// Finish the session and return to Idle.
    pub fn end(&mut self) -> DragOutcome {
        match std::mem::take(self) {
            DragSession::Idle => DragOutcome::Ignored,
            DragSession::Dragging {
                clinic,
                baseline,
                accumulated,
            } => {
                if accumulated == (0.0, 0.0) {
                    DragOutcome::Click { clinic }
                } else {
                    DragOutcome::Commit {
                        clinic,
                        x: baseline.0 + accumulated.0,
                        y: baseline.1 + accumulated.1,
                    }
                }
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_commits_accumulated_offset() {
        let mut session = DragSession::default();
        session.start("A", (0.0, -30.0));

        assert_eq!(session.drag_by(5.0, 2.0), Some((5.0, -28.0)));
        assert_eq!(session.drag_by(1.5, -4.0), Some((6.5, -32.0)));
        assert_eq!(session.working_offset("A"), Some((6.5, -32.0)));
        assert_eq!(session.working_offset("B"), None);

        let outcome = session.end();
        assert_eq!(
            outcome,
            DragOutcome::Commit {
                clinic: "A".to_string(),
                x: 6.5,
                y: -32.0
            }
        );
        assert_eq!(session, DragSession::Idle);
    }

    #[test]
    fn test_zero_movement_is_click() {
        let mut session = DragSession::default();
        session.start("A", (30.0, 4.0));
        assert_eq!(
            session.end(),
            DragOutcome::Click {
                clinic: "A".to_string()
            }
        );
    }

    #[test]
    fn test_out_and_back_is_click() {
        let mut session = DragSession::default();
        session.start("A", (0.0, 0.0));
        session.drag_by(4.0, 4.0);
        session.drag_by(-4.0, -4.0);
        assert!(matches!(session.end(), DragOutcome::Click { .. }));
    }

    #[test]
    fn test_end_without_start() {
        let mut session = DragSession::default();
        assert_eq!(session.end(), DragOutcome::Ignored);
        assert_eq!(session.drag_by(1.0, 1.0), None);
    }

    #[test]
    fn test_restart_replaces_session() {
        let mut session = DragSession::default();
        session.start("A", (0.0, 0.0));
        session.drag_by(10.0, 0.0);
        session.start("B", (1.0, 1.0));

        assert!(session.is_dragging());
        assert_eq!(session.working_offset("A"), None);
        assert_eq!(session.working_offset("B"), Some((1.0, 1.0)));
    }

    #[test]
    fn test_non_finite_delta_ignored() {
        let mut session = DragSession::default();
        session.start("A", (0.0, 0.0));
        assert_eq!(session.drag_by(f64::NAN, 1.0), Some((0.0, 0.0)));
    }
}
