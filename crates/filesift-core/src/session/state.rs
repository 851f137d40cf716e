//! Session lifecycle as a pure state machine.
//!
//! ```text
//! Idle ──Start──▶ Scanning ──FilesFound──▶ Transferring ──TransferExited──▶ Finishing
//!  ▲                 │                                                        │
//!  └─OutcomeReported─┘◀───────────────────────OutcomeReported─────────────────┘
//! ```
//!
//! Everything not drawn above is illegal and [`SessionState::next`]
//! returns `None` for it.

/// The current phase of a copy session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No run in progress; `start` is accepted.
    #[default]
    Idle,
    /// Listing eligible files.
    Scanning,
    /// Destination created, files are moving.
    Transferring,
    /// Transfer loop exited, outcome not yet delivered.
    Finishing,
}

/// Things that move a session between phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    Start,
    FilesFound,
    TransferExited,
    OutcomeReported,
}

impl SessionState {
    /// The phase after `signal`, or `None` if the transition is illegal.
    pub fn next(self, signal: SessionSignal) -> Option<SessionState> {
        use SessionSignal::*;
        use SessionState::*;

        match (self, signal) {
            (Idle, Start) => Some(Scanning),
            (Scanning, FilesFound) => Some(Transferring),
            // No files, a scan error or a failed mkdir all end the run here.
            (Scanning, OutcomeReported) => Some(Idle),
            (Transferring, TransferExited) => Some(Finishing),
            (Finishing, OutcomeReported) => Some(Idle),
            _ => None,
        }
    }

    pub fn is_idle(self) -> bool {
        self == SessionState::Idle
    }

    /// Human-readable label for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Scanning => "Scanning",
            Self::Transferring => "Transferring",
            Self::Finishing => "Finishing",
        }
    }
}
