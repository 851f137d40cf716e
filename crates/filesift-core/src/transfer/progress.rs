/// Transfer progress reporting: lightweight messages sent from the
/// transfer thread to the host thread via a crossbeam channel.
use std::path::PathBuf;

/// Files completed so far out of a total fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    pub completed: usize,
    pub total: usize,
}

impl TransferProgress {
    pub fn new(completed: usize, total: usize) -> Self {
        Self { completed, total }
    }

    /// `floor(completed / total * 100)`, clamped to `0..=100`.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let done = self.completed.min(self.total) as u128;
        (done * 100 / self.total as u128) as u8
    }
}

/// Events delivered to the host.
///
/// A run produces zero or more `Progress` events followed by exactly
/// one terminal event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyEvent {
    /// Emitted once with `completed == 0` and then after every file.
    Progress(TransferProgress),
    /// The scan matched nothing; no destination folder was created.
    NoFilesFound,
    /// Every file was transferred into `destination`.
    Completed { destination: PathBuf },
    /// Cancelled between files. Files already transferred are kept.
    Canceled,
    /// Aborted by an error. Files already transferred are kept.
    Failed { message: String },
}

impl CopyEvent {
    /// True for every event that ends a run.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress(_))
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Completed(PathBuf),
    Canceled,
    NoFilesFound,
    Failed(String),
}

impl From<TransferOutcome> for CopyEvent {
    fn from(outcome: TransferOutcome) -> Self {
        match outcome {
            TransferOutcome::Completed(destination) => Self::Completed { destination },
            TransferOutcome::Canceled => Self::Canceled,
            TransferOutcome::NoFilesFound => Self::NoFilesFound,
            TransferOutcome::Failed(message) => Self::Failed { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_floors() {
        assert_eq!(TransferProgress::new(0, 3).percent(), 0);
        assert_eq!(TransferProgress::new(1, 3).percent(), 33);
        assert_eq!(TransferProgress::new(2, 3).percent(), 66);
        assert_eq!(TransferProgress::new(3, 3).percent(), 100);
    }

    #[test]
    fn percent_is_clamped() {
        assert_eq!(TransferProgress::new(7, 5).percent(), 100);
        assert_eq!(TransferProgress::new(0, 0).percent(), 0);
    }

    #[test]
    fn only_progress_is_non_terminal() {
        assert!(!CopyEvent::Progress(TransferProgress::new(0, 1)).is_terminal());
        assert!(CopyEvent::NoFilesFound.is_terminal());
        assert!(CopyEvent::Canceled.is_terminal());
        assert!(CopyEvent::Failed {
            message: "x".into()
        }
        .is_terminal());
    }

    #[test]
    fn outcome_maps_to_matching_event() {
        let dest = PathBuf::from("/tmp/folder_abcde");
        assert_eq!(
            CopyEvent::from(TransferOutcome::Completed(dest.clone())),
            CopyEvent::Completed { destination: dest }
        );
        assert_eq!(
            CopyEvent::from(TransferOutcome::Failed("disk full".into())),
            CopyEvent::Failed {
                message: "disk full".into()
            }
        );
    }
}
