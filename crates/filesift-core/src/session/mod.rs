/// Copy session: runs one scan-and-transfer at a time on a worker thread.
///
/// The host owns a [`CopySession`], calls [`CopySession::start`] and
/// [`CopySession::cancel`], and drains [`CopyEvent`]s with
/// [`CopySession::poll_events`] (non-blocking, e.g. once per frame) or
/// [`CopySession::next_event`] (blocking with a timeout). The worker never
/// touches session state directly: phase changes travel over the same
/// ordered channel as the events and are applied when the host drains
/// them, so the session is back in `Idle` exactly when the host has seen
/// the terminal event.
///
/// A run that is cancelled or fails part-way leaves the files already
/// transferred in the destination folder. Nothing is rolled back.
pub mod destination;
pub mod state;

use crate::config::{DestinationPlacement, SessionConfig};
use crate::filter::FileTypeSelector;
use crate::platform;
use crate::scanner::{self, ScanError};
use crate::transfer::progress::{CopyEvent, TransferOutcome};
use crate::transfer::{run_transfer, TransferStrategy};
use state::{SessionSignal, SessionState};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Maximum number of messages handled by one [`CopySession::poll_events`] call.
///
/// Keeps a large backlog (host was busy) from stalling a UI frame.
const MAX_MESSAGES_PER_POLL: usize = 300;

/// What to copy and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyRequest {
    pub source: PathBuf,
    pub selector: FileTypeSelector,
    /// Zip the files instead of copying them loose.
    pub compress: bool,
}

impl CopyRequest {
    pub fn new(source: impl Into<PathBuf>, selector: FileTypeSelector, compress: bool) -> Self {
        Self {
            source: source.into(),
            selector,
            compress,
        }
    }
}

/// Whether a `start` call began a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartStatus {
    Started,
    /// A run is already active; nothing changed.
    Rejected,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to spawn transfer thread: {0}")]
    Spawn(#[source] io::Error),
}

/// Messages from the worker to the host, in order.
#[derive(Debug)]
enum WorkerMessage {
    Phase(SessionSignal),
    Event(CopyEvent),
}

struct ActiveRun {
    rx: Receiver<WorkerMessage>,
    cancel_flag: Arc<AtomicBool>,
    _thread: thread::JoinHandle<()>,
}

/// Everything the worker needs, moved onto its thread.
struct Job {
    request: CopyRequest,
    placement: DestinationPlacement,
    archive_name: String,
    folder_name: String,
}

pub struct CopySession {
    config: SessionConfig,
    state: SessionState,
    run: Option<ActiveRun>,
}

impl Default for CopySession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl CopySession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            run: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Begin a run on a background thread.
    ///
    /// Returns [`StartStatus::Rejected`] without side effects if a run is
    /// already active.
    pub fn start(&mut self, request: CopyRequest) -> Result<StartStatus, SessionError> {
        if !self.state.is_idle() {
            debug!(
                "Ignoring start for {} while {}",
                request.source.display(),
                self.state.label()
            );
            return Ok(StartStatus::Rejected);
        }

        let (tx, rx) =
            crossbeam_channel::bounded::<WorkerMessage>(self.config.event_channel_capacity);
        let cancel_flag = Arc::new(AtomicBool::new(false));
        let cancel_clone = cancel_flag.clone();

        let job = Job {
            request,
            placement: self.config.placement,
            archive_name: self.config.archive_name.clone(),
            folder_name: destination::random_folder_name(&mut rand::thread_rng()),
        };
        info!(
            "Starting {} copy of {} (compress: {})",
            job.request.selector.label(),
            job.request.source.display(),
            job.request.compress
        );

        let thread = thread::Builder::new()
            .name("filesift-transfer".into())
            .spawn(move || run_worker(job, &tx, &cancel_clone))
            .map_err(SessionError::Spawn)?;

        self.apply(SessionSignal::Start);
        self.run = Some(ActiveRun {
            rx,
            cancel_flag,
            _thread: thread,
        });
        Ok(StartStatus::Started)
    }

    /// Ask the active run to stop before its next file. No-op when idle.
    pub fn cancel(&self) {
        if self.state.is_idle() {
            return;
        }
        if let Some(ref run) = self.run {
            info!("Cancellation requested");
            run.cancel_flag.store(true, Ordering::Relaxed);
        }
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.run
            .as_ref()
            .map(|run| run.cancel_flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    /// Drain whatever events are ready without blocking.
    pub fn poll_events(&mut self) -> Vec<CopyEvent> {
        let mut events = Vec::new();
        let mut handled = 0usize;

        while handled < MAX_MESSAGES_PER_POLL {
            let received = match &self.run {
                Some(run) => run.rx.try_recv(),
                None => break,
            };
            handled += 1;
            match received {
                Ok(msg) => {
                    if let Some(event) = self.handle(msg) {
                        events.push(event);
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    events.extend(self.worker_lost());
                    break;
                }
            }
        }
        events
    }

    /// Wait up to `timeout` for the next event.
    ///
    /// Returns `None` on timeout or when no run is active.
    pub fn next_event(&mut self, timeout: Duration) -> Option<CopyEvent> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let received = match &self.run {
                Some(run) => run.rx.recv_timeout(remaining),
                None => return None,
            };
            match received {
                Ok(msg) => {
                    if let Some(event) = self.handle(msg) {
                        return Some(event);
                    }
                }
                Err(RecvTimeoutError::Timeout) => return None,
                Err(RecvTimeoutError::Disconnected) => return self.worker_lost(),
            }
        }
    }

    fn handle(&mut self, msg: WorkerMessage) -> Option<CopyEvent> {
        match msg {
            WorkerMessage::Phase(signal) => {
                self.apply(signal);
                None
            }
            WorkerMessage::Event(event) => {
                if event.is_terminal() {
                    self.finish_run(&event);
                }
                Some(event)
            }
        }
    }

    fn finish_run(&mut self, event: &CopyEvent) {
        self.apply(SessionSignal::OutcomeReported);
        self.run = None;

        if let CopyEvent::Completed { destination } = event {
            if self.config.reveal_on_complete {
                platform::reveal(destination);
            }
        }
    }

    /// The worker went away without a terminal event (it panicked).
    fn worker_lost(&mut self) -> Option<CopyEvent> {
        if self.state.is_idle() {
            self.run = None;
            return None;
        }
        warn!("Transfer worker exited while {}", self.state.label());
        if self.state == SessionState::Transferring {
            self.apply(SessionSignal::TransferExited);
        }
        let event = CopyEvent::Failed {
            message: "transfer worker exited without reporting an outcome".into(),
        };
        self.finish_run(&event);
        Some(event)
    }

    fn apply(&mut self, signal: SessionSignal) {
        match self.state.next(signal) {
            Some(next) => {
                debug!("Session {} -> {}", self.state.label(), next.label());
                self.state = next;
            }
            None => warn!(
                "Ignoring illegal transition {signal:?} while {}",
                self.state.label()
            ),
        }
    }
}

impl Drop for CopySession {
    fn drop(&mut self) {
        if let Some(ref run) = self.run {
            run.cancel_flag.store(true, Ordering::Relaxed);
        }
    }
}

/// Worker thread body: scan, create the destination, transfer.
///
/// Always ends with exactly one terminal event. Send errors mean the
/// session was dropped and are ignored.
fn run_worker(job: Job, tx: &Sender<WorkerMessage>, cancel_flag: &AtomicBool) {
    let outcome = execute(&job, tx, cancel_flag);
    match &outcome {
        TransferOutcome::Failed(message) => warn!("Copy failed: {message}"),
        other => info!("Copy finished: {other:?}"),
    }
    let _ = tx.send(WorkerMessage::Event(outcome.into()));
}

fn execute(job: &Job, tx: &Sender<WorkerMessage>, cancel_flag: &AtomicBool) -> TransferOutcome {
    let request = &job.request;

    if !request.source.is_dir() {
        return failed(ScanError::NotADirectory(request.source.clone()));
    }
    let source = match request.source.canonicalize() {
        Ok(path) => path,
        Err(err) => {
            return failed(ScanError::Resolve {
                path: request.source.clone(),
                source: err,
            })
        }
    };

    // Computed before the scan so the scan can skip it.
    let destination =
        match destination::candidate_path(&source, job.placement, &job.folder_name) {
            Ok(path) => path,
            Err(err) => return failed(err),
        };

    let scan = match scanner::scan_until(
        &source,
        &request.selector,
        Some(&destination),
        cancel_flag,
    ) {
        Ok(scan) => scan,
        Err(err) => return failed(err),
    };
    // Cancelled while scanning: stop before anything is created on disk.
    if scan.cancelled || cancel_flag.load(Ordering::Relaxed) {
        info!("Cancelled while scanning {}", source.display());
        return TransferOutcome::Canceled;
    }
    if scan.is_empty() {
        info!("No eligible files under {}", source.display());
        return TransferOutcome::NoFilesFound;
    }
    info!(
        "Found {} eligible files under {} ({} entries skipped)",
        scan.len(),
        source.display(),
        scan.skipped
    );

    if let Err(err) = destination::create(&destination) {
        return failed(err);
    }
    let _ = tx.send(WorkerMessage::Phase(SessionSignal::FilesFound));

    let strategy = TransferStrategy::for_request(request.compress, &job.archive_name);
    let result = run_transfer(&scan.files, &destination, &strategy, cancel_flag, |progress| {
        let _ = tx.send(WorkerMessage::Event(CopyEvent::Progress(progress)));
    });
    let _ = tx.send(WorkerMessage::Phase(SessionSignal::TransferExited));

    result.unwrap_or_else(failed)
}

fn failed(err: impl std::error::Error) -> TransferOutcome {
    TransferOutcome::Failed(err.to_string())
}
