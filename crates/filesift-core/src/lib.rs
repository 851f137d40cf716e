/// FileSift Core: find files by type and gather them into a new folder.
///
/// This crate contains all business logic with zero UI dependencies.
/// Frontends (the `filesift` CLI, or a GUI) drive a [`session::CopySession`]
/// and render the [`CopyEvent`]s it reports.
///
/// # Modules
///
/// - [`filter`]: Extension-based eligibility (images, videos, custom lists).
/// - [`scanner`]: Recursive directory walk collecting eligible files.
/// - [`transfer`]: Copy or zip a file list with progress and cancellation.
/// - [`session`]: Background run orchestration and its state machine.
/// - [`config`]: Session settings, loadable from JSON.
/// - [`platform`]: Opening a folder in the system file browser.
pub mod config;
pub mod filter;
pub mod platform;
pub mod scanner;
pub mod session;
pub mod transfer;

pub use config::SessionConfig;
pub use filter::{CustomExtensions, FileTypeSelector};
pub use session::{CopyRequest, CopySession, StartStatus};
pub use transfer::progress::{CopyEvent, TransferOutcome, TransferProgress};
