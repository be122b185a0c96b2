/// Outbound ports (Driven ports) - Infrastructure interfaces
///
/// These ports define the interfaces that the application core uses
/// to interact with external systems (file system, network, processes,
/// the ledger, console).
pub mod artifact;
pub mod command_runner;
pub mod formatter;
pub mod hash_source;
pub mod ledger;
pub mod output_presenter;
pub mod progress_reporter;

pub use artifact::Artifact;
pub use command_runner::CommandRunner;
pub use formatter::BomFormatter;
pub use hash_source::HashSource;
pub use ledger::{
    Ledger, LedgerArtifact, LedgerError, LedgerRecord, LedgerStatus, LoadedArtifact, SignReceipt,
};
pub use output_presenter::OutputPresenter;
pub use progress_reporter::ProgressReporter;
