/// Mock implementations for testing
mod mock_command_runner;
mod mock_hash_source;
mod mock_ledger;
mod mock_progress_reporter;

pub use mock_command_runner::MockCommandRunner;
pub use mock_hash_source::MockHashSource;
pub use mock_ledger::MockLedger;
pub use mock_progress_reporter::MockProgressReporter;
