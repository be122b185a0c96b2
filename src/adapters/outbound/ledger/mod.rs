/// Ledger adapters
mod json_file_ledger;

pub use json_file_ledger::JsonFileLedger;
